//! Composition and execution of modifier phases.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use combat_core::{Spell, SpellId, UnitId};
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, trace, warn};

use crate::api::{ModifierError, ModifierFailure, Result, RuntimeError};
use crate::cast::SpellCast;
use crate::config::RetryPolicy;
use crate::context::SimContext;

use super::base::{CasterStateModifier, ProjectileModifier, ResourceModifier};
use super::{Phase, SpellModifier};

/// An ordered list of modifiers run as one composite modifier.
#[derive(Clone, Default)]
pub struct ModifierPipeline {
    modifiers: Vec<Arc<dyn SpellModifier>>,
    policy: RetryPolicy,
}

impl ModifierPipeline {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            modifiers: Vec::new(),
            policy,
        }
    }

    /// Resource consumption, projectile launch and caster-state clearing.
    /// Cooldowns and charges are spent by the cast service when the cast starts.
    pub fn base(policy: RetryPolicy) -> Self {
        Self::new(policy)
            .with_modifier(ResourceModifier)
            .with_modifier(ProjectileModifier)
            .with_modifier(CasterStateModifier)
    }

    #[must_use]
    pub fn with_modifier(self, modifier: impl SpellModifier + 'static) -> Self {
        self.with_shared(Arc::new(modifier))
    }

    #[must_use]
    pub fn with_shared(mut self, modifier: Arc<dyn SpellModifier>) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// This pipeline's modifiers followed by `other`'s, under this pipeline's policy.
    #[must_use]
    pub fn compose(&self, other: &ModifierPipeline) -> Self {
        let mut composed = self.clone();
        composed.modifiers.extend(other.modifiers.iter().cloned());
        composed
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn names(&self) -> Vec<&str> {
        self.modifiers.iter().map(|modifier| modifier.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Runs `before_cast` on each modifier in order, threading the spell through.
    /// The first failure stops the chain.
    pub async fn before_cast(&self, ctx: &SimContext, caster: &UnitId, spell: Spell) -> Result<Spell> {
        let spell_id = spell.id();
        let mut current = spell;

        for modifier in &self.modifiers {
            let modifier = modifier.as_ref();
            let input = &current;
            let next = guarded(&self.policy, modifier.name(), spell_id, Phase::BeforeCast, move || {
                modifier.before_cast(ctx, caster, input.clone())
            })
            .await?;
            current = next;
        }
        Ok(current)
    }

    pub async fn on_cast(&self, ctx: &SimContext, cast: &SpellCast) -> Result<()> {
        self.fan_out(ctx, cast, Phase::OnCast, 0).await
    }

    pub async fn on_hit(&self, ctx: &SimContext, cast: &SpellCast) -> Result<()> {
        self.fan_out(ctx, cast, Phase::OnHit, 0).await
    }

    pub async fn on_damage(&self, ctx: &SimContext, cast: &SpellCast, amount: u64) -> Result<()> {
        self.fan_out(ctx, cast, Phase::OnDamage, amount).await
    }

    /// Runs one phase of every modifier concurrently and waits for all of them.
    ///
    /// A failing modifier does not stop the others. When several fail, the
    /// one earliest in the pipeline is reported.
    async fn fan_out(&self, ctx: &SimContext, cast: &SpellCast, phase: Phase, amount: u64) -> Result<()> {
        if self.modifiers.is_empty() {
            return Ok(());
        }

        let mut tasks = JoinSet::new();
        let mut task_index = HashMap::new();

        for (index, modifier) in self.modifiers.iter().enumerate() {
            let modifier = Arc::clone(modifier);
            let ctx = ctx.clone();
            let cast = cast.clone();
            let policy = self.policy;

            let handle = tasks.spawn(async move {
                let (modifier, ctx, cast) = (modifier.as_ref(), &ctx, &cast);
                guarded(&policy, modifier.name(), cast.spell_id(), phase, move || {
                    invoke(modifier, ctx, cast, phase, amount)
                })
                .await
            });
            task_index.insert(handle.id(), index);
        }

        let mut failures: Vec<(usize, RuntimeError)> = Vec::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((id, Err(err))) => {
                    failures.push((task_index.get(&id).copied().unwrap_or(usize::MAX), err));
                }
                Err(join_error) => {
                    let index = task_index.get(&join_error.id()).copied().unwrap_or(usize::MAX);
                    let name = self
                        .modifiers
                        .get(index)
                        .map_or_else(|| "unknown".to_owned(), |modifier| modifier.name().to_owned());
                    error!(
                        target: "runtime::modifiers",
                        modifier = %name,
                        phase = %phase,
                        spell_id = %cast.spell_id(),
                        "modifier task aborted: {join_error}"
                    );
                    failures.push((
                        index,
                        ModifierError {
                            modifier: name,
                            spell_id: cast.spell_id(),
                            phase,
                            reason: ModifierFailure::Aborted(join_error.to_string()),
                        }
                        .into(),
                    ));
                }
            }
        }

        trace!(
            target: "runtime::modifiers",
            phase = %phase,
            spell_id = %cast.spell_id(),
            modifiers = self.modifiers.len(),
            failed = failures.len(),
            "phase finished"
        );

        match failures.into_iter().min_by_key(|(index, _)| *index) {
            Some((_, err)) => Err(err),
            None => Ok(()),
        }
    }
}

async fn invoke(
    modifier: &dyn SpellModifier,
    ctx: &SimContext,
    cast: &SpellCast,
    phase: Phase,
    amount: u64,
) -> Result<()> {
    match phase {
        Phase::BeforeCast => Ok(()),
        Phase::OnCast => modifier.on_cast(ctx, cast).await,
        Phase::OnHit => modifier.on_hit(ctx, cast).await,
        Phase::OnDamage => modifier.on_damage(ctx, cast, amount).await,
    }
}

/// Runs one modifier call under the policy's timeout. Timeouts are retried
/// with exponential backoff; any other failure is returned at once.
async fn guarded<T, F, Fut>(
    policy: &RetryPolicy,
    modifier: &str,
    spell_id: SpellId,
    phase: Phase,
    mut call: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match timeout(policy.timeout, call()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(source)) => {
                if source.is_cast_rejection() {
                    debug!(
                        target: "runtime::modifiers",
                        modifier,
                        phase = %phase,
                        spell_id = %spell_id,
                        "cast rejected: {source}"
                    );
                } else {
                    error!(
                        target: "runtime::modifiers",
                        modifier,
                        phase = %phase,
                        spell_id = %spell_id,
                        error = %source,
                        "modifier failed"
                    );
                }
                return Err(ModifierError {
                    modifier: modifier.to_owned(),
                    spell_id,
                    phase,
                    reason: ModifierFailure::Failed(Box::new(source)),
                }
                .into());
            }
            Err(_) if attempt + 1 < max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    target: "runtime::modifiers",
                    modifier,
                    phase = %phase,
                    spell_id = %spell_id,
                    "modifier timed out (attempt {}/{}), retrying in {:?}",
                    attempt + 1,
                    max_attempts,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(_) => {
                error!(
                    target: "runtime::modifiers",
                    modifier,
                    phase = %phase,
                    spell_id = %spell_id,
                    "modifier timed out after {} attempts",
                    max_attempts
                );
                return Err(ModifierError {
                    modifier: modifier.to_owned(),
                    spell_id,
                    phase,
                    reason: ModifierFailure::Timeout(policy.timeout),
                }
                .into());
            }
        }
    }
}

/// The default pipeline plus per-spell pipelines, built once at setup.
#[derive(Clone, Default)]
pub struct PipelineSet {
    default: Arc<ModifierPipeline>,
    overrides: HashMap<SpellId, Arc<ModifierPipeline>>,
}

impl PipelineSet {
    pub fn new(default: ModifierPipeline) -> Self {
        Self {
            default: Arc::new(default),
            overrides: HashMap::new(),
        }
    }

    /// Base modifiers for every spell.
    pub fn with_base(policy: RetryPolicy) -> Self {
        Self::new(ModifierPipeline::base(policy))
    }

    /// Replaces the pipeline used for `spell_id`.
    #[must_use]
    pub fn with_override(mut self, spell_id: SpellId, pipeline: ModifierPipeline) -> Self {
        self.overrides.insert(spell_id, Arc::new(pipeline));
        self
    }

    /// Uses the default pipeline followed by `extra` for `spell_id`.
    #[must_use]
    pub fn with_spell_modifiers(self, spell_id: SpellId, extra: ModifierPipeline) -> Self {
        let composed = self.default.compose(&extra);
        self.with_override(spell_id, composed)
    }

    pub fn for_spell(&self, spell_id: SpellId) -> Arc<ModifierPipeline> {
        self.overrides
            .get(&spell_id)
            .map_or_else(|| Arc::clone(&self.default), Arc::clone)
    }

    pub fn default_pipeline(&self) -> &ModifierPipeline {
        &self.default
    }
}
