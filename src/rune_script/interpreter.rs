//! Script evaluation.
//!
//! The `Interpreter` walks a script against an [`EvaluationContext`] and
//! collects what the script asks for into an [`EffectOutcome`]. It never
//! writes to the world.
//!
//! Failures split two ways:
//!
//! - A `DescriptorError` (missing target, unknown local, division by zero)
//!   aborts this evaluation and nothing it produced is committed.
//! - A `CapacityError` (query too large, step budget spent) truncates the
//!   work, is recorded on the outcome, and the partial outcome stands.

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::ast::{EntityRef, Expr, Instr, Query};
use super::context::EvaluationContext;
use super::outcome::{DamageRequest, EffectOutcome, FollowUp, ModifierRequest, SpawnRequest};
use crate::core::{round_half_up, CapacityError, DescriptorError, EngineConfig, EntityId, Relation};
use crate::runes::EffectDescriptor;
use crate::triggers::Payload;

/// Evaluates effect scripts within configured bounds.
#[derive(Clone, Copy, Debug)]
pub struct Interpreter {
    max_script_steps: usize,
    max_query_entities: usize,
}

impl Interpreter {
    /// Create an interpreter with the limits from `config`.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_script_steps: config.max_script_steps,
            max_query_entities: config.max_query_entities,
        }
    }

    /// Evaluate one descriptor.
    pub fn evaluate(
        &self,
        descriptor: &EffectDescriptor,
        ctx: EvaluationContext<'_>,
    ) -> Result<EffectOutcome, DescriptorError> {
        let script = descriptor.script().map_err(Clone::clone)?;

        let mut run = Run {
            limits: *self,
            ctx,
            locals: FxHashMap::default(),
            each: None,
            halted: false,
            outcome: EffectOutcome::empty(descriptor.id),
        };
        run.block(script.instructions())?;

        for err in &run.outcome.capacity {
            warn!(effect = %descriptor.id, error = %err, "effect truncated");
        }
        debug!(
            effect = %descriptor.id,
            steps = run.outcome.steps,
            modifiers = run.outcome.modifiers.len(),
            follow_ups = run.outcome.follow_ups.len(),
            "effect evaluated"
        );
        Ok(run.outcome)
    }
}

fn truthy(value: f64) -> bool {
    value != 0.0
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// State of one evaluation.
struct Run<'a> {
    limits: Interpreter,
    ctx: EvaluationContext<'a>,
    locals: FxHashMap<String, f64>,
    each: Option<EntityId>,
    halted: bool,
    outcome: EffectOutcome,
}

impl Run<'_> {
    fn block(&mut self, block: &[Instr]) -> Result<(), DescriptorError> {
        for instr in block {
            if !self.step() {
                break;
            }
            self.exec(instr)?;
        }
        Ok(())
    }

    /// Spend one step. Returns `false` once the budget is gone.
    fn step(&mut self) -> bool {
        if self.halted {
            return false;
        }
        if self.outcome.steps >= self.limits.max_script_steps {
            self.halted = true;
            self.outcome.record(CapacityError::StepBudget {
                limit: self.limits.max_script_steps,
            });
            return false;
        }
        self.outcome.steps += 1;
        true
    }

    fn exec(&mut self, instr: &Instr) -> Result<(), DescriptorError> {
        match instr {
            Instr::Let { name, value } => {
                let value = self.eval(value)?;
                self.locals.insert(name.clone(), value);
            }

            Instr::If {
                condition,
                then,
                otherwise,
            } => {
                if truthy(self.eval(condition)?) {
                    self.block(then)?;
                } else {
                    self.block(otherwise)?;
                }
            }

            Instr::ForEach { query, body } => {
                let entities = self.query(query);
                let outer = self.each;
                for entity in entities {
                    if self.halted {
                        break;
                    }
                    self.each = Some(entity);
                    self.block(body)?;
                }
                self.each = outer;
            }

            Instr::ApplyModifier {
                target,
                stat,
                kind,
                value,
                duration,
            } => {
                let entity = self.entity(*target)?;
                let value = self.eval(value)?;
                self.outcome.modifiers.push(ModifierRequest {
                    entity,
                    stat: stat.clone(),
                    kind: *kind,
                    value,
                    duration: *duration,
                });
            }

            Instr::Damage { target, amount } => {
                let target = self.entity(*target)?;
                let amount = self.eval(amount)?;
                self.outcome.damage.push(DamageRequest { target, amount });
            }

            Instr::Spawn { kind, at, count } => {
                let at = self.entity(*at)?;
                let requested = round_half_up(self.eval(count)?).max(0) as u64;
                let limit = self.limits.max_query_entities;
                let count = if requested > limit as u64 {
                    self.outcome.record(CapacityError::SpawnClamped { requested, limit });
                    limit as u64
                } else {
                    requested
                };
                if count > 0 {
                    self.outcome.spawns.push(SpawnRequest {
                        kind: kind.clone(),
                        at,
                        count: u32::try_from(count).unwrap_or(u32::MAX),
                    });
                }
            }

            Instr::Emit {
                trigger,
                target,
                amount,
            } => {
                let mut payload = Payload::new()
                    .with_source(self.ctx.actor)
                    .with_amount(self.eval(amount)?);
                if let Some(target) = target {
                    payload = payload.with_target(self.entity(*target)?);
                }
                self.outcome.follow_ups.push(FollowUp {
                    kind: *trigger,
                    payload,
                });
            }

            Instr::Cue(name) => self.outcome.cues.push(name.clone()),

            Instr::ConsumeSelf => self.outcome.consume_self = true,
        }
        Ok(())
    }

    fn entity(&self, entity: EntityRef) -> Result<EntityId, DescriptorError> {
        match entity {
            EntityRef::Actor => Ok(self.ctx.actor),
            EntityRef::Target => self.ctx.payload.target.ok_or(DescriptorError::NoTarget),
            EntityRef::Each => self.each.ok_or(DescriptorError::NoLoopEntity),
        }
    }

    /// Run a world query, truncating to the configured limit.
    fn query(&mut self, query: &Query) -> Vec<EntityId> {
        let (radius, relation) = match query {
            Query::EnemiesInRadius { radius } => (*radius, Relation::Enemies),
            Query::AlliesInRadius { radius } => (*radius, Relation::Allies),
        };
        let limit = self.limits.max_query_entities;

        // One extra so truncation is observable.
        let mut found =
            self.ctx
                .world
                .entities_in_radius(self.ctx.actor, radius, relation, limit.saturating_add(1));
        if found.len() > limit {
            found.truncate(limit);
            self.outcome.record(CapacityError::QueryTruncated { limit });
        }
        found
    }

    fn eval(&mut self, expr: &Expr) -> Result<f64, DescriptorError> {
        let value = match expr {
            Expr::Const(value) => *value,
            Expr::Stat { entity, stat } => {
                let entity = self.entity(*entity)?;
                self.ctx
                    .world
                    .get_stat(entity, stat)
                    .ok_or(DescriptorError::UnknownEntity(entity))?
            }
            Expr::Amount => self.ctx.payload.amount,
            Expr::Value(index) => {
                let values = &self.ctx.payload.values;
                *values.get(*index).ok_or(DescriptorError::PayloadIndex {
                    index: *index,
                    len: values.len(),
                })?
            }
            Expr::HasTag(tag) => flag(self.ctx.payload.has_tag(tag)),
            Expr::Stacks => f64::from(self.ctx.stacks),
            Expr::Local(name) => *self
                .locals
                .get(name)
                .ok_or_else(|| DescriptorError::UnknownLocal(name.clone()))?,
            Expr::Roll => self.ctx.rng.roll(),
            Expr::Count(query) => self.query(query).len() as f64,
            Expr::Add(a, b) => self.eval(a)? + self.eval(b)?,
            Expr::Sub(a, b) => self.eval(a)? - self.eval(b)?,
            Expr::Mul(a, b) => self.eval(a)? * self.eval(b)?,
            Expr::Div(a, b) => {
                let numerator = self.eval(a)?;
                let denominator = self.eval(b)?;
                if denominator == 0.0 {
                    return Err(DescriptorError::DivisionByZero);
                }
                numerator / denominator
            }
            Expr::Min(a, b) => self.eval(a)?.min(self.eval(b)?),
            Expr::Max(a, b) => self.eval(a)?.max(self.eval(b)?),
            Expr::Neg(a) => -self.eval(a)?,
            Expr::Cmp(op, a, b) => {
                let lhs = self.eval(a)?;
                let rhs = self.eval(b)?;
                flag(op.apply(lhs, rhs))
            }
            Expr::And(a, b) => flag(truthy(self.eval(a)?) && truthy(self.eval(b)?)),
            Expr::Or(a, b) => flag(truthy(self.eval(a)?) || truthy(self.eval(b)?)),
            Expr::Not(a) => flag(!truthy(self.eval(a)?)),
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(DescriptorError::NonFinite)
        }
    }
}
