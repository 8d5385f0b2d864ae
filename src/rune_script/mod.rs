//! The embedded effect language.
//!
//! Effect bodies are small, bounded programs: expressions over the event
//! payload and entity stats, `if` gates, `for_each` over bounded world
//! queries, and terminal actions (modify a stat, request damage, spawn,
//! emit a follow-up event, play a cue). Evaluation is pure; the engine
//! commits the resulting [`EffectOutcome`].
//!
//! ## Key Components
//!
//! - [`Script`], [`Instr`], [`Expr`]: the serde-tagged syntax tree
//! - [`Script::validate`]: static checks run at catalog build time
//! - [`EvaluationContext`]: actor, payload, read-only world, stacks, RNG
//! - [`Interpreter`]: step- and query-bounded evaluator

mod ast;
mod context;
mod interpreter;
mod outcome;

pub use ast::{CmpOp, EntityRef, Expr, Instr, Query, Script, MAX_NESTING};
pub use context::EvaluationContext;
pub use interpreter::Interpreter;
pub use outcome::{DamageRequest, EffectOutcome, FollowUp, ModifierRequest, SpawnRequest};
