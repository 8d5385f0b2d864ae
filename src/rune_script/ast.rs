//! Effect script syntax.
//!
//! Scripts are data: a flat list of instructions with nested blocks for
//! `if` and `for_each`. There is no recursion and no unbounded loop, so
//! every script terminates; the interpreter additionally caps executed
//! steps.
//!
//! ## Expressions
//!
//! - Values: `const`, `stat`, `amount`, `value`, `has_tag`, `stacks`,
//!   `local`, `roll`, `count`
//! - Arithmetic: `add`, `sub`, `mul`, `div`, `min`, `max`, `neg`
//! - Logic: `cmp`, `and`, `or`, `not` (1.0 is true, 0.0 is false)
//!
//! ## Instructions
//!
//! - Control: `let`, `if`, `for_each`
//! - Terminal: `apply_modifier`, `damage`, `spawn`, `emit`, `cue`,
//!   `consume_self`

use serde::{Deserialize, Serialize};

use crate::core::{DescriptorError, ModifierKind};
use crate::triggers::TriggerKind;

/// Deepest allowed nesting of `if`/`for_each` blocks.
pub const MAX_NESTING: usize = 16;

/// An entity a script can talk about.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRef {
    /// The entity owning the effect.
    #[default]
    Actor,
    /// The event's target.
    Target,
    /// The current `for_each` entity.
    Each,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CmpOp {
    /// Compare two values.
    #[must_use]
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
        }
    }
}

/// A bounded world query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    EnemiesInRadius { radius: f64 },
    AlliesInRadius { radius: f64 },
}

/// A numeric expression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Const(f64),
    Stat {
        #[serde(default)]
        entity: EntityRef,
        stat: String,
    },
    /// The payload's primary amount.
    Amount,
    /// An indexed payload value.
    Value(usize),
    HasTag(String),
    /// Resolved stack count of the running effect.
    Stacks,
    Local(String),
    /// Uniform in `[0, 1)`.
    Roll,
    Count(Box<Query>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Min(Box<Expr>, Box<Expr>),
    Max(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn constant(value: f64) -> Self {
        Self::Const(value)
    }

    pub fn one() -> Self {
        Self::Const(1.0)
    }

    pub fn zero() -> Self {
        Self::Const(0.0)
    }

    pub fn stat(entity: EntityRef, stat: impl Into<String>) -> Self {
        Self::Stat {
            entity,
            stat: stat.into(),
        }
    }

    pub fn local(name: impl Into<String>) -> Self {
        Self::Local(name.into())
    }

    pub fn count(query: Query) -> Self {
        Self::Count(Box::new(query))
    }

    pub fn add(lhs: Expr, rhs: Expr) -> Self {
        Self::Add(Box::new(lhs), Box::new(rhs))
    }

    pub fn sub(lhs: Expr, rhs: Expr) -> Self {
        Self::Sub(Box::new(lhs), Box::new(rhs))
    }

    pub fn mul(lhs: Expr, rhs: Expr) -> Self {
        Self::Mul(Box::new(lhs), Box::new(rhs))
    }

    pub fn div(lhs: Expr, rhs: Expr) -> Self {
        Self::Div(Box::new(lhs), Box::new(rhs))
    }

    pub fn cmp(op: CmpOp, lhs: Expr, rhs: Expr) -> Self {
        Self::Cmp(op, Box::new(lhs), Box::new(rhs))
    }

    fn validate(&self, in_loop: bool) -> Result<(), DescriptorError> {
        match self {
            Self::Const(v) if !v.is_finite() => Err(DescriptorError::NonFinite),
            Self::Const(_)
            | Self::Amount
            | Self::Value(_)
            | Self::HasTag(_)
            | Self::Stacks
            | Self::Local(_)
            | Self::Roll => Ok(()),
            Self::Stat { entity, stat } => {
                if stat.is_empty() {
                    return Err(DescriptorError::EmptyStat);
                }
                check_entity(*entity, in_loop)
            }
            Self::Count(query) => query.validate(),
            Self::Add(a, b)
            | Self::Sub(a, b)
            | Self::Mul(a, b)
            | Self::Div(a, b)
            | Self::Min(a, b)
            | Self::Max(a, b)
            | Self::Cmp(_, a, b)
            | Self::And(a, b)
            | Self::Or(a, b) => {
                a.validate(in_loop)?;
                b.validate(in_loop)
            }
            Self::Neg(a) | Self::Not(a) => a.validate(in_loop),
        }
    }
}

impl Query {
    fn validate(&self) -> Result<(), DescriptorError> {
        match self {
            Self::EnemiesInRadius { radius } | Self::AlliesInRadius { radius } => {
                if radius.is_finite() {
                    Ok(())
                } else {
                    Err(DescriptorError::NonFinite)
                }
            }
        }
    }
}

fn check_entity(entity: EntityRef, in_loop: bool) -> Result<(), DescriptorError> {
    if entity == EntityRef::Each && !in_loop {
        Err(DescriptorError::NoLoopEntity)
    } else {
        Ok(())
    }
}

fn default_kind() -> ModifierKind {
    ModifierKind::Additive
}

fn default_target() -> EntityRef {
    EntityRef::Target
}

/// One script statement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instr {
    Let {
        name: String,
        value: Expr,
    },
    If {
        condition: Expr,
        then: Vec<Instr>,
        #[serde(default)]
        otherwise: Vec<Instr>,
    },
    ForEach {
        query: Query,
        body: Vec<Instr>,
    },
    ApplyModifier {
        #[serde(default)]
        target: EntityRef,
        stat: String,
        #[serde(default = "default_kind")]
        kind: ModifierKind,
        value: Expr,
        /// Lifetime in ticks; permanent while the effect is active if absent.
        #[serde(default)]
        duration: Option<u32>,
    },
    Damage {
        #[serde(default = "default_target")]
        target: EntityRef,
        amount: Expr,
    },
    Spawn {
        kind: String,
        #[serde(default)]
        at: EntityRef,
        #[serde(default = "Expr::one")]
        count: Expr,
    },
    Emit {
        trigger: TriggerKind,
        #[serde(default)]
        target: Option<EntityRef>,
        #[serde(default = "Expr::zero")]
        amount: Expr,
    },
    Cue(String),
    ConsumeSelf,
}

impl Instr {
    /// Permanent additive modifier on the actor.
    pub fn modify(stat: impl Into<String>, value: Expr) -> Self {
        Self::ApplyModifier {
            target: EntityRef::Actor,
            stat: stat.into(),
            kind: ModifierKind::Additive,
            value,
            duration: None,
        }
    }

    /// Modifier with explicit target and kind.
    pub fn modifier(target: EntityRef, stat: impl Into<String>, kind: ModifierKind, value: Expr) -> Self {
        Self::ApplyModifier {
            target,
            stat: stat.into(),
            kind,
            value,
            duration: None,
        }
    }

    /// Timed variant of [`Instr::modifier`].
    pub fn timed(
        target: EntityRef,
        stat: impl Into<String>,
        kind: ModifierKind,
        value: Expr,
        ticks: u32,
    ) -> Self {
        Self::ApplyModifier {
            target,
            stat: stat.into(),
            kind,
            value,
            duration: Some(ticks),
        }
    }

    pub fn damage(target: EntityRef, amount: Expr) -> Self {
        Self::Damage { target, amount }
    }

    pub fn emit(trigger: TriggerKind, amount: Expr) -> Self {
        Self::Emit {
            trigger,
            target: None,
            amount,
        }
    }

    pub fn cue(name: impl Into<String>) -> Self {
        Self::Cue(name.into())
    }

    pub fn when(condition: Expr, then: Vec<Instr>) -> Self {
        Self::If {
            condition,
            then,
            otherwise: Vec::new(),
        }
    }

    pub fn for_each(query: Query, body: Vec<Instr>) -> Self {
        Self::ForEach { query, body }
    }

    fn validate(&self, depth: usize, in_loop: bool) -> Result<(), DescriptorError> {
        match self {
            Self::Let { value, .. } => value.validate(in_loop),
            Self::If {
                condition,
                then,
                otherwise,
            } => {
                condition.validate(in_loop)?;
                validate_block(then, depth + 1, in_loop)?;
                validate_block(otherwise, depth + 1, in_loop)
            }
            Self::ForEach { query, body } => {
                query.validate()?;
                validate_block(body, depth + 1, true)
            }
            Self::ApplyModifier {
                target,
                stat,
                value,
                ..
            } => {
                if stat.is_empty() {
                    return Err(DescriptorError::EmptyStat);
                }
                check_entity(*target, in_loop)?;
                value.validate(in_loop)
            }
            Self::Damage { target, amount } => {
                check_entity(*target, in_loop)?;
                amount.validate(in_loop)
            }
            Self::Spawn { at, count, .. } => {
                check_entity(*at, in_loop)?;
                count.validate(in_loop)
            }
            Self::Emit {
                trigger,
                target,
                amount,
            } => {
                if !trigger.is_event() {
                    return Err(DescriptorError::Malformed(format!(
                        "cannot emit `{}`",
                        trigger
                    )));
                }
                if let Some(target) = target {
                    check_entity(*target, in_loop)?;
                }
                amount.validate(in_loop)
            }
            Self::Cue(_) | Self::ConsumeSelf => Ok(()),
        }
    }
}

fn validate_block(block: &[Instr], depth: usize, in_loop: bool) -> Result<(), DescriptorError> {
    if depth > MAX_NESTING {
        return Err(DescriptorError::TooDeep {
            depth,
            limit: MAX_NESTING,
        });
    }
    block.iter().try_for_each(|instr| instr.validate(depth, in_loop))
}

/// A compiled effect body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script(Vec<Instr>);

impl Script {
    pub fn new(instructions: Vec<Instr>) -> Self {
        Self(instructions)
    }

    /// Top-level instructions.
    #[must_use]
    pub fn instructions(&self) -> &[Instr] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Static checks run when the catalog is built.
    ///
    /// Rejects loop-entity references outside `for_each`, empty stat names,
    /// non-finite constants, emitting `passive`, and nesting deeper than
    /// [`MAX_NESTING`]. Locals are resolved at run time.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        validate_block(&self.0, 0, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let json = r#"[
            { "let": { "name": "n", "value": { "count": { "enemies_in_radius": { "radius": 5.0 } } } } },
            { "if": {
                "condition": { "cmp": ["ge", { "local": "n" }, { "const": 3.0 }] },
                "then": [ { "cue": "frenzy" } ]
            } },
            { "for_each": {
                "query": { "enemies_in_radius": { "radius": 5.0 } },
                "body": [ { "damage": { "target": "each", "amount": "amount" } } ]
            } },
            "consume_self"
        ]"#;
        let script: Script = serde_json::from_str(json).unwrap();

        assert_eq!(script.len(), 4);
        assert!(matches!(&script.instructions()[1], Instr::If { otherwise, .. } if otherwise.is_empty()));
        assert_eq!(script.instructions()[3], Instr::ConsumeSelf);
        assert!(script.validate().is_ok());
    }

    #[test]
    fn test_modifier_defaults() {
        let json = r#"{ "apply_modifier": { "stat": "speed", "value": { "const": 1.2 } } }"#;
        let instr: Instr = serde_json::from_str(json).unwrap();
        assert_eq!(instr, Instr::modify("speed", Expr::constant(1.2)));
    }

    #[test]
    fn test_loop_entity_outside_loop() {
        let script = Script::new(vec![Instr::damage(EntityRef::Each, Expr::one())]);
        assert_eq!(script.validate(), Err(DescriptorError::NoLoopEntity));

        let script = Script::new(vec![Instr::for_each(
            Query::AlliesInRadius { radius: 2.0 },
            vec![Instr::damage(EntityRef::Each, Expr::one())],
        )]);
        assert!(script.validate().is_ok());
    }

    #[test]
    fn test_non_finite_constant() {
        let script = Script::new(vec![Instr::modify("hp", Expr::constant(f64::NAN))]);
        assert_eq!(script.validate(), Err(DescriptorError::NonFinite));
    }

    #[test]
    fn test_emit_passive_rejected() {
        let script = Script::new(vec![Instr::emit(TriggerKind::Passive, Expr::zero())]);
        assert!(matches!(script.validate(), Err(DescriptorError::Malformed(_))));
    }

    #[test]
    fn test_nesting_limit() {
        let mut block = vec![Instr::cue("deep")];
        for _ in 0..=MAX_NESTING {
            block = vec![Instr::when(Expr::one(), block)];
        }
        let script = Script::new(block);
        assert!(matches!(
            script.validate(),
            Err(DescriptorError::TooDeep { limit: MAX_NESTING, .. })
        ));
    }

    #[test]
    fn test_cmp_op() {
        assert!(CmpOp::Lt.apply(1.0, 2.0));
        assert!(!CmpOp::Ge.apply(1.0, 2.0));
        assert!(CmpOp::Ne.apply(1.0, 2.0));
        assert!(CmpOp::Eq.apply(2.0, 2.0));
    }
}
