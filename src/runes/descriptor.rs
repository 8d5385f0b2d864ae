//! Effect descriptors - the immutable unit of behaviour.
//!
//! An `EffectDescriptor` binds a script to a trigger with a priority and a
//! stacking policy. Descriptors are created when the catalog loads and are
//! shared by `Arc` between every owner; nothing mutates them afterwards.

use serde::{Deserialize, Serialize};

use crate::core::{DescriptorError, ModifierKind};
use crate::rune_script::Script;
use crate::triggers::TriggerKind;

/// Unique identifier for an effect descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectId(pub u32);

impl EffectId {
    /// Create a new effect ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for EffectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Effect({})", self.0)
    }
}

/// How repeated copies or applications of one effect combine.
///
/// Magnitude of a modifier with base value `v` at `n` stacks:
///
/// | policy                  | additive | multiplicative    | override |
/// |-------------------------|----------|-------------------|----------|
/// | `NonStacking`           | `v`      | `v`               | `v`      |
/// | `StackLinear(max)`      | `v·n`    | `1 + (v − 1)·n`   | `v`      |
/// | `StackMultiplicative(max)` | `v·n` | `vⁿ`              | `v`      |
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "policy", content = "max", rename_all = "snake_case")]
pub enum StackingPolicy {
    #[default]
    NonStacking,
    StackLinear(u32),
    StackMultiplicative(u32),
}

impl StackingPolicy {
    /// Stack cap. Non-stacking effects cap at one.
    #[must_use]
    pub const fn max_stacks(self) -> u32 {
        match self {
            Self::NonStacking => 1,
            Self::StackLinear(max) | Self::StackMultiplicative(max) => {
                if max == 0 {
                    1
                } else {
                    max
                }
            }
        }
    }

    /// Whether more than one stack is possible.
    #[must_use]
    pub const fn is_stacking(self) -> bool {
        self.max_stacks() > 1
    }

    /// Combine per-source stack counts into one capped count (at least 1).
    #[must_use]
    pub fn combine(self, counts: impl IntoIterator<Item = u32>) -> u32 {
        let total = counts.into_iter().fold(0u32, u32::saturating_add);
        total.clamp(1, self.max_stacks())
    }

    /// Stack count after one more application.
    #[must_use]
    pub fn next(self, stacks: u32) -> u32 {
        stacks.saturating_add(1).min(self.max_stacks())
    }

    /// Effective modifier magnitude of `value` at `stacks` stacks.
    #[must_use]
    pub fn scale(self, kind: ModifierKind, value: f64, stacks: u32) -> f64 {
        let n = f64::from(stacks.clamp(1, self.max_stacks()));
        match (self, kind) {
            (_, ModifierKind::Override) | (Self::NonStacking, _) => value,
            (_, ModifierKind::Additive) => value * n,
            (Self::StackLinear(_), ModifierKind::Multiplicative) => 1.0 + (value - 1.0) * n,
            (Self::StackMultiplicative(_), ModifierKind::Multiplicative) => {
                value.powf(n)
            }
        }
    }
}

/// A descriptor's script, or the reason it could not be used.
///
/// Malformed scripts are kept in the catalog instead of failing the load:
/// only evaluations of that one descriptor fail.
#[derive(Clone, Debug, PartialEq)]
pub enum ScriptBody {
    Compiled(Script),
    Malformed(DescriptorError),
}

/// Static effect definition.
///
/// ## Example
///
/// ```
/// use rune_engine::core::ModifierKind;
/// use rune_engine::rune_script::{Expr, Instr, Script};
/// use rune_engine::runes::{EffectDescriptor, EffectId, StackingPolicy};
/// use rune_engine::triggers::TriggerKind;
///
/// let bloodlust = EffectDescriptor::new(EffectId::new(1), "Bloodlust", TriggerKind::OnKill)
///     .with_stacking(StackingPolicy::StackLinear(3))
///     .with_script(Script::new(vec![Instr::modify("damage", Expr::constant(5.0))]));
///
/// assert!(bloodlust.is_valid());
/// assert_eq!(bloodlust.stacking.max_stacks(), 3);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct EffectDescriptor {
    pub id: EffectId,
    pub name: String,
    pub description: String,
    pub trigger: TriggerKind,
    /// Lower runs first.
    pub priority: i32,
    pub script: ScriptBody,
    pub stacking: StackingPolicy,
}

impl EffectDescriptor {
    /// Create a descriptor with an empty script.
    pub fn new(id: EffectId, name: impl Into<String>, trigger: TriggerKind) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            trigger,
            priority: 0,
            script: ScriptBody::Compiled(Script::default()),
            stacking: StackingPolicy::default(),
        }
    }

    /// Set the display description (builder pattern).
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the priority (builder pattern).
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the stacking policy (builder pattern).
    #[must_use]
    pub fn with_stacking(mut self, stacking: StackingPolicy) -> Self {
        self.stacking = stacking;
        self
    }

    /// Set the script (builder pattern).
    #[must_use]
    pub fn with_script(mut self, script: Script) -> Self {
        self.script = ScriptBody::Compiled(script);
        self
    }

    /// Mark the script as malformed (builder pattern).
    #[must_use]
    pub fn with_defect(mut self, error: DescriptorError) -> Self {
        self.script = ScriptBody::Malformed(error);
        self
    }

    /// The compiled script, or the defect recorded at load time.
    pub fn script(&self) -> Result<&Script, &DescriptorError> {
        match &self.script {
            ScriptBody::Compiled(script) => Ok(script),
            ScriptBody::Malformed(err) => Err(err),
        }
    }

    /// Whether the script compiled.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self.script, ScriptBody::Compiled(_))
    }
}
