//! The effect engine: one per player.
//!
//! ## Key Components
//!
//! - [`EffectEngine`]: loadout changes, event firing, ticks and snapshots
//! - [`FireReport`]: what a firing did, including [`HostCommand`]s for the host
//! - [`LoadoutChange`]: outcome of a pickup or removal
//! - [`Diagnostics`]: counters for everything that went wrong quietly

mod diagnostics;
mod effect_engine;
mod report;

pub use diagnostics::Diagnostics;
pub use effect_engine::EffectEngine;
pub use report::{FireReport, HostCommand, LoadoutChange};
