//! Loadout and stacking resolution.
//!
//! ## Key Components
//!
//! - [`Loadout`]: owned instances in acquisition order, pickup/removal rules
//! - [`ActiveEffectSet`]: derived, persistent map of live effects
//! - [`ModifierLedger`]: exact record of committed stat modifiers
//! - [`LoadoutSnapshot`]: save/load form of the loadout
//!
//! ## Overflow
//!
//! A stacking collectible picked up at its cap is converted into a
//! [`Refund`] for the collectible's `refund` value; the loadout does not
//! change. A non-stacking duplicate is a no-op.

mod active;
mod instance;
mod ledger;
mod loadout;
mod snapshot;

pub use active::{ActiveDiff, ActiveEffect, ActiveEffectSet, EffectSource};
pub use instance::{InstanceId, LoadoutInstance};
pub use ledger::{Commit, LedgerEntry, LedgerKey, ModifierLedger};
pub use loadout::{AddOutcome, Loadout, Refund, RemoveOutcome};
pub use snapshot::{LoadoutSnapshot, SnapshotEntry};
