//! Loadout, synergy and snapshot integration tests.
//!
//! Includes property tests for the stacking cap, pickup/removal symmetry
//! and order-independence of synergy activation.

use std::sync::Arc;

use proptest::prelude::*;

use rune_engine::core::{EngineConfig, EntityId, Faction, ModifierKind, SimWorld, StatBlock};
use rune_engine::engine::EffectEngine;
use rune_engine::items::{AddOutcome, LoadoutSnapshot};
use rune_engine::rune_script::{EntityRef, Expr, Instr, Script};
use rune_engine::runes::{
    Catalog, CollectibleDefinition, CollectibleId, EffectDescriptor, EffectId, StackingPolicy,
};
use rune_engine::synergies::{MatchPolicy, SynergyDefinition, SynergyId};
use rune_engine::triggers::TriggerKind;

const X: CollectibleId = CollectibleId(1);
const Y: CollectibleId = CollectibleId(2);
const W: CollectibleId = CollectibleId(3);
const STACKER: CollectibleId = CollectibleId(4);
const Z: EffectId = EffectId(100);
const CONVERGENCE: SynergyId = SynergyId(1);

fn passive(id: u32, stat: &str, value: f64) -> EffectDescriptor {
    EffectDescriptor::new(EffectId(id), format!("Passive {id}"), TriggerKind::Passive)
        .with_script(Script::new(vec![Instr::modify(stat, Expr::constant(value))]))
}

/// X and Y each add flat damage; together they unlock Z (+50% damage).
fn catalog() -> Arc<Catalog> {
    let catalog = Catalog::builder()
        .effect(passive(1, "damage", 2.0))
        .effect(passive(2, "damage", 3.0))
        .effect(passive(3, "speed", 1.0))
        .effect(
            passive(4, "armor", 1.0).with_stacking(StackingPolicy::StackMultiplicative(4)),
        )
        .effect(
            EffectDescriptor::new(Z, "Convergence", TriggerKind::Passive).with_script(Script::new(vec![
                Instr::modifier(EntityRef::Actor, "damage", ModifierKind::Multiplicative, Expr::constant(1.5)),
            ])),
        )
        .collectible(CollectibleDefinition::rune(X, "X").with_effect(EffectId(1)).with_tag("arcane"))
        .collectible(CollectibleDefinition::item(Y, "Y").with_effect(EffectId(2)))
        .collectible(CollectibleDefinition::rune(W, "W").with_effect(EffectId(3)).with_tag("arcane"))
        .collectible(
            CollectibleDefinition::item(STACKER, "Plating")
                .with_effect(EffectId(4))
                .with_refund(10),
        )
        .synergy(
            SynergyDefinition::new(CONVERGENCE, "Convergence")
                .requires(X)
                .requires(Y)
                .with_bonus(Z),
        )
        .synergy(
            SynergyDefinition::new(SynergyId(2), "Twin Arcana")
                .requires_tag("arcane")
                .requires_tag("arcane")
                .with_policy(MatchPolicy::Exact)
                .with_bonus(EffectId(3)),
        )
        .build()
        .unwrap();
    Arc::new(catalog)
}

fn arena() -> (SimWorld, EntityId) {
    let mut world = SimWorld::new();
    let player = world.spawn(
        Faction::Player,
        [0.0, 0.0],
        StatBlock::new()
            .with_base("damage", 10.0)
            .with_base("speed", 4.0)
            .with_base("armor", 1.0),
    );
    (world, player)
}

fn stats(world: &SimWorld, player: EntityId) -> [i64; 3] {
    [
        world.stat(player, "damage"),
        world.stat(player, "speed"),
        world.stat(player, "armor"),
    ]
}

// =============================================================================
// Synergies
// =============================================================================

/// X + Y activates Z; removing Y deactivates Z and reverts it exactly.
#[test]
fn test_synergy_activation_and_reversion() {
    let (mut world, player) = arena();
    let mut engine = EffectEngine::new(catalog(), EngineConfig::new(), player);

    engine.add_instance(X, &mut world).unwrap();
    assert_eq!(world.stat(player, "damage"), 12);

    let y = engine.add_instance(Y, &mut world).unwrap();
    assert_eq!(y.synergies.activated, vec![CONVERGENCE]);
    assert!(engine.current_active_effects().contains(Z));
    // (10 + 2 + 3) * 1.5
    assert_eq!(world.stat(player, "damage"), 23);

    let removed = engine.remove_instance(y.outcome.instance(), &mut world).unwrap();
    assert_eq!(removed.synergies.deactivated, vec![CONVERGENCE]);
    assert!(!engine.current_active_effects().contains(Z));
    assert_eq!(world.stat(player, "damage"), 12);
}

/// An exact two-tag synergy needs two distinct collectibles.
#[test]
fn test_exact_synergy_needs_distinct_collectibles() {
    let (mut world, player) = arena();
    let mut engine = EffectEngine::new(catalog(), EngineConfig::new(), player);

    engine.add_instance(X, &mut world).unwrap();
    assert!(!engine.synergies().is_satisfied(SynergyId(2)));

    let status = engine.synergy_status();
    let twin = status.iter().find(|s| s.id == SynergyId(2)).unwrap();
    assert!(twin.near);

    engine.add_instance(W, &mut world).unwrap();
    assert!(engine.synergies().is_satisfied(SynergyId(2)));
}

/// A synergy bonus that a collectible also grants directly is only active
/// once, and stays when the synergy breaks.
#[test]
fn test_bonus_shared_with_collectible() {
    let (mut world, player) = arena();
    let mut engine = EffectEngine::new(catalog(), EngineConfig::new(), player);

    let x = engine.add_instance(X, &mut world).unwrap().outcome.instance();
    engine.add_instance(W, &mut world).unwrap();
    // Effect 3 is granted by W and by Twin Arcana.
    assert_eq!(world.stat(player, "speed"), 5);

    engine.remove_instance(x, &mut world).unwrap();
    assert!(engine.current_active_effects().contains(EffectId(3)));
    assert_eq!(world.stat(player, "speed"), 5);
}

// =============================================================================
// Overflow
// =============================================================================

/// Pickups past the cap convert to a refund and leave stats unchanged.
#[test]
fn test_overflow_refund() {
    let (mut world, player) = arena();
    let mut engine = EffectEngine::new(catalog(), EngineConfig::new(), player);

    for _ in 0..4 {
        engine.add_instance(STACKER, &mut world).unwrap();
    }
    let before = stats(&world, player);

    let change = engine.add_instance(STACKER, &mut world).unwrap();
    match change.outcome {
        AddOutcome::Converted { refund, .. } => assert_eq!(refund.value, 10),
        other => panic!("expected refund, got {other:?}"),
    }
    assert_eq!(stats(&world, player), before);
    assert_eq!(engine.loadout().find(STACKER).unwrap().stacks, 4);
}

// =============================================================================
// Snapshots
// =============================================================================

/// Restoring a snapshot into a fresh engine reproduces loadout, active set
/// and stats.
#[test]
fn test_snapshot_round_trip() {
    let (mut world, player) = arena();
    let mut engine = EffectEngine::new(catalog(), EngineConfig::new(), player);
    for id in [X, STACKER, Y, STACKER, W] {
        engine.add_instance(id, &mut world).unwrap();
    }
    let expected = stats(&world, player);

    let bytes = engine.snapshot().to_bytes().unwrap();
    let snapshot = LoadoutSnapshot::from_bytes(&bytes).unwrap();

    let (mut fresh_world, fresh_player) = arena();
    let mut restored = EffectEngine::new(catalog(), EngineConfig::new(), fresh_player);
    restored.restore(&snapshot, &mut fresh_world).unwrap();

    assert_eq!(restored.loadout(), engine.loadout());
    assert_eq!(
        restored.current_active_effects().ids().collect::<Vec<_>>(),
        engine.current_active_effects().ids().collect::<Vec<_>>()
    );
    assert_eq!(stats(&fresh_world, fresh_player), expected);

    // Restoring over a live engine replaces its state.
    engine.restore(&LoadoutSnapshot::capture(&Default::default()), &mut world).unwrap();
    assert!(engine.loadout().is_empty());
    assert_eq!(stats(&world, player), [10, 4, 1]);
}

/// A snapshot naming an unknown collectible is rejected without touching
/// the engine.
#[test]
fn test_snapshot_rejects_unknown_collectible() {
    let (mut world, player) = arena();
    let mut engine = EffectEngine::new(catalog(), EngineConfig::new(), player);
    engine.add_instance(X, &mut world).unwrap();

    let mut snapshot = engine.snapshot();
    snapshot.entries[0].collectible = CollectibleId(999);

    assert!(engine.restore(&snapshot, &mut world).is_err());
    assert_eq!(engine.loadout().len(), 1);
    assert_eq!(world.stat(player, "damage"), 12);
}

// =============================================================================
// Properties
// =============================================================================

fn pickup() -> impl Strategy<Value = CollectibleId> {
    prop::sample::select(vec![X, Y, W, STACKER])
}

proptest! {
    /// No instance or active effect ever exceeds its stacking cap.
    #[test]
    fn prop_stacks_never_exceed_cap(pickups in prop::collection::vec(pickup(), 0..24)) {
        let catalog = catalog();
        let (mut world, player) = arena();
        let mut engine = EffectEngine::new(Arc::clone(&catalog), EngineConfig::new(), player);

        for id in pickups {
            engine.add_instance(id, &mut world).unwrap();
            for instance in engine.loadout().iter() {
                prop_assert!(instance.stacks <= catalog.pickup_cap(instance.collectible));
            }
            for effect in engine.current_active_effects().iter() {
                prop_assert!(effect.stacks >= 1);
                prop_assert!(effect.stacks <= effect.descriptor.stacking.max_stacks());
            }
        }
    }

    /// Picking things up and then removing all of it restores every stat.
    #[test]
    fn prop_add_then_remove_restores_stats(pickups in prop::collection::vec(pickup(), 0..12)) {
        let (mut world, player) = arena();
        let mut engine = EffectEngine::new(catalog(), EngineConfig::new(), player);
        let base = stats(&world, player);

        for id in pickups {
            engine.add_instance(id, &mut world).unwrap();
        }
        loop {
            let Some(instance) = engine.loadout().iter().next().map(|i| i.id) else {
                break;
            };
            engine.remove_instance(instance, &mut world).unwrap();
        }

        prop_assert_eq!(stats(&world, player), base);
        prop_assert!(engine.ledger().is_empty());
        prop_assert!(engine.current_active_effects().is_empty());
    }

    /// Satisfied synergies and final stats depend only on what is owned,
    /// not the order it was picked up in.
    #[test]
    fn prop_synergies_order_independent(
        pickups in prop::collection::vec(pickup(), 0..10),
        seed in any::<u64>(),
    ) {
        let mut shuffled = pickups.clone();
        rune_engine::core::EffectRng::new(seed).shuffle(&mut shuffled);

        let run = |order: &[CollectibleId]| {
            let (mut world, player) = arena();
            let mut engine = EffectEngine::new(catalog(), EngineConfig::new(), player);
            for id in order {
                engine.add_instance(*id, &mut world).unwrap();
            }
            (engine.synergies().satisfied().clone(), stats(&world, player))
        };

        prop_assert_eq!(run(&pickups), run(&shuffled));
    }
}
