//! The per-player effect engine.
//!
//! Wires the pieces together:
//!
//! ```text
//! loadout change -> synergy recompute -> active set rebuild -> dispatcher rebuild
//!                                                           -> passive (re)application
//! fire(event)    -> bound effects in order -> interpreter -> ledger commits
//!                                                         -> host commands
//!                                                         -> follow-up queue
//! ```
//!
//! The engine owns all effect state but borrows the host world per call.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::diagnostics::Diagnostics;
use super::report::{FireReport, HostCommand, LoadoutChange};
use crate::core::{
    CapacityError, ConsistencyError, DescriptorError, EffectRng, EngineConfig, EntityId, LoadoutError, Simulation,
    SnapshotError,
};
use crate::items::{
    ActiveEffect, ActiveEffectSet, AddOutcome, Commit, EffectSource, InstanceId, Loadout,
    LoadoutSnapshot, ModifierLedger, RemoveOutcome,
};
use crate::rune_script::{EffectOutcome, EvaluationContext, Interpreter};
use crate::runes::{Catalog, CollectibleId, EffectDescriptor, EffectId};
use crate::synergies::{synergy_status, SynergyDiff, SynergyEngine, SynergyStatus};
use crate::triggers::{Dispatcher, FollowUpQueue, Payload, TriggerEvent, TriggerKind};

/// Per-firing scratch state.
struct Firing {
    queue: FollowUpQueue,
    report: FireReport,
    broken: Option<ConsistencyError>,
}

/// Effect resolution for one player.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use rune_engine::core::{EngineConfig, Faction, SimWorld, StatBlock};
/// use rune_engine::engine::EffectEngine;
/// use rune_engine::rune_script::{Expr, Instr, Script};
/// use rune_engine::runes::{Catalog, CollectibleDefinition, CollectibleId, EffectDescriptor, EffectId};
/// use rune_engine::triggers::TriggerKind;
///
/// let catalog = Catalog::builder()
///     .effect(
///         EffectDescriptor::new(EffectId::new(1), "Might", TriggerKind::Passive)
///             .with_script(Script::new(vec![Instr::modify("damage", Expr::constant(3.0))])),
///     )
///     .collectible(CollectibleDefinition::rune(CollectibleId::new(1), "Might Rune").with_effect(EffectId::new(1)))
///     .build()
///     .unwrap();
///
/// let mut world = SimWorld::new();
/// let player = world.spawn(Faction::Player, [0.0, 0.0], StatBlock::new().with_base("damage", 10.0));
///
/// let mut engine = EffectEngine::new(Arc::new(catalog), EngineConfig::new(), player);
/// engine.add_instance(CollectibleId::new(1), &mut world).unwrap();
///
/// assert_eq!(world.stat(player, "damage"), 13);
/// ```
pub struct EffectEngine {
    catalog: Arc<Catalog>,
    config: EngineConfig,
    owner: EntityId,
    loadout: Loadout,
    synergies: SynergyEngine,
    active: ActiveEffectSet,
    dispatcher: Dispatcher,
    ledger: ModifierLedger,
    interpreter: Interpreter,
    rng: EffectRng,
    now: u64,
    diagnostics: Diagnostics,
}

impl EffectEngine {
    /// Create an engine for `owner` with an empty loadout.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, config: EngineConfig, owner: EntityId) -> Self {
        Self {
            interpreter: Interpreter::new(&config),
            rng: EffectRng::new(config.seed),
            catalog,
            config,
            owner,
            loadout: Loadout::new(),
            synergies: SynergyEngine::new(),
            active: ActiveEffectSet::new(),
            dispatcher: Dispatcher::new(),
            ledger: ModifierLedger::new(),
            now: 0,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Create an engine over the process-wide catalog, if one is installed.
    #[must_use]
    pub fn from_global(config: EngineConfig, owner: EntityId) -> Option<Self> {
        Catalog::global().map(|catalog| Self::new(catalog, config, owner))
    }

    // === Loadout ===

    /// Pick up a collectible.
    ///
    /// Fires `on_pickup` (payload value 0 is the collectible id) when the
    /// loadout actually changed.
    pub fn add_instance(
        &mut self,
        collectible: CollectibleId,
        world: &mut dyn Simulation,
    ) -> Result<LoadoutChange<AddOutcome>, LoadoutError> {
        let catalog = Arc::clone(&self.catalog);
        let definition = catalog
            .collectible(collectible)
            .ok_or(LoadoutError::UnknownCollectible(collectible))?;
        let outcome = self.loadout.add(definition, catalog.pickup_cap(collectible));

        match outcome {
            AddOutcome::Converted { refund, .. } => {
                self.diagnostics.refunds += 1;
                info!(%collectible, refund = refund.value, "pickup over stack cap converted to refund");
            }
            AddOutcome::AlreadyPresent { instance } => {
                self.diagnostics.duplicates += 1;
                debug!(%collectible, %instance, "duplicate non-stacking pickup ignored");
            }
            AddOutcome::Added { .. } | AddOutcome::Stacked { .. } => {}
        }

        if !outcome.changed() {
            return Ok(LoadoutChange {
                outcome,
                synergies: SynergyDiff::default(),
                report: FireReport::default(),
            });
        }

        let synergies = self.refresh(world);
        let payload = Payload::new().with_value(f64::from(collectible.raw()));
        let report = self.fire(TriggerKind::OnPickup, payload, self.owner, world);
        Ok(LoadoutChange {
            outcome,
            synergies,
            report,
        })
    }

    /// Remove one stack of an instance.
    ///
    /// Fires `on_remove` first, while the instance's own effects are still
    /// active, then reverts whatever the change deactivates.
    pub fn remove_instance(
        &mut self,
        instance: InstanceId,
        world: &mut dyn Simulation,
    ) -> Result<LoadoutChange<RemoveOutcome>, LoadoutError> {
        let collectible = self
            .loadout
            .get(instance)
            .ok_or(LoadoutError::UnknownInstance(instance))?
            .collectible;

        let payload = Payload::new().with_value(f64::from(collectible.raw()));
        let report = self.fire(TriggerKind::OnRemove, payload, self.owner, world);

        // The on_remove firing may have consumed the instance already.
        let outcome = if self.loadout.get(instance).is_some() {
            self.loadout.remove(instance)?
        } else {
            RemoveOutcome::Removed {
                instance,
                collectible,
            }
        };
        let synergies = self.refresh(world);

        Ok(LoadoutChange {
            outcome,
            synergies,
            report,
        })
    }

    // === Events ===

    /// Fire an event and drain every follow-up it causes.
    ///
    /// Bound effects run in dispatcher order against the active set as it
    /// was when the firing started. Removals requested with `consume_self`
    /// are applied once the whole chain has been dispatched.
    pub fn fire(
        &mut self,
        kind: TriggerKind,
        payload: Payload,
        actor: EntityId,
        world: &mut dyn Simulation,
    ) -> FireReport {
        if !kind.is_event() {
            debug!(trigger = %kind, "ignoring fire of a non-event trigger");
            return FireReport::default();
        }

        let active = self.active.clone();
        let dispatcher = self.dispatcher.clone();
        let mut firing = Firing {
            queue: FollowUpQueue::new(self.config.max_chain_depth),
            report: FireReport::default(),
            broken: None,
        };
        firing.queue.push(TriggerEvent::root(kind, actor, payload));

        while let Some(event) = firing.queue.pop() {
            for binding in dispatcher.bound(event.kind) {
                let Some(entry) = active.get(binding.effect) else {
                    continue;
                };
                firing.report.evaluated += 1;
                self.diagnostics.evaluations += 1;

                let ctx = EvaluationContext::new(event.actor, &event.payload, &*world)
                    .with_stacks(entry.stacks)
                    .with_rng(self.rng.fork());
                match self.interpreter.evaluate(&entry.descriptor, ctx) {
                    Ok(outcome) => {
                        firing.report.fired.push(entry.id());
                        self.commit(world, entry, outcome, &event, &mut firing);
                    }
                    Err(err) => {
                        firing.report.failed += 1;
                        self.descriptor_failed(&entry.descriptor, &err);
                    }
                }
            }
        }

        let dropped = firing.queue.dropped();
        if dropped > 0 {
            let limit = self.config.max_chain_depth;
            warn!(trigger = %kind, limit, dropped, "follow-up chain exceeded max depth; remaining chain dropped");
            self.diagnostics.chain_truncations += 1;
            self.diagnostics.capacity_errors += 1;
            firing
                .report
                .capacity
                .push(CapacityError::ChainDepth { limit, dropped });
        }

        if let Some(err) = firing.broken.take() {
            self.recover(world, &err);
        }

        let report = firing.report;
        if !report.consumed.is_empty() {
            for instance in &report.consumed {
                if let Err(err) = self.loadout.remove(*instance) {
                    debug!(%instance, error = %err, "consumed instance already gone");
                }
            }
            self.refresh(world);
        }
        report
    }

    /// Advance one simulation step.
    ///
    /// Expires timed modifiers whose tick has come, then fires `on_tick`
    /// with `delta` as the payload amount.
    pub fn tick(&mut self, delta: f64, world: &mut dyn Simulation) -> FireReport {
        self.now += 1;
        match self.ledger.expire(world, self.now) {
            Ok(expired) => self.diagnostics.expired_modifiers += expired as u64,
            Err(err) => self.recover(world, &err),
        }
        self.fire(TriggerKind::OnTick, Payload::tick(delta), self.owner, world)
    }

    /// Fire several events in order, collecting one report.
    pub fn fire_all(
        &mut self,
        events: impl IntoIterator<Item = (TriggerKind, Payload)>,
        world: &mut dyn Simulation,
    ) -> FireReport {
        let mut report = FireReport::default();
        for (kind, payload) in events {
            report.absorb(self.fire(kind, payload, self.owner, world));
        }
        report
    }

    // === Queries ===

    /// Snapshot of the active effects. Never aliases live state.
    #[must_use]
    pub fn current_active_effects(&self) -> ActiveEffectSet {
        self.active.clone()
    }

    /// Progress towards every synergy.
    #[must_use]
    pub fn synergy_status(&self) -> Vec<SynergyStatus> {
        synergy_status(&self.catalog, &self.loadout.collectible_counts())
    }

    #[must_use]
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    #[must_use]
    pub fn loadout(&self) -> &Loadout {
        &self.loadout
    }

    #[must_use]
    pub fn ledger(&self) -> &ModifierLedger {
        &self.ledger
    }

    #[must_use]
    pub fn synergies(&self) -> &SynergyEngine {
        &self.synergies
    }

    /// Ticks elapsed.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.now
    }

    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    // === Persistence ===

    /// Capture the loadout.
    #[must_use]
    pub fn snapshot(&self) -> LoadoutSnapshot {
        LoadoutSnapshot::capture(&self.loadout)
    }

    /// Replace the loadout with a snapshot and rebuild everything derived.
    ///
    /// On error nothing changes.
    pub fn restore(
        &mut self,
        snapshot: &LoadoutSnapshot,
        world: &mut dyn Simulation,
    ) -> Result<SynergyDiff, SnapshotError> {
        let loadout = snapshot.restore(&self.catalog)?;

        self.ledger.wipe(world);
        self.loadout = loadout;
        self.active = ActiveEffectSet::new();
        self.synergies.reset();
        Ok(self.refresh(world))
    }

    // === Internals ===

    /// Rebuild derived state after a loadout change.
    fn refresh(&mut self, world: &mut dyn Simulation) -> SynergyDiff {
        let counts = self.loadout.collectible_counts();
        let synergies = self.synergies.recompute(&self.catalog, &counts);
        let next = ActiveEffectSet::build(&self.catalog, &self.loadout, self.synergies.satisfied());
        let diff = self.active.diff(&next);
        self.active = next;
        self.dispatcher.rebuild(&self.active);

        let mut broken = None;
        for effect in &diff.removed {
            if let Err(err) = self.ledger.revert_effect(world, *effect) {
                broken.get_or_insert(err);
            }
        }
        for (effect, _, _) in &diff.restacked {
            if !self.is_passive(*effect) {
                continue;
            }
            let result = self
                .ledger
                .revert_effect(world, *effect)
                .and_then(|_| self.apply_passive(world, *effect));
            if let Err(err) = result {
                broken.get_or_insert(err);
            }
        }
        for effect in &diff.added {
            if let Err(err) = self.apply_passive(world, *effect) {
                broken.get_or_insert(err);
            }
        }

        if let Some(err) = broken {
            self.recover(world, &err);
        }

        debug!(
            active = self.active.len(),
            bindings = self.dispatcher.len(),
            added = diff.added.len(),
            removed = diff.removed.len(),
            "active effects rebuilt"
        );
        synergies
    }

    fn is_passive(&self, effect: EffectId) -> bool {
        self.active
            .get(effect)
            .is_some_and(|e| e.descriptor.trigger == TriggerKind::Passive)
    }

    /// Evaluate a passive effect and commit its modifiers at the resolved
    /// stack count. Non-passive effects are ignored.
    fn apply_passive(
        &mut self,
        world: &mut dyn Simulation,
        effect: EffectId,
    ) -> Result<(), ConsistencyError> {
        let Some(entry) = self.active.get(effect).cloned() else {
            return Ok(());
        };
        if entry.descriptor.trigger != TriggerKind::Passive {
            return Ok(());
        }

        let payload = Payload::new();
        let ctx = EvaluationContext::new(self.owner, &payload, &*world)
            .with_stacks(entry.stacks)
            .with_rng(self.rng.fork());
        self.diagnostics.evaluations += 1;
        let outcome = match self.interpreter.evaluate(&entry.descriptor, ctx) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.descriptor_failed(&entry.descriptor, &err);
                return Ok(());
            }
        };
        self.diagnostics.capacity_errors += outcome.capacity.len() as u64;

        for request in &outcome.merged_modifiers() {
            if !world.contains(request.entity) {
                continue;
            }
            self.ledger.commit(
                world,
                effect,
                entry.descriptor.stacking,
                request,
                Commit::Set(entry.stacks),
                self.now,
            )?;
        }
        Ok(())
    }

    /// Apply one triggered outcome.
    fn commit(
        &mut self,
        world: &mut dyn Simulation,
        entry: &ActiveEffect,
        outcome: EffectOutcome,
        event: &TriggerEvent,
        firing: &mut Firing,
    ) {
        let effect = entry.id();
        let policy = entry.descriptor.stacking;

        let merged = outcome.merged_modifiers();
        self.diagnostics.capacity_errors += outcome.capacity.len() as u64;
        firing.report.capacity.extend(outcome.capacity);

        for request in &merged {
            if !world.contains(request.entity) {
                debug!(%effect, entity = %request.entity, "modifier target no longer exists");
                continue;
            }
            if let Err(err) =
                self.ledger
                    .commit(world, effect, policy, request, Commit::Increment, self.now)
            {
                firing.broken.get_or_insert(err);
            }
        }

        for damage in outcome.damage {
            firing.report.commands.push(HostCommand::Damage {
                source: effect,
                target: damage.target,
                amount: damage.amount,
            });
        }
        for spawn in outcome.spawns {
            firing.report.commands.push(HostCommand::Spawn {
                source: effect,
                kind: spawn.kind,
                at: spawn.at,
                count: spawn.count,
            });
        }
        for name in outcome.cues {
            firing
                .report
                .commands
                .push(HostCommand::Cue { source: effect, name });
        }

        for follow_up in outcome.follow_ups {
            firing
                .queue
                .push(event.follow_up(follow_up.kind, follow_up.payload));
        }

        if outcome.consume_self {
            let source = entry.sources.iter().find_map(|s| match s {
                EffectSource::Instance(id) => Some(*id),
                EffectSource::Synergy(_) => None,
            });
            match source {
                Some(instance) if !firing.report.consumed.contains(&instance) => {
                    firing.report.consumed.push(instance);
                }
                Some(_) => {}
                None => debug!(%effect, "consume_self ignored for a synergy-only effect"),
            }
        }
    }

    fn descriptor_failed(&mut self, descriptor: &EffectDescriptor, err: &DescriptorError) {
        if self.diagnostics.descriptor_failed(descriptor.id) {
            warn!(
                effect = %descriptor.id,
                name = %descriptor.name,
                error = %err,
                "effect evaluation failed; later failures of this effect are counted but not logged"
            );
        }
    }

    /// Full recompute after the ledger and the stat model disagreed.
    fn recover(&mut self, world: &mut dyn Simulation, err: &ConsistencyError) {
        error!(error = %err, "modifier ledger out of sync with stat model; rebuilding effect contributions");
        self.diagnostics.consistency_errors += 1;
        self.diagnostics.full_recomputes += 1;

        self.ledger.wipe(world);
        let effects: Vec<EffectId> = self.active.ids().collect();
        for effect in &effects {
            world.remove_modifiers_from(self.owner, *effect);
        }
        for effect in effects {
            if let Err(err) = self.apply_passive(world, effect) {
                self.diagnostics.consistency_errors += 1;
                error!(%effect, error = %err, "passive reapplication failed during recompute");
            }
        }
    }
}

impl std::fmt::Debug for EffectEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectEngine")
            .field("owner", &self.owner)
            .field("loadout", &self.loadout.len())
            .field("active", &self.active.len())
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Faction, ModifierKind, SimWorld, StatBlock};
    use crate::rune_script::{EntityRef, Expr, Instr, Script};
    use crate::runes::{CollectibleDefinition, StackingPolicy};

    const MIGHT: CollectibleId = CollectibleId(1);
    const FURY: CollectibleId = CollectibleId(2);
    const BOMB: CollectibleId = CollectibleId(3);
    const CURSED: CollectibleId = CollectibleId(4);

    fn catalog() -> Arc<Catalog> {
        let catalog = Catalog::builder()
            .effect(
                EffectDescriptor::new(EffectId(1), "Might", TriggerKind::Passive)
                    .with_stacking(StackingPolicy::StackLinear(3))
                    .with_script(Script::new(vec![Instr::modify("damage", Expr::constant(2.0))])),
            )
            .effect(
                EffectDescriptor::new(EffectId(2), "Fury", TriggerKind::OnHit).with_script(Script::new(vec![
                    Instr::timed(EntityRef::Actor, "speed", ModifierKind::Additive, Expr::one(), 2),
                ])),
            )
            .effect(
                EffectDescriptor::new(EffectId(3), "Bomb", TriggerKind::OnHit)
                    .with_priority(-1)
                    .with_script(Script::new(vec![
                        Instr::damage(EntityRef::Target, Expr::constant(50.0)),
                        Instr::ConsumeSelf,
                    ])),
            )
            .effect(
                EffectDescriptor::new(EffectId(4), "Cursed", TriggerKind::OnHit)
                    .with_priority(-2)
                    .with_script(Script::new(vec![Instr::modify("damage", Expr::local("nope"))])),
            )
            .collectible(CollectibleDefinition::rune(MIGHT, "Might").with_effect(EffectId(1)).with_refund(7))
            .collectible(CollectibleDefinition::rune(FURY, "Fury").with_effect(EffectId(2)))
            .collectible(CollectibleDefinition::item(BOMB, "Bomb").with_effect(EffectId(3)))
            .collectible(CollectibleDefinition::item(CURSED, "Cursed").with_effect(EffectId(4)))
            .build()
            .unwrap();
        Arc::new(catalog)
    }

    fn setup() -> (EffectEngine, SimWorld, EntityId, EntityId) {
        let mut world = SimWorld::new();
        let player = world.spawn(
            Faction::Player,
            [0.0, 0.0],
            StatBlock::new().with_base("damage", 10.0).with_base("speed", 5.0),
        );
        let enemy = world.spawn(Faction::Hostile, [1.0, 0.0], StatBlock::new().with_base("hp", 100.0));
        let engine = EffectEngine::new(catalog(), EngineConfig::new(), player);
        (engine, world, player, enemy)
    }

    #[test]
    fn test_passive_rescales_with_stacks() {
        let (mut engine, mut world, player, _) = setup();

        engine.add_instance(MIGHT, &mut world).unwrap();
        assert_eq!(world.stat(player, "damage"), 12);

        let change = engine.add_instance(MIGHT, &mut world).unwrap();
        assert!(matches!(change.outcome, AddOutcome::Stacked { stacks: 2, .. }));
        assert_eq!(world.stat(player, "damage"), 14);

        engine.add_instance(MIGHT, &mut world).unwrap();
        let over = engine.add_instance(MIGHT, &mut world).unwrap();
        assert!(matches!(over.outcome, AddOutcome::Converted { refund, .. } if refund.value == 7));
        assert_eq!(world.stat(player, "damage"), 16);
        assert_eq!(engine.diagnostics().refunds, 1);

        let instance = engine.loadout().find(MIGHT).unwrap().id;
        engine.remove_instance(instance, &mut world).unwrap();
        assert_eq!(world.stat(player, "damage"), 14);
    }

    #[test]
    fn test_timed_modifier_expires() {
        let (mut engine, mut world, player, enemy) = setup();
        engine.add_instance(FURY, &mut world).unwrap();

        engine.fire(TriggerKind::OnHit, Payload::hit(enemy, 1.0), player, &mut world);
        assert_eq!(world.stat(player, "speed"), 6);

        engine.tick(0.016, &mut world);
        assert_eq!(world.stat(player, "speed"), 6);
        engine.tick(0.016, &mut world);
        assert_eq!(world.stat(player, "speed"), 5);
        assert_eq!(engine.diagnostics().expired_modifiers, 1);
    }

    #[test]
    fn test_consume_self_is_deferred() {
        let (mut engine, mut world, player, enemy) = setup();
        engine.add_instance(BOMB, &mut world).unwrap();
        engine.add_instance(FURY, &mut world).unwrap();

        let report = engine.fire(TriggerKind::OnHit, Payload::hit(enemy, 1.0), player, &mut world);

        // Fury still ran after the bomb asked to be consumed.
        assert_eq!(report.fired, vec![EffectId(3), EffectId(2)]);
        assert_eq!(report.damage().collect::<Vec<_>>(), vec![(enemy, 50.0)]);
        assert_eq!(report.consumed.len(), 1);
        assert!(engine.loadout().find(BOMB).is_none());
        assert!(!engine.current_active_effects().contains(EffectId(3)));
    }

    #[test]
    fn test_descriptor_error_isolated() {
        let (mut engine, mut world, player, enemy) = setup();
        engine.add_instance(CURSED, &mut world).unwrap();
        engine.add_instance(FURY, &mut world).unwrap();

        for _ in 0..3 {
            let report = engine.fire(TriggerKind::OnHit, Payload::hit(enemy, 1.0), player, &mut world);
            assert_eq!(report.failed, 1);
            assert_eq!(report.fired, vec![EffectId(2)]);
        }
        assert_eq!(engine.diagnostics().descriptor_errors, 3);
        assert_eq!(
            engine.diagnostics().failed_effects().collect::<Vec<_>>(),
            vec![EffectId(4)]
        );
    }

    #[test]
    fn test_consistency_error_recomputes() {
        let (mut engine, mut world, player, _) = setup();
        engine.add_instance(MIGHT, &mut world).unwrap();
        engine.add_instance(MIGHT, &mut world).unwrap();
        assert_eq!(world.stat(player, "damage"), 14);

        // Someone outside the engine removed its modifier.
        world.remove_modifiers_from(player, EffectId(1));

        let instance = engine.loadout().find(MIGHT).unwrap().id;
        engine.remove_instance(instance, &mut world).unwrap();

        assert_eq!(engine.diagnostics().consistency_errors, 1);
        assert_eq!(engine.diagnostics().full_recomputes, 1);
        assert_eq!(world.stat(player, "damage"), 12);
    }

    #[test]
    fn test_unknown_arguments() {
        let (mut engine, mut world, _, _) = setup();
        assert_eq!(
            engine.add_instance(CollectibleId(99), &mut world).unwrap_err(),
            LoadoutError::UnknownCollectible(CollectibleId(99))
        );
        assert_eq!(
            engine.remove_instance(InstanceId(5), &mut world).unwrap_err(),
            LoadoutError::UnknownInstance(InstanceId(5))
        );
    }

    #[test]
    fn test_passive_trigger_not_fireable() {
        let (mut engine, mut world, player, _) = setup();
        engine.add_instance(MIGHT, &mut world).unwrap();
        let report = engine.fire(TriggerKind::Passive, Payload::new(), player, &mut world);
        assert_eq!(report, FireReport::default());
    }

    fn twin_boost(trigger: TriggerKind, stacking: StackingPolicy) -> Arc<Catalog> {
        let catalog = Catalog::builder()
            .effect(
                EffectDescriptor::new(EffectId(1), "Twin Boost", trigger)
                    .with_stacking(stacking)
                    .with_script(Script::new(vec![
                        Instr::modify("damage", Expr::constant(2.0)),
                        Instr::modify("damage", Expr::constant(3.0)),
                    ])),
            )
            .collectible(CollectibleDefinition::rune(MIGHT, "Twin").with_effect(EffectId(1)))
            .build()
            .unwrap();
        Arc::new(catalog)
    }

    #[test]
    fn test_passive_writes_to_one_stat_compose() {
        let (_, mut world, player, _) = setup();
        let catalog = twin_boost(TriggerKind::Passive, StackingPolicy::NonStacking);
        let mut engine = EffectEngine::new(catalog, EngineConfig::new(), player);

        let instance = engine.add_instance(MIGHT, &mut world).unwrap().outcome.instance();
        assert_eq!(world.stat(player, "damage"), 15);
        assert_eq!(engine.ledger().len(), 1);

        engine.remove_instance(instance, &mut world).unwrap();
        assert_eq!(world.stat(player, "damage"), 10);
    }

    #[test]
    fn test_triggered_writes_stack_once_per_firing() {
        let (_, mut world, player, enemy) = setup();
        let catalog = twin_boost(TriggerKind::OnHit, StackingPolicy::StackLinear(3));
        let mut engine = EffectEngine::new(catalog, EngineConfig::new(), player);
        engine.add_instance(MIGHT, &mut world).unwrap();

        engine.fire(TriggerKind::OnHit, Payload::hit(enemy, 1.0), player, &mut world);
        assert_eq!(engine.ledger().stacks(EffectId(1)), Some(1));
        assert_eq!(world.stat(player, "damage"), 15);

        engine.fire(TriggerKind::OnHit, Payload::hit(enemy, 1.0), player, &mut world);
        assert_eq!(engine.ledger().stacks(EffectId(1)), Some(2));
        assert_eq!(world.stat(player, "damage"), 20);
    }
}
