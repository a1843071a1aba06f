//! Roster mutation service.
//!
//! The gang-edit operations: create a roster, hire and dismiss fighters,
//! assign and remove equipment, record advancements, and adjust campaign
//! resources. Every operation here honours the pairing contract: exactly one
//! propagation call per cost change, summarised by exactly one roster-level
//! ledger entry, all inside a single transaction.

use tracing::info;

use crate::catalog::Catalog;
use crate::engine::ledger::{self, EntryRequest};
use crate::engine::propagation::{propagate_from_assignment, propagate_from_fighter};
use crate::engine::router::route_delta;
use crate::error::{Result, WarchestError};
use crate::store::CampaignStore;
use crate::types::{
    Assignment, AssignmentId, CampaignId, CostDelta, Fighter, FighterId, LedgerAction, Roster,
    RosterId,
};

/// Former global feature toggles, now explicit per-call parameters.
#[derive(Debug, Clone)]
pub struct RosterOptions {
    /// Create the implicit stash fighter alongside the roster.
    pub with_stash: bool,
    /// Write an initial ledger entry so the roster is propagation-active
    /// from birth. Turning this off reproduces the legacy pre-ledger
    /// behaviour where propagation no-ops until the first entry.
    pub seed_ledger: bool,
}

impl Default for RosterOptions {
    fn default() -> Self {
        RosterOptions { with_stash: true, seed_ledger: true }
    }
}

/// Create a roster, optionally with its stash fighter and seed ledger entry.
pub fn create_roster(
    store: &mut CampaignStore,
    name: &str,
    user: &str,
    options: &RosterOptions,
) -> Result<RosterId> {
    store.transaction(|store| {
        let id = store.insert_roster(Roster::new(name));
        if options.with_stash {
            store.insert_fighter(Fighter::stash(id));
        }
        if options.seed_ledger {
            ledger::create_entry(store, EntryRequest::new(id, user, LedgerAction::Create))?;
        }
        info!(roster = %id, name, seeded = options.seed_ledger, "Roster created");
        Ok(id)
    })
}

/// Hire a fighter from the catalog.
///
/// In campaign mode the purchase also deducts credits; while building, the
/// cost is recorded for information only.
pub fn add_fighter(
    store: &mut CampaignStore,
    catalog: &dyn Catalog,
    roster: RosterId,
    catalog_key: &str,
    name: &str,
    user: &str,
) -> Result<FighterId> {
    store.transaction(|store| {
        let cost = catalog.fighter_cost(catalog_key)?;
        let target = store.roster(roster)?;
        if target.archived {
            return Err(WarchestError::RosterArchived(roster));
        }
        let in_campaign = target.in_campaign_mode();

        let id = store.insert_fighter(Fighter::new(roster, name, cost));
        let outcome = propagate_from_fighter(store, id, CostDelta::new(0, cost))?;
        let (rating_delta, stash_delta) = route_delta(store, id, outcome.delta)?;

        ledger::create_entry(
            store,
            EntryRequest::new(roster, user, LedgerAction::AddFighter)
                .rating(rating_delta)
                .stash(stash_delta)
                .credits(-cost, in_campaign)
                .fighter(id),
        )?;
        info!(roster = %roster, fighter = %id, cost, "Fighter added");
        Ok(id)
    })
}

/// Assign equipment to a fighter, spawning a child fighter when the item
/// calls for one (vehicle/mount pattern).
pub fn add_equipment(
    store: &mut CampaignStore,
    catalog: &dyn Catalog,
    fighter: FighterId,
    equipment_key: &str,
    user: &str,
) -> Result<AssignmentId> {
    store.transaction(|store| {
        let item = catalog.equipment(equipment_key)?;
        if store.capture_for(fighter).is_some() {
            return Err(WarchestError::InvalidOperation(
                "equipment cannot be assigned to a captured fighter".to_string(),
            ));
        }
        let roster_id = store.fighter(fighter)?.roster;
        let target = store.roster(roster_id)?;
        if target.archived {
            return Err(WarchestError::RosterArchived(roster_id));
        }
        let in_campaign = target.in_campaign_mode();

        let assignment = store.insert_assignment(Assignment::new(fighter, equipment_key));
        let outcome =
            propagate_from_assignment(store, assignment, CostDelta::new(0, item.cost))?;
        let (mut rating_delta, mut stash_delta) = route_delta(store, fighter, outcome.delta)?;
        let mut total_cost = item.cost;

        if let Some(spawn_key) = &item.spawns_fighter {
            let child_cost = catalog.fighter_cost(spawn_key)?;
            let mut child = Fighter::new(roster_id, spawn_key.as_str(), child_cost);
            child.source_assignment = Some(assignment);
            let child_id = store.insert_fighter(child);
            store.assignment_mut(assignment)?.child_fighter = Some(child_id);

            let child_outcome =
                propagate_from_fighter(store, child_id, CostDelta::new(0, child_cost))?;
            let (r, s) = route_delta(store, child_id, child_outcome.delta)?;
            rating_delta += r;
            stash_delta += s;
            total_cost += child_cost;
        }

        ledger::create_entry(
            store,
            EntryRequest::new(roster_id, user, LedgerAction::AddEquipment)
                .rating(rating_delta)
                .stash(stash_delta)
                .credits(-total_cost, in_campaign)
                .fighter(fighter)
                .assignment(assignment),
        )?;
        info!(
            fighter = %fighter,
            assignment = %assignment,
            equipment = equipment_key,
            cost = total_cost,
            "Equipment assigned"
        );
        Ok(assignment)
    })
}

/// Remove an equipment assignment, walking its cost (and any child fighter's)
/// out of the hierarchy. Returns the total cost removed.
///
/// Refunds only take effect in campaign mode; outside it the removed cost is
/// recorded on the entry without moving credits.
pub fn remove_equipment(
    store: &mut CampaignStore,
    assignment: AssignmentId,
    user: &str,
    refund: bool,
) -> Result<i64> {
    store.transaction(|store| {
        let record = store.assignment(assignment)?.clone();
        // A captive's cost was already walked out of the roster at capture
        // time; touching its surviving equipment would subtract it twice.
        let captured = store.capture_for(record.fighter).is_some()
            || record
                .child_fighter
                .is_some_and(|child| store.capture_for(child).is_some());
        if captured {
            return Err(WarchestError::InvalidOperation(
                "equipment on a captured fighter cannot be removed".to_string(),
            ));
        }
        let roster_id = store.fighter(record.fighter)?.roster;
        let in_campaign = store.roster(roster_id)?.in_campaign_mode();

        let mut rating_delta = 0;
        let mut stash_delta = 0;
        let mut removed = 0;

        if let Some(child) = record.child_fighter {
            let child_rating = store.fighter(child)?.rating_current;
            let child_outcome =
                propagate_from_fighter(store, child, CostDelta::new(child_rating, 0))?;
            let (r, s) = route_delta(store, child, child_outcome.delta)?;
            rating_delta += r;
            stash_delta += s;
            removed += child_rating;
            store.remove_fighter(child)?;
        }

        let cost = record.rating_current;
        let outcome = propagate_from_assignment(store, assignment, CostDelta::new(cost, 0))?;
        let (r, s) = route_delta(store, record.fighter, outcome.delta)?;
        rating_delta += r;
        stash_delta += s;
        removed += cost;
        store.remove_assignment(assignment)?;

        ledger::create_entry(
            store,
            EntryRequest::new(roster_id, user, LedgerAction::RemoveEquipment)
                .rating(rating_delta)
                .stash(stash_delta)
                .credits(removed, refund && in_campaign)
                .fighter(record.fighter)
                .assignment(assignment),
        )?;
        info!(
            assignment = %assignment,
            removed,
            refunded = refund && in_campaign,
            "Equipment removed"
        );
        Ok(removed)
    })
}

/// Dismiss a fighter, removing its assignments and any child fighters they
/// spawned. Returns the total cost removed.
pub fn remove_fighter(store: &mut CampaignStore, fighter: FighterId, user: &str) -> Result<i64> {
    store.transaction(|store| {
        let record = store.fighter(fighter)?.clone();
        if record.is_stash {
            return Err(WarchestError::InvalidOperation(
                "the stash fighter cannot be removed".to_string(),
            ));
        }
        if store.capture_for(fighter).is_some() {
            return Err(WarchestError::InvalidOperation(
                "a captured fighter cannot be removed by its owner".to_string(),
            ));
        }
        let captured_child = store
            .assignments_of(fighter)
            .iter()
            .filter_map(|a| a.child_fighter)
            .any(|child| store.capture_for(child).is_some());
        if captured_child {
            return Err(WarchestError::InvalidOperation(
                "a fighter with a captured child fighter cannot be removed".to_string(),
            ));
        }
        let roster_id = record.roster;

        let mut rating_delta = 0;
        let mut stash_delta = 0;
        let mut removed = 0;

        let assignment_ids: Vec<AssignmentId> =
            store.assignments_of(fighter).iter().map(|a| a.id).collect();
        for id in &assignment_ids {
            if let Some(child) = store.assignment(*id)?.child_fighter {
                let child_rating = store.fighter(child)?.rating_current;
                let child_outcome =
                    propagate_from_fighter(store, child, CostDelta::new(child_rating, 0))?;
                let (r, s) = route_delta(store, child, child_outcome.delta)?;
                rating_delta += r;
                stash_delta += s;
                removed += child_rating;
                store.remove_fighter(child)?;
            }
        }

        // The fighter's cached rating already contains its assignments'
        // propagated costs, so a single fighter-level walk-out covers them.
        let own = store.fighter(fighter)?.rating_current;
        let outcome = propagate_from_fighter(store, fighter, CostDelta::new(own, 0))?;
        let (r, s) = route_delta(store, fighter, outcome.delta)?;
        rating_delta += r;
        stash_delta += s;
        removed += own;

        for id in assignment_ids {
            store.remove_assignment(id)?;
        }
        store.remove_fighter(fighter)?;

        ledger::create_entry(
            store,
            EntryRequest::new(roster_id, user, LedgerAction::RemoveFighter)
                .rating(rating_delta)
                .stash(stash_delta)
                .credits(removed, false)
                .fighter(fighter),
        )?;
        info!(fighter = %fighter, removed, "Fighter removed");
        Ok(removed)
    })
}

/// Record an advancement: the fighter's intrinsic cost changes and the
/// difference propagates upward.
pub fn advance_fighter(
    store: &mut CampaignStore,
    fighter: FighterId,
    new_base_cost: i64,
    user: &str,
) -> Result<i64> {
    store.transaction(|store| {
        if store.capture_for(fighter).is_some() {
            return Err(WarchestError::InvalidOperation(
                "a captured fighter cannot be advanced".to_string(),
            ));
        }
        let record = store.fighter(fighter)?;
        let old_base = record.base_cost;
        let roster_id = record.roster;
        if store.roster(roster_id)?.archived {
            return Err(WarchestError::RosterArchived(roster_id));
        }

        store.fighter_mut(fighter)?.base_cost = new_base_cost;
        let outcome =
            propagate_from_fighter(store, fighter, CostDelta::new(old_base, new_base_cost))?;
        let (rating_delta, stash_delta) = route_delta(store, fighter, outcome.delta)?;

        ledger::create_entry(
            store,
            EntryRequest::new(roster_id, user, LedgerAction::AdvanceFighter)
                .rating(rating_delta)
                .stash(stash_delta)
                .fighter(fighter),
        )?;
        info!(fighter = %fighter, old_base, new_base_cost, "Fighter advanced");
        Ok(outcome.delta)
    })
}

/// Adjust a campaign resource allocation. Fails (and rolls back) if the
/// change would drive the tracked amount negative. Returns the new amount.
pub fn adjust_resource(
    store: &mut CampaignStore,
    campaign: CampaignId,
    roster: RosterId,
    resource: &str,
    change: i64,
    user: &str,
) -> Result<i64> {
    store.transaction(|store| {
        let current = store
            .resource(campaign, roster, resource)
            .map(|r| r.amount)
            .ok_or_else(|| {
                WarchestError::InvalidOperation(format!(
                    "no '{resource}' allocation for roster {roster}"
                ))
            })?;
        if current + change < 0 {
            return Err(WarchestError::ResourceUnderflow {
                resource: resource.to_string(),
                available: current,
                requested: change,
            });
        }
        let allocation = store.resource_get_or_create(campaign, roster, resource, 0);
        allocation.amount = current + change;
        info!(
            roster = %roster,
            resource,
            change,
            amount = current + change,
            user,
            "Resource adjusted"
        );
        Ok(current + change)
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
