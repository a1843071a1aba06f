//! Propagation Engine — pushes a cost delta one hierarchy level upward.
//!
//! Each entry point takes a `CostDelta { old_value, new_value }`, updates the
//! cached aggregate on the target node (clamped to zero), clears its
//! staleness flag, and applies the signed change to the owning fighter where
//! applicable. Roster aggregates are deliberately untouched: that is the
//! ledger's job, invoked separately so one roster-level entry can summarise
//! several lower-level propagations.
//!
//! Nothing here fails on arithmetic: negative results are absorbed by
//! clamping while the *unclamped* signed delta is still returned so parent
//! bookkeeping stays correct.

use tracing::{debug, trace};

use crate::error::Result;
use crate::store::CampaignStore;
use crate::types::{clamp_cost, AssignmentId, CostDelta, FighterId, RosterId};

/// The realized result of one propagation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagationOutcome {
    pub old_value: i64,
    pub new_value: i64,
    /// Unclamped signed change, for the caller's roster-level ledger entry.
    pub delta: i64,
    /// False when the ledger gate skipped the propagation.
    pub applied: bool,
}

impl PropagationOutcome {
    fn skipped(delta: CostDelta) -> Self {
        PropagationOutcome {
            old_value: delta.old_value,
            new_value: delta.new_value,
            delta: delta.signed(),
            applied: false,
        }
    }
}

/// Rosters without ledger history predate the ledger; cost propagation is
/// inactive for them and deltas pass through unchanged.
fn gate_open(store: &CampaignStore, roster: RosterId) -> bool {
    store.latest_entry(roster).is_some()
}

/// Propagate an assignment-level cost change up to its owning fighter.
///
/// Sets the assignment's cached rating to the clamped new value, clears both
/// staleness flags, and shifts the fighter's cached rating by the signed
/// change.
pub fn propagate_from_assignment(
    store: &mut CampaignStore,
    assignment: AssignmentId,
    delta: CostDelta,
) -> Result<PropagationOutcome> {
    let owner = store.assignment(assignment)?.fighter;
    let roster = store.fighter(owner)?.roster;
    if !gate_open(store, roster) {
        trace!(%assignment, "Propagation skipped: roster has no ledger history");
        return Ok(PropagationOutcome::skipped(delta));
    }

    let signed = delta.signed();
    {
        let node = store.assignment_mut(assignment)?;
        node.rating_current = clamp_cost(delta.new_value);
        node.stale = false;
    }
    {
        let fighter = store.fighter_mut(owner)?;
        fighter.rating_current = clamp_cost(fighter.rating_current + signed);
        fighter.stale = false;
    }

    debug!(%assignment, fighter = %owner, %delta, "Propagated assignment cost");
    Ok(PropagationOutcome {
        old_value: delta.old_value,
        new_value: delta.new_value,
        delta: signed,
        applied: true,
    })
}

/// Propagate a fighter-level cost change (e.g. an advancement, or a capture
/// zeroing the fighter out) directly onto the fighter's cached rating.
pub fn propagate_from_fighter(
    store: &mut CampaignStore,
    fighter: FighterId,
    delta: CostDelta,
) -> Result<PropagationOutcome> {
    let roster = store.fighter(fighter)?.roster;
    if !gate_open(store, roster) {
        trace!(%fighter, "Propagation skipped: roster has no ledger history");
        return Ok(PropagationOutcome::skipped(delta));
    }

    let signed = delta.signed();
    {
        let node = store.fighter_mut(fighter)?;
        node.rating_current = clamp_cost(node.rating_current + signed);
        node.stale = false;
    }

    debug!(%fighter, %delta, "Propagated fighter cost");
    Ok(PropagationOutcome {
        old_value: delta.old_value,
        new_value: delta.new_value,
        delta: signed,
        applied: true,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Assignment, Fighter, LedgerAction, LedgerEntry, Roster};
    use chrono::Utc;
    use uuid::Uuid;

    fn seed_entry(roster: RosterId) -> LedgerEntry {
        LedgerEntry {
            id: Uuid::new_v4(),
            roster,
            seq: 1,
            action: LedgerAction::Create,
            user: "test".to_string(),
            rating_before: 0,
            rating_after: 0,
            stash_before: 0,
            stash_after: 0,
            credits_before: 0,
            credits_after: 0,
            rating_delta: 0,
            stash_delta: 0,
            credits_delta: 0,
            credits_applied: false,
            fighter: None,
            assignment: None,
            timestamp: Utc::now(),
        }
    }

    fn fixture(with_ledger: bool) -> (CampaignStore, FighterId, AssignmentId) {
        let mut store = CampaignStore::new();
        let roster = store.insert_roster(Roster::new("Scrap Dogs"));
        if with_ledger {
            store.push_ledger_entry(seed_entry(roster));
        }
        let mut fighter = Fighter::new(roster, "Brakk", 50);
        fighter.rating_current = 50;
        fighter.stale = false;
        let fighter_id = store.insert_fighter(fighter);
        let assignment_id = store.insert_assignment(Assignment::new(fighter_id, "lasgun"));
        (store, fighter_id, assignment_id)
    }

    #[test]
    fn test_assignment_propagation_updates_both_levels() {
        let (mut store, fighter, assignment) = fixture(true);

        let outcome =
            propagate_from_assignment(&mut store, assignment, CostDelta::new(0, 30)).unwrap();

        assert!(outcome.applied);
        assert_eq!(outcome.delta, 30);
        let node = store.assignment(assignment).unwrap();
        assert_eq!(node.rating_current, 30);
        assert!(!node.stale);
        assert_eq!(store.fighter(fighter).unwrap().rating_current, 80);
    }

    #[test]
    fn test_assignment_removal_walks_cost_out() {
        let (mut store, fighter, assignment) = fixture(true);
        propagate_from_assignment(&mut store, assignment, CostDelta::new(0, 30)).unwrap();

        let outcome =
            propagate_from_assignment(&mut store, assignment, CostDelta::new(30, 0)).unwrap();

        assert_eq!(outcome.delta, -30);
        assert_eq!(store.assignment(assignment).unwrap().rating_current, 0);
        assert_eq!(store.fighter(fighter).unwrap().rating_current, 50);
    }

    #[test]
    fn test_clamp_absorbs_negative_but_delta_stays_signed() {
        let (mut store, fighter, _) = fixture(true);

        // Removing more than the fighter holds: cache clamps at zero, the
        // returned delta keeps the full signed change.
        let outcome =
            propagate_from_fighter(&mut store, fighter, CostDelta::new(80, 0)).unwrap();

        assert_eq!(outcome.delta, -80);
        assert_eq!(store.fighter(fighter).unwrap().rating_current, 0);
    }

    #[test]
    fn test_fighter_propagation_applies_signed_change() {
        let (mut store, fighter, _) = fixture(true);

        // Advancement: intrinsic cost 50 → 65.
        let outcome =
            propagate_from_fighter(&mut store, fighter, CostDelta::new(50, 65)).unwrap();

        assert_eq!(outcome.delta, 15);
        assert_eq!(store.fighter(fighter).unwrap().rating_current, 65);
    }

    #[test]
    fn test_gate_skips_without_ledger_history() {
        let (mut store, fighter, assignment) = fixture(false);

        let outcome =
            propagate_from_assignment(&mut store, assignment, CostDelta::new(0, 30)).unwrap();
        assert!(!outcome.applied);
        assert_eq!(outcome.delta, 30);
        // No caches were touched.
        assert_eq!(store.assignment(assignment).unwrap().rating_current, 0);
        assert_eq!(store.fighter(fighter).unwrap().rating_current, 50);

        let outcome =
            propagate_from_fighter(&mut store, fighter, CostDelta::new(50, 0)).unwrap();
        assert!(!outcome.applied);
        assert_eq!(outcome.delta, -50);
        assert_eq!(store.fighter(fighter).unwrap().rating_current, 50);
    }

    #[test]
    fn test_propagation_clears_staleness() {
        let (mut store, fighter, assignment) = fixture(true);
        store.fighter_mut(fighter).unwrap().stale = true;
        store.assignment_mut(assignment).unwrap().stale = true;

        propagate_from_assignment(&mut store, assignment, CostDelta::new(0, 30)).unwrap();

        assert!(!store.assignment(assignment).unwrap().stale);
        assert!(!store.fighter(fighter).unwrap().stale);
    }
}
