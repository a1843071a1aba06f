//! The Ledger — the only component permitted to mutate roster-level
//! aggregates.
//!
//! Entries are append-only and totally ordered per roster. `create_entry`
//! applies the caller-supplied signed deltas to the roster's cached
//! aggregates (each clamped to zero), persists an immutable entry, and clears
//! the roster's staleness flag.
//!
//! Contract the ledger does not enforce itself: every code path that changes
//! cost must pair exactly one propagation call with exactly one ledger entry.
//! The ledger trusts the caller's deltas rather than re-deriving them.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::store::CampaignStore;
use crate::types::{clamp_cost, AssignmentId, FighterId, LedgerAction, LedgerEntry, RosterId};

/// Everything needed to write one ledger entry.
#[derive(Debug, Clone)]
pub struct EntryRequest {
    pub roster: RosterId,
    pub user: String,
    pub action: LedgerAction,
    pub rating_delta: i64,
    pub stash_delta: i64,
    pub credits_delta: i64,
    /// When false the credits delta is recorded for information only and the
    /// cached balance is left untouched.
    pub apply_credits: bool,
    pub fighter: Option<FighterId>,
    pub assignment: Option<AssignmentId>,
}

impl EntryRequest {
    pub fn new(roster: RosterId, user: &str, action: LedgerAction) -> Self {
        EntryRequest {
            roster,
            user: user.to_string(),
            action,
            rating_delta: 0,
            stash_delta: 0,
            credits_delta: 0,
            apply_credits: false,
            fighter: None,
            assignment: None,
        }
    }

    pub fn rating(mut self, delta: i64) -> Self {
        self.rating_delta = delta;
        self
    }

    pub fn stash(mut self, delta: i64) -> Self {
        self.stash_delta = delta;
        self
    }

    pub fn credits(mut self, delta: i64, apply: bool) -> Self {
        self.credits_delta = delta;
        self.apply_credits = apply;
        self
    }

    pub fn fighter(mut self, fighter: FighterId) -> Self {
        self.fighter = Some(fighter);
        self
    }

    pub fn assignment(mut self, assignment: AssignmentId) -> Self {
        self.assignment = Some(assignment);
        self
    }
}

/// A dual-roster credit transfer, committed as one unit.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub from: RosterId,
    pub to: RosterId,
    pub amount: i64,
    pub user: String,
    pub debit_action: LedgerAction,
    pub credit_action: LedgerAction,
    pub fighter: Option<FighterId>,
}

/// Apply the deltas and persist one immutable entry, atomically.
pub fn create_entry(store: &mut CampaignStore, request: EntryRequest) -> Result<LedgerEntry> {
    store.transaction(|store| {
        let seq = store.next_seq(request.roster);
        let roster = store.roster_mut(request.roster)?;

        let rating_before = roster.rating_current;
        let stash_before = roster.stash_current;
        let credits_before = roster.credits_current;

        roster.rating_current = clamp_cost(rating_before + request.rating_delta);
        roster.stash_current = clamp_cost(stash_before + request.stash_delta);
        if request.apply_credits {
            roster.credits_current = clamp_cost(credits_before + request.credits_delta);
            if request.credits_delta > 0 {
                roster.credits_earned += request.credits_delta;
            }
        }
        roster.stale = false;

        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            roster: request.roster,
            seq,
            action: request.action,
            user: request.user.clone(),
            rating_before,
            rating_after: roster.rating_current,
            stash_before,
            stash_after: roster.stash_current,
            credits_before,
            credits_after: roster.credits_current,
            rating_delta: request.rating_delta,
            stash_delta: request.stash_delta,
            credits_delta: request.credits_delta,
            credits_applied: request.apply_credits,
            fighter: request.fighter,
            assignment: request.assignment,
            timestamp: Utc::now(),
        };

        info!(
            roster = %request.roster,
            seq,
            action = %request.action,
            rating = format!("{:+}", request.rating_delta),
            stash = format!("{:+}", request.stash_delta),
            credits = format!("{:+}", request.credits_delta),
            applied = request.apply_credits,
            "Ledger entry created"
        );

        store.push_ledger_entry(entry.clone());
        Ok(entry)
    })
}

/// Move credits between two rosters with one ledger entry on each side,
/// inside a single atomic scope. Callers validate affordability; the ledger
/// itself only clamps.
pub fn transfer_credits(
    store: &mut CampaignStore,
    request: TransferRequest,
) -> Result<(LedgerEntry, LedgerEntry)> {
    store.transaction(|store| {
        let mut debit = EntryRequest::new(request.from, &request.user, request.debit_action)
            .credits(-request.amount, true);
        debit.fighter = request.fighter;
        let mut credit = EntryRequest::new(request.to, &request.user, request.credit_action)
            .credits(request.amount, true);
        credit.fighter = request.fighter;

        let debit_entry = create_entry(store, debit)?;
        let credit_entry = create_entry(store, credit)?;
        Ok((debit_entry, credit_entry))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Roster;

    fn store_with_roster() -> (CampaignStore, RosterId) {
        let mut store = CampaignStore::new();
        let id = store.insert_roster(Roster::new("Scrap Dogs"));
        (store, id)
    }

    #[test]
    fn test_create_entry_applies_deltas() {
        let (mut store, roster) = store_with_roster();

        let entry = create_entry(
            &mut store,
            EntryRequest::new(roster, "player1", LedgerAction::AddFighter).rating(50),
        )
        .unwrap();

        assert_eq!(entry.seq, 1);
        assert_eq!(entry.rating_before, 0);
        assert_eq!(entry.rating_after, 50);
        let roster = store.roster(roster).unwrap();
        assert_eq!(roster.rating_current, 50);
        assert!(!roster.stale);
    }

    #[test]
    fn test_entries_are_totally_ordered() {
        let (mut store, roster) = store_with_roster();

        for _ in 0..3 {
            create_entry(
                &mut store,
                EntryRequest::new(roster, "player1", LedgerAction::AddFighter).rating(10),
            )
            .unwrap();
        }

        let seqs: Vec<u64> = store.ledger_entries(roster).map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(store.latest_entry(roster).unwrap().seq, 3);
    }

    #[test]
    fn test_running_sum_never_drifts() {
        let (mut store, roster) = store_with_roster();

        let deltas = [50, 30, -20, 100, -40, -5];
        let mut expected = 0i64;
        for delta in deltas {
            create_entry(
                &mut store,
                EntryRequest::new(roster, "player1", LedgerAction::AddEquipment).rating(delta),
            )
            .unwrap();
            expected = (expected + delta).max(0);
            assert_eq!(store.roster(roster).unwrap().rating_current, expected);
        }
    }

    #[test]
    fn test_aggregates_clamp_to_zero() {
        let (mut store, roster) = store_with_roster();

        let entry = create_entry(
            &mut store,
            EntryRequest::new(roster, "player1", LedgerAction::RemoveFighter)
                .rating(-30)
                .stash(-10)
                .credits(-5, true),
        )
        .unwrap();

        // Deltas recorded unclamped, aggregates floored at zero.
        assert_eq!(entry.rating_delta, -30);
        let roster = store.roster(roster).unwrap();
        assert_eq!(roster.rating_current, 0);
        assert_eq!(roster.stash_current, 0);
        assert_eq!(roster.credits_current, 0);
    }

    #[test]
    fn test_informational_credits_do_not_move_balance() {
        let (mut store, roster) = store_with_roster();

        let entry = create_entry(
            &mut store,
            EntryRequest::new(roster, "player1", LedgerAction::RemoveEquipment)
                .credits(30, false),
        )
        .unwrap();

        assert_eq!(entry.credits_delta, 30);
        assert!(!entry.credits_applied);
        assert_eq!(entry.credits_after, entry.credits_before);
        assert_eq!(store.roster(roster).unwrap().credits_current, 0);
        assert_eq!(store.roster(roster).unwrap().credits_earned, 0);
    }

    #[test]
    fn test_credits_earned_tracks_positive_applied_deltas() {
        let (mut store, roster) = store_with_roster();

        create_entry(
            &mut store,
            EntryRequest::new(roster, "arbitrator", LedgerAction::CampaignStart)
                .credits(500, true),
        )
        .unwrap();
        create_entry(
            &mut store,
            EntryRequest::new(roster, "player1", LedgerAction::AddEquipment)
                .credits(-200, true),
        )
        .unwrap();
        create_entry(
            &mut store,
            EntryRequest::new(roster, "player1", LedgerAction::SellFighter).credits(100, true),
        )
        .unwrap();

        let roster = store.roster(roster).unwrap();
        assert_eq!(roster.credits_current, 400);
        assert_eq!(roster.credits_earned, 600);
    }

    #[test]
    fn test_transfer_conserves_value() {
        let (mut store, from) = store_with_roster();
        let to = store.insert_roster(Roster::new("Rust Vultures"));
        create_entry(
            &mut store,
            EntryRequest::new(from, "arbitrator", LedgerAction::CampaignStart)
                .credits(300, true),
        )
        .unwrap();

        let (debit, credit) = transfer_credits(
            &mut store,
            TransferRequest {
                from,
                to,
                amount: 120,
                user: "arbitrator".to_string(),
                debit_action: LedgerAction::RansomPaid,
                credit_action: LedgerAction::RansomReceived,
                fighter: None,
            },
        )
        .unwrap();

        assert_eq!(debit.credits_delta, -120);
        assert_eq!(credit.credits_delta, 120);
        assert_eq!(store.roster(from).unwrap().credits_current, 180);
        assert_eq!(store.roster(to).unwrap().credits_current, 120);
    }

    #[test]
    fn test_unknown_roster_rolls_back() {
        let (mut store, _) = store_with_roster();
        let result = create_entry(
            &mut store,
            EntryRequest::new(RosterId::new(), "player1", LedgerAction::Create),
        );
        assert!(result.is_err());
    }
}
