//! Capture / Ransom / Sale Transactor.
//!
//! Coordinates dual-roster ledger entries for fighter capture, ransom return,
//! release, and sale to the faction. Each operation is one atomic scope
//! producing one-to-two ledger entries plus a narrative entry; neither
//! roster's aggregates can go negative thanks to the clamping in propagation
//! and the ledger.

use tracing::info;
use uuid::Uuid;

use crate::engine::ledger::{self, EntryRequest, TransferRequest};
use crate::engine::mutations;
use crate::engine::propagation::propagate_from_fighter;
use crate::engine::router::route_delta;
use crate::error::{Result, WarchestError};
use crate::narrative;
use crate::store::CampaignStore;
use crate::types::{CaptureRecord, CostDelta, FighterId, LedgerAction, RosterId};

/// Typed result of a capture, for the view layer.
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub record: Uuid,
    pub fighter: FighterId,
    pub original_roster: RosterId,
    pub capturing_roster: RosterId,
    /// Rating removed from the original roster for the fighter itself.
    pub cost_removed: i64,
    /// Equipment-borne child assignments stripped before capture.
    pub assignments_removed: usize,
}

/// Typed result of a faction sale.
#[derive(Debug, Clone)]
pub struct SaleOutcome {
    pub fighter: FighterId,
    pub capturing_roster: RosterId,
    pub credits_gained: i64,
}

/// Typed result of a return or release.
#[derive(Debug, Clone)]
pub struct RansomOutcome {
    pub fighter: FighterId,
    pub original_roster: RosterId,
    pub restored_cost: i64,
    pub ransom: i64,
}

/// Capture a fighter for another roster.
///
/// Any assignments that spawned child fighters are removed first, their cost
/// walked out against the owning roster. The fighter's remaining cost is then
/// zeroed via propagation and recorded in one capture ledger entry.
pub fn capture(
    store: &mut CampaignStore,
    fighter: FighterId,
    capturing_roster: RosterId,
    user: &str,
) -> Result<CaptureOutcome> {
    store.transaction(|store| {
        let record = store.fighter(fighter)?.clone();
        if record.is_stash {
            return Err(WarchestError::InvalidCapture(
                "the stash fighter cannot be captured".to_string(),
            ));
        }
        if store.capture_for(fighter).is_some() {
            return Err(WarchestError::AlreadyCaptured(fighter));
        }
        if record.roster == capturing_roster {
            return Err(WarchestError::InvalidCapture(
                "a roster cannot capture its own fighter".to_string(),
            ));
        }
        store.roster(capturing_roster)?;
        let original_roster = record.roster;

        // Strip vehicle/mount assignments before the fighter leaves.
        let child_assignments: Vec<_> = store
            .assignments_of(fighter)
            .iter()
            .filter(|a| a.child_fighter.is_some())
            .map(|a| a.id)
            .collect();
        for assignment in &child_assignments {
            mutations::remove_equipment(store, *assignment, user, false)?;
        }

        let cost = store.fighter(fighter)?.rating_current;
        let outcome = propagate_from_fighter(store, fighter, CostDelta::new(cost, 0))?;
        let (rating_delta, stash_delta) = route_delta(store, fighter, outcome.delta)?;

        ledger::create_entry(
            store,
            EntryRequest::new(original_roster, user, LedgerAction::CaptureFighter)
                .rating(rating_delta)
                .stash(stash_delta)
                .fighter(fighter),
        )?;

        let capture_record = CaptureRecord::new(fighter, original_roster, capturing_roster);
        let record_id = capture_record.id;
        store.insert_capture(capture_record);

        let campaign = store.roster(original_roster)?.campaign;
        narrative::record(
            store,
            campaign,
            user,
            format!(
                "{} was captured ({} rating lost, {} assignments stripped)",
                record.name,
                cost,
                child_assignments.len()
            ),
            None,
        );
        info!(
            fighter = %fighter,
            original = %original_roster,
            captor = %capturing_roster,
            cost,
            "Fighter captured"
        );

        Ok(CaptureOutcome {
            record: record_id,
            fighter,
            original_roster,
            capturing_roster,
            cost_removed: cost,
            assignments_removed: child_assignments.len(),
        })
    })
}

/// Sell a captured fighter to the faction. The capturing roster gains the
/// price; the original roster's rating reduction becomes permanent.
pub fn sell_to_faction(
    store: &mut CampaignStore,
    fighter: FighterId,
    price: i64,
    user: &str,
) -> Result<SaleOutcome> {
    store.transaction(|store| {
        let record = store
            .capture_for(fighter)
            .ok_or(WarchestError::NotCaptured(fighter))?
            .clone();
        if record.sold_to_faction {
            return Err(WarchestError::AlreadySold(fighter));
        }

        {
            let record = store
                .capture_for_mut(fighter)
                .ok_or(WarchestError::NotCaptured(fighter))?;
            record.sold_to_faction = true;
            record.sold_at = Some(chrono::Utc::now());
        }

        ledger::create_entry(
            store,
            EntryRequest::new(record.capturing_roster, user, LedgerAction::SellFighter)
                .credits(price, true)
                .fighter(fighter),
        )?;

        let name = store.fighter(fighter)?.name.clone();
        let campaign = store.roster(record.capturing_roster)?.campaign;
        narrative::record(
            store,
            campaign,
            user,
            format!("{name} was sold to the faction for {price} credits"),
            None,
        );
        info!(fighter = %fighter, price, "Captured fighter sold to faction");

        Ok(SaleOutcome {
            fighter,
            capturing_roster: record.capturing_roster,
            credits_gained: price,
        })
    })
}

/// Return a captured fighter to its owner against a ransom.
///
/// Deletes the capture record (the restoration signal), re-derives the
/// fighter's cost from its intrinsic cost plus surviving assignments, and
/// propagates it back into the original roster. A positive ransom moves
/// credits between the two rosters with one ledger entry on each side.
pub fn return_to_owner(
    store: &mut CampaignStore,
    fighter: FighterId,
    ransom: i64,
    user: &str,
) -> Result<RansomOutcome> {
    restore(store, fighter, ransom, LedgerAction::ReturnFighter, user)
}

/// Release a captured fighter without ransom. Same restoration path as a
/// return, kept as a distinct action kind for audit differentiation.
pub fn release(store: &mut CampaignStore, fighter: FighterId, user: &str) -> Result<RansomOutcome> {
    restore(store, fighter, 0, LedgerAction::ReleaseFighter, user)
}

fn restore(
    store: &mut CampaignStore,
    fighter: FighterId,
    ransom: i64,
    action: LedgerAction,
    user: &str,
) -> Result<RansomOutcome> {
    store.transaction(|store| {
        let record = store
            .capture_for(fighter)
            .ok_or(WarchestError::NotCaptured(fighter))?
            .clone();
        if record.sold_to_faction {
            return Err(WarchestError::AlreadySold(fighter));
        }
        let original = store.roster(record.original_roster)?;

        // Affordability is only enforced in campaign mode; building rosters
        // have no credit economy to protect.
        if ransom > 0 && original.in_campaign_mode() && original.credits_current < ransom {
            return Err(WarchestError::InsufficientCredits {
                required: ransom,
                available: original.credits_current,
            });
        }

        store.remove_capture(fighter)?;

        // Re-derive the restored cost rather than trusting a stale cache:
        // intrinsic cost plus whatever assignments survived the capture.
        let restored: i64 = store.fighter(fighter)?.base_cost
            + store
                .assignments_of(fighter)
                .iter()
                .map(|a| a.rating_current)
                .sum::<i64>();
        let outcome = propagate_from_fighter(store, fighter, CostDelta::new(0, restored))?;
        let (rating_delta, stash_delta) = route_delta(store, fighter, outcome.delta)?;

        ledger::create_entry(
            store,
            EntryRequest::new(record.original_roster, user, action)
                .rating(rating_delta)
                .stash(stash_delta)
                .fighter(fighter),
        )?;

        if ransom > 0 {
            ledger::transfer_credits(
                store,
                TransferRequest {
                    from: record.original_roster,
                    to: record.capturing_roster,
                    amount: ransom,
                    user: user.to_string(),
                    debit_action: LedgerAction::RansomPaid,
                    credit_action: LedgerAction::RansomReceived,
                    fighter: Some(fighter),
                },
            )?;
        }

        let name = store.fighter(fighter)?.name.clone();
        let campaign = store.roster(record.original_roster)?.campaign;
        let text = match action {
            LedgerAction::ReturnFighter => {
                format!("{name} was ransomed back for {ransom} credits ({restored} rating restored)")
            }
            _ => format!("{name} was released ({restored} rating restored)"),
        };
        narrative::record(store, campaign, user, text, None);
        info!(fighter = %fighter, ransom, restored, action = %action, "Captured fighter restored");

        Ok(RansomOutcome {
            fighter,
            original_roster: record.original_roster,
            restored_cost: restored,
            ransom,
        })
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
