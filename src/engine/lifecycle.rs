//! Campaign Lifecycle Controller.
//!
//! State machine over PRE_CAMPAIGN → IN_PROGRESS → POST_CAMPAIGN →
//! IN_PROGRESS (reopen). Campaign start deep-clones every attached building
//! roster, distributes the starting budget through the ledger, and allocates
//! campaign resources — atomically, with clone reuse for idempotent retries.

use tracing::{info, warn};

use crate::engine::ledger::{self, EntryRequest};
use crate::error::{Result, WarchestError};
use crate::narrative;
use crate::store::CampaignStore;
use crate::types::{CampaignId, CampaignStatus, LedgerAction, RosterId, RosterStatus};

/// Per-roster outcome of a campaign start.
#[derive(Debug, Clone)]
pub struct CloneOutcome {
    pub original: RosterId,
    pub clone: RosterId,
    /// An existing clone was reused (retry safety); budget was not
    /// re-distributed.
    pub reused: bool,
    pub credits_granted: i64,
    /// Why no credits moved, when the budget grant came out non-positive.
    pub noop_reason: Option<String>,
}

/// Typed result of `start`, for the view layer.
#[derive(Debug, Clone)]
pub struct StartReport {
    pub campaign: CampaignId,
    pub outcomes: Vec<CloneOutcome>,
}

/// Register a new campaign.
pub fn create(store: &mut CampaignStore, campaign: crate::types::Campaign) -> Result<CampaignId> {
    let id = campaign.id;
    store.transaction(|store| {
        store.insert_campaign(campaign);
        Ok(())
    })?;
    info!(campaign = %id, "Campaign created");
    Ok(id)
}

/// Start a campaign: clone rosters, distribute budgets, allocate resources,
/// flip to IN_PROGRESS. One atomic scope.
pub fn start(store: &mut CampaignStore, campaign: CampaignId, user: &str) -> Result<StartReport> {
    store.transaction(|store| {
        let record = store.campaign(campaign)?;
        if record.status != CampaignStatus::PreCampaign {
            return Err(WarchestError::WrongCampaignStatus {
                campaign,
                expected: CampaignStatus::PreCampaign,
                actual: record.status,
            });
        }
        if record.rosters.is_empty() {
            return Err(WarchestError::CampaignEmpty(campaign));
        }
        let budget = record.budget;
        let attached = record.rosters.clone();
        let resource_types = record.resource_types.clone();

        let mut outcomes = Vec::new();
        let mut clones = Vec::new();

        for original in attached {
            let source = store.roster(original)?;
            if source.status != RosterStatus::Building {
                // Already a campaign roster; carry it through untouched.
                clones.push(original);
                continue;
            }

            if let Some(existing) = store.clone_of(campaign, original) {
                let clone = existing.id;
                warn!(
                    campaign = %campaign,
                    original = %original,
                    clone = %clone,
                    "Clone already exists, reusing without budget distribution"
                );
                clones.push(clone);
                outcomes.push(CloneOutcome {
                    original,
                    clone,
                    reused: true,
                    credits_granted: 0,
                    noop_reason: None,
                });
                continue;
            }

            let original_cost = source.total_cost();
            let name = source.name.clone();
            let clone = store.clone_roster_for_campaign(original, campaign)?;
            // The clone entry also opens the propagation gate for rosters
            // that predate the ledger.
            ledger::create_entry(store, EntryRequest::new(clone, user, LedgerAction::Clone))?;

            let credits_to_add = (budget - original_cost).max(0);
            let noop_reason = if credits_to_add > 0 {
                ledger::create_entry(
                    store,
                    EntryRequest::new(clone, user, LedgerAction::CampaignStart)
                        .credits(credits_to_add, true),
                )?;
                narrative::record(
                    store,
                    Some(campaign),
                    user,
                    format!("{name} received {credits_to_add} starting credits"),
                    None,
                );
                None
            } else {
                let reason = format!(
                    "roster cost {original_cost} meets or exceeds budget {budget}"
                );
                narrative::record(
                    store,
                    Some(campaign),
                    user,
                    format!("{name} received no starting credits: {reason}"),
                    None,
                );
                Some(reason)
            };

            clones.push(clone);
            outcomes.push(CloneOutcome {
                original,
                clone,
                reused: false,
                credits_granted: credits_to_add,
                noop_reason,
            });
        }

        // Allocate campaign resources per clone; get-or-create keeps this
        // safe to re-run.
        for resource in &resource_types {
            for &clone in &clones {
                store.resource_get_or_create(
                    campaign,
                    clone,
                    &resource.name,
                    resource.default_amount,
                );
            }
        }

        // Detach originals, attach only clones, go live.
        let roster_count = clones.len();
        let record = store.campaign_mut(campaign)?;
        record.rosters = clones;
        record.status = CampaignStatus::InProgress;
        let name = record.name.clone();

        narrative::record(
            store,
            Some(campaign),
            user,
            format!("Campaign {name} started with {roster_count} rosters"),
            None,
        );
        info!(campaign = %campaign, rosters = roster_count, "Campaign started");

        Ok(StartReport { campaign, outcomes })
    })
}

/// Close an in-progress campaign.
pub fn end(store: &mut CampaignStore, campaign: CampaignId, user: &str) -> Result<()> {
    store.transaction(|store| {
        let record = store.campaign_mut(campaign)?;
        if record.status != CampaignStatus::InProgress {
            return Err(WarchestError::WrongCampaignStatus {
                campaign,
                expected: CampaignStatus::InProgress,
                actual: record.status,
            });
        }
        record.status = CampaignStatus::PostCampaign;
        let name = record.name.clone();
        narrative::record(store, Some(campaign), user, format!("Campaign {name} ended"), None);
        info!(campaign = %campaign, "Campaign ended");
        Ok(())
    })
}

/// Reopen a closed campaign. No new clones are created.
pub fn reopen(store: &mut CampaignStore, campaign: CampaignId, user: &str) -> Result<()> {
    store.transaction(|store| {
        let record = store.campaign_mut(campaign)?;
        if record.status != CampaignStatus::PostCampaign {
            return Err(WarchestError::WrongCampaignStatus {
                campaign,
                expected: CampaignStatus::PostCampaign,
                actual: record.status,
            });
        }
        record.status = CampaignStatus::InProgress;
        let name = record.name.clone();
        narrative::record(store, Some(campaign), user, format!("Campaign {name} reopened"), None);
        info!(campaign = %campaign, "Campaign reopened");
        Ok(())
    })
}

/// Archive a campaign and its rosters. Blocked while in progress.
pub fn archive(store: &mut CampaignStore, campaign: CampaignId, user: &str) -> Result<()> {
    store.transaction(|store| {
        let record = store.campaign_mut(campaign)?;
        if record.status == CampaignStatus::InProgress {
            return Err(WarchestError::ArchiveWhileInProgress(campaign));
        }
        record.archived = true;
        let name = record.name.clone();
        let rosters = record.rosters.clone();
        for roster in rosters {
            store.roster_mut(roster)?.archived = true;
        }
        narrative::record(store, Some(campaign), user, format!("Campaign {name} archived"), None);
        info!(campaign = %campaign, "Campaign archived");
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
