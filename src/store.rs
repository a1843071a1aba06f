//! In-memory entity store.
//!
//! Holds the roster → fighter → assignment hierarchy, the append-only ledger,
//! campaigns, capture records, narrative log, and resource allocations. Every
//! multi-step mutation in the engine runs inside [`CampaignStore::transaction`],
//! which snapshots the store and restores it wholesale if the closure fails —
//! all writes commit together or none do.
//!
//! Entity write access is crate-private: the engine modules are the only
//! callers allowed to mutate cached aggregates, and roster aggregates are
//! mutated only by `engine::ledger`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{Result, WarchestError};
use crate::narrative::NarrativeEntry;
use crate::types::{
    Assignment, AssignmentId, Campaign, CampaignId, CaptureRecord, Fighter, FighterId,
    LedgerEntry, ResourceAllocation, Roster, RosterId, RosterStatus,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignStore {
    rosters: BTreeMap<RosterId, Roster>,
    fighters: BTreeMap<FighterId, Fighter>,
    assignments: BTreeMap<AssignmentId, Assignment>,
    campaigns: BTreeMap<CampaignId, Campaign>,
    /// Append-only. Per-roster ordering lives in `LedgerEntry::seq`.
    ledger: Vec<LedgerEntry>,
    /// At most one live record per fighter.
    captures: Vec<CaptureRecord>,
    narratives: Vec<NarrativeEntry>,
    resources: Vec<ResourceAllocation>,
}

impl CampaignStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Transactions ----------------------------------------------------

    /// Run `f` atomically: on error the store is restored to its state
    /// before the call and the error is passed through.
    pub fn transaction<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let snapshot = self.clone();
        match f(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                debug!(error = %err, "Transaction rolled back");
                *self = snapshot;
                Err(err)
            }
        }
    }

    // -- Rosters ---------------------------------------------------------

    pub fn roster(&self, id: RosterId) -> Result<&Roster> {
        self.rosters.get(&id).ok_or(WarchestError::UnknownRoster(id))
    }

    pub(crate) fn roster_mut(&mut self, id: RosterId) -> Result<&mut Roster> {
        self.rosters.get_mut(&id).ok_or(WarchestError::UnknownRoster(id))
    }

    pub(crate) fn insert_roster(&mut self, roster: Roster) -> RosterId {
        let id = roster.id;
        self.rosters.insert(id, roster);
        id
    }

    pub fn rosters(&self) -> impl Iterator<Item = &Roster> {
        self.rosters.values()
    }

    // -- Fighters --------------------------------------------------------

    pub fn fighter(&self, id: FighterId) -> Result<&Fighter> {
        self.fighters.get(&id).ok_or(WarchestError::UnknownFighter(id))
    }

    pub(crate) fn fighter_mut(&mut self, id: FighterId) -> Result<&mut Fighter> {
        self.fighters.get_mut(&id).ok_or(WarchestError::UnknownFighter(id))
    }

    pub(crate) fn insert_fighter(&mut self, fighter: Fighter) -> FighterId {
        let id = fighter.id;
        self.fighters.insert(id, fighter);
        id
    }

    pub(crate) fn remove_fighter(&mut self, id: FighterId) -> Result<Fighter> {
        self.fighters.remove(&id).ok_or(WarchestError::UnknownFighter(id))
    }

    pub fn fighters_of(&self, roster: RosterId) -> Vec<&Fighter> {
        self.fighters.values().filter(|f| f.roster == roster).collect()
    }

    /// The roster's implicit inventory fighter, if it has one.
    pub fn stash_fighter(&self, roster: RosterId) -> Option<&Fighter> {
        self.fighters.values().find(|f| f.roster == roster && f.is_stash)
    }

    // -- Assignments -----------------------------------------------------

    pub fn assignment(&self, id: AssignmentId) -> Result<&Assignment> {
        self.assignments.get(&id).ok_or(WarchestError::UnknownAssignment(id))
    }

    pub(crate) fn assignment_mut(&mut self, id: AssignmentId) -> Result<&mut Assignment> {
        self.assignments.get_mut(&id).ok_or(WarchestError::UnknownAssignment(id))
    }

    pub(crate) fn insert_assignment(&mut self, assignment: Assignment) -> AssignmentId {
        let id = assignment.id;
        self.assignments.insert(id, assignment);
        id
    }

    pub(crate) fn remove_assignment(&mut self, id: AssignmentId) -> Result<Assignment> {
        self.assignments.remove(&id).ok_or(WarchestError::UnknownAssignment(id))
    }

    pub fn assignments_of(&self, fighter: FighterId) -> Vec<&Assignment> {
        self.assignments.values().filter(|a| a.fighter == fighter).collect()
    }

    // -- Campaigns -------------------------------------------------------

    pub fn campaign(&self, id: CampaignId) -> Result<&Campaign> {
        self.campaigns.get(&id).ok_or(WarchestError::UnknownCampaign(id))
    }

    pub(crate) fn campaign_mut(&mut self, id: CampaignId) -> Result<&mut Campaign> {
        self.campaigns.get_mut(&id).ok_or(WarchestError::UnknownCampaign(id))
    }

    pub(crate) fn insert_campaign(&mut self, campaign: Campaign) -> CampaignId {
        let id = campaign.id;
        self.campaigns.insert(id, campaign);
        id
    }

    /// The live clone of `original` within `campaign`, if one exists.
    /// At most one per (campaign, original roster).
    pub fn clone_of(&self, campaign: CampaignId, original: RosterId) -> Option<&Roster> {
        self.rosters
            .values()
            .find(|r| r.campaign == Some(campaign) && r.cloned_from == Some(original))
    }

    // -- Ledger ----------------------------------------------------------

    pub(crate) fn push_ledger_entry(&mut self, entry: LedgerEntry) {
        self.ledger.push(entry);
    }

    pub fn ledger_entries(&self, roster: RosterId) -> impl Iterator<Item = &LedgerEntry> {
        self.ledger.iter().filter(move |e| e.roster == roster)
    }

    /// The most recent ledger entry for a roster. Gates propagation and
    /// serves as the cache-invalidation marker.
    pub fn latest_entry(&self, roster: RosterId) -> Option<&LedgerEntry> {
        self.ledger.iter().rev().find(|e| e.roster == roster)
    }

    pub(crate) fn next_seq(&self, roster: RosterId) -> u64 {
        self.latest_entry(roster).map_or(1, |e| e.seq + 1)
    }

    // -- Capture records -------------------------------------------------

    pub fn capture_for(&self, fighter: FighterId) -> Option<&CaptureRecord> {
        self.captures.iter().find(|c| c.fighter == fighter)
    }

    pub(crate) fn capture_for_mut(&mut self, fighter: FighterId) -> Option<&mut CaptureRecord> {
        self.captures.iter_mut().find(|c| c.fighter == fighter)
    }

    pub(crate) fn insert_capture(&mut self, record: CaptureRecord) {
        self.captures.push(record);
    }

    /// Remove the capture record for a fighter. Deletion is the signal that
    /// the fighter's cost has been restored.
    pub(crate) fn remove_capture(&mut self, fighter: FighterId) -> Result<CaptureRecord> {
        let idx = self
            .captures
            .iter()
            .position(|c| c.fighter == fighter)
            .ok_or(WarchestError::NotCaptured(fighter))?;
        Ok(self.captures.remove(idx))
    }

    // -- Narrative log ---------------------------------------------------

    pub(crate) fn push_narrative(&mut self, entry: NarrativeEntry) {
        self.narratives.push(entry);
    }

    pub fn narratives_for(&self, campaign: CampaignId) -> Vec<&NarrativeEntry> {
        self.narratives
            .iter()
            .filter(|n| n.campaign == Some(campaign))
            .collect()
    }

    // -- Resource allocations --------------------------------------------

    pub fn resource(
        &self,
        campaign: CampaignId,
        roster: RosterId,
        name: &str,
    ) -> Option<&ResourceAllocation> {
        self.resources
            .iter()
            .find(|r| r.campaign == campaign && r.roster == roster && r.resource == name)
    }

    /// Conflict-free get-or-create: safe to re-run after partial failure.
    pub(crate) fn resource_get_or_create(
        &mut self,
        campaign: CampaignId,
        roster: RosterId,
        name: &str,
        default_amount: i64,
    ) -> &mut ResourceAllocation {
        let idx = self
            .resources
            .iter()
            .position(|r| r.campaign == campaign && r.roster == roster && r.resource == name);
        match idx {
            Some(i) => &mut self.resources[i],
            None => {
                self.resources.push(ResourceAllocation {
                    campaign,
                    roster,
                    resource: name.to_string(),
                    amount: default_amount,
                });
                self.resources.last_mut().unwrap()
            }
        }
    }

    // -- Campaign cloning ------------------------------------------------

    /// Deep-clone a roster into campaign mode with identity remapping.
    ///
    /// The clone gets a fresh id for itself and every fighter/assignment,
    /// preserves all cached cost fields, links back to the original via
    /// `cloned_from`, and resets lifetime earnings (credits history restarts
    /// with the campaign; the cached balances themselves carry over).
    pub(crate) fn clone_roster_for_campaign(
        &mut self,
        original: RosterId,
        campaign: CampaignId,
    ) -> Result<RosterId> {
        let source = self.roster(original)?;
        if source.archived {
            return Err(WarchestError::RosterArchived(original));
        }

        let mut clone = source.clone();
        clone.id = RosterId::new();
        clone.status = RosterStatus::CampaignMode;
        clone.campaign = Some(campaign);
        clone.cloned_from = Some(original);
        clone.credits_earned = 0;
        clone.created_at = Utc::now();
        let clone_id = clone.id;

        // First pass: copy fighters under fresh ids.
        let mut fighter_map: BTreeMap<FighterId, FighterId> = BTreeMap::new();
        let mut new_fighters: Vec<Fighter> = Vec::new();
        for fighter in self.fighters.values().filter(|f| f.roster == original) {
            let mut copy = fighter.clone();
            copy.id = FighterId::new();
            copy.roster = clone_id;
            fighter_map.insert(fighter.id, copy.id);
            new_fighters.push(copy);
        }

        // Second pass: copy assignments, remapping owner and child links.
        let mut assignment_map: BTreeMap<AssignmentId, AssignmentId> = BTreeMap::new();
        let mut new_assignments: Vec<Assignment> = Vec::new();
        for assignment in self.assignments.values() {
            let Some(&new_owner) = fighter_map.get(&assignment.fighter) else {
                continue;
            };
            let mut copy = assignment.clone();
            copy.id = AssignmentId::new();
            copy.fighter = new_owner;
            copy.child_fighter = assignment
                .child_fighter
                .and_then(|child| fighter_map.get(&child).copied());
            assignment_map.insert(assignment.id, copy.id);
            new_assignments.push(copy);
        }

        // Third pass: fix child fighters' back-references to their source
        // assignment.
        for fighter in &mut new_fighters {
            fighter.source_assignment = fighter
                .source_assignment
                .and_then(|a| assignment_map.get(&a).copied());
        }

        debug!(
            original = %original,
            clone = %clone_id,
            fighters = new_fighters.len(),
            assignments = new_assignments.len(),
            "Cloned roster for campaign"
        );

        self.rosters.insert(clone_id, clone);
        for fighter in new_fighters {
            self.fighters.insert(fighter.id, fighter);
        }
        for assignment in new_assignments {
            self.assignments.insert(assignment.id, assignment);
        }
        Ok(clone_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
