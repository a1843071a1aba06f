//! Shared types for the WARCHEST economy engine.
//!
//! These types form the data model used across all modules: the three-level
//! ownership hierarchy (roster → fighter → assignment), the append-only
//! ledger, campaigns, and capture records. They are designed to be stable so
//! that store, engine, and storage modules can depend on them without
//! circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Typed ids
// ---------------------------------------------------------------------------

macro_rules! entity_id {
    ($name:ident, $prefix:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", $prefix, self.0)
            }
        }
    };
}

entity_id!(RosterId, "roster");
entity_id!(FighterId, "fighter");
entity_id!(AssignmentId, "assign");
entity_id!(CampaignId, "campaign");

// ---------------------------------------------------------------------------
// Cost deltas
// ---------------------------------------------------------------------------

/// A cost change expressed as the pair of values it moves between.
///
/// All costs are whole credits. The signed difference is what propagation
/// applies one level up the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostDelta {
    pub old_value: i64,
    pub new_value: i64,
}

impl CostDelta {
    pub fn new(old_value: i64, new_value: i64) -> Self {
        Self { old_value, new_value }
    }

    /// The signed change this delta represents.
    pub fn signed(&self) -> i64 {
        self.new_value - self.old_value
    }
}

impl fmt::Display for CostDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {} ({:+})", self.old_value, self.new_value, self.signed())
    }
}

/// Clamp a cached aggregate to the non-negative range.
pub fn clamp_cost(value: i64) -> i64 {
    value.max(0)
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// Roster lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RosterStatus {
    /// Pre-campaign list building. No credit refunds on equipment removal.
    Building,
    /// Live campaign roster (always a clone of a building roster).
    CampaignMode,
}

impl fmt::Display for RosterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterStatus::Building => write!(f, "BUILDING"),
            RosterStatus::CampaignMode => write!(f, "CAMPAIGN_MODE"),
        }
    }
}

/// A player's gang: the top-level cost-tracking entity.
///
/// The aggregate fields are caches, never recomputed live. They are mutated
/// exclusively through ledger entry creation (see `engine::ledger`); the
/// staleness flag marks windows where a cached figure may lag behind
/// lower-level changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    pub id: RosterId,
    pub name: String,
    pub status: RosterStatus,
    /// Campaign this roster participates in (campaign clones only).
    pub campaign: Option<CampaignId>,
    /// The pre-campaign roster this was cloned from, if any.
    pub cloned_from: Option<RosterId>,
    /// Combat rating: sum of non-stash fighter costs, cached.
    pub rating_current: i64,
    /// Stash value: cost parked on the stash fighter, cached.
    pub stash_current: i64,
    /// Spendable credits, cached.
    pub credits_current: i64,
    /// Lifetime credits earned (positive applied deltas only).
    pub credits_earned: i64,
    pub stale: bool,
    /// Archived rosters are kept for campaign history, never hard-deleted.
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

impl Roster {
    pub fn new(name: impl Into<String>) -> Self {
        Roster {
            id: RosterId::new(),
            name: name.into(),
            status: RosterStatus::Building,
            campaign: None,
            cloned_from: None,
            rating_current: 0,
            stash_current: 0,
            credits_current: 0,
            credits_earned: 0,
            stale: false,
            archived: false,
            created_at: Utc::now(),
        }
    }

    /// Total wealth of the roster: rating + stash + credits.
    ///
    /// This is the figure campaign budgets are measured against.
    pub fn total_cost(&self) -> i64 {
        self.rating_current + self.stash_current + self.credits_current
    }

    pub fn in_campaign_mode(&self) -> bool {
        self.status == RosterStatus::CampaignMode
    }
}

impl fmt::Display for Roster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] rating={} stash={} credits={}",
            self.name, self.status, self.rating_current, self.stash_current, self.credits_current,
        )
    }
}

// ---------------------------------------------------------------------------
// Fighter
// ---------------------------------------------------------------------------

/// A unit within a roster.
///
/// `rating_current` caches the fighter's intrinsic cost plus the last
/// propagated assignment contributions. A "child" fighter (vehicle/mount
/// pattern) is one whose existence is tied to an equipment assignment on
/// another fighter, linked via `source_assignment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fighter {
    pub id: FighterId,
    pub roster: RosterId,
    pub name: String,
    /// Intrinsic cost from the catalog, before equipment.
    pub base_cost: i64,
    pub rating_current: i64,
    pub stale: bool,
    /// The roster's implicit inventory fighter.
    pub is_stash: bool,
    /// Set when this fighter was spawned by an assignment on another fighter.
    pub source_assignment: Option<AssignmentId>,
}

impl Fighter {
    pub fn new(roster: RosterId, name: impl Into<String>, base_cost: i64) -> Self {
        Fighter {
            id: FighterId::new(),
            roster,
            name: name.into(),
            base_cost,
            rating_current: 0,
            stale: true,
            is_stash: false,
            source_assignment: None,
        }
    }

    /// Build the roster's implicit stash fighter.
    pub fn stash(roster: RosterId) -> Self {
        Fighter {
            stale: false,
            is_stash: true,
            ..Fighter::new(roster, "Stash", 0)
        }
    }

    pub fn is_child(&self) -> bool {
        self.source_assignment.is_some()
    }
}

impl fmt::Display for Fighter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.is_stash { " (stash)" } else { "" };
        write!(f, "{}{} rating={}", self.name, tag, self.rating_current)
    }
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// An equipment-to-fighter link, itself cost-bearing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub fighter: FighterId,
    /// Catalog key of the equipment item.
    pub equipment: String,
    pub rating_current: i64,
    pub stale: bool,
    /// Child fighter spawned by this assignment (vehicle/mount pattern).
    pub child_fighter: Option<FighterId>,
}

impl Assignment {
    pub fn new(fighter: FighterId, equipment: impl Into<String>) -> Self {
        Assignment {
            id: AssignmentId::new(),
            fighter,
            equipment: equipment.into(),
            rating_current: 0,
            stale: true,
            child_fighter: None,
        }
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rating={}", self.equipment, self.rating_current)
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// What kind of roster mutation a ledger entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerAction {
    Create,
    Clone,
    AddFighter,
    RemoveFighter,
    AddEquipment,
    RemoveEquipment,
    AdvanceFighter,
    CaptureFighter,
    ReturnFighter,
    ReleaseFighter,
    SellFighter,
    RansomPaid,
    RansomReceived,
    CampaignStart,
}

impl fmt::Display for LedgerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LedgerAction::Create => "create",
            LedgerAction::Clone => "clone",
            LedgerAction::AddFighter => "add_fighter",
            LedgerAction::RemoveFighter => "remove_fighter",
            LedgerAction::AddEquipment => "add_equipment",
            LedgerAction::RemoveEquipment => "remove_equipment",
            LedgerAction::AdvanceFighter => "advance_fighter",
            LedgerAction::CaptureFighter => "capture_fighter",
            LedgerAction::ReturnFighter => "return_fighter",
            LedgerAction::ReleaseFighter => "release_fighter",
            LedgerAction::SellFighter => "sell_fighter",
            LedgerAction::RansomPaid => "ransom_paid",
            LedgerAction::RansomReceived => "ransom_received",
            LedgerAction::CampaignStart => "campaign_start",
        };
        write!(f, "{label}")
    }
}

/// Immutable record of one roster-aggregate mutation.
///
/// Entries for a roster are totally ordered by `seq`. The most recent entry
/// gates whether propagation is active for the roster and doubles as a
/// cache-invalidation marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub roster: RosterId,
    /// Per-roster sequence number, starting at 1.
    pub seq: u64,
    pub action: LedgerAction,
    pub user: String,
    pub rating_before: i64,
    pub rating_after: i64,
    pub stash_before: i64,
    pub stash_after: i64,
    pub credits_before: i64,
    pub credits_after: i64,
    /// Signed deltas as supplied by the caller (pre-clamp).
    pub rating_delta: i64,
    pub stash_delta: i64,
    pub credits_delta: i64,
    /// Whether the credits delta actually moved credits, or was recorded
    /// for information only.
    pub credits_applied: bool,
    pub fighter: Option<FighterId>,
    pub assignment: Option<AssignmentId>,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for LedgerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} by {}: rating {:+} ({}→{}) stash {:+} credits {:+}{}",
            self.seq,
            self.action,
            self.user,
            self.rating_delta,
            self.rating_before,
            self.rating_after,
            self.stash_delta,
            self.credits_delta,
            if self.credits_applied { "" } else { " (not applied)" },
        )
    }
}

// ---------------------------------------------------------------------------
// Campaign
// ---------------------------------------------------------------------------

/// Campaign lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignStatus {
    PreCampaign,
    InProgress,
    PostCampaign,
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CampaignStatus::PreCampaign => write!(f, "PRE_CAMPAIGN"),
            CampaignStatus::InProgress => write!(f, "IN_PROGRESS"),
            CampaignStatus::PostCampaign => write!(f, "POST_CAMPAIGN"),
        }
    }
}

/// A named campaign resource allocated per roster at start (e.g. ammo).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceType {
    pub name: String,
    pub default_amount: i64,
}

/// One roster's tracked amount of a campaign resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceAllocation {
    pub campaign: CampaignId,
    pub roster: RosterId,
    pub resource: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub status: CampaignStatus,
    /// Per-roster starting budget distributed at campaign start.
    pub budget: i64,
    /// Participating rosters. Once IN_PROGRESS these are clones, not
    /// originals.
    pub rosters: Vec<RosterId>,
    pub resource_types: Vec<ResourceType>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    pub fn new(name: impl Into<String>, budget: i64) -> Self {
        Campaign {
            id: CampaignId::new(),
            name: name.into(),
            status: CampaignStatus::PreCampaign,
            budget,
            rosters: Vec::new(),
            resource_types: Vec::new(),
            archived: false,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for Campaign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] budget={} rosters={}",
            self.name,
            self.status,
            self.budget,
            self.rosters.len(),
        )
    }
}

// ---------------------------------------------------------------------------
// Capture records
// ---------------------------------------------------------------------------

/// Links a captured fighter to the capturing roster.
///
/// The record is deleted on return/release; its absence is the signal that
/// the fighter's cost has been restored to the original roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub id: Uuid,
    pub fighter: FighterId,
    pub original_roster: RosterId,
    pub capturing_roster: RosterId,
    pub sold_to_faction: bool,
    pub captured_at: DateTime<Utc>,
    pub sold_at: Option<DateTime<Utc>>,
}

impl CaptureRecord {
    pub fn new(fighter: FighterId, original_roster: RosterId, capturing_roster: RosterId) -> Self {
        CaptureRecord {
            id: Uuid::new_v4(),
            fighter,
            original_roster,
            capturing_roster,
            sold_to_faction: false,
            captured_at: Utc::now(),
            sold_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
