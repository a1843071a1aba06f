//! Domain error types.
//!
//! Validation failures roll back the enclosing transaction entirely; clamping
//! and the propagation skip are deliberately *not* errors (see
//! `engine::propagation`).

use crate::types::{AssignmentId, CampaignId, CampaignStatus, FighterId, RosterId};

#[derive(Debug, thiserror::Error)]
pub enum WarchestError {
    #[error("Campaign {campaign} is {actual}, expected {expected}")]
    WrongCampaignStatus {
        campaign: CampaignId,
        expected: CampaignStatus,
        actual: CampaignStatus,
    },

    #[error("Campaign {0} has no rosters attached")]
    CampaignEmpty(CampaignId),

    #[error("Insufficient credits: need {required}, have {available}")]
    InsufficientCredits { required: i64, available: i64 },

    #[error("Resource '{resource}' would go negative: have {available}, change {requested}")]
    ResourceUnderflow {
        resource: String,
        available: i64,
        requested: i64,
    },

    #[error("Roster not found: {0}")]
    UnknownRoster(RosterId),

    #[error("Fighter not found: {0}")]
    UnknownFighter(FighterId),

    #[error("Assignment not found: {0}")]
    UnknownAssignment(AssignmentId),

    #[error("Campaign not found: {0}")]
    UnknownCampaign(CampaignId),

    #[error("Catalog item not found: {0}")]
    UnknownCatalogItem(String),

    #[error("Fighter {0} is already captured")]
    AlreadyCaptured(FighterId),

    #[error("Fighter {0} is not captured")]
    NotCaptured(FighterId),

    #[error("Fighter {0} has already been sold to the faction")]
    AlreadySold(FighterId),

    #[error("Invalid capture: {0}")]
    InvalidCapture(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Campaign {0} cannot be archived while in progress")]
    ArchiveWhileInProgress(CampaignId),

    #[error("Roster {0} is archived")]
    RosterArchived(RosterId),
}

pub type Result<T> = std::result::Result<T, WarchestError>;
