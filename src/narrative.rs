//! Per-campaign narrative log.
//!
//! A free-text, append-only record distinct from the numeric ledger. Every
//! lifecycle/capture/sale/ransom operation writes one entry summarising the
//! numeric result in prose, optionally with dice-roll metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::store::CampaignStore;
use crate::types::CampaignId;

/// Dice-roll metadata attached to a narrative entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiceRoll {
    pub count: u32,
    pub results: Vec<u32>,
    pub total: u32,
}

impl DiceRoll {
    pub fn new(results: Vec<u32>) -> Self {
        DiceRoll {
            count: results.len() as u32,
            total: results.iter().sum(),
            results,
        }
    }
}

impl fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rolls: Vec<String> = self.results.iter().map(|r| r.to_string()).collect();
        write!(f, "{}d: [{}] = {}", self.count, rolls.join(", "), self.total)
    }
}

/// A free-text audit record describing a campaign event in prose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeEntry {
    pub id: Uuid,
    /// None for events on rosters not yet attached to a campaign.
    pub campaign: Option<CampaignId>,
    pub user: String,
    pub text: String,
    pub dice: Option<DiceRoll>,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for NarrativeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.dice {
            Some(dice) => write!(f, "[{}] {} ({dice})", self.user, self.text),
            None => write!(f, "[{}] {}", self.user, self.text),
        }
    }
}

/// Append a narrative entry to the log.
pub fn record(
    store: &mut CampaignStore,
    campaign: Option<CampaignId>,
    user: &str,
    text: impl Into<String>,
    dice: Option<DiceRoll>,
) {
    store.push_narrative(NarrativeEntry {
        id: Uuid::new_v4(),
        campaign,
        user: user.to_string(),
        text: text.into(),
        dice,
        timestamp: Utc::now(),
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Campaign;

    #[test]
    fn test_dice_roll_totals() {
        let roll = DiceRoll::new(vec![3, 5, 1]);
        assert_eq!(roll.count, 3);
        assert_eq!(roll.total, 9);
        assert_eq!(format!("{roll}"), "3d: [3, 5, 1] = 9");
    }

    #[test]
    fn test_record_appends_per_campaign() {
        let mut store = CampaignStore::new();
        let campaign = Campaign::new("Ash Wastes", 1500);
        let campaign_id = campaign.id;

        record(&mut store, Some(campaign_id), "arbitrator", "Campaign opened", None);
        record(&mut store, None, "player1", "Roster created", None);
        record(
            &mut store,
            Some(campaign_id),
            "player1",
            "Scavenging run",
            Some(DiceRoll::new(vec![6, 2])),
        );

        let entries = store.narratives_for(campaign_id);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "Campaign opened");
        assert_eq!(entries[1].dice.as_ref().unwrap().total, 8);
    }
}
