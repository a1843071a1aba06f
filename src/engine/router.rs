//! Cost Router — decides whether a fighter's cost changes count toward
//! stash or rating.
//!
//! Pure read-only logic; the ledger consumes the answer when splitting a
//! delta across the stash and rating columns.

use crate::error::Result;
use crate::store::CampaignStore;
use crate::types::FighterId;

/// Whether a fighter's cost belongs to the roster's stash column.
///
/// True if the fighter is the roster's stash fighter itself, or if it is a
/// child fighter whose source assignment sits on the stash fighter (a vehicle
/// parked in the stash). Everything else counts toward combat rating.
pub fn is_stash_linked(store: &CampaignStore, fighter: FighterId) -> Result<bool> {
    let fighter = store.fighter(fighter)?;
    if fighter.is_stash {
        return Ok(true);
    }
    match fighter.source_assignment {
        Some(assignment) => {
            let assignment = store.assignment(assignment)?;
            let parent = store.fighter(assignment.fighter)?;
            Ok(parent.is_stash)
        }
        None => Ok(false),
    }
}

/// Split a signed delta into (rating, stash) columns for a fighter.
pub fn route_delta(store: &CampaignStore, fighter: FighterId, delta: i64) -> Result<(i64, i64)> {
    if is_stash_linked(store, fighter)? {
        Ok((0, delta))
    } else {
        Ok((delta, 0))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Assignment, Fighter, Roster};

    struct Fixture {
        store: CampaignStore,
        stash: FighterId,
        plain: FighterId,
        stash_child: FighterId,
        plain_child: FighterId,
    }

    /// Roster with a stash fighter and a plain fighter, each with an
    /// assignment spawning a child fighter.
    fn fixture() -> Fixture {
        let mut store = CampaignStore::new();
        let roster = store.insert_roster(Roster::new("Scrap Dogs"));
        let stash = store.insert_fighter(Fighter::stash(roster));
        let plain = store.insert_fighter(Fighter::new(roster, "Brakk", 50));

        let mut spawn = |parent: FighterId, name: &str| {
            let mut assignment = Assignment::new(parent, "dirtbike");
            let mut child = Fighter::new(roster, name, 40);
            child.source_assignment = Some(assignment.id);
            let child_id = store.insert_fighter(child);
            assignment.child_fighter = Some(child_id);
            store.insert_assignment(assignment);
            child_id
        };
        let stash_child = spawn(stash, "Parked Bike");
        let plain_child = spawn(plain, "Brakk's Bike");

        Fixture { store, stash, plain, stash_child, plain_child }
    }

    #[test]
    fn test_stash_fighter_is_stash_linked() {
        let fx = fixture();
        assert!(is_stash_linked(&fx.store, fx.stash).unwrap());
    }

    #[test]
    fn test_plain_fighter_is_not_stash_linked() {
        let fx = fixture();
        assert!(!is_stash_linked(&fx.store, fx.plain).unwrap());
    }

    #[test]
    fn test_child_of_stash_equipment_is_stash_linked() {
        let fx = fixture();
        assert!(is_stash_linked(&fx.store, fx.stash_child).unwrap());
    }

    #[test]
    fn test_child_of_plain_equipment_is_not_stash_linked() {
        let fx = fixture();
        assert!(!is_stash_linked(&fx.store, fx.plain_child).unwrap());
    }

    #[test]
    fn test_route_delta_columns() {
        let fx = fixture();
        assert_eq!(route_delta(&fx.store, fx.stash, 30).unwrap(), (0, 30));
        assert_eq!(route_delta(&fx.store, fx.plain, 30).unwrap(), (30, 0));
        assert_eq!(route_delta(&fx.store, fx.plain, -30).unwrap(), (-30, 0));
    }

    #[test]
    fn test_unknown_fighter_errors() {
        let fx = fixture();
        assert!(is_stash_linked(&fx.store, FighterId::new()).is_err());
    }
}
