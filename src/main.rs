//! WARCHEST — Campaign Economy Ledger
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores the campaign store from disk (or creates fresh), and replays a
//! small demonstration campaign through the economy engine before persisting
//! the result.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use warchest::catalog::StaticCatalog;
use warchest::config::AppConfig;
use warchest::engine::mutations::{self, RosterOptions};
use warchest::engine::{capture, lifecycle};
use warchest::storage;
use warchest::store::CampaignStore;
use warchest::types::{Campaign, ResourceType};

const BANNER: &str = r#"
__        ___    ____   ____ _   _ _____ ____ _____
\ \      / / \  |  _ \ / ___| | | | ____/ ___|_   _|
 \ \ /\ / / _ \ | |_) | |   | |_| |  _| \___ \ | |
  \ V  V / ___ \|  _ <| |___|  _  | |___ ___) || |
   \_/\_/_/   \_\_| \_\\____|_| |_|_____|____/ |_|

  Campaign Economy Ledger
  v0.1.0
"#;

fn main() -> Result<()> {
    let cfg = AppConfig::load_or_default("warchest.toml")?;
    init_logging();

    println!("{BANNER}");
    info!(
        seed_ledger = cfg.rules.seed_roster_ledger,
        state_file = %cfg.storage.state_file,
        "WARCHEST starting up"
    );

    let mut store = match storage::load_store(&cfg.storage.state_file)? {
        Some(store) => {
            info!(rosters = store.rosters().count(), "Resumed from saved state");
            store
        }
        None => {
            info!("Fresh start");
            CampaignStore::new()
        }
    };

    run_demo_campaign(&mut store, &cfg)?;

    storage::save_store(&store, &cfg.storage.state_file)?;
    info!("State saved, shutting down");
    Ok(())
}

/// Replay a small campaign through the engine: build two gangs, start the
/// campaign, trade equipment, then run a capture-and-ransom exchange.
fn run_demo_campaign(store: &mut CampaignStore, cfg: &AppConfig) -> Result<()> {
    let catalog = StaticCatalog::new()
        .with_fighter("ganger", 50)
        .with_fighter("champion", 95)
        .with_fighter("dirtbike_chassis", 40)
        .with_equipment("lasgun", 15)
        .with_equipment("chainsword", 25)
        .with_vehicle("dirtbike", 30, "dirtbike_chassis");

    let options = RosterOptions {
        with_stash: cfg.rules.create_stash_fighter,
        seed_ledger: cfg.rules.seed_roster_ledger,
    };

    // -- Build two gangs --------------------------------------------------

    let dogs = mutations::create_roster(store, "Scrap Dogs", "player1", &options)?;
    let brakk = mutations::add_fighter(store, &catalog, dogs, "champion", "Brakk", "player1")?;
    mutations::add_equipment(store, &catalog, brakk, "chainsword", "player1")?;
    let scav = mutations::add_fighter(store, &catalog, dogs, "ganger", "Scav", "player1")?;
    mutations::add_equipment(store, &catalog, scav, "lasgun", "player1")?;

    let vultures = mutations::create_roster(store, "Rust Vultures", "player2", &options)?;
    let vex = mutations::add_fighter(store, &catalog, vultures, "champion", "Vex", "player2")?;
    mutations::add_equipment(store, &catalog, vex, "dirtbike", "player2")?;

    info!(dogs = %store.roster(dogs)?, vultures = %store.roster(vultures)?, "Gangs built");

    // -- Start the campaign -----------------------------------------------

    let mut campaign = Campaign::new("Ash Wastes", 400);
    campaign.rosters = vec![dogs, vultures];
    campaign
        .resource_types
        .push(ResourceType { name: "ammo".to_string(), default_amount: 5 });
    let campaign = lifecycle::create(store, campaign)?;

    let report = lifecycle::start(store, campaign, "arbitrator")?;
    for outcome in &report.outcomes {
        info!(
            original = %outcome.original,
            clone = %outcome.clone,
            credits = outcome.credits_granted,
            reason = outcome.noop_reason.as_deref().unwrap_or("-"),
            "Budget distributed"
        );
    }

    // -- A capture-and-ransom exchange ------------------------------------

    let dogs_clone = report.outcomes[0].clone;
    let vultures_clone = report.outcomes[1].clone;
    let victim = store
        .fighters_of(dogs_clone)
        .iter()
        .find(|f| !f.is_stash)
        .map(|f| f.id)
        .expect("clone has fighters");

    let captured = capture::capture(store, victim, vultures_clone, "arbitrator")?;
    info!(cost = captured.cost_removed, "Fighter captured");

    let ransomed = capture::return_to_owner(store, victim, 40, "arbitrator")?;
    info!(
        restored = ransomed.restored_cost,
        ransom = ransomed.ransom,
        "Fighter ransomed back"
    );

    info!(
        dogs = %store.roster(dogs_clone)?,
        vultures = %store.roster(vultures_clone)?,
        narrative_entries = store.narratives_for(campaign).len(),
        "Demo campaign complete"
    );
    Ok(())
}

/// Initialise structured logging. `RUST_LOG` overrides the default level.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
