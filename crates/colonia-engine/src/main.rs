//! Headless engine binary for the Colonia simulation.
//!
//! Loads the game configuration and ruleset, builds a seeded scenario and
//! plays it for the configured number of turns, logging a summary per turn.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `COLONIA_CONFIG` or `colonia.yaml`
//! 3. Load the ruleset and apply option overrides
//! 4. Build the scenario from the configured seed
//! 5. Play turns: scripted orders, then the turn pass
//! 6. Log the final standings

mod error;
mod orders;
mod scenario;

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use colonia_rules::GameConfig;
use colonia_sim::{Game, advance_turn};

use crate::error::EngineError;

/// Application entry point for the engine.
fn main() -> Result<(), EngineError> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("colonia-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        seed = config.seed,
        turns = config.turns,
        width = config.map.width,
        height = config.map.height,
        "Configuration loaded"
    );

    // 3. Load the ruleset.
    let rules = Arc::new(config.load_ruleset()?);
    info!(
        goods = rules.goods().len(),
        units = rules.units().len(),
        buildings = rules.buildings().len(),
        disasters = rules.disasters().len(),
        "Ruleset loaded"
    );

    // 4. Build the scenario.
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let mut game = scenario::build(rules, config.map, &mut rng)?;

    // 5. Play.
    for _ in 0..config.turns {
        let orders = orders::issue_orders(&mut game, &mut rng)?;
        let summary = advance_turn(&mut game, &mut rng)?;
        debug!(summary = %serde_json::to_string(&summary)?, "Turn summary");
        info!(
            turn = summary.turn,
            moves = orders.moves,
            attacks = orders.attacks.len(),
            notices = summary.notices.len(),
            disasters = summary.disasters.len(),
            "Turn played"
        );
    }

    // 6. Log results.
    log_standings(&game)?;
    info!(turns = game.turn(), "colonia-engine shutdown complete");
    Ok(())
}

/// Load the game configuration, falling back to defaults when the file is
/// absent.
fn load_config() -> Result<GameConfig, EngineError> {
    let path = GameConfig::default_path();
    if path.exists() {
        Ok(GameConfig::from_file(&path)?)
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(GameConfig::default())
    }
}

/// Log each player's treasury, colonies and units.
fn log_standings(game: &Game) -> Result<(), EngineError> {
    for player in game.players() {
        let units = game.units().filter(|u| u.owner() == player.id()).count();
        info!(
            player = player.name(),
            gold = player.gold(),
            units,
            "Final standing"
        );
        for colony in game.colonies().filter(|c| c.owner() == player.id()) {
            let liberty = colony.liberty(game.rules())?;
            info!(
                colony = colony.name(),
                population = colony.unit_count(),
                sol = liberty.sol,
                stock = %serde_json::to_string(colony.stock())?,
                "Colony"
            );
        }
    }
    Ok(())
}
