//! Seeded scenario setup.
//!
//! The map is land on the western two thirds and ocean on the rest. Each
//! European nation founds one colony a couple of tiles from the coast,
//! staffed with a farmer, a statesman and a carpenter, guarded by a soldier,
//! with a ship offshore. A native nation roams the far west with braves.

use std::sync::Arc;

use rand::Rng;
use tracing::info;

use colonia_rules::config::MapConfig;
use colonia_rules::{Ruleset, WeightedChoice, random_int};
use colonia_sim::Game;
use colonia_sim::unit::UnitLocation;
use colonia_types::{
    BuildingTypeId, ColonyId, GoodsTypeId, PlayerId, PlayerKind, Stance, TileAddition, TileTypeId,
    UnitRole,
};
use colonia_world::{Map, Position};

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Tables
// -----------------------------------------------------------------------

/// Land terrain and its relative frequency.
const LAND: &[(&str, u32)] = &[
    ("plains", 30),
    ("grassland", 25),
    ("prairie", 20),
    ("savannah", 10),
    ("marsh", 8),
    ("desert", 4),
    ("tundra", 3),
];

/// European nations, their first colony and their ship.
const NATIONS: &[(&str, &str, &str)] = &[
    ("English", "Jamestown", "privateer"),
    ("Dutch", "Nieuw Amsterdam", "merchantman"),
];

/// Percent of forestable tiles that start forested.
const FOREST_PCT: u32 = 40;

/// Percent of unforested land that starts as hills.
const HILLS_PCT: u32 = 8;

/// Gold each European nation starts with.
const STARTING_GOLD: i64 = 1000;

// -----------------------------------------------------------------------
// Map
// -----------------------------------------------------------------------

/// Column where the ocean begins.
fn coastline(width: u32) -> u32 {
    width.saturating_mul(2).checked_div(3).unwrap_or(0)
}

/// Generate terrain for a map of the configured size.
pub fn generate_map(rules: &Ruleset, config: MapConfig, rng: &mut impl Rng) -> Result<Map, EngineError> {
    let mut map = Map::new(config.width, config.height, &TileTypeId::new("ocean"))?;
    let land = WeightedChoice::new(LAND.iter().map(|(id, weight)| (TileTypeId::new(*id), *weight)));
    let coast = coastline(config.width);

    for y in 0..config.height {
        for x in 0..coast {
            let Some(type_id) = land.sample(rng, "terrain").cloned() else {
                continue;
            };
            let position = Position::new(x, y);
            let forestable = rules.tile_type(type_id.as_str()).is_some_and(|t| t.forestable);
            map.set_tile_type(position, type_id)?;
            let tile = map.require_mut(position)?;
            if forestable && random_int(rng, "forest", 100) < FOREST_PCT {
                tile.set_forested(true);
            } else if random_int(rng, "hills", 100) < HILLS_PCT {
                tile.set_addition(TileAddition::Hills);
            }
        }
    }
    info!(width = config.width, height = config.height, coast, "Map generated");
    Ok(map)
}

// -----------------------------------------------------------------------
// Players and colonies
// -----------------------------------------------------------------------

/// Build the full starting game.
pub fn build(rules: Arc<Ruleset>, config: MapConfig, rng: &mut impl Rng) -> Result<Game, EngineError> {
    let coast = coastline(config.width);
    if coast < 4 {
        return Err(EngineError::Scenario {
            message: format!("map {}x{} leaves no room for colonies", config.width, config.height),
        });
    }
    let map = generate_map(&rules, config, rng)?;
    let mut game = Game::new(rules, map);

    let natives = game.add_player("Arawak", PlayerKind::Native);
    let rows = u32::try_from(NATIONS.len()).unwrap_or(1).saturating_add(1);
    let mut europeans = Vec::with_capacity(NATIONS.len());

    for (index, (nation, colony_name, ship)) in NATIONS.iter().enumerate() {
        let player = game.add_player(nation, PlayerKind::European);
        game.player_mut(player)?.add_gold(STARTING_GOLD);
        game.set_stance(player, natives, Stance::Peace)?;

        let slot = u32::try_from(index).unwrap_or(0).saturating_add(1);
        let y = config.height.saturating_mul(slot).checked_div(rows).unwrap_or(0);
        let site = Position::new(coast.saturating_sub(2), y);
        let colony = game.found_colony(player, colony_name, site)?;
        staff_colony(&mut game, player, colony, site)?;
        game.add_unit(player, ship, UnitLocation::Tile(Position::new(coast, y)))?;
        europeans.push(player);
    }

    if let [first, second, ..] = europeans.as_slice() {
        game.set_stance(*first, *second, Stance::War)?;
    }
    let middle = config.height.checked_div(2).unwrap_or(0);
    for y in [middle.saturating_sub(1), middle] {
        game.add_unit(natives, "brave", UnitLocation::Tile(Position::new(0, y)))?;
    }

    info!(
        players = game.players().count(),
        colonies = game.colonies().count(),
        units = game.units().count(),
        "Scenario built"
    );
    Ok(game)
}

/// Best neighbouring land tile for `goods`, if any produces it.
fn best_tile(game: &Game, site: Position, goods: &GoodsTypeId) -> Result<Option<Position>, EngineError> {
    let rules = game.rules();
    let mut best: Option<(u32, Position)> = None;
    for (_, position) in game.map().neighbours(site) {
        let tile = game.map().require(position)?;
        if tile.is_water(rules)? {
            continue;
        }
        let amount = tile.potential_production(rules, goods)?;
        if amount > 0 && best.is_none_or(|(top, _)| amount > top) {
            best = Some((amount, position));
        }
    }
    Ok(best.map(|(_, position)| position))
}

fn staff_colony(game: &mut Game, player: PlayerId, colony: ColonyId, site: Position) -> Result<(), EngineError> {
    let here = UnitLocation::Tile(site);
    let food = GoodsTypeId::new("food");
    if let Some(field) = best_tile(game, site, &food)? {
        let farmer = game.add_unit(player, "expert_farmer", here)?;
        game.assign_to_tile(colony, farmer, field, food.as_str())?;
    }
    let lumber = GoodsTypeId::new("lumber");
    if let Some(woods) = best_tile(game, site, &lumber)? {
        let lumberjack = game.add_unit(player, "expert_lumberjack", here)?;
        game.assign_to_tile(colony, lumberjack, woods, lumber.as_str())?;
    }
    let statesman = game.add_unit(player, "elder_statesman", here)?;
    game.assign_to_building(colony, statesman, "town_hall")?;
    let carpenter = game.add_unit(player, "master_carpenter", here)?;
    game.assign_to_building(colony, carpenter, "carpenter_house")?;

    let rules = Arc::clone(game.rules_handle());
    let target = game.colony_mut(colony)?;
    target.add_goods(&rules, &GoodsTypeId::new("muskets"), 50);
    target.add_goods(&rules, &food, 20);
    target.queue_building(BuildingTypeId::new("stockade"));
    target.queue_building(BuildingTypeId::new("docks"));

    let soldier = game.add_unit(player, "veteran_soldier", here)?;
    game.equip_unit(colony, soldier, UnitRole::Soldier)?;
    Ok(())
}
