//! The tile grid.
//!
//! The [`Map`] owns every [`Tile`] in a row-major vector. Settlements and
//! units are never stored here; a tile only records the index of the
//! settlement standing on it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use colonia_types::{PlayerId, TileTypeId};

use crate::error::WorldError;
use crate::position::{Direction, Position};
use crate::tile::Tile;

/// A rectangular grid of tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Map {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl Map {
    /// Create a map filled with cleared tiles of type `fill`.
    pub fn new(width: u32, height: u32, fill: &TileTypeId) -> Result<Self, WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::InvalidDimensions { width, height });
        }
        let mut tiles = Vec::new();
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile::new(Position::new(x, y), fill.clone()));
            }
        }
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    /// Width in tiles.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Whether `position` lies on the map.
    pub const fn contains(&self, position: Position) -> bool {
        position.x < self.width && position.y < self.height
    }

    fn index(&self, position: Position) -> Option<usize> {
        if !self.contains(position) {
            return None;
        }
        let row = usize::try_from(position.y).ok()?;
        let col = usize::try_from(position.x).ok()?;
        let width = usize::try_from(self.width).ok()?;
        row.checked_mul(width)?.checked_add(col)
    }

    /// Tile at `position`.
    pub fn tile(&self, position: Position) -> Option<&Tile> {
        self.index(position).and_then(|i| self.tiles.get(i))
    }

    /// Mutable tile at `position`.
    pub fn tile_mut(&mut self, position: Position) -> Option<&mut Tile> {
        self.index(position).and_then(|i| self.tiles.get_mut(i))
    }

    /// Tile at `position`, or [`WorldError::OffMap`].
    pub fn require(&self, position: Position) -> Result<&Tile, WorldError> {
        self.tile(position).ok_or(WorldError::OffMap(position))
    }

    /// Mutable tile at `position`, or [`WorldError::OffMap`].
    pub fn require_mut(&mut self, position: Position) -> Result<&mut Tile, WorldError> {
        self.tile_mut(position).ok_or(WorldError::OffMap(position))
    }

    /// Replace the terrain type of a tile, keeping nothing of its overlay.
    pub fn set_tile_type(&mut self, position: Position, type_id: TileTypeId) -> Result<(), WorldError> {
        let tile = self.require_mut(position)?;
        *tile = Tile::new(position, type_id);
        Ok(())
    }

    /// All tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// On-map neighbours of `position`, clockwise from north.
    pub fn neighbours(&self, position: Position) -> impl Iterator<Item = (Direction, Position)> + '_ {
        Direction::ALL.into_iter().filter_map(move |direction| {
            position
                .step(direction)
                .filter(|next| self.contains(*next))
                .map(|next| (direction, next))
        })
    }

    /// On-map positions within `radius` steps of `centre`, in position order.
    pub fn positions_within(&self, centre: Position, radius: u32) -> Vec<Position> {
        let min_x = centre.x.saturating_sub(radius);
        let min_y = centre.y.saturating_sub(radius);
        let max_x = centre.x.saturating_add(radius).min(self.width.saturating_sub(1));
        let max_y = centre.y.saturating_add(radius).min(self.height.saturating_sub(1));
        let mut positions = Vec::new();
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                positions.push(Position::new(x, y));
            }
        }
        positions
    }

    /// Reveal every tile within `radius` of `centre` to `player`.
    ///
    /// Returns the number of newly explored tiles.
    pub fn explore(&mut self, player: PlayerId, centre: Position, radius: u32) -> usize {
        let mut revealed: usize = 0;
        for position in self.positions_within(centre, radius) {
            if let Some(tile) = self.tile_mut(position)
                && tile.explore(player)
            {
                revealed = revealed.saturating_add(1);
            }
        }
        if revealed > 0 {
            debug!(%player, %centre, radius, revealed, "tiles explored");
        }
        revealed
    }
}
