//! Terrain queries consumed by the simulation.
//!
//! Terrain generation lives outside this crate; the simulation only asks what
//! sits under a point, converts between world and grid coordinates and requests
//! walking routes over path cells.

use pathfinding::prelude::astar;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::Position;

/// Grid coordinate `(column, row)`.
pub type GridCell = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainKind {
    Water,
    Grass,
    Rocky,
    Mountain,
    Path,
}

impl TerrainKind {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol.to_ascii_uppercase() {
            'W' => Some(TerrainKind::Water),
            'G' => Some(TerrainKind::Grass),
            'R' => Some(TerrainKind::Rocky),
            'M' => Some(TerrainKind::Mountain),
            'P' => Some(TerrainKind::Path),
            _ => None,
        }
    }
}

pub trait TerrainQuery {
    fn terrain_at(&self, pos: Position) -> TerrainKind;
    fn world_to_grid(&self, pos: Position) -> GridCell;
    fn grid_to_world(&self, cell: GridCell) -> Position;
    /// Ordered cells from `start` to `goal` inclusive. Empty when unreachable.
    fn find_path(&self, start: GridCell, goal: GridCell) -> Vec<GridCell>;
    fn entrance_tile(&self) -> GridCell;
    fn exit_tile(&self) -> GridCell;
    fn tile_size(&self) -> f64;
    /// Half the side length of the playable square in world units.
    fn half_extent(&self) -> f64;

    fn is_water_at(&self, pos: Position) -> bool {
        self.terrain_at(pos) == TerrainKind::Water
    }

    fn is_buildable_at(&self, pos: Position) -> bool {
        self.terrain_at(pos) == TerrainKind::Grass
    }

    fn clamp(&self, pos: Position) -> Position {
        let limit = self.half_extent();
        Position::new(pos.x.clamp(-limit, limit), pos.y.clamp(-limit, limit))
    }
}

#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("terrain must have at least one row")]
    Empty,
    #[error("terrain must be square: row {row} has {found} cells, expected {expected}")]
    NotSquare {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("unknown terrain symbol '{symbol}' at row {row}, column {column}")]
    UnknownSymbol {
        symbol: char,
        row: usize,
        column: usize,
    },
    #[error("tile size must be positive, got {0}")]
    TileSize(f64),
}

/// Square tile grid. Entrance sits on the west edge and exit on the east edge,
/// both on the middle row.
#[derive(Debug, Clone)]
pub struct GridTerrain {
    size: usize,
    tile_size: f64,
    cells: Vec<TerrainKind>,
}

impl GridTerrain {
    pub fn filled(size: usize, tile_size: f64, kind: TerrainKind) -> Self {
        Self {
            size: size.max(1),
            tile_size,
            cells: vec![kind; size.max(1) * size.max(1)],
        }
    }

    pub fn from_rows<S: AsRef<str>>(rows: &[S], tile_size: f64) -> Result<Self, TerrainError> {
        if !(tile_size > 0.0) {
            return Err(TerrainError::TileSize(tile_size));
        }
        let size = rows.len();
        if size == 0 {
            return Err(TerrainError::Empty);
        }
        let mut cells = Vec::with_capacity(size * size);
        for (row, line) in rows.iter().enumerate() {
            let symbols: Vec<char> = line.as_ref().trim().chars().collect();
            if symbols.len() != size {
                return Err(TerrainError::NotSquare {
                    row,
                    found: symbols.len(),
                    expected: size,
                });
            }
            for (column, symbol) in symbols.into_iter().enumerate() {
                let kind = TerrainKind::from_symbol(symbol).ok_or(TerrainError::UnknownSymbol {
                    symbol,
                    row,
                    column,
                })?;
                cells.push(kind);
            }
        }
        Ok(Self {
            size,
            tile_size,
            cells,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn kind(&self, cell: GridCell) -> Option<TerrainKind> {
        if cell.0 < self.size && cell.1 < self.size {
            Some(self.cells[cell.1 * self.size + cell.0])
        } else {
            None
        }
    }

    pub fn set(&mut self, cell: GridCell, kind: TerrainKind) {
        if cell.0 < self.size && cell.1 < self.size {
            self.cells[cell.1 * self.size + cell.0] = kind;
        }
    }

    fn path_neighbors(&self, cell: GridCell) -> Vec<(GridCell, u32)> {
        let (x, y) = cell;
        let mut out = Vec::with_capacity(4);
        let candidates = [
            (x.wrapping_sub(1), y),
            (x + 1, y),
            (x, y.wrapping_sub(1)),
            (x, y + 1),
        ];
        for next in candidates {
            if self.kind(next) == Some(TerrainKind::Path) {
                out.push((next, 1));
            }
        }
        out
    }
}

impl TerrainQuery for GridTerrain {
    fn terrain_at(&self, pos: Position) -> TerrainKind {
        let cell = self.world_to_grid(pos);
        self.cells[cell.1 * self.size + cell.0]
    }

    fn world_to_grid(&self, pos: Position) -> GridCell {
        let half = self.size as f64 * self.tile_size / 2.0;
        let max = (self.size - 1) as f64;
        let gx = ((pos.x + half) / self.tile_size).floor().clamp(0.0, max);
        let gy = ((pos.y + half) / self.tile_size).floor().clamp(0.0, max);
        (gx as usize, gy as usize)
    }

    fn grid_to_world(&self, cell: GridCell) -> Position {
        let half = self.size as f64 * self.tile_size / 2.0;
        Position::new(
            cell.0 as f64 * self.tile_size - half + self.tile_size / 2.0,
            cell.1 as f64 * self.tile_size - half + self.tile_size / 2.0,
        )
    }

    fn find_path(&self, start: GridCell, goal: GridCell) -> Vec<GridCell> {
        if self.kind(goal) != Some(TerrainKind::Path) || self.kind(start).is_none() {
            return Vec::new();
        }
        let result = astar(
            &start,
            |cell| self.path_neighbors(*cell),
            |cell| manhattan(*cell, goal),
            |cell| *cell == goal,
        );
        result.map(|(path, _cost)| path).unwrap_or_default()
    }

    fn entrance_tile(&self) -> GridCell {
        (0, self.size / 2)
    }

    fn exit_tile(&self) -> GridCell {
        (self.size - 1, self.size / 2)
    }

    fn tile_size(&self) -> f64 {
        self.tile_size
    }

    fn half_extent(&self) -> f64 {
        self.size as f64 * self.tile_size / 2.0
    }
}

fn manhattan(a: GridCell, b: GridCell) -> u32 {
    (a.0.abs_diff(b.0) + a.1.abs_diff(b.1)) as u32
}
