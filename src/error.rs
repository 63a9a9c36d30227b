use std::path::PathBuf;

use thiserror::Error;

use crate::buildings::BuildingKind;
use crate::components::BuildingId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementIssue {
    Terrain,
    Occupied,
}

impl std::fmt::Display for PlacementIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementIssue::Terrain => write!(f, "terrain is not buildable"),
            PlacementIssue::Occupied => write!(f, "space occupied"),
        }
    }
}

/// Failures of player commands. None of these mutate the world.
#[derive(Debug, Error)]
pub enum ParkError {
    #[error("not enough funds: need ${needed:.2}, have ${available:.2}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("cannot place {kind}: {issue}")]
    InvalidPlacement {
        kind: BuildingKind,
        issue: PlacementIssue,
    },

    #[error("unknown building {0:?}")]
    UnknownBuilding(BuildingId),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid save data in {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be finite and non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },
}

pub type ParkResult<T> = Result<T, ParkError>;
