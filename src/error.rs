use std::path::PathBuf;

use thiserror::Error;

/// Raised by the raycast when the board is in a state it cannot look at.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VisionError {
    #[error("snake has no segments, reset required")]
    EmptySnake,
    #[error("head out of bounds: x={x}, y={y}, grid={grid_size}")]
    HeadOutOfBounds { x: i32, y: i32, grid_size: i32 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint i/o on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("unsupported checkpoint version {found} (expected {expected})")]
    Version { found: String, expected: u32 },
    #[error("checkpoint was saved with `{found}` actions, session uses `{expected}`")]
    ActionSpace { found: String, expected: String },
    #[error("state {key} has {found} values, expected {expected}")]
    RowWidth {
        key: String,
        found: usize,
        expected: usize,
    },
    #[error("json checkpoint: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Why a training or play session stopped early.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("episode {episode}: {source}")]
    Vision { episode: usize, source: VisionError },
    #[error(transparent)]
    History(#[from] HistoryError),
}
