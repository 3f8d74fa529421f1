pub mod file_io;
pub mod player;
pub mod recorder;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::games::blockgrid::Point;
use crate::identifiers::ShapeId;

pub use file_io::{
    ReplayFileError, generate_replay_filename, load_replay, load_replay_from_bytes, save_replay,
    save_replay_to_bytes,
};
pub use player::{ClaimVerdict, ReplayPlayer, run_replay, verify_claim};
pub use recorder::ReplayRecorder;

pub const REPLAY_FILE_EXTENSION: &str = "gridlockreplay";
pub const REPLAY_VERSION: u8 = 1;
pub const DEFAULT_MAX_ACTIONS: usize = 2_000;
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(600);

/// One accepted placement as the client recorded it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMove {
    pub shape_id: ShapeId,
    pub cells: Vec<Point>,
    pub color: u8,
    pub row: i32,
    pub col: i32,
    pub timestamp: i64,
    /// Cumulative score after this move.
    pub score: u32,
    #[serde(default)]
    pub cleared_rows: Vec<usize>,
    #[serde(default)]
    pub cleared_cols: Vec<usize>,
    #[serde(default)]
    pub cleared_boxes: Vec<usize>,
}

/// A finished run as submitted for verification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayState {
    pub seed: i32,
    pub moves: Vec<GameMove>,
    pub final_score: u32,
    #[serde(default)]
    pub engine_version: String,
    #[serde(default)]
    pub started_at_ms: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayLimits {
    pub max_actions: usize,
    pub max_duration: Duration,
}

impl Default for ReplayLimits {
    fn default() -> Self {
        Self {
            max_actions: DEFAULT_MAX_ACTIONS,
            max_duration: DEFAULT_MAX_DURATION,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RejectReason {
    TooManyActions,
    TookTooLong,
    ShapeNotInHand,
    InvalidPlacement,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::TooManyActions => write!(f, "Too many actions"),
            RejectReason::TookTooLong => write!(f, "Replay took too long"),
            RejectReason::ShapeNotInHand => write!(f, "Shape not in hand"),
            RejectReason::InvalidPlacement => write!(f, "Invalid placement"),
        }
    }
}

/// Why a replay failed, and where.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayRejection {
    pub reason: RejectReason,
    /// Index of the offending move; `None` when rejected before the first.
    pub move_index: Option<usize>,
    pub score_at_rejection: u32,
}

impl fmt::Display for ReplayRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.move_index {
            Some(index) => write!(f, "{} at move {}", self.reason, index),
            None => write!(f, "{}", self.reason),
        }
    }
}

impl std::error::Error for ReplayRejection {}

/// Result of re-simulating every move.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplayOutcome {
    pub final_score: u32,
    pub final_grid: Vec<u8>,
    pub game_over: bool,
    pub moves_applied: usize,
    /// First move whose recorded running score differs from the simulation.
    pub first_score_divergence: Option<usize>,
}
