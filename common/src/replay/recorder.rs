use super::{GameMove, ReplayState};
use crate::games::blockgrid::{MoveResult, Shape};

/// Append-only log of accepted placements for one run.
pub struct ReplayRecorder {
    engine_version: String,
    started_at_ms: i64,
    seed: i32,
    moves: Vec<GameMove>,
}

impl ReplayRecorder {
    pub fn new(engine_version: String, seed: i32) -> Self {
        let started_at_ms = chrono::Utc::now().timestamp_millis();
        Self {
            engine_version,
            started_at_ms,
            seed,
            moves: Vec::new(),
        }
    }

    /// Continues a log restored from a saved session.
    pub fn resume(engine_version: String, started_at_ms: i64, seed: i32, moves: Vec<GameMove>) -> Self {
        Self {
            engine_version,
            started_at_ms,
            seed,
            moves,
        }
    }

    /// Appends a move after a valid placement. Invalid results are ignored.
    pub fn record(
        &mut self,
        shape: &Shape,
        row: i32,
        col: i32,
        timestamp: i64,
        score_after: u32,
        result: &MoveResult,
    ) {
        if !result.valid {
            return;
        }
        self.moves.push(GameMove {
            shape_id: shape.id,
            cells: shape.cells.clone(),
            color: shape.color,
            row,
            col,
            timestamp,
            score: score_after,
            cleared_rows: result.cleared_rows.clone(),
            cleared_cols: result.cleared_cols.clone(),
            cleared_boxes: result.cleared_boxes.clone(),
        });
    }

    /// Shifts recorded timestamps with the engine clock so the log still
    /// replays to the same state after a pause.
    pub fn shift_time(&mut self, delta: i64) {
        for mv in &mut self.moves {
            mv.timestamp = mv.timestamp.saturating_add(delta);
        }
    }

    pub fn engine_version(&self) -> &str {
        &self.engine_version
    }

    pub fn started_at_ms(&self) -> i64 {
        self.started_at_ms
    }

    pub fn seed(&self) -> i32 {
        self.seed
    }

    pub fn moves(&self) -> &[GameMove] {
        &self.moves
    }

    pub fn moves_count(&self) -> usize {
        self.moves.len()
    }

    pub fn finalize(&self, final_score: u32) -> ReplayState {
        ReplayState {
            seed: self.seed,
            moves: self.moves.clone(),
            final_score,
            engine_version: self.engine_version.clone(),
            started_at_ms: self.started_at_ms,
        }
    }
}
