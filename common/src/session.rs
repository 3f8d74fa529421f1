use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::games::SessionRng;
use crate::games::blockgrid::{
    BlockGridGameState, BotController, GameSnapshot, HandSlot, MoveResult, ShapeCatalog,
};
use crate::replay::{
    ClaimVerdict, GameMove, ReplayFileError, ReplayLimits, ReplayRecorder, ReplayRejection,
    ReplayState, verify_claim,
};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Persisted form of a live run: the engine plus the moves so far.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub engine: GameSnapshot,
    pub moves: Vec<GameMove>,
    pub engine_version: String,
    pub started_at_ms: i64,
}

/// A live run: the engine and the recorder that logs every accepted move.
pub struct GameSession {
    state: BlockGridGameState,
    recorder: ReplayRecorder,
}

impl GameSession {
    /// Starts a run from `seed`, or from a fresh random seed.
    pub fn start_run(catalog: Arc<ShapeCatalog>, seed: Option<i32>) -> Self {
        let seed = seed.unwrap_or_else(SessionRng::random_seed);
        Self {
            state: BlockGridGameState::new(catalog, seed),
            recorder: ReplayRecorder::new(ENGINE_VERSION.to_string(), seed),
        }
    }

    pub fn seed(&self) -> i32 {
        self.state.seed()
    }

    pub fn state(&self) -> &BlockGridGameState {
        &self.state
    }

    pub fn score(&self) -> u32 {
        self.state.score()
    }

    pub fn is_game_over(&self) -> bool {
        self.state.is_game_over()
    }

    pub fn moves(&self) -> &[GameMove] {
        self.recorder.moves()
    }

    pub fn hand_descriptor(&self) -> Vec<HandSlot> {
        self.state.hand_descriptor()
    }

    pub fn place(&mut self, slot: usize, row: i32, col: i32, timestamp: i64) -> MoveResult {
        let Some(shape) = self.state.hand_shape(slot).cloned() else {
            return MoveResult::invalid();
        };
        let result = self.state.place(slot, row, col, timestamp);
        self.recorder
            .record(&shape, row, col, timestamp, self.state.score(), &result);
        result
    }

    /// The run as the client would submit it, claiming `final_score`.
    pub fn replay_state(&self, final_score: u32) -> ReplayState {
        self.recorder.finalize(final_score)
    }

    /// Verifies this run's own log against its current score.
    pub fn verify(&self, limits: &ReplayLimits) -> Result<ClaimVerdict, ReplayRejection> {
        verify_claim(
            Arc::clone(self.state.catalog()),
            &self.replay_state(self.score()),
            limits,
        )
    }

    /// Moves the run's clock by `delta`, recorded moves included, so a run
    /// paused at time `t` can resume at `t + delta`.
    pub fn shift_time(&mut self, delta: i64) {
        self.state.shift_time(delta);
        self.recorder.shift_time(delta);
    }

    /// Lets `bot` play until the run ends or `max_moves` placements were made.
    /// Returns the number of placements.
    pub fn autoplay(
        &mut self,
        bot: &mut BotController,
        max_moves: u32,
        mut next_timestamp: impl FnMut() -> i64,
    ) -> u32 {
        let mut played = 0;
        while played < max_moves && !self.is_game_over() {
            let timestamp = next_timestamp();
            let Some(choice) = bot.calculate_move(&self.state, timestamp) else {
                break;
            };
            if !self.place(choice.slot, choice.row, choice.col, timestamp).valid {
                break;
            }
            played += 1;
        }
        played
    }

    pub fn serialize(&self) -> SessionSnapshot {
        SessionSnapshot {
            engine: self.state.snapshot(),
            moves: self.recorder.moves().to_vec(),
            engine_version: self.recorder.engine_version().to_string(),
            started_at_ms: self.recorder.started_at_ms(),
        }
    }

    pub fn deserialize(catalog: Arc<ShapeCatalog>, snapshot: SessionSnapshot) -> Result<Self, String> {
        let seed = snapshot.engine.seed;
        let state = BlockGridGameState::from_snapshot(catalog, snapshot.engine)?;
        let recorder = ReplayRecorder::resume(
            snapshot.engine_version,
            snapshot.started_at_ms,
            seed,
            snapshot.moves,
        );
        Ok(Self { state, recorder })
    }

    pub fn to_json(&self) -> Result<String, ReplayFileError> {
        serde_json::to_string(&self.serialize()).map_err(ReplayFileError::EncodeError)
    }

    pub fn from_json(catalog: Arc<ShapeCatalog>, json: &str) -> Result<Self, ReplayFileError> {
        let snapshot: SessionSnapshot =
            serde_json::from_str(json).map_err(ReplayFileError::DecodeError)?;
        Self::deserialize(catalog, snapshot).map_err(ReplayFileError::InvalidState)
    }

    #[cfg(test)]
    fn state_mut(&mut self) -> &mut BlockGridGameState {
        &mut self.state
    }
}
