use std::sync::Arc;
use std::time::Instant;

use super::{GameMove, RejectReason, ReplayLimits, ReplayOutcome, ReplayRejection, ReplayState};
use crate::games::blockgrid::{BlockGridGameState, ShapeCatalog};
use crate::log;

/// Cursor over a recorded move list.
pub struct ReplayPlayer<'a> {
    seed: i32,
    moves: &'a [GameMove],
    current_move_index: usize,
}

impl<'a> ReplayPlayer<'a> {
    pub fn new(seed: i32, moves: &'a [GameMove]) -> Self {
        Self {
            seed,
            moves,
            current_move_index: 0,
        }
    }

    pub fn from_state(replay: &'a ReplayState) -> Self {
        Self::new(replay.seed, &replay.moves)
    }

    pub fn seed(&self) -> i32 {
        self.seed
    }

    pub fn total_moves(&self) -> usize {
        self.moves.len()
    }

    pub fn current_move_index(&self) -> usize {
        self.current_move_index
    }

    pub fn is_finished(&self) -> bool {
        self.current_move_index >= self.moves.len()
    }

    pub fn peek_next_move(&self) -> Option<&'a GameMove> {
        self.moves.get(self.current_move_index)
    }

    pub fn next_move(&mut self) -> Option<&'a GameMove> {
        let mv = self.moves.get(self.current_move_index)?;
        self.current_move_index += 1;
        Some(mv)
    }

    pub fn reset(&mut self) {
        self.current_move_index = 0;
    }

    /// Re-simulates every move on a fresh engine seeded like the original run.
    pub fn play(
        &mut self,
        catalog: Arc<ShapeCatalog>,
        limits: &ReplayLimits,
    ) -> Result<ReplayOutcome, ReplayRejection> {
        self.play_since(catalog, limits, Instant::now())
    }

    /// Like [`play`](Self::play), with the duration budget counted from
    /// `started`.
    pub fn play_since(
        &mut self,
        catalog: Arc<ShapeCatalog>,
        limits: &ReplayLimits,
        started: Instant,
    ) -> Result<ReplayOutcome, ReplayRejection> {
        self.reset();
        if self.moves.len() > limits.max_actions {
            return Err(ReplayRejection {
                reason: RejectReason::TooManyActions,
                move_index: None,
                score_at_rejection: 0,
            });
        }

        let mut engine = BlockGridGameState::new(catalog, self.seed);
        let mut first_score_divergence = None;

        while let Some(mv) = self.next_move() {
            let index = self.current_move_index - 1;
            let reject = |reason, engine: &BlockGridGameState| ReplayRejection {
                reason,
                move_index: Some(index),
                score_at_rejection: engine.score(),
            };

            if started.elapsed() > limits.max_duration {
                return Err(reject(RejectReason::TookTooLong, &engine));
            }

            let Some(slot) = engine.hand().slot_of(mv.shape_id) else {
                return Err(reject(RejectReason::ShapeNotInHand, &engine));
            };

            let result = engine.place(slot, mv.row, mv.col, mv.timestamp);
            if !result.valid {
                return Err(reject(RejectReason::InvalidPlacement, &engine));
            }

            if first_score_divergence.is_none() && engine.score() != mv.score {
                first_score_divergence = Some(index);
            }
        }

        Ok(ReplayOutcome {
            final_score: engine.score(),
            final_grid: engine.board().cells().to_vec(),
            game_over: engine.is_game_over(),
            moves_applied: self.current_move_index,
            first_score_divergence,
        })
    }
}

/// Replays `moves` from `seed` and reports the engine's own final state.
pub fn run_replay(
    catalog: Arc<ShapeCatalog>,
    seed: i32,
    moves: &[GameMove],
    limits: &ReplayLimits,
) -> Result<ReplayOutcome, ReplayRejection> {
    let result = ReplayPlayer::new(seed, moves).play(catalog, limits);
    if let Err(rejection) = &result {
        log!(
            "Replay rejected: seed {}, {} moves, {} (score {})",
            seed,
            moves.len(),
            rejection,
            rejection.score_at_rejection
        );
    }
    result
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClaimVerdict {
    pub outcome: ReplayOutcome,
    pub claimed_score: u32,
}

impl ClaimVerdict {
    pub fn score_matches(&self) -> bool {
        self.outcome.final_score == self.claimed_score
    }

    pub fn is_accepted(&self) -> bool {
        self.score_matches()
    }
}

/// Replays a submitted run and compares the simulated score with the claim.
pub fn verify_claim(
    catalog: Arc<ShapeCatalog>,
    replay: &ReplayState,
    limits: &ReplayLimits,
) -> Result<ClaimVerdict, ReplayRejection> {
    let outcome = run_replay(catalog, replay.seed, &replay.moves, limits)?;
    let verdict = ClaimVerdict {
        outcome,
        claimed_score: replay.final_score,
    };
    if !verdict.score_matches() {
        log!(
            "Score mismatch: seed {}, claimed {}, simulated {}",
            replay.seed,
            verdict.claimed_score,
            verdict.outcome.final_score
        );
    }
    Ok(verdict)
}
