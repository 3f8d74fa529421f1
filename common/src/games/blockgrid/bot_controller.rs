use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::game_state::BlockGridGameState;
use super::types::{BOARD_SIZE, HAND_SIZE};

const BLOCKED_HAND_PENALTY: f64 = -10_000.0;
const POINTS_WEIGHT: f64 = 1.5;
const OCCUPIED_CELL_PENALTY: f64 = -1.0;
const ADJACENCY_WEIGHT: f64 = 0.5;
const HOLE_PENALTY: f64 = -50.0;
const BOX_FILL_EXPONENT: f64 = 1.5;
const BOX_FILL_WEIGHT: f64 = 0.3;
const TIE_BREAK_SCALE: f64 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BotMove {
    pub slot: usize,
    pub row: i32,
    pub col: i32,
    pub evaluation: f64,
}

/// Greedy one-ply player: tries every legal placement on a copy of the
/// state and keeps the best-scoring result.
pub struct BotController {
    rng: StdRng,
}

impl BotController {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_random() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn calculate_move(&mut self, state: &BlockGridGameState, timestamp: i64) -> Option<BotMove> {
        if state.is_game_over() {
            return None;
        }

        let mut best: Option<BotMove> = None;
        for (slot, row, col) in legal_moves(state) {
            let mut simulated = state.clone();
            let result = simulated.place(slot, row, col, timestamp);
            if !result.valid {
                continue;
            }

            let evaluation = evaluate_position(&simulated, result.points_added)
                + self.rng.random::<f64>() * TIE_BREAK_SCALE;
            if best.is_none_or(|b| evaluation > b.evaluation) {
                best = Some(BotMove {
                    slot,
                    row,
                    col,
                    evaluation,
                });
            }
        }
        best
    }
}

/// Every `(slot, row, col)` where the slot's shape fits, scanned over the
/// packed board.
pub fn legal_moves(state: &BlockGridGameState) -> Vec<(usize, i32, i32)> {
    let bits = state.bitboard();
    let mut moves = Vec::new();
    for slot in 0..HAND_SIZE {
        let Some(shape) = state.hand_shape(slot) else {
            continue;
        };
        for row in 0..=(BOARD_SIZE as i32 - shape.height()) {
            for col in 0..=(BOARD_SIZE as i32 - shape.width()) {
                if bits.can_place(shape, row, col) {
                    moves.push((slot, row, col));
                }
            }
        }
    }
    moves
}

/// Scores the position reached after a placement worth `points_added`.
pub fn evaluate_position(state: &BlockGridGameState, points_added: u32) -> f64 {
    let bits = state.bitboard();

    let blocked = state
        .hand()
        .occupied()
        .filter_map(|(_, id)| state.shape(id))
        .any(|shape| !bits.fits_anywhere(shape));

    let mut score = 0.0;
    if blocked {
        score += BLOCKED_HAND_PENALTY;
    }
    score += f64::from(points_added) * POINTS_WEIGHT;
    score += f64::from(bits.count()) * OCCUPIED_CELL_PENALTY;
    score += f64::from(bits.adjacent_pairs()) * ADJACENCY_WEIGHT;
    score += f64::from(bits.holes()) * HOLE_PENALTY;
    for b in 0..BOARD_SIZE {
        let fill = f64::from(bits.box_occupancy(b));
        score += fill.powf(BOX_FILL_EXPONENT) * BOX_FILL_WEIGHT;
    }
    score
}
