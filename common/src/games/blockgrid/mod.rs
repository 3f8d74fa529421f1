//! 9×9 block placement puzzle: shapes are dealt three at a time, placed on
//! the grid, and full rows, columns and 3×3 boxes are cleared for points.

mod bitboard;
mod board;
mod bot_controller;
mod catalog;
mod game_state;
mod geometry;
mod powerups;
pub mod scoring;
mod types;

pub use bitboard::BitBoard;
pub use board::{Board, ClearSet};
pub use bot_controller::{BotController, BotMove, evaluate_position, legal_moves};
pub use catalog::{BaseShape, Shape, ShapeCatalog, standard_definitions};
pub use game_state::{BlockGridGameState, GameSnapshot};
pub use geometry::{normalize, parse_pattern, reflect, rotate, signature};
pub use powerups::{
    Powerup, PowerupActivation, PowerupKind, PowerupManager, SPAWN_COOLDOWN_MS,
};
pub use types::{BOARD_SIZE, BOX_SIZE, CELL_COUNT, HAND_SIZE, Hand, HandSlot, MoveResult, Point};
