use serde::{Deserialize, Serialize};

use super::powerups::PowerupActivation;
use crate::identifiers::ShapeId;

pub const BOARD_SIZE: usize = 9;
pub const BOX_SIZE: usize = 3;
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;
pub const HAND_SIZE: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub row: i32,
    pub col: i32,
}

impl Point {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Saturates, so an extreme anchor lands out of bounds instead of
    /// wrapping back onto the board.
    pub fn offset(self, row: i32, col: i32) -> Self {
        Self::new(self.row.saturating_add(row), self.col.saturating_add(col))
    }

    pub fn in_bounds(self) -> bool {
        (0..BOARD_SIZE as i32).contains(&self.row) && (0..BOARD_SIZE as i32).contains(&self.col)
    }

    /// Row-major cell index. Caller guarantees `in_bounds`.
    pub fn to_index(self) -> usize {
        self.row as usize * BOARD_SIZE + self.col as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self::new((index / BOARD_SIZE) as i32, (index % BOARD_SIZE) as i32)
    }
}

/// The three offered shapes. Slot indices outside `0..HAND_SIZE` are caller
/// bugs and panic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    slots: [Option<ShapeId>; HAND_SIZE],
}

impl Hand {
    pub fn new(slots: [Option<ShapeId>; HAND_SIZE]) -> Self {
        Self { slots }
    }

    pub fn get(&self, slot: usize) -> Option<ShapeId> {
        self.slots[slot]
    }

    pub fn take(&mut self, slot: usize) -> Option<ShapeId> {
        self.slots[slot].take()
    }

    pub fn set(&mut self, slot: usize, shape: Option<ShapeId>) {
        self.slots[slot] = shape;
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn slot_of(&self, shape: ShapeId) -> Option<usize> {
        self.slots.iter().position(|s| *s == Some(shape))
    }

    pub fn slots(&self) -> &[Option<ShapeId>; HAND_SIZE] {
        &self.slots
    }

    pub fn occupied(&self) -> impl Iterator<Item = (usize, ShapeId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, shape)| shape.map(|id| (slot, id)))
    }
}

/// Client-facing description of one filled hand slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandSlot {
    pub slot: usize,
    pub shape_id: ShapeId,
    pub name: String,
    pub cells: Vec<Point>,
    pub color: u8,
}

/// Outcome of one placement attempt.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MoveResult {
    pub valid: bool,
    pub cleared_rows: Vec<usize>,
    pub cleared_cols: Vec<usize>,
    pub cleared_boxes: Vec<usize>,
    pub cleared_cells: Vec<Point>,
    pub points_added: u32,
    /// Number of rows, columns and boxes cleared together by this move.
    pub combo_multiplier: u32,
    pub game_over: bool,
    pub powerup: Option<PowerupActivation>,
}

impl MoveResult {
    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn lines_cleared(&self) -> usize {
        self.cleared_rows.len() + self.cleared_cols.len() + self.cleared_boxes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_index_round_trip() {
        for index in 0..CELL_COUNT {
            let point = Point::from_index(index);
            assert!(point.in_bounds());
            assert_eq!(point.to_index(), index);
        }
        assert_eq!(Point::new(8, 8).to_index(), 80);
        assert!(!Point::new(-1, 0).in_bounds());
        assert!(!Point::new(0, 9).in_bounds());
    }

    #[test]
    fn test_hand_take_and_empty() {
        let mut hand = Hand::new([Some(ShapeId::new(4)), None, Some(ShapeId::new(9))]);
        assert!(!hand.is_empty());
        assert_eq!(hand.slot_of(ShapeId::new(9)), Some(2));
        assert_eq!(hand.take(0), Some(ShapeId::new(4)));
        assert_eq!(hand.take(0), None);
        hand.take(2);
        assert!(hand.is_empty());
        assert_eq!(hand.occupied().count(), 0);
    }

    #[test]
    #[should_panic]
    fn test_hand_slot_out_of_range_panics() {
        let hand = Hand::default();
        hand.get(HAND_SIZE);
    }

    #[test]
    fn test_invalid_result_has_no_effects() {
        let result = MoveResult::invalid();
        assert!(!result.valid);
        assert_eq!(result.points_added, 0);
        assert_eq!(result.combo_multiplier, 0);
        assert_eq!(result.lines_cleared(), 0);
        assert!(result.powerup.is_none());
    }
}
