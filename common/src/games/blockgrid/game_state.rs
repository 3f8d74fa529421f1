use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::bitboard::BitBoard;
use super::board::Board;
use super::catalog::{Shape, ShapeCatalog};
use super::powerups::PowerupManager;
use super::scoring::{
    apply_speed_bonus, clear_points, placement_points, qualifies_for_speed_bonus,
};
use super::types::{HAND_SIZE, Hand, HandSlot, MoveResult};
use crate::games::SessionRng;
use crate::identifiers::ShapeId;

/// Full engine state in serializable form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub seed: i32,
    pub rng_state: u32,
    pub board: Vec<u8>,
    pub hand: [Option<ShapeId>; HAND_SIZE],
    pub score: u32,
    pub moves_made: u32,
    pub game_over: bool,
    pub last_move_time: Option<i64>,
    pub powerups: PowerupManager,
}

/// One run of the block puzzle. Every mutation goes through [`place`], and
/// all randomness comes from the run's own [`SessionRng`], so two states
/// built from the same seed and fed the same placements stay identical.
///
/// [`place`]: BlockGridGameState::place
#[derive(Clone, Debug)]
pub struct BlockGridGameState {
    catalog: Arc<ShapeCatalog>,
    seed: i32,
    rng: SessionRng,
    board: Board,
    hand: Hand,
    score: u32,
    moves_made: u32,
    game_over: bool,
    last_move_time: Option<i64>,
    powerups: PowerupManager,
}

impl BlockGridGameState {
    pub fn new(catalog: Arc<ShapeCatalog>, seed: i32) -> Self {
        let mut rng = SessionRng::new(seed);
        let hand = Hand::new(catalog.deal_hand(&mut rng));
        let mut state = Self {
            catalog,
            seed,
            rng,
            board: Board::new(),
            hand,
            score: 0,
            moves_made: 0,
            game_over: false,
            last_move_time: None,
            powerups: PowerupManager::new(),
        };
        state.game_over = !state.can_place_any();
        state
    }

    pub fn catalog(&self) -> &Arc<ShapeCatalog> {
        &self.catalog
    }

    pub fn seed(&self) -> i32 {
        self.seed
    }

    pub fn rng_state(&self) -> u32 {
        self.rng.state()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn bitboard(&self) -> BitBoard {
        BitBoard::from_board(&self.board)
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn moves_made(&self) -> u32 {
        self.moves_made
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn last_move_time(&self) -> Option<i64> {
        self.last_move_time
    }

    pub fn powerups(&self) -> &PowerupManager {
        &self.powerups
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.catalog.get(id)
    }

    /// Shape in `slot`, if any. Panics if `slot >= HAND_SIZE`.
    pub fn hand_shape(&self, slot: usize) -> Option<&Shape> {
        self.hand.get(slot).and_then(|id| self.catalog.get(id))
    }

    pub fn hand_descriptor(&self) -> Vec<HandSlot> {
        self.hand
            .occupied()
            .filter_map(|(slot, id)| {
                self.catalog.get(id).map(|shape| HandSlot {
                    slot,
                    shape_id: id,
                    name: shape.name.clone(),
                    cells: shape.cells.clone(),
                    color: shape.color,
                })
            })
            .collect()
    }

    pub fn can_place(&self, slot: usize, row: i32, col: i32) -> bool {
        self.hand_shape(slot)
            .is_some_and(|shape| self.board.can_place(shape, row, col))
    }

    /// True when some shape in the hand fits somewhere on the board.
    pub fn can_place_any(&self) -> bool {
        let bits = self.bitboard();
        self.hand
            .occupied()
            .filter_map(|(_, id)| self.catalog.get(id))
            .any(|shape| bits.fits_anywhere(shape))
    }

    /// Places the shape from `slot` with its origin at `(row, col)`.
    ///
    /// Rejected placements (empty slot, blocked target, finished run) return
    /// [`MoveResult::invalid`] and leave the state untouched, including the
    /// random stream. A `slot` outside the hand panics.
    pub fn place(&mut self, slot: usize, row: i32, col: i32, timestamp: i64) -> MoveResult {
        let Some(shape_id) = self.hand.get(slot) else {
            return MoveResult::invalid();
        };
        if self.game_over {
            return MoveResult::invalid();
        }
        let catalog = Arc::clone(&self.catalog);
        let Some(shape) = catalog.get(shape_id) else {
            return MoveResult::invalid();
        };
        if !self.board.can_place(shape, row, col) {
            return MoveResult::invalid();
        }

        self.powerups.expire(timestamp);

        let placed = self.board.place(shape, row, col);
        self.hand.take(slot);

        // The blast lands before the line scan, so cells it empties can
        // never complete a row, column or box this turn.
        let activation = self
            .powerups
            .collect(&placed)
            .map(|powerup| PowerupManager::activate(&powerup, &mut self.board));

        let clears = self.board.find_clears();
        self.board.clear(&clears.cells);

        let groups = clears.group_count();
        let mut points = placement_points(shape) + clear_points(groups);
        if qualifies_for_speed_bonus(self.last_move_time, timestamp) {
            points = apply_speed_bonus(points);
        }
        if let Some(activation) = &activation {
            points += activation.points;
        }

        self.score += points;
        self.moves_made += 1;
        self.last_move_time = Some(timestamp);

        self.powerups.update(timestamp, &self.board, &mut self.rng);

        if self.hand.is_empty() {
            self.hand = Hand::new(self.catalog.deal_hand(&mut self.rng));
        }
        self.game_over = !self.can_place_any();

        MoveResult {
            valid: true,
            cleared_rows: clears.rows,
            cleared_cols: clears.cols,
            cleared_boxes: clears.boxes,
            cleared_cells: clears.cells,
            points_added: points,
            combo_multiplier: groups as u32,
            game_over: self.game_over,
            powerup: activation,
        }
    }

    /// Moves every stored timestamp by `delta` so a paused run resumes with
    /// the same speed-bonus window and spawn curve.
    pub fn shift_time(&mut self, delta: i64) {
        if let Some(t) = self.last_move_time.as_mut() {
            *t = t.saturating_add(delta);
        }
        self.powerups.shift_time(delta);
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            seed: self.seed,
            rng_state: self.rng.state(),
            board: self.board.cells().to_vec(),
            hand: *self.hand.slots(),
            score: self.score,
            moves_made: self.moves_made,
            game_over: self.game_over,
            last_move_time: self.last_move_time,
            powerups: self.powerups.clone(),
        }
    }

    pub fn from_snapshot(catalog: Arc<ShapeCatalog>, snapshot: GameSnapshot) -> Result<Self, String> {
        let board = Board::from_cells(snapshot.board)?;
        if let Some(color) = board.cells().iter().find(|&&c| c > catalog.max_color()) {
            return Err(format!("Board holds unknown color class {}", color));
        }
        for id in snapshot.hand.iter().flatten() {
            if catalog.get(*id).is_none() {
                return Err(format!("Hand holds unknown shape {}", id));
            }
        }
        if let Some(p) = snapshot
            .powerups
            .active()
            .iter()
            .find(|p| !p.position.in_bounds())
        {
            return Err(format!(
                "Powerup outside the board at ({}, {})",
                p.position.row, p.position.col
            ));
        }

        let mut rng = SessionRng::new(snapshot.seed);
        rng.set_state(snapshot.rng_state);

        Ok(Self {
            catalog,
            seed: snapshot.seed,
            rng,
            board,
            hand: Hand::new(snapshot.hand),
            score: snapshot.score,
            moves_made: snapshot.moves_made,
            game_over: snapshot.game_over,
            last_move_time: snapshot.last_move_time,
            powerups: snapshot.powerups,
        })
    }

    #[cfg(test)]
    pub(crate) fn force_hand_slot(&mut self, slot: usize, shape: Option<ShapeId>) {
        self.hand.set(slot, shape);
        self.game_over = !self.can_place_any();
    }

    #[cfg(test)]
    pub(crate) fn set_board_cells(&mut self, points: &[(usize, usize)], color: u8) {
        for &(row, col) in points {
            self.board.set(row, col, color);
        }
        self.game_over = !self.can_place_any();
    }

    #[cfg(test)]
    pub(crate) fn powerups_mut(&mut self) -> &mut PowerupManager {
        &mut self.powerups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::blockgrid::powerups::{Powerup, PowerupKind};
    use crate::games::blockgrid::types::{BOARD_SIZE, Point};

    fn catalog() -> Arc<ShapeCatalog> {
        Arc::new(ShapeCatalog::standard())
    }

    fn id_of(catalog: &ShapeCatalog, name: &str) -> ShapeId {
        catalog.find_by_name(name).unwrap().id
    }

    fn first_legal(state: &BlockGridGameState) -> Option<(usize, i32, i32)> {
        for slot in 0..HAND_SIZE {
            for row in 0..BOARD_SIZE as i32 {
                for col in 0..BOARD_SIZE as i32 {
                    if state.can_place(slot, row, col) {
                        return Some((slot, row, col));
                    }
                }
            }
        }
        None
    }

    #[test]
    fn test_new_deals_full_hand() {
        let state = BlockGridGameState::new(catalog(), 42);
        assert_eq!(state.hand().occupied().count(), HAND_SIZE);
        assert_eq!(state.hand_descriptor().len(), HAND_SIZE);
        assert!(!state.is_game_over());
        assert_eq!(state.score(), 0);
    }

    #[test]
    fn test_single_cell_scores_one_and_slot_empties() {
        let catalog = catalog();
        let mono = id_of(&catalog, "mono#0");
        let mut state = BlockGridGameState::new(catalog, 12345);
        state.force_hand_slot(0, Some(mono));

        let result = state.place(0, 4, 4, 1_000);
        assert!(result.valid);
        assert_eq!(result.points_added, 1);
        assert_eq!(state.score(), 1);
        assert_eq!(state.board().get(4, 4), 1);

        let again = state.place(0, 5, 5, 2_000);
        assert!(!again.valid);
        assert_eq!(state.score(), 1);
    }

    #[test]
    fn test_row_clear() {
        let catalog = catalog();
        let mono = id_of(&catalog, "mono#0");
        let mut state = BlockGridGameState::new(catalog, 1);
        let row: Vec<(usize, usize)> = (0..8).map(|c| (0, c)).collect();
        state.set_board_cells(&row, 3);
        state.force_hand_slot(0, Some(mono));

        let result = state.place(0, 0, 8, 1_000);
        assert!(result.valid);
        assert_eq!(result.cleared_rows, vec![0]);
        assert!(result.cleared_cols.is_empty());
        assert_eq!(result.combo_multiplier, 1);
        assert_eq!(result.points_added, 11);
        assert_eq!(state.board().get(0, 0), 0);
        assert_eq!(state.board().occupied_count(), 0);
    }

    #[test]
    fn test_row_and_column_combo() {
        let catalog = catalog();
        let mono = id_of(&catalog, "mono#0");
        let mut state = BlockGridGameState::new(catalog, 1);
        let mut cells: Vec<(usize, usize)> = (1..BOARD_SIZE).map(|c| (0, c)).collect();
        cells.extend((1..BOARD_SIZE).map(|r| (r, 0)));
        state.set_board_cells(&cells, 2);
        state.force_hand_slot(0, Some(mono));

        let result = state.place(0, 0, 0, 1_000);
        assert_eq!(result.cleared_rows, vec![0]);
        assert_eq!(result.cleared_cols, vec![0]);
        assert!(result.cleared_boxes.is_empty());
        assert_eq!(result.combo_multiplier, 2);
        assert_eq!(result.cleared_cells.len(), 17);
        assert_eq!(result.points_added, 1 + 10 + 10 + 20);
    }

    #[test]
    fn test_speed_bonus_applies_to_clear_points() {
        let catalog = catalog();
        let mono = id_of(&catalog, "mono#0");
        let mut state = BlockGridGameState::new(catalog, 1);
        let row: Vec<(usize, usize)> = (0..8).map(|c| (0, c)).collect();
        state.set_board_cells(&row, 3);
        state.force_hand_slot(0, Some(mono));
        state.force_hand_slot(1, Some(mono));

        assert_eq!(state.place(1, 8, 8, 10_000).points_added, 1);
        let result = state.place(0, 0, 8, 11_000);
        assert_eq!(result.points_added, (1 + 10) * 3 / 2);
        assert_eq!(state.score(), 1 + 16);
    }

    #[test]
    fn test_no_speed_bonus_outside_window() {
        let catalog = catalog();
        let mono = id_of(&catalog, "mono#0");
        let mut state = BlockGridGameState::new(catalog, 1);
        state.force_hand_slot(0, Some(mono));
        state.force_hand_slot(1, Some(mono));
        state.place(0, 8, 8, 10_000);
        assert_eq!(state.place(1, 7, 7, 11_500).points_added, 1);
    }

    #[test]
    fn test_solid_square_scores_five() {
        let catalog = catalog();
        let square = id_of(&catalog, "square_3#0");
        let mut state = BlockGridGameState::new(catalog, 5);
        state.force_hand_slot(2, Some(square));
        let result = state.place(2, 0, 3, 1_000);
        assert!(result.valid);
        // The square fills box 1 on its own.
        assert_eq!(result.cleared_boxes, vec![1]);
        assert_eq!(result.points_added, 5 + 10);
    }

    #[test]
    fn test_powerup_clears_before_line_scan() {
        let catalog = catalog();
        let mono = id_of(&catalog, "mono#0");
        let mut state = BlockGridGameState::new(catalog, 1);
        let row: Vec<(usize, usize)> = (0..8).map(|c| (0, c)).collect();
        state.set_board_cells(&row, 3);
        state.force_hand_slot(0, Some(mono));
        state.powerups_mut().insert(Powerup {
            kind: PowerupKind::Bomb3,
            position: Point::new(0, 8),
            spawned_at: 900,
        });

        let result = state.place(0, 0, 8, 1_000);
        assert!(result.valid);
        assert!(result.cleared_rows.is_empty());
        let activation = result.powerup.unwrap();
        assert_eq!(activation.kind, PowerupKind::Bomb3);
        assert_eq!(activation.cleared_cells, vec![Point::new(0, 7), Point::new(0, 8)]);
        assert_eq!(result.points_added, 1 + 10);
        assert_eq!(state.board().get(0, 6), 3);
        assert!(state.powerups().active().is_empty());
    }

    #[test]
    fn test_expired_powerup_not_collected() {
        let catalog = catalog();
        let mono = id_of(&catalog, "mono#0");
        let mut state = BlockGridGameState::new(catalog, 1);
        state.force_hand_slot(0, Some(mono));
        state.powerups_mut().insert(Powerup {
            kind: PowerupKind::Bomb6,
            position: Point::new(4, 4),
            spawned_at: 0,
        });
        let result = state.place(0, 4, 4, PowerupKind::Bomb6.lifetime_ms());
        assert!(result.valid);
        assert!(result.powerup.is_none());
    }

    #[test]
    fn test_invalid_placement_leaves_state_untouched() {
        let mut state = BlockGridGameState::new(catalog(), 77);
        let before = state.snapshot();

        assert!(!state.place(0, -1, 0, 1_000).valid);
        assert!(!state.place(0, 0, BOARD_SIZE as i32, 1_000).valid);
        state.force_hand_slot(1, None);
        let before_empty = state.snapshot();
        assert!(!state.place(1, 0, 0, 1_000).valid);
        assert_eq!(state.snapshot(), before_empty);
        assert_eq!(before.rng_state, before_empty.rng_state);
        assert_eq!(before.board, before_empty.board);
    }

    #[test]
    fn test_extreme_anchor_is_invalid() {
        let catalog = catalog();
        // First cell sits at (0, 1), so any offset from i32::MAX overflows.
        let mirrored_l = id_of(&catalog, "tetromino_l#0");
        let mut state = BlockGridGameState::new(catalog, 5);
        state.force_hand_slot(0, Some(mirrored_l));
        let before = state.snapshot();

        for (row, col) in [
            (0, i32::MAX),
            (i32::MAX, 0),
            (i32::MAX, i32::MAX),
            (i32::MIN, i32::MIN),
            (0, i32::MIN),
        ] {
            assert!(!state.can_place(0, row, col));
            assert!(!state.place(0, row, col, 1_000).valid);
        }
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn test_extreme_timestamps_do_not_panic() {
        let catalog = catalog();
        let mono = id_of(&catalog, "mono#0");
        let mut state = BlockGridGameState::new(catalog, 6);
        for slot in 0..HAND_SIZE {
            state.force_hand_slot(slot, Some(mono));
        }
        state.powerups_mut().insert(Powerup {
            kind: PowerupKind::Bomb3,
            position: Point::new(8, 8),
            spawned_at: i64::MAX,
        });

        assert!(state.place(0, 0, 0, i64::MAX).valid);
        // Far in the past: inside the speed window.
        assert_eq!(state.place(1, 2, 2, i64::MIN).points_added, 1);
        assert_eq!(state.place(2, 4, 4, i64::MAX).points_added, 1);
        assert_eq!(state.moves_made(), 3);
    }

    #[test]
    #[should_panic]
    fn test_slot_out_of_range_panics() {
        let mut state = BlockGridGameState::new(catalog(), 77);
        state.place(HAND_SIZE, 0, 0, 0);
    }

    #[test]
    fn test_hand_refills_after_third_placement() {
        let catalog = catalog();
        let mono = id_of(&catalog, "mono#0");
        let mut state = BlockGridGameState::new(catalog, 9);
        for slot in 0..HAND_SIZE {
            state.force_hand_slot(slot, Some(mono));
        }
        state.place(0, 0, 0, 0);
        state.place(1, 2, 2, 5_000);
        assert_eq!(state.hand().occupied().count(), 1);
        state.place(2, 4, 4, 10_000);
        assert_eq!(state.hand().occupied().count(), HAND_SIZE);
    }

    #[test]
    fn test_game_over_monotonicity() {
        let catalog = catalog();
        let mono = id_of(&catalog, "mono#0");
        let domino = id_of(&catalog, "domino#0");
        let mut state = BlockGridGameState::new(catalog, 3);
        let all: Vec<(usize, usize)> = (0..BOARD_SIZE)
            .flat_map(|r| (0..BOARD_SIZE).map(move |c| (r, c)))
            .collect();
        state.force_hand_slot(0, Some(domino));
        state.force_hand_slot(1, None);
        state.force_hand_slot(2, None);
        state.set_board_cells(&all, 1);
        assert!(!state.can_place_any());
        assert!(state.is_game_over());

        state.set_board_cells(&[(4, 4)], 0);
        assert!(!state.can_place_any());

        state.force_hand_slot(1, Some(mono));
        assert!(state.can_place_any());
        assert!(!state.is_game_over());
    }

    #[test]
    fn test_game_over_rejects_moves() {
        let catalog = catalog();
        let domino = id_of(&catalog, "domino#0");
        let mut state = BlockGridGameState::new(catalog, 3);
        let checker: Vec<(usize, usize)> = (0..BOARD_SIZE)
            .flat_map(|r| (0..BOARD_SIZE).map(move |c| (r, c)))
            .filter(|(r, c)| (r + c) % 2 == 0)
            .collect();
        state.set_board_cells(&checker, 1);
        for slot in 0..HAND_SIZE {
            state.force_hand_slot(slot, Some(domino));
        }
        assert!(state.is_game_over());
        assert!(!state.place(0, 0, 1, 0).valid);
    }

    #[test]
    fn test_two_engines_stay_identical() {
        let catalog = catalog();
        let mut a = BlockGridGameState::new(Arc::clone(&catalog), 2024);
        let mut b = BlockGridGameState::new(catalog, 2024);

        let mut timestamp = 0;
        while let Some((slot, row, col)) = first_legal(&a) {
            timestamp += 1_700;
            let ra = a.place(slot, row, col, timestamp);
            let rb = b.place(slot, row, col, timestamp);
            assert_eq!(ra, rb);
            assert_eq!(a.snapshot(), b.snapshot());
            if a.moves_made() >= 150 {
                break;
            }
        }
        assert!(a.moves_made() > 0);
    }

    #[test]
    fn test_snapshot_round_trip_resumes_identically() {
        let catalog = catalog();
        let mut live = BlockGridGameState::new(Arc::clone(&catalog), -31337);
        let mut timestamp = 0;
        for _ in 0..12 {
            let Some((slot, row, col)) = first_legal(&live) else {
                break;
            };
            timestamp += 900;
            live.place(slot, row, col, timestamp);
        }

        let json = serde_json::to_string(&live.snapshot()).unwrap();
        let decoded: GameSnapshot = serde_json::from_str(&json).unwrap();
        let mut restored = BlockGridGameState::from_snapshot(Arc::clone(&catalog), decoded).unwrap();
        assert_eq!(restored.snapshot(), live.snapshot());

        for _ in 0..20 {
            let Some((slot, row, col)) = first_legal(&live) else {
                break;
            };
            timestamp += 2_300;
            assert_eq!(
                live.place(slot, row, col, timestamp),
                restored.place(slot, row, col, timestamp)
            );
        }
        assert_eq!(restored.snapshot(), live.snapshot());
    }

    #[test]
    fn test_from_snapshot_rejects_bad_data() {
        let catalog = catalog();
        let state = BlockGridGameState::new(Arc::clone(&catalog), 1);

        let mut short = state.snapshot();
        short.board.pop();
        assert!(BlockGridGameState::from_snapshot(Arc::clone(&catalog), short).is_err());

        let mut unknown = state.snapshot();
        unknown.hand[0] = Some(ShapeId::new(u16::MAX));
        assert!(BlockGridGameState::from_snapshot(Arc::clone(&catalog), unknown).is_err());

        let mut color = state.snapshot();
        color.board[0] = 200;
        assert!(BlockGridGameState::from_snapshot(catalog, color).is_err());
    }

    #[test]
    fn test_shift_time_preserves_speed_window() {
        let catalog = catalog();
        let mono = id_of(&catalog, "mono#0");
        let domino = id_of(&catalog, "domino#0");
        let mut state = BlockGridGameState::new(catalog, 1);
        state.force_hand_slot(0, Some(mono));
        state.force_hand_slot(1, Some(domino));
        state.place(0, 8, 8, 1_000);

        state.shift_time(60_000);
        assert_eq!(state.last_move_time(), Some(61_000));
        assert_eq!(state.place(1, 7, 6, 61_500).points_added, 3);
    }
}
