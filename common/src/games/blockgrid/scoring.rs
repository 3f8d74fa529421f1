//! Point rules for a single placement.

use super::catalog::Shape;
use super::types::BOX_SIZE;

pub const SOLID_BOX_POINTS: u32 = 5;
pub const POINTS_PER_GROUP: u32 = 10;
pub const COMBO_BONUS_PER_EXTRA_GROUP: u32 = 20;
pub const SPEED_BONUS_WINDOW_MS: i64 = 1_500;

/// One point per cell, except a solid 3×3 block which is worth 5.
pub fn placement_points(shape: &Shape) -> u32 {
    if shape.is_solid_square(BOX_SIZE as i32) {
        SOLID_BOX_POINTS
    } else {
        shape.cell_count() as u32
    }
}

/// 10 per cleared row, column or box, plus 20 for every group past the first.
pub fn clear_points(groups: usize) -> u32 {
    let groups = groups as u32;
    groups * POINTS_PER_GROUP + groups.saturating_sub(1) * COMBO_BONUS_PER_EXTRA_GROUP
}

pub fn qualifies_for_speed_bonus(last_move_time: Option<i64>, now: i64) -> bool {
    last_move_time.is_some_and(|last| now.saturating_sub(last) < SPEED_BONUS_WINDOW_MS)
}

/// ×1.5, floored.
pub fn apply_speed_bonus(points: u32) -> u32 {
    points * 3 / 2
}
