use serde::{Deserialize, Serialize};

use super::board::Board;
use super::types::{BOARD_SIZE, Point};
use crate::games::SessionRng;

pub const SPAWN_COOLDOWN_MS: i64 = 20_000;
pub const BASE_SPAWN_RATE: f64 = 0.1;
pub const POINTS_PER_CELL: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    Bomb3,
    Bomb4,
    Bomb5,
    Bomb6,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 4] = [
        PowerupKind::Bomb3,
        PowerupKind::Bomb4,
        PowerupKind::Bomb5,
        PowerupKind::Bomb6,
    ];

    /// Side of the cleared square.
    pub fn size(self) -> i32 {
        match self {
            PowerupKind::Bomb3 => 3,
            PowerupKind::Bomb4 => 4,
            PowerupKind::Bomb5 => 5,
            PowerupKind::Bomb6 => 6,
        }
    }

    pub fn lifetime_ms(self) -> i64 {
        match self {
            PowerupKind::Bomb3 => 7_000,
            PowerupKind::Bomb4 => 6_000,
            PowerupKind::Bomb5 => 4_000,
            PowerupKind::Bomb6 => 3_500,
        }
    }

    pub fn weight(self) -> f64 {
        match self {
            PowerupKind::Bomb3 => 10.0,
            PowerupKind::Bomb4 => 5.0,
            PowerupKind::Bomb5 => 2.0,
            PowerupKind::Bomb6 => 0.5,
        }
    }

    fn pick(rng: &mut SessionRng) -> Self {
        let total: f64 = Self::ALL.iter().map(|k| k.weight()).sum();
        let mut roll = rng.next_f64() * total;
        for kind in Self::ALL {
            if roll < kind.weight() {
                return kind;
            }
            roll -= kind.weight();
        }
        PowerupKind::Bomb6
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Powerup {
    pub kind: PowerupKind,
    pub position: Point,
    pub spawned_at: i64,
}

impl Powerup {
    pub fn is_expired(&self, now: i64) -> bool {
        now.saturating_sub(self.spawned_at) >= self.kind.lifetime_ms()
    }

    /// Square of side `size` around the position, shifted toward the upper
    /// left for even sizes and clipped to the board.
    pub fn footprint(&self) -> Vec<Point> {
        footprint(self.position, self.kind.size())
    }
}

pub fn footprint(center: Point, size: i32) -> Vec<Point> {
    let start_row = center.row - (size - 1) / 2;
    let start_col = center.col - (size - 1) / 2;
    let mut points = Vec::with_capacity((size * size) as usize);
    for row in start_row.max(0)..(start_row + size).min(BOARD_SIZE as i32) {
        for col in start_col.max(0)..(start_col + size).min(BOARD_SIZE as i32) {
            points.push(Point::new(row, col));
        }
    }
    points
}

/// What a collected powerup did to the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PowerupActivation {
    pub kind: PowerupKind,
    pub position: Point,
    /// Occupied cells the blast emptied, row-major.
    pub cleared_cells: Vec<Point>,
    pub points: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerupManager {
    active: Vec<Powerup>,
    last_spawn_time: Option<i64>,
    last_update_time: Option<i64>,
}

impl PowerupManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &[Powerup] {
        &self.active
    }

    pub fn last_spawn_time(&self) -> Option<i64> {
        self.last_spawn_time
    }

    pub fn last_update_time(&self) -> Option<i64> {
        self.last_update_time
    }

    /// Per-second spawn rate at `now`: the base rate scaled by the cube of
    /// cooldown progress.
    pub fn spawn_rate(&self, now: i64) -> f64 {
        let since = match self.last_spawn_time {
            Some(last) => now.saturating_sub(last),
            None => SPAWN_COOLDOWN_MS,
        };
        let progress = (since as f64 / SPAWN_COOLDOWN_MS as f64).clamp(0.0, 1.0);
        BASE_SPAWN_RATE * progress.powi(3)
    }

    pub fn expire(&mut self, now: i64) {
        self.active.retain(|p| !p.is_expired(now));
    }

    /// Advances the clock to `now`, drops expired powerups and rolls for a
    /// spawn. Exactly one float is drawn for the roll on every call; the cell
    /// and kind draws follow only when the roll succeeds and the board has an
    /// empty cell. Returns the spawned powerup, if any.
    pub fn update(&mut self, now: i64, board: &Board, rng: &mut SessionRng) -> Option<Powerup> {
        let dt = match self.last_update_time {
            Some(last) => now.saturating_sub(last).max(0),
            None => 0,
        };
        self.last_update_time = Some(now);
        self.expire(now);

        let chance = self.spawn_rate(now) * dt as f64 / 1000.0;
        if rng.next_f64() >= chance {
            return None;
        }

        let empty: Vec<Point> = board.empty_cells().collect();
        if empty.is_empty() {
            return None;
        }
        let position = empty[rng.index(empty.len())];
        let powerup = Powerup {
            kind: PowerupKind::pick(rng),
            position,
            spawned_at: now,
        };
        self.active.push(powerup);
        self.last_spawn_time = Some(now);
        Some(powerup)
    }

    /// Removes and returns the first active powerup sitting on a placed cell.
    pub fn collect(&mut self, placed: &[Point]) -> Option<Powerup> {
        let index = self
            .active
            .iter()
            .position(|p| placed.contains(&p.position))?;
        Some(self.active.remove(index))
    }

    /// Clears the powerup's footprint from the board.
    pub fn activate(powerup: &Powerup, board: &mut Board) -> PowerupActivation {
        let cleared_cells: Vec<Point> = powerup
            .footprint()
            .into_iter()
            .filter(|p| board.is_occupied(*p))
            .collect();
        board.clear(&cleared_cells);
        PowerupActivation {
            kind: powerup.kind,
            position: powerup.position,
            points: cleared_cells.len() as u32 * POINTS_PER_CELL,
            cleared_cells,
        }
    }

    /// Moves every timestamp by `delta`, used when a paused run resumes.
    pub fn shift_time(&mut self, delta: i64) {
        for powerup in &mut self.active {
            powerup.spawned_at = powerup.spawned_at.saturating_add(delta);
        }
        if let Some(t) = self.last_spawn_time.as_mut() {
            *t = t.saturating_add(delta);
        }
        if let Some(t) = self.last_update_time.as_mut() {
            *t = t.saturating_add(delta);
        }
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, powerup: Powerup) {
        self.active.push(powerup);
    }
}
