/// Deterministic per-run random stream.
///
/// Every random decision of a run (dealt hands, powerup spawns) is drawn from
/// one of these, so a seed plus the ordered move log reproduces the run. The
/// generator is a 32-bit mix (increment, then three xor/multiply rounds) with
/// wrapping arithmetic only, which keeps it identical on every platform and
/// on the client that recorded the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRng {
    state: u32,
}

const INCREMENT: u32 = 0x6D2B_79F5;
const TWO_POW_32: f64 = 4_294_967_296.0;

impl SessionRng {
    pub fn new(seed: i32) -> Self {
        Self { state: seed as u32 }
    }

    /// Fresh run seed from the OS-seeded thread CSPRNG.
    pub fn random_seed() -> i32 {
        rand::random::<i32>()
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn set_state(&mut self, state: u32) {
        self.state = state;
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_add(INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        f64::from(t ^ (t >> 14)) / TWO_POW_32
    }

    /// `floor(next * (max - min)) + min`; `min` inclusive, `max` exclusive.
    pub fn range_int(&mut self, min: i32, max: i32) -> i32 {
        let span = i64::from(max) - i64::from(min);
        let offset = (self.next_f64() * span as f64).floor() as i64;
        (offset + i64::from(min)) as i32
    }

    /// Uniform index into a collection of `len` items.
    pub fn index(&mut self, len: usize) -> usize {
        self.range_int(0, len as i32) as usize
    }

    /// Fisher-Yates, walking from the last index down to 1.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.range_int(0, i as i32 + 1) as usize;
            items.swap(i, j);
        }
    }
}
