pub mod blockgrid;
mod session_rng;

pub use session_rng::SessionRng;
