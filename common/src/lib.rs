pub mod config;
pub mod games;
pub mod identifiers;
pub mod logger;
pub mod replay;
pub mod session;

pub use identifiers::*;
pub use session::GameSession;
