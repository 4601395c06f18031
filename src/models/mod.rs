pub mod expansion;
pub mod generation;

pub use expansion::*;
pub use generation::*;
