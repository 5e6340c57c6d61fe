pub mod gate;
pub mod phase;
pub mod types;

pub use gate::*;
pub use phase::*;
pub use types::*;
