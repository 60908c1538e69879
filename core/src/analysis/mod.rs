pub use moves::*;
pub use search::*;

mod moves;
mod search;
