pub mod freecell;
pub mod tripeaks;

pub use freecell::{Desk, FreecellMove};
pub use tripeaks::{Peaks, PeaksMove};
