pub mod generation;
pub mod lesson;
pub mod time;

pub use generation::*;
pub use lesson::*;
pub use time::*;
