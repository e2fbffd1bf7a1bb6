pub mod monitor;
pub mod quality;
pub mod sample;
pub mod stats;
pub mod trace;

pub use monitor::*;
pub use quality::*;
pub use sample::*;
pub use stats::*;
pub use trace::*;
