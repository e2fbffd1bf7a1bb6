pub mod help;
pub mod main;

pub use help::*;
pub use main::*;
