pub mod app;
pub mod strings;
pub mod theme;
pub mod views;

pub use app::*;
pub use theme::Theme;
