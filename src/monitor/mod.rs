mod controller;
mod snapshot;

pub use controller::{Monitor, MonitorCommand};
pub use snapshot::MonitorSnapshot;
