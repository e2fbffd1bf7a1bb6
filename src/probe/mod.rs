pub mod ping;

pub use ping::*;

use std::future::Future;

use crate::state::ProbeSample;

/// One reachability check against a host.
///
/// Implementations must always return a sample (failures are outcomes, not
/// errors) and must bound their own running time.
pub trait Prober: Send + Sync {
    fn probe(&self, host: &str) -> impl Future<Output = ProbeSample> + Send;
}
