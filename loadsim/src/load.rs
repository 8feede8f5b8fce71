//! The contract a backend implements to be driven by the [`Runner`](crate::Runner).
use loadsim_core::Stats;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// A unit of load the runner can schedule.
///
/// Backends compose a [`StatsAggregator`](crate::StatsAggregator) and delegate to it:
/// `execute` records exactly one outcome per call, `calculate_stats` finalizes it.
///
/// # Example
/// ```no_run
/// use loadsim::prelude::*;
/// use std::convert::Infallible;
///
/// struct Noop {
///     stats: StatsAggregator,
/// }
///
/// impl Load for Noop {
///     type Response = ();
///     type Error = Infallible;
///
///     async fn execute(&self, _cancel: &CancellationToken, _id: u64) -> Result<(), Infallible> {
///         self.stats
///             .measure(async { Ok::<_, Infallible>(()) }, |r| self.success(r))
///             .await
///     }
///
///     fn success(&self, _response: &()) -> bool {
///         true
///     }
///
///     fn calculate_stats(&self) -> Stats {
///         self.stats.finalize()
///     }
/// }
/// ```
pub trait Load: Send + Sync + 'static {
    /// Raw response of one operation, as seen by the backend.
    type Response;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Perform one operation.
    ///
    /// Implementations time themselves and record the outcome exactly once. Long running
    /// work should observe `cancel` and return promptly once it fires. An `Err` is counted
    /// as a failed request by the runner; it never stops the run.
    fn execute(
        &self,
        cancel: &CancellationToken,
        request_id: u64,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Whether a raw response counts as a success for this backend's protocol.
    /// Only called by the backend itself.
    fn success(&self, response: &Self::Response) -> bool;

    /// Finalized statistics. Called once by the runner after every worker has stopped.
    fn calculate_stats(&self) -> Stats;
}
