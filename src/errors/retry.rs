/// Classification for the retry policy.
///
/// Used to determine how [`RetryPolicy`](crate::retry::RetryPolicy) should
/// respond to an error from an upstream call.
///
/// # Behavior Summary
///
/// | Class | Retry? | Backoff? |
/// |-------|--------|----------|
/// | `Never` | No | — |
/// | `WithBackoff` | Yes, up to `max_attempts` | Exponential, doubling per attempt |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - bad request, bad credentials, parse failure, or another
    /// terminal condition. The request is fundamentally invalid and retrying
    /// won't help.
    Never,

    /// Retry with exponential backoff.
    ///
    /// Used for transient errors like connection failures, timeouts,
    /// rate limiting (429), and upstream server errors (5xx).
    WithBackoff,
}
