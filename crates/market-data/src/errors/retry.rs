/// Classification for caller-side retry policy.
///
/// The crate performs no automatic retries of failed requests. This hint
/// lets callers decide whether a retry with backoff is worthwhile.
///
/// | Class | Meaning |
/// |-------|---------|
/// | `Never` | Retrying the same request will fail the same way |
/// | `WithBackoff` | Transient provider or network condition |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Terminal failure: bad pair, malformed payload, credentials, or no data.
    Never,

    /// Transient failure such as throttling (429), overload (503),
    /// connection loss or timeout. Retry after a delay.
    WithBackoff,
}
