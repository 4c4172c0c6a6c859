/// Classification for retry policy.
///
/// The engine never retries on its own. Callers that own a retry policy (a
/// scheduler, a refresh button handler) use this to decide whether trying
/// again can help.
///
/// | Class | Retry? |
/// |-------|--------|
/// | `Never` | No, the request itself is bad |
/// | `WithBackoff` | Yes, after a delay |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - unknown symbol or a payload that cannot be parsed.
    /// Retrying the same request yields the same failure.
    Never,

    /// Transient transport failure. Retry later, ideally with exponential
    /// backoff owned by the caller.
    WithBackoff,
}
