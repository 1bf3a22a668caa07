//! The degradation policy: what the middleware does when the shared
//! store can't be consulted.

/// Observed state of the shared store at the moment a request needs an
/// admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// The store answered normally; a real `Decision` is available.
    Ready,
    /// `SharedStore::available()` reports false, or the bucket store's
    /// single inline retry was exhausted.
    Unavailable,
}

/// What the middleware should do instead of a normal admission
/// decision, given the configured degradation mode and the observed
/// store state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedAction {
    /// Let the request through with no rate-limit headers set.
    PassThrough,
    /// Reject with a 503 and a fixed JSON body; no rate-limit headers.
    RejectServiceUnavailable,
}

/// Resolves `(fail_open, StoreState) -> DegradedAction`. Only called
/// when the store could not produce a `Decision`; an available store
/// always goes through the normal admit/deny path instead.
pub fn resolve(fail_open: bool, state: StoreState) -> DegradedAction {
    match (fail_open, state) {
        (true, StoreState::Unavailable) => DegradedAction::PassThrough,
        (false, StoreState::Unavailable) => DegradedAction::RejectServiceUnavailable,
        (_, StoreState::Ready) => {
            // Ready with no decision should never happen; the caller
            // that hit this path already failed to get one. Treat it
            // as unavailable rather than admit silently.
            if fail_open {
                DegradedAction::PassThrough
            } else {
                DegradedAction::RejectServiceUnavailable
            }
        }
    }
}
