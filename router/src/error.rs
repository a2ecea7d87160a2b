use thiserror::Error;

/// Routing-layer failures. These never indicate a bug in the router
/// itself; they're recoverable conditions the global loop acts on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("net '{net}' could not be routed")]
    UnroutableNet { net: String },
    #[error("all {attempts} attempt(s) exhausted without routing every net")]
    AttemptsExhausted { attempts: usize },
}
