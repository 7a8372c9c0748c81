use std::convert::Infallible;

use dialog_dot::{Identity, UriError};

/// A collaborator error, boxed so that the pipeline does not need to be
/// generic over every collaborator's error type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that abort a discovery or subscription request as a whole.
///
/// Everything not listed here (rejected chains, streams that fail to open)
/// degrades the result instead of failing it; see
/// [`ChainReport`](crate::ChainReport) for how those are surfaced.
#[derive(Debug, thiserror::Error)]
pub enum MultipathError {
    /// The requested resource identifier could not be parsed.
    #[error("Invalid resource URI: {0}")]
    InvalidUri(#[from] UriError),

    /// The head of the resource identifier names no known authority.
    #[error("Could not resolve namespace '{namespace}': {source}")]
    Resolution {
        /// The head segment that failed to resolve.
        namespace: String,
        /// The resolver's error.
        source: BoxError,
    },

    /// Certificates issued by an identity could not be looked up. Discovery
    /// cannot continue with an incomplete view of the delegation graph.
    #[error("Could not look up certificates issued by {identity}: {source}")]
    CertificateSource {
        /// The identity whose certificates were requested.
        identity: Identity,
        /// The certificate source's error.
        source: BoxError,
    },
}

impl From<Infallible> for MultipathError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
