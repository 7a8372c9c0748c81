use crate::Identity;

/// Errors that can occur while parsing a [`ResourcePattern`](crate::ResourcePattern).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// The pattern contains no segments at all.
    #[error("Resource pattern is empty")]
    Empty,

    /// Two slashes in a row, or a leading/trailing slash.
    #[error("Resource pattern has an empty segment at position {index}")]
    EmptySegment {
        /// Position of the empty segment.
        index: usize,
    },

    /// More than one `*` segment.
    #[error("Resource pattern may contain at most one '*' segment")]
    MultipleWildcards,
}

/// Errors that can occur while parsing a [`ResourceUri`](crate::ResourceUri).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UriError {
    /// The namespace segment is empty.
    #[error("Resource URI '{0}' has an empty namespace")]
    EmptyNamespace(String),

    /// Nothing follows the namespace segment.
    #[error("Resource URI '{0}' has no resource below its namespace")]
    MissingSuffix(String),

    /// The part after the namespace is not a valid pattern.
    #[error("Invalid resource pattern: {0}")]
    Pattern(#[from] PatternError),
}

/// Errors that can occur while building or checking a [`Dot`](crate::Dot).
#[derive(Debug, thiserror::Error)]
pub enum DotError {
    /// Text or bytes that do not decode to an Ed25519 public key.
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// A permission flag outside of `C`, `P`, `L`, `T`.
    #[error("Invalid permission flag '{0}'")]
    InvalidPermission(char),

    /// A required builder field was never set.
    #[error("Incomplete certificate: missing {0}")]
    Incomplete(&'static str),

    /// The signing key does not belong to the declared issuer.
    #[error("Signing key does not belong to issuer {issuer}")]
    IssuerMismatch {
        /// The issuer declared on the builder.
        issuer: Identity,
    },

    /// DAG-CBOR encoding of the payload failed.
    #[error("Failed to encode certificate payload: {0}")]
    Encoding(String),

    /// The signature does not verify against the issuer key.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
}

/// Errors that can occur while collapsing certificates into a [`DChain`](crate::DChain).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// A chain needs at least one certificate.
    #[error("Delegation chain is empty")]
    Empty,

    /// The receiver of hop `index - 1` is not the issuer of hop `index`.
    #[error("Delegation chain is not contiguous at hop {index}")]
    Discontiguous {
        /// Position of the first certificate that does not connect.
        index: usize,
    },

    /// Hop `index` grants access on a different namespace than hop 0.
    #[error("Delegation chain mixes namespaces at hop {index}")]
    MixedNamespace {
        /// Position of the offending certificate.
        index: usize,
    },
}
