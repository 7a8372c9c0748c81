//! Contracts for the collaborators the pipeline consumes.
//!
//! Resolving namespace names, fetching certificates, and opening message
//! streams are all provided from outside. The traits here are the narrow
//! surface the pipeline relies on.

use async_trait::async_trait;
use bytes::Bytes;
use dialog_dot::{DChain, Dot, Identity, ResourceUri, Validity};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// A message delivered on a live or historical stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The concrete resource the message was published to.
    pub uri: ResourceUri,
    /// The message body.
    pub payload: Bytes,
}

/// A stream of messages as returned by a [`StreamOpener`].
pub type MessageStream = BoxStream<'static, Message>;

/// A certificate together with the source's verdict on it.
#[derive(Debug, Clone)]
pub struct Classified {
    /// The certificate.
    pub dot: Dot,
    /// Whether the source considers it valid.
    pub validity: Validity,
}

impl Classified {
    /// Pair a certificate with its validity.
    pub fn new(dot: Dot, validity: Validity) -> Self {
        Self { dot, validity }
    }
}

/// How much of the routing chain the transport should attach to each
/// message it delivers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Elaboration {
    /// Attach nothing.
    None,
    /// Attach certificate hashes.
    #[default]
    Partial,
    /// Attach every certificate in full.
    Full,
}

/// Parameters for opening a live or historical stream.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    /// The resource identifier to subscribe to or query.
    pub uri: ResourceUri,
    /// The chain that authorizes `uri`, supplied as routing evidence.
    pub chain: DChain,
    /// Whether the transport should look for a chain on its own. Always
    /// `false` for requests made by the aggregator, which has already done
    /// that work.
    pub auto_chain: bool,
    /// How much of `chain` to attach to delivered messages.
    pub elaboration: Elaboration,
}

impl StreamRequest {
    /// A request that routes through `chain` explicitly.
    pub fn new(uri: ResourceUri, chain: DChain, elaboration: Elaboration) -> Self {
        Self {
            uri,
            chain,
            auto_chain: false,
            elaboration,
        }
    }
}

/// Resolves the head segment of a resource identifier to the identity of
/// its namespace authority.
#[async_trait]
pub trait NamespaceResolver: Send + Sync {
    /// Error returned when a head cannot be resolved.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Resolve `head` (an alias or an encoded identity).
    async fn resolve(&self, head: &str) -> Result<Identity, Self::Error>;
}

/// Looks up the certificates issued by an identity.
#[async_trait]
pub trait CertificateSource: Send + Sync {
    /// Error returned when the lookup itself fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Every certificate issued by `issuer`, each with its validity.
    async fn certificates_from(&self, issuer: &Identity) -> Result<Vec<Classified>, Self::Error>;
}

/// Opens message streams against the transport.
#[async_trait]
pub trait StreamOpener: Send + Sync {
    /// Error returned when a stream cannot be opened.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Subscribe to messages published from now on.
    async fn open_live(&self, request: StreamRequest) -> Result<MessageStream, Self::Error>;

    /// Query the messages already persisted. The stream ends once they have
    /// all been delivered.
    async fn open_historical(&self, request: StreamRequest)
    -> Result<MessageStream, Self::Error>;
}
