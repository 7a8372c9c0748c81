//! In-memory collaborators for exercising discovery and aggregation without
//! a network.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use dialog_dot::{Dot, Identity, ResourceUri, Validity};
use futures::{StreamExt, stream};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::{
    CertificateSource, Classified, Flow, Message, MessageStream, NamespaceResolver, StreamOpener,
    StreamRequest,
};

/// Errors returned by the in-memory collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HelperError {
    /// The head is neither a registered alias nor an encoded identity.
    #[error("Unresolved namespace '{0}'")]
    Unresolved(String),

    /// Lookups for this identity were configured to fail.
    #[error("Certificates for {0} are unavailable")]
    Unavailable(Identity),

    /// Opening this stream was configured to fail.
    #[error("Refused to open {flow:?} stream on {uri}")]
    Refused {
        /// Which stream.
        flow: Flow,
        /// The requested resource identifier.
        uri: ResourceUri,
    },
}

/// A namespace registry backed by a map of aliases.
///
/// Heads that are not registered aliases still resolve if they are the
/// encoded form of an identity.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    aliases: Mutex<HashMap<String, Identity>>,
}

impl MemoryRegistry {
    /// Point `alias` at `identity`, replacing any earlier registration.
    pub fn register(&self, alias: impl Into<String>, identity: Identity) {
        self.aliases.lock().insert(alias.into(), identity);
    }
}

#[async_trait]
impl NamespaceResolver for MemoryRegistry {
    type Error = HelperError;

    async fn resolve(&self, head: &str) -> Result<Identity, Self::Error> {
        if let Some(identity) = self.aliases.lock().get(head) {
            return Ok(*identity);
        }
        head.parse()
            .map_err(|_| HelperError::Unresolved(head.to_owned()))
    }
}

#[derive(Debug, Default)]
struct CertificateState {
    issued: HashMap<Identity, Vec<Classified>>,
    failing: HashSet<Identity>,
    lookups: HashMap<Identity, usize>,
}

/// A certificate store that counts lookups and can be told to fail.
#[derive(Debug, Default)]
pub struct MemoryCertificates {
    state: Mutex<CertificateState>,
}

impl MemoryCertificates {
    /// File `dot` under its issuer.
    pub fn insert(&self, dot: Dot, validity: Validity) {
        let issuer = *dot.issuer();
        self.insert_under(issuer, dot, validity);
    }

    /// File `dot` under an arbitrary identity, whether or not it issued it.
    pub fn insert_under(&self, identity: Identity, dot: Dot, validity: Validity) {
        self.state
            .lock()
            .issued
            .entry(identity)
            .or_default()
            .push(Classified::new(dot, validity));
    }

    /// Make every lookup for `identity` fail.
    pub fn fail_for(&self, identity: Identity) {
        self.state.lock().failing.insert(identity);
    }

    /// How many times certificates issued by `identity` were requested.
    pub fn lookups(&self, identity: &Identity) -> usize {
        self.state
            .lock()
            .lookups
            .get(identity)
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait]
impl CertificateSource for MemoryCertificates {
    type Error = HelperError;

    async fn certificates_from(&self, issuer: &Identity) -> Result<Vec<Classified>, Self::Error> {
        let mut state = self.state.lock();
        *state.lookups.entry(*issuer).or_default() += 1;

        if state.failing.contains(issuer) {
            return Err(HelperError::Unavailable(*issuer));
        }
        Ok(state.issued.get(issuer).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct BrokerState {
    subscribers: Vec<(ResourceUri, mpsc::UnboundedSender<Message>)>,
    retained: Vec<Message>,
    refused_flows: HashSet<Flow>,
    refused_uris: HashSet<ResourceUri>,
    requests: Vec<(Flow, StreamRequest)>,
}

/// A message broker that keeps everything in memory.
///
/// Published messages go to every live subscription whose resource
/// identifier matches; retained messages are replayed to historical queries.
#[derive(Default)]
pub struct MemoryBroker {
    state: Mutex<BrokerState>,
}

impl MemoryBroker {
    /// Deliver `message` to every matching live subscription. Returns how
    /// many subscriptions received it.
    pub fn publish(&self, message: Message) -> usize {
        let mut state = self.state.lock();
        state.subscribers.retain(|(_, sender)| !sender.is_closed());

        state
            .subscribers
            .iter()
            .filter(|(uri, _)| covers(uri, &message.uri))
            .filter(|(_, sender)| sender.send(message.clone()).is_ok())
            .count()
    }

    /// Keep `message` for historical queries.
    pub fn retain(&self, message: Message) {
        self.state.lock().retained.push(message);
    }

    /// Make every open of `flow` fail.
    pub fn refuse(&self, flow: Flow) {
        self.state.lock().refused_flows.insert(flow);
    }

    /// Make every open on exactly `uri` fail.
    pub fn refuse_uri(&self, uri: ResourceUri) {
        self.state.lock().refused_uris.insert(uri);
    }

    /// Every open request received so far, refused ones included.
    pub fn requests(&self) -> Vec<(Flow, StreamRequest)> {
        self.state.lock().requests.clone()
    }

    /// The number of live subscriptions whose subscriber is still listening.
    pub fn live_subscriptions(&self) -> usize {
        let mut state = self.state.lock();
        state.subscribers.retain(|(_, sender)| !sender.is_closed());
        state.subscribers.len()
    }

    fn admit(&self, flow: Flow, request: &StreamRequest) -> Result<(), HelperError> {
        let mut state = self.state.lock();
        state.requests.push((flow, request.clone()));

        if state.refused_flows.contains(&flow) || state.refused_uris.contains(&request.uri) {
            return Err(HelperError::Refused {
                flow,
                uri: request.uri.clone(),
            });
        }
        Ok(())
    }
}

fn covers(subscription: &ResourceUri, published: &ResourceUri) -> bool {
    subscription.namespace() == published.namespace()
        && subscription
            .suffix()
            .matches(&published.suffix().to_string())
}

#[async_trait]
impl StreamOpener for MemoryBroker {
    type Error = HelperError;

    async fn open_live(&self, request: StreamRequest) -> Result<MessageStream, Self::Error> {
        self.admit(Flow::Live, &request)?;

        let (sender, receiver) = mpsc::unbounded_channel();
        self.state.lock().subscribers.push((request.uri, sender));

        Ok(stream::unfold(receiver, |mut receiver| async move {
            receiver.recv().await.map(|message| (message, receiver))
        })
        .boxed())
    }

    async fn open_historical(&self, request: StreamRequest) -> Result<MessageStream, Self::Error> {
        self.admit(Flow::Historical, &request)?;

        let matching: Vec<Message> = self
            .state
            .lock()
            .retained
            .iter()
            .filter(|message| covers(&request.uri, &message.uri))
            .cloned()
            .collect();

        Ok(stream::iter(matching).boxed())
    }
}
