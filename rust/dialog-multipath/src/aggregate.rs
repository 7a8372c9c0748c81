//! Fan-in of per-chain message streams.
//!
//! For every chain, two producers are started: one on a live subscription
//! and one on a historical query, both against the resource identifier the
//! chain resolves to. Every producer forwards into one bounded channel:
//!
//! ```text
//!   chain A ─┬─ live ───────┐
//!            └─ historical ─┤
//!   chain B ─┬─ live ───────┼──▶ mpsc ──▶ AggregateStream
//!            └─ historical ─┘
//! ```
//!
//! Messages arrive in whatever order producers deliver them. When two
//! chains resolve to overlapping identifiers, the same message is delivered
//! once per chain; no deduplication is attempted.

use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use dialog_dot::{ContentHash, DChain, ResourceUri};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    Elaboration, Message, MessageStream, MultipathConfig, StreamOpener, StreamRequest,
    compute_chain_resource_identifier,
};

/// Which of a chain's two streams a report refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    /// The live subscription.
    Live,
    /// The one-shot historical query.
    Historical,
}

/// Something that happened to a chain's contribution to the aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    /// The chain does not overlap the request; no streams were opened.
    NoOverlap,
    /// A stream was opened on the chain's resource identifier.
    Opened {
        /// Which stream.
        flow: Flow,
        /// The narrowed resource identifier.
        uri: ResourceUri,
    },
    /// A stream could not be opened. The chain's other stream, and every
    /// other chain, are unaffected.
    OpenFailed {
        /// Which stream.
        flow: Flow,
        /// The narrowed resource identifier.
        uri: ResourceUri,
        /// The opener's error message.
        reason: String,
    },
    /// A stream ran to completion.
    Ended {
        /// Which stream.
        flow: Flow,
    },
    /// A stream was stopped by cancellation, or because the aggregate
    /// stream was dropped.
    Cancelled {
        /// Which stream.
        flow: Flow,
    },
}

/// A diagnostic report about one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReport {
    /// The chain the report is about.
    pub chain: ContentHash,
    /// What happened.
    pub event: ChainEvent,
}

/// Receiving half of the diagnostics side-channel.
pub type ChainReports = mpsc::UnboundedReceiver<ChainReport>;

/// Opens and merges the streams of a set of chains.
pub struct Aggregator<O> {
    opener: Arc<O>,
    buffer: usize,
    elaboration: Elaboration,
}

impl<O> Aggregator<O>
where
    O: StreamOpener + 'static,
{
    /// An aggregator that opens streams through `opener`.
    pub fn new(opener: Arc<O>, config: &MultipathConfig) -> Self {
        Self {
            opener,
            buffer: config.buffer.max(1),
            elaboration: config.elaboration,
        }
    }

    /// Start two producers per chain that overlaps `uri` and return the
    /// merged stream.
    ///
    /// Producers are spawned on the current Tokio runtime, so this must be
    /// called from within one.
    pub fn aggregate(&self, uri: &ResourceUri, chains: Vec<DChain>) -> AggregateStream {
        let (messages, receiver) = mpsc::channel(self.buffer);
        let (reports, report_receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        for chain in chains {
            let Some(narrowed) = compute_chain_resource_identifier(&chain, uri) else {
                tracing::debug!(chain = %chain.hash(), %uri, "Chain does not overlap request");
                let _ = reports.send(ChainReport {
                    chain: chain.hash(),
                    event: ChainEvent::NoOverlap,
                });
                continue;
            };

            for flow in [Flow::Live, Flow::Historical] {
                let producer = Producer {
                    opener: self.opener.clone(),
                    flow,
                    request: StreamRequest::new(narrowed.clone(), chain.clone(), self.elaboration),
                    messages: messages.clone(),
                    reports: reports.clone(),
                    cancel: cancel.clone(),
                };
                tokio::spawn(producer.run());
            }
        }

        AggregateStream {
            messages: receiver,
            reports: Some(report_receiver),
            cancel,
        }
    }
}

struct Producer<O> {
    opener: Arc<O>,
    flow: Flow,
    request: StreamRequest,
    messages: mpsc::Sender<Message>,
    reports: mpsc::UnboundedSender<ChainReport>,
    cancel: CancellationToken,
}

impl<O> Producer<O>
where
    O: StreamOpener,
{
    async fn run(self) {
        let chain = self.request.chain.hash();
        let uri = self.request.uri.clone();
        let flow = self.flow;
        let report = |event: ChainEvent| {
            // The caller may have stopped listening for reports.
            let _ = self.reports.send(ChainReport { chain, event });
        };

        let opened = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                report(ChainEvent::Cancelled { flow });
                return;
            }
            opened = open(self.opener.as_ref(), flow, self.request.clone()) => opened,
        };

        let mut stream = match opened {
            Ok(stream) => {
                tracing::debug!(%chain, ?flow, %uri, "Opened stream");
                report(ChainEvent::Opened { flow, uri });
                stream
            }
            Err(error) => {
                tracing::warn!(%chain, ?flow, %uri, %error, "Could not open stream");
                report(ChainEvent::OpenFailed {
                    flow,
                    uri,
                    reason: error.to_string(),
                });
                return;
            }
        };

        loop {
            let message = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                next = stream.next() => match next {
                    Some(message) => message,
                    None => {
                        tracing::trace!(%chain, ?flow, "Stream ended");
                        report(ChainEvent::Ended { flow });
                        return;
                    }
                },
            };

            let sent = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                sent = self.messages.send(message) => sent,
            };
            if sent.is_err() {
                break;
            }
        }

        drop(stream);
        tracing::trace!(%chain, ?flow, "Stream cancelled");
        report(ChainEvent::Cancelled { flow });
    }
}

async fn open<O>(opener: &O, flow: Flow, request: StreamRequest) -> Result<MessageStream, O::Error>
where
    O: StreamOpener + ?Sized,
{
    match flow {
        Flow::Live => opener.open_live(request).await,
        Flow::Historical => opener.open_historical(request).await,
    }
}

/// The merged stream of every chain's messages.
///
/// The stream ends once every producer has finished. Live subscriptions
/// rarely finish on their own, so callers that are done should
/// [`cancel`](AggregateStream::cancel) or drop the stream, which stops all
/// producers.
pub struct AggregateStream {
    messages: mpsc::Receiver<Message>,
    reports: Option<ChainReports>,
    cancel: CancellationToken,
}

impl AggregateStream {
    /// Receive the next message.
    pub async fn recv(&mut self) -> Option<Message> {
        self.messages.recv().await
    }

    /// Take the diagnostics side-channel. Returns `None` once taken.
    pub fn take_reports(&mut self) -> Option<ChainReports> {
        self.reports.take()
    }

    /// Stop every producer. Messages already buffered can still be read.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that stops every producer when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Stream for AggregateStream {
    type Item = Message;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().messages.poll_recv(cx)
    }
}

impl Drop for AggregateStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
