#![warn(missing_docs)]

//! Multi-path subscription over delegation chains.
//!
//! Reading a resource such as `X/a/b/c` requires a chain of delegation
//! certificates from the namespace authority `X` to the reader. There may be
//! many such chains, each authorizing a different part of the namespace.
//! This crate finds all of them and subscribes through each at once:
//!
//! 1. resolve the authority named by the head of the resource identifier,
//! 2. search the delegation graph for every path to the local identity,
//!    keeping only valid, consumable access grants ([`consumable_certificates`]),
//! 3. collapse each path into a verified [`DChain`](dialog_dot::DChain),
//! 4. narrow the request by every hop's pattern
//!    ([`compute_chain_resource_identifier`]),
//! 5. open a live and a historical stream per chain and merge them into one
//!    [`AggregateStream`].
//!
//! The collaborators the pipeline depends on are traits ([`NamespaceResolver`],
//! [`CertificateSource`], [`StreamOpener`]); [`Client`] ties them together.

mod error;
pub use error::*;

mod config;
pub use config::*;

mod source;
pub use source::*;

mod filter;
pub use filter::*;

mod search;
pub use search::*;

mod collapse;
pub use collapse::*;

mod resolve;
pub use resolve::*;

mod aggregate;
pub use aggregate::*;

mod client;
pub use client::*;

#[cfg(any(test, feature = "helpers"))]
mod helpers;
#[cfg(any(test, feature = "helpers"))]
pub use helpers::*;
