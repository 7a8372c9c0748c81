#![warn(missing_docs)]

//! Delegation of trust (DOT) primitives.
//!
//! A namespace authority grants access to a part of its resource tree by
//! issuing a [`Dot`] to another [`Identity`]. That identity may in turn
//! re-delegate some or all of what it was granted, so that authority flows
//! outward from the namespace through a [`DChain`] of certificates:
//!
//! ```text
//! namespace (X) ──dot: X/a/b/*──▶ intermediary (Z) ──dot: X/a/*──▶ caller (Y)
//! ```
//!
//! What the chain actually authorizes is the intersection of every hop's
//! [`ResourcePattern`] (see [`narrow`]), here `X/a/b/*`.
//!
//! This crate only models certificates and chains. Discovering chains and
//! subscribing through them lives in `dialog-multipath`.

mod error;
pub use error::*;

mod hash;
pub use hash::*;

mod identity;
pub use identity::*;

mod pattern;
pub use pattern::*;

mod uri;
pub use uri::*;

mod permission;
pub use permission::*;

mod validity;
pub use validity::*;

mod dot;
pub use dot::*;

mod chain;
pub use chain::*;
