//! Delegation chains.

use std::fmt::Debug;

use crate::{ChainError, ContentHash, Dot, Identity, PermissionSet};

/// An ordered, non-empty sequence of certificates leading from a namespace
/// authority to a receiver.
///
/// Construction guarantees that hops are contiguous (each receiver issues
/// the next certificate) and that every access certificate is scoped to the
/// same namespace. Whether the chain actually grants anything is up to
/// [`DChain::is_access`], [`DChain::permissions`] and
/// [`DChain::check_all_signatures`].
///
/// Chains are always elaborated: every certificate is held by value, not
/// just referenced by hash.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DChain {
    dots: Vec<Dot>,
    hash: ContentHash,
}

impl DChain {
    /// Collapse a raw path of certificates into a chain.
    pub fn new(dots: Vec<Dot>) -> Result<Self, ChainError> {
        let first = dots.first().ok_or(ChainError::Empty)?;
        let namespace = first.namespace().copied();

        for (index, pair) in dots.windows(2).enumerate() {
            if pair[0].receiver() != pair[1].issuer() {
                return Err(ChainError::Discontiguous { index: index + 1 });
            }
        }

        for (index, dot) in dots.iter().enumerate() {
            if let (Some(expected), Some(actual)) = (namespace, dot.namespace()) {
                if &expected != actual {
                    return Err(ChainError::MixedNamespace { index });
                }
            }
        }

        let hashes: Vec<ContentHash> = dots.iter().map(Dot::hash).collect();
        let hash = ContentHash::hash_iter(hashes.iter().map(|hash| hash.as_bytes().as_slice()));

        Ok(Self { dots, hash })
    }

    /// The certificates, from the namespace authority outward.
    pub fn dots(&self) -> &[Dot] {
        &self.dots
    }

    /// Content hash over the hashes of every hop.
    pub fn hash(&self) -> ContentHash {
        self.hash
    }

    /// The hash of every hop, in order.
    pub fn hashes(&self) -> impl Iterator<Item = ContentHash> + '_ {
        self.dots.iter().map(Dot::hash)
    }

    /// The issuer of the first hop.
    pub fn issuer(&self) -> &Identity {
        // Construction rejects empty chains.
        self.dots[0].issuer()
    }

    /// The receiver of the last hop.
    pub fn receiver(&self) -> &Identity {
        self.dots[self.dots.len() - 1].receiver()
    }

    /// The namespace the chain is scoped to, if its first hop is an access
    /// grant.
    pub fn namespace(&self) -> Option<&Identity> {
        self.dots[0].namespace()
    }

    /// Whether every hop is an access grant.
    pub fn is_access(&self) -> bool {
        self.dots.iter().all(Dot::is_access)
    }

    /// What the chain permits end to end: the intersection of every hop's
    /// permissions. `None` unless the chain is an access chain.
    pub fn permissions(&self) -> Option<PermissionSet> {
        self.dots.iter().try_fold(
            PermissionSet {
                consume: true,
                publish: true,
                list: true,
                tap: true,
            },
            |permissions, dot| {
                dot.access()
                    .map(|grant| permissions.intersect(&grant.permissions))
            },
        )
    }

    /// Verify the signature on every hop.
    pub fn check_all_signatures(&self) -> bool {
        self.dots.iter().all(|dot| match dot.verify_signature() {
            Ok(()) => true,
            Err(error) => {
                tracing::debug!(chain = %self.hash, %error, "Chain signature check failed");
                false
            }
        })
    }
}

impl Debug for DChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DChain")
            .field("hash", &self.hash)
            .field("dots", &self.dots)
            .finish()
    }
}
