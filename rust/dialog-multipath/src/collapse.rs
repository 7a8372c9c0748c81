use dialog_dot::{ChainError, ContentHash, DChain, Dot};

/// Why a raw path did not become a usable chain. None of these are errors;
/// the path is just left out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainRejection {
    /// The certificates do not form a chain at all.
    #[error("Malformed chain: {0}")]
    Malformed(#[from] ChainError),

    /// At least one hop is not an access grant.
    #[error("Not an access chain")]
    NotAccess,

    /// The hops do not jointly permit consuming.
    #[error("Chain does not permit consuming")]
    NoConsume,

    /// At least one hop carries a signature that does not verify.
    #[error("Chain signature check failed")]
    BadSignature,
}

/// A raw path that was left out, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    /// Hashes of the certificates on the path, in order.
    pub hops: Vec<ContentHash>,
    /// Why it was left out.
    pub reason: ChainRejection,
}

/// The outcome of collapsing every discovered path.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Verified read-access chains.
    pub chains: Vec<DChain>,
    /// Paths that were left out.
    pub rejected: Vec<Rejected>,
}

/// Collapse one raw path into a verified read-access chain.
pub fn collapse(path: Vec<Dot>) -> Result<DChain, ChainRejection> {
    let chain = DChain::new(path)?;

    if !chain.is_access() {
        return Err(ChainRejection::NotAccess);
    }
    if !chain
        .permissions()
        .is_some_and(|permissions| permissions.consume)
    {
        return Err(ChainRejection::NoConsume);
    }
    if !chain.check_all_signatures() {
        return Err(ChainRejection::BadSignature);
    }

    Ok(chain)
}

/// Collapse every path independently. A rejected path never affects its
/// siblings.
pub fn collapse_all(paths: Vec<Vec<Dot>>) -> Discovery {
    let mut discovery = Discovery::default();

    for path in paths {
        let hops: Vec<ContentHash> = path.iter().map(Dot::hash).collect();
        match collapse(path) {
            Ok(chain) => discovery.chains.push(chain),
            Err(reason) => {
                tracing::debug!(hops = hops.len(), %reason, "Rejected delegation path");
                discovery.rejected.push(Rejected { hops, reason });
            }
        }
    }

    discovery
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use dialog_dot::{Identity, PermissionSet};
    use ed25519_dalek::SigningKey;
    use std::collections::BTreeMap;

    fn key(seed: u8) -> SigningKey {
        SigningKey::from_bytes(&[seed; 32])
    }

    fn grant(issuer: &SigningKey, receiver: &SigningKey, namespace: &SigningKey) -> Result<Dot> {
        Ok(Dot::builder()
            .receiver(Identity::from(receiver))
            .access(
                Identity::from(namespace),
                "a/*".parse()?,
                PermissionSet::consume(),
            )
            .sign(issuer)?)
    }

    #[test]
    fn it_accepts_signed_consume_chains() -> Result<()> {
        let (x, z, y) = (key(1), key(2), key(3));
        let chain = collapse(vec![grant(&x, &z, &x)?, grant(&z, &y, &x)?])?;
        assert_eq!(chain.dots().len(), 2);
        Ok(())
    }

    #[test]
    fn it_rejects_each_kind_of_bad_path() -> Result<()> {
        let (x, z, y) = (key(1), key(2), key(3));

        assert_eq!(
            collapse(vec![]),
            Err(ChainRejection::Malformed(ChainError::Empty))
        );

        let permission = Dot::builder()
            .receiver(Identity::from(&y))
            .permission(BTreeMap::new())
            .sign(&z)?;
        assert_eq!(
            collapse(vec![grant(&x, &z, &x)?, permission]),
            Err(ChainRejection::NotAccess)
        );

        let publish_only = Dot::builder()
            .receiver(Identity::from(&y))
            .access(Identity::from(&x), "a/*".parse()?, "P".parse()?)
            .sign(&z)?;
        assert_eq!(
            collapse(vec![grant(&x, &z, &x)?, publish_only]),
            Err(ChainRejection::NoConsume)
        );

        let forged = Dot::builder()
            .issuer(Identity::from(&z))
            .receiver(Identity::from(&y))
            .access(Identity::from(&x), "a/*".parse()?, PermissionSet::consume())
            .sign_unchecked(&y)?;
        assert_eq!(
            collapse(vec![grant(&x, &z, &x)?, forged]),
            Err(ChainRejection::BadSignature)
        );
        Ok(())
    }

    #[test]
    fn it_keeps_good_paths_next_to_rejected_ones() -> Result<()> {
        let (x, z, y) = (key(1), key(2), key(3));
        let discovery = collapse_all(vec![
            vec![grant(&x, &y, &x)?],
            vec![grant(&x, &z, &x)?, grant(&y, &y, &x)?],
        ]);

        assert_eq!(discovery.chains.len(), 1);
        assert_eq!(discovery.rejected.len(), 1);
        assert_eq!(
            discovery.rejected[0].reason,
            ChainRejection::Malformed(ChainError::Discontiguous { index: 1 })
        );
        assert_eq!(discovery.rejected[0].hops.len(), 2);
        Ok(())
    }
}
