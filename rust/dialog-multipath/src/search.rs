//! Discovery of raw delegation paths.
//!
//! Starting at a namespace authority, the search follows every consumable
//! access grant scoped to that namespace outward, one issuer at a time,
//! until it reaches the target identity:
//!
//! ```text
//!            ┌──▶ Z ──▶ Y      path [X→Z, Z→Y]
//!   X ───────┤
//!            └──▶ Y            path [X→Y]
//! ```
//!
//! The certificate set comes from outside and may contain cycles, so each
//! branch remembers the `(identity, namespace)` pairs it has passed through
//! and refuses to revisit them. Branches are also cut off at a maximum
//! depth. Neither of these is an error; the branch just yields nothing.

use std::collections::HashMap;

use dialog_dot::{Dot, Identity};
use futures::{FutureExt, future::BoxFuture};

use crate::{CertificateSource, MultipathError, consumable_certificates};

/// A single depth-first search from one namespace authority to one target.
pub struct ChainSearch<'a, C: ?Sized> {
    source: &'a C,
    namespace: Identity,
    target: Identity,
    max_depth: usize,
    branch: Vec<(Identity, Identity)>,
    cache: HashMap<Identity, Vec<Dot>>,
}

impl<'a, C> ChainSearch<'a, C>
where
    C: CertificateSource + ?Sized,
{
    /// Prepare a search for chains of at most `max_depth` hops from the
    /// authority of `namespace` to `target`.
    pub fn new(source: &'a C, namespace: Identity, target: Identity, max_depth: usize) -> Self {
        Self {
            source,
            namespace,
            target,
            max_depth: max_depth.max(1),
            branch: Vec::new(),
            cache: HashMap::new(),
        }
    }

    /// Find every raw path. Paths are not deduplicated and are not yet
    /// checked beyond what the certificate filter guarantees.
    pub async fn run(mut self) -> Result<Vec<Vec<Dot>>, MultipathError> {
        self.branch.push((self.namespace, self.namespace));
        let paths = self.walk(self.namespace, 0).await?;
        tracing::debug!(
            namespace = %self.namespace,
            target = %self.target,
            paths = paths.len(),
            lookups = self.cache.len(),
            "Delegation search finished"
        );
        Ok(paths)
    }

    fn walk(
        &mut self,
        from: Identity,
        depth: usize,
    ) -> BoxFuture<'_, Result<Vec<Vec<Dot>>, MultipathError>> {
        async move {
            let mut paths = Vec::new();

            for dot in self.certificates(&from).await? {
                if dot.namespace() != Some(&self.namespace) {
                    continue;
                }

                let receiver = *dot.receiver();
                if receiver == self.target {
                    paths.push(vec![dot]);
                    continue;
                }

                if self.branch.contains(&(receiver, self.namespace)) {
                    tracing::debug!(
                        dot = %dot.hash(),
                        %receiver,
                        "Delegation cycle, not following"
                    );
                    continue;
                }
                if depth + 1 >= self.max_depth {
                    tracing::warn!(
                        dot = %dot.hash(),
                        max_depth = self.max_depth,
                        "Delegation path too deep, not following"
                    );
                    continue;
                }

                self.branch.push((receiver, self.namespace));
                let tails = self.walk(receiver, depth + 1).await;
                self.branch.pop();

                for tail in tails? {
                    let mut path = Vec::with_capacity(tail.len() + 1);
                    path.push(dot.clone());
                    path.extend(tail);
                    paths.push(path);
                }
            }

            Ok(paths)
        }
        .boxed()
    }

    async fn certificates(&mut self, issuer: &Identity) -> Result<Vec<Dot>, MultipathError> {
        if let Some(dots) = self.cache.get(issuer) {
            return Ok(dots.clone());
        }

        let dots = consumable_certificates(self.source, issuer)
            .await
            .map_err(|error| MultipathError::CertificateSource {
                identity: *issuer,
                source: Box::new(error),
            })?;
        self.cache.insert(*issuer, dots.clone());
        Ok(dots)
    }
}
