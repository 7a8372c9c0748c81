use std::sync::Arc;

use dialog_dot::{DChain, Identity, ResourceUri};

use crate::{
    AggregateStream, Aggregator, CertificateSource, ChainSearch, Discovery, MultipathConfig,
    MultipathError, NamespaceResolver, StreamOpener, collapse_all,
};

/// The entry point for subscribing to a resource through every delegation
/// chain that authorizes the local identity to read it.
///
/// A [`Client`] acts on behalf of one identity and owns the three
/// collaborators the pipeline needs: a [`NamespaceResolver`] to find the
/// authority named by a resource identifier, a [`CertificateSource`] to walk
/// the delegation graph, and a [`StreamOpener`] to open the streams.
pub struct Client<R, C, O> {
    identity: Identity,
    resolver: R,
    certificates: C,
    aggregator: Aggregator<O>,
    config: MultipathConfig,
}

impl<R, C, O> Client<R, C, O>
where
    R: NamespaceResolver,
    C: CertificateSource,
    O: StreamOpener + 'static,
{
    /// A client for `identity` with the default configuration.
    pub fn new(identity: Identity, resolver: R, certificates: C, opener: Arc<O>) -> Self {
        Self::with_config(
            identity,
            resolver,
            certificates,
            opener,
            MultipathConfig::default(),
        )
    }

    /// A client for `identity` with an explicit configuration.
    pub fn with_config(
        identity: Identity,
        resolver: R,
        certificates: C,
        opener: Arc<O>,
        config: MultipathConfig,
    ) -> Self {
        Self {
            identity,
            resolver,
            certificates,
            aggregator: Aggregator::new(opener, &config),
            config,
        }
    }

    /// The identity chains are discovered for.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The configuration in use.
    pub fn config(&self) -> &MultipathConfig {
        &self.config
    }

    /// The identity of the authority named by the head of `uri`.
    #[tracing::instrument(skip_all, fields(uri = %uri))]
    pub async fn resolve_namespace_authority(
        &self,
        uri: &ResourceUri,
    ) -> Result<Identity, MultipathError> {
        self.resolver
            .resolve(uri.namespace())
            .await
            .map_err(|error| {
                tracing::warn!(%error, "Namespace resolution failed");
                MultipathError::Resolution {
                    namespace: uri.namespace().to_owned(),
                    source: Box::new(error),
                }
            })
    }

    /// Discover every delegation path from `namespace` to this client's
    /// identity, and collapse each into a verified chain or a rejection.
    #[tracing::instrument(skip_all, fields(namespace = %namespace, target = %self.identity))]
    pub async fn discover(&self, namespace: &Identity) -> Result<Discovery, MultipathError> {
        let paths = ChainSearch::new(
            &self.certificates,
            *namespace,
            self.identity,
            self.config.max_depth,
        )
        .run()
        .await?;

        let discovery = collapse_all(paths);
        tracing::debug!(
            chains = discovery.chains.len(),
            rejected = discovery.rejected.len(),
            "Discovery finished"
        );
        Ok(discovery)
    }

    /// Every verified read-access chain from `namespace` to this client's
    /// identity.
    pub async fn find_delegation_chains(
        &self,
        namespace: &Identity,
    ) -> Result<Vec<DChain>, MultipathError> {
        Ok(self.discover(namespace).await?.chains)
    }

    /// Subscribe to `uri` through every chain that authorizes it.
    ///
    /// Fails before opening any stream if the namespace cannot be resolved
    /// or its certificates cannot be looked up. Otherwise the returned
    /// stream carries whatever the surviving chains deliver, which may be
    /// nothing; per-chain outcomes are available from
    /// [`AggregateStream::take_reports`].
    pub async fn aggregate_subscribe<U>(&self, uri: U) -> Result<AggregateStream, MultipathError>
    where
        U: TryInto<ResourceUri>,
        MultipathError: From<U::Error>,
    {
        let uri = uri.try_into()?;
        let namespace = self.resolve_namespace_authority(&uri).await?;
        let chains = self.find_delegation_chains(&namespace).await?;

        tracing::debug!(%uri, chains = chains.len(), "Aggregating subscription");
        Ok(self.aggregator.aggregate(&uri, chains))
    }
}
