//! Delegation of trust certificates.

use std::{
    collections::BTreeMap,
    fmt::Debug,
    hash::Hash,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use ed25519_dalek::{Signature, Signer, SigningKey};
use serde::Serialize;

use crate::{ContentHash, DotError, Identity, PermissionSet, ResourcePattern};

/// Access to a pattern of resources below one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessGrant {
    /// The namespace authority the pattern is rooted at.
    #[serde(rename = "ns")]
    pub namespace: Identity,
    /// The resources below the namespace this grant covers.
    #[serde(rename = "uri")]
    pub pattern: ResourcePattern,
    /// What the receiver may do with those resources.
    #[serde(rename = "perm")]
    pub permissions: PermissionSet,
}

/// What a certificate grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DotKind {
    /// Access to resources in a namespace.
    #[serde(rename = "access")]
    Access(AccessGrant),
    /// Application-defined key/value permissions. These never grant access
    /// to resources and so never take part in access chains.
    #[serde(rename = "permission")]
    Permission(BTreeMap<String, String>),
}

/// The signed content of a [`Dot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DotPayload {
    #[serde(rename = "iss")]
    issuer: Identity,

    #[serde(rename = "aud")]
    receiver: Identity,

    kind: DotKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,

    created: u64,
}

impl DotPayload {
    fn encode(&self) -> Result<Vec<u8>, DotError> {
        serde_ipld_dagcbor::to_vec(self).map_err(|error| DotError::Encoding(error.to_string()))
    }
}

struct DotInner {
    payload: DotPayload,
    signature: Signature,
    hash: ContentHash,
}

/// A signed grant from an issuer to a receiver.
///
/// Certificates are immutable and cheap to clone. Two certificates are equal
/// when their content hashes are.
#[derive(Clone)]
pub struct Dot(Arc<DotInner>);

impl Dot {
    /// Start building a certificate.
    pub fn builder() -> DotBuilder {
        DotBuilder::default()
    }

    fn seal(payload: DotPayload, encoded: &[u8], signature: Signature) -> Self {
        let signature_bytes = signature.to_bytes();
        let hash = ContentHash::hash_iter([encoded, signature_bytes.as_slice()]);
        Self(Arc::new(DotInner {
            payload,
            signature,
            hash,
        }))
    }

    /// Who granted this certificate.
    pub fn issuer(&self) -> &Identity {
        &self.0.payload.issuer
    }

    /// Who this certificate was granted to.
    pub fn receiver(&self) -> &Identity {
        &self.0.payload.receiver
    }

    /// What this certificate grants.
    pub fn kind(&self) -> &DotKind {
        &self.0.payload.kind
    }

    /// Free-form note left by the issuer.
    pub fn comment(&self) -> Option<&str> {
        self.0.payload.comment.as_deref()
    }

    /// Creation time in seconds since the Unix epoch.
    pub fn created(&self) -> u64 {
        self.0.payload.created
    }

    /// The content hash identifying this certificate.
    pub fn hash(&self) -> ContentHash {
        self.0.hash
    }

    /// The issuer's signature over the encoded payload.
    pub fn signature(&self) -> &Signature {
        &self.0.signature
    }

    /// The access grant, if this is an access certificate.
    pub fn access(&self) -> Option<&AccessGrant> {
        match self.kind() {
            DotKind::Access(grant) => Some(grant),
            DotKind::Permission(_) => None,
        }
    }

    /// Whether this certificate grants access to resources.
    pub fn is_access(&self) -> bool {
        self.access().is_some()
    }

    /// The namespace an access certificate is scoped to.
    pub fn namespace(&self) -> Option<&Identity> {
        self.access().map(|grant| &grant.namespace)
    }

    /// The resource pattern an access certificate covers.
    pub fn pattern(&self) -> Option<&ResourcePattern> {
        self.access().map(|grant| &grant.pattern)
    }

    /// Whether this is an access certificate that permits consuming.
    pub fn can_consume(&self) -> bool {
        self.access()
            .is_some_and(|grant| grant.permissions.consume)
    }

    /// Check the signature against the issuer's key.
    pub fn verify_signature(&self) -> Result<(), DotError> {
        let encoded = self.0.payload.encode()?;
        self.issuer()
            .verifying_key()?
            .verify_strict(&encoded, self.signature())
            .map_err(|error| DotError::InvalidSignature(format!("{}: {error}", self.hash())))
    }
}

impl PartialEq for Dot {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for Dot {}

impl Hash for Dot {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash.hash(state);
    }
}

impl Debug for Dot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dot")
            .field("hash", &self.hash())
            .field("issuer", self.issuer())
            .field("receiver", self.receiver())
            .field("kind", self.kind())
            .finish()
    }
}

/// Builder for [`Dot`]s.
///
/// ```
/// use dialog_dot::{Dot, Identity, PermissionSet};
/// use ed25519_dalek::SigningKey;
///
/// let namespace = SigningKey::from_bytes(&[1; 32]);
/// let caller = Identity::from(&SigningKey::from_bytes(&[2; 32]));
///
/// let dot = Dot::builder()
///     .receiver(caller)
///     .access(
///         Identity::from(&namespace),
///         "a/b/*".parse().unwrap(),
///         PermissionSet::consume(),
///     )
///     .sign(&namespace)
///     .unwrap();
///
/// assert!(dot.can_consume());
/// assert!(dot.verify_signature().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DotBuilder {
    issuer: Option<Identity>,
    receiver: Option<Identity>,
    kind: Option<DotKind>,
    comment: Option<String>,
    created: Option<u64>,
}

impl DotBuilder {
    /// Declare the issuer. When omitted, the signing key decides.
    pub fn issuer(mut self, issuer: Identity) -> Self {
        self.issuer = Some(issuer);
        self
    }

    /// Set the receiver.
    pub fn receiver(mut self, receiver: Identity) -> Self {
        self.receiver = Some(receiver);
        self
    }

    /// Grant access to `pattern` below `namespace`.
    pub fn access(
        mut self,
        namespace: Identity,
        pattern: ResourcePattern,
        permissions: PermissionSet,
    ) -> Self {
        self.kind = Some(DotKind::Access(AccessGrant {
            namespace,
            pattern,
            permissions,
        }));
        self
    }

    /// Grant application permissions instead of resource access.
    pub fn permission(mut self, permissions: BTreeMap<String, String>) -> Self {
        self.kind = Some(DotKind::Permission(permissions));
        self
    }

    /// Attach a comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Override the creation time (seconds since the Unix epoch).
    pub fn created(mut self, created: u64) -> Self {
        self.created = Some(created);
        self
    }

    /// Sign as the owner of `key`.
    ///
    /// # Errors
    ///
    /// Fails if a declared issuer does not match `key`, if the receiver or
    /// kind is missing, or if the payload cannot be encoded.
    pub fn sign(self, key: &SigningKey) -> Result<Dot, DotError> {
        let signer = Identity::from(key);
        match self.issuer {
            Some(issuer) if issuer != signer => Err(DotError::IssuerMismatch { issuer }),
            _ => self.seal(signer, key),
        }
    }

    /// Sign with `key` while keeping whatever issuer was declared, producing
    /// a certificate whose signature does not verify.
    #[cfg(any(test, feature = "helpers"))]
    pub fn sign_unchecked(self, key: &SigningKey) -> Result<Dot, DotError> {
        let issuer = self.issuer.unwrap_or_else(|| Identity::from(key));
        self.seal(issuer, key)
    }

    fn seal(self, issuer: Identity, key: &SigningKey) -> Result<Dot, DotError> {
        let payload = DotPayload {
            issuer,
            receiver: self.receiver.ok_or(DotError::Incomplete("receiver"))?,
            kind: self.kind.ok_or(DotError::Incomplete("kind"))?,
            comment: self.comment,
            created: self.created.unwrap_or_else(now),
        };
        let encoded = payload.encode()?;
        let signature = key.sign(&encoded);
        Ok(Dot::seal(payload, &encoded, signature))
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn key(seed: u8) -> SigningKey {
        SigningKey::from_bytes(&[seed; 32])
    }

    fn grant(namespace: &SigningKey, receiver: &SigningKey, pattern: &str) -> Result<Dot> {
        Ok(Dot::builder()
            .receiver(Identity::from(receiver))
            .access(
                Identity::from(namespace),
                pattern.parse()?,
                PermissionSet::consume(),
            )
            .created(1_700_000_000)
            .sign(namespace)?)
    }

    #[test]
    fn it_signs_and_verifies_access_grants() -> Result<()> {
        let (namespace, caller) = (key(1), key(2));
        let dot = grant(&namespace, &caller, "a/b/*")?;

        assert_eq!(dot.issuer(), &Identity::from(&namespace));
        assert_eq!(dot.receiver(), &Identity::from(&caller));
        assert_eq!(dot.namespace(), Some(&Identity::from(&namespace)));
        assert_eq!(dot.pattern().map(ToString::to_string), Some("a/b/*".into()));
        assert!(dot.is_access());
        assert!(dot.can_consume());
        dot.verify_signature()?;
        Ok(())
    }

    #[test]
    fn it_hashes_identical_content_identically() -> Result<()> {
        let (namespace, caller) = (key(1), key(2));
        let first = grant(&namespace, &caller, "a/*")?;
        let second = grant(&namespace, &caller, "a/*")?;
        let other = grant(&namespace, &caller, "b/*")?;

        assert_eq!(first.hash(), second.hash());
        assert_eq!(first, second);
        assert_ne!(first.hash(), other.hash());
        Ok(())
    }

    #[test]
    fn it_refuses_to_sign_for_someone_else() -> Result<()> {
        let (namespace, caller, intruder) = (key(1), key(2), key(3));
        let result = Dot::builder()
            .issuer(Identity::from(&namespace))
            .receiver(Identity::from(&caller))
            .access(
                Identity::from(&namespace),
                "a".parse()?,
                PermissionSet::consume(),
            )
            .sign(&intruder);

        assert!(matches!(result, Err(DotError::IssuerMismatch { .. })));
        Ok(())
    }

    #[test]
    fn it_detects_forged_signatures() -> Result<()> {
        let (namespace, caller, intruder) = (key(1), key(2), key(3));
        let forged = Dot::builder()
            .issuer(Identity::from(&namespace))
            .receiver(Identity::from(&caller))
            .access(
                Identity::from(&namespace),
                "a".parse()?,
                PermissionSet::consume(),
            )
            .sign_unchecked(&intruder)?;

        assert!(matches!(
            forged.verify_signature(),
            Err(DotError::InvalidSignature(_))
        ));
        Ok(())
    }

    #[test]
    fn it_requires_a_receiver_and_a_kind() {
        let namespace = key(1);
        assert!(matches!(
            Dot::builder().sign(&namespace),
            Err(DotError::Incomplete("receiver"))
        ));
        assert!(matches!(
            Dot::builder()
                .receiver(Identity::from(&key(2)))
                .sign(&namespace),
            Err(DotError::Incomplete("kind"))
        ));
    }

    #[test]
    fn it_never_lets_permission_dots_consume() -> Result<()> {
        let (issuer, receiver) = (key(1), key(2));
        let dot = Dot::builder()
            .receiver(Identity::from(&receiver))
            .permission(BTreeMap::from([("role".to_owned(), "admin".to_owned())]))
            .comment("application permission")
            .sign(&issuer)?;

        assert!(!dot.is_access());
        assert!(!dot.can_consume());
        assert_eq!(dot.namespace(), None);
        assert_eq!(dot.comment(), Some("application permission"));
        Ok(())
    }
}
