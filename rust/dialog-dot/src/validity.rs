/// How a certificate source classifies a certificate it hands out.
///
/// Only [`Validity::Valid`] certificates may extend a delegation chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Validity {
    /// Signed, unexpired, and not revoked.
    Valid,
    /// Past its expiry.
    Expired,
    /// Revoked by its issuer.
    Revoked,
    /// Could not be decoded or fails structural checks.
    Malformed,
    /// The source could not determine a state.
    Unknown,
}

impl Validity {
    /// Whether the certificate is eligible for chain building.
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }
}
