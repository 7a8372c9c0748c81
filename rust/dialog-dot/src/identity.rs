use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

use base64::{Engine, engine::general_purpose::URL_SAFE};
use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Serialize, Serializer};

use crate::DotError;

/// The size of an identity in bytes.
pub const IDENTITY_LENGTH: usize = 32;

/// A principal in the delegation graph: a namespace authority, an
/// intermediary, or an end caller.
///
/// An [`Identity`] is the raw Ed25519 verifying key of the principal. Its
/// canonical text form is URL-safe base64, which never contains `/` and so
/// can stand as the head segment of a [`ResourceUri`](crate::ResourceUri).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Identity([u8; IDENTITY_LENGTH]);

impl Identity {
    /// Wrap raw key bytes without checking that they are a curve point.
    pub const fn from_bytes(bytes: [u8; IDENTITY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; IDENTITY_LENGTH] {
        &self.0
    }

    /// Decode into a key that can verify signatures.
    pub fn verifying_key(&self) -> Result<VerifyingKey, DotError> {
        VerifyingKey::from_bytes(&self.0)
            .map_err(|error| DotError::InvalidIdentity(format!("{self}: {error}")))
    }
}

impl From<&VerifyingKey> for Identity {
    fn from(key: &VerifyingKey) -> Self {
        Self(key.to_bytes())
    }
}

impl From<&SigningKey> for Identity {
    fn from(key: &SigningKey) -> Self {
        Self::from(&key.verifying_key())
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", URL_SAFE.encode(self.0))
    }
}

impl Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Identity").field(&self.to_string()).finish()
    }
}

impl FromStr for Identity {
    type Err = DotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = URL_SAFE
            .decode(s)
            .map_err(|error| DotError::InvalidIdentity(format!("{s}: {error}")))?;
        let bytes: [u8; IDENTITY_LENGTH] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            DotError::InvalidIdentity(format!(
                "{s}: expected {IDENTITY_LENGTH} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for Identity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}
