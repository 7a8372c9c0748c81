use std::{fmt::Display, str::FromStr};

use crate::{ResourcePattern, UriError};

/// A resource identifier rooted at a namespace, e.g. `building.ns/floor/+/temp`.
///
/// The head segment names the namespace authority, either by a registered
/// alias or by the encoded [`Identity`](crate::Identity) of its key. The rest
/// is a [`ResourcePattern`] below that namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceUri {
    namespace: String,
    suffix: ResourcePattern,
}

impl ResourceUri {
    /// Join a namespace head and a pattern below it.
    pub fn new(namespace: impl Into<String>, suffix: ResourcePattern) -> Result<Self, UriError> {
        let namespace = namespace.into();
        if namespace.is_empty() {
            return Err(UriError::EmptyNamespace(format!("/{suffix}")));
        }
        Ok(Self { namespace, suffix })
    }

    /// The head segment naming the namespace authority.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Everything after the namespace segment.
    pub fn suffix(&self) -> &ResourcePattern {
        &self.suffix
    }

    /// The same namespace with a different pattern below it.
    pub fn with_suffix(&self, suffix: ResourcePattern) -> Self {
        Self {
            namespace: self.namespace.clone(),
            suffix,
        }
    }
}

impl FromStr for ResourceUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, suffix) = s
            .split_once('/')
            .ok_or_else(|| UriError::MissingSuffix(s.to_owned()))?;
        if namespace.is_empty() {
            return Err(UriError::EmptyNamespace(s.to_owned()));
        }
        if suffix.is_empty() {
            return Err(UriError::MissingSuffix(s.to_owned()));
        }
        Ok(Self {
            namespace: namespace.to_owned(),
            suffix: suffix.parse()?,
        })
    }
}

impl TryFrom<&str> for ResourceUri {
    type Error = UriError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Display for ResourceUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PatternError;
    use anyhow::Result;

    #[test]
    fn it_splits_namespace_from_suffix() -> Result<()> {
        let uri: ResourceUri = "scratch.ns/*/!meta/giles".parse()?;
        assert_eq!(uri.namespace(), "scratch.ns");
        assert_eq!(uri.suffix().to_string(), "*/!meta/giles");
        assert_eq!(uri.to_string(), "scratch.ns/*/!meta/giles");
        Ok(())
    }

    #[test]
    fn it_rejects_uris_without_a_resource() {
        assert_eq!(
            "scratch.ns".parse::<ResourceUri>(),
            Err(UriError::MissingSuffix("scratch.ns".into()))
        );
        assert_eq!(
            "scratch.ns/".parse::<ResourceUri>(),
            Err(UriError::MissingSuffix("scratch.ns/".into()))
        );
        assert_eq!(
            "/a/b".parse::<ResourceUri>(),
            Err(UriError::EmptyNamespace("/a/b".into()))
        );
        assert_eq!(
            "ns/a/*/b/*".parse::<ResourceUri>(),
            Err(UriError::Pattern(PatternError::MultipleWildcards))
        );
    }
}
