use std::{fmt::Display, str::FromStr};

use serde::{Serialize, Serializer};

use crate::DotError;

/// The operations an access grant permits on its resource pattern.
///
/// Written in compact form as a string of flags: `C` consume, `P` publish,
/// `L` list, `T` tap. Order does not matter; `"PC"` equals `"CP"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PermissionSet {
    /// Receive messages (subscribe and query).
    pub consume: bool,
    /// Send messages.
    pub publish: bool,
    /// List the resources below a pattern.
    pub list: bool,
    /// Observe traffic without consuming it.
    pub tap: bool,
}

impl PermissionSet {
    /// A set that only permits consuming.
    pub const fn consume() -> Self {
        Self {
            consume: true,
            publish: false,
            list: false,
            tap: false,
        }
    }

    /// The operations permitted by both sets.
    pub fn intersect(&self, other: &PermissionSet) -> PermissionSet {
        PermissionSet {
            consume: self.consume && other.consume,
            publish: self.publish && other.publish,
            list: self.list && other.list,
            tap: self.tap && other.tap,
        }
    }
}

impl FromStr for PermissionSet {
    type Err = DotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut permissions = PermissionSet::default();
        for flag in s.chars() {
            match flag {
                'C' => permissions.consume = true,
                'P' => permissions.publish = true,
                'L' => permissions.list = true,
                'T' => permissions.tap = true,
                other => return Err(DotError::InvalidPermission(other)),
            }
        }
        Ok(permissions)
    }
}

impl Display for PermissionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (set, flag) in [
            (self.consume, 'C'),
            (self.publish, 'P'),
            (self.list, 'L'),
            (self.tap, 'T'),
        ] {
            if set {
                write!(f, "{flag}")?;
            }
        }
        Ok(())
    }
}

impl Serialize for PermissionSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn it_parses_compact_flags() -> Result<()> {
        let permissions: PermissionSet = "PC".parse()?;
        assert!(permissions.consume);
        assert!(permissions.publish);
        assert!(!permissions.list);
        assert_eq!(permissions.to_string(), "CP");
        Ok(())
    }

    #[test]
    fn it_rejects_unknown_flags() {
        assert!(matches!(
            "CX".parse::<PermissionSet>(),
            Err(DotError::InvalidPermission('X'))
        ));
    }

    #[test]
    fn it_intersects_permission_sets() -> Result<()> {
        let a: PermissionSet = "CPL".parse()?;
        let b: PermissionSet = "CT".parse()?;
        assert_eq!(a.intersect(&b), PermissionSet::consume());
        Ok(())
    }
}
