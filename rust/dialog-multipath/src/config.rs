use serde::{Deserialize, Serialize};

use crate::Elaboration;

/// Tuning for discovery and aggregation.
///
/// Every field has a default, so a partial document (or none at all) is a
/// valid configuration:
///
/// ```
/// use dialog_multipath::MultipathConfig;
///
/// let config: MultipathConfig = serde_json::from_str(r#"{ "buffer": 64 }"#).unwrap();
/// assert_eq!(config.buffer, 64);
/// assert_eq!(config.max_depth, MultipathConfig::default().max_depth);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultipathConfig {
    /// Capacity of the aggregate stream. Producers wait when it is full.
    pub buffer: usize,
    /// Longest delegation chain, in hops, that discovery will follow.
    pub max_depth: usize,
    /// How much of the routing chain streams attach to each message.
    pub elaboration: Elaboration,
}

impl Default for MultipathConfig {
    fn default() -> Self {
        Self {
            buffer: 10,
            max_depth: 16,
            elaboration: Elaboration::Partial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn it_fills_in_missing_fields() -> Result<()> {
        let config: MultipathConfig = serde_json::from_str("{}")?;
        assert_eq!(config, MultipathConfig::default());

        let config: MultipathConfig =
            serde_json::from_str(r#"{ "max_depth": 4, "elaboration": "full" }"#)?;
        assert_eq!(config.buffer, 10);
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.elaboration, Elaboration::Full);
        Ok(())
    }
}
