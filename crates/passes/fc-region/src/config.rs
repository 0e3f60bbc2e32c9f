//! Region inference settings

use serde::{Deserialize, Serialize};

/// How loan membership of subset-graph nodes is computed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReachabilityMode {
    /// Condense the graph into strongly connected components and propagate
    /// loan sets along the resulting DAG
    #[default]
    Scc,
    /// Breadth-first search from every loan source
    Direct,
}

/// Region inference configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Reachability strategy
    pub reachability: ReachabilityMode,

    /// Relate the outer origins of `&mut` references by equality. When off,
    /// `&'a mut T <: &'b mut T` only requires `'a ⊆ 'b`; the referent stays
    /// invariant either way.
    pub invariant_mut_origins: bool,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            reachability: ReachabilityMode::default(),
            invariant_mut_origins: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_table_is_empty() {
        let config: RegionConfig = toml::from_str("").unwrap();
        assert_eq!(config, RegionConfig::default());
        assert_eq!(config.reachability, ReachabilityMode::Scc);
        assert!(config.invariant_mut_origins);
    }

    #[test]
    fn test_parse_direct_mode() {
        let config: RegionConfig =
            toml::from_str("reachability = \"direct\"\ninvariant_mut_origins = false").unwrap();
        assert_eq!(config.reachability, ReachabilityMode::Direct);
        assert!(!config.invariant_mut_origins);
    }
}
