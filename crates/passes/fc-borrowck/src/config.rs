//! Borrow checker settings

use fc_region::RegionConfig;
use serde::{Deserialize, Serialize};

/// Borrow checker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorrowckConfig {
    /// Region inference settings
    pub region: RegionConfig,

    /// Report reads of places under a live mutable loan
    pub check_reads: bool,

    /// Stop reporting after this many errors
    pub max_errors: Option<usize>,
}

impl Default for BorrowckConfig {
    fn default() -> Self {
        Self {
            region: RegionConfig::default(),
            check_reads: true,
            max_errors: None,
        }
    }
}
