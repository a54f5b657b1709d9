use serde::{Deserialize, Serialize};

/// Configuration for dereferencing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Maximum number of commit/tag hops before giving up (default: 64).
    pub max_hops: usize,
    /// Chunk size for copying the final payload (default: 64 KiB).
    pub copy_chunk_size: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_hops: 64,
            copy_chunk_size: 64 * 1024, // 64 KiB
        }
    }
}
