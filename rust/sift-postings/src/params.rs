//! Segment-level postings parameters.

use serde::{Deserialize, Serialize};
use sift_common::{Result, verify_arg};

/// Default number of documents between two level-0 skip points.
pub const DEFAULT_SKIP_INTERVAL: u32 = 16;

/// Default cap on the number of skip levels.
pub const DEFAULT_MAX_SKIP_LEVELS: u32 = 10;

/// Parameters shared by every term written into one segment.
///
/// All fields have defaults, so a partial configuration (e.g. only
/// `{"skip_interval": 32}`) deserializes into a complete parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostingsParams {
    /// Number of documents between two consecutive level-0 skip points.
    /// Level `k` receives a point every `skip_interval^(k+1)` documents.
    pub skip_interval: u32,

    /// Upper bound on the number of skip levels.
    pub max_skip_levels: u32,

    /// Minimum document frequency for a term to carry skip data.
    /// Defaults to `skip_interval` when not set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_minimum: Option<u32>,

    /// Total number of documents in the segment. Every document ID must be
    /// strictly smaller than this value.
    pub total_docs: u32,
}

impl PostingsParams {
    pub fn with_total_docs(total_docs: u32) -> PostingsParams {
        PostingsParams {
            total_docs,
            ..Default::default()
        }
    }

    pub fn with_skip_interval(mut self, skip_interval: u32) -> PostingsParams {
        self.skip_interval = skip_interval;
        self
    }

    pub fn with_skip_minimum(mut self, skip_minimum: u32) -> PostingsParams {
        self.skip_minimum = Some(skip_minimum);
        self
    }

    pub fn with_max_skip_levels(mut self, max_skip_levels: u32) -> PostingsParams {
        self.max_skip_levels = max_skip_levels;
        self
    }

    /// Effective skip minimum.
    pub fn skip_minimum(&self) -> u32 {
        self.skip_minimum.unwrap_or(self.skip_interval)
    }

    pub fn validate(&self) -> Result<()> {
        verify_arg!(skip_interval, self.skip_interval >= 2);
        verify_arg!(max_skip_levels, self.max_skip_levels >= 1);
        verify_arg!(skip_minimum, self.skip_minimum() >= 1);
        Ok(())
    }
}

impl Default for PostingsParams {
    fn default() -> PostingsParams {
        PostingsParams {
            skip_interval: DEFAULT_SKIP_INTERVAL,
            max_skip_levels: DEFAULT_MAX_SKIP_LEVELS,
            skip_minimum: None,
            total_docs: u32::MAX,
        }
    }
}
