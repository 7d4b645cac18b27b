use crate::assets::MaterializerSettings;
use crate::collector::CollectorSettings;
use crate::fallback::{FOLLOWERS_QUERY_HASH, FOLLOWING_QUERY_HASH};
use crate::http::FetchSettings;

pub const DEFAULT_BASE_URL: &str = "https://www.instagram.com/";

/// Where and how the list endpoints are addressed.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Service root every endpoint is resolved against.
    pub base_url: String,
    /// Entries requested per page on both transports.
    pub page_size: u32,
    pub followers_query_hash: String,
    pub following_query_hash: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 50,
            followers_query_hash: FOLLOWERS_QUERY_HASH.to_string(),
            following_query_hash: FOLLOWING_QUERY_HASH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub endpoints: Endpoints,
    pub fetch: FetchSettings,
    pub collector: CollectorSettings,
    pub materializer: MaterializerSettings,
}

impl EngineConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            endpoints: Endpoints {
                base_url: base_url.into(),
                ..Endpoints::default()
            },
            ..Self::default()
        }
    }
}
