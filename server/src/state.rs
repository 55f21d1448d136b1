use std::sync::Arc;

use bays::{FreshnessCache, SyncGateway};

use super::config::Config;

pub struct State {
    pub config: Config,
    pub cache: FreshnessCache,
    pub gateway: SyncGateway,
}

impl State {
    pub fn new() -> Arc<Self> {
        let config = Config::load();

        let gateway = SyncGateway::new(
            config.upstream_url.clone(),
            config.page_limit,
            config.fetch_timeout,
        );
        let cache = FreshnessCache::new(config.cache_ttl);

        Arc::new(Self {
            config,
            cache,
            gateway,
        })
    }
}
