use std::env;

use crate::query::PageSizes;

#[derive(Clone, Debug)]
pub struct Config {
    pub backend_url: String,
    pub bind_addr: String,
    pub backend_timeout_secs: u64,
    pub page_sizes: PageSizes,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend_url = env::var("BACKEND_URL")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let backend_timeout_secs = positive_var("BACKEND_TIMEOUT_SECS").unwrap_or(15);

        let page_sizes = PageSizes::new(
            positive_var("PAGE_SIZE_DEFAULT").unwrap_or(PageSizes::DEFAULT_LIMIT as u64) as u32,
            positive_var("PAGE_SIZE_MAX").unwrap_or(PageSizes::MAX_LIMIT as u64) as u32,
        );

        Ok(Self {
            backend_url,
            bind_addr,
            backend_timeout_secs,
            page_sizes,
        })
    }
}

/// Unset, unparsable and zero values all read as "not configured".
fn positive_var(key: &str) -> Option<u64> {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|v| *v > 0 && *v <= u32::MAX as u64)
}
