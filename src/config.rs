use std::env;

/// Connection settings for one WebUI backend instance.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub submit_timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            base_url: None,
            request_timeout_secs: None,
            submit_timeout_secs: None,
        }
    }
}

impl BackendConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let base_url = env::var("OUTPAINT_BASE_URL").ok();
        let request_timeout_secs = env::var("OUTPAINT_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok());
        let submit_timeout_secs = env::var("OUTPAINT_SUBMIT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok());

        BackendConfig {
            base_url,
            request_timeout_secs,
            submit_timeout_secs,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    pub fn with_submit_timeout(mut self, secs: u64) -> Self {
        self.submit_timeout_secs = Some(secs);
        self
    }
}

/// Top-level configuration for an orchestrator and its backend client.
/// Unset fields fall back to their defaults at the point of use.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Option<BackendConfig>,
    pub canvas_size: Option<u32>,
    pub poll_interval_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend: None,
            canvas_size: None,
            poll_interval_ms: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let canvas_size = env::var("OUTPAINT_CANVAS_SIZE")
            .ok()
            .and_then(|s| s.parse().ok());
        let poll_interval_ms = env::var("OUTPAINT_POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok());

        Config {
            backend: Some(BackendConfig::from_env()),
            canvas_size,
            poll_interval_ms,
        }
    }

    pub fn with_backend(mut self, config: BackendConfig) -> Self {
        self.backend = Some(config);
        self
    }

    pub fn with_canvas_size(mut self, canvas_size: u32) -> Self {
        self.canvas_size = Some(canvas_size);
        self
    }

    pub fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = Some(poll_interval_ms);
        self
    }
}
