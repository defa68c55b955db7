use tracing_subscriber::EnvFilter;

/// Application-level constants
pub const APP_NAME: &str = "LeaseGuard";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default completion endpoint (OpenAI-compatible chat API).
pub const DEFAULT_BASE_URL: &str = "https://api.together.xyz/v1";
/// Default text model for extraction and evaluation calls.
pub const DEFAULT_CHAT_MODEL: &str = "meta-llama/Llama-4-Maverick-17B-128E-Instruct-FP8";
/// Default vision-capable model for photo comparison and report drafting.
pub const DEFAULT_VISION_MODEL: &str = "meta-llama/Llama-4-Maverick-17B-128E-Instruct-FP8";

/// Default HTTP timeout for completion calls, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    "leaseguard=info,reqwest=warn".to_string()
}

/// Initialize tracing for binaries and integration harnesses.
///
/// Call once at startup. Honors RUST_LOG, falls back to
/// [`default_log_filter`].
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_filter())),
        )
        .init();
}

/// Connection settings for the model gateway.
///
/// A missing API key is not an error: the gateway answers from its offline
/// rubric instead of making wire calls (see `gateway::fallback`).
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub vision_model: String,
    pub timeout_secs: u64,
}

impl GatewayConfig {
    /// Read configuration from the environment.
    ///
    /// `LEASEGUARD_API_KEY`, `LEASEGUARD_BASE_URL`, `LEASEGUARD_CHAT_MODEL`
    /// and `LEASEGUARD_VISION_MODEL` override the defaults.
    pub fn from_env() -> Self {
        let api_key = std::env::var("LEASEGUARD_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self {
            api_key,
            base_url: env_or("LEASEGUARD_BASE_URL", DEFAULT_BASE_URL),
            chat_model: env_or("LEASEGUARD_CHAT_MODEL", DEFAULT_CHAT_MODEL),
            vision_model: env_or("LEASEGUARD_VISION_MODEL", DEFAULT_VISION_MODEL),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// A configuration with no credential; every call resolves offline.
    pub fn offline() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
