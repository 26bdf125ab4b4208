use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Bearer token required on every request when set (`CONTENT_API_TOKEN`).
    /// When unset the API accepts anonymous callers.
    pub api_token: Option<String>,
    /// Base directory for the file-backed stores (default: `store`).
    /// Content cards live under `<dir>/content`, draft boards under
    /// `<dir>/draft`.
    pub store_dir: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default   |
    /// |------------------------|-----------|
    /// | `HOST`                 | `0.0.0.0` |
    /// | `PORT`                 | `3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`      |
    /// | `CONTENT_API_TOKEN`    | unset     |
    /// | `STORE_DIR`            | `store`   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let api_token = std::env::var("CONTENT_API_TOKEN")
            .ok()
            .filter(|token| !token.is_empty());

        let store_dir = PathBuf::from(std::env::var("STORE_DIR").unwrap_or_else(|_| "store".into()));

        Self {
            host,
            port,
            request_timeout_secs,
            api_token,
            store_dir,
        }
    }

    /// Directory of the content card store.
    pub fn content_store_dir(&self) -> PathBuf {
        self.store_dir.join("content")
    }

    /// Directory of the draft board store.
    pub fn draft_store_dir(&self) -> PathBuf {
        self.store_dir.join("draft")
    }
}
