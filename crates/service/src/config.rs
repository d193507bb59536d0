use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use url::Url;

#[derive(Debug)]
pub struct Config {
    // http server configuration
    /// address for the API server to listen on.
    ///  if not set then 0.0.0.0:8080 will be used
    pub api_listen_addr: Option<SocketAddr>,
    /// externally visible base URL used to build share links,
    ///  e.g. http://localhost:8080
    pub public_url: Url,

    // data store configuration
    /// a path to a sqlite database, if not set then an
    ///  in-memory database will be used
    pub sqlite_path: Option<PathBuf>,
    /// the root directory for encrypted blobs, if not set
    ///  then an in-memory store will be used
    pub uploads_path: Option<PathBuf>,

    // secrets, resolved at startup and never embedded in source
    /// hex-encoded 32-byte master encryption key; if not set a
    ///  random key is generated (previously stored blobs become
    ///  unreadable across restarts, dev use only)
    pub master_key_hex: Option<String>,
    /// keyring id new blobs are tagged with
    pub master_key_id: String,
    /// secret used to verify bearer tokens; if not set a random
    ///  secret is generated (tokens do not survive restarts)
    pub token_secret: Option<String>,

    // cache + admission configuration
    /// how long metadata-derived cache entries (locators, search
    ///  results, share links) stay valid
    pub metadata_ttl: Duration,
    /// requests allowed per user per window
    pub rate_limit_ceiling: u64,
    /// fixed rate-limit window length
    pub rate_limit_window: Duration,

    // retention configuration
    /// files older than this are removed by the expiry worker
    pub retention: Duration,
    /// how often the expiry worker sweeps
    pub sweep_interval: Duration,

    // misc
    pub log_level: tracing::Level,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_listen_addr: Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 8080)),
            public_url: Url::parse("http://localhost:8080").expect("static url"),
            sqlite_path: None,
            uploads_path: None,
            master_key_hex: None,
            master_key_id: "v1".to_string(),
            token_secret: None,
            metadata_ttl: Duration::from_secs(10 * 60),
            rate_limit_ceiling: 100,
            rate_limit_window: Duration::from_secs(60),
            retention: Duration::from_secs(24 * 60 * 60),
            sweep_interval: Duration::from_secs(60 * 60),
            log_level: tracing::Level::INFO,
        }
    }
}
