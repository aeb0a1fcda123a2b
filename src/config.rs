//! Resolver configuration.
//!
//! Modeled on the teacher's `DnsConfig`: an explicit, validated struct with
//! `Duration` fields rather than a process-wide singleton (spec.md §9,
//! "Global state"). A [`ResolverConfig`] is an immutable snapshot handed to
//! each in-flight query; nothing here is mutated after construction.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{DnsError, Result};
use crate::tsig::TsigKey;

/// Default EDNS(0) UDP payload size advertised when a resolver has EDNS
/// enabled but no explicit size was configured. 1232 matches the
/// DNS-Flag-Day-2020 recommendation; callers targeting a LAN or a server
/// known to support jumbo UDP can raise it (4096 is the historical default).
pub const DEFAULT_EDNS_PAYLOAD_SIZE: u16 = 1232;

/// Non-EDNS UDP payload ceiling (RFC 1035).
pub const CLASSIC_UDP_PAYLOAD_SIZE: u16 = 512;

/// Immutable per-call resolver configuration.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Servers to query, tried in order until one answers.
    pub servers: Vec<SocketAddr>,

    /// Deadline for a single query attempt (one UDP round-trip or one TCP
    /// connect+exchange), before a retry is attempted.
    pub timeout: Duration,

    /// Number of retries after the first attempt before failing with
    /// [`DnsError::Timeout`].
    pub retries: u8,

    /// Whether to attach an EDNS(0) OPT record when the outgoing query
    /// doesn't already carry one.
    pub use_edns: bool,

    /// UDP payload size advertised in the OPT record.
    pub edns_payload_size: u16,

    /// Force every query over TCP, skipping the UDP attempt entirely.
    pub force_tcp: bool,

    /// If the UDP reply carries the TC (truncated) bit, retry the same
    /// query over TCP. When `false`, a truncated reply with no prior TCP
    /// attempt surfaces as [`DnsError::Truncated`] to the caller instead.
    pub tcp_on_truncation: bool,

    /// Optional TSIG key; when set, outgoing queries are signed and replies
    /// are verified against the request MAC.
    pub tsig_key: Option<TsigKey>,
}

impl ResolverConfig {
    /// Start building a config targeting a single server at its default
    /// port (53) unless a port is already present in `server`.
    pub fn new(server: SocketAddr) -> Self {
        Self {
            servers: vec![server],
            timeout: Duration::from_secs(5),
            retries: 2,
            use_edns: true,
            edns_payload_size: DEFAULT_EDNS_PAYLOAD_SIZE,
            force_tcp: false,
            tcp_on_truncation: true,
            tsig_key: None,
        }
    }

    pub fn with_servers(servers: Vec<SocketAddr>) -> Result<Self> {
        if servers.is_empty() {
            return Err(DnsError::illegal_argument(
                "resolver config requires at least one server",
            ));
        }
        let mut cfg = Self::new(servers[0]);
        cfg.servers = servers;
        Ok(cfg)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_tsig_key(mut self, key: TsigKey) -> Self {
        self.tsig_key = Some(key);
        self
    }

    pub fn force_tcp(mut self, force: bool) -> Self {
        self.force_tcp = force;
        self
    }

    pub fn without_edns(mut self) -> Self {
        self.use_edns = false;
        self
    }

    /// Load from a TOML document shaped like:
    ///
    /// ```toml
    /// servers = ["192.0.2.53:53"]
    /// timeout_ms = 3000
    /// retries = 2
    /// use_edns = true
    /// edns_payload_size = 1232
    /// force_tcp = false
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let raw: RawResolverConfig = toml::from_str(s)
            .map_err(|e| DnsError::illegal_argument(format!("invalid resolver config: {e}")))?;
        raw.into_config()
    }

    /// Load from a TOML file on disk, in the same shape as [`Self::from_toml_str`].
    pub async fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&contents)
    }
}

#[derive(Debug, serde::Deserialize)]
struct RawResolverConfig {
    servers: Vec<String>,
    timeout_ms: Option<u64>,
    retries: Option<u8>,
    use_edns: Option<bool>,
    edns_payload_size: Option<u16>,
    force_tcp: Option<bool>,
    tcp_on_truncation: Option<bool>,
}

impl RawResolverConfig {
    fn into_config(self) -> Result<ResolverConfig> {
        let mut servers = Vec::with_capacity(self.servers.len());
        for s in &self.servers {
            let addr: SocketAddr = s
                .parse()
                .map_err(|_| DnsError::illegal_argument(format!("invalid server address: {s}")))?;
            servers.push(addr);
        }
        let mut cfg = ResolverConfig::with_servers(servers)?;
        if let Some(ms) = self.timeout_ms {
            cfg.timeout = Duration::from_millis(ms);
        }
        if let Some(r) = self.retries {
            cfg.retries = r;
        }
        if let Some(v) = self.use_edns {
            cfg.use_edns = v;
        }
        if let Some(v) = self.edns_payload_size {
            cfg.edns_payload_size = v;
        }
        if let Some(v) = self.force_tcp {
            cfg.force_tcp = v;
        }
        if let Some(v) = self.tcp_on_truncation {
            cfg.tcp_on_truncation = v;
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_recommended_edns_size() {
        let cfg = ResolverConfig::new("192.0.2.1:53".parse().unwrap());
        assert_eq!(cfg.edns_payload_size, DEFAULT_EDNS_PAYLOAD_SIZE);
        assert!(cfg.use_edns);
        assert!(cfg.tcp_on_truncation);
    }

    #[test]
    fn empty_server_list_is_rejected() {
        assert!(ResolverConfig::with_servers(vec![]).is_err());
    }

    #[test]
    fn parses_from_toml() {
        let toml = r#"
            servers = ["192.0.2.53:53"]
            timeout_ms = 2500
            retries = 1
        "#;
        let cfg = ResolverConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.servers.len(), 1);
        assert_eq!(cfg.timeout, Duration::from_millis(2500));
        assert_eq!(cfg.retries, 1);
    }

    #[tokio::test]
    async fn loads_from_a_toml_file_on_disk() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"servers = ["192.0.2.53:53"]"#).unwrap();
        writeln!(file, "retries = 3").unwrap();

        let cfg = ResolverConfig::from_toml_file(file.path()).await.unwrap();
        assert_eq!(cfg.retries, 3);
    }
}
