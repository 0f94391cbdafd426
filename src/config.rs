//! Configuration types for conference sessions

use serde::{Deserialize, Serialize};

/// Main configuration for a signalling context and its media sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomlinkConfig {
    /// WebSocket signalling server URL (ws:// or wss://)
    pub signalling_url: String,

    /// XMPP service domain of the conference deployment
    pub xmpp_domain: String,

    /// Skip TLS certificate verification on the signalling transport
    /// (development deployments only)
    pub tls_insecure: bool,

    /// STUN server URLs used by media sessions (at least one required)
    pub stun_servers: Vec<String>,
}

impl Default for RoomlinkConfig {
    fn default() -> Self {
        Self {
            signalling_url: "wss://localhost:8443/xmpp-websocket".to_string(),
            xmpp_domain: "meet.example.com".to_string(),
            tls_insecure: false,
            stun_servers: vec!["stun:stun.l.google.com:19302".to_string()],
        }
    }
}

impl RoomlinkConfig {
    /// Validate configuration parameters
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `signalling_url` is not a valid WebSocket URL
    /// - `xmpp_domain` is empty
    /// - `stun_servers` is empty
    pub fn validate(&self) -> crate::Result<()> {
        use crate::Error;

        if !self.signalling_url.starts_with("ws://") && !self.signalling_url.starts_with("wss://") {
            return Err(Error::InvalidConfig(format!(
                "signalling_url must start with ws:// or wss://, got {}",
                self.signalling_url
            )));
        }

        if self.xmpp_domain.is_empty() {
            return Err(Error::InvalidConfig(
                "xmpp_domain must not be empty".to_string(),
            ));
        }

        if self.stun_servers.is_empty() {
            return Err(Error::InvalidConfig(
                "At least one STUN server is required".to_string(),
            ));
        }

        Ok(())
    }
}
