//! Client metadata captured alongside audit records.

use serde::{Deserialize, Serialize};

/// Request-level metadata about the client that issued an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetadata {
    /// Remote IP address, if known.
    pub ip_address: Option<String>,
    /// User agent header, if known.
    pub user_agent: Option<String>,
}

impl ClientMetadata {
    /// Set the IP address.
    pub fn with_ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }
}
