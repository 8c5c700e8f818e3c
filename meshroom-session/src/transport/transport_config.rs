use meshroom_core::IceServerConfig;
use meshroom_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};

/// ICE configuration for peer transports.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl TransportConfig {
    pub fn with_stun_servers<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ice_servers: urls.into_iter().map(IceServerConfig::stun).collect(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::with_stun_servers([DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2])
    }
}
