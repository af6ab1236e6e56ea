use crate::{env_optional, env_required};

pub(crate) const DEFAULT_PLATFORM_URL: &str = "http://demo.thingsboard.io";
pub(crate) const DEFAULT_PORT: u16 = 5000;

/// Connection settings for the telemetry platform and the one device this
/// service answers for. The secret doubles as password or pre-issued token;
/// the session decides which by length.
pub(crate) struct GatewayConfig {
    pub(crate) base_url: String,
    pub(crate) username: String,
    pub(crate) secret: String,
    pub(crate) device_id: String,
}

impl GatewayConfig {
    pub(crate) fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(GatewayConfig {
            base_url: env_optional("TB_URL").unwrap_or_else(|| DEFAULT_PLATFORM_URL.to_string()),
            username: env_required("TB_USER")?,
            secret: env_required("TB_PASSWORD")?,
            device_id: env_required("DEVICE_ID")?,
        })
    }
}

pub(crate) fn default_port() -> u16 {
    env_optional("PORT").and_then(|value| value.parse().ok()).unwrap_or(DEFAULT_PORT)
}
