use anyhow::{Context, Result};
use std::{env, sync::OnceLock};

/// Application configuration loaded and validated at startup
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// UI server configuration
    pub ui: UiConfig,

    /// ACS (GenieACS northbound API) configuration
    pub acs: AcsConfig,

    /// Tenant identifier conventions
    pub tenant: TenantConfig,
}

#[derive(Clone, Debug)]
pub struct UiConfig {
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct AcsConfig {
    pub base_url: String,
}

#[derive(Clone, Debug)]
pub struct TenantConfig {
    /// Domain appended to PPPoE logins, e.g. "cliente" -> "cliente@fixanet.com"
    pub pppoe_domain: String,
    /// Suffix appended to the sanitized SSID base for the 2.4 GHz radio
    pub ssid_suffix_24g: String,
    /// Suffix appended to the sanitized SSID base for the 5 GHz radio
    pub ssid_suffix_5g: String,
}

impl AppConfig {
    /// Get or load the application configuration
    ///
    /// Returns a reference to the cached configuration. On first call, it loads
    /// and validates all configuration from environment variables. Subsequent
    /// calls return the cached instance.
    ///
    /// # Panics
    /// Panics if configuration loading fails. This is intentional as the
    /// application cannot function without valid configuration.
    pub fn get() -> &'static Self {
        static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();
        APP_CONFIG.get_or_init(|| {
            Self::load_internal().expect("failed to load application configuration")
        })
    }

    fn load_internal() -> Result<Self> {
        let ui = UiConfig::load()?;
        let acs = AcsConfig::load();
        let tenant = TenantConfig::load();

        Ok(Self { ui, acs, tenant })
    }
}

impl UiConfig {
    fn load() -> Result<Self> {
        let port = env::var("UI_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("failed to parse UI_PORT: invalid format")?;

        Ok(Self { port })
    }
}

impl AcsConfig {
    fn load() -> Self {
        // Trailing slashes are stripped so endpoint paths can be appended as-is.
        let base_url = env::var("ACS_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:7557".to_string())
            .trim_end_matches('/')
            .to_string();

        Self { base_url }
    }
}

impl TenantConfig {
    fn load() -> Self {
        let pppoe_domain = env::var("PPPOE_DOMAIN").unwrap_or_else(|_| "fixanet.com".to_string());
        let ssid_suffix_24g =
            env::var("SSID_SUFFIX_24G").unwrap_or_else(|_| "@FIXANET".to_string());
        let ssid_suffix_5g =
            env::var("SSID_SUFFIX_5G").unwrap_or_else(|_| "@FIXANET_5G".to_string());

        Self {
            pppoe_domain,
            ssid_suffix_24g,
            ssid_suffix_5g,
        }
    }
}
