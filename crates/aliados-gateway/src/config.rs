//! # Merchant Configuration
//!
//! Where the gateway lives, where the session is stored, and how the
//! scanner finds its cameras.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     ALIADOS_REDEEM_URL=https://...                                     │
//! │     ALIADOS_BUSINESS_ID=42                                             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/merchant/merchant.toml (Linux)                           │
//! │     ~/Library/Application Support/com.aliados.merchant/ (macOS)        │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # merchant.toml
//! [gateway]
//! offers_url = "https://offers.example/"
//! redeem_url = "https://redeem.example/"
//! register_url = "https://portal.example/api/merchant/register-card"
//! timeout_secs = 15
//!
//! [session]
//! path = "/home/me/.local/share/merchant/session.json"
//!
//! [scanner]
//! origin = "https://portal.example"
//! camera_root = "/home/me/cameras"
//! frame_interval_ms = 200
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{GatewayError, GatewayResult};

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "aliados";
const APPLICATION: &str = "merchant";

// =============================================================================
// Gateway Settings
// =============================================================================

/// Endpoints of the serverless gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// `listActiveOffers` (GET, `?action=getActiveOffers&id_negocio=`).
    #[serde(default = "default_offers_url")]
    pub offers_url: String,

    /// `redeemOffer` (POST, `?action=redeemOffer`).
    #[serde(default = "default_redeem_url")]
    pub redeem_url: String,

    /// `registerCard` (POST).
    #[serde(default = "default_register_url")]
    pub register_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_offers_url() -> String {
    "http://localhost:8080/offers".to_string()
}

fn default_redeem_url() -> String {
    "http://localhost:8080/redeem".to_string()
}

fn default_register_url() -> String {
    "http://localhost:8080/api/merchant/register-card".to_string()
}

fn default_timeout() -> u64 {
    15
}

impl Default for GatewaySettings {
    fn default() -> Self {
        GatewaySettings {
            offers_url: default_offers_url(),
            redeem_url: default_redeem_url(),
            register_url: default_register_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl GatewaySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Session Settings
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Session file. Defaults to `session.json` in the data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Fixed business id, bypassing the session file. Env only.
    #[serde(skip)]
    pub business_id: Option<String>,
}

// =============================================================================
// Scanner Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerSettings {
    /// Origin the portal is served from (secure-context check).
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Folder whose subfolders are cameras. Defaults to `cameras/` in the
    /// data directory.
    #[serde(default)]
    pub camera_root: Option<PathBuf>,

    /// Pause between frames of a folder camera (milliseconds).
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,
}

fn default_origin() -> String {
    "http://localhost".to_string()
}

fn default_frame_interval() -> u64 {
    200
}

impl Default for ScannerSettings {
    fn default() -> Self {
        ScannerSettings {
            origin: default_origin(),
            camera_root: None,
            frame_interval_ms: default_frame_interval(),
        }
    }
}

impl ScannerSettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

// =============================================================================
// App Config
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub gateway: GatewaySettings,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub scanner: ScannerSettings,
}

impl AppConfig {
    /// Loads configuration from file (if present), applies environment
    /// overrides, and validates.
    pub fn load(config_path: Option<PathBuf>) -> GatewayResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading merchant config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| GatewayError::ConfigLoadFailed(e.to_string()))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Like [`AppConfig::load`], falling back to defaults on any error.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load merchant config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> GatewayResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| GatewayError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GatewayError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| GatewayError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Merchant config saved");
        Ok(())
    }

    pub fn validate(&self) -> GatewayResult<()> {
        for (name, value) in [
            ("offers_url", &self.gateway.offers_url),
            ("redeem_url", &self.gateway.redeem_url),
            ("register_url", &self.gateway.register_url),
        ] {
            let url = url::Url::parse(value)
                .map_err(|e| GatewayError::InvalidUrl(format!("{}: {} ({})", name, value, e)))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(GatewayError::InvalidUrl(format!(
                    "{} must start with http:// or https://, got: {}",
                    name, value
                )));
            }
        }

        if self.gateway.timeout_secs == 0 {
            return Err(GatewayError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.scanner.frame_interval_ms == 0 {
            return Err(GatewayError::InvalidConfig(
                "frame_interval_ms must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `ALIADOS_*` overrides looked up through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("ALIADOS_OFFERS_URL") {
            debug!(url = %url, "Overriding offers URL from environment");
            self.gateway.offers_url = url;
        }

        if let Some(url) = lookup("ALIADOS_REDEEM_URL") {
            debug!(url = %url, "Overriding redeem URL from environment");
            self.gateway.redeem_url = url;
        }

        if let Some(url) = lookup("ALIADOS_REGISTER_URL") {
            debug!(url = %url, "Overriding register URL from environment");
            self.gateway.register_url = url;
        }

        if let Some(secs) = lookup("ALIADOS_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.gateway.timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid ALIADOS_TIMEOUT_SECS"),
            }
        }

        if let Some(path) = lookup("ALIADOS_SESSION_PATH") {
            self.session.path = Some(PathBuf::from(path));
        }

        if let Some(id) = lookup("ALIADOS_BUSINESS_ID") {
            debug!("Using business id from environment");
            self.session.business_id = Some(id);
        }

        if let Some(origin) = lookup("ALIADOS_ORIGIN") {
            self.scanner.origin = origin;
        }

        if let Some(root) = lookup("ALIADOS_CAMERA_ROOT") {
            self.scanner.camera_root = Some(PathBuf::from(root));
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("merchant.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Resolved session file path.
    pub fn session_path(&self) -> Option<PathBuf> {
        self.session
            .path
            .clone()
            .or_else(|| Self::project_dirs().map(|d| d.data_dir().join("session.json")))
    }

    /// Resolved camera root folder.
    pub fn camera_root(&self) -> Option<PathBuf> {
        self.scanner
            .camera_root
            .clone()
            .or_else(|| Self::project_dirs().map(|d| d.data_dir().join("cameras")))
    }
}
