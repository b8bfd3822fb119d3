use std::fmt;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MINA_URL: &str = "https://api2.mina.mi.com";
pub const DEFAULT_CONVERSATION_URL: &str =
    "https://userprofile.mina.mi.com/device_profile/v2/conversation?source=dialogu";
pub const DEFAULT_SPEC_URL: &str = "https://miot-spec.org";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Everything the bridge needs, read once at startup and passed down.
#[derive(Clone)]
pub struct Config {
    pub account_user: String,
    pub account_pass: String,
    pub token_file_path: PathBuf,
    /// Cookie `deviceId`. Falls back to the token file's own `deviceId` when unset.
    pub device_id: Option<String>,
    pub hardware_model: Option<String>,
    /// Speaker targeted by `/say`, `/command` and `/last_ask` when the request names none.
    pub default_device_id: Option<String>,
    pub bind_addr: String,
    pub mina_base_url: String,
    pub conversation_url: String,
    pub spec_base_url: String,
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| {
            get(key).ok_or_else(|| Error::Config(format!("{key} is not set")))
        };

        let account_user = require("MI_USER")?;
        let account_pass = require("MI_PASS")?;

        let token_file_path = match get("MI_TOKEN_PATH") {
            Some(path) => PathBuf::from(path),
            None => default_token_path()?,
        };

        let request_timeout_secs = match get("MIBRIDGE_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("MIBRIDGE_TIMEOUT_SECS is not a number: {raw}"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            account_user,
            account_pass,
            token_file_path,
            device_id: get("MI_DEVICE_ID"),
            hardware_model: get("MI_HARDWARE"),
            default_device_id: get("MI_DID"),
            bind_addr: get("MIBRIDGE_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            mina_base_url: get("MIBRIDGE_MINA_URL").unwrap_or_else(|| DEFAULT_MINA_URL.to_string()),
            conversation_url: get("MIBRIDGE_CONVERSATION_URL")
                .unwrap_or_else(|| DEFAULT_CONVERSATION_URL.to_string()),
            spec_base_url: get("MIBRIDGE_SPEC_URL").unwrap_or_else(|| DEFAULT_SPEC_URL.to_string()),
            request_timeout_secs,
        })
    }

    pub fn default_device(&self) -> Result<&str> {
        self.default_device_id
            .as_deref()
            .ok_or_else(|| Error::Config("MI_DID is not set and the request named no device".to_string()))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("account_user", &self.account_user)
            .field("account_pass", &"***")
            .field("token_file_path", &self.token_file_path)
            .field("device_id", &self.device_id)
            .field("hardware_model", &self.hardware_model)
            .field("default_device_id", &self.default_device_id)
            .field("bind_addr", &self.bind_addr)
            .field("mina_base_url", &self.mina_base_url)
            .field("conversation_url", &self.conversation_url)
            .field("spec_base_url", &self.spec_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_token_path() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| Error::Config("Could not find home directory".to_string()))?;
    Ok(home.join(".mi.token"))
}
