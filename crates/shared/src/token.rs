//! Persisted login token and the cookie set derived from it.
//!
//! The token file is written by an external login flow (usually `~/.mi.token`).
//! Only the fields the speaker service needs are read; everything else is ignored.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};

/// Index of the speaker service token inside the `micoapi` pair (`[ssecurity, serviceToken]`).
const SERVICE_TOKEN_INDEX: usize = 1;

#[derive(Deserialize, Clone, Debug)]
pub struct AuthToken {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub micoapi: Vec<String>,
    #[serde(rename = "deviceId", default)]
    pub device_id: Option<String>,
}

impl AuthToken {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read token file {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Invalid token file {}: {}", path.display(), e))
        })
    }

    pub fn service_token(&self) -> Result<&str> {
        self.micoapi
            .get(SERVICE_TOKEN_INDEX)
            .map(String::as_str)
            .ok_or_else(|| Error::Config("Token file has no micoapi service token".to_string()))
    }
}

/// Identity cookies attached to every speaker-service request.
///
/// Built once and never mutated; rebuild it (restart) when the token file changes.
#[derive(Clone, PartialEq, Eq)]
pub struct CookieSet {
    pub device_id: String,
    pub service_token: String,
    pub user_id: String,
}

impl CookieSet {
    pub fn from_token(token: &AuthToken, device_id: &str) -> Result<Self> {
        Ok(Self {
            device_id: device_id.to_string(),
            service_token: token.service_token()?.to_string(),
            user_id: token.user_id.clone(),
        })
    }

    /// Derive cookies using the configured device id, or the token's own one when unset.
    pub fn from_config(config: &Config) -> Result<Self> {
        let token = AuthToken::load(&config.token_file_path)?;

        let device_id = config
            .device_id
            .as_deref()
            .or(token.device_id.as_deref())
            .ok_or_else(|| {
                Error::Config("MI_DEVICE_ID is not set and the token file has no deviceId".to_string())
            })?
            .to_string();

        debug!(user_id = %token.user_id, device_id = %device_id, "Derived cookie set");
        Self::from_token(&token, &device_id)
    }

    /// Copy of this set whose `deviceId` cookie names `device_id`.
    pub fn for_device(&self, device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            ..self.clone()
        }
    }

    /// `Cookie` header value, `deviceId=..; serviceToken=..; userId=..`.
    pub fn header_value(&self) -> String {
        format!(
            "deviceId={}; serviceToken={}; userId={}",
            self.device_id, self.service_token, self.user_id
        )
    }

    pub fn entries(&self) -> [(&'static str, &str); 3] {
        [
            ("deviceId", self.device_id.as_str()),
            ("serviceToken", self.service_token.as_str()),
            ("userId", self.user_id.as_str()),
        ]
    }
}

impl fmt::Debug for CookieSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieSet")
            .field("device_id", &self.device_id)
            .field("service_token", &"***")
            .field("user_id", &self.user_id)
            .finish()
    }
}

pub fn derive_cookies(token_file_path: &Path, device_id: &str) -> Result<CookieSet> {
    let token = AuthToken::load(token_file_path)?;
    CookieSet::from_token(&token, device_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn token_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_derive_cookies_exact() {
        let file = token_file(r#"{"userId": "U1", "micoapi": ["ssecurity", "T1"], "passToken": "p"}"#);
        let cookies = derive_cookies(file.path(), "D1").unwrap();

        let entries: HashMap<_, _> = cookies.entries().into_iter().collect();
        let expected: HashMap<_, _> = [("deviceId", "D1"), ("serviceToken", "T1"), ("userId", "U1")]
            .into_iter()
            .collect();
        assert_eq!(entries, expected);
    }

    #[test]
    fn test_header_value() {
        let file = token_file(r#"{"userId": "42", "micoapi": ["s", "tok"]}"#);
        let cookies = derive_cookies(file.path(), "ABC").unwrap();
        assert_eq!(cookies.header_value(), "deviceId=ABC; serviceToken=tok; userId=42");
    }

    #[test]
    fn test_for_device_swaps_only_device_id() {
        let file = token_file(r#"{"userId": "42", "micoapi": ["s", "tok"]}"#);
        let cookies = derive_cookies(file.path(), "CONFIGURED").unwrap();
        let speaker = cookies.for_device("SPEAKER");

        assert_eq!(speaker.header_value(), "deviceId=SPEAKER; serviceToken=tok; userId=42");
        assert_eq!(cookies.device_id, "CONFIGURED");
    }

    #[test]
    fn test_missing_fields() {
        let no_micoapi = token_file(r#"{"userId": "U1"}"#);
        assert!(matches!(derive_cookies(no_micoapi.path(), "D1"), Err(Error::Config(_))));

        let no_user = token_file(r#"{"micoapi": ["s", "T1"]}"#);
        assert!(matches!(derive_cookies(no_user.path(), "D1"), Err(Error::Config(_))));

        let short_micoapi = token_file(r#"{"userId": "U1", "micoapi": ["s"]}"#);
        assert!(matches!(derive_cookies(short_micoapi.path(), "D1"), Err(Error::Config(_))));
    }

    #[test]
    fn test_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.token");
        assert!(matches!(derive_cookies(&missing, "D1"), Err(Error::Config(_))));

        let garbage = token_file("not json at all");
        assert!(matches!(derive_cookies(garbage.path(), "D1"), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_config_falls_back_to_token_device() {
        let file = token_file(r#"{"userId": "U1", "micoapi": ["s", "T1"], "deviceId": "TOKENDEV"}"#);
        let path = file.path().to_string_lossy().to_string();

        let config = Config::from_lookup(|key| match key {
            "MI_USER" => Some("alice".to_string()),
            "MI_PASS" => Some("secret".to_string()),
            "MI_TOKEN_PATH" => Some(path.clone()),
            _ => None,
        })
        .unwrap();
        assert_eq!(CookieSet::from_config(&config).unwrap().device_id, "TOKENDEV");

        let config = Config {
            device_id: Some("CONFIGURED".to_string()),
            ..config
        };
        assert_eq!(CookieSet::from_config(&config).unwrap().device_id, "CONFIGURED");
    }

    #[test]
    fn test_from_config_without_any_device() {
        let file = token_file(r#"{"userId": "U1", "micoapi": ["s", "T1"]}"#);
        let path = file.path().to_string_lossy().to_string();

        let config = Config::from_lookup(|key| match key {
            "MI_USER" => Some("alice".to_string()),
            "MI_PASS" => Some("secret".to_string()),
            "MI_TOKEN_PATH" => Some(path.clone()),
            _ => None,
        })
        .unwrap();
        assert!(matches!(CookieSet::from_config(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_debug_hides_service_token() {
        let file = token_file(r#"{"userId": "U1", "micoapi": ["s", "very-secret"]}"#);
        let cookies = derive_cookies(file.path(), "D1").unwrap();
        assert!(!format!("{cookies:?}").contains("very-secret"));
    }
}
