//! Client for the speaker cloud ("MiNA") endpoints that accept the token cookies.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;
use rand::distributions::Alphanumeric;
use reqwest::{Client, RequestBuilder, header};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::Config;
use crate::conversation::{self, ConversationQuery, ConversationRecord};
use crate::device::Device;
use crate::error::{Error, Result};
use crate::token::CookieSet;

const USER_AGENT: &str = "MiHome/6.0.103 (com.xiaomi.mihome; build:6.0.103.1; iOS 14.4.0) Alamofire/6.0.103 MICO/iOSApp/appStore/6.0.103";
const REQUEST_ID_PREFIX: &str = "app_ios_";
const REQUEST_ID_LEN: usize = 30;

#[derive(Deserialize)]
struct MinaEnvelope {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Value,
}

impl MinaEnvelope {
    fn into_data(self, what: &str) -> Result<Value> {
        if self.code != 0 {
            return Err(Error::Upstream(format!(
                "{} failed with code {}: {}",
                what,
                self.code,
                self.message.unwrap_or_default()
            )));
        }
        Ok(self.data)
    }
}

#[derive(Clone, Debug)]
pub struct MinaClient {
    client: Client,
    cookies: CookieSet,
    base_url: String,
    conversation_url: String,
}

impl MinaClient {
    pub fn new(cookies: CookieSet, config: &Config) -> Result<Self> {
        Self::with_endpoints(
            cookies,
            config.mina_base_url.clone(),
            config.conversation_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn with_endpoints(
        cookies: CookieSet,
        base_url: String,
        conversation_url: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            cookies,
            base_url: base_url.trim_end_matches('/').to_string(),
            conversation_url,
        })
    }

    pub fn cookies(&self) -> &CookieSet {
        &self.cookies
    }

    fn with_cookies(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(header::COOKIE, self.cookies.header_value())
    }

    /// Same identity, but the `deviceId` cookie names the speaker being asked about.
    fn with_device_cookies(&self, request: RequestBuilder, device_id: &str) -> RequestBuilder {
        request.header(header::COOKIE, self.cookies.for_device(device_id).header_value())
    }

    pub async fn device_list(&self) -> Result<Vec<Device>> {
        let url = format!("{}/admin/v2/device_list", self.base_url);
        let request_id = request_id();

        let envelope = self
            .with_cookies(self.client.get(&url))
            .query(&[("master", "0"), ("requestId", request_id.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<MinaEnvelope>()
            .await?;

        let data = envelope.into_data("Device list")?;
        let devices: Vec<Device> = serde_json::from_value(data)
            .map_err(|e| Error::Upstream(format!("Invalid device list: {e}")))?;

        debug!("Fetched {} devices", devices.len());
        Ok(devices)
    }

    /// Forward a method call to the speaker through the `/remote/ubus` relay.
    pub async fn ubus_request(
        &self,
        device_id: &str,
        method: &str,
        path: &str,
        message: &Value,
    ) -> Result<Value> {
        if device_id.is_empty() {
            return Err(Error::InvalidInput("device id must not be empty".to_string()));
        }

        let url = format!("{}/remote/ubus", self.base_url);
        let message = message.to_string();
        let request_id = request_id();

        info!(device_id, method, path, "Sending ubus request");

        let envelope = self
            .with_cookies(self.client.post(&url))
            .form(&[
                ("deviceId", device_id),
                ("message", message.as_str()),
                ("method", method),
                ("path", path),
                ("requestId", request_id.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<MinaEnvelope>()
            .await?;

        envelope.into_data(method)
    }

    pub async fn text_to_speech(&self, device_id: &str, text: &str) -> Result<Value> {
        self.ubus_request(device_id, "text_to_speech", "mibrain", &json!({ "text": text }))
            .await
    }

    /// Have the speaker handle `text` as if it had been spoken; `echo` reads it back aloud.
    pub async fn execute_command(&self, device_id: &str, text: &str, echo: bool) -> Result<Value> {
        let message = json!({
            "tts": u8::from(echo),
            "nlp": 1,
            "nlp_text": text,
        });
        self.ubus_request(device_id, "ai_service", "mibrain", &message)
            .await
    }

    /// Raw conversation records for one speaker, newest first as the service sends them.
    pub async fn conversation(&self, query: &ConversationQuery) -> Result<Vec<ConversationRecord>> {
        query.validate()?;

        let timestamp = query.timestamp_millis.to_string();
        let limit = query.limit.to_string();

        debug!(hardware = %query.hardware, device_id = %query.device_id, "Requesting conversation history");

        let response = self
            .with_device_cookies(self.client.get(&self.conversation_url), &query.device_id)
            .query(&[
                ("hardware", query.hardware.as_str()),
                ("timestamp", timestamp.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!(
                "Conversation request failed with status {status}"
            )));
        }

        let body = response.text().await?;
        conversation::parse_records(&body)
    }

    pub async fn fetch_recent_queries(
        &self,
        hardware: &str,
        device_id: &str,
        limit: u32,
        window_secs: u64,
    ) -> Result<Vec<String>> {
        let now = now_millis();
        let query = ConversationQuery {
            hardware: hardware.to_string(),
            device_id: device_id.to_string(),
            timestamp_millis: now,
            limit,
        };

        let records = self.conversation(&query).await?;
        Ok(conversation::recent_queries(records, now, window_secs))
    }
}

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

fn request_id() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REQUEST_ID_LEN)
        .map(char::from)
        .collect();
    format!("{REQUEST_ID_PREFIX}{random}")
}
