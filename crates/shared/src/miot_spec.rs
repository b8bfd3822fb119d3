use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};

#[derive(Deserialize)]
struct InstanceList {
    instances: Vec<Instance>,
}

#[derive(Deserialize)]
struct Instance {
    model: String,
    #[serde(rename = "type")]
    urn: String,
}

/// Public MIoT spec catalogue lookup. No cookies needed.
#[derive(Clone, Debug)]
pub struct MiotSpec {
    client: Client,
    base_url: String,
}

impl MiotSpec {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(
            config.spec_base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Spec document for a device model such as `xiaomi.wifispeaker.lx06`.
    pub async fn lookup(&self, model: &str) -> Result<Value> {
        if model.is_empty() {
            return Err(Error::InvalidInput("model must not be empty".to_string()));
        }

        let list = self
            .client
            .get(format!("{}/miot-spec-v2/instances", self.base_url))
            .query(&[("status", "all")])
            .send()
            .await?
            .error_for_status()?
            .json::<InstanceList>()
            .await?;

        let urn = list
            .instances
            .into_iter()
            .find(|i| i.model == model)
            .map(|i| i.urn)
            .ok_or_else(|| Error::NotFound(format!("No spec for model: {model}")))?;

        debug!(model, urn = %urn, "Resolved spec type");

        let spec = self
            .client
            .get(format!("{}/miot-spec-v2/instance", self.base_url))
            .query(&[("type", urn.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        Ok(spec)
    }
}
