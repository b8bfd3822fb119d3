use mibridge_shared::{Config, CookieSet, MinaClient, MiotSpec, Result};
use tracing::info;

/// Read-only state shared by every request.
pub struct AppState {
    pub config: Config,
    pub mina: MinaClient,
    pub spec: MiotSpec,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self> {
        let cookies = CookieSet::from_config(&config)?;
        info!(
            "Using token {} for account {}",
            config.token_file_path.display(),
            config.account_user
        );

        let mina = MinaClient::new(cookies, &config)?;
        let spec = MiotSpec::new(&config)?;

        Ok(Self { config, mina, spec })
    }
}
