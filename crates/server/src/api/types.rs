use serde::Deserialize;

pub const DEFAULT_LAST_ASK_LIMIT: u32 = 2;
pub const DEFAULT_LAST_ASK_WINDOW_SECS: u64 = 60;

// Speak text
#[derive(Deserialize)]
pub struct SayRequest {
    pub did: Option<String>,
    pub text: String,
}

// Spoken command
#[derive(Deserialize)]
pub struct CommandRequest {
    pub did: Option<String>,
    pub text: String,
    #[serde(default = "default_echo")]
    pub echo: bool,
}

fn default_echo() -> bool {
    true
}

// Recent queries
#[derive(Deserialize)]
pub struct LastAskParams {
    pub limit: Option<u32>,
    /// Window in seconds.
    pub before: Option<u64>,
}

#[derive(Deserialize)]
pub struct SpecParams {
    pub model: String,
}
