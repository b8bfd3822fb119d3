pub mod config;
pub mod conversation;
pub mod device;
pub mod error;
pub mod mina;
pub mod miot_spec;
pub mod token;

pub use config::Config;
pub use conversation::{ConversationQuery, ConversationRecord};
pub use device::{Device, DeviceRef, resolve_device_by_id, resolve_device_by_name};
pub use error::{Error, Result};
pub use mina::MinaClient;
pub use miot_spec::MiotSpec;
pub use token::{AuthToken, CookieSet, derive_cookies};
