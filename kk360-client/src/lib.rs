//! KK360 Client
//!
//! Talks to the KK360 backend over REST, normalizes what it returns into
//! keyed records, and keeps one reconciled list per admin or tutor page.

pub mod api_client;
pub mod config;
pub mod error;
pub mod logging;
pub mod pages;
pub mod resources;

pub use api_client::{RestClient, TutoringApi};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, ClientResult};
pub use logging::init_logging;
