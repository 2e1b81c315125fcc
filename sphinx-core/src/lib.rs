//! Sphinx Core - foundation types shared by the relay client crates.
//!
//! - Application configuration (relay credentials, socket options)
//! - Unified error type
//! - Structured logging with tracing
//! - Relay value types (`RelayUrl`, `AuthorizationToken`)
//! - Platform directories and constants

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod platform;
pub mod relay;

// Re-export commonly used items at the crate root
pub use config::{AppConfig, ConfigHandle};
pub use error::{SphinxError, SphinxResult};
pub use logging::init_logging;
pub use platform::Platform;
pub use relay::{AuthorizationToken, RelayCredentials, RelayUrl};
