pub mod config;
pub mod kernel;
pub mod services;

pub use config::RelayConfig;
pub use kernel::error::{RelayError, RelayResult};
pub use kernel::relay::Relay;
