//! Policybot core library
//!
//! Foundational pieces shared by every policybot crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AppConfig, RetrievalConfig};
pub use error::{AppError, AppResult};
