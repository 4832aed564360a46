//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports from the [`secrecy`] crate. The Redis connection URL may
//! embed credentials (`redis://:password@host:port`), so it is carried as
//! a [`SecretString`] everywhere: `Debug` output is redacted, and the raw
//! value is only reachable through an explicit
//! [`ExposeSecret::expose_secret`] call. Secrets are zeroized on drop.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct StoreConfig {
//!     redis_url: SecretString,
//! }
//!
//! let config = StoreConfig {
//!     redis_url: SecretString::from("redis://:hunter2@localhost:6379"),
//! };
//!
//! // Debug output is safe - the URL is redacted
//! assert!(!format!("{config:?}").contains("hunter2"));
//!
//! // Connecting requires an explicit expose
//! let url: &str = config.redis_url.expose_secret();
//! # let _ = url;
//! ```

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
