//! # Hearing State Test Utilities
//!
//! Shared test utilities for the hearing state layer.
//!
//! Provides mock implementations and fixtures for isolated testing
//! without a real Redis:
//!
//! - `mock_store` - in-memory `KeyValueStore` with TTL simulation and
//!   fault injection
//! - `fixtures` - pre-configured upstream payloads (conferences,
//!   participants, hearings)
//! - `logging` - tracing init for test debug output
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hearing_test_utils::{fixtures::TestConference, MockStore};
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let store = Arc::new(MockStore::new());
//!     let (details, hearing) = TestConference::new().with_judge().build();
//!     // Run your test...
//! }
//! ```

pub mod fixtures;
pub mod logging;
pub mod mock_store;

pub use fixtures::TestConference;
pub use mock_store::MockStore;
