//! Distributed conference-state and consultation-coordination layer.
//!
//! Many stateless web instances serve the same live hearings; this
//! library keeps their view consistent without re-querying the upstream
//! booking/video APIs on every request:
//!
//! - An authoritative, horizontally-shared snapshot of each active
//!   conference, with a process-local fast path
//! - Coordination of private-consultation invitations with
//!   at-most-one-outcome semantics and a participant reverse index
//! - A best-effort distributed lock to prevent duplicate side effects
//!   when concurrent requests race across instances
//!
//! # Architecture
//!
//! ```text
//! controllers (external)
//!     │ get_or_add / update_layout / update_response
//!     ▼
//! ConferenceCache ── LayoutService ── ConsultationCoordinator
//!     │                   │                  │
//!     └──────── DistributedCache ── DistributedLock
//!                        │
//!                  KeyValueStore (trait)
//!                        │
//!                   RedisStore (shared by all instances)
//! ```
//!
//! # Key Design Decisions
//!
//! - **Store as source of truth**: the local conference layer is an
//!   accelerator only and can be disabled by config
//! - **Typed accessors**: every entity has its own key namespace and
//!   encode/decode path; nothing inspects cache values at runtime
//! - **Decode failures are misses**: incompatible persisted state heals
//!   by refetching, never by failing requests
//! - **Locked read-modify-write**: invitation answers and index
//!   maintenance serialize through an entity-keyed lock built on atomic
//!   `SET NX EX`
//!
//! # Modules
//!
//! - [`store`] - shared store trait and the Redis implementation
//! - [`cache`] - typed distributed cache with sliding expiration
//! - [`lock`] - named best-effort distributed lock
//! - [`conference`] - conference aggregate, upstream mapping, hybrid cache
//! - [`layout`] - hearing layout cache and change service
//! - [`consultation`] - invitation model and coordinator
//! - [`notify`] - outward notifier contracts (consumed, not implemented)
//! - [`config`] - layer configuration from environment
//! - [`errors`] - error types with classification helpers

pub mod cache;
pub mod codec;
pub mod conference;
pub mod config;
pub mod consultation;
pub mod errors;
pub mod layout;
pub mod lock;
pub mod notify;
pub mod observability;
pub mod store;
