//! Shared types for the video hearings state layer.
//!
//! This crate holds the small set of types every other crate needs:
//! identifier newtypes for the hearing domain and secret wrappers for
//! credentials that must never reach the logs.

pub mod secret;
pub mod types;
