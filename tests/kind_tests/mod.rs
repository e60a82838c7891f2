//! Integration tests against a live API server
//!
//! # Test Organization
//!
//! - `status_conflicts`: Stories about stale status updates, stale status
//!   patches, and precondition-fenced patches, plus the full scripted run
//!
//! # Running These Tests
//!
//! ```bash
//! cargo test --test kind -- --ignored --nocapture
//! ```

mod helpers;
mod status_conflicts;
