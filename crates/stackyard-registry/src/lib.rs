//! # stackyard-registry
//!
//! The environment registry core.
//!
//! Handles:
//! - **Record**: The normalized environment record and the sorted
//!   registry snapshot.
//! - **Scanner**: Filesystem discovery plus per-environment probes on a
//!   bounded worker pool.
//! - **Cache**: Two-tier (memory + disk) snapshot cache with TTL and
//!   manifest-set fingerprint invalidation.
//! - **Registry**: The composition root consumed by presentation
//!   layers.
//! - **Detail**: Raw per-environment file contents for single-entry
//!   views.

pub mod cache;
pub mod detail;
pub mod fingerprint;
mod probes;
pub mod record;
pub mod registry;
pub mod scanner;

pub use cache::{CacheEnvelope, RegistryCache};
pub use detail::{EnvironmentDetail, ExploitFile};
pub use record::{EnvironmentRecord, RegistrySnapshot, RegistryStats};
pub use registry::Registry;
pub use scanner::EnvironmentScanner;
