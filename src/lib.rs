//! # Kolibri Store
//!
//! A quota-enforced object store with a two-stage lossless codec:
//! - Sampling pattern analysis (statistics only)
//! - Run-length "formula" encoding with a reserved escape byte
//! - Deflate entropy coding
//! - Length-prefixed metadata envelope with SHA-256 verification
//! - Per-owner quota ledger that never lets `used` exceed `limit`
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Pipeline                            │
//! │              upload / download / remove / list              │
//! └──────┬──────────────────────┬───────────────────────┬───────┘
//!        │                      │                       │
//!        ▼                      ▼                       ▼
//!   ┌──────────┐         ┌─────────────┐        ┌──────────────┐
//!   │  Codec   │         │ QuotaLedger │        │ ObjectStore  │
//!   │ (pure)   │         │ (per-owner  │        │ (blobs)      │
//!   └──────────┘         │   mutex)    │        └──────────────┘
//!                        └──────┬──────┘
//!                               ▼
//!                     ┌───────────────────┐
//!                     │     Catalog       │
//!                     │ users + records   │
//!                     └───────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod record;
pub mod quota;
pub mod store;
pub mod pipeline;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{EnvelopeError, KolibriError, Result};
pub use config::{Config, IntegrityMode};
pub use pipeline::Pipeline;
pub use record::{FileRecord, QuotaState, StorageInfo};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Kolibri Store
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
