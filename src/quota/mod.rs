//! Quota Module
//!
//! Per-owner byte accounting that gates every persist and delete.
//!
//! ## State Machine (per owner)
//! ```text
//!   available = limit - used
//!
//!   reserve(n):  n <= available  → used += n
//!                n >  available  → QuotaExceeded { available, required: n }
//!   release(n):  used = max(0, used - n)
//! ```
//!
//! Invariant: `0 <= used <= limit` whenever no operation is in flight.

mod ledger;

pub use ledger::{OwnerAccount, QuotaLedger};
