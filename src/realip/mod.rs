//! Client IP resolution.
//!
//! # Data Flow
//! ```text
//! peer address + request headers
//!     → precedence.rs (fixed table: which header, which trust policy)
//!     → resolver.rs (first source that yields an accepted address wins)
//!         → chain.rs (X-Forwarded-For: right-most public entry)
//!         → classify.rs (public / local range checks)
//!     → addr.rs (fallback: peer address with port stripped)
//!     → Resolved IP (bare address, no port)
//! ```
//!
//! # Design Decisions
//! - Nothing here can fail: every rejection falls through to the next source
//! - Header values are returned verbatim, never re-formatted
//! - No allocation on the hot path; results borrow from the inputs

pub mod addr;
pub mod chain;
pub mod classify;
pub mod precedence;
pub mod resolver;

pub use addr::strip_port;
pub use chain::scan_chain;
pub use classify::{classify, is_local, AddrClass};
pub use precedence::{HeaderSource, TrustPolicy, PRECEDENCE};
pub use resolver::{resolve, Resolution, Source};
