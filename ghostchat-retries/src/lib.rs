//! # ghostchat-retries
//!
//! Rate-limit aware retries for every outbound ghostchat call.
//!
//! The completion endpoint, the reasoning router and the encyclopedia lookups
//! all go through the same [`RetryClient`]. Only HTTP 429 is retried; any other
//! non-2xx status fails immediately.
//!
//! ## Core Concepts
//!
//! - **[`RetryPolicy`]**: how many retries and how long to wait
//! - **[`with_retry`]**: execute an async operation under a policy
//! - **[`RetryClient`]**: HTTP client that classifies responses and retries
//!
//! ## Example
//!
//! ```ignore
//! use ghostchat_retries::{with_retry, NetworkError, RetryPolicy};
//!
//! let policy = RetryPolicy::default(); // 2 retries, 2s then 4s
//! let body = with_retry(&policy, || async {
//!     Ok::<_, NetworkError>("pong")
//! }).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod executor;
pub mod transport;

// Re-exports
pub use config::{RetryCondition, RetryPolicy};
pub use error::{NetworkError, NetworkResult};
pub use executor::{with_retry, with_retry_state, AttemptInfo, RetryState};
pub use transport::{decode_json, RetryClient};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{with_retry, NetworkError, NetworkResult, RetryClient, RetryPolicy};
}
