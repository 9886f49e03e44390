//! Ingestion core: validation, rate limiting, persistence, and publishing
//! for inbound submissions, plus the HTTP surface that fronts it.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod error;
mod http;
mod rate_limit;
mod serve;
mod service;

pub use error::Error;
pub use http::{create_router, resolve_source_ip};
pub use rate_limit::{RateLimitConfig, RateLimitDecision, RateLimiter};
pub use serve::{HttpServer, ServeError};
pub use service::{IngestionService, IngestionServiceOptions};
