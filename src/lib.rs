//! DPoP (RFC 9449) proof validation.
//!
//! The validation core lives in [`services::dpop`]; the remaining modules wire
//! it into a small axum service.
//!
//! ```ignore
//! use dpop_validator::services::dpop::{DpopValidator, ValidationResult};
//!
//! let validator = DpopValidator::default();
//! match validator.validate(proof, "POST", "https://api.example.com/orders", Some(access_token)) {
//!     ValidationResult::Valid { payload } => println!("jti = {:?}", payload.jti),
//!     ValidationResult::Invalid { error } => println!("rejected: {}", error.code()),
//! }
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
