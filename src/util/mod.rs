//! Utility functions shared by the fetcher and the HTTP front end.
//!
//! - **URL validation**: scheme checks plus an optional guard against
//!   loopback/private hosts (SSRF)
//! - **Error rendering**: flattening an error and its `source()` chain into
//!   a single human-readable line
//!
//! # Examples
//!
//! ```
//! use feedfan::util::{validate_url, HostPolicy};
//!
//! let url = validate_url("https://example.com/feed.xml", HostPolicy::PublicOnly).unwrap();
//! assert_eq!(url.host_str(), Some("example.com"));
//!
//! assert!(validate_url("http://127.0.0.1/feed", HostPolicy::PublicOnly).is_err());
//! assert!(validate_url("http://127.0.0.1/feed", HostPolicy::AllowPrivate).is_ok());
//! ```

mod errors;
mod url_validator;

pub use errors::error_chain;
pub use url_validator::{validate_url, HostPolicy, UrlValidationError};
