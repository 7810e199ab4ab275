//! # cyrene - Rust client for the Cyrene platform
//!
//! A blocking client for reading and writing entries of Cyrene data models.
//! The client authenticates with OAuth2, caches the bearer token for its
//! lifetime and maps every response to a typed result.
//!
//! ## Features
//!
//! - Two OAuth2 grants:
//!   - client credentials (default)
//!   - resource-owner password, enabled with user credentials
//! - Lazy, once-only token acquisition guarded for shared use across threads
//! - Typed outcomes: an empty lookup is `Ok`, an unreachable server or an
//!   unreadable answer is an error
//! - Entry values with path-based access and deserialization into your types
//!
//! ## Basic Usage
//!
//! ```no_run
//! use cyrene::{CyreneClient, Filter, Payload};
//! use cyrene::json;
//!
//! fn main() -> Result<(), cyrene::CyreneError> {
//!     let client = CyreneClient::new("acme", "client-id", "client-secret")?;
//!
//!     // Fetch one entry from the "Main" module
//!     if let Some(contact) = client.get_entry("Contacts", "42")? {
//!         println!("Contact: {:?}", contact.get_string("name"));
//!     }
//!
//!     // List entries matching filters
//!     let active = client.get_entries_with_filter("Contacts", &[Filter::new("active", "1")])?;
//!     println!("{} active contacts", active.len());
//!
//!     // Create an entry
//!     let mut payload = Payload::new();
//!     payload.insert("name".to_string(), json!("Ada"));
//!     let created = client.create_entry("Contacts", &payload)?;
//!     println!("created: {}", created);
//!     Ok(())
//! }
//! ```
//!
//! ## Authentication
//!
//! ### Password grant
//!
//! ```no_run
//! use cyrene::{Config, CyreneClient, Resource};
//!
//! let config = Config::new("acme", "client-id", "client-secret")?
//!     .with_user_credentials("alice", "secret-password");
//! let client = CyreneClient::with_config(config)?;
//!
//! assert!(client.test_connection());
//! let _order = client.get_entry(Resource::in_module("Sales", "Orders"), "1001")?;
//! # Ok::<(), cyrene::CyreneError>(())
//! ```

pub mod client;
pub mod error;
pub mod resource;
pub mod response;
pub mod rest;
pub mod token;

// Re-export main types for convenience
pub use client::Config;
pub use error::{CyreneError, Result};
pub use resource::{Filter, Resource, DEFAULT_MODULE};
pub use response::{Entry, Envelope, Lookup, Payload};
pub use rest::CyreneClient;
pub use token::{GrantStrategy, TokenResponse};

// Re-export serde_json for convenience
pub use serde_json::json;
