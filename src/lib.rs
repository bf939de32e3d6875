//! Schema-driven synchronization between typed state and a URL query string.
//!
//! The crate keeps an application's structured state bidirectionally in
//! sync with a page's query string:
//!
//! - [`schema`] — the [`Schema`] model describing expected param shapes
//!   (objects, optionals, defaults, unions of objects, arrays of scalars),
//!   with structural validation and default realization.
//! - [`codec`] — [`decode`](codec::decode) from a raw multi-valued bag
//!   into typed state and [`encode`](codec::encode) back, eliding every
//!   value the schema would reconstruct anyway.
//! - [`controller`] — [`QueryNavigator`], a stateless-by-storage
//!   controller deriving state from the live URL and performing debounced,
//!   cancellable navigation writes through a host-supplied [`History`].
//!
//! Decoding is best-effort and never throws on user input: malformed
//! values degrade to defaults or omitted fields so a bad URL never breaks
//! a page. Callers needing strictness post-validate with
//! [`QueryNavigator::validate`] / [`validate_partial`](QueryNavigator::validate_partial).
//!
//! # Quick start
//!
//! ```
//! use query_state::schema::{array, number, object, PrimitiveKind};
//! use query_state::{MemoryHistory, QueryNavigator};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let schema = object([
//!     ("page", number().default_value(1)),
//!     ("tags", array(PrimitiveKind::String).optional()),
//! ]);
//!
//! let history = Arc::new(MemoryHistory::new("/search?tags=x&tags=y"));
//! let nav = QueryNavigator::new(schema, "/search", history.clone());
//!
//! // Derived live from the URL; `page` comes from its default.
//! assert_eq!(
//!     serde_json::Value::Object(nav.state()),
//!     json!({ "page": 1, "tags": ["x", "y"] })
//! );
//!
//! // Building a URL elides values equal to their defaults.
//! assert_eq!(nav.build_url(None), "/search?tags=x&tags=y");
//! ```
//!
//! # Feature flags
//!
//! | Feature   | Default | Effect                                         |
//! |-----------|---------|------------------------------------------------|
//! | `timer`   | yes     | Thread-backed [`ThreadScheduler`] for debounce |
//! | `log`     | yes     | Logging via the `log` crate                    |
//! | `tracing` | no      | Logging via the `tracing` crate                |
//!
//! [`ThreadScheduler`]: scheduler::ThreadScheduler

pub mod codec;
pub mod controller;
pub mod error;
pub mod history;
pub mod logging;
pub mod params;
pub mod schema;
pub mod scheduler;

pub use codec::{decode, encode, TypedState};
pub use controller::QueryNavigator;
pub use error::{ParamError, ValidationError};
pub use history::{History, MemoryHistory, NavigateOptions};
pub use params::QueryParams;
pub use schema::{ObjectSchema, PrimitiveKind, Schema};
pub use scheduler::{ManualScheduler, Scheduler, TaskHandle};

#[cfg(feature = "timer")]
pub use scheduler::ThreadScheduler;
