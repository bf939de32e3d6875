//! Route state controller: typed state over a live URL.
//!
//! [`QueryNavigator`] ties the codec to a hosting environment. It owns no
//! copy of the state — every read decodes the live query string fresh —
//! so its only true mutable state is the single pending-navigation slot
//! used for debouncing.
//!
//! Reads (`state`, `build_url`, `is_active`, `validate*`) are synchronous
//! and side-effect-free and may be called repeatedly per render. Writes
//! (`navigate` and its wrappers) go through the configured debounce: a
//! newer write cancels and replaces a pending one (last-write-wins
//! coalescing), so a burst of calls produces a single history entry.
//!
//! # Example
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
//! assert_eq!(serde_json::Value::Object(nav.state()), json!({ "page": 1, "tags": ["x", "y"] }));
//!
//! nav.merge(nav_state(json!({ "page": 3 })));
//! assert_eq!(history.current_url(), "/search?page=3&tags=x&tags=y");
//!
//! fn nav_state(v: serde_json::Value) -> query_state::TypedState {
//!     match v {
//!         serde_json::Value::Object(map) => map,
//!         _ => unreachable!(),
//!     }
//! }
//! ```

use crate::codec::{self, decode, encode, TypedState};
use crate::{debug_log, warn_log};
use crate::error::ValidationError;
use crate::history::{History, NavigateOptions};
use crate::params::QueryParams;
use crate::schema::{ObjectSchema, Schema};
use crate::scheduler::{Scheduler, TaskHandle};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Stateful coordinator between a [`Schema`] and a live URL.
///
/// See the [module docs](self) for the read/write model.
pub struct QueryNavigator {
    schema: Schema,
    base_path: String,
    history: Arc<dyn History>,
    scheduler: Option<Arc<dyn Scheduler>>,
    debounce: Option<Duration>,
    encode_variant: Option<usize>,
    pending: Mutex<Option<TaskHandle>>,
}

impl QueryNavigator {
    /// Create a controller over `schema` for the page at `base_path`.
    ///
    /// The schema must unwrap to an object or a union of objects (the
    /// same shapes [`decode`] accepts). With the `timer` feature (on by
    /// default) debounced writes use a [`ThreadScheduler`]; otherwise
    /// supply one with [`with_scheduler`](Self::with_scheduler).
    ///
    /// [`ThreadScheduler`]: crate::scheduler::ThreadScheduler
    pub fn new(schema: Schema, base_path: impl Into<String>, history: Arc<dyn History>) -> Self {
        Self {
            schema,
            base_path: base_path.into(),
            history,
            #[cfg(feature = "timer")]
            scheduler: Some(Arc::new(crate::scheduler::ThreadScheduler)),
            #[cfg(not(feature = "timer"))]
            scheduler: None,
            debounce: None,
            encode_variant: None,
            pending: Mutex::new(None),
        }
    }

    /// Debounce navigation writes by `delay` (last-write-wins coalescing).
    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce = Some(delay);
        self
    }

    /// Use a custom scheduler for debounced writes.
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Select the union variant URLs are encoded against.
    ///
    /// Encode operates on a single object schema; a controller built over
    /// a union must pick the concrete variant it writes. Decoding is
    /// unaffected and still tries every variant.
    pub fn encode_variant(mut self, index: usize) -> Self {
        self.encode_variant = Some(index);
        self
    }

    // ------------------------------------------------------------------
    // Read path
    // ------------------------------------------------------------------

    /// Decode of the live query string. Computed fresh on every call —
    /// re-read after any suspension point if another actor can navigate.
    pub fn state(&self) -> TypedState {
        let query = self.history.query_string();
        decode(&self.schema, &QueryParams::from_query_string(&query))
    }

    /// Build an absolute URL (base path plus encoded query string) for the
    /// current state with `partial` applied on top.
    ///
    /// Returns the bare base path when the encoded bag is empty.
    pub fn build_url(&self, partial: Option<&TypedState>) -> String {
        let bag = encode(self.encode_schema(), &self.state(), partial);
        if bag.is_empty() {
            self.base_path.clone()
        } else {
            format!("{}?{}", self.base_path, bag.to_query_string())
        }
    }

    /// Like [`build_url`](Self::build_url) but with only a `?`-prefixed
    /// query string; the bare base path when the bag is empty.
    pub fn build_relative_url(&self, partial: Option<&TypedState>) -> String {
        let bag = encode(self.encode_schema(), &self.state(), partial);
        if bag.is_empty() {
            self.base_path.clone()
        } else {
            format!("?{}", bag.to_query_string())
        }
    }

    /// Structural equality between `partial` and the live state.
    ///
    /// Arrays compare by length and pairwise order, a deliberate
    /// tie-break: `[a, b]` is not active when the URL carries `[b, a]`.
    pub fn is_active(&self, partial: &TypedState) -> bool {
        let state = self.state();
        partial
            .iter()
            .all(|(key, value)| state.get(key) == Some(value))
    }

    /// Validate a candidate object against the full schema, realizing
    /// defaults. Independent of the query-string mechanics.
    pub fn validate(&self, raw: &Value) -> Result<Value, Vec<ValidationError>> {
        self.schema.validate(Some(raw))
    }

    /// Validate a candidate object with every field treated as optional.
    pub fn validate_partial(&self, raw: &Value) -> Result<Value, Vec<ValidationError>> {
        self.schema.validate_partial(raw)
    }

    // ------------------------------------------------------------------
    // Write path
    // ------------------------------------------------------------------

    /// Navigate to the current state with `partial` applied on top.
    ///
    /// With a configured debounce delay the write is armed on the pending
    /// slot and a subsequent call cancels and replaces it; without one the
    /// navigation happens synchronously.
    pub fn navigate(&self, partial: Option<&TypedState>, options: NavigateOptions) {
        let url = self.build_url(partial);
        self.dispatch(url, options);
    }

    /// Merge `partial` into the current state and navigate.
    pub fn merge(&self, partial: TypedState) {
        self.navigate(Some(&partial), NavigateOptions::default());
    }

    /// Replace the whole state with `full` and navigate.
    ///
    /// Unlike [`merge`](Self::merge), the current state does not leak in:
    /// keys absent from `full` are gone from the URL.
    pub fn set(&self, full: TypedState) {
        let bag = encode(self.encode_schema(), &full, None);
        let url = if bag.is_empty() {
            self.base_path.clone()
        } else {
            format!("{}?{}", self.base_path, bag.to_query_string())
        };
        self.dispatch(url, NavigateOptions::default());
    }

    /// Navigate to the bare base path, dropping every parameter.
    pub fn reset(&self) {
        self.dispatch(self.base_path.clone(), NavigateOptions::default());
    }

    /// Reset only the named keys to their schema defaults and navigate.
    ///
    /// Keys without a default are removed from the URL.
    pub fn clear(&self, keys: &[&str]) {
        let defaults = codec::decode_object(self.encode_schema(), &QueryParams::new());

        let mut partial = TypedState::new();
        for key in keys {
            let value = defaults.get(*key).cloned().unwrap_or(Value::Null);
            partial.insert((*key).to_string(), value);
        }

        self.navigate(Some(&partial), NavigateOptions::default());
    }

    /// Drop a pending debounced navigation, if any.
    pub fn cancel_pending(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(handle) = pending.take() {
                handle.cancel();
            }
        }
    }

    /// Return `true` while a debounced navigation is armed.
    ///
    /// Goes back to `false` once the write fires or is cancelled.
    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .map(|pending| {
                pending
                    .as_ref()
                    .is_some_and(|handle| !handle.is_cancelled() && !handle.is_finished())
            })
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// The object schema URLs are encoded against.
    ///
    /// # Panics
    ///
    /// Panics when the schema is a union and no valid variant was selected
    /// with [`encode_variant`](Self::encode_variant), or when the schema
    /// is not an object shape at all. Both are caller bugs.
    fn encode_schema(&self) -> &ObjectSchema {
        match self.schema.unwrap_optional() {
            Schema::Object(obj) => obj,
            Schema::Union(variants) => {
                match self.encode_variant.and_then(|index| variants.get(index)) {
                    Some(variant) => variant,
                    None => panic!(
                        "encoding against a union schema requires encode_variant() selecting a valid variant"
                    ),
                }
            }
            other => panic!(
                "query navigation requires an object or union-of-objects schema, got {}",
                other.kind_name()
            ),
        }
    }

    fn dispatch(&self, url: String, options: NavigateOptions) {
        // A newer write always supersedes the pending one.
        self.cancel_pending();

        match (self.debounce, self.scheduler.as_ref()) {
            (Some(delay), Some(scheduler)) => {
                let history = Arc::clone(&self.history);
                let handle = scheduler.schedule(
                    delay,
                    Box::new(move || dispatch_now(history.as_ref(), &url, options)),
                );
                if let Ok(mut pending) = self.pending.lock() {
                    *pending = Some(handle);
                }
            }
            (Some(_), None) => {
                warn_log!("debounce configured without a scheduler; navigating synchronously");
                dispatch_now(self.history.as_ref(), &url, options);
            }
            (None, _) => dispatch_now(self.history.as_ref(), &url, options),
        }
    }
}

fn dispatch_now(history: &dyn History, url: &str, options: NavigateOptions) {
    debug_log!("navigating to {} (replace: {})", url, options.replace);
    if options.replace {
        history.replace(url, &options);
    } else {
        history.push(url, &options);
    }
}

impl Drop for QueryNavigator {
    fn drop(&mut self) {
        // A pending write must not outlive the controller that armed it.
        self.cancel_pending();
    }
}

impl std::fmt::Debug for QueryNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryNavigator")
            .field("schema", &self.schema)
            .field("base_path", &self.base_path)
            .field("debounce", &self.debounce)
            .field("encode_variant", &self.encode_variant)
            .field("has_pending", &self.has_pending())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistory;
    use crate::schema::{array, number, object, string, union, ObjectSchema, PrimitiveKind};
    use crate::scheduler::ManualScheduler;
    use serde_json::json;

    fn state(value: Value) -> TypedState {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object literal, got {other}"),
        }
    }

    fn search_schema() -> Schema {
        object([
            ("page", number().default_value(1)),
            ("q", string().optional()),
            ("tags", array(PrimitiveKind::String).optional()),
        ])
    }

    fn navigator(url: &str) -> (QueryNavigator, Arc<MemoryHistory>) {
        let history = Arc::new(MemoryHistory::new(url));
        let nav = QueryNavigator::new(search_schema(), "/search", history.clone());
        (nav, history)
    }

    #[test]
    fn test_state_is_derived_from_live_url() {
        let (nav, history) = navigator("/search?page=2");
        assert_eq!(nav.state(), state(json!({ "page": 2 })));

        // No internal copy: a history move changes the next read.
        history.push("/search?page=9", &NavigateOptions::default());
        assert_eq!(nav.state(), state(json!({ "page": 9 })));

        history.back();
        assert_eq!(nav.state(), state(json!({ "page": 2 })));
    }

    #[test]
    fn test_build_url_elides_defaults() {
        let (nav, _) = navigator("/search");
        assert_eq!(nav.build_url(None), "/search");

        let url = nav.build_url(Some(&state(json!({ "page": 2 }))));
        assert_eq!(url, "/search?page=2");

        // Back at the default: bare base path again.
        let url = nav.build_url(Some(&state(json!({ "page": 1 }))));
        assert_eq!(url, "/search");
    }

    #[test]
    fn test_build_relative_url() {
        let (nav, _) = navigator("/search?q=rust");
        assert_eq!(nav.build_relative_url(None), "?q=rust");

        let url = nav.build_relative_url(Some(&state(json!({ "q": null }))));
        assert_eq!(url, "/search");
    }

    #[test]
    fn test_merge_keeps_existing_params() {
        let (nav, history) = navigator("/search?q=rust");
        nav.merge(state(json!({ "page": 4 })));

        assert_eq!(history.current_url(), "/search?page=4&q=rust");
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_set_replaces_whole_state() {
        let (nav, history) = navigator("/search?q=rust&page=4");
        nav.set(state(json!({ "page": 2 })));

        assert_eq!(history.current_url(), "/search?page=2");
    }

    #[test]
    fn test_reset_navigates_to_base_path() {
        let (nav, history) = navigator("/search?q=rust&page=4");
        nav.reset();

        assert_eq!(history.current_url(), "/search");
    }

    #[test]
    fn test_clear_named_keys_only() {
        let (nav, history) = navigator("/search?q=rust&page=4&tags=a");
        nav.clear(&["page", "q"]);

        // `page` returns to its default (elided); `q` has none and is
        // removed; `tags` is untouched.
        assert_eq!(history.current_url(), "/search?tags=a");
    }

    #[test]
    fn test_navigate_replace_mode() {
        let (nav, history) = navigator("/search");
        nav.navigate(
            Some(&state(json!({ "page": 2 }))),
            NavigateOptions::replace(),
        );

        assert_eq!(history.current_url(), "/search?page=2");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_is_active_structural_equality() {
        let (nav, _) = navigator("/search?page=3&tags=a&tags=b");

        assert!(nav.is_active(&state(json!({ "page": 3 }))));
        assert!(nav.is_active(&state(json!({ "tags": ["a", "b"] }))));
        assert!(!nav.is_active(&state(json!({ "page": 4 }))));

        // Array order is significant, not set equality.
        assert!(!nav.is_active(&state(json!({ "tags": ["b", "a"] }))));
    }

    #[test]
    fn test_debounce_coalesces_to_last_write() {
        let history = Arc::new(MemoryHistory::new("/search"));
        let scheduler = Arc::new(ManualScheduler::new());
        let nav = QueryNavigator::new(search_schema(), "/search", history.clone())
            .with_debounce(Duration::from_millis(50))
            .with_scheduler(scheduler.clone());

        nav.merge(state(json!({ "page": 2 })));
        nav.merge(state(json!({ "page": 3 })));
        assert!(nav.has_pending());
        assert_eq!(history.len(), 1);

        scheduler.fire_all();

        // Exactly one history write, reflecting the second call.
        assert_eq!(history.len(), 2);
        assert_eq!(history.current_url(), "/search?page=3");
    }

    #[test]
    fn test_pending_clears_after_the_write_fires() {
        let history = Arc::new(MemoryHistory::new("/search"));
        let scheduler = Arc::new(ManualScheduler::new());
        let nav = QueryNavigator::new(search_schema(), "/search", history.clone())
            .with_debounce(Duration::from_millis(50))
            .with_scheduler(scheduler.clone());

        nav.merge(state(json!({ "page": 2 })));
        assert!(nav.has_pending());

        scheduler.fire_all();

        assert_eq!(history.current_url(), "/search?page=2");
        assert!(!nav.has_pending());
    }

    #[test]
    fn test_cancel_pending_drops_the_write() {
        let history = Arc::new(MemoryHistory::new("/search"));
        let scheduler = Arc::new(ManualScheduler::new());
        let nav = QueryNavigator::new(search_schema(), "/search", history.clone())
            .with_debounce(Duration::from_millis(50))
            .with_scheduler(scheduler.clone());

        nav.merge(state(json!({ "page": 2 })));
        nav.cancel_pending();
        assert!(!nav.has_pending());

        scheduler.fire_all();
        assert_eq!(history.current_url(), "/search");
    }

    #[test]
    fn test_undebounced_navigation_is_synchronous() {
        let (nav, history) = navigator("/search");
        nav.merge(state(json!({ "page": 2 })));

        assert!(!nav.has_pending());
        assert_eq!(history.current_url(), "/search?page=2");
    }

    #[test]
    fn test_union_navigator_with_encode_variant() {
        let schema = union([
            ObjectSchema::new([("a", number())]),
            ObjectSchema::new([("b", number())]),
        ]);
        let history = Arc::new(MemoryHistory::new("/u?b=2"));
        let nav = QueryNavigator::new(schema, "/u", history.clone()).encode_variant(1);

        assert_eq!(nav.state(), state(json!({ "b": 2 })));

        nav.merge(state(json!({ "b": 7 })));
        assert_eq!(history.current_url(), "/u?b=7");
    }

    #[test]
    #[should_panic(expected = "encode_variant")]
    fn test_union_encode_without_variant_panics() {
        let schema = union([ObjectSchema::new([("a", number())])]);
        let history = Arc::new(MemoryHistory::new("/u"));
        let nav = QueryNavigator::new(schema, "/u", history);
        let _ = nav.build_url(None);
    }

    #[test]
    fn test_validate_and_validate_partial() {
        let (nav, _) = navigator("/search");

        let full = nav.validate(&json!({ "q": "rust" })).unwrap();
        assert_eq!(full, json!({ "page": 1, "q": "rust" }));

        let partial = nav.validate_partial(&json!({ "q": "rust" })).unwrap();
        assert_eq!(partial, json!({ "q": "rust" }));

        assert!(nav.validate(&json!({ "page": "x" })).is_err());
    }
}
