//! Shared fixtures for integration tests.

#![allow(dead_code)]

use query_state::schema::{array, number, object, string, PrimitiveKind, Schema};
use query_state::{ManualScheduler, MemoryHistory, QueryNavigator, TypedState};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Route crate logging to the test harness. Safe to call from every
/// fixture; only the first call per process installs the logger.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A search page schema: a defaulted page number plus optional query and tags.
pub fn search_schema() -> Schema {
    init_logging();
    object([
        ("page", number().default_value(1)),
        ("q", string().optional()),
        ("tags", array(PrimitiveKind::String).optional()),
    ])
}

/// Build a `TypedState` from a `json!` object literal.
pub fn state(value: Value) -> TypedState {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object literal, got {other}"),
    }
}

/// A navigator over `search_schema` with a shared in-memory history.
pub fn search_navigator(url: &str) -> (QueryNavigator, Arc<MemoryHistory>) {
    let history = Arc::new(MemoryHistory::new(url));
    let nav = QueryNavigator::new(search_schema(), "/search", history.clone());
    (nav, history)
}

/// Like `search_navigator` but debounced, driven by a manual scheduler so
/// tests decide when the timer "fires".
pub fn debounced_navigator(
    url: &str,
    delay_ms: u64,
) -> (QueryNavigator, Arc<MemoryHistory>, Arc<ManualScheduler>) {
    let history = Arc::new(MemoryHistory::new(url));
    let scheduler = Arc::new(ManualScheduler::new());
    let nav = QueryNavigator::new(search_schema(), "/search", history.clone())
        .with_debounce(Duration::from_millis(delay_ms))
        .with_scheduler(scheduler.clone());
    (nav, history, scheduler)
}
