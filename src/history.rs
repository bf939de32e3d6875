//! Navigation primitive and the in-memory reference implementation.
//!
//! The hosting environment owns the real location bar; this crate only
//! talks to it through the [`History`] trait:
//!
//! - [`History::query_string`] — the live query string, the single source
//!   of truth for derived state. It is read fresh on every access, never
//!   cached.
//! - [`History::push`] / [`History::replace`] — the two navigation
//!   variants, fire-and-forget once dispatched.
//!
//! [`MemoryHistory`] is a self-contained implementation backed by a
//! history stack with back/forward support. Hosts without a browser (and
//! every test in this crate) use it directly.
//!
//! # Example
//!
//! ```
//! use query_state::{History, MemoryHistory, NavigateOptions};
//!
//! let history = MemoryHistory::new("/search");
//! history.push("/search?page=2", &NavigateOptions::default());
//!
//! assert_eq!(history.current_url(), "/search?page=2");
//! assert_eq!(history.query_string(), "page=2");
//!
//! history.back();
//! assert_eq!(history.query_string(), "");
//! ```

use crate::trace_log;
use std::sync::Mutex;

/// Options forwarded to the navigation primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing a new one.
    pub replace: bool,
    /// Ask the host to scroll to the top after navigating.
    pub scroll: bool,
}

impl NavigateOptions {
    /// Options for a `replace` navigation.
    pub fn replace() -> Self {
        Self {
            replace: true,
            scroll: false,
        }
    }
}

/// The navigation primitive supplied by the hosting environment.
///
/// Implementations must be cheap to call: `query_string` is read on every
/// state access, and `push`/`replace` are fire-and-forget (there is no
/// cancellation once dispatched).
pub trait History: Send + Sync {
    /// The current query string, without a leading `?` (empty when the
    /// current URL has none).
    fn query_string(&self) -> String;

    /// Push a new history entry for `url`.
    fn push(&self, url: &str, options: &NavigateOptions);

    /// Replace the current history entry with `url`.
    fn replace(&self, url: &str, options: &NavigateOptions);
}

// ============================================================================
// MemoryHistory
// ============================================================================

#[derive(Debug)]
struct Stack {
    entries: Vec<String>,
    current: usize,
}

/// In-memory [`History`] backed by a navigation stack.
///
/// Pushing discards any forward entries, exactly like a browser. All
/// methods take `&self`; the stack lives behind a mutex so the history
/// can be shared across a controller and the host.
#[derive(Debug)]
pub struct MemoryHistory {
    stack: Mutex<Stack>,
}

impl MemoryHistory {
    /// Create a history whose single entry is `initial_url`.
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self {
            stack: Mutex::new(Stack {
                entries: vec![initial_url.into()],
                current: 0,
            }),
        }
    }

    /// The URL of the current entry.
    pub fn current_url(&self) -> String {
        match self.stack.lock() {
            Ok(stack) => stack.entries[stack.current].clone(),
            Err(_) => String::new(),
        }
    }

    /// Go back one entry. Returns `false` when already at the oldest.
    pub fn back(&self) -> bool {
        match self.stack.lock() {
            Ok(mut stack) if stack.current > 0 => {
                stack.current -= 1;
                true
            }
            _ => false,
        }
    }

    /// Go forward one entry. Returns `false` when already at the newest.
    pub fn forward(&self) -> bool {
        match self.stack.lock() {
            Ok(mut stack) if stack.current + 1 < stack.entries.len() => {
                stack.current += 1;
                true
            }
            _ => false,
        }
    }

    /// Return `true` if `back()` would move.
    pub fn can_go_back(&self) -> bool {
        self.stack.lock().map(|s| s.current > 0).unwrap_or(false)
    }

    /// Return `true` if `forward()` would move.
    pub fn can_go_forward(&self) -> bool {
        self.stack
            .lock()
            .map(|s| s.current + 1 < s.entries.len())
            .unwrap_or(false)
    }

    /// Total number of entries in the stack.
    pub fn len(&self) -> usize {
        self.stack.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    /// Return `true` if the stack is empty (only possible after a poisoned
    /// lock).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl History for MemoryHistory {
    fn query_string(&self) -> String {
        let url = self.current_url();
        url.split_once('?')
            .map(|(_, query)| query.to_string())
            .unwrap_or_default()
    }

    fn push(&self, url: &str, _options: &NavigateOptions) {
        if let Ok(mut stack) = self.stack.lock() {
            // Pushing discards forward history
            let keep = stack.current + 1;
            stack.entries.truncate(keep);
            stack.entries.push(url.to_string());
            stack.current += 1;
        }
        trace_log!("memory history push: {}", url);
    }

    fn replace(&self, url: &str, _options: &NavigateOptions) {
        if let Ok(mut stack) = self.stack.lock() {
            let current = stack.current;
            stack.entries[current] = url.to_string();
        }
        trace_log!("memory history replace: {}", url);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_back_forward() {
        let history = MemoryHistory::new("/search");

        history.push("/search?page=2", &NavigateOptions::default());
        history.push("/search?page=3", &NavigateOptions::default());
        assert_eq!(history.current_url(), "/search?page=3");

        assert!(history.back());
        assert_eq!(history.current_url(), "/search?page=2");

        assert!(history.forward());
        assert_eq!(history.current_url(), "/search?page=3");
        assert!(!history.forward());
    }

    #[test]
    fn test_push_discards_forward_entries() {
        let history = MemoryHistory::new("/a");
        history.push("/b", &NavigateOptions::default());
        history.push("/c", &NavigateOptions::default());

        history.back();
        history.push("/d", &NavigateOptions::default());

        assert_eq!(history.current_url(), "/d");
        assert!(!history.can_go_forward());
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_replace_keeps_stack_depth() {
        let history = MemoryHistory::new("/a");
        history.push("/b", &NavigateOptions::default());
        history.replace("/b2", &NavigateOptions::default());

        assert_eq!(history.current_url(), "/b2");
        assert_eq!(history.len(), 2);

        history.back();
        assert_eq!(history.current_url(), "/a");
    }

    #[test]
    fn test_query_string_extraction() {
        let history = MemoryHistory::new("/search?page=2&q=rust");
        assert_eq!(history.query_string(), "page=2&q=rust");

        let history = MemoryHistory::new("/search");
        assert_eq!(history.query_string(), "");
    }

    #[test]
    fn test_back_at_oldest_entry() {
        let history = MemoryHistory::new("/only");
        assert!(!history.back());
        assert!(!history.can_go_back());
        assert_eq!(history.current_url(), "/only");
    }
}
