//! Screen lifetime guard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Tracks whether the screen that owns some state is still mounted.
///
/// In-flight operations are never cancelled. Instead, every callback checks
/// the scope before touching state and drops its result once the screen is
/// gone. Clones share the same flag.
#[derive(Debug, Clone)]
pub struct ScreenScope {
    mounted: Arc<AtomicBool>,
}

impl ScreenScope {
    pub fn new() -> Self {
        Self {
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Mark the screen as gone. Idempotent.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
    }
}

impl Default for ScreenScope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmount_is_shared_by_clones() {
        let scope = ScreenScope::new();
        let callback_copy = scope.clone();
        assert!(callback_copy.is_mounted());

        scope.unmount();
        assert!(!callback_copy.is_mounted());

        scope.unmount();
        assert!(!scope.is_mounted());
    }
}
