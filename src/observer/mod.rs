use tracing::trace;

use crate::model::Category;

/// Fraction of the sentinel that must be visible before it counts as reached.
pub const VISIBILITY_THRESHOLD: f32 = 0.5;

/// Identity of the "load more" sentinel placed after the last rendered record.
///
/// A new record count, a new category or a new request generation each make a
/// new sentinel, which forces the observer to rebind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Sentinel {
    pub category: Category,
    pub position: usize,
    pub generation: u64,
}

/// Single long-lived watcher for the sentinel.
#[derive(Debug)]
pub struct SentinelObserver {
    threshold: f32,
    target: Option<Sentinel>,
    released: bool,
}

impl Default for SentinelObserver {
    fn default() -> Self {
        Self::new(VISIBILITY_THRESHOLD)
    }
}

impl SentinelObserver {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            target: None,
            released: false,
        }
    }

    /// Watches `sentinel`, replacing the previous target. Returns `true` when
    /// the binding changed. A released observer never binds again.
    pub fn observe(&mut self, sentinel: Sentinel) -> bool {
        if self.released || self.target == Some(sentinel) {
            return false;
        }
        trace!(?sentinel, "observer rebound");
        self.target = Some(sentinel);
        true
    }

    pub fn unobserve(&mut self) {
        self.target = None;
    }

    /// Drops the target for good; used on teardown.
    pub fn disconnect(&mut self) {
        self.target = None;
        self.released = true;
    }

    pub fn target(&self) -> Option<Sentinel> {
        self.target
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Whether a visibility report for `sentinel` should fire the callback.
    pub fn intersects(&self, sentinel: Sentinel, visible_ratio: f32) -> bool {
        self.target == Some(sentinel) && visible_ratio >= self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentinel(position: usize) -> Sentinel {
        Sentinel {
            category: Category::Characters,
            position,
            generation: 1,
        }
    }

    #[test]
    fn only_the_bound_sentinel_fires() {
        let mut observer = SentinelObserver::default();
        assert!(observer.observe(sentinel(20)));
        assert!(!observer.observe(sentinel(20)));
        assert!(observer.intersects(sentinel(20), 1.0));
        assert!(!observer.intersects(sentinel(20), 0.25));
        assert!(!observer.intersects(sentinel(0), 1.0));

        assert!(observer.observe(sentinel(40)));
        assert!(!observer.intersects(sentinel(20), 1.0));
        assert!(observer.intersects(sentinel(40), 0.5));
    }

    #[test]
    fn disconnect_is_permanent() {
        let mut observer = SentinelObserver::default();
        observer.observe(sentinel(20));
        observer.disconnect();
        assert!(observer.is_released());
        assert!(!observer.observe(sentinel(40)));
        assert!(!observer.intersects(sentinel(40), 1.0));
    }
}
