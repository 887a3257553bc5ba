//! Temporal debounce for map-widget bounds events.

use std::time::{Duration, Instant};

use dongne_map_viewport_models::{CoordinatorConfig, ViewportBounds};

/// Holds the latest bounds from a burst of map events and releases it
/// once the widget has been quiet for the configured period.
#[derive(Debug, Clone)]
pub struct BoundsDebouncer {
    quiet_period: Duration,
    pending: Option<(ViewportBounds, Instant)>,
}

impl BoundsDebouncer {
    #[must_use]
    pub const fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: None,
        }
    }

    #[must_use]
    pub const fn from_config(config: &CoordinatorConfig) -> Self {
        Self::new(Duration::from_millis(config.debounce_ms))
    }

    #[must_use]
    pub const fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Replaces any held bounds and restarts the quiet period.
    pub fn push(&mut self, bounds: ViewportBounds, at: Instant) {
        self.pending = Some((bounds, at));
    }

    /// Releases the held bounds if the quiet period has elapsed since the
    /// last push.
    pub fn poll(&mut self, now: Instant) -> Option<ViewportBounds> {
        let (_, pushed_at) = self.pending?;
        if now.saturating_duration_since(pushed_at) >= self.quiet_period {
            self.flush()
        } else {
            None
        }
    }

    /// When the held bounds become releasable, if any are held. `None` also
    /// when the quiet period runs past what [`Instant`] can represent.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending
            .and_then(|(_, at)| at.checked_add(self.quiet_period))
    }

    /// Releases the held bounds immediately.
    pub fn flush(&mut self) -> Option<ViewportBounds> {
        self.pending.take().map(|(bounds, _)| bounds)
    }
}

impl Default for BoundsDebouncer {
    fn default() -> Self {
        Self::from_config(&CoordinatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(north: f64) -> ViewportBounds {
        ViewportBounds::new(north, north - 0.1, 127.0, 126.9)
    }

    #[test]
    fn releases_after_quiet_period() {
        let start = Instant::now();
        let mut debouncer = BoundsDebouncer::default();
        debouncer.push(bounds(37.5), start);

        assert_eq!(debouncer.poll(start + Duration::from_millis(299)), None);
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(300)),
            Some(bounds(37.5))
        );
        assert_eq!(debouncer.poll(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn burst_keeps_only_latest() {
        let start = Instant::now();
        let mut debouncer = BoundsDebouncer::new(Duration::from_millis(300));
        for (i, north) in [37.50, 37.51, 37.52].into_iter().enumerate() {
            debouncer.push(bounds(north), start + Duration::from_millis(100 * i as u64));
        }

        // 300ms after the first push, but only 100ms after the last.
        assert_eq!(debouncer.poll(start + Duration::from_millis(300)), None);
        assert_eq!(
            debouncer.deadline(),
            Some(start + Duration::from_millis(500))
        );
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(500)),
            Some(bounds(37.52))
        );
    }

    #[test]
    fn flush_releases_immediately() {
        let start = Instant::now();
        let mut debouncer = BoundsDebouncer::default();
        assert_eq!(debouncer.flush(), None);

        debouncer.push(bounds(37.5), start);
        assert_eq!(debouncer.flush(), Some(bounds(37.5)));
        assert_eq!(debouncer.deadline(), None);
    }

    #[test]
    fn from_config_uses_debounce_ms() {
        let debouncer = BoundsDebouncer::from_config(&CoordinatorConfig {
            debounce_ms: 50,
            ..CoordinatorConfig::default()
        });
        assert_eq!(debouncer.quiet_period(), Duration::from_millis(50));
    }

    #[test]
    fn unrepresentable_deadline_is_none() {
        let start = Instant::now();
        let mut debouncer = BoundsDebouncer::new(Duration::MAX);
        debouncer.push(bounds(37.5), start);
        assert_eq!(debouncer.deadline(), None);
        assert_eq!(debouncer.poll(start + Duration::from_secs(60)), None);
        assert_eq!(debouncer.flush(), Some(bounds(37.5)));
    }

}
