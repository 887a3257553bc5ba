//! The per-session search coordinator.

use dongne_map_report_models::ReportCategory;
use dongne_map_viewport_models::{
    CoordinatorConfig, CoordinatorPhase, FetchTicket, Outcome, SearchTrigger, SearchedLocation,
    ViewportBounds, ViewportEvent,
};

/// Search-trigger state machine for one map session.
///
/// All transitions are synchronous. Two events handled back to back are
/// ordered by the counter they produce.
#[derive(Debug, Clone)]
pub struct ViewportSearchCoordinator {
    config: CoordinatorConfig,
    trigger: SearchTrigger,
    phase: CoordinatorPhase,
    category: Option<ReportCategory>,
    searched_location: Option<SearchedLocation>,
}

impl Default for ViewportSearchCoordinator {
    fn default() -> Self {
        Self::new(CoordinatorConfig::default())
    }
}

impl ViewportSearchCoordinator {
    #[must_use]
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            config,
            trigger: SearchTrigger::default(),
            phase: CoordinatorPhase::Idle,
            category: None,
            searched_location: None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    #[must_use]
    pub const fn state(&self) -> &SearchTrigger {
        &self.trigger
    }

    #[must_use]
    pub const fn phase(&self) -> CoordinatorPhase {
        self.phase
    }

    #[must_use]
    pub const fn trigger_counter(&self) -> u64 {
        self.trigger.trigger_counter
    }

    #[must_use]
    pub const fn last_applied_bounds(&self) -> Option<&ViewportBounds> {
        self.trigger.last_applied_bounds.as_ref()
    }

    #[must_use]
    pub const fn bounds_filter_active(&self) -> bool {
        self.trigger.bounds_filter_active
    }

    #[must_use]
    pub const fn category(&self) -> Option<ReportCategory> {
        self.category
    }

    #[must_use]
    pub const fn searched_location(&self) -> Option<&SearchedLocation> {
        self.searched_location.as_ref()
    }

    /// Whether `ticket` was issued by the most recent trigger.
    #[must_use]
    pub const fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.counter == self.trigger.trigger_counter
    }

    /// Applies a new viewport unless every edge moved less than the
    /// configured tolerance. The first bounds of a session always apply.
    pub fn bounds_changed(&mut self, bounds: ViewportBounds) -> Outcome {
        if let Some(last) = &self.trigger.last_applied_bounds
            && bounds.within_tolerance(last, self.config.bounds_tolerance)
        {
            log::debug!(
                "Ignoring bounds update: max edge delta {} below tolerance {}",
                bounds.max_edge_delta(last),
                self.config.bounds_tolerance
            );
            return Outcome::Ignored;
        }

        self.trigger.bounds_filter_active = true;
        self.trigger.last_applied_bounds = Some(bounds);
        Outcome::Search(self.signal())
    }

    /// Forces a bounds search over the current viewport.
    pub fn search_this_region(&mut self) -> Outcome {
        self.trigger.bounds_filter_active = true;
        Outcome::Search(self.signal())
    }

    /// Leaves bounds-search mode. The counter is kept, so an in-flight
    /// fetch stays current but no longer moves the phase.
    pub fn return_to_my_neighborhood(&mut self) -> Outcome {
        self.trigger.bounds_filter_active = false;
        self.trigger.last_applied_bounds = None;
        self.searched_location = None;
        self.phase = CoordinatorPhase::Idle;
        log::debug!(
            "Returned to my neighborhood at counter {}",
            self.trigger.trigger_counter
        );
        Outcome::Updated
    }

    /// Records the category filter. A different category re-runs an active
    /// bounds search without touching the bounds.
    pub fn category_changed(&mut self, category: Option<ReportCategory>) -> Outcome {
        let changed = self.category != category;
        self.category = category;

        if changed && self.trigger.bounds_filter_active {
            Outcome::Search(self.signal())
        } else if changed {
            Outcome::Updated
        } else {
            Outcome::Ignored
        }
    }

    /// Records a location picked from search. The map move that follows
    /// arrives separately as a bounds event.
    pub fn location_selected(&mut self, location: SearchedLocation) -> Outcome {
        log::debug!("Location selected: {}", location.place_name);
        self.searched_location = Some(location);
        Outcome::Updated
    }

    /// Settles the pending search if `ticket` is current.
    pub fn fetch_completed(&mut self, ticket: &FetchTicket) -> Outcome {
        self.settle(ticket, "completed")
    }

    /// Settles the pending search if `ticket` is current. Bounds are left
    /// as applied.
    pub fn fetch_failed(&mut self, ticket: &FetchTicket) -> Outcome {
        self.settle(ticket, "failed")
    }

    /// Message-passing entry point over the individual transitions.
    pub fn handle(&mut self, event: ViewportEvent) -> Outcome {
        match event {
            ViewportEvent::BoundsChanged { bounds } => self.bounds_changed(bounds),
            ViewportEvent::SearchThisRegion => self.search_this_region(),
            ViewportEvent::ReturnToMyNeighborhood => self.return_to_my_neighborhood(),
            ViewportEvent::CategoryChanged { category } => self.category_changed(category),
            ViewportEvent::LocationSelected { location } => self.location_selected(location),
            ViewportEvent::FetchCompleted { ticket } => self.fetch_completed(&ticket),
            ViewportEvent::FetchFailed { ticket } => self.fetch_failed(&ticket),
        }
    }

    fn signal(&mut self) -> FetchTicket {
        self.trigger.trigger_counter += 1;
        self.phase = CoordinatorPhase::Pending;

        let ticket = FetchTicket {
            counter: self.trigger.trigger_counter,
            bounds: self.trigger.last_applied_bounds,
            bounds_filter_active: self.trigger.bounds_filter_active,
            category: self.category,
        };
        log::debug!("Search signalled: {ticket:?}");
        ticket
    }

    fn settle(&mut self, ticket: &FetchTicket, how: &str) -> Outcome {
        if !self.is_current(ticket) {
            log::debug!(
                "Dropping stale fetch {how} for counter {} (current {})",
                ticket.counter,
                self.trigger.trigger_counter
            );
            return Outcome::Ignored;
        }
        if self.phase != CoordinatorPhase::Pending {
            return Outcome::Ignored;
        }

        log::debug!("Fetch {how} for counter {}", ticket.counter);
        self.phase = CoordinatorPhase::BoundsTracked;
        Outcome::Updated
    }
}

#[cfg(test)]
mod tests {
    use dongne_map_report_models::LatLng;

    use super::*;

    const LAST: ViewportBounds = ViewportBounds::new(37.50, 37.40, 127.0, 126.9);

    fn tracking() -> (ViewportSearchCoordinator, FetchTicket) {
        let mut coordinator = ViewportSearchCoordinator::default();
        let ticket = *coordinator.bounds_changed(LAST).ticket().unwrap();
        coordinator.fetch_completed(&ticket);
        (coordinator, ticket)
    }

    #[test]
    fn first_bounds_always_applies() {
        let mut coordinator = ViewportSearchCoordinator::default();
        assert_eq!(coordinator.phase(), CoordinatorPhase::Idle);

        let outcome = coordinator.bounds_changed(LAST);
        let ticket = outcome.ticket().unwrap();
        assert_eq!(ticket.counter, 1);
        assert_eq!(ticket.bounds, Some(LAST));
        assert!(ticket.bounds_filter_active);
        assert_eq!(coordinator.phase(), CoordinatorPhase::Pending);
    }

    #[test]
    fn sub_tolerance_bounds_are_suppressed() {
        let (mut coordinator, _) = tracking();
        let before = *coordinator.state();

        let next = ViewportBounds::new(37.5015, 37.4019, 126.9991, 126.9001);
        assert_eq!(coordinator.bounds_changed(next), Outcome::Ignored);
        assert_eq!(*coordinator.state(), before);
        assert_eq!(coordinator.last_applied_bounds(), Some(&LAST));
        assert_eq!(coordinator.phase(), CoordinatorPhase::BoundsTracked);
    }

    #[test]
    fn tolerance_reached_on_one_edge_applies() {
        let (mut coordinator, _) = tracking();

        let next = ViewportBounds::new(37.502, 37.40, 127.0, 126.9);
        let ticket = *coordinator.bounds_changed(next).ticket().unwrap();
        assert_eq!(ticket.counter, 2);
        assert_eq!(coordinator.trigger_counter(), 2);
        assert_eq!(coordinator.last_applied_bounds(), Some(&next));
    }

    #[test]
    fn search_this_region_always_increments() {
        let (mut coordinator, _) = tracking();
        coordinator.search_this_region();
        coordinator.search_this_region();
        assert_eq!(coordinator.trigger_counter(), 3);
        assert!(coordinator.bounds_filter_active());
        assert_eq!(coordinator.last_applied_bounds(), Some(&LAST));
    }

    #[test]
    fn search_this_region_without_bounds() {
        let mut coordinator = ViewportSearchCoordinator::default();
        let ticket = *coordinator.search_this_region().ticket().unwrap();
        assert_eq!(ticket.counter, 1);
        assert_eq!(ticket.bounds, None);
        assert!(ticket.bounds_filter_active);
    }

    #[test]
    fn reset_never_increments() {
        let (mut coordinator, _) = tracking();
        coordinator.location_selected(SearchedLocation {
            place_name: "시청역".to_string(),
            address: "서울 중구 세종대로 110".to_string(),
            location: LatLng::new(37.5657, 126.9769),
        });

        assert_eq!(coordinator.return_to_my_neighborhood(), Outcome::Updated);
        assert_eq!(coordinator.trigger_counter(), 1);
        assert!(!coordinator.bounds_filter_active());
        assert_eq!(coordinator.last_applied_bounds(), None);
        assert_eq!(coordinator.searched_location(), None);
        assert_eq!(coordinator.phase(), CoordinatorPhase::Idle);

        // Fresh state again: the next bounds always applies.
        let ticket = *coordinator.bounds_changed(LAST).ticket().unwrap();
        assert_eq!(ticket.counter, 2);
    }

    #[test]
    fn counter_never_decreases() {
        let mut coordinator = ViewportSearchCoordinator::default();
        let mut last = coordinator.trigger_counter();
        let events = [
            ViewportEvent::BoundsChanged { bounds: LAST },
            ViewportEvent::ReturnToMyNeighborhood,
            ViewportEvent::CategoryChanged {
                category: Some(ReportCategory::Noise),
            },
            ViewportEvent::SearchThisRegion,
            ViewportEvent::ReturnToMyNeighborhood,
            ViewportEvent::BoundsChanged { bounds: LAST },
            ViewportEvent::BoundsChanged { bounds: LAST },
        ];
        for event in events {
            coordinator.handle(event);
            assert!(coordinator.trigger_counter() >= last);
            last = coordinator.trigger_counter();
        }
        assert_eq!(last, 3);
    }

    #[test]
    fn category_change_re_searches_only_when_filtering() {
        let mut coordinator = ViewportSearchCoordinator::default();
        assert_eq!(
            coordinator.category_changed(Some(ReportCategory::Trash)),
            Outcome::Updated
        );
        assert_eq!(coordinator.trigger_counter(), 0);

        coordinator.bounds_changed(LAST);
        let ticket = *coordinator
            .category_changed(Some(ReportCategory::Noise))
            .ticket()
            .unwrap();
        assert_eq!(ticket.counter, 2);
        assert_eq!(ticket.category, Some(ReportCategory::Noise));
        assert_eq!(ticket.bounds, Some(LAST));

        assert_eq!(
            coordinator.category_changed(Some(ReportCategory::Noise)),
            Outcome::Ignored
        );
        assert_eq!(coordinator.trigger_counter(), 2);
    }

    #[test]
    fn stale_tickets_are_ignored() {
        let mut coordinator = ViewportSearchCoordinator::default();
        let first = *coordinator.bounds_changed(LAST).ticket().unwrap();
        let moved = ViewportBounds::new(37.51, 37.41, 127.01, 126.91);
        let second = *coordinator.bounds_changed(moved).ticket().unwrap();

        assert!(!coordinator.is_current(&first));
        assert!(coordinator.is_current(&second));
        assert_eq!(coordinator.fetch_completed(&first), Outcome::Ignored);
        assert_eq!(coordinator.phase(), CoordinatorPhase::Pending);

        assert_eq!(coordinator.fetch_completed(&second), Outcome::Updated);
        assert_eq!(coordinator.phase(), CoordinatorPhase::BoundsTracked);
    }

    #[test]
    fn fetch_failure_keeps_bounds() {
        let mut coordinator = ViewportSearchCoordinator::default();
        let ticket = *coordinator.bounds_changed(LAST).ticket().unwrap();

        assert_eq!(coordinator.fetch_failed(&ticket), Outcome::Updated);
        assert_eq!(coordinator.phase(), CoordinatorPhase::BoundsTracked);
        assert_eq!(coordinator.last_applied_bounds(), Some(&LAST));
        assert_eq!(coordinator.trigger_counter(), 1);

        // The failed bounds still count as applied.
        let nudge = ViewportBounds::new(37.5005, 37.40, 127.0, 126.9);
        assert_eq!(coordinator.bounds_changed(nudge), Outcome::Ignored);
    }

    #[test]
    fn completion_after_reset_stays_idle() {
        let mut coordinator = ViewportSearchCoordinator::default();
        let ticket = *coordinator.bounds_changed(LAST).ticket().unwrap();
        coordinator.return_to_my_neighborhood();

        assert!(coordinator.is_current(&ticket));
        assert_eq!(coordinator.fetch_completed(&ticket), Outcome::Ignored);
        assert_eq!(coordinator.phase(), CoordinatorPhase::Idle);
    }

    #[test]
    fn location_selection_does_not_search() {
        let mut coordinator = ViewportSearchCoordinator::default();
        let outcome = coordinator.handle(ViewportEvent::LocationSelected {
            location: SearchedLocation {
                place_name: "강남역".to_string(),
                address: "서울 강남구 역삼동 858".to_string(),
                location: LatLng::new(37.4979, 127.0276),
            },
        });
        assert_eq!(outcome, Outcome::Updated);
        assert_eq!(coordinator.trigger_counter(), 0);
        assert_eq!(
            coordinator.searched_location().map(|l| l.place_name.as_str()),
            Some("강남역")
        );
    }

    #[test]
    fn custom_tolerance() {
        let mut coordinator = ViewportSearchCoordinator::new(CoordinatorConfig {
            bounds_tolerance: 0.01,
            ..CoordinatorConfig::default()
        });
        coordinator.bounds_changed(LAST);
        let next = ViewportBounds::new(37.505, 37.40, 127.0, 126.9);
        assert_eq!(coordinator.bounds_changed(next), Outcome::Ignored);
        assert_eq!(coordinator.trigger_counter(), 1);
    }
}
