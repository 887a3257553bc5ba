//! Replays a recorded viewport event log through the debouncer and the
//! coordinator.
//!
//! Each input line is a JSON [`ViewportEvent`] with an `at_ms` offset:
//!
//! ```text
//! {"at_ms":0,"type":"bounds_changed","bounds":{"north":37.5,"south":37.4,"east":127.0,"west":126.9}}
//! {"at_ms":120,"type":"category_changed","category":"NOISE"}
//! {"at_ms":900,"type":"fetch_completed","ticket":{"counter":1}}
//! ```
//!
//! Bounds events go through [`BoundsDebouncer`] first. Everything else is
//! handled immediately.

use std::time::{Duration, Instant};

use dongne_map_spatial::ReportIndex;
use dongne_map_viewport::{BoundsDebouncer, ViewportSearchCoordinator};
use dongne_map_viewport_models::{
    CoordinatorConfig, CoordinatorPhase, Outcome, ViewportBounds, ViewportEvent,
};
use serde::{Deserialize, Serialize};

/// Latest event offset accepted in a log: one week.
pub const MAX_EVENT_OFFSET_MS: u64 = 7 * 24 * 60 * 60 * 1000;

/// One line of an event log.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimedEvent {
    #[serde(default)]
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: ViewportEvent,
}

/// What happened for one coordinator transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayStep {
    pub at_ms: u64,
    pub event: &'static str,
    pub outcome: Outcome,
    pub trigger_counter: u64,
    pub phase: CoordinatorPhase,
    /// Locally cached reports inside the searched bounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reports_in_bounds: Option<usize>,
}

/// Parses a JSON-lines event log, skipping blank lines.
///
/// # Errors
///
/// Returns the first line that isn't a valid event, or whose `at_ms` is
/// past [`MAX_EVENT_OFFSET_MS`], with its 1-based line number.
pub fn parse_events(content: &str) -> Result<Vec<TimedEvent>, (usize, serde_json::Error)> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            let event: TimedEvent = serde_json::from_str(line).map_err(|e| (idx + 1, e))?;
            if event.at_ms > MAX_EVENT_OFFSET_MS {
                return Err((
                    idx + 1,
                    <serde_json::Error as serde::de::Error>::custom(format_args!(
                        "at_ms {} is past the maximum offset of {MAX_EVENT_OFFSET_MS}",
                        event.at_ms
                    )),
                ));
            }
            Ok(event)
        })
        .collect()
}

const fn event_name(event: &ViewportEvent) -> &'static str {
    match event {
        ViewportEvent::BoundsChanged { .. } => "bounds_changed",
        ViewportEvent::SearchThisRegion => "search_this_region",
        ViewportEvent::ReturnToMyNeighborhood => "return_to_my_neighborhood",
        ViewportEvent::CategoryChanged { .. } => "category_changed",
        ViewportEvent::LocationSelected { .. } => "location_selected",
        ViewportEvent::FetchCompleted { .. } => "fetch_completed",
        ViewportEvent::FetchFailed { .. } => "fetch_failed",
    }
}

struct Replay<'a> {
    coordinator: ViewportSearchCoordinator,
    debouncer: BoundsDebouncer,
    reports: Option<&'a ReportIndex>,
    start: Instant,
    steps: Vec<ReplayStep>,
}

impl Replay<'_> {
    /// Offsets past [`MAX_EVENT_OFFSET_MS`] are clamped to it.
    fn instant_at(&self, at_ms: u64) -> Instant {
        self.start + Duration::from_millis(at_ms.min(MAX_EVENT_OFFSET_MS))
    }

    fn apply(&mut self, at_ms: u64, event: ViewportEvent) {
        let name = event_name(&event);
        let outcome = self.coordinator.handle(event);

        let reports_in_bounds = match (&outcome, self.reports) {
            (Outcome::Search(ticket), Some(index)) => ticket
                .bounds
                .as_ref()
                .map(|bounds| index.within_bounds(bounds).len()),
            _ => None,
        };

        self.steps.push(ReplayStep {
            at_ms,
            event: name,
            outcome,
            trigger_counter: self.coordinator.trigger_counter(),
            phase: self.coordinator.phase(),
            reports_in_bounds,
        });
    }

    fn release(&mut self, bounds: ViewportBounds, at_ms: u64) {
        self.apply(at_ms, ViewportEvent::BoundsChanged { bounds });
    }

    /// Releases debounced bounds whose quiet period ended by `at_ms`.
    fn poll(&mut self, at_ms: u64) {
        let now = self.instant_at(at_ms);
        if let Some(deadline) = self.debouncer.deadline()
            && let Some(bounds) = self.debouncer.poll(now)
        {
            let released_at = deadline.saturating_duration_since(self.start);
            self.release(bounds, u64::try_from(released_at.as_millis()).unwrap_or(at_ms));
        }
    }
}

/// Runs `events` in order and returns every coordinator transition.
#[must_use]
pub fn replay(
    events: Vec<TimedEvent>,
    config: CoordinatorConfig,
    reports: Option<&ReportIndex>,
) -> Vec<ReplayStep> {
    let mut replay = Replay {
        coordinator: ViewportSearchCoordinator::new(config),
        debouncer: BoundsDebouncer::from_config(&config),
        reports,
        start: Instant::now(),
        steps: Vec::new(),
    };

    let mut last_ms = 0;
    for TimedEvent { at_ms, event } in events {
        replay.poll(at_ms);
        last_ms = last_ms.max(at_ms);

        match event {
            ViewportEvent::BoundsChanged { bounds } => {
                let at = replay.instant_at(at_ms);
                replay.debouncer.push(bounds, at);
            }
            event => replay.apply(at_ms, event),
        }
    }

    if let Some(bounds) = replay.debouncer.flush() {
        replay.release(bounds, last_ms.saturating_add(config.debounce_ms));
    }

    log::info!(
        "Replayed {} coordinator transitions, final counter {}",
        replay.steps.len(),
        replay.coordinator.trigger_counter()
    );
    replay.steps
}

#[cfg(test)]
mod tests {
    use dongne_map_report_models::{ReportCategory, ReportPoint};

    use super::*;

    const LOG: &str = r#"
{"at_ms":0,"type":"bounds_changed","bounds":{"north":37.50,"south":37.40,"east":127.0,"west":126.9}}
{"at_ms":100,"type":"bounds_changed","bounds":{"north":37.51,"south":37.41,"east":127.01,"west":126.91}}
{"at_ms":500,"type":"fetch_completed","ticket":{"counter":1}}
{"at_ms":600,"type":"bounds_changed","bounds":{"north":37.5105,"south":37.41,"east":127.01,"west":126.91}}
{"at_ms":1000,"type":"category_changed","category":"NOISE"}
{"at_ms":1100,"type":"return_to_my_neighborhood"}
"#;

    fn outcomes(steps: &[ReplayStep]) -> Vec<(&str, u64)> {
        steps.iter().map(|s| (s.event, s.trigger_counter)).collect()
    }

    #[test]
    fn parses_event_log() {
        let events = parse_events(LOG).unwrap();
        assert_eq!(events.len(), 6);
        assert_eq!(events[4].at_ms, 1000);
        assert_eq!(events[5].event, ViewportEvent::ReturnToMyNeighborhood);
    }

    #[test]
    fn reports_bad_line_number() {
        let (line, _) = parse_events("\n{\"type\":\"nope\"}").unwrap_err();
        assert_eq!(line, 2);
    }

    #[test]
    fn rejects_offsets_past_the_maximum() {
        let line = format!(
            "{{\"at_ms\":{},\"type\":\"search_this_region\"}}",
            u64::MAX
        );
        let (line, err) = parse_events(&format!("\n\n{line}")).unwrap_err();
        assert_eq!(line, 3);
        assert!(err.to_string().contains("maximum offset"));
    }

    #[test]
    fn huge_offsets_and_quiet_periods_do_not_overflow() {
        let bounds = ViewportBounds::new(37.5, 37.4, 127.0, 126.9);
        let events = vec![
            TimedEvent {
                at_ms: u64::MAX,
                event: ViewportEvent::BoundsChanged { bounds },
            },
            TimedEvent {
                at_ms: u64::MAX,
                event: ViewportEvent::SearchThisRegion,
            },
        ];
        let config = CoordinatorConfig {
            debounce_ms: u64::MAX,
            ..CoordinatorConfig::default()
        };

        let steps = replay(events, config, None);
        assert_eq!(
            outcomes(&steps),
            vec![("search_this_region", 1), ("bounds_changed", 2)]
        );
        assert_eq!(steps[1].at_ms, u64::MAX);
    }

    #[test]
    fn burst_is_debounced_and_duplicates_suppressed() {
        let steps = replay(parse_events(LOG).unwrap(), CoordinatorConfig::default(), None);

        assert_eq!(
            outcomes(&steps),
            vec![
                ("bounds_changed", 1),
                ("fetch_completed", 1),
                ("bounds_changed", 1),
                ("category_changed", 2),
                ("return_to_my_neighborhood", 2),
            ]
        );
        // The burst collapses to its last bounds, released 300ms later.
        assert_eq!(steps[0].at_ms, 400);
        assert_eq!(steps[1].phase, CoordinatorPhase::BoundsTracked);
        assert_eq!(steps[2].outcome, Outcome::Ignored);
        assert_eq!(steps[4].phase, CoordinatorPhase::Idle);
    }

    #[test]
    fn trailing_bounds_are_flushed() {
        let events = parse_events(
            r#"{"at_ms":50,"type":"bounds_changed","bounds":{"north":1.0,"south":0.0,"east":1.0,"west":0.0}}"#,
        )
        .unwrap();
        let steps = replay(events, CoordinatorConfig::default(), None);
        assert_eq!(outcomes(&steps), vec![("bounds_changed", 1)]);
        assert_eq!(steps[0].at_ms, 350);
    }

    #[test]
    fn counts_cached_reports_in_searched_bounds() {
        let index = ReportIndex::new(vec![
            ReportPoint::new("in", ReportCategory::Noise, 37.45, 126.95),
            ReportPoint::new("out", ReportCategory::Noise, 37.70, 126.95),
        ]);
        let events = parse_events(
            r#"{"at_ms":0,"type":"bounds_changed","bounds":{"north":37.50,"south":37.40,"east":127.0,"west":126.9}}"#,
        )
        .unwrap();
        let steps = replay(events, CoordinatorConfig::default(), Some(&index));
        assert_eq!(steps[0].reports_in_bounds, Some(1));
    }
}
