#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Decides when a map viewport change warrants a new report search.
//!
//! [`ViewportSearchCoordinator`] is owned by one map session. It applies a
//! spatial tolerance to bounds updates, stamps every search with a
//! monotonically increasing counter and lets callers drop stale fetch
//! results. [`BoundsDebouncer`] sits in front of it at the map-widget
//! boundary and coalesces bursts of bounds events in time.

pub mod coordinator;
pub mod debounce;

pub use coordinator::ViewportSearchCoordinator;
pub use debounce::BoundsDebouncer;
