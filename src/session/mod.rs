//! Session state and environment event coordination.
//!
//! This module provides:
//! - `state`: the immutable `PanelState` snapshot, sparse deltas, and the
//!   `StateCell` that swaps and publishes whole snapshots
//! - `refresh`: the single-slot `RefreshCoordinator` debounce primitive
//! - `router`: the `Host` collaborator trait and the `EventRouter` that
//!   maps environment notifications onto the state

pub mod refresh;
pub mod router;
pub mod state;

pub use refresh::RefreshCoordinator;
pub use router::{EnvEvent, EventRouter, EventRouterBuilder, Host, HostError};
pub use state::{
    visit_order, DiagnosticsSnapshot, MarkerSnapshot, PanelState, Severity, StateCell, StateDelta,
    WindowId,
};
