//! Explorer Mirror
//!
//! This crate provides the state core of an editor file-browser panel:
//! a lazily-materialized mirror of a directory tree plus a debounced
//! coordinator for the environment events that keep the panel honest.
//!
//! ## Design
//!
//! 1. **Lazy materialization**: only directories the user has expanded
//!    are listed from disk; everything else stays an unexpanded stub
//!    that costs a single stat call
//! 2. **Wholesale rebuilds**: the tree is never patched in place; a
//!    changed selection produces a whole new tree
//! 3. **Immutable snapshots**: panel state is replaced atomically and
//!    published over a broadcast channel, so readers never observe a
//!    half-applied update
//! 4. **Single-slot debounce**: a burst of cursor-idle ticks collapses
//!    into one diagnostics poll, and a superseded poll is cancelled and
//!    fully torn down before its replacement is installed
//!
//! ## Event Flow
//!
//! ```text
//! Environment notification (focus, window, cwd, buffer, quickfix, idle)
//!        ↓
//! EventRouter::route() [BACKGROUND TASK]
//!        ↓
//! RefreshCoordinator (CursorIdle only: defer and debounce the poll)
//!        ↓
//! PanelState::apply(StateDelta) [whole-value swap under one guard]
//!        ↓
//! broadcast::send(Arc<PanelState>)
//!        ↓
//! panel renderer redraws from the snapshot
//! ```
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use async_trait::async_trait;
//! use explorer_mirror::prelude::*;
//!
//! struct EditorHost;
//!
//! #[async_trait]
//! impl Host for EditorHost {
//!     async fn current_window(&self) -> Result<WindowId, HostError> {
//!         Ok(1)
//!     }
//!     async fn current_buffer_name(&self) -> Result<Option<String>, HostError> {
//!         Ok(None)
//!     }
//!     async fn current_dir(&self) -> Result<PathBuf, HostError> {
//!         Ok(PathBuf::from("/path/to/project"))
//!     }
//!     async fn poll_diagnostics(
//!         &self,
//!         _floor: Severity,
//!     ) -> Result<DiagnosticsSnapshot, HostError> {
//!         Ok(DiagnosticsSnapshot::default())
//!     }
//!     async fn poll_markers(&self) -> Result<MarkerSnapshot, HostError> {
//!         Ok(MarkerSnapshot::default())
//!     }
//!     async fn persist_session(&self, _state: &PanelState) {}
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Build the router over the project root
//!     let (router, mut updates) = EventRouterBuilder::new(
//!         Arc::new(EditorHost),
//!         PathBuf::from("/path/to/project"),
//!     )
//!     .idle_timeout(Duration::from_millis(500))
//!     .build()?;
//!
//!     // React to environment notifications
//!     router.dispatch(EnvEvent::FocusLost);
//!
//!     // Consume the snapshots the router publishes
//!     let state = updates.recv().await?;
//!     println!("editor focused: {}", state.focused);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - [`tree`]: The lazily-materialized directory mirror
//!   - [`tree::node`]: File/directory node model with unexpanded stubs
//!   - [`tree::build`]: Symlink-aware probing and tree construction
//!   - [`tree::index`]: Selection-driven tree index
//!   - [`tree::display`]: Panel labels for mirrored paths
//! - [`session`]: Panel state and event coordination
//!   - [`session::state`]: Immutable snapshots and the state cell
//!   - [`session::refresh`]: Single-slot debounce coordinator
//!   - [`session::router`]: Host trait and environment event router

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod session;
pub mod tree;

/// Re-exports for convenience.
pub mod prelude {
    pub use crate::session::{
        DiagnosticsSnapshot, EnvEvent, EventRouter, EventRouterBuilder, Host, HostError,
        MarkerSnapshot, PanelState, RefreshCoordinator, Severity, StateCell, StateDelta, WindowId,
    };
    pub use crate::tree::{
        display_name, DirNode, FileNode, Node, Selection, TreeError, TreeIndex,
    };
}

/// Run the environment event loop.
///
/// This function drives the main loop that:
/// 1. Receives environment notifications from the host binding
/// 2. Dispatches each onto a background routing task
/// 3. Tears down any pending deferred refresh once the channel closes
///
/// # Arguments
/// * `router` - The event router to dispatch into
/// * `events` - Channel of notifications from the host binding
pub async fn run_event_loop<H>(
    router: session::EventRouter<H>,
    mut events: tokio::sync::mpsc::Receiver<session::EnvEvent>,
) where
    H: session::Host + 'static,
{
    while let Some(event) = events.recv().await {
        router.dispatch(event);
    }
    router.shutdown().await;
}
