//! Environment event routing.
//!
//! This module provides the `Host` collaborator trait, the vocabulary of
//! environment notifications, and `EventRouter`, which maps each
//! notification to either a direct state forward or deferred work on the
//! refresh coordinator. Transient host failures mean "no applicable
//! state change", never an escalated error.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::session::refresh::RefreshCoordinator;
use crate::session::state::{
    visit_order, DiagnosticsSnapshot, MarkerSnapshot, PanelState, Severity, StateCell, StateDelta,
    WindowId,
};
use crate::tree::{Selection, TreeError, TreeIndex};

/// Transient failure answering an environment query, typically because
/// the editor is mid-transition between windows or buffers.
#[derive(Debug, Clone, Error)]
#[error("environment query failed: {0}")]
pub struct HostError(pub String);

/// Editor-side collaborators the router consults.
///
/// Implementations talk to the actual host over whatever channel it
/// speaks; the router only cares about the answers. Every query may fail
/// transiently, and the router treats such failures as momentary.
#[async_trait]
pub trait Host: Send + Sync {
    /// Identifier of the window that currently holds the cursor.
    async fn current_window(&self) -> Result<WindowId, HostError>;

    /// Backing name of the current buffer; `None` for unnamed buffers.
    async fn current_buffer_name(&self) -> Result<Option<String>, HostError>;

    /// The editor's current working directory.
    async fn current_dir(&self) -> Result<PathBuf, HostError>;

    /// Poll diagnostics at severity `floor` or more severe. Only the
    /// timing of the call matters to the router; the snapshot is stored
    /// untouched.
    async fn poll_diagnostics(&self, floor: Severity) -> Result<DiagnosticsSnapshot, HostError>;

    /// Poll list-command markers.
    async fn poll_markers(&self) -> Result<MarkerSnapshot, HostError>;

    /// Persist the session derived from `state`. Fire-and-forget; the
    /// router consumes no result.
    async fn persist_session(&self, state: &PanelState);
}

/// Environment notifications the router reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvEvent {
    /// The cursor has been idle long enough to consider a refresh.
    CursorIdle,
    /// The editor is losing focus or exiting; a session save point.
    FocusLost,
    /// The editor regained focus.
    FocusGained,
    /// The cursor entered a window.
    WindowEntered,
    /// The working directory changed.
    DirChanged,
    /// A buffer was entered.
    BufferEntered,
    /// An external list command (quickfix and the like) completed.
    ListCommandDone,
}

/// Maps environment notifications onto the panel state.
///
/// Direct effects go through [`StateCell::forward`]; idle-triggered
/// diagnostics refreshes go through a shared [`RefreshCoordinator`], so
/// a burst of idle ticks costs a single poll. Cloning is cheap and every
/// clone shares the same state and refresh slot.
pub struct EventRouter<H> {
    host: Arc<H>,
    cell: Arc<StateCell>,
    refresh: Arc<RefreshCoordinator>,
    idle_timeout: Duration,
    min_severity: Severity,
}

impl<H> Clone for EventRouter<H> {
    fn clone(&self) -> Self {
        Self {
            host: Arc::clone(&self.host),
            cell: Arc::clone(&self.cell),
            refresh: Arc::clone(&self.refresh),
            idle_timeout: self.idle_timeout,
            min_severity: self.min_severity,
        }
    }
}

impl<H: Host + 'static> EventRouter<H> {
    /// Handle `event` on a background task, fire-and-forget. Ordering
    /// across different event sources is best-effort; use
    /// [`EventRouter::route`] directly when the caller needs the outcome.
    pub fn dispatch(&self, event: EnvEvent) {
        let router = self.clone();
        tokio::spawn(async move {
            router.route(event).await;
        });
    }

    /// Handle `event`, returning the snapshot forwarded as its direct
    /// effect. `None` means the event deferred its work or produced no
    /// applicable state change.
    pub async fn route(&self, event: EnvEvent) -> Option<Arc<PanelState>> {
        tracing::debug!("Routing {:?}", event);
        match event {
            EnvEvent::CursorIdle => self.on_cursor_idle().await,
            EnvEvent::FocusLost => self.on_focus_lost().await,
            EnvEvent::FocusGained => self.on_focus_gained().await,
            EnvEvent::WindowEntered => self.on_window_entered().await,
            EnvEvent::DirChanged => self.on_dir_changed().await,
            EnvEvent::BufferEntered => self.on_buffer_entered().await,
            EnvEvent::ListCommandDone => self.on_list_command_done().await,
        }
    }

    /// The current snapshot.
    pub async fn state(&self) -> Arc<PanelState> {
        self.cell.snapshot().await
    }

    /// Subscribe to snapshots produced by future forwards.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<PanelState>> {
        self.cell.subscribe()
    }

    /// Expand `path` and forward the rebuilt tree. No-op when the path
    /// is already expanded; a failed rebuild keeps the current tree.
    pub async fn expand_dir(&self, path: &Path) -> Option<Arc<PanelState>> {
        let state = self.cell.snapshot().await;
        if state.tree.is_expanded(path) {
            return None;
        }
        self.forward_tree_result(state.tree.expanded(path)).await
    }

    /// Collapse `path` and forward the rebuilt tree. No-op when the path
    /// is not expanded.
    pub async fn collapse_dir(&self, path: &Path) -> Option<Arc<PanelState>> {
        let state = self.cell.snapshot().await;
        if !state.tree.is_expanded(path) {
            return None;
        }
        self.forward_tree_result(state.tree.collapsed(path)).await
    }

    /// Rebuild the tree against the unchanged selection, picking up
    /// entries created or removed on disk since the last build.
    pub async fn rescan(&self) -> Option<Arc<PanelState>> {
        let state = self.cell.snapshot().await;
        let root = state.tree.root().path.clone();
        self.forward_tree_result(TreeIndex::rebuild(&root, state.tree.selection().clone()))
            .await
    }

    /// Replace the set of paths exempt from buffer following.
    pub async fn set_ignored(&self, ignored: HashSet<PathBuf>) -> Arc<PanelState> {
        self.cell.forward(StateDelta::new().ignored(ignored)).await
    }

    /// Drop any pending deferred refresh. Call before discarding the
    /// last router clone so no poll fires into a dismantled session.
    pub async fn shutdown(&self) {
        self.refresh.cancel().await;
    }

    async fn forward_tree_result(
        &self,
        rebuilt: Result<TreeIndex, TreeError>,
    ) -> Option<Arc<PanelState>> {
        match rebuilt {
            Ok(tree) => Some(self.cell.forward(StateDelta::new().tree(tree)).await),
            Err(e) => {
                tracing::warn!("Keeping previous tree: {}", e);
                None
            }
        }
    }

    /// Defer a diagnostics poll by the idle timeout, superseding any
    /// poll already pending.
    async fn on_cursor_idle(&self) -> Option<Arc<PanelState>> {
        let host = Arc::clone(&self.host);
        let cell = Arc::clone(&self.cell);
        let floor = self.min_severity;
        self.refresh
            .trigger(self.idle_timeout, move || async move {
                match host.poll_diagnostics(floor).await {
                    Ok(snapshot) => {
                        cell.forward(StateDelta::new().diagnostics(snapshot)).await;
                    }
                    Err(e) => {
                        tracing::warn!("Diagnostics poll failed: {}", e);
                    }
                }
            })
            .await;
        None
    }

    async fn on_focus_lost(&self) -> Option<Arc<PanelState>> {
        let state = self.cell.snapshot().await;
        self.host.persist_session(&state).await;
        Some(self.cell.forward(StateDelta::new().focused(false)).await)
    }

    async fn on_focus_gained(&self) -> Option<Arc<PanelState>> {
        Some(self.cell.forward(StateDelta::new().focused(true)).await)
    }

    async fn on_window_entered(&self) -> Option<Arc<PanelState>> {
        let win = match self.host.current_window().await {
            Ok(win) => win,
            Err(e) => {
                tracing::debug!("Window query failed mid-transition: {}", e);
                return None;
            }
        };
        let order = visit_order(&self.cell.snapshot().await.window_order, win);
        Some(self.cell.forward(StateDelta::new().window_order(order)).await)
    }

    /// Re-root the mirror at the new working directory. All previous
    /// expansions belong to the old root and are discarded.
    async fn on_dir_changed(&self) -> Option<Arc<PanelState>> {
        let cwd = match self.host.current_dir().await {
            Ok(cwd) => cwd,
            Err(e) => {
                tracing::debug!("Working directory query failed: {}", e);
                return None;
            }
        };
        self.forward_tree_result(TreeIndex::rebuild(&cwd, Selection::new()))
            .await
    }

    async fn on_buffer_entered(&self) -> Option<Arc<PanelState>> {
        let name = match self.host.current_buffer_name().await {
            Ok(Some(name)) => name,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!("Buffer query failed mid-transition: {}", e);
                return None;
            }
        };
        let path = PathBuf::from(name);
        if !path.is_file() {
            // Scratch buffers and directory buffers are not followed.
            return None;
        }
        let state = self.cell.snapshot().await;
        if under_ignored(&state.ignored, &path) {
            return None;
        }
        Some(self.cell.forward(StateDelta::new().current_file(path)).await)
    }

    async fn on_list_command_done(&self) -> Option<Arc<PanelState>> {
        match self.host.poll_markers().await {
            Ok(snapshot) => Some(self.cell.forward(StateDelta::new().markers(snapshot)).await),
            Err(e) => {
                tracing::debug!("Marker poll failed: {}", e);
                None
            }
        }
    }
}

/// Whether `path` or any ancestor of it is in `ignored`.
fn under_ignored(ignored: &HashSet<PathBuf>, path: &Path) -> bool {
    path.ancestors().any(|p| ignored.contains(p))
}

/// Builder for [`EventRouter`] carrying the panel's tuning knobs.
pub struct EventRouterBuilder<H> {
    host: Arc<H>,
    root: PathBuf,
    idle_timeout: Duration,
    min_severity: Severity,
    buffer_size: usize,
}

impl<H: Host + 'static> EventRouterBuilder<H> {
    /// Start a builder over `host`, mirroring the tree rooted at `root`.
    pub fn new(host: Arc<H>, root: PathBuf) -> Self {
        Self {
            host,
            root,
            idle_timeout: Duration::from_secs(1),
            min_severity: Severity::default(),
            buffer_size: 256,
        }
    }

    /// How long the cursor must stay idle before a diagnostics poll
    /// fires. Defaults to one second.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Severity floor passed to diagnostics polls. Defaults to
    /// [`Severity::Warning`].
    pub fn min_severity(mut self, floor: Severity) -> Self {
        self.min_severity = floor;
        self
    }

    /// Capacity of the snapshot broadcast queue. Defaults to 256.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Build the initial tree and the router over it, returning the
    /// router together with a subscription to its snapshots. Fails when
    /// the root cannot be mirrored.
    pub fn build(
        self,
    ) -> Result<(EventRouter<H>, broadcast::Receiver<Arc<PanelState>>), TreeError> {
        let tree = TreeIndex::rebuild(&self.root, Selection::new())?;
        let cell = StateCell::new(PanelState::new(tree), self.buffer_size);
        let updates = cell.subscribe();
        Ok((
            EventRouter {
                host: self.host,
                cell: Arc::new(cell),
                refresh: Arc::new(RefreshCoordinator::new()),
                idle_timeout: self.idle_timeout,
                min_severity: self.min_severity,
            },
            updates,
        ))
    }
}
