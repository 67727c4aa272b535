//! Authoritative panel state and its replacement mechanics.
//!
//! State is an immutable snapshot behind an `Arc`. The only way it
//! changes is [`StateCell::forward`], which applies a sparse set of
//! field overrides, swaps in the whole new value, and publishes the
//! snapshot to subscribers, all under one write guard. Readers holding
//! an older snapshot are never mutated underneath.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use crate::tree::TreeIndex;

/// Identifier of an editor window as reported by the host.
pub type WindowId = u64;

/// Diagnostic severity, ordered like LSP: lower values are more severe.
///
/// The mirror only ever uses this as the floor passed to the host when
/// polling; it never inspects individual diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Hard errors.
    Error = 1,
    /// Warnings; the default polling floor.
    #[default]
    Warning = 2,
    /// Informational notes.
    Information = 3,
    /// Hints.
    Hint = 4,
}

/// Diagnostic counts per path, as last polled from the host. Opaque to
/// the mirror: stored and forwarded, never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticsSnapshot(pub HashMap<PathBuf, usize>);

/// List-command marker counts per path (quickfix locations and the
/// like), as last polled from the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerSnapshot(pub HashMap<PathBuf, usize>);

/// One immutable snapshot of everything the panel reflects.
#[derive(Debug, Clone)]
pub struct PanelState {
    /// The mirrored tree: selection plus materialized root.
    pub tree: Arc<TreeIndex>,
    /// File the panel currently follows, when there is one.
    pub current_file: Option<PathBuf>,
    /// Whether the editor currently has focus.
    pub focused: bool,
    /// Window ids in visit order, oldest first, each id at most once.
    pub window_order: Vec<WindowId>,
    /// Most recently polled diagnostics.
    pub diagnostics: DiagnosticsSnapshot,
    /// Most recently polled markers.
    pub markers: MarkerSnapshot,
    /// Paths whose subtrees are exempt from buffer following.
    pub ignored: HashSet<PathBuf>,
}

impl PanelState {
    /// Initial state over a freshly built tree: focused, nothing
    /// followed, no windows visited, empty snapshots.
    pub fn new(tree: TreeIndex) -> Self {
        Self {
            tree: Arc::new(tree),
            current_file: None,
            focused: true,
            window_order: Vec::new(),
            diagnostics: DiagnosticsSnapshot::default(),
            markers: MarkerSnapshot::default(),
            ignored: HashSet::new(),
        }
    }

    /// Apply sparse overrides, carrying every untouched field over
    /// unchanged. Pure; the caller decides what to do with the result.
    pub fn apply(&self, delta: StateDelta) -> Self {
        Self {
            tree: delta.tree.unwrap_or_else(|| Arc::clone(&self.tree)),
            current_file: delta
                .current_file
                .or_else(|| self.current_file.clone()),
            focused: delta.focused.unwrap_or(self.focused),
            window_order: delta
                .window_order
                .unwrap_or_else(|| self.window_order.clone()),
            diagnostics: delta
                .diagnostics
                .unwrap_or_else(|| self.diagnostics.clone()),
            markers: delta.markers.unwrap_or_else(|| self.markers.clone()),
            ignored: delta.ignored.unwrap_or_else(|| self.ignored.clone()),
        }
    }
}

/// Sparse field overrides for [`PanelState::apply`]. Fields left unset
/// keep their current value.
#[derive(Debug, Clone, Default)]
pub struct StateDelta {
    tree: Option<Arc<TreeIndex>>,
    current_file: Option<PathBuf>,
    focused: Option<bool>,
    window_order: Option<Vec<WindowId>>,
    diagnostics: Option<DiagnosticsSnapshot>,
    markers: Option<MarkerSnapshot>,
    ignored: Option<HashSet<PathBuf>>,
}

impl StateDelta {
    /// An empty delta; applying it reproduces the current state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the mirrored tree.
    pub fn tree(mut self, tree: TreeIndex) -> Self {
        self.tree = Some(Arc::new(tree));
        self
    }

    /// Advance the followed file.
    pub fn current_file(mut self, path: PathBuf) -> Self {
        self.current_file = Some(path);
        self
    }

    /// Record whether the editor has focus.
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = Some(focused);
        self
    }

    /// Replace the window visit order.
    pub fn window_order(mut self, order: Vec<WindowId>) -> Self {
        self.window_order = Some(order);
        self
    }

    /// Replace the diagnostics snapshot.
    pub fn diagnostics(mut self, snapshot: DiagnosticsSnapshot) -> Self {
        self.diagnostics = Some(snapshot);
        self
    }

    /// Replace the marker snapshot.
    pub fn markers(mut self, snapshot: MarkerSnapshot) -> Self {
        self.markers = Some(snapshot);
        self
    }

    /// Replace the set of paths exempt from buffer following.
    pub fn ignored(mut self, ignored: HashSet<PathBuf>) -> Self {
        self.ignored = Some(ignored);
        self
    }
}

/// Window visit order after entering `win`: the id moves to the end,
/// leaving its old slot when already present, while every other id keeps
/// its relative position.
pub fn visit_order(order: &[WindowId], win: WindowId) -> Vec<WindowId> {
    let mut next: Vec<WindowId> = order.iter().copied().filter(|&w| w != win).collect();
    next.push(win);
    next
}

/// Single-writer holder of the authoritative snapshot.
///
/// Replacement happens entirely under the write guard: read the current
/// value, apply the delta, swap, publish. There is no suspension point
/// in between, so concurrent forwards serialize cleanly instead of
/// clobbering each other's fields, and subscribers observe snapshots in
/// swap order.
#[derive(Debug)]
pub struct StateCell {
    current: RwLock<Arc<PanelState>>,
    updates: broadcast::Sender<Arc<PanelState>>,
}

impl StateCell {
    /// Create a cell over `initial`. `buffer_size` bounds the snapshot
    /// broadcast queue; a subscriber that lags past it observes a lag
    /// error and should resynchronize from [`StateCell::snapshot`].
    pub fn new(initial: PanelState, buffer_size: usize) -> Self {
        let (updates, _) = broadcast::channel(buffer_size);
        Self {
            current: RwLock::new(Arc::new(initial)),
            updates,
        }
    }

    /// The current snapshot.
    pub async fn snapshot(&self) -> Arc<PanelState> {
        Arc::clone(&*self.current.read().await)
    }

    /// Replace the state with `current.apply(delta)`, publish the new
    /// snapshot, and return it.
    pub async fn forward(&self, delta: StateDelta) -> Arc<PanelState> {
        let mut guard = self.current.write().await;
        let next = Arc::new(guard.apply(delta));
        *guard = Arc::clone(&next);
        // Sent under the guard so publish order matches swap order. A
        // send failure just means nobody is subscribed right now.
        let _ = self.updates.send(Arc::clone(&next));
        next
    }

    /// Subscribe to snapshots produced by future forwards.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<PanelState>> {
        self.updates.subscribe()
    }
}
