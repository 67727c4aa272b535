//! Demo application for the explorer mirror.
//!
//! This demonstrates the panel core against a scripted editor session:
//! 1. The tree materializes only what gets expanded
//! 2. Environment notifications forward immutable state snapshots
//! 3. A burst of cursor-idle ticks collapses into one diagnostics poll
//! 4. Losing focus persists the session

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use explorer_mirror::prelude::*;
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Stand-in for an editor binding: answers environment queries from
/// values the demo script pokes in.
struct DemoHost {
    window: AtomicU64,
    buffer_name: Mutex<Option<String>>,
    root: PathBuf,
}

impl DemoHost {
    fn new(root: PathBuf) -> Self {
        Self {
            window: AtomicU64::new(1),
            buffer_name: Mutex::new(None),
            root,
        }
    }
}

#[async_trait]
impl Host for DemoHost {
    async fn current_window(&self) -> Result<WindowId, HostError> {
        Ok(self.window.load(Ordering::SeqCst))
    }

    async fn current_buffer_name(&self) -> Result<Option<String>, HostError> {
        Ok(self.buffer_name.lock().await.clone())
    }

    async fn current_dir(&self) -> Result<PathBuf, HostError> {
        Ok(self.root.clone())
    }

    async fn poll_diagnostics(&self, floor: Severity) -> Result<DiagnosticsSnapshot, HostError> {
        println!("[Host] Diagnostics polled at floor {:?}", floor);
        Ok(DiagnosticsSnapshot(HashMap::from([
            (self.root.join("src").join("lib.rs"), 2),
            (self.root.join("src").join("main.rs"), 1),
        ])))
    }

    async fn poll_markers(&self) -> Result<MarkerSnapshot, HostError> {
        println!("[Host] Markers polled");
        Ok(MarkerSnapshot(HashMap::from([(
            self.root.join("src").join("lib.rs"),
            4,
        )])))
    }

    async fn persist_session(&self, state: &PanelState) {
        println!(
            "[Host] Session persisted ({} windows in history)",
            state.window_order.len()
        );
    }
}

/// Print the materialized part of the tree, stubs as bare labels.
fn print_tree(dir: &DirNode, root: &Path, depth: usize) {
    let indent = "  ".repeat(depth);
    println!("{}{}", indent, display_name(&dir.path, root));
    if let (Some(files), Some(children)) = (&dir.files, &dir.children) {
        for child in children {
            print_tree(child, root, depth + 1);
        }
        for file in files {
            println!("{}  {}", indent, display_name(&file.path, root));
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("explorer_mirror=debug".parse()?))
        .init();

    println!("=== Explorer Mirror Demo ===\n");
    println!("This demo drives the file-browser panel core through a");
    println!("scripted editor session.\n");

    // Mirror the given path, or the current directory
    let root = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir()?,
    };
    println!("Mirroring: {}\n", root.display());

    let host = Arc::new(DemoHost::new(root.clone()));

    // Build the router over the root
    // - 300ms idle timeout: slow enough to watch the burst collapse
    // - 256 buffer size: snapshot queue
    let (router, mut updates) = EventRouterBuilder::new(Arc::clone(&host), root.clone())
        .idle_timeout(Duration::from_millis(300))
        .buffer_size(256)
        .build()?;

    // Log every published snapshot
    tokio::spawn(async move {
        while let Ok(state) = updates.recv().await {
            tracing::debug!(
                "Snapshot published: focused={} windows={:?} current={:?}",
                state.focused,
                state.window_order,
                state.current_file,
            );
        }
    });

    let state = router.state().await;
    println!("Initial tree (only the root is materialized):");
    print_tree(state.tree.root(), &root, 0);

    // Expand the first subdirectory, if there is one
    let first_dir = state
        .tree
        .root()
        .children
        .as_ref()
        .and_then(|children| children.first())
        .map(|dir| dir.path.clone());
    if let Some(target) = first_dir {
        println!("\nExpanding {} ...", display_name(&target, &root));
        if let Some(after) = router.expand_dir(&target).await {
            print_tree(after.tree.root(), &root, 0);
        }
    }

    // Hop between windows; revisiting moves the id to the end
    println!("\nVisiting windows 1, 2, 3, then 2 again...");
    for win in [1, 2, 3, 2] {
        host.window.store(win, Ordering::SeqCst);
        router.route(EnvEvent::WindowEntered).await;
    }
    println!("Visit order: {:?}", router.state().await.window_order);

    // A burst of idle ticks costs exactly one poll
    println!("\nSimulating a burst of 5 cursor-idle ticks...");
    for _ in 0..5 {
        router.route(EnvEvent::CursorIdle).await;
    }
    tokio::time::sleep(Duration::from_millis(600)).await;
    println!(
        "Diagnostics entries after the debounced poll: {}",
        router.state().await.diagnostics.0.len()
    );

    // Follow the first file in the root, if there is one
    let first_file = router
        .state()
        .await
        .tree
        .root()
        .files
        .as_ref()
        .and_then(|files| files.first())
        .map(|file| file.path.clone());
    if let Some(target) = first_file {
        *host.buffer_name.lock().await = Some(target.to_string_lossy().into_owned());
        if let Some(state) = router.route(EnvEvent::BufferEntered).await {
            println!(
                "\nFollowing {}",
                state
                    .current_file
                    .as_deref()
                    .map(|p| display_name(p, &root))
                    .unwrap_or_default()
            );
        }
    }

    // Quickfix finished somewhere; pick up the markers
    router.route(EnvEvent::ListCommandDone).await;

    // Losing focus is a save point
    println!("\nEditor loses focus...");
    router.route(EnvEvent::FocusLost).await;

    // Cleanup
    router.shutdown().await;
    println!("\nDone!");

    Ok(())
}
