//! Layout engine: keeps the table layout in step with the graph.
//!
//! The engine subscribes to the graph's change notification. A notification
//! only bumps a pending counter; the layout is rebuilt when pending
//! notifications are processed, either explicitly or right after an edit
//! the engine forwarded itself.
//!
//! A rebuild is all-or-nothing: on any error the previous layout stays
//! published and no layout listener fires. There is no automatic retry;
//! the next change notification triggers the next attempt.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use hashbrown::HashSet;
use tracing::{debug, warn};

use crate::graph::{MultiplicationGraph, SubscriptionId};
use crate::model::*;
use crate::Result;
use super::{EngineConfig, Layout};

/// Callback fired once per completed layout pass.
pub type LayoutListener = Box<dyn FnMut(&Layout) + Send>;

/// Computes and caches column bounds for a `MultiplicationGraph`.
pub struct LayoutEngine<G: MultiplicationGraph> {
    graph: G,
    config: EngineConfig,
    subscription: SubscriptionId,
    /// Change notifications received since the last processed batch.
    pending: Arc<AtomicU64>,
    layout: Layout,
    selection: HashSet<NodeId>,
    listeners: Vec<LayoutListener>,
}

impl<G: MultiplicationGraph> LayoutEngine<G> {
    /// Subscribe to `graph` and compute the initial layout.
    pub fn attach(graph: G, config: EngineConfig) -> Result<Self> {
        let pending = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&pending);
        let subscription = graph.subscribe(Box::new(move || {
            counter.fetch_add(1, Ordering::AcqRel);
        }));

        let mut engine = Self {
            graph,
            config,
            subscription,
            pending,
            layout: Layout::empty(),
            selection: HashSet::new(),
            listeners: Vec::new(),
        };
        engine.recompute()?;
        Ok(engine)
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The last successfully computed layout.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Column bounds of `node`, `None` if the node is not in the layout.
    pub fn bound(&self, node: NodeId) -> Option<Bound> {
        self.layout.bound(node)
    }

    pub fn widest_level(&self) -> Level {
        self.layout.widest_level()
    }

    /// Register a callback fired after every completed layout pass.
    pub fn on_layout_changed(&mut self, listener: LayoutListener) {
        self.listeners.push(listener);
    }

    /// True if the graph reported changes that are not yet laid out.
    pub fn has_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire) > 0
    }

    // ========================================================================
    // Recompute
    // ========================================================================

    /// Rebuild the layout if the graph has changed since the last pass.
    /// Returns whether a pass ran.
    pub fn process_notifications(&mut self) -> Result<bool> {
        let received = self.pending.swap(0, Ordering::AcqRel);
        if received == 0 {
            return Ok(false);
        }
        debug!("layout: {received} change notification(s) pending");
        self.recompute()?;
        Ok(true)
    }

    /// Rebuild every bound from a fresh snapshot of the graph.
    pub fn recompute(&mut self) -> Result<()> {
        let layout = self
            .graph
            .sequences()
            .and_then(|seqs| Layout::compute(&self.graph, seqs, &self.config));

        let layout = match layout {
            Ok(layout) => layout,
            Err(e) => {
                warn!("layout: pass aborted, keeping previous layout: {e}");
                return Err(e);
            }
        };

        self.selection.retain(|id| layout.contains(*id));
        self.layout = layout;
        debug!(
            "layout: {} nodes, widest {} ({} columns)",
            self.layout.len(),
            self.layout.widest_level(),
            self.layout.width()
        );

        for listener in &mut self.listeners {
            listener(&self.layout);
        }
        Ok(())
    }

    // ========================================================================
    // Edit dispatch
    // ========================================================================

    /// Forward a split to the graph, then lay out the result.
    ///
    /// `position` is the fraction of the node's rendered extent where the
    /// split happened; it is passed through unchanged.
    pub fn request_split(&mut self, node: NodeId, position: f32) -> Result<()> {
        debug!("layout: split request for node {node} at {position}");
        self.graph.split_node(node, position)?;
        self.process_notifications()?;
        Ok(())
    }

    /// Forward a removal to the graph, then lay out the result.
    pub fn request_remove(&mut self, node: NodeId) -> Result<()> {
        debug!("layout: remove request for node {node}");
        self.graph.remove_node(node)?;
        self.process_notifications()?;
        Ok(())
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Select a node. Returns false if it is not in the current layout.
    pub fn select(&mut self, node: NodeId) -> bool {
        if !self.layout.contains(node) {
            return false;
        }
        self.selection.insert(node);
        true
    }

    pub fn deselect(&mut self, node: NodeId) -> bool {
        self.selection.remove(&node)
    }

    /// Flip the selection state of a node. Returns the new state.
    pub fn toggle_selected(&mut self, node: NodeId) -> bool {
        if self.selection.remove(&node) {
            false
        } else {
            self.select(node)
        }
    }

    pub fn is_selected(&self, node: NodeId) -> bool {
        self.selection.contains(&node)
    }

    pub fn selection(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.selection.iter().copied()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }
}

impl<G: MultiplicationGraph> Drop for LayoutEngine<G> {
    fn drop(&mut self) {
        self.graph.unsubscribe(self.subscription);
    }
}
