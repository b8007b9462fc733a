//! In-memory multiplication graph.
//!
//! This is the reference implementation of `MultiplicationGraph`.
//!
//! ## Model
//!
//! The graph is stored as a row of *export lanes*. A lane is one concrete
//! export (timespan × channel config × format × filename). Every node covers
//! a contiguous, non-empty run of lanes, its *width*, and at every level the
//! nodes' runs tile `[0, lanes)` in sequence order:
//!
//! ```text
//! lane:            0        1        2
//! Timespans:     [ Verse          ][ Chorus ]
//! ChannelConfigs:[ Stereo                    ]
//! Formats:       [ WAV    ][ FLAC            ]
//! Filenames:     [ a      ][ b      ][ c     ]
//! ```
//!
//! Following one lane downward is a fan-out path, so `a` is an ancestor of
//! `b` exactly when `a` ranks above `b` and their lane runs overlap. Since
//! runs are contiguous and levels tile the same lanes, every relation run is
//! contiguous too.
//!
//! ## Limitations
//!
//! - Only node ids and labels are stored; the actual timespan/format payloads
//!   live with the caller.
//! - Listeners are called synchronously on the mutating thread.

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::model::*;
use crate::{Error, Result};
use super::{ChangeListener, MultiplicationGraph, SubscriptionId};

/// Short node lists (parents, children, overlap sets).
pub type NodeList = SmallVec<[NodeId; 4]>;

// ============================================================================
// MemoryGraph
// ============================================================================

/// In-memory export graph. Cloning yields another handle to the same graph.
#[derive(Clone)]
pub struct MemoryGraph {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    state: RwLock<GraphState>,
    listeners: Mutex<Vec<(SubscriptionId, Arc<dyn Fn() + Send + Sync>)>>,
    next_node_id: AtomicU64,
    next_subscription_id: AtomicU64,
}

#[derive(Default)]
struct GraphState {
    levels: [Vec<NodeId>; 4],
    slots: HashMap<NodeId, Slot>,
    lanes: usize,
    revision: u64,
}

struct Slot {
    node: Node,
    /// Number of lanes covered.
    width: usize,
}

impl MemoryGraph {
    /// An empty graph: no lanes, no nodes at any level.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                state: RwLock::new(GraphState::default()),
                listeners: Mutex::new(Vec::new()),
                next_node_id: AtomicU64::new(1),
                next_subscription_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }

    fn alloc_id(&self) -> NodeId {
        NodeId(self.inner.next_node_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Sequence of `level` without the `Result` wrapper.
    pub fn nodes_at(&self, level: Level) -> Vec<NodeId> {
        let state = self.inner.state.read();
        match level.index() {
            Some(i) => state.levels[i].clone(),
            None => Vec::new(),
        }
    }

    /// Number of export lanes.
    pub fn lanes(&self) -> usize {
        self.inner.state.read().lanes
    }

    /// Incremented by every successful mutation.
    pub fn revision(&self) -> u64 {
        self.inner.state.read().revision
    }

    /// Lanes covered by `id`.
    pub fn span(&self, id: NodeId) -> Result<Range<usize>> {
        self.inner.state.read().span(id)
    }

    /// Nodes at the next level down that `id` fans out to.
    pub fn children(&self, id: NodeId) -> Result<NodeList> {
        let state = self.inner.state.read();
        let level = state.slot(id)?.node.level;
        match level.child() {
            Some(child) => Ok(state.overlapping(child, state.span(id)?)),
            None => Ok(NodeList::new()),
        }
    }

    /// Nodes at the next level up that fan out to `id`.
    pub fn parents(&self, id: NodeId) -> Result<NodeList> {
        let state = self.inner.state.read();
        let level = state.slot(id)?.node.level;
        match level.parent() {
            Some(parent) => Ok(state.overlapping(parent, state.span(id)?)),
            None => Ok(NodeList::new()),
        }
    }

    /// Rename a node. Fires the change notification.
    pub fn set_label(&self, id: NodeId, label: impl Into<String>) -> Result<()> {
        {
            let mut state = self.inner.state.write();
            let slot = state.slot_mut(id)?;
            slot.node.label = label.into();
            state.revision += 1;
        }
        self.notify();
        Ok(())
    }

    fn notify(&self) {
        // Snapshot first so a listener may (un)subscribe while being called.
        let listeners: Vec<_> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener();
        }
    }
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("MemoryGraph")
            .field("lanes", &state.lanes)
            .field("levels", &state.levels)
            .field("revision", &state.revision)
            .finish()
    }
}

// ============================================================================
// GraphState helpers
// ============================================================================

fn level_index(level: Level) -> Result<usize> {
    level
        .index()
        .ok_or_else(|| Error::InvalidLevel("NoLevel has no sequence".into()))
}

fn overlap(a: &Range<usize>, b: &Range<usize>) -> usize {
    a.end.min(b.end).saturating_sub(a.start.max(b.start))
}

impl GraphState {
    fn slot(&self, id: NodeId) -> Result<&Slot> {
        self.slots.get(&id).ok_or(Error::NodeNotFound(id))
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot> {
        self.slots.get_mut(&id).ok_or(Error::NodeNotFound(id))
    }

    /// Lane runs of every node at `level`, in sequence order.
    fn spans(&self, level: Level) -> Vec<(NodeId, Range<usize>)> {
        let Some(i) = level.index() else { return Vec::new() };
        let mut start = 0;
        self.levels[i]
            .iter()
            .map(|&id| {
                let width = self.slots.get(&id).map_or(0, |s| s.width);
                let span = start..start + width;
                start += width;
                (id, span)
            })
            .collect()
    }

    fn span(&self, id: NodeId) -> Result<Range<usize>> {
        let level = self.slot(id)?.node.level;
        self.spans(level)
            .into_iter()
            .find(|(n, _)| *n == id)
            .map(|(_, span)| span)
            .ok_or(Error::NodeNotFound(id))
    }

    fn overlapping(&self, level: Level, lanes: Range<usize>) -> NodeList {
        self.spans(level)
            .into_iter()
            .filter(|(_, span)| overlap(span, &lanes) > 0)
            .map(|(id, _)| id)
            .collect()
    }

    /// The node owning each lane at `level`.
    fn lane_owners(&self, level: Level) -> Vec<NodeId> {
        self.spans(level)
            .into_iter()
            .flat_map(|(id, span)| std::iter::repeat_n(id, span.len()))
            .collect()
    }

    fn insert_after(&mut self, level: usize, anchor: NodeId, slot: Slot) {
        let seq = &mut self.levels[level];
        let at = seq.iter().position(|&n| n == anchor).map_or(seq.len(), |p| p + 1);
        seq.insert(at, slot.node.id);
        self.slots.insert(slot.node.id, slot);
    }

    fn validate(&self) -> Result<()> {
        for level in Level::ALL {
            let total: usize = self.spans(level).iter().map(|(_, s)| s.len()).sum();
            if total != self.lanes {
                return Err(Error::InvalidGraph(format!(
                    "level {level} covers {total} lanes, expected {}",
                    self.lanes
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// MultiplicationGraph impl
// ============================================================================

impl MultiplicationGraph for MemoryGraph {
    fn nodes(&self, level: Level) -> Result<Vec<NodeId>> {
        Ok(self.nodes_at(level))
    }

    fn node(&self, id: NodeId) -> Result<Option<Node>> {
        Ok(self.inner.state.read().slots.get(&id).map(|s| s.node.clone()))
    }

    fn sequences(&self) -> Result<LevelSequences> {
        // One read guard for all four levels.
        let state = self.inner.state.read();
        let mut seqs = LevelSequences::new();
        for (level, nodes) in Level::ALL.into_iter().zip(state.levels.iter()) {
            seqs.set(level, nodes.clone());
        }
        Ok(seqs)
    }

    fn is_ancestor_of(&self, node: NodeId, other: NodeId) -> Result<bool> {
        let state = self.inner.state.read();
        let (a, b) = (state.slot(node)?, state.slot(other)?);
        if a.node.level >= b.node.level {
            return Ok(false);
        }
        Ok(overlap(&state.span(node)?, &state.span(other)?) > 0)
    }

    fn equals(&self, node: NodeId, other: NodeId) -> Result<bool> {
        let state = self.inner.state.read();
        state.slot(node)?;
        state.slot(other)?;
        Ok(node == other)
    }

    fn split_node(&self, node: NodeId, position: f32) -> Result<()> {
        if !(0.0..1.0).contains(&position) {
            warn!("split_node: rejected position {position} for node {node}");
            return Err(Error::InvalidPosition(position));
        }

        let new_id = self.alloc_id();
        {
            let mut state = self.inner.state.write();
            let slot = state.slot(node)?;
            let (level, width, label) = (slot.node.level, slot.width, slot.node.label.clone());
            let li = level_index(level)?;

            let new_width = if width >= 2 {
                let cut = ((position * width as f32).round() as usize).clamp(1, width - 1);
                state.slot_mut(node)?.width = cut;
                width - cut
            } else {
                // Multiply the single lane: every node covering it on the
                // other levels now fans out to both halves.
                let lane = state.span(node)?.start;
                for other in Level::ALL.into_iter().filter(|&l| l != level) {
                    if let Some(&owner) = state.lane_owners(other).get(lane) {
                        state.slot_mut(owner)?.width += 1;
                    }
                }
                state.lanes += 1;
                1
            };

            state.insert_after(li, node, Slot {
                node: Node::new(new_id, level, label),
                width: new_width,
            });
            state.revision += 1;
            debug!("split_node: {level} node {node} at {position} -> new node {new_id} ({new_width} lanes)");
        }
        self.notify();
        Ok(())
    }

    fn remove_node(&self, node: NodeId) -> Result<()> {
        {
            let mut state = self.inner.state.write();
            let level = state.slot(node)?.node.level;
            let li = level_index(level)?;
            if state.levels[li].len() == 1 {
                warn!("remove_node: refusing to remove last {level} node {node}");
                return Err(Error::LastNode { node, level });
            }

            let removed_lanes = state.span(node)?;
            let mut dropped: Vec<NodeId> = vec![node];
            for other in Level::ALL.into_iter().filter(|&l| l != level) {
                for (id, span) in state.spans(other) {
                    let shared = overlap(&span, &removed_lanes);
                    if shared == 0 {
                        continue;
                    }
                    let slot = state.slot_mut(id)?;
                    slot.width -= shared;
                    if slot.width == 0 {
                        dropped.push(id);
                    }
                }
            }

            for id in &dropped {
                if let Some(slot) = state.slots.remove(id) {
                    if let Some(i) = slot.node.level.index() {
                        state.levels[i].retain(|n| n != id);
                    }
                }
            }
            state.lanes -= removed_lanes.len();
            state.revision += 1;
            debug!(
                "remove_node: {level} node {node} ({} lanes), {} nodes dropped",
                removed_lanes.len(),
                dropped.len()
            );
        }
        self.notify();
        Ok(())
    }

    fn subscribe(&self, listener: ChangeListener) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_subscription_id.fetch_add(1, Ordering::Relaxed));
        self.inner.listeners.lock().push((id, Arc::from(listener)));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.inner.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    fn configurations(&self) -> Result<Vec<ExportConfig>> {
        let state = self.inner.state.read();
        let [ts, cc, fmt, fname] = Level::ALL.map(|l| state.lane_owners(l));
        Ok((0..state.lanes)
            .map(|lane| ExportConfig {
                timespan: ts[lane],
                channel_config: cc[lane],
                format: fmt[lane],
                filename: fname[lane],
            })
            .collect())
    }
}

// ============================================================================
// GraphBuilder
// ============================================================================

/// Builds a `MemoryGraph` level by level.
///
/// Nodes are appended to their level in call order; `width` is the number
/// of lanes the node covers. All four levels must cover the same number of
/// lanes.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    entries: Vec<(Level, String, usize)>,
}

impl GraphBuilder {
    pub fn node(mut self, level: Level, label: impl Into<String>, width: usize) -> Self {
        self.entries.push((level, label.into(), width));
        self
    }

    pub fn build(self) -> Result<MemoryGraph> {
        let graph = MemoryGraph::new();
        {
            let mut state = graph.inner.state.write();
            for (level, label, width) in self.entries {
                let li = level_index(level)
                    .map_err(|_| Error::InvalidGraph(format!("node '{label}' has no level")))?;
                if width == 0 {
                    return Err(Error::InvalidGraph(format!("node '{label}' covers no lanes")));
                }
                let id = graph.alloc_id();
                state.levels[li].push(id);
                state.slots.insert(id, Slot { node: Node::new(id, level, label), width });
            }
            state.lanes = state.spans(Level::Timespans).iter().map(|(_, s)| s.len()).sum();
            state.validate()?;
        }
        Ok(graph)
    }
}
