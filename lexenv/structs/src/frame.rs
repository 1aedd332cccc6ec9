//! Storage cell of the environment tree.
//!
//! A [`Frame`] holds the bindings of one scope, a link to the frame of the
//! enclosing scope and the set of frames created directly inside it.
//! Every operation on a frame goes through its own async mutex, so requests
//! addressed to one frame are served one at a time in arrival order while
//! requests addressed to different frames never wait on each other.
//!
//! A child keeps its parent alive: a closure holding an inner frame can still
//! resolve names of the enclosing scopes after their creator returned.
//! A parent keeps its children alive too, until they are unlinked by a
//! teardown or a discard: a detached frame nobody refers to anymore stays in
//! the tree and is reached by the teardown of its ancestors.
use crate::error::{LexError, Result};
use crate::value::Value;
use function_name::named;
use itertools::Itertools;
use log::trace;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

pub type FrameId = usize;

/// Name → value mapping of a frame.
/// Cloning is cheap and never shares mutations, which gives frames
/// copy-on-create semantics for their seed bindings.
pub type Bindings = im::HashMap<String, Value>;

static NEXT_FRAME_ID: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameStatus {
    Alive,
    TearingDown,
    Discarded,
}

/// Outcome of an operation addressed to the own bindings of a frame.
/// `Unbound` hands back what the caller passed in, so that a chain walk can
/// forward it to the parent frame.
#[derive(Debug)]
pub enum Own<T, R> {
    Bound(T),
    Unbound(R),
}

struct FrameState {
    status: FrameStatus,
    bindings: Bindings,
    children: HashMap<FrameId, Frame>,
}

impl FrameState {
    fn check_not_discarded(&self, context: &str, id: FrameId) -> Result<()> {
        match self.status {
            FrameStatus::Discarded => Err(LexError::frame_discarded(context, id)),
            _ => Ok(()),
        }
    }

    fn sorted_children(&self) -> Vec<Frame> {
        self.children
            .values()
            .cloned()
            .sorted_by_key(|c| c.id())
            .collect()
    }
}

struct FrameCell {
    id: FrameId,
    parent: Option<Frame>,
    state: Mutex<FrameState>,
}

/// Handle on a frame. Clones address the same storage.
#[derive(Clone)]
pub struct Frame {
    inner: Arc<FrameCell>,
}

impl Frame {
    /// Creates a frame without parent.
    pub fn root(bindings: Bindings) -> Self {
        Self::create(bindings, None)
    }

    fn create(bindings: Bindings, parent: Option<Frame>) -> Self {
        let id = NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            inner: Arc::new(FrameCell {
                id,
                parent,
                state: Mutex::new(FrameState {
                    status: FrameStatus::Alive,
                    bindings,
                    children: Default::default(),
                }),
            }),
        }
    }

    /// Creates a frame whose parent is `self` and registers it as a child of
    /// `self` while holding the lock of `self`, so that a teardown of `self`
    /// either sees the new child or rejects its creation.
    #[named]
    pub async fn new_child(&self, bindings: Bindings) -> Result<Frame> {
        let mut state = self.inner.state.lock().await;
        if state.status != FrameStatus::Alive {
            return Err(LexError::scope_closed(function_name!(), self.id()));
        }
        let child = Frame::create(bindings, Some(self.clone()));
        state.children.insert(child.id(), child.clone());
        trace!("frame {} linked under frame {}", child.id(), self.id());
        Ok(child)
    }

    pub fn id(&self) -> FrameId {
        self.inner.id
    }

    pub fn parent(&self) -> Option<&Frame> {
        self.inner.parent.as_ref()
    }

    /// Number of enclosing frames.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(frame) = current {
            depth += 1;
            current = frame.parent();
        }
        depth
    }

    pub fn ptr_eq(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub async fn status(&self) -> FrameStatus {
        self.inner.state.lock().await.status
    }

    pub async fn is_alive(&self) -> bool {
        self.status().await == FrameStatus::Alive
    }

    /// Value bound to `name` in this frame only.
    /// `Ok(None)` means the name is not bound here, which is distinct from a
    /// name bound to [`Value::Nil`].
    #[named]
    pub async fn read_own(&self, name: &str) -> Result<Option<Value>> {
        let state = self.inner.state.lock().await;
        state.check_not_discarded(function_name!(), self.id())?;
        Ok(state.bindings.get(name).cloned())
    }

    /// Replaces the value of an existing binding of this frame.
    /// Never creates a binding: the set of names is fixed at creation.
    #[named]
    pub async fn write_own(&self, name: &str, value: Value) -> Result<Own<Value, Value>> {
        let mut state = self.inner.state.lock().await;
        state.check_not_discarded(function_name!(), self.id())?;
        match state.bindings.get_mut(name) {
            Some(slot) => {
                *slot = value.clone();
                Ok(Own::Bound(value))
            }
            None => Ok(Own::Unbound(value)),
        }
    }

    /// Reads, transforms and stores the value of `name` without releasing the
    /// lock of the frame in between. If `f` fails, the binding is left as is.
    #[named]
    pub async fn transform_own<F>(&self, name: &str, f: F) -> Result<Own<Value, F>>
    where
        F: FnOnce(Value) -> Result<Value>,
    {
        let mut state = self.inner.state.lock().await;
        state.check_not_discarded(function_name!(), self.id())?;
        match state.bindings.get_mut(name) {
            Some(slot) => {
                let new = f(slot.clone())?;
                *slot = new.clone();
                Ok(Own::Bound(new))
            }
            None => Ok(Own::Unbound(f)),
        }
    }

    /// Snapshot of the own bindings.
    #[named]
    pub async fn bindings(&self) -> Result<Bindings> {
        let state = self.inner.state.lock().await;
        state.check_not_discarded(function_name!(), self.id())?;
        Ok(state.bindings.clone())
    }

    #[named]
    pub async fn keys(&self) -> Result<Vec<String>> {
        let state = self.inner.state.lock().await;
        state.check_not_discarded(function_name!(), self.id())?;
        Ok(state.bindings.keys().cloned().sorted().collect())
    }

    /// Snapshot of the linked children, ordered by id.
    pub async fn children(&self) -> Vec<Frame> {
        self.inner.state.lock().await.sorted_children()
    }

    pub async fn has_child(&self, id: FrameId) -> bool {
        self.inner.state.lock().await.children.contains_key(&id)
    }

    /// Marks the frame as being torn down and returns its children.
    /// Returns `None` when a teardown has already begun or the frame is
    /// discarded. From then on no child can be linked under this frame.
    pub async fn begin_teardown(&self) -> Option<Vec<Frame>> {
        let mut state = self.inner.state.lock().await;
        match state.status {
            FrameStatus::Alive => {
                state.status = FrameStatus::TearingDown;
                Some(state.sorted_children())
            }
            _ => None,
        }
    }

    /// Removes `id` from the children of this frame.
    pub async fn unlink_child(&self, id: FrameId) -> bool {
        let removed = self.inner.state.lock().await.children.remove(&id).is_some();
        if removed {
            trace!("frame {} unlinked from frame {}", id, self.id());
        }
        removed
    }

    /// Drops the storage of the frame. Every later operation addressed to it
    /// fails. Returns false if it was already discarded.
    pub async fn discard(&self) -> bool {
        let mut state = self.inner.state.lock().await;
        if state.status == FrameStatus::Discarded {
            return false;
        }
        state.status = FrameStatus::Discarded;
        state.bindings = Bindings::new();
        state.children.clear();
        true
    }

    /// One line description: id, status and sorted bindings.
    pub async fn describe(&self) -> String {
        let state = self.inner.state.lock().await;
        let bindings = state
            .bindings
            .iter()
            .sorted_by(|a, b| a.0.cmp(b.0))
            .map(|(k, v)| format!("{}: {}", k, v))
            .join(", ");
        match state.status {
            FrameStatus::Discarded => format!("frame {} (discarded)", self.id()),
            FrameStatus::TearingDown => format!("frame {} (tearing down) {{{}}}", self.id(), bindings),
            FrameStatus::Alive => format!("frame {} {{{}}}", self.id(), bindings),
        }
    }
}

impl Debug for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("id", &self.id())
            .field("parent", &self.parent().map(|p| p.id()))
            .finish()
    }
}
