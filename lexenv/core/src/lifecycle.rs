//! Creation and destruction of frames.
//!
//! Scopes come in two flavours, each with its own entry point:
//! - [`enter_detached`]: the frame lives until [`teardown`] is called on it
//!   or on one of its ancestors. Forgetting to tear it down keeps it alive as
//!   long as something references it.
//! - [`enter_bound`]: the frame is discarded when the task running the scope
//!   ends (see [`run_task`](crate::task::run_task)), or when the body returns
//!   if the scope does not run inside a task.
use crate::context::{active_frame, with_active_frame};
use crate::task::{bind_to_current_task, release_after, BoundFrames};
use async_recursion::async_recursion;
use function_name::named;
use futures::future::join_all;
use lexenv_structs::error::Result;
use lexenv_structs::frame::{Bindings, Frame};
use log::{debug, warn};
use std::future::Future;

/// Creates a frame under the active frame, or a root frame if there is none.
/// Creation and registration in the parent happen in one critical section.
async fn create_frame(bindings: Bindings) -> Result<Frame> {
    match active_frame() {
        Some(parent) => match parent.new_child(bindings).await {
            Ok(frame) => Ok(frame),
            Err(e) => {
                warn!("scope entry under frame {} rejected", parent.id());
                Err(e)
            }
        },
        None => Ok(Frame::root(bindings)),
    }
}

/// Creates a detached frame under the active frame without entering it.
/// The caller is responsible for its teardown.
#[named]
pub async fn open_detached(bindings: Bindings) -> Result<Frame> {
    let frame = create_frame(bindings)
        .await
        .map_err(|e| e.chain(function_name!()))?;
    debug!("frame {} opened (depth {})", frame.id(), frame.depth());
    Ok(frame)
}

/// Enters a scope whose frame outlives the body: closures can keep using the
/// frame after the body returned, until it is torn down.
/// The body receives the frame, which is the active frame while it runs.
#[named]
pub async fn enter_detached<B, Fut>(bindings: Bindings, body: B) -> Result<Fut::Output>
where
    B: FnOnce(Frame) -> Fut,
    Fut: Future,
{
    let frame = create_frame(bindings)
        .await
        .map_err(|e| e.chain(function_name!()))?;
    let id = frame.id();
    debug!("enter detached frame {} (depth {})", id, frame.depth());
    let output = with_active_frame(Some(frame.clone()), async move { body(frame).await }).await;
    debug!("exit frame {}", id);
    Ok(output)
}

/// Enters a scope whose frame is bound to the task running it.
/// Inside [`run_task`](crate::task::run_task) the frame stays usable until the
/// task ends; outside of any task it is discarded when the body returns.
#[named]
pub async fn enter_bound<B, Fut>(bindings: Bindings, body: B) -> Result<Fut::Output>
where
    B: FnOnce(Frame) -> Fut,
    Fut: Future,
{
    let frame = create_frame(bindings)
        .await
        .map_err(|e| e.chain(function_name!()))?;
    let id = frame.id();
    let scoped = with_active_frame(Some(frame.clone()), {
        let frame = frame.clone();
        async move { body(frame).await }
    });
    let output = if bind_to_current_task(&frame) {
        debug!("enter frame {} bound to the current task", id);
        scoped.await
    } else {
        debug!("enter frame {} bound to its body", id);
        release_after(BoundFrames::single(frame), scoped).await
    };
    debug!("exit frame {}", id);
    Ok(output)
}

/// Unlinks `frame` from its parent and drops its storage, leaving its
/// children in place. Returns false if it was already discarded.
pub async fn discard(frame: &Frame) -> bool {
    if let Some(parent) = frame.parent() {
        parent.unlink_child(frame.id()).await;
    }
    let discarded = frame.discard().await;
    if discarded {
        debug!("frame {} discarded", frame.id());
    }
    discarded
}

/// Tears down `frame` and all its descendants, children first.
/// Tearing down `None` or a frame whose teardown has already begun does
/// nothing. Returns the number of frames discarded by this call.
pub async fn teardown(frame: Option<&Frame>) -> usize {
    match frame {
        Some(frame) => teardown_frame(frame).await,
        None => 0,
    }
}

/// Tears down the active frame and its subtree.
pub async fn free_active() -> usize {
    let frame = active_frame();
    teardown(frame.as_ref()).await
}

#[async_recursion]
async fn teardown_frame(frame: &Frame) -> usize {
    let children = match frame.begin_teardown().await {
        Some(children) => children,
        None => return 0,
    };
    // Siblings are independent subtrees.
    let descendants: usize = join_all(children.iter().map(|child| teardown_frame(child)))
        .await
        .into_iter()
        .sum();
    if let Some(parent) = frame.parent() {
        parent.unlink_child(frame.id()).await;
    }
    frame.discard().await;
    debug!(
        "frame {} torn down with {} descendant(s)",
        frame.id(),
        descendants
    );
    descendants + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::{get, get_in, set, update};
    use lexenv_structs::bindings;
    use lexenv_structs::error::ErrorKind;
    use lexenv_structs::frame::FrameStatus;
    use lexenv_structs::value::Value;

    #[tokio::test]
    async fn test_enter_links_under_active_frame() -> Result<()> {
        let (outer, inner) = enter_detached(bindings! {"a" => 1}, |outer| async move {
            let inner = enter_detached(bindings! {"b" => 2}, |inner| async move {
                assert!(active_frame().unwrap().ptr_eq(&inner));
                inner
            })
            .await
            .unwrap();
            assert!(active_frame().unwrap().ptr_eq(&outer));
            (outer, inner)
        })
        .await?;
        assert!(active_frame().is_none());
        assert!(inner.parent().unwrap().ptr_eq(&outer));
        assert!(outer.has_child(inner.id()).await);
        assert!(outer.parent().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_closure_keeps_detached_chain() -> Result<()> {
        let counter = enter_detached(bindings! {"count" => 0}, |_| async {
            enter_detached(bindings! {"step" => 5}, |inner| async move { inner })
                .await
                .unwrap()
        })
        .await?;
        // The creating scopes have returned, the captured frame still resolves
        // the binding of its parent.
        let add = |frame: Frame| async move {
            crate::resolution::update_in(Some(&frame), "count", |v| {
                v.try_add(&5.into()).unwrap_or(v)
            })
            .await
        };
        assert_eq!(add(counter.clone()).await?, Value::from(5));
        assert_eq!(add(counter.clone()).await?, Value::from(10));
        assert_eq!(get_in(Some(&counter), "step").await?, Value::from(5));
        Ok(())
    }

    #[tokio::test]
    async fn test_teardown_subtree() -> Result<()> {
        let root = open_detached(bindings! {"r" => 0}).await?;
        let (child, grandchild, sibling) = with_active_frame(Some(root.clone()), async {
            let child = open_detached(bindings! {"c" => 1}).await.unwrap();
            let grandchild = with_active_frame(Some(child.clone()), async {
                open_detached(bindings! {"g" => 2}).await.unwrap()
            })
            .await;
            let sibling = open_detached(bindings! {"s" => 3}).await.unwrap();
            (child, grandchild, sibling)
        })
        .await;

        assert_eq!(teardown(Some(&child)).await, 2);
        assert_eq!(child.status().await, FrameStatus::Discarded);
        assert_eq!(grandchild.status().await, FrameStatus::Discarded);
        assert!(!root.has_child(child.id()).await);
        assert!(root.has_child(sibling.id()).await);
        assert!(sibling.is_alive().await);

        let err = get_in(Some(&grandchild), "r").await.unwrap_err();
        assert!(err.is_binding_not_found());

        // idempotent
        assert_eq!(teardown(Some(&child)).await, 0);
        assert_eq!(teardown(None).await, 0);

        assert_eq!(teardown(Some(&root)).await, 2);
        assert!(!sibling.is_alive().await);
        Ok(())
    }

    #[tokio::test]
    async fn test_teardown_reaches_unreferenced_detached_child() -> Result<()> {
        let root = open_detached(bindings! {"a" => 1}).await?;
        with_active_frame(Some(root.clone()), async {
            enter_detached(bindings! {"b" => 2}, |_| async {}).await
        })
        .await?;
        let children = root.children().await;
        assert_eq!(children.len(), 1);
        let child = children[0].clone();
        drop(children);
        assert_eq!(teardown(Some(&root)).await, 2);
        assert_eq!(child.status().await, FrameStatus::Discarded);
        assert!(root.children().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_free_active() -> Result<()> {
        let frame = enter_detached(bindings! {"x" => 1}, |frame| async move {
            assert_eq!(free_active().await, 1);
            assert!(get("x").await.unwrap_err().is_binding_not_found());
            assert!(set("x", 2).await.unwrap_err().is_binding_not_found());
            assert!(update("x", |v| v).await.unwrap_err().is_binding_not_found());
            frame
        })
        .await?;
        assert!(!frame.is_alive().await);
        assert_eq!(free_active().await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_entry_rejected_under_frame_being_torn_down() -> Result<()> {
        let root = open_detached(bindings! {}).await?;
        assert!(root.begin_teardown().await.is_some());
        let err = with_active_frame(Some(root.clone()), async {
            enter_detached(bindings! {}, |_| async {}).await
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ScopeClosed(root.id()));
        Ok(())
    }

    #[tokio::test]
    async fn test_discard_leaves_children() -> Result<()> {
        let root = open_detached(bindings! {}).await?;
        let child = with_active_frame(Some(root.clone()), async {
            open_detached(bindings! {"c" => 1}).await.unwrap()
        })
        .await;
        let grandchild = with_active_frame(Some(child.clone()), async {
            open_detached(bindings! {"g" => 1}).await.unwrap()
        })
        .await;
        assert!(discard(&child).await);
        assert!(!discard(&child).await);
        assert!(!root.has_child(child.id()).await);
        assert!(grandchild.is_alive().await);
        assert_eq!(get_in(Some(&grandchild), "g").await?, Value::from(1));
        assert!(get_in(Some(&grandchild), "c")
            .await
            .unwrap_err()
            .is_binding_not_found());
        Ok(())
    }
}
