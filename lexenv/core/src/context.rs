//! Active frame of a task of control.
//!
//! Each tokio task has its own slot. A spawned task does not inherit the slot
//! of its spawner, it starts with no active frame.
use lexenv_structs::frame::Frame;
use std::future::Future;

tokio::task_local! {
    static ACTIVE_FRAME: Option<Frame>;
}

/// Frame addressed by the implicit resolution operations, if any.
pub fn active_frame() -> Option<Frame> {
    ACTIVE_FRAME.try_with(|frame| frame.clone()).ok().flatten()
}

/// Runs `body` with `frame` as active frame.
/// The enclosing active frame is back in place as soon as `body` completes,
/// is dropped or panics.
pub async fn with_active_frame<F: Future>(frame: Option<Frame>, body: F) -> F::Output {
    ACTIVE_FRAME.scope(frame, body).await
}

/// Runs `body` with no active frame, whatever the caller had in scope.
/// Entry points that can be invoked repeatedly go through it so that they
/// never start from the frame of a previous invocation.
pub async fn fresh_entry<F: Future>(body: F) -> F::Output {
    with_active_frame(None, body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use lexenv_structs::bindings;
    use std::panic::AssertUnwindSafe;

    fn active_id() -> Option<usize> {
        active_frame().map(|f| f.id())
    }

    #[tokio::test]
    async fn test_nested_scopes_restore_previous_frame() {
        let outer = Frame::root(bindings! {});
        let inner = Frame::root(bindings! {});
        assert_eq!(active_id(), None);
        with_active_frame(Some(outer.clone()), async {
            assert_eq!(active_id(), Some(outer.id()));
            with_active_frame(Some(inner.clone()), async {
                assert_eq!(active_id(), Some(inner.id()));
            })
            .await;
            assert_eq!(active_id(), Some(outer.id()));
            fresh_entry(async { assert_eq!(active_id(), None) }).await;
            assert_eq!(active_id(), Some(outer.id()));
        })
        .await;
        assert_eq!(active_id(), None);
    }

    #[tokio::test]
    async fn test_restored_after_panic() {
        let outer = Frame::root(bindings! {});
        let inner = Frame::root(bindings! {});
        with_active_frame(Some(outer.clone()), async {
            let result = AssertUnwindSafe(with_active_frame(Some(inner.clone()), async {
                panic!("body failed");
            }))
            .catch_unwind()
            .await;
            assert!(result.is_err());
            assert_eq!(active_id(), Some(outer.id()));
        })
        .await;
    }

    #[tokio::test]
    async fn test_spawned_task_starts_without_frame() {
        let outer = Frame::root(bindings! {});
        let seen = with_active_frame(Some(outer), async {
            tokio::spawn(async { active_id() }).await.unwrap()
        })
        .await;
        assert_eq!(seen, None);
    }
}
