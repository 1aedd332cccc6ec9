//! Tasks of control and the frames bound to their lifetime.
//!
//! [`run_task`] gives a future its own active-frame slot and its own registry
//! of bound frames. Frames entered with
//! [`enter_bound`](crate::lifecycle::enter_bound) inside it are discarded
//! when the task ends, whether it completes, is aborted or panics.
//! # Example
//! ```
//! use lexenv_core::{enter_bound, run_task};
//! use lexenv_structs::bindings;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let frame = run_task(async {
//!     enter_bound(bindings! {"x" => 1}, |frame| async move { frame })
//!         .await
//!         .unwrap()
//! })
//! .await;
//! assert!(!frame.is_alive().await);
//! # }
//! ```
use crate::context::fresh_entry;
use crate::lifecycle::discard;
use lexenv_structs::frame::Frame;
use log::{debug, warn};
use std::future::Future;
use std::mem;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

tokio::task_local! {
    static TASK_FRAMES: BoundFrames;
}

/// Registry of the frames bound to a task.
#[derive(Clone, Default)]
pub(crate) struct BoundFrames {
    inner: Arc<Mutex<Vec<Frame>>>,
}

impl BoundFrames {
    pub(crate) fn single(frame: Frame) -> Self {
        Self {
            inner: Arc::new(Mutex::new(vec![frame])),
        }
    }

    fn push(&self, frame: Frame) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame)
    }

    fn snapshot(&self) -> Vec<Frame> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn take(&self) -> Vec<Frame> {
        mem::take(&mut *self.inner.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Registers `frame` in the task running the caller.
/// Returns false when the caller does not run inside [`run_task`].
pub(crate) fn bind_to_current_task(frame: &Frame) -> bool {
    TASK_FRAMES
        .try_with(|frames| frames.push(frame.clone()))
        .is_ok()
}

/// Number of frames currently bound to the task running the caller.
pub fn bound_frame_count() -> usize {
    TASK_FRAMES
        .try_with(|frames| frames.snapshot().len())
        .unwrap_or(0)
}

/// Discards the frames of a registry when dropped before being disarmed,
/// which happens when the future owning it is aborted or panics.
struct ReleaseGuard {
    frames: BoundFrames,
    armed: bool,
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let frames = self.frames.take();
        if frames.is_empty() {
            return;
        }
        match Handle::try_current() {
            Ok(handle) => {
                debug!("task ended abnormally, releasing {} bound frame(s)", frames.len());
                handle.spawn(release(frames));
            }
            Err(_) => warn!(
                "no runtime to release {} bound frame(s), they stay alive",
                frames.len()
            ),
        }
    }
}

async fn release(frames: Vec<Frame>) {
    for frame in frames.iter().rev() {
        discard(frame).await;
    }
}

/// Runs `body`, then discards every frame of `frames`.
pub(crate) async fn release_after<F: Future>(frames: BoundFrames, body: F) -> F::Output {
    let mut guard = ReleaseGuard {
        frames: frames.clone(),
        armed: true,
    };
    let output = body.await;
    release(frames.snapshot()).await;
    guard.armed = false;
    output
}

/// Runs `body` as a new task of control: it starts with no active frame and
/// the frames bound to it are discarded when it ends.
pub async fn run_task<F: Future>(body: F) -> F::Output {
    let frames = BoundFrames::default();
    release_after(frames.clone(), TASK_FRAMES.scope(frames, fresh_entry(body))).await
}

/// Spawns `body` on the runtime as a new task of control.
pub fn spawn<F>(body: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(run_task(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{enter_bound, enter_detached};
    use crate::resolution::get;
    use lexenv_structs::bindings;
    use lexenv_structs::error::Result;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_bound_frame_outlives_body_until_task_end() -> Result<()> {
        let (frame, alive_after_body) = run_task(async {
            let frame = enter_bound(bindings! {"x" => 1}, |frame| async move { frame }).await?;
            assert_eq!(bound_frame_count(), 1);
            Ok::<_, lexenv_structs::error::LexError>((frame.clone(), frame.is_alive().await))
        })
        .await?;
        assert!(alive_after_body);
        assert!(!frame.is_alive().await);
        Ok(())
    }

    #[tokio::test]
    async fn test_bound_frame_released_when_task_aborted() {
        let (tx, rx) = oneshot::channel();
        let handle = spawn(async move {
            enter_bound(bindings! {"x" => 1}, |frame| async move {
                tx.send(frame).unwrap();
                tokio::time::sleep(Duration::from_secs(3600)).await;
            })
            .await
        });
        let frame = rx.await.unwrap();
        assert!(frame.is_alive().await);
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        for _ in 0..100 {
            if !frame.is_alive().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!frame.is_alive().await);
    }

    #[tokio::test]
    async fn test_bound_without_task_is_bound_to_body() -> Result<()> {
        assert_eq!(bound_frame_count(), 0);
        let frame = enter_bound(bindings! {"x" => 1}, |frame| async move {
            assert_eq!(get("x").await.unwrap(), 1.into());
            frame
        })
        .await?;
        assert!(!frame.is_alive().await);
        Ok(())
    }

    #[tokio::test]
    async fn test_detached_frame_survives_task() -> Result<()> {
        let frame = spawn(async {
            enter_detached(bindings! {"x" => 1}, |frame| async move { frame }).await
        })
        .await
        .unwrap()?;
        assert!(frame.is_alive().await);
        assert_eq!(frame.read_own("x").await?, Some(1.into()));
        Ok(())
    }
}
