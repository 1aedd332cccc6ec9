//! Resolution of names along the chain of frames.
//!
//! Every operation starts at a frame and walks towards the root until a frame
//! binds the name, so that the innermost binding shadows the outer ones.
//! The walk holds the lock of one frame at a time: it is atomic per frame,
//! not along the whole chain. Nothing is cached, each call walks again.
//!
//! A discarded frame ends the walk: resolving through a torn down frame fails
//! even if one of its ancestors binds the name.
use crate::context::active_frame;
use function_name::named;
use lexenv_structs::error::{ErrorKind, LexError, Result};
use lexenv_structs::frame::{Frame, Own};
use lexenv_structs::value::Value;
use log::trace;

fn stops_walk(e: &LexError) -> bool {
    matches!(e.kind(), ErrorKind::FrameDiscarded(_))
}

/// Value of the innermost binding of `name`, starting at `frame`.
#[named]
pub async fn get_in(frame: Option<&Frame>, name: &str) -> Result<Value> {
    let mut current = frame;
    while let Some(frame) = current {
        match frame.read_own(name).await {
            Ok(Some(value)) => {
                trace!("{} found in frame {}", name, frame.id());
                return Ok(value);
            }
            Ok(None) => current = frame.parent(),
            Err(e) if stops_walk(&e) => {
                trace!("lookup of {} stopped at discarded frame {}", name, frame.id());
                break;
            }
            Err(e) => return Err(e.chain(function_name!())),
        }
    }
    Err(LexError::binding_not_found(function_name!(), name))
}

/// Writes `value` in the innermost frame binding `name`, starting at `frame`.
/// Returns the written value. Nothing is written if no frame binds `name`.
#[named]
pub async fn set_in(frame: Option<&Frame>, name: &str, value: impl Into<Value>) -> Result<Value> {
    let mut value = value.into();
    let mut current = frame;
    while let Some(frame) = current {
        match frame.write_own(name, value).await {
            Ok(Own::Bound(value)) => {
                trace!("{} set in frame {}", name, frame.id());
                return Ok(value);
            }
            Ok(Own::Unbound(v)) => {
                value = v;
                current = frame.parent();
            }
            Err(e) if stops_walk(&e) => break,
            Err(e) => return Err(e.chain(function_name!())),
        }
    }
    Err(LexError::binding_not_found(function_name!(), name))
}

/// Applies `f` to the innermost binding of `name`, starting at `frame`, and
/// stores its result atomically with respect to the owning frame.
/// If `f` fails the binding is left untouched and the error is returned.
#[named]
pub async fn try_update_in<F>(frame: Option<&Frame>, name: &str, f: F) -> Result<Value>
where
    F: FnOnce(Value) -> Result<Value>,
{
    let mut f = f;
    let mut current = frame;
    while let Some(frame) = current {
        match frame.transform_own(name, f).await {
            Ok(Own::Bound(value)) => {
                trace!("{} updated in frame {}", name, frame.id());
                return Ok(value);
            }
            Ok(Own::Unbound(g)) => {
                f = g;
                current = frame.parent();
            }
            Err(e) if stops_walk(&e) => break,
            Err(e) => return Err(e.chain(function_name!())),
        }
    }
    Err(LexError::binding_not_found(function_name!(), name))
}

/// Infallible form of [`try_update_in`].
pub async fn update_in<F>(frame: Option<&Frame>, name: &str, f: F) -> Result<Value>
where
    F: FnOnce(Value) -> Value,
{
    try_update_in(frame, name, move |v| Ok(f(v))).await
}

/// [`get_in`] starting at the active frame.
pub async fn get(name: &str) -> Result<Value> {
    let frame = active_frame();
    get_in(frame.as_ref(), name).await
}

/// [`set_in`] starting at the active frame.
pub async fn set(name: &str, value: impl Into<Value>) -> Result<Value> {
    let frame = active_frame();
    set_in(frame.as_ref(), name, value).await
}

/// [`update_in`] starting at the active frame.
pub async fn update<F>(name: &str, f: F) -> Result<Value>
where
    F: FnOnce(Value) -> Value,
{
    let frame = active_frame();
    update_in(frame.as_ref(), name, f).await
}

/// [`try_update_in`] starting at the active frame.
pub async fn try_update<F>(name: &str, f: F) -> Result<Value>
where
    F: FnOnce(Value) -> Result<Value>,
{
    let frame = active_frame();
    try_update_in(frame.as_ref(), name, f).await
}
