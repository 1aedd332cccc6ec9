//! Mutable lexical scoping on top of a tree of frames.
//!
//! A scope is entered with a set of bindings and a body. While the body runs,
//! the frame of the scope is the active frame of the task: [`get`], [`set`]
//! and [`update`] start from it and walk up the chain of enclosing frames.
//! # Example
//! ```
//! use lexenv_core::{enter_detached, get, set, update};
//! use lexenv_structs::bindings;
//! use lexenv_structs::value::Value;
//!
//! # #[tokio::main]
//! # async fn main() -> lexenv_structs::error::Result<()> {
//! let count = enter_detached(bindings! {"count" => 0}, |_| async {
//!     update("count", |v| v.try_add(&1.into()).unwrap_or(v)).await?;
//!     enter_detached(bindings! {"count" => 10}, |_| async {
//!         assert_eq!(get("count").await?, Value::from(10));
//!         set("count", 11).await
//!     })
//!     .await??;
//!     get("count").await
//! })
//! .await??;
//! assert_eq!(count, Value::from(1));
//! # Ok(())
//! # }
//! ```
pub mod context;
pub mod inspect;
pub mod lifecycle;
pub mod procedure;
pub mod resolution;
pub mod task;
pub mod test_utils;

pub use context::{active_frame, fresh_entry, with_active_frame};
pub use lifecycle::{
    discard, enter_bound, enter_detached, free_active, open_detached, teardown,
};
pub use procedure::Procedure;
pub use resolution::{get, get_in, set, set_in, try_update, try_update_in, update, update_in};
pub use task::{bound_frame_count, run_task, spawn};
