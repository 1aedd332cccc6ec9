use lexenv_structs::error::Result;
use lexenv_structs::value::Value;
use std::fmt::Debug;

/// Transformation adding `n` to a numeric binding, for the `try_update*` functions.
pub fn add(n: impl Into<Value>) -> impl FnOnce(Value) -> Result<Value> {
    let n = n.into();
    move |v| v.try_add(&n)
}

/// Panics unless `result` is a `BindingNotFound` error.
pub fn assert_not_found<T: Debug>(result: Result<T>) {
    match result {
        Err(e) if e.is_binding_not_found() => {}
        Err(e) => panic!("expected binding not found, got:\n{}", e),
        Ok(v) => panic!("expected binding not found, got {:?}", v),
    }
}
