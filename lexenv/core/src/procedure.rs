use crate::context::fresh_entry;
use function_name::named;
use lexenv_structs::error::Result;
use lexenv_structs::value::Value;
use log::debug;
use std::fmt::{Debug, Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type DynFut = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;
pub type ProcedureBody = dyn Fn(Vec<Value>) -> DynFut + Send + Sync;

/// Named reusable procedure.
/// Each call starts with no active frame: scopes entered by the body are
/// rooted at the frames the body captured, never at the frame that happened
/// to be active where the procedure was defined or previously called.
#[derive(Clone)]
pub struct Procedure {
    label: Arc<String>,
    body: Arc<ProcedureBody>,
}

impl Procedure {
    pub fn new<F, Fut>(label: impl Into<String>, body: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            label: Arc::new(label.into()),
            body: Arc::new(move |args: Vec<Value>| -> DynFut { Box::pin(body(args)) }),
        }
    }

    pub fn get_label(&self) -> &str {
        &self.label
    }

    #[named]
    pub async fn call(&self, args: Vec<Value>) -> Result<Value> {
        debug!("call {} with {} arg(s)", self.label, args.len());
        fresh_entry((self.body)(args))
            .await
            .map_err(|e| e.chain(format!("{}: {}", function_name!(), self.label)))
    }
}

impl Debug for Procedure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#<procedure {}>", self.label)
    }
}

impl Display for Procedure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::active_frame;
    use crate::lifecycle::{enter_bound, enter_detached};
    use crate::resolution::{get, update_in};
    use crate::test_utils::assert_not_found;
    use lexenv_structs::bindings;
    use lexenv_structs::value::Opaque;

    #[tokio::test]
    async fn test_call_starts_without_active_frame() -> Result<()> {
        let reader = Procedure::new("reader", |_| async {
            assert!(active_frame().is_none());
            let depth = enter_bound(bindings! {"y" => 1}, |frame| async move {
                assert_not_found(get("x").await);
                frame.depth()
            })
            .await?;
            Ok(Value::from(depth))
        });
        enter_detached(bindings! {"x" => 1}, |_| async {
            assert_eq!(reader.call(vec![]).await.unwrap(), Value::from(0));
            assert_eq!(reader.call(vec![]).await.unwrap(), Value::from(0));
            assert_eq!(get("x").await.unwrap(), Value::from(1));
        })
        .await
    }

    #[tokio::test]
    async fn test_procedure_closing_over_frame() -> Result<()> {
        let counter = enter_detached(bindings! {"count" => 0}, |frame| async move {
            Procedure::new("next", move |args| {
                let frame = frame.clone();
                async move {
                    let step = args.first().cloned().unwrap_or_else(|| 1.into());
                    update_in(Some(&frame), "count", |v| v.try_add(&step).unwrap_or(v)).await
                }
            })
        })
        .await?;
        assert_eq!(counter.call(vec![]).await?, Value::from(1));
        assert_eq!(counter.call(vec![10.into()]).await?, Value::from(11));
        assert_eq!(counter.to_string(), "next");

        // a procedure stored in a frame as a host value
        let holder = enter_detached(bindings! {"next" => Opaque::new(counter)}, |f| async move { f })
            .await?;
        let stored = holder.read_own("next").await?.unwrap();
        let procedure = match &stored {
            Value::Opaque(o) => o.downcast_ref::<Procedure>().cloned().unwrap(),
            other => panic!("unexpected {}", other),
        };
        assert_eq!(procedure.call(vec![]).await?, Value::from(12));
        Ok(())
    }
}
