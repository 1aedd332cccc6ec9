//! Read-only views of the environment tree, used for display and debugging.
use crate::context::active_frame;
use async_recursion::async_recursion;
use lexenv_structs::frame::Frame;

const TAB_SIZE: usize = 3;

/// Frames from `frame` up to its root, innermost first.
pub fn chain(frame: &Frame) -> Vec<Frame> {
    let mut chain = vec![frame.clone()];
    let mut current = frame.parent();
    while let Some(parent) = current {
        chain.push(parent.clone());
        current = parent.parent();
    }
    chain
}

/// Root of the tree containing `frame`.
pub fn root_of(frame: &Frame) -> Frame {
    let mut root = frame;
    while let Some(parent) = root.parent() {
        root = parent;
    }
    root.clone()
}

/// One description per frame of the active chain, innermost first.
pub async fn describe_active_chain() -> Vec<String> {
    let mut descriptions = vec![];
    if let Some(frame) = active_frame() {
        for frame in chain(&frame) {
            descriptions.push(frame.describe().await);
        }
    }
    descriptions
}

/// Indented rendering of the subtree rooted at `frame`, one frame per line.
pub async fn render_tree(frame: &Frame) -> String {
    let mut out = String::new();
    render_into(frame, 0, &mut out).await;
    out
}

#[async_recursion]
async fn render_into(frame: &Frame, indent: usize, out: &mut String) {
    out.push_str(&" ".repeat(indent));
    out.push_str(&frame.describe().await);
    out.push('\n');
    for child in frame.children().await {
        render_into(&child, indent + TAB_SIZE, out).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::with_active_frame;
    use crate::lifecycle::open_detached;
    use lexenv_structs::bindings;
    use lexenv_structs::error::Result;

    #[tokio::test]
    async fn test_render_tree() -> Result<()> {
        let root = open_detached(bindings! {"a" => 1}).await?;
        let child = with_active_frame(Some(root.clone()), async {
            open_detached(bindings! {"b" => 2}).await.unwrap()
        })
        .await;
        let rendered = render_tree(&root).await;
        assert_eq!(
            rendered,
            format!(
                "frame {} {{a: 1}}\n   frame {} {{b: 2}}\n",
                root.id(),
                child.id()
            )
        );
        assert!(root_of(&child).ptr_eq(&root));
        assert_eq!(chain(&child).len(), 2);

        let descriptions = with_active_frame(Some(child.clone()), describe_active_chain()).await;
        assert_eq!(descriptions.len(), 2);
        assert!(descriptions[0].contains("b: 2"));
        Ok(())
    }
}
