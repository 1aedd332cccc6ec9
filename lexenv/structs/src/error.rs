use crate::frame::FrameId;
use crate::value::{KindValue, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Kinds of errors reported by the environment tree.
/// - BindingNotFound: a chain walk reached the root without finding the name.
/// - FrameDiscarded: an operation was addressed to a frame after its teardown.
/// - ScopeClosed: a scope was entered under a frame whose teardown has begun.
/// - Other: conversions and errors coming from outside the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    BindingNotFound(String),
    FrameDiscarded(FrameId),
    ScopeClosed(FrameId),
    Other,
}

/// Error struct of the environment tree.
/// The first element of the backtrace is the function where the error occurred,
/// callers can add their own context with [`LexError::chain`].
#[derive(Debug, Clone)]
pub struct LexError {
    kind: ErrorKind,
    backtrace: Vec<String>,
    message: String,
}

impl LexError {
    pub fn new(context: impl Display, message: impl Display) -> Self {
        Self {
            kind: ErrorKind::Other,
            backtrace: vec![context.to_string()],
            message: message.to_string(),
        }
    }

    pub fn binding_not_found(context: impl Display, name: &str) -> Self {
        Self {
            kind: ErrorKind::BindingNotFound(name.to_string()),
            backtrace: vec![context.to_string()],
            message: format!("binding not found: {}", name),
        }
    }

    pub fn frame_discarded(context: impl Display, id: FrameId) -> Self {
        Self {
            kind: ErrorKind::FrameDiscarded(id),
            backtrace: vec![context.to_string()],
            message: format!("frame {} has been torn down", id),
        }
    }

    pub fn scope_closed(context: impl Display, id: FrameId) -> Self {
        Self {
            kind: ErrorKind::ScopeClosed(id),
            backtrace: vec![context.to_string()],
            message: format!("cannot enter a scope under frame {}: teardown has begun", id),
        }
    }

    pub fn wrong_type(context: impl Display, lv: &Value, expected: KindValue) -> Self {
        Self {
            kind: ErrorKind::Other,
            backtrace: vec![context.to_string()],
            message: format!(
                "Wrong type: {} is a {}, expected {}.",
                lv,
                lv.get_kind(),
                expected
            ),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn get_message(&self) -> &str {
        &self.message
    }

    pub fn is_binding_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::BindingNotFound(_))
    }

    pub fn chain(mut self, context: impl Display) -> Self {
        self.backtrace.push(context.to_string());
        self
    }
}

impl Error for LexError {}

impl Display for LexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "message:\n{}", self.message)?;
        writeln!(f, "\nbacktrace:")?;
        for a in &self.backtrace {
            writeln!(f, "- from {}", a)?;
        }
        Ok(())
    }
}

impl From<anyhow::Error> for LexError {
    fn from(a: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Other,
            backtrace: vec!["anyhow".to_string()],
            message: format!("{:?}", a),
        }
    }
}

impl From<std::io::Error> for LexError {
    fn from(e: std::io::Error) -> Self {
        Self {
            kind: ErrorKind::Other,
            backtrace: vec!["std::io::Error".to_string()],
            message: format!("{:?}", e),
        }
    }
}

pub type Result<T> = std::result::Result<T, LexError>;
