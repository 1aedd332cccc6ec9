//! Interactive console over the environment tree.
//!
//! Each `let` opens a nested session running inside the scope it entered,
//! `end` returns to the enclosing session. Lines come from a [`LineSource`]:
//! a rustyline editor for interactive use, or a script.
use crate::command::{Command, HELP};
use crate::ReplConfig;
use async_recursion::async_recursion;
use function_name::named;
use lexenv_core::inspect::{describe_active_chain, render_tree, root_of};
use lexenv_core::{
    active_frame, enter_bound, enter_detached, free_active, fresh_entry, get, set, try_update,
};
use lexenv_structs::error::{LexError, Result};
use lexenv_structs::frame::Frame;
use log::{info, warn};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::collections::VecDeque;
use std::fmt::Display;
use std::path::PathBuf;

pub enum Line {
    Input(String),
    Interrupted,
    Eof,
}

/// Provider of the lines read by the console.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Line;

    fn add_history(&mut self, _line: &str) {}

    fn save_history(&mut self) {}
}

/// Interactive source backed by rustyline.
pub struct EditorSource {
    editor: DefaultEditor,
    history: Option<PathBuf>,
}

impl EditorSource {
    #[named]
    pub fn new(history: Option<PathBuf>) -> Result<Self> {
        let mut editor = DefaultEditor::new().map_err(|e| LexError::new(function_name!(), e))?;
        if let Some(path) = &history {
            if editor.load_history(path).is_err() {
                println!("No previous history.");
            }
        }
        Ok(Self { editor, history })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> Line {
        match self.editor.readline(prompt) {
            Ok(line) => Line::Input(line),
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                Line::Interrupted
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                Line::Eof
            }
            Err(err) => {
                println!("Error: {:?}", err);
                Line::Eof
            }
        }
    }

    fn add_history(&mut self, line: &str) {
        let _ = self.editor.add_history_entry(line);
    }

    fn save_history(&mut self) {
        if let Some(path) = &self.history {
            if let Err(e) = self.editor.save_history(path) {
                warn!("could not save history to {}: {}", path.display(), e);
            }
        }
    }
}

/// Lines given up front, ends with [`Line::Eof`].
#[derive(Default)]
pub struct ScriptSource {
    lines: VecDeque<String>,
}

impl ScriptSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(|s| s.into()).collect(),
        }
    }
}

impl LineSource for ScriptSource {
    fn read_line(&mut self, _prompt: &str) -> Line {
        match self.lines.pop_front() {
            Some(line) => Line::Input(line),
            None => Line::Eof,
        }
    }
}

enum Flow {
    Continue,
    End,
    Quit,
}

pub struct Console<S> {
    source: S,
    config: ReplConfig,
    transcript: Vec<String>,
    roots: Vec<Frame>,
}

impl<S: LineSource> Console<S> {
    pub fn new(source: S, config: ReplConfig) -> Self {
        Self {
            source,
            config,
            transcript: vec![],
            roots: vec![],
        }
    }

    /// Lines printed so far.
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Runs sessions until the source is exhausted or `quit` is read.
    pub async fn run(&mut self) {
        info!("console started");
        fresh_entry(self.session(0)).await;
        self.source.save_history();
        info!("console ended");
    }

    fn print(&mut self, line: impl Display) {
        let line = line.to_string();
        if self.config.echo {
            println!("{}", line);
        }
        self.transcript.push(line);
    }

    #[async_recursion(?Send)]
    async fn session(&mut self, depth: usize) -> Flow {
        loop {
            let prompt = format!("[{}]>> ", depth);
            let line = match self.source.read_line(&prompt) {
                Line::Input(line) => line,
                Line::Interrupted | Line::Eof => return Flow::Quit,
            };
            self.source.add_history(&line);
            let result = match Command::parse(&line) {
                Ok(command) => self.execute(command, depth).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(Flow::Continue) => {}
                Ok(flow) => return flow,
                Err(e) => self.print(format!("error: {}", e.get_message())),
            }
        }
    }

    async fn scope(&mut self, frame: Frame, depth: usize) -> Flow {
        if frame.parent().is_none() {
            self.roots.push(frame.clone());
        }
        self.print(format!("enter {}", frame.describe().await));
        let flow = self.session(depth).await;
        self.print(format!("exit frame {}", frame.id()));
        flow
    }

    async fn execute(&mut self, command: Command, depth: usize) -> Result<Flow> {
        match command {
            Command::Let { bindings, bound } => {
                let flow = if bound {
                    enter_bound(bindings, |frame| self.scope(frame, depth + 1)).await?
                } else {
                    enter_detached(bindings, |frame| self.scope(frame, depth + 1)).await?
                };
                if depth == 0 {
                    self.prune_roots().await;
                }
                return Ok(match flow {
                    Flow::Quit => Flow::Quit,
                    _ => Flow::Continue,
                });
            }
            Command::Get(name) => {
                let value = get(&name).await?;
                self.print(value);
            }
            Command::Set(name, value) => {
                let value = set(&name, value).await?;
                self.print(value);
            }
            Command::Update(name, op, operand) => {
                let value = try_update(&name, move |v| op.apply(v, &operand)).await?;
                self.print(value);
            }
            Command::Show => {
                let descriptions = describe_active_chain().await;
                if descriptions.is_empty() {
                    self.print("no active frame");
                }
                for description in descriptions {
                    self.print(description);
                }
            }
            Command::Tree => self.print_tree().await,
            Command::Free => {
                if depth == 0 {
                    self.print("no active frame");
                } else {
                    let n = free_active().await;
                    self.print(format!("{} frame(s) torn down", n));
                    return Ok(Flow::End);
                }
            }
            Command::End => {
                if depth == 0 {
                    self.print("no scope to end");
                } else {
                    return Ok(Flow::End);
                }
            }
            Command::Help => self.print(HELP),
            Command::Quit => return Ok(Flow::Quit),
            Command::Empty => {}
        }
        Ok(Flow::Continue)
    }

    /// Forgets the roots that have been torn down or discarded.
    async fn prune_roots(&mut self) {
        let mut live = vec![];
        for root in self.roots.drain(..) {
            if root.is_alive().await {
                live.push(root);
            }
        }
        self.roots = live;
    }

    /// Tree of the active frame, or every live tree opened by the console.
    async fn print_tree(&mut self) {
        let roots = match active_frame() {
            Some(frame) => vec![root_of(&frame)],
            None => {
                self.prune_roots().await;
                self.roots.clone()
            }
        };
        if roots.is_empty() {
            self.print("empty");
        }
        for root in roots {
            let rendered = render_tree(&root).await;
            self.print(rendered.trim_end());
        }
    }
}
