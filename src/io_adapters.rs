use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::collections::VecDeque;
use std::io::{self, IsTerminal, Write};
use thiserror::Error;

/// Why a line could not be read.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The user pressed Ctrl-C while the read was blocked.
    #[error("interrupted")]
    Interrupted,
    /// The input stream has no more lines.
    #[error("end of input")]
    Eof,
    /// Any other failure of the underlying stream.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Source of input lines, each requested with a prompt.
///
/// Returned lines carry no trailing newline.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<String, ReadError>;
}

/// Line source backed by a `rustyline` editor, reading the process's stdin.
///
/// On a terminal the editor prints the prompt. When stdin is redirected the
/// editor reads plain lines without showing it, so the prompt is written to
/// stdout here instead.
pub struct EditorSource {
    editor: DefaultEditor,
    prompt_echo: Option<Box<dyn Write>>,
}

impl EditorSource {
    pub fn new() -> anyhow::Result<Self> {
        let prompt_echo: Option<Box<dyn Write>> = if io::stdin().is_terminal() {
            None
        } else {
            Some(Box::new(io::stdout()))
        };
        Ok(Self {
            editor: DefaultEditor::new()?,
            prompt_echo,
        })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> Result<String, ReadError> {
        let editor_prompt = match self.prompt_echo.as_mut() {
            Some(out) => {
                echo_prompt(out.as_mut(), prompt).map_err(|e| ReadError::Other(e.into()))?;
                ""
            }
            None => prompt,
        };
        match self.editor.readline(editor_prompt) {
            Ok(line) => Ok(line),
            Err(ReadlineError::Interrupted) => Err(ReadError::Interrupted),
            Err(ReadlineError::Eof) => Err(ReadError::Eof),
            Err(e) => Err(ReadError::Other(e.into())),
        }
    }
}

/// Writes the prompt and flushes, so it shows before the read blocks.
fn echo_prompt(out: &mut dyn Write, prompt: &str) -> io::Result<()> {
    out.write_all(prompt.as_bytes())?;
    out.flush()
}

/// One scripted reaction to a read request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedInput {
    Line(String),
    Interrupt,
}

/// Memory-backed line source that replays a fixed script, then reports end of input.
///
/// Records every prompt it was asked with, so callers can check what was shown.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: VecDeque<ScriptedInput>,
    prompts: Vec<String>,
}

impl ScriptedSource {
    /// Create a source that yields `lines` in order.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: lines
                .into_iter()
                .map(|l| ScriptedInput::Line(l.into()))
                .collect(),
            prompts: Vec::new(),
        }
    }

    /// Queue a Ctrl-C after the lines given so far.
    pub fn then_interrupt(mut self) -> Self {
        self.script.push_back(ScriptedInput::Interrupt);
        self
    }

    /// Prompts seen so far, in order.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Number of scripted inputs not consumed yet.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl LineSource for ScriptedSource {
    fn read_line(&mut self, prompt: &str) -> Result<String, ReadError> {
        self.prompts.push(prompt.to_string());
        match self.script.pop_front() {
            Some(ScriptedInput::Line(line)) => Ok(line),
            Some(ScriptedInput::Interrupt) => Err(ReadError::Interrupted),
            None => Err(ReadError::Eof),
        }
    }
}
