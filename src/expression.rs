use crate::command::{CommandFactory, ExecutableCommand, META_PREFIX};
use crate::eval::Evaluator;
use crate::interpreter::Factory;
use crate::lexer::split_into_tokens;
use crate::parser::construct_ast;
use crate::session::Session;
use anyhow::Result;
use std::io::Write;

/// A line of the expression language, e.g. `x = 2; print(x ** 10)`.
///
/// This is the catch-all command: it accepts every line that is not a meta verb,
/// and syntax errors surface when it executes.
pub struct ExpressionCommand {
    source: String,
}

impl ExpressionCommand {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl CommandFactory for Factory<ExpressionCommand> {
    fn try_create(&self, _session: &Session, line: &str) -> Option<Box<dyn ExecutableCommand>> {
        if line.trim_start().starts_with(META_PREFIX) {
            return None;
        }
        Some(Box::new(ExpressionCommand::new(line)))
    }
}

impl ExecutableCommand for ExpressionCommand {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, session: &mut Session) -> Result<()> {
        let tokens = split_into_tokens(&self.source)?;
        let statements = construct_ast(tokens)?;
        Evaluator::new(session, stdout).run(&statements)?;
        Ok(())
    }
}
