use crate::session::Session;
use anyhow::Result;
use std::io::Write;

/// Prefix that marks a line as a meta verb rather than an expression.
pub const META_PREFIX: char = ':';

/// Object-safe trait for anything the command loop can run.
///
/// Implemented by the meta verbs via a blanket impl and by expression statements.
/// A command either succeeds or fails with a described error; the loop reports
/// the error text and carries on.
pub trait ExecutableCommand {
    /// Executes the command.
    fn execute(self: Box<Self>, stdout: &mut dyn Write, session: &mut Session) -> Result<()>;
}

/// Factory that tries to create a command from a raw input line.
///
/// Returns `None` when the factory doesn't recognize the line.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided line.
    ///
    /// `line` is exactly what the user typed: not trimmed, not case-folded.
    fn try_create(&self, session: &Session, line: &str) -> Option<Box<dyn ExecutableCommand>>;
}

/// Splits a meta line such as `:vars -i ^x` into its verb and arguments.
///
/// Returns `None` when the line does not start with [`META_PREFIX`].
pub fn split_meta(line: &str) -> Option<(&str, Vec<&str>)> {
    let rest = line.trim_start().strip_prefix(META_PREFIX)?;
    let mut words = rest.split_whitespace();
    let verb = words.next().unwrap_or("");
    Some((verb, words.collect()))
}
