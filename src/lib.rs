//! A small interactive shell that greets the user and then runs a command loop.
//!
//! The shell reads one line at a time. A line is either an exit keyword, a
//! `:`-prefixed meta verb (see [`builtin`]), or a statement in a tiny
//! expression language that reads and writes variables in the [`Session`].
//! Errors raised by a command are reported and the loop keeps going.
//!
//! The main entry points are [`greeter::greet`] and [`Interpreter::repl`]. Both read
//! through a [`LineSource`], so the same code drives a terminal (via [`EditorSource`])
//! and in-memory scripts (via [`ScriptedSource`]).

mod builtin;
pub mod command;
pub mod config;
mod eval;
mod expression;
mod functions;
pub mod greeter;
mod interpreter;
mod io_adapters;
mod lexer;
mod parser;
pub mod session;
mod value;

pub use config::Config;
pub use eval::EvalError;
pub use interpreter::{Interpreter, Shutdown};
pub use io_adapters::{EditorSource, LineSource, ReadError, ScriptedSource};
pub use lexer::LexingError;
pub use parser::ParsingError;
pub use session::Session;
pub use value::Value;
