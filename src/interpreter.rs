use crate::builtin;
use crate::command::{CommandFactory, split_meta};
use crate::config::Config;
use crate::expression::ExpressionCommand;
use crate::io_adapters::{LineSource, ReadError};
use crate::session::Session;
use std::io::Write;
use tracing::{debug, info};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate: meta verbs and expression statements.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Why the command loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// An exit keyword was typed, or a command asked to leave.
    Keyword,
    /// Ctrl-C during a read.
    Interrupted,
    /// The input stream ended.
    EndOfInput,
}

impl Shutdown {
    /// Process exit code for this shutdown. Every way out of the loop is a clean one.
    pub fn exit_code(self) -> i32 {
        0
    }

    fn message(self) -> &'static str {
        match self {
            Shutdown::Keyword => "Encerrando...",
            Shutdown::Interrupted => "\n\nInterrompido pelo usuário. Encerrando...",
            Shutdown::EndOfInput => "\n\nFim da entrada. Encerrando...",
        }
    }
}

/// The interactive command runner.
///
/// The interpreter owns a [`Session`] and a list of [`CommandFactory`] objects that are
/// queried in order to turn a line into a command. See [`Default`] for the factories
/// included out of the box.
///
/// Example
/// ```
/// use greeting_shell::Interpreter;
/// let mut sh = Interpreter::default();
/// let mut out = Vec::new();
/// sh.execute_line("x = 6 * 7; print(x)", &mut out).unwrap();
/// assert_eq!(out, b"42\n");
/// ```
pub struct Interpreter {
    config: Config,
    session: Session,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(config: Config, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            config,
            session: Session::new(),
            commands,
        }
    }

    /// Create an interpreter with the default factories and the given configuration.
    pub fn with_config(config: Config) -> Self {
        let mut commands = builtin::factories();
        commands.push(Box::new(Factory::<ExpressionCommand>::default()));
        Self::new(config, commands)
    }

    /// The session shared by every command run so far.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run a single line through the first factory that accepts it.
    ///
    /// Returns an error if no factory recognizes the line or the command fails.
    pub fn execute_line(&mut self, line: &str, stdout: &mut dyn Write) -> anyhow::Result<()> {
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(&self.session, line) {
                return cmd.execute(stdout, &mut self.session);
            }
        }
        let name = match split_meta(line) {
            Some((verb, _)) => format!(":{}", verb),
            None => line.trim().to_string(),
        };
        Err(anyhow::anyhow!("command not found: {}", name))
    }

    /// Read-Eval-Print Loop.
    ///
    /// Runs until an exit keyword, an interrupt or the end of input, and reports which
    /// one it was. Command failures are printed and never end the loop; only a broken
    /// input stream or output writer is returned as an error.
    pub fn repl(
        &mut self,
        source: &mut dyn LineSource,
        stdout: &mut dyn Write,
    ) -> anyhow::Result<Shutdown> {
        writeln!(stdout, "\n{}", self.config.awaiting_message())?;

        let shutdown = loop {
            writeln!(stdout)?;
            stdout.flush()?;

            let line = match source.read_line(&self.config.command_prompt) {
                Ok(line) => line,
                Err(ReadError::Interrupted) => break Shutdown::Interrupted,
                Err(ReadError::Eof) => break Shutdown::EndOfInput,
                Err(ReadError::Other(e)) => return Err(e.context("failed to read command")),
            };

            if self.config.is_exit_keyword(&line) {
                break Shutdown::Keyword;
            }

            if line.trim().is_empty() {
                continue;
            }

            debug!(line = %line, "executing");
            if let Err(e) = self.execute_line(&line, stdout) {
                debug!(error = %e, "command failed");
                writeln!(stdout, "Erro ao executar comando: {}", e)?;
            }

            if self.session.should_exit {
                break Shutdown::Keyword;
            }
        };

        info!(?shutdown, "command loop stopped");
        writeln!(stdout, "{}", shutdown.message())?;
        stdout.flush()?;
        Ok(shutdown)
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default configuration and commands:
    /// - meta verbs: `:help`, `:vars`, `:unset`, `:reset`, `:echo`
    /// - expression statements for every other line
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ExecutableCommand;
    use crate::greeter::greet;
    use crate::io_adapters::ScriptedSource;
    use crate::value::Value;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn run(lines: &[&str]) -> (Shutdown, String, Interpreter) {
        run_source(ScriptedSource::new(lines.iter().copied()))
    }

    fn run_source(mut source: ScriptedSource) -> (Shutdown, String, Interpreter) {
        let mut sh = Interpreter::default();
        let mut out = Vec::new();
        let shutdown = sh.repl(&mut source, &mut out).unwrap();
        (shutdown, String::from_utf8(out).unwrap(), sh)
    }

    /// Factory that records every line it is offered and accepts all of them.
    struct Recorder(Rc<RefCell<Vec<String>>>);

    struct Noop;

    impl ExecutableCommand for Noop {
        fn execute(
            self: Box<Self>,
            _stdout: &mut dyn Write,
            _session: &mut Session,
        ) -> anyhow::Result<()> {
            Ok(())
        }
    }

    impl CommandFactory for Recorder {
        fn try_create(&self, _session: &Session, line: &str) -> Option<Box<dyn ExecutableCommand>> {
            self.0.borrow_mut().push(line.to_string());
            Some(Box::new(Noop))
        }
    }

    fn recorded(lines: &[&str]) -> (Shutdown, Vec<String>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut sh = Interpreter::new(Config::default(), vec![Box::new(Recorder(seen.clone()))]);
        let mut source = ScriptedSource::new(lines.iter().copied());
        let shutdown = sh.repl(&mut source, &mut Vec::new()).unwrap();
        let seen = seen.borrow().clone();
        (shutdown, seen)
    }

    #[test]
    fn test_full_session_with_exit_keyword() {
        let config = Config::default();
        let mut source = ScriptedSource::new(["Ada", "exit"]);
        let mut out = Vec::new();

        greet(&config, &mut source, &mut out).unwrap();
        let shutdown = Interpreter::with_config(config)
            .repl(&mut source, &mut out)
            .unwrap();

        assert_eq!(shutdown, Shutdown::Keyword);
        assert_eq!(shutdown.exit_code(), 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Hello 10x Tool Calls\n\
             Olá, Ada! Bem-vindo ao sistema.\n\
             \n\
             Aguardando comandos... (Digite 'exit' ou 'quit' para sair)\n\
             \n\
             Encerrando...\n"
        );
        assert_eq!(source.prompts(), ["Digite seu nome: ", "> "]);
    }

    #[test]
    fn test_exit_keywords_in_any_case_are_not_evaluated() {
        for keyword in ["exit", "QUIT", "Sair"] {
            let (shutdown, seen) = recorded(&["a", keyword, "b"]);
            assert_eq!(shutdown, Shutdown::Keyword);
            assert_eq!(seen, vec!["a"]);
        }
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let (shutdown, seen) = recorded(&["", "   ", "\t", "x"]);
        assert_eq!(shutdown, Shutdown::EndOfInput);
        assert_eq!(seen, vec!["x"]);

        let (_, out, _) = run(&["   "]);
        assert!(!out.contains("Erro"));
    }

    #[test]
    fn test_evaluator_gets_raw_line_once() {
        let (_, seen) = recorded(&["  Print(1)  ", "x = 1", "x = 1"]);
        assert_eq!(seen, vec!["  Print(1)  ", "x = 1", "x = 1"]);
    }

    #[test]
    fn test_errors_are_reported_and_loop_continues() {
        let (shutdown, out, sh) = run(&["print(1/0)", "y = 5", "print(y)", "quit"]);

        assert_eq!(shutdown, Shutdown::Keyword);
        assert!(out.contains("Erro ao executar comando: division by zero\n"));
        assert!(out.contains("\n5\n"));
        assert_eq!(sh.session().get_var("y"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_deeply_nested_line_is_reported_and_loop_continues() {
        let parens = format!("{}1{}", "(".repeat(2000), ")".repeat(2000));
        let negations = format!("{}1", "-".repeat(200_000));
        let (shutdown, out, _) = run(&[parens.as_str(), negations.as_str(), "print(7)", "sair"]);

        assert_eq!(shutdown, Shutdown::Keyword);
        assert_eq!(
            out.matches("Erro ao executar comando: invalid syntax: expression too deeply nested\n")
                .count(),
            2
        );
        assert!(out.contains("\n7\n"));
    }

    #[test]
    fn test_end_of_input_on_first_read() {
        let (shutdown, out, _) = run(&[]);

        assert_eq!(shutdown, Shutdown::EndOfInput);
        assert_eq!(shutdown.exit_code(), 0);
        assert!(out.ends_with("\n\nFim da entrada. Encerrando...\n"));
    }

    #[test]
    fn test_interrupt_stops_without_further_reads() {
        let mut sh = Interpreter::default();
        let mut source = ScriptedSource::new(["x = 1"]).then_interrupt();
        let mut out = Vec::new();
        let shutdown = sh.repl(&mut source, &mut out).unwrap();

        assert_eq!(shutdown, Shutdown::Interrupted);
        assert_eq!(shutdown.exit_code(), 0);
        assert_eq!(source.prompts().len(), 2);
        assert_eq!(sh.session().get_var("x"), Some(&Value::Int(1)));
        let out = String::from_utf8(out).unwrap();
        assert!(out.ends_with("\n\nInterrompido pelo usuário. Encerrando...\n"));
    }

    #[test]
    fn test_exit_function_stops_loop() {
        let (shutdown, out, _) = run(&["print('bye'); exit()", "print('after')"]);

        assert_eq!(shutdown, Shutdown::Keyword);
        assert!(out.contains("bye\n"));
        assert!(!out.contains("after"));
        assert!(out.ends_with("Encerrando...\n"));
    }

    #[test]
    fn test_meta_verbs_share_the_session() {
        let (_, out, sh) = run(&["x = 2", "name = 'Ada'", ":vars", ":unset x", ":vars x"]);

        assert!(out.contains("name = 'Ada'\nx = 2\n"));
        assert_eq!(sh.session().get_var("x"), None);
    }

    #[test]
    fn test_unknown_meta_verb() {
        let mut sh = Interpreter::default();
        let err = sh.execute_line(":frobnicate now", &mut Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "command not found: :frobnicate");
    }

    #[test]
    fn test_no_factory_accepts() {
        let mut sh = Interpreter::new(Config::default(), Vec::new());
        let err = sh.execute_line(" ls -la ", &mut Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "command not found: ls -la");
    }
}
