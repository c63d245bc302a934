use crate::command::{CommandFactory, ExecutableCommand, META_PREFIX, split_meta};
use crate::functions::FUNCTIONS;
use crate::interpreter::Factory;
use crate::session::Session;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use regex::RegexBuilder;
use std::io::Write;

/// Meta verbs known to the shell at compile time, typed as `:verb args...`.
///
/// Verbs are parsed using the [`argh`] crate (`FromArgs`) and run against the
/// session without going through the expression language.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the verb without the prefix, e.g. "vars".
    fn name() -> &'static str;

    /// One-line description shown by `:help`.
    fn summary() -> &'static str;

    /// Executes the verb using the provided output stream and session.
    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<()>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, session: &mut Session) -> Result<()> {
        <T as BuiltinCommand>::execute(*self, stdout, session)
    }
}

/// Outcome of argh rejecting the arguments, or of `--help`.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, _session: &mut Session) -> Result<()> {
        if self.is_error {
            anyhow::bail!("{}", self.output.trim_end());
        }
        stdout.write_all(self.output.as_bytes())?;
        Ok(())
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, _session: &Session, line: &str) -> Option<Box<dyn ExecutableCommand>> {
        let (verb, args) = split_meta(line)?;
        if verb != T::name() {
            return None;
        }
        let command_name = format!("{}{}", META_PREFIX, verb);
        Some(match T::from_args(&[command_name.as_str()], &args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                output,
                is_error: status.is_err(),
            }),
        })
    }
}

/// Name and summary of every verb, in the order `:help` lists them.
fn verbs() -> [(&'static str, &'static str); 5] {
    [
        (Help::name(), Help::summary()),
        (Vars::name(), Vars::summary()),
        (Unset::name(), Unset::summary()),
        (Reset::name(), Reset::summary()),
        (Echo::name(), Echo::summary()),
    ]
}

/// The default verb factories, registered ahead of the expression factory.
pub(crate) fn factories() -> Vec<Box<dyn CommandFactory>> {
    vec![
        Box::new(Factory::<Help>::default()),
        Box::new(Factory::<Vars>::default()),
        Box::new(Factory::<Unset>::default()),
        Box::new(Factory::<Reset>::default()),
        Box::new(Factory::<Echo>::default()),
    ]
}

#[derive(FromArgs)]
/// List meta commands and expression functions.
pub struct Help {}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn summary() -> &'static str {
        "list meta commands and functions"
    }

    fn execute(self, stdout: &mut dyn Write, _session: &mut Session) -> Result<()> {
        writeln!(stdout, "Meta commands:")?;
        for (name, summary) in verbs() {
            writeln!(stdout, "  {}{:<8} {}", META_PREFIX, name, summary)?;
        }
        writeln!(stdout, "Functions:")?;
        for function in FUNCTIONS {
            writeln!(stdout, "  {:<9} {}", format!("{}()", function.name), function.summary)?;
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// List session variables, optionally only those whose name matches a pattern.
pub struct Vars {
    #[argh(positional)]
    /// regular expression matched against variable names
    pub pattern: Option<String>,

    #[argh(switch, short = 'i')]
    /// ignore case distinctions in the pattern
    pub ignore_case: bool,
}

impl BuiltinCommand for Vars {
    fn name() -> &'static str {
        "vars"
    }

    fn summary() -> &'static str {
        "list variables: [-i] [pattern]"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<()> {
        let re = match &self.pattern {
            Some(pattern) => Some(
                RegexBuilder::new(pattern)
                    .case_insensitive(self.ignore_case)
                    .build()
                    .with_context(|| format!("invalid regex pattern: {}", pattern))?,
            ),
            None => None,
        };

        for (name, value) in session.sorted_vars() {
            if re.as_ref().is_none_or(|re| re.is_match(name)) {
                writeln!(stdout, "{} = {}", name, value.repr())?;
            }
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Remove variables from the session.
pub struct Unset {
    #[argh(positional, greedy)]
    /// names of the variables to remove
    pub names: Vec<String>,
}

impl BuiltinCommand for Unset {
    fn name() -> &'static str {
        "unset"
    }

    fn summary() -> &'static str {
        "remove variables: NAME..."
    }

    fn execute(self, _stdout: &mut dyn Write, session: &mut Session) -> Result<()> {
        if self.names.is_empty() {
            anyhow::bail!("unset: expected at least one name");
        }
        // all names are checked first so a typo removes nothing
        if let Some(missing) = self.names.iter().find(|n| session.get_var(n).is_none()) {
            anyhow::bail!("name '{}' is not defined", missing);
        }
        for name in &self.names {
            session.remove_var(name);
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Remove every variable from the session.
pub struct Reset {}

impl BuiltinCommand for Reset {
    fn name() -> &'static str {
        "reset"
    }

    fn summary() -> &'static str {
        "remove all variables"
    }

    fn execute(self, _stdout: &mut dyn Write, session: &mut Session) -> Result<()> {
        session.vars.clear();
        Ok(())
    }
}

#[derive(FromArgs)]
/// write the arguments to standard output, separated by spaces.
/// by default, a trailing newline is printed.
pub struct Echo {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline.
    pub no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces.
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn summary() -> &'static str {
        "print the arguments as-is: [-n] ARGS..."
    }

    fn execute(self, stdout: &mut dyn Write, _session: &mut Session) -> Result<()> {
        let s = self.args.join(" ");
        if self.no_newline {
            write!(stdout, "{}", s)?;
        } else {
            writeln!(stdout, "{}", s)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn session_with(vars: &[(&str, Value)]) -> Session {
        let mut session = Session::new();
        for (name, value) in vars {
            session.set_var(*name, value.clone());
        }
        session
    }

    fn run_line<T: BuiltinCommand + 'static>(
        session: &mut Session,
        line: &str,
    ) -> (Result<()>, String) {
        let cmd = Factory::<T>::default()
            .try_create(session, line)
            .expect("factory should accept the line");
        let mut out = Vec::new();
        let res = cmd.execute(&mut out, session);
        (res, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_factory_matches_only_its_verb() {
        let session = Session::new();
        assert!(Factory::<Vars>::default().try_create(&session, ":vars").is_some());
        assert!(Factory::<Vars>::default().try_create(&session, ":unset x").is_none());
        assert!(Factory::<Vars>::default().try_create(&session, "vars").is_none());
    }

    #[test]
    fn test_echo_with_and_without_newline() {
        let mut session = Session::new();

        let (res, out) = run_line::<Echo>(&mut session, ":echo hello   world");
        assert!(res.is_ok());
        assert_eq!(out, "hello world\n");

        let (res, out) = run_line::<Echo>(&mut session, ":echo -n foo bar");
        assert!(res.is_ok());
        assert_eq!(out, "foo bar");
    }

    #[test]
    fn test_vars_lists_sorted_with_filter() {
        let mut session = session_with(&[
            ("name", Value::Str("Ada".to_string())),
            ("Count", Value::Int(3)),
            ("ratio", Value::Float(0.5)),
        ]);

        let (res, out) = run_line::<Vars>(&mut session, ":vars");
        assert!(res.is_ok());
        assert_eq!(out, "Count = 3\nname = 'Ada'\nratio = 0.5\n");

        let (_, out) = run_line::<Vars>(&mut session, ":vars ^c");
        assert_eq!(out, "");

        let (_, out) = run_line::<Vars>(&mut session, ":vars -i ^c");
        assert_eq!(out, "Count = 3\n");
    }

    #[test]
    fn test_vars_rejects_bad_regex() {
        let mut session = Session::new();
        let (res, _) = run_line::<Vars>(&mut session, ":vars (");
        assert!(res.unwrap_err().to_string().contains("invalid regex pattern"));
    }

    #[test]
    fn test_unset_and_reset() {
        let mut session = session_with(&[("a", Value::Int(1)), ("b", Value::Int(2))]);

        let (res, _) = run_line::<Unset>(&mut session, ":unset a zz");
        assert_eq!(res.unwrap_err().to_string(), "name 'zz' is not defined");
        assert_eq!(session.vars.len(), 2);

        let (res, _) = run_line::<Unset>(&mut session, ":unset a");
        assert!(res.is_ok());
        assert_eq!(session.get_var("a"), None);

        let (res, _) = run_line::<Unset>(&mut session, ":unset");
        assert!(res.is_err());

        let (res, _) = run_line::<Reset>(&mut session, ":reset");
        assert!(res.is_ok());
        assert!(session.vars.is_empty());
    }

    #[test]
    fn test_help_lists_verbs_and_functions() {
        let mut session = Session::new();
        let (res, out) = run_line::<Help>(&mut session, ":help");
        assert!(res.is_ok());
        assert!(out.contains(":vars"));
        assert!(out.contains(":unset"));
        assert!(out.contains("print()"));
        assert!(out.contains("exit()"));
    }

    #[test]
    fn test_invalid_arguments_are_errors() {
        let mut session = Session::new();
        let (res, _) = run_line::<Reset>(&mut session, ":reset now");
        assert!(res.is_err());

        let (res, out) = run_line::<Echo>(&mut session, ":echo --help");
        assert!(res.is_ok());
        assert!(out.contains("Usage"));
    }
}
