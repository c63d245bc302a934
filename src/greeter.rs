//! Startup greeting: banner, name prompt, personalized welcome.

use crate::config::Config;
use crate::io_adapters::LineSource;
use anyhow::{Context, Result};
use std::io::Write;
use tracing::debug;

/// Prints the banner, asks for the user's name and welcomes them.
///
/// The name is echoed verbatim, whatever it contains. A closed or interrupted
/// input stream is returned as an error; nothing here recovers from it.
pub fn greet(
    config: &Config,
    source: &mut dyn LineSource,
    stdout: &mut dyn Write,
) -> Result<String> {
    writeln!(stdout, "{}", config.banner)?;
    stdout.flush()?;

    let name = match &config.name {
        Some(name) => name.clone(),
        None => source
            .read_line(&config.name_prompt)
            .context("failed to read the user's name")?,
    };
    debug!(name_len = name.len(), "greeting user");

    writeln!(stdout, "Olá, {}! Bem-vindo ao sistema.", name)?;
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::ScriptedSource;

    #[test]
    fn test_greets_by_name() {
        let config = Config::default();
        let mut source = ScriptedSource::new(["Ada"]);
        let mut out = Vec::new();

        let name = greet(&config, &mut source, &mut out).unwrap();

        assert_eq!(name, "Ada");
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Hello 10x Tool Calls\nOlá, Ada! Bem-vindo ao sistema.\n"
        );
        assert_eq!(source.prompts(), ["Digite seu nome: "]);
    }

    #[test]
    fn test_name_is_echoed_verbatim() {
        let config = Config::default();
        let mut source = ScriptedSource::new(["  \x1b[1m{x}  "]);
        let mut out = Vec::new();

        greet(&config, &mut source, &mut out).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.ends_with("Olá,   \x1b[1m{x}  ! Bem-vindo ao sistema.\n"));
    }

    #[test]
    fn test_empty_name_is_accepted() {
        let config = Config::default();
        let mut source = ScriptedSource::new([""]);
        let mut out = Vec::new();

        greet(&config, &mut source, &mut out).unwrap();

        assert!(String::from_utf8(out).unwrap().contains("Olá, ! Bem-vindo ao sistema."));
    }

    #[test]
    fn test_configured_name_skips_prompt() {
        let config = Config {
            name: Some("Grace".to_string()),
            ..Config::default()
        };
        let mut source = ScriptedSource::new(Vec::<String>::new());
        let mut out = Vec::new();

        assert_eq!(greet(&config, &mut source, &mut out).unwrap(), "Grace");
        assert!(source.prompts().is_empty());
    }

    #[test]
    fn test_closed_input_is_an_error() {
        let config = Config::default();
        let mut source = ScriptedSource::new(Vec::<String>::new());
        let mut out = Vec::new();

        let err = greet(&config, &mut source, &mut out).unwrap_err();

        assert!(err.to_string().contains("failed to read the user's name"));
        assert_eq!(String::from_utf8(out).unwrap(), "Hello 10x Tool Calls\n");
    }
}
