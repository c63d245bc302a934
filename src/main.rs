use argh::FromArgs;
use greeting_shell::{Config, EditorSource, Interpreter, greeter};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(FromArgs)]
/// Greet the user, then read and run commands until 'exit', 'quit' or 'sair'.
struct Options {
    #[argh(option)]
    /// use this name instead of asking for one
    name: Option<String>,

    #[argh(option)]
    /// prompt shown before every command (default "> ")
    prompt: Option<String>,

    #[argh(option)]
    /// first line printed at startup
    banner: Option<String>,

    #[argh(option)]
    /// word that ends the session; repeat to give several, replacing the defaults
    exit_keyword: Vec<String>,
}

impl Options {
    fn into_config(self) -> Config {
        let mut config = Config::default();
        config.name = self.name;
        if let Some(prompt) = self.prompt {
            config.command_prompt = prompt;
        }
        if let Some(banner) = self.banner {
            config.banner = banner;
        }
        if !self.exit_keyword.is_empty() {
            config.exit_keywords = self.exit_keyword;
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr and stay silent unless RUST_LOG asks for them
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let options: Options = argh::from_env();
    let config = options.into_config();

    let mut source = EditorSource::new()?;
    let mut stdout = std::io::stdout();

    greeter::greet(&config, &mut source, &mut stdout)?;
    let shutdown = Interpreter::with_config(config).repl(&mut source, &mut stdout)?;

    std::process::exit(shutdown.exit_code())
}
