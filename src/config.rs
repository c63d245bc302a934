//! Texts and keywords the shell shows and recognizes.

/// Runtime configuration of the greeter and the command loop.
///
/// [`Config::default`] reproduces the stock Portuguese session; the binary overrides
/// fields from its command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// First line printed at startup.
    pub banner: String,
    /// Prompt shown when asking for the user's name.
    pub name_prompt: String,
    /// When set, the greeter uses this name instead of asking for one.
    pub name: Option<String>,
    /// Prompt shown before every command.
    pub command_prompt: String,
    /// Words that end the loop, compared after lowercasing the whole line.
    pub exit_keywords: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            banner: "Hello 10x Tool Calls".to_string(),
            name_prompt: "Digite seu nome: ".to_string(),
            name: None,
            command_prompt: "> ".to_string(),
            exit_keywords: ["exit", "quit", "sair"].map(String::from).to_vec(),
        }
    }
}

impl Config {
    /// Whether `line` is one of the exit keywords, ignoring letter case.
    ///
    /// Surrounding whitespace is significant: `" exit"` is not a keyword.
    pub fn is_exit_keyword(&self, line: &str) -> bool {
        let folded = line.to_lowercase();
        self.exit_keywords.iter().any(|k| k.to_lowercase() == folded)
    }

    /// Message printed when the loop starts, naming the first two exit keywords.
    pub fn awaiting_message(&self) -> String {
        match self.exit_keywords.as_slice() {
            [] => "Aguardando comandos...".to_string(),
            [only] => format!("Aguardando comandos... (Digite '{}' para sair)", only),
            [first, second, ..] => format!(
                "Aguardando comandos... (Digite '{}' ou '{}' para sair)",
                first, second
            ),
        }
    }
}
