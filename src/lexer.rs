//! Lexical analysis (tokenization) for the expression language.

use thiserror::Error;

/// Represents a token resulting from lexical analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Integer literal, e.g. `42`.
    Int(i64),
    /// Float literal, e.g. `1.5`.
    Float(f64),
    /// String literal in single or double quotes, escapes already resolved.
    Str(String),
    /// `True` or `False`.
    Bool(bool),
    /// `None`.
    NoneLit,
    /// Identifier: a variable or function name.
    Ident(String),
    And,
    Or,
    Not,
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    LParen,
    RParen,
    Comma,
    Semicolon,
    /// The assignment symbol, `=`.
    Assign,
    EqEq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

/// Errors that can occur during the lexical analysis process.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexingError {
    /// A closing quote (single or double) was not found.
    #[error("unterminated string literal")]
    UnfinishedQuote,
    /// A character that starts no token.
    #[error("invalid character '{0}'")]
    UnexpectedChar(char),
    /// An integer literal that does not fit in 64 bits.
    #[error("integer literal too large: {0}")]
    NumberTooLarge(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingNumber,
    ReadingIdent,
    ReadingQuote(char),
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    buffer: String,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            buffer: String::new(),
        }
    }

    /// Runs the machine over the whole input and returns the tokens in order.
    fn make_tokens(&mut self) -> Result<Vec<Token>, LexingError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start => self.handle_start(ch, &mut out)?,
                LexingState::ReadingNumber => self.handle_number(ch, &mut out)?,
                LexingState::ReadingIdent => self.handle_ident(ch, &mut out)?,
                LexingState::ReadingQuote(quote) => self.handle_quote(ch, quote, &mut out),
            }
        }

        match self.state {
            LexingState::ReadingQuote(_) => return Err(LexingError::UnfinishedQuote),
            LexingState::ReadingNumber => out.push(self.finish_number()?),
            LexingState::ReadingIdent => out.push(self.finish_ident()),
            LexingState::Start => {}
        }

        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_nth_char(&self, n: usize) -> Option<char> {
        self.input.get(self.pos + n).copied()
    }

    /// Whether the upcoming chars complete an exponent: digits, optionally signed.
    fn exponent_follows(&self) -> bool {
        match self.peek_char() {
            Some(c) if c.is_ascii_digit() => true,
            Some('+' | '-') => self.peek_nth_char(1).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    /// Consumes the next char when it equals `expected`.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn handle_start(&mut self, ch: char, out: &mut Vec<Token>) -> Result<(), LexingError> {
        let token = match ch {
            c if c.is_whitespace() => return Ok(()),
            c if c.is_ascii_digit() => {
                self.buffer.push(c);
                self.state = LexingState::ReadingNumber;
                return Ok(());
            }
            c if c.is_alphabetic() || c == '_' => {
                self.buffer.push(c);
                self.state = LexingState::ReadingIdent;
                return Ok(());
            }
            '\'' | '"' => {
                self.state = LexingState::ReadingQuote(ch);
                return Ok(());
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' if self.eat('*') => Token::DoubleStar,
            '*' => Token::Star,
            '/' if self.eat('/') => Token::DoubleSlash,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            '=' if self.eat('=') => Token::EqEq,
            '=' => Token::Assign,
            '!' if self.eat('=') => Token::NotEq,
            '<' if self.eat('=') => Token::LessEq,
            '<' => Token::Less,
            '>' if self.eat('=') => Token::GreaterEq,
            '>' => Token::Greater,
            c => return Err(LexingError::UnexpectedChar(c)),
        };
        out.push(token);
        Ok(())
    }

    fn handle_number(&mut self, ch: char, out: &mut Vec<Token>) -> Result<(), LexingError> {
        match ch {
            c if c.is_ascii_digit() => self.buffer.push(c),
            '.' if !self.buffer.contains(['.', 'e']) => self.buffer.push('.'),
            'e' | 'E' if !self.buffer.contains('e') && self.exponent_follows() => {
                self.buffer.push('e');
                if let Some(sign @ ('+' | '-')) = self.peek_char() {
                    self.pos += 1;
                    self.buffer.push(sign);
                }
            }
            '_' => {}
            c => {
                out.push(self.finish_number()?);
                self.state = LexingState::Start;
                self.handle_start(c, out)?;
            }
        }
        Ok(())
    }

    fn handle_ident(&mut self, ch: char, out: &mut Vec<Token>) -> Result<(), LexingError> {
        if ch.is_alphanumeric() || ch == '_' {
            self.buffer.push(ch);
        } else {
            out.push(self.finish_ident());
            self.state = LexingState::Start;
            self.handle_start(ch, out)?;
        }
        Ok(())
    }

    fn handle_quote(&mut self, ch: char, quote: char, out: &mut Vec<Token>) {
        match ch {
            c if c == quote => {
                out.push(Token::Str(std::mem::take(&mut self.buffer)));
                self.state = LexingState::Start;
            }
            '\\' => match self.read_char() {
                Some('n') => self.buffer.push('\n'),
                Some('t') => self.buffer.push('\t'),
                Some('r') => self.buffer.push('\r'),
                Some('0') => self.buffer.push('\0'),
                Some(c @ ('\\' | '\'' | '"')) => self.buffer.push(c),
                // unknown escapes are kept verbatim
                Some(c) => {
                    self.buffer.push('\\');
                    self.buffer.push(c);
                }
                None => self.buffer.push('\\'),
            },
            c => self.buffer.push(c),
        }
    }

    fn finish_number(&mut self) -> Result<Token, LexingError> {
        let text = std::mem::take(&mut self.buffer);
        if text.contains(['.', 'e']) {
            // digits, at most one dot, then an optional complete exponent
            Ok(Token::Float(text.parse().unwrap_or(f64::NAN)))
        } else {
            text.parse()
                .map(Token::Int)
                .map_err(|_| LexingError::NumberTooLarge(text))
        }
    }

    fn finish_ident(&mut self) -> Token {
        let word = std::mem::take(&mut self.buffer);
        match word.as_str() {
            "True" => Token::Bool(true),
            "False" => Token::Bool(false),
            "None" => Token::NoneLit,
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            _ => Token::Ident(word),
        }
    }
}

/// The main entry point function to perform lexical analysis.
///
/// Creates and runs the finite state machine to tokenize the input line.
///
/// # Returns
/// `Result<Vec<Token>, LexingError>`: A vector of tokens on success, or a `LexingError`
/// if an unterminated string or an unknown character is encountered.
pub fn split_into_tokens(line: &str) -> Result<Vec<Token>, LexingError> {
    let mut lexer = LexingFSM::new(line);
    lexer.make_tokens()
}
