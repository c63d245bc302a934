use crate::lexer::Token;
use crate::value::Value;
use thiserror::Error;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

/// Binary operators, arithmetic and comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

impl BinaryOp {
    /// Operator as written in source, used in error messages.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
        }
    }
}

/// Short-circuiting boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Call of a named function: `name(args...)`
    Call { name: String, args: Vec<Expr> },
}

/// One statement of a line. A line may hold several, separated by `;`.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Variable assignment: name = value
    Assign { name: String, value: Expr },
    /// Expression evaluated for its side effects.
    Expr(Expr),
}

#[derive(Debug, Error, PartialEq)]
pub enum ParsingError {
    #[error("invalid syntax: unexpected {0:?}")]
    UnexpectedToken(Token),
    #[error("invalid syntax: unexpected end of input")]
    UnexpectedEnd,
    #[error("invalid syntax: cannot assign to expression")]
    InvalidAssignment,
    #[error("invalid syntax: expression too deeply nested")]
    TooDeep,
}

/// Budget for the depth of the tree under construction.
const MAX_DEPTH: usize = 1000;
/// What one recursive descent (parentheses, call arguments, prefix operators,
/// exponents) takes from the budget. Caps nesting at 200 levels.
const NESTING_COST: usize = 5;

struct AstBuilder {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl AstBuilder {
    fn from(tokens: Vec<Token>) -> Self {
        AstBuilder {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn build_ast(mut self) -> Result<Vec<Statement>, ParsingError> {
        let mut statements = Vec::new();

        while self.peek().is_some() {
            statements.push(self.parse_statement()?);
            match self.consume() {
                Some(Token::Semicolon) | None => {}
                Some(token) => return Err(ParsingError::UnexpectedToken(token)),
            }
        }

        Ok(statements)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParsingError> {
        match self.consume() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(ParsingError::UnexpectedToken(token)),
            None => Err(ParsingError::UnexpectedEnd),
        }
    }

    fn enter(&mut self, cost: usize) -> Result<(), ParsingError> {
        self.depth += cost;
        if self.depth > MAX_DEPTH {
            return Err(ParsingError::TooDeep);
        }
        Ok(())
    }

    /// Runs `parse` one nesting level deeper.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParsingError>,
    ) -> Result<T, ParsingError> {
        self.enter(NESTING_COST)?;
        let result = parse(self);
        self.depth -= NESTING_COST;
        result
    }

    /// Parse a statement: IDENT '=' expr | expr
    fn parse_statement(&mut self) -> Result<Statement, ParsingError> {
        if let (Some(Token::Ident(name)), Some(Token::Assign)) = (self.peek(), self.peek_nth(1)) {
            let name = name.clone();
            self.pos += 2;
            let value = self.parse_expr()?;
            return Ok(Statement::Assign { name, value });
        }

        let expr = self.parse_expr()?;
        if let Some(Token::Assign) = self.peek() {
            return Err(ParsingError::InvalidAssignment);
        }
        Ok(Statement::Expr(expr))
    }

    fn parse_expr(&mut self) -> Result<Expr, ParsingError> {
        self.nested(Self::parse_or)
    }

    // Every left-associative loop iteration deepens the tree by one node on
    // the left, so it is charged against the budget until the loop ends.

    fn parse_or(&mut self) -> Result<Expr, ParsingError> {
        let depth = self.depth;
        let mut lhs = self.parse_and()?;
        while let Some(Token::Or) = self.peek() {
            self.consume();
            self.enter(1)?;
            let rhs = self.parse_and()?;
            lhs = Expr::Logical {
                op: LogicalOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        self.depth = depth;
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParsingError> {
        let depth = self.depth;
        let mut lhs = self.parse_not()?;
        while let Some(Token::And) = self.peek() {
            self.consume();
            self.enter(1)?;
            let rhs = self.parse_not()?;
            lhs = Expr::Logical {
                op: LogicalOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        self.depth = depth;
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, ParsingError> {
        if let Some(Token::Not) = self.peek() {
            self.consume();
            let operand = self.nested(Self::parse_not)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    /// Comparisons do not chain: `a < b < c` is a syntax error.
    fn parse_comparison(&mut self) -> Result<Expr, ParsingError> {
        let lhs = self.parse_additive()?;
        let op = match self.peek() {
            Some(Token::EqEq) => BinaryOp::Eq,
            Some(Token::NotEq) => BinaryOp::NotEq,
            Some(Token::Less) => BinaryOp::Less,
            Some(Token::LessEq) => BinaryOp::LessEq,
            Some(Token::Greater) => BinaryOp::Greater,
            Some(Token::GreaterEq) => BinaryOp::GreaterEq,
            _ => return Ok(lhs),
        };
        self.consume();
        let rhs = self.parse_additive()?;
        Ok(binary(op, lhs, rhs))
    }

    fn parse_additive(&mut self) -> Result<Expr, ParsingError> {
        let depth = self.depth;
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.consume();
            self.enter(1)?;
            let rhs = self.parse_term()?;
            lhs = binary(op, lhs, rhs);
        }
        self.depth = depth;
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, ParsingError> {
        let depth = self.depth;
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::DoubleSlash) => BinaryOp::FloorDiv,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.consume();
            self.enter(1)?;
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs);
        }
        self.depth = depth;
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParsingError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Pos,
            _ => return self.parse_power(),
        };
        self.consume();
        let operand = self.nested(Self::parse_unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// `**` binds tighter than unary minus on its left and is right-associative:
    /// `-2 ** 2` is `-(2 ** 2)`, `2 ** -1` is `2 ** (-1)`.
    fn parse_power(&mut self) -> Result<Expr, ParsingError> {
        let base = self.parse_call()?;
        if let Some(Token::DoubleStar) = self.peek() {
            self.consume();
            let exponent = self.nested(Self::parse_unary)?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_call(&mut self) -> Result<Expr, ParsingError> {
        if let (Some(Token::Ident(name)), Some(Token::LParen)) = (self.peek(), self.peek_nth(1)) {
            let name = name.clone();
            self.pos += 2;
            let args = self.parse_args()?;
            return Ok(Expr::Call { name, args });
        }
        self.parse_primary()
    }

    /// Parse call arguments after the opening parenthesis, trailing comma allowed.
    fn parse_args(&mut self) -> Result<Vec<Expr>, ParsingError> {
        let mut args = Vec::new();
        loop {
            if let Some(Token::RParen) = self.peek() {
                self.consume();
                return Ok(args);
            }
            args.push(self.parse_expr()?);
            match self.consume() {
                Some(Token::Comma) => {}
                Some(Token::RParen) => return Ok(args),
                Some(token) => return Err(ParsingError::UnexpectedToken(token)),
                None => return Err(ParsingError::UnexpectedEnd),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParsingError> {
        match self.consume() {
            Some(Token::Int(i)) => Ok(Expr::Literal(Value::Int(i))),
            Some(Token::Float(f)) => Ok(Expr::Literal(Value::Float(f))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::Str(s))),
            Some(Token::Bool(b)) => Ok(Expr::Literal(Value::Bool(b))),
            Some(Token::NoneLit) => Ok(Expr::Literal(Value::None)),
            Some(Token::Ident(name)) => Ok(Expr::Variable(name)),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(token) => Err(ParsingError::UnexpectedToken(token)),
            None => Err(ParsingError::UnexpectedEnd),
        }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

/// Builds the statement list of one line from its tokens.
///
/// An empty token list yields no statements.
pub fn construct_ast(tokens: Vec<Token>) -> Result<Vec<Statement>, ParsingError> {
    AstBuilder::from(tokens).build_ast()
}
