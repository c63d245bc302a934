//! Tree-walking evaluation of parsed statements against a [`Session`].

use crate::functions;
use crate::parser::{BinaryOp, Expr, LogicalOp, Statement, UnaryOp};
use crate::session::Session;
use crate::value::Value;
use std::io::{self, Write};
use thiserror::Error;
use tracing::trace;

/// Upper bound on the size of a string built by `str * int`.
const MAX_REPEAT_BYTES: usize = 1 << 24;

/// Errors raised while evaluating a statement.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("name '{0}' is not defined")]
    UndefinedName(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
    #[error("result too large")]
    TooLarge,
    #[error("unsupported operand type(s) for {op}: '{lhs}' and '{rhs}'")]
    UnsupportedOperands {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("bad operand type for unary {op}: '{operand}'")]
    BadOperand {
        op: &'static str,
        operand: &'static str,
    },
    #[error("'{0}' object is not callable")]
    NotCallable(&'static str),
    #[error("{name}() takes {expected} ({given} given)")]
    Arity {
        name: &'static str,
        expected: &'static str,
        given: usize,
    },
    /// Argument has the right type but an unusable value, e.g. `int('abc')`.
    #[error("{0}")]
    InvalidValue(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Everything a statement can touch while it runs.
pub struct Evaluator<'a> {
    pub session: &'a mut Session,
    pub stdout: &'a mut dyn Write,
}

impl<'a> Evaluator<'a> {
    pub fn new(session: &'a mut Session, stdout: &'a mut dyn Write) -> Self {
        Self { session, stdout }
    }

    /// Runs statements in order, stopping at the first error.
    pub fn run(&mut self, statements: &[Statement]) -> Result<(), EvalError> {
        for statement in statements {
            self.execute(statement)?;
        }
        Ok(())
    }

    fn execute(&mut self, statement: &Statement) -> Result<(), EvalError> {
        match statement {
            Statement::Assign { name, value } => {
                let value = self.eval(value)?;
                trace!(%name, %value, "assign");
                self.session.set_var(name.clone(), value);
            }
            Statement::Expr(expr) => {
                self.eval(expr)?;
            }
        }
        Ok(())
    }

    pub fn eval(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Variable(name) => self
                .session
                .get_var(name)
                .cloned()
                .ok_or_else(|| EvalError::UndefinedName(name.clone())),
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand)?;
                unary(*op, operand)
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                binary(*op, lhs, rhs)
            }
            Expr::Logical { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                match (op, lhs.is_truthy()) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(lhs),
                    _ => self.eval(rhs),
                }
            }
            Expr::Call { name, args } => {
                let function = match functions::lookup(name) {
                    Some(function) => function,
                    None => {
                        return Err(match self.session.get_var(name) {
                            Some(value) => EvalError::NotCallable(value.type_name()),
                            None => EvalError::UndefinedName(name.clone()),
                        });
                    }
                };
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                (function.call)(self, &args)
            }
        }
    }
}

fn unary(op: UnaryOp, operand: Value) -> Result<Value, EvalError> {
    match (op, &operand) {
        (UnaryOp::Not, _) => Ok(Value::Bool(!operand.is_truthy())),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Pos, Value::Float(f)) => Ok(Value::Float(*f)),
        (UnaryOp::Neg, _) => match operand.as_int() {
            Some(i) => i.checked_neg().map(Value::Int).ok_or(EvalError::Overflow),
            None => Err(bad_operand("-", &operand)),
        },
        (UnaryOp::Pos, _) => match operand.as_int() {
            Some(i) => Ok(Value::Int(i)),
            None => Err(bad_operand("+", &operand)),
        },
    }
}

fn bad_operand(op: &'static str, operand: &Value) -> EvalError {
    EvalError::BadOperand {
        op,
        operand: operand.type_name(),
    }
}

fn unsupported(op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalError {
    EvalError::UnsupportedOperands {
        op: op.symbol(),
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Eq => return Ok(Value::Bool(values_equal(&lhs, &rhs))),
        BinaryOp::NotEq => return Ok(Value::Bool(!values_equal(&lhs, &rhs))),
        BinaryOp::Less | BinaryOp::LessEq | BinaryOp::Greater | BinaryOp::GreaterEq => {
            return compare(op, &lhs, &rhs);
        }
        _ => {}
    }

    match (&lhs, &rhs) {
        (Value::Str(a), Value::Str(b)) if op == BinaryOp::Add => Ok(Value::Str(format!("{a}{b}"))),
        (Value::Str(s), other) | (other, Value::Str(s)) if op == BinaryOp::Mul => {
            let Some(n) = other.as_int() else {
                return Err(unsupported(op, &lhs, &rhs));
            };
            let n = n.max(0) as usize;
            match s.len().checked_mul(n) {
                Some(total) if total <= MAX_REPEAT_BYTES => Ok(Value::Str(s.repeat(n))),
                _ => Err(EvalError::TooLarge),
            }
        }
        _ => match (lhs.as_int(), rhs.as_int()) {
            (Some(a), Some(b)) => int_arith(op, a, b),
            _ => match (lhs.as_float(), rhs.as_float()) {
                (Some(a), Some(b)) => float_arith(op, a, b),
                _ => Err(unsupported(op, &lhs, &rhs)),
            },
        },
    }
}

fn int_arith(op: BinaryOp, a: i64, b: i64) -> Result<Value, EvalError> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => return float_arith(op, a as f64, b as f64),
        BinaryOp::FloorDiv | BinaryOp::Mod if b == 0 => return Err(EvalError::DivisionByZero),
        BinaryOp::FloorDiv => a.checked_div(b).map(|q| {
            if a % b != 0 && ((a < 0) != (b < 0)) {
                q - 1
            } else {
                q
            }
        }),
        BinaryOp::Mod => a.checked_rem(b).map(|r| {
            if r != 0 && ((r < 0) != (b < 0)) {
                r + b
            } else {
                r
            }
        }),
        BinaryOp::Pow if b < 0 => return float_arith(op, a as f64, b as f64),
        // these bases never grow, whatever the exponent
        BinaryOp::Pow if a == 0 => Some(i64::from(b == 0)),
        BinaryOp::Pow if a == 1 => Some(1),
        BinaryOp::Pow if a == -1 => Some(if b % 2 == 0 { 1 } else { -1 }),
        BinaryOp::Pow => u32::try_from(b).ok().and_then(|b| a.checked_pow(b)),
        _ => unreachable!("comparisons are handled before arithmetic"),
    };
    result.map(Value::Int).ok_or(EvalError::Overflow)
}

fn float_arith(op: BinaryOp, a: f64, b: f64) -> Result<Value, EvalError> {
    let zero_divisor = b == 0.0;
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod if zero_divisor => {
            return Err(EvalError::DivisionByZero);
        }
        BinaryOp::Div => a / b,
        BinaryOp::FloorDiv => (a / b).floor(),
        BinaryOp::Mod => a - b * (a / b).floor(),
        BinaryOp::Pow if a == 0.0 && b < 0.0 => return Err(EvalError::DivisionByZero),
        BinaryOp::Pow => a.powf(b),
        _ => unreachable!("comparisons are handled before arithmetic"),
    };
    Ok(Value::Float(result))
}

fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::None, Value::None) => true,
        (Value::Str(_), _) | (_, Value::Str(_)) | (Value::None, _) | (_, Value::None) => false,
        _ => lhs.as_float() == rhs.as_float(),
    }
}

fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    let ordering = match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => match (lhs.as_float(), rhs.as_float()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => return Err(unsupported(op, lhs, rhs)),
        },
    };
    // NaN compares false against everything
    let Some(ordering) = ordering else {
        return Ok(Value::Bool(false));
    };
    let result = match op {
        BinaryOp::Less => ordering.is_lt(),
        BinaryOp::LessEq => ordering.is_le(),
        BinaryOp::Greater => ordering.is_gt(),
        BinaryOp::GreaterEq => ordering.is_ge(),
        _ => unreachable!("only ordering operators reach compare"),
    };
    Ok(Value::Bool(result))
}
