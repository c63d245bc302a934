//! Built-in functions callable from expressions, e.g. `print(x)` or `len('abc')`.

use crate::eval::{EvalError, Evaluator};
use crate::value::Value;

pub type BuiltinFn = fn(&mut Evaluator<'_>, &[Value]) -> Result<Value, EvalError>;

/// A named entry of the function table.
pub struct Function {
    pub name: &'static str,
    pub summary: &'static str,
    pub call: BuiltinFn,
}

/// Every function known to the expression language, in the order `:help` lists them.
pub static FUNCTIONS: &[Function] = &[
    Function {
        name: "print",
        summary: "print the arguments separated by spaces",
        call: print,
    },
    Function {
        name: "len",
        summary: "number of characters in a string",
        call: len,
    },
    Function {
        name: "str",
        summary: "convert to string",
        call: to_str,
    },
    Function {
        name: "int",
        summary: "convert to integer, truncating floats",
        call: to_int,
    },
    Function {
        name: "float",
        summary: "convert to float",
        call: to_float,
    },
    Function {
        name: "bool",
        summary: "truthiness of a value",
        call: to_bool,
    },
    Function {
        name: "abs",
        summary: "absolute value",
        call: abs,
    },
    Function {
        name: "round",
        summary: "round to the nearest integer, ties to even",
        call: round,
    },
    Function {
        name: "min",
        summary: "smallest argument",
        call: min,
    },
    Function {
        name: "max",
        summary: "largest argument",
        call: max,
    },
    Function {
        name: "type",
        summary: "name of the argument's type",
        call: type_of,
    },
    Function {
        name: "exit",
        summary: "leave the shell",
        call: exit,
    },
    Function {
        name: "quit",
        summary: "leave the shell",
        call: exit,
    },
];

pub fn lookup(name: &str) -> Option<&'static Function> {
    FUNCTIONS.iter().find(|f| f.name == name)
}

fn one_arg<'v>(name: &'static str, args: &'v [Value]) -> Result<&'v Value, EvalError> {
    match args {
        [value] => Ok(value),
        _ => Err(EvalError::Arity {
            name,
            expected: "exactly one argument",
            given: args.len(),
        }),
    }
}

fn print(ev: &mut Evaluator<'_>, args: &[Value]) -> Result<Value, EvalError> {
    let line = args
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(ev.stdout, "{}", line)?;
    Ok(Value::None)
}

fn len(_ev: &mut Evaluator<'_>, args: &[Value]) -> Result<Value, EvalError> {
    match one_arg("len", args)? {
        Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
        other => Err(EvalError::InvalidValue(format!(
            "object of type '{}' has no len()",
            other.type_name()
        ))),
    }
}

fn to_str(_ev: &mut Evaluator<'_>, args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Str(one_arg("str", args)?.to_string()))
}

fn to_int(_ev: &mut Evaluator<'_>, args: &[Value]) -> Result<Value, EvalError> {
    match one_arg("int", args)? {
        Value::Str(s) => s.trim().parse().map(Value::Int).map_err(|_| {
            EvalError::InvalidValue(format!("invalid literal for int() with base 10: '{}'", s))
        }),
        Value::Float(f) if f.is_finite() => float_to_int(f.trunc()).map(Value::Int),
        Value::Float(_) => Err(EvalError::InvalidValue(
            "cannot convert float infinity or nan to integer".to_string(),
        )),
        other => other.as_int().map(Value::Int).ok_or_else(|| {
            EvalError::InvalidValue(format!(
                "int() argument must be a string or a number, not '{}'",
                other.type_name()
            ))
        }),
    }
}

fn to_float(_ev: &mut Evaluator<'_>, args: &[Value]) -> Result<Value, EvalError> {
    match one_arg("float", args)? {
        Value::Str(s) => s.trim().parse().map(Value::Float).map_err(|_| {
            EvalError::InvalidValue(format!("could not convert string to float: '{}'", s))
        }),
        other => other.as_float().map(Value::Float).ok_or_else(|| {
            EvalError::InvalidValue(format!(
                "float() argument must be a string or a number, not '{}'",
                other.type_name()
            ))
        }),
    }
}

fn to_bool(_ev: &mut Evaluator<'_>, args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Bool(one_arg("bool", args)?.is_truthy()))
}

fn abs(_ev: &mut Evaluator<'_>, args: &[Value]) -> Result<Value, EvalError> {
    match one_arg("abs", args)? {
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => match other.as_int() {
            Some(i) => i.checked_abs().map(Value::Int).ok_or(EvalError::Overflow),
            None => Err(EvalError::BadOperand {
                op: "abs()",
                operand: other.type_name(),
            }),
        },
    }
}

/// Converts an integral float, failing instead of saturating outside `i64`.
fn float_to_int(f: f64) -> Result<i64, EvalError> {
    if (i64::MIN as f64..i64::MAX as f64).contains(&f) {
        Ok(f as i64)
    } else {
        Err(EvalError::Overflow)
    }
}

fn round(_ev: &mut Evaluator<'_>, args: &[Value]) -> Result<Value, EvalError> {
    match one_arg("round", args)? {
        Value::Float(f) if f.is_finite() => float_to_int(f.round_ties_even()).map(Value::Int),
        Value::Float(_) => Err(EvalError::InvalidValue(
            "cannot convert float infinity or nan to integer".to_string(),
        )),
        other => other.as_int().map(Value::Int).ok_or_else(|| {
            EvalError::InvalidValue(format!(
                "type {} doesn't define __round__ method",
                other.type_name()
            ))
        }),
    }
}

fn extreme(
    name: &'static str,
    args: &[Value],
    keep_new: fn(&Value, &Value) -> Option<bool>,
) -> Result<Value, EvalError> {
    let (first, rest) = args.split_first().ok_or(EvalError::Arity {
        name,
        expected: "at least one argument",
        given: 0,
    })?;
    let mut best = first;
    for candidate in rest {
        match keep_new(candidate, best) {
            Some(true) => best = candidate,
            Some(false) => {}
            None => {
                return Err(EvalError::InvalidValue(format!(
                    "'{}' not supported between instances of '{}' and '{}'",
                    if name == "min" { "<" } else { ">" },
                    candidate.type_name(),
                    best.type_name()
                )));
            }
        }
    }
    Ok(best.clone())
}

fn ordering(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        _ => a.as_float()?.partial_cmp(&b.as_float()?),
    }
}

fn min(_ev: &mut Evaluator<'_>, args: &[Value]) -> Result<Value, EvalError> {
    extreme("min", args, |new, best| ordering(new, best).map(|o| o.is_lt()))
}

fn max(_ev: &mut Evaluator<'_>, args: &[Value]) -> Result<Value, EvalError> {
    extreme("max", args, |new, best| ordering(new, best).map(|o| o.is_gt()))
}

fn type_of(_ev: &mut Evaluator<'_>, args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Str(one_arg("type", args)?.type_name().to_string()))
}

fn exit(ev: &mut Evaluator<'_>, _args: &[Value]) -> Result<Value, EvalError> {
    ev.session.should_exit = true;
    Ok(Value::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;

    fn call(name: &str, args: &[Value]) -> (Result<Value, EvalError>, String, Session) {
        let mut session = Session::new();
        let mut out = Vec::new();
        let res = {
            let mut ev = Evaluator::new(&mut session, &mut out);
            (lookup(name).unwrap().call)(&mut ev, args)
        };
        (res, String::from_utf8(out).unwrap(), session)
    }

    fn s(text: &str) -> Value {
        Value::Str(text.to_string())
    }

    #[test]
    fn test_print_joins_with_spaces() {
        let (res, out, _) = call("print", &[s("a"), Value::Int(1), Value::Float(0.5), Value::None]);
        assert_eq!(res.unwrap(), Value::None);
        assert_eq!(out, "a 1 0.5 None\n");

        let (_, out, _) = call("print", &[]);
        assert_eq!(out, "\n");
    }

    #[test]
    fn test_conversions() {
        assert_eq!(call("int", &[s(" 42 ")]).0.unwrap(), Value::Int(42));
        assert_eq!(call("int", &[Value::Float(-2.7)]).0.unwrap(), Value::Int(-2));
        assert_eq!(call("float", &[Value::Int(3)]).0.unwrap(), Value::Float(3.0));
        assert_eq!(call("str", &[Value::Bool(false)]).0.unwrap(), s("False"));
        assert_eq!(call("bool", &[s("")]).0.unwrap(), Value::Bool(false));
        assert_eq!(call("round", &[Value::Float(2.5)]).0.unwrap(), Value::Int(2));
        assert_eq!(call("len", &[s("olá")]).0.unwrap(), Value::Int(3));
        assert_eq!(call("type", &[Value::None]).0.unwrap(), s("NoneType"));
        assert_eq!(call("abs", &[Value::Int(-5)]).0.unwrap(), Value::Int(5));
    }

    #[test]
    fn test_min_max() {
        let args = [Value::Int(3), Value::Float(1.5), Value::Int(7)];
        assert_eq!(call("min", &args).0.unwrap(), Value::Float(1.5));
        assert_eq!(call("max", &args).0.unwrap(), Value::Int(7));
        assert_eq!(
            call("max", &[]).0.unwrap_err().to_string(),
            "max() takes at least one argument (0 given)"
        );
        assert!(call("min", &[Value::Int(1), s("a")]).0.is_err());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            call("int", &[s("abc")]).0.unwrap_err().to_string(),
            "invalid literal for int() with base 10: 'abc'"
        );
        assert_eq!(
            call("len", &[s("a"), s("b")]).0.unwrap_err().to_string(),
            "len() takes exactly one argument (2 given)"
        );
        assert_eq!(
            call("len", &[Value::Int(1)]).0.unwrap_err().to_string(),
            "object of type 'int' has no len()"
        );
    }

    #[test]
    fn test_float_to_int_out_of_range() {
        for name in ["round", "int"] {
            for f in [1e300, -1e300, 9.3e18, -9.3e18] {
                let res = call(name, &[Value::Float(f)]).0;
                assert!(matches!(res, Err(EvalError::Overflow)), "{name}({f}) gave {res:?}");
            }
        }
        assert_eq!(
            call("round", &[Value::Float(-9.2e18)]).0.unwrap(),
            Value::Int(-9_200_000_000_000_000_000)
        );
        assert_eq!(call("round", &[Value::Float(-3.5)]).0.unwrap(), Value::Int(-4));
    }

    #[test]
    fn test_exit_raises_flag() {
        let (res, _, session) = call("exit", &[]);
        assert!(res.is_ok());
        assert!(session.should_exit);
        assert!(lookup("quit").is_some());
        assert!(lookup("exec").is_none());
    }
}
