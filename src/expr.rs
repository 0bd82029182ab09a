//! Math expression evaluation
//!
//! Parsing is delegated to [`meval`]. The namespace an expression can see is
//! exactly [`FUNCTIONS`] plus [`CONSTANTS`]; meval's own builtins are never
//! loaded. The parsed RPN is evaluated here so that every step follows float
//! error rules: division by zero, NaN and overflow from finite operands are
//! errors, and no non-finite value is ever returned.

use std::f64::consts::{E, PI, TAU};

use meval::tokenizer::{Operation, Token};
use meval::{Context, ContextProvider, Expr, FuncEvalError};

use crate::error::ExprError;

/// Shape of a permitted function
#[derive(Clone, Copy)]
pub enum MathFn {
    /// One argument
    Unary(fn(f64) -> f64),
    /// Two arguments
    Binary(fn(f64, f64) -> f64),
    /// At least `min_args` arguments
    Variadic {
        /// Implementation over the argument slice
        func: fn(&[f64]) -> f64,
        /// Minimum argument count
        min_args: usize,
    },
}

/// Functions callable from an expression
pub const FUNCTIONS: &[(&str, MathFn)] = &[
    ("sin", MathFn::Unary(f64::sin)),
    ("cos", MathFn::Unary(f64::cos)),
    ("tan", MathFn::Unary(f64::tan)),
    ("asin", MathFn::Unary(f64::asin)),
    ("acos", MathFn::Unary(f64::acos)),
    ("atan", MathFn::Unary(f64::atan)),
    ("atan2", MathFn::Binary(f64::atan2)),
    ("sinh", MathFn::Unary(f64::sinh)),
    ("cosh", MathFn::Unary(f64::cosh)),
    ("tanh", MathFn::Unary(f64::tanh)),
    ("asinh", MathFn::Unary(f64::asinh)),
    ("acosh", MathFn::Unary(f64::acosh)),
    ("atanh", MathFn::Unary(atanh)),
    ("exp", MathFn::Unary(f64::exp)),
    ("expm1", MathFn::Unary(f64::exp_m1)),
    (
        "log",
        MathFn::Variadic {
            func: log,
            min_args: 1,
        },
    ),
    ("log2", MathFn::Unary(log2)),
    ("log10", MathFn::Unary(log10)),
    ("log1p", MathFn::Unary(log1p)),
    ("sqrt", MathFn::Unary(f64::sqrt)),
    ("cbrt", MathFn::Unary(f64::cbrt)),
    ("pow", MathFn::Binary(f64::powf)),
    ("abs", MathFn::Unary(f64::abs)),
    ("fabs", MathFn::Unary(f64::abs)),
    ("ceil", MathFn::Unary(f64::ceil)),
    ("floor", MathFn::Unary(f64::floor)),
    ("trunc", MathFn::Unary(f64::trunc)),
    ("degrees", MathFn::Unary(f64::to_degrees)),
    ("radians", MathFn::Unary(f64::to_radians)),
    (
        "hypot",
        MathFn::Variadic {
            func: hypot,
            min_args: 1,
        },
    ),
    ("fmod", MathFn::Binary(fmod)),
    ("copysign", MathFn::Binary(f64::copysign)),
];

/// Named constants visible to an expression
pub const CONSTANTS: &[(&str, f64)] = &[
    ("pi", PI),
    ("e", E),
    ("tau", TAU),
    ("inf", f64::INFINITY),
];

// Logarithm poles are domain errors, not infinities.
fn ln(x: f64) -> f64 {
    if x == 0.0 {
        f64::NAN
    } else {
        x.ln()
    }
}

/// `log(x)` is the natural log, `log(x, base)` the log in `base`.
fn log(args: &[f64]) -> f64 {
    match args {
        [x] => ln(*x),
        [x, base] => ln(*x) / ln(*base),
        _ => f64::NAN,
    }
}

fn log2(x: f64) -> f64 {
    if x == 0.0 {
        f64::NAN
    } else {
        x.log2()
    }
}

fn log10(x: f64) -> f64 {
    if x == 0.0 {
        f64::NAN
    } else {
        x.log10()
    }
}

fn log1p(x: f64) -> f64 {
    if x == -1.0 {
        f64::NAN
    } else {
        x.ln_1p()
    }
}

fn atanh(x: f64) -> f64 {
    if x.abs() == 1.0 {
        f64::NAN
    } else {
        x.atanh()
    }
}

fn hypot(args: &[f64]) -> f64 {
    let scale = args.iter().map(|x| x.abs()).fold(0.0, f64::max);
    if scale == 0.0 || scale.is_infinite() {
        return scale;
    }
    scale * args.iter().map(|x| (x / scale).powi(2)).sum::<f64>().sqrt()
}

fn fmod(x: f64, y: f64) -> f64 {
    x % y
}

fn context() -> Context<'static> {
    let mut ctx = Context::empty();
    for &(name, value) in CONSTANTS {
        ctx.var(name, value);
    }
    for &(name, func) in FUNCTIONS {
        match func {
            MathFn::Unary(f) => {
                ctx.func(name, f);
            }
            MathFn::Binary(f) => {
                ctx.func2(name, f);
            }
            MathFn::Variadic { func, min_args } => {
                ctx.funcn(name, func, min_args..);
            }
        }
    }
    ctx
}

/// Evaluate a math expression such as `sin(pi/2) + log(10) * sqrt(16) / pow(2, 3)`.
///
/// Python-style `**` is accepted as the power operator.
///
/// # Errors
///
/// Blank input, malformed syntax, names outside the permitted table and
/// wrong argument counts are reported as [`ExprError`], as are division by
/// zero ([`ExprError::DivisionByZero`]), NaN results ([`ExprError::Domain`])
/// and overflow to infinity ([`ExprError::Range`]).
pub fn math_eval(expr: &str) -> Result<f64, ExprError> {
    let source = expr.trim();
    if source.is_empty() {
        return Err(ExprError::Empty);
    }

    let normalized = source.replace("**", "^");
    let parsed: Expr = normalized
        .parse()
        .map_err(|e: meval::Error| ExprError::Parse(e.to_string()))?;

    let value = evaluate(&parsed, &context())?;
    if value.is_nan() {
        return Err(ExprError::Domain);
    }
    if value.is_infinite() {
        return Err(ExprError::Range);
    }
    Ok(value)
}

fn evaluate(expr: &Expr, ctx: &Context<'_>) -> Result<f64, ExprError> {
    let mut stack: Vec<f64> = Vec::with_capacity(16);

    for token in expr.iter() {
        match token {
            Token::Number(x) => stack.push(*x),
            Token::Var(name) => {
                let value = ctx
                    .get_var(name)
                    .ok_or_else(|| ExprError::UnknownIdentifier(name.clone()))?;
                stack.push(value);
            }
            Token::Unary(op) => {
                let x = pop(&mut stack)?;
                stack.push(match op {
                    Operation::Minus => -x,
                    _ => x,
                });
            }
            Token::Binary(op) => {
                let right = pop(&mut stack)?;
                let left = pop(&mut stack)?;
                stack.push(binary(*op, left, right)?);
            }
            Token::Func(name, Some(argc)) => {
                if stack.len() < *argc {
                    return Err(malformed());
                }
                let args = stack.split_off(stack.len() - argc);
                let value = ctx
                    .eval_func(name, &args)
                    .map_err(|e| function_error(name, e))?;
                stack.push(checked(value, &args)?);
            }
            _ => return Err(malformed()),
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(value), true) => Ok(value),
        _ => Err(malformed()),
    }
}

fn binary(op: Operation, left: f64, right: f64) -> Result<f64, ExprError> {
    let value = match op {
        Operation::Plus => left + right,
        Operation::Minus => left - right,
        Operation::Times => left * right,
        Operation::Div | Operation::Rem if right == 0.0 => {
            return Err(ExprError::DivisionByZero)
        }
        Operation::Div => left / right,
        Operation::Rem => floor_mod(left, right),
        Operation::Pow if left == 0.0 && right < 0.0 => return Err(ExprError::DivisionByZero),
        Operation::Pow => left.powf(right),
    };
    checked(value, &[left, right])
}

/// Remainder taking the sign of the divisor, like Python's `%`.
fn floor_mod(left: f64, right: f64) -> f64 {
    let r = left % right;
    if r != 0.0 && (r < 0.0) != (right < 0.0) {
        r + right
    } else {
        r
    }
}

fn checked(value: f64, args: &[f64]) -> Result<f64, ExprError> {
    if value.is_nan() {
        return Err(ExprError::Domain);
    }
    if value.is_infinite() && args.iter().all(|a| a.is_finite()) {
        return Err(ExprError::Range);
    }
    Ok(value)
}

fn pop(stack: &mut Vec<f64>) -> Result<f64, ExprError> {
    stack.pop().ok_or_else(malformed)
}

fn malformed() -> ExprError {
    ExprError::Parse("malformed expression".to_string())
}

fn function_error(name: &str, err: FuncEvalError) -> ExprError {
    match err {
        FuncEvalError::UnknownFunction => ExprError::UnknownIdentifier(name.to_string()),
        e => ExprError::Arity {
            name: name.to_string(),
            detail: e.to_string(),
        },
    }
}
