use std::collections::BTreeMap;

use log::*;
use num_bigint::BigUint;
use num_traits::One;

use crate::diagnostic::Diagnostics;
use crate::error::EvalError;
use crate::ir::{BinOp, Expr, Module, Name, UnOp};
use crate::literal::parse_literal;
use crate::loc::HasLoc;
use crate::value::{Value, mask};

/// Signal values by name.
pub type Env = BTreeMap<Name, Value>;

impl Expr {
    /// Computes the value of this expression, reading signals from `env`.
    ///
    /// Only the taken branch of a conditional is evaluated.
    pub fn eval(&self, env: &Env, diagnostics: &mut Diagnostics) -> Result<Value, EvalError> {
        Ok(match self {
            Expr::Constant(text) => parse_literal(text)?,
            Expr::Register(name) => env.get(name).cloned().ok_or_else(|| EvalError::UnboundSignal(name.clone()))?,
            Expr::BinOp(op, e1, e2) => {
                let op: BinOp = op.parse()?;
                let a = e1.eval(env, diagnostics)?;
                let b = e2.eval(env, diagnostics)?;
                eval_binop(op, &a, &b, diagnostics)
            },
            Expr::UnOp(op, e) => {
                let op: UnOp = op.parse()?;
                let a = e.eval(env, diagnostics)?;
                eval_unop(op, &a)
            },
            Expr::Cond(cond, e1, e2) => {
                if cond.eval(env, diagnostics)?.is_zero() {
                    e2.eval(env, diagnostics)?
                } else {
                    e1.eval(env, diagnostics)?
                }
            },
            Expr::Concat(es) => {
                let mut result = Value::zero(0);
                for e in es {
                    result = result.concat(&e.eval(env, diagnostics)?);
                }
                result
            },
            Expr::Repeat(e, count) => {
                let count_value = count.eval(env, diagnostics)?;
                let n = match count_value.to_u64() {
                    Some(n) if n > 0 => n,
                    _ => return Err(EvalError::BadRepeatCount(count_value.value().to_string())),
                };
                repeat(&e.eval(env, diagnostics)?, n)
            },
            Expr::Slice(e, start, end) => {
                let v = e.eval(env, diagnostics)?;
                let base = *start.min(end);
                let width = start.abs_diff(*end).saturating_add(1);
                if base.saturating_add(width) > v.width() {
                    diagnostics.warn(None, format!("Slice {self} is out of range for a value of width {}", v.width()));
                }
                v.extract(*start, width)
            },
            Expr::SliceDyn(e, start, width) => {
                let v = e.eval(env, diagnostics)?;
                let start = start.eval(env, diagnostics)?;
                match start.to_u64() {
                    Some(start) if start.saturating_add(*width) <= v.width() => v.extract(start, *width),
                    Some(start) => {
                        diagnostics.warn(None, format!("Slice {self} at {start} is out of range for a value of width {}", v.width()));
                        v.extract(start, *width)
                    },
                    None => {
                        diagnostics.warn(None, format!("Slice {self} at {start} is out of range for a value of width {}", v.width()));
                        Value::zero(*width)
                    },
                }
            },
            Expr::Select(e, index) => {
                let v = e.eval(env, diagnostics)?;
                let index = index.eval(env, diagnostics)?;
                match index.to_u64() {
                    Some(i) if i < v.width() => v.bit(i).into(),
                    _ => {
                        diagnostics.warn(None, format!("Index {self} at {index} is out of range for a value of width {}", v.width()));
                        index.to_u64().map(|i| v.bit(i)).unwrap_or(false).into()
                    },
                }
            },
        })
    }
}

fn shift_amount(b: &Value) -> u64 {
    b.to_u64().unwrap_or(u64::MAX)
}

/// `n` copies of `v` side by side, built by doubling.
fn repeat(v: &Value, n: u64) -> Value {
    let mut result = Value::zero(0);
    let mut copies = v.clone();
    let mut n = n;
    while n > 0 {
        if n & 1 == 1 {
            result = result.concat(&copies);
        }
        n >>= 1;
        if n > 0 {
            copies = copies.concat(&copies);
        }
    }
    result
}

fn eval_binop(op: BinOp, a: &Value, b: &Value, diagnostics: &mut Diagnostics) -> Value {
    let w = a.width();
    let x = a.value();
    let y = b.value();
    match op {
        BinOp::Add => Value::new(w, x + y),
        BinOp::Sub => {
            let y = mask(y.clone(), w);
            Value::new(w, (BigUint::one() << w) + x - y)
        },
        BinOp::Mul => Value::new(w, x * y),
        BinOp::Div | BinOp::Rem if b.is_zero() => {
            diagnostics.warn(None, format!("Division by zero: {a} {} {b}", if op == BinOp::Div { "/" } else { "%" }));
            Value::zero(w)
        },
        BinOp::Div => Value::new(w, x / y),
        BinOp::Rem => Value::new(w, x % y),
        BinOp::And => Value::new(w, x & y),
        BinOp::Or => Value::new(w, x | y),
        BinOp::Xor => Value::new(w, x ^ y),
        BinOp::Shl => match shift_amount(b) {
            s if s >= w => Value::zero(w),
            s => Value::new(w, x << s),
        },
        BinOp::Shr => match shift_amount(b) {
            s if s >= w => Value::zero(w),
            s => Value::new(w, x >> s),
        },
        BinOp::AShr => {
            let s = shift_amount(b).min(w);
            let shifted = if s >= w { BigUint::from(0u32) } else { x >> s };
            if a.sign_bit() {
                let fill = ((BigUint::one() << s) - BigUint::one()) << (w - s);
                Value::new(w, shifted | fill)
            } else {
                Value::new(w, shifted)
            }
        },
        BinOp::Lt => (x < y).into(),
        BinOp::Gt => (x > y).into(),
        BinOp::Le => (x <= y).into(),
        BinOp::Ge => (x >= y).into(),
        BinOp::Eq => (x == y).into(),
        BinOp::Neq => (x != y).into(),
        BinOp::LogAnd => (!a.is_zero() && !b.is_zero()).into(),
        BinOp::LogOr => (!a.is_zero() || !b.is_zero()).into(),
    }
}

fn eval_unop(op: UnOp, a: &Value) -> Value {
    let w = a.width();
    let ones = (BigUint::one() << w) - BigUint::one();
    match op {
        UnOp::Plus => a.clone(),
        UnOp::Neg => Value::new(w, (BigUint::one() << w) - a.value()),
        UnOp::Not => Value::new(w, &ones ^ a.value()),
        UnOp::LogNot => a.is_zero().into(),
        UnOp::AndReduce => (a.value() == &ones).into(),
        UnOp::OrReduce => (!a.is_zero()).into(),
        UnOp::XorReduce => (a.value().count_ones() % 2 == 1).into(),
        UnOp::NandReduce => (a.value() != &ones).into(),
        UnOp::NorReduce => a.is_zero().into(),
        UnOp::XnorReduce => (a.value().count_ones() % 2 == 0).into(),
    }
}

/// Evaluates every wire of a sorted module.
///
/// Inputs missing from `inputs` are zero. The result holds the inputs and every wire.
pub fn evaluate_module(module: &Module, inputs: &Env, diagnostics: &mut Diagnostics) -> Result<Env, EvalError> {
    let mut env = Env::new();

    for input in &module.inputs {
        let value = match inputs.get(&input.name) {
            Some(value) if value.width() == input.width => value.clone(),
            Some(value) => {
                let message = format!(
                    "Input {} is {value}, but it is declared with width {}; resizing",
                    input.name,
                    input.width,
                );
                diagnostics.warn(None, message);
                value.resize(input.width)
            },
            None => {
                debug!("Input {} not supplied; using zero", input.name);
                Value::zero(input.width)
            },
        };
        env.insert(input.name.clone(), value);
    }

    for name in inputs.keys() {
        if !module.is_input(name) {
            diagnostics.warn(None, format!("No such input: {name}"));
        }
    }

    for wire in &module.wires {
        let value = wire.value.eval(&env, diagnostics)?;
        let value = if value.width() != wire.width {
            let message = format!(
                "Wire {} is declared with width {} but its value {value} has width {}; resizing",
                wire.name,
                wire.width,
                value.width(),
            );
            diagnostics.warn(wire.loc(), message);
            value.resize(wire.width)
        } else {
            value
        };
        trace!("{} = {value}", wire.name);
        env.insert(wire.name.clone(), value);
    }

    Ok(env)
}

/// Rebinds input values from a previous run to the inputs of `module`.
///
/// Values keep their payload and are truncated or zero-extended to the new widths.
/// Inputs with no previous value are zero.
pub fn carry_inputs(previous: &Env, module: &Module) -> Env {
    let mut env = Env::new();
    for input in &module.inputs {
        let value = match previous.get(&input.name) {
            Some(value) => value.resize(input.width),
            None => Value::zero(input.width),
        };
        env.insert(input.name.clone(), value);
    }
    env
}
