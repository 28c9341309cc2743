use std::collections::BTreeSet;

use crate::error::EvalError;
use crate::loc::{HasLoc, Loc};

pub type Name = String;

/// A translated module: its ports and the wires that define every signal.
///
/// After [`crate::depends::sort`] the order of `wires` is the evaluation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: Name,
    pub inputs: Vec<Input>,
    pub wires: Vec<Wire>,
    pub outputs: Vec<Name>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub name: Name,
    pub width: u64,
}

/// A named combinational signal and its definition.
#[derive(Debug, Clone)]
pub struct Wire {
    pub name: Name,
    pub width: u64,
    pub value: Expr,
    /// The names `value` reads, other than primary inputs.
    pub deps: BTreeSet<Name>,
    pub loc: Option<Loc>,
}

impl PartialEq for Wire {
    fn eq(&self, other: &Wire) -> bool {
        self.name == other.name &&
            self.width == other.width &&
            self.value == other.value &&
            self.deps == other.deps
    }
}

impl Eq for Wire {}

impl HasLoc for Wire {
    fn loc(&self) -> Option<Loc> {
        self.loc.clone()
    }
}

impl Wire {
    pub fn new(name: &str, width: u64, value: Expr) -> Wire {
        let deps = value.free_vars();
        Wire {
            name: name.to_string(),
            width,
            value,
            deps,
            loc: None,
        }
    }
}

impl Module {
    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.iter().find(|input| input.name == name)
    }

    pub fn wire(&self, name: &str) -> Option<&Wire> {
        self.wires.iter().find(|wire| wire.name == name)
    }

    pub fn is_input(&self, name: &str) -> bool {
        self.input(name).is_some()
    }

    pub fn is_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|output| output == name)
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A literal, kept as written. Eg, `8'hFF` or `42`.
    Constant(String),
    /// A reference to an input or a wire.
    Register(Name),
    /// A binary operation. Eg, `a + b`.
    BinOp(String, Box<Expr>, Box<Expr>),
    /// A unary operation. Eg, `~a`.
    UnOp(String, Box<Expr>),
    /// A conditional expression. Eg, `s ? a : b`.
    Cond(Box<Expr>, Box<Expr>, Box<Expr>),
    /// A concatenation, most significant first. Eg, `{a, b}`.
    Concat(Vec<Expr>),
    /// A replication. Eg, `{4{a}}` is `Repeat(a, 4)`.
    Repeat(Box<Expr>, Box<Expr>),
    /// A static bit range, from `start` through `end`.
    Slice(Box<Expr>, u64, u64),
    /// A bit range of fixed width at a dynamic offset. Eg, `a[i +: 4]`.
    SliceDyn(Box<Expr>, Box<Expr>, u64),
    /// A single bit at a dynamic index. Eg, `a[i]`.
    Select(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Walk the expression tree in-order, calling `callback` for each subexpression.
    pub fn with_subexprs(&self, callback: &mut dyn FnMut(&Expr)) {
        callback(self);
        match self {
            Expr::Constant(_text) => (),
            Expr::Register(_name) => (),
            Expr::BinOp(_op, e1, e2) => {
                e1.with_subexprs(callback);
                e2.with_subexprs(callback);
            },
            Expr::UnOp(_op, e) => e.with_subexprs(callback),
            Expr::Cond(cond, e1, e2) => {
                cond.with_subexprs(callback);
                e1.with_subexprs(callback);
                e2.with_subexprs(callback);
            },
            Expr::Concat(es) => {
                for e in es {
                    e.with_subexprs(callback);
                }
            },
            Expr::Repeat(e, count) => {
                e.with_subexprs(callback);
                count.with_subexprs(callback);
            },
            Expr::Slice(e, _start, _end) => e.with_subexprs(callback),
            Expr::SliceDyn(e, start, _width) => {
                e.with_subexprs(callback);
                start.with_subexprs(callback);
            },
            Expr::Select(e, index) => {
                e.with_subexprs(callback);
                index.with_subexprs(callback);
            },
        }
    }

    /// Every signal name this expression reads.
    pub fn free_vars(&self) -> BTreeSet<Name> {
        let mut result = BTreeSet::new();
        self.with_subexprs(&mut |e| {
            if let Expr::Register(name) = e {
                result.insert(name.clone());
            }
        });
        result
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Constant(text) => write!(f, "{text}"),
            Expr::Register(name) => write!(f, "{name}"),
            Expr::BinOp(op, e1, e2) => write!(f, "({e1} {op} {e2})"),
            Expr::UnOp(op, e) => write!(f, "{op}{e}"),
            Expr::Cond(cond, e1, e2) => write!(f, "({cond} ? {e1} : {e2})"),
            Expr::Concat(es) => {
                let es: Vec<String> = es.iter().map(|e| e.to_string()).collect();
                write!(f, "{{{}}}", es.join(", "))
            },
            Expr::Repeat(e, count) => write!(f, "{{{count}{{{e}}}}}"),
            Expr::Slice(e, start, end) => write!(f, "{e}[{end}:{start}]"),
            Expr::SliceDyn(e, start, width) => write!(f, "{e}[{start} +: {width}]"),
            Expr::Select(e, index) => write!(f, "{e}[{index}]"),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AShr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Neq,
    LogAnd,
    LogOr,
}

impl std::str::FromStr for BinOp {
    type Err = EvalError;

    fn from_str(op: &str) -> Result<BinOp, EvalError> {
        Ok(match op {
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mul,
            "/" => BinOp::Div,
            "%" => BinOp::Rem,
            "&" => BinOp::And,
            "|" => BinOp::Or,
            "^" => BinOp::Xor,
            "<<" => BinOp::Shl,
            ">>" => BinOp::Shr,
            ">>>" => BinOp::AShr,
            "<" => BinOp::Lt,
            ">" => BinOp::Gt,
            "<=" => BinOp::Le,
            ">=" => BinOp::Ge,
            "==" => BinOp::Eq,
            "!=" => BinOp::Neq,
            "&&" => BinOp::LogAnd,
            "||" => BinOp::LogOr,
            _ => return Err(EvalError::UnknownOperator(op.to_string())),
        })
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum UnOp {
    Plus,
    Neg,
    Not,
    LogNot,
    AndReduce,
    OrReduce,
    XorReduce,
    NandReduce,
    NorReduce,
    XnorReduce,
}

impl std::str::FromStr for UnOp {
    type Err = EvalError;

    fn from_str(op: &str) -> Result<UnOp, EvalError> {
        Ok(match op {
            "+" => UnOp::Plus,
            "-" => UnOp::Neg,
            "~" => UnOp::Not,
            "!" => UnOp::LogNot,
            "&" => UnOp::AndReduce,
            "|" => UnOp::OrReduce,
            "^" => UnOp::XorReduce,
            "~&" => UnOp::NandReduce,
            "~|" => UnOp::NorReduce,
            "~^" | "^~" => UnOp::XnorReduce,
            _ => return Err(EvalError::UnknownOperator(op.to_string())),
        })
    }
}
