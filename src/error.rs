use crate::loc::Loc;
use thiserror::Error;

fn at(loc: &Option<Loc>) -> String {
    match loc {
        Some(loc) => format!(" at {loc}"),
        None => String::new(),
    }
}

/// Unrecoverable failure to build a syntax tree from source text.
#[derive(Error, Debug, Clone)]
#[error("Parse error at {loc}: {message}")]
pub struct ParseError {
    pub loc: Loc,
    pub message: String,
}

/// Fatal conditions of the syntax tree to IR translation. No module is produced.
#[derive(Error, Debug, Clone)]
pub enum TranslateError {
    #[error("Expected a source file at the root of the syntax tree but found `{0}`")]
    NotSourceFile(String),
    #[error("No module declaration found")]
    NoModule,
    #[error("No such module: {0}")]
    NoSuchModule(String),
    #[error("Syntax error{}", at(.0))]
    SyntaxError(Option<Loc>),
}

/// Fatal conditions of the dependency sort.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SortError {
    #[error("Wire is defined more than once: {0}")]
    DuplicateWire(String),
    #[error("Dependency not found: {wire} depends on {dependency}, which is neither a wire nor an input")]
    DependencyNotFound { wire: String, dependency: String },
    #[error("Cycle detected among: {}", .0.join(", "))]
    CycleDetected(Vec<String>),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiteralError {
    #[error("Invalid literal: {0}")]
    Invalid(String),
    #[error("Literal has zero width: {0}")]
    ZeroWidth(String),
    #[error("Invalid digits for base '{base}' in literal: {literal}")]
    BadDigits { literal: String, base: char },
}

/// Fatal conditions of evaluation. The evaluation call is aborted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("No value bound for signal: {0}")]
    UnboundSignal(String),
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),
    #[error("Replication count must be a positive integer, but it was {0}")]
    BadRepeatCount(String),
    #[error(transparent)]
    Literal(#[from] LiteralError),
}

#[derive(Error, Debug)]
pub enum CombsimError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Translate(#[from] TranslateError),
    #[error(transparent)]
    Sort(#[from] SortError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}
