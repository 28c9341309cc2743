//! Translation and evaluation of combinational Verilog.
//!
//! Source text goes through [`strip::strip_comments`], [`parse::CstBuilder`],
//! [`translate::translate`], and [`depends::sort`] to become a [`Module`], whose wires
//! are then computed by [`eval::evaluate_module`].

use log::*;

pub mod loc;
pub mod diagnostic;
pub mod strip;
pub mod cst;
pub mod parse;
pub mod ir;
pub mod value;
pub mod literal;
pub mod lower;
pub mod translate;
pub mod depends;
pub mod eval;
mod error;

#[cfg(test)]
mod tests;

pub use diagnostic::{Diagnostic, Diagnostics, Severity};
pub use error::{CombsimError, EvalError, LiteralError, ParseError, SortError, TranslateError};
pub use eval::{Env, carry_inputs, evaluate_module};
pub use ir::{Expr, Input, Module, Wire};
pub use loc::{HasLoc, Loc, SourceInfo};
pub use parse::CstBuilder;
pub use value::{Radix, Value};

/// Loads a module from the file at `path`. See [`load_module_from_string`].
pub fn load_module_from_file<P: AsRef<std::path::Path>>(
    builder: &CstBuilder,
    path: P,
    top: Option<&str>,
    diagnostics: &mut Diagnostics,
) -> Result<Module, CombsimError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let source_info = SourceInfo::from_file(path.as_ref(), &strip::strip_comments(&text));
    load_module(builder, &source_info, top, diagnostics)
}

/// Parses, translates, and sorts the module named `top` (or the first module) in `text`.
pub fn load_module_from_string(
    builder: &CstBuilder,
    text: &str,
    top: Option<&str>,
    diagnostics: &mut Diagnostics,
) -> Result<Module, CombsimError> {
    let source_info = SourceInfo::from_string(&strip::strip_comments(text));
    load_module(builder, &source_info, top, diagnostics)
}

fn load_module(
    builder: &CstBuilder,
    source_info: &SourceInfo,
    top: Option<&str>,
    diagnostics: &mut Diagnostics,
) -> Result<Module, CombsimError> {
    let root = builder.parse(source_info)?;
    let module = translate::translate(&root, top, diagnostics)?;
    let module = depends::sort(&module)?;
    debug!("Evaluation order: {:?}", module.wires.iter().map(|wire| wire.name.as_str()).collect::<Vec<_>>());
    Ok(module)
}

/// Evaluates a sorted module. See [`eval::evaluate_module`].
pub fn simulate(module: &Module, inputs: &Env, diagnostics: &mut Diagnostics) -> Result<Env, CombsimError> {
    Ok(evaluate_module(module, inputs, diagnostics)?)
}
