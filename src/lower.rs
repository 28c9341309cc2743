//! Lowering of syntax-tree expressions into [`Expr`].

use std::collections::BTreeSet;

use crate::cst::{SyntaxNode, kind};
use crate::diagnostic::Diagnostics;
use crate::ir::{Expr, Name};
use crate::literal::parse_literal;

/// Lowers an expression node into an [`Expr`] and the set of names it reads.
///
/// Returns `None` after recording a warning when some part of the expression
/// has no counterpart in [`Expr`].
pub fn lower_expr<N: SyntaxNode>(node: &N, diagnostics: &mut Diagnostics) -> Option<(Expr, BTreeSet<Name>)> {
    let children = node.children();

    let expr = match node.kind() {
        kind::SIMPLE_IDENTIFIER => Expr::Register(node.text().trim().to_string()),
        kind::NUMBER => Expr::Constant(node.text().trim().to_string()),
        kind::PARENTHESIZED_EXPRESSION => {
            let [e] = children.as_slice() else { return malformed(node, diagnostics) };
            return lower_expr(*e, diagnostics);
        },
        kind::CONDITIONAL_EXPRESSION => {
            let [cond, e1, e2] = children.as_slice() else { return malformed(node, diagnostics) };
            let cond = lower_expr(*cond, diagnostics)?.0;
            let e1 = lower_expr(*e1, diagnostics)?.0;
            let e2 = lower_expr(*e2, diagnostics)?.0;
            Expr::Cond(Box::new(cond), Box::new(e1), Box::new(e2))
        },
        kind::UNARY_EXPRESSION => {
            let [op, e] = children.as_slice() else { return malformed(node, diagnostics) };
            let e = lower_expr(*e, diagnostics)?.0;
            Expr::UnOp(op.text().trim().to_string(), Box::new(e))
        },
        kind::BINARY_EXPRESSION => {
            let [e1, op, e2] = children.as_slice() else { return malformed(node, diagnostics) };
            let e1 = lower_expr(*e1, diagnostics)?.0;
            let e2 = lower_expr(*e2, diagnostics)?.0;
            Expr::BinOp(op.text().trim().to_string(), Box::new(e1), Box::new(e2))
        },
        kind::CONCATENATION => {
            if children.is_empty() {
                return malformed(node, diagnostics);
            }
            let mut es = vec![];
            for child in children {
                es.push(lower_expr(child, diagnostics)?.0);
            }
            Expr::Concat(es)
        },
        kind::MULTIPLE_CONCATENATION => {
            let [count, inner] = children.as_slice() else { return malformed(node, diagnostics) };
            let count = lower_expr(*count, diagnostics)?.0;
            let inner = match lower_expr(*inner, diagnostics)?.0 {
                Expr::Concat(mut es) if es.len() == 1 => es.remove(0),
                e => e,
            };
            Expr::Repeat(Box::new(inner), Box::new(count))
        },
        kind::BIT_SELECT => {
            let [e, index] = children.as_slice() else { return malformed(node, diagnostics) };
            let e = lower_expr(*e, diagnostics)?.0;
            let index = lower_expr(*index, diagnostics)?.0;
            Expr::Select(Box::new(e), Box::new(index))
        },
        kind::RANGE_SELECT => {
            let [e, msb, lsb] = children.as_slice() else { return malformed(node, diagnostics) };
            let e = lower_expr(*e, diagnostics)?.0;
            let msb = static_bound(*msb, diagnostics)?;
            let lsb = static_bound(*lsb, diagnostics)?;
            Expr::Slice(Box::new(e), lsb, msb)
        },
        kind::INDEXED_RANGE_SELECT => {
            let [e, base, op, width] = children.as_slice() else { return malformed(node, diagnostics) };
            let e = lower_expr(*e, diagnostics)?.0;
            let base = lower_expr(*base, diagnostics)?.0;
            let width = match static_bound(*width, diagnostics)? {
                0 => {
                    diagnostics.warn(width.loc(), format!("Part-select width must be positive: `{}`", width.text()));
                    return None;
                },
                width => width,
            };
            let base = match op.text().trim() {
                "+:" => base,
                "-:" => Expr::BinOp("-".to_string(), Box::new(base), Box::new(Expr::Constant((width - 1).to_string()))),
                other => {
                    diagnostics.warn(op.loc(), format!("Unsupported part-select operator: `{other}`"));
                    return None;
                },
            };
            Expr::SliceDyn(Box::new(e), Box::new(base), width)
        },
        other => {
            let text = node.text();
            if text.is_empty() {
                diagnostics.warn(node.loc(), format!("Unsupported expression: {other}"));
            } else {
                diagnostics.warn(node.loc(), format!("Unsupported expression: {other} `{text}`"));
            }
            return None;
        },
    };

    let deps = expr.free_vars();
    Some((expr, deps))
}

fn malformed<N: SyntaxNode, T>(node: &N, diagnostics: &mut Diagnostics) -> Option<T> {
    diagnostics.warn(
        node.loc(),
        format!("Malformed {} with {} children", node.kind(), node.children().len()),
    );
    None
}

fn static_bound<N: SyntaxNode>(node: &N, diagnostics: &mut Diagnostics) -> Option<u64> {
    match fold_const(node).map(u64::try_from) {
        Some(Ok(n)) => Some(n),
        _ => {
            diagnostics.warn(node.loc(), format!("Expected a constant non-negative bound: `{}`", node.text()));
            None
        },
    }
}

/// Folds a constant integer expression.
///
/// Only integer literals, parentheses, unary `+`/`-`, and binary `+ - * /` are
/// understood. Anything else, including division by zero and overflow, gives `None`.
pub fn fold_const<N: SyntaxNode>(node: &N) -> Option<i64> {
    let children = node.children();
    match node.kind() {
        kind::NUMBER => {
            let value = parse_literal(node.text()).ok()?;
            i64::try_from(value.to_u64()?).ok()
        },
        kind::PARENTHESIZED_EXPRESSION => {
            let [e] = children.as_slice() else { return None };
            fold_const(*e)
        },
        kind::UNARY_EXPRESSION => {
            let [op, e] = children.as_slice() else { return None };
            let n = fold_const(*e)?;
            match op.text().trim() {
                "+" => Some(n),
                "-" => n.checked_neg(),
                _ => None,
            }
        },
        kind::BINARY_EXPRESSION => {
            let [e1, op, e2] = children.as_slice() else { return None };
            let a = fold_const(*e1)?;
            let b = fold_const(*e2)?;
            match op.text().trim() {
                "+" => a.checked_add(b),
                "-" => a.checked_sub(b),
                "*" => a.checked_mul(b),
                "/" => a.checked_div(b),
                _ => None,
            }
        },
        _ => None,
    }
}
