use std::fmt::Display;

use lalrpop_util::{ErrorRecovery, ParseError as LalrpopError};
use lalrpop_util::lalrpop_mod;
use log::*;

use crate::cst::{CstNode, SyntaxNode, kind};
use crate::error::ParseError;
use crate::loc::{Loc, SourceInfo};

lalrpop_mod!(grammar);

/// Builds a [`CstNode`] tree from source text.
///
/// Construct one and reuse it for every load.
pub struct CstBuilder {
    source_file: grammar::SourceFileParser,
    expr: grammar::ExprParser,
}

impl Default for CstBuilder {
    fn default() -> CstBuilder {
        CstBuilder::new()
    }
}

impl CstBuilder {
    pub fn new() -> CstBuilder {
        CstBuilder {
            source_file: grammar::SourceFileParser::new(),
            expr: grammar::ExprParser::new(),
        }
    }

    /// Parses the contents of `source_info` as a source file.
    ///
    /// Module items that fail to parse are kept in the tree as `ERROR` nodes.
    /// An error is only returned when the parser cannot recover at all.
    pub fn parse(&self, source_info: &SourceInfo) -> Result<CstNode, ParseError> {
        let mut errors = vec![];
        let result = self.source_file.parse(source_info, &mut errors, source_info.contents());
        for error in &errors {
            debug!("Recovered from syntax error: {}", error.error);
        }
        result.map_err(|error| parse_error(source_info, error))
    }

    /// Parses the contents of `source_info` as a single expression.
    pub fn parse_expr(&self, source_info: &SourceInfo) -> Result<CstNode, ParseError> {
        let mut errors = vec![];
        let node = self.expr
            .parse(source_info, &mut errors, source_info.contents())
            .map_err(|error| parse_error(source_info, error))?;

        match errors.first() {
            Some(recovery) => Err(parse_error(source_info, recovery.error.clone())),
            None => Ok(node),
        }
    }
}

fn parse_error<T: Display, E: Display>(source_info: &SourceInfo, error: LalrpopError<usize, T, E>) -> ParseError {
    match error {
        LalrpopError::UnrecognizedToken { token, expected } => {
            let loc = Loc::from(source_info, token.0, token.2);
            let message = format!("Expected one of {}", expected.join(" "));
            ParseError { loc, message }
        },
        LalrpopError::UnrecognizedEof { location, expected } => {
            let loc = Loc::from(source_info, location, location);
            let message = format!("Unexpected end of file. Expected one of {}", expected.join(" "));
            ParseError { loc, message }
        },
        LalrpopError::InvalidToken { location } => {
            let loc = Loc::from(source_info, location, location);
            ParseError { loc, message: "Invalid token".to_string() }
        },
        LalrpopError::ExtraToken { token } => {
            let loc = Loc::from(source_info, token.0, token.2);
            let message = format!("Unexpected token {}", token.1);
            ParseError { loc, message }
        },
        LalrpopError::User { error } => {
            ParseError { loc: Loc::unknown(), message: error.to_string() }
        },
    }
}

/// The `ERROR` node standing in for a module item the parser skipped over.
pub(crate) fn error_node<T, E>(source_info: &SourceInfo, recovery: &ErrorRecovery<usize, T, E>) -> CstNode {
    let (mut start, mut end) = match &recovery.error {
        LalrpopError::InvalidToken { location } => (*location, *location),
        LalrpopError::UnrecognizedEof { location, .. } => (*location, *location),
        LalrpopError::UnrecognizedToken { token, .. } => (token.0, token.2),
        LalrpopError::ExtraToken { token } => (token.0, token.2),
        LalrpopError::User { .. } => (0, 0),
    };
    for (l, _, r) in &recovery.dropped_tokens {
        start = start.min(*l);
        end = end.max(*r);
    }
    CstNode::token(kind::ERROR, source_info, start, end)
}

/// Groups the items of a module header's port list.
///
/// In an ANSI list (`input [3:0] a, b, output y`) a bare name belongs to the
/// declaration before it. Names that come before any declaration form a
/// non-ANSI `list_of_ports`.
pub(crate) fn group_ports(items: Vec<CstNode>) -> Vec<CstNode> {
    let mut bare_names = vec![];
    let mut declarations: Vec<CstNode> = vec![];

    for item in items {
        if item.kind() == kind::PORT_DECLARATION {
            declarations.push(item);
        } else if let Some(last) = declarations.pop() {
            declarations.push(last.extended(vec![item]));
        } else {
            bare_names.push(item);
        }
    }

    let mut result = vec![];
    if !bare_names.is_empty() {
        result.push(CstNode::spanning(kind::LIST_OF_PORTS, bare_names));
    }
    result.extend(declarations);
    result
}
