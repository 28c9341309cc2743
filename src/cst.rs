//! The concrete syntax tree consumed by [`crate::translate`].
//!
//! The translator only relies on the [`SyntaxNode`] capability: a type tag, the text the
//! node covers, its children, and a query for descendants of a given tag. [`CstNode`]
//! is the tree produced by [`crate::parse::CstBuilder`], and it doubles as the fixture
//! type for tests that build trees by hand.

use crate::loc::{Loc, SourceInfo};

/// Type tags understood by the translator.
pub mod kind {
    pub const SOURCE_FILE: &str = "source_file";
    pub const MODULE_DECLARATION: &str = "module_declaration";
    pub const LIST_OF_PORTS: &str = "list_of_ports";
    pub const PORT_DECLARATION: &str = "port_declaration";
    pub const PORT_DIRECTION: &str = "port_direction";
    pub const NET_TYPE: &str = "net_type";
    pub const PACKED_DIMENSION: &str = "packed_dimension";
    pub const NET_DECLARATION: &str = "net_declaration";
    pub const NET_DECL_ASSIGNMENT: &str = "net_decl_assignment";
    pub const CONTINUOUS_ASSIGN: &str = "continuous_assign";
    pub const NET_ASSIGNMENT: &str = "net_assignment";

    pub const SIMPLE_IDENTIFIER: &str = "simple_identifier";
    pub const NUMBER: &str = "number";
    pub const PARENTHESIZED_EXPRESSION: &str = "parenthesized_expression";
    pub const CONDITIONAL_EXPRESSION: &str = "conditional_expression";
    pub const UNARY_EXPRESSION: &str = "unary_expression";
    pub const UNARY_OPERATOR: &str = "unary_operator";
    pub const BINARY_EXPRESSION: &str = "binary_expression";
    pub const BINARY_OPERATOR: &str = "binary_operator";
    pub const CONCATENATION: &str = "concatenation";
    pub const MULTIPLE_CONCATENATION: &str = "multiple_concatenation";
    pub const BIT_SELECT: &str = "bit_select";
    pub const RANGE_SELECT: &str = "range_select";
    pub const INDEXED_RANGE_SELECT: &str = "indexed_range_select";
    pub const INDEXED_RANGE_OPERATOR: &str = "indexed_range_operator";

    /// Marks input the parser could not make sense of.
    pub const ERROR: &str = "ERROR";
}

/// A node of a concrete syntax tree, independent of the engine that produced it.
pub trait SyntaxNode: Sized {
    fn kind(&self) -> &str;

    /// The source text this node covers.
    fn text(&self) -> &str;

    fn loc(&self) -> Option<Loc>;

    fn children(&self) -> Vec<&Self>;

    /// All descendants (not including `self`) tagged `kind`, in document order.
    fn descendants_of_kind(&self, kind: &str) -> Vec<&Self> {
        let mut results = vec![];
        for child in self.children() {
            if child.kind() == kind {
                results.push(child);
            }
            results.extend(child.descendants_of_kind(kind));
        }
        results
    }

    fn child_of_kind(&self, kind: &str) -> Option<&Self> {
        self.children().into_iter().find(|child| child.kind() == kind)
    }

    fn children_of_kind(&self, kind: &str) -> Vec<&Self> {
        self.children().into_iter().filter(|child| child.kind() == kind).collect()
    }
}

#[derive(Clone, Debug)]
pub struct CstNode {
    kind: &'static str,
    loc: Loc,
    children: Vec<CstNode>,
}

impl CstNode {
    pub fn new(kind: &'static str, loc: Loc, children: Vec<CstNode>) -> CstNode {
        CstNode { kind, loc, children }
    }

    pub fn from_span(kind: &'static str, source_info: &SourceInfo, start: usize, end: usize, children: Vec<CstNode>) -> CstNode {
        CstNode::new(kind, Loc::from(source_info, start, end), children)
    }

    pub fn token(kind: &'static str, source_info: &SourceInfo, start: usize, end: usize) -> CstNode {
        CstNode::from_span(kind, source_info, start, end, vec![])
    }

    /// A node whose span runs from the start of its first child to the end of its last.
    pub fn spanning(kind: &'static str, children: Vec<CstNode>) -> CstNode {
        let loc = match (children.first(), children.last()) {
            (Some(first), Some(last)) => first.loc.to(&last.loc),
            _ => Loc::unknown(),
        };
        CstNode::new(kind, loc, children)
    }

    /// A leaf whose text is exactly `text`. Used to build fixture trees.
    pub fn leaf(kind: &'static str, text: &str) -> CstNode {
        let source_info = SourceInfo::from_string(text);
        CstNode::token(kind, &source_info, 0, text.len())
    }

    /// An interior node with no source text of its own. Used to build fixture trees.
    pub fn branch(kind: &'static str, children: Vec<CstNode>) -> CstNode {
        CstNode::new(kind, Loc::unknown(), children)
    }

    pub(crate) fn span(&self) -> std::ops::Range<usize> {
        self.loc.byte_range()
    }

    /// Appends `more` to the children, growing the span to cover them.
    pub(crate) fn extended(mut self, more: Vec<CstNode>) -> CstNode {
        for child in more {
            self.loc = self.loc.to(&child.loc);
            self.children.push(child);
        }
        self
    }
}

impl SyntaxNode for CstNode {
    fn kind(&self) -> &str {
        self.kind
    }

    fn text(&self) -> &str {
        self.loc.text()
    }

    fn loc(&self) -> Option<Loc> {
        if self.loc.is_unknown() {
            None
        } else {
            Some(self.loc.clone())
        }
    }

    fn children(&self) -> Vec<&CstNode> {
        self.children.iter().collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn descendants_in_document_order() {
        let tree = CstNode::branch(kind::SOURCE_FILE, vec![
            CstNode::branch(kind::MODULE_DECLARATION, vec![
                CstNode::leaf(kind::SIMPLE_IDENTIFIER, "top"),
                CstNode::branch(kind::NET_DECLARATION, vec![
                    CstNode::leaf(kind::NET_TYPE, "wire"),
                    CstNode::leaf(kind::SIMPLE_IDENTIFIER, "a"),
                ]),
                CstNode::leaf(kind::SIMPLE_IDENTIFIER, "b"),
            ]),
        ]);
        let names: Vec<&str> = tree
            .descendants_of_kind(kind::SIMPLE_IDENTIFIER)
            .into_iter()
            .map(|node| node.text())
            .collect();
        assert_eq!(names, vec!["top", "a", "b"]);
        assert_eq!(tree.descendants_of_kind(kind::SOURCE_FILE).len(), 0);

        let module = tree.child_of_kind(kind::MODULE_DECLARATION).unwrap();
        assert_eq!(module.children_of_kind(kind::SIMPLE_IDENTIFIER).len(), 2);
        assert_eq!(module.text(), "");
        assert!(module.loc().is_none());
    }

    #[test]
    fn spanning_covers_children() {
        let source_info = SourceInfo::from_string("a + b");
        let node = CstNode::spanning(kind::BINARY_EXPRESSION, vec![
            CstNode::token(kind::SIMPLE_IDENTIFIER, &source_info, 0, 1),
            CstNode::token(kind::BINARY_OPERATOR, &source_info, 2, 3),
            CstNode::token(kind::SIMPLE_IDENTIFIER, &source_info, 4, 5),
        ]);
        assert_eq!(node.text(), "a + b");
        assert_eq!(node.children()[1].text(), "+");
    }
}
