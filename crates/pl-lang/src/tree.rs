//! Concrete parse tree.
//!
//! The grammar produces one [`Node`] per production, stored in an arena and
//! addressed by [`NodeId`]. Analysis passes never mutate the tree; they keep
//! their results in tables keyed by node id.

use std::fmt;

// ---------------------------------------------------------------------------
// Identifiers & positions
// ---------------------------------------------------------------------------

/// Stable index of a node inside its [`ParseTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 1-based line/column of the first token of a production.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourcePos {
    pub line: usize,
    pub column: usize,
}

impl SourcePos {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Resolve a byte offset into `src`.
    pub fn from_offset(src: &str, offset: usize) -> Self {
        let offset = offset.min(src.len());
        let before = &src[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() + 1;
        Self { line, column }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}:{}", self.line, self.column)
    }
}

// ---------------------------------------------------------------------------
// Node kinds, one per grammar production
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // declarations
    PipelineList,
    PipelineDecl,
    Stage,
    RuleRef,
    RuleDecl,
    // tokens
    Name,
    StageNumber,
    MatchMode,
    // statements
    FuncStmt,
    LetStmt,
    // expressions
    Or,
    And,
    Not,
    Equality,
    Comparison,
    Parenthesized,
    Integer,
    Float,
    Str,
    Bool,
    ArrayLit,
    MapLit,
    MapEntry,
    MessageRef,
    Subscript,
    FieldAccess,
    Identifier,
    FuncCall,
    NamedArgs,
    NamedArg,
    PositionalArgs,
}

impl NodeKind {
    /// Short production name used in debug traces.
    pub fn label(self) -> &'static str {
        match self {
            NodeKind::PipelineList => "pipelines",
            NodeKind::PipelineDecl => "pipeline",
            NodeKind::Stage => "stage",
            NodeKind::RuleRef => "rule_ref",
            NodeKind::RuleDecl => "rule",
            NodeKind::Name => "name",
            NodeKind::StageNumber => "stage_number",
            NodeKind::MatchMode => "match_mode",
            NodeKind::FuncStmt => "func_stmt",
            NodeKind::LetStmt => "let",
            NodeKind::Or => "or",
            NodeKind::And => "and",
            NodeKind::Not => "not",
            NodeKind::Equality => "eq",
            NodeKind::Comparison => "cmp",
            NodeKind::Parenthesized => "paren",
            NodeKind::Integer => "long",
            NodeKind::Float => "double",
            NodeKind::Str => "string",
            NodeKind::Bool => "bool",
            NodeKind::ArrayLit => "array",
            NodeKind::MapLit => "map",
            NodeKind::MapEntry => "entry",
            NodeKind::MessageRef => "message",
            NodeKind::Subscript => "subscript",
            NodeKind::FieldAccess => "field_access",
            NodeKind::Identifier => "ident",
            NodeKind::FuncCall => "call",
            NodeKind::NamedArgs => "named_args",
            NodeKind::NamedArg => "named_arg",
            NodeKind::PositionalArgs => "positional_args",
        }
    }
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Token text: names, literals, operators, identifiers.
    pub text: Option<String>,
    pub pos: SourcePos,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Arena-backed concrete parse tree. Node 0 is the root.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseTree {
    nodes: Vec<Node>,
}

impl ParseTree {
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id).text.as_deref()
    }

    pub fn pos(&self, id: NodeId) -> SourcePos {
        self.node(id).pos
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Position of `id` among its parent's children.
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    pub fn first_child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.kind(*c) == kind)
    }

    pub fn children_of_kind(&self, id: NodeId, kind: NodeKind) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |c| self.kind(*c) == kind)
    }

    /// Every node, children before parents, siblings left to right.
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        if self.nodes.is_empty() {
            return out;
        }
        // (node, children already pushed)
        let mut stack = vec![(self.root(), false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                out.push(id);
                continue;
            }
            stack.push((id, true));
            for child in self.children(id).iter().rev() {
                stack.push((*child, false));
            }
        }
        out
    }

    /// Flatten a grammar result into the arena, resolving positions
    /// against `src`.
    pub(crate) fn from_syntax(src: &str, root: SyntaxNode) -> Self {
        let mut tree = ParseTree { nodes: Vec::new() };
        tree.push(src, root, None);
        tree
    }

    fn push(&mut self, src: &str, syntax: SyntaxNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let offset = src.len().saturating_sub(syntax.remaining);
        self.nodes.push(Node {
            kind: syntax.kind,
            text: syntax.text,
            pos: SourcePos::from_offset(src, offset),
            parent,
            children: Vec::with_capacity(syntax.children.len()),
        });
        for child in syntax.children {
            let child_id = self.push(src, child, Some(id));
            self.nodes[id.index()].children.push(child_id);
        }
        id
    }
}

// ---------------------------------------------------------------------------
// Grammar output
// ---------------------------------------------------------------------------

/// Owned node produced by the grammar before it is flattened.
///
/// `remaining` is the length of unconsumed input at the start of the
/// production; the start offset is `src.len() - remaining`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SyntaxNode {
    pub kind: NodeKind,
    pub text: Option<String>,
    pub remaining: usize,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn new(kind: NodeKind, remaining: usize) -> Self {
        Self {
            kind,
            text: None,
            remaining,
            children: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: SyntaxNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = SyntaxNode>) -> Self {
        self.children.extend(children);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_from_offset() {
        let src = "rule \"a\"\nwhen true\n  then";
        assert_eq!(SourcePos::from_offset(src, 0), SourcePos::new(1, 1));
        assert_eq!(SourcePos::from_offset(src, 9), SourcePos::new(2, 1));
        assert_eq!(SourcePos::from_offset(src, 21), SourcePos::new(3, 3));
    }

    #[test]
    fn post_order_visits_children_first() {
        let src = "abc";
        let root = SyntaxNode::new(NodeKind::And, 3)
            .with_child(SyntaxNode::new(NodeKind::Bool, 3).with_text("true"))
            .with_child(
                SyntaxNode::new(NodeKind::Not, 1)
                    .with_child(SyntaxNode::new(NodeKind::Bool, 1).with_text("false")),
            );
        let tree = ParseTree::from_syntax(src, root);
        let kinds: Vec<NodeKind> = tree.post_order().into_iter().map(|id| tree.kind(id)).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Bool, NodeKind::Bool, NodeKind::Not, NodeKind::And]
        );
        let not = tree.children(tree.root())[1];
        assert_eq!(tree.child_index(not), Some(1));
        assert_eq!(tree.pos(not), SourcePos::new(1, 3));
    }
}
