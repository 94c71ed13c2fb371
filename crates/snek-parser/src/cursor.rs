//! Concrete syntax tree access.
//!
//! The front end that turns source text into a concrete syntax tree lives
//! outside this workspace. It is consumed through [`TreeCursor`], a
//! navigational interface in the style of Lezer's tree cursors. An in-memory
//! implementation, [`SyntaxTree`], is provided for front ends that prefer to
//! materialize the tree (and for tests); [`SyntaxTreeBuilder`] assembles one
//! token by token.

use snek_core::{ParseError, Span};

/// A cursor over a concrete syntax tree.
///
/// Navigation methods return `false` and leave the cursor in place when the
/// requested node does not exist.
pub trait TreeCursor {
    /// Kind name of the current node (`"AssignStatement"`, `"Number"`, `":"`…).
    fn kind(&self) -> &str;

    /// Byte offset where the current node starts.
    fn from(&self) -> usize;

    /// Byte offset where the current node ends.
    fn to(&self) -> usize;

    /// Move to the first child of the current node.
    fn first_child(&mut self) -> bool;

    /// Move to the next sibling of the current node.
    fn next_sibling(&mut self) -> bool;

    /// Move to the parent of the current node.
    fn parent(&mut self) -> bool;

    /// The complete source text the tree was parsed from.
    fn source(&self) -> &str;

    /// Source text covered by the current node.
    fn text(&self) -> &str {
        let source = self.source();
        source.get(self.from()..self.to()).unwrap_or_default()
    }

    /// Span of the current node.
    fn span(&self) -> Span {
        Span::from_offsets(self.source(), self.from(), self.to())
    }
}

/// A node of an in-memory syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: String,
    pub from: usize,
    pub to: usize,
    pub children: Vec<SyntaxNode>,
}

/// An in-memory concrete syntax tree together with its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    source: String,
    root: SyntaxNode,
}

impl SyntaxTree {
    pub fn new(source: impl Into<String>, root: SyntaxNode) -> Self {
        Self {
            source: source.into(),
            root,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    /// A cursor positioned on the root node.
    pub fn cursor(&self) -> SyntaxCursor<'_> {
        SyntaxCursor {
            tree: self,
            ancestors: vec![&self.root],
            indices: Vec::new(),
        }
    }
}

/// Cursor over a [`SyntaxTree`].
#[derive(Debug, Clone)]
pub struct SyntaxCursor<'t> {
    tree: &'t SyntaxTree,
    /// Root first, current node last.
    ancestors: Vec<&'t SyntaxNode>,
    /// Child index of each non-root entry of `ancestors` within its parent.
    indices: Vec<usize>,
}

impl<'t> SyntaxCursor<'t> {
    fn current(&self) -> &'t SyntaxNode {
        // `ancestors` always holds at least the root.
        self.ancestors[self.ancestors.len() - 1]
    }

    /// Child indices from the root to the current node.
    pub fn path(&self) -> &[usize] {
        &self.indices
    }
}

impl TreeCursor for SyntaxCursor<'_> {
    fn kind(&self) -> &str {
        &self.current().kind
    }

    fn from(&self) -> usize {
        self.current().from
    }

    fn to(&self) -> usize {
        self.current().to
    }

    fn first_child(&mut self) -> bool {
        match self.current().children.first() {
            Some(child) => {
                self.ancestors.push(child);
                self.indices.push(0);
                true
            }
            None => false,
        }
    }

    fn next_sibling(&mut self) -> bool {
        let (Some(&index), Some(parent)) = (
            self.indices.last(),
            self.ancestors.len().checked_sub(2).map(|i| self.ancestors[i]),
        ) else {
            return false;
        };
        match parent.children.get(index + 1) {
            Some(sibling) => {
                self.ancestors.pop();
                self.indices.pop();
                self.ancestors.push(sibling);
                self.indices.push(index + 1);
                true
            }
            None => false,
        }
    }

    fn parent(&mut self) -> bool {
        if self.indices.is_empty() {
            return false;
        }
        self.ancestors.pop();
        self.indices.pop();
        true
    }

    fn source(&self) -> &str {
        &self.tree.source
    }
}

struct OpenNode {
    kind: String,
    from: Option<usize>,
    children: Vec<SyntaxNode>,
}

/// Builds a [`SyntaxTree`] from a stream of node and token events.
///
/// Tokens are appended to the synthesized source text separated by a single
/// space (or by [`line_break`](Self::line_break)), so spans stay accurate.
///
/// ```
/// use snek_parser::{SyntaxTreeBuilder, TreeCursor};
///
/// let mut b = SyntaxTreeBuilder::new();
/// b.start_node("Script");
/// b.start_node("ExpressionStatement");
/// b.token("Number", "42");
/// b.finish_node();
/// b.finish_node();
/// let tree = b.finish().unwrap();
///
/// let mut cursor = tree.cursor();
/// assert!(cursor.first_child());
/// assert_eq!(cursor.text(), "42");
/// ```
#[derive(Default)]
pub struct SyntaxTreeBuilder {
    source: String,
    stack: Vec<OpenNode>,
    root: Option<SyntaxNode>,
}

impl SyntaxTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an interior node; it spans everything added until the matching
    /// [`finish_node`](Self::finish_node).
    pub fn start_node(&mut self, kind: &str) {
        self.stack.push(OpenNode {
            kind: kind.to_string(),
            from: None,
            children: Vec::new(),
        });
    }

    /// Append a leaf node with its source text.
    pub fn token(&mut self, kind: &str, text: &str) {
        if !self.source.is_empty() && !self.source.ends_with('\n') {
            self.source.push(' ');
        }
        let from = self.source.len();
        self.source.push_str(text);
        for open in self.stack.iter_mut() {
            open.from.get_or_insert(from);
        }
        let leaf = SyntaxNode {
            kind: kind.to_string(),
            from,
            to: self.source.len(),
            children: Vec::new(),
        };
        self.attach(leaf);
    }

    /// Start a new source line.
    pub fn line_break(&mut self) {
        self.source.push('\n');
    }

    /// Close the innermost open node.
    pub fn finish_node(&mut self) {
        let Some(open) = self.stack.pop() else {
            return;
        };
        let to = self.source.len();
        let node = SyntaxNode {
            kind: open.kind,
            from: open.from.unwrap_or(to),
            to,
            children: open.children,
        };
        self.attach(node);
    }

    fn attach(&mut self, node: SyntaxNode) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root = Some(node),
        }
    }

    /// Finish building. Fails if nodes are still open or nothing was built.
    pub fn finish(self) -> Result<SyntaxTree, ParseError> {
        let span = Span::from_offsets(&self.source, self.source.len(), self.source.len());
        if let Some(open) = self.stack.last() {
            return Err(ParseError::Unsupported {
                message: format!("syntax tree node '{}' was never finished", open.kind),
                span,
            });
        }
        let root = self.root.ok_or(ParseError::MissingNode {
            context: "syntax tree",
            expected: "root node",
            span,
        })?;
        Ok(SyntaxTree::new(self.source, root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SyntaxTree {
        let mut b = SyntaxTreeBuilder::new();
        b.start_node("Script");
        b.start_node("AssignStatement");
        b.token("VariableName", "x");
        b.token("AssignOp", "=");
        b.token("Number", "1");
        b.finish_node();
        b.line_break();
        b.start_node("PassStatement");
        b.token("pass", "pass");
        b.finish_node();
        b.finish_node();
        b.finish().unwrap()
    }

    #[test]
    fn builder_synthesizes_source() {
        let tree = sample();
        assert_eq!(tree.source(), "x = 1\npass");
        assert_eq!(tree.root().kind, "Script");
        assert_eq!((tree.root().from, tree.root().to), (0, 10));
    }

    #[test]
    fn navigation() {
        let tree = sample();
        let mut c = tree.cursor();
        assert_eq!(c.kind(), "Script");
        assert!(!c.next_sibling());
        assert!(!c.parent());

        assert!(c.first_child());
        assert_eq!(c.kind(), "AssignStatement");
        assert_eq!(c.text(), "x = 1");
        assert!(c.first_child());
        assert_eq!(c.text(), "x");
        assert!(c.next_sibling());
        assert!(c.next_sibling());
        assert_eq!(c.kind(), "Number");
        assert!(!c.next_sibling());
        assert_eq!(c.path(), &[0, 2]);

        assert!(c.parent());
        assert!(c.next_sibling());
        assert_eq!(c.kind(), "PassStatement");
        assert_eq!(c.span(), Span::new(2, 1, 4));
        assert!(!c.next_sibling());
        assert!(c.parent());
        assert_eq!(c.kind(), "Script");
        assert!(c.path().is_empty());
    }

    #[test]
    fn unfinished_nodes_are_rejected() {
        let mut b = SyntaxTreeBuilder::new();
        b.start_node("Script");
        b.token("Number", "1");
        assert!(b.finish().is_err());
        assert!(SyntaxTreeBuilder::new().finish().is_err());
    }
}
