use crate::tree::tags::{GroupTag, TokenKind};

/// Handle to a node in a [`ParseTree`] arena.
///
/// Ids are stable for the lifetime of the tree: retagging a group or
/// moving it to a new parent never invalidates its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

#[derive(Debug)]
enum NodeData {
    Leaf {
        kind: TokenKind,
        text: String,
    },
    Group {
        tag: Option<GroupTag>,
        children: Vec<NodeId>,
    },
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    data: NodeData,
}

/// Borrowed view of a single node, for matching on shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Leaf { kind: TokenKind, text: &'a str },
    Group { tag: Option<GroupTag> },
}

/// Arena holding one statement tree under construction.
///
/// Groups own their ordered child lists; the parent link is a plain index
/// and never owns. Exactly one group, the statement root, is allowed to be
/// untagged — its tag is resolved to a statement kind during parsing.
#[derive(Debug)]
pub struct ParseTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl ParseTree {
    pub fn new() -> Self {
        let root = Node {
            parent: None,
            data: NodeData::Group {
                tag: None,
                children: Vec::new(),
            },
        };
        ParseTree {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        match &self.nodes[id.0].data {
            NodeData::Leaf { kind, text } => NodeRef::Leaf { kind: *kind, text },
            NodeData::Group { tag, .. } => NodeRef::Group { tag: *tag },
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// The group's tag; `None` for leaves and for the untagged root.
    pub fn group_tag(&self, id: NodeId) -> Option<GroupTag> {
        match &self.nodes[id.0].data {
            NodeData::Group { tag, .. } => *tag,
            NodeData::Leaf { .. } => None,
        }
    }

    pub fn leaf_kind(&self, id: NodeId) -> Option<TokenKind> {
        match &self.nodes[id.0].data {
            NodeData::Leaf { kind, .. } => Some(*kind),
            NodeData::Group { .. } => None,
        }
    }

    pub fn leaf_text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Leaf { text, .. } => Some(text),
            NodeData::Group { .. } => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id.0].data {
            NodeData::Group { children, .. } => children,
            NodeData::Leaf { .. } => &[],
        }
    }

    pub fn set_group_tag(&mut self, id: NodeId, new_tag: GroupTag) {
        match &mut self.nodes[id.0].data {
            NodeData::Group { tag, .. } => *tag = Some(new_tag),
            NodeData::Leaf { .. } => panic!("cannot tag a leaf as a group"),
        }
    }

    pub fn set_leaf_kind(&mut self, id: NodeId, new_kind: TokenKind) {
        match &mut self.nodes[id.0].data {
            NodeData::Leaf { kind, .. } => *kind = new_kind,
            NodeData::Group { .. } => panic!("cannot set a token kind on a group"),
        }
    }

    /// Extends a leaf's literal text; used to concatenate adjacent string
    /// literals into a single token.
    pub fn push_leaf_text(&mut self, id: NodeId, more: &str) {
        match &mut self.nodes[id.0].data {
            NodeData::Leaf { text, .. } => text.push_str(more),
            NodeData::Group { .. } => panic!("cannot extend text of a group"),
        }
    }

    /// Statement kind, i.e. the root group's tag.
    pub fn statement_kind(&self) -> Option<GroupTag> {
        self.group_tag(self.root)
    }

    pub fn set_statement_kind(&mut self, kind: GroupTag) {
        self.set_group_tag(self.root, kind);
    }

    /// Creates a detached leaf.
    pub fn new_leaf(&mut self, kind: TokenKind, text: impl Into<String>) -> NodeId {
        self.alloc(Node {
            parent: None,
            data: NodeData::Leaf {
                kind,
                text: text.into(),
            },
        })
    }

    /// Creates a detached, empty group.
    pub fn new_group(&mut self, tag: GroupTag) -> NodeId {
        self.alloc(Node {
            parent: None,
            data: NodeData::Group {
                tag: Some(tag),
                children: Vec::new(),
            },
        })
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Attaches `child` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.nodes[child.0].parent.is_none(), "node already attached");
        self.nodes[child.0].parent = Some(parent);
        match &mut self.nodes[parent.0].data {
            NodeData::Group { children, .. } => children.push(child),
            NodeData::Leaf { .. } => panic!("cannot append a child to a leaf"),
        }
    }

    /// Attaches `child` at `index` within `parent`'s child list.
    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) {
        debug_assert!(self.nodes[child.0].parent.is_none(), "node already attached");
        self.nodes[child.0].parent = Some(parent);
        match &mut self.nodes[parent.0].data {
            NodeData::Group { children, .. } => children.insert(index, child),
            NodeData::Leaf { .. } => panic!("cannot insert a child into a leaf"),
        }
    }

    /// Last child that is not whitespace or a comment.
    pub fn last_nontrivial(&self, group: NodeId) -> Option<NodeId> {
        self.last_nontrivial_index(group)
            .map(|i| self.children(group)[i])
    }

    /// Index of the last child that is not whitespace or a comment.
    pub fn last_nontrivial_index(&self, group: NodeId) -> Option<usize> {
        let children = self.children(group);
        children.iter().rposition(|&c| match &self.nodes[c.0].data {
            NodeData::Leaf { kind, .. } => !kind.is_trivial(),
            NodeData::Group { .. } => true,
        })
    }

    /// True if any direct child is a leaf of `kind` whose text equals
    /// `text` ignoring ASCII case.
    pub fn has_direct_leaf(&self, group: NodeId, kind: TokenKind, text: &str) -> bool {
        self.children(group).iter().any(|&c| {
            matches!(
                &self.nodes[c.0].data,
                NodeData::Leaf { kind: k, text: t } if *k == kind && t.eq_ignore_ascii_case(text)
            )
        })
    }

    /// Detaches and returns the trailing whitespace leaf of `group`, if
    /// there is one. The caller re-parents it so clause boundaries never
    /// swallow surrounding whitespace.
    pub fn pop_trailing_whitespace(&mut self, group: NodeId) -> Option<NodeId> {
        let last = *self.children(group).last()?;
        if self.leaf_kind(last) != Some(TokenKind::Whitespace) {
            return None;
        }
        match &mut self.nodes[group.0].data {
            NodeData::Group { children, .. } => {
                children.pop();
            }
            NodeData::Leaf { .. } => unreachable!(),
        }
        self.nodes[last.0].parent = None;
        Some(last)
    }

    /// Moves the children of `group` in `range` into a brand-new group of
    /// the given tag, spliced in at the vacated position. Ownership of the
    /// moved nodes transfers; nothing is copied.
    pub fn merge_span(
        &mut self,
        group: NodeId,
        tag: GroupTag,
        range: std::ops::Range<usize>,
    ) -> NodeId {
        let new_grp = self.new_group(tag);
        let moved: Vec<NodeId> = match &mut self.nodes[group.0].data {
            NodeData::Group { children, .. } => {
                children.splice(range.clone(), std::iter::empty()).collect()
            }
            NodeData::Leaf { .. } => panic!("cannot merge children of a leaf"),
        };
        for &m in &moved {
            self.nodes[m.0].parent = Some(new_grp);
        }
        match &mut self.nodes[new_grp.0].data {
            NodeData::Group { children, .. } => *children = moved,
            NodeData::Leaf { .. } => unreachable!(),
        }
        self.insert(group, range.start, new_grp);
        new_grp
    }

    /// [`merge_span`](Self::merge_span) from `start` through the end.
    pub fn merge_suffix(&mut self, group: NodeId, tag: GroupTag, start: usize) -> NodeId {
        let end = self.children(group).len();
        self.merge_span(group, tag, start..end)
    }

    /// Depth-first, left-to-right iterator over leaf tokens.
    pub fn flatten(&self, id: NodeId, skip_whitespace: bool, skip_comments: bool) -> Flatten<'_> {
        Flatten {
            tree: self,
            stack: vec![id],
            skip_whitespace,
            skip_comments,
        }
    }

    /// Concatenated leaf text in document order. With comments stripped
    /// this is the statement minus comments; without, it reproduces the
    /// consumed token stream exactly.
    pub fn text(&self, id: NodeId, skip_comments: bool) -> String {
        let mut out = String::new();
        for leaf in self.flatten(id, false, skip_comments) {
            out.push_str(self.leaf_text(leaf).unwrap_or(""));
        }
        out
    }

    /// Depth-first iterator over identifier-like groups: `Identifier`,
    /// `Function`, `SubQuery`, anything in `extra`, and
    /// `ComputedIdentifier`/`SelectConstantIdentifier` groups sitting
    /// directly in a `SelectClause`.
    pub fn identifiers<'a>(&'a self, extra: &'a [GroupTag]) -> Identifiers<'a> {
        let mut stack: Vec<NodeId> = self.children(self.root).to_vec();
        stack.reverse();
        Identifiers { tree: self, stack, extra }
    }
}

impl Default for ParseTree {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Flatten<'a> {
    tree: &'a ParseTree,
    stack: Vec<NodeId>,
    skip_whitespace: bool,
    skip_comments: bool,
}

impl<'a> Iterator for Flatten<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            match &self.tree.nodes[id.0].data {
                NodeData::Group { children, .. } => {
                    self.stack.extend(children.iter().rev());
                }
                NodeData::Leaf { kind, .. } => {
                    if (self.skip_whitespace && *kind == TokenKind::Whitespace)
                        || (self.skip_comments && kind.is_comment())
                    {
                        continue;
                    }
                    return Some(id);
                }
            }
        }
        None
    }
}

pub struct Identifiers<'a> {
    tree: &'a ParseTree,
    stack: Vec<NodeId>,
    extra: &'a [GroupTag],
}

impl<'a> Iterator for Identifiers<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            let NodeData::Group { tag, children } = &self.tree.nodes[id.0].data else {
                continue;
            };
            self.stack.extend(children.iter().rev());
            let Some(tag) = *tag else { continue };
            let direct = matches!(
                tag,
                GroupTag::Identifier | GroupTag::Function | GroupTag::SubQuery
            ) || self.extra.contains(&tag);
            let top_level_expr = matches!(
                tag,
                GroupTag::ComputedIdentifier | GroupTag::SelectConstantIdentifier
            ) && self
                .tree
                .parent(id)
                .is_some_and(|p| self.tree.group_tag(p) == Some(GroupTag::SelectClause));
            if direct || top_level_expr {
                return Some(id);
            }
        }
        None
    }
}

/// A completed, frozen statement tree.
///
/// Produced by the parser once per end-of-statement marker (plus a possible
/// trailing unterminated statement); never mutated after being yielded.
#[derive(Debug)]
pub struct SqlStatement {
    tree: ParseTree,
}

impl SqlStatement {
    pub(crate) fn from_tree(tree: ParseTree) -> Self {
        SqlStatement { tree }
    }

    /// Statement kind (`Select`, `SelectInto`, `Insert`, `InsertIntoSelect`).
    pub fn kind(&self) -> Option<GroupTag> {
        self.tree.statement_kind()
    }

    /// The underlying tree, for read-only navigation.
    pub fn tree(&self) -> &ParseTree {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn text(&self, skip_comments: bool) -> String {
        self.tree.text(self.tree.root(), skip_comments)
    }

    pub fn flatten(&self, skip_whitespace: bool, skip_comments: bool) -> Flatten<'_> {
        self.tree.flatten(self.tree.root(), skip_whitespace, skip_comments)
    }

    /// Identifier-like nodes of the whole statement, in document order.
    pub fn identifiers(&self) -> Identifiers<'_> {
        self.tree.identifiers(&[])
    }

    /// Identifier collection extended with dialect-specific tags.
    pub fn identifiers_with<'a>(&'a self, extra: &'a [GroupTag]) -> Identifiers<'a> {
        self.tree.identifiers(extra)
    }
}

impl std::fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_suffix_moves_ownership() {
        let mut t = ParseTree::new();
        let root = t.root();
        let a = t.new_leaf(TokenKind::Name, "a");
        let op = t.new_leaf(TokenKind::Operator, "+");
        let b = t.new_leaf(TokenKind::Name, "b");
        t.append(root, a);
        t.append(root, op);
        t.append(root, b);

        let grp = t.merge_suffix(root, GroupTag::ComputedIdentifier, 0);
        assert_eq!(t.children(root), &[grp]);
        assert_eq!(t.children(grp), &[a, op, b]);
        assert_eq!(t.parent(a), Some(grp));
        assert_eq!(t.text(root, false), "a+b");
    }

    #[test]
    fn pop_trailing_whitespace_detaches() {
        let mut t = ParseTree::new();
        let root = t.root();
        let a = t.new_leaf(TokenKind::Name, "a");
        let ws = t.new_leaf(TokenKind::Whitespace, " ");
        t.append(root, a);
        t.append(root, ws);

        assert_eq!(t.pop_trailing_whitespace(root), Some(ws));
        assert_eq!(t.children(root), &[a]);
        assert_eq!(t.parent(ws), None);
        assert_eq!(t.pop_trailing_whitespace(root), None);
    }
}
