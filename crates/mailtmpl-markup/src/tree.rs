//! Arena-backed mutable node tree.
//!
//! Nodes live in a per-tree arena and are addressed by [`NodeId`]. Detaching
//! a subtree leaves its nodes in the arena but unreachable from the root;
//! traversals and the serializer only ever walk from the root, so detached
//! nodes are simply dead weight until the tree is dropped. This keeps every
//! structural edit (splice, unwrap, re-parent) an index operation with no
//! reference-counting or borrow gymnastics.

/// Identity of a node within its [`Tree`].
///
/// Ids are only meaningful for the tree that produced them. Because ids are
/// never reused within a tree, they are safe to use as map keys when styling
/// or annotating individual elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// A single attribute, name and value kept verbatim from the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Payload of a tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// Synthetic document root. Never serialized.
    Document,

    /// A doctype declaration.
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },

    /// An element with ordered attributes.
    Element {
        name: String,
        attributes: Vec<Attribute>,
        /// True if the element was written `<name/>` in the source.
        self_closing: bool,
    },

    /// A text node. Entities are kept undecoded.
    Text(String),

    /// A comment node (the text between `<!--` and `-->`).
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// A mutable markup document tree.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create an empty tree holding only the synthetic document root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            root: NodeId(0),
        }
    }

    /// The synthetic document root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Allocate a new detached node.
    pub fn new_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    /// Allocate a new detached element with no attributes.
    pub fn new_element(&mut self, name: impl Into<String>) -> NodeId {
        self.new_node(NodeData::Element {
            name: name.into(),
            attributes: Vec::new(),
            self_closing: false,
        })
    }

    /// Allocate a new detached text node.
    pub fn new_text(&mut self, text: impl Into<String>) -> NodeId {
        self.new_node(NodeData::Text(text.into()))
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0].data
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Element name, or `None` for non-element nodes.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// True if `id` is an element with the given (case-sensitive) name.
    pub fn is_element_named(&self, id: NodeId, name: &str) -> bool {
        self.name(id) == Some(name)
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` as the first child of `parent`, detaching it first.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(0, child);
    }

    /// Insert `node` as the next sibling of `target`.
    ///
    /// Does nothing if `target` is detached or is the document root.
    pub fn insert_after(&mut self, target: NodeId, node: NodeId) {
        let Some(parent) = self.nodes[target.0].parent else {
            return;
        };
        self.detach(node);
        let pos = self.position_in_parent(parent, target);
        self.nodes[node.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(pos + 1, node);
    }

    /// Insert each of `ids`, in order, immediately after `target`.
    pub fn insert_all_after(&mut self, target: NodeId, ids: &[NodeId]) {
        let mut anchor = target;
        for &id in ids {
            self.insert_after(anchor, id);
            anchor = id;
        }
    }

    /// Remove `id` from its parent's child list. The node itself (and its
    /// subtree) stays alive in the arena, merely unreachable from the root.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Replace `id` with its own children, preserving their order.
    pub fn unwrap(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent else {
            return;
        };
        let pos = self.position_in_parent(parent, id);
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for (offset, &child) in children.iter().enumerate() {
            self.nodes[child.0].parent = Some(parent);
            self.nodes[parent.0].children.insert(pos + 1 + offset, child);
        }
        self.detach(id);
    }

    fn position_in_parent(&self, parent: NodeId, child: NodeId) -> usize {
        self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == child)
            .expect("child not found under its recorded parent")
    }

    /// All nodes reachable from `id` in document (pre-)order, including `id`.
    ///
    /// The result is a snapshot: callers are free to mutate the tree while
    /// iterating it, which is exactly what the composition engine does.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(id, &mut out);
        out
    }

    fn collect_descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        for &child in &self.nodes[id.0].children {
            self.collect_descendants(child, out);
        }
    }

    /// All elements with the given name, in document order (snapshot).
    pub fn elements_named(&self, name: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| self.is_element_named(id, name))
            .collect()
    }

    /// The first element with the given name, in document order.
    pub fn first_element_named(&self, name: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&id| self.is_element_named(id, name))
    }

    /// True if any strict descendant of `id` is an element with this name.
    pub fn has_descendant_named(&self, id: NodeId, name: &str) -> bool {
        self.descendants(id)
            .into_iter()
            .skip(1)
            .any(|d| self.is_element_named(d, name))
    }

    /// Attribute value on an element, if present.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.value.as_str()),
            _ => None,
        }
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Set an attribute, replacing any existing value in place (attribute
    /// order is preserved) or appending a new attribute at the end.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let NodeData::Element { attributes, .. } = &mut self.nodes[id.0].data {
            let value = value.into();
            match attributes.iter_mut().find(|a| a.name == name) {
                Some(attr) => attr.value = value,
                None => attributes.push(Attribute {
                    name: name.to_string(),
                    value,
                }),
            }
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let NodeData::Element { attributes, .. } = &mut self.nodes[id.0].data {
            attributes.retain(|a| a.name != name);
        }
    }

    /// Concatenated text of all text nodes under `id` (including `id` itself
    /// if it is a text node). Entities stay undecoded.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let NodeData::Text(text) = self.data(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// Deep-copy a subtree from another tree into this one.
    ///
    /// Returns the id of the detached copy; the caller decides where to
    /// attach it. Ids from `src` have no meaning in `self`.
    pub fn import_from(&mut self, src: &Tree, src_id: NodeId) -> NodeId {
        let copy = self.new_node(src.data(src_id).clone());
        let src_children: Vec<NodeId> = src.children(src_id).to_vec();
        for child in src_children {
            let child_copy = self.import_from(src, child);
            self.append_child(copy, child_copy);
        }
        copy
    }
}
