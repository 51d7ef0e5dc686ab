//! A minimal in-memory node tree that controllers mount into.
//!
//! It stands in for the document a real renderer would target: elements
//! with attributes, text nodes, and parent links so that a node can be
//! detached from wherever it currently lives.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(String),
    Text(String),
}

struct NodeData {
    kind: NodeKind,
    attributes: RefCell<Vec<(String, String)>>,
    children: RefCell<Vec<HostNode>>,
    parent: RefCell<Weak<NodeData>>,
}

/// Shared handle to a node.  Cloning the handle does not clone the node.
#[derive(Clone)]
pub struct HostNode(Rc<NodeData>);

impl HostNode {
    fn with_kind(kind: NodeKind) -> Self {
        HostNode(Rc::new(NodeData {
            kind,
            attributes: RefCell::new(Vec::new()),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
        }))
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Element(tag.into()))
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Text(content.into()))
    }

    pub fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    /// Tag name for elements, `None` for text nodes.
    pub fn tag(&self) -> Option<&str> {
        match &self.0.kind {
            NodeKind::Element(tag) => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0
            .attributes
            .borrow()
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let mut attributes = self.0.attributes.borrow_mut();
        match attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => attributes.push((name, value)),
        }
    }

    pub fn attributes(&self) -> Vec<(String, String)> {
        self.0.attributes.borrow().clone()
    }

    /// Append `child`, detaching it from its previous parent first.
    pub fn append_child(&self, child: &HostNode) {
        child.remove();
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        self.0.children.borrow_mut().push(child.clone());
    }

    /// Detach this node from its parent.  No-op for a detached node.
    pub fn remove(&self) {
        let parent = self.0.parent.replace(Weak::new()).upgrade();
        if let Some(parent) = parent {
            parent
                .children
                .borrow_mut()
                .retain(|node| !Rc::ptr_eq(&node.0, &self.0));
        }
    }

    pub fn parent(&self) -> Option<HostNode> {
        self.0.parent.borrow().upgrade().map(HostNode)
    }

    pub fn children(&self) -> Vec<HostNode> {
        self.0.children.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &HostNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Serialize the subtree, e.g. `<main><viewport name="left"></viewport></main>`.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        match &self.0.kind {
            NodeKind::Text(content) => out.push_str(content),
            NodeKind::Element(tag) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in self.0.attributes.borrow().iter() {
                    out.push_str(&format!(" {name}=\"{value}\""));
                }
                out.push('>');
                for child in self.0.children.borrow().iter() {
                    child.write_markup(out);
                }
                out.push_str(&format!("</{tag}>"));
            }
        }
    }
}

impl fmt::Debug for HostNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markup())
    }
}
