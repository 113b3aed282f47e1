//! The host document tree.
//!
//! Everything graft does goes through [`DocumentTree`]: node creation, the
//! three mutation primitives, and sibling/parent traversal. All node state
//! lives in the host; graft only ever holds handles for the duration of a
//! call.

use std::fmt;

use crate::{DomError, Primitive};

/// Node types a host tree can hand back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Document,
    Element,
    Text,
    Comment,
    Fragment,
}

impl NodeType {
    /// Whether nodes of this type may contain children.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            NodeType::Document | NodeType::Element | NodeType::Fragment
        )
    }
}

/// A live, mutable document tree.
///
/// Insertion follows the usual DOM contract: inserting a node that already
/// has a parent moves it, and inserting a fragment moves the fragment's
/// children (in order) and leaves it empty.
pub trait DocumentTree {
    /// Opaque node handle.
    type Handle: Clone + PartialEq + fmt::Debug;

    fn create_element(&mut self, tag: &str) -> Result<Self::Handle, DomError>;
    fn create_text(&mut self, text: &str) -> Self::Handle;
    fn create_comment(&mut self, text: &str) -> Self::Handle;
    fn create_fragment(&mut self) -> Self::Handle;

    /// Insert `node` into `parent` immediately before `reference`, which must
    /// be a child of `parent`.
    fn insert_before(
        &mut self,
        parent: &Self::Handle,
        node: &Self::Handle,
        reference: &Self::Handle,
    ) -> Result<(), DomError>;

    fn append_child(&mut self, parent: &Self::Handle, node: &Self::Handle)
    -> Result<(), DomError>;

    /// Detach `node` from `parent`. Fails when `node` is not currently a
    /// child of `parent`.
    fn remove_child(&mut self, parent: &Self::Handle, node: &Self::Handle)
    -> Result<(), DomError>;

    fn parent(&self, node: &Self::Handle) -> Option<Self::Handle>;
    fn first_child(&self, node: &Self::Handle) -> Option<Self::Handle>;
    fn next_sibling(&self, node: &Self::Handle) -> Option<Self::Handle>;

    fn node_type(&self, node: &Self::Handle) -> NodeType;

    /// Lowercase tag name for elements, `None` otherwise.
    fn tag_name(&self, node: &Self::Handle) -> Option<String>;

    fn set_attribute(
        &mut self,
        node: &Self::Handle,
        name: &str,
        value: &str,
    ) -> Result<(), DomError>;
    fn attribute(&self, node: &Self::Handle, name: &str) -> Option<String>;

    /// Assign a value on the node's property surface.
    fn set_property(
        &mut self,
        node: &Self::Handle,
        name: &str,
        value: &Primitive,
    ) -> Result<(), DomError>;
    fn property(&self, node: &Self::Handle, name: &str) -> Option<Primitive>;

    /// Set one inline style declaration; `None` removes it.
    fn set_style_property(
        &mut self,
        node: &Self::Handle,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), DomError>;
    fn style_property(&self, node: &Self::Handle, name: &str) -> Option<String>;

    /// Concatenated text of the node and its descendants.
    fn text_content(&self, node: &Self::Handle) -> String;

    /// Replace the node's children with a single text node (or its own
    /// data, for text and comment nodes).
    fn set_text_content(&mut self, node: &Self::Handle, text: &str) -> Result<(), DomError>;

    fn document_element(&self) -> Option<Self::Handle>;
    fn head(&self) -> Option<Self::Handle>;
    fn body(&self) -> Option<Self::Handle>;

    /// Children of `node`, in order.
    fn children(&self, node: &Self::Handle) -> Vec<Self::Handle> {
        let mut out = Vec::new();
        let mut cursor = self.first_child(node);
        while let Some(child) = cursor {
            cursor = self.next_sibling(&child);
            out.push(child);
        }
        out
    }

    /// First child that is an element.
    fn first_element_child(&self, node: &Self::Handle) -> Option<Self::Handle> {
        let mut cursor = self.first_child(node);
        while let Some(child) = cursor {
            if self.node_type(&child) == NodeType::Element {
                return Some(child);
            }
            cursor = self.next_sibling(&child);
        }
        None
    }

    /// Elements under `root` (inclusive) in document order.
    fn elements(&self, root: &Self::Handle) -> Vec<Self::Handle> {
        let mut out = Vec::new();
        let mut stack = vec![root.clone()];
        while let Some(node) = stack.pop() {
            if self.node_type(&node) == NodeType::Element {
                out.push(node.clone());
            }
            let mut children = self.children(&node);
            children.reverse();
            stack.extend(children);
        }
        out
    }
}
