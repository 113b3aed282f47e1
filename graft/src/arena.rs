//! Arena-backed host tree.
//!
//! [`ArenaDocument`] is an in-memory [`DocumentTree`]: every node lives in one
//! indextree arena, strings are `StrTendril`s shared with the parse input, and
//! html5ever builds the initial tree. It is what graft tests run against, and
//! a reasonable host for server-side HTML assembly.

use html5ever::tree_builder::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, LocalName, QualName, parse_document};
use indexmap::IndexMap;
use indextree::{Arena, NodeId};
use std::borrow::Cow;
use std::cell::RefCell;
use tendril::{StrTendril, TendrilSink};

use crate::tree::{DocumentTree, NodeType};
use crate::{DomError, Primitive};

/// Document = Arena + the invisible document node at its top.
#[derive(Debug, Clone)]
pub struct ArenaDocument {
    /// THE tree - all nodes live here, attached or not
    pub arena: Arena<NodeData>,

    /// Document node (parent of `<html>`)
    pub document: NodeId,

    /// DOCTYPE if present (usually "html")
    pub doctype: Option<StrTendril>,
}

/// What goes in each arena slot
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    pub ns: Namespace,
    /// Values assigned on the property surface, kept apart from attributes.
    pub properties: IndexMap<String, Primitive>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            ns: Namespace::Html,
            properties: IndexMap::new(),
        }
    }
}

/// Node types
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Document root (invisible, parent of `<html>`)
    Document,
    /// Element with tag, attributes and inline style
    Element(ElementData),
    /// Text content (StrTendril is refcounted - cheap to clone)
    Text(StrTendril),
    /// HTML comment
    Comment(StrTendril),
    /// Ownerless container; empties itself into whatever it is inserted into
    Fragment,
}

/// Element data
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Tag name, lowercase for HTML elements
    pub tag: StrTendril,

    /// Attributes other than `style`, in insertion order
    pub attrs: IndexMap<String, StrTendril>,

    /// Inline style declarations; reflected as the `style` attribute
    pub style: IndexMap<String, String>,
}

impl ElementData {
    fn new(tag: StrTendril) -> Self {
        Self {
            tag,
            attrs: IndexMap::new(),
            style: IndexMap::new(),
        }
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        if name == "style" {
            self.style = parse_style_attr(value);
        } else {
            self.attrs.insert(name.to_owned(), StrTendril::from(value));
        }
    }
}

/// XML namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Html,
    Svg,
    MathMl,
}

impl Namespace {
    pub fn from_url(url: &str) -> Self {
        match url {
            "http://www.w3.org/2000/svg" => Namespace::Svg,
            "http://www.w3.org/1998/Math/MathML" => Namespace::MathMl,
            _ => Namespace::Html,
        }
    }

    pub fn url(&self) -> &'static str {
        match self {
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
        }
    }
}

/// Options for [`ArenaDocument::serialize_with`].
#[derive(Clone, Debug, Default)]
pub struct SerializeOptions {
    /// Sort attributes alphabetically instead of keeping insertion order.
    pub sort_attributes: bool,
}

impl SerializeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort_attributes(mut self) -> Self {
        self.sort_attributes = true;
        self
    }
}

/// Parse HTML into an arena-based document
pub fn parse(html: &str) -> ArenaDocument {
    let sink = ArenaSink::new();
    let tendril = StrTendril::from(html);
    parse_document(sink, Default::default()).one(tendril)
}

impl Default for ArenaDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ArenaDocument {
    /// An empty `<html><head></head><body></body></html>` document.
    pub fn new() -> Self {
        parse("")
    }

    pub fn parse(html: &str) -> Self {
        parse(html)
    }

    /// Get immutable reference to node data
    pub fn get(&self, id: NodeId) -> &NodeData {
        self.arena[id].get()
    }

    /// Get mutable reference to node data
    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.arena[id].get_mut()
    }

    /// Element data, if `id` is an element
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.get(id).kind {
            NodeKind::Element(elem) => Some(elem),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        match &mut self.get_mut(id).kind {
            NodeKind::Element(elem) => Ok(elem),
            _ => Err(DomError::NotAnElement),
        }
    }

    /// Iterate children of a node
    pub fn child_ids(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    fn find_child_element(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        parent
            .children(&self.arena)
            .find(|&id| self.element(id).is_some_and(|e| e.tag.as_ref() == tag))
    }

    /// Serialize the children of `<body>` (no doctype, no wrappers).
    pub fn to_html(&self) -> String {
        let mut output = String::new();
        if let Some(body) = self.body() {
            for child in body.children(&self.arena) {
                self.serialize_node(&mut output, child, &SerializeOptions::default());
            }
        }
        output
    }

    /// Serialize a node and its subtree.
    pub fn outer_html(&self, id: NodeId) -> String {
        self.serialize_with(id, &SerializeOptions::default())
    }

    /// Serialize only the children of a node.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut output = String::new();
        for child in id.children(&self.arena) {
            self.serialize_node(&mut output, child, &SerializeOptions::default());
        }
        output
    }

    pub fn serialize_with(&self, id: NodeId, opts: &SerializeOptions) -> String {
        let mut output = String::new();
        self.serialize_node(&mut output, id, opts);
        output
    }

    fn serialize_node(&self, out: &mut String, node_id: NodeId, opts: &SerializeOptions) {
        match &self.get(node_id).kind {
            NodeKind::Document | NodeKind::Fragment => {
                for child in node_id.children(&self.arena) {
                    self.serialize_node(out, child, opts);
                }
            }
            NodeKind::Element(elem) => {
                self.serialize_element(out, node_id, elem, opts);
            }
            NodeKind::Text(text) => {
                let raw = self
                    .arena
                    .get(node_id)
                    .and_then(|n| n.parent())
                    .and_then(|p| self.element(p))
                    .is_some_and(|e| is_raw_text_element(e.tag.as_ref()));
                if raw {
                    out.push_str(text.as_ref());
                } else {
                    escape_text(out, text.as_ref());
                }
            }
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text.as_ref());
                out.push_str("-->");
            }
        }
    }

    fn serialize_element(
        &self,
        out: &mut String,
        node_id: NodeId,
        elem: &ElementData,
        opts: &SerializeOptions,
    ) {
        let tag = elem.tag.as_ref();

        out.push('<');
        out.push_str(tag);

        let mut attrs: Vec<(&str, &str)> = elem
            .attrs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_ref()))
            .collect();
        let style = render_style_attr(&elem.style);
        if !elem.style.is_empty() {
            attrs.push(("style", style.as_str()));
        }
        if opts.sort_attributes {
            attrs.sort_by_key(|(k, _)| *k);
        }
        for (name, value) in attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            escape_attr(out, value);
            out.push('"');
        }
        out.push('>');

        if is_void_element(tag) {
            return;
        }

        for child_id in node_id.children(&self.arena) {
            self.serialize_node(out, child_id, opts);
        }

        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }

    fn ensure_live(&self, id: NodeId) -> Result<(), DomError> {
        match self.arena.get(id) {
            Some(node) if !node.is_removed() => Ok(()),
            _ => Err(DomError::NodeRemoved),
        }
    }

    /// Pre-insertion validity: `parent` can hold children and `node` is
    /// neither the document nor an inclusive ancestor of `parent`.
    fn ensure_insertable(&self, parent: NodeId, node: NodeId) -> Result<(), DomError> {
        self.ensure_live(parent)?;
        self.ensure_live(node)?;
        if !self.node_type(&parent).is_container() {
            return Err(DomError::HierarchyRequest);
        }
        if matches!(self.get(node).kind, NodeKind::Document) {
            return Err(DomError::HierarchyRequest);
        }
        if parent.ancestors(&self.arena).any(|a| a == node) {
            return Err(DomError::HierarchyRequest);
        }
        Ok(())
    }

    /// Nodes that actually move for an insertion of `node`: its children if
    /// it is a fragment, itself otherwise.
    fn nodes_to_move(&self, node: NodeId) -> Vec<NodeId> {
        if matches!(self.get(node).kind, NodeKind::Fragment) {
            node.children(&self.arena).collect()
        } else {
            vec![node]
        }
    }
}

/// Tag names accepted by `create_element`: must start with a letter (or `_`
/// or `:`) and contain no whitespace, markup delimiters, or quotes.
fn is_valid_tag_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_alphabetic() || first == '_' || first == ':') {
        return false;
    }
    chars.all(|c| {
        !c.is_whitespace() && !matches!(c, '<' | '>' | '/' | '=' | '"' | '\'' | '\0')
    })
}

impl DocumentTree for ArenaDocument {
    type Handle = NodeId;

    fn create_element(&mut self, tag: &str) -> Result<NodeId, DomError> {
        if !is_valid_tag_name(tag) {
            return Err(DomError::InvalidTagName {
                name: tag.to_owned(),
            });
        }
        let tag = StrTendril::from(tag.to_ascii_lowercase());
        Ok(self
            .arena
            .new_node(NodeData::new(NodeKind::Element(ElementData::new(tag)))))
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.arena
            .new_node(NodeData::new(NodeKind::Text(StrTendril::from(text))))
    }

    fn create_comment(&mut self, text: &str) -> NodeId {
        self.arena
            .new_node(NodeData::new(NodeKind::Comment(StrTendril::from(text))))
    }

    fn create_fragment(&mut self) -> NodeId {
        self.arena.new_node(NodeData::new(NodeKind::Fragment))
    }

    fn insert_before(
        &mut self,
        parent: &NodeId,
        node: &NodeId,
        reference: &NodeId,
    ) -> Result<(), DomError> {
        self.ensure_live(*reference)?;
        if self.arena[*reference].parent() != Some(*parent) {
            return Err(DomError::NotAChild);
        }
        self.ensure_insertable(*parent, *node)?;
        if node == reference {
            return Ok(());
        }
        for moving in self.nodes_to_move(*node) {
            moving.detach(&mut self.arena);
            reference.checked_insert_before(moving, &mut self.arena)?;
        }
        Ok(())
    }

    fn append_child(&mut self, parent: &NodeId, node: &NodeId) -> Result<(), DomError> {
        self.ensure_insertable(*parent, *node)?;
        for moving in self.nodes_to_move(*node) {
            moving.detach(&mut self.arena);
            parent.checked_append(moving, &mut self.arena)?;
        }
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeId, node: &NodeId) -> Result<(), DomError> {
        self.ensure_live(*node)?;
        if self.arena[*node].parent() != Some(*parent) {
            return Err(DomError::NotAChild);
        }
        node.detach(&mut self.arena);
        Ok(())
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.arena.get(*node).and_then(|n| n.parent())
    }

    fn first_child(&self, node: &NodeId) -> Option<NodeId> {
        self.arena.get(*node).and_then(|n| n.first_child())
    }

    fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
        self.arena.get(*node).and_then(|n| n.next_sibling())
    }

    fn node_type(&self, node: &NodeId) -> NodeType {
        match &self.get(*node).kind {
            NodeKind::Document => NodeType::Document,
            NodeKind::Element(_) => NodeType::Element,
            NodeKind::Text(_) => NodeType::Text,
            NodeKind::Comment(_) => NodeType::Comment,
            NodeKind::Fragment => NodeType::Fragment,
        }
    }

    fn tag_name(&self, node: &NodeId) -> Option<String> {
        self.element(*node).map(|e| e.tag.to_string())
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let name = name.to_ascii_lowercase();
        self.element_mut(*node)?.set_attr(&name, value);
        Ok(())
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        let elem = self.element(*node)?;
        let name = name.to_ascii_lowercase();
        if name == "style" {
            return (!elem.style.is_empty()).then(|| render_style_attr(&elem.style));
        }
        elem.attrs.get(&name).map(|v| v.to_string())
    }

    fn set_property(
        &mut self,
        node: &NodeId,
        name: &str,
        value: &Primitive,
    ) -> Result<(), DomError> {
        // A few accessors reflect onto other surfaces, like they do in a browser.
        match name {
            "textContent" => return self.set_text_content(node, &value.to_string()),
            "id" if self.element(*node).is_some() => {
                return self.set_attribute(node, "id", &value.to_string());
            }
            "className" if self.element(*node).is_some() => {
                return self.set_attribute(node, "class", &value.to_string());
            }
            _ => {}
        }
        self.ensure_live(*node)?;
        self.get_mut(*node)
            .properties
            .insert(name.to_owned(), value.clone());
        Ok(())
    }

    fn property(&self, node: &NodeId, name: &str) -> Option<Primitive> {
        match name {
            "textContent" => return Some(Primitive::Str(self.text_content(node))),
            "id" if self.element(*node).is_some() => {
                return Some(Primitive::Str(self.attribute(node, "id").unwrap_or_default()));
            }
            "className" if self.element(*node).is_some() => {
                return Some(Primitive::Str(
                    self.attribute(node, "class").unwrap_or_default(),
                ));
            }
            _ => {}
        }
        self.get(*node).properties.get(name).cloned()
    }

    fn set_style_property(
        &mut self,
        node: &NodeId,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), DomError> {
        let elem = self.element_mut(*node)?;
        match value {
            Some(value) if !value.is_empty() => {
                elem.style.insert(name.to_owned(), value.to_owned());
            }
            _ => {
                elem.style.shift_remove(name);
            }
        }
        Ok(())
    }

    fn style_property(&self, node: &NodeId, name: &str) -> Option<String> {
        self.element(*node)?.style.get(name).cloned()
    }

    fn text_content(&self, node: &NodeId) -> String {
        match &self.get(*node).kind {
            NodeKind::Text(t) | NodeKind::Comment(t) => t.to_string(),
            _ => node
                .descendants(&self.arena)
                .filter_map(|id| match &self.get(id).kind {
                    NodeKind::Text(t) => Some(t.as_ref()),
                    _ => None,
                })
                .collect(),
        }
    }

    fn set_text_content(&mut self, node: &NodeId, text: &str) -> Result<(), DomError> {
        self.ensure_live(*node)?;
        match &mut self.get_mut(*node).kind {
            NodeKind::Text(t) | NodeKind::Comment(t) => {
                *t = StrTendril::from(text);
                return Ok(());
            }
            _ => {}
        }
        let children: Vec<NodeId> = node.children(&self.arena).collect();
        for child in children {
            child.detach(&mut self.arena);
        }
        if !text.is_empty() {
            let text_node = self.create_text(text);
            node.checked_append(text_node, &mut self.arena)?;
        }
        Ok(())
    }

    fn document_element(&self) -> Option<NodeId> {
        self.document
            .children(&self.arena)
            .find(|&id| self.element(id).is_some())
    }

    fn head(&self) -> Option<NodeId> {
        self.find_child_element(self.document_element()?, "head")
    }

    fn body(&self) -> Option<NodeId> {
        self.find_child_element(self.document_element()?, "body")
    }
}

/// Split a `style` attribute into declarations. Malformed entries (no `:`,
/// empty name or value) are dropped.
pub fn parse_style_attr(text: &str) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    for decl in text.split(';') {
        let Some((name, value)) = decl.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        if name.is_empty() || value.is_empty() {
            continue;
        }
        out.insert(name, value.to_owned());
    }
    out
}

pub fn render_style_attr(style: &IndexMap<String, String>) -> String {
    let mut out = String::new();
    for (i, (name, value)) in style.iter().enumerate() {
        if i > 0 {
            out.push(';');
        }
        out.push_str(name);
        out.push(':');
        out.push_str(value);
    }
    out
}

fn escape_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

/// HTML5 void elements that never have closing tags
fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Elements whose text children are serialized without escaping
fn is_raw_text_element(tag: &str) -> bool {
    matches!(
        tag,
        "style" | "script" | "xmp" | "iframe" | "noembed" | "noframes" | "plaintext"
    )
}

/// Owned element name wrapper
#[derive(Debug, Clone)]
pub struct OwnedElemName(QualName);

impl ElemName for OwnedElemName {
    fn ns(&self) -> &html5ever::Namespace {
        &self.0.ns
    }

    fn local_name(&self) -> &LocalName {
        &self.0.local
    }
}

/// TreeSink implementation for building the arena document
struct ArenaSink {
    /// Our arena - wrapped in RefCell for interior mutability
    arena: RefCell<Arena<NodeData>>,

    /// Document node (parent of `<html>`)
    document: NodeId,

    /// DOCTYPE encountered during parse
    doctype: RefCell<Option<StrTendril>>,
}

impl ArenaSink {
    fn new() -> Self {
        let mut arena = Arena::new();
        let document = arena.new_node(NodeData::new(NodeKind::Document));

        ArenaSink {
            arena: RefCell::new(arena),
            document,
            doctype: RefCell::new(None),
        }
    }
}

impl TreeSink for ArenaSink {
    type Handle = NodeId;
    type Output = ArenaDocument;
    type ElemName<'a>
        = OwnedElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        ArenaDocument {
            arena: self.arena.into_inner(),
            document: self.document,
            doctype: self.doctype.into_inner(),
        }
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {
        // html5ever recovers on its own
    }

    fn get_document(&self) -> Self::Handle {
        self.document
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn same_node(&self, a: &Self::Handle, b: &Self::Handle) -> bool {
        a == b
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> OwnedElemName {
        let arena = self.arena.borrow();
        let node = arena[*target].get();

        let (local, ns) = match &node.kind {
            NodeKind::Element(elem) => (LocalName::from(elem.tag.as_ref()), node.ns),
            _ => (LocalName::from(""), Namespace::Html),
        };
        OwnedElemName(QualName {
            prefix: None,
            ns: html5ever::Namespace::from(ns.url()),
            local,
        })
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let mut elem = ElementData::new(StrTendril::from(name.local.as_ref()));
        for attr in attrs {
            elem.set_attr(attr.name.local.as_ref(), attr.value.as_ref());
        }

        let mut data = NodeData::new(NodeKind::Element(elem));
        data.ns = Namespace::from_url(name.ns.as_ref());
        self.arena.borrow_mut().new_node(data)
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        self.arena
            .borrow_mut()
            .new_node(NodeData::new(NodeKind::Comment(text)))
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        self.arena
            .borrow_mut()
            .new_node(NodeData::new(NodeKind::Comment(StrTendril::new())))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => {
                parent.append(node, &mut arena);
            }
            NodeOrText::AppendText(text) => {
                // Merge with a trailing text node, like html5ever's own sinks
                let last_child = parent.children(&arena).next_back();
                if let Some(last_child) = last_child
                    && let NodeKind::Text(existing) = &mut arena[last_child].get_mut().kind
                {
                    existing.push_tendril(&text);
                    return;
                }

                let text_node = arena.new_node(NodeData::new(NodeKind::Text(text)));
                parent.append(text_node, &mut arena);
            }
        }
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        let node = match new_node {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => arena.new_node(NodeData::new(NodeKind::Text(text))),
        };
        sibling.insert_before(node, &mut arena);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        _prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        self.append(element, child);
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        *self.doctype.borrow_mut() = Some(name);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        // <template> content lives directly under the element
        *target
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut arena = self.arena.borrow_mut();
        if let NodeKind::Element(elem) = &mut arena[*target].get_mut().kind {
            for attr in attrs {
                let name = attr.name.local.as_ref();
                let present = if name == "style" {
                    !elem.style.is_empty()
                } else {
                    elem.attrs.contains_key(name)
                };
                if !present {
                    elem.set_attr(name, attr.value.as_ref());
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        target.detach(&mut self.arena.borrow_mut());
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut arena = self.arena.borrow_mut();
        let children: Vec<NodeId> = node.children(&arena).collect();
        for child in children {
            child.detach(&mut arena);
            new_parent.append(child, &mut arena);
        }
    }
}
