//! Browser host for graft.
//!
//! [`WebDocument`] implements [`DocumentTree`] over the live DOM via
//! `web-sys`, and [`WebQuery`] resolves selectors with `querySelector`.
//! The `#[wasm_bindgen]` functions below expose the modification API to
//! JavaScript against `window.document`.

use std::cell::RefCell;

use graft::{
    AttrValue, AttributeSpec, Attributes, DocumentTree, Dom, DomError, FacetJson,
    ImportStyleOptions, InlineStyle, NodeType, ObjectValue, Position, Primitive, PropertySpec,
    Query, Roots, SheetRef, StyleMap,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, Node};

/// `window.document` as a [`DocumentTree`].
#[derive(Debug, Clone)]
pub struct WebDocument {
    document: Document,
}

impl WebDocument {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// The document of the current window.
    pub fn from_window() -> Result<Self, DomError> {
        web_sys::window()
            .and_then(|window| window.document())
            .map(Self::new)
            .ok_or_else(|| DomError::Host {
                message: "no window.document".to_string(),
            })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

fn host_error(err: JsValue) -> DomError {
    DomError::Host {
        message: format!("{err:?}"),
    }
}

fn element(node: &Node) -> Result<&Element, DomError> {
    node.dyn_ref::<Element>().ok_or(DomError::NotAnElement)
}

fn primitive_to_js(value: &Primitive) -> JsValue {
    match value {
        Primitive::Null => JsValue::NULL,
        Primitive::Bool(b) => JsValue::from_bool(*b),
        Primitive::Int(i) => JsValue::from_f64(*i as f64),
        Primitive::Float(f) => JsValue::from_f64(*f),
        Primitive::Str(s) => JsValue::from_str(s),
    }
}

/// Scalars only; objects, functions and `undefined` have no primitive form.
fn primitive_from_js(value: &JsValue) -> Option<Primitive> {
    if value.is_null() {
        return Some(Primitive::Null);
    }
    if let Some(b) = value.as_bool() {
        return Some(Primitive::Bool(b));
    }
    if let Some(f) = value.as_f64() {
        let whole = f.fract() == 0.0 && f.abs() < (1u64 << 53) as f64;
        return Some(if whole {
            Primitive::Int(f as i64)
        } else {
            Primitive::Float(f)
        });
    }
    value.as_string().map(Primitive::Str)
}

impl DocumentTree for WebDocument {
    type Handle = Node;

    fn create_element(&mut self, tag: &str) -> Result<Node, DomError> {
        self.document
            .create_element(tag)
            .map(Into::into)
            .map_err(|_| DomError::InvalidTagName {
                name: tag.to_owned(),
            })
    }

    fn create_text(&mut self, text: &str) -> Node {
        self.document.create_text_node(text).into()
    }

    fn create_comment(&mut self, text: &str) -> Node {
        self.document.create_comment(text).into()
    }

    fn create_fragment(&mut self) -> Node {
        self.document.create_document_fragment().into()
    }

    fn insert_before(
        &mut self,
        parent: &Node,
        node: &Node,
        reference: &Node,
    ) -> Result<(), DomError> {
        parent
            .insert_before(node, Some(reference))
            .map(drop)
            .map_err(host_error)
    }

    fn append_child(&mut self, parent: &Node, node: &Node) -> Result<(), DomError> {
        parent.append_child(node).map(drop).map_err(host_error)
    }

    fn remove_child(&mut self, parent: &Node, node: &Node) -> Result<(), DomError> {
        parent.remove_child(node).map(drop).map_err(host_error)
    }

    fn parent(&self, node: &Node) -> Option<Node> {
        node.parent_node()
    }

    fn first_child(&self, node: &Node) -> Option<Node> {
        node.first_child()
    }

    fn next_sibling(&self, node: &Node) -> Option<Node> {
        node.next_sibling()
    }

    fn node_type(&self, node: &Node) -> NodeType {
        match node.node_type() {
            Node::ELEMENT_NODE => NodeType::Element,
            Node::TEXT_NODE | Node::CDATA_SECTION_NODE => NodeType::Text,
            Node::DOCUMENT_NODE => NodeType::Document,
            Node::DOCUMENT_FRAGMENT_NODE => NodeType::Fragment,
            // doctype and processing instructions are leaves, like comments
            _ => NodeType::Comment,
        }
    }

    fn tag_name(&self, node: &Node) -> Option<String> {
        node.dyn_ref::<Element>().map(Element::local_name)
    }

    fn set_attribute(&mut self, node: &Node, name: &str, value: &str) -> Result<(), DomError> {
        element(node)?
            .set_attribute(name, value)
            .map_err(host_error)
    }

    fn attribute(&self, node: &Node, name: &str) -> Option<String> {
        node.dyn_ref::<Element>()?.get_attribute(name)
    }

    fn set_property(&mut self, node: &Node, name: &str, value: &Primitive) -> Result<(), DomError> {
        js_sys::Reflect::set(node, &JsValue::from_str(name), &primitive_to_js(value))
            .map(drop)
            .map_err(host_error)
    }

    fn property(&self, node: &Node, name: &str) -> Option<Primitive> {
        let value = js_sys::Reflect::get(node, &JsValue::from_str(name)).ok()?;
        primitive_from_js(&value)
    }

    fn set_style_property(
        &mut self,
        node: &Node,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), DomError> {
        let style = node
            .dyn_ref::<HtmlElement>()
            .ok_or(DomError::NotAnElement)?
            .style();
        match value {
            Some(value) => style.set_property(name, value),
            None => style.remove_property(name).map(drop),
        }
        .map_err(host_error)
    }

    fn style_property(&self, node: &Node, name: &str) -> Option<String> {
        node.dyn_ref::<HtmlElement>()?
            .style()
            .get_property_value(name)
            .ok()
            .filter(|value| !value.is_empty())
    }

    fn text_content(&self, node: &Node) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text_content(&mut self, node: &Node, text: &str) -> Result<(), DomError> {
        node.set_text_content(Some(text));
        Ok(())
    }

    fn document_element(&self) -> Option<Node> {
        self.document.document_element().map(Into::into)
    }

    fn head(&self) -> Option<Node> {
        self.document.head().map(Into::into)
    }

    fn body(&self) -> Option<Node> {
        self.document.body().map(Into::into)
    }
}

/// Selector resolution through `document.querySelector`. Selectors the
/// browser rejects match nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebQuery;

impl Query<WebDocument> for WebQuery {
    fn query(&self, tree: &WebDocument, selector: &str) -> Option<Node> {
        match tree.document.query_selector(selector) {
            Ok(found) => found.map(Into::into),
            Err(err) => {
                tracing::debug!(selector, error = ?err, "querySelector rejected selector");
                None
            }
        }
    }
}

type WebDom = Dom<WebDocument, InlineStyle, FacetJson, WebQuery>;

thread_local! {
    static ROOTS: RefCell<Option<Roots<Node>>> = const { RefCell::new(None) };
}

/// The page's roots, discovered on first use. A body missing at that point
/// is looked up again on later calls.
fn page_roots(document: &mut WebDocument) -> Result<Roots<Node>, DomError> {
    let cached = ROOTS.with(|cell| cell.borrow().clone());
    let roots = match cached {
        Some(mut roots) => {
            if roots.body.is_none() {
                roots.body = document.body();
            }
            roots
        }
        None => Roots::discover(document)?,
    };
    ROOTS.with(|cell| *cell.borrow_mut() = Some(roots.clone()));
    Ok(roots)
}

/// Run `f` against a `Dom` bound to the page.
///
/// Nothing stays borrowed while `f` runs: host calls can re-enter these
/// exports (custom element reactions, property setters).
fn with_dom<R>(f: impl FnOnce(&mut WebDom) -> Result<R, DomError>) -> Result<R, JsValue> {
    let mut document = WebDocument::from_window().map_err(to_js)?;
    let roots = page_roots(&mut document).map_err(to_js)?;
    let mut dom = Dom::with_roots(document, roots).with_query(WebQuery);
    f(&mut dom).map_err(to_js)
}

fn to_js(err: DomError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Numbers are indices, strings are tokens; anything else is the default.
fn position_from_js(position: &JsValue) -> Position {
    if let Some(index) = position.as_f64() {
        if index >= 0.0 && index.fract() == 0.0 {
            return Position::from(index as usize);
        }
        return Position::default();
    }
    match position.as_string() {
        Some(token) => Position::from(token.as_str()),
        None => Position::default(),
    }
}

/// Object-typed values keep JavaScript's own `JSON.stringify`, so cyclic
/// structures fail the same way they would in page script.
fn object_from_js(value: JsValue) -> ObjectValue {
    ObjectValue::from_fn(move || {
        js_sys::JSON::stringify(&value)
            .map(String::from)
            .map_err(|err| DomError::Serialize {
                message: format!("{err:?}"),
            })
    })
}

fn entries(object: &JsValue) -> Vec<(String, JsValue)> {
    let Some(object) = object.dyn_ref::<js_sys::Object>() else {
        return Vec::new();
    };
    js_sys::Object::entries(object)
        .iter()
        .filter_map(|entry| {
            let pair = entry.dyn_into::<js_sys::Array>().ok()?;
            Some((pair.get(0).as_string()?, pair.get(1)))
        })
        .collect()
}

fn attributes_from_js(value: &JsValue) -> Option<Attributes> {
    if value.is_undefined() {
        return None;
    }
    if let Some(primitive) = primitive_from_js(value) {
        return Some(Attributes::Content(primitive));
    }
    let spec: AttributeSpec = entries(value)
        .into_iter()
        .filter(|(_, value)| !value.is_undefined())
        .map(|(name, value)| {
            let value = match primitive_from_js(&value) {
                Some(primitive) => AttrValue::Primitive(primitive),
                None if name == "style" => AttrValue::Style(style_map_from_js(&value)),
                None => AttrValue::Object(object_from_js(value)),
            };
            (name, value)
        })
        .collect();
    Some(spec.into())
}

fn style_map_from_js(value: &JsValue) -> StyleMap {
    entries(value)
        .into_iter()
        .filter_map(|(name, value)| Some((name, primitive_from_js(&value)?)))
        .collect()
}

fn properties_from_js(value: &JsValue) -> Option<PropertySpec> {
    if value.is_undefined() || value.is_null() {
        return None;
    }
    Some(
        entries(value)
            .into_iter()
            .filter_map(|(name, value)| Some((name, primitive_from_js(&value)?)))
            .collect(),
    )
}

/// Install the `tracing` subscriber that logs to the browser console.
#[wasm_bindgen]
pub fn init() {
    static ONCE: std::sync::Once = std::sync::Once::new();
    ONCE.call_once(|| {
        if let Err(err) = wasm_tracing::set_as_global_default() {
            web_sys::console::warn_1(&format!("graft: tracing not installed: {err:?}").into());
        }
    });
}

#[wasm_bindgen]
pub fn create(node_name: &str, attributes: JsValue, properties: JsValue) -> Result<Node, JsValue> {
    let attributes = attributes_from_js(&attributes);
    let properties = properties_from_js(&properties);
    with_dom(|dom| dom.create(node_name, attributes, properties))
}

#[wasm_bindgen]
pub fn insert(source: &Node, target: Option<Node>, position: JsValue) -> Result<Node, JsValue> {
    let position = position_from_js(&position);
    with_dom(|dom| dom.insert(source, target.as_ref(), position))
}

#[wasm_bindgen]
pub fn remove(node: Option<Node>) -> Result<(), JsValue> {
    with_dom(|dom| {
        if let Some(node) = &node {
            dom.remove(node);
        }
        Ok(())
    })
}

#[wasm_bindgen]
pub fn empty(node: &Node) -> Result<(), JsValue> {
    with_dom(|dom| {
        dom.empty(node);
        Ok(())
    })
}

#[wasm_bindgen]
pub fn parse(html: &str) -> Result<Option<Node>, JsValue> {
    with_dom(|dom| dom.parse(html))
}

/// `sheet` may be a selector string or a style element; `append` extends
/// the sheet instead of replacing its text.
#[wasm_bindgen(js_name = importStyle)]
pub fn import_style(css_text: &str, sheet: JsValue, append: bool) -> Result<Node, JsValue> {
    let sheet = match sheet.as_string() {
        Some(selector) => Some(SheetRef::Selector(selector)),
        None => sheet.dyn_into::<Node>().ok().map(SheetRef::Node),
    };
    let options = ImportStyleOptions { sheet, append };
    with_dom(|dom| dom.import_style(css_text, options))
}
