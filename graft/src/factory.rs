//! Declarative node construction.

use crate::collab::{FacetJson, InlineStyle, JsonStringify, StyleSetter};
use crate::tree::DocumentTree;
use crate::{AttrValue, AttributeSpec, Attributes, DomError, ObjectValue, PropertySpec};

/// What `create` is asked to build, decoded from its node name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeName<'a> {
    Text,
    Comment,
    Fragment,
    Element(&'a str),
}

impl<'a> NodeName<'a> {
    /// `#text`, `#comment` and `#fragment` are special; anything else is a
    /// tag name and is handed to the host unchanged.
    pub fn parse(name: &'a str) -> Self {
        match name {
            "#text" => NodeName::Text,
            "#comment" => NodeName::Comment,
            "#fragment" => NodeName::Fragment,
            tag => NodeName::Element(tag),
        }
    }
}

/// Builds detached nodes from a name, an attribute spec and a property
/// spec.
///
/// Style maps under the `style` key go through the [`StyleSetter`];
/// object-typed values under any other key go through the
/// [`JsonStringify`] collaborator.
#[derive(Debug, Clone, Default)]
pub struct NodeFactory<S = InlineStyle, J = FacetJson> {
    style: S,
    json: J,
}

impl NodeFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S, J> NodeFactory<S, J> {
    pub fn with_collaborators(style: S, json: J) -> Self {
        Self { style, json }
    }

    pub fn with_style_setter<S2>(self, style: S2) -> NodeFactory<S2, J> {
        NodeFactory {
            style,
            json: self.json,
        }
    }

    pub fn with_json<J2>(self, json: J2) -> NodeFactory<S, J2> {
        NodeFactory {
            style: self.style,
            json,
        }
    }

    /// Create a detached node. The node is never attached anywhere; the
    /// caller decides where it goes.
    ///
    /// For `#text` and `#comment`, a [`Attributes::Content`] argument is the
    /// node's text; for elements, an [`Attributes::Map`] lists attributes in
    /// the order they are applied. Properties are assigned last, on every
    /// node kind except fragments.
    pub fn create<T>(
        &self,
        tree: &mut T,
        node_name: &str,
        attributes: Option<Attributes>,
        properties: Option<PropertySpec>,
    ) -> Result<T::Handle, DomError>
    where
        T: DocumentTree,
        S: StyleSetter<T>,
        J: JsonStringify,
    {
        let node = match NodeName::parse(node_name) {
            NodeName::Text => {
                let text = content(attributes);
                trace!(len = text.len(), "create text node");
                tree.create_text(&text)
            }
            NodeName::Comment => {
                let text = content(attributes);
                trace!(len = text.len(), "create comment node");
                tree.create_comment(&text)
            }
            NodeName::Fragment => {
                trace!("create fragment");
                return Ok(tree.create_fragment());
            }
            NodeName::Element(tag) => {
                trace!(tag, "create element");
                let node = tree.create_element(tag)?;
                match attributes {
                    Some(Attributes::Map(spec)) => self.apply_attributes(tree, &node, &spec)?,
                    Some(Attributes::Content(_)) => {
                        debug!(tag, "content argument ignored for element");
                    }
                    None => {}
                }
                node
            }
        };

        if let Some(properties) = properties {
            for (name, value) in properties.iter() {
                tree.set_property(&node, name, value)?;
            }
        }
        Ok(node)
    }

    fn apply_attributes<T>(
        &self,
        tree: &mut T,
        node: &T::Handle,
        spec: &AttributeSpec,
    ) -> Result<(), DomError>
    where
        T: DocumentTree,
        S: StyleSetter<T>,
        J: JsonStringify,
    {
        for (name, value) in spec.iter() {
            let text = match value {
                AttrValue::Style(styles) if name == "style" => {
                    self.style.apply(tree, node, styles)?;
                    continue;
                }
                AttrValue::Style(styles) => self.stringify(name, &styles.to_object()),
                AttrValue::Object(object) => self.stringify(name, object),
                AttrValue::Primitive(primitive) => primitive.to_string(),
            };
            tree.set_attribute(node, name, &text)?;
        }
        Ok(())
    }

    /// Object-valued attributes that fail to serialize become empty.
    fn stringify(&self, _name: &str, object: &ObjectValue) -> String
    where
        J: JsonStringify,
    {
        self.json.stringify(object).unwrap_or_else(|_err| {
            debug!(name = _name, error = %_err, "attribute value not serializable");
            String::new()
        })
    }
}

fn content(attributes: Option<Attributes>) -> String {
    match attributes {
        Some(Attributes::Content(value)) => value.to_string(),
        Some(Attributes::Map(_)) | None => String::new(),
    }
}
