//! Collaborators the core calls out to: the inline style setter, the JSON
//! stringifier for object-valued attributes, and the selector query used to
//! resolve stylesheet references.
//!
//! Each is a trait so hosts can plug in native versions (a browser already
//! has `querySelector`); the defaults here work against any [`DocumentTree`].

use crate::selector::Selector;
use crate::tree::DocumentTree;
use crate::{DomError, ObjectValue, Primitive, StyleMap};

/// Applies a style mapping to a node's style surface, one declaration at a
/// time.
pub trait StyleSetter<T: DocumentTree> {
    fn apply(&self, tree: &mut T, node: &T::Handle, styles: &StyleMap) -> Result<(), DomError>;
}

/// Turns an object-valued attribute into text.
pub trait JsonStringify {
    fn stringify(&self, value: &ObjectValue) -> Result<String, DomError>;
}

/// Resolves a selector to the first matching node in document order.
pub trait Query<T: DocumentTree> {
    fn query(&self, tree: &T, selector: &str) -> Option<T::Handle>;
}

/// Default style setter: camelCase names become kebab-case, and numbers
/// get a `px` unit unless the property is unitless. `Null` clears the
/// declaration.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineStyle;

/// Properties whose numeric values are used without a unit.
const UNITLESS: &[&str] = &[
    "animation-iteration-count",
    "column-count",
    "fill-opacity",
    "flex",
    "flex-grow",
    "flex-shrink",
    "font-weight",
    "line-height",
    "opacity",
    "order",
    "orphans",
    "widows",
    "z-index",
    "zoom",
];

impl InlineStyle {
    /// `fontSize` -> `font-size`; names that are already kebab-case (and
    /// custom properties) pass through unchanged.
    pub fn css_name(name: &str) -> String {
        if name.starts_with("--") {
            return name.to_owned();
        }
        let mut out = String::with_capacity(name.len() + 4);
        for c in name.chars() {
            if c.is_ascii_uppercase() {
                out.push('-');
                out.push(c.to_ascii_lowercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Declaration value for `name`, or `None` to remove it.
    pub fn css_value(name: &str, value: &Primitive) -> Option<String> {
        match value {
            Primitive::Null => None,
            v if v.is_number() && !UNITLESS.contains(&name) => Some(format!("{v}px")),
            v => Some(v.to_string()),
        }
    }
}

impl<T: DocumentTree> StyleSetter<T> for InlineStyle {
    fn apply(&self, tree: &mut T, node: &T::Handle, styles: &StyleMap) -> Result<(), DomError> {
        for (name, value) in styles.iter() {
            let name = Self::css_name(name);
            let value = Self::css_value(&name, value);
            trace!(name = %name, value = ?value, "set style property");
            tree.set_style_property(node, &name, value.as_deref())?;
        }
        Ok(())
    }
}

/// Default stringifier, backed by `facet-json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FacetJson;

impl JsonStringify for FacetJson {
    fn stringify(&self, value: &ObjectValue) -> Result<String, DomError> {
        value.to_json()
    }
}

/// Default query: parses the selector and walks the tree from the document
/// element. Unsupported selectors match nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorQuery;

impl<T: DocumentTree> Query<T> for SelectorQuery {
    fn query(&self, tree: &T, selector: &str) -> Option<T::Handle> {
        let parsed = match selector.parse::<Selector>() {
            Ok(parsed) => parsed,
            Err(_err) => {
                debug!(selector, error = %_err, "selector not supported, nothing matched");
                return None;
            }
        };
        let root = tree.document_element()?;
        tree.elements(&root)
            .into_iter()
            .find(|node| parsed.matches(tree, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{ArenaDocument, parse};
    use facet_testhelpers::test;

    #[test]
    fn test_css_name() {
        assert_eq!(InlineStyle::css_name("width"), "width");
        assert_eq!(InlineStyle::css_name("fontSize"), "font-size");
        assert_eq!(InlineStyle::css_name("borderTopWidth"), "border-top-width");
        assert_eq!(InlineStyle::css_name("z-index"), "z-index");
        assert_eq!(InlineStyle::css_name("--mainColor"), "--mainColor");
    }

    #[test]
    fn test_css_value_units() {
        assert_eq!(
            InlineStyle::css_value("width", &Primitive::Int(100)).as_deref(),
            Some("100px")
        );
        assert_eq!(
            InlineStyle::css_value("opacity", &Primitive::Float(0.5)).as_deref(),
            Some("0.5")
        );
        assert_eq!(
            InlineStyle::css_value("z-index", &Primitive::Int(3)).as_deref(),
            Some("3")
        );
        assert_eq!(
            InlineStyle::css_value("width", &Primitive::from("50%")).as_deref(),
            Some("50%")
        );
        assert_eq!(InlineStyle::css_value("width", &Primitive::Null), None);
    }

    #[test]
    fn test_inline_style_applies_each_declaration() {
        let mut doc = ArenaDocument::new();
        let div = doc.create_element("div").unwrap();
        let styles = StyleMap::new()
            .with("width", 100)
            .with("backgroundColor", "red")
            .with("zIndex", 2);
        InlineStyle.apply(&mut doc, &div, &styles).unwrap();

        assert_eq!(doc.style_property(&div, "width").as_deref(), Some("100px"));
        assert_eq!(
            doc.style_property(&div, "background-color").as_deref(),
            Some("red")
        );
        assert_eq!(doc.style_property(&div, "z-index").as_deref(), Some("2"));

        InlineStyle
            .apply(&mut doc, &div, &StyleMap::new().with("width", Primitive::Null))
            .unwrap();
        assert_eq!(doc.style_property(&div, "width"), None);
    }

    #[test]
    fn test_inline_style_on_text_node_fails() {
        let mut doc = ArenaDocument::new();
        let text = doc.create_text("x");
        let err = InlineStyle
            .apply(&mut doc, &text, &StyleMap::new().with("width", 1))
            .unwrap_err();
        assert!(matches!(err, DomError::NotAnElement));
    }

    #[test]
    fn test_selector_query_first_match_in_document_order() {
        let doc = parse(
            r#"<html><head><style id="s1"></style></head><body><div class="a"><style class="late"></style></div></body></html>"#,
        );
        let first = SelectorQuery.query(&doc, "style").unwrap();
        assert_eq!(doc.attribute(&first, "id").as_deref(), Some("s1"));

        let nested = SelectorQuery.query(&doc, "div.a > style").unwrap();
        assert_eq!(doc.attribute(&nested, "class").as_deref(), Some("late"));

        assert!(SelectorQuery.query(&doc, "#missing").is_none());
        assert!(SelectorQuery.query(&doc, "div:::").is_none());
    }
}
