//! The facade: one host tree, its roots, and the factory, inserter and
//! stylesheet injector bound to them.

use indextree::NodeId;

use crate::arena::{ArenaDocument, NodeKind, render_style_attr};
use crate::collab::{FacetJson, InlineStyle, JsonStringify, Query, SelectorQuery, StyleSetter};
use crate::factory::NodeFactory;
use crate::insert::{self, Inserter, Position};
use crate::stylesheet::{ImportStyleOptions, StyleInjector};
use crate::tree::DocumentTree;
use crate::{Attributes, DomError, PropertySpec};

/// Handles every operation defaults to: `head` receives new stylesheets,
/// `body` is the default insertion target, `scratch` is a detached
/// container that holds the result of [`Dom::parse`].
///
/// `body` is absent while a document is still loading its head; only
/// insertions without an explicit target need it.
#[derive(Debug, Clone, PartialEq)]
pub struct Roots<H> {
    pub head: H,
    pub body: Option<H>,
    pub scratch: H,
}

impl<H> Roots<H> {
    /// Find head and body in `tree` and create a fresh scratch `<div>`.
    ///
    /// A tree without a head falls back to its document element, then to
    /// its body.
    pub fn discover<T>(tree: &mut T) -> Result<Self, DomError>
    where
        T: DocumentTree<Handle = H>,
        H: Clone,
    {
        let body = tree.body();
        let head = tree
            .head()
            .or_else(|| tree.document_element())
            .or_else(|| body.clone())
            .ok_or(DomError::NoHead)?;
        let scratch = tree.create_element("div")?;
        Ok(Self {
            head,
            body,
            scratch,
        })
    }
}

/// A document tree with its modification helpers.
///
/// ```
/// use graft::{ArenaDocument, AttributeSpec, Dom, Position, StyleMap};
///
/// let mut dom = Dom::new(ArenaDocument::new())?;
/// let attrs = AttributeSpec::new()
///     .with("id", "card")
///     .with("style", StyleMap::new().with("width", 100));
/// let card = dom.create("div", Some(attrs.into()), None)?;
/// dom.insert(&card, None, Position::BeforeEnd)?;
///
/// assert_eq!(
///     dom.tree().to_html(),
///     r#"<div id="card" style="width:100px"></div>"#
/// );
/// # Ok::<(), graft::DomError>(())
/// ```
#[derive(Debug)]
pub struct Dom<T: DocumentTree, S = InlineStyle, J = FacetJson, Q = SelectorQuery> {
    tree: T,
    roots: Roots<T::Handle>,
    factory: NodeFactory<S, J>,
    inserter: Inserter<T::Handle>,
    styles: StyleInjector<T::Handle, Q>,
}

impl<T: DocumentTree> Dom<T> {
    /// Bind `tree`, discovering its roots.
    pub fn new(mut tree: T) -> Result<Self, DomError> {
        let roots = Roots::discover(&mut tree)?;
        debug!(?roots, "discovered roots");
        Ok(Self::with_roots(tree, roots))
    }

    /// Bind `tree` with explicitly injected roots.
    pub fn with_roots(tree: T, roots: Roots<T::Handle>) -> Self {
        Self {
            factory: NodeFactory::new(),
            inserter: roots
                .body
                .clone()
                .map_or_else(Inserter::without_body, Inserter::new),
            styles: StyleInjector::new(roots.head.clone()),
            tree,
            roots,
        }
    }
}

impl<T: DocumentTree, S, J, Q> Dom<T, S, J, Q> {
    pub fn with_style_setter<S2>(self, style: S2) -> Dom<T, S2, J, Q> {
        Dom {
            factory: self.factory.with_style_setter(style),
            tree: self.tree,
            roots: self.roots,
            inserter: self.inserter,
            styles: self.styles,
        }
    }

    pub fn with_json<J2>(self, json: J2) -> Dom<T, S, J2, Q> {
        Dom {
            factory: self.factory.with_json(json),
            tree: self.tree,
            roots: self.roots,
            inserter: self.inserter,
            styles: self.styles,
        }
    }

    pub fn with_query<Q2>(self, query: Q2) -> Dom<T, S, J, Q2> {
        Dom {
            styles: self.styles.with_query(query),
            tree: self.tree,
            roots: self.roots,
            factory: self.factory,
            inserter: self.inserter,
        }
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut T {
        &mut self.tree
    }

    pub fn roots(&self) -> &Roots<T::Handle> {
        &self.roots
    }

    pub fn into_tree(self) -> T {
        self.tree
    }

    /// See [`NodeFactory::create`].
    pub fn create(
        &mut self,
        node_name: &str,
        attributes: Option<Attributes>,
        properties: Option<PropertySpec>,
    ) -> Result<T::Handle, DomError>
    where
        S: StyleSetter<T>,
        J: JsonStringify,
    {
        self.factory
            .create(&mut self.tree, node_name, attributes, properties)
    }

    /// See [`Inserter::insert`]. A `None` target means the body root, and
    /// fails with [`DomError::NoBody`] when there is none.
    pub fn insert(
        &mut self,
        source: &T::Handle,
        target: Option<&T::Handle>,
        position: impl Into<Position>,
    ) -> Result<T::Handle, DomError> {
        self.inserter.insert(&mut self.tree, source, target, position)
    }

    pub fn before(
        &mut self,
        source: &T::Handle,
        target: Option<&T::Handle>,
    ) -> Result<T::Handle, DomError> {
        self.inserter.before(&mut self.tree, source, target)
    }

    pub fn prepend(
        &mut self,
        source: &T::Handle,
        target: Option<&T::Handle>,
    ) -> Result<T::Handle, DomError> {
        self.inserter.prepend(&mut self.tree, source, target)
    }

    pub fn append(
        &mut self,
        source: &T::Handle,
        target: Option<&T::Handle>,
    ) -> Result<T::Handle, DomError> {
        self.inserter.append(&mut self.tree, source, target)
    }

    pub fn after(
        &mut self,
        source: &T::Handle,
        target: Option<&T::Handle>,
    ) -> Result<T::Handle, DomError> {
        self.inserter.after(&mut self.tree, source, target)
    }

    pub fn replace(
        &mut self,
        source: &T::Handle,
        target: Option<&T::Handle>,
    ) -> Result<T::Handle, DomError> {
        self.inserter.replace(&mut self.tree, source, target)
    }

    pub fn remove(&mut self, node: &T::Handle) {
        insert::remove(&mut self.tree, node);
    }

    pub fn empty(&mut self, node: &T::Handle) {
        insert::empty(&mut self.tree, node);
    }

    /// See [`StyleInjector::import_style`].
    pub fn import_style(
        &mut self,
        css_text: &str,
        options: ImportStyleOptions<T::Handle>,
    ) -> Result<T::Handle, DomError>
    where
        S: StyleSetter<T>,
        J: JsonStringify,
        Q: Query<T>,
    {
        self.styles.import_style(
            &mut self.tree,
            &self.factory,
            &self.inserter,
            css_text,
            options,
        )
    }

    /// Parse an HTML snippet and return its first top-level element.
    ///
    /// The parsed nodes replace whatever the scratch root held; the returned
    /// element stays there until it is inserted somewhere else. Returns
    /// `None` when the snippet has no element at the top level.
    pub fn parse(&mut self, html: &str) -> Result<Option<T::Handle>, DomError> {
        let scratch = self.roots.scratch.clone();
        insert::empty(&mut self.tree, &scratch);

        let parsed = ArenaDocument::parse(&format!("<body>{html}"));
        let Some(body) = parsed.body() else {
            return Ok(None);
        };
        for child in parsed.child_ids(body) {
            import_node(&mut self.tree, &parsed, child, &scratch)?;
        }
        Ok(self.tree.first_element_child(&scratch))
    }
}

/// Copy `id` from a parsed document into `tree` as the last child of
/// `parent`.
fn import_node<T: DocumentTree>(
    tree: &mut T,
    source: &ArenaDocument,
    id: NodeId,
    parent: &T::Handle,
) -> Result<(), DomError> {
    let node = match &source.get(id).kind {
        NodeKind::Element(elem) => {
            let node = tree.create_element(elem.tag.as_ref())?;
            for (name, value) in &elem.attrs {
                tree.set_attribute(&node, name, value.as_ref())?;
            }
            if !elem.style.is_empty() {
                tree.set_attribute(&node, "style", &render_style_attr(&elem.style))?;
            }
            node
        }
        NodeKind::Text(text) => tree.create_text(text.as_ref()),
        NodeKind::Comment(text) => tree.create_comment(text.as_ref()),
        NodeKind::Document | NodeKind::Fragment => {
            for child in source.child_ids(id) {
                import_node(tree, source, child, parent)?;
            }
            return Ok(());
        }
    };
    tree.append_child(parent, &node)?;
    for child in source.child_ids(id) {
        import_node(tree, source, child, &node)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AttributeSpec, StyleMap};
    use facet_testhelpers::test;

    #[test]
    fn test_new_discovers_roots() {
        let dom = Dom::new(ArenaDocument::new()).unwrap();
        let tree = dom.tree();
        assert_eq!(Some(dom.roots().head), tree.head());
        assert_eq!(dom.roots().body, tree.body());
        assert_eq!(tree.parent(&dom.roots().scratch), None);
        assert_eq!(tree.tag_name(&dom.roots().scratch).as_deref(), Some("div"));
    }

    #[test]
    fn test_bodyless_document_still_creates_and_styles() {
        let mut doc = ArenaDocument::new();
        let body = doc.body().unwrap();
        insert::remove(&mut doc, &body);

        let mut dom = Dom::new(doc).unwrap();
        assert_eq!(dom.roots().body, None);

        let sheet = dom
            .import_style("p{margin:0}", ImportStyleOptions::new())
            .unwrap();
        assert_eq!(dom.tree().parent(&sheet), Some(dom.roots().head));
        assert_eq!(dom.tree().text_content(&sheet), "p{margin:0}");

        let div = dom.create("div", None, None).unwrap();
        assert!(matches!(dom.append(&div, None), Err(DomError::NoBody)));
        assert_eq!(dom.tree().parent(&div), None);

        let head = dom.roots().head;
        dom.append(&div, Some(&head)).unwrap();
        assert_eq!(dom.tree().parent(&div), Some(head));

        let parsed = dom.parse("<em>x</em>").unwrap().unwrap();
        dom.remove(&parsed);
        assert_eq!(dom.tree().parent(&parsed), None);
    }

    #[test]
    fn test_parse_returns_first_element() {
        let mut dom = Dom::new(ArenaDocument::new()).unwrap();
        let node = dom
            .parse(r#"text <p class="a" style="color: red">hi <b>there</b></p><i>2</i>"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            dom.tree().outer_html(node),
            r#"<p class="a" style="color:red">hi <b>there</b></p>"#
        );
        assert_eq!(dom.tree().style_property(&node, "color").as_deref(), Some("red"));
    }

    #[test]
    fn test_parse_without_element() {
        let mut dom = Dom::new(ArenaDocument::new()).unwrap();
        assert_eq!(dom.parse("just text").unwrap(), None);
        assert_eq!(dom.parse("").unwrap(), None);
    }

    #[test]
    fn test_parse_replaces_previous_scratch_content() {
        let mut dom = Dom::new(ArenaDocument::new()).unwrap();
        dom.parse("<a></a><b></b>").unwrap();
        let node = dom.parse("<i></i>").unwrap().unwrap();
        let scratch = dom.roots().scratch;
        assert_eq!(dom.tree().inner_html(scratch), "<i></i>");

        dom.append(&node, None).unwrap();
        assert_eq!(dom.tree().inner_html(scratch), "");
        assert_eq!(dom.tree().to_html(), "<i></i>");
    }

    #[test]
    fn test_facade_end_to_end() {
        let mut dom = Dom::new(ArenaDocument::new()).unwrap();
        let list = dom
            .create("ul", Some(AttributeSpec::new().with("id", "list").into()), None)
            .unwrap();
        dom.append(&list, None).unwrap();
        for label in ["b", "c"] {
            let li = dom.create("li", None, None).unwrap();
            let text = dom.create("#text", Some(label.into()), None).unwrap();
            dom.append(&text, Some(&li)).unwrap();
            dom.append(&li, Some(&list)).unwrap();
        }
        let first = dom.parse("<li>a</li>").unwrap().unwrap();
        dom.prepend(&first, Some(&list)).unwrap();
        assert_eq!(
            dom.tree().to_html(),
            r#"<ul id="list"><li>a</li><li>b</li><li>c</li></ul>"#
        );

        dom.empty(&list);
        assert_eq!(dom.tree().to_html(), r#"<ul id="list"></ul>"#);

        let sheet = dom
            .import_style("ul{margin:0}", ImportStyleOptions::new())
            .unwrap();
        assert_eq!(dom.tree().parent(&sheet), Some(dom.roots().head));
    }

    #[test]
    fn test_with_style_setter_swaps_collaborator() {
        struct Upper;
        impl StyleSetter<ArenaDocument> for Upper {
            fn apply(
                &self,
                tree: &mut ArenaDocument,
                node: &NodeId,
                styles: &StyleMap,
            ) -> Result<(), DomError> {
                for (name, value) in styles.iter() {
                    let upper = value.to_string().to_uppercase();
                    tree.set_style_property(node, name, Some(upper.as_str()))?;
                }
                Ok(())
            }
        }

        let mut dom = Dom::new(ArenaDocument::new()).unwrap().with_style_setter(Upper);
        let attrs = AttributeSpec::new().with("style", StyleMap::new().with("color", "red"));
        let div = dom.create("div", Some(attrs.into()), None).unwrap();
        assert_eq!(dom.tree().style_property(&div, "color").as_deref(), Some("RED"));
    }
}
