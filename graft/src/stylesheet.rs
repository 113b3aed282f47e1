//! Stylesheet injection: write CSS text into an existing `<style>` element,
//! or create one at the end of the head root.

use std::fmt;

use crate::DomError;
use crate::collab::{JsonStringify, Query, SelectorQuery, StyleSetter};
use crate::factory::NodeFactory;
use crate::insert::{Inserter, Position};
use crate::tree::DocumentTree;

/// Which stylesheet element to write into.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetRef<H> {
    /// Resolved through the [`Query`] collaborator; no match means a new
    /// sheet is created.
    Selector(String),
    Node(H),
}

impl<H> From<&str> for SheetRef<H> {
    fn from(selector: &str) -> Self {
        SheetRef::Selector(selector.to_owned())
    }
}

impl<H> From<String> for SheetRef<H> {
    fn from(selector: String) -> Self {
        SheetRef::Selector(selector)
    }
}

/// Options for [`StyleInjector::import_style`].
#[derive(Debug, Clone)]
pub struct ImportStyleOptions<H> {
    pub sheet: Option<SheetRef<H>>,
    /// Append to the sheet's current text instead of replacing it.
    pub append: bool,
}

impl<H> Default for ImportStyleOptions<H> {
    fn default() -> Self {
        Self {
            sheet: None,
            append: false,
        }
    }
}

impl<H> ImportStyleOptions<H> {
    /// Replace mode, fresh sheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append mode, fresh sheet.
    pub fn append() -> Self {
        Self::new().appending()
    }

    /// Replace mode, into `sheet`.
    pub fn sheet(sheet: impl Into<SheetRef<H>>) -> Self {
        Self {
            sheet: Some(sheet.into()),
            append: false,
        }
    }

    pub fn node(node: H) -> Self {
        Self::sheet(SheetRef::Node(node))
    }

    pub fn appending(mut self) -> Self {
        self.append = true;
        self
    }
}

impl<H> From<SheetRef<H>> for ImportStyleOptions<H> {
    fn from(sheet: SheetRef<H>) -> Self {
        Self::sheet(sheet)
    }
}

/// Writes CSS text into stylesheet elements.
#[derive(Debug, Clone)]
pub struct StyleInjector<H, Q = SelectorQuery> {
    head: H,
    query: Q,
}

impl<H> StyleInjector<H> {
    pub fn new(head: H) -> Self {
        Self {
            head,
            query: SelectorQuery,
        }
    }
}

impl<H: Clone + PartialEq + fmt::Debug, Q> StyleInjector<H, Q> {
    pub fn with_query<Q2>(self, query: Q2) -> StyleInjector<H, Q2> {
        StyleInjector {
            head: self.head,
            query,
        }
    }

    pub fn head(&self) -> &H {
        &self.head
    }

    /// Resolve the sheet named by `options` (creating a `<style>` at the end
    /// of the head root when nothing resolves), then replace or extend its
    /// text with `css_text`. Returns the sheet.
    pub fn import_style<T, S, J>(
        &self,
        tree: &mut T,
        factory: &NodeFactory<S, J>,
        inserter: &Inserter<H>,
        css_text: &str,
        options: ImportStyleOptions<H>,
    ) -> Result<H, DomError>
    where
        T: DocumentTree<Handle = H>,
        Q: Query<T>,
        S: StyleSetter<T>,
        J: JsonStringify,
    {
        let resolved = match options.sheet {
            Some(SheetRef::Node(node)) => Some(node),
            Some(SheetRef::Selector(selector)) => self.query.query(tree, &selector),
            None => None,
        };

        let sheet = match resolved {
            Some(sheet) => sheet,
            None => {
                trace!(head = ?self.head, "creating stylesheet");
                let style = factory.create(tree, "style", None, None)?;
                inserter.insert(tree, &style, Some(&self.head), Position::BeforeEnd)?
            }
        };

        let text = if options.append {
            let mut text = tree.text_content(&sheet);
            text.push_str(css_text);
            text
        } else {
            css_text.to_owned()
        };
        tree.set_text_content(&sheet, &text)?;
        Ok(sheet)
    }
}
