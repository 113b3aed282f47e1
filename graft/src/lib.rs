//! Declarative node construction and positional insertion over a host
//! document tree.
//!
//! graft provides:
//! - **Node factory**: elements, text, comments and fragments from a name,
//!   an attribute spec and a property spec
//! - **Positional insertion**: `beforebegin` / `afterbegin` / `beforeend` /
//!   `afterend` / `replace` relative to a target node
//! - **Stylesheet injection**: create or extend a `<style>` element in the head
//! - **Arena host**: an in-memory [`DocumentTree`] parsed with html5ever
//!
//! # Example
//!
//! ```rust
//! use graft::{ArenaDocument, DocumentTree, Dom, ImportStyleOptions};
//!
//! let doc = ArenaDocument::parse("<html><body><p id=\"a\">a</p></body></html>");
//! let mut dom = Dom::new(doc)?;
//!
//! // Parse a snippet and put it before the first paragraph
//! let first = dom.tree().first_element_child(&dom.roots().body.unwrap()).unwrap();
//! let note = dom.parse("<em>note</em>")?.unwrap();
//! dom.insert(&note, Some(&first), "beforebegin")?;
//!
//! // Position tokens and indices are interchangeable
//! let tail = dom.create("#text", Some("!".into()), None)?;
//! dom.insert(&tail, Some(&first), 3_usize)?;
//!
//! assert_eq!(dom.tree().to_html(), r#"<em>note</em><p id="a">a</p>!"#);
//!
//! // Stylesheets land at the end of <head>
//! let sheet = dom.import_style("p{color:red}", ImportStyleOptions::new())?;
//! dom.import_style("em{color:blue}", ImportStyleOptions::node(sheet).appending())?;
//! assert_eq!(dom.tree().text_content(&sheet), "p{color:red}em{color:blue}");
//! # Ok::<(), graft::DomError>(())
//! ```

#[macro_use]
mod tracing_macros;

pub mod arena;
pub mod collab;
pub mod dom;
mod error;
pub mod factory;
pub mod insert;
pub mod selector;
pub mod stylesheet;
pub mod tree;
mod value;

pub use arena::{ArenaDocument, SerializeOptions, parse};
pub use collab::{FacetJson, InlineStyle, JsonStringify, Query, SelectorQuery, StyleSetter};
pub use dom::{Dom, Roots};
pub use error::DomError;
pub use factory::NodeFactory;
pub use insert::{Inserter, Position, empty, remove};
pub use stylesheet::{ImportStyleOptions, SheetRef, StyleInjector};
pub use tree::{DocumentTree, NodeType};
pub use value::{
    AttrValue, AttributeSpec, Attributes, ObjectValue, Primitive, PropertySpec, StyleMap,
};

// Re-export for hosts and tests that build tendrils directly
pub use tendril::StrTendril;
