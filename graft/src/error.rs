//! Errors surfaced by host trees and the modification layer.

use facet::Facet;

/// Errors that can occur while building or mutating a document tree.
///
/// Most of these come straight from a host's primitives; the modification
/// layer itself only swallows them (in `remove`) or passes them through.
#[derive(Facet, Debug)]
#[facet(derive(Error))]
#[repr(u8)]
pub enum DomError {
    /// no body element found in document
    NoBody,

    /// no head, document element or body found in document
    NoHead,

    /// invalid tag name `{name}`
    InvalidTagName { name: String },

    /// unknown insert position `{token}`
    InvalidPosition { token: String },

    /// unsupported selector `{selector}`
    InvalidSelector { selector: String },

    /// node is not a child of the given parent
    NotAChild,

    /// node cannot be inserted at this location in the tree
    HierarchyRequest,

    /// node was removed from the tree
    NodeRemoved,

    /// node is not an element
    NotAnElement,

    /// serialization failed: {message}
    Serialize { message: String },

    /// host error: {message}
    Host { message: String },
}

impl From<indextree::NodeError> for DomError {
    fn from(err: indextree::NodeError) -> Self {
        match err {
            indextree::NodeError::Removed => DomError::NodeRemoved,
            _ => DomError::HierarchyRequest,
        }
    }
}
