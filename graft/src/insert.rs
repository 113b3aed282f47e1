//! Positional insertion relative to a reference node.
//!
//! ```text
//! <-- beforebegin (0)
//! <target>
//!     <-- afterbegin (1)
//!     ...
//!     <-- beforeend (2)
//! </target>
//! <-- afterend (3)
//! ```
//!
//! `replace` (4) is "afterend, then remove the target".

use std::fmt;
use std::str::FromStr;

use crate::DomError;
use crate::tree::DocumentTree;

/// Where a source node lands relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Position {
    BeforeBegin,
    AfterBegin,
    #[default]
    BeforeEnd,
    AfterEnd,
    Replace,
}

impl Position {
    pub const ALL: [Position; 5] = [
        Position::BeforeBegin,
        Position::AfterBegin,
        Position::BeforeEnd,
        Position::AfterEnd,
        Position::Replace,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Position::BeforeBegin => "beforebegin",
            Position::AfterBegin => "afterbegin",
            Position::BeforeEnd => "beforeend",
            Position::AfterEnd => "afterend",
            Position::Replace => "replace",
        }
    }

    /// Case-insensitive; `before-begin` and `before_begin` are accepted too.
    fn from_token(token: &str) -> Option<Self> {
        let normalized: String = token
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|position| position.as_str() == normalized)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse: unknown tokens are an error.
impl FromStr for Position {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| DomError::InvalidPosition {
            token: s.to_owned(),
        })
    }
}

/// Lenient: out-of-range indices fall back to [`Position::BeforeEnd`].
impl From<usize> for Position {
    fn from(index: usize) -> Self {
        Self::from_index(index).unwrap_or_default()
    }
}

/// Lenient: unknown tokens fall back to [`Position::BeforeEnd`].
impl From<&str> for Position {
    fn from(token: &str) -> Self {
        Self::from_token(token).unwrap_or_default()
    }
}

impl<P: Into<Position>> From<Option<P>> for Position {
    fn from(position: Option<P>) -> Self {
        position.map(Into::into).unwrap_or_default()
    }
}

/// Inserts nodes at a [`Position`] relative to a target, defaulting the
/// target to the body root it was constructed with.
#[derive(Debug, Clone)]
pub struct Inserter<H> {
    body: Option<H>,
}

impl<H: Clone + PartialEq + fmt::Debug> Inserter<H> {
    pub fn new(body: H) -> Self {
        Self { body: Some(body) }
    }

    /// An inserter for a document with no body yet: every call must name
    /// its target.
    pub fn without_body() -> Self {
        Self { body: None }
    }

    pub fn body(&self) -> Option<&H> {
        self.body.as_ref()
    }

    /// Insert `source` relative to `target` (the body root when `None`) and
    /// return `source`.
    ///
    /// `BeforeBegin`, `AfterEnd` and `Replace` need the target to have a
    /// parent; without one they do nothing. A `None` target with no body
    /// root fails with [`DomError::NoBody`].
    pub fn insert<T>(
        &self,
        tree: &mut T,
        source: &H,
        target: Option<&H>,
        position: impl Into<Position>,
    ) -> Result<H, DomError>
    where
        T: DocumentTree<Handle = H>,
    {
        let position = position.into();
        let target = target.or(self.body.as_ref()).ok_or(DomError::NoBody)?;
        trace!(%position, ?source, ?target, "insert");

        match position {
            Position::BeforeBegin => match tree.parent(target) {
                Some(parent) => tree.insert_before(&parent, source, target)?,
                None => debug!(?target, "beforebegin: target has no parent, skipped"),
            },
            Position::AfterBegin => match tree.first_child(target) {
                Some(first) => tree.insert_before(target, source, &first)?,
                None => tree.append_child(target, source)?,
            },
            Position::BeforeEnd => tree.append_child(target, source)?,
            Position::AfterEnd => match tree.parent(target) {
                Some(parent) => match tree.next_sibling(target) {
                    Some(next) => tree.insert_before(&parent, source, &next)?,
                    None => tree.append_child(&parent, source)?,
                },
                None => debug!(?target, "afterend: target has no parent, skipped"),
            },
            Position::Replace => {
                self.insert(tree, source, Some(target), Position::AfterEnd)?;
                remove(tree, target);
            }
        }
        Ok(source.clone())
    }

    pub fn before<T>(&self, tree: &mut T, source: &H, target: Option<&H>) -> Result<H, DomError>
    where
        T: DocumentTree<Handle = H>,
    {
        self.insert(tree, source, target, Position::BeforeBegin)
    }

    pub fn prepend<T>(&self, tree: &mut T, source: &H, target: Option<&H>) -> Result<H, DomError>
    where
        T: DocumentTree<Handle = H>,
    {
        self.insert(tree, source, target, Position::AfterBegin)
    }

    pub fn append<T>(&self, tree: &mut T, source: &H, target: Option<&H>) -> Result<H, DomError>
    where
        T: DocumentTree<Handle = H>,
    {
        self.insert(tree, source, target, Position::BeforeEnd)
    }

    pub fn after<T>(&self, tree: &mut T, source: &H, target: Option<&H>) -> Result<H, DomError>
    where
        T: DocumentTree<Handle = H>,
    {
        self.insert(tree, source, target, Position::AfterEnd)
    }

    pub fn replace<T>(&self, tree: &mut T, source: &H, target: Option<&H>) -> Result<H, DomError>
    where
        T: DocumentTree<Handle = H>,
    {
        self.insert(tree, source, target, Position::Replace)
    }
}

/// Detach `node` from its parent, if it has one. Never fails: host errors
/// are logged and dropped.
pub fn remove<T: DocumentTree>(tree: &mut T, node: &T::Handle) {
    let Some(parent) = tree.parent(node) else {
        return;
    };
    if let Err(_err) = tree.remove_child(&parent, node) {
        debug!(?node, error = %_err, "remove failed, ignored");
    }
}

/// Remove every child of `node`, first to last.
pub fn empty<T: DocumentTree>(tree: &mut T, node: &T::Handle) {
    while let Some(first) = tree.first_child(node) {
        remove(tree, &first);
        if tree.first_child(node).as_ref() == Some(&first) {
            debug!(?node, "first child could not be removed, stopping");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    #[test]
    fn test_position_index_round_trip() {
        for (i, position) in Position::ALL.into_iter().enumerate() {
            assert_eq!(position.index(), i);
            assert_eq!(Position::from(i), position);
        }
        assert_eq!(Position::from(5_usize), Position::BeforeEnd);
        assert_eq!(Position::from(usize::MAX), Position::BeforeEnd);
    }

    #[test]
    fn test_position_aliases() {
        for token in [
            "beforebegin",
            "BeforeBegin",
            "before-begin",
            "BEFORE_BEGIN",
            " beforebegin ",
        ] {
            assert_eq!(token.parse::<Position>().unwrap(), Position::BeforeBegin);
        }
        assert_eq!(Position::from("REPLACE"), Position::Replace);
        assert_eq!(Position::from("after-end"), Position::AfterEnd);
    }

    #[test]
    fn test_unknown_position_token() {
        assert_eq!(Position::from("sideways"), Position::BeforeEnd);
        assert_eq!(Position::from(""), Position::BeforeEnd);
        let err = "sideways".parse::<Position>().unwrap_err();
        assert!(matches!(err, DomError::InvalidPosition { ref token } if token == "sideways"));
    }

    #[test]
    fn test_absent_position_defaults_to_before_end() {
        assert_eq!(Position::from(None::<usize>), Position::BeforeEnd);
        assert_eq!(Position::from(Some("afterbegin")), Position::AfterBegin);
        assert_eq!(Position::default().to_string(), "beforeend");
    }
}
