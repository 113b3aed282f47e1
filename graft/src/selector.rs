//! A small CSS selector subset: type, universal, `#id`, `.class`, `[attr]`
//! and `[attr=value]` compounds, joined by descendant or child combinators,
//! in comma-separated groups.

use smallvec::SmallVec;
use std::str::FromStr;

use crate::DomError;
use crate::tree::DocumentTree;

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    groups: Vec<Complex>,
}

/// Compounds joined by combinators, left to right. The combinator stored
/// with a compound relates it to the compound before it.
#[derive(Debug, Clone, PartialEq)]
struct Complex {
    parts: Vec<(Combinator, Compound)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    universal: bool,
    id: Option<String>,
    classes: SmallVec<[String; 2]>,
    attrs: SmallVec<[AttrCondition; 1]>,
}

#[derive(Debug, Clone, PartialEq)]
enum AttrCondition {
    Exists(String),
    Equals(String, String),
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && !self.universal
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
    }

    fn matches<T: DocumentTree>(&self, tree: &T, node: &T::Handle) -> bool {
        let Some(tag) = tree.tag_name(node) else {
            return false;
        };
        if let Some(want) = &self.tag
            && !tag.eq_ignore_ascii_case(want)
        {
            return false;
        }
        if let Some(id) = &self.id
            && tree.attribute(node, "id").as_deref() != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.is_empty() {
            let class = tree.attribute(node, "class").unwrap_or_default();
            if !self
                .classes
                .iter()
                .all(|want| class.split_whitespace().any(|c| c == want))
            {
                return false;
            }
        }
        self.attrs.iter().all(|cond| match cond {
            AttrCondition::Exists(name) => tree.attribute(node, name).is_some(),
            AttrCondition::Equals(name, value) => {
                tree.attribute(node, name).as_deref() == Some(value.as_str())
            }
        })
    }
}

impl Selector {
    /// Whether `node` matches any group of this selector.
    pub fn matches<T: DocumentTree>(&self, tree: &T, node: &T::Handle) -> bool {
        self.groups
            .iter()
            .any(|complex| matches_from(tree, node, &complex.parts))
    }
}

/// Right-to-left match of `parts` with the last compound anchored on `node`.
fn matches_from<T: DocumentTree>(
    tree: &T,
    node: &T::Handle,
    parts: &[(Combinator, Compound)],
) -> bool {
    let Some(((combinator, compound), rest)) = parts.split_last() else {
        return true;
    };
    if !compound.matches(tree, node) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }
    match combinator {
        Combinator::Child => tree
            .parent(node)
            .is_some_and(|parent| matches_from(tree, &parent, rest)),
        Combinator::Descendant => {
            let mut cursor = tree.parent(node);
            while let Some(ancestor) = cursor {
                if matches_from(tree, &ancestor, rest) {
                    return true;
                }
                cursor = tree.parent(&ancestor);
            }
            false
        }
    }
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomError::InvalidSelector {
            selector: s.to_owned(),
        };
        let mut parser = Parser {
            chars: s.char_indices().peekable(),
            src: s,
        };
        let mut groups = Vec::new();
        loop {
            groups.push(parser.complex().ok_or_else(invalid)?);
            parser.skip_whitespace();
            match parser.chars.next() {
                None => break,
                Some((_, ',')) => continue,
                Some(_) => return Err(invalid()),
            }
        }
        Ok(Selector { groups })
    }
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    src: &'a str,
}

impl Parser<'_> {
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self.peek().is_some_and(char::is_whitespace) {
            self.chars.next();
            skipped = true;
        }
        skipped
    }

    fn complex(&mut self) -> Option<Complex> {
        self.skip_whitespace();
        let mut parts = vec![(Combinator::Descendant, self.compound()?)];
        loop {
            let spaced = self.skip_whitespace();
            let combinator = match self.peek() {
                Some('>') => {
                    self.chars.next();
                    self.skip_whitespace();
                    Combinator::Child
                }
                Some(',') | None => break,
                Some(_) if spaced => Combinator::Descendant,
                Some(_) => return None,
            };
            parts.push((combinator, self.compound()?));
        }
        Some(Complex { parts })
    }

    fn compound(&mut self) -> Option<Compound> {
        let mut compound = Compound::default();
        while let Some(c) = self.peek() {
            match c {
                '*' => {
                    self.chars.next();
                    if compound.universal || compound.tag.is_some() {
                        return None;
                    }
                    compound.universal = true;
                }
                '#' => {
                    self.chars.next();
                    let id = self.ident()?;
                    if compound.id.replace(id).is_some() {
                        return None;
                    }
                }
                '.' => {
                    self.chars.next();
                    compound.classes.push(self.ident()?);
                }
                '[' => {
                    self.chars.next();
                    compound.attrs.push(self.attr_condition()?);
                }
                c if is_ident_char(c) => {
                    if !compound.is_empty() {
                        return None;
                    }
                    compound.tag = Some(self.ident()?.to_ascii_lowercase());
                }
                _ => break,
            }
        }
        (!compound.is_empty()).then_some(compound)
    }

    fn ident(&mut self) -> Option<String> {
        let start = self.chars.peek()?.0;
        let mut end = start;
        while let Some(&(i, c)) = self.chars.peek() {
            if !is_ident_char(c) {
                break;
            }
            end = i + c.len_utf8();
            self.chars.next();
        }
        (end > start).then(|| self.src[start..end].to_owned())
    }

    /// After `[`: `name]` or `name=value]`, value optionally quoted.
    fn attr_condition(&mut self) -> Option<AttrCondition> {
        self.skip_whitespace();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_whitespace();
        match self.chars.next()?.1 {
            ']' => Some(AttrCondition::Exists(name)),
            '=' => {
                self.skip_whitespace();
                let value = match self.peek()? {
                    quote @ ('"' | '\'') => {
                        self.chars.next();
                        let mut value = String::new();
                        loop {
                            let (_, c) = self.chars.next()?;
                            if c == quote {
                                break;
                            }
                            value.push(c);
                        }
                        value
                    }
                    _ => self.ident()?,
                };
                self.skip_whitespace();
                (self.chars.next()?.1 == ']').then_some(AttrCondition::Equals(name, value))
            }
            _ => None,
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::parse;
    use facet_testhelpers::test;

    fn first_match(html: &str, selector: &str) -> Option<String> {
        let doc = parse(html);
        let selector: Selector = selector.parse().unwrap();
        let root = doc.document_element().unwrap();
        doc.elements(&root)
            .into_iter()
            .find(|n| selector.matches(&doc, n))
            .map(|n| doc.outer_html(n))
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", " ", "div >", "> div", "a,,b", "#", ".", "[x", "[x=]", "div:hover", "p*"] {
            assert!(bad.parse::<Selector>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_parse_accepts_supported_forms() {
        for good in [
            "style",
            "*",
            "#main",
            "div.a.b",
            "[data-x]",
            "[type=text]",
            "[title='a b']",
            "head > style",
            "body div  span",
            "style, link",
        ] {
            assert!(good.parse::<Selector>().is_ok(), "{good:?} should parse");
        }
    }

    #[test]
    fn test_compound_matching() {
        let html = r#"<html><body><p class="x">1</p><p class="x y" id="two">2</p></body></html>"#;
        assert_eq!(
            first_match(html, "p.y").as_deref(),
            Some(r#"<p class="x y" id="two">2</p>"#)
        );
        assert_eq!(
            first_match(html, "#two").as_deref(),
            Some(r#"<p class="x y" id="two">2</p>"#)
        );
        assert_eq!(
            first_match(html, "[class='x']").as_deref(),
            Some(r#"<p class="x">1</p>"#)
        );
        assert_eq!(first_match(html, "span"), None);
    }

    #[test]
    fn test_combinators() {
        let html =
            "<html><body><div><section><b>deep</b></section><b>shallow</b></div></body></html>";
        assert_eq!(
            first_match(html, "div > b").as_deref(),
            Some("<b>shallow</b>")
        );
        assert_eq!(first_match(html, "div b").as_deref(), Some("<b>deep</b>"));
        assert_eq!(first_match(html, "body > b"), None);
    }

    #[test]
    fn test_groups() {
        let html = "<html><body><i>1</i><b>2</b></body></html>";
        assert_eq!(first_match(html, "b, i").as_deref(), Some("<i>1</i>"));
    }
}
