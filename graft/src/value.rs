//! Values accepted by the node factory.
//!
//! Attribute values are resolved into an [`AttrValue`] once, when the caller
//! builds an [`AttributeSpec`], so the factory never has to probe a value's
//! shape while materializing a node.

use std::fmt;
use std::rc::Rc;

use facet::Facet;

use crate::DomError;

/// A scalar value: what an attribute is stringified from, and what a
/// property is assigned as-is.
#[derive(Debug, Clone, PartialEq, Facet)]
#[repr(u8)]
pub enum Primitive {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Primitive {
    /// Numeric primitives get a unit suffix when used as a style value.
    pub fn is_number(&self) -> bool {
        matches!(self, Primitive::Int(_) | Primitive::Float(_))
    }

    /// Encode as a JSON fragment.
    pub fn to_json(&self) -> Result<String, DomError> {
        let encoded = match self {
            Primitive::Null => return Ok("null".to_string()),
            Primitive::Bool(b) => facet_json::to_string(b),
            Primitive::Int(i) => facet_json::to_string(i),
            Primitive::Float(f) => facet_json::to_string(f),
            Primitive::Str(s) => facet_json::to_string(s),
        };
        encoded.map_err(|err| DomError::Serialize {
            message: format!("{err:?}"),
        })
    }
}

/// Attribute stringification: integers and whole floats print without a
/// fraction, non-finite floats print as `NaN` / `Infinity`.
impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Null => f.write_str("null"),
            Primitive::Bool(b) => write!(f, "{b}"),
            Primitive::Int(i) => write!(f, "{i}"),
            Primitive::Float(x) if x.is_nan() => f.write_str("NaN"),
            Primitive::Float(x) if x.is_infinite() => {
                f.write_str(if *x > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Primitive::Float(x) if *x == 0.0 => f.write_str("0"),
            // Outside [1e-6, 1e21) numbers print in exponent form, `1e+21`.
            Primitive::Float(x) if x.abs() >= 1e21 || x.abs() < 1e-6 => {
                let exp = format!("{x:e}");
                match exp.split_once('e') {
                    Some((mantissa, power)) if !power.starts_with('-') => {
                        write!(f, "{mantissa}e+{power}")
                    }
                    _ => f.write_str(&exp),
                }
            }
            Primitive::Float(x) => write!(f, "{x}"),
            Primitive::Str(s) => f.write_str(s),
        }
    }
}

macro_rules! impl_primitive_from {
    ($($ty:ty => $variant:ident as $conv:ty),* $(,)?) => {
        $(
            impl From<$ty> for Primitive {
                fn from(value: $ty) -> Self {
                    Primitive::$variant(<$conv>::from(value))
                }
            }
        )*
    };
}

impl_primitive_from! {
    bool => Bool as bool,
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => Int as i64,
    u16 => Int as i64,
    u32 => Int as i64,
    f32 => Float as f64,
    f64 => Float as f64,
    String => Str as String,
    &str => Str as String,
}

impl<T: Into<Primitive>> From<Option<T>> for Primitive {
    fn from(value: Option<T>) -> Self {
        value.map_or(Primitive::Null, Into::into)
    }
}

/// Ordered style declarations, as written by the caller (`fontSize`,
/// `z-index`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleMap {
    entries: Vec<(String, Primitive)>,
}

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration. Later entries for the same name override earlier ones.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Primitive>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Primitive>) {
        let name = name.into();
        let value = value.into();
        if let Some((_, v)) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            *v = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Primitive> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Primitive)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// View this map as a plain object, for use outside the `style` key.
    pub fn to_object(&self) -> ObjectValue {
        let map = self.clone();
        ObjectValue::from_fn(move || {
            let mut out = String::from("{");
            for (i, (name, value)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let key = facet_json::to_string(name).map_err(|err| DomError::Serialize {
                    message: format!("{err:?}"),
                })?;
                out.push_str(&key);
                out.push(':');
                out.push_str(&value.to_json()?);
            }
            out.push('}');
            Ok(out)
        })
    }
}

impl<K, V> FromIterator<(K, V)> for StyleMap
where
    K: Into<String>,
    V: Into<Primitive>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = StyleMap::new();
        for (k, v) in iter {
            map.set(k, v);
        }
        map
    }
}

type Encoder = dyn Fn() -> Result<String, DomError>;

/// An arbitrary value that only becomes text through JSON serialization.
///
/// Encoding is deferred until the factory needs the attribute text, and may
/// fail; the factory substitutes an empty string when it does.
#[derive(Clone)]
pub struct ObjectValue {
    encode: Rc<Encoder>,
}

impl ObjectValue {
    /// Wrap any reflectable value; it is encoded with `facet-json`.
    pub fn new<T>(value: T) -> Self
    where
        T: Facet<'static> + 'static,
    {
        Self::from_fn(move || {
            facet_json::to_string(&value).map_err(|err| DomError::Serialize {
                message: format!("{err:?}"),
            })
        })
    }

    /// Wrap a custom encoder.
    pub fn from_fn(encode: impl Fn() -> Result<String, DomError> + 'static) -> Self {
        Self {
            encode: Rc::new(encode),
        }
    }

    pub fn to_json(&self) -> Result<String, DomError> {
        (self.encode)()
    }
}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ObjectValue(..)")
    }
}

/// The shape of one attribute value.
#[derive(Debug, Clone)]
pub enum AttrValue {
    Primitive(Primitive),
    Style(StyleMap),
    Object(ObjectValue),
}

impl From<StyleMap> for AttrValue {
    fn from(value: StyleMap) -> Self {
        AttrValue::Style(value)
    }
}

impl From<ObjectValue> for AttrValue {
    fn from(value: ObjectValue) -> Self {
        AttrValue::Object(value)
    }
}

impl From<Primitive> for AttrValue {
    fn from(value: Primitive) -> Self {
        AttrValue::Primitive(value)
    }
}

macro_rules! impl_via_primitive {
    ($target:ident: $($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for $target {
                fn from(value: $ty) -> Self {
                    Primitive::from(value).into()
                }
            }
        )*
    };
}

impl_via_primitive!(AttrValue: bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, String, &str);

/// Ordered attribute entries for element creation.
#[derive(Debug, Clone, Default)]
pub struct AttributeSpec {
    entries: Vec<(String, AttrValue)>,
}

impl AttributeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.entries.push((name.into(), value.into()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for AttributeSpec
where
    K: Into<String>,
    V: Into<AttrValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Ordered property assignments, applied after attributes without any
/// stringification.
#[derive(Debug, Clone, Default)]
pub struct PropertySpec {
    entries: Vec<(String, Primitive)>,
}

impl PropertySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Primitive>) -> Self {
        self.entries.push((name.into(), value.into()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Primitive)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for PropertySpec
where
    K: Into<String>,
    V: Into<Primitive>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Second argument of `create`: text content for `#text` / `#comment`, or
/// the attribute map for elements.
#[derive(Debug, Clone)]
pub enum Attributes {
    Content(Primitive),
    Map(AttributeSpec),
}

impl From<AttributeSpec> for Attributes {
    fn from(value: AttributeSpec) -> Self {
        Attributes::Map(value)
    }
}

impl From<Primitive> for Attributes {
    fn from(value: Primitive) -> Self {
        Attributes::Content(value)
    }
}

impl_via_primitive!(Attributes: bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, String, &str);

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    #[test]
    fn test_primitive_stringification() {
        assert_eq!(Primitive::from(100).to_string(), "100");
        assert_eq!(Primitive::from(100.0).to_string(), "100");
        assert_eq!(Primitive::from(1.5).to_string(), "1.5");
        assert_eq!(Primitive::from(-0.0).to_string(), "0");
        assert_eq!(Primitive::from(f64::NAN).to_string(), "NaN");
        assert_eq!(Primitive::from(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Primitive::from(true).to_string(), "true");
        assert_eq!(Primitive::Null.to_string(), "null");
        assert_eq!(Primitive::from("abc").to_string(), "abc");
    }

    #[test]
    fn test_float_exponent_form() {
        assert_eq!(Primitive::from(1e20).to_string(), "100000000000000000000");
        assert_eq!(Primitive::from(1e21).to_string(), "1e+21");
        assert_eq!(Primitive::from(-1.25e25).to_string(), "-1.25e+25");
        assert_eq!(Primitive::from(0.000001).to_string(), "0.000001");
        assert_eq!(Primitive::from(1.5e-7).to_string(), "1.5e-7");
        assert_eq!(Primitive::from(-2e-9).to_string(), "-2e-9");
    }

    #[test]
    fn test_style_map_later_entry_wins() {
        let map = StyleMap::new().with("width", 1).with("height", 2).with("width", 3);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("width"), Some(&Primitive::Int(3)));
    }

    #[test]
    fn test_style_map_as_object() {
        let map = StyleMap::new().with("a", 1).with("b", "x");
        assert_eq!(map.to_object().to_json().unwrap(), r#"{"a":1,"b":"x"}"#);
    }

    #[test]
    fn test_object_value_custom_encoder_failure() {
        let value = ObjectValue::from_fn(|| {
            Err(DomError::Serialize {
                message: "cycle".to_string(),
            })
        });
        assert!(matches!(value.to_json(), Err(DomError::Serialize { .. })));
    }

    #[test]
    fn test_attribute_spec_keeps_order() {
        let spec = AttributeSpec::new()
            .with("id", "x")
            .with("style", StyleMap::new().with("width", 1))
            .with("data-n", 3);
        let names: Vec<_> = spec.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["id", "style", "data-n"]);
        assert!(matches!(spec.iter().nth(1), Some((_, AttrValue::Style(_)))));
    }
}
