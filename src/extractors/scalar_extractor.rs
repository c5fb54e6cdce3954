//! Scalar extraction: int, long, float, double, boolean and string
//!
//! Each kind selects the first match, reads text or an attribute, then
//! coerces the string. A miss at any step yields `None` and the caller keeps
//! the field's default.

use std::fmt;
use std::str::FromStr;

use scraper::ElementRef;
use serde_json::{Number, Value};
use tracing::trace;

use crate::config::CoercionPolicy;
use crate::decoder::DecodeContext;
use crate::error::DecodeError;
use crate::schema::FieldMeta;

use super::css_extractor::{extract_leaf, read_leaf};

/// The scalar kinds a field or list element may have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Int,
    Long,
    Float,
    Double,
    Bool,
    Str,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::Int => "int",
            ScalarKind::Long => "long",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
            ScalarKind::Bool => "boolean",
            ScalarKind::Str => "string",
        };
        f.write_str(name)
    }
}

impl FromStr for ScalarKind {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" => Ok(ScalarKind::Int),
            "long" => Ok(ScalarKind::Long),
            "float" => Ok(ScalarKind::Float),
            "double" => Ok(ScalarKind::Double),
            "bool" | "boolean" => Ok(ScalarKind::Bool),
            "string" | "str" => Ok(ScalarKind::Str),
            _ => Err(DecodeError::UnsupportedType(s.to_string())),
        }
    }
}

impl ScalarKind {
    /// Zero value as JSON
    pub fn zero(self) -> Value {
        match self {
            ScalarKind::Int | ScalarKind::Long => Value::from(0),
            ScalarKind::Float | ScalarKind::Double => Value::from(0.0),
            ScalarKind::Bool => Value::Bool(false),
            ScalarKind::Str => Value::String(String::new()),
        }
    }

    /// Select, read and coerce a field of this kind into JSON
    ///
    /// Non-finite floats have no JSON form and count as a coercion miss.
    pub fn extract_value(
        self,
        node: ElementRef<'_>,
        field: &FieldMeta,
        ctx: &DecodeContext<'_>,
    ) -> Result<Option<Value>, DecodeError> {
        match self {
            ScalarKind::Int => Ok(extract_int(node, field, ctx)?.map(Value::from)),
            ScalarKind::Long => Ok(extract_long(node, field, ctx)?.map(Value::from)),
            ScalarKind::Float => match extract_float(node, field, ctx)? {
                Some(value) => finite_value(f64::from(value), self, field, ctx),
                None => Ok(None),
            },
            ScalarKind::Double => match extract_double(node, field, ctx)? {
                Some(value) => finite_value(value, self, field, ctx),
                None => Ok(None),
            },
            ScalarKind::Bool => Ok(extract_bool(node, field, ctx)?.map(Value::from)),
            ScalarKind::Str => Ok(extract_string(node, field, ctx).map(Value::from)),
        }
    }

    /// Read and coerce an already matched element into JSON
    pub fn value_at(
        self,
        element: ElementRef<'_>,
        field: &FieldMeta,
        ctx: &DecodeContext<'_>,
    ) -> Result<Value, DecodeError> {
        let float = match self {
            ScalarKind::Int => return Ok(Value::from(scalar_at::<i32>(element, field, ctx)?)),
            ScalarKind::Long => return Ok(Value::from(scalar_at::<i64>(element, field, ctx)?)),
            ScalarKind::Bool => return Ok(Value::from(scalar_at::<bool>(element, field, ctx)?)),
            ScalarKind::Str => return Ok(Value::from(scalar_at::<String>(element, field, ctx)?)),
            ScalarKind::Float => f64::from(scalar_at::<f32>(element, field, ctx)?),
            ScalarKind::Double => scalar_at::<f64>(element, field, ctx)?,
        };
        Ok(finite_value(float, self, field, ctx)?.unwrap_or_else(|| self.zero()))
    }
}

/// JSON number for `value`, with NaN and infinities handled like malformed text
fn finite_value(
    value: f64,
    kind: ScalarKind,
    field: &FieldMeta,
    ctx: &DecodeContext<'_>,
) -> Result<Option<Value>, DecodeError> {
    if let Some(number) = Number::from_f64(value) {
        return Ok(Some(Value::Number(number)));
    }
    match ctx.config().coercion {
        CoercionPolicy::Lenient => {
            trace!("Field {}: {} has no JSON representation", field.name, value);
            Ok(None)
        }
        CoercionPolicy::Strict => Err(DecodeError::Coercion {
            field: field.name.clone(),
            kind,
            raw: value.to_string(),
        }),
    }
}

/// A leaf type that can be parsed out of text
pub trait Scalar: Default + fmt::Debug + Send + Sync + 'static {
    const KIND: ScalarKind;

    /// `None` when the text is not a valid value
    fn coerce(raw: &str) -> Option<Self>;
}

impl Scalar for i32 {
    const KIND: ScalarKind = ScalarKind::Int;

    fn coerce(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

impl Scalar for i64 {
    const KIND: ScalarKind = ScalarKind::Long;

    fn coerce(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

impl Scalar for f32 {
    const KIND: ScalarKind = ScalarKind::Float;

    fn coerce(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

impl Scalar for f64 {
    const KIND: ScalarKind = ScalarKind::Double;

    fn coerce(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

impl Scalar for bool {
    const KIND: ScalarKind = ScalarKind::Bool;

    fn coerce(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("true") {
            Some(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }
}

impl Scalar for String {
    const KIND: ScalarKind = ScalarKind::Str;

    fn coerce(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

/// Coerce a raw string, applying the configured policy on failure
pub(crate) fn coerce<V: Scalar>(
    raw: String,
    field: &FieldMeta,
    ctx: &DecodeContext<'_>,
) -> Result<Option<V>, DecodeError> {
    if let Some(value) = V::coerce(&raw) {
        return Ok(Some(value));
    }
    match ctx.config().coercion {
        CoercionPolicy::Lenient => {
            trace!("Field {}: {:?} is not a valid {}", field.name, raw, V::KIND);
            Ok(None)
        }
        CoercionPolicy::Strict => Err(DecodeError::Coercion {
            field: field.name.clone(),
            kind: V::KIND,
            raw,
        }),
    }
}

/// Shared path for every scalar kind
pub fn extract_scalar<V: Scalar>(
    node: ElementRef<'_>,
    field: &FieldMeta,
    ctx: &DecodeContext<'_>,
) -> Result<Option<V>, DecodeError> {
    match extract_leaf(node, field, ctx) {
        Some(raw) => coerce(raw, field, ctx),
        None => Ok(None),
    }
}

/// Read one already matched element; misses become the zero value
pub(crate) fn scalar_at<V: Scalar>(
    element: ElementRef<'_>,
    field: &FieldMeta,
    ctx: &DecodeContext<'_>,
) -> Result<V, DecodeError> {
    let value = match read_leaf(element, field, ctx) {
        Some(raw) => coerce(raw, field, ctx)?,
        None => None,
    };
    Ok(value.unwrap_or_default())
}

pub fn extract_int(
    node: ElementRef<'_>,
    field: &FieldMeta,
    ctx: &DecodeContext<'_>,
) -> Result<Option<i32>, DecodeError> {
    extract_scalar(node, field, ctx)
}

pub fn extract_long(
    node: ElementRef<'_>,
    field: &FieldMeta,
    ctx: &DecodeContext<'_>,
) -> Result<Option<i64>, DecodeError> {
    extract_scalar(node, field, ctx)
}

pub fn extract_float(
    node: ElementRef<'_>,
    field: &FieldMeta,
    ctx: &DecodeContext<'_>,
) -> Result<Option<f32>, DecodeError> {
    extract_scalar(node, field, ctx)
}

pub fn extract_double(
    node: ElementRef<'_>,
    field: &FieldMeta,
    ctx: &DecodeContext<'_>,
) -> Result<Option<f64>, DecodeError> {
    extract_scalar(node, field, ctx)
}

pub fn extract_bool(
    node: ElementRef<'_>,
    field: &FieldMeta,
    ctx: &DecodeContext<'_>,
) -> Result<Option<bool>, DecodeError> {
    extract_scalar(node, field, ctx)
}

/// Strings never fail coercion, so this cannot error
pub fn extract_string(
    node: ElementRef<'_>,
    field: &FieldMeta,
    ctx: &DecodeContext<'_>,
) -> Option<String> {
    extract_leaf(node, field, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecoderConfig;
    use crate::decoder::Decoder;
    use proptest::prelude::*;
    use scraper::Html;

    fn meta(query: &str) -> FieldMeta {
        FieldMeta::compile("value", query, None).unwrap()
    }

    #[test]
    fn test_numeric_kinds() {
        let html = r#"
        <div class="stats">
            <span class="n"> 42 </span>
            <span class="big">9000000000</span>
            <span class="ratio">0.25</span>
            <span class="neg" data-v="-3">x</span>
        </div>
        "#;
        let document = Html::parse_document(html);
        let decoder = Decoder::new();
        let ctx = decoder.context();
        let root = document.root_element();

        assert_eq!(extract_int(root, &meta("span.n"), &ctx).unwrap(), Some(42));
        assert_eq!(extract_long(root, &meta("span.big"), &ctx).unwrap(), Some(9_000_000_000));
        assert_eq!(extract_float(root, &meta("span.ratio"), &ctx).unwrap(), Some(0.25));
        assert_eq!(extract_double(root, &meta("span.ratio"), &ctx).unwrap(), Some(0.25));
        assert_eq!(extract_int(root, &meta("span.neg @data-v"), &ctx).unwrap(), Some(-3));
        // Too large for i32
        assert_eq!(extract_int(root, &meta("span.big"), &ctx).unwrap(), None);
        assert_eq!(extract_int(root, &meta("span.missing"), &ctx).unwrap(), None);
    }

    #[test]
    fn test_bool_and_string() {
        let html = r#"<p class="a">TRUE</p><p class="b">false</p><p class="c">yes</p>"#;
        let document = Html::parse_fragment(html);
        let decoder = Decoder::new();
        let ctx = decoder.context();
        let root = document.root_element();

        assert_eq!(extract_bool(root, &meta("p.a"), &ctx).unwrap(), Some(true));
        assert_eq!(extract_bool(root, &meta("p.b"), &ctx).unwrap(), Some(false));
        assert_eq!(extract_bool(root, &meta("p.c"), &ctx).unwrap(), None);
        assert_eq!(extract_string(root, &meta("p.c"), &ctx), Some("yes".to_string()));
    }

    #[test]
    fn test_strict_policy() {
        let document = Html::parse_fragment(r#"<span class="t">five</span>"#);
        let decoder = Decoder::with_config(DecoderConfig::strict()).unwrap();
        let ctx = decoder.context();

        match extract_int(document.root_element(), &meta("span.t"), &ctx) {
            Err(DecodeError::Coercion { field, kind, raw }) => {
                assert_eq!(field, "value");
                assert_eq!(kind, ScalarKind::Int);
                assert_eq!(raw, "five");
            }
            other => panic!("expected Coercion, got {:?}", other),
        }
        // No match is still a soft miss
        assert_eq!(extract_int(document.root_element(), &meta("span.x"), &ctx).unwrap(), None);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!("integer".parse::<ScalarKind>().unwrap(), ScalarKind::Int);
        assert_eq!("Boolean".parse::<ScalarKind>().unwrap(), ScalarKind::Bool);
        assert!(matches!(
            "date".parse::<ScalarKind>(),
            Err(DecodeError::UnsupportedType(name)) if name == "date"
        ));
        assert_eq!(ScalarKind::Double.to_string(), "double");
        assert_eq!(ScalarKind::Str.zero(), Value::String(String::new()));
    }

    #[test]
    fn test_extract_value() {
        let document = Html::parse_fragment(r#"<b>7</b><i>oops</i>"#);
        let decoder = Decoder::new();
        let ctx = decoder.context();
        let root = document.root_element();

        assert_eq!(
            ScalarKind::Long.extract_value(root, &meta("b"), &ctx).unwrap(),
            Some(Value::from(7))
        );
        assert_eq!(ScalarKind::Long.extract_value(root, &meta("i"), &ctx).unwrap(), None);
        let i = root.select(&meta("i").selector).next().unwrap();
        assert_eq!(ScalarKind::Int.value_at(i, &meta("i"), &ctx).unwrap(), Value::from(0));
    }

    proptest! {
        #[test]
        fn non_numeric_text_is_a_soft_miss(text in "[a-zA-Z ]{0,16}") {
            let html = format!(r#"<div><span class="t">{}</span></div>"#, text);
            let document = Html::parse_fragment(&html);
            let decoder = Decoder::new();
            let ctx = decoder.context();
            let value = extract_int(document.root_element(), &meta("span.t"), &ctx).unwrap();
            prop_assert_eq!(value, None);
        }

        #[test]
        fn integers_round_trip_through_text(n in any::<i32>()) {
            let html = format!(r#"<span class="t">{}</span>"#, n);
            let document = Html::parse_fragment(&html);
            let decoder = Decoder::new();
            let ctx = decoder.context();
            let value = extract_int(document.root_element(), &meta("span.t"), &ctx).unwrap();
            prop_assert_eq!(value, Some(n));
        }
    }
}
