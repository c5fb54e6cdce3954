//! Declarations described as data
//!
//! A [`Declaration`] carries the same information as a [`crate::Pick`]
//! schema but is deserialized at runtime, so field kinds arrive as strings and
//! may name something no extractor handles. Decoding produces a JSON object.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::decoder::{DecodeContext, Decoder};
use crate::error::DecodeError;
use crate::extractors::{select_all, select_first, ScalarKind};
use crate::schema::{compile_selector, FieldMeta};

/// Root query plus fields, as read from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    pub selector: String,
    pub fields: Vec<FieldDeclaration>,
}

/// Single field declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDeclaration {
    /// Output key
    pub name: String,
    /// CSS selector, optionally with an `@attr` suffix
    pub selector: String,
    /// Attribute to read instead of text
    #[serde(default)]
    pub attr: Option<String>,
    /// int, long, float, double, boolean, string, list or object
    #[serde(rename = "type")]
    pub kind: String,
    /// Element type for lists: a scalar name or "object"
    #[serde(default)]
    pub element: Option<String>,
    /// Nested fields for objects and lists of objects
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
    /// Value kept when nothing is extracted
    #[serde(default)]
    pub default: Option<Value>,
}

impl Declaration {
    pub fn from_json(json: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate kinds and selectors
    pub fn compile(&self) -> Result<CompiledDeclaration, DecodeError> {
        let compiled = CompiledDeclaration {
            root: compile_selector(self.selector.trim())?,
            fields: compile_fields(&self.fields)?,
        };
        debug!(
            "Compiled declaration with {} fields (root: {})",
            compiled.fields.len(),
            self.selector
        );
        Ok(compiled)
    }
}

/// Validated declaration ready to decode
#[derive(Debug, Clone)]
pub struct CompiledDeclaration {
    root: Selector,
    fields: Vec<DeclaredField>,
}

impl CompiledDeclaration {
    /// Decode the first root match into a JSON object
    pub fn decode(&self, decoder: &Decoder, document: &Html) -> Result<Value, DecodeError> {
        let object = match document.select(&self.root).next() {
            Some(root) => populate(&self.fields, root, &decoder.context())?,
            None => {
                debug!("Declared root matched nothing; keeping defaults");
                defaults(&self.fields)
            }
        };
        Ok(Value::Object(object))
    }
}

#[derive(Debug, Clone)]
struct DeclaredField {
    meta: FieldMeta,
    kind: DeclaredKind,
    default: Value,
}

#[derive(Debug, Clone)]
enum DeclaredKind {
    Scalar(ScalarKind),
    List(DeclaredElement),
    Object(Vec<DeclaredField>),
}

#[derive(Debug, Clone)]
enum DeclaredElement {
    Scalar(ScalarKind),
    Object(Vec<DeclaredField>),
}

fn compile_fields(fields: &[FieldDeclaration]) -> Result<Vec<DeclaredField>, DecodeError> {
    fields.iter().map(compile_field).collect()
}

fn compile_field(decl: &FieldDeclaration) -> Result<DeclaredField, DecodeError> {
    let meta = FieldMeta::compile(decl.name.as_str(), &decl.selector, decl.attr.as_deref())?;
    let kind = match decl.kind.trim().to_ascii_lowercase().as_str() {
        "list" => {
            let element = decl.element.as_deref().ok_or_else(|| {
                DecodeError::InvalidDeclaration(format!("list `{}` has no element type", decl.name))
            })?;
            if element.trim().eq_ignore_ascii_case("object") {
                DeclaredKind::List(DeclaredElement::Object(nested_fields(decl)?))
            } else {
                DeclaredKind::List(DeclaredElement::Scalar(element.parse()?))
            }
        }
        "object" => DeclaredKind::Object(nested_fields(decl)?),
        _ => DeclaredKind::Scalar(decl.kind.parse()?),
    };
    let default = match &decl.default {
        Some(value) => value.clone(),
        None => kind.zero(),
    };
    Ok(DeclaredField { meta, kind, default })
}

fn nested_fields(decl: &FieldDeclaration) -> Result<Vec<DeclaredField>, DecodeError> {
    if decl.fields.is_empty() {
        return Err(DecodeError::InvalidDeclaration(format!(
            "object `{}` declares no fields",
            decl.name
        )));
    }
    compile_fields(&decl.fields)
}

impl DeclaredKind {
    fn zero(&self) -> Value {
        match self {
            DeclaredKind::Scalar(kind) => kind.zero(),
            DeclaredKind::List(_) => Value::Array(Vec::new()),
            DeclaredKind::Object(_) => Value::Null,
        }
    }
}

fn defaults(fields: &[DeclaredField]) -> Map<String, Value> {
    fields
        .iter()
        .map(|field| (field.meta.name.clone(), field.default.clone()))
        .collect()
}

fn populate(
    fields: &[DeclaredField],
    node: ElementRef<'_>,
    ctx: &DecodeContext<'_>,
) -> Result<Map<String, Value>, DecodeError> {
    let mut object = Map::new();
    for field in fields {
        let value = field
            .extract(node, ctx)?
            .unwrap_or_else(|| field.default.clone());
        object.insert(field.meta.name.clone(), value);
    }
    Ok(object)
}

impl DeclaredField {
    fn extract(
        &self,
        node: ElementRef<'_>,
        ctx: &DecodeContext<'_>,
    ) -> Result<Option<Value>, DecodeError> {
        match &self.kind {
            DeclaredKind::Scalar(kind) => kind.extract_value(node, &self.meta, ctx),
            DeclaredKind::Object(fields) => match select_first(node, &self.meta) {
                Some(element) => {
                    let inner = ctx.descend()?;
                    Ok(Some(Value::Object(populate(fields, element, &inner)?)))
                }
                None => Ok(None),
            },
            DeclaredKind::List(element_kind) => {
                let matches = select_all(node, &self.meta);
                if matches.is_empty() {
                    return Ok(None);
                }
                let items = matches
                    .into_iter()
                    .map(|element| match element_kind {
                        DeclaredElement::Scalar(kind) => kind.value_at(element, &self.meta, ctx),
                        DeclaredElement::Object(fields) => {
                            let inner = ctx.descend()?;
                            Ok(Value::Object(populate(fields, element, &inner)?))
                        }
                    })
                    .collect::<Result<Vec<_>, DecodeError>>()?;
                Ok(Some(Value::Array(items)))
            }
        }
    }
}
