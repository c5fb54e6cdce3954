//! Target type descriptors
//!
//! A [`Schema`] is the compiled form of what a type declares about itself: the
//! root query, how to construct an empty instance, and one [`Field`] per
//! member with its query and typed accessor.

use scraper::{ElementRef, Selector};

use crate::decoder::DecodeContext;
use crate::error::{BoxError, DecodeError};
use crate::extractors::{NestedObject, ObjectList, OptionalObject, Scalar, ScalarList};

/// Borrow one member of the target mutably
pub type Accessor<T, V> = fn(&mut T) -> &mut V;

/// Fallible no-argument constructor
pub type Constructor<T> = Box<dyn Fn() -> Result<T, BoxError> + Send + Sync>;

/// Types that can be decoded from HTML
///
/// ```ignore
/// #[derive(Default)]
/// struct Quote {
///     text: String,
///     likes: i32,
/// }
///
/// impl Pick for Quote {
///     fn schema() -> SchemaBuilder<Self> {
///         Schema::<Self>::builder("div.quote")
///             .string("text", "span.text", |q| &mut q.text)
///             .int("likes", "span.likes @data-count", |q| &mut q.likes)
///     }
/// }
/// ```
pub trait Pick: Sized + 'static {
    /// Describe the root query and fields of this type
    fn schema() -> SchemaBuilder<Self>;
}

/// Field kinds with their accessors
///
/// Composite kinds are type-erased behind [`Populate`] because they carry the
/// element or nested type as a generic parameter.
pub enum Kind<T> {
    Int(Accessor<T, i32>),
    Long(Accessor<T, i64>),
    Float(Accessor<T, f32>),
    Double(Accessor<T, f64>),
    Bool(Accessor<T, bool>),
    Str(Accessor<T, String>),
    List(Box<dyn Populate<T>>),
    Object(Box<dyn Populate<T>>),
}

impl<T> Kind<T> {
    pub fn describe(&self) -> String {
        match self {
            Kind::Int(_) => "int".to_string(),
            Kind::Long(_) => "long".to_string(),
            Kind::Float(_) => "float".to_string(),
            Kind::Double(_) => "double".to_string(),
            Kind::Bool(_) => "boolean".to_string(),
            Kind::Str(_) => "string".to_string(),
            Kind::List(inner) | Kind::Object(inner) => inner.describe(),
        }
    }
}

/// Extraction for composite kinds that recurse back into the decoder
pub trait Populate<T>: Send + Sync {
    /// Extract from `node` and assign into `target`, leaving the member
    /// untouched when nothing matched
    fn populate(
        &self,
        node: ElementRef<'_>,
        field: &FieldMeta,
        target: &mut T,
        ctx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError>;

    fn describe(&self) -> String;
}

/// Where a field's value comes from
#[derive(Debug, Clone)]
pub struct FieldMeta {
    pub name: String,
    /// The query as written, including any `@attr` suffix
    pub query: String,
    pub selector: Selector,
    /// Attribute to read; `None` means text content
    pub attr: Option<String>,
}

impl FieldMeta {
    /// Compile a field query
    ///
    /// Accepts `selector` or `selector @attr`. An explicit `attr` wins over
    /// the suffix.
    pub fn compile(
        name: impl Into<String>,
        query: &str,
        attr: Option<&str>,
    ) -> Result<Self, DecodeError> {
        let (css, suffix) = split_query(query);
        let selector = compile_selector(css)?;
        Ok(Self {
            name: name.into(),
            query: query.to_string(),
            selector,
            attr: attr.or(suffix).map(String::from),
        })
    }
}

/// Split `"a.link @href"` into `("a.link", Some("href"))`
pub(crate) fn split_query(query: &str) -> (&str, Option<&str>) {
    if let Some(at_pos) = query.rfind(" @") {
        let attr = query[at_pos + 2..].trim();
        if !attr.is_empty() {
            return (query[..at_pos].trim(), Some(attr));
        }
    }
    (query.trim(), None)
}

pub(crate) fn compile_selector(css: &str) -> Result<Selector, DecodeError> {
    Selector::parse(css).map_err(|e| DecodeError::invalid_selector(css, e))
}

/// One member of a target type
pub struct Field<T> {
    pub meta: FieldMeta,
    pub kind: Kind<T>,
}

/// Compiled descriptor for `T`
pub struct Schema<T> {
    type_name: String,
    root_query: String,
    root: Selector,
    constructor: Constructor<T>,
    fields: Vec<Field<T>>,
}

impl<T: Default + 'static> Schema<T> {
    /// Start a schema for a type whose `Default` is its empty instance
    pub fn builder(root: impl Into<String>) -> SchemaBuilder<T> {
        SchemaBuilder::new(root).constructor(|| Ok(T::default()))
    }
}

impl<T> Schema<T> {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn root_query(&self) -> &str {
        &self.root_query
    }

    pub fn root(&self) -> &Selector {
        &self.root
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    /// Build an instance with every field at its default
    pub fn instantiate(&self) -> Result<T, DecodeError> {
        (self.constructor)().map_err(|source| DecodeError::Construction {
            type_name: self.type_name.clone(),
            source,
        })
    }
}

struct FieldDraft<T> {
    name: String,
    query: String,
    kind: Kind<T>,
}

/// Collects declarations; nothing is validated until [`SchemaBuilder::build`]
pub struct SchemaBuilder<T> {
    type_name: String,
    root: String,
    constructor: Option<Constructor<T>>,
    fields: Vec<FieldDraft<T>>,
}

impl<T: 'static> SchemaBuilder<T> {
    /// Start a schema with no constructor
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            type_name: std::any::type_name::<T>().to_string(),
            root: root.into(),
            constructor: None,
            fields: Vec::new(),
        }
    }

    /// Set how empty instances are made
    pub fn constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.constructor = Some(Box::new(constructor));
        self
    }

    fn push(mut self, name: impl Into<String>, query: impl Into<String>, kind: Kind<T>) -> Self {
        self.fields.push(FieldDraft {
            name: name.into(),
            query: query.into(),
            kind,
        });
        self
    }

    pub fn int(
        self,
        name: impl Into<String>,
        query: impl Into<String>,
        slot: Accessor<T, i32>,
    ) -> Self {
        self.push(name, query, Kind::Int(slot))
    }

    pub fn long(
        self,
        name: impl Into<String>,
        query: impl Into<String>,
        slot: Accessor<T, i64>,
    ) -> Self {
        self.push(name, query, Kind::Long(slot))
    }

    pub fn float(
        self,
        name: impl Into<String>,
        query: impl Into<String>,
        slot: Accessor<T, f32>,
    ) -> Self {
        self.push(name, query, Kind::Float(slot))
    }

    pub fn double(
        self,
        name: impl Into<String>,
        query: impl Into<String>,
        slot: Accessor<T, f64>,
    ) -> Self {
        self.push(name, query, Kind::Double(slot))
    }

    pub fn boolean(
        self,
        name: impl Into<String>,
        query: impl Into<String>,
        slot: Accessor<T, bool>,
    ) -> Self {
        self.push(name, query, Kind::Bool(slot))
    }

    pub fn string(
        self,
        name: impl Into<String>,
        query: impl Into<String>,
        slot: Accessor<T, String>,
    ) -> Self {
        self.push(name, query, Kind::Str(slot))
    }

    /// Every match, read as a scalar
    pub fn list<V: Scalar>(
        self,
        name: impl Into<String>,
        query: impl Into<String>,
        slot: Accessor<T, Vec<V>>,
    ) -> Self {
        self.push(name, query, Kind::List(Box::new(ScalarList::new(slot))))
    }

    /// Every match, decoded as a nested `U`
    pub fn objects<U: Pick>(
        self,
        name: impl Into<String>,
        query: impl Into<String>,
        slot: Accessor<T, Vec<U>>,
    ) -> Self {
        self.push(name, query, Kind::List(Box::new(ObjectList::new(slot))))
    }

    /// First match, decoded as a nested `U`
    pub fn object<U: Pick>(
        self,
        name: impl Into<String>,
        query: impl Into<String>,
        slot: Accessor<T, U>,
    ) -> Self {
        self.push(name, query, Kind::Object(Box::new(NestedObject::new(slot))))
    }

    /// First match, decoded as a nested `U`; stays `None` on no match
    pub fn optional<U: Pick>(
        self,
        name: impl Into<String>,
        query: impl Into<String>,
        slot: Accessor<T, Option<U>>,
    ) -> Self {
        self.push(name, query, Kind::Object(Box::new(OptionalObject::new(slot))))
    }

    /// Validate the constructor and every selector
    pub fn build(self) -> Result<Schema<T>, DecodeError> {
        let constructor = self.constructor.ok_or_else(|| DecodeError::MissingConstructor {
            type_name: self.type_name.clone(),
        })?;
        let root = compile_selector(self.root.trim())?;
        let fields = self
            .fields
            .into_iter()
            .map(|draft| {
                Ok(Field {
                    meta: FieldMeta::compile(draft.name, &draft.query, None)?,
                    kind: draft.kind,
                })
            })
            .collect::<Result<Vec<_>, DecodeError>>()?;

        Ok(Schema {
            type_name: self.type_name,
            root_query: self.root,
            root,
            constructor,
            fields,
        })
    }
}
