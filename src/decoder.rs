//! Decoding HTML into [`Pick`] types
//!
//! The [`Decoder`] resolves a type's root node, constructs an empty instance
//! and dispatches every declared field to the extractor for its kind.
//! Composite kinds re-enter through [`DecodeContext::populate`].

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};

use scraper::{ElementRef, Html};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::config::DecoderConfig;
use crate::declared::Declaration;
use crate::error::DecodeError;
use crate::extractors::{
    extract_bool, extract_double, extract_float, extract_int, extract_long, extract_string,
};
use crate::schema::{Field, FieldMeta, Kind, Pick, Schema};

type SchemaCache = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

/// Decodes documents into typed values
///
/// Compiled schemas are cached per type, so one decoder can be shared across
/// threads and reused for many documents.
#[derive(Debug, Default)]
pub struct Decoder {
    config: DecoderConfig,
    base_url: Option<Url>,
    schemas: SchemaCache,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecoderConfig) -> Result<Self, DecodeError> {
        config.validate()?;
        let base_url = config.parsed_base_url()?;
        Ok(Self {
            config,
            base_url,
            schemas: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Context for a decode starting at the top level
    pub fn context(&self) -> DecodeContext<'_> {
        DecodeContext {
            decoder: self,
            depth: 0,
        }
    }

    /// Compiled schema for `T`, built on first use
    pub fn schema_for<T: Pick>(&self) -> Result<Arc<Schema<T>>, DecodeError> {
        let key = TypeId::of::<T>();

        if let Ok(cache) = self.schemas.read() {
            if let Some(entry) = cache.get(&key) {
                if let Ok(schema) = Arc::clone(entry).downcast::<Schema<T>>() {
                    return Ok(schema);
                }
            }
        }

        let schema = Arc::new(T::schema().build()?);
        debug!(
            "Compiled schema for {} with {} fields (root: {})",
            schema.type_name(),
            schema.fields().len(),
            schema.root_query()
        );

        if let Ok(mut cache) = self.schemas.write() {
            cache.insert(key, schema.clone() as Arc<dyn Any + Send + Sync>);
        }
        Ok(schema)
    }

    /// Parse `html` and decode it as `T`
    pub fn decode_str<T: Pick>(&self, html: &str) -> Result<T, DecodeError> {
        self.decode(&Html::parse_document(html))
    }

    /// Decode the first root match of `T`
    ///
    /// When the root query matches nothing, the freshly constructed instance
    /// is returned untouched.
    pub fn decode<T: Pick>(&self, document: &Html) -> Result<T, DecodeError> {
        let schema = self.schema_for::<T>()?;
        let root = document.select(schema.root()).next();
        let mut instance = schema.instantiate()?;

        match root {
            Some(root) => self.context().populate_fields(root, &mut instance, &schema)?,
            None => debug!(
                "Root {} for {} matched nothing; keeping defaults",
                schema.root_query(),
                schema.type_name()
            ),
        }
        Ok(instance)
    }

    /// Decode one `T` per root match, in document order
    pub fn decode_all<T: Pick>(&self, document: &Html) -> Result<Vec<T>, DecodeError> {
        let schema = self.schema_for::<T>()?;
        let ctx = self.context();

        document
            .select(schema.root())
            .map(|root| {
                let mut instance = schema.instantiate()?;
                ctx.populate_fields(root, &mut instance, &schema)?;
                Ok(instance)
            })
            .collect()
    }

    /// Decode against a runtime declaration into a JSON object
    pub fn decode_declared(
        &self,
        document: &Html,
        declaration: &Declaration,
    ) -> Result<Value, DecodeError> {
        declaration.compile()?.decode(self, document)
    }
}

/// Per-call state threaded through recursive extraction
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'d> {
    decoder: &'d Decoder,
    depth: usize,
}

impl<'d> DecodeContext<'d> {
    pub fn config(&self) -> &'d DecoderConfig {
        &self.decoder.config
    }

    pub fn base_url(&self) -> Option<&'d Url> {
        self.decoder.base_url.as_ref()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Context one level deeper, or an error past `max_depth`
    pub fn descend(&self) -> Result<DecodeContext<'d>, DecodeError> {
        let limit = self.config().max_depth;
        if self.depth >= limit {
            return Err(DecodeError::DepthExceeded { limit });
        }
        Ok(DecodeContext {
            decoder: self.decoder,
            depth: self.depth + 1,
        })
    }

    /// Build a `U` rooted at `node`, skipping `U`'s own root query
    pub fn populate<U: Pick>(&self, node: ElementRef<'_>) -> Result<U, DecodeError> {
        let inner = self.descend()?;
        let schema = self.decoder.schema_for::<U>()?;
        let mut instance = schema.instantiate()?;
        inner.populate_fields(node, &mut instance, &schema)?;
        Ok(instance)
    }

    /// Run the dispatcher over every field of `schema`
    pub fn populate_fields<T>(
        &self,
        node: ElementRef<'_>,
        instance: &mut T,
        schema: &Schema<T>,
    ) -> Result<(), DecodeError> {
        for field in schema.fields() {
            self.dispatch(node, instance, field)?;
        }
        Ok(())
    }

    /// Extract one field and assign it, keeping the current value on a miss
    pub fn dispatch<T>(
        &self,
        node: ElementRef<'_>,
        instance: &mut T,
        field: &Field<T>,
    ) -> Result<(), DecodeError> {
        let meta = &field.meta;
        match &field.kind {
            Kind::Int(slot) => assign(slot(instance), extract_int(node, meta, self)?, meta),
            Kind::Long(slot) => assign(slot(instance), extract_long(node, meta, self)?, meta),
            Kind::Float(slot) => assign(slot(instance), extract_float(node, meta, self)?, meta),
            Kind::Double(slot) => assign(slot(instance), extract_double(node, meta, self)?, meta),
            Kind::Bool(slot) => assign(slot(instance), extract_bool(node, meta, self)?, meta),
            Kind::Str(slot) => assign(slot(instance), extract_string(node, meta, self), meta),
            Kind::List(inner) | Kind::Object(inner) => {
                inner.populate(node, meta, instance, self)?
            }
        }
        Ok(())
    }
}

fn assign<V: Debug>(slot: &mut V, value: Option<V>, field: &FieldMeta) {
    match value {
        Some(value) => *slot = value,
        None => trace!("Field {} ({}) kept default {:?}", field.name, field.query, slot),
    }
}
