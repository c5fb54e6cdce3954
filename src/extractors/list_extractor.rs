//! List extraction
//!
//! Lists take every match of the field's selector. Scalar elements are read
//! like scalar fields; object elements re-enter the decoder with the match as
//! their root.

use scraper::ElementRef;
use tracing::trace;

use crate::decoder::DecodeContext;
use crate::error::DecodeError;
use crate::schema::{Accessor, FieldMeta, Pick, Populate};

use super::css_extractor::select_all;
use super::scalar_extractor::{scalar_at, Scalar};

/// `Vec<V>` member with scalar elements
pub struct ScalarList<T, V> {
    slot: Accessor<T, Vec<V>>,
}

impl<T, V> ScalarList<T, V> {
    pub fn new(slot: Accessor<T, Vec<V>>) -> Self {
        Self { slot }
    }
}

impl<T: 'static, V: Scalar> Populate<T> for ScalarList<T, V> {
    fn populate(
        &self,
        node: ElementRef<'_>,
        field: &FieldMeta,
        target: &mut T,
        ctx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError> {
        if let Some(values) = extract_scalar_list::<V>(node, field, ctx)? {
            *(self.slot)(target) = values;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("list<{}>", V::KIND)
    }
}

/// `Vec<U>` member with nested object elements
pub struct ObjectList<T, U> {
    slot: Accessor<T, Vec<U>>,
}

impl<T, U> ObjectList<T, U> {
    pub fn new(slot: Accessor<T, Vec<U>>) -> Self {
        Self { slot }
    }
}

impl<T: 'static, U: Pick> Populate<T> for ObjectList<T, U> {
    fn populate(
        &self,
        node: ElementRef<'_>,
        field: &FieldMeta,
        target: &mut T,
        ctx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError> {
        if let Some(items) = extract_object_list::<U>(node, field, ctx)? {
            *(self.slot)(target) = items;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("list<{}>", std::any::type_name::<U>())
    }
}

/// One element per match; `None` when nothing matched
pub fn extract_scalar_list<V: Scalar>(
    node: ElementRef<'_>,
    field: &FieldMeta,
    ctx: &DecodeContext<'_>,
) -> Result<Option<Vec<V>>, DecodeError> {
    let matches = select_all(node, field);
    if matches.is_empty() {
        trace!("List {} matched nothing", field.name);
        return Ok(None);
    }
    matches
        .into_iter()
        .map(|element| scalar_at::<V>(element, field, ctx))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// One decoded `U` per match; `None` when nothing matched
pub fn extract_object_list<U: Pick>(
    node: ElementRef<'_>,
    field: &FieldMeta,
    ctx: &DecodeContext<'_>,
) -> Result<Option<Vec<U>>, DecodeError> {
    let matches = select_all(node, field);
    if matches.is_empty() {
        trace!("List {} matched nothing", field.name);
        return Ok(None);
    }
    matches
        .into_iter()
        .map(|element| ctx.populate::<U>(element))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}
