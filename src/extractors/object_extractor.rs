//! Nested object extraction
//!
//! A member whose type is itself [`Pick`] takes the first match of its own
//! selector as the nested root and is populated recursively.

use scraper::ElementRef;
use tracing::trace;

use crate::decoder::DecodeContext;
use crate::error::DecodeError;
use crate::schema::{Accessor, FieldMeta, Pick, Populate};

use super::css_extractor::select_first;

/// `U` member, left at its default on no match
pub struct NestedObject<T, U> {
    slot: Accessor<T, U>,
}

impl<T, U> NestedObject<T, U> {
    pub fn new(slot: Accessor<T, U>) -> Self {
        Self { slot }
    }
}

impl<T: 'static, U: Pick> Populate<T> for NestedObject<T, U> {
    fn populate(
        &self,
        node: ElementRef<'_>,
        field: &FieldMeta,
        target: &mut T,
        ctx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError> {
        if let Some(value) = extract_object::<U>(node, field, ctx)? {
            *(self.slot)(target) = value;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        std::any::type_name::<U>().to_string()
    }
}

/// `Option<U>` member, set to `Some` only on a match
pub struct OptionalObject<T, U> {
    slot: Accessor<T, Option<U>>,
}

impl<T, U> OptionalObject<T, U> {
    pub fn new(slot: Accessor<T, Option<U>>) -> Self {
        Self { slot }
    }
}

impl<T: 'static, U: Pick> Populate<T> for OptionalObject<T, U> {
    fn populate(
        &self,
        node: ElementRef<'_>,
        field: &FieldMeta,
        target: &mut T,
        ctx: &DecodeContext<'_>,
    ) -> Result<(), DecodeError> {
        if let Some(value) = extract_object::<U>(node, field, ctx)? {
            *(self.slot)(target) = Some(value);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("option<{}>", std::any::type_name::<U>())
    }
}

/// Decode the first match as `U`
pub fn extract_object<U: Pick>(
    node: ElementRef<'_>,
    field: &FieldMeta,
    ctx: &DecodeContext<'_>,
) -> Result<Option<U>, DecodeError> {
    match select_first(node, field) {
        Some(element) => ctx.populate::<U>(element).map(Some),
        None => {
            trace!("Object {} matched nothing", field.name);
            Ok(None)
        }
    }
}
