//! CSS selector-based selection and leaf reads
//!
//! Uses the scraper crate to select elements relative to a context node and to
//! read either their text or one of their attributes.

use scraper::ElementRef;
use tracing::trace;

use crate::decoder::DecodeContext;
use crate::schema::FieldMeta;

/// Attribute prefix asking for a URL resolved against the base URL
const ABS_PREFIX: &str = "abs:";

/// True when the context node itself satisfies the field's selector
///
/// `ElementRef::select` only walks descendants; selection here starts at the
/// node, as the context element may be the one carrying the value.
fn matches_self(node: ElementRef<'_>, field: &FieldMeta) -> bool {
    field.selector.matches_with_scope(&node, Some(node))
}

/// First element at or under `node` matching the field's selector
pub fn select_first<'a>(node: ElementRef<'a>, field: &FieldMeta) -> Option<ElementRef<'a>> {
    if matches_self(node, field) {
        return Some(node);
    }
    node.select(&field.selector).next()
}

/// Every element at or under `node` matching the field's selector, in document order
pub fn select_all<'a>(node: ElementRef<'a>, field: &FieldMeta) -> Vec<ElementRef<'a>> {
    std::iter::once(node)
        .filter(|node| matches_self(*node, field))
        .chain(node.select(&field.selector))
        .collect()
}

/// Read the raw string a field points at on an already matched element
///
/// Text content goes through the configured whitespace handling; attribute
/// values are returned as stored.
pub fn read_leaf(
    element: ElementRef<'_>,
    field: &FieldMeta,
    ctx: &DecodeContext<'_>,
) -> Option<String> {
    match field.attr.as_deref() {
        Some(attr) => read_attr(element, attr, ctx),
        None => Some(ctx.config().whitespace.apply(element.text())),
    }
}

fn read_attr(element: ElementRef<'_>, attr: &str, ctx: &DecodeContext<'_>) -> Option<String> {
    let Some(attr_name) = attr.strip_prefix(ABS_PREFIX) else {
        return element.value().attr(attr).map(String::from);
    };

    let raw = element.value().attr(attr_name)?;
    let resolved = match ctx.base_url() {
        Some(base) => base.join(raw.trim()).ok(),
        None => url::Url::parse(raw.trim()).ok(),
    };
    if resolved.is_none() {
        trace!("Could not resolve {:?} from attribute {}", raw, attr_name);
    }
    resolved.map(String::from)
}

/// Select the first match and read it
pub fn extract_leaf(
    node: ElementRef<'_>,
    field: &FieldMeta,
    ctx: &DecodeContext<'_>,
) -> Option<String> {
    let element = select_first(node, field)?;
    let raw = read_leaf(element, field, ctx);
    if raw.is_none() {
        trace!("Field {} matched but attribute {:?} is absent", field.name, field.attr);
    }
    raw
}
