//! HTML extraction modules
//!
//! Each module provides extraction for one family of field kinds.

mod css_extractor;
mod list_extractor;
mod object_extractor;
mod scalar_extractor;

pub use css_extractor::*;
pub use list_extractor::*;
pub use object_extractor::*;
pub use scalar_extractor::*;
