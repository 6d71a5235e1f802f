//! # mirror-fields
//!
//! Schema-driven field materializer.
//!
//! Reconstructs deeply nested document structure from the flat,
//! prefix-encoded storage convention (`parent_i_child` keys), dispatching
//! on the closed [`mirror_types::FieldKind`] enum. Asset lookups and
//! post/term reference expansion go through capability traits so the
//! materializer itself stays free of content-store imports.
//!
//! ## Guarantees
//! - Missing data never errors; absent optional values resolve to null or
//!   an empty container.
//! - No literal `false` survives in output except under allow-listed keys.
//! - Leaf scalars named `link` are wrapped as `{"string_value": ...}` so
//!   sibling link fields share one mapping shape in the engine.

pub mod error;
pub mod materialize;
pub mod normalize;
pub mod resolver;
pub mod svg;

pub use error::FieldError;
pub use materialize::Materializer;
pub use normalize::normalize_tree;
pub use resolver::{AssetResolver, DocumentResolver};
pub use svg::{fetch_inline_svg, HttpMarkupResolver};
