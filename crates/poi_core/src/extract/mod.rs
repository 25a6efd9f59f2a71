//! Breadcrumb extraction from USD ASCII (`.usda`) scene layers.

mod extractor;
mod lexer;
mod scene;

pub use extractor::{
    extract_breadcrumbs, extract_from_source, BreadcrumbSink, ExtractError, ExtractSummary,
    DEFAULT_CHUNK_SIZE,
};
