mod loader;
mod types;
mod writer;

pub use loader::load_breadcrumbs;
pub use types::{Breadcrumb, BreadcrumbError, BreadcrumbTable};
pub use writer::{BreadcrumbCsvWriter, ExtractedBreadcrumb, EXTRACTED_BREADCRUMB_HEADER};
