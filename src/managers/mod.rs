pub mod datasets;
pub mod jobs;
pub mod sessions;
pub mod upload;

use crate::constants::pagination;
use crate::errors::ToolError;
use crate::services::platform::PageQuery;
use crate::services::validation::Validation;
use serde_json::Value;

pub(crate) fn page_query(validation: &Validation, args: &Value) -> Result<PageQuery, ToolError> {
    Ok(PageQuery {
        page_number: validation
            .ensure_optional_positive_int(args.get("page_number"), "page_number")?
            .unwrap_or(pagination::DEFAULT_PAGE_NUMBER),
        page_size: validation
            .ensure_optional_positive_int(args.get("page_size"), "page_size")?
            .unwrap_or(pagination::DEFAULT_PAGE_SIZE),
        search: validation.ensure_optional_string(args.get("search"), "search")?,
    })
}
