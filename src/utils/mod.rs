pub mod text_utils;
pub mod uuid_utils;

pub use text_utils::{TRUNCATION_MARKER, single_line, truncate_chars};
pub use uuid_utils::{short_id, validate_uuid};
