pub mod constants;
pub mod string_utils;
pub mod url_utils;

pub use constants::*;
pub use string_utils::{collapse_whitespace, non_empty, strip_html};
pub use url_utils::{absolutize, build_search_url, is_valid_url, page_number, with_page_number};
