mod string;

pub use string::{extract_last_segment, unquote_string};
