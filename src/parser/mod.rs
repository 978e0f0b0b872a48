//! C# front end.

mod csharp;

pub use csharp::CSharpParser;

use std::path::Path;

pub const SOURCE_EXTENSION: &str = "cs";

pub fn is_source_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION)
}
