/// Strips the quotes of a C# string or character literal, including the
/// `@` of verbatim strings, where `""` stands for one quote.
pub fn unquote_string(s: &str) -> String {
    let s = s.trim();
    if let Some(verbatim) = s.strip_prefix('@') {
        if verbatim.len() >= 2 && verbatim.starts_with('"') && verbatim.ends_with('"') {
            return verbatim[1..verbatim.len() - 1].replace("\"\"", "\"");
        }
    }
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// Last segment of a qualified name: `global::Xunit.Fact` gives `Fact`.
pub fn extract_last_segment(path: &str) -> String {
    path.rsplit(['.', ':']).next().unwrap_or(path).to_string()
}
