//! Search filter construction
//!
//! Every value that reaches a filter from outside (usernames, group names,
//! DNs read back from the directory) goes through [`escape_search_filter`].
//! Attribute names come from validated configuration and are used as-is.

/// Escape the RFC 4515 filter metacharacters in `input`.
///
/// Only `\`, `*`, `(`, `)` and NUL are rewritten. Everything else, including
/// `=` and non-ASCII text, is passed through.
pub fn escape_search_filter(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());

    for c in input.chars() {
        match c {
            '\\' => escaped.push_str("\\5c"),
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\0' => escaped.push_str("\\00"),
            c => escaped.push(c),
        }
    }

    escaped
}

/// `(attr=value)` with `value` escaped
pub fn equality(attr: &str, value: &str) -> String {
    format!("({}={})", attr, escape_search_filter(value))
}

/// `(&...)` over the given filters
pub fn and<S: AsRef<str>>(filters: &[S]) -> String {
    combine('&', filters)
}

/// `(|...)` over the given filters
pub fn or<S: AsRef<str>>(filters: &[S]) -> String {
    combine('|', filters)
}

fn combine<S: AsRef<str>>(op: char, filters: &[S]) -> String {
    if let [single] = filters {
        return single.as_ref().to_string();
    }

    let mut out = format!("({}", op);
    for f in filters {
        out.push_str(f.as_ref());
    }
    out.push(')');
    out
}
