//! Plugin properties
//!
//! The scheduler hands its plugins a flat map of string properties, usually
//! read from a Java-style `.properties` file:
//!
//! ```text
//! # LDAP server
//! user.manager.ldap.host=ldap.example.com
//! user.manager.ldap.port: 389
//! user.manager.ldap.allowedGroups=admins, \
//!     developers
//! user.manager.ldap.bindPassword p\u00e4ss\=word
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Props {
    values: BTreeMap<String, String>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load properties from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Parse `.properties` text. Keys end at the first unescaped `=`, `:` or
    /// whitespace; `\uXXXX`, `\t`, `\n`, `\r`, `\f` and `\<char>` escapes are
    /// decoded in keys and values.
    pub fn parse(content: &str) -> Self {
        let mut props = Self::new();
        let mut logical = String::new();
        let mut continuing = false;

        for line in content.lines() {
            let line = line.trim_start();

            if !continuing && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
                continue;
            }

            // An odd number of trailing backslashes continues the logical line
            let trailing = line.chars().rev().take_while(|&c| c == '\\').count();
            if trailing % 2 == 1 {
                logical.push_str(&line[..line.len() - 1]);
                continuing = true;
                continue;
            }

            logical.push_str(line);
            props.insert_line(&logical);
            logical.clear();
            continuing = false;
        }

        if continuing {
            props.insert_line(&logical);
        }

        props
    }

    fn insert_line(&mut self, line: &str) {
        let (key, rest) = split_key(line);
        let rest = rest.trim_start();
        let value = rest.strip_prefix(['=', ':']).unwrap_or(rest).trim_start();

        let key = unescape(key);
        if !key.is_empty() {
            self.put(key, unescape(value));
        }
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|v| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    /// Get a required string property
    pub fn get_string(&self, key: &str) -> Result<String> {
        self.get(key)
            .map(|v| v.to_string())
            .ok_or_else(|| Error::MissingProperty(key.to_string()))
    }

    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(v) if v.eq_ignore_ascii_case("true") => Ok(true),
            Some(v) if v.eq_ignore_ascii_case("false") => Ok(false),
            Some(v) => Err(invalid(key, v)),
        }
    }

    /// Get a required port-sized integer
    pub fn get_u16(&self, key: &str) -> Result<u16> {
        let value = self.get_string(key)?;
        value.parse().map_err(|_| invalid(key, &value))
    }

    pub fn get_u64_or(&self, key: &str, default: u64) -> Result<u64> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => v.parse().map_err(|_| invalid(key, v)),
        }
    }

    /// Get a comma-separated list; a missing key is an empty list
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Split at the first unescaped separator or whitespace
fn split_key(line: &str) -> (&str, &str) {
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            c if c == '=' || c == ':' || c.is_whitespace() => return (&line[..i], &line[i..]),
            _ => {}
        }
    }

    (line, "")
}

/// Decode escapes and drop trailing whitespace that is not escaped
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut keep = 0;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            if !c.is_whitespace() {
                keep = out.len();
            }
            continue;
        }

        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                let decoded = (hex.len() == 4 && hex.chars().all(|c| c.is_ascii_hexdigit()))
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(decoded) => {
                        out.push(decoded);
                        chars.nth(3);
                    }
                    None => out.push('u'),
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
        keep = out.len();
    }

    out.truncate(keep);
    out
}

fn invalid(key: &str, value: &str) -> Error {
    Error::InvalidProperty {
        key: key.to_string(),
        value: value.to_string(),
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Self::new();
        for (key, value) in iter {
            props.put(key, value);
        }
        props
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_properties() {
        let props = Props::parse(
            "# comment\n\
             ! also a comment\n\
             \n\
             user.manager.ldap.host = ldap.forumsys.com\n\
             user.manager.ldap.port: 389\n\
             user.manager.ldap.bindAccount=cn=read-only-admin,dc=example,dc=com\n\
             user.manager.ldap.emailProperty=\n",
        );

        assert_eq!(props.get("user.manager.ldap.host"), Some("ldap.forumsys.com"));
        assert_eq!(props.get_u16("user.manager.ldap.port").unwrap(), 389);
        assert_eq!(
            props.get("user.manager.ldap.bindAccount"),
            Some("cn=read-only-admin,dc=example,dc=com")
        );
        assert_eq!(props.get("user.manager.ldap.emailProperty"), Some(""));
        assert_eq!(props.keys().count(), 4);
    }

    #[test]
    fn test_line_continuation() {
        let props = Props::parse("groups=admins, \\\n    developers\nnext=1\n");

        assert_eq!(props.get_string_list("groups"), vec!["admins", "developers"]);
        assert_eq!(props.get("next"), Some("1"));
    }

    #[test]
    fn test_escapes_and_separators() {
        let props = Props::parse(
            r#"dir=C:\\temp\\
next=1
key\=with\:separators=value
greeting=caf\u00e9\tbar
spaced\ key = kept\ 
space separated value
"#,
        );

        assert_eq!(props.get("dir"), Some(r"C:\temp\"));
        assert_eq!(props.get("next"), Some("1"));
        assert_eq!(props.get("key=with:separators"), Some("value"));
        assert_eq!(props.get("greeting"), Some("café\tbar"));
        assert_eq!(props.get("spaced key"), Some("kept "));
        assert_eq!(props.get("space"), Some("separated value"));
        assert_eq!(props.keys().count(), 6);
    }

    #[test]
    fn test_continuation_after_empty_head() {
        let props = Props::parse("groups=\\\n  admins\nbroken=\\u12\n");

        assert_eq!(props.get("groups"), Some("admins"));
        assert_eq!(props.get("broken"), Some("u12"));
    }

    #[test]
    fn test_typed_getters() {
        let props: Props = [
            ("ssl", "TRUE"),
            ("tls", "false"),
            ("broken", "yes"),
            ("port", "70000"),
            ("groups", " a, ,b ,"),
        ]
        .into_iter()
        .collect();

        assert!(props.get_bool("ssl", false).unwrap());
        assert!(!props.get_bool("tls", true).unwrap());
        assert!(props.get_bool("missing", true).unwrap());
        assert!(matches!(
            props.get_bool("broken", false),
            Err(Error::InvalidProperty { .. })
        ));
        assert!(matches!(props.get_u16("port"), Err(Error::InvalidProperty { .. })));
        assert!(matches!(props.get_u16("missing"), Err(Error::MissingProperty(_))));
        assert_eq!(props.get_u64_or("missing", 10).unwrap(), 10);
        assert_eq!(props.get_string_list("groups"), vec!["a", "b"]);
        assert!(props.get_string_list("missing").is_empty());
        assert_eq!(props.get_string_or("missing", "uid"), "uid");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "user.manager.ldap.host=localhost").unwrap();

        let props = Props::from_file(file.path()).unwrap();
        assert_eq!(props.get_string("user.manager.ldap.host").unwrap(), "localhost");

        assert!(matches!(
            Props::from_file("/nonexistent/warden.properties"),
            Err(Error::Io(_))
        ));
    }
}
