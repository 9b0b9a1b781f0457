//! Directory access
//!
//! The manager talks to the directory through [`DirectoryConnector`] and
//! [`DirectorySession`]; [`LdapConnector`] is the `ldap3` implementation.

mod ldap;

pub use ldap::LdapConnector;

use async_trait::async_trait;
use std::collections::HashMap;
use warden_core::Result;

/// An entry returned by a directory search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub dn: String,
    pub attrs: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attrs: HashMap::new(),
        }
    }

    pub fn with_attr<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attrs
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Values of an attribute. Attribute names are case-insensitive.
    pub fn values(&self, attr: &str) -> &[String] {
        self.attrs
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(attr))
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn first(&self, attr: &str) -> Option<&str> {
        self.values(attr).first().map(|v| v.as_str())
    }

    /// Case-insensitive value match
    pub fn has_value(&self, attr: &str, value: &str) -> bool {
        self.values(attr).iter().any(|v| v.eq_ignore_ascii_case(value))
    }

    /// Whether a DN-valued attribute contains `dn`
    pub fn has_dn_value(&self, attr: &str, dn: &str) -> bool {
        let wanted = normalize_dn(dn);
        self.values(attr).iter().any(|v| normalize_dn(v) == wanted)
    }

    pub fn has_object_class(&self, class: &str) -> bool {
        self.has_value("objectClass", class)
    }
}

/// Canonical form of a DN for comparison: attribute types and values are
/// lower-cased, whitespace around separators is dropped, and values are
/// re-escaped the same way, so `uid=Gauss, dc=example,dc=com` equals
/// `uid=gauss,dc=example,dc=com` and `cn=R\2CD` equals `cn=r\,d`.
pub fn normalize_dn(dn: &str) -> String {
    split_rdns(dn)
        .into_iter()
        .map(|rdn| match rdn.split_once('=') {
            Some((attr, value)) => format!(
                "{}={}",
                attr.trim().to_lowercase(),
                escape_rdn_value(&unescape_rdn_value(value).to_lowercase())
            ),
            None => rdn.trim().to_lowercase(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Unescaped value of the leading RDN, `mathematicians` for
/// `cn=mathematicians,ou=groups,dc=example,dc=com`
pub fn leading_rdn_value(dn: &str) -> Option<String> {
    let rdn = split_rdns(dn).into_iter().next()?;
    let (_, value) = rdn.split_once('=')?;
    let value = unescape_rdn_value(value);
    (!value.is_empty()).then_some(value)
}

/// Split a DN at the commas that are not escaped
fn split_rdns(dn: &str) -> Vec<&str> {
    let mut rdns = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in dn.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            ',' => {
                rdns.push(&dn[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    rdns.push(&dn[start..]);
    rdns
}

/// Decode RFC 4514 escapes (`\,` and `\2C` style) in an attribute value.
/// Unescaped leading and trailing whitespace is dropped; escaped spaces stay.
fn unescape_rdn_value(raw: &str) -> String {
    let raw = raw.trim_start().as_bytes();
    let mut out = Vec::with_capacity(raw.len());
    let mut keep = 0;
    let mut i = 0;

    while i < raw.len() {
        if raw[i] == b'\\' && i + 1 < raw.len() {
            match raw.get(i + 1..i + 3).filter(|h| h.iter().all(u8::is_ascii_hexdigit)) {
                Some(hex) => {
                    out.push((hex_value(hex[0]) << 4) | hex_value(hex[1]));
                    i += 3;
                }
                None => {
                    out.push(raw[i + 1]);
                    i += 2;
                }
            }
            keep = out.len();
            continue;
        }

        out.push(raw[i]);
        if !raw[i].is_ascii_whitespace() {
            keep = out.len();
        }
        i += 1;
    }

    out.truncate(keep);
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

fn escape_rdn_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// One connection to the directory
#[async_trait]
pub trait DirectorySession: Send {
    /// Simple bind. A rejected password is `Error::InvalidCredentials`.
    async fn bind(&mut self, dn: &str, password: &str) -> Result<()>;

    /// Subtree search under `base`
    async fn search(
        &mut self,
        base: &str,
        filter: &str,
        attrs: &[&str],
    ) -> Result<Vec<DirectoryEntry>>;

    async fn unbind(&mut self) -> Result<()>;
}

/// Opens directory sessions
#[async_trait]
pub trait DirectoryConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn DirectorySession>>;
}

#[cfg(test)]
pub(crate) mod scripted;
