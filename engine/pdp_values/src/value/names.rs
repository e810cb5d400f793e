//! Name datatypes: `rfc822Name` mailboxes and `x500Name` distinguished names.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::errors::{invalid_lexical, EvalResult};

// rfc822Name

/// An e-mail address `local@domain`.
///
/// The local part is case-sensitive; the domain is stored lowercased.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rfc822Name {
    local: Box<str>,
    domain: Box<str>,
}

impl Rfc822Name {
    /// Parse `local@domain`, splitting at the last `@`.
    pub fn parse(input: &str) -> EvalResult<Self> {
        let fail = |reason: &str| invalid_lexical("rfc822Name", input, reason);
        let (local, domain) = input.rsplit_once('@').ok_or_else(|| fail("missing '@'"))?;
        if local.is_empty() {
            return Err(fail("empty local part"));
        }
        if domain.is_empty() {
            return Err(fail("empty domain"));
        }
        if input.chars().any(char::is_whitespace) {
            return Err(fail("whitespace not allowed"));
        }
        Ok(Rfc822Name {
            local: local.into(),
            domain: domain.to_ascii_lowercase().into(),
        })
    }

    /// Case-sensitive local part.
    pub fn local_part(&self) -> &str {
        &self.local
    }

    /// Lowercased domain part.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// `rfc822Name-match`: does this name match `pattern`?
    ///
    /// - `local@domain`: exact mailbox, domain case-insensitive
    /// - `.example.com`: any name in a subdomain of `example.com`
    /// - `example.com`: any name at exactly that host
    pub fn matches_pattern(&self, pattern: &str) -> bool {
        if let Some((local, domain)) = pattern.rsplit_once('@') {
            return &*self.local == local && self.domain.eq_ignore_ascii_case(domain);
        }
        if pattern.starts_with('.') {
            let suffix = pattern.to_ascii_lowercase();
            return self.domain.ends_with(suffix.as_str());
        }
        self.domain.eq_ignore_ascii_case(pattern)
    }
}

impl fmt::Display for Rfc822Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local, self.domain)
    }
}

// x500Name

/// One attribute type/value assertion of an RDN, canonicalised.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Ava {
    attr_type: Box<str>,
    value: Box<str>,
}

/// An X.500 distinguished name in RFC 2253 string form.
///
/// Equality and hashing use the canonical RDN sequence: attribute types
/// uppercased, values unescaped, trimmed, whitespace-collapsed and
/// lowercased, multi-valued RDNs sorted. `Display` keeps the lexical form.
#[derive(Clone, Debug)]
pub struct X500Name {
    text: Box<str>,
    rdns: Vec<Vec<Ava>>,
}

impl X500Name {
    /// Parse an RFC 2253 distinguished name.
    pub fn parse(input: &str) -> EvalResult<Self> {
        let fail = |reason: &str| invalid_lexical("x500Name", input, reason);
        if input.trim().is_empty() {
            return Err(fail("empty name"));
        }
        let mut rdns = Vec::new();
        for rdn in split_unescaped(input, &[',', ';']).map_err(fail)? {
            let mut avas = Vec::new();
            for ava in split_unescaped(rdn, &['+']).map_err(fail)? {
                avas.push(parse_ava(ava).map_err(fail)?);
            }
            avas.sort();
            rdns.push(avas);
        }
        Ok(X500Name {
            text: input.into(),
            rdns,
        })
    }

    /// Number of RDNs.
    pub fn rdn_count(&self) -> usize {
        self.rdns.len()
    }

    /// `x500Name-match`: true when this name's RDN sequence is the trailing
    /// sequence of `other`'s (the RDNs read right-to-left as most significant).
    pub fn is_suffix_of(&self, other: &X500Name) -> bool {
        self.rdns.len() <= other.rdns.len()
            && other.rdns[other.rdns.len() - self.rdns.len()..] == self.rdns[..]
    }
}

fn parse_ava(input: &str) -> Result<Ava, &'static str> {
    let (attr_type, value) = input.split_once('=').ok_or("attribute without '='")?;
    let attr_type = attr_type.trim();
    if attr_type.is_empty() {
        return Err("empty attribute type");
    }
    let attr_type = attr_type
        .strip_prefix("OID.")
        .or_else(|| attr_type.strip_prefix("oid."))
        .unwrap_or(attr_type)
        .to_ascii_uppercase();
    let value = unescape(value.trim())?;
    let canonical: String = value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    Ok(Ava {
        attr_type: attr_type.into(),
        value: canonical.into(),
    })
}

/// Split on any of `separators` outside escapes and quoted strings.
fn split_unescaped<'a>(input: &'a str, separators: &[char]) -> Result<Vec<&'a str>, &'static str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    let mut quoted = false;
    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => quoted = !quoted,
            c if !quoted && separators.contains(&c) => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if escaped {
        return Err("dangling escape");
    }
    if quoted {
        return Err("unterminated quoted value");
    }
    parts.push(&input[start..]);
    if parts.iter().any(|p| p.trim().is_empty()) {
        return Err("empty relative distinguished name");
    }
    Ok(parts)
}

/// Resolve `\c`, `\hh` escapes and surrounding quotes.
fn unescape(value: &str) -> Result<String, &'static str> {
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    let mut bytes = Vec::with_capacity(value.len());
    let mut iter = value.as_bytes().iter().copied().peekable();
    while let Some(b) = iter.next() {
        if b != b'\\' {
            bytes.push(b);
            continue;
        }
        let first = iter.next().ok_or("dangling escape")?;
        let second = iter.peek().copied();
        match (hex_digit(first), second.and_then(hex_digit)) {
            (Some(hi), Some(lo)) => {
                iter.next();
                bytes.push((hi << 4) | lo);
            }
            _ => bytes.push(first),
        }
    }
    String::from_utf8(bytes).map_err(|_| "escaped bytes are not UTF-8")
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

impl PartialEq for X500Name {
    fn eq(&self, other: &Self) -> bool {
        self.rdns == other.rdns
    }
}

impl Eq for X500Name {}

impl Hash for X500Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rdns.hash(state);
    }
}

impl fmt::Display for X500Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
