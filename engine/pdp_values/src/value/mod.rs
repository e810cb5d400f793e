//! Typed attribute values and the single-or-bag `Value` union.
//!
//! `AttributeValue` is a closed tagged union with one variant per primitive
//! kind. Heap payloads (strings, byte strings, names) are `Heap<T>`, so a
//! clone never copies data. Values are immutable once built.

mod double;
mod duration;
mod heap;
mod integer;
mod names;
mod network;
mod temporal;

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::bag::Bag;
use crate::datatype::{Datatype, PrimitiveKind};
use crate::errors::{argument_type_mismatch, invalid_lexical, EvalResult};

pub use duration::{DayTimeDuration, YearMonthDuration};
pub use heap::Heap;
pub use integer::Integer;
pub use names::{Rfc822Name, X500Name};
pub use network::{DnsName, IpAddress, PortRange};
pub use temporal::{Date, DateTime, Time};

/// Characters `xs:anyURI` rejects besides whitespace.
const URI_FORBIDDEN: &[char] = &['<', '>', '"', '{', '}', '|', '\\', '^', '`'];

/// A single typed attribute value.
#[derive(Clone, Debug)]
pub enum AttributeValue {
    String(Heap<str>),
    Boolean(bool),
    Integer(Integer),
    Double(f64),
    Time(Time),
    Date(Date),
    DateTime(DateTime),
    DayTimeDuration(DayTimeDuration),
    YearMonthDuration(YearMonthDuration),
    AnyUri(Heap<str>),
    HexBinary(Heap<[u8]>),
    Base64Binary(Heap<[u8]>),
    Rfc822Name(Heap<Rfc822Name>),
    X500Name(Heap<X500Name>),
    IpAddress(IpAddress),
    DnsName(Heap<DnsName>),
}

// Factory methods

impl AttributeValue {
    /// Create a string value.
    #[inline]
    pub fn string(s: &str) -> Self {
        AttributeValue::String(Heap::from_text(s))
    }

    /// Create a boolean value.
    #[inline]
    pub const fn boolean(b: bool) -> Self {
        AttributeValue::Boolean(b)
    }

    /// Create an integer value.
    #[inline]
    pub const fn integer(n: i64) -> Self {
        AttributeValue::Integer(Integer::new(n))
    }

    /// Create a double value.
    #[inline]
    pub const fn double(d: f64) -> Self {
        AttributeValue::Double(d)
    }

    /// Create an anyURI value, rejecting characters not allowed in URIs.
    pub fn any_uri(s: &str) -> EvalResult<Self> {
        if s.chars().any(|c| c.is_whitespace() || URI_FORBIDDEN.contains(&c)) {
            return Err(invalid_lexical("anyURI", s, "character not allowed in a URI"));
        }
        Ok(AttributeValue::AnyUri(Heap::from_text(s)))
    }

    /// Create a hexBinary value from raw bytes.
    pub fn hex_binary(bytes: Vec<u8>) -> Self {
        AttributeValue::HexBinary(Heap::from_vec(bytes))
    }

    /// Create a base64Binary value from raw bytes.
    pub fn base64_binary(bytes: Vec<u8>) -> Self {
        AttributeValue::Base64Binary(Heap::from_vec(bytes))
    }

    /// Wrap an rfc822Name.
    pub fn rfc822_name(name: Rfc822Name) -> Self {
        AttributeValue::Rfc822Name(Heap::new(name))
    }

    /// Wrap an x500Name.
    pub fn x500_name(name: X500Name) -> Self {
        AttributeValue::X500Name(Heap::new(name))
    }

    /// Wrap a dnsName.
    pub fn dns_name(name: DnsName) -> Self {
        AttributeValue::DnsName(Heap::new(name))
    }

    /// Parse a lexical form of the given kind.
    ///
    /// Fails with a Syntax error when `lexical` does not conform.
    pub fn parse(kind: PrimitiveKind, lexical: &str) -> EvalResult<Self> {
        Ok(match kind {
            PrimitiveKind::String => AttributeValue::string(lexical),
            PrimitiveKind::Boolean => AttributeValue::Boolean(match lexical {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => return Err(invalid_lexical("boolean", lexical, "expected true, false, 1 or 0")),
            }),
            PrimitiveKind::Integer => AttributeValue::Integer(Integer::parse(lexical)?),
            PrimitiveKind::Double => AttributeValue::Double(double::parse(lexical)?),
            PrimitiveKind::Time => AttributeValue::Time(Time::parse(lexical)?),
            PrimitiveKind::Date => AttributeValue::Date(Date::parse(lexical)?),
            PrimitiveKind::DateTime => AttributeValue::DateTime(DateTime::parse(lexical)?),
            PrimitiveKind::DayTimeDuration => {
                AttributeValue::DayTimeDuration(DayTimeDuration::parse(lexical)?)
            }
            PrimitiveKind::YearMonthDuration => {
                AttributeValue::YearMonthDuration(YearMonthDuration::parse(lexical)?)
            }
            PrimitiveKind::AnyUri => AttributeValue::any_uri(lexical)?,
            PrimitiveKind::HexBinary => AttributeValue::hex_binary(
                hex::decode(lexical)
                    .map_err(|e| invalid_lexical("hexBinary", lexical, e.to_string()))?,
            ),
            PrimitiveKind::Base64Binary => {
                let compact: String = lexical.chars().filter(|c| !c.is_whitespace()).collect();
                AttributeValue::base64_binary(
                    BASE64
                        .decode(compact)
                        .map_err(|e| invalid_lexical("base64Binary", lexical, e.to_string()))?,
                )
            }
            PrimitiveKind::Rfc822Name => AttributeValue::rfc822_name(Rfc822Name::parse(lexical)?),
            PrimitiveKind::X500Name => AttributeValue::x500_name(X500Name::parse(lexical)?),
            PrimitiveKind::IpAddress => AttributeValue::IpAddress(IpAddress::parse(lexical)?),
            PrimitiveKind::DnsName => AttributeValue::dns_name(DnsName::parse(lexical)?),
        })
    }
}

// Inspection

impl AttributeValue {
    /// The primitive kind of this value.
    pub const fn kind(&self) -> PrimitiveKind {
        match self {
            AttributeValue::String(_) => PrimitiveKind::String,
            AttributeValue::Boolean(_) => PrimitiveKind::Boolean,
            AttributeValue::Integer(_) => PrimitiveKind::Integer,
            AttributeValue::Double(_) => PrimitiveKind::Double,
            AttributeValue::Time(_) => PrimitiveKind::Time,
            AttributeValue::Date(_) => PrimitiveKind::Date,
            AttributeValue::DateTime(_) => PrimitiveKind::DateTime,
            AttributeValue::DayTimeDuration(_) => PrimitiveKind::DayTimeDuration,
            AttributeValue::YearMonthDuration(_) => PrimitiveKind::YearMonthDuration,
            AttributeValue::AnyUri(_) => PrimitiveKind::AnyUri,
            AttributeValue::HexBinary(_) => PrimitiveKind::HexBinary,
            AttributeValue::Base64Binary(_) => PrimitiveKind::Base64Binary,
            AttributeValue::Rfc822Name(_) => PrimitiveKind::Rfc822Name,
            AttributeValue::X500Name(_) => PrimitiveKind::X500Name,
            AttributeValue::IpAddress(_) => PrimitiveKind::IpAddress,
            AttributeValue::DnsName(_) => PrimitiveKind::DnsName,
        }
    }

    /// The single-value datatype of this value.
    #[inline]
    pub const fn datatype(&self) -> Datatype {
        self.kind().single()
    }

    /// Text of a string or anyURI value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) | AttributeValue::AnyUri(s) => Some(&**s),
            _ => None,
        }
    }

    /// Boolean payload.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer payload.
    pub const fn as_integer(&self) -> Option<Integer> {
        match self {
            AttributeValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Double payload.
    pub const fn as_double(&self) -> Option<f64> {
        match self {
            AttributeValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Three-way compare of two values of the same ordered kind.
    ///
    /// Integer, double and string compare totally. Time, date and dateTime
    /// compare partially and may fail with Indeterminate. Any other pairing
    /// is a type error.
    pub fn compare(&self, other: &AttributeValue) -> EvalResult<Ordering> {
        match (self, other) {
            (AttributeValue::Integer(a), AttributeValue::Integer(b)) => Ok(a.cmp(b)),
            (AttributeValue::Double(a), AttributeValue::Double(b)) => {
                Ok(a.partial_cmp(b).unwrap_or_else(|| a.total_cmp(b)))
            }
            (AttributeValue::String(a), AttributeValue::String(b)) => Ok(a.cmp(b)),
            (AttributeValue::Time(a), AttributeValue::Time(b)) => a.compare(b),
            (AttributeValue::Date(a), AttributeValue::Date(b)) => a.compare(b),
            (AttributeValue::DateTime(a), AttributeValue::DateTime(b)) => a.compare(b),
            _ => Err(argument_type_mismatch(
                "compare",
                2,
                &self.datatype(),
                &other.datatype(),
            )),
        }
    }
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        use AttributeValue as V;
        match (self, other) {
            (V::String(a), V::String(b)) | (V::AnyUri(a), V::AnyUri(b)) => a == b,
            (V::Boolean(a), V::Boolean(b)) => a == b,
            (V::Integer(a), V::Integer(b)) => a == b,
            (V::Double(a), V::Double(b)) => double::eq(*a, *b),
            (V::Time(a), V::Time(b)) => a == b,
            (V::Date(a), V::Date(b)) => a == b,
            (V::DateTime(a), V::DateTime(b)) => a == b,
            (V::DayTimeDuration(a), V::DayTimeDuration(b)) => a == b,
            (V::YearMonthDuration(a), V::YearMonthDuration(b)) => a == b,
            (V::HexBinary(a), V::HexBinary(b)) | (V::Base64Binary(a), V::Base64Binary(b)) => {
                a == b
            }
            (V::Rfc822Name(a), V::Rfc822Name(b)) => a == b,
            (V::X500Name(a), V::X500Name(b)) => a == b,
            (V::IpAddress(a), V::IpAddress(b)) => a == b,
            (V::DnsName(a), V::DnsName(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for AttributeValue {}

impl Hash for AttributeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            AttributeValue::String(s) | AttributeValue::AnyUri(s) => s.hash(state),
            AttributeValue::Boolean(b) => b.hash(state),
            AttributeValue::Integer(n) => n.hash(state),
            AttributeValue::Double(d) => double::hash(*d, state),
            AttributeValue::Time(t) => t.hash(state),
            AttributeValue::Date(d) => d.hash(state),
            AttributeValue::DateTime(dt) => dt.hash(state),
            AttributeValue::DayTimeDuration(d) => d.hash(state),
            AttributeValue::YearMonthDuration(d) => d.hash(state),
            AttributeValue::HexBinary(b) | AttributeValue::Base64Binary(b) => b.hash(state),
            AttributeValue::Rfc822Name(n) => n.hash(state),
            AttributeValue::X500Name(n) => n.hash(state),
            AttributeValue::IpAddress(a) => a.hash(state),
            AttributeValue::DnsName(n) => n.hash(state),
        }
    }
}

/// Canonical lexical form.
impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) | AttributeValue::AnyUri(s) => f.write_str(s),
            AttributeValue::Boolean(b) => write!(f, "{b}"),
            AttributeValue::Integer(n) => write!(f, "{n}"),
            AttributeValue::Double(d) => double::write(f, *d),
            AttributeValue::Time(t) => write!(f, "{t}"),
            AttributeValue::Date(d) => write!(f, "{d}"),
            AttributeValue::DateTime(dt) => write!(f, "{dt}"),
            AttributeValue::DayTimeDuration(d) => write!(f, "{d}"),
            AttributeValue::YearMonthDuration(d) => write!(f, "{d}"),
            AttributeValue::HexBinary(b) => f.write_str(&hex::encode_upper(&**b)),
            AttributeValue::Base64Binary(b) => f.write_str(&BASE64.encode(&**b)),
            AttributeValue::Rfc822Name(n) => write!(f, "{}", **n),
            AttributeValue::X500Name(n) => write!(f, "{}", **n),
            AttributeValue::IpAddress(a) => write!(f, "{a}"),
            AttributeValue::DnsName(n) => write!(f, "{}", **n),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Boolean(b)
    }
}

impl From<Integer> for AttributeValue {
    fn from(n: Integer) -> Self {
        AttributeValue::Integer(n)
    }
}

impl From<f64> for AttributeValue {
    fn from(d: f64) -> Self {
        AttributeValue::Double(d)
    }
}

/// Result of evaluating an expression: one value or a bag of values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Single(AttributeValue),
    Bag(Bag),
}

impl Value {
    /// Datatype of this value, bag flag included.
    pub fn datatype(&self) -> Datatype {
        match self {
            Value::Single(v) => v.datatype(),
            Value::Bag(b) => b.datatype(),
        }
    }

    /// The single value, if this is not a bag.
    pub fn as_single(&self) -> Option<&AttributeValue> {
        match self {
            Value::Single(v) => Some(v),
            Value::Bag(_) => None,
        }
    }

    /// The bag, if this is a bag.
    pub fn as_bag(&self) -> Option<&Bag> {
        match self {
            Value::Bag(b) => Some(b),
            Value::Single(_) => None,
        }
    }

    /// Boolean payload of a single boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        self.as_single().and_then(AttributeValue::as_bool)
    }

    /// Consume into the single value, if this is not a bag.
    pub fn into_single(self) -> Option<AttributeValue> {
        match self {
            Value::Single(v) => Some(v),
            Value::Bag(_) => None,
        }
    }

    /// Consume into the bag, if this is a bag.
    pub fn into_bag(self) -> Option<Bag> {
        match self {
            Value::Bag(b) => Some(b),
            Value::Single(_) => None,
        }
    }
}

impl From<AttributeValue> for Value {
    fn from(v: AttributeValue) -> Self {
        Value::Single(v)
    }
}

impl From<Bag> for Value {
    fn from(b: Bag) -> Self {
        Value::Bag(b)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Single(AttributeValue::Boolean(b))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Single(v) => write!(f, "{v}"),
            Value::Bag(b) => write!(f, "{b}"),
        }
    }
}
