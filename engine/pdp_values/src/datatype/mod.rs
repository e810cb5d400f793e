//! Datatypes: the closed set of primitive kinds and their single/bag shapes.
//!
//! Datatypes are nominal. Two datatypes are equal only when their primitive
//! kind and bag flag are both equal; there is no subtyping or widening.
//! A bag always wraps exactly one primitive kind, so bags of bags and bags
//! of mixed kinds cannot be expressed.

use std::fmt;

use crate::errors::{unknown_datatype, EvalResult};

/// Primitive datatype of a single attribute value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    String,
    Boolean,
    Integer,
    Double,
    Time,
    Date,
    DateTime,
    DayTimeDuration,
    YearMonthDuration,
    AnyUri,
    HexBinary,
    Base64Binary,
    Rfc822Name,
    X500Name,
    IpAddress,
    DnsName,
}

const XS: &str = "http://www.w3.org/2001/XMLSchema#";

impl PrimitiveKind {
    /// Every primitive kind, in declaration order.
    pub const ALL: [PrimitiveKind; 16] = [
        PrimitiveKind::String,
        PrimitiveKind::Boolean,
        PrimitiveKind::Integer,
        PrimitiveKind::Double,
        PrimitiveKind::Time,
        PrimitiveKind::Date,
        PrimitiveKind::DateTime,
        PrimitiveKind::DayTimeDuration,
        PrimitiveKind::YearMonthDuration,
        PrimitiveKind::AnyUri,
        PrimitiveKind::HexBinary,
        PrimitiveKind::Base64Binary,
        PrimitiveKind::Rfc822Name,
        PrimitiveKind::X500Name,
        PrimitiveKind::IpAddress,
        PrimitiveKind::DnsName,
    ];

    /// Standard identifier URI of this datatype.
    pub const fn id(self) -> &'static str {
        match self {
            PrimitiveKind::String => "http://www.w3.org/2001/XMLSchema#string",
            PrimitiveKind::Boolean => "http://www.w3.org/2001/XMLSchema#boolean",
            PrimitiveKind::Integer => "http://www.w3.org/2001/XMLSchema#integer",
            PrimitiveKind::Double => "http://www.w3.org/2001/XMLSchema#double",
            PrimitiveKind::Time => "http://www.w3.org/2001/XMLSchema#time",
            PrimitiveKind::Date => "http://www.w3.org/2001/XMLSchema#date",
            PrimitiveKind::DateTime => "http://www.w3.org/2001/XMLSchema#dateTime",
            PrimitiveKind::DayTimeDuration => "http://www.w3.org/2001/XMLSchema#dayTimeDuration",
            PrimitiveKind::YearMonthDuration => {
                "http://www.w3.org/2001/XMLSchema#yearMonthDuration"
            }
            PrimitiveKind::AnyUri => "http://www.w3.org/2001/XMLSchema#anyURI",
            PrimitiveKind::HexBinary => "http://www.w3.org/2001/XMLSchema#hexBinary",
            PrimitiveKind::Base64Binary => "http://www.w3.org/2001/XMLSchema#base64Binary",
            PrimitiveKind::Rfc822Name => "urn:oasis:names:tc:xacml:1.0:data-type:rfc822Name",
            PrimitiveKind::X500Name => "urn:oasis:names:tc:xacml:1.0:data-type:x500Name",
            PrimitiveKind::IpAddress => "urn:oasis:names:tc:xacml:2.0:data-type:ipAddress",
            PrimitiveKind::DnsName => "urn:oasis:names:tc:xacml:2.0:data-type:dnsName",
        }
    }

    /// Short name used to build standard function identifiers
    /// (`string` in `string-equal`, `dateTime` in `dateTime-one-and-only`).
    pub const fn short_name(self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Time => "time",
            PrimitiveKind::Date => "date",
            PrimitiveKind::DateTime => "dateTime",
            PrimitiveKind::DayTimeDuration => "dayTimeDuration",
            PrimitiveKind::YearMonthDuration => "yearMonthDuration",
            PrimitiveKind::AnyUri => "anyURI",
            PrimitiveKind::HexBinary => "hexBinary",
            PrimitiveKind::Base64Binary => "base64Binary",
            PrimitiveKind::Rfc822Name => "rfc822Name",
            PrimitiveKind::X500Name => "x500Name",
            PrimitiveKind::IpAddress => "ipAddress",
            PrimitiveKind::DnsName => "dnsName",
        }
    }

    /// Resolve a datatype identifier URI.
    pub fn from_id(id: &str) -> EvalResult<Self> {
        // The two duration types were published under an XACML namespace
        // before XML Schema 1.1 adopted them.
        let id = match id {
            "http://www.w3.org/TR/2002/WD-xquery-operators-20020816#dayTimeDuration"
            | "urn:oasis:names:tc:xacml:2.0:data-type:dayTimeDuration" => {
                return Ok(PrimitiveKind::DayTimeDuration)
            }
            "http://www.w3.org/TR/2002/WD-xquery-operators-20020816#yearMonthDuration"
            | "urn:oasis:names:tc:xacml:2.0:data-type:yearMonthDuration" => {
                return Ok(PrimitiveKind::YearMonthDuration)
            }
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == id)
            .ok_or_else(|| unknown_datatype(id))
    }

    /// Resolve a short name (`dateTime`, `anyURI`).
    pub fn from_short_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.short_name() == name)
    }

    /// Whether values of this kind have a total order (three-way compare
    /// that never fails).
    pub const fn is_totally_ordered(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Integer | PrimitiveKind::Double | PrimitiveKind::String
        )
    }

    /// Whether values of this kind have a partial order whose comparison
    /// may be indeterminate.
    pub const fn is_temporal(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Time | PrimitiveKind::Date | PrimitiveKind::DateTime
        )
    }

    /// The single-value datatype of this kind.
    #[inline]
    pub const fn single(self) -> Datatype {
        Datatype {
            kind: self,
            bag: false,
        }
    }

    /// The bag datatype of this kind.
    #[inline]
    pub const fn bag(self) -> Datatype {
        Datatype {
            kind: self,
            bag: true,
        }
    }

    /// Whether the identifier lives in the XML Schema namespace.
    pub fn is_xml_schema(self) -> bool {
        self.id().starts_with(XS)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Datatype of an expression: a primitive kind, single or bag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Datatype {
    kind: PrimitiveKind,
    bag: bool,
}

impl Datatype {
    /// The underlying primitive kind.
    #[inline]
    pub const fn kind(self) -> PrimitiveKind {
        self.kind
    }

    /// Whether this is a bag datatype.
    #[inline]
    pub const fn is_bag(self) -> bool {
        self.bag
    }

    /// Same kind, single-value shape.
    #[inline]
    pub const fn element(self) -> Datatype {
        self.kind.single()
    }

    /// Same kind, bag shape.
    #[inline]
    pub const fn as_bag(self) -> Datatype {
        self.kind.bag()
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bag {
            write!(f, "bag<{}>", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}
