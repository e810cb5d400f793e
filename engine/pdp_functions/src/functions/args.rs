//! Typed access to resolved argument values.
//!
//! Signatures are validated before a body ever runs, so a failed extraction
//! here means a call was evaluated with unchecked deferred arguments. It is
//! still reported as an error rather than trusted.

use pdp_values::{
    argument_type_mismatch, arity_mismatch, AttributeValue, Date, DateTime, DayTimeDuration,
    DnsName, EvalResult, Integer, IpAddress, PrimitiveKind, Rfc822Name, Time, X500Name,
    YearMonthDuration,
};

/// Extract a typed payload from an attribute value.
pub(crate) trait FromArg<'a>: Sized {
    const KIND: PrimitiveKind;

    fn from_arg(value: &'a AttributeValue) -> Option<Self>;
}

macro_rules! from_arg {
    ($lt:lifetime, $ty:ty, $kind:ident, $v:ident => $e:expr) => {
        impl<$lt> FromArg<$lt> for $ty {
            const KIND: PrimitiveKind = PrimitiveKind::$kind;

            fn from_arg(value: &$lt AttributeValue) -> Option<Self> {
                match value {
                    AttributeValue::$kind($v) => Some($e),
                    _ => None,
                }
            }
        }
    };
}

from_arg!('a, bool, Boolean, b => *b);
from_arg!('a, Integer, Integer, n => *n);
from_arg!('a, f64, Double, d => *d);
from_arg!('a, &'a DateTime, DateTime, dt => dt);
from_arg!('a, &'a Date, Date, d => d);
from_arg!('a, &'a Time, Time, t => t);
from_arg!('a, &'a DayTimeDuration, DayTimeDuration, d => d);
from_arg!('a, &'a YearMonthDuration, YearMonthDuration, d => d);
from_arg!('a, &'a Rfc822Name, Rfc822Name, n => &**n);
from_arg!('a, &'a X500Name, X500Name, n => &**n);
from_arg!('a, &'a IpAddress, IpAddress, a => a);
from_arg!('a, &'a DnsName, DnsName, n => &**n);

/// Argument slice tagged with the owning function's identifier.
#[derive(Copy, Clone)]
pub(crate) struct Args<'a> {
    function: &'a str,
    values: &'a [AttributeValue],
}

impl<'a> Args<'a> {
    pub(crate) fn new(function: &'a str, values: &'a [AttributeValue]) -> Self {
        Args { function, values }
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn value(&self, index: usize) -> EvalResult<&'a AttributeValue> {
        self.values
            .get(index)
            .ok_or_else(|| arity_mismatch(self.function, index + 1, false, self.values.len()))
    }

    pub(crate) fn get<T: FromArg<'a>>(&self, index: usize) -> EvalResult<T> {
        let value = self.value(index)?;
        T::from_arg(value).ok_or_else(|| {
            argument_type_mismatch(self.function, index + 1, &T::KIND, &value.datatype())
        })
    }

    /// Text of a string or anyURI argument.
    pub(crate) fn text(&self, index: usize) -> EvalResult<&'a str> {
        let value = self.value(index)?;
        value.as_str().ok_or_else(|| {
            argument_type_mismatch(self.function, index + 1, &PrimitiveKind::String, &value.datatype())
        })
    }
}
