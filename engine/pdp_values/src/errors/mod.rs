//! Error types for value parsing and function evaluation.
//!
//! # Structured Error Categories
//!
//! `EvalErrorKind` carries the typed error condition; `EvalError` pairs it
//! with the rendered message and optional context notes. Factory functions
//! (e.g. `division_by_zero()`) are the public API and populate both.
//!
//! Every kind maps onto exactly one protocol [`Status`]:
//! - `Syntax`: a lexical form does not conform to its datatype, or a
//!   function was bound with a statically wrong argument list. Detected at
//!   or before call construction, never retried.
//! - `Indeterminate`: anything depending on runtime data (missing attribute,
//!   divide-by-zero, ambiguous date comparison, failing sub-call).
//!
//! Wrapping kinds (`ArgumentIndeterminate`, `SubFunctionIndeterminate`) keep
//! the original failure as their `source()` so diagnostics can walk back to
//! the root cause.

use std::fmt;

use crate::value::Value;

/// Result of evaluation.
pub type EvalResult<T = Value> = Result<T, EvalError>;

/// Protocol status of a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// Malformed lexical value or statically wrong function application.
    Syntax,
    /// Runtime-data-dependent processing failure.
    Indeterminate,
}

impl Status {
    /// The XACML status code URI for this status.
    pub const fn uri(self) -> &'static str {
        match self {
            Status::Syntax => "urn:oasis:names:tc:xacml:1.0:status:syntax-error",
            Status::Indeterminate => "urn:oasis:names:tc:xacml:1.0:status:processing-error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Syntax => write!(f, "syntax error"),
            Status::Indeterminate => write!(f, "indeterminate"),
        }
    }
}

/// Status URI reported when the root cause is a missing attribute.
const MISSING_ATTRIBUTE_URI: &str = "urn:oasis:names:tc:xacml:1.0:status:missing-attribute";

/// Typed error category.
///
/// Each variant carries the structured data for its condition so callers
/// can match on kinds instead of parsing messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    // Lexical
    InvalidLexical {
        datatype: &'static str,
        input: String,
        reason: String,
    },
    UnknownDatatype {
        id: String,
    },

    // Binding
    ArityMismatch {
        function: String,
        expected: usize,
        variadic: bool,
        got: usize,
    },
    ArgumentTypeMismatch {
        function: String,
        position: usize,
        expected: String,
        got: String,
    },
    UnknownFunction {
        id: String,
    },
    InvalidSubFunction {
        function: String,
        reason: String,
    },
    InvalidPattern {
        pattern: String,
        reason: String,
    },

    // Configuration
    DuplicateFunction {
        id: String,
    },

    // Construction defect (programming error in a function implementation)
    StrategyMismatch {
        function: String,
        required: &'static str,
        declared: String,
    },

    // Arithmetic
    DivisionByZero,
    ModuloByZero,
    IntegerOverflow {
        operation: String,
    },
    NonFiniteResult {
        operation: String,
    },

    // Runtime data
    MissingAttribute {
        attribute: String,
    },
    IndeterminateComparison {
        left: String,
        right: String,
    },
    NotOneAndOnly {
        datatype: String,
        size: usize,
    },
    SubstringOutOfRange {
        begin: i64,
        end: i64,
        length: usize,
    },
    InvalidConversion {
        datatype: &'static str,
        input: String,
        reason: String,
    },

    // Wrapping
    ArgumentIndeterminate {
        position: usize,
        cause: Box<EvalError>,
    },
    SubFunctionIndeterminate {
        function: String,
        cause: Box<EvalError>,
    },

    /// Catch-all processing failure.
    Processing {
        message: String,
    },
}

impl EvalErrorKind {
    /// Protocol status for this kind.
    pub fn status(&self) -> Status {
        match self {
            Self::InvalidLexical { .. }
            | Self::UnknownDatatype { .. }
            | Self::ArityMismatch { .. }
            | Self::ArgumentTypeMismatch { .. }
            | Self::UnknownFunction { .. }
            | Self::InvalidSubFunction { .. }
            | Self::InvalidPattern { .. }
            | Self::DuplicateFunction { .. } => Status::Syntax,
            Self::StrategyMismatch { .. }
            | Self::DivisionByZero
            | Self::ModuloByZero
            | Self::IntegerOverflow { .. }
            | Self::NonFiniteResult { .. }
            | Self::MissingAttribute { .. }
            | Self::IndeterminateComparison { .. }
            | Self::NotOneAndOnly { .. }
            | Self::SubstringOutOfRange { .. }
            | Self::InvalidConversion { .. }
            | Self::ArgumentIndeterminate { .. }
            | Self::SubFunctionIndeterminate { .. }
            | Self::Processing { .. } => Status::Indeterminate,
        }
    }
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Lexical
            Self::InvalidLexical {
                datatype,
                input,
                reason,
            } => write!(f, "invalid {datatype} value '{input}': {reason}"),
            Self::UnknownDatatype { id } => write!(f, "unknown datatype: {id}"),

            // Binding
            Self::ArityMismatch {
                function,
                expected,
                variadic,
                got,
            } => {
                let arg_word = if *expected == 1 {
                    "argument"
                } else {
                    "arguments"
                };
                if *variadic {
                    write!(f, "{function} expects at least {expected} {arg_word}, got {got}")
                } else {
                    write!(f, "{function} expects {expected} {arg_word}, got {got}")
                }
            }
            Self::ArgumentTypeMismatch {
                function,
                position,
                expected,
                got,
            } => write!(
                f,
                "{function}: argument #{position} must be {expected}, got {got}"
            ),
            Self::UnknownFunction { id } => write!(f, "unknown function: {id}"),
            Self::InvalidSubFunction { function, reason } => {
                write!(f, "{function}: invalid sub-function: {reason}")
            }
            Self::InvalidPattern { pattern, reason } => {
                write!(f, "invalid regular expression '{pattern}': {reason}")
            }

            // Configuration
            Self::DuplicateFunction { id } => write!(f, "function already registered: {id}"),

            // Defect
            Self::StrategyMismatch {
                function,
                required,
                declared,
            } => write!(
                f,
                "{function}: implementation requires {required} evaluation, but signature is {declared}"
            ),

            // Arithmetic
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::ModuloByZero => write!(f, "modulo by zero"),
            Self::IntegerOverflow { operation } => {
                write!(f, "integer overflow in {operation}")
            }
            Self::NonFiniteResult { operation } => {
                write!(f, "{operation} produced a non-finite result")
            }

            // Runtime data
            Self::MissingAttribute { attribute } => {
                write!(f, "missing required attribute: {attribute}")
            }
            Self::IndeterminateComparison { left, right } => write!(
                f,
                "order of {left} and {right} is indeterminate (timezone missing on one side)"
            ),
            Self::NotOneAndOnly { datatype, size } => write!(
                f,
                "{datatype}-one-and-only expects a bag of exactly one value, got {size}"
            ),
            Self::SubstringOutOfRange { begin, end, length } => write!(
                f,
                "substring bounds [{begin}, {end}) out of range for length {length}"
            ),
            Self::InvalidConversion {
                datatype,
                input,
                reason,
            } => write!(f, "cannot convert '{input}' to {datatype}: {reason}"),

            // Wrapping
            Self::ArgumentIndeterminate { position, cause } => {
                write!(f, "argument #{position} indeterminate: {cause}")
            }
            Self::SubFunctionIndeterminate { function, cause } => {
                write!(f, "call to sub-function {function} indeterminate: {cause}")
            }

            Self::Processing { message } => write!(f, "{message}"),
        }
    }
}

/// Evaluation error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    /// Structured error category.
    pub kind: EvalErrorKind,
    /// Human-readable error message, equal to `kind.to_string()`.
    pub message: String,
    /// Additional context, innermost first.
    pub notes: Vec<String>,
}

impl EvalError {
    /// Create a processing error with just a message.
    ///
    /// Prefer specific factory functions when a structured kind exists.
    pub fn new(message: impl Into<String>) -> Self {
        Self::from_kind(EvalErrorKind::Processing {
            message: message.into(),
        })
    }

    /// Create an error from a structured kind.
    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            notes: Vec::new(),
        }
    }

    /// Protocol status of this error.
    pub fn status(&self) -> Status {
        self.kind.status()
    }

    /// Status code URI, refined to `missing-attribute` when that is the root cause.
    pub fn status_uri(&self) -> &'static str {
        if matches!(self.root_cause().kind, EvalErrorKind::MissingAttribute { .. }) {
            MISSING_ATTRIBUTE_URI
        } else {
            self.status().uri()
        }
    }

    /// Whether this error signals a bug in a function implementation rather
    /// than a policy or request problem.
    pub fn is_defect(&self) -> bool {
        matches!(self.kind, EvalErrorKind::StrategyMismatch { .. })
    }

    /// Whether this is an Indeterminate (runtime) failure.
    pub fn is_indeterminate(&self) -> bool {
        self.status() == Status::Indeterminate
    }

    /// Follow wrapping kinds down to the original failure.
    pub fn root_cause(&self) -> &EvalError {
        let mut current = self;
        loop {
            match &current.kind {
                EvalErrorKind::ArgumentIndeterminate { cause, .. }
                | EvalErrorKind::SubFunctionIndeterminate { cause, .. } => current = cause,
                _ => return current,
            }
        }
    }

    /// Add a context note to this error.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for note in &self.notes {
            write!(f, " ({note})")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            EvalErrorKind::ArgumentIndeterminate { cause, .. }
            | EvalErrorKind::SubFunctionIndeterminate { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

// Lexical Errors

/// Lexical form does not conform to its datatype.
#[cold]
pub fn invalid_lexical(datatype: &'static str, input: &str, reason: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidLexical {
        datatype,
        input: input.to_string(),
        reason: reason.into(),
    })
}

/// Datatype identifier not recognized.
#[cold]
pub fn unknown_datatype(id: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnknownDatatype { id: id.to_string() })
}

// Argument and Signature Errors

/// Wrong number of arguments for a function.
#[cold]
pub fn arity_mismatch(function: &str, expected: usize, variadic: bool, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        function: function.to_string(),
        expected,
        variadic,
        got,
    })
}

/// Argument at 1-based `position` has the wrong datatype.
#[cold]
pub fn argument_type_mismatch(
    function: &str,
    position: usize,
    expected: &dyn fmt::Display,
    got: &dyn fmt::Display,
) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArgumentTypeMismatch {
        function: function.to_string(),
        position,
        expected: expected.to_string(),
        got: got.to_string(),
    })
}

/// No function registered under this identifier.
#[cold]
pub fn unknown_function(id: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnknownFunction { id: id.to_string() })
}

/// Sub-function passed to a higher-order function is not acceptable.
#[cold]
pub fn invalid_sub_function(function: &str, reason: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidSubFunction {
        function: function.to_string(),
        reason: reason.into(),
    })
}

/// Literal regular expression failed to compile.
#[cold]
pub fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.into(),
    })
}

// Registry Errors

/// Function identifier registered twice.
#[cold]
pub fn duplicate_function(id: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::DuplicateFunction { id: id.to_string() })
}

// Construction Defects

/// Function body strategy does not fit its own signature.
#[cold]
pub fn strategy_mismatch(function: &str, required: &'static str, declared: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::StrategyMismatch {
        function: function.to_string(),
        required,
        declared: declared.to_string(),
    })
}

// Arithmetic Errors

/// Division by zero error.
#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero)
}

/// Modulo by zero error.
#[cold]
pub fn modulo_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::ModuloByZero)
}

/// Integer overflow error.
#[cold]
pub fn integer_overflow(operation: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IntegerOverflow {
        operation: operation.to_string(),
    })
}

/// Floating point operation produced infinity or NaN.
#[cold]
pub fn non_finite_result(operation: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NonFiniteResult {
        operation: operation.to_string(),
    })
}

// Runtime Data Errors

/// Attribute required to be present resolved to an empty bag.
#[cold]
pub fn missing_attribute(attribute: &dyn fmt::Display) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MissingAttribute {
        attribute: attribute.to_string(),
    })
}

/// Partial-order comparison with no determinate answer.
#[cold]
pub fn indeterminate_comparison(left: &dyn fmt::Display, right: &dyn fmt::Display) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IndeterminateComparison {
        left: left.to_string(),
        right: right.to_string(),
    })
}

/// Bag given to `*-one-and-only` does not hold exactly one value.
#[cold]
pub fn not_one_and_only(datatype: &str, size: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotOneAndOnly {
        datatype: datatype.to_string(),
        size,
    })
}

/// Substring indices outside the string.
#[cold]
pub fn substring_out_of_range(begin: i64, end: i64, length: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::SubstringOutOfRange { begin, end, length })
}

/// Runtime string-to-datatype conversion failed.
#[cold]
pub fn invalid_conversion(datatype: &'static str, input: &str, reason: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidConversion {
        datatype,
        input: input.to_string(),
        reason: reason.into(),
    })
}

/// Generic processing failure.
#[cold]
pub fn processing_error(message: impl Into<String>) -> EvalError {
    EvalError::new(message)
}

// Wrapping

/// Wrap the failure of the argument at 1-based `position`.
#[cold]
pub fn argument_indeterminate(position: usize, cause: EvalError) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArgumentIndeterminate {
        position,
        cause: Box::new(cause),
    })
}

/// Wrap the failure of a higher-order function's sub-call.
#[cold]
pub fn sub_function_indeterminate(function: &str, cause: EvalError) -> EvalError {
    EvalError::from_kind(EvalErrorKind::SubFunctionIndeterminate {
        function: function.to_string(),
        cause: Box::new(cause),
    })
}
