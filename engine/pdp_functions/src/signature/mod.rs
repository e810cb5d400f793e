//! Function signatures and static argument validation.
//!
//! Typing is strict and nominal: an argument's datatype must equal the
//! declared parameter datatype exactly, bag flag included. There is no
//! widening from integer to double and no promotion of a single value to a
//! bag.

use std::fmt;
use std::sync::Arc;

use pdp_values::{argument_type_mismatch, arity_mismatch, Datatype, EvalResult};
use smallvec::SmallVec;

/// Parameter arrays are short; most functions take one to three.
pub type ParamList = SmallVec<[Datatype; 4]>;

/// Argument-shape class of a parameter list, computed once per signature.
///
/// Only the single/bag split matters here. Parameters of one shape may mix
/// primitive kinds (`string-substring` takes a string and two integers,
/// `integer-is-in` an integer and an integer bag, `dateTime-add-dayTimeDuration`
/// two kinds); each parameter's kind is still checked against the argument
/// at bind time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CallShape {
    /// Every parameter is a single value.
    AllPrimitive,
    /// Every parameter is a bag.
    AllBag,
    /// Leading single-value parameters followed by bag parameters.
    Mixed { primitive_count: usize },
}

impl CallShape {
    /// Classify a parameter list. `None` when bag and single parameters
    /// interleave, which only lazily-evaluated bodies can handle.
    pub fn classify(params: &[Datatype]) -> Option<CallShape> {
        let primitive_count = params.iter().take_while(|p| !p.is_bag()).count();
        if params[primitive_count..].iter().any(|p| !p.is_bag()) {
            return None;
        }
        Some(match primitive_count {
            n if n == params.len() => CallShape::AllPrimitive,
            0 => CallShape::AllBag,
            n => CallShape::Mixed { primitive_count: n },
        })
    }

    /// Name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            CallShape::AllPrimitive => "all-primitive",
            CallShape::AllBag => "all-bag",
            CallShape::Mixed { .. } => "mixed",
        }
    }
}

/// Declared parameter and return types of a function.
///
/// When variadic, the last parameter repeats and the minimum argument count
/// is one less than the number of declared parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionSignature {
    name: Arc<str>,
    return_type: Datatype,
    params: ParamList,
    variadic: bool,
    shape: Option<CallShape>,
}

impl FunctionSignature {
    /// Fixed-arity signature.
    pub fn fixed(name: &str, return_type: Datatype, params: &[Datatype]) -> Self {
        Self::build(name, return_type, params.iter().copied().collect(), false)
    }

    /// Variadic signature: `leading` parameters, then any number of
    /// `repeated` ones. Accepts at least `leading.len()` arguments.
    pub fn variadic(
        name: &str,
        return_type: Datatype,
        leading: &[Datatype],
        repeated: Datatype,
    ) -> Self {
        let mut params: ParamList = leading.iter().copied().collect();
        params.push(repeated);
        Self::build(name, return_type, params, true)
    }

    fn build(name: &str, return_type: Datatype, params: ParamList, variadic: bool) -> Self {
        let shape = CallShape::classify(&params);
        FunctionSignature {
            name: Arc::from(name),
            return_type,
            params,
            variadic,
            shape,
        }
    }

    /// Function identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared function identifier.
    pub fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// Return datatype.
    pub const fn return_type(&self) -> Datatype {
        self.return_type
    }

    /// Declared parameters, the repeated one last when variadic.
    pub fn params(&self) -> &[Datatype] {
        &self.params
    }

    /// Whether the last parameter repeats.
    pub const fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// Argument-shape class, `None` for interleaved parameter lists.
    pub const fn shape(&self) -> Option<CallShape> {
        self.shape
    }

    /// Smallest accepted argument count.
    pub fn min_arity(&self) -> usize {
        if self.variadic {
            self.params.len() - 1
        } else {
            self.params.len()
        }
    }

    /// Declared type of the argument at 0-based `index`, if any.
    pub fn param_type(&self, index: usize) -> Option<Datatype> {
        match self.params.get(index) {
            Some(t) => Some(*t),
            None if self.variadic => self.params.last().copied(),
            None => None,
        }
    }

    /// Whether `count` arguments are acceptable.
    pub fn accepts_count(&self, count: usize) -> bool {
        if self.variadic {
            count >= self.min_arity()
        } else {
            count == self.params.len()
        }
    }

    /// Validate a complete argument list.
    pub fn validate(&self, arg_types: &[Datatype]) -> EvalResult<()> {
        self.check_count(arg_types.len())?;
        self.check_types(0, arg_types)
    }

    /// Validate a static prefix followed by deferred argument types.
    pub fn validate_with_remaining(
        &self,
        static_types: &[Datatype],
        remaining: &[Datatype],
    ) -> EvalResult<()> {
        self.check_count(static_types.len() + remaining.len())?;
        self.check_types(0, static_types)?;
        self.check_types(static_types.len(), remaining)
    }

    /// Validate deferred arguments that start at 0-based `offset`.
    ///
    /// Same rules as [`validate`](Self::validate), restricted to the suffix.
    pub fn validate_remaining(&self, offset: usize, remaining: &[Datatype]) -> EvalResult<()> {
        self.check_count(offset + remaining.len())?;
        self.check_types(offset, remaining)
    }

    fn check_count(&self, count: usize) -> EvalResult<()> {
        if self.accepts_count(count) {
            Ok(())
        } else {
            Err(arity_mismatch(&self.name, self.min_arity(), self.variadic, count))
        }
    }

    fn check_types(&self, offset: usize, arg_types: &[Datatype]) -> EvalResult<()> {
        for (i, actual) in arg_types.iter().enumerate() {
            let index = offset + i;
            match self.param_type(index) {
                Some(expected) if expected == *actual => {}
                Some(expected) => {
                    return Err(argument_type_mismatch(&self.name, index + 1, &expected, actual));
                }
                None => {
                    return Err(arity_mismatch(
                        &self.name,
                        self.params.len(),
                        false,
                        offset + arg_types.len(),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{p}")?;
        }
        if self.variadic {
            f.write_str("...")?;
        }
        write!(f, ") -> {}", self.return_type)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
