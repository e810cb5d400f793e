//! Expression nodes evaluated against a request.
//!
//! Expression trees are built once when a policy is bound and evaluated for
//! every request. Nodes hold no per-request state; everything that varies
//! between requests is reached through the [`EvaluationContext`].

use std::fmt;
use std::sync::Arc;

use pdp_values::{missing_attribute, AttributeValue, Datatype, EvalResult, PrimitiveKind, Value};

use crate::call::{FunctionCall, SharedFunction};
use crate::context::{AttributeKey, EvaluationContext};
use crate::stack::nested_apply;

/// An evaluable node of a policy expression tree.
pub trait Expression: Send + Sync + fmt::Debug {
    /// Datatype of every value this expression produces.
    fn datatype(&self) -> Datatype;

    /// Evaluate against the current request.
    fn evaluate(&self, ctx: &mut dyn EvaluationContext) -> EvalResult<Value>;

    /// The value, when it is known without a request.
    fn constant(&self) -> Option<&Value> {
        None
    }
}

/// An argument handed to a function at bind time.
#[derive(Clone, Debug)]
pub enum Argument {
    /// A value-producing expression.
    Expr(Arc<dyn Expression>),
    /// A function reference, accepted only by higher-order functions.
    Function(SharedFunction),
}

impl Argument {
    /// Wrap an expression.
    pub fn expr(expr: impl Expression + 'static) -> Self {
        Argument::Expr(Arc::new(expr))
    }

    /// Wrap a constant value.
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::expr(Constant::new(value))
    }

    /// Wrap a function reference.
    pub fn function(function: SharedFunction) -> Self {
        Argument::Function(function)
    }

    /// Datatype of an expression argument.
    pub fn datatype(&self) -> Option<Datatype> {
        match self {
            Argument::Expr(e) => Some(e.datatype()),
            Argument::Function(_) => None,
        }
    }
}

impl From<Apply> for Argument {
    fn from(apply: Apply) -> Self {
        Self::expr(apply)
    }
}

// Constant

/// A literal value.
#[derive(Clone, Debug)]
pub struct Constant {
    value: Value,
}

impl Constant {
    pub fn new(value: impl Into<Value>) -> Self {
        Constant {
            value: value.into(),
        }
    }

    /// Parse a literal from its lexical form.
    pub fn parse(kind: PrimitiveKind, lexical: &str) -> EvalResult<Self> {
        AttributeValue::parse(kind, lexical).map(Self::new)
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Expression for Constant {
    fn datatype(&self) -> Datatype {
        self.value.datatype()
    }

    fn evaluate(&self, _ctx: &mut dyn EvaluationContext) -> EvalResult<Value> {
        Ok(self.value.clone())
    }

    fn constant(&self) -> Option<&Value> {
        Some(&self.value)
    }
}

// Attribute designator

/// Reference to a request attribute; always produces a bag.
#[derive(Clone, Debug)]
pub struct AttributeDesignator {
    key: AttributeKey,
    kind: PrimitiveKind,
    must_be_present: bool,
}

impl AttributeDesignator {
    pub fn new(key: AttributeKey, kind: PrimitiveKind) -> Self {
        AttributeDesignator {
            key,
            kind,
            must_be_present: false,
        }
    }

    /// Fail with a missing-attribute error instead of yielding an empty bag.
    #[must_use]
    pub fn must_be_present(mut self, must_be_present: bool) -> Self {
        self.must_be_present = must_be_present;
        self
    }

    pub fn key(&self) -> &AttributeKey {
        &self.key
    }
}

impl Expression for AttributeDesignator {
    fn datatype(&self) -> Datatype {
        self.kind.bag()
    }

    fn evaluate(&self, ctx: &mut dyn EvaluationContext) -> EvalResult<Value> {
        let bag = ctx.resolve_attribute(&self.key, self.kind)?;
        if bag.is_empty() && self.must_be_present {
            tracing::debug!(attribute = %self.key, "required attribute is absent");
            return Err(missing_attribute(&self.key));
        }
        Ok(Value::Bag(bag))
    }
}

// Variable reference

/// Named shared sub-expression, evaluated at most once per request.
#[derive(Clone, Debug)]
pub struct VariableReference {
    id: Arc<str>,
    definition: Arc<dyn Expression>,
}

impl VariableReference {
    pub fn new(id: &str, definition: Arc<dyn Expression>) -> Self {
        VariableReference {
            id: Arc::from(id),
            definition,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Expression for VariableReference {
    fn datatype(&self) -> Datatype {
        self.definition.datatype()
    }

    fn evaluate(&self, ctx: &mut dyn EvaluationContext) -> EvalResult<Value> {
        if let Some(value) = ctx.variable(&self.id) {
            return Ok(value);
        }
        let value = self
            .definition
            .evaluate(ctx)
            .map_err(|e| e.with_note(format!("in variable `{}`", self.id)))?;
        ctx.cache_variable(&self.id, value.clone());
        Ok(value)
    }

    fn constant(&self) -> Option<&Value> {
        self.definition.constant()
    }
}

// Apply

/// A bound function application.
#[derive(Debug)]
pub struct Apply {
    function_id: Arc<str>,
    call: Box<dyn FunctionCall>,
}

impl Apply {
    pub fn new(function_id: &str, call: Box<dyn FunctionCall>) -> Self {
        Apply {
            function_id: Arc::from(function_id),
            call,
        }
    }

    pub fn function_id(&self) -> &str {
        &self.function_id
    }

    pub fn call(&self) -> &dyn FunctionCall {
        &*self.call
    }
}

impl Expression for Apply {
    fn datatype(&self) -> Datatype {
        self.call.return_type()
    }

    fn evaluate(&self, ctx: &mut dyn EvaluationContext) -> EvalResult<Value> {
        nested_apply(|| self.call.evaluate(ctx))
    }
}
