//! Functions, bound calls and evaluation strategies.
//!
//! A [`Function`] is a canonical definition held by the registry. Binding it
//! to argument expressions produces a [`FunctionCall`], validated once and
//! evaluated any number of times against different evaluation contexts.
//!
//! # Evaluation strategies
//!
//! A first-order function pairs a signature with a [`Body`] whose variant
//! fixes how arguments are resolved before the body runs:
//!
//! - `Primitive`: every argument is resolved to a single value
//! - `Bag`: every argument is resolved to a bag
//! - `Mixed`: leading single values, then bags
//! - `Lazy`: the body pulls arguments itself, in any order, and may stop early
//!
//! The signature's [`CallShape`] is computed once per definition. Binding a
//! body whose strategy does not fit that shape is a defect in the function
//! definition and fails with `StrategyMismatch`, never with a Syntax error.
//!
//! # Deferred arguments
//!
//! When a function is the sub-function of a higher-order combinator, some
//! trailing arguments are only known at evaluation time. Their datatypes are
//! declared when the call is built, and the values are passed to
//! [`FunctionCall::evaluate_with`]. They are re-validated against the
//! signature tail unless the caller passes [`ArgCheck::Trusted`].

use std::fmt;
use std::sync::Arc;

use pdp_values::{
    argument_indeterminate, argument_type_mismatch, arity_mismatch, processing_error,
    strategy_mismatch, AttributeValue, Bag, Datatype, EvalResult, Integer, Value,
};
use smallvec::SmallVec;

use crate::context::EvaluationContext;
use crate::expr::{Argument, Expression};
use crate::signature::{CallShape, FunctionSignature};

/// Shared handle to a function definition.
pub type SharedFunction = Arc<dyn Function>;

/// Bound argument expressions.
pub type ArgExprs = SmallVec<[Arc<dyn Expression>; 4]>;

/// Whether deferred arguments are re-validated on each evaluation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArgCheck {
    /// Validate deferred argument types against the signature tail.
    Checked,
    /// Skip validation; the caller has already checked the types.
    Trusted,
}

/// A function definition.
pub trait Function: Send + Sync + fmt::Debug {
    /// Function identifier.
    fn id(&self) -> &str;

    /// Datatype returned by every call of this function.
    fn return_type(&self) -> Datatype;

    /// Signature of a first-order function.
    fn signature(&self) -> Option<&FunctionSignature> {
        None
    }

    /// Whether this function takes another function as an argument.
    fn is_higher_order(&self) -> bool {
        false
    }

    /// Bind to static arguments, followed at evaluation time by deferred
    /// arguments of the `remaining` datatypes.
    ///
    /// Arity and type errors are reported here, never during evaluation.
    fn new_call(
        &self,
        args: Vec<Argument>,
        remaining: &[Datatype],
    ) -> EvalResult<Box<dyn FunctionCall>>;
}

/// A validated, bound invocation.
///
/// Calls hold no per-request state and are safe to evaluate concurrently.
pub trait FunctionCall: Send + Sync + fmt::Debug {
    /// Datatype of the result.
    fn return_type(&self) -> Datatype;

    /// Evaluate a call that has no deferred arguments.
    fn evaluate(&self, ctx: &mut dyn EvaluationContext) -> EvalResult<Value> {
        self.evaluate_with(ctx, &[], ArgCheck::Trusted)
    }

    /// Evaluate with the deferred arguments appended after the static ones.
    fn evaluate_with(
        &self,
        ctx: &mut dyn EvaluationContext,
        remaining: &[AttributeValue],
        check: ArgCheck,
    ) -> EvalResult<Value>;
}

// Bodies

/// Body over single values.
pub trait PrimitiveBody: Send + Sync {
    /// Apply to the resolved argument values.
    fn apply(&self, args: &[AttributeValue]) -> EvalResult<Value>;

    /// Precompute state from arguments known at bind time.
    ///
    /// `statics[i]` is the value of argument `i` when it is a constant, and
    /// `None` when it depends on the request or is deferred. Returning a
    /// body replaces this one for the call being built.
    fn precompile(
        &self,
        _statics: &[Option<&AttributeValue>],
    ) -> EvalResult<Option<Arc<dyn PrimitiveBody>>> {
        Ok(None)
    }
}

/// Body over bags.
pub trait BagBody: Send + Sync {
    fn apply(&self, bags: &[Bag]) -> EvalResult<Value>;
}

/// Body over leading single values and trailing bags.
pub trait MixedBody: Send + Sync {
    fn apply(&self, primitives: &[AttributeValue], bags: &[Bag]) -> EvalResult<Value>;
}

/// Body that resolves its own arguments.
pub trait LazyBody: Send + Sync {
    fn apply(&self, args: &mut LazyArgs<'_>) -> EvalResult<Value>;
}

struct FnPrimitive<F>(F);

impl<F> PrimitiveBody for FnPrimitive<F>
where
    F: Fn(&[AttributeValue]) -> EvalResult<Value> + Send + Sync,
{
    fn apply(&self, args: &[AttributeValue]) -> EvalResult<Value> {
        (self.0)(args)
    }
}

struct FnBag<F>(F);

impl<F> BagBody for FnBag<F>
where
    F: Fn(&[Bag]) -> EvalResult<Value> + Send + Sync,
{
    fn apply(&self, bags: &[Bag]) -> EvalResult<Value> {
        (self.0)(bags)
    }
}

struct FnMixed<F>(F);

impl<F> MixedBody for FnMixed<F>
where
    F: Fn(&[AttributeValue], &[Bag]) -> EvalResult<Value> + Send + Sync,
{
    fn apply(&self, primitives: &[AttributeValue], bags: &[Bag]) -> EvalResult<Value> {
        (self.0)(primitives, bags)
    }
}

struct FnLazy<F>(F);

impl<F> LazyBody for FnLazy<F>
where
    F: Fn(&mut LazyArgs<'_>) -> EvalResult<Value> + Send + Sync,
{
    fn apply(&self, args: &mut LazyArgs<'_>) -> EvalResult<Value> {
        (self.0)(args)
    }
}

/// A function body tagged with its evaluation strategy.
#[derive(Clone)]
pub enum Body {
    Primitive(Arc<dyn PrimitiveBody>),
    Bag(Arc<dyn BagBody>),
    Mixed(Arc<dyn MixedBody>),
    Lazy(Arc<dyn LazyBody>),
}

impl Body {
    /// Primitive body from a closure.
    pub fn primitive<F>(f: F) -> Self
    where
        F: Fn(&[AttributeValue]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        Body::Primitive(Arc::new(FnPrimitive(f)))
    }

    /// Bag body from a closure.
    pub fn bag<F>(f: F) -> Self
    where
        F: Fn(&[Bag]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        Body::Bag(Arc::new(FnBag(f)))
    }

    /// Mixed body from a closure.
    pub fn mixed<F>(f: F) -> Self
    where
        F: Fn(&[AttributeValue], &[Bag]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        Body::Mixed(Arc::new(FnMixed(f)))
    }

    /// Lazy body from a closure.
    pub fn lazy<F>(f: F) -> Self
    where
        F: Fn(&mut LazyArgs<'_>) -> EvalResult<Value> + Send + Sync + 'static,
    {
        Body::Lazy(Arc::new(FnLazy(f)))
    }

    /// Strategy name used in diagnostics.
    pub const fn strategy(&self) -> &'static str {
        match self {
            Body::Primitive(_) => "all-primitive",
            Body::Bag(_) => "all-bag",
            Body::Mixed(_) => "mixed",
            Body::Lazy(_) => "lazy",
        }
    }

    /// Whether this strategy can evaluate parameter lists of `shape`.
    pub fn accepts(&self, shape: Option<CallShape>) -> bool {
        match self {
            Body::Primitive(_) => shape == Some(CallShape::AllPrimitive),
            Body::Bag(_) => shape == Some(CallShape::AllBag),
            Body::Mixed(_) => matches!(shape, Some(CallShape::Mixed { .. })),
            Body::Lazy(_) => true,
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Body({})", self.strategy())
    }
}

// Lazy argument access

/// Argument access for lazy bodies.
///
/// Arguments are evaluated only when asked for; failures are wrapped with
/// the 1-based argument position.
pub struct LazyArgs<'a> {
    exprs: &'a [Arc<dyn Expression>],
    remaining: &'a [AttributeValue],
    ctx: &'a mut dyn EvaluationContext,
}

impl<'a> LazyArgs<'a> {
    /// Lazy view over static expressions followed by deferred values.
    pub fn new(
        exprs: &'a [Arc<dyn Expression>],
        remaining: &'a [AttributeValue],
        ctx: &'a mut dyn EvaluationContext,
    ) -> Self {
        LazyArgs {
            exprs,
            remaining,
            ctx,
        }
    }

    /// Total argument count.
    pub fn len(&self) -> usize {
        self.exprs.len() + self.remaining.len()
    }

    /// Whether there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluate the argument at 0-based `index`.
    pub fn value(&mut self, index: usize) -> EvalResult<Value> {
        if let Some(expr) = self.exprs.get(index) {
            return expr
                .evaluate(self.ctx)
                .map_err(|e| argument_indeterminate(index + 1, e));
        }
        self.remaining
            .get(index - self.exprs.len())
            .cloned()
            .map(Value::Single)
            .ok_or_else(|| processing_error(format!("argument #{} does not exist", index + 1)))
    }

    /// Evaluate a single-valued argument.
    pub fn single(&mut self, index: usize) -> EvalResult<AttributeValue> {
        match self.value(index)? {
            Value::Single(v) => Ok(v),
            Value::Bag(b) => Err(argument_type_mismatch(
                "lazy argument",
                index + 1,
                &b.kind(),
                &b.datatype(),
            )),
        }
    }

    /// Evaluate a boolean argument.
    pub fn boolean(&mut self, index: usize) -> EvalResult<bool> {
        let value = self.single(index)?;
        value.as_bool().ok_or_else(|| {
            argument_type_mismatch("lazy argument", index + 1, &"boolean", &value.datatype())
        })
    }

    /// Evaluate an integer argument.
    pub fn integer(&mut self, index: usize) -> EvalResult<Integer> {
        let value = self.single(index)?;
        value.as_integer().ok_or_else(|| {
            argument_type_mismatch("lazy argument", index + 1, &"integer", &value.datatype())
        })
    }
}

// First-order functions

/// A first-order function: a signature and a strategy-tagged body.
pub struct FirstOrderFunction {
    signature: Arc<FunctionSignature>,
    body: Body,
}

impl FirstOrderFunction {
    /// Pair a signature with its body.
    pub fn new(signature: FunctionSignature, body: Body) -> Self {
        FirstOrderFunction {
            signature: Arc::new(signature),
            body,
        }
    }

    /// Shared definition, ready for registration.
    pub fn shared(signature: FunctionSignature, body: Body) -> SharedFunction {
        Arc::new(Self::new(signature, body))
    }
}

impl fmt::Debug for FirstOrderFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.signature, self.body.strategy())
    }
}

impl Function for FirstOrderFunction {
    fn id(&self) -> &str {
        self.signature.name()
    }

    fn return_type(&self) -> Datatype {
        self.signature.return_type()
    }

    fn signature(&self) -> Option<&FunctionSignature> {
        Some(&self.signature)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(function = %self.signature.name()))]
    fn new_call(
        &self,
        args: Vec<Argument>,
        remaining: &[Datatype],
    ) -> EvalResult<Box<dyn FunctionCall>> {
        let shape = self.signature.shape();
        if !self.body.accepts(shape) {
            let declared = shape.map_or("interleaved", CallShape::name);
            tracing::error!(
                function = %self.signature.name(),
                required = self.body.strategy(),
                declared,
                "function body does not fit its signature"
            );
            return Err(strategy_mismatch(
                self.signature.name(),
                self.body.strategy(),
                declared,
            ));
        }

        let mut exprs = ArgExprs::with_capacity(args.len());
        let mut types: SmallVec<[Datatype; 4]> = SmallVec::with_capacity(args.len());
        for (i, arg) in args.into_iter().enumerate() {
            match arg {
                Argument::Expr(expr) => {
                    types.push(expr.datatype());
                    exprs.push(expr);
                }
                Argument::Function(f) => {
                    let expected = self
                        .signature
                        .param_type(i)
                        .map_or_else(|| "nothing".to_string(), |t| t.to_string());
                    return Err(argument_type_mismatch(
                        self.signature.name(),
                        i + 1,
                        &expected,
                        &format_args!("function {}", f.id()),
                    ));
                }
            }
        }
        self.signature.validate_with_remaining(&types, remaining)?;

        let body = match &self.body {
            Body::Primitive(body) => {
                let statics: SmallVec<[Option<&AttributeValue>; 4]> = exprs
                    .iter()
                    .map(|e| e.constant().and_then(Value::as_single))
                    .collect();
                match body.precompile(&statics)? {
                    Some(compiled) => Body::Primitive(compiled),
                    None => self.body.clone(),
                }
            }
            other => other.clone(),
        };

        Ok(Box::new(FirstOrderCall {
            signature: Arc::clone(&self.signature),
            body,
            args: exprs,
            deferred: remaining.len(),
        }))
    }
}

/// A bound first-order call.
struct FirstOrderCall {
    signature: Arc<FunctionSignature>,
    body: Body,
    args: ArgExprs,
    deferred: usize,
}

impl fmt::Debug for FirstOrderCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirstOrderCall")
            .field("function", &self.signature.name())
            .field("args", &self.args)
            .field("deferred", &self.deferred)
            .finish()
    }
}

impl FirstOrderCall {
    fn single(
        &self,
        index: usize,
        ctx: &mut dyn EvaluationContext,
    ) -> EvalResult<AttributeValue> {
        match self.args[index].evaluate(ctx) {
            Ok(Value::Single(v)) => Ok(v),
            Ok(Value::Bag(b)) => Err(argument_type_mismatch(
                self.signature.name(),
                index + 1,
                &b.kind(),
                &b.datatype(),
            )),
            Err(e) => Err(argument_indeterminate(index + 1, e)),
        }
    }

    fn bag(&self, index: usize, ctx: &mut dyn EvaluationContext) -> EvalResult<Bag> {
        match self.args[index].evaluate(ctx) {
            Ok(Value::Bag(b)) => Ok(b),
            Ok(Value::Single(v)) => Err(argument_type_mismatch(
                self.signature.name(),
                index + 1,
                &v.kind().bag(),
                &v.datatype(),
            )),
            Err(e) => Err(argument_indeterminate(index + 1, e)),
        }
    }

    fn no_deferred(&self, remaining: &[AttributeValue]) -> EvalResult<()> {
        if remaining.is_empty() {
            Ok(())
        } else {
            Err(processing_error(format!(
                "{}: deferred arguments cannot fill bag parameters",
                self.signature.name()
            )))
        }
    }
}

impl FunctionCall for FirstOrderCall {
    fn return_type(&self) -> Datatype {
        self.signature.return_type()
    }

    fn evaluate_with(
        &self,
        ctx: &mut dyn EvaluationContext,
        remaining: &[AttributeValue],
        check: ArgCheck,
    ) -> EvalResult<Value> {
        if remaining.len() != self.deferred {
            return Err(arity_mismatch(
                self.signature.name(),
                self.args.len() + self.deferred,
                false,
                self.args.len() + remaining.len(),
            ));
        }
        if check == ArgCheck::Checked && !remaining.is_empty() {
            let types: SmallVec<[Datatype; 4]> =
                remaining.iter().map(AttributeValue::datatype).collect();
            self.signature.validate_remaining(self.args.len(), &types)?;
        }
        tracing::trace!(function = %self.signature.name(), "evaluate");

        match &self.body {
            Body::Primitive(body) => {
                let mut values: SmallVec<[AttributeValue; 4]> =
                    SmallVec::with_capacity(self.args.len() + remaining.len());
                for i in 0..self.args.len() {
                    values.push(self.single(i, ctx)?);
                }
                values.extend(remaining.iter().cloned());
                body.apply(&values)
            }
            Body::Bag(body) => {
                self.no_deferred(remaining)?;
                let mut bags: SmallVec<[Bag; 4]> = SmallVec::with_capacity(self.args.len());
                for i in 0..self.args.len() {
                    bags.push(self.bag(i, ctx)?);
                }
                body.apply(&bags)
            }
            Body::Mixed(body) => {
                self.no_deferred(remaining)?;
                let primitive_count = match self.signature.shape() {
                    Some(CallShape::Mixed { primitive_count }) => primitive_count,
                    _ => 0,
                };
                let mut primitives: SmallVec<[AttributeValue; 4]> = SmallVec::new();
                let mut bags: SmallVec<[Bag; 4]> = SmallVec::new();
                for i in 0..self.args.len() {
                    if i < primitive_count {
                        primitives.push(self.single(i, ctx)?);
                    } else {
                        bags.push(self.bag(i, ctx)?);
                    }
                }
                body.apply(&primitives, &bags)
            }
            Body::Lazy(body) => body.apply(&mut LazyArgs::new(&self.args, remaining, ctx)),
        }
    }
}
