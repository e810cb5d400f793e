//! Shared fixtures for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pdp_values::{
    missing_attribute, AttributeValue, Bag, Datatype, EvalResult, PrimitiveKind, Value,
};
use rustc_hash::FxHashMap;

use crate::call::SharedFunction;
use crate::context::{AttributeKey, EvaluationContext};
use crate::expr::{Argument, Constant, Expression};
use crate::registry::FunctionRegistry;

/// In-memory context backed by a map of attribute bags.
#[derive(Default)]
pub(crate) struct MapContext {
    attributes: FxHashMap<AttributeKey, Bag>,
    variables: FxHashMap<String, Value>,
    pub(crate) resolutions: usize,
}

impl MapContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, key: AttributeKey, bag: Bag) -> Self {
        self.attributes.insert(key, bag);
        self
    }
}

impl EvaluationContext for MapContext {
    fn resolve_attribute(&mut self, key: &AttributeKey, kind: PrimitiveKind) -> EvalResult<Bag> {
        self.resolutions += 1;
        match self.attributes.get(key) {
            Some(bag) if bag.kind() == kind => Ok(bag.clone()),
            Some(_) => Err(missing_attribute(key)),
            None => Ok(Bag::empty(kind)),
        }
    }

    fn variable(&self, id: &str) -> Option<Value> {
        self.variables.get(id).cloned()
    }

    fn cache_variable(&mut self, id: &str, value: Value) {
        self.variables.insert(id.to_string(), value);
    }
}

/// A standard function looked up by its short name, e.g. `integer-add`.
pub(crate) fn standard(short_name: &str) -> SharedFunction {
    let registry = FunctionRegistry::standard().unwrap();
    let suffix = format!(":function:{short_name}");
    let id = registry
        .ids()
        .into_iter()
        .find(|id| id.ends_with(&suffix))
        .unwrap_or_else(|| panic!("no standard function {short_name}"))
        .to_string();
    registry.lookup(&id).unwrap()
}

/// Full identifier of a standard function or factory.
pub(crate) fn standard_id(short_name: &str) -> String {
    let registry = FunctionRegistry::standard().unwrap();
    let suffix = format!(":function:{short_name}");
    registry
        .ids()
        .into_iter()
        .find(|id| id.ends_with(&suffix))
        .unwrap_or_else(|| panic!("no standard function {short_name}"))
        .to_string()
}

/// Bind a standard function by short name and evaluate it once.
pub(crate) fn eval(short_name: &str, args: Vec<Argument>) -> EvalResult<Value> {
    let registry = FunctionRegistry::standard().unwrap();
    let apply = registry.bind_apply(&standard_id(short_name), args)?;
    apply.evaluate(&mut MapContext::new())
}

pub(crate) fn int(n: i64) -> Argument {
    Argument::constant(AttributeValue::integer(n))
}

pub(crate) fn dbl(d: f64) -> Argument {
    Argument::constant(AttributeValue::double(d))
}

pub(crate) fn text(s: &str) -> Argument {
    Argument::constant(AttributeValue::string(s))
}

pub(crate) fn boolean(b: bool) -> Argument {
    Argument::constant(AttributeValue::boolean(b))
}

pub(crate) fn parsed(kind: PrimitiveKind, lexical: &str) -> Argument {
    Argument::expr(Constant::parse(kind, lexical).unwrap())
}

pub(crate) fn int_bag(values: &[i64]) -> Bag {
    Bag::from_values(
        PrimitiveKind::Integer,
        values.iter().map(|n| AttributeValue::integer(*n)).collect(),
    )
    .unwrap()
}

pub(crate) fn string_bag(values: &[&str]) -> Bag {
    Bag::from_values(
        PrimitiveKind::String,
        values.iter().map(|s| AttributeValue::string(s)).collect(),
    )
    .unwrap()
}

pub(crate) fn bag(bag: Bag) -> Argument {
    Argument::constant(bag)
}

/// Expression double counting its evaluations.
#[derive(Debug)]
pub(crate) struct Counting {
    inner: Arc<dyn Expression>,
    pub(crate) count: Arc<AtomicUsize>,
}

impl Counting {
    pub(crate) fn new(inner: impl Expression + 'static) -> Self {
        Counting {
            inner: Arc::new(inner),
            count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.count)
    }
}

impl Expression for Counting {
    fn datatype(&self) -> Datatype {
        self.inner.datatype()
    }

    fn evaluate(&self, ctx: &mut dyn EvaluationContext) -> EvalResult<Value> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.inner.evaluate(ctx)
    }
}

pub(crate) fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
