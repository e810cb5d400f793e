//! Higher-order bag functions.
//!
//! Each combinator takes a first-order sub-function as its first argument
//! and applies it across the elements of one or more bags:
//!
//! | function     | arguments          | result                                          |
//! |--------------|--------------------|-------------------------------------------------|
//! | `any-of`     | `f, c.., bag`      | some element satisfies `f`                      |
//! | `all-of`     | `f, c.., bag`      | every element satisfies `f`                     |
//! | `any-of-any` | `f, a1..ak`        | some combination across all arguments satisfies |
//! | `all-of-any` | `f, bag1, bag2`    | each of bag1 pairs with some of bag2            |
//! | `any-of-all` | `f, bag1, bag2`    | some of bag1 pairs with all of bag2             |
//! | `all-of-all` | `f, bag1, bag2`    | every pair satisfies                            |
//! | `map`        | `f, c.., bag`      | bag of `f` applied to each element              |
//!
//! For `any-of`, `all-of` and `map` the bag may sit at any position among
//! the value arguments. When it is last and every leading argument is a
//! constant, the leading arguments are bound as static arguments of the
//! sub-call, so constant patterns and the like are precompiled. Otherwise
//! every value argument is evaluated once and passed at evaluation time.
//!
//! # Invariants
//!
//! - Every non-constant argument expression is evaluated at most once per
//!   evaluation; combination loops iterate the cached element arrays.
//! - Evaluation stops as soon as the result is decided. Failures from
//!   combinations that were never reached do not surface.
//! - Sub-calls are bound once with the element datatypes, so elements are
//!   passed unchecked on every iteration.

use std::fmt;
use std::sync::Arc;

use pdp_values::{
    argument_indeterminate, argument_type_mismatch, arity_mismatch, invalid_sub_function,
    processing_error, sub_function_indeterminate, AttributeValue, Bag, BagBuilder, Datatype,
    EvalResult, Value,
};
use smallvec::SmallVec;

use crate::call::{ArgCheck, Function, FunctionCall, SharedFunction};
use crate::context::EvaluationContext;
use crate::expr::{Argument, Expression};
use crate::functions::{Version, BOOLEAN};
use crate::registry::{FunctionRegistry, GenericFunctionFactory};

/// The combinators.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Combinator {
    AnyOf,
    AllOf,
    AnyOfAny,
    AllOfAny,
    AnyOfAll,
    AllOfAll,
    Map,
}

impl Combinator {
    /// Short function name.
    pub const fn name(self) -> &'static str {
        match self {
            Combinator::AnyOf => "any-of",
            Combinator::AllOf => "all-of",
            Combinator::AnyOfAny => "any-of-any",
            Combinator::AllOfAny => "all-of-any",
            Combinator::AnyOfAll => "any-of-all",
            Combinator::AllOfAll => "all-of-all",
            Combinator::Map => "map",
        }
    }

    const fn version(self) -> Version {
        match self {
            Combinator::AllOfAny | Combinator::AnyOfAll | Combinator::AllOfAll => Version::V1,
            _ => Version::V3,
        }
    }

    /// Full function identifier.
    pub fn id(self) -> String {
        self.version().id(self.name())
    }
}

/// A higher-order function definition.
#[derive(Debug)]
pub struct HigherOrderFunction {
    id: Arc<str>,
    combinator: Combinator,
    /// Datatype the sub-function must return.
    sub_return: Datatype,
    return_type: Datatype,
}

impl HigherOrderFunction {
    /// A boolean combinator. Use [`MapFactory`] for `map`.
    pub fn new(combinator: Combinator) -> Self {
        HigherOrderFunction {
            id: Arc::from(combinator.id()),
            combinator,
            sub_return: BOOLEAN,
            return_type: BOOLEAN,
        }
    }

    fn map(id: Arc<str>, sub_return: Datatype) -> Self {
        HigherOrderFunction {
            id,
            combinator: Combinator::Map,
            sub_return,
            return_type: sub_return.as_bag(),
        }
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    fn check_sub_function(&self, sub: &SharedFunction) -> EvalResult<()> {
        if sub.is_higher_order() || sub.signature().is_none() {
            return Err(invalid_sub_function(
                &self.id,
                format!("{} is not a first-order function", sub.id()),
            ));
        }
        if sub.return_type() != self.sub_return {
            return Err(invalid_sub_function(
                &self.id,
                format!(
                    "{} returns {}, expected {}",
                    sub.id(),
                    sub.return_type(),
                    self.sub_return
                ),
            ));
        }
        Ok(())
    }
}

impl Function for HigherOrderFunction {
    fn id(&self) -> &str {
        &self.id
    }

    fn return_type(&self) -> Datatype {
        self.return_type
    }

    fn is_higher_order(&self) -> bool {
        true
    }

    #[tracing::instrument(level = "debug", skip_all, fields(function = %self.id))]
    fn new_call(
        &self,
        args: Vec<Argument>,
        remaining: &[Datatype],
    ) -> EvalResult<Box<dyn FunctionCall>> {
        if !remaining.is_empty() {
            return Err(invalid_sub_function(
                &self.id,
                "a higher-order function cannot be a sub-function",
            ));
        }
        let total = args.len();
        let mut args = args.into_iter();
        let sub = match args.next() {
            Some(Argument::Function(sub)) => sub,
            Some(Argument::Expr(_)) | None => {
                return Err(invalid_sub_function(
                    &self.id,
                    "the first argument must be a function",
                ));
            }
        };
        self.check_sub_function(&sub)?;

        let mut exprs = Vec::with_capacity(total.saturating_sub(1));
        for (i, arg) in args.enumerate() {
            match arg {
                Argument::Expr(expr) => exprs.push(expr),
                Argument::Function(f) => {
                    return Err(argument_type_mismatch(
                        &self.id,
                        i + 2,
                        &"a value",
                        &format_args!("function {}", f.id()),
                    ));
                }
            }
        }

        let header = Header {
            id: Arc::clone(&self.id),
            sub_id: Arc::from(sub.id()),
        };
        match self.combinator {
            Combinator::AnyOf | Combinator::AllOf | Combinator::Map => {
                OneBagCall::bind(header, self.combinator, self.return_type, &sub, exprs)
            }
            Combinator::AnyOfAny => AnyOfAnyCall::bind(header, &sub, exprs),
            Combinator::AllOfAny | Combinator::AnyOfAll | Combinator::AllOfAll => {
                TwoBagCall::bind(header, self.combinator, &sub, exprs)
            }
        }
    }
}

/// `map`: instantiated per sub-function return type.
#[derive(Debug)]
pub struct MapFactory {
    id: Arc<str>,
}

impl MapFactory {
    pub fn new() -> Self {
        MapFactory {
            id: Arc::from(Combinator::Map.id()),
        }
    }
}

impl Default for MapFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl GenericFunctionFactory for MapFactory {
    fn id(&self) -> &str {
        &self.id
    }

    fn instantiate(&self, sub_return: Datatype) -> EvalResult<SharedFunction> {
        if sub_return.is_bag() {
            return Err(invalid_sub_function(
                &self.id,
                format!("sub-function must return a single value, not {sub_return}"),
            ));
        }
        Ok(Arc::new(HigherOrderFunction::map(Arc::clone(&self.id), sub_return)))
    }
}

pub(crate) fn register(registry: &mut FunctionRegistry) -> EvalResult<()> {
    for combinator in [
        Combinator::AnyOf,
        Combinator::AllOf,
        Combinator::AnyOfAny,
        Combinator::AllOfAny,
        Combinator::AnyOfAll,
        Combinator::AllOfAll,
    ] {
        registry.register(Arc::new(HigherOrderFunction::new(combinator)))?;
    }
    registry.register_generic(Arc::new(MapFactory::new()))
}

// Bound calls

/// Identity shared by every bound higher-order call.
#[derive(Debug)]
struct Header {
    id: Arc<str>,
    sub_id: Arc<str>,
}

impl Header {
    /// Evaluate an argument expression that must produce a bag.
    fn bag(
        &self,
        expr: &dyn Expression,
        position: usize,
        ctx: &mut dyn EvaluationContext,
    ) -> EvalResult<Bag> {
        match expr.evaluate(ctx) {
            Ok(Value::Bag(bag)) => Ok(bag),
            Ok(Value::Single(v)) => Err(argument_type_mismatch(
                &self.id,
                position,
                &v.kind().bag(),
                &v.datatype(),
            )),
            Err(e) => Err(argument_indeterminate(position, e)),
        }
    }

    /// Evaluate an argument expression that must produce a single value.
    fn single(
        &self,
        expr: &dyn Expression,
        position: usize,
        ctx: &mut dyn EvaluationContext,
    ) -> EvalResult<AttributeValue> {
        match expr.evaluate(ctx) {
            Ok(Value::Single(v)) => Ok(v),
            Ok(Value::Bag(b)) => Err(argument_type_mismatch(
                &self.id,
                position,
                &b.kind(),
                &b.datatype(),
            )),
            Err(e) => Err(argument_indeterminate(position, e)),
        }
    }

    /// Apply the sub-call to one combination.
    fn apply(
        &self,
        sub: &dyn FunctionCall,
        ctx: &mut dyn EvaluationContext,
        args: &[AttributeValue],
    ) -> EvalResult<Value> {
        sub.evaluate_with(ctx, args, ArgCheck::Trusted)
            .map_err(|e| sub_function_indeterminate(&self.sub_id, e))
    }

    /// Apply a boolean sub-call to one combination.
    fn test(
        &self,
        sub: &dyn FunctionCall,
        ctx: &mut dyn EvaluationContext,
        args: &[AttributeValue],
    ) -> EvalResult<bool> {
        self.apply(sub, ctx, args)?.as_bool().ok_or_else(|| {
            processing_error(format!("{}: sub-function did not return a boolean", self.id))
        })
    }
}

/// `any-of`, `all-of` and `map`: one bag among the value arguments.
struct OneBagCall {
    header: Header,
    combinator: Combinator,
    return_type: Datatype,
    sub: Box<dyn FunctionCall>,
    bag: Arc<dyn Expression>,
    /// 1-based position of the bag among all arguments.
    bag_position: usize,
    /// Value arguments passed at evaluation time, with their positions.
    deferred: Vec<(usize, Arc<dyn Expression>)>,
    /// Index of the bag element within the deferred arguments.
    element_slot: usize,
}

impl OneBagCall {
    fn bind(
        header: Header,
        combinator: Combinator,
        return_type: Datatype,
        sub: &SharedFunction,
        mut exprs: Vec<Arc<dyn Expression>>,
    ) -> EvalResult<Box<dyn FunctionCall>> {
        if exprs.is_empty() {
            return Err(arity_mismatch(&header.id, 2, true, 1));
        }
        let bags: SmallVec<[usize; 2]> = exprs
            .iter()
            .enumerate()
            .filter(|(_, e)| e.datatype().is_bag())
            .map(|(i, _)| i)
            .collect();
        let index = match bags.as_slice() {
            [index] => *index,
            [] => {
                let last = exprs.len() - 1;
                return Err(argument_type_mismatch(
                    &header.id,
                    last + 2,
                    &"a bag",
                    &exprs[last].datatype(),
                ));
            }
            [_, second, ..] => {
                return Err(argument_type_mismatch(
                    &header.id,
                    second + 2,
                    &"a single value",
                    &exprs[*second].datatype(),
                ));
            }
        };

        let bag = exprs.remove(index);
        let element = bag.datatype().element();
        let static_prefix = index == exprs.len() && exprs.iter().all(|e| e.constant().is_some());
        let (call, deferred, element_slot) = if static_prefix {
            let statics = exprs.into_iter().map(Argument::Expr).collect();
            (sub.new_call(statics, &[element])?, Vec::new(), 0)
        } else {
            let mut types: SmallVec<[Datatype; 4]> = exprs.iter().map(|e| e.datatype()).collect();
            types.insert(index, element);
            let deferred = exprs
                .into_iter()
                .enumerate()
                .map(|(i, e)| (if i < index { i + 2 } else { i + 3 }, e))
                .collect();
            (sub.new_call(Vec::new(), &types)?, deferred, index)
        };

        Ok(Box::new(OneBagCall {
            header,
            combinator,
            return_type,
            sub: call,
            bag,
            bag_position: index + 2,
            deferred,
            element_slot,
        }))
    }
}

impl fmt::Debug for OneBagCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneBagCall")
            .field("function", &self.header.id)
            .field("sub_function", &self.header.sub_id)
            .field("bag_position", &self.bag_position)
            .finish_non_exhaustive()
    }
}

impl FunctionCall for OneBagCall {
    fn return_type(&self) -> Datatype {
        self.return_type
    }

    fn evaluate_with(
        &self,
        ctx: &mut dyn EvaluationContext,
        remaining: &[AttributeValue],
        _check: ArgCheck,
    ) -> EvalResult<Value> {
        if !remaining.is_empty() {
            return Err(invalid_sub_function(
                &self.header.id,
                "a higher-order function cannot be a sub-function",
            ));
        }

        // Arguments are evaluated in order, each exactly once.
        let mut values: SmallVec<[AttributeValue; 4]> =
            SmallVec::with_capacity(self.deferred.len() + 1);
        let mut bag = None;
        for (position, expr) in &self.deferred {
            if bag.is_none() && *position > self.bag_position {
                bag = Some(self.header.bag(&*self.bag, self.bag_position, ctx)?);
            }
            values.push(self.header.single(&**expr, *position, ctx)?);
        }
        let bag = match bag {
            Some(bag) => bag,
            None => self.header.bag(&*self.bag, self.bag_position, ctx)?,
        };
        tracing::trace!(function = %self.header.id, elements = bag.len(), "iterate bag");

        let mut map = match self.combinator {
            Combinator::Map => Some(BagBuilder::with_capacity(
                self.return_type.kind(),
                bag.len(),
            )),
            _ => None,
        };
        for (i, element) in bag.iter().enumerate() {
            values.insert(self.element_slot, element.clone());
            let outcome = self.header.apply(&*self.sub, ctx, &values);
            values.remove(self.element_slot);

            match (self.combinator, &mut map) {
                (Combinator::Map, Some(builder)) => {
                    let value = outcome.map_err(|e| e.with_note(format!("element #{}", i + 1)))?;
                    let Value::Single(value) = value else {
                        return Err(processing_error(format!(
                            "{}: sub-function returned a bag",
                            self.header.id
                        )));
                    };
                    builder.push(value)?;
                }
                (combinator, _) => {
                    let satisfied = outcome?.as_bool().ok_or_else(|| {
                        processing_error(format!(
                            "{}: sub-function did not return a boolean",
                            self.header.id
                        ))
                    })?;
                    if combinator == Combinator::AnyOf && satisfied {
                        return Ok(Value::from(true));
                    }
                    if combinator == Combinator::AllOf && !satisfied {
                        return Ok(Value::from(false));
                    }
                }
            }
        }

        Ok(match map {
            Some(builder) => Value::Bag(builder.freeze()),
            None => Value::from(self.combinator == Combinator::AllOf),
        })
    }
}

/// An argument of `any-of-any`, evaluated once.
enum Column {
    Single(AttributeValue),
    Bag(Bag),
}

impl Column {
    fn as_slice(&self) -> &[AttributeValue] {
        match self {
            Column::Single(value) => std::slice::from_ref(value),
            Column::Bag(bag) => bag.as_slice(),
        }
    }
}

/// `any-of-any`: every argument a single value or a bag.
struct AnyOfAnyCall {
    header: Header,
    sub: Box<dyn FunctionCall>,
    args: Vec<Arc<dyn Expression>>,
}

impl AnyOfAnyCall {
    fn bind(
        header: Header,
        sub: &SharedFunction,
        exprs: Vec<Arc<dyn Expression>>,
    ) -> EvalResult<Box<dyn FunctionCall>> {
        if exprs.is_empty() {
            return Err(arity_mismatch(&header.id, 2, true, 1));
        }
        let types: SmallVec<[Datatype; 4]> =
            exprs.iter().map(|e| e.datatype().element()).collect();
        let call = sub.new_call(Vec::new(), &types)?;
        Ok(Box::new(AnyOfAnyCall {
            header,
            sub: call,
            args: exprs,
        }))
    }
}

impl fmt::Debug for AnyOfAnyCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyOfAnyCall")
            .field("function", &self.header.id)
            .field("sub_function", &self.header.sub_id)
            .field("args", &self.args.len())
            .finish_non_exhaustive()
    }
}

impl FunctionCall for AnyOfAnyCall {
    fn return_type(&self) -> Datatype {
        BOOLEAN
    }

    fn evaluate_with(
        &self,
        ctx: &mut dyn EvaluationContext,
        remaining: &[AttributeValue],
        _check: ArgCheck,
    ) -> EvalResult<Value> {
        if !remaining.is_empty() {
            return Err(invalid_sub_function(
                &self.header.id,
                "a higher-order function cannot be a sub-function",
            ));
        }

        let mut columns: SmallVec<[Column; 4]> = SmallVec::with_capacity(self.args.len());
        for (i, expr) in self.args.iter().enumerate() {
            let column = match expr.evaluate(ctx) {
                Ok(Value::Single(v)) => Column::Single(v),
                Ok(Value::Bag(b)) => Column::Bag(b),
                Err(e) => return Err(argument_indeterminate(i + 2, e)),
            };
            columns.push(column);
        }

        // Combination stack: one cursor per column, plus the values under
        // the cursors. Advancing replaces only the slots that changed.
        let mut cursors: SmallVec<[usize; 4]> = SmallVec::from_elem(0, columns.len());
        let mut combination: SmallVec<[AttributeValue; 4]> = SmallVec::new();
        for column in &columns {
            match column.as_slice().first() {
                Some(first) => combination.push(first.clone()),
                None => return Ok(Value::from(false)),
            }
        }

        loop {
            if self.header.test(&*self.sub, ctx, &combination)? {
                return Ok(Value::from(true));
            }
            let mut level = columns.len();
            loop {
                if level == 0 {
                    return Ok(Value::from(false));
                }
                level -= 1;
                let elements = columns[level].as_slice();
                cursors[level] += 1;
                if let Some(next) = elements.get(cursors[level]) {
                    combination[level] = next.clone();
                    break;
                }
                cursors[level] = 0;
                if let Some(first) = elements.first() {
                    combination[level] = first.clone();
                }
            }
        }
    }
}

/// `all-of-any`, `any-of-all`, `all-of-all`: exactly two bags.
struct TwoBagCall {
    header: Header,
    combinator: Combinator,
    sub: Box<dyn FunctionCall>,
    first: Arc<dyn Expression>,
    second: Arc<dyn Expression>,
}

impl TwoBagCall {
    fn bind(
        header: Header,
        combinator: Combinator,
        sub: &SharedFunction,
        exprs: Vec<Arc<dyn Expression>>,
    ) -> EvalResult<Box<dyn FunctionCall>> {
        let [first, second]: [Arc<dyn Expression>; 2] = exprs
            .try_into()
            .map_err(|exprs: Vec<_>| arity_mismatch(&header.id, 3, false, exprs.len() + 1))?;
        for (position, expr) in [(2, &first), (3, &second)] {
            if !expr.datatype().is_bag() {
                return Err(argument_type_mismatch(
                    &header.id,
                    position,
                    &"a bag",
                    &expr.datatype(),
                ));
            }
        }
        let types = [first.datatype().element(), second.datatype().element()];
        let call = sub.new_call(Vec::new(), &types)?;
        Ok(Box::new(TwoBagCall {
            header,
            combinator,
            sub: call,
            first,
            second,
        }))
    }
}

impl TwoBagCall {
    fn pair(
        &self,
        ctx: &mut dyn EvaluationContext,
        a: &AttributeValue,
        b: &AttributeValue,
    ) -> EvalResult<bool> {
        self.header.test(&*self.sub, ctx, &[a.clone(), b.clone()])
    }
}

impl fmt::Debug for TwoBagCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwoBagCall")
            .field("function", &self.header.id)
            .field("sub_function", &self.header.sub_id)
            .finish_non_exhaustive()
    }
}

impl FunctionCall for TwoBagCall {
    fn return_type(&self) -> Datatype {
        BOOLEAN
    }

    fn evaluate_with(
        &self,
        ctx: &mut dyn EvaluationContext,
        remaining: &[AttributeValue],
        _check: ArgCheck,
    ) -> EvalResult<Value> {
        if !remaining.is_empty() {
            return Err(invalid_sub_function(
                &self.header.id,
                "a higher-order function cannot be a sub-function",
            ));
        }
        let first = self.header.bag(&*self.first, 2, ctx)?;
        let second = self.header.bag(&*self.second, 3, ctx)?;

        let result = match self.combinator {
            Combinator::AllOfAny => {
                if first.is_empty() || second.is_empty() {
                    return Ok(Value::from(false));
                }
                'outer: {
                    for a in &first {
                        let mut found = false;
                        for b in &second {
                            if self.pair(ctx, a, b)? {
                                found = true;
                                break;
                            }
                        }
                        if !found {
                            break 'outer false;
                        }
                    }
                    true
                }
            }
            Combinator::AnyOfAll => 'outer: {
                for a in &first {
                    let mut all = true;
                    for b in &second {
                        if !self.pair(ctx, a, b)? {
                            all = false;
                            break;
                        }
                    }
                    if all {
                        break 'outer true;
                    }
                }
                false
            }
            _ => 'outer: {
                for a in &first {
                    for b in &second {
                        if !self.pair(ctx, a, b)? {
                            break 'outer false;
                        }
                    }
                }
                true
            }
        };
        Ok(Value::from(result))
    }
}
