//! End-to-end evaluation of bound expressions against requests.
//!
//! Covers:
//! 1. Policy-style conditions over designators and variables
//! 2. Type strictness between bags and single values at bind time
//! 3. Empty-bag base cases of `any-of` / `all-of`
//! 4. Each argument and variable evaluated at most once per request
//! 5. Division by zero and `map` element failures as one Indeterminate
//! 6. One bound tree evaluated for many requests in parallel

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pdp_engine::{
    Apply, Argument, Attribute, AttributeDesignator, AttributeKey, AttributeValue, Datatype,
    Engine, EvalErrorKind, EvalResult, EvaluationContext, Expression, PrimitiveKind, Request,
    Status, Value, VariableReference,
};
use pretty_assertions::assert_eq;
use rayon::prelude::*;

const SUBJECT: &str = "urn:oasis:names:tc:xacml:1.0:subject-category:access-subject";
const RESOURCE: &str = "urn:oasis:names:tc:xacml:3.0:attribute-category:resource";

fn engine() -> Engine {
    Engine::standard().unwrap()
}

/// Full identifier of a standard function by its short name.
fn id(engine: &Engine, short_name: &str) -> String {
    let suffix = format!(":function:{short_name}");
    engine
        .registry()
        .ids()
        .into_iter()
        .find(|id| id.ends_with(&suffix))
        .unwrap_or_else(|| panic!("no function {short_name}"))
        .to_string()
}

fn function(engine: &Engine, short_name: &str) -> Argument {
    Argument::function(engine.lookup(&id(engine, short_name)).unwrap())
}

fn bind(engine: &Engine, short_name: &str, args: Vec<Argument>) -> Apply {
    engine.bind(&id(engine, short_name), args).unwrap()
}

fn text(s: &str) -> Argument {
    Argument::constant(AttributeValue::string(s))
}

fn int(n: i64) -> Argument {
    Argument::constant(AttributeValue::integer(n))
}

fn roles() -> AttributeDesignator {
    AttributeDesignator::new(AttributeKey::new(SUBJECT, "role"), PrimitiveKind::String)
}

fn ages() -> AttributeDesignator {
    AttributeDesignator::new(AttributeKey::new(SUBJECT, "age"), PrimitiveKind::Integer)
}

fn subject(roles: &[&str], age: Option<i64>) -> Request {
    let mut builder = Request::builder().attribute(
        Attribute::new(SUBJECT, "role")
            .with_values(roles.iter().map(|r| AttributeValue::string(r))),
    );
    if let Some(age) = age {
        builder = builder.value(SUBJECT, "age", AttributeValue::integer(age));
    }
    builder.build()
}

/// `any-of(string-equal, "admin", role) and integer-one-and-only(age) >= 18`
fn adult_admin(engine: &Engine) -> Apply {
    let is_admin = bind(
        engine,
        "any-of",
        vec![function(engine, "string-equal"), text("admin"), Argument::expr(roles())],
    );
    let age = bind(engine, "integer-one-and-only", vec![Argument::expr(ages())]);
    let adult = bind(
        engine,
        "integer-greater-than-or-equal",
        vec![Argument::from(age), int(18)],
    );
    bind(engine, "and", vec![Argument::from(is_admin), Argument::from(adult)])
}

/// Counts evaluations of the wrapped expression.
#[derive(Debug)]
struct Counting {
    inner: Arc<dyn Expression>,
    count: Arc<AtomicUsize>,
}

impl Counting {
    fn new(inner: impl Expression + 'static) -> (Self, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counting = Counting {
            inner: Arc::new(inner),
            count: Arc::clone(&count),
        };
        (counting, count)
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

#[test]
fn policy_condition_over_requests() {
    let engine = engine();
    let condition = adult_admin(&engine);

    let cases = [
        (subject(&["user", "admin"], Some(30)), true),
        (subject(&["admin"], Some(17)), false),
        (subject(&["user"], Some(40)), false),
    ];
    for (request, expected) in cases {
        assert_eq!(engine.evaluate(&condition, &request).unwrap(), Value::from(expected));
    }
}

#[test]
fn missing_single_value_is_indeterminate() {
    let engine = engine();
    let condition = adult_admin(&engine);
    let err = engine
        .evaluate(&condition, &subject(&["admin"], None))
        .unwrap_err();
    assert_eq!(err.status(), Status::Indeterminate);
    assert!(matches!(err.root_cause().kind, EvalErrorKind::NotOneAndOnly { size: 0, .. }));

    // A false first operand short-circuits past the failing one.
    assert_eq!(
        engine.evaluate(&condition, &subject(&["user"], None)).unwrap(),
        Value::from(false)
    );
}

#[test]
fn bags_and_singles_do_not_mix() {
    let engine = engine();
    let err = engine
        .bind(&id(&engine, "integer-add"), vec![Argument::expr(ages()), int(1)])
        .unwrap_err();
    assert_eq!(err.status(), Status::Syntax);
    assert!(matches!(err.kind, EvalErrorKind::ArgumentTypeMismatch { position: 1, .. }));

    let err = engine
        .bind(&id(&engine, "integer-bag-size"), vec![int(1)])
        .unwrap_err();
    assert_eq!(err.status(), Status::Syntax);
}

#[test]
fn empty_bag_base_cases() {
    let engine = engine();
    let empty = Request::default();
    let any = bind(
        &engine,
        "any-of",
        vec![function(&engine, "string-equal"), text("admin"), Argument::expr(roles())],
    );
    let all = bind(
        &engine,
        "all-of",
        vec![function(&engine, "string-equal"), text("admin"), Argument::expr(roles())],
    );
    assert_eq!(engine.evaluate(&any, &empty).unwrap(), Value::from(false));
    assert_eq!(engine.evaluate(&all, &empty).unwrap(), Value::from(true));
}

#[test]
fn bag_argument_evaluated_once() {
    let engine = engine();
    let (counting, count) = Counting::new(roles());
    let any = bind(
        &engine,
        "any-of",
        vec![function(&engine, "string-equal"), text("nobody"), Argument::expr(counting)],
    );
    let request = subject(&["a", "b", "c", "d"], None);
    assert_eq!(engine.evaluate(&any, &request).unwrap(), Value::from(false));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn variable_evaluated_once_per_request() {
    let engine = engine();
    let (counting, count) = Counting::new(bind(&engine, "integer-one-and-only", vec![Argument::expr(ages())]));
    let definition: Arc<dyn Expression> = Arc::new(counting);
    let age = || Argument::expr(VariableReference::new("age", Arc::clone(&definition)));

    let lower = bind(&engine, "integer-greater-than-or-equal", vec![age(), int(18)]);
    let upper = bind(&engine, "integer-less-than", vec![age(), int(65)]);
    let working_age = bind(&engine, "and", vec![Argument::from(lower), Argument::from(upper)]);

    let request = subject(&[], Some(40));
    assert_eq!(engine.evaluate(&working_age, &request).unwrap(), Value::from(true));
    assert_eq!(count.load(Ordering::SeqCst), 1);
    engine.evaluate(&working_age, &request).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn division_by_zero_from_request_data() {
    let engine = engine();
    let quantity = AttributeDesignator::new(AttributeKey::new(RESOURCE, "quantity"), PrimitiveKind::Integer);
    let divisor = bind(&engine, "integer-one-and-only", vec![Argument::expr(quantity)]);
    let divisor: Arc<dyn Expression> = Arc::new(divisor);
    let divide = bind(&engine, "integer-divide", vec![int(100), Argument::Expr(Arc::clone(&divisor))]);
    let modulo = bind(&engine, "integer-mod", vec![int(100), Argument::Expr(divisor)]);

    let zero = Request::builder()
        .value(RESOURCE, "quantity", AttributeValue::integer(0))
        .build();
    let err = engine.evaluate(&divide, &zero).unwrap_err();
    assert_eq!(err.status(), Status::Indeterminate);
    assert!(matches!(err.root_cause().kind, EvalErrorKind::DivisionByZero));
    let err = engine.evaluate(&modulo, &zero).unwrap_err();
    assert!(matches!(err.root_cause().kind, EvalErrorKind::ModuloByZero));

    let seven = Request::builder()
        .value(RESOURCE, "quantity", AttributeValue::integer(7))
        .build();
    assert_eq!(
        engine.evaluate(&divide, &seven).unwrap(),
        Value::Single(AttributeValue::integer(14))
    );
    assert_eq!(
        engine.evaluate(&modulo, &seven).unwrap(),
        Value::Single(AttributeValue::integer(2))
    );
}

#[test]
fn map_failure_is_one_indeterminate() {
    let engine = engine();
    let quantities = AttributeDesignator::new(AttributeKey::new(RESOURCE, "quantity"), PrimitiveKind::Integer);
    let shares = bind(
        &engine,
        "map",
        vec![function(&engine, "integer-divide"), int(100), Argument::expr(quantities)],
    );

    let request = Request::builder()
        .attribute(
            Attribute::new(RESOURCE, "quantity")
                .with_values([5, 0, 4].map(AttributeValue::integer)),
        )
        .build();
    let err = engine.evaluate(&shares, &request).unwrap_err();
    assert_eq!(err.status(), Status::Indeterminate);
    assert!(matches!(err.root_cause().kind, EvalErrorKind::DivisionByZero));

    let request = Request::builder()
        .attribute(
            Attribute::new(RESOURCE, "quantity")
                .with_values([5, 4].map(AttributeValue::integer)),
        )
        .build();
    let Value::Bag(bag) = engine.evaluate(&shares, &request).unwrap() else {
        panic!("map yields a bag");
    };
    let mut values: Vec<i64> = bag.iter().map(|v| v.as_integer().unwrap().raw()).collect();
    values.sort_unstable();
    assert_eq!(values, vec![20, 25]);
}

#[test]
fn one_tree_many_requests_in_parallel() {
    let engine = engine();
    let condition = adult_admin(&engine);

    let requests: Vec<(Request, bool)> = (0..512i64)
        .map(|i| {
            let admin = i % 3 == 0;
            let age = i % 40;
            let roles: &[&str] = if admin { &["admin", "user"] } else { &["user"] };
            (subject(roles, Some(age)), admin && age >= 18)
        })
        .collect();

    let results: Vec<Value> = requests
        .par_iter()
        .map(|(request, _)| engine.evaluate(&condition, request).unwrap())
        .collect();

    for ((_, expected), actual) in requests.iter().zip(results) {
        assert_eq!(actual, Value::from(*expected));
    }
}
