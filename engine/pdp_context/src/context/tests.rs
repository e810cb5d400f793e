use super::*;

use pdp_functions::{AttributeDesignator, Constant, Expression, VariableReference};
use pdp_values::{AttributeValue, EvalErrorKind, Status};
use pretty_assertions::assert_eq;

const SUBJECT: &str = "urn:oasis:names:tc:xacml:1.0:subject-category:access-subject";

fn strings(values: &[&str]) -> Bag {
    Bag::from_values(
        PrimitiveKind::String,
        values.iter().map(|s| AttributeValue::string(s)).collect(),
    )
    .unwrap()
}

fn roles_request() -> Request {
    Request::builder()
        .attribute(Attribute::new(SUBJECT, "role").with_value(AttributeValue::string("user")))
        .attribute(
            Attribute::new(SUBJECT, "role")
                .with_issuer("hr")
                .with_values([AttributeValue::string("manager"), AttributeValue::string("auditor")]),
        )
        .build()
}

fn role() -> AttributeKey {
    AttributeKey::new(SUBJECT, "role")
}

#[test]
fn test_issuer_matching_names() {
    assert_eq!(IssuerMatching::default(), IssuerMatching::Lax);
    assert_eq!(IssuerMatching::from_name("STRICT"), Some(IssuerMatching::Strict));
    assert_eq!(IssuerMatching::from_name(" lax "), Some(IssuerMatching::Lax));
    assert_eq!(IssuerMatching::from_name("loose"), None);
    assert_eq!(IssuerMatching::Strict.to_string(), "strict");
}

#[test]
fn test_lax_merges_every_issuer() {
    let request = roles_request();
    let mut ctx = RequestContext::new(&request, IssuerMatching::Lax);
    let bag = ctx.resolve_attribute(&role(), PrimitiveKind::String).unwrap();
    assert_eq!(bag, strings(&["user", "manager", "auditor"]));
}

#[test]
fn test_strict_ignores_issued_attributes() {
    let request = roles_request();
    let mut ctx = RequestContext::new(&request, IssuerMatching::Strict);
    let bag = ctx.resolve_attribute(&role(), PrimitiveKind::String).unwrap();
    assert_eq!(bag, strings(&["user"]));
}

#[test]
fn test_named_issuer_matches_exactly_in_both_modes() {
    let request = roles_request();
    for mode in [IssuerMatching::Lax, IssuerMatching::Strict] {
        let mut ctx = RequestContext::new(&request, mode);
        let hr = ctx
            .resolve_attribute(&role().with_issuer("hr"), PrimitiveKind::String)
            .unwrap();
        assert_eq!(hr, strings(&["manager", "auditor"]), "{mode}");
        let other = ctx
            .resolve_attribute(&role().with_issuer("it"), PrimitiveKind::String)
            .unwrap();
        assert!(other.is_empty(), "{mode}");
    }
}

#[test]
fn test_values_of_other_datatypes_are_skipped() {
    let request = Request::builder()
        .attribute(
            Attribute::new(SUBJECT, "level")
                .with_values([AttributeValue::integer(3), AttributeValue::string("three")]),
        )
        .build();
    let mut ctx = RequestContext::new(&request, IssuerMatching::Lax);
    let key = AttributeKey::new(SUBJECT, "level");
    let ints = ctx.resolve_attribute(&key, PrimitiveKind::Integer).unwrap();
    assert_eq!(ints.as_slice(), &[AttributeValue::integer(3)]);
    let doubles = ctx.resolve_attribute(&key, PrimitiveKind::Double).unwrap();
    assert!(doubles.is_empty());
    assert_eq!(ctx.resolved(), 2);
}

#[test]
fn test_resolution_is_cached_per_context() {
    let request = roles_request();
    let mut ctx = RequestContext::new(&request, IssuerMatching::Lax);
    let first = ctx.resolve_attribute(&role(), PrimitiveKind::String).unwrap();
    let second = ctx.resolve_attribute(&role(), PrimitiveKind::String).unwrap();
    assert_eq!(first, second);
    assert_eq!(ctx.resolved(), 1);
    assert!(std::ptr::eq(ctx.request(), &request));
}

#[test]
fn test_designator_over_request() {
    let request = roles_request();
    let designator = AttributeDesignator::new(role(), PrimitiveKind::String);
    let mut ctx = RequestContext::new(&request, IssuerMatching::Strict);
    assert_eq!(designator.evaluate(&mut ctx).unwrap(), Value::Bag(strings(&["user"])));

    let missing = AttributeDesignator::new(AttributeKey::new(SUBJECT, "clearance"), PrimitiveKind::String)
        .must_be_present(true);
    let err = missing.evaluate(&mut ctx).unwrap_err();
    assert_eq!(err.status(), Status::Indeterminate);
    assert!(matches!(err.kind, EvalErrorKind::MissingAttribute { .. }));
}

#[test]
fn test_variables_are_per_context() {
    let request = Request::builder().build();
    let variable = VariableReference::new("limit", Arc::new(Constant::new(AttributeValue::integer(7))));

    let mut ctx = RequestContext::new(&request, IssuerMatching::Lax);
    assert_eq!(ctx.variable("limit"), None);
    variable.evaluate(&mut ctx).unwrap();
    assert_eq!(ctx.variable("limit"), Some(Value::Single(AttributeValue::integer(7))));

    let fresh = RequestContext::new(&request, IssuerMatching::Lax);
    assert_eq!(fresh.variable("limit"), None);
    assert_eq!(fresh.issuer_matching(), IssuerMatching::Lax);
}
