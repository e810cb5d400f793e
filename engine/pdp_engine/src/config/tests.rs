use super::*;

use pretty_assertions::assert_eq;

fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
    move |name| {
        vars.iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| (*value).to_string())
    }
}

#[test]
fn test_defaults_when_unset() {
    let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config.issuer_matching, IssuerMatching::Lax);
    assert!(!config.strict_regex_translation);
    assert!(config.functions.is_empty());
}

#[test]
fn test_reads_issuer_matching() {
    let config = EngineConfig::from_lookup(lookup(&[(ISSUER_MATCHING_VAR, "Strict")])).unwrap();
    assert_eq!(config.issuer_matching, IssuerMatching::Strict);
}

#[test]
fn test_reads_strict_regex_flag() {
    let on = EngineConfig::from_lookup(lookup(&[(STRICT_REGEX_VAR, "true")])).unwrap();
    assert!(on.strict_regex_translation);
    let off = EngineConfig::from_lookup(lookup(&[(STRICT_REGEX_VAR, "0")])).unwrap();
    assert!(!off.strict_regex_translation);
}

#[test]
fn test_rejects_unknown_values() {
    let err = EngineConfig::from_lookup(lookup(&[(ISSUER_MATCHING_VAR, "loose")])).unwrap_err();
    assert_eq!(err.variable, ISSUER_MATCHING_VAR);
    assert_eq!(err.value, "loose");
    assert_eq!(
        err.to_string(),
        "invalid PDP_ISSUER_MATCHING=\"loose\": expected `strict` or `lax`"
    );

    let err = EngineConfig::from_lookup(lookup(&[(STRICT_REGEX_VAR, "maybe")])).unwrap_err();
    assert_eq!(err.variable, STRICT_REGEX_VAR);
}

#[test]
fn test_builder_setters() {
    let builder = EngineBuilder::new()
        .issuer_matching(IssuerMatching::Strict)
        .strict_regex_translation(true);
    assert_eq!(builder.config().issuer_matching, IssuerMatching::Strict);
    assert!(builder.config().strict_regex_translation);

    let config = EngineConfig {
        issuer_matching: IssuerMatching::Strict,
        ..EngineConfig::default()
    };
    let builder = EngineBuilder::from_config(config);
    assert_eq!(builder.config().issuer_matching, IssuerMatching::Strict);
}
