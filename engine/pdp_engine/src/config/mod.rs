//! Engine configuration and its builder.

use std::fmt;

use pdp_context::IssuerMatching;
use pdp_functions::{SharedFactory, SharedFunction};
use pdp_values::EvalResult;

use crate::engine::Engine;

/// Environment variable selecting the issuer matching mode.
pub const ISSUER_MATCHING_VAR: &str = "PDP_ISSUER_MATCHING";
/// Environment variable enabling strict XML Schema regex translation.
pub const STRICT_REGEX_VAR: &str = "PDP_STRICT_REGEX";

/// Everything needed to build an `Engine`.
#[derive(Clone, Debug, Default)]
pub struct EngineConfig {
    pub issuer_matching: IssuerMatching,
    /// Reject XML Schema regex constructs with no Rust equivalent instead
    /// of passing them through to the regex engine.
    pub strict_regex_translation: bool,
    /// Functions registered on top of the standard set.
    pub functions: Vec<SharedFunction>,
    /// Generic function factories registered on top of the standard set.
    pub generics: Vec<SharedFactory>,
}

impl EngineConfig {
    /// Read `PDP_ISSUER_MATCHING` (`strict` or `lax`) and `PDP_STRICT_REGEX`
    /// (`true` or `false`) from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = EngineConfig::default();
        if let Some(value) = lookup(ISSUER_MATCHING_VAR) {
            config.issuer_matching = IssuerMatching::from_name(&value)
                .ok_or_else(|| ConfigError::new(ISSUER_MATCHING_VAR, &value, "expected `strict` or `lax`"))?;
        }
        if let Some(value) = lookup(STRICT_REGEX_VAR) {
            config.strict_regex_translation = parse_flag(&value)
                .ok_or_else(|| ConfigError::new(STRICT_REGEX_VAR, &value, "expected `true` or `false`"))?;
        }
        tracing::debug!(
            issuer_matching = %config.issuer_matching,
            strict_regex = config.strict_regex_translation,
            "configuration read from environment"
        );
        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// An environment variable with a value the engine does not understand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigError {
    pub variable: &'static str,
    pub value: String,
    pub reason: &'static str,
}

impl ConfigError {
    #[cold]
    fn new(variable: &'static str, value: &str, reason: &'static str) -> Self {
        ConfigError {
            variable,
            value: value.to_string(),
            reason,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}={:?}: {}", self.variable, self.value, self.reason)
    }
}

impl std::error::Error for ConfigError {}

/// Builder for configuring and creating an `Engine`.
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        EngineBuilder { config }
    }

    /// Set how designators without an issuer match issued attributes.
    #[must_use]
    pub fn issuer_matching(mut self, mode: IssuerMatching) -> Self {
        self.config.issuer_matching = mode;
        self
    }

    /// Reject untranslatable XML Schema regex constructs.
    #[must_use]
    pub fn strict_regex_translation(mut self, strict: bool) -> Self {
        self.config.strict_regex_translation = strict;
        self
    }

    /// Register an extra function on top of the standard set.
    #[must_use]
    pub fn function(mut self, function: SharedFunction) -> Self {
        self.config.functions.push(function);
        self
    }

    /// Register an extra generic function factory on top of the standard set.
    #[must_use]
    pub fn generic(mut self, factory: SharedFactory) -> Self {
        self.config.generics.push(factory);
        self
    }

    /// The configuration built so far.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the engine. Fails on duplicate function identifiers.
    pub fn build(self) -> EvalResult<Engine> {
        Engine::new(self.config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
