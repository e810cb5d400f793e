//! The configured engine.

use std::sync::Arc;

use pdp_context::{IssuerMatching, Request, RequestContext};
use pdp_functions::{
    Apply, Argument, Expression, FunctionRegistry, SharedFunction, SharedRegistry,
    XsdPatternCompiler,
};
use pdp_values::{EvalResult, Value};

use crate::config::{EngineBuilder, EngineConfig};

/// A frozen function registry plus the request settings used with it.
#[derive(Clone, Debug)]
pub struct Engine {
    registry: SharedRegistry<FunctionRegistry>,
    issuer_matching: IssuerMatching,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Engine over the shared standard function set with default settings.
    pub fn standard() -> EvalResult<Self> {
        Self::new(EngineConfig::default())
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            issuer_matching = %config.issuer_matching,
            strict_regex = config.strict_regex_translation,
            extra = config.functions.len() + config.generics.len(),
        )
    )]
    pub fn new(config: EngineConfig) -> EvalResult<Self> {
        let standard = if config.strict_regex_translation {
            SharedRegistry::new(FunctionRegistry::standard_with(Arc::new(
                XsdPatternCompiler::strict(),
            ))?)
        } else {
            FunctionRegistry::standard()?
        };

        let registry = if config.functions.is_empty() && config.generics.is_empty() {
            standard
        } else {
            let mut layer = FunctionRegistry::extending(standard);
            for function in config.functions {
                layer.register(function)?;
            }
            for factory in config.generics {
                layer.register_generic(factory)?;
            }
            SharedRegistry::new(layer)
        };

        tracing::debug!(functions = registry.len(), "engine ready");
        Ok(Engine {
            registry,
            issuer_matching: config.issuer_matching,
        })
    }

    pub fn registry(&self) -> &SharedRegistry<FunctionRegistry> {
        &self.registry
    }

    pub fn issuer_matching(&self) -> IssuerMatching {
        self.issuer_matching
    }

    pub fn lookup(&self, id: &str) -> Option<SharedFunction> {
        self.registry.lookup(id)
    }

    /// Bind function `id` to `args`, validating them once.
    pub fn bind(&self, id: &str, args: Vec<Argument>) -> EvalResult<Apply> {
        self.registry.bind_apply(id, args)
    }

    /// A fresh per-request context over `request`.
    pub fn context<'r>(&self, request: &'r Request) -> RequestContext<'r> {
        RequestContext::new(request, self.issuer_matching)
    }

    /// Evaluate `expr` against `request` in a fresh context.
    pub fn evaluate(&self, expr: &dyn Expression, request: &Request) -> EvalResult<Value> {
        let mut ctx = self.context(request);
        let result = expr.evaluate(&mut ctx);
        if let Err(err) = &result {
            if err.root_cause().is_defect() {
                tracing::error!(error = %err, "engine defect during evaluation");
            }
        }
        result
    }
}
