//! Function registry: ID-keyed lookup of function definitions.
//!
//! # Lookup paths
//!
//! - Ordinary functions are looked up by ID alone.
//! - Generic functions (such as `map`) are produced by a
//!   [`GenericFunctionFactory`] from the ID plus the return datatype of the
//!   sub-function they are given.
//!
//! # Layers
//!
//! A registry built with [`FunctionRegistry::extending`] inherits every
//! entry of its base without copying it. Additions go to the new layer
//! only, so the standard registry stays untouched when a host adds its own
//! functions. An ID may appear once across all layers.
//!
//! Registries are mutated only during bootstrap. Once frozen into a
//! [`SharedRegistry`] they are read-only and shared across threads.

use std::fmt;
use std::sync::{Arc, OnceLock};

use pdp_values::{duplicate_function, invalid_sub_function, unknown_function, Datatype, EvalResult};
use rustc_hash::FxHashMap;

use crate::call::{FunctionCall, SharedFunction};
use crate::expr::{Apply, Argument};
use crate::functions::{register_standard, PatternCompiler, XsdPatternCompiler};
use crate::higher_order;
use crate::shared::SharedRegistry;

/// Produces functions whose return type depends on their sub-function.
pub trait GenericFunctionFactory: Send + Sync + fmt::Debug {
    /// Identifier shared by every instantiation.
    fn id(&self) -> &str;

    /// Instantiate for a sub-function returning `sub_return`.
    fn instantiate(&self, sub_return: Datatype) -> EvalResult<SharedFunction>;
}

/// Shared handle to a generic function factory.
pub type SharedFactory = Arc<dyn GenericFunctionFactory>;

/// The standard registry, built on first use.
static STANDARD: OnceLock<EvalResult<SharedRegistry<FunctionRegistry>>> = OnceLock::new();

/// Registry of function definitions.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: FxHashMap<Arc<str>, SharedFunction>,
    generics: FxHashMap<Arc<str>, SharedFactory>,
    base: Option<SharedRegistry<FunctionRegistry>>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty layer on top of `base`.
    pub fn extending(base: SharedRegistry<FunctionRegistry>) -> Self {
        FunctionRegistry {
            base: Some(base),
            ..Self::default()
        }
    }

    /// The standard function set, built once and shared.
    pub fn standard() -> EvalResult<SharedRegistry<FunctionRegistry>> {
        STANDARD
            .get_or_init(|| {
                Self::standard_with(Arc::new(XsdPatternCompiler::new())).map(SharedRegistry::new)
            })
            .clone()
    }

    /// A fresh standard function set compiling patterns with `patterns`.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn standard_with(patterns: Arc<dyn PatternCompiler>) -> EvalResult<FunctionRegistry> {
        let mut registry = FunctionRegistry::new();
        register_standard(&mut registry, &patterns)?;
        higher_order::register(&mut registry)?;
        tracing::debug!(
            functions = registry.functions.len(),
            generics = registry.generics.len(),
            "standard registry built"
        );
        Ok(registry)
    }

    /// Parent layer, if any.
    pub fn base(&self) -> Option<&SharedRegistry<FunctionRegistry>> {
        self.base.as_ref()
    }

    /// Add an ordinary function.
    ///
    /// Fails when the ID is already taken in this layer or any base.
    pub fn register(&mut self, function: SharedFunction) -> EvalResult<()> {
        let id: Arc<str> = Arc::from(function.id());
        if self.contains(&id) {
            tracing::warn!(function = %id, "duplicate function registration");
            return Err(duplicate_function(&id));
        }
        self.functions.insert(id, function);
        Ok(())
    }

    /// Add a generic function factory.
    pub fn register_generic(&mut self, factory: SharedFactory) -> EvalResult<()> {
        let id: Arc<str> = Arc::from(factory.id());
        if self.contains(&id) {
            tracing::warn!(function = %id, "duplicate generic function registration");
            return Err(duplicate_function(&id));
        }
        self.generics.insert(id, factory);
        Ok(())
    }

    /// Look up an ordinary function.
    pub fn lookup(&self, id: &str) -> Option<SharedFunction> {
        match self.functions.get(id) {
            Some(function) => Some(Arc::clone(function)),
            None => self.base.as_ref().and_then(|base| base.lookup(id)),
        }
    }

    /// Look up a generic factory.
    pub fn lookup_factory(&self, id: &str) -> Option<SharedFactory> {
        match self.generics.get(id) {
            Some(factory) => Some(Arc::clone(factory)),
            None => self.base.as_ref().and_then(|base| base.lookup_factory(id)),
        }
    }

    /// Instantiate a generic function for a sub-function returning
    /// `sub_return`. `Ok(None)` when no factory has this ID.
    pub fn lookup_generic(
        &self,
        id: &str,
        sub_return: Datatype,
    ) -> EvalResult<Option<SharedFunction>> {
        self.lookup_factory(id)
            .map(|factory| factory.instantiate(sub_return))
            .transpose()
    }

    /// Whether `id` names any function, ordinary or generic, in any layer.
    pub fn contains(&self, id: &str) -> bool {
        self.functions.contains_key(id)
            || self.generics.contains_key(id)
            || self.base.as_ref().is_some_and(|base| base.contains(id))
    }

    /// Every function ID across all layers, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .functions
            .keys()
            .chain(self.generics.keys())
            .map(|id| &**id)
            .collect();
        if let Some(base) = &self.base {
            ids.extend(base.ids());
        }
        ids.sort_unstable();
        ids
    }

    /// Number of IDs across all layers.
    pub fn len(&self) -> usize {
        self.functions.len() + self.generics.len() + self.base.as_ref().map_or(0, |b| b.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve `id` for the given arguments and bind a call.
    ///
    /// Ordinary functions are tried first. Otherwise a generic factory is
    /// instantiated from the return type of the first argument, which must
    /// be a function reference.
    pub fn bind(&self, id: &str, args: Vec<Argument>) -> EvalResult<Box<dyn FunctionCall>> {
        let function = self.resolve(id, &args)?;
        function.new_call(args, &[])
    }

    /// Resolve and bind `id` into an `Apply` expression.
    pub fn bind_apply(&self, id: &str, args: Vec<Argument>) -> EvalResult<Apply> {
        self.bind(id, args).map(|call| Apply::new(id, call))
    }

    fn resolve(&self, id: &str, args: &[Argument]) -> EvalResult<SharedFunction> {
        if let Some(function) = self.lookup(id) {
            return Ok(function);
        }
        let Some(factory) = self.lookup_factory(id) else {
            return Err(unknown_function(id));
        };
        match args.first() {
            Some(Argument::Function(sub)) => factory.instantiate(sub.return_type()),
            _ => Err(invalid_sub_function(
                id,
                "the first argument must be a function",
            )),
        }
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions.len())
            .field("generics", &self.generics.len())
            .field("base", &self.base.as_ref().map(|b| b.len()))
            .finish()
    }
}
