use once_cell::sync::Lazy;

use crate::baked::BakedPropertyTable;
use crate::components::{register_builtin_bakes, register_builtin_components};
use crate::reflect::TypeRegistry;

/// Everything a binding resolves against: reflected types plus baked entries.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pub types: TypeRegistry,
    pub baked: BakedPropertyTable,
}

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::builtin);

impl Registry {
    pub fn new(types: TypeRegistry, baked: BakedPropertyTable) -> Self {
        Self { types, baked }
    }

    /// Built-in components with their baked setters.
    pub fn builtin() -> Self {
        let mut types = TypeRegistry::new();
        register_builtin_components(&mut types);
        let mut baked = BakedPropertyTable::new();
        register_builtin_bakes(&mut baked);
        Self { types, baked }
    }

    /// Process-wide built-in registry, constructed on first use.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }
}
