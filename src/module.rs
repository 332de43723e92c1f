use crate::prelude::*;

/// A namespace created by `import`. It has no instances.
#[derive(Debug)]
pub struct Module {
    pub name: String,
    pub scope: ScopeRef,
}

impl Module {
    pub fn new(name: impl Into<String>, scope: ScopeRef) -> Self {
        Self { name: name.into(), scope }
    }
}
