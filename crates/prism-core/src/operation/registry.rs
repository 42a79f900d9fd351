//! Fixed name → handler mapping.

use super::{Brightness, Details, Grayscale, Operation, Resize, Rotate, Transform};

static BUILTIN: [&dyn Operation; 6] = [
    &Details, &Rotate, &Resize, &Grayscale, &Brightness, &Transform,
];

static GLOBAL: Registry = Registry { handlers: &BUILTIN };

/// The set of supported operations.
///
/// Built at compile time and never mutated; lookup is exact and
/// case-sensitive.
#[derive(Clone, Copy)]
pub struct Registry {
    handlers: &'static [&'static dyn Operation],
}

impl Registry {
    /// The registry of built-in operations.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    pub fn resolve(&self, name: &str) -> Option<&'static dyn Operation> {
        self.handlers.iter().copied().find(|op| op.name() == name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.iter().map(|op| op.name())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
