//! Read-only registry of pattern definitions.

use std::sync::OnceLock;

use crate::{builtin, PatternId, PatternSpec};

/// Ordered set of [`PatternSpec`]s, at most one per [`PatternId`].
#[derive(Clone, Debug)]
pub struct PatternCatalog {
    specs: Vec<PatternSpec>,
}

static BUILTIN: OnceLock<PatternCatalog> = OnceLock::new();

impl PatternCatalog {
    /// Catalog over `specs`; later duplicates of an identifier are dropped.
    pub fn new(specs: Vec<PatternSpec>) -> Self {
        let mut out: Vec<PatternSpec> = Vec::with_capacity(specs.len());
        for spec in specs {
            if out.iter().any(|s| s.id == spec.id) {
                log::warn!("duplicate pattern {} ignored", spec.id);
                continue;
            }
            out.push(spec);
        }
        Self { specs: out }
    }

    /// Shared catalog of every built-in pattern, built on first use.
    pub fn builtin() -> &'static PatternCatalog {
        BUILTIN.get_or_init(|| PatternCatalog::new(builtin::all()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatternSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Look up a built-in identifier.
    ///
    /// Panics when the catalog was built without that pattern; use
    /// [`PatternCatalog::find`] for custom catalogs.
    pub fn get(&self, id: PatternId) -> &PatternSpec {
        match self.find(id) {
            Some(spec) => spec,
            None => panic!("pattern {id} is not registered"),
        }
    }

    pub fn find(&self, id: PatternId) -> Option<&PatternSpec> {
        self.specs.iter().find(|s| s.id == id)
    }

    /// Patterns that accept a grid of `dims`.
    pub fn applicable(&self, dims: (usize, usize)) -> impl Iterator<Item = &PatternSpec> {
        self.specs.iter().filter(move |s| s.accepts(dims))
    }
}
