//! Role-document lookup: an external collaborator that serves
//! long-form guidance keyed by role display name. The engine only
//! consumes short strings from it, and a missing document means "no
//! extra guidance", never an error.

use std::collections::HashMap;

pub trait RoleDocs {
    fn guide(&self, role_name: &str) -> Option<String>;
}

/// The default collaborator: no documents at all.
pub struct NoDocs;

impl RoleDocs for NoDocs {
    fn guide(&self, _role_name: &str) -> Option<String> {
        None
    }
}

/// An in-memory document set, handy for tests and bundled scripts.
#[derive(Debug, Clone, Default)]
pub struct StaticDocs {
    entries: HashMap<String, String>,
}

impl StaticDocs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, role_name: &str, guide: &str) {
        self.entries.insert(role_name.to_string(), guide.to_string());
    }
}

impl RoleDocs for StaticDocs {
    fn guide(&self, role_name: &str) -> Option<String> {
        self.entries.get(role_name).cloned()
    }
}
