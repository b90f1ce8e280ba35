//! Per-call binding state

use std::collections::HashSet;

use crate::bind::Options;
use crate::error::{Error, ErrorKind};
use crate::object::ObjectRef;
use crate::path::Path;

/// Path and cycle bookkeeping owned by a single bind or unbind call
#[derive(Debug, Default)]
pub(crate) struct Context {
    path: Path,
    visiting: HashSet<*const ()>,
    options: Options,
}

impl Context {
    pub(crate) fn new(root: &str, options: Options) -> Self {
        Self {
            path: Path::root(root),
            visiting: HashSet::new(),
            options,
        }
    }

    pub(crate) const fn strict(&self) -> bool {
        self.options.strict
    }

    pub(crate) fn push(&mut self, name: &str) {
        self.path.push_name(name);
    }

    pub(crate) fn push_index(&mut self, index: usize) {
        self.path.push_index(index);
    }

    pub(crate) fn pop(&mut self) {
        self.path.pop();
    }

    /// Error located at the current path
    pub(crate) fn error(&self, kind: ErrorKind) -> Error {
        Error::binding(kind, &self.path)
    }

    /// Error located at a child of the current path
    pub(crate) fn error_at(&self, name: &str, kind: ErrorKind) -> Error {
        let mut path = self.path.clone();
        path.push_name(name);
        Error::binding(kind, &path)
    }

    /// Attach the current path to an error raised without a location
    pub(crate) fn locate(&self, err: Error) -> Error {
        err.located(&self.path)
    }

    /// Mark `object` as being unbound; false if it already is
    pub(crate) fn enter(&mut self, object: &ObjectRef) -> bool {
        self.visiting.insert(object.addr())
    }

    pub(crate) fn leave(&mut self, object: &ObjectRef) {
        self.visiting.remove(&object.addr());
    }
}
