//! Memoizing store of type descriptors

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::descriptor::field::TypeDeclaration;
use crate::descriptor::type_descriptor::TypeDescriptor;
use crate::error::{Error, Result};
use crate::typed::XmlType;

type Declare = Box<dyn Fn() -> TypeDeclaration + Send + Sync>;

struct Entry {
    declare: Declare,
    descriptor: OnceLock<Result<Arc<TypeDescriptor>>>,
}

/// Registry of type declarations and their descriptors.
///
/// Declarations are recorded up front; each descriptor is validated and built
/// on its first [`Registry::describe`] and shared from then on. Concurrent
/// first calls for one type wait on that type's cell, so every caller sees the
/// same descriptor (or the same error).
pub struct Registry {
    entries: RwLock<HashMap<String, Arc<Entry>>>,
    builds: AtomicUsize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read();
        let mut names: Vec<&String> = entries.keys().collect();
        names.sort();
        f.debug_struct("Registry")
            .field("types", &names)
            .field("builds", &self.builds.load(Ordering::Relaxed))
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            builds: AtomicUsize::new(0),
        }
    }

    /// Record a declaration. Returns false, keeping the first declaration,
    /// if the type name is already declared.
    pub fn declare(&self, declaration: TypeDeclaration) -> bool {
        let type_name = declaration.type_name().to_string();
        self.declare_with(&type_name, move || declaration.clone())
    }

    /// Record a declaration produced lazily by `declare`.
    pub fn declare_with<F>(&self, type_name: &str, declare: F) -> bool
    where
        F: Fn() -> TypeDeclaration + Send + Sync + 'static,
    {
        if self.entries.read().contains_key(type_name) {
            return false;
        }

        let mut entries = self.entries.write();
        if entries.contains_key(type_name) {
            return false;
        }
        trace!(type_name, "declared type");
        entries.insert(
            type_name.to_string(),
            Arc::new(Entry {
                declare: Box::new(declare),
                descriptor: OnceLock::new(),
            }),
        );
        true
    }

    /// Declare `T` and the types it nests
    pub fn register<T: XmlType>(&self) {
        let declare: fn() -> TypeDeclaration = T::declare;
        if self.declare_with(T::TYPE_NAME, declare) {
            T::register_nested(self);
        }
    }

    pub fn is_declared(&self, type_name: &str) -> bool {
        self.entries.read().contains_key(type_name)
    }

    /// Descriptor for `type_name`, built at most once
    pub fn describe(&self, type_name: &str) -> Result<Arc<TypeDescriptor>> {
        let entry = self
            .entries
            .read()
            .get(type_name)
            .cloned()
            .ok_or_else(|| Error::unsupported(type_name, "type was never declared"))?;

        entry
            .descriptor
            .get_or_init(|| self.build(type_name, &entry.declare))
            .clone()
    }

    /// Number of descriptors built so far
    pub fn built_count(&self) -> usize {
        self.builds.load(Ordering::Acquire)
    }

    fn build(&self, type_name: &str, declare: &Declare) -> Result<Arc<TypeDescriptor>> {
        self.builds.fetch_add(1, Ordering::AcqRel);

        let declaration = declare();
        if declaration.type_name() != type_name {
            return Err(Error::unsupported(
                type_name,
                format!("declaration names type `{}`", declaration.type_name()),
            ));
        }

        let result = TypeDescriptor::from_declaration(declaration).map(Arc::new);
        match &result {
            Ok(descriptor) => debug!(
                type_name,
                fields = descriptor.fields().len(),
                "built type descriptor"
            ),
            Err(err) => debug!(type_name, error = %err, "rejected type declaration"),
        }
        result
    }
}
