use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::context::NestedSettings;
use super::error::FlexError;

/// Reference to the resource type backing an includable relation. Deferred
/// references carry a dotted registry path and are resolved on demand, so
/// descriptors can point at each other (including cycles) without caring
/// about declaration order.
#[derive(Debug, Clone)]
pub enum DescriptorRef {
    Direct(Arc<ResourceDescriptor>),
    Deferred { path: String, name: String },
}

impl DescriptorRef {
    /// Build a deferred reference from its lazy-string form, e.g.
    /// `"blog.serializers.AuthorDetail"`. The trailing identifier is the type
    /// name; everything before it is the registry path.
    pub fn deferred(lazy: &str) -> Self {
        match lazy.rsplit_once('.') {
            Some((path, name)) => Self::Deferred {
                path: path.to_string(),
                name: name.to_string(),
            },
            None => Self::Deferred {
                path: String::new(),
                name: lazy.to_string(),
            },
        }
    }
}

/// An includable relation: where the nested resource's descriptor lives plus
/// the fixed construction settings the child starts from.
#[derive(Debug, Clone)]
pub struct NestedRelation {
    pub target: DescriptorRef,
    pub settings: NestedSettings,
}

/// Declares the shape of one resource: its emitted field names and the
/// relations that may be expanded into nested documents. Relation order is
/// declaration order, which fixes the expansion order under a wildcard
/// include.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    pub type_name: String,
    field_names: Vec<String>,
    includable: Vec<(String, NestedRelation)>,
}

impl ResourceDescriptor {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            field_names: Vec::new(),
            includable: Vec::new(),
        }
    }

    pub fn fields(mut self, names: &[&str]) -> Self {
        self.field_names = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn relation(mut self, name: impl Into<String>, target: DescriptorRef) -> Self {
        self.includable.push((
            name.into(),
            NestedRelation {
                target,
                settings: NestedSettings::default(),
            },
        ));
        self
    }

    pub fn relation_with_settings(
        mut self,
        name: impl Into<String>,
        target: DescriptorRef,
        settings: NestedSettings,
    ) -> Self {
        self.includable.push((name.into(), NestedRelation { target, settings }));
        self
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    pub fn includable_names(&self) -> Vec<String> {
        self.includable.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn relation_for(&self, name: &str) -> Option<&NestedRelation> {
        self.includable
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, relation)| relation)
    }

    pub fn has_relations(&self) -> bool {
        !self.includable.is_empty()
    }
}

/// Process-lifetime mapping from dotted paths to resource descriptors, with a
/// cache for deferred resolutions. The mapping is stable for the life of the
/// process, so cached entries never invalidate.
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    by_path: HashMap<String, Arc<ResourceDescriptor>>,
    resolved: Mutex<HashMap<(String, String), Arc<ResourceDescriptor>>>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor under a dotted path such as
    /// `"blog.serializers.ArticleDetail"`.
    pub fn register(&mut self, path: impl Into<String>, descriptor: ResourceDescriptor) {
        self.by_path.insert(path.into(), Arc::new(descriptor));
    }

    pub fn get(&self, path: &str) -> Option<Arc<ResourceDescriptor>> {
        self.by_path.get(path).cloned()
    }

    /// Resolve a relation target to its descriptor. Direct references are
    /// returned as-is; deferred references go through the path lookup with
    /// the conventional-suffix retry, and successful lookups are cached.
    pub fn resolve(&self, target: &DescriptorRef) -> Result<Arc<ResourceDescriptor>, FlexError> {
        match target {
            DescriptorRef::Direct(descriptor) => Ok(descriptor.clone()),
            DescriptorRef::Deferred { path, name } => self.resolve_deferred(path, name),
        }
    }

    fn resolve_deferred(&self, path: &str, name: &str) -> Result<Arc<ResourceDescriptor>, FlexError> {
        let cache_key = (path.to_string(), name.to_string());
        if let Some(hit) = self.resolved.lock().unwrap().get(&cache_key) {
            return Ok(hit.clone());
        }

        let descriptor = self
            .lookup(path, name)
            .or_else(|| {
                // Retry once with the conventional module suffix appended
                if path.ends_with(".serializers") {
                    None
                } else {
                    self.lookup(&format!("{}.serializers", path), name)
                }
            })
            .ok_or_else(|| FlexError::UnresolvableType {
                path: path.to_string(),
                name: name.to_string(),
            })?;

        self.resolved.lock().unwrap().insert(cache_key, descriptor.clone());
        Ok(descriptor)
    }

    fn lookup(&self, path: &str, name: &str) -> Option<Arc<ResourceDescriptor>> {
        let full = if path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", path, name)
        };
        self.by_path.get(&full).cloned()
    }
}
