use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::SerializerConfig;

use super::context::PlanningContext;
use super::descriptor::{DescriptorRegistry, ResourceDescriptor};
use super::error::FlexError;
use super::paths::split_levels;
use super::planner::{fields_to_expand, fields_to_remove};
use super::wildcard::{contains_wildcard, expand_wildcard};

/// The dynamic serialization engine.
///
/// One serializer instance plans one resource instance: it splits the
/// directive triple for the current level, prunes fields per the omit/sparse
/// rules, and expands includable relations into child serializers that carry
/// only the parent-supplied next-level fragments. Children never read request
/// state; the root directives enter once, at construction.
pub struct FlexSerializer<'r> {
    registry: &'r DescriptorRegistry,
    config: &'r SerializerConfig,
    descriptor: Arc<ResourceDescriptor>,
    context: PlanningContext,
}

impl<'r> FlexSerializer<'r> {
    pub fn root(
        registry: &'r DescriptorRegistry,
        config: &'r SerializerConfig,
        descriptor: Arc<ResourceDescriptor>,
        include: Vec<String>,
        fields: Vec<String>,
        omit: Vec<String>,
    ) -> Self {
        Self {
            registry,
            config,
            descriptor,
            context: PlanningContext::root(include, fields, omit),
        }
    }

    /// Constrain the root include set to an endpoint-declared allow-list: a
    /// wildcard include becomes exactly the permitted set, anything else is
    /// intersected with it. Nested levels never see the allow-list.
    pub fn permitted_includes(mut self, permitted: &[String]) -> Self {
        if !self.context.root {
            return self;
        }
        let wildcard = self.config.wildcard_values.as_deref();
        if contains_wildcard(&self.context.include, wildcard) {
            let include = std::mem::take(&mut self.context.include);
            self.context.include = expand_wildcard(include, Some(permitted), wildcard);
        } else {
            self.context
                .include
                .retain(|path| permitted.iter().any(|p| p == path));
        }
        self
    }

    fn nested(&self, descriptor: Arc<ResourceDescriptor>, context: PlanningContext) -> Self {
        Self {
            registry: self.registry,
            config: self.config,
            descriptor,
            context,
        }
    }

    /// Relation names expanded while serializing the last instance.
    pub fn expanded_fields(&self) -> &[String] {
        &self.context.expanded
    }

    /// Serialize one resource instance into its planned field tree.
    ///
    /// Arrays serialize element-by-element, each element with an independent
    /// planning context, output order matching input order. Null stays null
    /// and scalar relation values pass through untouched.
    pub fn serialize(&mut self, instance: &Value) -> Result<Value, FlexError> {
        match instance {
            Value::Null => Ok(Value::Null),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.fresh().serialize(item)?);
                }
                Ok(Value::Array(out))
            }
            Value::Object(obj) => self.serialize_object(obj).map(Value::Object),
            other => Ok(other.clone()),
        }
    }

    /// Serialize a collection, one independent context per element.
    pub fn serialize_many(&self, instances: &[Value]) -> Result<Vec<Value>, FlexError> {
        instances.iter().map(|i| self.fresh().serialize(i)).collect()
    }

    fn fresh(&self) -> Self {
        let mut context = self.context.clone();
        context.expanded = Vec::new();
        Self {
            registry: self.registry,
            config: self.config,
            descriptor: self.descriptor.clone(),
            context,
        }
    }

    fn serialize_object(&mut self, obj: &Map<String, Value>) -> Result<Map<String, Value>, FlexError> {
        let (include, next_include) = split_levels(&self.context.include);
        let (sparse, next_sparse) = split_levels(&self.context.fields);
        let (omit, next_omit) = split_levels(&self.context.omit);
        let wildcard = self.config.wildcard_values.as_deref();

        let removed = fields_to_remove(
            self.descriptor.field_names(),
            &omit,
            &sparse,
            &next_omit,
            wildcard,
        );
        let includable = self.descriptor.includable_names();
        let expand = fields_to_expand(&include, &includable, &omit, &sparse, &next_omit, wildcard);

        let mut out = Map::new();
        for name in self.descriptor.field_names() {
            if removed.contains(name) || expand.contains(name) {
                continue;
            }
            out.insert(name.clone(), obj.get(name).cloned().unwrap_or(Value::Null));
        }

        for name in &expand {
            let Some(relation) = self.descriptor.relation_for(name) else {
                continue;
            };

            // Cloning the declared settings keeps sibling children from ever
            // aliasing the same directive lists.
            let settings = relation.settings.clone();
            let context = PlanningContext::nested(
                next_include.get(name).cloned().unwrap_or(settings.include),
                next_sparse.get(name).cloned().unwrap_or(settings.fields),
                next_omit.get(name).cloned().unwrap_or(settings.omit),
            );
            let child_descriptor = self.registry.resolve(&relation.target)?;
            let mut child = self.nested(child_descriptor, context);

            let value = obj.get(name).cloned().unwrap_or(Value::Null);
            out.insert(name.clone(), child.serialize(&value)?);
            self.context.expanded.push(name.clone());
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flex::context::NestedSettings;
    use crate::flex::descriptor::DescriptorRef;
    use serde_json::json;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn config() -> SerializerConfig {
        crate::config::AppConfig::from_env().serializer
    }

    fn blog_registry() -> DescriptorRegistry {
        let mut registry = DescriptorRegistry::new();
        registry.register(
            "blog.serializers.AddressDetail",
            ResourceDescriptor::new("address").fields(&["city", "zipcode", "country"]),
        );
        registry.register(
            "blog.serializers.AuthorDetail",
            ResourceDescriptor::new("author")
                .fields(&["id", "name", "email"])
                .relation("address", DescriptorRef::deferred("blog.AddressDetail")),
        );
        registry.register(
            "blog.serializers.CommentDetail",
            ResourceDescriptor::new("comment")
                .fields(&["id", "text"])
                .relation("author", DescriptorRef::deferred("blog.serializers.AuthorDetail")),
        );
        registry.register(
            "blog.serializers.ArticleDetail",
            ResourceDescriptor::new("article")
                .fields(&["id", "title", "body"])
                .relation("author", DescriptorRef::deferred("blog.serializers.AuthorDetail"))
                .relation("comments", DescriptorRef::deferred("blog.serializers.CommentDetail")),
        );
        registry
    }

    fn article() -> Value {
        json!({
            "id": 1,
            "title": "Hello",
            "body": "World",
            "author": {
                "id": 7,
                "name": "Alice",
                "email": "alice@example.com",
                "address": {"city": "Lisbon", "zipcode": "1000", "country": "PT"}
            },
            "comments": [
                {"id": 10, "text": "First", "author": {"id": 8, "name": "Bob", "email": "bob@example.com", "address": null}},
                {"id": 11, "text": "Second", "author": {"id": 7, "name": "Alice", "email": "alice@example.com", "address": null}}
            ]
        })
    }

    #[test]
    fn plain_serialization_keeps_declared_fields_only() {
        let registry = blog_registry();
        let cfg = config();
        let descriptor = registry.get("blog.serializers.ArticleDetail").unwrap();
        let mut ser = FlexSerializer::root(&registry, &cfg, descriptor, vec![], vec![], vec![]);
        let out = ser.serialize(&article()).unwrap();
        assert_eq!(out, json!({"id": 1, "title": "Hello", "body": "World"}));
    }

    #[test]
    fn end_to_end_include_author_with_sparse_fields() {
        // include=author, fields=id,author.name
        let registry = blog_registry();
        let cfg = config();
        let descriptor = registry.get("blog.serializers.ArticleDetail").unwrap();
        let mut ser = FlexSerializer::root(
            &registry,
            &cfg,
            descriptor,
            strings(&["author"]),
            strings(&["id", "author.name"]),
            vec![],
        );
        let out = ser.serialize(&article()).unwrap();
        assert_eq!(out, json!({"id": 1, "author": {"name": "Alice"}}));
        assert_eq!(ser.expanded_fields(), &["author".to_string()]);
    }

    #[test]
    fn nested_directives_stay_isolated_per_branch() {
        // Root fields/omit must not leak into the child unless dotted under it
        let registry = blog_registry();
        let cfg = config();
        let descriptor = registry.get("blog.serializers.ArticleDetail").unwrap();
        let mut ser = FlexSerializer::root(
            &registry,
            &cfg,
            descriptor,
            strings(&["author"]),
            vec![],
            strings(&["body"]),
        );
        let out = ser.serialize(&article()).unwrap();
        // body omitted at root; author serialized with no constraints at all
        assert_eq!(
            out,
            json!({
                "id": 1,
                "title": "Hello",
                "author": {"id": 7, "name": "Alice", "email": "alice@example.com"}
            })
        );
    }

    #[test]
    fn deep_omit_prunes_only_the_leaf() {
        // omit=author.address.zipcode with the full chain included
        let registry = blog_registry();
        let cfg = config();
        let descriptor = registry.get("blog.serializers.ArticleDetail").unwrap();
        let mut ser = FlexSerializer::root(
            &registry,
            &cfg,
            descriptor,
            strings(&["author.address"]),
            strings(&["id", "author.address.city", "author.address.zipcode"]),
            strings(&["author.address.zipcode"]),
        );
        let out = ser.serialize(&article()).unwrap();
        assert_eq!(
            out,
            json!({"id": 1, "author": {"address": {"city": "Lisbon"}}})
        );
    }

    #[test]
    fn collections_serialize_element_by_element_in_order() {
        let registry = blog_registry();
        let cfg = config();
        let descriptor = registry.get("blog.serializers.ArticleDetail").unwrap();
        let ser = FlexSerializer::root(
            &registry,
            &cfg,
            descriptor,
            strings(&["comments"]),
            strings(&["id", "comments.text"]),
            vec![],
        );
        let one = article();
        let two = json!({"id": 2, "title": "Again", "body": "x", "author": null, "comments": []});
        let out = ser.serialize_many(&[one, two]).unwrap();
        assert_eq!(
            out,
            vec![
                json!({"id": 1, "comments": [{"text": "First"}, {"text": "Second"}]}),
                json!({"id": 2, "comments": []}),
            ]
        );
    }

    #[test]
    fn wildcard_include_expands_every_relation() {
        let registry = blog_registry();
        let cfg = config();
        let descriptor = registry.get("blog.serializers.ArticleDetail").unwrap();
        let mut ser = FlexSerializer::root(
            &registry,
            &cfg,
            descriptor,
            strings(&["*"]),
            strings(&["id", "author.id", "comments.id"]),
            vec![],
        );
        let out = ser.serialize(&article()).unwrap();
        assert_eq!(
            out,
            json!({
                "id": 1,
                "author": {"id": 7},
                "comments": [{"id": 10}, {"id": 11}]
            })
        );
        assert_eq!(ser.expanded_fields(), &strings(&["author", "comments"]));
    }

    #[test]
    fn permitted_allow_list_caps_wildcard_and_filters_explicit_paths() {
        let registry = blog_registry();
        let cfg = config();
        let descriptor = registry.get("blog.serializers.ArticleDetail").unwrap();

        let mut ser = FlexSerializer::root(
            &registry,
            &cfg,
            descriptor.clone(),
            strings(&["~all"]),
            strings(&["id", "author.id"]),
            vec![],
        )
        .permitted_includes(&strings(&["author"]));
        let out = ser.serialize(&article()).unwrap();
        assert_eq!(out, json!({"id": 1, "author": {"id": 7}}));

        let mut ser = FlexSerializer::root(
            &registry,
            &cfg,
            descriptor,
            strings(&["author", "comments"]),
            strings(&["id", "comments.text"]),
            vec![],
        )
        .permitted_includes(&strings(&["comments"]));
        let out = ser.serialize(&article()).unwrap();
        assert_eq!(out["comments"].as_array().unwrap().len(), 2);
        assert!(out.get("author").is_none());
    }

    #[test]
    fn terminal_omit_beats_include() {
        let registry = blog_registry();
        let cfg = config();
        let descriptor = registry.get("blog.serializers.ArticleDetail").unwrap();
        let mut ser = FlexSerializer::root(
            &registry,
            &cfg,
            descriptor,
            strings(&["author"]),
            vec![],
            strings(&["author"]),
        );
        let out = ser.serialize(&article()).unwrap();
        assert!(out.get("author").is_none());
    }

    #[test]
    fn non_terminal_omit_still_expands_the_parent() {
        // omit=author.email: author expands, only the email is suppressed
        let registry = blog_registry();
        let cfg = config();
        let descriptor = registry.get("blog.serializers.ArticleDetail").unwrap();
        let mut ser = FlexSerializer::root(
            &registry,
            &cfg,
            descriptor,
            strings(&["author"]),
            strings(&["id"]),
            strings(&["author.email"]),
        );
        let out = ser.serialize(&article()).unwrap();
        assert_eq!(out, json!({"id": 1, "author": {"id": 7, "name": "Alice"}}));
    }

    #[test]
    fn trailing_dot_omit_is_non_terminal() {
        let registry = blog_registry();
        let cfg = config();
        let descriptor = registry.get("blog.serializers.ArticleDetail").unwrap();
        let mut ser = FlexSerializer::root(
            &registry,
            &cfg,
            descriptor,
            strings(&["author"]),
            strings(&["id"]),
            strings(&["author."]),
        );
        let out = ser.serialize(&article()).unwrap();
        // The empty fragment removes nothing in the child
        assert_eq!(
            out["author"],
            json!({"id": 7, "name": "Alice", "email": "alice@example.com"})
        );
    }

    #[test]
    fn declared_settings_seed_the_child_until_overridden() {
        let mut registry = blog_registry();
        let settings = NestedSettings {
            include: vec![],
            fields: strings(&["name"]),
            omit: vec![],
        };
        registry.register(
            "blog.serializers.TeaserDetail",
            ResourceDescriptor::new("teaser")
                .fields(&["id", "title"])
                .relation_with_settings(
                    "author",
                    DescriptorRef::deferred("blog.serializers.AuthorDetail"),
                    settings,
                ),
        );
        let cfg = config();
        let descriptor = registry.get("blog.serializers.TeaserDetail").unwrap();

        // No parent fragment: the declared sparse preset applies
        let mut ser = FlexSerializer::root(
            &registry,
            &cfg,
            descriptor.clone(),
            strings(&["author"]),
            vec![],
            vec![],
        );
        let out = ser.serialize(&article()).unwrap();
        assert_eq!(out["author"], json!({"name": "Alice"}));

        // A parent fragment for the same kind replaces the preset
        let mut ser = FlexSerializer::root(
            &registry,
            &cfg,
            descriptor,
            strings(&["author"]),
            strings(&["author.email"]),
            vec![],
        );
        let out = ser.serialize(&article()).unwrap();
        assert_eq!(out["author"], json!({"email": "alice@example.com"}));
    }

    #[test]
    fn unresolvable_relation_aborts_serialization() {
        let mut registry = DescriptorRegistry::new();
        registry.register(
            "blog.serializers.ArticleDetail",
            ResourceDescriptor::new("article")
                .fields(&["id"])
                .relation("author", DescriptorRef::deferred("missing.AuthorDetail")),
        );
        let cfg = config();
        let descriptor = registry.get("blog.serializers.ArticleDetail").unwrap();
        let mut ser = FlexSerializer::root(
            &registry,
            &cfg,
            descriptor,
            strings(&["author"]),
            vec![],
            vec![],
        );
        let err = ser.serialize(&json!({"id": 1, "author": {}})).unwrap_err();
        assert!(matches!(err, FlexError::UnresolvableType { .. }));
    }

    #[test]
    fn missing_declared_fields_serialize_as_null() {
        let registry = blog_registry();
        let cfg = config();
        let descriptor = registry.get("blog.serializers.ArticleDetail").unwrap();
        let mut ser = FlexSerializer::root(&registry, &cfg, descriptor, vec![], vec![], vec![]);
        let out = ser.serialize(&json!({"id": 5})).unwrap();
        assert_eq!(out, json!({"id": 5, "title": null, "body": null}));
    }
}
