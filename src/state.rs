use std::sync::Arc;

use serde_json::{json, Value};

use crate::auth::{InMemoryUserStore, UserStore};
use crate::flex::{DescriptorRef, DescriptorRegistry, NestedSettings, ResourceDescriptor};
use crate::scope::{QuerySpec, ScopeRegistry};

/// Shared per-process state: the descriptor registry, the scope registry,
/// the user store and the dataset served by the reference endpoints.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<DescriptorRegistry>,
    pub scopes: Arc<ScopeRegistry>,
    pub users: Arc<dyn UserStore>,
    pub articles: Arc<Vec<Value>>,
}

impl AppState {
    /// State backing the reference server: a small blog dataset with nested
    /// authors, addresses and comments.
    pub fn sample() -> Self {
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
                .relation_with_settings(
                    "author",
                    DescriptorRef::deferred("blog.serializers.AuthorDetail"),
                    // Comment authors render as teasers unless the request
                    // asks for more
                    NestedSettings {
                        include: vec![],
                        fields: vec!["id".to_string(), "name".to_string()],
                        omit: vec![],
                    },
                ),
        );
        registry.register(
            "blog.serializers.ArticleDetail",
            ResourceDescriptor::new("article")
                .fields(&["id", "title", "body", "published"])
                .relation("author", DescriptorRef::deferred("blog.serializers.AuthorDetail"))
                .relation("comments", DescriptorRef::deferred("blog.CommentDetail")),
        );

        let mut scopes = ScopeRegistry::new();
        scopes
            .register_scope("published", |spec: QuerySpec| {
                spec.filter_eq("published", json!(true))
            })
            .expect("register 'published' scope");
        scopes
            .register_aggregate("recent", |mut spec: QuerySpec| {
                spec.limit = Some(2);
                spec
            })
            .expect("register 'recent' aggregate");

        Self {
            registry: Arc::new(registry),
            scopes: Arc::new(scopes),
            users: Arc::new(InMemoryUserStore::new()),
            articles: Arc::new(sample_articles()),
        }
    }
}

fn sample_articles() -> Vec<Value> {
    let alice = json!({
        "id": 1,
        "name": "Alice",
        "email": "alice@example.com",
        "address": {"city": "Lisbon", "zipcode": "1000-001", "country": "PT"}
    });
    let bob = json!({
        "id": 2,
        "name": "Bob",
        "email": "bob@example.com",
        "address": {"city": "Porto", "zipcode": "4000-001", "country": "PT"}
    });

    vec![
        json!({
            "id": 1,
            "title": "Sparse fieldsets in practice",
            "body": "How clients trim payloads.",
            "published": true,
            "author": alice.clone(),
            "comments": [
                {"id": 10, "text": "Great read", "author": bob.clone()},
                {"id": 11, "text": "Thanks!", "author": alice.clone()},
            ]
        }),
        json!({
            "id": 2,
            "title": "Nested expansion pitfalls",
            "body": "Dot-paths all the way down.",
            "published": true,
            "author": bob,
            "comments": []
        }),
        json!({
            "id": 3,
            "title": "Unpublished draft",
            "body": "Not ready yet.",
            "published": false,
            "author": alice,
            "comments": []
        }),
    ]
}
