//! Integration tests for resolver dispatch
//!
//! These tests drive generated resolvers against a recording mock store and
//! verify the full path per field kind:
//! - association vs root classification
//! - argument-to-predicate translation
//! - pagination dispatch and connection shape
//! - extra-closure and loader-hook plumbing
//! - attribute exposure of every result shape

use std::sync::Arc;

use assert_matches::assert_matches;
use async_graphql::Value;
use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use graphql_shelf::{
    Arguments, Direction, FieldShape, LimitOffset, ModelDescriptor, ModelQuery, Page, Predicate,
    QueryOrigin, Record, ResolveContext, ResolveError, ResolveInfo, Store, StoreError, loaders,
    offset_to_cursor, resolver,
};

// ============================================================================
// Mock store
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fetch {
    One,
    All,
    Page,
}

#[derive(Debug, Clone)]
struct Call {
    fetch: Fetch,
    table: String,
    origin: QueryOrigin,
    predicates: Vec<Predicate>,
    order: Option<(String, Direction)>,
    window: Option<LimitOffset>,
}

/// Returns canned rows and records every query it is handed.
#[derive(Default)]
struct MockStore {
    rows: Vec<Record>,
    total: i64,
    calls: Mutex<Vec<Call>>,
}

impl MockStore {
    fn with_rows(rows: Vec<Record>) -> Self {
        Self {
            total: rows.len() as i64,
            rows,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn total(mut self, total: i64) -> Self {
        self.total = total;
        self
    }

    fn record_call(&self, fetch: Fetch, query: &ModelQuery, window: Option<LimitOffset>) {
        self.calls.lock().push(Call {
            fetch,
            table: query.table().to_string(),
            origin: query.origin().clone(),
            predicates: query.predicates().to_vec(),
            order: query.order().map(|(c, d)| (c.to_string(), d)),
            window,
        });
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn only_call(&self) -> Call {
        let calls = self.calls();
        assert_eq!(calls.len(), 1, "expected exactly one fetch");
        calls.into_iter().next().unwrap()
    }
}

#[async_trait]
impl Store for MockStore {
    async fn fetch_one(&self, query: &ModelQuery) -> Result<Option<Record>, StoreError> {
        self.record_call(Fetch::One, query, None);
        Ok(self.rows.first().cloned())
    }

    async fn fetch_all(&self, query: &ModelQuery) -> Result<Vec<Record>, StoreError> {
        self.record_call(Fetch::All, query, None);
        Ok(self.rows.clone())
    }

    async fn fetch_page(
        &self,
        query: &ModelQuery,
        window: LimitOffset,
    ) -> Result<Page, StoreError> {
        self.record_call(Fetch::Page, query, Some(window));
        Ok(Page {
            records: self.rows.clone(),
            total: self.total,
            limit: window.limit,
            offset: window.offset,
        })
    }
}

/// Fails every fetch, for propagation tests.
struct FailingStore;

#[async_trait]
impl Store for FailingStore {
    async fn fetch_one(&self, _query: &ModelQuery) -> Result<Option<Record>, StoreError> {
        Err(StoreError::Backend(anyhow::anyhow!("connection refused")))
    }

    async fn fetch_all(&self, _query: &ModelQuery) -> Result<Vec<Record>, StoreError> {
        Err(StoreError::Backend(anyhow::anyhow!("connection refused")))
    }

    async fn fetch_page(
        &self,
        _query: &ModelQuery,
        _window: LimitOffset,
    ) -> Result<Page, StoreError> {
        Err(StoreError::Backend(anyhow::anyhow!("connection refused")))
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn author_model() -> Arc<ModelDescriptor> {
    Arc::new(
        ModelDescriptor::builder("authors")
            .has_many("posts", "posts", "author_id")
            .has_one("profile", "profiles", "author_id")
            .build(),
    )
}

fn author(id: i64) -> Record {
    Record::new().with_attr("id", id).with_attr("name", "Ursula")
}

fn args(pairs: &[(&str, Value)]) -> Arguments {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn info(field_name: &str) -> ResolveInfo<'_> {
    ResolveInfo { field_name }
}

// ============================================================================
// Classification: association vs root
// ============================================================================

mod classification {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn to_many_association_uses_the_accessor() {
        let store = MockStore::with_rows(vec![author(1), author(2)]);
        let resolve = resolver(author_model()).build();

        let parent = author(7);
        let result = resolve
            .resolve(
                Some(&parent),
                Arguments::new(),
                &ResolveContext::new(&store),
                &info("posts"),
            )
            .await
            .unwrap();

        let call = store.only_call();
        assert_eq!(call.fetch, Fetch::All);
        assert_eq!(call.table, "posts");
        assert_eq!(
            call.origin,
            QueryOrigin::Association {
                field: "posts".to_string()
            }
        );
        assert_eq!(call.predicates[0].column, "posts.author_id");
        assert_eq!(call.predicates[0].value, Value::from(7i64));
        assert_eq!(result.as_collection().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn to_one_association_fetches_one() {
        let store = MockStore::with_rows(vec![author(1)]);
        let resolve = resolver(author_model()).build();

        let parent = author(7);
        let result = resolve
            .resolve(
                Some(&parent),
                Arguments::new(),
                &ResolveContext::new(&store),
                &info("profile"),
            )
            .await
            .unwrap();

        assert_eq!(store.only_call().fetch, Fetch::One);
        assert!(result.as_record().is_some());
    }

    #[tokio::test]
    async fn empty_to_one_association_resolves_to_null() {
        let store = MockStore::default();
        let resolve = resolver(author_model()).build();

        let parent = author(7);
        let result = resolve
            .resolve(
                Some(&parent),
                Arguments::new(),
                &ResolveContext::new(&store),
                &info("profile"),
            )
            .await
            .unwrap();

        assert!(result.is_null());
    }

    #[tokio::test]
    async fn unregistered_field_is_a_root_query() {
        let store = MockStore::with_rows(vec![author(1)]);
        let resolve = resolver(author_model()).build();

        resolve
            .resolve(
                None,
                Arguments::new(),
                &ResolveContext::new(&store),
                &info("author"),
            )
            .await
            .unwrap();

        let call = store.only_call();
        assert_eq!(call.table, "authors");
        assert_eq!(call.origin, QueryOrigin::Root);
    }

    #[tokio::test]
    async fn camel_case_field_name_matches_snake_case_registry() {
        let model = Arc::new(
            ModelDescriptor::builder("authors")
                .has_many("blog_posts", "posts", "author_id")
                .build(),
        );
        let store = MockStore::default();
        let resolve = resolver(model).build();

        let parent = author(7);
        resolve
            .resolve(
                Some(&parent),
                Arguments::new(),
                &ResolveContext::new(&store),
                &info("blogPosts"),
            )
            .await
            .unwrap();

        assert_eq!(
            store.only_call().origin,
            QueryOrigin::Association {
                field: "blog_posts".to_string()
            }
        );
    }

    #[tokio::test]
    async fn association_without_source_is_a_misconfiguration() {
        let store = MockStore::default();
        let resolve = resolver(author_model()).build();

        let result = resolve
            .resolve(
                None,
                Arguments::new(),
                &ResolveContext::new(&store),
                &info("posts"),
            )
            .await;

        assert_matches!(result, Err(ResolveError::MissingSource { field }) if field == "posts");
        assert!(store.calls().is_empty());
    }
}

// ============================================================================
// Argument-to-predicate translation
// ============================================================================

mod filtering {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn each_argument_becomes_one_qualified_predicate() {
        let store = MockStore::with_rows(vec![author(1)]);
        let resolve = resolver(author_model()).build();

        resolve
            .resolve(
                None,
                args(&[
                    ("name", Value::from("Ursula")),
                    ("active", Value::from(true)),
                ]),
                &ResolveContext::new(&store),
                &info("author"),
            )
            .await
            .unwrap();

        let call = store.only_call();
        assert_eq!(call.predicates.len(), 2);
        assert_eq!(call.predicates[0].column, "authors.name");
        assert_eq!(call.predicates[0].value, Value::from("Ursula"));
        assert_eq!(call.predicates[1].column, "authors.active");
        assert_eq!(call.predicates[1].value, Value::from(true));
    }

    #[tokio::test]
    async fn pagination_arguments_never_become_predicates() {
        let store = MockStore::with_rows(vec![author(1)]).total(10);
        let resolve = resolver(author_model()).build();

        resolve
            .resolve(
                None,
                args(&[
                    ("first", Value::from(2i64)),
                    ("name", Value::from("Ursula")),
                    ("after", Value::String(offset_to_cursor(4))),
                ]),
                &ResolveContext::new(&store),
                &info("authors_connection"),
            )
            .await
            .unwrap();

        let call = store.only_call();
        assert_eq!(call.predicates.len(), 1);
        assert_eq!(call.predicates[0].column, "authors.name");
    }

    #[tokio::test]
    async fn explicit_null_pagination_arguments_are_absent() {
        // A GraphQL null for first/after neither paginates nor filters.
        let store = MockStore::with_rows(vec![author(1)]);
        let resolve = resolver(author_model()).build();

        resolve
            .resolve(
                None,
                args(&[("first", Value::Null), ("after", Value::Null)]),
                &ResolveContext::new(&store),
                &info("author"),
            )
            .await
            .unwrap();

        let call = store.only_call();
        assert_eq!(call.fetch, Fetch::One);
        assert!(call.predicates.is_empty());
    }
}

// ============================================================================
// Pagination dispatch
// ============================================================================

mod pagination_dispatch {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn first_and_after_derive_the_window() {
        let store = MockStore::with_rows((5..15).map(author).collect()).total(100);
        let resolve = resolver(author_model()).build();

        let result = resolve
            .resolve(
                None,
                args(&[
                    ("first", Value::from(10i64)),
                    ("after", Value::String(offset_to_cursor(4))),
                ]),
                &ResolveContext::new(&store),
                &info("authors"),
            )
            .await
            .unwrap();

        let call = store.only_call();
        assert_eq!(call.fetch, Fetch::Page);
        assert_eq!(call.window, Some(LimitOffset { limit: 10, offset: 5 }));

        let connection = result.as_connection().unwrap();
        assert_eq!(connection.total, 100);
        assert_eq!(connection.edges.len(), 10);
        assert_eq!(connection.edges[0].cursor, offset_to_cursor(5));
        assert!(connection.page_info.has_next_page);
        assert!(connection.page_info.has_previous_page);
    }

    #[tokio::test]
    async fn connection_suffix_paginates_without_arguments() {
        let store = MockStore::with_rows(vec![author(1), author(2)]);
        let resolve = resolver(author_model()).build();

        let result = resolve
            .resolve(
                None,
                Arguments::new(),
                &ResolveContext::new(&store),
                &info("authorsConnection"),
            )
            .await
            .unwrap();

        let call = store.only_call();
        assert_eq!(call.fetch, Fetch::Page);
        // No first means an unbounded fetch at offset 0.
        assert_eq!(call.window, Some(LimitOffset { limit: 0, offset: 0 }));
        assert!(result.as_connection().is_some());
    }

    #[tokio::test]
    async fn connection_shape_paginates_without_arguments() {
        let store = MockStore::with_rows(vec![author(1)]);
        let resolve = resolver(author_model())
            .shape(FieldShape::Connection)
            .build();

        let result = resolve
            .resolve(
                None,
                Arguments::new(),
                &ResolveContext::new(&store),
                &info("authors"),
            )
            .await
            .unwrap();

        assert_eq!(store.only_call().fetch, Fetch::Page);
        assert!(result.as_connection().is_some());
    }
}

// ============================================================================
// Root shapes
// ============================================================================

mod shapes {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn list_shape_fetches_all() {
        let store = MockStore::with_rows(vec![author(1), author(2)]);
        let resolve = resolver(author_model()).shape(FieldShape::List).build();

        let result = resolve
            .resolve(
                None,
                Arguments::new(),
                &ResolveContext::new(&store),
                &info("authors"),
            )
            .await
            .unwrap();

        assert_eq!(store.only_call().fetch, Fetch::All);
        assert_eq!(result.as_collection().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn single_shape_fetches_one() {
        let store = MockStore::with_rows(vec![author(1)]);
        let resolve = resolver(author_model()).build();

        let result = resolve
            .resolve(
                None,
                Arguments::new(),
                &ResolveContext::new(&store),
                &info("author"),
            )
            .await
            .unwrap();

        assert_eq!(store.only_call().fetch, Fetch::One);
        assert!(result.as_record().is_some());
    }

    #[tokio::test]
    async fn single_shape_with_no_match_resolves_to_null() {
        let store = MockStore::default();
        let resolve = resolver(author_model()).build();

        let result = resolve
            .resolve(
                None,
                Arguments::new(),
                &ResolveContext::new(&store),
                &info("author"),
            )
            .await
            .unwrap();

        assert!(result.is_null());
    }
}

// ============================================================================
// Extra closure
// ============================================================================

mod extra {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn extra_runs_once_after_argument_filtering() {
        let store = MockStore::with_rows(vec![author(1)]);
        let resolve = resolver(author_model())
            .extra(|query| {
                query
                    .where_eq("deleted", Value::from(false))
                    .order_by("name", Direction::Asc);
            })
            .build();

        resolve
            .resolve(
                None,
                args(&[("name", Value::from("Ursula"))]),
                &ResolveContext::new(&store),
                &info("author"),
            )
            .await
            .unwrap();

        let call = store.only_call();
        // Argument predicates first, the extra's afterwards.
        assert_eq!(call.predicates[0].column, "authors.name");
        assert_eq!(call.predicates[1].column, "authors.deleted");
        assert_eq!(call.order, Some(("name".to_string(), Direction::Asc)));
    }

    #[tokio::test]
    async fn extra_applies_to_association_queries() {
        let store = MockStore::default();
        let resolve = resolver(author_model())
            .extra(|query| {
                query.order_by("created_at", Direction::Desc);
            })
            .build();

        let parent = author(7);
        resolve
            .resolve(
                Some(&parent),
                Arguments::new(),
                &ResolveContext::new(&store),
                &info("posts"),
            )
            .await
            .unwrap();

        let call = store.only_call();
        assert_eq!(call.order, Some(("created_at".to_string(), Direction::Desc)));
    }
}

// ============================================================================
// Loader hook
// ============================================================================

mod loader_hook {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn association_fetches_are_registered() {
        let registry = loaders();
        let store = MockStore::default();
        let resolve = resolver(author_model()).loaders(registry.hook()).build();

        let parent = author(7);
        resolve
            .resolve(
                Some(&parent),
                Arguments::new(),
                &ResolveContext::new(&store),
                &info("posts"),
            )
            .await
            .unwrap();

        let entries = registry.take();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].table, "posts");
        assert!(entries[0].fingerprint.contains("posts.author_id=7"));
    }

    #[tokio::test]
    async fn root_fetches_are_not_registered() {
        let registry = loaders();
        let store = MockStore::with_rows(vec![author(1)]);
        let resolve = resolver(author_model()).loaders(registry.hook()).build();

        resolve
            .resolve(
                None,
                Arguments::new(),
                &ResolveContext::new(&store),
                &info("author"),
            )
            .await
            .unwrap();

        assert!(registry.take().is_empty());
    }
}

// ============================================================================
// Attribute exposure through the full path
// ============================================================================

mod exposure_flow {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn resolved_records_read_as_plain_data() {
        let store = MockStore::with_rows(vec![author(1)]);
        let resolve = resolver(author_model()).build();

        let result = resolve
            .resolve(
                None,
                Arguments::new(),
                &ResolveContext::new(&store),
                &info("author"),
            )
            .await
            .unwrap();

        let record = result.as_record().unwrap();
        assert_eq!(record.field("name"), Some(&Value::from("Ursula")));
        assert_eq!(record.field("name"), record.get("name"));
    }

    #[tokio::test]
    async fn resolved_connection_nodes_are_exposed() {
        let store = MockStore::with_rows(vec![author(1), author(2)]);
        let resolve = resolver(author_model()).build();

        let result = resolve
            .resolve(
                None,
                args(&[("first", Value::from(2i64))]),
                &ResolveContext::new(&store),
                &info("authors"),
            )
            .await
            .unwrap();

        let connection = result.as_connection().unwrap();
        for edge in &connection.edges {
            assert!(edge.node.field("id").is_some());
        }
    }

    #[tokio::test]
    async fn connection_serializes_to_the_wire_shape() {
        let store = MockStore::with_rows(vec![author(1)]).total(3);
        let resolve = resolver(author_model()).build();

        let result = resolve
            .resolve(
                None,
                args(&[("first", Value::from(1i64))]),
                &ResolveContext::new(&store),
                &info("authors_connection"),
            )
            .await
            .unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["total"], 3);
        assert_eq!(json["edges"][0]["node"]["name"], "Ursula");
        assert_eq!(json["pageInfo"]["hasNextPage"], true);
    }
}

// ============================================================================
// Error propagation
// ============================================================================

mod errors {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn store_failures_propagate_unchanged() {
        let resolve = resolver(author_model()).build();

        let result = resolve
            .resolve(
                None,
                Arguments::new(),
                &ResolveContext::new(&FailingStore),
                &info("author"),
            )
            .await;

        assert_matches!(result, Err(ResolveError::Store(StoreError::Backend(_))));
    }

    #[tokio::test]
    async fn malformed_cursor_propagates() {
        let store = MockStore::default();
        let resolve = resolver(author_model()).build();

        let result = resolve
            .resolve(
                None,
                args(&[("after", Value::from("not-a-cursor!"))]),
                &ResolveContext::new(&store),
                &info("authors"),
            )
            .await;

        assert_matches!(result, Err(ResolveError::Cursor(_)));
        // The failure happens before any fetch.
        assert!(store.calls().is_empty());
    }
}
