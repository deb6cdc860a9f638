//! The resolver factory
//!
//! [`resolver`] produces, per model descriptor, a [`FieldResolver`] that a
//! GraphQL schema wires onto its fields. One resolution walks a fixed path:
//! snake-case the field name, strip the pagination arguments, classify the
//! field as association or root, translate the remaining arguments into
//! equality predicates, apply the field's extra closure, then fetch by the
//! strategy the classification and shape demand and expose the result.

use std::sync::Arc;

use async_graphql::Value;
use heck::ToSnakeCase;
use indexmap::IndexMap;

use crate::error::ResolveError;
use crate::expose::{Resolved, expose_attributes};
use crate::model::{Cardinality, ModelDescriptor};
use crate::pagination::{PageArguments, limit_offset, page_to_connection};
use crate::query::ModelQuery;
use crate::record::Record;
use crate::store::Store;

/// The GraphQL field arguments, in declaration order.
pub type Arguments = IndexMap<String, Value>;

/// Per-field customization closure, given the query target after argument
/// filtering and before fetch.
pub type ExtraFn = Arc<dyn Fn(&mut ModelQuery) + Send + Sync>;

/// Fire-and-forget hook notified of association query targets, so a batching
/// layer can coalesce equivalent fetches.
pub type LoaderFn = Arc<dyn Fn(&ModelQuery) + Send + Sync>;

/// The declared shape of a field's result, decided once at schema-build time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldShape {
    #[default]
    Single,
    List,
    Connection,
}

/// What the engine tells us about the field being resolved.
#[derive(Debug, Clone, Copy)]
pub struct ResolveInfo<'a> {
    pub field_name: &'a str,
}

/// Request-scoped collaborators a resolution runs against.
pub struct ResolveContext<'a> {
    pub store: &'a dyn Store,
}

impl<'a> ResolveContext<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }
}

/// Entry point: start building a resolver for one model.
pub fn resolver(model: Arc<ModelDescriptor>) -> ResolverBuilder {
    ResolverBuilder {
        model,
        shape: FieldShape::default(),
        extra: None,
        loaders: None,
    }
}

/// Per-field configuration collected at schema-build time.
pub struct ResolverBuilder {
    model: Arc<ModelDescriptor>,
    shape: FieldShape,
    extra: Option<ExtraFn>,
    loaders: Option<LoaderFn>,
}

impl ResolverBuilder {
    /// Declare the field's result shape.
    pub fn shape(mut self, shape: FieldShape) -> Self {
        self.shape = shape;
        self
    }

    /// Attach a customization closure, applied exactly once per resolution,
    /// after argument filtering and before fetch.
    pub fn extra(mut self, extra: impl Fn(&mut ModelQuery) + Send + Sync + 'static) -> Self {
        self.extra = Some(Arc::new(extra));
        self
    }

    /// Attach a loader hook notified of association query targets.
    pub fn loaders(mut self, hook: LoaderFn) -> Self {
        self.loaders = Some(hook);
        self
    }

    pub fn build(self) -> FieldResolver {
        FieldResolver {
            model: self.model,
            shape: self.shape,
            extra: self.extra,
            loaders: self.loaders,
        }
    }
}

/// The generated resolver for one field.
pub struct FieldResolver {
    model: Arc<ModelDescriptor>,
    shape: FieldShape,
    extra: Option<ExtraFn>,
    loaders: Option<LoaderFn>,
}

impl FieldResolver {
    /// Resolve one field invocation.
    ///
    /// Errors are propagated, never caught: store failures, cursor-decode
    /// failures, and a registered association resolved without a parent
    /// record all surface to the engine unchanged.
    pub async fn resolve(
        &self,
        source: Option<&Record>,
        args: Arguments,
        context: &ResolveContext<'_>,
        info: &ResolveInfo<'_>,
    ) -> Result<Resolved, ResolveError> {
        let field_key = info.field_name.to_snake_case();

        // Pagination arguments come out before filter translation, so they
        // never become column predicates.
        let mut args = args;
        let page_args = PageArguments {
            first: take_first(&mut args),
            after: take_after(&mut args),
        };

        let fetched = if let Some(association) = self.model.association(&field_key) {
            let source = source.ok_or_else(|| ResolveError::MissingSource {
                field: field_key.clone(),
            })?;

            let mut query = association.query_for(source);
            self.apply_filters(&mut query, args);

            if let Some(hook) = &self.loaders {
                hook(&query);
            }

            tracing::debug!(
                field = %field_key,
                table = %query.table(),
                "resolving association field"
            );

            match association.cardinality() {
                Cardinality::One => match context.store.fetch_one(&query).await? {
                    Some(record) => Resolved::Record(record),
                    None => Resolved::Null,
                },
                Cardinality::Many => Resolved::Collection(context.store.fetch_all(&query).await?),
            }
        } else {
            let mut query = self.model.root_query();
            self.apply_filters(&mut query, args);

            let paginated = page_args.is_requested()
                || self.shape == FieldShape::Connection
                || field_key.contains("_connection");

            tracing::debug!(
                field = %field_key,
                table = %query.table(),
                paginated,
                "resolving root field"
            );

            if paginated {
                let window = limit_offset(&page_args)?;
                let page = context.store.fetch_page(&query, window).await?;
                Resolved::Connection(page_to_connection(page, &page_args)?)
            } else if self.shape == FieldShape::List {
                Resolved::Collection(context.store.fetch_all(&query).await?)
            } else {
                match context.store.fetch_one(&query).await? {
                    Some(record) => Resolved::Record(record),
                    None => Resolved::Null,
                }
            }
        };

        Ok(expose_attributes(fetched))
    }

    /// Translate the remaining arguments into equality predicates, then apply
    /// the extra closure once.
    fn apply_filters(&self, query: &mut ModelQuery, args: Arguments) {
        for (name, value) in args {
            query.where_eq(&name, value);
        }
        if let Some(extra) = &self.extra {
            extra(query);
        }
    }
}

fn take_first(args: &mut Arguments) -> Option<i64> {
    match args.shift_remove("first") {
        Some(Value::Number(n)) => n.as_i64(),
        _ => None,
    }
}

fn take_after(args: &mut Arguments) -> Option<String> {
    match args.shift_remove("after") {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}
