//! Model descriptors
//!
//! A [`ModelDescriptor`] is what the resolver factory is given per model: a
//! table name, a primary-key column, and an explicit registry of named
//! associations. Association dispatch is a membership check against this
//! registry; nothing is discovered by reflection.

use std::fmt;
use std::sync::Arc;

use async_graphql::Value;
use indexmap::IndexMap;

use crate::query::ModelQuery;
use crate::record::Record;

/// A table name: a literal, or a zero-argument closure producing one.
/// Computed names are resolved at each use, not captured once.
#[derive(Clone)]
pub enum TableName {
    Literal(String),
    Computed(Arc<dyn Fn() -> String + Send + Sync>),
}

impl TableName {
    pub fn resolve(&self) -> String {
        match self {
            TableName::Literal(name) => name.clone(),
            TableName::Computed(f) => f(),
        }
    }

    pub fn computed(f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        TableName::Computed(Arc::new(f))
    }
}

impl fmt::Debug for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableName::Literal(name) => write!(f, "TableName::Literal({:?})", name),
            TableName::Computed(_) => write!(f, "TableName::Computed(..)"),
        }
    }
}

impl From<&str> for TableName {
    fn from(name: &str) -> Self {
        TableName::Literal(name.to_string())
    }
}

impl From<String> for TableName {
    fn from(name: String) -> Self {
        TableName::Literal(name)
    }
}

/// Whether an association resolves to one record or many.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

type Accessor = Arc<dyn Fn(&Record) -> ModelQuery + Send + Sync>;

/// A declared relationship to another record type: a cardinality plus an
/// accessor closure producing the query target for a given parent record.
#[derive(Clone)]
pub struct Association {
    cardinality: Cardinality,
    accessor: Accessor,
}

impl Association {
    pub fn to_one(accessor: impl Fn(&Record) -> ModelQuery + Send + Sync + 'static) -> Self {
        Self {
            cardinality: Cardinality::One,
            accessor: Arc::new(accessor),
        }
    }

    pub fn to_many(accessor: impl Fn(&Record) -> ModelQuery + Send + Sync + 'static) -> Self {
        Self {
            cardinality: Cardinality::Many,
            accessor: Arc::new(accessor),
        }
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Invoke the accessor on the parent record.
    pub fn query_for(&self, source: &Record) -> ModelQuery {
        (self.accessor)(source)
    }
}

impl fmt::Debug for Association {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Association")
            .field("cardinality", &self.cardinality)
            .finish_non_exhaustive()
    }
}

/// The per-model input to the resolver factory.
#[derive(Debug)]
pub struct ModelDescriptor {
    table: TableName,
    primary_key: String,
    associations: IndexMap<String, Association>,
}

impl ModelDescriptor {
    pub fn builder(table: impl Into<TableName>) -> ModelDescriptorBuilder {
        ModelDescriptorBuilder {
            table: table.into(),
            primary_key: "id".to_string(),
            associations: Vec::new(),
        }
    }

    /// The resolved table name.
    pub fn table(&self) -> String {
        self.table.resolve()
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Membership lookup for association dispatch.
    pub fn association(&self, field: &str) -> Option<&Association> {
        self.associations.get(field)
    }

    pub fn association_names(&self) -> impl Iterator<Item = &str> {
        self.associations.keys().map(|s| s.as_str())
    }

    /// A fresh query against the model's whole table.
    pub fn root_query(&self) -> ModelQuery {
        ModelQuery::new(self.table())
    }
}

enum AssociationSpec {
    Custom(Association),
    HasMany {
        target: TableName,
        foreign_key: String,
    },
    HasOne {
        target: TableName,
        foreign_key: String,
    },
    BelongsTo {
        target: TableName,
        target_key: String,
        foreign_key: String,
    },
}

/// Builds a [`ModelDescriptor`]. Foreign-key sugar is materialized into
/// accessor closures at [`build`](ModelDescriptorBuilder::build) time, once
/// the primary key is final.
pub struct ModelDescriptorBuilder {
    table: TableName,
    primary_key: String,
    associations: Vec<(String, AssociationSpec)>,
}

impl ModelDescriptorBuilder {
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = name.into();
        self
    }

    /// Register an association with a custom accessor.
    pub fn association(mut self, field: impl Into<String>, association: Association) -> Self {
        self.associations
            .push((field.into(), AssociationSpec::Custom(association)));
        self
    }

    /// To-many: rows of `target` whose `foreign_key` column equals this
    /// model's primary-key value.
    pub fn has_many(
        mut self,
        field: impl Into<String>,
        target: impl Into<TableName>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.associations.push((
            field.into(),
            AssociationSpec::HasMany {
                target: target.into(),
                foreign_key: foreign_key.into(),
            },
        ));
        self
    }

    /// To-one variant of [`has_many`](Self::has_many).
    pub fn has_one(
        mut self,
        field: impl Into<String>,
        target: impl Into<TableName>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.associations.push((
            field.into(),
            AssociationSpec::HasOne {
                target: target.into(),
                foreign_key: foreign_key.into(),
            },
        ));
        self
    }

    /// To-one: the row of `target` whose `target_key` column equals this
    /// record's `foreign_key` attribute.
    pub fn belongs_to(
        mut self,
        field: impl Into<String>,
        target: impl Into<TableName>,
        target_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.associations.push((
            field.into(),
            AssociationSpec::BelongsTo {
                target: target.into(),
                target_key: target_key.into(),
                foreign_key: foreign_key.into(),
            },
        ));
        self
    }

    pub fn build(self) -> ModelDescriptor {
        let primary_key = self.primary_key;
        let mut associations = IndexMap::new();

        for (field, spec) in self.associations {
            let association = match spec {
                AssociationSpec::Custom(association) => association,
                AssociationSpec::HasMany {
                    target,
                    foreign_key,
                } => Association {
                    cardinality: Cardinality::Many,
                    accessor: fk_accessor(field.clone(), target, foreign_key, primary_key.clone()),
                },
                AssociationSpec::HasOne {
                    target,
                    foreign_key,
                } => Association {
                    cardinality: Cardinality::One,
                    accessor: fk_accessor(field.clone(), target, foreign_key, primary_key.clone()),
                },
                AssociationSpec::BelongsTo {
                    target,
                    target_key,
                    foreign_key,
                } => {
                    let field_name = field.clone();
                    Association {
                        cardinality: Cardinality::One,
                        accessor: Arc::new(move |parent: &Record| {
                            let mut query =
                                ModelQuery::association(target.resolve(), field_name.clone());
                            query.where_eq(
                                &target_key,
                                parent.get(&foreign_key).cloned().unwrap_or(Value::Null),
                            );
                            query
                        }),
                    }
                }
            };
            associations.insert(field, association);
        }

        ModelDescriptor {
            table: self.table,
            primary_key,
            associations,
        }
    }
}

/// Accessor scoping `target.foreign_key` by the parent's primary-key value.
fn fk_accessor(
    field: String,
    target: TableName,
    foreign_key: String,
    parent_key: String,
) -> Accessor {
    Arc::new(move |parent: &Record| {
        let mut query = ModelQuery::association(target.resolve(), field.clone());
        query.where_eq(
            &foreign_key,
            parent.get(&parent_key).cloned().unwrap_or(Value::Null),
        );
        query
    })
}
