//! Document filters.
//!
//! A [`Filter`] is a small predicate language over JSON documents. Backends
//! evaluate it where the data lives: `InMemory` walks the documents directly,
//! `Sqlite` compiles it to a `WHERE` clause, so only matching documents are
//! ever materialized.
//!
//! Paths are dot-separated field names (`"address.city"`). A missing field
//! equals `null`.

use serde_json::Value;

use super::Document;
use crate::constants::ID_FIELD;

/// A predicate over JSON documents.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// Matches every document.
    #[default]
    All,
    /// The value at `path` equals `value`.
    Eq {
        /// Dotted field path
        path: String,
        /// Expected value
        value: Value,
    },
    /// The array at `path` contains `value`.
    Contains {
        /// Dotted path of an array field
        path: String,
        /// Element to look for
        value: Value,
    },
    /// At least one object in the array at `path` matches `filter`.
    ElemMatch {
        /// Dotted path of an array field
        path: String,
        /// Filter applied to each object element
        filter: Box<Filter>,
    },
    /// All inner filters match.
    And(Vec<Filter>),
}

impl Filter {
    /// Filter matching every document.
    pub fn all() -> Self {
        Filter::All
    }

    /// Field equality.
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Equality on the document id.
    pub fn by_id(id: impl Into<String>) -> Self {
        Filter::eq(ID_FIELD, Value::String(id.into()))
    }

    /// Array membership.
    pub fn contains(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Contains {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Array element match.
    pub fn elem_match(path: impl Into<String>, filter: Filter) -> Self {
        Filter::ElemMatch {
            path: path.into(),
            filter: Box::new(filter),
        }
    }

    /// Conjunction of `self` and `other`, flattening nested `And`s and
    /// dropping `All`.
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, other) => other,
            (this, Filter::All) => this,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), other) => {
                left.push(other);
                Filter::And(left)
            }
            (this, Filter::And(mut right)) => {
                right.insert(0, this);
                Filter::And(right)
            }
            (this, other) => Filter::And(vec![this, other]),
        }
    }

    /// Evaluate the filter against a document.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq { path, value } => match resolve(document, path) {
                Some(found) => found == value,
                None => value.is_null(),
            },
            Filter::Contains { path, value } => resolve(document, path)
                .and_then(Value::as_array)
                .is_some_and(|items| items.iter().any(|item| item == value)),
            Filter::ElemMatch { path, filter } => resolve(document, path)
                .and_then(Value::as_array)
                .is_some_and(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_object)
                        .any(|item| filter.matches(item))
                }),
            Filter::And(filters) => filters.iter().all(|f| f.matches(document)),
        }
    }

    /// Every field path referenced by this filter, nested paths included.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Filter::All => {}
            Filter::Eq { path, .. } | Filter::Contains { path, .. } => out.push(path),
            Filter::ElemMatch { path, filter } => {
                out.push(path);
                filter.collect_paths(out);
            }
            Filter::And(filters) => filters.iter().for_each(|f| f.collect_paths(out)),
        }
    }
}

/// Follow a dotted path through nested objects.
fn resolve<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}
