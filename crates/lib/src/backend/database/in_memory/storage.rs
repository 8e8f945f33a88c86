//! Core storage operations for InMemory database

use serde_json::Value;

use super::{Collection, InMemory};
use crate::{
    Result,
    backend::{
        Document, Filter, document_id, errors::BackendError, new_document_id, validate_filter,
        validate_name,
    },
    constants::ID_FIELD,
};

/// Returns clones of the documents matching `filter`, in insertion order.
pub(crate) async fn find_many(
    backend: &InMemory,
    collection: &str,
    filter: &Filter,
    limit: Option<usize>,
) -> Result<Vec<Document>> {
    validate_name(collection)?;
    validate_filter(filter)?;

    let collections = backend.collections.read().await;
    let Some(coll) = collections.get(collection) else {
        return Ok(Vec::new());
    };
    Ok(coll
        .documents
        .iter()
        .filter(|doc| filter.matches(doc))
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect())
}

/// Counts matching documents without cloning them.
pub(crate) async fn count(backend: &InMemory, collection: &str, filter: &Filter) -> Result<u64> {
    validate_name(collection)?;
    validate_filter(filter)?;

    let collections = backend.collections.read().await;
    Ok(collections.get(collection).map_or(0, |coll| {
        coll.documents.iter().filter(|doc| filter.matches(doc)).count() as u64
    }))
}

/// Stores a new document under a freshly generated id.
pub(crate) async fn insert_one(
    backend: &InMemory,
    collection: &str,
    mut document: Document,
) -> Result<String> {
    validate_name(collection)?;

    let id = new_document_id();
    document.insert(ID_FIELD.to_string(), Value::String(id.clone()));

    let mut collections = backend.collections.write().await;
    let coll = collections.entry(collection.to_string()).or_default();
    check_unique(collection, coll, &document, None)?;
    coll.documents.push(document);

    Ok(id)
}

/// Replaces the first matching document, keeping its id.
///
/// Matching and writing happen under one write lock, so a filter that pins a
/// revision behaves as a compare-and-swap.
pub(crate) async fn replace_one(
    backend: &InMemory,
    collection: &str,
    filter: &Filter,
    mut document: Document,
) -> Result<u64> {
    validate_name(collection)?;
    validate_filter(filter)?;

    let mut collections = backend.collections.write().await;
    let Some(coll) = collections.get_mut(collection) else {
        return Ok(0);
    };
    let Some(position) = coll.documents.iter().position(|doc| filter.matches(doc)) else {
        return Ok(0);
    };

    let id = document_id(&coll.documents[position])
        .ok_or_else(|| BackendError::InvalidDocument {
            collection: collection.to_string(),
            reason: "stored document has no id".to_string(),
        })?
        .to_string();
    document.insert(ID_FIELD.to_string(), Value::String(id));

    check_unique(collection, coll, &document, Some(position))?;
    coll.documents[position] = document;

    Ok(1)
}

/// Removes every matching document.
pub(crate) async fn delete_many(
    backend: &InMemory,
    collection: &str,
    filter: &Filter,
) -> Result<u64> {
    validate_name(collection)?;
    validate_filter(filter)?;

    let mut collections = backend.collections.write().await;
    let Some(coll) = collections.get_mut(collection) else {
        return Ok(0);
    };
    let before = coll.documents.len();
    coll.documents.retain(|doc| !filter.matches(doc));
    Ok((before - coll.documents.len()) as u64)
}

/// Registers a unique field, failing if existing documents already collide.
pub(crate) async fn create_unique_index(
    backend: &InMemory,
    collection: &str,
    field: &str,
) -> Result<()> {
    validate_name(collection)?;
    validate_name(field)?;

    let mut collections = backend.collections.write().await;
    let coll = collections.entry(collection.to_string()).or_default();
    if coll.unique_fields.contains(field) {
        return Ok(());
    }

    let mut seen: Vec<&Value> = Vec::new();
    for value in coll
        .documents
        .iter()
        .filter_map(|doc| doc.get(field))
        .filter(|v| !v.is_null())
    {
        if seen.contains(&value) {
            return Err(BackendError::ConstraintViolation {
                collection: collection.to_string(),
                reason: format!("existing documents share the value {value} for '{field}'"),
            }
            .into());
        }
        seen.push(value);
    }

    coll.unique_fields.insert(field.to_string());
    Ok(())
}

/// Rejects `document` if it collides with another document on the id or a
/// unique field. `skip` is the position of the document being replaced.
fn check_unique(
    collection: &str,
    coll: &Collection,
    document: &Document,
    skip: Option<usize>,
) -> Result<()> {
    let others = coll
        .documents
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != skip)
        .map(|(_, doc)| doc);

    let fields: Vec<&str> = std::iter::once(ID_FIELD)
        .chain(coll.unique_fields.iter().map(String::as_str))
        .collect();

    for other in others {
        for &field in &fields {
            match (document.get(field), other.get(field)) {
                (Some(a), Some(b)) if !a.is_null() && a == b => {
                    return Err(BackendError::ConstraintViolation {
                        collection: collection.to_string(),
                        reason: format!("duplicate value {a} for unique field '{field}'"),
                    }
                    .into());
                }
                _ => {}
            }
        }
    }
    Ok(())
}
