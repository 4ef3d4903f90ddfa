// src/notion/request.rs
//! Create-page request bodies in the Notion API shape.

use crate::constants::{
    DEFAULT_DATE_PROPERTY, DEFAULT_PUBLISHED_PROPERTY, DEFAULT_SLUG_PROPERTY, DEFAULT_TAGS_PROPERTY,
    DEFAULT_THUMBNAIL_PROPERTY, DEFAULT_TITLE_PROPERTY, NOTION_MAX_CHILDREN_PER_REQUEST,
};
use crate::model::{BlockNode, DestinationRecord, RichText};
use crate::types::DatabaseId;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};

/// Names of the destination database's properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyNames {
    pub title: String,
    pub slug: String,
    pub tags: String,
    pub published: String,
    pub date: String,
    pub thumbnail: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE_PROPERTY.to_string(),
            slug: DEFAULT_SLUG_PROPERTY.to_string(),
            tags: DEFAULT_TAGS_PROPERTY.to_string(),
            published: DEFAULT_PUBLISHED_PROPERTY.to_string(),
            date: DEFAULT_DATE_PROPERTY.to_string(),
            thumbnail: DEFAULT_THUMBNAIL_PROPERTY.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DatabaseParent {
    pub database_id: String,
}

/// `POST /v1/pages` body. Children beyond the per-request limit go in follow-up appends.
#[derive(Debug, Serialize)]
pub struct CreatePageRequest<'a> {
    pub parent: DatabaseParent,
    pub properties: IndexMap<String, Value>,
    #[serde(skip_serializing_if = "no_children")]
    pub children: &'a [BlockNode],
}

fn no_children(children: &&[BlockNode]) -> bool {
    children.is_empty()
}

/// `PATCH /v1/blocks/{id}/children` body.
#[derive(Debug, Serialize)]
pub struct AppendChildrenRequest<'a> {
    pub children: &'a [BlockNode],
}

/// Splits a record's children into the create call's share and the overflow batches.
pub fn split_children(children: &[BlockNode]) -> (&[BlockNode], Vec<&[BlockNode]>) {
    let first = children.len().min(NOTION_MAX_CHILDREN_PER_REQUEST);
    let (initial, rest) = children.split_at(first);
    (initial, rest.chunks(NOTION_MAX_CHILDREN_PER_REQUEST).collect())
}

pub fn create_page_request<'a>(
    record: &'a DestinationRecord,
    database: &DatabaseId,
    names: &PropertyNames,
) -> CreatePageRequest<'a> {
    let (initial, _) = split_children(&record.children);
    CreatePageRequest {
        parent: DatabaseParent {
            database_id: database.to_dashed(),
        },
        properties: record_properties(record, names),
        children: initial,
    }
}

fn rich_text_value(content: &str) -> Value {
    let runs = RichText::plain(content).split_to_limit();
    serde_json::to_value(runs).unwrap_or_else(|_| json!([]))
}

/// Property map in insertion order: title, slug, tags, published, date, thumbnail.
pub fn record_properties(record: &DestinationRecord, names: &PropertyNames) -> IndexMap<String, Value> {
    let mut properties = IndexMap::new();

    properties.insert(names.title.clone(), json!({ "title": rich_text_value(&record.title) }));
    properties.insert(
        names.slug.clone(),
        json!({ "rich_text": rich_text_value(record.slug.as_str()) }),
    );

    if let Some(tags) = &record.tags {
        let options: Vec<Value> = tags.iter().map(|tag| json!({ "name": tag })).collect();
        properties.insert(names.tags.clone(), json!({ "multi_select": options }));
    }

    properties.insert(names.published.clone(), json!({ "checkbox": record.published }));
    properties.insert(
        names.date.clone(),
        json!({ "date": { "start": record.published_at.to_rfc3339() } }),
    );

    if let Some(url) = &record.thumbnail_url {
        let name = url.rsplit('/').next().filter(|n| !n.is_empty()).unwrap_or("thumbnail");
        properties.insert(
            names.thumbnail.clone(),
            json!({
                "files": [{ "type": "external", "name": name, "external": { "url": url } }]
            }),
        );
    }

    properties
}
