//! Wire types of the search service document API.

use common::DocumentRecord;
use serde::{Deserialize, Serialize};

/// Body of `POST /indexes/{index}/docs/search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub search: String,
    pub select: String,
}

impl SearchRequest {
    /// Wildcard query projecting only `id` and `content`
    pub fn all_documents() -> Self {
        Self {
            search: "*".to_string(),
            select: "id, content".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub value: Vec<SearchDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchDocument {
    pub id: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl From<SearchDocument> for DocumentRecord {
    fn from(doc: SearchDocument) -> Self {
        DocumentRecord {
            id: doc.id,
            content: doc.content.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndexActionKind {
    Delete,
}

/// One entry of an index batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexAction {
    #[serde(rename = "@search.action")]
    pub action: IndexActionKind,
    pub id: String,
}

impl IndexAction {
    pub fn delete(id: impl Into<String>) -> Self {
        Self {
            action: IndexActionKind::Delete,
            id: id.into(),
        }
    }
}

/// Body of `POST /indexes/{index}/docs/index`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexBatch {
    pub value: Vec<IndexAction>,
}

impl IndexBatch {
    pub fn delete<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            value: ids.into_iter().map(IndexAction::delete).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}
