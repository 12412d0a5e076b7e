use std::collections::HashMap;

/// A single document as seen by the reconciler: a unique id and opaque content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentRecord {
    pub id: String,
    pub content: String,
}

impl DocumentRecord {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// In-memory, insertion-ordered mapping from document id to content.
///
/// Inserting an id that is already present replaces its content but keeps the
/// position where the id was first seen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    records: Vec<DocumentRecord>,
    positions: HashMap<String, usize>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a record, returning the previous content if the id
    /// was already present.
    pub fn insert(&mut self, id: impl Into<String>, content: impl Into<String>) -> Option<String> {
        let id = id.into();
        let content = content.into();

        match self.positions.get(&id) {
            Some(&pos) => Some(std::mem::replace(&mut self.records[pos].content, content)),
            None => {
                self.positions.insert(id.clone(), self.records.len());
                self.records.push(DocumentRecord { id, content });
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.positions
            .get(id)
            .map(|&pos| self.records[pos].content.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }
}

impl FromIterator<DocumentRecord> for Snapshot {
    fn from_iter<T: IntoIterator<Item = DocumentRecord>>(iter: T) -> Self {
        let mut snapshot = Snapshot::new();
        for record in iter {
            snapshot.insert(record.id, record.content);
        }
        snapshot
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Snapshot {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut snapshot = Snapshot::new();
        for (id, content) in iter {
            snapshot.insert(id, content);
        }
        snapshot
    }
}
