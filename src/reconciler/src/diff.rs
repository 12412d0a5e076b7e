use common::Snapshot;

/// Ids present in `index` but absent from `reference`, in index order.
pub fn deletion_set(index: &Snapshot, reference: &Snapshot) -> Vec<String> {
    index
        .ids()
        .filter(|id| !reference.contains(id))
        .map(str::to_string)
        .collect()
}

/// First `max_chars` characters of `content` followed by `...`
pub fn content_preview(content: &str, max_chars: usize) -> String {
    let mut preview: String = content.chars().take(max_chars).collect();
    preview.push_str("...");
    preview
}
