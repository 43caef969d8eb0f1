/// Something that can be matched by the conversation search box.
pub trait Searchable {
    /// Texts a search term is matched against (title, loaded query contents).
    fn search_texts(&self) -> Vec<&str>;
}

/// Case-insensitive substring match against any of `texts`.
pub fn matches<'a>(needle_lower: &str, texts: impl IntoIterator<Item = &'a str>) -> bool {
    texts
        .into_iter()
        .any(|text| text.to_lowercase().contains(needle_lower))
}

/// Keep the items whose texts contain `term`, ignoring case.
///
/// A blank term keeps everything. Input order is preserved.
pub fn filter<T: Searchable>(items: Vec<T>, term: &str) -> Vec<T> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| matches(&needle, item.search_texts()))
        .collect()
}
