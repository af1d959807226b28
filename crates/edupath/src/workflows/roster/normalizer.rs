/// Cleans a header cell for display: strips spreadsheet BOM/zero-width marks and
/// collapses runs of whitespace.
pub(crate) fn clean_header(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Key used to match configured column names against headers.
pub(crate) fn column_key(value: &str) -> String {
    clean_header(value).to_ascii_lowercase()
}

#[cfg(test)]
pub(crate) fn column_key_for_tests(value: &str) -> String {
    column_key(value)
}
