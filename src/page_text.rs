/*!
 * Text-source helpers.
 *
 * The pipeline consumes one flat list of raw lines in which a reserved
 * sentinel follows every page. These helpers build that list from pages of
 * lines, or from a form-feed separated text dump such as `pdftotext` output.
 */

/// Reserved line value marking the end of a page.
///
/// Wrapped in NUL characters so it can never come out of a text extractor.
pub const PAGE_SENTINEL: &str = "\u{0}PAGE_BREAK\u{0}";

/// Page separator used by text dumps
pub const FORM_FEED: char = '\u{c}';

/// Split a form-feed separated dump into pages of lines.
///
/// A form feed terminates a page, so a trailing one does not open an extra
/// empty page.
pub fn split_pages(text: &str) -> Vec<Vec<String>> {
    let mut pages: Vec<&str> = text.split(FORM_FEED).collect();
    if pages.last().is_some_and(|page| page.is_empty()) {
        pages.pop();
    }

    pages
        .into_iter()
        .map(|page| page.lines().map(str::to_string).collect())
        .collect()
}

/// Flatten pages into raw lines, appending the sentinel after each page
pub fn with_page_sentinels<S: AsRef<str>>(pages: &[Vec<S>]) -> Vec<String> {
    let total_lines: usize = pages.iter().map(Vec::len).sum();
    let mut lines = Vec::with_capacity(total_lines + pages.len());

    for page in pages {
        lines.extend(page.iter().map(|line| line.as_ref().to_string()));
        lines.push(PAGE_SENTINEL.to_string());
    }

    lines
}

/// Raw pipeline lines straight from a form-feed separated dump
pub fn lines_from_dump(text: &str) -> Vec<String> {
    with_page_sentinels(&split_pages(text))
}
