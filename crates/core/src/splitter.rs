//! Line-oriented chapter and sentence segmentation.

/// Splits document text into chapters delimited by heading lines.
///
/// A line starting with `marker` is a heading. It closes the chapter
/// accumulated so far and becomes the first line of the next one. Blank
/// lines never reach chapter text, and everything before the first heading
/// is preamble, not a chapter. A document with no headings therefore yields
/// no chapters at all.
pub fn split_into_chapters(text: &str, marker: char) -> Vec<String> {
    let mut chapters = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut seen_heading = false;

    for line in text.lines() {
        if line.starts_with(marker) {
            if seen_heading {
                chapters.push(current.join("\n"));
            }
            current.clear();
            seen_heading = true;
        }
        if !line.is_empty() {
            current.push(line);
        }
    }

    if seen_heading {
        chapters.push(current.join("\n"));
    }

    chapters
}

/// Splits chapter text into sentence units on sentence-terminal punctuation
/// and line breaks. Whitespace-only fragments are dropped, so a chapter of
/// nothing but blank space produces zero sentences.
pub fn split_into_sentences(text: &str) -> Vec<String> {
    text.lines()
        .flat_map(|line| line.split(". "))
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .map(str::to_string)
        .collect()
}
