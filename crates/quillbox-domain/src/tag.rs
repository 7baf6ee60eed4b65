//! Note tag normalization rules.

/// Maximum number of tags per note.
pub const MAX_TAGS: usize = 10;

/// Maximum length of a single tag in characters.
pub const MAX_TAG_LEN: usize = 30;

/// Normalize a raw tag list into its canonical stored form.
///
/// Applied on every note create and update: trims whitespace, lowercases,
/// drops empty and over-length tags, deduplicates preserving first
/// occurrence, and caps the list at [`MAX_TAGS`].
pub fn normalize_tags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in raw {
        if out.len() == MAX_TAGS {
            break;
        }
        let tag = tag.as_ref().trim().to_lowercase();
        if tag.is_empty() || tag.chars().count() > MAX_TAG_LEN {
            continue;
        }
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
