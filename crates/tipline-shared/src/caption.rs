//! Final caption assembly for forwarded posts.
//!
//! Telegram measures caption length in UTF-16 code units, not in `char`s:
//! an emoji outside the BMP takes two units.

use crate::constants::MAX_CAPTION_LEN;

/// Length of `text` as Telegram counts it.
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Build the caption of a forwarded post: the submitter's text followed by
/// the author tag.
///
/// The result never exceeds [`MAX_CAPTION_LEN`] UTF-16 units. When it would,
/// the submitter's text is shortened so the author tag is kept whole.
pub fn compose_caption(caption: Option<&str>, author_tag: &str) -> String {
    let text = caption.unwrap_or_default();
    let budget = MAX_CAPTION_LEN.saturating_sub(utf16_len(author_tag));

    let mut out = truncate_utf16(text, budget);
    out.push_str(author_tag);
    truncate_utf16(&out, MAX_CAPTION_LEN)
}

/// Shorten `text` to at most `max` UTF-16 units, marking the cut with `…`.
///
/// The cut always falls on a char boundary, so a surrogate pair is never
/// split; the result may end up one unit below `max`.
pub fn truncate_utf16(text: &str, max: usize) -> String {
    if utf16_len(text) <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }

    // `…` is a single unit.
    let budget = max - 1;
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        used += c.len_utf16();
        if used > budget {
            break;
        }
        out.push(c);
    }
    out.push('…');
    out
}
