/// Splits `text` into consecutive slices whose `measure` stays within
/// `limit`, cutting after whitespace where possible.
///
/// Concatenating the slices gives `text` back. A word longer than the
/// limit on its own is cut at character boundaries.
pub(crate) fn chunk_text<F>(text: &str, limit: usize, measure: F) -> Vec<&str>
where
    F: Fn(&str) -> usize,
{
    let limit = limit.max(1);
    let mut chunks = vec![];
    let mut start = 0;
    let mut end = 0;

    for token in text.split_inclusive(char::is_whitespace) {
        let token_end = end + token.len();
        if measure(&text[start..token_end]) <= limit {
            end = token_end;
            continue;
        }
        if end > start {
            chunks.push(&text[start..end]);
            start = end;
        }
        if measure(token) > limit {
            for (offset, ch) in token.char_indices() {
                let ch_start = end + offset;
                let ch_end = ch_start + ch.len_utf8();
                if ch_start > start && measure(&text[start..ch_end]) > limit {
                    chunks.push(&text[start..ch_start]);
                    start = ch_start;
                }
            }
        }
        end = token_end;
    }
    if end > start {
        chunks.push(&text[start..end]);
    }
    chunks
}

/// Length in bytes.
#[inline]
pub(crate) fn byte_len(s: &str) -> usize {
    s.len()
}

/// Length in Unicode scalar values.
#[inline]
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}
