//! Inverted-index abstract decoding.
//!
//! OpenAlex ships abstracts as a compact inverted index: a map from word
//! token to the zero-based positions at which it occurs in the original
//! text. Decoding inverts that map and joins the tokens back in position
//! order.

use std::collections::HashMap;

/// Reconstruct plain text from an `abstract_inverted_index` mapping.
///
/// Returns an empty string when the index is absent or empty. Positions are
/// assumed unique across tokens in a well-formed index; when two tokens
/// collide on a position, the pairs are ordered by `(position, token)` and
/// the first token wins, so the output is deterministic regardless of map
/// iteration order.
///
/// O(P log P) in the total position count, dominated by the sort.
pub fn decode_abstract(index: Option<&HashMap<String, Vec<u32>>>) -> String {
    let Some(index) = index else {
        return String::new();
    };

    let total: usize = index.values().map(Vec::len).sum();
    let mut pairs: Vec<(u32, &str)> = Vec::with_capacity(total);
    for (token, positions) in index {
        for &pos in positions {
            pairs.push((pos, token.as_str()));
        }
    }

    pairs.sort_unstable();
    pairs.dedup_by_key(|&mut (pos, _)| pos);

    let mut text = String::new();
    for (i, (_, token)) in pairs.iter().enumerate() {
        if i > 0 {
            text.push(' ');
        }
        text.push_str(token);
    }
    text
}
