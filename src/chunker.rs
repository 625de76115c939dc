use crate::error::{Error, Result};

/// Splits text into ordered word-count-bounded chunks.
///
/// The text is tokenized on whitespace and partitioned into contiguous
/// groups of exactly `chunk_size` words (the final group may be shorter),
/// each rejoined with single spaces. Concatenating the word sequences of the
/// returned chunks, in order, reproduces the input's word sequence exactly;
/// only whitespace style is lost.
///
/// # Errors
///
/// Returns [`Error::InvalidChunkSize`] when `chunk_size` is 0.
///
/// # Examples
///
/// ```
/// let chunks = llm_relay::split("alpha beta gamma", 2).unwrap();
/// assert_eq!(chunks, vec!["alpha beta", "gamma"]);
/// ```
pub fn split(text: &str, chunk_size: usize) -> Result<Vec<String>> {
    if chunk_size == 0 {
        return Err(Error::InvalidChunkSize { size: chunk_size });
    }

    let words: Vec<&str> = text.split_whitespace().collect();

    Ok(words
        .chunks(chunk_size)
        .map(|group| group.join(" "))
        .collect())
}

/// Counts whitespace-separated words in text.
#[inline]
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
