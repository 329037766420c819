//! Deterministic extractive summarization shared by ingestion and the word-cap job.

mod cleaner;
mod extractive;

pub use cleaner::clean_text;
pub use extractive::{
    cap_words, split_sentences, summarize, summarize_with_limit, word_count, MAX_SUMMARY_WORDS,
};
