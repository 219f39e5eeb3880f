use serde::{Deserialize, Deserializer, Serialize};

use crate::foundation::error::{VersecastError, VersecastResult};
use crate::source::scripture::{ChapterUnit, Scripture};

/// Durable cursor: the next chapter to process and the credential to start with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressState {
    /// Book index (0-based).
    #[serde(deserialize_with = "null_as_zero")]
    pub book: usize,
    /// Chapter index within the book (0-based).
    #[serde(deserialize_with = "null_as_zero")]
    pub chapter: usize,
    /// Index into the credential set.
    #[serde(
        rename = "credentialIndex",
        alias = "apiKeyIndex",
        deserialize_with = "null_as_zero"
    )]
    pub credential_index: usize,
}

// Records written by hand or by older tools may carry `null` for an unset field.
fn null_as_zero<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<usize>::deserialize(deserializer)?.unwrap_or(0))
}

/// Forward-only cursor over a [`Scripture`].
///
/// A chapter is committed only by [`ProgressTracker::advance`]; anything that fails before that
/// point is redone from scratch on the next run.
#[derive(Clone, Copy, Debug)]
pub struct ProgressTracker<'s> {
    source: &'s Scripture,
}

impl<'s> ProgressTracker<'s> {
    /// Track progress through `source`.
    pub fn new(source: &'s Scripture) -> Self {
        Self { source }
    }

    /// The chapter `state` points at.
    ///
    /// A chapter index past the end of its book means the book is complete: the cursor rolls to the
    /// first chapter of the next book that has any. Fails with [`VersecastError::EndOfSource`] once
    /// the cursor is beyond the last book.
    pub fn next(&self, state: &ProgressState) -> VersecastResult<ChapterUnit> {
        let (mut book, mut chapter) = (state.book, state.chapter);
        loop {
            let Some(b) = self.source.book(book) else {
                return Err(VersecastError::EndOfSource);
            };
            if chapter < b.chapters.len() {
                break;
            }
            book += 1;
            chapter = 0;
        }

        self.source
            .chapter(book, chapter)
            .ok_or(VersecastError::EndOfSource)
    }

    /// Cursor after `unit` has fully succeeded.
    pub fn advance(&self, unit: &ChapterUnit, credential_index: usize) -> ProgressState {
        let chapter_count = self
            .source
            .book(unit.book_index)
            .map(|b| b.chapters.len())
            .unwrap_or(0);

        let mut next = ProgressState {
            book: unit.book_index,
            chapter: unit.chapter_index + 1,
            credential_index,
        };
        if next.chapter >= chapter_count {
            next.chapter = 0;
            next.book += 1;
        }
        next
    }

    /// Chapters processed before `state`, and the total, for progress reporting.
    pub fn position(&self, state: &ProgressState) -> (usize, usize) {
        let total = self.source.total_chapters();
        let done_books: usize = self
            .source
            .books()
            .iter()
            .take(state.book)
            .map(|b| b.chapters.len())
            .sum();
        let in_book = self
            .source
            .book(state.book)
            .map(|b| state.chapter.min(b.chapters.len()))
            .unwrap_or(0);
        ((done_books + in_book).min(total), total)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/progress/tracker.rs"]
mod tests;
