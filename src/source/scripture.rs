use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{VersecastError, VersecastResult};

/// One book: a name and its chapters, each an ordered list of verse strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Display name, used in slide titles and artifact names.
    pub name: String,
    /// Optional short code carried by some source files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbrev: Option<String>,
    /// Chapters in order; each chapter is its verses in order.
    pub chapters: Vec<Vec<String>>,
}

/// The complete read-only source text: books in reading order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scripture {
    books: Vec<Book>,
}

/// The indivisible unit of work for one run: a single chapter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChapterUnit {
    /// Index of the owning book (0-based).
    pub book_index: usize,
    /// Index of the chapter within its book (0-based).
    pub chapter_index: usize,
    /// Name of the owning book.
    pub book_name: String,
    /// Human chapter number (1-based).
    pub chapter_number: usize,
    /// Verses in order.
    pub verses: Vec<String>,
}

impl ChapterUnit {
    /// Title shown on every slide of the chapter.
    pub fn title(&self) -> String {
        format!("{} {}", self.book_name, self.chapter_number)
    }
}

impl Scripture {
    /// Build from already-parsed books.
    pub fn new(books: Vec<Book>) -> Self {
        Self { books }
    }

    /// Parse the JSON array of books. A leading UTF-8 byte order mark is ignored.
    pub fn from_json_str(raw: &str) -> VersecastResult<Self> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        let books: Vec<Book> = serde_json::from_str(raw)
            .map_err(|e| VersecastError::source_load(format!("parse source JSON: {e}")))?;
        Ok(Self { books })
    }

    /// Read and parse the source text from disk.
    pub fn from_path(path: impl AsRef<Path>) -> VersecastResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            VersecastError::source_load(format!("read source '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// All books in order.
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// Book at `index`, if any.
    pub fn book(&self, index: usize) -> Option<&Book> {
        self.books.get(index)
    }

    /// Number of books.
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// `true` when the source holds no books.
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Total chapter count across every book.
    pub fn total_chapters(&self) -> usize {
        self.books.iter().map(|b| b.chapters.len()).sum()
    }

    /// Build the unit for an exact, valid `(book, chapter)` position.
    pub fn chapter(&self, book_index: usize, chapter_index: usize) -> Option<ChapterUnit> {
        let book = self.books.get(book_index)?;
        let verses = book.chapters.get(chapter_index)?;
        Some(ChapterUnit {
            book_index,
            chapter_index,
            book_name: book.name.clone(),
            chapter_number: chapter_index + 1,
            verses: verses.clone(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/scripture.rs"]
mod tests;
