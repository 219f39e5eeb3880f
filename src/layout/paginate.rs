use serde::Serialize;

use crate::foundation::core::{Canvas, SafeArea};
use crate::foundation::error::{VersecastError, VersecastResult};
use crate::layout::wrap::{TextMeasure, wrap};
use crate::source::scripture::ChapterUnit;

/// One screen of a chapter: what is shown and what is narrated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Slide {
    /// Chapter title, identical on every slide of a chapter.
    pub title: String,
    /// Verses with visible `(n)` numbering, joined by single spaces.
    pub display_text: String,
    /// Verses without numbering, joined by single spaces.
    pub read_text: String,
    /// First verse on this slide (1-based).
    pub first_verse: usize,
    /// Last verse on this slide (1-based, inclusive).
    pub last_verse: usize,
}

impl Slide {
    /// Text handed to the narrator. The title is spoken once, on the first slide only.
    pub fn narration_text(&self, slide_index: usize) -> String {
        if slide_index == 0 {
            format!("{}. {}", self.title, self.read_text)
        } else {
            self.read_text.clone()
        }
    }
}

/// Geometry of the text block every slide must fit into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlideLayout {
    /// Maximum line width.
    pub max_width: f32,
    /// Vertical budget available to body text.
    pub content_height: f32,
    /// Distance between consecutive baselines.
    pub line_height: f32,
}

impl SlideLayout {
    /// Derive the text block from the canvas, safe margins and title block.
    pub fn from_canvas(
        canvas: Canvas,
        safe: SafeArea,
        line_height: f32,
        title_font_size: f32,
        title_spacing: f32,
    ) -> VersecastResult<Self> {
        let max_width = canvas.width as f32 - safe.left as f32 - safe.right as f32;
        let content_height = canvas.height as f32
            - safe.top as f32
            - safe.bottom as f32
            - title_font_size
            - title_spacing;
        let layout = Self {
            max_width,
            content_height,
            line_height,
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Reject geometry that leaves no room for text.
    pub fn validate(&self) -> VersecastResult<()> {
        if !self.max_width.is_finite() || self.max_width <= 0.0 {
            return Err(VersecastError::validation(
                "layout max_width must be finite and > 0 (safe margins too wide?)",
            ));
        }
        if !self.content_height.is_finite() || self.content_height <= 0.0 {
            return Err(VersecastError::validation(
                "layout content_height must be finite and > 0 (safe margins or title too tall?)",
            ));
        }
        if !self.line_height.is_finite() || self.line_height <= 0.0 {
            return Err(VersecastError::validation(
                "layout line_height must be finite and > 0",
            ));
        }
        Ok(())
    }

    /// Whole lines that fit in the content budget.
    pub fn lines_per_slide(&self) -> usize {
        (self.content_height / self.line_height).floor() as usize
    }

    fn fits(&self, line_count: usize) -> bool {
        line_count as f32 * self.line_height <= self.content_height
    }
}

#[derive(Default)]
struct PendingSlide {
    display: Vec<String>,
    read: Vec<String>,
    first_verse: usize,
}

impl PendingSlide {
    fn start(first_verse: usize, display: String, read: &str) -> Self {
        Self {
            display: vec![display],
            read: vec![read.to_owned()],
            first_verse,
        }
    }

    fn finish(self, title: &str) -> Slide {
        Slide {
            title: title.to_owned(),
            last_verse: self.first_verse + self.display.len() - 1,
            display_text: self.display.join(" "),
            read_text: self.read.join(" "),
            first_verse: self.first_verse,
        }
    }
}

/// Split a chapter into slides whose wrapped body fits `layout`.
///
/// Verses are never split. A verse that overflows an empty slide on its own still gets that slide,
/// so every verse is placed and no slide is empty. Deterministic for a fixed measure.
pub fn paginate<M>(chapter: &ChapterUnit, layout: &SlideLayout, measure: &mut M) -> Vec<Slide>
where
    M: TextMeasure + ?Sized,
{
    let title = chapter.title();
    let mut slides = Vec::new();
    let mut pending = PendingSlide::default();

    for (i, verse) in chapter.verses.iter().enumerate() {
        let verse_number = i + 1;
        let display = format!("({verse_number}) {verse}");

        if pending.display.is_empty() {
            pending = PendingSlide::start(verse_number, display, verse);
            continue;
        }

        let tentative = format!("{} {display}", pending.display.join(" "));
        let lines = wrap(&tentative, layout.max_width, measure);
        if layout.fits(lines.len()) {
            pending.display.push(display);
            pending.read.push(verse.clone());
        } else {
            let full = std::mem::replace(
                &mut pending,
                PendingSlide::start(verse_number, display, verse),
            );
            slides.push(full.finish(&title));
        }
    }

    if !pending.display.is_empty() {
        slides.push(pending.finish(&title));
    }
    slides
}

#[cfg(test)]
#[path = "../../tests/unit/layout/paginate.rs"]
mod tests;
