/// Width measurement capability used by line wrapping.
///
/// Widths are in the same unit as the `max_width` handed to [`wrap`] (pixels for the raster
/// renderer). Any `FnMut(&str) -> f32` closure is a measure, which keeps layout testable without
/// loading fonts.
pub trait TextMeasure {
    /// Advance width of `text` laid out on a single line.
    fn measure(&mut self, text: &str) -> f32;
}

impl<F> TextMeasure for F
where
    F: FnMut(&str) -> f32,
{
    fn measure(&mut self, text: &str) -> f32 {
        self(text)
    }
}

/// Greedy word wrap.
///
/// Words accumulate on the current line while the measured width of the line plus the next word
/// stays within `max_width`; otherwise the line is closed and the word starts a new one. A word
/// wider than `max_width` sits alone on its own line. Lines are never empty; whitespace-only input
/// produces no lines.
pub fn wrap<M>(text: &str, max_width: f32, measure: &mut M) -> Vec<String>
where
    M: TextMeasure + ?Sized,
{
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{current} {word}");
        if measure.measure(&candidate) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_owned()));
        } else {
            current = candidate;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
#[path = "../../tests/unit/layout/wrap.rs"]
mod tests;
