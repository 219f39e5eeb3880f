use std::{borrow::Cow, path::Path};

use crate::foundation::core::Rgba8;
use crate::foundation::error::{VersecastError, VersecastResult};
use crate::layout::wrap::TextMeasure;

/// RGBA8 brush colour carried through Parley layouts to the rasterizer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// A font registered with a [`TextLayoutEngine`], plus the bytes the rasterizer needs.
#[derive(Clone)]
pub struct FontFace {
    family: String,
    font: vello_cpu::peniko::FontData,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .finish()
    }
}

impl FontFace {
    /// Resolved family name.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Font data handle used for glyph rendering.
    pub fn font_data(&self) -> &vello_cpu::peniko::FontData {
        &self.font
    }
}

/// Stateful helper for shaping single-line text with Parley.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    /// Construct a new layout engine with fresh Parley contexts.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Register a font from raw TTF/OTF bytes.
    pub fn register_font(&mut self, font_bytes: Vec<u8>) -> VersecastResult<FontFace> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            VersecastError::validation("no font families registered from font bytes")
        })?;

        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| VersecastError::validation("registered font family has no name"))?
            .to_string();

        let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
        Ok(FontFace { family, font })
    }

    /// Read and register a font file.
    pub fn load_font(&mut self, path: &Path) -> VersecastResult<FontFace> {
        let bytes = std::fs::read(path).map_err(|e| {
            VersecastError::validation(format!("failed to read font '{}': {e}", path.display()))
        })?;
        self.register_font(bytes)
    }

    /// Shape `text` as one unbroken line.
    pub fn layout_line(
        &mut self,
        text: &str,
        face: &FontFace,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> parley::Layout<TextBrushRgba8> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(face.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

/// [`TextMeasure`] backed by Parley shaping of a single font at a fixed size.
pub struct FontMeasure<'e> {
    engine: &'e mut TextLayoutEngine,
    face: &'e FontFace,
    size_px: f32,
}

impl<'e> FontMeasure<'e> {
    /// Measure with `face` at `size_px`.
    pub fn new(engine: &'e mut TextLayoutEngine, face: &'e FontFace, size_px: f32) -> Self {
        Self {
            engine,
            face,
            size_px,
        }
    }
}

impl TextMeasure for FontMeasure<'_> {
    fn measure(&mut self, text: &str) -> f32 {
        self.engine
            .layout_line(text, self.face, self.size_px, TextBrushRgba8::default())
            .width()
    }
}
