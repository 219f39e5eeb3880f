use std::path::Path;

use crate::foundation::core::{Canvas, Rgba8, SafeArea};
use crate::foundation::error::{VersecastError, VersecastResult};
use crate::layout::measure::{FontFace, FontMeasure, TextBrushRgba8, TextLayoutEngine};
use crate::layout::paginate::{Slide, SlideLayout};
use crate::layout::wrap::{TextMeasure, wrap};

/// Rendering capability for slides.
///
/// A renderer is also the measure used to paginate, so slide boundaries are computed with the same
/// font metrics the body text is drawn with.
pub trait SlideRenderer: TextMeasure {
    /// Text block geometry used for both pagination and drawing.
    fn layout(&self) -> SlideLayout;

    /// Draw `slide` and write it as an image to `out_path`.
    fn render(&mut self, slide: &Slide, out_path: &Path) -> VersecastResult<()>;
}

/// Visual parameters of a slide.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlideStyle {
    /// Output canvas.
    pub canvas: Canvas,
    /// Margins kept free of content.
    pub safe: SafeArea,
    /// Body font size in pixels.
    pub font_size: f32,
    /// Distance between body lines in pixels.
    pub line_height: f32,
    /// Title font size in pixels.
    pub title_font_size: f32,
    /// Gap between the title block and the body.
    pub title_spacing: f32,
    /// Background fill.
    pub background: Rgba8,
    /// Body text colour.
    pub text_color: Rgba8,
    /// Title colour.
    pub title_color: Rgba8,
}

impl Default for SlideStyle {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            safe: SafeArea::default(),
            font_size: 52.0,
            line_height: 72.0,
            title_font_size: 64.0,
            title_spacing: 80.0,
            background: Rgba8::opaque(0, 0, 0),
            text_color: Rgba8::opaque(255, 255, 255),
            title_color: Rgba8::opaque(255, 215, 0),
        }
    }
}

impl SlideStyle {
    /// Text block geometry implied by this style.
    pub fn layout(&self) -> VersecastResult<SlideLayout> {
        SlideLayout::from_canvas(
            self.canvas,
            self.safe,
            self.line_height,
            self.title_font_size,
            self.title_spacing,
        )
    }

    /// Reject sizes the rasterizer cannot work with.
    pub fn validate(&self) -> VersecastResult<()> {
        self.canvas.validate()?;
        for (name, v) in [
            ("font_size", self.font_size),
            ("title_font_size", self.title_font_size),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(VersecastError::validation(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        if !self.title_spacing.is_finite() || self.title_spacing < 0.0 {
            return Err(VersecastError::validation(
                "title_spacing must be finite and >= 0",
            ));
        }
        self.layout().map(|_| ())
    }
}

/// CPU slide renderer: Parley shaping, `vello_cpu` rasterization, PNG output.
pub struct RasterSlideRenderer {
    engine: TextLayoutEngine,
    body_face: FontFace,
    title_face: FontFace,
    style: SlideStyle,
    layout: SlideLayout,
}

impl RasterSlideRenderer {
    /// Build a renderer from body and title font files.
    pub fn from_font_files(
        style: SlideStyle,
        body_font: &Path,
        title_font: &Path,
    ) -> VersecastResult<Self> {
        let mut engine = TextLayoutEngine::new();
        let body_face = engine.load_font(body_font)?;
        let title_face = engine.load_font(title_font)?;
        Self::new(engine, body_face, title_face, style)
    }

    /// Build a renderer from already registered faces.
    pub fn new(
        engine: TextLayoutEngine,
        body_face: FontFace,
        title_face: FontFace,
        style: SlideStyle,
    ) -> VersecastResult<Self> {
        style.validate()?;
        let layout = style.layout()?;
        tracing::debug!(
            body = body_face.family(),
            title = title_face.family(),
            "slide fonts resolved"
        );
        Ok(Self {
            engine,
            body_face,
            title_face,
            style,
            layout,
        })
    }

    /// Rasterize `slide` to premultiplied RGBA8 pixels (row-major, `width * height * 4` bytes).
    pub fn rasterize(&mut self, slide: &Slide) -> VersecastResult<Vec<u8>> {
        let (w, h) = self.pixel_size()?;
        let mut ctx = vello_cpu::RenderContext::new(w, h);

        let bg = self.style.background;
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, f64::from(w), f64::from(h)));

        let left = f64::from(self.style.safe.left);
        let top = f64::from(self.style.safe.top);

        let title = self.engine.layout_line(
            &slide.title,
            &self.title_face,
            self.style.title_font_size,
            self.style.title_color.into(),
        );
        draw_layout(&mut ctx, &title, self.title_face.font_data(), left, top);

        let lines = {
            let mut measure =
                FontMeasure::new(&mut self.engine, &self.body_face, self.style.font_size);
            wrap(&slide.display_text, self.layout.max_width, &mut measure)
        };

        let body_top =
            top + f64::from(self.style.title_font_size) + f64::from(self.style.title_spacing);
        for (i, line) in lines.iter().enumerate() {
            let shaped = self.engine.layout_line(
                line,
                &self.body_face,
                self.style.font_size,
                self.style.text_color.into(),
            );
            let y = body_top + i as f64 * f64::from(self.style.line_height);
            draw_layout(&mut ctx, &shaped, self.body_face.font_data(), left, y);
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        Ok(pixmap.data_as_u8_slice().to_vec())
    }

    fn pixel_size(&self) -> VersecastResult<(u16, u16)> {
        let w = u16::try_from(self.style.canvas.width)
            .map_err(|_| VersecastError::validation("canvas width must fit in 16 bits"))?;
        let h = u16::try_from(self.style.canvas.height)
            .map_err(|_| VersecastError::validation("canvas height must fit in 16 bits"))?;
        Ok((w, h))
    }
}

impl TextMeasure for RasterSlideRenderer {
    fn measure(&mut self, text: &str) -> f32 {
        FontMeasure::new(&mut self.engine, &self.body_face, self.style.font_size).measure(text)
    }
}

impl SlideRenderer for RasterSlideRenderer {
    fn layout(&self) -> SlideLayout {
        self.layout
    }

    #[tracing::instrument(skip(self, slide), fields(first_verse = slide.first_verse, last_verse = slide.last_verse))]
    fn render(&mut self, slide: &Slide, out_path: &Path) -> VersecastResult<()> {
        let pixels = self.rasterize(slide)?;
        crate::media::ffmpeg::ensure_parent_dir(out_path)?;

        // The background is opaque, so premultiplied and straight alpha coincide.
        image::save_buffer_with_format(
            out_path,
            &pixels,
            self.style.canvas.width,
            self.style.canvas.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .map_err(|e| {
            VersecastError::media(format!("write png '{}': {e}", out_path.display()))
        })?;
        Ok(())
    }
}

fn draw_layout(
    ctx: &mut vello_cpu::RenderContext,
    layout: &parley::Layout<TextBrushRgba8>,
    font: &vello_cpu::peniko::FontData,
    x: f64,
    y: f64,
) {
    ctx.set_transform(vello_cpu::kurbo::Affine::translate((x, y)));
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));
            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
}

#[cfg(test)]
#[path = "../../tests/unit/render/slide.rs"]
mod tests;
