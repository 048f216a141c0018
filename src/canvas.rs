//! Page content stream with a tracked graphics state
//!
//! Colours and line widths are only emitted when they differ from the
//! current state. `save_state`/`restore_state` mirror the PDF q/Q operators
//! so page hooks can paint without leaking state into the page body.

use pdf_writer::{Content, Name, Str};

use crate::types::{Color, Rect};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphicsState {
    pub fill: Color,
    pub stroke: Color,
    pub line_width: f64,
}

impl Default for GraphicsState {
    /// PDF initial state
    fn default() -> Self {
        Self {
            fill: Color::black(),
            stroke: Color::black(),
            line_width: 1.0,
        }
    }
}

/// How a closed path is painted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintMode {
    Fill,
    Stroke,
}

pub struct PdfCanvas {
    content: Content,
    state: GraphicsState,
    saved: Vec<GraphicsState>,
}

impl PdfCanvas {
    pub fn new() -> Self {
        Self {
            content: Content::new(),
            state: GraphicsState::default(),
            saved: Vec::new(),
        }
    }

    pub fn finish(self) -> Vec<u8> {
        self.content.finish()
    }

    pub fn state(&self) -> GraphicsState {
        self.state
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn save_state(&mut self) {
        self.saved.push(self.state);
        self.content.save_state();
    }

    /// Unbalanced restores are ignored
    pub fn restore_state(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
            self.content.restore_state();
        }
    }

    fn use_fill(&mut self, color: Color) {
        if self.state.fill != color {
            self.state.fill = color;
            self.content.set_fill_rgb(color.r as f32, color.g as f32, color.b as f32);
        }
    }

    fn use_stroke(&mut self, color: Color, width: f64) {
        if self.state.stroke != color {
            self.state.stroke = color;
            self.content.set_stroke_rgb(color.r as f32, color.g as f32, color.b as f32);
        }
        if self.state.line_width != width {
            self.state.line_width = width;
            self.content.set_line_width(width as f32);
        }
    }

    /// Fill with `color`, or stroke with `color` at `width` points
    pub fn rect(&mut self, rect: Rect, mode: PaintMode, color: Color, width: f64) {
        match mode {
            PaintMode::Fill => self.use_fill(color),
            PaintMode::Stroke => self.use_stroke(color, width),
        }
        self.content
            .rect(rect.x as f32, rect.y as f32, rect.width as f32, rect.height as f32);
        match mode {
            PaintMode::Fill => self.content.fill_nonzero(),
            PaintMode::Stroke => self.content.stroke(),
        };
    }

    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Color) {
        self.use_stroke(color, width);
        self.content.move_to(from.0 as f32, from.1 as f32);
        self.content.line_to(to.0 as f32, to.1 as f32);
        self.content.stroke();
    }

    /// One run of pre-encoded text, baseline starting at (x, y)
    pub fn text(&mut self, x: f64, y: f64, font: &str, size: f64, color: Color, encoded: &[u8]) {
        self.use_fill(color);
        self.content.begin_text();
        self.content.set_font(Name(font.as_bytes()), size as f32);
        self.content.next_line(x as f32, y as f32);
        self.content.show(Str(encoded));
        self.content.end_text();
    }

    /// Paint an image XObject into `rect`
    pub fn image(&mut self, name: &str, rect: Rect) {
        self.content.save_state();
        self.content.transform([
            rect.width as f32,
            0.0,
            0.0,
            rect.height as f32,
            rect.x as f32,
            rect.y as f32,
        ]);
        self.content.x_object(Name(name.as_bytes()));
        self.content.restore_state();
    }
}

impl Default for PdfCanvas {
    fn default() -> Self {
        Self::new()
    }
}
