//! Paragraph flowable: styled inline runs wrapped into lines
//!
//! Text is broken on whitespace with a greedy line breaker measured against
//! the registered faces. Runs that touch without whitespace (e.g. a label
//! followed by a bold name) are kept together as one unbreakable word.

use crate::error::ReportResult;
use crate::font_registry::FontLibrary;
use crate::renderer::Surface;
use crate::styles::ParagraphStyle;
use crate::types::{Alignment, Color, FontWeight, Size};

/// An inline run of a paragraph
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text {
        text: String,
        weight: Option<FontWeight>,
        color: Option<Color>,
    },
    Break,
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text { text: text.into(), weight: None, color: None }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Inline::Text { text: text.into(), weight: Some(FontWeight::Bold), color: None }
    }

    pub fn colored(text: impl Into<String>, color: Color) -> Self {
        Inline::Text { text: text.into(), weight: None, color: Some(color) }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Fragment {
    text: String,
    weight: FontWeight,
    color: Color,
    width: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct Word {
    fragments: Vec<Fragment>,
    width: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct Line {
    words: Vec<Word>,
    width: f64,
    forced_break: bool,
}

enum Token {
    Word(Word),
    Break,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    inlines: Vec<Inline>,
    style: ParagraphStyle,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, style: ParagraphStyle) -> Self {
        Self::from_inlines(vec![Inline::text(text)], style)
    }

    pub fn from_inlines(inlines: Vec<Inline>, style: ParagraphStyle) -> Self {
        Self { inlines, style }
    }

    pub fn style(&self) -> &ParagraphStyle {
        &self.style
    }

    /// Plain text with line breaks as '\n'
    pub fn text(&self) -> String {
        self.inlines
            .iter()
            .map(|inline| match inline {
                Inline::Text { text, .. } => text.as_str(),
                Inline::Break => "\n",
            })
            .collect()
    }

    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
    }

    fn tokenize(&self, fonts: &FontLibrary) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut current: Vec<Fragment> = Vec::new();

        fn flush(current: &mut Vec<Fragment>, tokens: &mut Vec<Token>) {
            if current.is_empty() {
                return;
            }
            let fragments = std::mem::take(current);
            let width = fragments.iter().map(|f| f.width).sum();
            tokens.push(Token::Word(Word { fragments, width }));
        }

        for inline in &self.inlines {
            match inline {
                Inline::Break => {
                    flush(&mut current, &mut tokens);
                    tokens.push(Token::Break);
                }
                Inline::Text { text, weight, color } => {
                    let weight = weight.unwrap_or(self.style.weight);
                    let color = color.unwrap_or(self.style.text_color);
                    let mut piece = String::new();
                    let push_piece = |piece: &mut String, current: &mut Vec<Fragment>| {
                        if piece.is_empty() {
                            return;
                        }
                        let text = std::mem::take(piece);
                        let width = fonts.text_width(weight, &text, self.style.font_size);
                        current.push(Fragment { text, weight, color, width });
                    };
                    for ch in text.chars() {
                        if ch == '\n' {
                            push_piece(&mut piece, &mut current);
                            flush(&mut current, &mut tokens);
                            tokens.push(Token::Break);
                        } else if ch.is_whitespace() {
                            push_piece(&mut piece, &mut current);
                            flush(&mut current, &mut tokens);
                        } else {
                            piece.push(ch);
                        }
                    }
                    push_piece(&mut piece, &mut current);
                }
            }
        }
        flush(&mut current, &mut tokens);
        tokens
    }

    fn space_width(&self, fonts: &FontLibrary) -> f64 {
        fonts.text_width(self.style.weight, " ", self.style.font_size)
    }

    fn layout(&self, avail_width: f64, fonts: &FontLibrary) -> Vec<Line> {
        let space = self.space_width(fonts);
        let mut lines = Vec::new();
        let mut words: Vec<Word> = Vec::new();
        let mut width = 0.0;

        for token in self.tokenize(fonts) {
            match token {
                Token::Break => {
                    lines.push(Line {
                        words: std::mem::take(&mut words),
                        width,
                        forced_break: true,
                    });
                    width = 0.0;
                }
                Token::Word(word) => {
                    let needed = if words.is_empty() {
                        word.width
                    } else {
                        width + space + word.width
                    };
                    if needed <= avail_width || words.is_empty() {
                        width = needed;
                        words.push(word);
                    } else {
                        lines.push(Line {
                            words: std::mem::take(&mut words),
                            width,
                            forced_break: false,
                        });
                        width = word.width;
                        words.push(word);
                    }
                }
            }
        }
        if !words.is_empty() || lines.is_empty() {
            lines.push(Line { words, width, forced_break: false });
        }
        lines
    }

    /// Number of lines at the given width
    pub fn line_count(&self, avail_width: f64, fonts: &FontLibrary) -> usize {
        self.layout(avail_width, fonts).len()
    }

    /// Paragraphs take the full available width
    pub fn wrap(&self, avail_width: f64, fonts: &FontLibrary) -> Size {
        let lines = self.layout(avail_width, fonts);
        Size::new(avail_width, lines.len() as f64 * self.style.leading)
    }

    /// Split into the lines that fit `avail_height` and the remainder
    pub fn split(
        &self,
        avail_width: f64,
        avail_height: f64,
        fonts: &FontLibrary,
    ) -> Option<(Paragraph, Paragraph)> {
        let lines = self.layout(avail_width, fonts);
        let fit = (avail_height / self.style.leading).floor() as usize;
        if fit == 0 || fit >= lines.len() {
            return None;
        }
        let (head, tail) = lines.split_at(fit);
        Some((
            Self::from_lines(head, self.style),
            Self::from_lines(tail, self.style),
        ))
    }

    fn from_lines(lines: &[Line], style: ParagraphStyle) -> Self {
        let mut inlines = Vec::new();
        for (index, line) in lines.iter().enumerate() {
            for (word_index, word) in line.words.iter().enumerate() {
                if word_index > 0 {
                    inlines.push(Inline::text(" "));
                }
                for fragment in &word.fragments {
                    inlines.push(Inline::Text {
                        text: fragment.text.clone(),
                        weight: Some(fragment.weight),
                        color: Some(fragment.color),
                    });
                }
            }
            if index + 1 < lines.len() {
                if line.forced_break {
                    inlines.push(Inline::Break);
                } else {
                    inlines.push(Inline::text(" "));
                }
            }
        }
        Self { inlines, style }
    }

    /// Draw with the top-left corner of the text box at (x, top)
    pub fn draw(&self, surface: &mut Surface<'_>, x: f64, top: f64, width: f64) -> ReportResult<()> {
        let lines = self.layout(width, surface.fonts.library());
        let space = self.space_width(surface.fonts.library());
        let size = self.style.font_size;
        let last = lines.len().saturating_sub(1);

        for (index, line) in lines.iter().enumerate() {
            let baseline = top - size - index as f64 * self.style.leading;
            let extra = width - line.width;
            let (mut cursor, gap) = match self.style.alignment {
                Alignment::Left => (x, space),
                Alignment::Center => (x + extra / 2.0, space),
                Alignment::Right => (x + extra, space),
                Alignment::Justify if index < last && !line.forced_break && line.words.len() > 1 => {
                    (x, space + extra / (line.words.len() - 1) as f64)
                }
                Alignment::Justify => (x, space),
            };
            for word in &line.words {
                let mut fragment_x = cursor;
                for fragment in &word.fragments {
                    surface.draw_text(
                        fragment_x,
                        baseline,
                        fragment.weight,
                        size,
                        fragment.color,
                        &fragment.text,
                    );
                    fragment_x += fragment.width;
                }
                cursor += word.width + gap;
            }
        }
        Ok(())
    }
}
