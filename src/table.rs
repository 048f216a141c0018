//! Grid tables with spans, backgrounds and rules
//!
//! Cells are addressed as (column, row); negative indices count from the
//! end the way style commands are usually written (`(-1, -1)` is the last
//! cell). Rows have either a fixed height or one measured from the cell
//! contents. Tables split between rows, never inside a spanned region.

use crate::error::{ReportError, ReportResult};
use crate::flowable::ImageBox;
use crate::font_registry::FontLibrary;
use crate::paragraph::Paragraph;
use crate::renderer::Surface;
use crate::types::{Alignment, Color, FontWeight, Rect, Size, VAlign};

pub const CELL_PADDING_X: f64 = 6.0;
pub const CELL_PADDING_Y: f64 = 3.0;
const CELL_FONT_SIZE: f64 = 10.0;
const CELL_LEADING: f64 = 12.0;

/// Content of a single cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Paragraph(Paragraph),
    Image(ImageBox),
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        if text.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(text.to_string())
        }
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Cell::from(text.as_str())
    }
}

impl From<Paragraph> for Cell {
    fn from(paragraph: Paragraph) -> Self {
        Cell::Paragraph(paragraph)
    }
}

impl From<ImageBox> for Cell {
    fn from(image: ImageBox) -> Self {
        Cell::Image(image)
    }
}

/// (column, row), negative values count from the end
pub type CellRef = (i32, i32);

/// Style command applied to an inclusive cell range
#[derive(Debug, Clone, PartialEq)]
pub enum TableCommand {
    Span(CellRef, CellRef),
    Background(CellRef, CellRef, Color),
    Grid(CellRef, CellRef, f64, Color),
    Box(CellRef, CellRef, f64, Color),
    Align(CellRef, CellRef, Alignment),
    Valign(CellRef, CellRef, VAlign),
    FontName(CellRef, CellRef, FontWeight),
}

impl TableCommand {
    fn range(&self) -> (CellRef, CellRef) {
        match *self {
            TableCommand::Span(a, b)
            | TableCommand::Background(a, b, _)
            | TableCommand::Grid(a, b, _, _)
            | TableCommand::Box(a, b, _, _)
            | TableCommand::Align(a, b, _)
            | TableCommand::Valign(a, b, _)
            | TableCommand::FontName(a, b, _) => (a, b),
        }
    }

    fn with_range(&self, a: CellRef, b: CellRef) -> Self {
        match *self {
            TableCommand::Span(..) => TableCommand::Span(a, b),
            TableCommand::Background(_, _, color) => TableCommand::Background(a, b, color),
            TableCommand::Grid(_, _, width, color) => TableCommand::Grid(a, b, width, color),
            TableCommand::Box(_, _, width, color) => TableCommand::Box(a, b, width, color),
            TableCommand::Align(_, _, align) => TableCommand::Align(a, b, align),
            TableCommand::Valign(_, _, valign) => TableCommand::Valign(a, b, valign),
            TableCommand::FontName(_, _, weight) => TableCommand::FontName(a, b, weight),
        }
    }
}

/// Normalized inclusive range in absolute indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub col0: usize,
    pub row0: usize,
    pub col1: usize,
    pub row1: usize,
}

impl CellRange {
    pub fn contains(&self, col: usize, row: usize) -> bool {
        (self.col0..=self.col1).contains(&col) && (self.row0..=self.row1).contains(&row)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    Single,
    Origin(CellRange),
    Covered,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    rows: Vec<Vec<Cell>>,
    col_widths: Vec<f64>,
    row_heights: Vec<Option<f64>>,
    commands: Vec<TableCommand>,
}

impl Table {
    /// Rows shorter than the column count are padded with empty cells
    pub fn new(mut rows: Vec<Vec<Cell>>, col_widths: Vec<f64>) -> Self {
        let cols = col_widths.len();
        for row in &mut rows {
            row.resize(cols, Cell::Empty);
        }
        let row_heights = vec![None; rows.len()];
        Self {
            rows,
            col_widths,
            row_heights,
            commands: Vec::new(),
        }
    }

    pub fn with_row_heights(mut self, heights: Vec<f64>) -> Self {
        for (slot, height) in self.row_heights.iter_mut().zip(heights) {
            *slot = Some(height);
        }
        self
    }

    pub fn with_style(mut self, commands: Vec<TableCommand>) -> Self {
        self.commands.extend(commands);
        self
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn cols(&self) -> usize {
        self.col_widths.len()
    }

    pub fn col_widths(&self) -> &[f64] {
        &self.col_widths
    }

    pub fn commands(&self) -> &[TableCommand] {
        &self.commands
    }

    pub fn width(&self) -> f64 {
        self.col_widths.iter().sum()
    }

    /// Cell at (col, row), negative indices allowed
    pub fn cell(&self, col: i32, row: i32) -> Option<&Cell> {
        let col = resolve(col, self.cols())?;
        let row = resolve(row, self.rows())?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    fn normalize(&self, (a, b): (CellRef, CellRef)) -> Option<CellRange> {
        let c0 = resolve(a.0, self.cols())?;
        let r0 = resolve(a.1, self.rows())?;
        let c1 = resolve(b.0, self.cols())?;
        let r1 = resolve(b.1, self.rows())?;
        Some(CellRange {
            col0: c0.min(c1),
            row0: r0.min(r1),
            col1: c0.max(c1),
            row1: r0.max(r1),
        })
    }

    /// Normalized span regions in command order
    pub fn spans(&self) -> Vec<CellRange> {
        self.commands
            .iter()
            .filter(|cmd| matches!(cmd, TableCommand::Span(..)))
            .filter_map(|cmd| self.normalize(cmd.range()))
            .filter(|range| range.col0 != range.col1 || range.row0 != range.row1)
            .collect()
    }

    fn slots(&self) -> Vec<Vec<Slot>> {
        let mut slots = vec![vec![Slot::Single; self.cols()]; self.rows()];
        for span in self.spans() {
            if slots[span.row0][span.col0] == Slot::Covered {
                continue;
            }
            for row in span.row0..=span.row1 {
                for col in span.col0..=span.col1 {
                    slots[row][col] = Slot::Covered;
                }
            }
            slots[span.row0][span.col0] = Slot::Origin(span);
        }
        slots
    }

    /// Last matching background command wins
    pub fn background_at(&self, col: usize, row: usize) -> Option<Color> {
        self.last_matching(col, row, |cmd| match cmd {
            TableCommand::Background(_, _, color) => Some(*color),
            _ => None,
        })
    }

    fn align_at(&self, col: usize, row: usize) -> Alignment {
        self.last_matching(col, row, |cmd| match cmd {
            TableCommand::Align(_, _, align) => Some(*align),
            _ => None,
        })
        .unwrap_or(Alignment::Left)
    }

    fn valign_at(&self, col: usize, row: usize) -> VAlign {
        self.last_matching(col, row, |cmd| match cmd {
            TableCommand::Valign(_, _, valign) => Some(*valign),
            _ => None,
        })
        .unwrap_or(VAlign::Bottom)
    }

    pub fn font_at(&self, col: usize, row: usize) -> FontWeight {
        self.last_matching(col, row, |cmd| match cmd {
            TableCommand::FontName(_, _, weight) => Some(*weight),
            _ => None,
        })
        .unwrap_or(FontWeight::Regular)
    }

    fn last_matching<T>(
        &self,
        col: usize,
        row: usize,
        pick: impl Fn(&TableCommand) -> Option<T>,
    ) -> Option<T> {
        self.commands
            .iter()
            .filter(|cmd| {
                self.normalize(cmd.range())
                    .is_some_and(|range| range.contains(col, row))
            })
            .filter_map(pick)
            .last()
    }

    fn span_width(&self, range: &CellRange) -> f64 {
        self.col_widths[range.col0..=range.col1].iter().sum()
    }

    fn content_height(&self, cell: &Cell, width: f64, fonts: &FontLibrary) -> f64 {
        match cell {
            Cell::Empty => 0.0,
            Cell::Text(text) => text.lines().count().max(1) as f64 * CELL_LEADING,
            Cell::Paragraph(para) => para.wrap(width - 2.0 * CELL_PADDING_X, fonts).height,
            Cell::Image(image) => image.height,
        }
    }

    /// Resolved height of every row
    pub fn row_heights(&self, fonts: &FontLibrary) -> Vec<f64> {
        let slots = self.slots();
        (0..self.rows())
            .map(|row| match self.row_heights[row] {
                Some(height) => height,
                None => {
                    let content = (0..self.cols())
                        .filter_map(|col| {
                            let width = match slots[row][col] {
                                Slot::Single => self.col_widths[col],
                                Slot::Origin(range) if range.row0 == range.row1 => {
                                    self.span_width(&range)
                                }
                                _ => return None,
                            };
                            Some(self.content_height(&self.rows[row][col], width, fonts))
                        })
                        .fold(0.0, f64::max);
                    content + 2.0 * CELL_PADDING_Y
                }
            })
            .collect()
    }

    pub fn wrap(&self, fonts: &FontLibrary) -> Size {
        Size::new(self.width(), self.row_heights(fonts).iter().sum())
    }

    /// Row indices where the table may be split (no span crosses them)
    fn split_points(&self) -> Vec<usize> {
        let spans = self.spans();
        (1..self.rows())
            .filter(|&k| !spans.iter().any(|s| s.row0 < k && k <= s.row1))
            .collect()
    }

    /// Split into the rows that fit `avail_height` and the remainder
    pub fn split(&self, avail_height: f64, fonts: &FontLibrary) -> Option<(Table, Table)> {
        let heights = self.row_heights(fonts);
        let mut best = None;
        for k in self.split_points() {
            let used: f64 = heights[..k].iter().sum();
            if used <= avail_height {
                best = Some(k);
            } else {
                break;
            }
        }
        let k = best?;
        Some((self.slice(0, k), self.slice(k, self.rows())))
    }

    fn slice(&self, start: usize, end: usize) -> Table {
        let commands = self
            .commands
            .iter()
            .filter_map(|cmd| {
                let range = self.normalize(cmd.range())?;
                if range.row1 < start || range.row0 >= end {
                    return None;
                }
                let row0 = range.row0.max(start) - start;
                let row1 = range.row1.min(end - 1) - start;
                Some(cmd.with_range(
                    (range.col0 as i32, row0 as i32),
                    (range.col1 as i32, row1 as i32),
                ))
            })
            .collect();
        Table {
            rows: self.rows[start..end].to_vec(),
            col_widths: self.col_widths.clone(),
            row_heights: self.row_heights[start..end].to_vec(),
            commands,
        }
    }

    /// Draw with the bottom-left corner at (x, y)
    pub fn draw(&self, surface: &mut Surface<'_>, x: f64, y: f64) -> ReportResult<()> {
        if self.cols() == 0 {
            return Err(ReportError::Layout("table without columns".to_string()));
        }
        let heights = self.row_heights(surface.fonts.library());
        let total: f64 = heights.iter().sum();
        let top = y + total;

        let mut col_x = vec![x];
        for width in &self.col_widths {
            col_x.push(col_x[col_x.len() - 1] + width);
        }
        let mut row_y = vec![top];
        for height in &heights {
            row_y.push(row_y[row_y.len() - 1] - height);
        }
        let region = |range: &CellRange| {
            Rect::new(
                col_x[range.col0],
                row_y[range.row1 + 1],
                col_x[range.col1 + 1] - col_x[range.col0],
                row_y[range.row0] - row_y[range.row1 + 1],
            )
        };

        surface.canvas.save_state();

        for cmd in &self.commands {
            if let TableCommand::Background(_, _, color) = cmd {
                if let Some(range) = self.normalize(cmd.range()) {
                    surface.fill_rect(region(&range), *color);
                }
            }
        }

        let slots = self.slots();
        for (row, cells) in self.rows.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                let range = match slots[row][col] {
                    Slot::Covered => continue,
                    Slot::Single => CellRange { col0: col, row0: row, col1: col, row1: row },
                    Slot::Origin(range) => range,
                };
                self.draw_cell(surface, cell, col, row, region(&range))?;
            }
        }

        for cmd in &self.commands {
            let Some(range) = self.normalize(cmd.range()) else {
                continue;
            };
            match cmd {
                TableCommand::Grid(_, _, width, color) => {
                    for row in range.row0..=range.row1 {
                        for col in range.col0..=range.col1 {
                            let cell_range = match slots[row][col] {
                                Slot::Covered => continue,
                                Slot::Single => {
                                    CellRange { col0: col, row0: row, col1: col, row1: row }
                                }
                                Slot::Origin(span) => span,
                            };
                            surface.stroke_rect(region(&cell_range), *width, *color);
                        }
                    }
                }
                TableCommand::Box(_, _, width, color) => {
                    surface.stroke_rect(region(&range), *width, *color);
                }
                _ => {}
            }
        }

        surface.canvas.restore_state();
        Ok(())
    }

    fn draw_cell(
        &self,
        surface: &mut Surface<'_>,
        cell: &Cell,
        col: usize,
        row: usize,
        rect: Rect,
    ) -> ReportResult<()> {
        let inner_width = rect.width - 2.0 * CELL_PADDING_X;
        let content = self.content_height(cell, rect.width, surface.fonts.library());
        let bottom = match self.valign_at(col, row) {
            VAlign::Top => rect.top() - CELL_PADDING_Y - content,
            VAlign::Middle => rect.y + (rect.height - content) / 2.0,
            VAlign::Bottom => rect.y + CELL_PADDING_Y,
        };
        let align = self.align_at(col, row);

        match cell {
            Cell::Empty => {}
            Cell::Text(text) => {
                let weight = self.font_at(col, row);
                for (index, line) in text.lines().enumerate() {
                    let width = surface.fonts.text_width(weight, line, CELL_FONT_SIZE);
                    let line_x = match align {
                        Alignment::Center => rect.x + (rect.width - width) / 2.0,
                        Alignment::Right => rect.right() - CELL_PADDING_X - width,
                        Alignment::Left | Alignment::Justify => rect.x + CELL_PADDING_X,
                    };
                    let baseline = bottom + content - CELL_FONT_SIZE - index as f64 * CELL_LEADING;
                    surface.draw_text(line_x, baseline, weight, CELL_FONT_SIZE, Color::black(), line);
                }
            }
            Cell::Paragraph(para) => {
                para.draw(surface, rect.x + CELL_PADDING_X, bottom + content, inner_width)?;
            }
            Cell::Image(image) => {
                let image_x = match align {
                    Alignment::Center => rect.x + (rect.width - image.width) / 2.0,
                    Alignment::Right => rect.right() - CELL_PADDING_X - image.width,
                    Alignment::Left | Alignment::Justify => rect.x + CELL_PADDING_X,
                };
                surface.draw_image(
                    &image.path,
                    Rect::new(image_x, bottom, image.width, image.height),
                )?;
            }
        }
        Ok(())
    }
}

fn resolve(index: i32, len: usize) -> Option<usize> {
    let len = len as i32;
    let index = if index < 0 { len + index } else { index };
    (0..len).contains(&index).then_some(index as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::cm;

    fn fonts() -> FontLibrary {
        FontLibrary::builtin()
    }

    fn grid(rows: usize, cols: usize) -> Table {
        let data = (0..rows)
            .map(|r| (0..cols).map(|c| Cell::from(format!("{r}.{c}"))).collect())
            .collect();
        Table::new(data, vec![cm(2.0); cols])
    }

    #[test]
    fn test_negative_indices() {
        let table = grid(3, 2);
        assert_eq!(table.cell(-1, -1), Some(&Cell::Text("2.1".to_string())));
        assert_eq!(table.cell(0, -3), Some(&Cell::Text("0.0".to_string())));
        assert!(table.cell(2, 0).is_none());
        assert!(table.cell(0, -4).is_none());
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = Table::new(vec![vec![Cell::from("a")]], vec![10.0, 10.0]);
        assert_eq!(table.cell(1, 0), Some(&Cell::Empty));
    }

    #[test]
    fn test_fixed_and_auto_heights() {
        let table = grid(2, 2).with_row_heights(vec![cm(1.0)]);
        let heights = table.row_heights(&fonts());
        assert_eq!(heights[0], cm(1.0));
        assert_eq!(heights[1], CELL_LEADING + 2.0 * CELL_PADDING_Y);
    }

    #[test]
    fn test_span_normalization() {
        let table = grid(3, 3).with_style(vec![TableCommand::Span((0, 0), (0, -1))]);
        let spans = table.spans();
        assert_eq!(spans, vec![CellRange { col0: 0, row0: 0, col1: 0, row1: 2 }]);
    }

    #[test]
    fn test_background_last_wins() {
        let red = Color::rgb(1.0, 0.0, 0.0);
        let blue = Color::rgb(0.0, 0.0, 1.0);
        let table = grid(2, 2).with_style(vec![
            TableCommand::Background((0, 0), (-1, -1), red),
            TableCommand::Background((1, 1), (1, 1), blue),
        ]);
        assert_eq!(table.background_at(0, 0), Some(red));
        assert_eq!(table.background_at(1, 1), Some(blue));
    }

    #[test]
    fn test_split_respects_spans() {
        let table = grid(4, 2)
            .with_row_heights(vec![20.0; 4])
            .with_style(vec![
                TableCommand::Span((0, 1), (0, 2)),
                TableCommand::Grid((0, 0), (-1, -1), 0.25, Color::black()),
            ]);
        // Row 2 cannot start a part, the span (rows 1-2) would be cut
        let (head, tail) = table.split(50.0, &fonts()).unwrap();
        assert_eq!(head.rows(), 1);
        assert_eq!(tail.rows(), 3);
        assert_eq!(tail.spans(), vec![CellRange { col0: 0, row0: 0, col1: 0, row1: 1 }]);
        assert_eq!(
            tail.commands()[1],
            TableCommand::Grid((0, 0), (1, 2), 0.25, Color::black())
        );
    }

    #[test]
    fn test_split_impossible() {
        let table = grid(2, 1).with_row_heights(vec![50.0, 50.0]);
        assert!(table.split(40.0, &fonts()).is_none());
        let single = grid(1, 1);
        assert!(single.split(1000.0, &fonts()).is_none());
    }
}
