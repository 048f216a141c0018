//! Vibration severity chart
//!
//! Effective velocity (mm/s RMS) bands crossed with machine classes I-IV.
//! Each class column is cut into four zones, from the top band down:
//! D (red), C (yellow), B (green) and A (pale green). The reference table
//! printed in reports is generated from the same zone edges used by
//! [`classify`].

use crate::geometry::cm;
use crate::paragraph::Paragraph;
use crate::styles::BLACK_BOLD_CENTER;
use crate::table::{Cell, Table, TableCommand};
use crate::types::{Alignment, Color, FontWeight, VAlign};

/// Band thresholds in mm/s, highest first
pub const RMS_THRESHOLDS: [f64; 11] = [28.0, 18.0, 11.2, 7.1, 4.5, 2.8, 1.8, 1.12, 0.71, 0.45, 0.28];
const RMS_LABELS: [&str; 11] = [
    "28", "18", "11.2", "7.1", "4.5", "2.8", "1.8", "1.12", "0.71", "0.45", "0.28",
];

/// First band of the C, B and A zones for each class
const ZONE_STARTS: [[usize; 3]; 4] = [[4, 6, 8], [3, 5, 7], [2, 4, 6], [1, 3, 5]];

/// Table rows above the first band
const HEADER_ROWS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MachineClass {
    I,
    II,
    III,
    IV,
}

impl MachineClass {
    pub const ALL: [MachineClass; 4] = [
        MachineClass::I,
        MachineClass::II,
        MachineClass::III,
        MachineClass::IV,
    ];

    fn index(self) -> usize {
        match self {
            MachineClass::I => 0,
            MachineClass::II => 1,
            MachineClass::III => 2,
            MachineClass::IV => 3,
        }
    }

    /// Column heading as printed on the chart
    pub fn label(self) -> &'static str {
        match self {
            MachineClass::I => "Clase l",
            MachineClass::II => "Clase ll",
            MachineClass::III => "Clase lll",
            MachineClass::IV => "Clase lV",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeverityBand {
    Red,
    Yellow,
    GreenOne,
    GreenTwo,
}

impl SeverityBand {
    pub const ALL: [SeverityBand; 4] = [
        SeverityBand::Red,
        SeverityBand::Yellow,
        SeverityBand::GreenOne,
        SeverityBand::GreenTwo,
    ];

    pub fn color(self) -> Color {
        match self {
            SeverityBand::Red => Color::rgb(1.0, 0.0, 0.0),
            SeverityBand::Yellow => Color::rgb(1.0, 1.0, 0.0),
            SeverityBand::GreenOne => Color::rgb(0.0, 1.0, 0.0),
            SeverityBand::GreenTwo => Color::rgb(153.0 / 255.0, 1.0, 153.0 / 255.0),
        }
    }

    /// Zone letter, D for the worst
    pub fn grade(self) -> &'static str {
        match self {
            SeverityBand::Red => "D",
            SeverityBand::Yellow => "C",
            SeverityBand::GreenOne => "B",
            SeverityBand::GreenTwo => "A",
        }
    }
}

/// One labelled velocity band of the chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RmsBand(usize);

impl RmsBand {
    pub fn all() -> impl Iterator<Item = RmsBand> {
        (0..RMS_THRESHOLDS.len()).map(RmsBand)
    }

    /// 0 for the 28 mm/s band, 10 for 0.28 mm/s
    pub fn index(self) -> usize {
        self.0
    }

    pub fn threshold(self) -> f64 {
        RMS_THRESHOLDS[self.0]
    }

    pub fn label(self) -> &'static str {
        RMS_LABELS[self.0]
    }

    /// Highest band whose threshold does not exceed `velocity`; anything
    /// below 0.28 mm/s falls in the lowest band
    pub fn for_velocity(velocity: f64) -> Self {
        RMS_THRESHOLDS
            .iter()
            .position(|&threshold| threshold <= velocity)
            .map(RmsBand)
            .unwrap_or(RmsBand(RMS_THRESHOLDS.len() - 1))
    }
}

/// Zone of a band for a machine class
pub fn classify(band: RmsBand, class: MachineClass) -> SeverityBand {
    let starts = ZONE_STARTS[class.index()];
    if band.0 < starts[0] {
        SeverityBand::Red
    } else if band.0 < starts[1] {
        SeverityBand::Yellow
    } else if band.0 < starts[2] {
        SeverityBand::GreenOne
    } else {
        SeverityBand::GreenTwo
    }
}

pub fn severity(velocity: f64, class: MachineClass) -> SeverityBand {
    classify(RmsBand::for_velocity(velocity), class)
}

/// Inclusive band range of a zone in a class column
pub fn zone(class: MachineClass, band: SeverityBand) -> (RmsBand, RmsBand) {
    let starts = ZONE_STARTS[class.index()];
    let last = RMS_THRESHOLDS.len() - 1;
    let (first, end) = match band {
        SeverityBand::Red => (0, starts[0] - 1),
        SeverityBand::Yellow => (starts[0], starts[1] - 1),
        SeverityBand::GreenOne => (starts[1], starts[2] - 1),
        SeverityBand::GreenTwo => (starts[2], last),
    };
    (RmsBand(first), RmsBand(end))
}

/// The 14 x 6 reference chart
pub fn severity_table() -> Table {
    let blank = || vec![Cell::Empty; 6];

    let mut title_row = blank();
    title_row[0] = Cell::from(Paragraph::new(
        "Rango de Velocidad efectiva RMS (mm/seg.)",
        BLACK_BOLD_CENTER,
    ));
    title_row[2] = Cell::from(Paragraph::new("Tipos de Máquinas", BLACK_BOLD_CENTER));

    let mut class_row = blank();
    for class in MachineClass::ALL {
        class_row[2 + class.index()] = Cell::from(class.label());
    }

    let mut data = vec![title_row, class_row, blank()];
    for band in RmsBand::all() {
        let mut row = blank();
        row[0] = Cell::from(band.label());
        data.push(row);
    }

    let mut styles = vec![
        TableCommand::Span((0, 0), (1, 2)),
        TableCommand::Span((2, 0), (5, 0)),
    ];
    for class in MachineClass::ALL {
        let col = 2 + class.index() as i32;
        styles.push(TableCommand::Span((col, 1), (col, 2)));
    }
    for band in RmsBand::all() {
        let row = (HEADER_ROWS + band.index()) as i32;
        styles.push(TableCommand::Span((0, row), (1, row)));
    }

    for class in MachineClass::ALL {
        let col = 2 + class.index();
        for level in SeverityBand::ALL {
            let (first, last) = zone(class, level);
            let row = HEADER_ROWS + first.index();
            data[row][col] = Cell::from(level.grade());
            styles.push(TableCommand::Span(
                (col as i32, row as i32),
                (col as i32, (HEADER_ROWS + last.index()) as i32),
            ));
        }
    }

    for level in SeverityBand::ALL {
        for class in MachineClass::ALL {
            let col = (2 + class.index()) as i32;
            let (first, last) = zone(class, level);
            styles.push(TableCommand::Background(
                (col, (HEADER_ROWS + first.index()) as i32),
                (col, (HEADER_ROWS + last.index()) as i32),
                level.color(),
            ));
        }
    }

    styles.extend([
        TableCommand::FontName((0, 3), (0, 13), FontWeight::Regular),
        TableCommand::FontName((0, 0), (5, 2), FontWeight::Bold),
        TableCommand::FontName((2, 3), (-1, -1), FontWeight::Bold),
        TableCommand::Valign((0, 0), (-1, -1), VAlign::Middle),
        TableCommand::Align((0, 0), (-1, -1), Alignment::Center),
        TableCommand::Grid((0, 0), (-1, -1), 0.25, Color::black()),
        TableCommand::Box((0, 0), (-1, -1), 2.0, Color::black()),
        TableCommand::Box((0, 0), (-1, -1), 1.0, Color::black()),
    ]);

    Table::new(data, vec![cm(2.0); 6])
        .with_row_heights(vec![cm(0.5); 14])
        .with_style(styles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellRange;

    #[test]
    fn test_top_band_is_red_for_every_class() {
        for class in MachineClass::ALL {
            assert_eq!(severity(28.0, class), SeverityBand::Red);
            assert_eq!(severity(45.0, class), SeverityBand::Red);
        }
    }

    #[test]
    fn test_band_selection() {
        assert_eq!(RmsBand::for_velocity(28.0).label(), "28");
        assert_eq!(RmsBand::for_velocity(11.2).label(), "11.2");
        assert_eq!(RmsBand::for_velocity(5.0).label(), "4.5");
        assert_eq!(RmsBand::for_velocity(0.1).label(), "0.28");
        assert_eq!(RmsBand::for_velocity(f64::NAN).label(), "0.28");
    }

    #[test]
    fn test_chart_zones() {
        assert_eq!(severity(7.1, MachineClass::I), SeverityBand::Red);
        assert_eq!(severity(4.5, MachineClass::I), SeverityBand::Yellow);
        assert_eq!(severity(1.8, MachineClass::I), SeverityBand::GreenOne);
        assert_eq!(severity(0.71, MachineClass::I), SeverityBand::GreenTwo);
        assert_eq!(severity(11.2, MachineClass::III), SeverityBand::Yellow);
        assert_eq!(severity(4.5, MachineClass::III), SeverityBand::GreenOne);
        assert_eq!(severity(18.0, MachineClass::IV), SeverityBand::Yellow);
        assert_eq!(severity(2.8, MachineClass::IV), SeverityBand::GreenTwo);
    }

    #[test]
    fn test_zones_cover_every_band_once() {
        for class in MachineClass::ALL {
            let mut covered = Vec::new();
            for level in SeverityBand::ALL {
                let (first, last) = zone(class, level);
                covered.extend(first.index()..=last.index());
            }
            assert_eq!(covered, (0..11).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_table_shape_and_colors() {
        let table = severity_table();
        assert_eq!(table.rows(), 14);
        assert_eq!(table.cols(), 6);
        assert_eq!(table.background_at(2, 3), Some(SeverityBand::Red.color()));
        assert_eq!(table.background_at(2, 7), Some(SeverityBand::Yellow.color()));
        assert_eq!(table.background_at(4, 7), Some(SeverityBand::GreenOne.color()));
        assert_eq!(table.background_at(5, 8), Some(SeverityBand::GreenTwo.color()));
        assert_eq!(table.background_at(0, 3), None);
        assert_eq!(table.cell(3, 6), Some(&Cell::Text("C".to_string())));
        assert_eq!(table.cell(0, -1), Some(&Cell::Text("0.28".to_string())));
    }

    #[test]
    fn test_table_spans() {
        let spans = severity_table().spans();
        assert!(spans.contains(&CellRange { col0: 2, row0: 3, col1: 2, row1: 6 }));
        assert!(spans.contains(&CellRange { col0: 5, row0: 8, col1: 5, row1: 13 }));
        // the single-band red zone of class IV is not a span
        assert!(!spans.iter().any(|s| s.col0 == 5 && s.row0 == 3));
        assert_eq!(spans.len(), 32);
    }
}
