//! Geometry utilities and the fixed page geometry of a report

use pdf_writer::Rect as PdfRect;
use serde::{Deserialize, Serialize};

use crate::types::{Rect, Size};

/// Points per centimetre
pub const CM: f64 = 72.0 / 2.54;

/// Convert centimetres to points
pub fn cm(value: f64) -> f64 {
    value * CM
}

/// Convert our Rect to pdf-writer Rect
pub fn rect_to_pdf(rect: &Rect) -> PdfRect {
    PdfRect::new(
        rect.x as f32,
        rect.y as f32,
        rect.right() as f32,
        rect.top() as f32,
    )
}

/// Page and frame geometry, in centimetres.
///
/// Defaults describe an A4 page with an 18 cm content column starting 1.6 cm
/// from the left edge and 2 cm above the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentGeometry {
    pub page_width: f64,
    pub page_height: f64,
    pub left_margin: f64,
    pub bottom_margin: f64,
    pub content_width: f64,
    /// Frame height under the big machine header
    pub machine_frame_height: f64,
    /// Frame height under the standard header
    pub standard_frame_height: f64,
    /// Top edge of the machine header table
    pub header_top: f64,
    /// Top edge of the page number
    pub page_number_top: f64,
}

impl Default for DocumentGeometry {
    fn default() -> Self {
        Self {
            page_width: 21.0,
            page_height: 29.7,
            left_margin: 1.6,
            bottom_margin: 2.0,
            content_width: 18.0,
            machine_frame_height: 23.0,
            standard_frame_height: 26.0,
            header_top: 28.0,
            page_number_top: 29.0,
        }
    }
}

impl DocumentGeometry {
    pub fn page_size(&self) -> Size {
        Size::new(cm(self.page_width), cm(self.page_height))
    }

    pub fn width(&self) -> f64 {
        cm(self.content_width)
    }

    pub fn left(&self) -> f64 {
        cm(self.left_margin)
    }

    pub fn bottom(&self) -> f64 {
        cm(self.bottom_margin)
    }

    pub fn machine_frame(&self) -> Rect {
        Rect::new(self.left(), self.bottom(), self.width(), cm(self.machine_frame_height))
    }

    pub fn standard_frame(&self) -> Rect {
        Rect::new(self.left(), self.bottom(), self.width(), cm(self.standard_frame_height))
    }

    /// Check that every frame and anchor lies on the page
    pub fn validate(&self) -> Result<(), String> {
        let page = self.page_size();
        for frame in [self.machine_frame(), self.standard_frame()] {
            if frame.width <= 0.0 || frame.height <= 0.0 {
                return Err("frame dimensions must be positive".to_string());
            }
            if frame.right() > page.width + 0.01 || frame.top() > page.height + 0.01 {
                return Err(format!("frame {:?} exceeds the page", frame));
            }
        }
        if cm(self.page_number_top) > page.height || cm(self.header_top) > page.height {
            return Err("header anchors exceed the page height".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry_is_a4() {
        let geometry = DocumentGeometry::default();
        let page = geometry.page_size();
        assert!((page.width - 595.2756).abs() < 0.01);
        assert!((page.height - 841.8898).abs() < 0.01);
        assert!(geometry.validate().is_ok());
    }

    #[test]
    fn test_frames_share_origin() {
        let geometry = DocumentGeometry::default();
        let machine = geometry.machine_frame();
        let standard = geometry.standard_frame();
        assert_eq!(machine.x, standard.x);
        assert_eq!(machine.y, standard.y);
        assert!(machine.height < standard.height);
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let geometry = DocumentGeometry {
            standard_frame_height: 40.0,
            ..DocumentGeometry::default()
        };
        assert!(geometry.validate().is_err());
    }
}
