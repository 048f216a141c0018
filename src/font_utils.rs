//! Font utilities for PDF rendering
//!
//! Two kinds of faces are supported: the standard Helvetica pair built into
//! every PDF reader, and TrueType files embedded as Type0 / CIDFontType2
//! fonts with Identity-H encoding (CID = glyph id).

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use pdf_writer::types::{CidFontType, FontFlags, SystemInfo};
use pdf_writer::{Finish, Name, Pdf, Rect as PdfRect, Ref, Str};
use ttf_parser::Face;

use crate::error::{ReportError, ReportResult};
use crate::renderer::RefAllocator;
use crate::unicode_utils::{fold_accent, unicode_to_winansi};

/// Helvetica advance widths for ASCII 0x20..=0x7E (1000 units per em)
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold advance widths for ASCII 0x20..=0x7E (1000 units per em)
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];

/// Characters whose glyphs are resolved when a TrueType face is loaded
const PRELOADED_RANGES: [(u32, u32); 3] = [(0x0020, 0x024F), (0x2010, 0x2044), (0x20AC, 0x20AC)];

/// One of the 14 standard PDF faces
#[derive(Debug, Clone)]
pub struct BuiltinFace {
    pub base_font: &'static str,
    widths: &'static [u16; 95],
}

impl BuiltinFace {
    pub fn helvetica() -> Self {
        Self { base_font: "Helvetica", widths: &HELVETICA_WIDTHS }
    }

    pub fn helvetica_bold() -> Self {
        Self { base_font: "Helvetica-Bold", widths: &HELVETICA_BOLD_WIDTHS }
    }

    fn advance(&self, ch: char) -> f64 {
        let ch = fold_accent(ch);
        let code = ch as u32;
        if (0x20..=0x7E).contains(&code) {
            self.widths[(code - 0x20) as usize] as f64
        } else {
            556.0
        }
    }
}

/// TrueType face loaded from disk, with the metrics needed for layout
#[derive(Debug, Clone)]
pub struct TrueTypeFace {
    pub family: String,
    data: Vec<u8>,
    ascender: f64,
    descender: f64,
    cap_height: f64,
    bbox: [f64; 4],
    glyphs: HashMap<char, (u16, f64)>,
    notdef_advance: f64,
}

impl TrueTypeFace {
    /// Load and validate a TTF/OTF file
    pub fn load(path: &Path) -> ReportResult<Self> {
        if !path.exists() {
            return Err(ReportError::MissingAsset(format!(
                "Font file not found: {}",
                path.display()
            )));
        }
        let data = fs::read(path).map_err(|e| {
            ReportError::FontError(format!("Failed to read font file {}: {}", path.display(), e))
        })?;
        Self::from_bytes(data)
            .map_err(|e| ReportError::FontError(format!("{}: {}", path.display(), e)))
    }

    pub fn from_bytes(data: Vec<u8>) -> ReportResult<Self> {
        let face = Face::parse(&data, 0)
            .map_err(|e| ReportError::FontError(format!("Invalid font file: {}", e)))?;

        let scale = 1000.0 / face.units_per_em() as f64;
        let bbox = face.global_bounding_box();

        let family = face
            .names()
            .into_iter()
            .find(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .or_else(|| {
                face.names()
                    .into_iter()
                    .find(|name| name.name_id == ttf_parser::name_id::FAMILY)
            })
            .and_then(|name| name.to_string())
            .map(|name| {
                name.chars()
                    .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                    .collect::<String>()
            })
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "EmbeddedFont".to_string());

        let mut glyphs = HashMap::new();
        for (start, end) in PRELOADED_RANGES {
            for code in start..=end {
                let Some(ch) = char::from_u32(code) else { continue };
                if let Some(gid) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(gid).unwrap_or(0) as f64 * scale;
                    glyphs.insert(ch, (gid.0, advance));
                }
            }
        }
        let notdef_advance = face
            .glyph_hor_advance(ttf_parser::GlyphId(0))
            .map(|adv| adv as f64 * scale)
            .unwrap_or(500.0);

        let ascender = face.ascender() as f64 * scale;
        let descender = face.descender() as f64 * scale;
        let cap_height = face
            .capital_height()
            .map(|h| h as f64 * scale)
            .unwrap_or(ascender);

        Ok(Self {
            family,
            ascender,
            descender,
            cap_height,
            bbox: [
                bbox.x_min as f64 * scale,
                bbox.y_min as f64 * scale,
                bbox.x_max as f64 * scale,
                bbox.y_max as f64 * scale,
            ],
            glyphs,
            notdef_advance,
            data,
        })
    }

    /// Glyph id and advance (1000 units) for a character; unknown characters
    /// resolve to .notdef
    pub fn glyph(&self, ch: char) -> (u16, f64) {
        self.glyphs
            .get(&ch)
            .copied()
            .unwrap_or((0, self.notdef_advance))
    }
}

/// A registered face, built-in or embedded
#[derive(Debug, Clone)]
pub enum FontFace {
    Builtin(BuiltinFace),
    TrueType(TrueTypeFace),
}

impl FontFace {
    /// Advance of a single character in 1000 units per em
    pub fn advance(&self, ch: char) -> f64 {
        match self {
            FontFace::Builtin(face) => face.advance(ch),
            FontFace::TrueType(face) => face.glyph(ch).1,
        }
    }

    /// Width of `text` set at `size` points
    pub fn text_width(&self, text: &str, size: f64) -> f64 {
        text.chars().map(|ch| self.advance(ch)).sum::<f64>() * size / 1000.0
    }

    /// Distance from baseline to the top of the tallest glyphs
    pub fn ascent(&self, size: f64) -> f64 {
        match self {
            FontFace::Builtin(_) => 0.718 * size,
            FontFace::TrueType(face) => face.ascender * size / 1000.0,
        }
    }

    /// Encode text for a content stream, recording glyph usage for embedding
    pub fn encode(&self, text: &str, used: &mut BTreeMap<u16, char>) -> Vec<u8> {
        match self {
            FontFace::Builtin(_) => unicode_to_winansi(text),
            FontFace::TrueType(face) => {
                let mut bytes = Vec::with_capacity(text.len() * 2);
                for ch in text.chars() {
                    let (gid, _) = face.glyph(ch);
                    used.entry(gid).or_insert(ch);
                    bytes.extend_from_slice(&gid.to_be_bytes());
                }
                bytes
            }
        }
    }
}

/// Write a built-in Type1 font dictionary
pub fn write_builtin_font(pdf: &mut Pdf, face: &BuiltinFace, font_id: Ref) {
    let mut font = pdf.type1_font(font_id);
    font.base_font(Name(face.base_font.as_bytes()));
    font.pair(Name(b"Encoding"), Name(b"WinAnsiEncoding"));
}

/// Embed a TrueType face as a Type0 font.
///
/// Creates the Type0 wrapper, the CIDFontType2 descendant with widths for the
/// glyphs actually used, the FontDescriptor, the FontFile2 stream and a
/// ToUnicode CMap so text stays searchable.
pub fn write_truetype_font(
    pdf: &mut Pdf,
    face: &TrueTypeFace,
    font_id: Ref,
    used: &BTreeMap<u16, char>,
    refs: &mut RefAllocator,
) {
    let cid_font_id = refs.next();
    let descriptor_id = refs.next();
    let font_file_id = refs.next();
    let to_unicode_id = refs.next();
    let base_font = Name(face.family.as_bytes());

    pdf.type0_font(font_id)
        .base_font(base_font)
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_id)
        .to_unicode(to_unicode_id);

    let mut cid_font = pdf.cid_font(cid_font_id);
    cid_font.subtype(CidFontType::Type2);
    cid_font.base_font(base_font);
    cid_font.system_info(SystemInfo {
        registry: Str(b"Adobe"),
        ordering: Str(b"Identity"),
        supplement: 0,
    });
    cid_font.font_descriptor(descriptor_id);
    cid_font.default_width(face.notdef_advance as f32);
    cid_font.cid_to_gid_map_predefined(Name(b"Identity"));
    {
        let mut widths = cid_font.widths();
        for (gid, ch) in used {
            widths.consecutive(*gid, [face.glyph(*ch).1 as f32]);
        }
    }
    cid_font.finish();

    let mut descriptor = pdf.font_descriptor(descriptor_id);
    descriptor
        .name(base_font)
        .flags(FontFlags::NON_SYMBOLIC)
        .bbox(PdfRect::new(
            face.bbox[0] as f32,
            face.bbox[1] as f32,
            face.bbox[2] as f32,
            face.bbox[3] as f32,
        ))
        .italic_angle(0.0)
        .ascent(face.ascender as f32)
        .descent(face.descender as f32)
        .cap_height(face.cap_height as f32)
        .stem_v(80.0)
        .font_file2(font_file_id);
    descriptor.finish();

    pdf.stream(font_file_id, &face.data)
        .pair(Name(b"Length1"), face.data.len() as i32);

    let cmap = to_unicode_cmap(used);
    pdf.stream(to_unicode_id, cmap.as_bytes());
}

/// Build a ToUnicode CMap mapping glyph ids back to characters
fn to_unicode_cmap(used: &BTreeMap<u16, char>) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    let entries: Vec<(&u16, &char)> = used.iter().collect();
    // bfchar blocks hold at most 100 entries
    for chunk in entries.chunks(100) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (gid, ch) in chunk {
            let mut units = [0u16; 2];
            let hex: String = ch
                .encode_utf16(&mut units)
                .iter()
                .map(|unit| format!("{:04X}", unit))
                .collect();
            cmap.push_str(&format!("<{:04X}> <{}>\n", gid, hex));
        }
        cmap.push_str("endbfchar\n");
    }
    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_widths() {
        let face = FontFace::Builtin(BuiltinFace::helvetica());
        assert_eq!(face.text_width("0", 10.0), 5.56);
        // accented letters share the advance of their base letter
        assert_eq!(face.text_width("á", 10.0), face.text_width("a", 10.0));
    }

    #[test]
    fn test_bold_is_wider() {
        let regular = FontFace::Builtin(BuiltinFace::helvetica());
        let bold = FontFace::Builtin(BuiltinFace::helvetica_bold());
        assert!(bold.text_width("Vibration", 10.0) > regular.text_width("Vibration", 10.0));
    }

    #[test]
    fn test_builtin_encoding_is_winansi() {
        let face = FontFace::Builtin(BuiltinFace::helvetica());
        let mut used = BTreeMap::new();
        assert_eq!(face.encode("Año", &mut used), vec![b'A', 0xF1, b'o']);
        assert!(used.is_empty());
    }

    #[test]
    fn test_cmap_entries() {
        let mut used = BTreeMap::new();
        used.insert(3u16, 'A');
        used.insert(70u16, 'ñ');
        let cmap = to_unicode_cmap(&used);
        assert!(cmap.contains("2 beginbfchar"));
        assert!(cmap.contains("<0003> <0041>"));
        assert!(cmap.contains("<0046> <00F1>"));
    }

    #[test]
    fn test_missing_font_file() {
        let err = TrueTypeFace::load(Path::new("/nonexistent/arial.ttf")).unwrap_err();
        assert!(matches!(err, ReportError::MissingAsset(_)));
    }

    #[test]
    fn test_invalid_font_bytes() {
        let err = TrueTypeFace::from_bytes(b"not a font".to_vec()).unwrap_err();
        assert!(matches!(err, ReportError::FontError(_)));
    }
}
