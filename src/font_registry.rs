//! Font registry for managing the regular/bold faces and their PDF resources
//!
//! `FontLibrary` holds the parsed faces and is shared read-only between
//! builds. `FontRegistry` is per document: it owns the object ids, tracks
//! which glyphs were drawn and writes the font objects when the document is
//! finished.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};
use pdf_writer::{Name, Pdf, Ref};

use crate::error::ReportResult;
use crate::font_utils::{write_builtin_font, write_truetype_font, BuiltinFace, FontFace, TrueTypeFace};
use crate::renderer::RefAllocator;
use crate::types::FontWeight;

/// Regular and bold faces, loaded once per process
#[derive(Debug, Clone)]
pub struct FontLibrary {
    regular: FontFace,
    bold: FontFace,
}

impl FontLibrary {
    /// Helvetica / Helvetica-Bold, always available
    pub fn builtin() -> Self {
        Self {
            regular: FontFace::Builtin(BuiltinFace::helvetica()),
            bold: FontFace::Builtin(BuiltinFace::helvetica_bold()),
        }
    }

    /// Load the configured TrueType files; a face without a path falls back to
    /// its built-in counterpart, a path that does not resolve is an error
    pub fn load(regular: Option<&Path>, bold: Option<&Path>) -> ReportResult<Self> {
        let mut library = Self::builtin();
        if let Some(path) = regular {
            let face = TrueTypeFace::load(path)?;
            info!("Registered regular face {} from {}", face.family, path.display());
            library.regular = FontFace::TrueType(face);
        }
        if let Some(path) = bold {
            let face = TrueTypeFace::load(path)?;
            info!("Registered bold face {} from {}", face.family, path.display());
            library.bold = FontFace::TrueType(face);
        }
        Ok(library)
    }

    pub fn face(&self, weight: FontWeight) -> &FontFace {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }

    pub fn text_width(&self, weight: FontWeight, text: &str, size: f64) -> f64 {
        self.face(weight).text_width(text, size)
    }
}

struct FontEntry {
    id: Ref,
    name: String,
    used: BTreeMap<u16, char>,
}

pub struct FontRegistry {
    library: Arc<FontLibrary>,
    regular: FontEntry,
    bold: FontEntry,
}

impl FontRegistry {
    pub fn new(library: Arc<FontLibrary>, refs: &mut RefAllocator) -> Self {
        let mut entry = |name: &str| FontEntry {
            id: refs.next(),
            name: name.to_string(),
            used: BTreeMap::new(),
        };
        let regular = entry("F1");
        let bold = entry("F2");
        Self { library, regular, bold }
    }

    fn entry(&self, weight: FontWeight) -> &FontEntry {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }

    pub fn library(&self) -> &FontLibrary {
        &self.library
    }

    /// Resource name of the face (e.g. "F1")
    pub fn resource_name(&self, weight: FontWeight) -> &str {
        &self.entry(weight).name
    }

    pub fn text_width(&self, weight: FontWeight, text: &str, size: f64) -> f64 {
        self.library.text_width(weight, text, size)
    }

    pub fn ascent(&self, weight: FontWeight, size: f64) -> f64 {
        self.library.face(weight).ascent(size)
    }

    /// Encode text for the content stream of the given face
    pub fn encode(&mut self, weight: FontWeight, text: &str) -> Vec<u8> {
        let library = Arc::clone(&self.library);
        let entry = match weight {
            FontWeight::Regular => &mut self.regular,
            FontWeight::Bold => &mut self.bold,
        };
        library.face(weight).encode(text, &mut entry.used)
    }

    /// Write all registered fonts into page Resources
    pub fn write_resources(&self, resources: &mut pdf_writer::writers::Resources<'_>) {
        let mut dict = resources.fonts();
        for entry in [&self.regular, &self.bold] {
            dict.pair(Name(entry.name.as_bytes()), entry.id);
        }
    }

    /// Write the font objects themselves; called once when the document ends
    pub fn write_fonts(&self, pdf: &mut Pdf, refs: &mut RefAllocator) {
        for weight in [FontWeight::Regular, FontWeight::Bold] {
            let entry = self.entry(weight);
            match self.library.face(weight) {
                FontFace::Builtin(face) => write_builtin_font(pdf, face, entry.id),
                FontFace::TrueType(face) => {
                    debug!(
                        "Embedding {} with {} used glyphs as {}",
                        face.family,
                        entry.used.len(),
                        entry.name
                    );
                    write_truetype_font(pdf, face, entry.id, &entry.used, refs);
                }
            }
        }
    }
}
