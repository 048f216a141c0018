//! Image registry for managing image XObjects and page resources
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pdf_writer::{Name, Pdf, Ref};

use crate::error::ReportResult;
use crate::image_utils::{add_image_to_pdf, load_image};
use crate::renderer::RefAllocator;

pub struct ImageRegistry {
    // path → (image object id, XObject resource name)
    images: BTreeMap<PathBuf, (Ref, String)>,
    used_on_page: BTreeMap<String, Ref>,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self {
            images: BTreeMap::new(),
            used_on_page: BTreeMap::new(),
        }
    }

    /// Get or create an Image XObject from a file path and mark it as used
    /// on the current page. Returns the XObject resource name.
    pub fn use_image(
        &mut self,
        pdf: &mut Pdf,
        refs: &mut RefAllocator,
        path: &Path,
    ) -> ReportResult<String> {
        let (id, name) = match self.images.get(path) {
            Some((id, name)) => (*id, name.clone()),
            None => {
                let data = load_image(path)?;
                let id = refs.next();
                add_image_to_pdf(pdf, &data, id, refs);
                let name = format!("Im{}", self.images.len() + 1);
                self.images.insert(path.to_path_buf(), (id, name.clone()));
                (id, name)
            }
        };
        self.used_on_page.insert(name.clone(), id);
        Ok(name)
    }

    /// Write the images used on the current page into its Resources
    pub fn write_page_resources(&mut self, resources: &mut pdf_writer::writers::Resources<'_>) {
        if self.used_on_page.is_empty() {
            return;
        }
        let mut dict = resources.x_objects();
        for (name, id) in &self.used_on_page {
            dict.pair(Name(name.as_bytes()), *id);
        }
    }

    pub fn end_page(&mut self) {
        self.used_on_page.clear();
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl Default for ImageRegistry {
    fn default() -> Self {
        Self::new()
    }
}
