use std::path::Path;

use super::annotation_document::AnnotationDocument;

/// Domain interface for reading and writing annotation files.
pub trait AnnotationStore: Send {
    fn open(&self, path: &Path) -> Result<AnnotationDocument, Box<dyn std::error::Error>>;

    /// A fresh document as the underlying format creates it, which may
    /// include placeholder tiers.
    fn create(&self) -> AnnotationDocument;

    fn save(
        &self,
        document: &AnnotationDocument,
        path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
