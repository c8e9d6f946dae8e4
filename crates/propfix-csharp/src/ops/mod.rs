//! Conversion operations over project snapshots.

pub mod convert;

/// Options controlling a conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Rewrite call sites in documents other than the declaring one.
    ///
    /// When disabled, a conversion whose references cross document
    /// boundaries fails with
    /// [`convert::ConvertError::CrossDocumentReferences`] instead of
    /// touching any document.
    pub cross_document: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            cross_document: true,
        }
    }
}
