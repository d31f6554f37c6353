pub mod annotation_document;
pub mod annotation_store;
pub mod span;
pub mod tier;
