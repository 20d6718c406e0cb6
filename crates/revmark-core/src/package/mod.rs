pub mod content_types;
pub mod docx;
pub mod ooxml;
pub mod relationships;

pub use content_types::ContentTypes;
pub use docx::{load_document, save_document};
pub use ooxml::OoxmlPackage;
pub use relationships::Relationship;
