//! The PDF value model.

mod dictionary;
mod primitive;
mod stream;
mod write;

pub use dictionary::Dictionary;
pub use primitive::{DocumentId, Name, ObjRef, Object, PdfString, Real, TextSource};
pub use stream::StreamObject;
pub use write::write_object;
