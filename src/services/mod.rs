pub mod cancel;
pub mod docx_reader;
pub mod extractor;
pub mod pdf_reader;
pub mod text_reader;
pub mod validation;

pub use cancel::{CancelOnDrop, CancelSignal};
pub use docx_reader::DocxReader;
pub use extractor::{DocumentFormat, Extractor, ExtractorConfig};
pub use pdf_reader::{PdfOptions, PdfReader};
pub use text_reader::TextReader;
pub use validation::{accept_attribute, SizeExceeded, SizePolicy, SUPPORTED_EXTENSIONS};
