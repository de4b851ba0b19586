mod document;
mod request;
mod turn;
mod vocab;

pub use document::{
    DocumentAnswer, DocumentContent, DocumentQuery, DocumentUpload, Report, ReportRequest,
    UploadResponse,
};
pub use request::{ChatOptions, ChatRequest};
pub use turn::{Role, Turn, TurnState};
pub use vocab::VocabEntry;
