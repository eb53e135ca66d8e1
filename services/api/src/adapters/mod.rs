pub mod chat_llm;
pub mod pdf;

pub use chat_llm::OpenAiChatGateway;
pub use pdf::PdfExtractAdapter;
