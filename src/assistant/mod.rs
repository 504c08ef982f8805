pub mod prompt;
pub mod sessions;
pub mod service;

pub use service::AssistantService;
pub use sessions::ChatSessions;
