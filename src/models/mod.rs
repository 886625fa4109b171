pub mod message;
pub mod project;
pub mod settings;

pub use message::{StoredMessage, StoredRole};
pub use project::Project;
pub use settings::AppConfig;
