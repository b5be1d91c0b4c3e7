pub mod engine;
pub mod types;

pub use engine::CommandClient;
pub use types::{CommandError, LaunchForm, ValidationError};
