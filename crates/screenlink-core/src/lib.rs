pub mod errors;
pub mod protocol;
pub mod settings;
pub mod types;

pub use errors::ProtocolError;
pub use settings::DisplaySettings;
pub use types::*;
