pub mod context;
mod error;
pub mod settings;

pub use context::{Environment, ProjectConfig};
pub use error::Error;
pub use settings::{Decoder, SettingDeclaration, Settings, SettingsError};
