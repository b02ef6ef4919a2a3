//! Declaring, locating, parsing and decoding named settings.

mod declaration;
mod decode;
mod error;
mod format;
mod lazy;
mod manifest;
mod resolve;
mod search;
mod store;

pub use declaration::{normalize, normalize_table, NormalizedSetting, SettingDeclaration};
pub use decode::{Decode, DecodeError, Decoder, DecoderRegistry};
pub use error::SettingsError;
pub use format::{
    JsonParser, ModuleParser, ParseError, Parser, ParserRegistry, TomlParser, YamlParser,
};
pub use lazy::SlotState;
pub use manifest::load_manifest;
pub use resolve::Resolver;
pub use search::{Found, SearchStrategy};
pub use store::Settings;
