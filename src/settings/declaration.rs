//! Setting declarations and their normalization.

use toml::{Table, Value};
use tracing::debug;

use super::decode::{Decoder, DecoderRegistry};
use super::SettingsError;

/// A user-authored setting declaration, before defaults are applied.
///
/// ```
/// use contract_settings::settings::{Decoder, SettingDeclaration};
///
/// let decl = SettingDeclaration::new("person")
///     .decode(Decoder::identity())
///     .lazy(false)
///     .path("./config/person.json");
/// assert_eq!(decl.name(), "person");
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct SettingDeclaration {
    name: String,
    decode: Option<Decoder>,
    lazy: Option<bool>,
    path: Option<String>,
}

impl SettingDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decode: None,
            lazy: None,
            path: None,
        }
    }

    pub fn decode(mut self, decoder: Decoder) -> Self {
        self.decode = Some(decoder);
        self
    }

    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = Some(lazy);
        self
    }

    /// Loads exactly this file instead of searching for one.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds a declaration from a manifest entry such as
    /// `[settings.person]`, looking `decode` up in `decoders`.
    ///
    /// Checks run in the order name, decode, lazy, path.
    pub fn from_toml(
        name: &str,
        entry: &Value,
        decoders: &DecoderRegistry,
    ) -> Result<Self, SettingsError> {
        if name.is_empty() {
            return Err(SettingsError::EmptyKey);
        }
        let table = entry
            .as_table()
            .ok_or_else(|| SettingsError::InvalidDeclaration(name.to_string()))?;

        let mut decl = Self::new(name);

        if let Some(decode) = table.get("decode") {
            let decoder = decode
                .as_str()
                .and_then(|key| decoders.get(key))
                .ok_or(SettingsError::InvalidDecode)?;
            decl.decode = Some(decoder.clone());
        }

        if let Some(lazy) = table.get("lazy") {
            decl.lazy = Some(lazy.as_bool().ok_or(SettingsError::InvalidLazy)?);
        }

        if let Some(path) = table.get("path") {
            decl.path = Some(path.as_str().ok_or(SettingsError::InvalidPath)?.to_string());
        }

        Ok(decl)
    }
}

/// A declaration with defaults filled in.
#[derive(Debug, Clone)]
pub struct NormalizedSetting {
    name: String,
    decode: Decoder,
    lazy: bool,
    path: Option<String>,
}

impl NormalizedSetting {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decode
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// The explicit path, if one was declared. An empty string is kept as
    /// declared rather than collapsed to `None`.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

/// Validates declarations and fills in defaults, preserving order.
///
/// A later declaration with the same name replaces the earlier one in place.
pub fn normalize<I>(declarations: I) -> Result<Vec<NormalizedSetting>, SettingsError>
where
    I: IntoIterator<Item = SettingDeclaration>,
{
    let mut settings: Vec<NormalizedSetting> = Vec::new();

    for decl in declarations {
        if decl.name.is_empty() {
            return Err(SettingsError::EmptyKey);
        }

        let setting = NormalizedSetting {
            name: decl.name,
            decode: decl.decode.unwrap_or_default(),
            lazy: decl.lazy.unwrap_or(true),
            path: decl.path,
        };

        match settings.iter_mut().find(|s| s.name == setting.name) {
            Some(existing) => *existing = setting,
            None => settings.push(setting),
        }
    }

    debug!(count = settings.len(), "normalized settings declarations");
    Ok(settings)
}

/// Normalizes a manifest `settings` table.
pub fn normalize_table(
    table: &Table,
    decoders: &DecoderRegistry,
) -> Result<Vec<NormalizedSetting>, SettingsError> {
    let declarations = table
        .iter()
        .map(|(name, entry)| SettingDeclaration::from_toml(name, entry, decoders))
        .collect::<Result<Vec<_>, _>>()?;

    normalize(declarations)
}
