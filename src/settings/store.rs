use std::any::Any;
use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use super::declaration::NormalizedSetting;
use super::lazy::{LazySlot, SlotState};
use super::resolve::Resolver;
use super::SettingsError;

/// Resolved settings for one runtime environment, keyed by name.
///
/// Eager settings are resolved when this is built. Lazy settings are
/// resolved on first read. Either way each setting is loaded and decoded at
/// most once per `Settings`; later reads are a lookup.
#[derive(Debug)]
pub struct Settings {
    resolver: Resolver,
    slots: Vec<Slot>,
    index: HashMap<String, usize>,
}

#[derive(Debug)]
struct Slot {
    setting: NormalizedSetting,
    value: LazySlot,
}

impl Settings {
    /// Builds the settings object, resolving every non-lazy setting.
    ///
    /// The first eager failure is returned and the remaining settings are
    /// not touched.
    pub fn build(settings: &[NormalizedSetting], resolver: Resolver) -> Result<Self, SettingsError> {
        let mut this = Self {
            resolver,
            slots: Vec::with_capacity(settings.len()),
            index: HashMap::with_capacity(settings.len()),
        };

        for setting in settings {
            this.index.insert(setting.name().to_string(), this.slots.len());
            this.slots.push(Slot {
                setting: setting.clone(),
                value: LazySlot::new(),
            });
        }

        for slot in this.slots.iter().filter(|slot| !slot.setting.is_lazy()) {
            debug!(setting = slot.setting.name(), "resolving eager setting");
            slot.value
                .get_or_resolve(|| this.resolver.resolve(&slot.setting))?;
        }

        Ok(this)
    }

    /// Returns the decoded value of `name`, resolving it on first access.
    ///
    /// `T` must be the type the setting's decoder produces; settings without
    /// a decoder produce [`serde_json::Value`].
    pub fn get<T: Any>(&self, name: &str) -> Result<&T, SettingsError> {
        let slot = self.slot(name)?;
        let value = slot
            .value
            .get_or_resolve(|| self.resolver.resolve(&slot.setting))?;

        value
            .downcast_ref::<T>()
            .ok_or_else(|| SettingsError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Shorthand for `get::<Value>`, for settings decoded by identity.
    pub fn value(&self, name: &str) -> Result<&Value, SettingsError> {
        self.get::<Value>(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Declared names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.setting.name())
    }

    pub fn state(&self, name: &str) -> Option<SlotState> {
        self.slot(name).ok().map(|slot| slot.value.state())
    }

    pub fn network(&self) -> &str {
        self.resolver.network()
    }

    fn slot(&self, name: &str) -> Result<&Slot, SettingsError> {
        self.index
            .get(name)
            .map(|&idx| &self.slots[idx])
            .ok_or_else(|| SettingsError::Undeclared(name.to_string()))
    }
}
