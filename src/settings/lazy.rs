use std::any::Any;
use std::cell::OnceCell;

use super::SettingsError;

/// Where a setting's value is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Unresolved,
    Resolved,
    Failed,
}

/// A value computed at most once.
///
/// The first call to [`get_or_resolve`](Self::get_or_resolve) runs the
/// resolver and stores its outcome, success or failure. Every later call
/// returns that outcome without running anything.
#[derive(Debug, Default)]
pub(crate) struct LazySlot {
    outcome: OnceCell<Result<Box<dyn Any>, SettingsError>>,
}

impl LazySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_resolve<F>(&self, resolve: F) -> Result<&(dyn Any + 'static), SettingsError>
    where
        F: FnOnce() -> Result<Box<dyn Any>, SettingsError>,
    {
        match self.outcome.get_or_init(resolve) {
            Ok(value) => Ok(&**value),
            Err(err) => Err(err.clone()),
        }
    }

    pub fn state(&self) -> SlotState {
        match self.outcome.get() {
            None => SlotState::Unresolved,
            Some(Ok(_)) => SlotState::Resolved,
            Some(Err(_)) => SlotState::Failed,
        }
    }
}
