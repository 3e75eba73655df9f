/*
 * Persisted user settings. Values live as DWORDs under the per-user
 * application key; the auto-start flag is the presence of the Run entry.
 * Missing or unreadable values fall back to the defaults below.
 */
use crate::config::{REG_DEFAULT_TILING, REG_LEFT_CLICK_ACTION, REG_LOGGING, REG_STATUS_BAR};
use crate::error::AppResult;
use crate::types::CommandId;

/*
 * Key/value persistence backing the settings. Production code uses the
 * registry (`settings_registry::RegistryStore`); tests use `MemoryStore`.
 */
pub trait SettingsStore {
    fn read_u32(&self, name: &str) -> AppResult<Option<u32>>;

    /// Creates the application key when missing.
    fn write_u32(&self, name: &str, value: u32) -> AppResult<()>;

    fn app_key_exists(&self) -> bool;

    fn delete_app_key(&self) -> AppResult<()>;

    /// Removes the vendor key when it holds neither subkeys nor values.
    fn prune_vendor_key(&self) -> AppResult<()>;

    fn run_entry_exists(&self) -> bool;

    fn write_run_entry(&self, command_line: &str) -> AppResult<()>;

    fn delete_run_entry(&self) -> AppResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub left_click_action: CommandId,
    pub logging: bool,
    /// Let the OS choose the tiled windows instead of the filtered set.
    pub default_tiling: bool,
    pub status_bar: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            left_click_action: CommandId::CascadeWindows,
            logging: false,
            default_tiling: false,
            status_bar: false,
        }
    }
}

impl Settings {
    pub fn load(store: &dyn SettingsStore) -> Settings {
        let defaults = Settings::default();

        let left_click_action = read_value(store, REG_LEFT_CLICK_ACTION)
            .and_then(CommandId::from_raw)
            .filter(|id| id.is_tray_action())
            .unwrap_or(defaults.left_click_action);

        Settings {
            left_click_action,
            logging: read_flag(store, REG_LOGGING).unwrap_or(defaults.logging),
            default_tiling: read_flag(store, REG_DEFAULT_TILING).unwrap_or(defaults.default_tiling),
            status_bar: read_flag(store, REG_STATUS_BAR).unwrap_or(defaults.status_bar),
        }
    }

    pub fn set_left_click_action(
        &mut self,
        store: &dyn SettingsStore,
        action: CommandId,
    ) -> AppResult<()> {
        store.write_u32(REG_LEFT_CLICK_ACTION, u32::from(action.raw()))?;
        self.left_click_action = action;
        Ok(())
    }

    pub fn set_logging(&mut self, store: &dyn SettingsStore, enabled: bool) -> AppResult<()> {
        store.write_u32(REG_LOGGING, u32::from(enabled))?;
        self.logging = enabled;
        Ok(())
    }

    pub fn set_default_tiling(&mut self, store: &dyn SettingsStore, enabled: bool) -> AppResult<()> {
        store.write_u32(REG_DEFAULT_TILING, u32::from(enabled))?;
        self.default_tiling = enabled;
        Ok(())
    }

    pub fn set_status_bar(&mut self, store: &dyn SettingsStore, visible: bool) -> AppResult<()> {
        store.write_u32(REG_STATUS_BAR, u32::from(visible))?;
        self.status_bar = visible;
        Ok(())
    }
}

pub fn auto_start_enabled(store: &dyn SettingsStore) -> bool {
    store.run_entry_exists()
}

pub fn set_auto_start(
    store: &dyn SettingsStore,
    enabled: bool,
    command_line: &str,
) -> AppResult<()> {
    if enabled {
        store.write_run_entry(command_line)
    } else if store.run_entry_exists() {
        store.delete_run_entry()
    } else {
        Ok(())
    }
}

fn read_value(store: &dyn SettingsStore, name: &str) -> Option<u32> {
    match store.read_u32(name) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("Settings: Falling back to default for '{name}'.");
            err.log_at(log::Level::Warn);
            None
        }
    }
}

fn read_flag(store: &dyn SettingsStore, name: &str) -> Option<bool> {
    read_value(store, name).map(|value| value != 0)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::SettingsStore;
    use crate::error::{AppError, AppResult};
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeMap;

    /// In-memory stand-in for the registry layout.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        pub values: RefCell<BTreeMap<String, u32>>,
        pub app_key: Cell<bool>,
        pub vendor_key: Cell<bool>,
        /// Content in the vendor key that belongs to something else.
        pub vendor_has_other_content: Cell<bool>,
        pub run_entry: RefCell<Option<String>>,
        pub fail_writes: Cell<bool>,
    }

    impl SettingsStore for MemoryStore {
        fn read_u32(&self, name: &str) -> AppResult<Option<u32>> {
            Ok(self.values.borrow().get(name).copied())
        }

        fn write_u32(&self, name: &str, value: u32) -> AppResult<()> {
            if self.fail_writes.get() {
                return Err(AppError::registry(
                    format!("write {name}"),
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                ));
            }
            self.vendor_key.set(true);
            self.app_key.set(true);
            self.values.borrow_mut().insert(name.to_string(), value);
            Ok(())
        }

        fn app_key_exists(&self) -> bool {
            self.app_key.get()
        }

        fn delete_app_key(&self) -> AppResult<()> {
            self.app_key.set(false);
            self.values.borrow_mut().clear();
            Ok(())
        }

        fn prune_vendor_key(&self) -> AppResult<()> {
            if !self.app_key.get() && !self.vendor_has_other_content.get() {
                self.vendor_key.set(false);
            }
            Ok(())
        }

        fn run_entry_exists(&self) -> bool {
            self.run_entry.borrow().is_some()
        }

        fn write_run_entry(&self, command_line: &str) -> AppResult<()> {
            self.run_entry.replace(Some(command_line.to_string()));
            Ok(())
        }

        fn delete_run_entry(&self) -> AppResult<()> {
            self.run_entry.replace(None);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MemoryStore;
    use super::*;

    #[test]
    fn empty_store_yields_defaults() {
        // Arrange
        let store = MemoryStore::default();

        // Act
        let settings = Settings::load(&store);

        // Assert
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.left_click_action, CommandId::CascadeWindows);
        assert!(!auto_start_enabled(&store));
    }

    #[test]
    fn stored_values_are_loaded() {
        // Arrange
        let store = MemoryStore::default();
        store.write_u32(REG_LEFT_CLICK_ACTION, 32774).unwrap();
        store.write_u32(REG_LOGGING, 1).unwrap();
        store.write_u32(REG_DEFAULT_TILING, 1).unwrap();
        store.write_u32(REG_STATUS_BAR, 0).unwrap();

        // Act
        let settings = Settings::load(&store);

        // Assert
        assert_eq!(settings.left_click_action, CommandId::ShowTheDesktop);
        assert!(settings.logging);
        assert!(settings.default_tiling);
        assert!(!settings.status_bar);
    }

    #[test]
    fn non_action_command_falls_back_to_cascade() {
        // Arrange
        let store = MemoryStore::default();
        store
            .write_u32(REG_LEFT_CLICK_ACTION, u32::from(CommandId::Exit.raw()))
            .unwrap();

        // Act
        let settings = Settings::load(&store);

        // Assert
        assert_eq!(settings.left_click_action, CommandId::CascadeWindows);
    }

    #[test]
    fn failed_write_keeps_previous_value() {
        // Arrange
        let store = MemoryStore::default();
        let mut settings = Settings::default();
        store.fail_writes.set(true);

        // Act
        let result = settings.set_status_bar(&store, true);

        // Assert
        assert!(result.is_err());
        assert!(!settings.status_bar);
    }

    #[test]
    fn auto_start_toggles_run_entry() {
        // Arrange
        let store = MemoryStore::default();

        // Act
        set_auto_start(&store, true, "\"C:\\Tools\\tilecascade.exe\"").unwrap();
        let enabled = auto_start_enabled(&store);
        set_auto_start(&store, false, "").unwrap();

        // Assert
        assert!(enabled);
        assert!(!auto_start_enabled(&store));
    }
}
