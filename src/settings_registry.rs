/*
 * Registry-backed `SettingsStore` under HKEY_CURRENT_USER.
 */
use std::io;

use winreg::RegKey;
use winreg::enums::{HKEY_CURRENT_USER, KEY_READ, KEY_WRITE};

use crate::config::{REG_APP_KEY, REG_RUN_KEY, REG_RUN_VALUE, REG_VENDOR_KEY};
use crate::error::{AppError, AppResult};
use crate::settings::SettingsStore;

pub struct RegistryStore {
    hkcu: RegKey,
}

impl RegistryStore {
    pub fn current_user() -> Self {
        RegistryStore {
            hkcu: RegKey::predef(HKEY_CURRENT_USER),
        }
    }

    fn open_run_key(&self, flags: u32) -> io::Result<RegKey> {
        self.hkcu.open_subkey_with_flags(REG_RUN_KEY, flags)
    }
}

fn is_not_found(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

impl SettingsStore for RegistryStore {
    fn read_u32(&self, name: &str) -> AppResult<Option<u32>> {
        let key = match self.hkcu.open_subkey(REG_APP_KEY) {
            Ok(key) => key,
            Err(err) if is_not_found(&err) => return Ok(None),
            Err(err) => return Err(AppError::registry(format!("open {REG_APP_KEY}"), err)),
        };
        match key.get_value::<u32, _>(name) {
            Ok(value) => Ok(Some(value)),
            Err(err) if is_not_found(&err) => Ok(None),
            Err(err) => Err(AppError::registry(format!("read {name}"), err)),
        }
    }

    fn write_u32(&self, name: &str, value: u32) -> AppResult<()> {
        let (key, _) = self
            .hkcu
            .create_subkey(REG_APP_KEY)
            .map_err(|e| AppError::registry(format!("create {REG_APP_KEY}"), e))?;
        key.set_value(name, &value)
            .map_err(|e| AppError::registry(format!("write {name}"), e))?;
        log::debug!("Registry: {name} = {value}");
        Ok(())
    }

    fn app_key_exists(&self) -> bool {
        self.hkcu.open_subkey(REG_APP_KEY).is_ok()
    }

    fn delete_app_key(&self) -> AppResult<()> {
        match self.hkcu.delete_subkey_all(REG_APP_KEY) {
            Ok(()) => {
                log::info!("Registry: Deleted {REG_APP_KEY}");
                Ok(())
            }
            Err(err) if is_not_found(&err) => Ok(()),
            Err(err) => Err(AppError::registry(format!("delete {REG_APP_KEY}"), err)),
        }
    }

    fn prune_vendor_key(&self) -> AppResult<()> {
        let vendor = match self.hkcu.open_subkey_with_flags(REG_VENDOR_KEY, KEY_READ) {
            Ok(key) => key,
            Err(err) if is_not_found(&err) => return Ok(()),
            Err(err) => return Err(AppError::registry(format!("open {REG_VENDOR_KEY}"), err)),
        };
        let info = vendor
            .query_info()
            .map_err(|e| AppError::registry(format!("query {REG_VENDOR_KEY}"), e))?;
        drop(vendor);

        if info.sub_keys == 0 && info.values == 0 {
            self.hkcu
                .delete_subkey(REG_VENDOR_KEY)
                .map_err(|e| AppError::registry(format!("delete {REG_VENDOR_KEY}"), e))?;
            log::info!("Registry: Deleted empty {REG_VENDOR_KEY}");
        }
        Ok(())
    }

    fn run_entry_exists(&self) -> bool {
        self.open_run_key(KEY_READ)
            .and_then(|key| key.get_raw_value(REG_RUN_VALUE))
            .is_ok()
    }

    fn write_run_entry(&self, command_line: &str) -> AppResult<()> {
        let key = self
            .open_run_key(KEY_WRITE)
            .map_err(|e| AppError::registry(format!("open {REG_RUN_KEY}"), e))?;
        key.set_value(REG_RUN_VALUE, &command_line)
            .map_err(|e| AppError::registry(format!("write {REG_RUN_VALUE}"), e))?;
        log::info!("Registry: Auto-start entry set to {command_line}");
        Ok(())
    }

    fn delete_run_entry(&self) -> AppResult<()> {
        let key = self
            .open_run_key(KEY_WRITE)
            .map_err(|e| AppError::registry(format!("open {REG_RUN_KEY}"), e))?;
        match key.delete_value(REG_RUN_VALUE) {
            Ok(()) => {
                log::info!("Registry: Auto-start entry removed");
                Ok(())
            }
            Err(err) if is_not_found(&err) => Ok(()),
            Err(err) => Err(AppError::registry(format!("delete {REG_RUN_VALUE}"), err)),
        }
    }
}
