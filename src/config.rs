/*
 * Compile-time configuration: names, registry layout and viewer limits.
 * Runtime settings live in the registry and are loaded through
 * `settings::Settings`; this module only fixes where and under which names.
 */
use std::path::PathBuf;

pub const APP_NAME: &str = "Tile Cascade";
pub const LOG_VIEWER_TITLE: &str = "Tile Cascade Log Viewer";
pub const GOTO_DIALOG_TITLE: &str = "Go To Line";

pub const TRAY_WINDOW_CLASS: &str = "TileCascadeTrayWndClass";
pub const LOG_VIEWER_CLASS: &str = "TileCascadeLogViewer";
pub const GOTO_DIALOG_CLASS: &str = "TileCascadeGotoLine";

/// Named mutex guarding against a second interactive instance.
pub const SINGLE_INSTANCE_MUTEX: &str = "Local\\{4A1E2C7B-93D5-4F0E-B2A8-6C1D9E7F3B50}";

pub const LOG_FILE_NAME: &str = "TileCascade.log";

// Per-user registry layout (relative to HKEY_CURRENT_USER).
pub const REG_VENDOR_KEY: &str = "Software\\TileCascadeProject";
pub const REG_APP_KEY: &str = "Software\\TileCascadeProject\\TileCascade";
pub const REG_RUN_KEY: &str = "Software\\Microsoft\\Windows\\CurrentVersion\\Run";
pub const REG_RUN_VALUE: &str = "TileCascade";

pub const REG_LEFT_CLICK_ACTION: &str = "LeftClickAction";
pub const REG_LOGGING: &str = "Logging";
pub const REG_DEFAULT_TILING: &str = "DefWndTile";
pub const REG_STATUS_BAR: &str = "StatusBar";

// Rich edit zoom is a numerator over a denominator; the numerator moves in
// fixed steps between these bounds.
pub const ZOOM_STEP: i32 = 10;
pub const ZOOM_MIN_NUMERATOR: i32 = 10;
pub const ZOOM_MAX_NUMERATOR: i32 = 500;

pub const STATUS_BAR_PARTS: usize = 4;

/// Capacity of the find dialog's search text buffer, in UTF-16 units.
pub const FIND_BUFFER_LEN: usize = 160;

pub const TRAY_ICON_ID: u32 = 1;

/*
 * Resolves `<LocalAppData>/TileCascade.log`. `None` when the profile folder
 * cannot be determined, in which case file logging is unavailable.
 */
pub fn log_file_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join(LOG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_key_nests_under_vendor_key() {
        assert!(REG_APP_KEY.starts_with(REG_VENDOR_KEY));
        assert_eq!(&REG_APP_KEY[REG_VENDOR_KEY.len()..REG_VENDOR_KEY.len() + 1], "\\");
    }

    #[test]
    fn zoom_bounds_are_multiples_of_the_step() {
        assert_eq!(ZOOM_MIN_NUMERATOR % ZOOM_STEP, 0);
        assert_eq!(ZOOM_MAX_NUMERATOR % ZOOM_STEP, 0);
        assert!(ZOOM_MIN_NUMERATOR < ZOOM_MAX_NUMERATOR);
    }

    #[test]
    fn log_file_path_ends_with_log_name_when_available() {
        if let Some(path) = log_file_path() {
            assert_eq!(
                path.file_name().and_then(|n| n.to_str()),
                Some(LOG_FILE_NAME)
            );
        }
    }
}
