/*
 * Library side of the Tile Cascade tray utility: a notification-area icon
 * that tiles and cascades the windows a user sees in Alt+Tab, and a small
 * viewer for the application's own log file.
 *
 * The window lifecycle protocol, message dispatch registry, settings model,
 * registration flow and the viewer's text algorithms are platform-agnostic
 * and unit tested everywhere. Win32 windowing, the registry store, shell
 * automation and the process entry point are compiled on Windows only.
 */
#[cfg(target_os = "windows")]
pub mod app;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod log_viewer;
pub mod logging;
pub mod menu;
pub mod registration;
pub mod settings;
#[cfg(target_os = "windows")]
pub mod settings_registry;
#[cfg(target_os = "windows")]
pub(crate) mod shell;
pub mod tray;
pub mod types;
#[cfg(target_os = "windows")]
pub(crate) mod window_common;

pub use error::{AppError, AppResult};
pub use settings::{Settings, SettingsStore};
pub use types::{CommandId, WindowHandle, WindowMessage};
