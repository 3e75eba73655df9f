/*
 * Notification-area controller: the action table, icon recovery and window
 * filter are portable; the window that owns the icon is Win32 only.
 */
pub mod actions;
pub mod icon;
pub mod window_filter;
#[cfg(target_os = "windows")]
mod window;

#[cfg(target_os = "windows")]
pub use window::{TRAY_CALLBACK_MESSAGE, TrayServices, TrayWindow};
