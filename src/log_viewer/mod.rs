/*
 * Read-only viewer for the application's log file.
 *
 * The selection, find, go-to-line, zoom and status bar rules run against the
 * `TextDocument` seam and are platform independent. The rich edit control,
 * the go-to-line prompt and the viewer window itself are Win32 only.
 */
pub mod document;
pub mod find;
pub mod goto;
pub mod status;
pub mod zoom;

#[cfg(target_os = "windows")]
mod goto_dialog;
#[cfg(target_os = "windows")]
mod rich_edit;
#[cfg(target_os = "windows")]
mod window;

#[cfg(target_os = "windows")]
pub use window::LogViewerWindow;
