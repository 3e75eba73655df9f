/*
 * Error taxonomy shared by every part of the utility. Each variant records
 * where the failure was raised (captured with `#[track_caller]`) so a single
 * log line tells which call failed, from which source location, and why.
 *
 * Handlers never let an `AppError` escape into the OS message machinery:
 * they log it via `log_at` and continue, so the variants only need to carry
 * enough context to make that log line useful.
 */
use std::fmt;
use std::io;
use std::panic::Location;

use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

/*
 * Source location captured at the point an error is raised. Wrapping the
 * `Location` keeps the `Display` output short (`file:line`).
 */
#[derive(Clone, Copy)]
pub struct RaisedAt(&'static Location<'static>);

impl RaisedAt {
    #[track_caller]
    pub fn here() -> Self {
        RaisedAt(Location::caller())
    }

    pub fn file(&self) -> &'static str {
        self.0.file()
    }

    pub fn line(&self) -> u32 {
        self.0.line()
    }
}

impl fmt::Display for RaisedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0.file(), self.0.line())
    }
}

impl fmt::Debug for RaisedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{location}: Calling function <{call}>: Received error : <0X{code:08X}> {message}")]
    Win32 {
        call: &'static str,
        location: RaisedAt,
        code: u32,
        message: String,
    },

    #[error("{location}: Calling function <{call}>: Received error : <0X{hresult:08X}> {message}")]
    Com {
        call: &'static str,
        location: RaisedAt,
        hresult: u32,
        message: String,
    },

    #[error("{location}: {message}")]
    App { location: RaisedAt, message: String },

    #[error("Registry {operation} failed: {source}")]
    Registry {
        operation: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AppError {
    #[track_caller]
    pub fn app(message: impl Into<String>) -> Self {
        AppError::App {
            location: RaisedAt::here(),
            message: message.into(),
        }
    }

    #[track_caller]
    pub fn win32(call: &'static str, code: u32) -> Self {
        AppError::Win32 {
            call,
            location: RaisedAt::here(),
            code,
            message: describe_os_error(code),
        }
    }

    pub fn registry(operation: impl Into<String>, source: io::Error) -> Self {
        AppError::Registry {
            operation: operation.into(),
            source,
        }
    }

    pub fn log_at(&self, level: log::Level) {
        log::log!(level, "{self}");
    }
}

/*
 * Decodes an OS error code into the system message table text, trimmed of
 * the trailing line break the table includes.
 */
pub fn describe_os_error(code: u32) -> String {
    #[cfg(target_os = "windows")]
    let text = windows::core::HRESULT::from_win32(code).message();
    #[cfg(not(target_os = "windows"))]
    let text = io::Error::from_raw_os_error(code as i32).to_string();

    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        "Unknown Windows error".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(target_os = "windows")]
mod win32 {
    use super::{AppError, AppResult, RaisedAt, describe_os_error};
    use windows::Win32::Foundation::GetLastError;
    use windows::Win32::System::Com::GetErrorInfo;
    use windows::core::BOOL;

    const FACILITY_WIN32_MASK: u32 = 0xFFFF_0000;
    const FACILITY_WIN32_PREFIX: u32 = 0x8007_0000;

    impl AppError {
        /*
         * Captures `GetLastError` for a call that reported failure through its
         * return value rather than through a `windows::core::Result`.
         */
        #[track_caller]
        pub fn last_win32(call: &'static str) -> Self {
            let code = unsafe { GetLastError() };
            AppError::win32(call, code.0)
        }

        /*
         * Converts a `windows::core::Error`. HRESULTs wrapping a Win32 code are
         * reported as Win32 failures; anything else is a COM failure whose text
         * prefers the thread's `IErrorInfo` description.
         */
        #[track_caller]
        pub fn from_windows(call: &'static str, err: windows::core::Error) -> Self {
            let hresult = err.code().0 as u32;
            if hresult & FACILITY_WIN32_MASK == FACILITY_WIN32_PREFIX {
                return AppError::Win32 {
                    call,
                    location: RaisedAt::here(),
                    code: hresult & !FACILITY_WIN32_MASK,
                    message: describe_os_error(hresult & !FACILITY_WIN32_MASK),
                };
            }

            let message = com_error_description().unwrap_or_else(|| {
                let text = err.message();
                if text.trim().is_empty() {
                    "Unknown COM error".to_string()
                } else {
                    text.trim_end().to_string()
                }
            });

            AppError::Com {
                call,
                location: RaisedAt::here(),
                hresult,
                message,
            }
        }
    }

    fn com_error_description() -> Option<String> {
        let info = unsafe { GetErrorInfo(0) }.ok()?;
        let description = unsafe { info.GetDescription() }.ok()?.to_string();
        if description.trim().is_empty() {
            None
        } else {
            Some(description)
        }
    }

    /*
     * Attaches the failing call's name to a `windows` result, mirroring how
     * every OS call in this crate is checked.
     */
    pub trait CallContext<T> {
        fn call_context(self, call: &'static str) -> AppResult<T>;
    }

    impl<T> CallContext<T> for windows::core::Result<T> {
        #[track_caller]
        fn call_context(self, call: &'static str) -> AppResult<T> {
            match self {
                Ok(value) => Ok(value),
                Err(err) => Err(AppError::from_windows(call, err)),
            }
        }
    }

    impl CallContext<()> for BOOL {
        #[track_caller]
        fn call_context(self, call: &'static str) -> AppResult<()> {
            if self.as_bool() {
                Ok(())
            } else {
                Err(AppError::last_win32(call))
            }
        }
    }
}

#[cfg(target_os = "windows")]
pub(crate) use win32::CallContext;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_error_records_caller_location_and_message() {
        // Arrange
        let expected_line = line!() + 3;

        // Act
        let err = AppError::app("No menu entry found: 42");

        // Assert
        match &err {
            AppError::App { location, message } => {
                assert!(location.file().ends_with("error.rs"));
                assert_eq!(location.line(), expected_line);
                assert_eq!(message, "No menu entry found: 42");
            }
            other => panic!("unexpected variant {other:?}"),
        }
        assert!(err.to_string().ends_with(": No menu entry found: 42"));
    }

    #[test]
    fn win32_error_display_names_the_call_and_hex_code() {
        // Arrange / Act
        let err = AppError::win32("RegisterClassExW", 5);

        // Assert
        let text = err.to_string();
        assert!(text.contains("Calling function <RegisterClassExW>"));
        assert!(text.contains("<0X00000005>"));
    }

    #[test]
    fn registry_error_keeps_io_source() {
        // Arrange
        let source = io::Error::new(io::ErrorKind::PermissionDenied, "denied");

        // Act
        let err = AppError::registry("write LeftClickAction", source);

        // Assert
        assert_eq!(
            err.to_string(),
            "Registry write LeftClickAction failed: denied"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
