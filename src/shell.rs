/*
 * Shell integration: the "show the desktop" / "undo minimize" automation
 * calls and the process launcher used by the registration flow.
 */
use std::path::PathBuf;

use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::Security::{
    DuplicateTokenEx, SecurityImpersonation, TOKEN_ADJUST_DEFAULT, TOKEN_ADJUST_SESSIONID,
    TOKEN_ASSIGN_PRIMARY, TOKEN_DUPLICATE, TOKEN_QUERY, TokenPrimary,
};
use windows::Win32::System::Com::{
    CLSCTX_INPROC_SERVER, COINIT_APARTMENTTHREADED, COINIT_DISABLE_OLE1DDE, CoCreateInstance,
    CoInitializeEx, CoUninitialize,
};
use windows::Win32::System::Threading::{
    CREATE_PROCESS_LOGON_FLAGS, CreateProcessW, CreateProcessWithTokenW, OpenProcess,
    OpenProcessToken, PROCESS_CREATION_FLAGS, PROCESS_INFORMATION, PROCESS_QUERY_INFORMATION,
    STARTUPINFOW,
};
use windows::Win32::UI::Shell::{IShellDispatch, IsUserAnAdmin, Shell};
use windows::Win32::UI::WindowsAndMessaging::{GetShellWindow, GetWindowThreadProcessId};
use windows::core::{PCWSTR, PWSTR};

use crate::error::{AppError, AppResult, CallContext};
use crate::registration::ProcessLauncher;

/*
 * Keeps COM initialized on this thread for the guard's lifetime. A thread
 * already initialized in another mode still gets a usable apartment, so
 * only a successful initialization is balanced on drop.
 */
pub(crate) struct ComApartment {
    initialized: bool,
}

impl ComApartment {
    pub(crate) fn enter() -> Self {
        let hr = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED | COINIT_DISABLE_OLE1DDE) };
        if hr.is_err() {
            log::debug!("Shell: CoInitializeEx returned {hr:?}; using existing apartment.");
        }
        ComApartment {
            initialized: hr.is_ok(),
        }
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        if self.initialized {
            unsafe { CoUninitialize() };
        }
    }
}

fn with_shell_dispatch<F>(call: &'static str, action: F) -> AppResult<()>
where
    F: FnOnce(&IShellDispatch) -> windows::core::Result<()>,
{
    let _apartment = ComApartment::enter();
    let shell: IShellDispatch =
        unsafe { CoCreateInstance(&Shell, None, CLSCTX_INPROC_SERVER) }.call_context("CoCreateInstance")?;
    action(&shell).call_context(call)
}

pub fn minimize_all() -> AppResult<()> {
    with_shell_dispatch("IShellDispatch::MinimizeAll", |shell| unsafe { shell.MinimizeAll() })
}

pub fn undo_minimize_all() -> AppResult<()> {
    with_shell_dispatch("IShellDispatch::UndoMinimizeALL", |shell| unsafe {
        shell.UndoMinimizeALL()
    })
}

pub(crate) struct OwnedHandle(pub(crate) HANDLE);

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        if !self.0.is_invalid() {
            let _ = unsafe { CloseHandle(self.0) };
        }
    }
}

/// Closes the process and thread handles, returning the new process id.
fn finish_launch(info: PROCESS_INFORMATION) -> u32 {
    drop(OwnedHandle(info.hProcess));
    drop(OwnedHandle(info.hThread));
    info.dwProcessId
}

fn wide_command_line(text: &str) -> Vec<u16> {
    text.encode_utf16().chain(std::iter::once(0)).collect()
}

/*
 * Starts processes as the interactive user. From an elevated process the
 * desktop shell's token is duplicated and used, so the child runs with the
 * logged-in user's normal rights and registry hive.
 */
pub struct ShellTokenLauncher {
    exe: PathBuf,
}

impl ShellTokenLauncher {
    pub fn for_current_exe() -> AppResult<Self> {
        Ok(ShellTokenLauncher {
            exe: std::env::current_exe()?,
        })
    }

    /// Quoted executable path, as stored in the auto-start entry.
    pub fn run_command_line(&self) -> String {
        format!("\"{}\"", self.exe.display())
    }

    fn shell_primary_token() -> AppResult<OwnedHandle> {
        let shell_window = unsafe { GetShellWindow() };
        if shell_window.is_invalid() {
            return Err(AppError::app("No shell window found; is the desktop running?"));
        }

        let mut shell_pid = 0u32;
        unsafe { GetWindowThreadProcessId(shell_window, Some(&mut shell_pid as *mut u32)) };
        if shell_pid == 0 {
            return Err(AppError::last_win32("GetWindowThreadProcessId"));
        }

        let process = OwnedHandle(
            unsafe { OpenProcess(PROCESS_QUERY_INFORMATION, false, shell_pid) }
                .call_context("OpenProcess")?,
        );

        let mut shell_token = HANDLE::default();
        unsafe { OpenProcessToken(process.0, TOKEN_DUPLICATE, &mut shell_token) }
            .call_context("OpenProcessToken")?;
        let shell_token = OwnedHandle(shell_token);

        let mut primary = HANDLE::default();
        unsafe {
            DuplicateTokenEx(
                shell_token.0,
                TOKEN_QUERY
                    | TOKEN_ASSIGN_PRIMARY
                    | TOKEN_DUPLICATE
                    | TOKEN_ADJUST_DEFAULT
                    | TOKEN_ADJUST_SESSIONID,
                None,
                SecurityImpersonation,
                TokenPrimary,
                &mut primary,
            )
        }
        .call_context("DuplicateTokenEx")?;
        Ok(OwnedHandle(primary))
    }

    fn create_process(&self, command_line: &str) -> AppResult<u32> {
        let mut command = wide_command_line(command_line);
        let startup = STARTUPINFOW {
            cb: std::mem::size_of::<STARTUPINFOW>() as u32,
            ..Default::default()
        };
        let mut info = PROCESS_INFORMATION::default();

        unsafe {
            CreateProcessW(
                PCWSTR::null(),
                Some(PWSTR(command.as_mut_ptr())),
                None,
                None,
                false,
                PROCESS_CREATION_FLAGS(0),
                None,
                PCWSTR::null(),
                &startup,
                &mut info,
            )
        }
        .call_context("CreateProcessW")?;
        Ok(finish_launch(info))
    }
}

impl ProcessLauncher for ShellTokenLauncher {
    fn is_elevated(&self) -> bool {
        unsafe { IsUserAnAdmin() }.as_bool()
    }

    fn relaunch_as_shell_user(&self, argument: &str) -> AppResult<u32> {
        let command_line = format!("{} {argument}", self.run_command_line());
        if !self.is_elevated() {
            // Already the interactive user.
            return self.create_process(&command_line);
        }

        let token = Self::shell_primary_token()?;
        let mut command = wide_command_line(&command_line);
        let startup = STARTUPINFOW {
            cb: std::mem::size_of::<STARTUPINFOW>() as u32,
            ..Default::default()
        };
        let mut info = PROCESS_INFORMATION::default();

        unsafe {
            CreateProcessWithTokenW(
                token.0,
                CREATE_PROCESS_LOGON_FLAGS(0),
                PCWSTR::null(),
                Some(PWSTR(command.as_mut_ptr())),
                PROCESS_CREATION_FLAGS(0),
                None,
                PCWSTR::null(),
                &startup,
                &mut info,
            )
        }
        .call_context("CreateProcessWithTokenW")?;
        Ok(finish_launch(info))
    }

    fn launch_interactive(&self) -> AppResult<u32> {
        self.create_process(&self.run_command_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_command_line_is_nul_terminated() {
        let wide = wide_command_line("\"a b.exe\" /X");
        assert_eq!(wide.last(), Some(&0));
        assert_eq!(String::from_utf16_lossy(&wide[..wide.len() - 1]), "\"a b.exe\" /X");
    }

    #[test]
    fn run_command_line_quotes_executable_path() {
        let launcher = ShellTokenLauncher {
            exe: PathBuf::from(r"C:\Program Files\Tile Cascade\tilecascade.exe"),
        };
        assert_eq!(
            launcher.run_command_line(),
            "\"C:\\Program Files\\Tile Cascade\\tilecascade.exe\""
        );
    }
}
