/*
 * Process entry point: settings and logging setup, the registration
 * commands, the single-instance guard, and the message loop that runs the
 * tray window until it posts WM_QUIT.
 */
use std::cell::RefCell;
use std::rc::Rc;

use windows::Win32::Foundation::{ERROR_ALREADY_EXISTS, GetLastError};
use windows::Win32::System::Threading::CreateMutexW;
use windows::Win32::UI::WindowsAndMessaging::{DispatchMessageW, GetMessageW, MSG, TranslateMessage};
use windows::core::HSTRING;

use crate::config::{self, SINGLE_INSTANCE_MUTEX};
use crate::error::{AppError, AppResult, CallContext};
use crate::lifecycle;
use crate::logging::{self, Logging};
use crate::registration::{self, CliCommand};
use crate::settings::{Settings, SettingsStore};
use crate::settings_registry::RegistryStore;
use crate::shell::{OwnedHandle, ShellTokenLauncher};
use crate::tray::{TrayServices, TrayWindow};
use crate::window_common::Win32Windowing;

/// Runs the application and returns the process exit code.
pub fn run() -> i32 {
    let store: Rc<dyn SettingsStore> = Rc::new(RegistryStore::current_user());
    let settings = Settings::load(store.as_ref());
    let logging = Rc::new(logging::init(config::log_file_path()));

    let command = CliCommand::parse(std::env::args().skip(1));
    if !command.is_run() {
        return run_registration(&command, store.as_ref(), &logging);
    }

    if settings.logging {
        if let Err(err) = logging.enable() {
            eprintln!("Logging could not be started: {err}");
            return 1;
        }
    }

    match run_tray(store, settings, logging) {
        Ok(code) => code,
        Err(err) => {
            err.log_at(log::Level::Error);
            1
        }
    }
}

fn run_registration(command: &CliCommand, store: &dyn SettingsStore, logging: &Logging) -> i32 {
    if let Err(err) = logging.enable() {
        eprintln!("Logging could not be started: {err}");
    }

    let launcher = match ShellTokenLauncher::for_current_exe() {
        Ok(launcher) => launcher,
        Err(err) => {
            err.log_at(log::Level::Error);
            return 1;
        }
    };
    let run_command_line = launcher.run_command_line();
    registration::execute(command, store, &launcher, &run_command_line).unwrap_or(1)
}

fn run_tray(store: Rc<dyn SettingsStore>, settings: Settings, logging: Rc<Logging>) -> AppResult<i32> {
    let Some(_instance) = acquire_single_instance()? else {
        log::info!("App: {} is already running.", config::APP_NAME);
        return Ok(1);
    };

    let run_command_line = ShellTokenLauncher::for_current_exe()?.run_command_line();
    let platform = Win32Windowing::new()?;
    let tray = TrayWindow::new(
        platform,
        TrayServices {
            store,
            settings: Rc::new(RefCell::new(settings)),
            logging,
            run_command_line,
        },
    );

    if !lifecycle::initialize(&tray) {
        return Err(AppError::app("Tray window could not be created"));
    }

    let code = message_loop(&tray)?;
    log::debug!("App: Message loop ended with code {code}.");
    Ok(code)
}

/*
 * Holds the named mutex for the life of the process. `None` when another
 * instance created it first.
 */
fn acquire_single_instance() -> AppResult<Option<OwnedHandle>> {
    let name = HSTRING::from(SINGLE_INSTANCE_MUTEX);
    let handle = unsafe { CreateMutexW(None, false, &name) }.call_context("CreateMutexW")?;
    let guard = OwnedHandle(handle);
    if unsafe { GetLastError() } == ERROR_ALREADY_EXISTS {
        return Ok(None);
    }
    Ok(Some(guard))
}

fn message_loop(tray: &TrayWindow) -> AppResult<i32> {
    let mut msg = MSG::default();
    loop {
        let status = unsafe { GetMessageW(&mut msg, None, 0, 0) };
        match status.0 {
            -1 => return Err(AppError::last_win32("GetMessageW")),
            0 => return Ok(msg.wParam.0 as i32),
            _ => {}
        }

        if tray.pre_translate(&msg) {
            continue;
        }
        unsafe {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}
