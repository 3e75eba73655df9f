/*
 * Command-line registration flow driven by the installer.
 *
 * `/REGISTER` and `/UNREGISTER` may arrive in an elevated process, so they
 * only relaunch the executable as the logged-in shell user with the
 * matching `...USER` argument. That relaunched process performs the actual
 * per-user registry mutation.
 */
use crate::config::REG_VENDOR_KEY;
use crate::error::AppResult;
use crate::settings::{Settings, SettingsStore, set_auto_start};
use crate::types::CommandId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// No argument: start the interactive tray application.
    Run,
    Register,
    Unregister,
    RegisterUser,
    UnregisterUser,
    Unrecognized(String),
}

impl CliCommand {
    /// Parses the arguments after the program name; only the first counts.
    pub fn parse<I, S>(args: I) -> CliCommand
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(first) = args.into_iter().next() else {
            return CliCommand::Run;
        };
        let first = first.as_ref();
        match first.to_ascii_uppercase().as_str() {
            "/REGISTER" => CliCommand::Register,
            "/UNREGISTER" => CliCommand::Unregister,
            "/REGISTERUSER" => CliCommand::RegisterUser,
            "/UNREGISTERUSER" => CliCommand::UnregisterUser,
            _ => CliCommand::Unrecognized(first.to_string()),
        }
    }

    pub fn is_run(&self) -> bool {
        matches!(self, CliCommand::Run)
    }

    fn user_level_argument(&self) -> Option<&'static str> {
        match self {
            CliCommand::Register => Some("/REGISTERUSER"),
            CliCommand::Unregister => Some("/UNREGISTERUSER"),
            _ => None,
        }
    }
}

/*
 * Process creation used by the registration flow. The Win32 version lives
 * in `shell::ShellTokenLauncher`.
 */
pub trait ProcessLauncher {
    fn is_elevated(&self) -> bool;

    /// Starts this executable with `argument` under the desktop shell's token.
    fn relaunch_as_shell_user(&self, argument: &str) -> AppResult<u32>;

    /// Starts this executable with no arguments in the current user context.
    fn launch_interactive(&self) -> AppResult<u32>;
}

/*
 * Removes every trace of the application: its key, the vendor key when it
 * became empty, and the auto-start value. Returns false when any step
 * failed; the remaining steps still run.
 */
pub fn unregister(store: &dyn SettingsStore) -> bool {
    log::info!("Registration: Starting unregister function");
    let mut success = true;

    if store.app_key_exists() {
        log::info!("Registration: Application registry key exists, attempting delete");
        match store.delete_app_key() {
            Ok(()) => log::info!("Registration: Application registry key delete successful"),
            Err(err) => {
                err.log_at(log::Level::Error);
                success = false;
            }
        }
    } else {
        log::info!("Registration: Application registry key does not exist.");
    }

    if let Err(err) = store.prune_vendor_key() {
        log::warn!("Registration: Could not prune {REG_VENDOR_KEY}");
        err.log_at(log::Level::Warn);
    }

    if store.run_entry_exists() {
        log::info!("Registration: Auto run registry value exists, attempting delete");
        match store.delete_run_entry() {
            Ok(()) => log::info!("Registration: Auto run registry value delete successful"),
            Err(err) => {
                err.log_at(log::Level::Error);
                success = false;
            }
        }
    } else {
        log::info!("Registration: Auto run registry value does not exist.");
    }

    log::info!(
        "Registration: {}",
        if success { "unregistered" } else { "unregister failed" }
    );
    success
}

/// Writes the default settings and the auto-start entry.
pub fn register(store: &dyn SettingsStore, run_command_line: &str) -> AppResult<()> {
    log::info!("Registration: Starting register process.");
    let mut settings = Settings::default();

    settings.set_left_click_action(store, CommandId::CascadeWindows)?;
    log::info!("Registration: Added Left Click Action registry value.");

    settings.set_logging(store, false)?;
    log::info!("Registration: Added Logging registry value.");

    settings.set_default_tiling(store, false)?;
    log::info!("Registration: Added Default/Custom Window Tile/Cascade registry value.");

    set_auto_start(store, true, run_command_line)?;
    log::info!("Registration: Added Auto Run registry value.");
    Ok(())
}

/*
 * Runs a registration command and returns the process exit code. `Run`
 * is not a registration command and yields `None`.
 */
pub fn execute(
    command: &CliCommand,
    store: &dyn SettingsStore,
    launcher: &dyn ProcessLauncher,
    run_command_line: &str,
) -> Option<i32> {
    match command {
        CliCommand::Run => None,

        CliCommand::Register | CliCommand::Unregister => {
            let argument = command.user_level_argument().unwrap_or_default();
            log::info!(
                "Registration: Process running at {} level.",
                if launcher.is_elevated() { "elevated" } else { "regular" }
            );
            log::info!("Registration: Launching app as logged in user with <{argument}>");
            match launcher.relaunch_as_shell_user(argument) {
                Ok(pid) => {
                    log::info!("Registration: Launched app as standard user with ProcID <{pid}>");
                    Some(0)
                }
                Err(err) => {
                    err.log_at(log::Level::Error);
                    Some(1)
                }
            }
        }

        CliCommand::UnregisterUser => Some(if unregister(store) { 0 } else { 1 }),

        CliCommand::RegisterUser => {
            // Start from a clean slate; leftovers are logged, not fatal.
            unregister(store);

            let outcome = register(store, run_command_line).and_then(|()| {
                log::info!("Registration: Attempting to start interactive application.");
                launcher.launch_interactive()
            });
            match outcome {
                Ok(pid) => {
                    log::info!(
                        "Registration: Interactive application started with ProcID <{pid}>."
                    );
                    log::info!("Registration: registered");
                    Some(0)
                }
                Err(err) => {
                    err.log_at(log::Level::Error);
                    log::info!("Registration: register failed");
                    Some(1)
                }
            }
        }

        CliCommand::Unrecognized(argument) => {
            log::error!("Registration: <{argument}> unrecognized command line argument.");
            Some(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{REG_LEFT_CLICK_ACTION, REG_LOGGING};
    use crate::error::AppError;
    use crate::settings::testing::MemoryStore;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct FakeLauncher {
        relaunched_with: RefCell<Vec<String>>,
        interactive_launches: Cell<usize>,
        fail: Cell<bool>,
    }

    impl ProcessLauncher for FakeLauncher {
        fn is_elevated(&self) -> bool {
            true
        }

        fn relaunch_as_shell_user(&self, argument: &str) -> AppResult<u32> {
            if self.fail.get() {
                return Err(AppError::win32("CreateProcessWithTokenW", 5));
            }
            self.relaunched_with.borrow_mut().push(argument.to_string());
            Ok(4242)
        }

        fn launch_interactive(&self) -> AppResult<u32> {
            if self.fail.get() {
                return Err(AppError::win32("CreateProcessW", 2));
            }
            self.interactive_launches
                .set(self.interactive_launches.get() + 1);
            Ok(4243)
        }
    }

    const EXE: &str = "\"C:\\Program Files\\TileCascade\\tilecascade.exe\"";

    #[test]
    fn parse_is_case_insensitive_and_uses_first_argument() {
        assert_eq!(CliCommand::parse(Vec::<String>::new()), CliCommand::Run);
        assert_eq!(CliCommand::parse(["/register"]), CliCommand::Register);
        assert_eq!(
            CliCommand::parse(["/UnRegisterUser", "/register"]),
            CliCommand::UnregisterUser
        );
        assert_eq!(
            CliCommand::parse(["/install"]),
            CliCommand::Unrecognized("/install".to_string())
        );
    }

    #[test]
    fn register_then_unregister_leaves_no_residue() {
        // Arrange
        let store = MemoryStore::default();
        let launcher = FakeLauncher::default();

        // Act
        let registered = execute(&CliCommand::RegisterUser, &store, &launcher, EXE);
        let had_run_entry = store.run_entry_exists();
        let unregistered = execute(&CliCommand::UnregisterUser, &store, &launcher, EXE);

        // Assert
        assert_eq!(registered, Some(0));
        assert!(had_run_entry);
        assert_eq!(unregistered, Some(0));
        assert!(!store.app_key_exists());
        assert!(!store.vendor_key.get());
        assert!(store.values.borrow().is_empty());
        assert!(!store.run_entry_exists());
    }

    #[test]
    fn register_user_writes_defaults_and_starts_interactive_app() {
        // Arrange
        let store = MemoryStore::default();
        store.values.borrow_mut().insert(REG_LOGGING.to_string(), 1);
        store.app_key.set(true);
        let launcher = FakeLauncher::default();

        // Act
        let code = execute(&CliCommand::RegisterUser, &store, &launcher, EXE);

        // Assert
        assert_eq!(code, Some(0));
        assert_eq!(
            store.values.borrow().get(REG_LEFT_CLICK_ACTION).copied(),
            Some(u32::from(CommandId::CascadeWindows.raw()))
        );
        assert_eq!(store.values.borrow().get(REG_LOGGING).copied(), Some(0));
        assert_eq!(store.run_entry.borrow().as_deref(), Some(EXE));
        assert_eq!(launcher.interactive_launches.get(), 1);
    }

    #[test]
    fn unregister_keeps_vendor_key_with_foreign_content() {
        // Arrange
        let store = MemoryStore::default();
        register(&store, EXE).unwrap();
        store.vendor_has_other_content.set(true);

        // Act
        let ok = unregister(&store);

        // Assert
        assert!(ok);
        assert!(store.vendor_key.get());
        assert!(!store.app_key_exists());
    }

    #[test]
    fn elevated_commands_relaunch_with_user_argument() {
        // Arrange
        let store = MemoryStore::default();
        let launcher = FakeLauncher::default();

        // Act
        let register = execute(&CliCommand::Register, &store, &launcher, EXE);
        let unregister = execute(&CliCommand::Unregister, &store, &launcher, EXE);

        // Assert
        assert_eq!(register, Some(0));
        assert_eq!(unregister, Some(0));
        assert_eq!(
            *launcher.relaunched_with.borrow(),
            vec!["/REGISTERUSER".to_string(), "/UNREGISTERUSER".to_string()]
        );
        assert!(!store.app_key_exists());
    }

    #[test]
    fn failures_and_unknown_arguments_exit_with_one() {
        // Arrange
        let store = MemoryStore::default();
        let launcher = FakeLauncher::default();
        launcher.fail.set(true);

        // Act / Assert
        assert_eq!(execute(&CliCommand::Register, &store, &launcher, EXE), Some(1));
        assert_eq!(
            execute(&CliCommand::RegisterUser, &store, &launcher, EXE),
            Some(1)
        );
        assert_eq!(
            execute(
                &CliCommand::Unrecognized("/x".into()),
                &store,
                &launcher,
                EXE
            ),
            Some(1)
        );
        assert_eq!(execute(&CliCommand::Run, &store, &launcher, EXE), None);
    }
}
