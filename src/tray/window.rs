/*
 * The hidden top-level window behind the notification-area icon. It owns
 * the icon, the context menu and the log viewer, and it is the window whose
 * destruction ends the message loop.
 *
 * Left-click and key-select notifications are turned into the same command
 * path as menu selections. Submenus are refreshed by tag on
 * WM_INITMENUPOPUP, so their layout can change without touching the
 * handlers.
 */
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

use windows::Win32::Foundation::{HWND, LPARAM, POINT, WPARAM};
use windows::Win32::UI::Controls::{
    ICC_BAR_CLASSES, ICC_STANDARD_CLASSES, INITCOMMONCONTROLSEX, InitCommonControlsEx,
};
use windows::Win32::UI::HiDpi::{
    DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2, SetProcessDpiAwarenessContext,
};
use windows::Win32::UI::Shell::{
    NIF_ICON, NIF_MESSAGE, NIF_SHOWTIP, NIF_TIP, NIM_ADD, NIM_DELETE, NIM_MODIFY, NIM_SETVERSION,
    NIN_SELECT, NINF_KEY, NOTIFY_ICON_MESSAGE, NOTIFYICON_VERSION_4, NOTIFYICONDATAW,
    NOTIFYICONDATAW_0, Shell_NotifyIconW,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CascadeWindows, CheckMenuRadioItem, GetCursorPos, HMENU, IDI_APPLICATION, LoadIconW,
    MB_ICONINFORMATION, MB_OK, MDITILE_HORIZONTAL, MDITILE_VERTICAL, MDITILE_ZORDER, MF_BYCOMMAND,
    MSG, PostMessageW, RegisterWindowMessageW, SetForegroundWindow, TPM_BOTTOMALIGN,
    TileWindows, TrackPopupMenu, WM_APP, WM_CLOSE, WM_COMMAND, WM_CONTEXTMENU, WM_INITMENUPOPUP,
};
use windows::core::w;

use crate::config::{APP_NAME, TRAY_ICON_ID, TRAY_WINDOW_CLASS};
use crate::error::{AppError, AppResult, CallContext};
use crate::lifecycle::{
    BaseWindow, CreateParams, WindowClass, WindowConfig, WindowKind, WindowProcedure,
    route_default,
};
use crate::log_viewer::LogViewerWindow;
use crate::logging::Logging;
use crate::menu::tray_menu;
use crate::settings::{self, Settings, SettingsStore};
use crate::shell;
use crate::types::{CommandId, MenuTag, WindowHandle, WindowMessage};
use crate::window_common::{
    OwnedMenu, Win32Windowing, build_popup_menu, check_menu_item, enable_menu_item, hiword,
    loword, menu_tag, message_box, signed_hiword, signed_loword, to_hwnd,
};

use super::actions::ActionTable;
use super::icon::{self, IconNotifier};
use super::window_filter::enumerate_tileable;

/// Callback message the shell posts for icon events.
pub const TRAY_CALLBACK_MESSAGE: u32 = WM_APP + 1;

const NIN_KEYSELECT: u32 = NIN_SELECT | NINF_KEY;

/// Everything the tray controller shares with the rest of the process.
pub struct TrayServices {
    pub store: Rc<dyn SettingsStore>,
    pub settings: Rc<RefCell<Settings>>,
    pub logging: Rc<Logging>,
    /// Quoted executable path written to the auto-start entry.
    pub run_command_line: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arrangement {
    Cascade,
    Stacked,
    SideBySide,
}

pub struct TrayWindow {
    base: BaseWindow,
    services: TrayServices,
    actions: ActionTable,
    viewer: Rc<LogViewerWindow>,
    menu: RefCell<Option<OwnedMenu>>,
    icon_added: Cell<bool>,
    taskbar_created: Cell<u32>,
}

impl TrayWindow {
    pub fn new(platform: Rc<Win32Windowing>, services: TrayServices) -> Rc<Self> {
        let viewer = LogViewerWindow::new(
            Rc::clone(&platform),
            Rc::clone(&services.store),
            Rc::clone(&services.settings),
        );
        Rc::new(TrayWindow {
            base: BaseWindow::new(platform, true),
            services,
            actions: ActionTable::from_menu(&tray_menu()),
            viewer,
            menu: RefCell::new(None),
            icon_added: Cell::new(false),
            taskbar_created: Cell::new(0),
        })
    }

    /// Lets the log viewer claim dialog and accelerator keystrokes.
    pub fn pre_translate(&self, msg: &MSG) -> bool {
        self.viewer.pre_translate(msg)
    }

    fn store(&self) -> &dyn SettingsStore {
        self.services.store.as_ref()
    }

    fn icon_data(&self, hwnd: HWND) -> AppResult<NOTIFYICONDATAW> {
        let left_click = self.services.settings.borrow().left_click_action;
        let tooltip = self.actions.tooltip_for(left_click);
        let mut tip = [0u16; 128];
        for (slot, unit) in tip.iter_mut().zip(tooltip.encode_utf16()) {
            *slot = unit;
        }

        Ok(NOTIFYICONDATAW {
            cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: hwnd,
            uID: TRAY_ICON_ID,
            uFlags: NIF_ICON | NIF_MESSAGE | NIF_TIP | NIF_SHOWTIP,
            uCallbackMessage: TRAY_CALLBACK_MESSAGE,
            hIcon: unsafe { LoadIconW(None, IDI_APPLICATION) }.call_context("LoadIconW")?,
            szTip: tip,
            Anonymous: NOTIFYICONDATAW_0 {
                uVersion: NOTIFYICON_VERSION_4,
            },
            ..Default::default()
        })
    }

    fn notify(&self, action: NOTIFY_ICON_MESSAGE, data: &NOTIFYICONDATAW, call: &'static str) -> AppResult<()> {
        unsafe { Shell_NotifyIconW(action, data) }.call_context(call)
    }

    fn add_icon(&self, hwnd: HWND) -> AppResult<()> {
        let data = self.icon_data(hwnd)?;
        self.notify(NIM_ADD, &data, "Shell_NotifyIconW(NIM_ADD)")?;
        self.icon_added.set(true);
        self.notify(NIM_SETVERSION, &data, "Shell_NotifyIconW(NIM_SETVERSION)")
    }

    fn refresh_tooltip(&self, hwnd: HWND) -> AppResult<()> {
        let data = self.icon_data(hwnd)?;
        self.notify(NIM_MODIFY, &data, "Shell_NotifyIconW(NIM_MODIFY)")
    }

    fn remove_icon(&self, hwnd: HWND) {
        if !self.icon_added.replace(false) {
            return;
        }
        let data = NOTIFYICONDATAW {
            cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: hwnd,
            uID: TRAY_ICON_ID,
            ..Default::default()
        };
        if let Err(err) = self.notify(NIM_DELETE, &data, "Shell_NotifyIconW(NIM_DELETE)") {
            err.log_at(log::Level::Error);
        }
    }

    fn on_tray_notification(&self, msg: &WindowMessage) -> AppResult<()> {
        let event = u32::from(loword(msg.lparam as usize));
        match event {
            NIN_SELECT | NIN_KEYSELECT => {
                let action = self.services.settings.borrow().left_click_action;
                self.on_command(msg.handle, action)?;
            }
            WM_CONTEXTMENU => {
                self.show_context_menu(
                    msg.handle,
                    signed_loword(msg.wparam),
                    signed_hiword(msg.wparam),
                )?;
            }
            _ => {}
        }
        Ok(())
    }

    fn show_context_menu(&self, handle: WindowHandle, x: i32, y: i32) -> AppResult<()> {
        let menu = self.menu.borrow();
        let Some(menu) = menu.as_ref() else {
            return Err(AppError::app("No menu entry found for the tray icon"));
        };

        let (x, y) = if x == 0 && y == 0 {
            let mut cursor = POINT::default();
            unsafe { GetCursorPos(&mut cursor) }.call_context("GetCursorPos")?;
            (cursor.x, cursor.y)
        } else {
            (x, y)
        };

        let hwnd = to_hwnd(handle);
        unsafe { SetForegroundWindow(hwnd) }.call_context("SetForegroundWindow")?;
        unsafe { TrackPopupMenu(menu.raw(), TPM_BOTTOMALIGN, x, y, None, hwnd, None) }
            .call_context("TrackPopupMenu")
    }

    /// Returns `false` for ids this window does not own.
    fn on_command(&self, handle: WindowHandle, id: CommandId) -> AppResult<bool> {
        log::debug!("Tray: Command {id:?}.");
        let hwnd = to_hwnd(handle);
        match id {
            CommandId::CascadeWindows => self.arrange(Arrangement::Cascade)?,
            CommandId::ShowWindowsStacked => self.arrange(Arrangement::Stacked)?,
            CommandId::ShowWindowsSideBySide => self.arrange(Arrangement::SideBySide)?,
            CommandId::ShowTheDesktop => shell::minimize_all()?,
            CommandId::UndoMinimize => shell::undo_minimize_all()?,

            CommandId::DefaultCascadeWindows
            | CommandId::DefaultShowWindowsStacked
            | CommandId::DefaultShowWindowsSideBySide
            | CommandId::DefaultShowTheDesktop
            | CommandId::DefaultUndoMinimize => self.change_left_click(hwnd, id)?,

            CommandId::SettingsAutoStart => {
                let enable = !settings::auto_start_enabled(self.store());
                settings::set_auto_start(self.store(), enable, &self.services.run_command_line)?;
                log::info!("Tray: Auto-start {}.", if enable { "enabled" } else { "disabled" });
            }
            CommandId::SettingsLogging => self.toggle_logging(handle)?,
            CommandId::SettingsDefaultTiling => {
                let mut settings = self.services.settings.borrow_mut();
                let enable = !settings.default_tiling;
                settings.set_default_tiling(self.store(), enable)?;
            }
            CommandId::SettingsOpenLogFile => self.open_log_file(handle)?,

            CommandId::Exit => unsafe { PostMessageW(Some(hwnd), WM_CLOSE, WPARAM(0), LPARAM(0)) }
                .call_context("PostMessageW")?,

            _ => return Ok(false),
        }
        Ok(true)
    }

    fn arrange(&self, arrangement: Arrangement) -> AppResult<()> {
        let selected = if self.services.settings.borrow().default_tiling {
            Vec::new()
        } else {
            enumerate_tileable()?
        };
        let kids = (!selected.is_empty()).then_some(selected.as_slice());

        let arranged = unsafe {
            match arrangement {
                Arrangement::Cascade => CascadeWindows(None, MDITILE_ZORDER, None, kids),
                Arrangement::Stacked => TileWindows(None, MDITILE_HORIZONTAL, None, kids),
                Arrangement::SideBySide => TileWindows(None, MDITILE_VERTICAL, None, kids),
            }
        };
        if arranged == 0 {
            return Err(AppError::last_win32(match arrangement {
                Arrangement::Cascade => "CascadeWindows",
                _ => "TileWindows",
            }));
        }
        log::debug!("Tray: {arrangement:?} arranged {arranged} window(s).");
        Ok(())
    }

    fn change_left_click(&self, hwnd: HWND, default_item: CommandId) -> AppResult<()> {
        let action = self
            .actions
            .action_for_default(default_item)
            .ok_or_else(|| AppError::app(format!("No menu entry found for {default_item:?}")))?;
        self.services
            .settings
            .borrow_mut()
            .set_left_click_action(self.store(), action)?;
        self.refresh_tooltip(hwnd)
    }

    fn toggle_logging(&self, handle: WindowHandle) -> AppResult<()> {
        let enable = !self.services.settings.borrow().logging;
        self.services
            .settings
            .borrow_mut()
            .set_logging(self.store(), enable)?;

        let logging = &self.services.logging;
        if !enable {
            if logging.is_enabled() {
                logging.disable();
            }
            return Ok(());
        }

        if !logging.is_enabled() {
            logging.enable()?;
        }
        let location = logging
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        message_box(
            Some(handle),
            &format!("Logging enabled.\n\nLog files are stored at: {location}"),
            APP_NAME,
            MB_OK | MB_ICONINFORMATION,
        );
        Ok(())
    }

    fn open_log_file(&self, handle: WindowHandle) -> AppResult<()> {
        let path = self
            .services
            .logging
            .path()
            .ok_or_else(|| AppError::app("No log file location available"))?;

        if !path.is_file() {
            message_box(
                Some(handle),
                &format!("Log file <{}> does not exist yet.", path.display()),
                APP_NAME,
                MB_OK | MB_ICONINFORMATION,
            );
            return Ok(());
        }
        self.show_viewer(path)
    }

    fn show_viewer(&self, path: &Path) -> AppResult<()> {
        if self.viewer.base().is_created() {
            self.viewer.show_file(path)
        } else {
            self.viewer.open(path)
        }
    }

    fn on_init_menu_popup(&self, msg: &WindowMessage) -> bool {
        let is_system_menu = hiword(msg.lparam as usize) != 0;
        if is_system_menu {
            return false;
        }
        let menu = HMENU(msg.wparam as *mut _);
        match menu_tag(menu) {
            Some(MenuTag::TraySettings) => {
                self.refresh_settings_menu(menu);
                true
            }
            Some(MenuTag::TrayLeftClickDoes) => {
                if let Err(err) = self.refresh_left_click_menu(menu) {
                    err.log_at(log::Level::Error);
                }
                true
            }
            _ => false,
        }
    }

    fn refresh_settings_menu(&self, menu: HMENU) {
        let settings = *self.services.settings.borrow();
        check_menu_item(
            menu,
            CommandId::SettingsAutoStart.raw(),
            settings::auto_start_enabled(self.store()),
        );
        check_menu_item(
            menu,
            CommandId::SettingsDefaultTiling.raw(),
            settings.default_tiling,
        );
        check_menu_item(menu, CommandId::SettingsLogging.raw(), settings.logging);

        let log_exists = self
            .services
            .logging
            .path()
            .is_some_and(|path| path.is_file());
        enable_menu_item(menu, CommandId::SettingsOpenLogFile.raw(), log_exists);
    }

    fn refresh_left_click_menu(&self, menu: HMENU) -> AppResult<()> {
        let action = self.services.settings.borrow().left_click_action;
        let checked = self
            .actions
            .default_for_action(action)
            .ok_or_else(|| AppError::app(format!("No menu entry found for {action:?}")))?;
        let (first, last) = self.actions.radio_range();
        unsafe {
            CheckMenuRadioItem(
                menu,
                u32::from(first.raw()),
                u32::from(last.raw()),
                u32::from(checked.raw()),
                MF_BYCOMMAND.0,
            )
        }
        .call_context("CheckMenuRadioItem")
    }

    fn on_taskbar_created(&self, handle: WindowHandle) -> isize {
        let shell_icon = ShellIcon {
            tray: self,
            hwnd: to_hwnd(handle),
        };
        match icon::restore_icon(&shell_icon) {
            Ok(_) => 0,
            Err(err) => {
                err.log_at(log::Level::Error);
                -1
            }
        }
    }
}

/// The tray's icon as seen by `icon::restore_icon`.
struct ShellIcon<'a> {
    tray: &'a TrayWindow,
    hwnd: HWND,
}

impl IconNotifier for ShellIcon<'_> {
    fn modify_icon(&self) -> AppResult<()> {
        self.tray.refresh_tooltip(self.hwnd)
    }

    fn add_icon(&self) -> AppResult<()> {
        self.tray.add_icon(self.hwnd)
    }
}

fn log_failure(result: AppResult<()>) {
    if let Err(err) = result {
        err.log_at(log::Level::Error);
    }
}

/*
 * Process-wide setup done once, before the first window exists. A failed
 * DPI call only costs sharper rendering, so it is logged and ignored.
 */
fn prepare_process() {
    if let Err(err) = unsafe { SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) }
        .call_context("SetProcessDpiAwarenessContext")
    {
        err.log_at(log::Level::Warn);
    }

    let controls = INITCOMMONCONTROLSEX {
        dwSize: std::mem::size_of::<INITCOMMONCONTROLSEX>() as u32,
        dwICC: ICC_STANDARD_CLASSES | ICC_BAR_CLASSES,
    };
    if let Err(err) = unsafe { InitCommonControlsEx(&controls) }.call_context("InitCommonControlsEx") {
        err.log_at(log::Level::Warn);
    }
}

impl WindowProcedure for TrayWindow {
    fn base(&self) -> &BaseWindow {
        &self.base
    }

    fn before_create(&self, ran_prior: bool) -> AppResult<WindowConfig> {
        if ran_prior {
            if let Some(handle) = self.base.handle() {
                self.base.set_quit_on_destroy(false);
                self.on_close(handle);
                self.base.set_quit_on_destroy(true);
            }
            self.menu.replace(None);
            self.icon_added.set(false);
        } else {
            prepare_process();
        }

        *self.services.settings.borrow_mut() = Settings::load(self.store());
        self.taskbar_created
            .set(unsafe { RegisterWindowMessageW(w!("TaskbarCreated")) });

        Ok(WindowConfig {
            class: WindowClass::new(TRAY_WINDOW_CLASS),
            params: CreateParams::new(APP_NAME, WindowKind::Hidden),
        })
    }

    fn after_create(&self, _ran_prior: bool) -> AppResult<()> {
        let handle = self
            .base
            .handle()
            .ok_or_else(|| AppError::app("Tray window has no handle after creation"))?;
        self.add_icon(to_hwnd(handle))?;
        self.menu.replace(Some(build_popup_menu(&tray_menu())?));

        log::info!("Tray: {APP_NAME} starting.");
        Ok(())
    }

    fn route_message(&self, msg: &WindowMessage) -> isize {
        match msg.id {
            TRAY_CALLBACK_MESSAGE => {
                log_failure(self.on_tray_notification(msg));
                0
            }
            WM_COMMAND => {
                let handled = CommandId::from_raw(u32::from(loword(msg.wparam)))
                    .map(|id| self.on_command(msg.handle, id));
                match handled {
                    Some(Ok(true)) => 0,
                    Some(Err(err)) => {
                        err.log_at(log::Level::Error);
                        0
                    }
                    _ => route_default(self, msg),
                }
            }
            WM_INITMENUPOPUP => {
                if self.on_init_menu_popup(msg) {
                    0
                } else {
                    route_default(self, msg)
                }
            }
            id if id != 0 && id == self.taskbar_created.get() => self.on_taskbar_created(msg.handle),
            _ => route_default(self, msg),
        }
    }

    fn on_close(&self, _handle: WindowHandle) {
        self.viewer.close();
        if let Err(err) = self.base.destroy() {
            err.log_at(log::Level::Error);
        }
    }

    fn on_destroy(&self) {
        if let Some(handle) = self.base.handle() {
            self.remove_icon(to_hwnd(handle));
        }
        if self.base.quit_on_destroy() {
            log::info!("Tray: {APP_NAME} ending.");
        }
        self.base.finish_destroy();
    }
}
