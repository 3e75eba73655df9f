/*
 * The log viewer: a reusable top-level frame around a read-only rich edit
 * control, with a menu bar, an optional status bar and a modeless find
 * dialog. The window does not end the process when destroyed and can be
 * opened again later; teardown returns every field to its empty state.
 *
 * Keystrokes reach the find dialog and the accelerator table through
 * `pre_translate`, which the process message loop calls before dispatching.
 * Handlers never keep a `RefCell` borrow across a call that sends messages,
 * since the rich edit control notifies the viewer synchronously.
 */
use std::cell::{Cell, RefCell};
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::UI::Controls::Dialogs::{
    CommDlgExtendedError, FINDMSGSTRINGW, FINDREPLACE_FLAGS, FINDREPLACEW, FR_DIALOGTERM, FR_DOWN,
    FR_FINDNEXT, FR_MATCHCASE, FR_WHOLEWORD, FindTextW,
};
use windows::Win32::UI::Controls::RichEdit::EN_SELCHANGE;
use windows::Win32::UI::Controls::{NMHDR, SB_SETPARTS, SB_SETTEXTW, SBARS_SIZEGRIP, STATUSCLASSNAMEW};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SetActiveWindow, SetFocus, VK_ADD, VK_F3, VK_F5, VK_OEM_MINUS, VK_OEM_PLUS, VK_SUBTRACT,
};
use windows::Win32::UI::Shell::{DefSubclassProc, RemoveWindowSubclass, SetWindowSubclass};
use windows::Win32::UI::WindowsAndMessaging::{
    ACCEL, ACCEL_VIRT_FLAGS, CreateAcceleratorTableW, DestroyAcceleratorTable, DestroyWindow,
    FCONTROL, FSHIFT, FVIRTKEY, GA_ROOT, GetAncestor, GetClientRect, GetWindowRect, HACCEL, HMENU,
    IsDialogMessageW, IsIconic, MB_ICONWARNING, MB_OK, MSG, MoveWindow, RegisterWindowMessageW,
    SW_RESTORE, SW_SHOW, SendMessageW, SetForegroundWindow, SetMenu, ShowWindow,
    TranslateAcceleratorW, WINDOW_STYLE, WM_APP, WM_CLOSE, WM_COMMAND, WM_INITMENUPOPUP,
    WM_MOUSEWHEEL, WM_NCDESTROY, WM_NOTIFY, WM_SETFOCUS, WM_SIZE,
};
use windows::core::{HSTRING, PWSTR};

use super::document::{SearchFlags, apply_line_numbers};
use super::find::{FindRequest, FindState, find};
use super::goto::{self, GotoOutcome};
use super::goto_dialog::GotoDialog;
use super::rich_edit::{self, RICH_EDIT_CONTROL_ID, RichEditDocument};
use super::status::SelectionStatus;
use super::zoom::Zoom;
use crate::config::{FIND_BUFFER_LEN, LOG_VIEWER_CLASS, LOG_VIEWER_TITLE, STATUS_BAR_PARTS};
use crate::error::{AppError, AppResult, CallContext};
use crate::lifecycle::{
    self, BaseWindow, CreateParams, WindowClass, WindowConfig, WindowKind, WindowProcedure,
    route_default,
};
use crate::menu::viewer_menu_bar;
use crate::settings::{Settings, SettingsStore};
use crate::types::{CommandId, MenuTag, WindowHandle, WindowMessage};
use crate::window_common::{
    ChildRect, Win32Windowing, build_menu_bar, check_menu_item, create_child_control,
    enable_menu_item, hiword, loword, menu_tag, message_box, to_hwnd,
};

const VIEWER_WIDTH: i32 = 900;
const VIEWER_HEIGHT: i32 = 600;
const STATUS_BAR_ID: u16 = 101;
const EDIT_SUBCLASS_ID: usize = 1;
const MK_CONTROL: usize = 0x0008;

/// Posted by the edit subclass after a Ctrl+wheel zoom.
const REFRESH_STATUS_MESSAGE: u32 = WM_APP + 2;

struct Accelerators(HACCEL);

impl Accelerators {
    fn create() -> AppResult<Self> {
        let ctrl = FVIRTKEY | FCONTROL;
        let entries = [
            accel(ctrl, u16::from(b'C'), CommandId::EditCopy),
            accel(ctrl, u16::from(b'A'), CommandId::EditSelectAll),
            accel(ctrl, u16::from(b'F'), CommandId::EditFind),
            accel(FVIRTKEY, VK_F3.0, CommandId::EditFindNext),
            accel(FVIRTKEY | FSHIFT, VK_F3.0, CommandId::EditFindPrevious),
            accel(ctrl, u16::from(b'G'), CommandId::EditGoto),
            accel(ctrl, VK_OEM_PLUS.0, CommandId::ZoomIn),
            accel(ctrl, VK_ADD.0, CommandId::ZoomIn),
            accel(ctrl, VK_OEM_MINUS.0, CommandId::ZoomOut),
            accel(ctrl, VK_SUBTRACT.0, CommandId::ZoomOut),
            accel(FVIRTKEY, VK_F5.0, CommandId::ViewerReload),
        ];
        let table = unsafe { CreateAcceleratorTableW(&entries) }
            .call_context("CreateAcceleratorTableW")?;
        Ok(Accelerators(table))
    }

    fn raw(&self) -> HACCEL {
        self.0
    }
}

impl Drop for Accelerators {
    fn drop(&mut self) {
        let _ = unsafe { DestroyAcceleratorTable(self.0) };
    }
}

fn accel(flags: ACCEL_VIRT_FLAGS, key: u16, id: CommandId) -> ACCEL {
    ACCEL {
        fVirt: flags,
        key,
        cmd: id.raw(),
    }
}

/*
 * The modeless find dialog. The dialog reads and writes `data` and `text`
 * until it reports FR_DIALOGTERM, so both stay boxed at a fixed address for
 * as long as this value lives.
 */
struct FindDialog {
    hwnd: HWND,
    _data: Box<FINDREPLACEW>,
    _text: Box<[u16; FIND_BUFFER_LEN]>,
}

impl FindDialog {
    fn open(owner: HWND, seed: Option<&FindRequest>) -> AppResult<Self> {
        let mut text = Box::new([0u16; FIND_BUFFER_LEN]);
        let mut flags = FR_DOWN;
        if let Some(request) = seed {
            for (slot, unit) in text
                .iter_mut()
                .take(FIND_BUFFER_LEN - 1)
                .zip(request.text.encode_utf16())
            {
                *slot = unit;
            }
            flags = dialog_flags(request.flags);
        }

        let mut data = Box::new(FINDREPLACEW {
            lStructSize: std::mem::size_of::<FINDREPLACEW>() as u32,
            hwndOwner: owner,
            Flags: flags,
            lpstrFindWhat: PWSTR(text.as_mut_ptr()),
            wFindWhatLen: FIND_BUFFER_LEN as u16,
            ..Default::default()
        });

        let hwnd = unsafe { FindTextW(&mut *data) };
        if hwnd.is_invalid() {
            let code = unsafe { CommDlgExtendedError() };
            return Err(AppError::win32("FindTextW", code.0));
        }
        Ok(FindDialog {
            hwnd,
            _data: data,
            _text: text,
        })
    }
}

fn dialog_flags(flags: SearchFlags) -> FINDREPLACE_FLAGS {
    let mut out = FINDREPLACE_FLAGS(0);
    if flags.forward {
        out = out | FR_DOWN;
    }
    if flags.match_case {
        out = out | FR_MATCHCASE;
    }
    if flags.whole_word {
        out = out | FR_WHOLEWORD;
    }
    out
}

fn has_flag(flags: FINDREPLACE_FLAGS, flag: FINDREPLACE_FLAGS) -> bool {
    (flags & flag).0 != 0
}

fn request_from_dialog(data: &FINDREPLACEW) -> AppResult<FindRequest> {
    let text = unsafe { data.lpstrFindWhat.to_string() }
        .map_err(|err| AppError::app(format!("Find text is not valid UTF-16: {err}")))?;
    Ok(FindRequest {
        text,
        flags: SearchFlags {
            forward: has_flag(data.Flags, FR_DOWN),
            match_case: has_flag(data.Flags, FR_MATCHCASE),
            whole_word: has_flag(data.Flags, FR_WHOLEWORD),
        },
    })
}

/*
 * Rich edit zooms itself on Ctrl+wheel without notifying the parent. The
 * subclass lets the control act first, then asks the parent (`refdata`) to
 * refresh the status bar.
 */
unsafe extern "system" fn edit_subclass_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
    id: usize,
    refdata: usize,
) -> LRESULT {
    if msg == WM_NCDESTROY {
        let _ = unsafe { RemoveWindowSubclass(hwnd, Some(edit_subclass_proc), id) };
        return unsafe { DefSubclassProc(hwnd, msg, wparam, lparam) };
    }

    let result = unsafe { DefSubclassProc(hwnd, msg, wparam, lparam) };
    if msg == WM_MOUSEWHEEL && wparam.0 & MK_CONTROL != 0 {
        let parent = HWND(refdata as *mut c_void);
        let _ = unsafe { SendMessageW(parent, REFRESH_STATUS_MESSAGE, None, None) };
    }
    result
}

fn set_status_parts(bar: HWND, width: i32) {
    let part = width / STATUS_BAR_PARTS as i32;
    let mut edges = [0i32; STATUS_BAR_PARTS];
    for (index, edge) in edges.iter_mut().enumerate() {
        *edge = part * (index as i32 + 1);
    }
    // Last part runs to the right edge.
    edges[STATUS_BAR_PARTS - 1] = -1;
    unsafe {
        let _ = SendMessageW(
            bar,
            SB_SETPARTS,
            Some(WPARAM(STATUS_BAR_PARTS)),
            Some(LPARAM(edges.as_ptr() as isize)),
        );
    }
}

pub struct LogViewerWindow {
    base: BaseWindow,
    platform: Rc<Win32Windowing>,
    store: Rc<dyn SettingsStore>,
    settings: Rc<RefCell<Settings>>,
    path: RefCell<Option<PathBuf>>,
    document: Cell<Option<RichEditDocument>>,
    status_bar: Cell<Option<HWND>>,
    line_numbers: Cell<bool>,
    accelerators: RefCell<Option<Accelerators>>,
    find_dialog: RefCell<Option<FindDialog>>,
    find_state: RefCell<FindState>,
    find_message: Cell<u32>,
}

impl LogViewerWindow {
    pub fn new(
        platform: Rc<Win32Windowing>,
        store: Rc<dyn SettingsStore>,
        settings: Rc<RefCell<Settings>>,
    ) -> Rc<Self> {
        Rc::new(LogViewerWindow {
            base: BaseWindow::new(platform.clone(), false),
            platform,
            store,
            settings,
            path: RefCell::new(None),
            document: Cell::new(None),
            status_bar: Cell::new(None),
            line_numbers: Cell::new(false),
            accelerators: RefCell::new(None),
            find_dialog: RefCell::new(None),
            find_state: RefCell::new(FindState::default()),
            find_message: Cell::new(0),
        })
    }

    /// Creates the viewer window showing `path`.
    pub fn open(self: &Rc<Self>, path: &Path) -> AppResult<()> {
        self.path.replace(Some(path.to_path_buf()));
        if !lifecycle::initialize(self) {
            return Err(AppError::app(format!(
                "Log viewer could not be opened for {}",
                path.display()
            )));
        }
        Ok(())
    }

    /// Brings an open viewer forward with a fresh copy of `path`.
    pub fn show_file(&self, path: &Path) -> AppResult<()> {
        let handle = self
            .base
            .handle()
            .ok_or_else(|| AppError::app("Log viewer is not open"))?;
        let hwnd = to_hwnd(handle);

        self.path.replace(Some(path.to_path_buf()));
        if unsafe { IsIconic(hwnd) }.as_bool() {
            let _ = unsafe { ShowWindow(hwnd, SW_RESTORE) };
        }
        self.reload()?;
        let _ = unsafe { SetForegroundWindow(hwnd) };
        Ok(())
    }

    pub fn close(&self) {
        if let Some(handle) = self.base.handle() {
            unsafe {
                let _ = SendMessageW(to_hwnd(handle), WM_CLOSE, None, None);
            }
        }
    }

    /*
     * Gives the find dialog and then the accelerator table a chance at a
     * queued message. Returns `true` when the message was consumed.
     */
    pub fn pre_translate(&self, msg: &MSG) -> bool {
        let find_hwnd = self.find_dialog.borrow().as_ref().map(|dialog| dialog.hwnd);
        if let Some(dialog) = find_hwnd {
            if unsafe { IsDialogMessageW(dialog, msg) }.as_bool() {
                return true;
            }
        }

        let Some(handle) = self.base.handle() else {
            return false;
        };
        let hwnd = to_hwnd(handle);
        let table = self.accelerators.borrow().as_ref().map(Accelerators::raw);
        let Some(table) = table else {
            return false;
        };
        if msg.hwnd != hwnd && unsafe { GetAncestor(msg.hwnd, GA_ROOT) } != hwnd {
            return false;
        }
        unsafe { TranslateAcceleratorW(hwnd, table, msg) } != 0
    }

    fn reload(&self) -> AppResult<()> {
        let Some(doc) = self.document.get() else {
            return Ok(());
        };
        let path = self
            .path
            .borrow()
            .clone()
            .ok_or_else(|| AppError::app("Log viewer has no file to show"))?;

        doc.load_file(&path)?;
        if self.line_numbers.get() {
            apply_line_numbers(&doc, true)?;
        }
        self.update_status();
        Ok(())
    }

    fn create_status_bar(&self, hwnd: HWND) -> AppResult<()> {
        let bar = create_child_control(
            STATUSCLASSNAMEW,
            "",
            WINDOW_STYLE(SBARS_SIZEGRIP),
            ChildRect {
                x: 0,
                y: 0,
                width: 0,
                height: 0,
            },
            hwnd,
            STATUS_BAR_ID,
            self.platform.instance(),
        )?;
        self.status_bar.set(Some(bar));
        Ok(())
    }

    /// Status bar across the bottom, edit control filling the rest.
    fn layout(&self, hwnd: HWND) {
        let mut client = RECT::default();
        if unsafe { GetClientRect(hwnd, &mut client) }.is_err() {
            return;
        }

        let mut status_height = 0;
        if let Some(bar) = self.status_bar.get() {
            unsafe {
                let _ = SendMessageW(bar, WM_SIZE, None, None);
            }
            let mut rect = RECT::default();
            if unsafe { GetWindowRect(bar, &mut rect) }.is_ok() {
                status_height = rect.bottom - rect.top;
            }
            set_status_parts(bar, client.right);
        }

        if let Some(doc) = self.document.get() {
            let height = (client.bottom - status_height).max(0);
            if let Err(err) =
                unsafe { MoveWindow(doc.hwnd(), 0, 0, client.right, height, true) }.call_context("MoveWindow")
            {
                err.log_at(log::Level::Warn);
            }
        }
    }

    fn update_status(&self) {
        let (Some(doc), Some(bar)) = (self.document.get(), self.status_bar.get()) else {
            return;
        };
        let cells = SelectionStatus::compute(&doc, doc.zoom().percent()).cells();
        for (part, cell) in cells.iter().enumerate() {
            let text = HSTRING::from(cell.as_str());
            unsafe {
                let _ = SendMessageW(
                    bar,
                    SB_SETTEXTW,
                    Some(WPARAM(part)),
                    Some(LPARAM(text.as_ptr() as isize)),
                );
            }
        }
    }

    fn on_command(&self, handle: WindowHandle, id: CommandId) -> AppResult<bool> {
        let hwnd = to_hwnd(handle);
        match id {
            CommandId::ViewerReload => self.reload()?,
            CommandId::ViewerClose => self.base.destroy()?,
            CommandId::EditCopy => {
                if let Some(doc) = self.document.get() {
                    doc.copy();
                }
            }
            CommandId::EditSelectAll => {
                if let Some(doc) = self.document.get() {
                    doc.select_all();
                }
            }
            CommandId::EditFind => self.open_find_dialog(hwnd)?,
            CommandId::EditFindNext => self.find_again(hwnd, true)?,
            CommandId::EditFindPrevious => self.find_again(hwnd, false)?,
            CommandId::EditGoto => self.go_to(handle)?,
            CommandId::ViewLineNumbers => self.toggle_line_numbers()?,
            CommandId::ViewStatusBar => self.toggle_status_bar(hwnd)?,
            CommandId::ZoomIn => self.zoom(Zoom::zoomed_in)?,
            CommandId::ZoomOut => self.zoom(Zoom::zoomed_out)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn open_find_dialog(&self, hwnd: HWND) -> AppResult<()> {
        let existing = self.find_dialog.borrow().as_ref().map(|dialog| dialog.hwnd);
        if let Some(dialog) = existing {
            let _ = unsafe { SetActiveWindow(dialog) };
            return Ok(());
        }

        let dialog = {
            let state = self.find_state.borrow();
            FindDialog::open(hwnd, state.last())?
        };
        self.find_dialog.replace(Some(dialog));
        Ok(())
    }

    fn on_find_message(&self, lparam: isize) -> AppResult<()> {
        if lparam == 0 {
            return Ok(());
        }
        let data = unsafe { *(lparam as *const FINDREPLACEW) };

        if has_flag(data.Flags, FR_DIALOGTERM) {
            self.find_dialog.replace(None);
            return Ok(());
        }
        if !has_flag(data.Flags, FR_FINDNEXT) {
            return Ok(());
        }

        let request = request_from_dialog(&data)?;
        self.find_state.borrow_mut().remember(request.clone());
        if let Some(doc) = self.document.get() {
            find(&doc, &request);
        }
        Ok(())
    }

    /// Repeats the last search; without one, opens the find dialog instead.
    fn find_again(&self, hwnd: HWND, forward: bool) -> AppResult<()> {
        let request = self.find_state.borrow_mut().again(forward).cloned();
        let Some(request) = request else {
            return self.open_find_dialog(hwnd);
        };
        if let Some(doc) = self.document.get() {
            find(&doc, &request);
        }
        Ok(())
    }

    /*
     * The prompt runs a nested message loop, so the viewer may be closed
     * before it returns; the document is looked up again afterwards.
     */
    fn go_to(&self, handle: WindowHandle) -> AppResult<()> {
        let Some(doc) = self.document.get() else {
            return Ok(());
        };
        let current = goto::current_line(&doc);
        let Some(input) = GotoDialog::prompt(&self.platform, handle, current)? else {
            return Ok(());
        };
        let Some(doc) = self.document.get() else {
            return Ok(());
        };

        let line = goto::parse_line_input(&input, current);
        match goto::go_to_line(&doc, line) {
            GotoOutcome::OutOfRange => {
                log::debug!("GotoDialog: Line {line} rejected.");
                message_box(
                    Some(handle),
                    "The line number is beyond the total number of lines",
                    &self.base.title(),
                    MB_OK | MB_ICONWARNING,
                );
            }
            GotoOutcome::AlreadyThere => log::debug!("GotoDialog: Caret already on line {line}."),
            GotoOutcome::Moved => {}
        }
        let _ = unsafe { SetFocus(Some(doc.hwnd())) };
        Ok(())
    }

    fn toggle_line_numbers(&self) -> AppResult<()> {
        let enable = !self.line_numbers.get();
        if let Some(doc) = self.document.get() {
            apply_line_numbers(&doc, enable)?;
        }
        self.line_numbers.set(enable);
        Ok(())
    }

    fn toggle_status_bar(&self, hwnd: HWND) -> AppResult<()> {
        let visible = match self.status_bar.take() {
            Some(bar) => {
                unsafe { DestroyWindow(bar) }.call_context("DestroyWindow(StatusBar)")?;
                false
            }
            None => {
                self.create_status_bar(hwnd)?;
                true
            }
        };
        self.layout(hwnd);
        self.update_status();
        self.settings
            .borrow_mut()
            .set_status_bar(self.store.as_ref(), visible)
    }

    fn zoom(&self, step: fn(&Zoom) -> Zoom) -> AppResult<()> {
        let Some(doc) = self.document.get() else {
            return Ok(());
        };
        let current = doc.zoom();
        let next = step(&current);
        if next != current {
            doc.set_zoom(next)?;
            log::debug!("LogViewer: Zoom set to {:.0}%.", next.percent());
        }
        self.update_status();
        Ok(())
    }

    fn on_init_menu_popup(&self, msg: &WindowMessage) -> bool {
        if hiword(msg.lparam as usize) != 0 {
            return false;
        }
        let menu = HMENU(msg.wparam as *mut _);
        match menu_tag(menu) {
            Some(MenuTag::ViewerEdit) => {
                let has_search = self.find_state.borrow().has_search();
                enable_menu_item(menu, CommandId::EditFindNext.raw(), has_search);
                enable_menu_item(menu, CommandId::EditFindPrevious.raw(), has_search);
                true
            }
            Some(MenuTag::ViewerView) => {
                check_menu_item(
                    menu,
                    CommandId::ViewLineNumbers.raw(),
                    self.line_numbers.get(),
                );
                check_menu_item(
                    menu,
                    CommandId::ViewStatusBar.raw(),
                    self.status_bar.get().is_some(),
                );
                true
            }
            Some(MenuTag::ViewerZoom) => {
                let zoom = self
                    .document
                    .get()
                    .map(|doc| doc.zoom())
                    .unwrap_or_else(|| Zoom::from_raw(0, 0));
                enable_menu_item(menu, CommandId::ZoomIn.raw(), zoom.can_zoom_in());
                enable_menu_item(menu, CommandId::ZoomOut.raw(), zoom.can_zoom_out());
                true
            }
            _ => false,
        }
    }

    fn on_notify(&self, lparam: isize) {
        if lparam == 0 {
            return;
        }
        let header = unsafe { &*(lparam as *const NMHDR) };
        if header.idFrom == RICH_EDIT_CONTROL_ID && header.code == EN_SELCHANGE {
            self.update_status();
        }
    }

    fn create_contents(&self, hwnd: HWND) -> AppResult<RichEditDocument> {
        let menu = build_menu_bar(&viewer_menu_bar())?;
        unsafe { SetMenu(hwnd, Some(menu.raw())) }.call_context("SetMenu")?;
        // Owned by the window from here on.
        let _ = menu.into_raw();

        self.accelerators.replace(Some(Accelerators::create()?));

        let edit = rich_edit::create_control(hwnd, self.platform.instance())?;
        unsafe {
            SetWindowSubclass(
                edit,
                Some(edit_subclass_proc),
                EDIT_SUBCLASS_ID,
                hwnd.0 as usize,
            )
        }
        .call_context("SetWindowSubclass")?;
        let doc = RichEditDocument::new(edit);
        self.document.set(Some(doc));

        if self.settings.borrow().status_bar {
            self.create_status_bar(hwnd)?;
        }
        Ok(doc)
    }
}

impl WindowProcedure for LogViewerWindow {
    fn base(&self) -> &BaseWindow {
        &self.base
    }

    fn before_create(&self, ran_prior: bool) -> AppResult<WindowConfig> {
        if ran_prior {
            if let Some(handle) = self.base.handle() {
                self.on_close(handle);
            }
        } else {
            rich_edit::load_library()?;
        }
        if self.find_message.get() == 0 {
            self.find_message
                .set(unsafe { RegisterWindowMessageW(FINDMSGSTRINGW) });
        }

        Ok(WindowConfig {
            class: WindowClass::new(LOG_VIEWER_CLASS).redraw_on_resize(),
            params: CreateParams::new(LOG_VIEWER_TITLE, WindowKind::Overlapped)
                .with_size(VIEWER_WIDTH, VIEWER_HEIGHT),
        })
    }

    fn after_create(&self, _ran_prior: bool) -> AppResult<()> {
        let handle = self
            .base
            .handle()
            .ok_or_else(|| AppError::app("Log viewer has no handle after creation"))?;
        let hwnd = to_hwnd(handle);

        let loaded = self.create_contents(hwnd).and_then(|_| self.reload());
        if let Err(err) = loaded {
            if let Err(destroy_err) = self.base.destroy() {
                destroy_err.log_at(log::Level::Error);
            }
            return Err(err);
        }

        self.layout(hwnd);
        unsafe {
            let _ = ShowWindow(hwnd, SW_SHOW);
            let _ = SetForegroundWindow(hwnd);
        }
        if let Some(doc) = self.document.get() {
            let _ = unsafe { SetFocus(Some(doc.hwnd())) };
        }
        self.update_status();
        log::debug!("LogViewer: Opened.");
        Ok(())
    }

    fn route_message(&self, msg: &WindowMessage) -> isize {
        match msg.id {
            WM_SIZE => {
                self.layout(to_hwnd(msg.handle));
                0
            }
            WM_SETFOCUS => {
                if let Some(doc) = self.document.get() {
                    let _ = unsafe { SetFocus(Some(doc.hwnd())) };
                }
                0
            }
            WM_NOTIFY => {
                self.on_notify(msg.lparam);
                route_default(self, msg)
            }
            REFRESH_STATUS_MESSAGE => {
                self.update_status();
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
            id if id != 0 && id == self.find_message.get() => {
                if let Err(err) = self.on_find_message(msg.lparam) {
                    err.log_at(log::Level::Error);
                }
                0
            }
            _ => route_default(self, msg),
        }
    }

    fn on_destroy(&self) {
        self.document.set(None);
        self.status_bar.set(None);
        self.line_numbers.set(false);
        self.path.replace(None);
        self.accelerators.replace(None);
        self.find_dialog.replace(None);
        self.find_state.borrow_mut().clear();
        log::debug!("LogViewer: Closed.");
        self.base.finish_destroy();
    }
}
