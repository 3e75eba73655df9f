/*
 * Win32 implementation of the windowing seam, plus the small helpers every
 * window kind shares: handle conversion, word cracking, menus built from
 * `menu::MenuEntry` trees, and text/message box utilities.
 *
 * Class registration checks `GetClassInfoExW` first, so registering a class
 * that already exists is a no-op. Creation hands the owning window object to
 * `window_proc_router` through `lpCreateParams`; the router binds it at
 * WM_NCCREATE, before any other message for the new window is routed.
 */
use std::ffi::c_void;
use std::rc::Rc;

use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::Graphics::Gdi::{DEFAULT_GUI_FONT, GetStockObject, HBRUSH};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CREATESTRUCTW, CS_HREDRAW, CS_VREDRAW, CW_USEDEFAULT, CheckMenuItem, COLOR_BTNFACE,
    COLOR_WINDOW, CreateMenu, CreatePopupMenu, CreateWindowExW, DefWindowProcW, DestroyMenu,
    DestroyWindow, EnableMenuItem, GetClassInfoExW, GetMenuInfo, HMENU, IDC_ARROW,
    IDI_APPLICATION, LoadCursorW, LoadIconW, MENUINFO, MESSAGEBOX_RESULT, MESSAGEBOX_STYLE,
    MF_BYCOMMAND, MF_CHECKED, MF_ENABLED, MF_GRAYED, MF_POPUP, MF_SEPARATOR, MF_STRING,
    MF_UNCHECKED, MIM_MENUDATA, MessageBoxW, PostQuitMessage,
    RegisterClassExW, SendMessageW, SetMenuInfo, WINDOW_EX_STYLE, WINDOW_STYLE, WM_NCCREATE,
    WM_SETFONT, WNDCLASSEXW, WS_CAPTION, WS_CHILD, WS_CLIPCHILDREN, WS_EX_DLGMODALFRAME,
    WS_OVERLAPPED, WS_OVERLAPPEDWINDOW, WS_POPUP, WS_SYSMENU, WS_VISIBLE,
};
use windows::core::{HSTRING, PCWSTR};

use crate::dispatch;
use crate::error::{AppError, AppResult, CallContext};
use crate::lifecycle::{
    ClassBackground, CreateParams, NativeWindowing, WindowClass, WindowKind, WindowProcedure,
};
use crate::menu::MenuEntry;
use crate::types::{MenuTag, WindowHandle, WindowMessage};

#[inline]
pub(crate) fn to_hwnd(handle: WindowHandle) -> HWND {
    HWND(handle.0 as *mut c_void)
}

#[inline]
pub(crate) fn to_handle(hwnd: HWND) -> WindowHandle {
    WindowHandle(hwnd.0 as isize)
}

#[inline]
pub(crate) fn loword(value: usize) -> u16 {
    (value & 0xFFFF) as u16
}

#[inline]
pub(crate) fn hiword(value: usize) -> u16 {
    ((value >> 16) & 0xFFFF) as u16
}

/// Sign-extended low word, for packed screen coordinates.
#[inline]
pub(crate) fn signed_loword(value: usize) -> i32 {
    i32::from(loword(value) as i16)
}

#[inline]
pub(crate) fn signed_hiword(value: usize) -> i32 {
    i32::from(hiword(value) as i16)
}

// Creation context passed through `lpCreateParams`; owned by `create_window`.
struct CreationContext {
    owner: Rc<dyn WindowProcedure>,
}

pub struct Win32Windowing {
    instance: HINSTANCE,
}

impl Win32Windowing {
    pub fn new() -> AppResult<Rc<Self>> {
        let module = unsafe { GetModuleHandleW(PCWSTR::null()) }.call_context("GetModuleHandleW")?;
        Ok(Rc::new(Win32Windowing {
            instance: module.into(),
        }))
    }

    pub(crate) fn instance(&self) -> HINSTANCE {
        self.instance
    }
}

impl NativeWindowing for Win32Windowing {
    fn is_class_registered(&self, class_name: &str) -> bool {
        let name = HSTRING::from(class_name);
        let mut existing = WNDCLASSEXW::default();
        unsafe { GetClassInfoExW(Some(self.instance), &name, &mut existing) }.is_ok()
    }

    fn register_class(&self, class: &WindowClass) -> AppResult<()> {
        let name = HSTRING::from(class.name.as_str());
        let background = match class.background {
            ClassBackground::Window => COLOR_WINDOW,
            ClassBackground::ButtonFace => COLOR_BTNFACE,
        };

        unsafe {
            let icon = LoadIconW(None, IDI_APPLICATION).call_context("LoadIconW")?;
            let wc = WNDCLASSEXW {
                cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
                style: if class.redraw_on_resize {
                    CS_HREDRAW | CS_VREDRAW
                } else {
                    Default::default()
                },
                lpfnWndProc: Some(window_proc_router),
                cbClsExtra: 0,
                cbWndExtra: 0,
                hInstance: self.instance,
                hIcon: icon,
                hCursor: LoadCursorW(None, IDC_ARROW).call_context("LoadCursorW")?,
                hbrBackground: HBRUSH((background.0 + 1) as usize as *mut c_void),
                lpszMenuName: PCWSTR::null(),
                lpszClassName: PCWSTR(name.as_ptr()),
                hIconSm: icon,
            };

            if RegisterClassExW(&wc) == 0 {
                return Err(AppError::last_win32("RegisterClassExW"));
            }
        }
        Ok(())
    }

    fn create_window(
        &self,
        class: &WindowClass,
        params: &CreateParams,
        owner: Rc<dyn WindowProcedure>,
    ) -> AppResult<WindowHandle> {
        let (style, ex_style) = match params.kind {
            WindowKind::Hidden => (WS_OVERLAPPED, WINDOW_EX_STYLE(0)),
            WindowKind::Overlapped => (WS_OVERLAPPEDWINDOW | WS_CLIPCHILDREN, WINDOW_EX_STYLE(0)),
            WindowKind::ModalDialog => (WS_POPUP | WS_CAPTION | WS_SYSMENU, WS_EX_DLGMODALFRAME),
        };
        let context = Box::into_raw(Box::new(CreationContext { owner }));

        let result = unsafe {
            CreateWindowExW(
                ex_style,
                &HSTRING::from(class.name.as_str()),
                &HSTRING::from(params.title.as_str()),
                style,
                params.x.unwrap_or(CW_USEDEFAULT),
                params.y.unwrap_or(CW_USEDEFAULT),
                params.width.unwrap_or(CW_USEDEFAULT),
                params.height.unwrap_or(CW_USEDEFAULT),
                params.owner.map(to_hwnd),
                None,
                Some(self.instance),
                Some(context as *const c_void),
            )
        };

        // The router only borrows the context during the call.
        drop(unsafe { Box::from_raw(context) });

        let hwnd = result.call_context("CreateWindowExW")?;
        Ok(to_handle(hwnd))
    }

    fn destroy_window(&self, handle: WindowHandle) -> AppResult<()> {
        unsafe { DestroyWindow(to_hwnd(handle)) }.call_context("DestroyWindow")
    }

    fn default_procedure(&self, msg: &WindowMessage) -> isize {
        unsafe {
            DefWindowProcW(
                to_hwnd(msg.handle),
                msg.id,
                WPARAM(msg.wparam),
                LPARAM(msg.lparam),
            )
        }
        .0
    }

    fn post_quit(&self, exit_code: i32) {
        log::debug!("Platform: Posting quit message ({exit_code}).");
        unsafe { PostQuitMessage(exit_code) };
    }
}

/*
 * Window procedure for every class registered here. Binds the creation
 * context's owner at WM_NCCREATE, then hands every message to `dispatch`.
 */
unsafe extern "system" fn window_proc_router(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let handle = to_handle(hwnd);

    if msg == WM_NCCREATE && lparam.0 != 0 {
        let create_struct = unsafe { &*(lparam.0 as *const CREATESTRUCTW) };
        let context = create_struct.lpCreateParams as *const CreationContext;
        if !context.is_null() {
            let owner = unsafe { &(*context).owner };
            if let Err(err) = dispatch::bind(handle, owner) {
                err.log_at(log::Level::Error);
            }
        }
    }

    let message = WindowMessage::new(handle, msg, wparam.0, lparam.0);
    let result = dispatch::route(&message, |m| unsafe {
        DefWindowProcW(hwnd, m.id, WPARAM(m.wparam), LPARAM(m.lparam)).0
    });
    LRESULT(result)
}

/*
 * Menu handle that is destroyed on drop unless ownership was handed to the
 * OS (attached to a window, or inserted into a parent menu).
 */
pub(crate) struct OwnedMenu(HMENU);

impl OwnedMenu {
    pub(crate) fn raw(&self) -> HMENU {
        self.0
    }

    pub(crate) fn into_raw(self) -> HMENU {
        let menu = self.0;
        std::mem::forget(self);
        menu
    }
}

impl Drop for OwnedMenu {
    fn drop(&mut self) {
        if let Err(err) = unsafe { DestroyMenu(self.0) } {
            log::warn!("Platform: DestroyMenu failed: {err:?}");
        }
    }
}

pub(crate) fn build_popup_menu(entries: &[MenuEntry]) -> AppResult<OwnedMenu> {
    let menu = OwnedMenu(unsafe { CreatePopupMenu() }.call_context("CreatePopupMenu")?);
    append_entries(&menu, entries)?;
    Ok(menu)
}

pub(crate) fn build_menu_bar(entries: &[MenuEntry]) -> AppResult<OwnedMenu> {
    let menu = OwnedMenu(unsafe { CreateMenu() }.call_context("CreateMenu")?);
    append_entries(&menu, entries)?;
    Ok(menu)
}

fn append_entries(menu: &OwnedMenu, entries: &[MenuEntry]) -> AppResult<()> {
    for entry in entries {
        match entry {
            MenuEntry::Command { id, label } => unsafe {
                AppendMenuW(
                    menu.raw(),
                    MF_STRING,
                    usize::from(id.raw()),
                    &HSTRING::from(*label),
                )
            }
            .call_context("AppendMenuW")?,

            MenuEntry::Separator => unsafe {
                AppendMenuW(menu.raw(), MF_SEPARATOR, 0, PCWSTR::null())
            }
            .call_context("AppendMenuW")?,

            MenuEntry::Submenu { label, tag, items } => {
                let child = build_popup_menu(items)?;
                set_menu_tag(&child, *tag)?;
                unsafe {
                    AppendMenuW(
                        menu.raw(),
                        MF_POPUP,
                        child.raw().0 as usize,
                        &HSTRING::from(*label),
                    )
                }
                .call_context("AppendMenuW")?;
                // Destroyed together with its parent from here on.
                let _ = child.into_raw();
            }
        }
    }
    Ok(())
}

fn set_menu_tag(menu: &OwnedMenu, tag: MenuTag) -> AppResult<()> {
    let info = MENUINFO {
        cbSize: std::mem::size_of::<MENUINFO>() as u32,
        fMask: MIM_MENUDATA,
        dwMenuData: tag.raw(),
        ..Default::default()
    };
    unsafe { SetMenuInfo(menu.raw(), &info) }.call_context("SetMenuInfo")
}

pub(crate) fn menu_tag(menu: HMENU) -> Option<MenuTag> {
    let mut info = MENUINFO {
        cbSize: std::mem::size_of::<MENUINFO>() as u32,
        fMask: MIM_MENUDATA,
        ..Default::default()
    };
    unsafe { GetMenuInfo(menu, &mut info) }.ok()?;
    MenuTag::from_raw(info.dwMenuData)
}

pub(crate) fn check_menu_item(menu: HMENU, id: u16, checked: bool) {
    let state = if checked { MF_CHECKED } else { MF_UNCHECKED };
    unsafe { CheckMenuItem(menu, u32::from(id), (MF_BYCOMMAND | state).0) };
}

pub(crate) fn enable_menu_item(menu: HMENU, id: u16, enabled: bool) {
    let state = if enabled { MF_ENABLED } else { MF_GRAYED };
    let _ = unsafe { EnableMenuItem(menu, u32::from(id), MF_BYCOMMAND | state) };
}

pub(crate) fn message_box(
    owner: Option<WindowHandle>,
    text: &str,
    caption: &str,
    style: MESSAGEBOX_STYLE,
) -> MESSAGEBOX_RESULT {
    unsafe {
        MessageBoxW(
            owner.map(to_hwnd),
            &HSTRING::from(text),
            &HSTRING::from(caption),
            style,
        )
    }
}

/// Position and size of a child control in parent client coordinates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChildRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/*
 * Creates a visible child control of a system class with the dialog GUI
 * font. `id` is what the control reports in WM_COMMAND.
 */
pub(crate) fn create_child_control(
    class: PCWSTR,
    text: &str,
    style: WINDOW_STYLE,
    rect: ChildRect,
    parent: HWND,
    id: u16,
    instance: HINSTANCE,
) -> AppResult<HWND> {
    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            class,
            &HSTRING::from(text),
            WS_CHILD | WS_VISIBLE | style,
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            Some(parent),
            Some(HMENU(usize::from(id) as *mut c_void)),
            Some(instance),
            None,
        )
    }
    .call_context("CreateWindowExW")?;
    apply_gui_font(hwnd);
    Ok(hwnd)
}

pub(crate) fn apply_gui_font(hwnd: HWND) {
    unsafe {
        let font = GetStockObject(DEFAULT_GUI_FONT);
        let _ = SendMessageW(
            hwnd,
            WM_SETFONT,
            Some(WPARAM(font.0 as usize)),
            Some(LPARAM(1)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_helpers_split_and_sign_extend() {
        // Arrange: x = -20, y = 300 packed as a context menu anchor
        let packed = ((300u32 << 16) | (-20i16 as u16 as u32)) as usize;

        // Act / Assert
        assert_eq!(loword(packed), 0xFFEC);
        assert_eq!(signed_loword(packed), -20);
        assert_eq!(signed_hiword(packed), 300);
        assert_eq!(hiword(0x0401_0000), 0x0401);
    }

    #[test]
    fn handle_conversion_round_trips() {
        let handle = WindowHandle(0x2A40);
        assert_eq!(to_handle(to_hwnd(handle)), handle);
    }
}
