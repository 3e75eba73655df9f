/*
 * Small modal "Go To Line" prompt. The owner is disabled while the prompt
 * runs its own message loop, and re-enabled before the prompt returns so
 * activation goes back to it.
 */
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use windows::Win32::Foundation::{HWND, LPARAM, RECT, WPARAM};
use windows::Win32::UI::Controls::{EM_LIMITTEXT, EM_SETSEL};
use windows::Win32::UI::Input::KeyboardAndMouse::{EnableWindow, SetFocus};
use windows::Win32::UI::WindowsAndMessaging::{
    BS_DEFPUSHBUTTON, BS_PUSHBUTTON, DispatchMessageW, ES_AUTOHSCROLL, ES_NUMBER, GetMessageW,
    GetWindowRect, GetWindowTextW, IsDialogMessageW, MSG, PostQuitMessage, SW_SHOW, SendMessageW,
    ShowWindow, TranslateMessage, WINDOW_STYLE, WM_COMMAND, WM_QUIT, WS_BORDER, WS_TABSTOP,
};
use windows::core::w;

use super::goto::{LINE_INPUT_LIMIT, line_input_from_wide};
use crate::config::{GOTO_DIALOG_CLASS, GOTO_DIALOG_TITLE};
use crate::error::{AppError, AppResult};
use crate::lifecycle::{
    self, BaseWindow, ClassBackground, CreateParams, WindowClass, WindowConfig, WindowKind,
    WindowProcedure, route_default,
};
use crate::types::{CommandId, WindowHandle, WindowMessage};
use crate::window_common::{ChildRect, Win32Windowing, create_child_control, loword, to_hwnd};

const DIALOG_WIDTH: i32 = 260;
const DIALOG_HEIGHT: i32 = 140;
const LINE_EDIT_ID: u16 = 1001;

pub(crate) struct GotoDialog {
    base: BaseWindow,
    platform: Rc<Win32Windowing>,
    owner: WindowHandle,
    initial_text: String,
    edit: Cell<Option<HWND>>,
    answer: RefCell<Option<String>>,
}

impl GotoDialog {
    /*
     * Shows the prompt prefilled with `current_line` and blocks until it is
     * dismissed. Returns the edit text when confirmed with "Go".
     */
    pub(crate) fn prompt(
        platform: &Rc<Win32Windowing>,
        owner: WindowHandle,
        current_line: i32,
    ) -> AppResult<Option<String>> {
        let dialog = Rc::new(GotoDialog {
            base: BaseWindow::new(platform.clone(), false),
            platform: Rc::clone(platform),
            owner,
            initial_text: current_line.to_string(),
            edit: Cell::new(None),
            answer: RefCell::new(None),
        });

        if !lifecycle::initialize(&dialog) {
            return Err(AppError::app("Go to line dialog could not be created"));
        }

        let owner_hwnd = to_hwnd(owner);
        let _ = unsafe { EnableWindow(owner_hwnd, false) };
        dialog.run_modal_loop();
        let _ = unsafe { EnableWindow(owner_hwnd, true) };

        let answer = dialog.answer.borrow_mut().take();
        Ok(answer)
    }

    fn run_modal_loop(&self) {
        let mut msg = MSG::default();
        while let Some(handle) = self.base.handle() {
            let status = unsafe { GetMessageW(&mut msg, None, 0, 0) };
            if status.0 == -1 {
                log::error!("GotoDialog: GetMessageW failed; closing prompt.");
                if let Err(err) = self.base.destroy() {
                    err.log_at(log::Level::Error);
                }
                break;
            }
            if msg.message == WM_QUIT {
                // Leave the quit request for the outer loop.
                unsafe { PostQuitMessage(msg.wParam.0 as i32) };
                if let Err(err) = self.base.destroy() {
                    err.log_at(log::Level::Error);
                }
                break;
            }
            if unsafe { IsDialogMessageW(to_hwnd(handle), &msg) }.as_bool() {
                continue;
            }
            unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }

    fn centered_position(&self) -> (i32, i32) {
        let mut owner_rect = RECT::default();
        if unsafe { GetWindowRect(to_hwnd(self.owner), &mut owner_rect) }.is_err() {
            return (0, 0);
        }
        let x = owner_rect.left + (owner_rect.right - owner_rect.left - DIALOG_WIDTH) / 2;
        let y = owner_rect.top + (owner_rect.bottom - owner_rect.top - DIALOG_HEIGHT) / 2;
        (x, y)
    }

    fn create_controls(&self, hwnd: HWND) -> AppResult<()> {
        let instance = self.platform.instance();
        create_child_control(
            w!("STATIC"),
            "&Line number:",
            WINDOW_STYLE(0),
            ChildRect { x: 12, y: 12, width: 220, height: 18 },
            hwnd,
            0,
            instance,
        )?;
        let edit = create_child_control(
            w!("EDIT"),
            &self.initial_text,
            WS_BORDER | WS_TABSTOP | WINDOW_STYLE((ES_NUMBER | ES_AUTOHSCROLL) as u32),
            ChildRect { x: 12, y: 34, width: 220, height: 22 },
            hwnd,
            LINE_EDIT_ID,
            instance,
        )?;
        create_child_control(
            w!("BUTTON"),
            "Go",
            WS_TABSTOP | WINDOW_STYLE(BS_DEFPUSHBUTTON as u32),
            ChildRect { x: 76, y: 68, width: 75, height: 25 },
            hwnd,
            CommandId::DialogOk.raw(),
            instance,
        )?;
        create_child_control(
            w!("BUTTON"),
            "Cancel",
            WS_TABSTOP | WINDOW_STYLE(BS_PUSHBUTTON as u32),
            ChildRect { x: 157, y: 68, width: 75, height: 25 },
            hwnd,
            CommandId::DialogCancel.raw(),
            instance,
        )?;
        let _ = unsafe { SendMessageW(edit, EM_LIMITTEXT, Some(WPARAM(LINE_INPUT_LIMIT)), None) };
        self.edit.set(Some(edit));
        Ok(())
    }

    fn confirm(&self) {
        if let Some(edit) = self.edit.get() {
            /* Zero-filled, so a failed read leaves the field empty. */
            let mut buffer = [0u16; LINE_INPUT_LIMIT + 1];
            let _ = unsafe { GetWindowTextW(edit, &mut buffer) };
            self.answer.replace(Some(line_input_from_wide(&buffer)));
        }
        if let Err(err) = self.base.destroy() {
            err.log_at(log::Level::Error);
        }
    }
}

impl WindowProcedure for GotoDialog {
    fn base(&self) -> &BaseWindow {
        &self.base
    }

    fn before_create(&self, _ran_prior: bool) -> AppResult<WindowConfig> {
        let (x, y) = self.centered_position();
        Ok(WindowConfig {
            class: WindowClass::new(GOTO_DIALOG_CLASS).with_background(ClassBackground::ButtonFace),
            params: CreateParams::new(GOTO_DIALOG_TITLE, WindowKind::ModalDialog)
                .with_position(x, y)
                .with_size(DIALOG_WIDTH, DIALOG_HEIGHT)
                .owned_by(self.owner),
        })
    }

    fn after_create(&self, _ran_prior: bool) -> AppResult<()> {
        let handle = self
            .base
            .handle()
            .ok_or_else(|| AppError::app("Go to line dialog has no handle"))?;
        let hwnd = to_hwnd(handle);
        self.create_controls(hwnd)?;

        unsafe {
            let _ = ShowWindow(hwnd, SW_SHOW);
            if let Some(edit) = self.edit.get() {
                let _ = SetFocus(Some(edit));
                let _ = SendMessageW(edit, EM_SETSEL, Some(WPARAM(0)), Some(LPARAM(-1)));
            }
        }
        Ok(())
    }

    fn route_message(&self, msg: &WindowMessage) -> isize {
        if msg.id == WM_COMMAND {
            match CommandId::from_raw(u32::from(loword(msg.wparam))) {
                Some(CommandId::DialogOk) => {
                    self.confirm();
                    return 0;
                }
                Some(CommandId::DialogCancel) => {
                    if let Err(err) = self.base.destroy() {
                        err.log_at(log::Level::Error);
                    }
                    return 0;
                }
                _ => {}
            }
        }
        route_default(self, msg)
    }

    fn on_destroy(&self) {
        self.edit.set(None);
        self.base.finish_destroy();
    }
}
