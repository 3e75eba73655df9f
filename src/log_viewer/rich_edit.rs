/*
 * Read-only rich edit control holding the log text, and the
 * `TextDocument` implementation the viewer algorithms run against.
 *
 * Files are streamed in as UTF-8 plain text through EM_STREAMIN. The
 * control is created from the "Msftedit.dll" class, which is loaded once
 * per process before the first viewer is created.
 */
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, WPARAM};
use windows::Win32::System::LibraryLoader::LoadLibraryW;
use windows::Win32::UI::Controls::Dialogs::{FR_DOWN, FR_MATCHCASE, FR_WHOLEWORD};
use windows::Win32::UI::Controls::RichEdit::{
    CHARRANGE, EDITSTREAM, EM_EXGETSEL, EM_EXLIMITTEXT, EM_EXLINEFROMCHAR, EM_EXSETSEL,
    EM_FINDTEXTEXW, EM_GETZOOM, EM_SETEVENTMASK, EM_SETPARAFORMAT, EM_SETZOOM, EM_STREAMIN,
    ENM_SELCHANGE, FINDTEXTEXW, MSFTEDIT_CLASS, PARAFORMAT2, PFM_NUMBERING, PFM_NUMBERINGSTART,
    PFM_NUMBERINGSTYLE, PFN_ARABIC, PFNS_PERIOD, SF_TEXT, SF_USECODEPAGE,
};
use windows::Win32::UI::Controls::{EM_GETLINECOUNT, EM_LINEINDEX, EM_SCROLLCARET};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, ES_AUTOHSCROLL, ES_AUTOVSCROLL, ES_MULTILINE, ES_NOHIDESEL, ES_READONLY,
    GetWindowTextLengthW, HMENU, SendMessageW, WINDOW_EX_STYLE, WINDOW_STYLE, WM_COPY, WS_CHILD,
    WS_HSCROLL, WS_VISIBLE, WS_VSCROLL,
};
use windows::core::{HSTRING, PCWSTR, w};

use super::document::{SearchFlags, Selection, TextDocument};
use super::zoom::Zoom;
use crate::error::{AppError, AppResult, CallContext};

const CP_UTF8: u32 = 65001;
pub(crate) const RICH_EDIT_CONTROL_ID: usize = 100;
const MAX_TEXT_LENGTH: isize = 0x7FFF_FFFE;

pub(crate) fn load_library() -> AppResult<()> {
    unsafe { LoadLibraryW(w!("Msftedit.dll")) }
        .call_context("LoadLibraryW(Msftedit.dll)")
        .map(|_| ())
}

pub(crate) fn create_control(parent: HWND, instance: HINSTANCE) -> AppResult<HWND> {
    let style = WS_CHILD
        | WS_VISIBLE
        | WS_VSCROLL
        | WS_HSCROLL
        | WINDOW_STYLE(ES_READONLY as u32)
        | WINDOW_STYLE(ES_MULTILINE as u32)
        | WINDOW_STYLE(ES_AUTOVSCROLL as u32)
        | WINDOW_STYLE(ES_AUTOHSCROLL as u32)
        | WINDOW_STYLE(ES_NOHIDESEL as u32);

    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            MSFTEDIT_CLASS,
            &HSTRING::new(),
            style,
            0,
            0,
            0,
            0,
            Some(parent),
            Some(HMENU(RICH_EDIT_CONTROL_ID as *mut _)),
            Some(instance),
            None,
        )
    }
    .call_context("CreateWindowExW(RichEdit)")?;

    unsafe {
        let _ = SendMessageW(hwnd, EM_EXLIMITTEXT, Some(WPARAM(0)), Some(LPARAM(MAX_TEXT_LENGTH)));
        let _ = SendMessageW(
            hwnd,
            EM_SETEVENTMASK,
            Some(WPARAM(0)),
            Some(LPARAM(ENM_SELCHANGE as isize)),
        );
    }
    Ok(hwnd)
}

struct FileStreamContext {
    file: File,
    error: Option<io::Error>,
}

unsafe extern "system" fn file_stream_callback(
    cookie: usize,
    buffer: *mut u8,
    requested_bytes: i32,
    written_bytes: *mut i32,
) -> u32 {
    if cookie == 0 || buffer.is_null() || written_bytes.is_null() || requested_bytes < 0 {
        return 1;
    }

    let context = unsafe { &mut *(cookie as *mut FileStreamContext) };
    let target = unsafe { std::slice::from_raw_parts_mut(buffer, requested_bytes as usize) };
    match context.file.read(target) {
        Ok(read) => {
            unsafe { *written_bytes = read as i32 };
            0
        }
        Err(err) => {
            unsafe { *written_bytes = 0 };
            context.error = Some(err);
            1
        }
    }
}

/*
 * View of the control as a text document. Every call is a synchronous
 * message to a control owned by the viewer window on the same thread.
 */
#[derive(Clone, Copy)]
pub(crate) struct RichEditDocument {
    hwnd: HWND,
}

impl RichEditDocument {
    pub(crate) fn new(hwnd: HWND) -> Self {
        RichEditDocument { hwnd }
    }

    pub(crate) fn hwnd(&self) -> HWND {
        self.hwnd
    }

    fn send(&self, msg: u32, wparam: usize, lparam: isize) -> isize {
        unsafe { SendMessageW(self.hwnd, msg, Some(WPARAM(wparam)), Some(LPARAM(lparam))) }.0
    }

    /// Replaces the content with the file's text and puts the caret at the end.
    pub(crate) fn load_file(&self, path: &Path) -> AppResult<()> {
        let mut context = FileStreamContext {
            file: File::open(path)?,
            error: None,
        };
        let mut stream = EDITSTREAM {
            dwCookie: &mut context as *mut FileStreamContext as usize,
            dwError: 0,
            pfnCallback: Some(file_stream_callback),
        };

        let format = SF_TEXT | SF_USECODEPAGE | (CP_UTF8 << 16);
        self.send(
            EM_STREAMIN,
            format as usize,
            &mut stream as *mut EDITSTREAM as isize,
        );

        if let Some(err) = context.error.take() {
            return Err(err.into());
        }
        let stream_error = stream.dwError;
        if stream_error != 0 {
            return Err(AppError::app(format!(
                "EM_STREAMIN failed with error code {stream_error}"
            )));
        }

        let end = self.text_len();
        self.set_selection(Selection::caret(end));
        self.scroll_to_caret();
        log::debug!("LogViewer: Loaded {} ({end} characters).", path.display());
        Ok(())
    }

    /// Numerator and denominator as reported; both 0 when zoom was never set.
    pub(crate) fn raw_zoom(&self) -> (i32, i32) {
        let mut numerator = 0i32;
        let mut denominator = 0i32;
        self.send(
            EM_GETZOOM,
            &mut numerator as *mut i32 as usize,
            &mut denominator as *mut i32 as isize,
        );
        (numerator, denominator)
    }

    pub(crate) fn zoom(&self) -> Zoom {
        let (numerator, denominator) = self.raw_zoom();
        Zoom::from_raw(numerator, denominator)
    }

    pub(crate) fn set_zoom(&self, zoom: Zoom) -> AppResult<()> {
        let applied = self.send(
            EM_SETZOOM,
            zoom.numerator as usize,
            zoom.denominator as isize,
        );
        if applied == 0 {
            return Err(AppError::app(format!(
                "EM_SETZOOM rejected {}/{}",
                zoom.numerator, zoom.denominator
            )));
        }
        Ok(())
    }

    pub(crate) fn select_all(&self) {
        self.set_selection(Selection::ALL);
    }

    pub(crate) fn copy(&self) {
        self.send(WM_COPY, 0, 0);
    }
}

impl TextDocument for RichEditDocument {
    fn selection(&self) -> Selection {
        let mut range = CHARRANGE::default();
        self.send(EM_EXGETSEL, 0, &mut range as *mut CHARRANGE as isize);
        Selection::new(range.cpMin, range.cpMax)
    }

    fn set_selection(&self, selection: Selection) {
        let mut range = CHARRANGE {
            cpMin: selection.start,
            cpMax: selection.end,
        };
        self.send(EM_EXSETSEL, 0, &mut range as *mut CHARRANGE as isize);
    }

    fn line_from_char(&self, pos: i32) -> i32 {
        self.send(EM_EXLINEFROMCHAR, 0, pos as isize) as i32
    }

    fn line_start(&self, line: i32) -> i32 {
        self.send(EM_LINEINDEX, line as usize, 0) as i32
    }

    fn line_count(&self) -> i32 {
        self.send(EM_GETLINECOUNT, 0, 0) as i32
    }

    fn text_len(&self) -> i32 {
        unsafe { GetWindowTextLengthW(self.hwnd) }
    }

    fn find_text(&self, text: &str, from: i32, limit: i32, flags: SearchFlags) -> Option<Selection> {
        let needle = HSTRING::from(text);
        let mut find = FINDTEXTEXW {
            chrg: CHARRANGE {
                cpMin: from,
                cpMax: limit,
            },
            lpstrText: PCWSTR(needle.as_ptr()),
            chrgText: CHARRANGE::default(),
        };

        let mut options = 0u32;
        if flags.forward {
            options |= FR_DOWN.0;
        }
        if flags.match_case {
            options |= FR_MATCHCASE.0;
        }
        if flags.whole_word {
            options |= FR_WHOLEWORD.0;
        }

        let position = self.send(
            EM_FINDTEXTEXW,
            options as usize,
            &mut find as *mut FINDTEXTEXW as isize,
        );
        if position < 0 {
            return None;
        }
        let found = find.chrgText;
        Some(Selection::new(found.cpMin, found.cpMax))
    }

    fn scroll_to_caret(&self) {
        self.send(EM_SCROLLCARET, 0, 0);
    }

    fn set_paragraph_numbering(&self, enabled: bool) -> bool {
        let mut format = PARAFORMAT2::default();
        format.Base.cbSize = std::mem::size_of::<PARAFORMAT2>() as u32;
        format.Base.dwMask = PFM_NUMBERING | PFM_NUMBERINGSTART | PFM_NUMBERINGSTYLE;
        if enabled {
            format.Base.wNumbering = PFN_ARABIC;
            format.wNumberingStart = 1;
            format.wNumberingStyle = PFNS_PERIOD;
        }
        self.send(
            EM_SETPARAFORMAT,
            0,
            &mut format as *mut PARAFORMAT2 as isize,
        ) != 0
    }
}
