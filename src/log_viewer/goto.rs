/*
 * Go-to-line: validation of the requested one-based line and the caret
 * move. A caret already sitting at the target line start is left alone so
 * the control is not asked to perform a no-op move.
 */
use super::document::{Selection, TextDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GotoOutcome {
    Moved,
    AlreadyThere,
    OutOfRange,
}

/// One-based line of the selection start, used to prefill the dialog.
pub fn current_line(doc: &dyn TextDocument) -> i32 {
    doc.line_from_char(doc.selection().start) + 1
}

/*
 * Empty input keeps the prefilled current line; anything that is not a
 * whole number is reported as line 0, which validation then rejects.
 */
pub fn parse_line_input(text: &str, current: i32) -> i64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return i64::from(current);
    }
    trimmed.parse::<i64>().unwrap_or(0)
}

/// Characters the line field accepts; any `i64` fits.
pub const LINE_INPUT_LIMIT: usize = 19;

/// Text of the line field from its UTF-16 buffer, up to the first NUL.
pub fn line_input_from_wide(buffer: &[u16]) -> String {
    let end = buffer.iter().position(|unit| *unit == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..end])
}

pub fn is_valid_line(line: i64, line_count: i32) -> bool {
    line > 0 && line <= i64::from(line_count)
}

pub fn go_to_line(doc: &dyn TextDocument, line: i64) -> GotoOutcome {
    if !is_valid_line(line, doc.line_count()) {
        return GotoOutcome::OutOfRange;
    }

    let target = doc.line_start((line - 1) as i32);
    if target < 0 {
        return GotoOutcome::OutOfRange;
    }

    let caret = Selection::caret(target);
    if doc.selection() == caret {
        return GotoOutcome::AlreadyThere;
    }

    doc.set_selection(caret);
    doc.scroll_to_caret();
    GotoOutcome::Moved
}
