/*
 * Text document seam for the viewer algorithms. Positions are zero-based
 * character offsets and lines are zero-based, as the rich edit control
 * reports them; user-facing numbering is done by the callers.
 */
use crate::error::{AppError, AppResult};

/// Selection as character offsets; `start > end` never occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: i32,
    pub end: i32,
}

impl Selection {
    /// Whole text, in the form the rich edit control accepts.
    pub const ALL: Selection = Selection { start: 0, end: -1 };

    pub fn new(start: i32, end: i32) -> Self {
        Selection { start, end }
    }

    pub fn caret(pos: i32) -> Self {
        Selection {
            start: pos,
            end: pos,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchFlags {
    pub forward: bool,
    pub match_case: bool,
    pub whole_word: bool,
}

pub trait TextDocument {
    fn selection(&self) -> Selection;

    fn set_selection(&self, selection: Selection);

    fn line_from_char(&self, pos: i32) -> i32;

    /// Offset of the first character of `line`, or -1 past the last line.
    fn line_start(&self, line: i32) -> i32;

    fn line_count(&self) -> i32;

    fn text_len(&self) -> i32;

    /*
     * Searches between `from` and `limit`. Forward searches run from `from`
     * towards `limit` (-1 meaning the end of the text); backward searches
     * find the closest match ending at or before `from` and starting at or
     * after `limit`.
     */
    fn find_text(&self, text: &str, from: i32, limit: i32, flags: SearchFlags) -> Option<Selection>;

    fn scroll_to_caret(&self);

    /// Sets or clears paragraph numbering on the current selection.
    fn set_paragraph_numbering(&self, enabled: bool) -> bool;
}

/*
 * Numbers every line (or clears the numbering) and puts back the
 * selection the user had, also when the control rejects the format.
 */
pub fn apply_line_numbers(doc: &dyn TextDocument, enabled: bool) -> AppResult<()> {
    let saved = doc.selection();
    doc.set_selection(Selection::ALL);
    let applied = doc.set_paragraph_numbering(enabled);
    doc.set_selection(saved);

    if !applied {
        return Err(AppError::app("Line numbering could not be applied"));
    }
    log::debug!("LogViewer: Line numbers {}.", if enabled { "on" } else { "off" });
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// ASCII-only in-memory document with '\n' line breaks.
    pub(crate) struct MemoryDocument {
        text: String,
        selection: Cell<Selection>,
        pub set_selection_calls: Cell<usize>,
        pub searches: RefCell<Vec<(i32, i32, bool)>>,
        /// Numbering requests with the selection active when each arrived.
        pub numbering: RefCell<Vec<(bool, Selection)>>,
        pub reject_format: Cell<bool>,
    }

    impl MemoryDocument {
        pub(crate) fn new(text: &str) -> Self {
            MemoryDocument {
                text: text.to_string(),
                selection: Cell::new(Selection::default()),
                set_selection_calls: Cell::new(0),
                searches: RefCell::new(Vec::new()),
                numbering: RefCell::new(Vec::new()),
                reject_format: Cell::new(false),
            }
        }

        pub(crate) fn with_selection(self, start: i32, end: i32) -> Self {
            self.selection.set(Selection::new(start, end));
            self
        }

        fn is_word_byte(b: u8) -> bool {
            b.is_ascii_alphanumeric() || b == b'_'
        }

        fn matches_at(&self, needle: &[u8], at: usize, flags: SearchFlags) -> bool {
            let hay = self.text.as_bytes();
            if at + needle.len() > hay.len() {
                return false;
            }
            let window = &hay[at..at + needle.len()];
            let equal = if flags.match_case {
                window == needle
            } else {
                window.eq_ignore_ascii_case(needle)
            };
            if !equal || !flags.whole_word {
                return equal;
            }
            let before_ok = at == 0 || !Self::is_word_byte(hay[at - 1]);
            let after = at + needle.len();
            let after_ok = after == hay.len() || !Self::is_word_byte(hay[after]);
            before_ok && after_ok
        }
    }

    impl TextDocument for MemoryDocument {
        fn selection(&self) -> Selection {
            self.selection.get()
        }

        fn set_selection(&self, selection: Selection) {
            self.set_selection_calls
                .set(self.set_selection_calls.get() + 1);
            self.selection.set(selection);
        }

        fn line_from_char(&self, pos: i32) -> i32 {
            let pos = (pos.max(0) as usize).min(self.text.len());
            self.text.as_bytes()[..pos]
                .iter()
                .filter(|b| **b == b'\n')
                .count() as i32
        }

        fn line_start(&self, line: i32) -> i32 {
            if line == 0 {
                return 0;
            }
            self.text
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .nth((line - 1) as usize)
                .map(|(i, _)| i as i32 + 1)
                .unwrap_or(-1)
        }

        fn line_count(&self) -> i32 {
            self.text.bytes().filter(|b| *b == b'\n').count() as i32 + 1
        }

        fn text_len(&self) -> i32 {
            self.text.len() as i32
        }

        fn find_text(&self, text: &str, from: i32, limit: i32, flags: SearchFlags) -> Option<Selection> {
            self.searches.borrow_mut().push((from, limit, flags.forward));
            let needle = text.as_bytes();
            if needle.is_empty() {
                return None;
            }
            let len = needle.len();
            if flags.forward {
                let end = if limit < 0 { self.text.len() } else { limit as usize };
                (from.max(0) as usize..end.saturating_sub(len - 1))
                    .find(|at| self.matches_at(needle, *at, flags))
                    .map(|at| Selection::new(at as i32, (at + len) as i32))
            } else {
                let lowest = limit.max(0) as usize;
                let highest_end = from.max(0) as usize;
                (lowest..=highest_end.saturating_sub(len))
                    .rev()
                    .filter(|at| *at + len <= highest_end)
                    .find(|at| self.matches_at(needle, *at, flags))
                    .map(|at| Selection::new(at as i32, (at + len) as i32))
            }
        }

        fn scroll_to_caret(&self) {}

        fn set_paragraph_numbering(&self, enabled: bool) -> bool {
            self.numbering
                .borrow_mut()
                .push((enabled, self.selection.get()));
            !self.reject_format.get()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MemoryDocument;
    use super::*;

    #[test]
    fn line_numbers_cover_whole_text_and_keep_selection() {
        // Arrange
        let doc = MemoryDocument::new("first\nsecond\nthird").with_selection(6, 12);

        // Act
        let result = apply_line_numbers(&doc, true);

        // Assert
        assert!(result.is_ok());
        assert_eq!(*doc.numbering.borrow(), vec![(true, Selection::ALL)]);
        assert_eq!(doc.selection(), Selection::new(6, 12));
    }

    #[test]
    fn clearing_line_numbers_keeps_caret() {
        // Arrange
        let doc = MemoryDocument::new("first\nsecond").with_selection(3, 3);

        // Act
        let result = apply_line_numbers(&doc, false);

        // Assert
        assert!(result.is_ok());
        assert_eq!(doc.numbering.borrow().last(), Some(&(false, Selection::ALL)));
        assert_eq!(doc.selection(), Selection::caret(3));
    }

    #[test]
    fn rejected_numbering_reports_error_and_restores_selection() {
        // Arrange
        let doc = MemoryDocument::new("first\nsecond").with_selection(2, 8);
        doc.reject_format.set(true);

        // Act
        let result = apply_line_numbers(&doc, true);

        // Assert
        assert!(result.is_err());
        assert_eq!(doc.selection(), Selection::new(2, 8));
    }
}
