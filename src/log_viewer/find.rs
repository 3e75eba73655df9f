/*
 * Find / find again over a `TextDocument`.
 *
 * Forward searches start at the selection end and restore the selection
 * when nothing matches. Backward searches run from the selection start
 * towards the beginning of the document. A match becomes the selection.
 */
use super::document::{SearchFlags, Selection, TextDocument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindRequest {
    pub text: String,
    pub flags: SearchFlags,
}

/// Last request issued from the find dialog; lives as long as the viewer.
#[derive(Debug, Default)]
pub struct FindState {
    last: Option<FindRequest>,
}

impl FindState {
    pub fn has_search(&self) -> bool {
        self.last.is_some()
    }

    pub fn last(&self) -> Option<&FindRequest> {
        self.last.as_ref()
    }

    pub fn remember(&mut self, request: FindRequest) {
        self.last = Some(request);
    }

    /*
     * Repeats the last search in the given direction. The direction sticks
     * for later repeats, as if toggled in the dialog.
     */
    pub fn again(&mut self, forward: bool) -> Option<&FindRequest> {
        let request = self.last.as_mut()?;
        request.flags.forward = forward;
        Some(request)
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

pub fn find(doc: &dyn TextDocument, request: &FindRequest) -> Option<Selection> {
    if request.text.is_empty() {
        return None;
    }

    let current = doc.selection();
    let found = if request.flags.forward {
        doc.set_selection(Selection::caret(current.end));
        let found = doc.find_text(&request.text, current.end, -1, request.flags);
        if found.is_none() {
            doc.set_selection(current);
        }
        found
    } else {
        doc.find_text(&request.text, current.start, 0, request.flags)
    };

    if let Some(range) = found {
        doc.set_selection(range);
        doc.scroll_to_caret();
    } else {
        log::debug!("Find: '{}' not found.", request.text);
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_viewer::document::testing::MemoryDocument;

    const TEXT: &str = "Error one\nwarning\nerror two\nterror";

    fn request(text: &str, forward: bool) -> FindRequest {
        FindRequest {
            text: text.to_string(),
            flags: SearchFlags {
                forward,
                ..SearchFlags::default()
            },
        }
    }

    #[test]
    fn forward_search_starts_after_selection_and_selects_match() {
        // Arrange
        let doc = MemoryDocument::new(TEXT).with_selection(0, 5);

        // Act
        let found = find(&doc, &request("error", true));

        // Assert
        assert_eq!(found, Some(Selection::new(18, 23)));
        assert_eq!(doc.selection(), Selection::new(18, 23));
    }

    #[test]
    fn forward_miss_restores_previous_selection() {
        // Arrange
        let doc = MemoryDocument::new(TEXT).with_selection(3, 6);

        // Act
        let found = find(&doc, &request("missing", true));

        // Assert
        assert_eq!(found, None);
        assert_eq!(doc.selection(), Selection::new(3, 6));
    }

    #[test]
    fn backward_search_runs_from_selection_start_to_zero() {
        // Arrange
        let doc = MemoryDocument::new(TEXT).with_selection(18, 23);

        // Act
        let found = find(&doc, &request("error", false));

        // Assert
        assert_eq!(found, Some(Selection::new(0, 5)));
        assert_eq!(doc.searches.borrow().last(), Some(&(18, 0, false)));
    }

    #[test]
    fn match_case_and_whole_word_narrow_results() {
        // Arrange
        let doc = MemoryDocument::new(TEXT).with_selection(19, 19);
        let mut req = request("error", true);
        req.flags.whole_word = true;

        // Act
        let whole_word = find(&doc, &req);
        doc.set_selection(Selection::caret(0));
        req.flags.whole_word = false;
        req.flags.match_case = true;
        req.text = "Error".to_string();
        let exact_case = find(&doc, &req);

        // Assert
        assert_eq!(whole_word, None);
        assert_eq!(exact_case, Some(Selection::new(0, 5)));
    }

    #[test]
    fn find_again_reuses_text_with_new_direction() {
        // Arrange
        let mut state = FindState::default();
        assert!(state.again(true).is_none());
        state.remember(request("two", false));

        // Act
        let repeated = state.again(true).cloned();

        // Assert
        assert!(state.has_search());
        assert_eq!(repeated.map(|r| (r.text, r.flags.forward)), Some(("two".to_string(), true)));
        state.clear();
        assert!(!state.has_search());
    }

    #[test]
    fn last_request_keeps_direction_chosen_by_find_again() {
        // Arrange
        let mut state = FindState::default();
        state.remember(request("error", true));

        // Act
        state.again(false);

        // Assert
        let last = state.last().cloned();
        assert_eq!(last.map(|r| (r.text, r.flags.forward)), Some(("error".to_string(), false)));
    }
}
