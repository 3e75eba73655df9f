/*
 * Status bar text for the current selection.
 *
 * Values are one-based. The end position is the character just before the
 * selection end, so a caret (empty selection) yields an end one below its
 * start; such "backward" pairs are shown smaller first with a comma, which
 * reads as "caret before this position" rather than as a range.
 */
use super::document::TextDocument;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionStatus {
    pub line: i32,
    pub line_end: i32,
    pub char: i32,
    pub char_end: i32,
    pub char_on_line: i32,
    pub char_on_line_end: i32,
    pub zoom_percent: f64,
}

impl SelectionStatus {
    pub fn compute(doc: &dyn TextDocument, zoom_percent: f64) -> Self {
        let selection = doc.selection();

        let line = doc.line_from_char(selection.start) + 1;
        let char = selection.start + 1;
        let line_start = doc.line_start(line - 1);

        let (line_end, char_end, char_on_line, char_on_line_end) = if selection.end != 0 {
            let line_end = doc.line_from_char(selection.end - 1) + 1;
            let line_end_start = doc.line_start(line_end - 1);
            (
                line_end,
                selection.end,
                selection.start - line_start + 1,
                selection.end - line_end_start,
            )
        } else {
            (0, 0, 1, 0)
        };

        SelectionStatus {
            line,
            line_end,
            char,
            char_end,
            char_on_line,
            char_on_line_end,
            zoom_percent,
        }
    }

    /// The four status bar cells, in part order.
    pub fn cells(&self) -> [String; 4] {
        let line_char = if self.char == self.char_end {
            format!("{}:{}", self.line, self.char_on_line)
        } else if self.char_end < self.char {
            format!(
                "{}:{},{}:{}",
                self.line_end, self.char_on_line_end, self.line, self.char_on_line
            )
        } else {
            format!(
                "{}:{}-{}:{}",
                self.line, self.char_on_line, self.line_end, self.char_on_line_end
            )
        };

        [
            format!("Line = {}", range_cell(self.line, self.line_end)),
            format!("Character = {}", range_cell(self.char, self.char_end)),
            format!("Line:Character = {line_char}"),
            format!("Zoom = {}%", self.zoom_percent.round() as i64),
        ]
    }
}

pub fn range_cell(start: i32, end: i32) -> String {
    if start == end {
        start.to_string()
    } else if end < start {
        format!("{end},{start}")
    } else {
        format!("{start}-{end}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_viewer::document::testing::MemoryDocument;

    const TEXT: &str = "alpha\nbeta\ngamma\n";

    #[test]
    fn range_cell_orders_and_separates() {
        assert_eq!(range_cell(5, 5), "5");
        assert_eq!(range_cell(7, 5), "5,7");
        assert_eq!(range_cell(3, 9), "3-9");
    }

    #[test]
    fn forward_selection_across_lines_uses_dashes() {
        // Arrange: "pha\nbe" from line 1 col 3 to line 2 col 2
        let doc = MemoryDocument::new(TEXT).with_selection(2, 8);

        // Act
        let status = SelectionStatus::compute(&doc, 100.0);

        // Assert
        assert_eq!(
            status.cells(),
            [
                "Line = 1-2".to_string(),
                "Character = 3-8".to_string(),
                "Line:Character = 1:3-2:2".to_string(),
                "Zoom = 100%".to_string(),
            ]
        );
    }

    #[test]
    fn caret_at_line_start_reads_as_before_position() {
        // Arrange: caret at the start of "beta"
        let doc = MemoryDocument::new(TEXT).with_selection(6, 6);

        // Act
        let cells = SelectionStatus::compute(&doc, 100.0).cells();

        // Assert
        assert_eq!(cells[0], "Line = 1,2");
        assert_eq!(cells[1], "Character = 6,7");
        assert_eq!(cells[2], "Line:Character = 1:6,2:1");
    }

    #[test]
    fn caret_at_document_start_has_zero_end() {
        // Arrange
        let doc = MemoryDocument::new(TEXT);

        // Act
        let status = SelectionStatus::compute(&doc, 97.4);

        // Assert
        assert_eq!(status.line_end, 0);
        assert_eq!(status.char_on_line, 1);
        assert_eq!(status.cells()[0], "Line = 0,1");
        assert_eq!(status.cells()[3], "Zoom = 97%");
    }
}
