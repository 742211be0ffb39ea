//! Byte columns to visible columns

use crate::infrastructure::XrefDatabase;

/// Visible column of the character starting at 1-based byte column
/// `byte_column` of `line`, with tabs advancing to the next multiple of
/// `tab_width` (plus one). Columns past the end of the line count one per byte.
pub fn to_visible_column(line: &str, byte_column: usize, tab_width: u32) -> i32 {
    let tab_width = tab_width.max(1) as i32;
    let target = byte_column.saturating_sub(1);
    let mut visible = 1i32;
    let mut consumed = 0usize;

    for (offset, ch) in line.char_indices() {
        if offset >= target {
            return visible;
        }
        visible = if ch == '\t' {
            ((visible - 1) / tab_width + 1) * tab_width + 1
        } else {
            visible + 1
        };
        consumed = offset + ch.len_utf8();
    }

    visible + target.saturating_sub(consumed) as i32
}

/// Inverse of `to_visible_column`: 1-based byte column of the character
/// covering `visible_column`
pub fn to_byte_column(line: &str, visible_column: i32, tab_width: u32) -> usize {
    let tab_width = tab_width.max(1) as i32;
    let mut visible = 1i32;

    for (offset, ch) in line.char_indices() {
        let next = if ch == '\t' {
            ((visible - 1) / tab_width + 1) * tab_width + 1
        } else {
            visible + 1
        };
        if visible_column < next {
            return offset + 1;
        }
        visible = next;
    }

    line.len() + 1 + (visible_column - visible).max(0) as usize
}

impl XrefDatabase {
    /// `to_visible_column` with the configured tab width
    pub fn visible_column(&self, line: &str, byte_column: usize) -> i32 {
        to_visible_column(line, byte_column, self.config().tab_width)
    }
}
