/// A plain text body viewed as numbered lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTextDocument {
    last_line_number: usize,
}

impl RawTextDocument {
    pub fn new(text: &str) -> Self {
        let last_line_number = text.bytes().filter(|&b| b == b'\n').count() + 1;
        Self { last_line_number }
    }

    pub fn last_line_number(&self) -> usize {
        self.last_line_number
    }

    /// Whether the 1-based `line` exists.
    pub fn has_line(&self, line: usize) -> bool {
        line >= 1 && line <= self.last_line_number
    }

    /// Whether `start..=end` is a non-empty range of existing lines.
    pub fn has_lines(&self, start: usize, end: usize) -> bool {
        start <= end && self.has_line(start) && self.has_line(end)
    }
}
