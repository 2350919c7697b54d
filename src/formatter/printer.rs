//! Width-aware pretty printer
//!
//! Lists stay on the line of their keyword while they fit in the
//! 120-character target width, and break one item per line otherwise.

/// Target line width
pub const TARGET_WIDTH: usize = 120;

/// Indentation size (2 spaces)
pub const INDENT_SIZE: usize = 2;

/// Pretty printer state
pub struct Printer {
    output: String,
    current_line_width: usize,
    indent_level: usize,
}

impl Printer {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            current_line_width: 0,
            indent_level: 0,
        }
    }

    /// Write text to output
    pub fn write(&mut self, text: &str) {
        self.output.push_str(text);
        self.current_line_width += text.chars().count();
    }

    /// Write a newline and indent
    pub fn newline(&mut self) {
        self.output.push('\n');
        let indent = " ".repeat(self.indent_level * INDENT_SIZE);
        self.output.push_str(&indent);
        self.current_line_width = indent.len();
    }

    /// Increase indentation level
    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    /// Decrease indentation level
    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    /// Check if adding text would exceed target width
    pub fn would_exceed_width(&self, text: &str) -> bool {
        self.current_line_width + text.chars().count() > TARGET_WIDTH
    }

    /// Write `keyword` followed by a comma separated list.
    ///
    /// The list is written inline when it fits, otherwise each item goes on
    /// its own line one level deeper.
    pub fn write_list(&mut self, keyword: &str, items: &[String]) {
        self.write(keyword);
        let inline = format!(" {}", items.join(", "));
        if !self.would_exceed_width(&inline) {
            self.write(&inline);
            return;
        }

        self.indent();
        for (i, item) in items.iter().enumerate() {
            self.newline();
            self.write(item);
            if i + 1 < items.len() {
                self.write(",");
            }
        }
        self.dedent();
    }

    /// Get the output string
    pub fn finish(self) -> String {
        self.output
    }
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}
