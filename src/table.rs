//! Monospace tables for the stats commands.

use std::fmt::Write;

/// Rows of text, padded into columns inside a code block.
#[derive(Debug, Clone, Default)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: vec![],
        }
    }

    pub fn add_row<S: ToString>(&mut self, cells: impl IntoIterator<Item = S>) {
        self.rows.push(cells.into_iter().map(|c| c.to_string()).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(i) {
                    Some(width) => *width = (*width).max(len),
                    None => widths.push(len),
                }
            }
        }
        widths
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let mut out = String::from("```\n");

        let mut line = |cells: &[String]| {
            let mut text = String::new();
            for (cell, width) in cells.iter().zip(&widths) {
                let _ = write!(text, "{:<width$}  ", cell, width = width);
            }
            out.push_str(text.trim_end());
            out.push('\n');
        };

        line(&self.headers[..]);
        for row in &self.rows {
            line(&row[..]);
        }

        out.push_str("```");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_padded_to_the_widest_cell() {
        let mut table = TextTable::new(["#", "Player", "Don"]);
        table.add_row(["1", "mathsman", "1200"]);
        table.add_row(["10", "ab", "3"]);

        assert_eq!(
            table.render(),
            "```\n\
             #   Player    Don\n\
             1   mathsman  1200\n\
             10  ab        3\n\
             ```"
        );
    }

    #[test]
    fn empty_tables_still_have_headers() {
        let table = TextTable::new(["#", "Player"]);
        assert!(table.is_empty());
        assert_eq!(table.render(), "```\n#  Player\n```");
    }
}
