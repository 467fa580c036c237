use std::fmt;

static COLUMN_SEPARATOR: &str = "   ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Align {
    Left,
    Right,
}

/// Plain text table with a header row and a rule beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Table {
    headers: Vec<(&'static str, Align)>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[(&'static str, Align)]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, (header, _))| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    fn format_row<S: AsRef<str>>(&self, widths: &[usize], cells: &[S]) -> String {
        let mut line = String::new();
        for (i, ((cell, width), (_, align))) in cells
            .iter()
            .zip(widths)
            .zip(&self.headers)
            .enumerate()
        {
            if i > 0 {
                line.push_str(COLUMN_SEPARATOR);
            }
            let cell = cell.as_ref();
            let padding = " ".repeat(width.saturating_sub(cell.chars().count()));
            match align {
                Align::Left => {
                    line.push_str(cell);
                    line.push_str(&padding);
                }
                Align::Right => {
                    line.push_str(&padding);
                    line.push_str(cell);
                }
            }
        }
        line.trim_end().to_owned()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let widths = self.widths();
        let headers: Vec<_> = self.headers.iter().map(|(header, _)| *header).collect();
        writeln!(f, "{}", self.format_row(&widths, &headers))?;
        let rule_len =
            widths.iter().sum::<usize>() + COLUMN_SEPARATOR.len() * widths.len().saturating_sub(1);
        write!(f, "{}", "=".repeat(rule_len))?;
        for row in &self.rows {
            write!(f, "\n{}", self.format_row(&widths, row))?;
        }
        Ok(())
    }
}

/// Formats `n` with `,` between groups of three digits.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
