//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Results go to stdout; progress, warnings and errors go to stderr so that
//! `cat` output and `resolve` lines can be piped. Everything except errors
//! respects the quiet flag.

use std::fmt::Display;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    #[default]
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a progress line to stderr (respects quiet mode).
pub fn progress(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Left-aligned text columns.
///
/// Every cell except the last in its row is padded to the widest cell of
/// its column plus a gap, with a floor of `min_width`. Rows may have
/// different lengths.
///
/// ```
/// use tagsmith::ui::output::Columns;
///
/// let mut cols = Columns::new(4);
/// cols.row(["a", "bb"]);
/// cols.row(["ccccc", "d"]);
/// assert_eq!(cols.render(), "a      bb\nccccc  d\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Columns {
    rows: Vec<Vec<String>>,
    min_width: usize,
}

/// Spaces between columns.
const GAP: usize = 2;

impl Columns {
    pub fn new(min_width: usize) -> Self {
        Self {
            rows: Vec::new(),
            min_width,
        }
    }

    /// Append a row.
    pub fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    /// Append a line that takes no part in alignment, such as a heading.
    pub fn line(&mut self, text: impl Into<String>) {
        self.rows.push(vec![text.into()]);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = Vec::new();
        for row in &self.rows {
            // The last cell never pads, so it does not widen its column
            for (i, cell) in row.iter().enumerate().take(row.len().saturating_sub(1)) {
                let width = cell.chars().count() + GAP;
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(width),
                    None => widths.push(width.max(self.min_width)),
                }
            }
        }

        let mut out = String::new();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                out.push_str(cell);
                if i + 1 < row.len() {
                    let pad = widths[i].saturating_sub(cell.chars().count());
                    out.extend(std::iter::repeat(' ').take(pad));
                }
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    mod columns {
        use super::*;

        #[test]
        fn min_width_applies() {
            let mut cols = Columns::new(8);
            cols.row(["a", "b", "c"]);
            assert_eq!(cols.render(), "a       b       c\n");
        }

        #[test]
        fn ragged_rows() {
            let mut cols = Columns::new(0);
            cols.row(["one", "two", "three"]);
            cols.row(["four"]);
            assert_eq!(cols.render(), "one  two  three\nfour\n");
        }

        #[test]
        fn heading_lines_do_not_widen() {
            let mut cols = Columns::new(0);
            cols.line("a-very-long-heading:");
            cols.row(["x", "y"]);
            assert_eq!(cols.render(), "a-very-long-heading:\nx  y\n");
        }

        #[test]
        fn empty_renders_nothing() {
            assert!(Columns::new(4).is_empty());
            assert_eq!(Columns::new(4).render(), "");
        }
    }
}
