//! A growable tape with a read/write head.
//!
//! The tape is conceptually bi-infinite; physically it is a window that
//! grows by one blank cell whenever the head steps past either end. The
//! head index is valid at all times, so `read` and `write` never fail.

use serde::{Deserialize, Serialize};

/// The engine's mutable symbol storage, addressed by a head position.
///
/// Moving the head never fails: stepping outside the physical bounds inserts
/// exactly one blank at that end and renormalizes the index. Because the
/// head travels with the tape, handing a `Tape` value to a submachine hands
/// over the position as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tape {
    cells: Vec<char>,
    head: usize,
    blank: char,
}

impl Tape {
    /// Creates a tape from its initial contents with the head on cell 0.
    ///
    /// An empty `content` yields a single blank cell, so the head is valid
    /// from the start.
    pub fn new(content: &str, blank: char) -> Self {
        let mut cells: Vec<char> = content.chars().collect();
        if cells.is_empty() {
            cells.push(blank);
        }

        Self {
            cells,
            head: 0,
            blank,
        }
    }

    /// Returns the symbol under the head.
    pub fn read(&self) -> char {
        self.cells[self.head]
    }

    /// Replaces the symbol under the head.
    pub fn write(&mut self, symbol: char) {
        self.cells[self.head] = symbol;
    }

    /// Moves the head one cell to the left, extending the tape with a blank
    /// if the head was already on the leftmost cell.
    pub fn move_left(&mut self) {
        if self.head == 0 {
            self.cells.insert(0, self.blank);
        } else {
            self.head -= 1;
        }
    }

    /// Moves the head one cell to the right, extending the tape with a blank
    /// if the head steps past the rightmost cell.
    pub fn move_right(&mut self) {
        self.head += 1;
        if self.head >= self.cells.len() {
            self.cells.push(self.blank);
        }
    }

    /// Replaces the tape contents and rewinds the head to cell 0.
    pub fn set_content(&mut self, content: &str) {
        self.cells = content.chars().collect();
        if self.cells.is_empty() {
            self.cells.push(self.blank);
        }
        self.head = 0;
    }

    /// Current head position.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Physical tape length. Grows monotonically, never shrinks.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false: the tape holds at least one cell.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The blank symbol this tape pads with.
    pub fn blank(&self) -> char {
        self.blank
    }

    /// The raw cells.
    pub fn cells(&self) -> &[char] {
        &self.cells
    }

    /// The tape contents as a string.
    pub fn contents(&self) -> String {
        self.cells.iter().collect()
    }

    /// The tape contents with leading and trailing blanks stripped. Useful
    /// for reading off a result region.
    pub fn trimmed(&self) -> String {
        self.contents()
            .trim_matches(self.blank)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_and_write() {
        let mut tape = Tape::new("101", ' ');

        assert_eq!(tape.read(), '1');
        tape.write('0');
        assert_eq!(tape.read(), '0');
        assert_eq!(tape.contents(), "001");
    }

    #[test]
    fn test_empty_content_yields_one_blank_cell() {
        let tape = Tape::new("", '-');

        assert_eq!(tape.len(), 1);
        assert_eq!(tape.read(), '-');
    }

    #[test]
    fn test_move_right_grows_at_edge() {
        let mut tape = Tape::new("ab", ' ');

        tape.move_right();
        assert_eq!(tape.head(), 1);
        assert_eq!(tape.len(), 2);

        tape.move_right();
        assert_eq!(tape.head(), 2);
        assert_eq!(tape.len(), 3);
        assert_eq!(tape.read(), ' ');
    }

    #[test]
    fn test_move_left_grows_at_edge() {
        let mut tape = Tape::new("ab", ' ');

        tape.move_left();
        assert_eq!(tape.head(), 0);
        assert_eq!(tape.len(), 3);
        assert_eq!(tape.contents(), " ab");

        // The head landed on the inserted blank, not past it.
        assert_eq!(tape.read(), ' ');
    }

    #[test]
    fn test_growth_is_at_most_one_cell_per_move() {
        let mut tape = Tape::new("x", ' ');

        for _ in 0..10 {
            let before = tape.len();
            tape.move_left();
            assert!(tape.len() - before <= 1);

            let before = tape.len();
            tape.move_right();
            assert!(tape.len() - before <= 1);
        }
    }

    #[test]
    fn test_head_always_within_bounds() {
        let mut tape = Tape::new("01", ' ');

        for i in 0..50 {
            if i % 3 == 0 {
                tape.move_left();
            } else {
                tape.move_right();
            }
            assert!(tape.head() < tape.len());
        }
    }

    #[test]
    fn test_set_content_rewinds_head() {
        let mut tape = Tape::new("111", ' ');
        tape.move_right();
        tape.move_right();

        tape.set_content("0");
        assert_eq!(tape.head(), 0);
        assert_eq!(tape.contents(), "0");
    }

    #[test]
    fn test_trimmed_strips_blanks_only() {
        let mut tape = Tape::new(" 1000 11 ", ' ');
        assert_eq!(tape.trimmed(), "1000 11");

        tape.set_content("01 ");
        assert_eq!(tape.trimmed(), "01");
    }
}
