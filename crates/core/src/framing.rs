//! Newline reassembly over arbitrarily chunked byte streams.
//!
//! Process pipes deliver bytes in whatever chunk sizes the OS feels like;
//! a protocol line can be split across reads or share a chunk with several
//! neighbors. [`LineFramer`] carries the partial tail between `feed` calls
//! so callers always observe complete lines, in write order.

/// Incremental newline framer for one process output stream.
///
/// Not safe for concurrent feeding; use one framer per stream. Blank
/// lines are returned as-is; dropping them is the caller's decision.
#[derive(Debug, Default)]
pub struct LineFramer {
    carry: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line completed by it.
    ///
    /// A trailing fragment without a newline stays in the carry buffer
    /// until a later chunk (or [`finish`](Self::finish)) completes it.
    /// Carriage returns before the newline are stripped; invalid UTF-8 is
    /// replaced rather than dropped.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();

        for &byte in chunk {
            if byte == b'\n' {
                if self.carry.last() == Some(&b'\r') {
                    self.carry.pop();
                }
                lines.push(String::from_utf8_lossy(&self.carry).into_owned());
                self.carry.clear();
            } else {
                self.carry.push(byte);
            }
        }

        lines
    }

    /// Flush the carry buffer at end-of-stream.
    ///
    /// Returns the unterminated final line, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.carry.is_empty() {
            return None;
        }
        if self.carry.last() == Some(&b'\r') {
            self.carry.pop();
        }
        let line = String::from_utf8_lossy(&self.carry).into_owned();
        self.carry.clear();
        if line.is_empty() {
            None
        } else {
            Some(line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_complete_line() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.feed(b"hello\n"), vec!["hello".to_string()]);
        assert_eq!(framer.finish(), None);
    }

    #[test]
    fn test_line_split_at_every_possible_point() {
        let line = b"STATUS|LOOP_START|12\n";
        for split in 0..line.len() {
            let mut framer = LineFramer::new();
            let mut lines = framer.feed(&line[..split]);
            lines.extend(framer.feed(&line[split..]));
            assert_eq!(
                lines,
                vec!["STATUS|LOOP_START|12".to_string()],
                "failed at split point {split}"
            );
        }
    }

    #[test]
    fn test_multiple_lines_in_one_chunk() {
        let mut framer = LineFramer::new();
        let lines = framer.feed(b"a\nb\nc\n");
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_trailing_data_held_until_completed() {
        let mut framer = LineFramer::new();
        let lines = framer.feed(b"A\nB\nC");
        assert_eq!(lines, vec!["A", "B"]);

        // "C" stays pending until further input arrives.
        let lines = framer.feed(b"D\n");
        assert_eq!(lines, vec!["CD"]);
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut framer = LineFramer::new();
        assert!(framer.feed(b"partial").is_empty());
        assert_eq!(framer.finish(), Some("partial".to_string()));
        assert_eq!(framer.finish(), None);
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut framer = LineFramer::new();
        let lines = framer.feed(b"one\r\ntwo\r\n");
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn test_blank_lines_are_not_dropped() {
        let mut framer = LineFramer::new();
        let lines = framer.feed(b"a\n\nb\n");
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn test_split_chunks_equal_unsplit_feed() {
        let data = b"first\nsecond\nthird\n";
        let mut unsplit = LineFramer::new();
        let expected = unsplit.feed(data);

        for split in 0..data.len() {
            let mut framer = LineFramer::new();
            let mut lines = framer.feed(&data[..split]);
            lines.extend(framer.feed(&data[split..]));
            assert_eq!(lines, expected, "failed at split point {split}");
        }
    }
}
