//! Inbound event feed: newline-delimited JSON event records.

use std::io::BufRead;

use crate::event::HostEvent;

use super::FeedError;

/// Iterates event records from a line-oriented reader (usually stdin).
///
/// Blank lines are skipped. A malformed line yields an error item and the
/// feed continues; a read error yields one error item and ends the feed.
pub struct EventFeed<R> {
    reader: R,
    line_number: usize,
    finished: bool,
}

impl<R: BufRead> EventFeed<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            finished: false,
        }
    }
}

impl<R: BufRead> Iterator for EventFeed<R> {
    type Item = Result<HostEvent, FeedError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let mut line = Vec::new();
            match self.reader.read_until(b'\n', &mut line) {
                Ok(0) => {
                    self.finished = true;
                    return None;
                }
                Ok(_) => {
                    self.line_number += 1;
                    let record = line.trim_ascii();
                    if record.is_empty() {
                        continue;
                    }
                    // Bytes that are not UTF-8 fail here too, as a bad record.
                    return Some(serde_json::from_slice(record).map_err(|e| {
                        FeedError::Malformed {
                            line: self.line_number,
                            reason: e.to_string(),
                        }
                    }));
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(FeedError::Read(e)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use std::io::Cursor;

    #[test]
    fn test_reads_records_in_order() {
        let input = concat!(
            r#"{"type":"FileAdded","path":"/w/a.md"}"#,
            "\n\n",
            r#"{"type":"FileRemoved","path":"/w/b.md"}"#,
            "\n"
        );
        let events: Vec<HostEvent> = EventFeed::new(Cursor::new(input))
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::FileAdded);
        assert_eq!(events[1].kind, EventKind::FileRemoved);
    }

    #[test]
    fn test_malformed_line_does_not_end_feed() {
        let input = concat!(
            "not json\n",
            r#"{"type":"FileAdded","path":"/w/a.md"}"#,
            "\n"
        );
        let items: Vec<_> = EventFeed::new(Cursor::new(input)).collect();

        assert_eq!(items.len(), 2);
        match &items[0] {
            Err(FeedError::Malformed { line, .. }) => assert_eq!(*line, 1),
            other => panic!("expected malformed error, got {other:?}"),
        }
        assert!(items[1].is_ok());
    }

    #[test]
    fn test_non_utf8_line_is_malformed_and_feed_continues() {
        let mut input = br#"{"type":"FileAdded","path":"/w/a"#.to_vec();
        input.push(0xff);
        input.extend_from_slice(b".md\"}\n");
        input.extend_from_slice(br#"{"type":"FileAdded","path":"/w/b.md"}"#);
        input.push(b'\n');

        let items: Vec<_> = EventFeed::new(Cursor::new(input)).collect();

        assert_eq!(items.len(), 2, "{items:?}");
        assert!(matches!(items[0], Err(FeedError::Malformed { line: 1, .. })));
        let second = items[1].as_ref().unwrap();
        assert_eq!(second.path, std::path::PathBuf::from("/w/b.md"));
    }

    #[test]
    fn test_last_line_without_newline() {
        let input = r#"{"type":"FileAdded","path":"/w/a.md"}"#;
        let events: Vec<_> = EventFeed::new(Cursor::new(input)).collect();
        assert_eq!(events.len(), 1);
    }
}
