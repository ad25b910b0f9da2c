//! Bounded message buffer
//!
//! Holds the most recent inbound feed payloads for the consumer. Appends are
//! O(1) amortized; once the buffer is full the oldest entry is evicted, so
//! memory stays bounded regardless of feed volume or session length.

use super::types::FeedMessage;
use std::collections::VecDeque;

/// Default number of retained messages
pub const DEFAULT_SINK_CAPACITY: usize = 500;

/// FIFO-evicting buffer of inbound feed messages
///
/// Insertion order is arrival order. Written only by the connection manager;
/// read only by the owning consumer through [`snapshot`](Self::snapshot).
#[derive(Debug)]
pub struct MessageSink {
    messages: VecDeque<FeedMessage>,
    capacity: usize,
    total_appended: u64,
}

impl MessageSink {
    /// Create an empty sink with the given capacity
    ///
    /// A zero capacity is bumped to one so an append always retains the
    /// newest message.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
            total_appended: 0,
        }
    }

    /// Append a message, evicting the oldest entry if at capacity
    pub fn append(&mut self, message: FeedMessage) {
        if self.messages.len() == self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
        self.total_appended += 1;
    }

    /// Point-in-time copy of the retained messages, oldest first
    pub fn snapshot(&self) -> Vec<FeedMessage> {
        self.messages.iter().cloned().collect()
    }

    /// Remove all retained messages
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Number of currently retained messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the sink holds no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Maximum number of retained messages
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Messages appended over the sink's lifetime, including evicted ones
    pub fn total_appended(&self) -> u64 {
        self.total_appended
    }
}

impl Default for MessageSink {
    fn default() -> Self {
        Self::new(DEFAULT_SINK_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> FeedMessage {
        FeedMessage::from_text(text.to_string())
    }

    #[test]
    fn test_new_sink_is_empty() {
        let sink = MessageSink::new(10);
        assert!(sink.is_empty());
        assert_eq!(sink.len(), 0);
        assert_eq!(sink.capacity(), 10);
        assert_eq!(sink.total_appended(), 0);
    }

    #[test]
    fn test_append_under_capacity() {
        let mut sink = MessageSink::new(5);
        sink.append(raw("a"));
        sink.append(raw("b"));

        assert_eq!(sink.len(), 2);
        let snapshot = sink.snapshot();
        assert_eq!(snapshot[0].raw_text(), Some("a"));
        assert_eq!(snapshot[1].raw_text(), Some("b"));
    }

    #[test]
    fn test_append_evicts_oldest() {
        let mut sink = MessageSink::new(3);
        for text in ["a", "b", "c", "d", "e"] {
            sink.append(raw(text));
        }

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.total_appended(), 5);
        let texts: Vec<_> = sink
            .snapshot()
            .iter()
            .filter_map(|m| m.raw_text().map(str::to_string))
            .collect();
        assert_eq!(texts, vec!["c", "d", "e"]);
    }

    #[test]
    fn test_snapshot_is_point_in_time() {
        let mut sink = MessageSink::new(3);
        sink.append(raw("a"));
        let snapshot = sink.snapshot();
        sink.append(raw("b"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut sink = MessageSink::new(3);
        sink.append(raw("a"));
        sink.append(raw("b"));
        sink.clear();

        assert!(sink.is_empty());
        // lifetime counter is not reset by clear
        assert_eq!(sink.total_appended(), 2);
    }

    #[test]
    fn test_zero_capacity_retains_newest() {
        let mut sink = MessageSink::new(0);
        sink.append(raw("a"));
        sink.append(raw("b"));

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.snapshot()[0].raw_text(), Some("b"));
    }
}
