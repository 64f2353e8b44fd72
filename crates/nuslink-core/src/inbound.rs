//! Bounded log of inbound lines

use std::collections::VecDeque;

/// FIFO buffer of decoded notifications, evicting the oldest entry once full
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundLog {
    entries: VecDeque<String>,
    capacity: usize,
    /// Entries appended over the log's lifetime; survives eviction and `clear`
    appended: u64,
}

impl InboundLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            appended: 0,
        }
    }

    pub fn push(&mut self, entry: String) {
        self.appended += 1;
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sequence number of the newest entry, counting from 1
    pub fn appended(&self) -> u64 {
        self.appended
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest() {
        let mut log = InboundLog::new(3);
        for i in 1..=5 {
            log.push(format!("d{}", i));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.to_vec(), vec!["d3", "d4", "d5"]);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut log = InboundLog::new(100);
        for i in 0..250 {
            log.push(i.to_string());
            assert!(log.len() <= log.capacity());
        }
        assert_eq!(log.iter().next().map(String::as_str), Some("150"));
    }

    #[test]
    fn test_appended_counts_past_eviction_and_clear() {
        let mut log = InboundLog::new(2);
        for _ in 0..3 {
            log.push("OK".to_string());
        }
        assert_eq!(log.to_vec(), vec!["OK", "OK"]);
        assert_eq!(log.appended(), 3);

        log.clear();
        log.push("OK".to_string());
        assert_eq!(log.appended(), 4);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut log = InboundLog::new(0);
        log.push("ignored".to_string());
        assert!(log.is_empty());
    }
}
