//! 执行历史 - 编排器保留的跨调用记录，带容量上限

use std::collections::VecDeque;

use crate::types::workflow::ExecutionHistoryEntry;

/// 有界执行历史，超出容量淘汰最旧记录
pub struct ExecutionHistory {
    entries: VecDeque<ExecutionHistoryEntry>,
    capacity: usize,
}

impl ExecutionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, entry: ExecutionHistoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> Vec<ExecutionHistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(query: &str) -> ExecutionHistoryEntry {
        ExecutionHistoryEntry {
            workflow_id: Uuid::new_v4(),
            query: query.to_string(),
            duration: 1.0,
            steps_executed: vec!["research".to_string()],
            success: true,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_push_and_snapshot() {
        let mut history = ExecutionHistory::new(8);
        history.push(entry("first"));
        history.push(entry("second"));

        let snapshot = history.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].query, "first");
        assert_eq!(snapshot[1].query, "second");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = ExecutionHistory::new(2);
        history.push(entry("first"));
        history.push(entry("second"));
        history.push(entry("third"));

        let snapshot = history.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].query, "second");
        assert_eq!(snapshot[1].query, "third");
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut history = ExecutionHistory::new(0);
        history.push(entry("only"));
        assert_eq!(history.len(), 1);
    }
}
