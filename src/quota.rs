/// Decision returned by the quota gate for one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// Chunk fits under the limit — write it to the log. The counter has
    /// already been advanced by the chunk length.
    Admit,
    /// This chunk is the first to cross the limit — skip it and emit the
    /// one-time "Stopping log" notice.
    RejectFirst,
    /// Already over the limit — skip silently.
    Reject,
}

/// Cumulative byte quota for the log copy.
///
/// Chunks are admitted or rejected whole, never split. Once a chunk would
/// push the total past the limit the gate latches: every later chunk is
/// rejected and the counter stops advancing. `limit = None` means
/// unbounded.
pub struct QuotaGate {
    limit: Option<u64>,
    written: u64,
    over: bool,
}

impl QuotaGate {
    pub fn new(limit: Option<u64>) -> Self {
        Self {
            limit,
            written: 0,
            over: false,
        }
    }

    /// Offer a chunk of `len` bytes to the gate.
    pub fn admit(&mut self, len: u64) -> QuotaDecision {
        if self.over {
            return QuotaDecision::Reject;
        }
        match self.limit {
            Some(limit) if self.written.saturating_add(len) > limit => {
                self.over = true;
                QuotaDecision::RejectFirst
            }
            _ => {
                self.written += len;
                QuotaDecision::Admit
            }
        }
    }

    /// Bytes admitted so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_under_limit() {
        let mut gate = QuotaGate::new(Some(10));
        assert_eq!(gate.admit(4), QuotaDecision::Admit);
        assert_eq!(gate.admit(4), QuotaDecision::Admit);
        assert_eq!(gate.bytes_written(), 8);
    }

    #[test]
    fn test_admit_exactly_at_limit() {
        let mut gate = QuotaGate::new(Some(10));
        assert_eq!(gate.admit(10), QuotaDecision::Admit);
        assert_eq!(gate.bytes_written(), 10);
        // The very next byte crosses.
        assert_eq!(gate.admit(1), QuotaDecision::RejectFirst);
    }

    #[test]
    fn test_crossing_chunk_rejected_whole() {
        let mut gate = QuotaGate::new(Some(3));
        // A 6-byte chunk against a 3-byte limit is rejected entirely,
        // leaving the counter untouched.
        assert_eq!(gate.admit(6), QuotaDecision::RejectFirst);
        assert_eq!(gate.bytes_written(), 0);
    }

    #[test]
    fn test_reject_first_happens_once() {
        let mut gate = QuotaGate::new(Some(5));
        assert_eq!(gate.admit(3), QuotaDecision::Admit);
        assert_eq!(gate.admit(3), QuotaDecision::RejectFirst);
        assert_eq!(gate.admit(1), QuotaDecision::Reject);
        assert_eq!(gate.admit(100), QuotaDecision::Reject);
        // Counter pinned at the pre-crossing value.
        assert_eq!(gate.bytes_written(), 3);
    }

    #[test]
    fn test_latch_holds_even_for_chunks_that_would_fit() {
        let mut gate = QuotaGate::new(Some(10));
        assert_eq!(gate.admit(8), QuotaDecision::Admit);
        assert_eq!(gate.admit(5), QuotaDecision::RejectFirst);
        // A 1-byte chunk would fit under the limit, but the gate stays shut.
        assert_eq!(gate.admit(1), QuotaDecision::Reject);
        assert_eq!(gate.bytes_written(), 8);
    }

    #[test]
    fn test_unbounded_admits_everything() {
        let mut gate = QuotaGate::new(None);
        assert_eq!(gate.admit(u64::MAX / 2), QuotaDecision::Admit);
        assert_eq!(gate.admit(1024), QuotaDecision::Admit);
    }

    #[test]
    fn test_zero_limit_rejects_first_chunk() {
        let mut gate = QuotaGate::new(Some(0));
        assert_eq!(gate.admit(1), QuotaDecision::RejectFirst);
        assert_eq!(gate.admit(1), QuotaDecision::Reject);
        assert_eq!(gate.bytes_written(), 0);
    }

    #[test]
    fn test_zero_length_chunk_is_admitted() {
        let mut gate = QuotaGate::new(Some(0));
        // An empty chunk never crosses anything.
        assert_eq!(gate.admit(0), QuotaDecision::Admit);
        assert_eq!(gate.bytes_written(), 0);
    }
}
