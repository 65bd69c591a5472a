use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Счётчик запросов, по которому отбрасываются устаревшие ответы.
///
/// Каждый новый запрос берёт [`Ticket`]; применять результат можно только
/// если за это время не был выдан более новый билет.
#[derive(Debug, Clone, Default)]
pub struct RequestSeq {
    latest: Arc<AtomicU64>,
}

/// Билет конкретного запроса.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl RequestSeq {
    /// Новый счётчик.
    pub fn new() -> Self {
        Self::default()
    }

    /// Регистрирует новый запрос; все ранее выданные билеты устаревают.
    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Является ли билет последним выданным.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_request_invalidates_older_ticket() {
        let seq = RequestSeq::new();
        let first = seq.begin();
        assert!(seq.is_current(first));

        let second = seq.clone().begin();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }
}
