//! Оптимистичное добавление записей (вопросы чат-боту, комментарии).
//!
//! Запись попадает в журнал сразу в состоянии `Pending`, а `Ticket`
//! запоминает её позицию в момент отправки. Ответ, пришедший позже, заменяет
//! именно эту запись, даже если более поздние отправки завершились раньше.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Идентификатор записи, выданный при отправке.
pub struct Ticket {
    index: usize,
    generation: u64,
}

impl Ticket {
    /// Позиция записи в журнале.
    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Состояние записи.
pub enum EntryState<T> {
    /// Ждём ответа.
    Pending,
    /// Ответ получен.
    Resolved(T),
    /// Запрос не удался; повтор только вручную.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Запись журнала: то, что отправили, и чем это закончилось.
pub struct Entry<P, T> {
    /// Отправленные данные.
    pub payload: P,
    /// Результат.
    pub state: EntryState<T>,
}

impl<P, T> Entry<P, T> {
    /// Ждём ли ещё ответа.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, EntryState::Pending)
    }
}

#[derive(Debug, Clone)]
/// Журнал оптимистичных отправок.
pub struct SubmissionLog<P, T> {
    entries: Vec<Entry<P, T>>,
    generation: u64,
}

impl<P, T> SubmissionLog<P, T> {
    /// Пустой журнал.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            generation: 0,
        }
    }

    /// Добавляет запись в состоянии `Pending`.
    pub fn submit(&mut self, payload: P) -> Ticket {
        self.entries.push(Entry {
            payload,
            state: EntryState::Pending,
        });
        Ticket {
            index: self.entries.len() - 1,
            generation: self.generation,
        }
    }

    fn pending_mut(&mut self, ticket: Ticket) -> Option<&mut Entry<P, T>> {
        if ticket.generation != self.generation {
            return None;
        }
        self.entries
            .get_mut(ticket.index)
            .filter(|entry| entry.is_pending())
    }

    /// Подставляет ответ в запись `ticket`. `false`, если запись уже закрыта
    /// или журнал был очищен после отправки.
    pub fn resolve(&mut self, ticket: Ticket, value: T) -> bool {
        match self.pending_mut(ticket) {
            Some(entry) => {
                entry.state = EntryState::Resolved(value);
                true
            }
            None => false,
        }
    }

    /// Помечает запись `ticket` как неудачную.
    pub fn fail(&mut self, ticket: Ticket) -> bool {
        match self.pending_mut(ticket) {
            Some(entry) => {
                entry.state = EntryState::Failed;
                true
            }
            None => false,
        }
    }

    /// Запись по билету.
    pub fn get(&self, ticket: Ticket) -> Option<&Entry<P, T>> {
        if ticket.generation != self.generation {
            return None;
        }
        self.entries.get(ticket.index)
    }

    /// Все записи в порядке отправки.
    pub fn entries(&self) -> &[Entry<P, T>] {
        &self.entries
    }

    /// Число записей, ждущих ответа.
    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_pending()).count()
    }

    /// Очищает журнал. Ранее выданные билеты больше ничего не меняют.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.generation += 1;
    }
}

impl<P, T> Default for SubmissionLog<P, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_appends_pending_entry() {
        let mut log = SubmissionLog::<&str, &str>::new();
        let ticket = log.submit("q1");
        assert_eq!(ticket.index(), 0);
        assert_eq!(log.entries().len(), 1);
        assert!(log.entries()[0].is_pending());
    }

    #[test]
    fn out_of_order_completion_updates_the_right_entry() {
        let mut log = SubmissionLog::new();
        let first = log.submit("first");
        let second = log.submit("second");
        let third = log.submit("third");

        assert!(log.resolve(third, "answer-3"));
        assert!(log.fail(second));
        assert!(log.resolve(first, "answer-1"));

        let states: Vec<_> = log.entries().iter().map(|e| e.state.clone()).collect();
        assert_eq!(
            states,
            vec![
                EntryState::Resolved("answer-1"),
                EntryState::Failed,
                EntryState::Resolved("answer-3"),
            ]
        );
        assert_eq!(log.pending_count(), 0);
    }

    #[test]
    fn entry_is_closed_only_once() {
        let mut log = SubmissionLog::new();
        let ticket = log.submit("q");
        assert!(log.resolve(ticket, 1));
        assert!(!log.fail(ticket));
        assert!(!log.resolve(ticket, 2));
        assert_eq!(log.get(ticket).map(|e| e.state.clone()), Some(EntryState::Resolved(1)));
    }

    #[test]
    fn stale_ticket_after_clear_is_ignored() {
        let mut log = SubmissionLog::new();
        let stale = log.submit("old");
        log.clear();
        let fresh = log.submit("new");

        assert_eq!(stale.index(), fresh.index());
        assert!(!log.resolve(stale, "late"));
        assert!(log.get(fresh).is_some_and(Entry::is_pending));
    }
}
