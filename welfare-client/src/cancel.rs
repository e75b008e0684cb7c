use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug, Clone)]
/// Токен отмены для запросов клиента.
///
/// Все клоны разделяют одно состояние: `cancel()` на любом из них прерывает
/// все запросы, которые ждут на этом токене. Отмена необратима.
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    /// Создаёт неотменённый токен.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Отменяет токен.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Был ли токен отменён.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Завершается, когда токен отменён.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // sender живёт в self, поэтому канал не закроется раньше отмены
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
