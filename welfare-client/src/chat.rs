//! Панель чат-бота по программе.
//!
//! Вопрос сразу появляется в ленте с заглушкой вместо ответа, запрос уходит
//! в отдельной задаче. Несколько вопросов могут ждать ответа одновременно;
//! каждый ответ попадает в свою запись независимо от порядка завершения.

use tokio::sync::mpsc;
use tracing::warn;

use crate::WelfareClient;
use crate::error::{WelfareClientError, WelfareClientResult};
use crate::submission::{Entry, EntryState, SubmissionLog, Ticket};

/// Текст ответа, пока запрос выполняется.
pub const PENDING_ANSWER: &str = "Ответ готовится...";
/// Текст ответа после ошибки.
pub const FAILED_ANSWER: &str = "Произошла ошибка. Попробуйте ещё раз.";

/// Пара вопрос/ответ.
pub type ChatExchange = Entry<String, String>;

impl Entry<String, String> {
    /// Вопрос пользователя.
    pub fn question(&self) -> &str {
        &self.payload
    }

    /// Ответ для показа: заглушка, текст бота или сообщение об ошибке.
    pub fn answer(&self) -> &str {
        match &self.state {
            EntryState::Pending => PENDING_ANSWER,
            EntryState::Resolved(answer) => answer,
            EntryState::Failed => FAILED_ANSWER,
        }
    }
}

type Completion = (Ticket, WelfareClientResult<String>);

#[derive(Debug)]
/// Лента вопросов к чат-боту одной программы.
pub struct ChatPanel {
    client: WelfareClient,
    welfare_id: String,
    log: SubmissionLog<String, String>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl ChatPanel {
    /// Пустая лента для программы `welfare_id`.
    pub fn new(client: WelfareClient, welfare_id: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            client,
            welfare_id: welfare_id.into(),
            log: SubmissionLog::new(),
            tx,
            rx,
        }
    }

    /// Добавляет вопрос в ленту и отправляет его боту в фоне.
    ///
    /// Пустой вопрос отклоняется без записи в ленту. Требует запущенного
    /// рантайма tokio.
    pub fn ask(&mut self, input: &str) -> WelfareClientResult<Ticket> {
        let question = input.trim();
        if question.is_empty() {
            return Err(WelfareClientError::Validation(
                crate::EMPTY_QUESTION_MESSAGE.to_string(),
            ));
        }

        let ticket = self.log.submit(question.to_string());

        let client = self.client.clone();
        let welfare_id = self.welfare_id.clone();
        let question = question.to_string();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.ask_chatbot(&welfare_id, &question).await;
            // панель могла быть закрыта, тогда ответ просто некому показать
            let _ = tx.send((ticket, result));
        });

        Ok(ticket)
    }

    /// Ждёт ближайший ответ и подставляет его в ленту.
    ///
    /// `None`, если ожидающих вопросов нет.
    pub async fn next_completion(&mut self) -> Option<Ticket> {
        if self.log.pending_count() == 0 {
            return None;
        }
        let (ticket, result) = self.rx.recv().await?;
        self.apply(ticket, result);
        Some(ticket)
    }

    /// Ждёт ответы на все отправленные вопросы.
    pub async fn settle(&mut self) {
        while self.next_completion().await.is_some() {}
    }

    fn apply(&mut self, ticket: Ticket, result: WelfareClientResult<String>) {
        match result {
            Ok(answer) => {
                self.log.resolve(ticket, answer);
            }
            Err(err) => {
                warn!(welfare_id = %self.welfare_id, error = %err, "chatbot request failed");
                self.log.fail(ticket);
            }
        }
    }

    /// Идентификатор программы.
    pub fn welfare_id(&self) -> &str {
        &self.welfare_id
    }

    /// Лента в порядке отправки.
    pub fn exchanges(&self) -> &[ChatExchange] {
        self.log.entries()
    }

    /// Запись по билету.
    pub fn exchange(&self, ticket: Ticket) -> Option<&ChatExchange> {
        self.log.get(ticket)
    }
}
