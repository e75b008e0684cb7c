//! Ветка комментариев поста.
//!
//! Комментарий сразу показывается в ветке как отправляемый, а запрос уходит
//! в отдельной задаче. Несколько комментариев могут отправляться
//! одновременно, результат каждого попадает в свою запись.

use std::collections::HashSet;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::{WelfareClientError, WelfareClientResult};
use crate::models::{BoardPost, Comment};
use crate::submission::{EntryState, SubmissionLog, Ticket};
use crate::{EMPTY_COMMENT_MESSAGE, WelfareClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Состояние комментария в ветке.
pub enum CommentStatus {
    /// Комментарий уже есть на сервере.
    Published,
    /// Отправляется.
    Sending,
    /// Отправить не удалось.
    Failed,
}

/// `Ok(None)`: комментарий принят, но пост перечитать не удалось.
type Delivery = WelfareClientResult<Option<BoardPost>>;
type Completion = (Ticket, Delivery);

#[derive(Debug)]
/// Пост с комментариями и очередью собственных, ещё не подтверждённых.
pub struct CommentThread {
    client: WelfareClient,
    post_id: String,
    post: BoardPost,
    outbox: SubmissionLog<Comment, ()>,
    in_flight: HashSet<Ticket>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl CommentThread {
    /// Загружает пост `post_id`.
    pub async fn open(client: WelfareClient, post_id: impl Into<String>) -> WelfareClientResult<Self> {
        let post_id = post_id.into();
        let post = client.board_post(&post_id).await?;
        Ok(Self::with_post(client, post_id, post))
    }

    /// Ветка поверх уже загруженного поста.
    pub fn with_post(client: WelfareClient, post_id: impl Into<String>, post: BoardPost) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            client,
            post_id: post_id.into(),
            post,
            outbox: SubmissionLog::new(),
            in_flight: HashSet::new(),
            tx,
            rx,
        }
    }

    /// Пост в последнем известном состоянии.
    pub fn post(&self) -> &BoardPost {
        &self.post
    }

    /// Ставит комментарий в очередь и сразу показывает его в ветке.
    pub fn enqueue(&mut self, input: &str) -> WelfareClientResult<Ticket> {
        let content = input.trim();
        if content.is_empty() {
            return Err(WelfareClientError::Validation(
                EMPTY_COMMENT_MESSAGE.to_string(),
            ));
        }

        Ok(self.outbox.submit(Comment {
            id: String::new(),
            content: content.to_string(),
            is_mine: true,
            created_at: Utc::now().to_rfc3339(),
        }))
    }

    /// Отправляет комментарий из очереди в фоне. После отправки пост
    /// перечитывается в той же задаче.
    ///
    /// Требует запущенного рантайма tokio.
    pub fn send(&mut self, ticket: Ticket) -> WelfareClientResult<()> {
        let content = match self.outbox.get(ticket) {
            Some(entry) if entry.is_pending() && !self.in_flight.contains(&ticket) => {
                entry.payload.content.clone()
            }
            _ => return Err(WelfareClientError::NotPending),
        };
        self.in_flight.insert(ticket);

        let client = self.client.clone();
        let post_id = self.post_id.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let delivery = match client.add_comment(&post_id, &content).await {
                Ok(()) => match client.board_post(&post_id).await {
                    Ok(post) => Ok(Some(post)),
                    Err(err) => {
                        warn!(%post_id, error = %err, "failed to refresh post after comment");
                        Ok(None)
                    }
                },
                Err(err) => Err(err),
            };
            // ветку могли закрыть, тогда результат некому показать
            let _ = tx.send((ticket, delivery));
        });

        Ok(())
    }

    /// Ждёт ближайшую завершившуюся отправку и применяет её к ветке.
    ///
    /// `None`, если отправок в полёте нет.
    pub async fn next_completion(&mut self) -> Option<(Ticket, WelfareClientResult<()>)> {
        if self.in_flight.is_empty() {
            return None;
        }
        let (ticket, delivery) = self.rx.recv().await?;
        self.in_flight.remove(&ticket);
        Some((ticket, self.apply(ticket, delivery)))
    }

    fn apply(&mut self, ticket: Ticket, delivery: Delivery) -> WelfareClientResult<()> {
        let refreshed = match delivery {
            Ok(refreshed) => refreshed,
            Err(err) => {
                warn!(post_id = %self.post_id, error = %err, "comment delivery failed");
                self.outbox.fail(ticket);
                return Err(err);
            }
        };

        let comment = self.outbox.get(ticket).map(|entry| entry.payload.clone());
        self.outbox.resolve(ticket, ());
        match refreshed {
            // снимок, снятый раньше уже применённого, ветку не откатывает
            Some(post) if post.comments.len() >= self.post.comments.len() => self.post = post,
            Some(_) => {}
            None => self.post.comments.extend(comment),
        }
        Ok(())
    }

    /// `enqueue` + `send`, затем ожидание результата этого комментария.
    pub async fn submit(&mut self, input: &str) -> WelfareClientResult<()> {
        let ticket = self.enqueue(input)?;
        self.send(ticket)?;
        while let Some((done, result)) = self.next_completion().await {
            if done == ticket {
                return result;
            }
        }
        Err(WelfareClientError::NotPending)
    }

    /// Комментарии для показа: серверные, затем свои неподтверждённые.
    pub fn comments(&self) -> Vec<(&Comment, CommentStatus)> {
        let published = self
            .post
            .comments
            .iter()
            .map(|comment| (comment, CommentStatus::Published));
        let local = self.outbox.entries().iter().filter_map(|entry| match entry.state {
            EntryState::Pending => Some((&entry.payload, CommentStatus::Sending)),
            EntryState::Failed => Some((&entry.payload, CommentStatus::Failed)),
            EntryState::Resolved(()) => None,
        });
        published.chain(local).collect()
    }
}
