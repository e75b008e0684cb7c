//! Клиентская библиотека для API сервиса социальных программ.
//!
//! Предоставляет `WelfareClient` поверх одного HTTP-запроса (`HttpClient`):
//! поиск и просмотр программ, чат-бот по программе, доска с комментариями,
//! регистрация и вход. Токен берётся из явно переданной `Session` при каждом
//! запросе.
//!
//! Вспомогательные части:
//! - `pagination`: постраничный вывод любых списков;
//! - `submission`: оптимистичное добавление записей с поздним ответом;
//! - `chat`, `board`: панель чат-бота и ветка комментариев поверх них.
#![warn(missing_docs)]

pub mod board;
mod cancel;
pub mod chat;
mod credentials;
mod error;
pub mod filters;
mod http_client;
mod models;
pub mod pagination;
mod session;
pub mod submission;

pub use cancel::CancelToken;
pub use credentials::{Credentials, MISSING_CREDENTIALS_MESSAGE};
pub use error::{WelfareClientError, WelfareClientResult};
pub use http_client::{ClientConfig, DEFAULT_API_URL, HttpClient, join_url};
pub use models::{
    BoardPage, BoardPost, BoardPostSummary, CHATBOT_FALLBACK_ANSWER, Comment, Envelope,
    WelfareDetail, WelfareListItem, display_date,
};
pub use session::{FileTokenStore, MemoryTokenStore, Session, TokenStore};

use serde::de::IgnoredAny;
use tracing::{debug, info};

use filters::SearchQuery;
use models::{ChatbotReply, CommentRequest, LoginResult};
use pagination::Paginator;

/// Сообщение при поиске без текста вопроса.
pub const EMPTY_QUESTION_MESSAGE: &str = "Введите вопрос.";
/// Сообщение при попытке отправить пустой комментарий.
pub const EMPTY_COMMENT_MESSAGE: &str = "Введите текст комментария.";

#[derive(Debug, Clone)]
/// Типизированный клиент API социальных программ.
pub struct WelfareClient {
    http: HttpClient,
}

impl WelfareClient {
    /// Создаёт клиент с конфигурацией и сессией.
    pub fn new(config: ClientConfig, session: Session) -> WelfareClientResult<Self> {
        Ok(Self {
            http: HttpClient::new(config, session)?,
        })
    }

    /// Клон клиента, все запросы которого прерываются отменой `token`.
    pub fn with_cancel(&self, token: CancelToken) -> Self {
        Self {
            http: self.http.with_cancel(token),
        }
    }

    /// Низкоуровневый HTTP-клиент.
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Текущая сессия.
    pub fn session(&self) -> &Session {
        self.http.session()
    }

    /// Регистрирует пользователя. Токен не выдаётся, после регистрации нужен вход.
    pub async fn sign_up(&self, credentials: &Credentials) -> WelfareClientResult<()> {
        credentials.check()?;
        let _: IgnoredAny = self.http.post("api/users/sign-up", credentials).await?;
        info!(username = credentials.username(), "signed up");
        Ok(())
    }

    /// Выполняет вход и сохраняет полученный токен в сессии.
    pub async fn login(&self, credentials: &Credentials) -> WelfareClientResult<String> {
        credentials.check()?;
        let envelope: Envelope<LoginResult> =
            self.http.post("api/users/login", credentials).await?;
        let token = envelope.into_result()?.token;
        self.session().sign_in(&token)?;
        info!(username = credentials.username(), "logged in");
        Ok(token)
    }

    /// Удаляет токен из сессии.
    pub fn logout(&self) -> WelfareClientResult<()> {
        self.session().sign_out()?;
        info!("logged out");
        Ok(())
    }

    /// Часто запрашиваемые программы.
    pub async fn popular_welfare(&self) -> WelfareClientResult<Vec<WelfareListItem>> {
        let envelope: Envelope<Vec<WelfareListItem>> =
            self.http.get("api/welfare/popular").await?;
        Ok(envelope.into_list())
    }

    /// Поиск программ по вопросу и фильтрам.
    ///
    /// Пустой вопрос отклоняется без обращения к сети.
    pub async fn search_welfare(
        &self,
        query: &SearchQuery,
    ) -> WelfareClientResult<Vec<WelfareListItem>> {
        if !query.is_searchable() {
            return Err(WelfareClientError::Validation(
                EMPTY_QUESTION_MESSAGE.to_string(),
            ));
        }

        let pairs = query.to_query_pairs();
        let pairs: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let envelope: Envelope<Vec<WelfareListItem>> =
            self.http.get_with_query("api/welfare", &pairs).await?;
        Ok(envelope.into_list())
    }

    /// Результаты поиска, разбитые на страницы по `page_size`.
    pub async fn search_pages(
        &self,
        query: &SearchQuery,
        page_size: usize,
    ) -> WelfareClientResult<Paginator<WelfareListItem>> {
        let items = self.search_welfare(query).await?;
        Ok(Paginator::local(items, page_size)?)
    }

    /// Подробности программы.
    pub async fn welfare_detail(&self, id: &str) -> WelfareClientResult<WelfareDetail> {
        let envelope: Envelope<WelfareDetail> =
            self.http.get(&format!("api/welfare/{id}")).await?;
        envelope.into_result()
    }

    /// Ответ чат-бота на вопрос о программе.
    pub async fn ask_chatbot(&self, id: &str, question: &str) -> WelfareClientResult<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(WelfareClientError::Validation(
                EMPTY_QUESTION_MESSAGE.to_string(),
            ));
        }

        let envelope: Envelope<ChatbotReply> = self
            .http
            .get_with_query(
                &format!("api/welfare/chatbot/{id}"),
                &[("question", question)],
            )
            .await?;
        Ok(envelope
            .result
            .map(ChatbotReply::into_answer)
            .unwrap_or_else(|| CHATBOT_FALLBACK_ANSWER.to_string()))
    }

    /// Последние посты доски.
    pub async fn recent_posts(&self) -> WelfareClientResult<Vec<BoardPostSummary>> {
        let envelope: Envelope<Vec<BoardPostSummary>> =
            self.http.get("api/board/recent").await?;
        Ok(envelope.into_list())
    }

    /// Страница доски. `page` нумеруется с 1, сервер считает страницы с 0.
    pub async fn board_page(&self, page: u32) -> WelfareClientResult<BoardPage> {
        let server_page = page.saturating_sub(1).to_string();
        let envelope: Envelope<BoardPage> = self
            .http
            .get_with_query("api/board", &[("page", server_page.as_str())])
            .await?;
        Ok(envelope.result.unwrap_or_default())
    }

    /// Страница доски в виде постраничного списка.
    ///
    /// Номер за последней страницей заменяется последней, и она
    /// запрашивается заново, чтобы список совпадал с активной кнопкой.
    pub async fn board_pages(&self, page: u32) -> WelfareClientResult<Paginator<BoardPostSummary>> {
        let page = page.max(1);
        let mut board = self.board_page(page).await?;
        let last = board.total_pages.max(1);
        if page > last {
            debug!(page, last, "board page out of range, loading last page");
            board = self.board_page(last).await?;
        }
        Ok(Paginator::remote(board.content, page.min(last), board.total_pages))
    }

    /// Пост доски с комментариями.
    pub async fn board_post(&self, id: &str) -> WelfareClientResult<BoardPost> {
        let envelope: Envelope<BoardPost> = self.http.get(&format!("api/board/{id}")).await?;
        envelope.into_result()
    }

    /// Добавляет комментарий к посту.
    pub async fn add_comment(&self, id: &str, content: &str) -> WelfareClientResult<()> {
        let content = content.trim();
        if content.is_empty() {
            return Err(WelfareClientError::Validation(
                EMPTY_COMMENT_MESSAGE.to_string(),
            ));
        }

        let _: IgnoredAny = self
            .http
            .post(&format!("api/board/{id}"), &CommentRequest { content })
            .await?;
        Ok(())
    }
}
