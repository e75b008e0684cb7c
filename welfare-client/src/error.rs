use thiserror::Error;

use crate::pagination::PaginationError;

#[derive(Debug, Error)]
/// Ошибки клиентской библиотеки `welfare-client`.
pub enum WelfareClientError {
    /// Сетевой вызов не состоялся (сервер недоступен, обрыв соединения и т.п.).
    #[error("http transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Сервер ответил статусом вне диапазона 2xx.
    ///
    /// Клиент не различает коды: 401, 404 и 500 приходят одним вариантом.
    #[error("http status {status}")]
    Status {
        /// HTTP-статус ответа.
        status: u16,
    },

    /// Тело ответа не удалось разобрать как ожидаемый JSON.
    #[error("decode error: {0}")]
    Decode(String),

    /// Локальная ошибка ввода. Запрос в сеть не отправлялся.
    #[error("{0}")]
    Validation(String),

    /// Запись уже отправлена или её отправка завершилась.
    #[error("submission is not pending")]
    NotPending,

    /// Запрос прерван через `CancelToken`.
    #[error("request cancelled")]
    Cancelled,

    /// Ошибка чтения/записи хранилища токена.
    #[error("token storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Некорректные параметры пагинации.
    #[error(transparent)]
    Pagination(#[from] PaginationError),
}

/// Результат операций `welfare-client`.
pub type WelfareClientResult<T> = Result<T, WelfareClientError>;

impl WelfareClientError {
    pub(crate) fn from_http_status(status: reqwest::StatusCode) -> Self {
        Self::Status {
            status: status.as_u16(),
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_http_status(status);
        }
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        Self::Transport(err)
    }

    /// `true`, если ошибка возникла до обращения к сети.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Pagination(_) | Self::NotPending
        )
    }

    /// HTTP-статус, если ошибка пришла от сервера.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            _ => None,
        }
    }
}
