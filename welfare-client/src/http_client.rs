use reqwest::header::ACCEPT;
use reqwest::{Client, Method};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::error::{WelfareClientError, WelfareClientResult};
use crate::session::Session;

/// Адрес API по умолчанию.
pub const DEFAULT_API_URL: &str = "https://api.highfive.p-e.kr/";

#[derive(Debug, Clone)]
/// Параметры HTTP-клиента.
pub struct ClientConfig {
    /// Базовый URL API.
    pub base_url: String,
    /// Таймаут на весь запрос. `None` оставляет поведение транспорта по умолчанию.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Конфигурация без таймаута.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
        }
    }

    /// Задаёт таймаут на запрос.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

#[derive(Debug, Clone)]
/// Низкоуровневый HTTP-клиент API: одна функция отправки и тонкие обёртки по методам.
pub struct HttpClient {
    base_url: String,
    client: Client,
    session: Session,
    cancel: Option<CancelToken>,
}

/// Склеивает базовый URL и путь ровно через один `/`.
///
/// Хвостовые слэши пути отбрасываются, строка запроса (`?..`) сохраняется как есть.
pub fn join_url(base_url: &str, path: &str) -> String {
    let (route, query) = match path.split_once('?') {
        Some((route, query)) => (route, Some(query)),
        None => (path, None),
    };

    let base = base_url.trim_end_matches('/');
    let route = route.trim_matches('/');

    let mut url = if route.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{route}")
    };
    if let Some(query) = query.filter(|query| !query.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    url
}

fn decode_body<T: DeserializeOwned>(raw: &str) -> WelfareClientResult<T> {
    // пустое тело разбираем как null: подходит для ответов без полезной нагрузки
    let raw = if raw.trim().is_empty() { "null" } else { raw };
    serde_json::from_str(raw).map_err(|err| WelfareClientError::Decode(err.to_string()))
}

impl HttpClient {
    /// Создаёт клиент с указанной конфигурацией и сессией.
    pub fn new(config: ClientConfig, session: Session) -> WelfareClientResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(WelfareClientError::Transport)?;

        Ok(Self {
            base_url: config.base_url,
            client,
            session,
            cancel: None,
        })
    }

    /// Клон клиента, все запросы которого прерываются отменой `token`.
    pub fn with_cancel(&self, token: CancelToken) -> Self {
        Self {
            cancel: Some(token),
            ..self.clone()
        }
    }

    /// Сессия, из которой берётся токен.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Базовый URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Полный URL для серверного пути.
    pub fn endpoint(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Отправляет запрос и разбирает JSON-ответ.
    ///
    /// Тело, если передано, сериализуется в JSON и выставляет
    /// `Content-Type: application/json`. Токен читается из сессии на каждый вызов.
    /// Одна попытка, без повторов.
    pub async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> WelfareClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(method, path, &[], body).await
    }

    /// GET без параметров.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> WelfareClientResult<T> {
        self.send::<(), T>(Method::GET, path, &[], None).await
    }

    /// GET с параметрами строки запроса (кодируются клиентом).
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> WelfareClientResult<T> {
        self.send::<(), T>(Method::GET, path, query, None).await
    }

    /// POST с JSON-телом.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> WelfareClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::POST, path, &[], Some(body)).await
    }

    /// PUT с JSON-телом.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> WelfareClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::PUT, path, &[], Some(body)).await
    }

    /// PATCH с JSON-телом.
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> WelfareClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::PATCH, path, &[], Some(body)).await
    }

    /// DELETE без тела.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> WelfareClientResult<T> {
        self.send::<(), T>(Method::DELETE, path, &[], None).await
    }

    async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> WelfareClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(ACCEPT, "*/*")
            .bearer_auth(self.session.bearer());
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, %url, "sending request");

        let round_trip = async move {
            let response = request
                .send()
                .await
                .map_err(WelfareClientError::from_reqwest)?;

            let status = response.status();
            if !status.is_success() {
                return Err(WelfareClientError::from_http_status(status));
            }

            let raw = response
                .text()
                .await
                .map_err(WelfareClientError::from_reqwest)?;
            decode_body::<T>(&raw)
        };

        let result = match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(WelfareClientError::Cancelled),
                    result = round_trip => result,
                }
            }
            None => round_trip.await,
        };

        if let Err(err) = &result {
            warn!(%method, %url, error = %err, "request failed");
        }
        result
    }
}
