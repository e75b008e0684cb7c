use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{WelfareClientError, WelfareClientResult};

/// Ответ, если сервер не прислал текст чат-бота.
pub const CHATBOT_FALLBACK_ANSWER: &str = "Ответ готовится. Обратитесь к администратору.";

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

/// Дата для отображения (`YYYY-MM-DD`).
///
/// Понимает RFC 3339, ISO-дату-время без зоны и просто дату; иначе
/// возвращает строку как есть.
pub fn display_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.date_naive().to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.date().to_string();
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return parsed.to_string();
    }
    raw.to_string()
}

#[derive(Debug, Clone, Deserialize)]
/// Конверт `{ "result": ... }`, в котором приходят все ответы API.
pub struct Envelope<T> {
    /// Полезная нагрузка; отсутствует или `null` у пустых ответов.
    pub result: Option<T>,
}

impl<T> Envelope<T> {
    /// Нагрузка; её отсутствие считается ошибкой разбора.
    pub fn into_result(self) -> WelfareClientResult<T> {
        self.result
            .ok_or_else(|| WelfareClientError::Decode("response has no result".to_string()))
    }
}

impl<T> Envelope<Vec<T>> {
    /// Список из нагрузки; отсутствие трактуется как пустой список.
    pub fn into_list(self) -> Vec<T> {
        self.result.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Элемент списка социальных программ.
pub struct WelfareListItem {
    /// Идентификатор программы.
    #[serde(rename = "welfareNo", deserialize_with = "id_from_string_or_number")]
    pub id: String,
    /// Название.
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Подробное описание социальной программы.
pub struct WelfareDetail {
    /// Название.
    pub title: String,
    /// Дата обновления в формате сервера.
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Регионы действия.
    #[serde(default)]
    pub areas: Vec<String>,
    /// Целевые группы.
    #[serde(default)]
    pub targets: Vec<String>,
    /// Критерии отбора.
    #[serde(default)]
    pub criteria: String,
    /// Содержание услуги.
    #[serde(default)]
    pub content: String,
    /// Порядок подачи заявки.
    #[serde(default)]
    pub apply_method: String,
    /// Телефон для справок.
    #[serde(default)]
    pub tel: String,
    /// Ссылка на сайт программы.
    #[serde(default)]
    pub reference_link: Option<String>,
    /// Нормативная база.
    #[serde(default)]
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Пост в списке доски.
pub struct BoardPostSummary {
    /// Идентификатор поста.
    #[serde(rename = "postNo", deserialize_with = "id_from_string_or_number")]
    pub id: String,
    /// Заголовок.
    pub title: String,
    /// Дата создания в формате сервера.
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Комментарий к посту.
pub struct Comment {
    /// Идентификатор комментария.
    #[serde(
        rename = "commentNo",
        default,
        deserialize_with = "id_from_string_or_number"
    )]
    pub id: String,
    /// Текст.
    pub content: String,
    /// Комментарий текущего пользователя.
    #[serde(default)]
    pub is_mine: bool,
    /// Дата создания в формате сервера.
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Пост доски с комментариями.
pub struct BoardPost {
    /// Заголовок.
    pub title: String,
    /// Текст поста.
    #[serde(default)]
    pub content: String,
    /// Дата создания в формате сервера.
    #[serde(default)]
    pub created_at: String,
    /// Комментарии в порядке сервера.
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Страница доски, как её описывает сервер.
pub struct BoardPage {
    /// Посты текущей страницы.
    #[serde(default)]
    pub content: Vec<BoardPostSummary>,
    /// Общее число страниц.
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CommentRequest<'a> {
    pub(crate) content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoginResult {
    pub(crate) token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatbotReply {
    #[serde(rename = "chatBotReply", default)]
    pub(crate) chat_bot_reply: Option<String>,
}

impl ChatbotReply {
    pub(crate) fn into_answer(self) -> String {
        self.chat_bot_reply
            .filter(|reply| !reply.trim().is_empty())
            .unwrap_or_else(|| CHATBOT_FALLBACK_ANSWER.to_string())
    }
}
