//! Сессия пользователя: bearer-токен и место, где он хранится.
//!
//! `Session` передаётся клиенту явно. Токен читается из хранилища при каждом
//! запросе, поэтому вход/выход, сделанные через любой клон сессии, сразу
//! видны всем остальным.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::warn;

/// Хранилище bearer-токена.
pub trait TokenStore: fmt::Debug + Send + Sync {
    /// Читает токен. Пустое значение считается отсутствием токена.
    fn load(&self) -> io::Result<Option<String>>;
    /// Сохраняет токен.
    fn save(&self, token: &str) -> io::Result<()>;
    /// Удаляет токен.
    fn clear(&self) -> io::Result<()>;
}

fn parse_token(raw: &str) -> Option<String> {
    let token = raw.trim().to_string();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

#[derive(Debug, Clone)]
/// Токен в файле на диске (аналог `localStorage` для CLI).
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Создаёт хранилище поверх указанного файла. Файл может не существовать.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Путь к файлу токена.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(parse_token(&raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn save(&self, token: &str) -> io::Result<()> {
        fs::write(&self.path, token)
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
/// Токен в памяти процесса.
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> io::Result<Option<String>> {
        let token = self.token.read().unwrap_or_else(PoisonError::into_inner);
        Ok(token.as_deref().and_then(parse_token))
    }

    fn save(&self, token: &str) -> io::Result<()> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Явный контекст сессии с операциями чтения и записи токена.
pub struct Session {
    store: Arc<dyn TokenStore>,
}

impl Session {
    /// Сессия поверх произвольного хранилища.
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Сессия с токеном в памяти, изначально без авторизации.
    pub fn in_memory() -> Self {
        Self::new(MemoryTokenStore::default())
    }

    /// Сессия с токеном в файле.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(FileTokenStore::new(path))
    }

    /// Текущий токен. Ошибка чтения хранилища трактуется как отсутствие токена.
    pub fn token(&self) -> Option<String> {
        match self.store.load() {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "failed to read token storage");
                None
            }
        }
    }

    /// Значение для заголовка `Authorization: Bearer <token>`; пустая строка без токена.
    pub fn bearer(&self) -> String {
        self.token().unwrap_or_default()
    }

    /// Есть ли сохранённый токен.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Сохраняет токен, полученный при входе.
    pub fn sign_in(&self, token: &str) -> io::Result<()> {
        self.store.save(token.trim())
    }

    /// Удаляет токен.
    pub fn sign_out(&self) -> io::Result<()> {
        self.store.clear()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_token_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock must be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("welfare_{name}_{nanos}.token"))
    }

    #[test]
    fn parse_token_trims_and_returns_value() {
        assert_eq!(parse_token("  abc.def.ghi \n").as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn parse_token_rejects_blank() {
        assert!(parse_token("   ").is_none());
    }

    #[test]
    fn in_memory_session_starts_unauthenticated() {
        let session = Session::in_memory();
        assert!(!session.is_authenticated());
        assert_eq!(session.bearer(), "");
    }

    #[test]
    fn sign_in_is_visible_through_clones() {
        let session = Session::in_memory();
        let clone = session.clone();

        session.sign_in("tok-1").expect("sign in");
        assert_eq!(clone.token().as_deref(), Some("tok-1"));

        clone.sign_out().expect("sign out");
        assert!(!session.is_authenticated());
    }

    #[test]
    fn file_store_round_trips_and_clears() {
        let path = temp_token_path("round_trip");
        let session = Session::file(&path);
        assert!(session.token().is_none());

        session.sign_in("  file-token  ").expect("sign in");
        assert_eq!(session.token().as_deref(), Some("file-token"));

        session.sign_out().expect("sign out");
        assert!(!path.exists());
        assert!(session.token().is_none());
    }

    #[test]
    fn clearing_missing_file_is_not_an_error() {
        let store = FileTokenStore::new(temp_token_path("missing"));
        store.clear().expect("clear of missing file must succeed");
    }

    #[test]
    fn blank_token_file_means_unauthenticated() {
        let path = temp_token_path("blank");
        fs::write(&path, "  \n").expect("write blank token");
        let session = Session::file(&path);
        assert!(!session.is_authenticated());
        fs::remove_file(&path).expect("cleanup");
    }
}
