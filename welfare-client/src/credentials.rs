use serde::Serialize;
use validator::{Validate, ValidationError};

use crate::error::{WelfareClientError, WelfareClientResult};

/// Сообщение при пустом логине или пароле.
pub const MISSING_CREDENTIALS_MESSAGE: &str = "Введите логин и пароль.";

#[derive(Debug, Clone, Serialize, Validate)]
/// Логин и пароль для регистрации и входа.
pub struct Credentials {
    #[validate(custom(function = "not_blank"))]
    username: String,
    #[validate(custom(function = "not_blank"))]
    password: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

impl Credentials {
    /// Создаёт пару логин/пароль без проверки.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Логин.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Проверяет, что оба поля заполнены.
    pub fn check(&self) -> WelfareClientResult<()> {
        self.validate()
            .map_err(|_| WelfareClientError::Validation(MISSING_CREDENTIALS_MESSAGE.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_password_is_rejected_with_message() {
        let err = Credentials::new("user", "").check().expect_err("must fail");
        assert_eq!(err.to_string(), MISSING_CREDENTIALS_MESSAGE);
    }

    #[test]
    fn empty_username_is_rejected() {
        assert!(Credentials::new("", "secret").check().is_err());
    }

    #[test]
    fn whitespace_only_fields_are_rejected() {
        let err = Credentials::new("user", "   ").check().expect_err("must fail");
        assert_eq!(err.to_string(), MISSING_CREDENTIALS_MESSAGE);
        assert!(Credentials::new(" \t", "secret").check().is_err());
    }

    #[test]
    fn long_username_is_not_limited() {
        Credentials::new("u".repeat(65), "secret")
            .check()
            .expect("length is not restricted");
    }

    #[test]
    fn filled_credentials_pass() {
        Credentials::new("user", "secret")
            .check()
            .expect("valid credentials");
    }

    #[test]
    fn serializes_as_username_and_password() {
        let json = serde_json::to_value(Credentials::new("u", "p")).expect("serializes");
        assert_eq!(json, serde_json::json!({"username": "u", "password": "p"}));
    }
}
