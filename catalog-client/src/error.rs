use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
/// Ошибки хранилища учётных данных (bearer-токена).
pub enum CredentialError {
    /// Ошибка чтения/записи файла с токеном.
    #[error("credential storage io error: {0}")]
    Io(#[from] std::io::Error),

    /// Хранилище недоступно (например, отравленная блокировка).
    #[error("credential storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Ошибка транспортного уровня: сеть, DNS, таймаут.
pub struct TransportError {
    /// Сообщение транспорта.
    pub message: String,
    /// Истёк общий таймаут запроса.
    pub timeout: bool,
}

impl TransportError {
    /// Создаёт ошибку сети/соединения.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timeout: false,
        }
    }

    /// Создаёт ошибку истёкшего таймаута.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timeout: true,
        }
    }
}

#[derive(Debug, Error)]
/// Ошибки шлюза каталога.
pub enum GatewayError {
    /// Сеть недоступна, DNS не разрешился или истёк таймаут.
    #[error("transport error: {message}")]
    Transport {
        /// Сообщение транспорта.
        message: String,
        /// Истёк общий таймаут запроса.
        timeout: bool,
    },

    /// Сервер ответил не-2xx статусом.
    #[error("{message}")]
    Server {
        /// HTTP-статус ответа.
        status: u16,
        /// Сообщение из тела ответа или производное от статуса.
        message: String,
        /// Код ошибки сервера, если он есть в теле.
        code: Option<String>,
        /// Тело ответа целиком, если оно было JSON.
        details: Option<Value>,
    },

    /// Успешный ответ без пригодных данных сущности.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Некорректный запрос на стороне клиента (URL, заголовок, конфигурация).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Ошибка хранилища учётных данных.
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

/// Результат операций `catalog-client`.
pub type GatewayResult<T> = Result<T, GatewayError>;

const GENERIC_MESSAGE: &str = "An error occurred";

impl From<TransportError> for GatewayError {
    fn from(err: TransportError) -> Self {
        let message = if err.message.trim().is_empty() {
            GENERIC_MESSAGE.to_string()
        } else {
            err.message
        };
        Self::Transport {
            message,
            timeout: err.timeout,
        }
    }
}

impl GatewayError {
    /// Собирает ошибку из не-2xx ответа.
    ///
    /// Сообщение берётся из `message`, затем из `error` (строка или
    /// `error.message`), иначе выводится из статуса.
    pub(crate) fn from_http_status(status: u16, body: &[u8]) -> Self {
        let details = serde_json::from_slice::<Value>(body).ok();

        let message = details
            .as_ref()
            .and_then(server_message)
            .unwrap_or_else(|| fallback_message(status));
        let code = details.as_ref().and_then(server_code);

        Self::Server {
            status,
            message,
            code,
            details,
        }
    }

    /// Сообщение для отображения пользователю.
    pub fn message(&self) -> String {
        match self {
            Self::Transport { message, .. } | Self::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Код ошибки сервера, если он был передан.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Server { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Тело ответа сервера, если оно было JSON.
    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::Server { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    /// HTTP-статус, если ошибка пришла от сервера.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Токен отсутствует, просрочен или отклонён сервером (401).
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Токен принят, но прав на операцию нет (403).
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    /// Запрошенный ресурс не найден.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Истёк общий таймаут запроса.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { timeout: true, .. })
    }
}

fn server_message(body: &Value) -> Option<String> {
    let direct = body.get("message").and_then(Value::as_str);
    let error = body.get("error").and_then(|err| {
        err.as_str()
            .or_else(|| err.get("message").and_then(Value::as_str))
    });

    direct
        .or(error)
        .map(str::trim)
        .filter(|msg| !msg.is_empty())
        .map(str::to_string)
}

fn server_code(body: &Value) -> Option<String> {
    match body.get("code")? {
        Value::String(code) => Some(code.clone()),
        Value::Number(code) => Some(code.to_string()),
        _ => None,
    }
}

fn fallback_message(status: u16) -> String {
    match status {
        400 => "Bad request".to_string(),
        401 => "Authentication required".to_string(),
        403 => "Not allowed to perform this operation".to_string(),
        404 => "Resource not found".to_string(),
        409 => "Conflicting data".to_string(),
        500..=599 => "Server error".to_string(),
        _ => format!("http status {status}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_message_is_taken_from_body() {
        let body = br#"{"message":"invalid token","code":"AUTH_001"}"#;
        let err = GatewayError::from_http_status(401, body);

        assert_eq!(err.message(), "invalid token");
        assert_eq!(err.code(), Some("AUTH_001"));
        assert!(err.is_unauthorized());
        assert_eq!(
            err.details(),
            Some(&json!({"message": "invalid token", "code": "AUTH_001"}))
        );
    }

    #[test]
    fn forbidden_is_not_unauthorized() {
        let err = GatewayError::from_http_status(403, br#"{"message":"admin only"}"#);

        assert!(err.is_forbidden());
        assert!(!err.is_unauthorized());
        assert_eq!(err.message(), "admin only");
    }

    #[test]
    fn error_field_is_used_when_message_is_missing() {
        let err = GatewayError::from_http_status(400, br#"{"error":"bad year"}"#);
        assert_eq!(err.message(), "bad year");

        let nested = GatewayError::from_http_status(422, br#"{"error":{"message":"bad price"}}"#);
        assert_eq!(nested.message(), "bad price");
    }

    #[test]
    fn numeric_code_is_stringified() {
        let err = GatewayError::from_http_status(409, br#"{"message":"dup","code":11000}"#);
        assert_eq!(err.code(), Some("11000"));
    }

    #[test]
    fn non_json_body_falls_back_to_status_message() {
        let err = GatewayError::from_http_status(404, b"<html>not found</html>");
        assert_eq!(err.message(), "Resource not found");
        assert!(err.is_not_found());
        assert!(err.details().is_none());

        let teapot = GatewayError::from_http_status(418, b"");
        assert_eq!(teapot.message(), "http status 418");
    }

    #[test]
    fn blank_transport_message_gets_generic_fallback() {
        let err = GatewayError::from(TransportError::network("  "));
        assert_eq!(err.message(), GENERIC_MESSAGE);
        assert!(!err.is_timeout());

        let timeout = GatewayError::from(TransportError::timeout("operation timed out"));
        assert!(timeout.is_timeout());
        assert_eq!(timeout.message(), "operation timed out");
    }
}
