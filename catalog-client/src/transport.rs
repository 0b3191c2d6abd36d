use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use serde_json::Value;

use crate::error::{GatewayError, GatewayResult, TransportError};

#[derive(Debug, Clone, PartialEq)]
/// Файл для multipart-загрузки.
pub struct FilePart {
    /// Имя поля формы.
    pub field: String,
    /// Имя файла.
    pub file_name: String,
    /// MIME-тип содержимого.
    pub content_type: String,
    /// Содержимое файла.
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
/// Тело запроса.
pub enum RequestBody {
    /// Без тела.
    Empty,
    /// JSON (`Content-Type: application/json`).
    Json(Value),
    /// `multipart/form-data` с одним файлом.
    Multipart(FilePart),
}

#[derive(Debug, Clone, PartialEq)]
/// Запрос к сервису каталога, собранный шлюзом.
pub struct ApiRequest {
    /// HTTP-метод.
    pub method: Method,
    /// Полный URL без query.
    pub url: String,
    /// Query-параметры.
    pub query: Vec<(String, String)>,
    /// Bearer-токен; `None` означает отсутствие заголовка `Authorization`.
    pub bearer: Option<String>,
    /// Тело запроса.
    pub body: RequestBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Ответ сервиса каталога.
pub struct ApiResponse {
    /// HTTP-статус.
    pub status: u16,
    /// Тело ответа.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Статус 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Транспорт, через который шлюз отправляет запросы.
///
/// Продакшен-реализация: [`ReqwestTransport`]. В тестах подменяется фейком.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Выполняет запрос. Не-2xx статус ошибкой транспорта не считается.
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[derive(Debug, Clone)]
/// HTTP-транспорт на `reqwest`.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Создаёт транспорт с общим таймаутом запроса.
    pub fn new(timeout: Duration) -> GatewayResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .timeout(timeout)
            .build()
            .map_err(|err| {
                GatewayError::InvalidRequest(format!("failed to build http client: {err}"))
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = self.client.request(request.method, &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(file) => {
                let part = Part::bytes(file.bytes)
                    .file_name(file.file_name)
                    .mime_str(&file.content_type)
                    .map_err(|err| TransportError::network(format!("invalid upload: {err}")))?;
                builder.multipart(Form::new().part(file.field, part))
            }
        };

        let response = builder.send().await.map_err(from_reqwest)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(from_reqwest)?;

        Ok(ApiResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn from_reqwest(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::timeout(err.to_string())
    } else {
        TransportError::network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range_is_2xx_only() {
        let ok = ApiResponse {
            status: 204,
            body: vec![],
        };
        let redirect = ApiResponse {
            status: 302,
            body: vec![],
        };
        assert!(ok.is_success());
        assert!(!redirect.is_success());
    }

    #[test]
    fn transport_builds_with_small_timeout() {
        assert!(ReqwestTransport::new(Duration::from_millis(50)).is_ok());
    }
}
