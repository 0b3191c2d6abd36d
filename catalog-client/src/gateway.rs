use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::credentials::CredentialStore;
use crate::envelope::{self, ListShape};
use crate::error::{GatewayError, GatewayResult};
use crate::filters::{FilterCriteria, SalesQuery};
use crate::mapping;
use crate::models::{
    AuthSession, DashboardMetrics, HealthCheck, Listing, ListingDraft, ListingPage, ListingPatch,
    Sale, SalesPage,
};
use crate::transport::{ApiRequest, FilePart, ReqwestTransport, RequestBody, Transport};

const LOGIN_PATH: &str = "/api/users/login";
const UPLOAD_PATH: &str = "/api/upload";
const UPLOAD_FIELD: &str = "image";
const HEALTH_PATH: &str = "/health";
const METRICS_PATH: &str = "/api/dashboard/metrics";
const SALES_PATH: &str = "/api/sales";

const LISTING_COLLECTIONS: &[&str] = &["listings", "vehicles", "veiculos"];
const SALES_COLLECTIONS: &[&str] = &["sales"];

#[derive(Clone)]
/// Шлюз к сервису каталога автомобилей.
///
/// Собирает запросы (путь, фильтры, bearer-токен), разбирает конверты ответов
/// и приводит записи к канонической модели. Состояния между вызовами не
/// хранит, кроме общего хранилища токена.
pub struct CatalogGateway {
    config: GatewayConfig,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialStore>,
}

impl CatalogGateway {
    /// Создаёт шлюз с явно переданным транспортом.
    pub fn new(
        config: GatewayConfig,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            config,
            transport,
            credentials,
        }
    }

    /// Создаёт шлюз с HTTP-транспортом на `reqwest`.
    pub fn connect(
        config: GatewayConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> GatewayResult<Self> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Ok(Self::new(config, Arc::new(transport), credentials))
    }

    /// Текущая конфигурация.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Хранилище токена, общее с вызывающей стороной.
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Возвращает страницу объявлений по критериям.
    ///
    /// Успешный ответ незнакомой формы даёт пустую страницу.
    pub async fn list_listings(&self, criteria: &FilterCriteria) -> GatewayResult<ListingPage> {
        let dialect = self.config.dialect;
        let query = dialect.query_pairs(criteria);
        let body = self
            .send(Method::GET, dialect.collection_path(), query, RequestBody::Empty)
            .await?;

        let (items, shape) = envelope::probe_items(&body, LISTING_COLLECTIONS);
        self.log_shape("listings", shape, items.len());

        let listings = items
            .iter()
            .filter_map(|item| match mapping::parse_listing(item) {
                Ok(listing) => Some(listing),
                Err(reason) => {
                    warn!(reason = %reason, "skipping listing record");
                    None
                }
            })
            .collect();

        let pagination = envelope::probe_pagination(&body);
        Ok(ListingPage {
            listings,
            total: pagination.total,
            page: pagination.page,
            limit: pagination.limit,
            total_pages: pagination.total_pages,
        })
    }

    /// Получает объявление по идентификатору.
    pub async fn get_listing(&self, id: &str) -> GatewayResult<Listing> {
        let path = self.config.dialect.item_path(id);
        let body = self
            .send(Method::GET, &path, Vec::new(), RequestBody::Empty)
            .await?;
        single_listing(&body)
    }

    /// Создаёт объявление и возвращает его с идентификатором сервера.
    ///
    /// Черновик не проверяется; см. [`ListingDraft::check`].
    pub async fn create_listing(&self, draft: &ListingDraft) -> GatewayResult<Listing> {
        let dialect = self.config.dialect;
        let payload = dialect.outgoing_payload(to_json(draft)?);
        let body = self
            .send(
                Method::POST,
                dialect.collection_path(),
                Vec::new(),
                RequestBody::Json(payload),
            )
            .await?;
        single_listing(&body)
    }

    /// Обновляет объявление; отправляются только заданные поля патча.
    pub async fn update_listing(&self, id: &str, patch: &ListingPatch) -> GatewayResult<Listing> {
        let dialect = self.config.dialect;
        let payload = dialect.outgoing_payload(to_json(patch)?);
        let body = self
            .send(
                Method::PUT,
                &dialect.item_path(id),
                Vec::new(),
                RequestBody::Json(payload),
            )
            .await?;
        single_listing(&body)
    }

    /// Удаляет объявление. Тело ответа игнорируется.
    pub async fn delete_listing(&self, id: &str) -> GatewayResult<()> {
        let path = self.config.dialect.item_path(id);
        self.send(Method::DELETE, &path, Vec::new(), RequestBody::Empty)
            .await?;
        Ok(())
    }

    /// Выполняет вход и возвращает токен с данными пользователя.
    ///
    /// При любой ошибке основного адреса один раз повторяет запрос на
    /// запасном, если он настроен. Токен не сохраняется: это делает
    /// вызывающая сторона через [`CredentialStore::set`].
    pub async fn authenticate(&self, email: &str, password: &str) -> GatewayResult<AuthSession> {
        let payload = json!({ "email": email, "password": password });
        let (primary, secondary) = self.config.login_targets();

        let body = match self.login_at(primary, &payload).await {
            Ok(body) => body,
            Err(err) => {
                let Some(secondary) = secondary else {
                    return Err(err);
                };
                warn!(
                    primary = %primary,
                    secondary = %secondary,
                    error = %err,
                    "login failed, retrying on secondary target"
                );
                self.login_at(secondary, &payload).await?
            }
        };

        session_from(&body)
    }

    /// Загружает изображение и возвращает его публичный URL.
    pub async fn upload_image(&self, file_name: &str, bytes: Vec<u8>) -> GatewayResult<String> {
        let file = FilePart {
            field: UPLOAD_FIELD.to_string(),
            file_name: file_name.to_string(),
            content_type: content_type_for(file_name).to_string(),
            bytes,
        };
        let body = self
            .send(
                Method::POST,
                UPLOAD_PATH,
                Vec::new(),
                RequestBody::Multipart(file),
            )
            .await?;

        body.get("data")
            .and_then(|data| data.get("url"))
            .or_else(|| body.get("url"))
            .and_then(Value::as_str)
            .filter(|url| !url.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| GatewayError::MalformedResponse("upload response has no url".into()))
    }

    /// Состояние сервиса.
    pub async fn health(&self) -> GatewayResult<HealthCheck> {
        let body = self
            .send(Method::GET, HEALTH_PATH, Vec::new(), RequestBody::Empty)
            .await?;
        single_entity(&body, "health check")
    }

    /// Метрики дашборда.
    pub async fn dashboard_metrics(&self) -> GatewayResult<DashboardMetrics> {
        let body = self
            .send(Method::GET, METRICS_PATH, Vec::new(), RequestBody::Empty)
            .await?;
        single_entity(&body, "dashboard metrics")
    }

    /// История продаж; формы конверта те же, что у списка объявлений.
    pub async fn list_sales(&self, query: &SalesQuery) -> GatewayResult<SalesPage> {
        let body = self
            .send(
                Method::GET,
                SALES_PATH,
                query.query_pairs(),
                RequestBody::Empty,
            )
            .await?;

        let (items, shape) = envelope::probe_items(&body, SALES_COLLECTIONS);
        self.log_shape("sales", shape, items.len());

        let sales = items
            .iter()
            .filter_map(|item| match serde_json::from_value::<Sale>(item.clone()) {
                Ok(sale) => Some(sale),
                Err(err) => {
                    warn!(error = %err, "skipping sale record");
                    None
                }
            })
            .collect();

        let pagination = envelope::probe_pagination(&body);
        Ok(SalesPage {
            sales,
            total: pagination.total,
            page: pagination.page,
            limit: pagination.limit,
            total_pages: pagination.total_pages,
        })
    }

    fn endpoint(base_url: &str, path: &str) -> String {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn bearer(&self) -> Option<String> {
        self.credentials
            .get()
            .filter(|token| !token.trim().is_empty())
    }

    async fn login_at(&self, base_url: &str, payload: &Value) -> GatewayResult<Value> {
        self.send_to(
            base_url,
            Method::POST,
            LOGIN_PATH,
            Vec::new(),
            RequestBody::Json(payload.clone()),
        )
        .await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: RequestBody,
    ) -> GatewayResult<Value> {
        self.send_to(self.config.base_url(), method, path, query, body)
            .await
    }

    /// Отправляет запрос и возвращает тело успешного ответа как JSON.
    ///
    /// Пустое или не-JSON тело успешного ответа превращается в `null`.
    async fn send_to(
        &self,
        base_url: &str,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: RequestBody,
    ) -> GatewayResult<Value> {
        let request = ApiRequest {
            method,
            url: Self::endpoint(base_url, path),
            query,
            bearer: self.bearer(),
            body,
        };

        if self.config.debug_logging {
            info!(
                method = %request.method,
                url = %request.url,
                query = ?request.query,
                authorized = request.bearer.is_some(),
                "catalog request"
            );
        } else {
            debug!(method = %request.method, url = %request.url, "catalog request");
        }

        let method = request.method.clone();
        let url = request.url.clone();
        let response = self.transport.execute(request).await.map_err(|err| {
            warn!(method = %method, url = %url, error = %err.message, "catalog transport failed");
            GatewayError::from(err)
        })?;

        if !response.is_success() {
            let err = GatewayError::from_http_status(response.status, &response.body);
            debug!(status = response.status, error = %err, "catalog request rejected");
            return Err(err);
        }

        if self.config.debug_logging {
            info!(status = response.status, bytes = response.body.len(), "catalog response");
        }

        Ok(serde_json::from_slice(&response.body).unwrap_or(Value::Null))
    }

    fn log_shape(&self, what: &str, shape: ListShape, count: usize) {
        if self.config.debug_logging {
            info!(what, shape = ?shape, count, "response envelope");
        } else if shape == ListShape::Unrecognized {
            debug!(what, "unrecognized list envelope, returning empty page");
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> GatewayResult<Value> {
    serde_json::to_value(value)
        .map_err(|err| GatewayError::InvalidRequest(format!("failed to encode payload: {err}")))
}

fn single_listing(body: &Value) -> GatewayResult<Listing> {
    let entity = envelope::unwrap_single(body)
        .ok_or_else(|| GatewayError::MalformedResponse("response has no listing".into()))?;
    mapping::parse_listing(entity).map_err(GatewayError::MalformedResponse)
}

fn single_entity<T: DeserializeOwned>(body: &Value, what: &str) -> GatewayResult<T> {
    let entity = envelope::unwrap_single(body)
        .ok_or_else(|| GatewayError::MalformedResponse(format!("response has no {what}")))?;
    serde_json::from_value(entity.clone())
        .map_err(|err| GatewayError::MalformedResponse(format!("unusable {what}: {err}")))
}

fn session_from(body: &Value) -> GatewayResult<AuthSession> {
    let entity = envelope::unwrap_single(body)
        .ok_or_else(|| GatewayError::MalformedResponse("login response is empty".into()))?;

    let token = ["token", "accessToken", "access_token"]
        .iter()
        .filter_map(|field| entity.get(*field).and_then(Value::as_str))
        .map(str::trim)
        .find(|token| !token.is_empty())
        .ok_or_else(|| GatewayError::MalformedResponse("login response has no token".into()))?;

    Ok(AuthSession {
        token: token.to_string(),
        user: entity.get("user").and_then(mapping::parse_user),
    })
}

fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}
