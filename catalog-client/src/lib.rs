//! Клиентская библиотека для сервиса каталога автомобилей.
//!
//! Главный тип, `CatalogGateway`, строит HTTP-запросы к сервису и разбирает
//! ответы любой известной схемы (каноническая, BFF `/api/vehicles`, старая
//! португальская `/api/veiculos`). Результат всегда приводится к
//! канонической модели `Listing`.
//!
//! Токен хранится в `CredentialStore`, который передаётся шлюзу при
//! создании. Шлюз подставляет его в каждый запрос как
//! `Authorization: Bearer`, если токен есть.
//!
//! Модуль `format` форматирует значения для показа в локали pt-BR.
#![warn(missing_docs)]

mod config;
mod credentials;
mod dialect;
mod envelope;
mod error;
mod filters;
pub mod format;
mod gateway;
mod mapping;
mod models;
mod transport;

pub use config::{BaseMode, DEFAULT_PROXIED_URL, DEFAULT_TIMEOUT, GatewayConfig};
pub use credentials::{
    CredentialStore, DEFAULT_TOKEN_FILE, FileCredentialStore, MemoryCredentialStore,
};
pub use dialect::Dialect;
pub use error::{CredentialError, GatewayError, GatewayResult, TransportError};
pub use filters::{FilterCriteria, FilterKey, SalesQuery};
pub use gateway::CatalogGateway;
pub use models::{
    AuthSession, AuthUser, BrandStats, Buyer, Category, CategoryCount, Condition,
    DashboardMetrics, FuelType, HealthCheck, HealthServices, HealthStatus, Listing, ListingDraft,
    ListingPage, ListingPatch, ListingStatus, Location, MonthlySales, Sale, SaleSeller,
    SaleVehicle, SalesPage, Seller, ServiceState, Transmission,
};
pub use transport::{ApiRequest, ApiResponse, FilePart, ReqwestTransport, RequestBody, Transport};
