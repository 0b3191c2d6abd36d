mod logging;
mod render;
mod settings;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use catalog_client::{
    AuthSession, BaseMode, CatalogGateway, Category, Condition, CredentialStore, Dialect, FileCredentialStore,
    FilterCriteria, FuelType, GatewayError, ListingDraft, ListingPatch, ListingStatus, Location,
    SalesQuery, Transmission,
};
use chrono::{Datelike, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

use crate::settings::Settings;

#[derive(Debug, Parser)]
#[command(
    name = "catalog-cli",
    version,
    about = "CLI клиент для сервиса каталога автомобилей"
)]
struct Cli {
    /// Адрес сервера (перекрывает CATALOG_PROXIED_URL или, с --direct, CATALOG_DIRECT_URL).
    #[arg(long, global = true)]
    server: Option<String>,

    /// Ходить напрямую в сервис каталога, минуя BFF.
    #[arg(long, global = true)]
    direct: bool,

    /// Схема имён сервера: canonical, bff или legacy.
    #[arg(long, global = true)]
    dialect: Option<Dialect>,

    /// Печатать результат как JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Вход пользователя; токен сохраняется в файл.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Удаление сохранённого токена.
    Logout,
    /// Есть ли сохранённый токен.
    Whoami,
    /// Список объявлений с фильтрами.
    List(ListArgs),
    /// Объявление по id.
    Get {
        #[arg(long)]
        id: String,
    },
    /// Создание объявления (требует токен).
    Create(CreateArgs),
    /// Частичное обновление объявления (требует токен).
    ///
    /// Отправляются только переданные флаги.
    Update(UpdateArgs),
    /// Удаление объявления (требует токен).
    Delete {
        #[arg(long)]
        id: String,
    },
    /// Загрузка изображения; печатает URL.
    Upload {
        #[arg(long)]
        file: PathBuf,
    },
    /// Состояние сервиса.
    Health,
    /// Метрики дашборда.
    Metrics,
    /// История продаж.
    Sales {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
        /// Начало периода, YYYY-MM-DD.
        #[arg(long)]
        start_date: Option<String>,
        /// Конец периода, YYYY-MM-DD.
        #[arg(long)]
        end_date: Option<String>,
    },
}

#[derive(Debug, Args, Default)]
struct ListArgs {
    #[arg(long)]
    brand: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    year_min: Option<i32>,
    #[arg(long)]
    year_max: Option<i32>,
    #[arg(long)]
    price_min: Option<f64>,
    #[arg(long)]
    price_max: Option<f64>,
    #[arg(long)]
    fuel: Option<String>,
    #[arg(long)]
    transmission: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    condition: Option<String>,
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
}

#[derive(Debug, Args)]
struct CreateArgs {
    #[arg(long)]
    brand: String,
    #[arg(long)]
    model: String,
    #[arg(long)]
    year: i32,
    #[arg(long)]
    price: f64,
    #[arg(long, default_value_t = 0)]
    mileage: u64,
    #[arg(long)]
    fuel: String,
    #[arg(long)]
    transmission: String,
    #[arg(long, default_value = "")]
    color: String,
    #[arg(long, default_value_t = 4)]
    doors: u8,
    #[arg(long)]
    category: String,
    #[arg(long)]
    condition: Option<String>,
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// URL изображения; флаг можно повторять.
    #[arg(long = "image")]
    images: Vec<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    zip_code: Option<String>,
    #[arg(long)]
    featured: bool,
}

#[derive(Debug, Args, Default)]
struct UpdateArgs {
    #[arg(long)]
    id: String,
    #[arg(long)]
    brand: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    price: Option<f64>,
    #[arg(long)]
    mileage: Option<u64>,
    #[arg(long)]
    fuel: Option<String>,
    #[arg(long)]
    transmission: Option<String>,
    #[arg(long)]
    color: Option<String>,
    #[arg(long)]
    doors: Option<u8>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    condition: Option<String>,
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    featured: Option<bool>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::from_env().context("некорректная конфигурация")?;
    logging::init_logging(&settings.log_level, settings.debug_logging)?;

    let settings = apply_overrides(settings, cli.server, cli.direct, cli.dialect);
    let config = settings.gateway_config();
    debug!(
        base_url = config.base_url(),
        dialect = ?config.dialect,
        "catalog-cli configured"
    );

    let store = Arc::new(FileCredentialStore::new(&settings.token_file));
    let gateway = CatalogGateway::connect(config, store.clone()).map_err(map_gateway_error)?;
    let on_error = |err: GatewayError| fail(&*store, err);
    let out = Output { json: cli.json };

    match cli.command {
        Command::Login { email, password } => {
            let session = login(&gateway, &email, &password).await?;
            out.show(&session, render::print_session)?;
        }
        Command::Logout => {
            store.clear().context("не удалось удалить токен")?;
            println!("Токен удалён");
        }
        Command::Whoami => match store.get() {
            Some(token) => println!("Токен сохранён: {}", mask_token(&token)),
            None => println!("Токен не найден: выполните `catalog-cli login ...`"),
        },
        Command::List(args) => {
            let page = gateway
                .list_listings(&build_filters(args))
                .await
                .map_err(on_error)?;
            out.show(&page, render::print_page)?;
        }
        Command::Get { id } => {
            let listing = gateway.get_listing(&id).await.map_err(on_error)?;
            out.show(&listing, |l| render::print_listing("Объявление", l, Utc::now()))?;
        }
        Command::Create(args) => {
            let draft = build_draft(args);
            validate_draft(&draft, Utc::now().year())?;
            let listing = gateway.create_listing(&draft).await.map_err(on_error)?;
            out.show(&listing, |l| {
                render::print_listing("Объявление создано", l, Utc::now())
            })?;
        }
        Command::Update(args) => {
            let (id, patch) = build_patch(args)?;
            let listing = gateway.update_listing(&id, &patch).await.map_err(on_error)?;
            out.show(&listing, |l| {
                render::print_listing("Объявление обновлено", l, Utc::now())
            })?;
        }
        Command::Delete { id } => {
            gateway.delete_listing(&id).await.map_err(on_error)?;
            println!("Объявление удалено: id={id}");
        }
        Command::Upload { file } => {
            let (file_name, bytes) = read_upload(&file)?;
            let url = gateway
                .upload_image(&file_name, bytes)
                .await
                .map_err(on_error)?;
            println!("{url}");
        }
        Command::Health => {
            let health = gateway.health().await.map_err(on_error)?;
            out.show(&health, render::print_health)?;
        }
        Command::Metrics => {
            let metrics = gateway.dashboard_metrics().await.map_err(on_error)?;
            out.show(&metrics, render::print_metrics)?;
        }
        Command::Sales {
            page,
            limit,
            start_date,
            end_date,
        } => {
            let query = SalesQuery {
                page,
                limit,
                start_date,
                end_date,
            };
            let sales = gateway.list_sales(&query).await.map_err(on_error)?;
            out.show(&sales, render::print_sales)?;
        }
    }

    Ok(())
}

struct Output {
    json: bool,
}

impl Output {
    fn show<T: Serialize>(&self, value: &T, print: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            let text = serde_json::to_string_pretty(value).context("не удалось сериализовать ответ")?;
            println!("{text}");
        } else {
            print(value);
        }
        Ok(())
    }
}

fn apply_overrides(
    mut settings: Settings,
    server: Option<String>,
    direct: bool,
    dialect: Option<Dialect>,
) -> Settings {
    if direct {
        settings.base_mode = BaseMode::Direct;
    }
    if let Some(server) = server {
        let server = normalize_server(server);
        match settings.base_mode {
            BaseMode::Direct => settings.direct_url = Some(server),
            BaseMode::Proxied => settings.proxied_url = server,
        }
    }
    if let Some(dialect) = dialect {
        settings.dialect = dialect;
    }
    settings
}

fn normalize_server(server: String) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("http://{server}")
}

fn build_filters(args: ListArgs) -> FilterCriteria {
    FilterCriteria {
        brand: args.brand,
        model: args.model,
        year_min: args.year_min,
        year_max: args.year_max,
        price_min: args.price_min,
        price_max: args.price_max,
        fuel_type: args.fuel.map(FuelType::from),
        transmission: args.transmission.map(Transmission::from),
        category: args.category.map(Category::from),
        condition: args.condition,
        search: args.search,
        page: args.page,
        limit: args.limit,
    }
}

fn build_draft(args: CreateArgs) -> ListingDraft {
    let location = match (args.city, args.state, args.zip_code) {
        (None, None, None) => None,
        (city, state, zip_code) => Some(Location {
            city: city.unwrap_or_default(),
            state: state.unwrap_or_default(),
            zip_code: zip_code.unwrap_or_default(),
        }),
    };

    ListingDraft {
        brand: args.brand,
        model: args.model,
        year: args.year,
        price: args.price,
        mileage: args.mileage,
        fuel_type: FuelType::from(args.fuel),
        transmission: Transmission::from(args.transmission),
        color: args.color,
        doors: args.doors,
        category: Category::from(args.category),
        condition: args.condition.map(Condition::from),
        status: args.status.map(ListingStatus::from),
        description: args.description,
        images: args.images,
        location,
        seller: None,
        is_featured: args.featured,
    }
}

fn validate_draft(draft: &ListingDraft, current_year: i32) -> Result<()> {
    let Err(errors) = draft.check(current_year) else {
        return Ok(());
    };

    let mut fields: Vec<String> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let reasons: Vec<String> = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            format!("{field}: {}", reasons.join(", "))
        })
        .collect();
    fields.sort();

    Err(anyhow!("некорректные данные объявления: {}", fields.join("; ")))
}

fn build_patch(args: UpdateArgs) -> Result<(String, ListingPatch)> {
    let patch = ListingPatch {
        brand: args.brand,
        model: args.model,
        year: args.year,
        price: args.price,
        mileage: args.mileage,
        fuel_type: args.fuel.map(FuelType::from),
        transmission: args.transmission.map(Transmission::from),
        color: args.color,
        doors: args.doors,
        category: args.category.map(Category::from),
        condition: args.condition.map(Condition::from),
        status: args.status.map(ListingStatus::from),
        description: args.description,
        is_featured: args.featured,
        ..ListingPatch::default()
    };

    if patch.is_empty() {
        bail!("нечего обновлять: передайте хотя бы одно поле");
    }
    Ok((args.id, patch))
}

fn read_upload(path: &Path) -> Result<(String, Vec<u8>)> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("некорректное имя файла: {}", path.display()))?
        .to_string();
    let bytes =
        fs::read(path).with_context(|| format!("не удалось прочитать {}", path.display()))?;
    Ok((file_name, bytes))
}

fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(6).collect();
    if token.chars().count() <= 6 {
        return "*".repeat(token.chars().count());
    }
    format!("{visible}…")
}

/// Вход и сохранение токена.
///
/// 401 здесь означает неверные email или пароль, поэтому сохранённый
/// токен не трогаем.
async fn login(gateway: &CatalogGateway, email: &str, password: &str) -> Result<AuthSession> {
    let session = gateway
        .authenticate(email, password)
        .await
        .map_err(map_gateway_error)?;
    gateway
        .credentials()
        .set(&session.token)
        .context("не удалось сохранить токен")?;
    Ok(session)
}

/// Преобразует ошибку шлюза и сбрасывает токен, если сервер его отклонил.
fn fail(store: &dyn CredentialStore, err: GatewayError) -> anyhow::Error {
    if err.is_unauthorized() {
        if let Err(clear_err) = store.clear() {
            debug!(error = %clear_err, "failed to clear rejected token");
        }
    }
    map_gateway_error(err)
}

fn map_gateway_error(err: GatewayError) -> anyhow::Error {
    let message = match &err {
        e if e.is_unauthorized() => format!(
            "требуется авторизация ({}): выполните `catalog-cli login ...`",
            e.message()
        ),
        e if e.is_forbidden() => format!("недостаточно прав: {}", e.message()),
        e if e.is_not_found() => "ресурс не найден".to_string(),
        GatewayError::Transport { timeout: true, .. } => {
            "сервер не ответил вовремя, попробуйте ещё раз".to_string()
        }
        GatewayError::Transport { message, .. } => format!("сервер недоступен: {message}"),
        GatewayError::Server {
            status, message, ..
        } => format!("ошибка сервера ({status}): {message}"),
        GatewayError::MalformedResponse(message) => {
            format!("неожиданный ответ сервера: {message}")
        }
        GatewayError::InvalidRequest(message) => format!("некорректный запрос: {message}"),
        GatewayError::Credential(err) => format!("ошибка хранилища токена: {err}"),
    };
    anyhow!(message)
}

#[cfg(test)]
mod tests {
    use catalog_client::{GatewayConfig, MemoryCredentialStore, TransportError};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn server_error(status: u16, message: &str) -> GatewayError {
        GatewayError::Server {
            status,
            message: message.to_string(),
            code: None,
            details: None,
        }
    }

    fn base_settings() -> Settings {
        Settings::from_lookup(|_| None).expect("defaults must be valid")
    }

    fn create_args() -> CreateArgs {
        CreateArgs {
            brand: "Jeep".to_string(),
            model: "Compass".to_string(),
            year: 2023,
            price: 180_000.0,
            mileage: 0,
            fuel: "diesel".to_string(),
            transmission: "automatico".to_string(),
            color: "Preto".to_string(),
            doors: 4,
            category: "suv".to_string(),
            condition: Some("novo".to_string()),
            status: None,
            description: None,
            images: vec![],
            city: Some("Recife".to_string()),
            state: None,
            zip_code: None,
            featured: false,
        }
    }

    #[test]
    fn normalize_server_keeps_scheme() {
        let s = normalize_server("https://example.com:8080".to_string());
        assert_eq!(s, "https://example.com:8080");
    }

    #[test]
    fn normalize_server_adds_http_scheme() {
        let s = normalize_server("127.0.0.1:3002".to_string());
        assert_eq!(s, "http://127.0.0.1:3002");
    }

    #[test]
    fn server_flag_overrides_proxied_url_by_default() {
        let settings = apply_overrides(base_settings(), Some("bff:4000".to_string()), false, None);
        assert_eq!(settings.gateway_config().base_url(), "http://bff:4000");
    }

    #[test]
    fn direct_flag_routes_server_to_direct_url() {
        let settings = apply_overrides(
            base_settings(),
            Some("api:3001".to_string()),
            true,
            Some(Dialect::Legacy),
        );
        let config = settings.gateway_config();
        assert_eq!(config.base_mode, BaseMode::Direct);
        assert_eq!(config.base_url(), "http://api:3001");
        assert_eq!(config.dialect, Dialect::Legacy);
    }

    #[test]
    fn list_args_become_typed_filters() {
        let filters = build_filters(ListArgs {
            brand: Some("Honda".to_string()),
            fuel: Some("gasolina".to_string()),
            category: Some("moto".to_string()),
            ..ListArgs::default()
        });
        assert_eq!(filters.fuel_type, Some(FuelType::Gasoline));
        assert_eq!(filters.category, Some(Category::Motorcycle));
        assert!(filters.model.is_none());
    }

    #[test]
    fn draft_from_args_normalizes_enums_and_location() {
        let draft = build_draft(create_args());
        assert_eq!(draft.transmission, Transmission::Automatic);
        assert_eq!(draft.condition, Some(Condition::New));
        assert_eq!(draft.location.map(|l| l.city), Some("Recife".to_string()));
        assert!(validate_draft(&build_draft(create_args()), 2025).is_ok());
    }

    #[test]
    fn invalid_draft_is_rejected_before_sending() {
        let mut args = create_args();
        args.doors = 9;
        args.year = 2031;
        let err = validate_draft(&build_draft(args), 2025).expect_err("must fail");
        let text = err.to_string();
        assert!(text.contains("doors"));
        assert!(text.contains("year"));
    }

    #[test]
    fn empty_update_is_refused() {
        let args = UpdateArgs {
            id: "1".to_string(),
            ..UpdateArgs::default()
        };
        assert!(build_patch(args).is_err());
    }

    #[test]
    fn update_carries_only_given_fields() {
        let args = UpdateArgs {
            id: "1".to_string(),
            price: Some(99.0),
            ..UpdateArgs::default()
        };
        let (id, patch) = build_patch(args).expect("must build");
        assert_eq!(id, "1");
        assert_eq!(
            patch,
            ListingPatch {
                price: Some(99.0),
                ..ListingPatch::default()
            }
        );
    }

    #[test]
    fn unauthorized_error_clears_stored_token() {
        let store = MemoryCredentialStore::with_token("stale");
        let err = fail(&store, server_error(401, "invalid token"));
        assert!(store.get().is_none());
        assert!(err.to_string().contains("invalid token"));
    }

    #[test]
    fn other_errors_keep_stored_token() {
        let store = MemoryCredentialStore::with_token("fresh");
        let err = fail(&store, server_error(500, "boom"));
        assert_eq!(store.get().as_deref(), Some("fresh"));
        assert_eq!(err.to_string(), "ошибка сервера (500): boom");
    }

    #[test]
    fn forbidden_error_keeps_stored_token() {
        let store = MemoryCredentialStore::with_token("valid");
        let err = fail(&store, server_error(403, "admin only"));
        assert_eq!(store.get().as_deref(), Some("valid"));
        assert_eq!(err.to_string(), "недостаточно прав: admin only");
    }

    async fn login_server(status: u16, body: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users/login"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn rejected_login_keeps_stored_token() {
        let server = login_server(401, json!({"message": "Credenciais inválidas"})).await;
        let store = Arc::new(MemoryCredentialStore::with_token("valid"));
        let gateway = CatalogGateway::connect(GatewayConfig::new(server.uri()), store.clone())
            .expect("gateway must build");

        let err = login(&gateway, "admin@test.com", "wrong")
            .await
            .expect_err("login must fail");

        assert!(err.to_string().contains("Credenciais inválidas"));
        assert_eq!(store.get().as_deref(), Some("valid"));
    }

    #[tokio::test]
    async fn successful_login_replaces_stored_token() {
        let server = login_server(
            200,
            json!({"success": true, "data": {"token": "jwt-2"}}),
        )
        .await;
        let store = Arc::new(MemoryCredentialStore::with_token("old"));
        let gateway = CatalogGateway::connect(GatewayConfig::new(server.uri()), store.clone())
            .expect("gateway must build");

        let session = login(&gateway, "admin@test.com", "secret")
            .await
            .expect("login must succeed");

        assert_eq!(session.token, "jwt-2");
        assert_eq!(store.get().as_deref(), Some("jwt-2"));
    }

    #[test]
    fn map_gateway_error_covers_transport_cases() {
        let timeout = map_gateway_error(GatewayError::from(TransportError::timeout("elapsed")));
        assert!(timeout.to_string().contains("вовремя"));

        let down = map_gateway_error(GatewayError::from(TransportError::network("refused")));
        assert_eq!(down.to_string(), "сервер недоступен: refused");

        let missing = map_gateway_error(server_error(404, "Veículo não encontrado"));
        assert_eq!(missing.to_string(), "ресурс не найден");
    }

    #[test]
    fn mask_token_hides_tail() {
        assert_eq!(mask_token("abcdefghijkl"), "abcdef…");
        assert_eq!(mask_token("abc"), "***");
    }
}
