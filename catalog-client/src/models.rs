use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// Перечисление, которое не падает на незнакомых значениях.
///
/// Известные значения (включая португальские из старой схемы) сводятся к
/// каноническому варианту, остальные сохраняются как есть в `Other`.
macro_rules! fail_soft_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $canonical:literal $(| $alias:literal)* ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// Значение вне известного набора.
            Other(String),
        }

        impl $name {
            /// Каноническое строковое значение.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $canonical, )+
                    Self::Other(raw) => raw,
                }
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                match raw.trim().to_lowercase().as_str() {
                    $( $canonical $(| $alias)* => Self::$variant, )+
                    _ => Self::Other(raw),
                }
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::from(raw.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

fail_soft_enum! {
    /// Тип топлива.
    FuelType {
        /// Бензин.
        Gasoline => "gasoline" | "gasolina",
        /// Этанол.
        Ethanol => "ethanol" | "etanol",
        /// Flex (бензин/этанол).
        Flex => "flex",
        /// Дизель.
        Diesel => "diesel",
        /// Электро.
        Electric => "electric" | "eletrico" | "elétrico",
        /// Гибрид.
        Hybrid => "hybrid" | "hibrido" | "híbrido",
    }
}

fail_soft_enum! {
    /// Коробка передач.
    Transmission {
        /// Механика.
        Manual => "manual",
        /// Автомат.
        Automatic => "automatic" | "automatico" | "automático",
        /// Вариатор.
        Cvt => "cvt",
    }
}

fail_soft_enum! {
    /// Категория кузова.
    ///
    /// Значения `car`/`van` из старой английской схемы сюда не входят и
    /// приходят как `Other`.
    Category {
        /// Хэтчбек.
        Hatch => "hatch",
        /// Седан.
        Sedan => "sedan",
        /// Кроссовер/внедорожник.
        Suv => "suv",
        /// Пикап.
        Pickup => "pickup" | "picape",
        /// Грузовик.
        Truck => "truck" | "caminhao" | "caminhão",
        /// Мотоцикл.
        Motorcycle => "motorcycle" | "moto",
    }
}

fail_soft_enum! {
    /// Состояние автомобиля (новый/подержанный).
    Condition {
        /// Новый.
        New => "new" | "novo",
        /// С пробегом.
        Used => "used" | "usado",
    }
}

fail_soft_enum! {
    /// Статус объявления в каталоге.
    ListingStatus {
        /// Активно.
        Active => "active" | "ativo",
        /// Снято с публикации.
        Inactive => "inactive" | "inativo",
        /// Продано.
        Sold => "sold" | "vendido",
        /// Зарезервировано.
        Reserved => "reserved" | "reservado",
    }
}

fail_soft_enum! {
    /// Общее состояние сервиса из `/health`.
    HealthStatus {
        /// Сервис исправен.
        Healthy => "healthy",
        /// Сервис неисправен.
        Unhealthy => "unhealthy",
    }
}

fail_soft_enum! {
    /// Состояние зависимости сервиса.
    ServiceState {
        /// Доступна.
        Up => "up",
        /// Недоступна.
        Down => "down",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Местоположение автомобиля.
pub struct Location {
    /// Город.
    #[serde(default)]
    pub city: String,
    /// Штат.
    #[serde(default)]
    pub state: String,
    /// Почтовый индекс.
    #[serde(default)]
    pub zip_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
/// Продавец.
pub struct Seller {
    /// Идентификатор продавца.
    #[serde(default)]
    pub id: String,
    /// Имя.
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,
    /// Email.
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    /// Телефон.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Каноническое объявление о продаже автомобиля.
///
/// Любая схема сервера (португальская, BFF) приводится к этой модели
/// внутри шлюза.
pub struct Listing {
    /// Идентификатор, назначенный сервером. Не меняется.
    pub id: String,
    /// Марка.
    pub brand: String,
    /// Модель.
    pub model: String,
    /// Год выпуска.
    #[serde(default, deserialize_with = "lenient_i32")]
    pub year: i32,
    /// Цена.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: f64,
    /// Пробег, км.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub mileage: u64,
    /// Тип топлива.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<FuelType>,
    /// Коробка передач.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmission: Option<Transmission>,
    /// Цвет.
    #[serde(default)]
    pub color: String,
    /// Количество дверей.
    #[serde(default, deserialize_with = "lenient_u8")]
    pub doors: u8,
    /// Категория кузова.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Новый/подержанный.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    /// Статус публикации.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatus>,
    /// Описание.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ссылки на изображения, в порядке показа.
    #[serde(default)]
    pub images: Vec<String>,
    /// Местоположение.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Продавец.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<Seller>,
    /// Объявление в подборке.
    #[serde(default)]
    pub is_featured: bool,
    /// Дата создания (UTC).
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// Дата последнего обновления (UTC).
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Страница списка объявлений.
pub struct ListingPage {
    /// Объявления текущей страницы.
    pub listings: Vec<Listing>,
    /// Общее количество объявлений по всем страницам.
    pub total: u64,
    /// Номер страницы, начиная с 1.
    pub page: u32,
    /// Размер страницы.
    pub limit: u32,
    /// Количество страниц.
    pub total_pages: u32,
}

impl ListingPage {
    /// Ограничивает номер страницы диапазоном `[1, max(1, total_pages)]`.
    ///
    /// Шлюз страницу не ограничивает, это делает вызывающая сторона.
    pub fn clamp_page(&self, page: u32) -> u32 {
        page.clamp(1, self.total_pages.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
/// Данные для создания объявления.
pub struct ListingDraft {
    /// Марка.
    #[validate(length(min = 1, max = 64))]
    pub brand: String,
    /// Модель.
    #[validate(length(min = 1, max = 64))]
    pub model: String,
    /// Год выпуска.
    #[validate(range(min = 1900))]
    pub year: i32,
    /// Цена.
    #[validate(range(min = 0.0))]
    pub price: f64,
    /// Пробег, км.
    pub mileage: u64,
    /// Тип топлива.
    pub fuel_type: FuelType,
    /// Коробка передач.
    pub transmission: Transmission,
    /// Цвет.
    pub color: String,
    /// Количество дверей.
    #[validate(range(min = 2, max = 5))]
    pub doors: u8,
    /// Категория кузова.
    pub category: Category,
    /// Новый/подержанный.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    /// Статус публикации.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatus>,
    /// Описание.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ссылки на изображения.
    #[serde(default)]
    pub images: Vec<String>,
    /// Местоположение.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Продавец.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub seller: Option<Seller>,
    /// Объявление в подборке.
    #[serde(default)]
    pub is_featured: bool,
}

impl ListingDraft {
    /// Проверяет черновик, включая верхнюю границу года (`current_year + 1`).
    ///
    /// Шлюз сам черновики не проверяет, это задача вызывающей стороны.
    pub fn check(&self, current_year: i32) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if self.year > current_year + 1 {
            let mut err = ValidationError::new("year_in_future");
            err.message = Some("must not exceed next model year".into());
            errors.add("year", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Частичное обновление объявления: отправляются только заданные поля.
pub struct ListingPatch {
    /// Марка.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Модель.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Год выпуска.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Цена.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Пробег, км.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mileage: Option<u64>,
    /// Тип топлива.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<FuelType>,
    /// Коробка передач.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmission: Option<Transmission>,
    /// Цвет.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Количество дверей.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doors: Option<u8>,
    /// Категория кузова.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Новый/подержанный.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    /// Статус публикации.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatus>,
    /// Описание.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ссылки на изображения (заменяют текущий список целиком).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    /// Местоположение.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Продавец.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<Seller>,
    /// Объявление в подборке.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
}

impl ListingPatch {
    /// В патче нет ни одного поля.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Пользователь бэкофиса.
pub struct AuthUser {
    /// Идентификатор пользователя.
    #[serde(default)]
    pub id: String,
    /// Имя.
    #[serde(default)]
    pub name: String,
    /// Email.
    #[serde(default)]
    pub email: String,
    /// Телефон.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Ответ после успешного входа.
pub struct AuthSession {
    /// Bearer-токен.
    pub token: String,
    /// Данные пользователя, если сервер их вернул.
    #[serde(default)]
    pub user: Option<AuthUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Состояние зависимостей сервиса.
pub struct HealthServices {
    /// База данных.
    pub database: ServiceState,
    /// BFF-слой.
    pub bff: ServiceState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Ответ `/health`.
pub struct HealthCheck {
    /// Общее состояние.
    pub status: HealthStatus,
    /// Время ответа сервиса.
    #[serde(default)]
    pub timestamp: String,
    /// Версия сервиса.
    #[serde(default)]
    pub version: String,
    /// Состояние зависимостей.
    #[serde(default)]
    pub services: Option<HealthServices>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Количество объявлений в категории.
pub struct CategoryCount {
    /// Категория.
    pub category: String,
    /// Количество.
    #[serde(default)]
    pub quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Продажи за месяц.
pub struct MonthlySales {
    /// Месяц (как его присылает сервер).
    pub month: String,
    /// Количество продаж.
    #[serde(default)]
    pub sales: u64,
    /// Выручка.
    #[serde(default)]
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Популярная марка.
pub struct BrandStats {
    /// Марка.
    pub brand: String,
    /// Объявлений в каталоге.
    #[serde(default)]
    pub quantity: u64,
    /// Продаж.
    #[serde(default)]
    pub sales: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Метрики дашборда.
pub struct DashboardMetrics {
    /// Всего объявлений.
    pub total_vehicles: u64,
    /// Активных объявлений.
    pub active_vehicles: u64,
    /// Проданных автомобилей.
    pub sold_vehicles: u64,
    /// Продаж за текущий месяц.
    pub monthly_sales: u64,
    /// Выручка за текущий месяц.
    pub monthly_revenue: f64,
    /// Выручка за всё время.
    pub total_revenue: f64,
    /// Распределение по категориям.
    pub vehicles_by_category: Vec<CategoryCount>,
    /// Продажи по месяцам.
    pub sales_by_month: Vec<MonthlySales>,
    /// Популярные марки.
    pub top_brands: Vec<BrandStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Краткое описание проданного автомобиля.
pub struct SaleVehicle {
    /// Марка.
    pub brand: String,
    /// Модель.
    pub model: String,
    /// Год выпуска.
    pub year: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Покупатель.
pub struct Buyer {
    /// Имя.
    pub name: String,
    /// Email.
    pub email: String,
    /// Телефон.
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Продавец в записи о продаже.
pub struct SaleSeller {
    /// Идентификатор.
    pub id: String,
    /// Имя.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Запись о продаже.
pub struct Sale {
    /// Идентификатор продажи.
    #[serde(alias = "_id")]
    pub id: String,
    /// Идентификатор проданного объявления.
    #[serde(default)]
    pub vehicle_id: String,
    /// Проданный автомобиль.
    #[serde(default)]
    pub vehicle: SaleVehicle,
    /// Цена продажи.
    #[serde(default)]
    pub price: f64,
    /// Дата продажи (ISO 8601).
    #[serde(default)]
    pub sale_date: String,
    /// Покупатель.
    #[serde(default)]
    pub buyer: Buyer,
    /// Продавец.
    #[serde(default)]
    pub seller: SaleSeller,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Страница истории продаж.
pub struct SalesPage {
    /// Продажи текущей страницы.
    pub sales: Vec<Sale>,
    /// Всего продаж.
    pub total: u64,
    /// Номер страницы, начиная с 1.
    pub page: u32,
    /// Размер страницы.
    pub limit: u32,
    /// Количество страниц.
    pub total_pages: u32,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| s.parse::<DateTime<Utc>>().ok()))
}

/// Число или числовая строка; всё прочее считается отсутствующим.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let number = match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite()))
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?.unwrap_or_default())
}

fn lenient_i32<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?
        .map(|n| n.round() as i32)
        .unwrap_or_default())
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?
        .filter(|n| *n >= 0.0)
        .map(|n| n.round() as u64)
        .unwrap_or_default())
}

fn lenient_u8<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?
        .filter(|n| (0.0..=f64::from(u8::MAX)).contains(n))
        .map(|n| n.round() as u8)
        .unwrap_or_default())
}
