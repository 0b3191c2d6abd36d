//! Форматирование для отображения в локали pt-BR.
//!
//! Все функции чистые. Непонятный вход (нечисловое значение, неразборчивая
//! дата, незнакомый код) возвращается как есть.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

use crate::models::{Category, Condition, FuelType, ListingStatus, Transmission};

const NBSP: char = '\u{a0}';

/// Дальше этой границы дробная часть `f64` уже не точна, такие значения
/// возвращаются как есть.
const MAX_FORMATTED: f64 = 1e15;

fn formattable(value: f64) -> bool {
    value.is_finite() && value.abs() < MAX_FORMATTED
}

/// Сумма в реалах: `R$ 1.234,56` (с неразрывным пробелом).
pub fn format_currency(value: f64) -> String {
    if !formattable(value) {
        return value.to_string();
    }
    let sign = if value < 0.0 && round_to(value.abs(), 2) > 0.0 {
        "-"
    } else {
        ""
    };
    format!("{sign}R${NBSP}{}", decimal(value.abs(), 2, 2))
}

/// Число с разделителями pt-BR и не более чем тремя знаками после запятой.
pub fn format_number(value: f64) -> String {
    if !formattable(value) {
        return value.to_string();
    }
    let sign = if value < 0.0 && round_to(value.abs(), 3) > 0.0 {
        "-"
    } else {
        ""
    };
    format!("{sign}{}", decimal(value.abs(), 0, 3))
}

/// Дата в виде `dd/MM/yyyy`.
pub fn format_date(raw: &str) -> String {
    parse_instant(raw)
        .map(|date| date.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Дата и время в виде `dd/MM/yyyy HH:mm`.
pub fn format_date_time(raw: &str) -> String {
    parse_instant(raw)
        .map(|date| date.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Давность относительно `now`: `Hoje`, `Ontem`, `N dias atrás` и т.д.
///
/// Даты из будущего считаются сегодняшними.
pub fn format_relative_time(raw: &str, now: DateTime<Utc>) -> String {
    let Some(date) = parse_instant(raw) else {
        return raw.to_string();
    };
    let days = now
        .signed_duration_since(date.with_timezone(&Utc))
        .num_days()
        .max(0);

    match days {
        0 => "Hoje".to_string(),
        1 => "Ontem".to_string(),
        2..=6 => format!("{days} dias atrás"),
        7..=29 => format!("{} semanas atrás", days / 7),
        30..=364 => format!("{} meses atrás", days / 30),
        _ => format!("{} anos atrás", days / 365),
    }
}

/// Подпись типа топлива.
pub fn fuel_label(raw: &str) -> String {
    let label = match FuelType::from(raw) {
        FuelType::Gasoline => "Gasolina",
        FuelType::Ethanol => "Etanol",
        FuelType::Flex => "Flex",
        FuelType::Diesel => "Diesel",
        FuelType::Electric => "Elétrico",
        FuelType::Hybrid => "Híbrido",
        FuelType::Other(raw) => return raw,
    };
    label.to_string()
}

/// Подпись коробки передач.
pub fn transmission_label(raw: &str) -> String {
    let label = match Transmission::from(raw) {
        Transmission::Manual => "Manual",
        Transmission::Automatic => "Automático",
        Transmission::Cvt => "CVT",
        Transmission::Other(raw) => return raw,
    };
    label.to_string()
}

/// Подпись категории, включая старые `car`/`van`.
pub fn category_label(raw: &str) -> String {
    let label = match Category::from(raw) {
        Category::Hatch => "Hatch",
        Category::Sedan => "Sedan",
        Category::Suv => "SUV",
        Category::Pickup => "Pickup",
        Category::Truck => "Caminhão",
        Category::Motorcycle => "Moto",
        Category::Other(raw) => match raw.trim().to_lowercase().as_str() {
            "car" => "Carro",
            "van" => "Van",
            _ => return raw,
        },
    };
    label.to_string()
}

/// Подпись статуса объявления.
pub fn status_label(raw: &str) -> String {
    let label = match ListingStatus::from(raw) {
        ListingStatus::Active => "Ativo",
        ListingStatus::Inactive => "Inativo",
        ListingStatus::Sold => "Vendido",
        ListingStatus::Reserved => "Reservado",
        ListingStatus::Other(raw) => return raw,
    };
    label.to_string()
}

/// Подпись состояния (новый/подержанный).
pub fn condition_label(raw: &str) -> String {
    let label = match Condition::from(raw) {
        Condition::New => "Novo",
        Condition::Used => "Usado",
        Condition::Other(raw) => return raw,
    };
    label.to_string()
}

fn parse_instant(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date);
    }
    let utc = FixedOffset::east_opt(0)?;
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_local_timezone(utc).single();
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    date.and_hms_opt(0, 0, 0)?.and_local_timezone(utc).single()
}

fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

/// Неотрицательное число с группировкой `.` и дробной частью через `,`.
fn decimal(value: f64, min_fraction: usize, max_fraction: u32) -> String {
    let factor = 10u128.pow(max_fraction);
    let scaled = (value * factor as f64).round() as u128;
    let integer = scaled / factor;
    let fraction = scaled % factor;

    let mut out = group_thousands(integer);

    let mut digits = format!("{fraction:0width$}", width = max_fraction as usize);
    while digits.len() > min_fraction && digits.ends_with('0') {
        digits.pop();
    }
    if !digits.is_empty() {
        out.push(',');
        out.push_str(&digits);
    }
    out
}

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0)
            .single()
            .expect("valid ts")
    }

    #[test]
    fn currency_uses_brazilian_separators() {
        assert_eq!(format_currency(1234.56), "R$\u{a0}1.234,56");
        assert_eq!(format_currency(120000.0), "R$\u{a0}120.000,00");
        assert_eq!(format_currency(0.5), "R$\u{a0}0,50");
        assert_eq!(format_currency(-1999.999), "-R$\u{a0}2.000,00");
    }

    #[test]
    fn non_finite_values_are_echoed() {
        assert_eq!(format_currency(f64::NAN), "NaN");
        assert_eq!(format_number(f64::INFINITY), "inf");
    }

    #[test]
    fn huge_values_are_echoed() {
        assert_eq!(format_currency(1e40), 1e40_f64.to_string());
        assert_eq!(format_number(-1e40), (-1e40_f64).to_string());
        assert_eq!(format_currency(1e15), 1e15_f64.to_string());
        assert_eq!(format_number(999_999_999_999.0), "999.999.999.999");
    }

    #[test]
    fn number_trims_fraction() {
        assert_eq!(format_number(45000.0), "45.000");
        assert_eq!(format_number(1234567.891), "1.234.567,891");
        assert_eq!(format_number(2.5), "2,5");
        assert_eq!(format_number(999.0), "999");
    }

    #[test]
    fn dates_are_formatted_day_first() {
        assert_eq!(format_date("2025-01-10T12:00:00.000Z"), "10/01/2025");
        assert_eq!(format_date("2024-12-31"), "31/12/2024");
        assert_eq!(format_date_time("2025-01-10T08:05:00Z"), "10/01/2025 08:05");
        assert_eq!(format_date("ontem"), "ontem");
    }

    #[test]
    fn relative_time_buckets() {
        let cases = [
            ("2025-06-15T08:00:00Z", "Hoje"),
            ("2025-06-14T11:00:00Z", "Ontem"),
            ("2025-06-12T12:00:00Z", "3 dias atrás"),
            ("2025-06-01T12:00:00Z", "2 semanas atrás"),
            ("2025-03-01T12:00:00Z", "3 meses atrás"),
            ("2023-06-01T12:00:00Z", "2 anos atrás"),
            ("2025-07-01T12:00:00Z", "Hoje"),
            ("garbage", "garbage"),
        ];
        for (raw, expected) in cases {
            assert_eq!(format_relative_time(raw, now()), expected, "{raw}");
        }
    }

    #[test]
    fn labels_translate_known_codes() {
        assert_eq!(fuel_label("electric"), "Elétrico");
        assert_eq!(fuel_label("gasolina"), "Gasolina");
        assert_eq!(transmission_label("cvt"), "CVT");
        assert_eq!(category_label("car"), "Carro");
        assert_eq!(category_label("suv"), "SUV");
        assert_eq!(category_label("truck"), "Caminhão");
        assert_eq!(status_label("sold"), "Vendido");
        assert_eq!(condition_label("new"), "Novo");
    }

    #[test]
    fn labels_echo_unknown_codes() {
        assert_eq!(fuel_label("hydrogen"), "hydrogen");
        assert_eq!(transmission_label("dct"), "dct");
        assert_eq!(category_label("Buggy"), "Buggy");
        assert_eq!(status_label("archived"), "archived");
        assert_eq!(condition_label("semi-novo"), "semi-novo");
    }
}
