use serde::{Deserialize, Serialize};

use crate::models::{Category, FuelType, Transmission};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Ключ фильтра списка объявлений в терминах вызывающей стороны.
pub enum FilterKey {
    /// Марка.
    Brand,
    /// Модель.
    Model,
    /// Минимальный год.
    YearMin,
    /// Максимальный год.
    YearMax,
    /// Минимальная цена.
    PriceMin,
    /// Максимальная цена.
    PriceMax,
    /// Тип топлива.
    FuelType,
    /// Коробка передач.
    Transmission,
    /// Категория кузова.
    Category,
    /// Состояние или статус (зависит от версии сервера).
    Condition,
    /// Полнотекстовый поиск.
    Search,
    /// Номер страницы.
    Page,
    /// Размер страницы.
    Limit,
}

impl FilterKey {
    /// Все ключи фильтра в порядке формирования запроса.
    pub const ALL: [FilterKey; 13] = [
        FilterKey::Brand,
        FilterKey::Model,
        FilterKey::YearMin,
        FilterKey::YearMax,
        FilterKey::PriceMin,
        FilterKey::PriceMax,
        FilterKey::FuelType,
        FilterKey::Transmission,
        FilterKey::Category,
        FilterKey::Condition,
        FilterKey::Search,
        FilterKey::Page,
        FilterKey::Limit,
    ];

    /// Каноническое имя ключа.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterKey::Brand => "brand",
            FilterKey::Model => "model",
            FilterKey::YearMin => "yearMin",
            FilterKey::YearMax => "yearMax",
            FilterKey::PriceMin => "priceMin",
            FilterKey::PriceMax => "priceMax",
            FilterKey::FuelType => "fuelType",
            FilterKey::Transmission => "transmission",
            FilterKey::Category => "category",
            FilterKey::Condition => "condition",
            FilterKey::Search => "search",
            FilterKey::Page => "page",
            FilterKey::Limit => "limit",
        }
    }

    /// Значение ключа является значением перечисления и может требовать
    /// перевода под схему сервера.
    pub(crate) fn is_enum_valued(self) -> bool {
        matches!(
            self,
            FilterKey::FuelType
                | FilterKey::Transmission
                | FilterKey::Category
                | FilterKey::Condition
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Критерии фильтрации списка объявлений.
///
/// Незаданные значения и пустые строки в запрос не попадают.
/// Согласованность диапазонов (`year_min <= year_max`) не проверяется.
pub struct FilterCriteria {
    /// Марка.
    pub brand: Option<String>,
    /// Модель.
    pub model: Option<String>,
    /// Минимальный год.
    pub year_min: Option<i32>,
    /// Максимальный год.
    pub year_max: Option<i32>,
    /// Минимальная цена.
    pub price_min: Option<f64>,
    /// Максимальная цена.
    pub price_max: Option<f64>,
    /// Тип топлива.
    pub fuel_type: Option<FuelType>,
    /// Коробка передач.
    pub transmission: Option<Transmission>,
    /// Категория кузова.
    pub category: Option<Category>,
    /// Состояние (`new`/`used`) или статус (`active`/...), как ожидает сервер.
    pub condition: Option<String>,
    /// Полнотекстовый поиск.
    pub search: Option<String>,
    /// Номер страницы.
    pub page: Option<u32>,
    /// Размер страницы.
    pub limit: Option<u32>,
}

impl FilterCriteria {
    /// Возвращает заданные непустые значения в каноническом порядке ключей.
    pub fn entries(&self) -> Vec<(FilterKey, String)> {
        FilterKey::ALL
            .iter()
            .filter_map(|key| {
                let value = self.raw_value(*key)?;
                let value = value.trim();
                if value.is_empty() {
                    return None;
                }
                Some((*key, value.to_string()))
            })
            .collect()
    }

    fn raw_value(&self, key: FilterKey) -> Option<String> {
        match key {
            FilterKey::Brand => self.brand.clone(),
            FilterKey::Model => self.model.clone(),
            FilterKey::YearMin => self.year_min.map(|v| v.to_string()),
            FilterKey::YearMax => self.year_max.map(|v| v.to_string()),
            FilterKey::PriceMin => self.price_min.map(|v| v.to_string()),
            FilterKey::PriceMax => self.price_max.map(|v| v.to_string()),
            FilterKey::FuelType => self.fuel_type.as_ref().map(|v| v.as_str().to_string()),
            FilterKey::Transmission => self.transmission.as_ref().map(|v| v.as_str().to_string()),
            FilterKey::Category => self.category.as_ref().map(|v| v.as_str().to_string()),
            FilterKey::Condition => self.condition.clone(),
            FilterKey::Search => self.search.clone(),
            FilterKey::Page => self.page.map(|v| v.to_string()),
            FilterKey::Limit => self.limit.map(|v| v.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Параметры истории продаж.
pub struct SalesQuery {
    /// Номер страницы.
    pub page: Option<u32>,
    /// Размер страницы.
    pub limit: Option<u32>,
    /// Начало периода (ISO 8601 дата).
    pub start_date: Option<String>,
    /// Конец периода (ISO 8601 дата).
    pub end_date: Option<String>,
}

impl SalesQuery {
    pub(crate) fn query_pairs(&self) -> Vec<(String, String)> {
        let pairs = [
            ("page", self.page.map(|v| v.to_string())),
            ("limit", self.limit.map(|v| v.to_string())),
            ("startDate", self.start_date.clone()),
            ("endDate", self.end_date.clone()),
        ];

        pairs
            .into_iter()
            .filter_map(|(key, value)| {
                let value = value?.trim().to_string();
                (!value.is_empty()).then(|| (key.to_string(), value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_skip_absent_and_blank_values() {
        let criteria = FilterCriteria {
            brand: Some("Toyota".to_string()),
            model: Some("".to_string()),
            search: Some("   ".to_string()),
            year_min: Some(2018),
            page: Some(2),
            ..FilterCriteria::default()
        };

        let entries = criteria.entries();
        assert_eq!(
            entries,
            vec![
                (FilterKey::Brand, "Toyota".to_string()),
                (FilterKey::YearMin, "2018".to_string()),
                (FilterKey::Page, "2".to_string()),
            ]
        );
    }

    #[test]
    fn empty_criteria_produce_no_entries() {
        assert!(FilterCriteria::default().entries().is_empty());
    }

    #[test]
    fn enum_filters_use_canonical_values() {
        let criteria = FilterCriteria {
            fuel_type: Some(FuelType::Electric),
            category: Some(Category::Suv),
            price_max: Some(85000.5),
            ..FilterCriteria::default()
        };

        let entries = criteria.entries();
        assert!(entries.contains(&(FilterKey::FuelType, "electric".to_string())));
        assert!(entries.contains(&(FilterKey::Category, "suv".to_string())));
        assert!(entries.contains(&(FilterKey::PriceMax, "85000.5".to_string())));
    }

    #[test]
    fn sales_query_omits_blank_dates() {
        let query = SalesQuery {
            limit: Some(50),
            start_date: Some("2025-01-01".to_string()),
            end_date: Some(" ".to_string()),
            ..SalesQuery::default()
        };

        assert_eq!(
            query.query_pairs(),
            vec![
                ("limit".to_string(), "50".to_string()),
                ("startDate".to_string(), "2025-01-01".to_string()),
            ]
        );
    }
}
