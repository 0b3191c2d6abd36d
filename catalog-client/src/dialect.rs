use std::str::FromStr;

use serde_json::{Map, Value};

use crate::filters::{FilterCriteria, FilterKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Соглашение об именах конкретного развёртывания сервиса каталога.
///
/// Определяет путь коллекции, имена query-параметров фильтра и имена полей
/// в теле запросов. Ответы любого диалекта шлюз принимает независимо от
/// выбранного.
pub enum Dialect {
    /// Канонические имена без переименований.
    Canonical,
    /// BFF с английскими эндпоинтами (`/api/vehicles`).
    #[default]
    Bff,
    /// Старое API с португальскими именами (`/api/veiculos`).
    Legacy,
}

struct DialectTable {
    collection: &'static str,
    filters: &'static [(FilterKey, &'static str)],
    fields: &'static [(&'static str, &'static str)],
    seller_fields: &'static [(&'static str, &'static str)],
    values: &'static [(&'static str, &'static str)],
}

const ENUM_FIELDS: &[&str] = &["fuelType", "transmission", "category", "condition", "status"];

const IDENTITY_FILTERS: &[(FilterKey, &str)] = &[
    (FilterKey::Brand, "brand"),
    (FilterKey::Model, "model"),
    (FilterKey::YearMin, "yearMin"),
    (FilterKey::YearMax, "yearMax"),
    (FilterKey::PriceMin, "priceMin"),
    (FilterKey::PriceMax, "priceMax"),
    (FilterKey::FuelType, "fuelType"),
    (FilterKey::Transmission, "transmission"),
    (FilterKey::Category, "category"),
    (FilterKey::Condition, "condition"),
    (FilterKey::Search, "search"),
    (FilterKey::Page, "page"),
    (FilterKey::Limit, "limit"),
];

const CANONICAL: DialectTable = DialectTable {
    collection: "/api/listings",
    filters: IDENTITY_FILTERS,
    fields: &[],
    seller_fields: &[],
    values: &[],
};

const BFF: DialectTable = DialectTable {
    collection: "/api/vehicles",
    filters: &[
        (FilterKey::Brand, "brand"),
        (FilterKey::Model, "model"),
        (FilterKey::YearMin, "minYear"),
        (FilterKey::YearMax, "maxYear"),
        (FilterKey::PriceMin, "minPrice"),
        (FilterKey::PriceMax, "maxPrice"),
        (FilterKey::FuelType, "fuelType"),
        (FilterKey::Transmission, "transmission"),
        (FilterKey::Category, "category"),
        (FilterKey::Condition, "condition"),
        (FilterKey::Search, "search"),
        (FilterKey::Page, "page"),
        (FilterKey::Limit, "limit"),
    ],
    fields: &[("model", "vehicleModel")],
    seller_fields: &[],
    values: &[],
};

const LEGACY: DialectTable = DialectTable {
    collection: "/api/veiculos",
    filters: &[
        (FilterKey::Brand, "marca"),
        (FilterKey::Model, "modelo"),
        (FilterKey::YearMin, "anoMin"),
        (FilterKey::YearMax, "anoMax"),
        (FilterKey::PriceMin, "precoMin"),
        (FilterKey::PriceMax, "precoMax"),
        (FilterKey::FuelType, "combustivel"),
        (FilterKey::Transmission, "cambio"),
        (FilterKey::Category, "categoria"),
        (FilterKey::Condition, "status"),
        (FilterKey::Search, "search"),
        (FilterKey::Page, "page"),
        (FilterKey::Limit, "limit"),
    ],
    fields: &[
        ("brand", "marca"),
        ("model", "modelo"),
        ("year", "ano"),
        ("price", "preco"),
        ("mileage", "quilometragem"),
        ("fuelType", "combustivel"),
        ("transmission", "cambio"),
        ("color", "cor"),
        ("doors", "portas"),
        ("category", "categoria"),
        ("description", "descricao"),
        ("images", "imagens"),
        ("seller", "vendedor"),
    ],
    seller_fields: &[("name", "nome"), ("phone", "telefone")],
    values: &[
        ("gasoline", "gasolina"),
        ("ethanol", "etanol"),
        ("electric", "eletrico"),
        ("hybrid", "hibrido"),
        ("automatic", "automatico"),
        ("truck", "caminhao"),
        ("motorcycle", "moto"),
        ("active", "ativo"),
        ("inactive", "inativo"),
        ("sold", "vendido"),
        ("reserved", "reservado"),
    ],
};

impl Dialect {
    fn table(self) -> &'static DialectTable {
        match self {
            Dialect::Canonical => &CANONICAL,
            Dialect::Bff => &BFF,
            Dialect::Legacy => &LEGACY,
        }
    }

    /// Путь коллекции объявлений.
    pub fn collection_path(self) -> &'static str {
        self.table().collection
    }

    /// Путь отдельного объявления.
    pub fn item_path(self, id: &str) -> String {
        format!("{}/{}", self.table().collection, id)
    }

    /// Имя query-параметра сервера для ключа фильтра.
    pub fn query_param(self, key: FilterKey) -> &'static str {
        self.table()
            .filters
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, name)| *name)
            .unwrap_or_else(|| key.as_str())
    }

    /// Переводит критерии в query-параметры сервера.
    pub fn query_pairs(self, criteria: &FilterCriteria) -> Vec<(String, String)> {
        criteria
            .entries()
            .into_iter()
            .map(|(key, value)| {
                let value = if key.is_enum_valued() {
                    self.translate_value(&value)
                } else {
                    value
                };
                (self.query_param(key).to_string(), value)
            })
            .collect()
    }

    /// Переименовывает поля канонического тела запроса под схему сервера.
    pub fn outgoing_payload(self, payload: Value) -> Value {
        let table = self.table();
        let fields = match payload {
            Value::Object(fields) => fields,
            other => return other,
        };

        let mut out = Map::with_capacity(fields.len());
        for (name, value) in fields {
            let value = match (name.as_str(), value) {
                ("seller", Value::Object(seller)) => {
                    Value::Object(rename_keys(seller, table.seller_fields))
                }
                (field, Value::String(raw)) if ENUM_FIELDS.contains(&field) => {
                    Value::String(self.translate_value(&raw))
                }
                (_, value) => value,
            };
            out.insert(rename(&name, table.fields).to_string(), value);
        }
        Value::Object(out)
    }

    fn translate_value(self, value: &str) -> String {
        rename(value, self.table().values).to_string()
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "canonical" => Ok(Dialect::Canonical),
            "bff" => Ok(Dialect::Bff),
            "legacy" => Ok(Dialect::Legacy),
            other => Err(format!(
                "unknown dialect '{other}', expected canonical|bff|legacy"
            )),
        }
    }
}

fn rename<'a>(name: &'a str, table: &'static [(&'static str, &'static str)]) -> &'a str {
    table
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| *to)
        .unwrap_or(name)
}

fn rename_keys(
    fields: Map<String, Value>,
    table: &'static [(&'static str, &'static str)],
) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(name, value)| (rename(&name, table).to_string(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;
    use crate::models::{Category, FuelType};

    #[test]
    fn filter_tables_are_complete_and_bijective() {
        for dialect in [Dialect::Canonical, Dialect::Bff, Dialect::Legacy] {
            let table = dialect.table();
            let keys: HashSet<_> = table.filters.iter().map(|(k, _)| *k).collect();
            let names: HashSet<_> = table.filters.iter().map(|(_, n)| *n).collect();

            assert_eq!(keys.len(), FilterKey::ALL.len(), "{dialect:?} keys");
            assert_eq!(names.len(), FilterKey::ALL.len(), "{dialect:?} names");
        }
    }

    #[test]
    fn bff_renames_range_filters() {
        let criteria = FilterCriteria {
            model: Some("Civic".to_string()),
            year_min: Some(2018),
            price_max: Some(90000.0),
            ..FilterCriteria::default()
        };

        let pairs = Dialect::Bff.query_pairs(&criteria);
        assert_eq!(
            pairs,
            vec![
                ("model".to_string(), "Civic".to_string()),
                ("minYear".to_string(), "2018".to_string()),
                ("maxPrice".to_string(), "90000".to_string()),
            ]
        );
    }

    #[test]
    fn legacy_translates_keys_and_enum_values() {
        let criteria = FilterCriteria {
            brand: Some("Fiat".to_string()),
            fuel_type: Some(FuelType::Gasoline),
            category: Some(Category::Motorcycle),
            condition: Some("sold".to_string()),
            ..FilterCriteria::default()
        };

        let pairs = Dialect::Legacy.query_pairs(&criteria);
        assert_eq!(
            pairs,
            vec![
                ("marca".to_string(), "Fiat".to_string()),
                ("combustivel".to_string(), "gasolina".to_string()),
                ("categoria".to_string(), "moto".to_string()),
                ("status".to_string(), "vendido".to_string()),
            ]
        );
    }

    #[test]
    fn canonical_payload_is_untouched() {
        let payload = json!({"model": "Corolla", "fuelType": "flex"});
        assert_eq!(Dialect::Canonical.outgoing_payload(payload.clone()), payload);
    }

    #[test]
    fn bff_payload_uses_vehicle_model() {
        let payload = json!({"brand": "Honda", "model": "Civic", "price": 99.0});
        assert_eq!(
            Dialect::Bff.outgoing_payload(payload),
            json!({"brand": "Honda", "vehicleModel": "Civic", "price": 99.0})
        );
    }

    #[test]
    fn legacy_payload_uses_portuguese_names() {
        let payload = json!({
            "brand": "VW",
            "transmission": "automatic",
            "status": "reserved",
            "seller": {"id": "s1", "name": "Ana", "email": "ana@example.com"}
        });

        assert_eq!(
            Dialect::Legacy.outgoing_payload(payload),
            json!({
                "marca": "VW",
                "cambio": "automatico",
                "status": "reservado",
                "vendedor": {"id": "s1", "nome": "Ana", "email": "ana@example.com"}
            })
        );
    }

    #[test]
    fn dialect_parses_from_config_strings() {
        assert_eq!("BFF".parse::<Dialect>(), Ok(Dialect::Bff));
        assert_eq!(" legacy ".parse::<Dialect>(), Ok(Dialect::Legacy));
        assert!("graphql".parse::<Dialect>().is_err());
    }
}
