//! Приведение записей любой схемы сервера к каноническим именам полей.

use serde_json::{Map, Value};

use crate::models::{AuthUser, Listing};

type AliasTable = &'static [(&'static str, &'static [&'static str])];

/// Канонические поля объявления и их имена в известных схемах, по приоритету.
const LISTING_FIELDS: AliasTable = &[
    ("id", &["id", "_id"]),
    ("brand", &["brand", "marca"]),
    ("model", &["model", "vehicleModel", "modelo"]),
    ("year", &["year", "ano"]),
    ("price", &["price", "preco"]),
    ("mileage", &["mileage", "quilometragem"]),
    ("fuelType", &["fuelType", "combustivel"]),
    ("transmission", &["transmission", "cambio"]),
    ("color", &["color", "cor"]),
    ("doors", &["doors", "portas"]),
    ("category", &["category", "categoria"]),
    ("condition", &["condition"]),
    ("status", &["status"]),
    ("description", &["description", "descricao"]),
    ("images", &["images", "imagens"]),
    ("location", &["location"]),
    ("seller", &["seller", "vendedor"]),
    ("isFeatured", &["isFeatured"]),
    ("createdAt", &["createdAt", "dataCriacao"]),
    ("updatedAt", &["updatedAt", "dataAtualizacao"]),
];

const SELLER_FIELDS: AliasTable = &[
    ("id", &["id", "_id"]),
    ("name", &["name", "nome"]),
    ("email", &["email"]),
    ("phone", &["phone", "telefone"]),
];

const LOCATION_FIELDS: AliasTable = &[
    ("city", &["city", "cidade"]),
    ("state", &["state", "estado"]),
    ("zipCode", &["zipCode", "cep"]),
];

const USER_FIELDS: AliasTable = SELLER_FIELDS;

/// Разбирает запись объявления в любой из известных схем.
pub(crate) fn parse_listing(raw: &Value) -> Result<Listing, String> {
    let canonical = canonicalize(raw, LISTING_FIELDS)
        .ok_or_else(|| "listing is not a JSON object".to_string())?;
    serde_json::from_value(canonical).map_err(|err| format!("unusable listing: {err}"))
}

/// Разбирает пользователя из ответа на вход.
pub(crate) fn parse_user(raw: &Value) -> Option<AuthUser> {
    let canonical = canonicalize(raw, USER_FIELDS)?;
    serde_json::from_value(canonical).ok()
}

fn canonicalize(raw: &Value, table: AliasTable) -> Option<Value> {
    let source = raw.as_object()?;
    let mut out = Map::new();

    for (canonical, aliases) in table {
        let Some(value) = aliases
            .iter()
            .filter_map(|alias| source.get(*alias))
            .find(|value| !value.is_null())
        else {
            continue;
        };

        let value = match *canonical {
            "id" => stringify_id(value),
            "seller" => canonicalize(value, SELLER_FIELDS).unwrap_or(Value::Null),
            "location" => canonicalize(value, LOCATION_FIELDS).unwrap_or(Value::Null),
            _ => value.clone(),
        };
        if !value.is_null() {
            out.insert((*canonical).to_string(), value);
        }
    }

    Some(Value::Object(out))
}

fn stringify_id(value: &Value) -> Value {
    match value {
        Value::Number(id) => Value::String(id.to_string()),
        other => other.clone(),
    }
}
