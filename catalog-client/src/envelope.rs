//! Разбор конвертов ответа сервера.
//!
//! Сервер присылает список в одной из форм: голый массив, `{data: [...]}`,
//! `{data: {data: [...], pagination: {...}}}` или с именованным полем
//! (`listings`/`vehicles`/...). Одиночная сущность приходит как объект или
//! как `{data: {...}}`.

use serde_json::Value;

pub(crate) const DEFAULT_TOTAL: u64 = 0;
pub(crate) const DEFAULT_PAGE: u32 = 1;
pub(crate) const DEFAULT_LIMIT: u32 = 25;
pub(crate) const DEFAULT_TOTAL_PAGES: u32 = 0;

/// Поля пагинации после разбора конверта.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pagination {
    pub(crate) total: u64,
    pub(crate) page: u32,
    pub(crate) limit: u32,
    pub(crate) total_pages: u32,
}

/// Форма, в которой найден список. Нужна для диагностических логов.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListShape {
    BareArray,
    DoublyNested,
    SinglyNested,
    Named,
    Unrecognized,
}

/// Находит элементы списка по приоритету форм.
///
/// Незнакомая форма даёт пустой список, а не ошибку.
pub(crate) fn probe_items<'a>(body: &'a Value, named: &[&str]) -> (&'a [Value], ListShape) {
    if let Some(items) = body.as_array() {
        return (items, ListShape::BareArray);
    }

    let data = body.get("data");
    if let Some(items) = data.and_then(|d| d.get("data")).and_then(Value::as_array) {
        return (items, ListShape::DoublyNested);
    }
    if let Some(items) = data.and_then(Value::as_array) {
        return (items, ListShape::SinglyNested);
    }

    let scopes = [Some(body), data];
    for scope in scopes.into_iter().flatten() {
        for name in named {
            if let Some(items) = scope.get(*name).and_then(Value::as_array) {
                return (items, ListShape::Named);
            }
        }
    }

    (&[], ListShape::Unrecognized)
}

/// Собирает пагинацию; каждое поле ищется независимо:
/// `data.pagination`, затем `pagination`, затем объект `data`, затем корень.
pub(crate) fn probe_pagination(body: &Value) -> Pagination {
    let data = body.get("data");
    let scopes = [
        data.and_then(|d| d.get("pagination")),
        body.get("pagination"),
        data.filter(|d| d.is_object()),
        Some(body).filter(|b| b.is_object()),
    ];

    let find = |field: &str| -> Option<u64> {
        scopes
            .iter()
            .flatten()
            .filter_map(|scope| scope.get(field))
            .find_map(as_count)
    };

    Pagination {
        total: find("total").unwrap_or(DEFAULT_TOTAL),
        page: find("page").map(saturate_u32).unwrap_or(DEFAULT_PAGE),
        limit: find("limit").map(saturate_u32).unwrap_or(DEFAULT_LIMIT),
        total_pages: find("totalPages")
            .map(saturate_u32)
            .unwrap_or(DEFAULT_TOTAL_PAGES),
    }
}

/// Достаёт одиночную сущность: объект `data`, иначе корневой объект.
pub(crate) fn unwrap_single(body: &Value) -> Option<&Value> {
    match body.get("data") {
        Some(data) if data.is_object() => Some(data),
        _ => body.as_object().map(|_| body),
    }
}

fn as_count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as u64)
    })
}

fn saturate_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const NAMED: &[&str] = &["listings", "vehicles", "veiculos"];

    #[test]
    fn probes_all_documented_shapes() {
        let item = json!({"id": "1"});

        let bare = json!([item.clone()]);
        let single = json!({"data": [item.clone()]});
        let double = json!({"data": {"data": [item.clone()], "pagination": {"total": 1}}});
        let named = json!({"vehicles": [item.clone()], "total": 1});

        assert_eq!(probe_items(&bare, NAMED).1, ListShape::BareArray);
        assert_eq!(probe_items(&single, NAMED).1, ListShape::SinglyNested);
        assert_eq!(probe_items(&double, NAMED).1, ListShape::DoublyNested);
        assert_eq!(probe_items(&named, NAMED).1, ListShape::Named);

        for body in [&bare, &single, &double, &named] {
            assert_eq!(probe_items(body, NAMED).0, &[item.clone()][..]);
        }
    }

    #[test]
    fn named_field_inside_data_is_found() {
        let body = json!({"success": true, "data": {"veiculos": [{"id": "a"}]}});
        let (items, shape) = probe_items(&body, NAMED);
        assert_eq!(items.len(), 1);
        assert_eq!(shape, ListShape::Named);
    }

    #[test]
    fn unrecognized_shapes_yield_empty_list() {
        for body in [json!(null), json!("ok"), json!({"data": {"items": 3}}), json!({})] {
            let (items, shape) = probe_items(&body, NAMED);
            assert!(items.is_empty());
            assert_eq!(shape, ListShape::Unrecognized);
        }
    }

    #[test]
    fn pagination_defaults_when_absent() {
        let pagination = probe_pagination(&json!([]));
        assert_eq!(
            pagination,
            Pagination {
                total: 0,
                page: 1,
                limit: 25,
                total_pages: 0
            }
        );
    }

    #[test]
    fn pagination_fields_are_resolved_independently() {
        let body = json!({
            "data": {"data": [], "pagination": {"total": 40}},
            "pagination": {"page": 2, "total": 999},
            "limit": 20
        });

        let pagination = probe_pagination(&body);
        assert_eq!(pagination.total, 40);
        assert_eq!(pagination.page, 2);
        assert_eq!(pagination.limit, 20);
        assert_eq!(pagination.total_pages, 0);
    }

    #[test]
    fn pagination_inside_data_object_is_found() {
        let body = json!({
            "success": true,
            "data": {"sales": [], "total": 120, "page": 3, "limit": 50, "totalPages": 3}
        });

        let pagination = probe_pagination(&body);
        assert_eq!(
            pagination,
            Pagination {
                total: 120,
                page: 3,
                limit: 50,
                total_pages: 3
            }
        );
    }

    #[test]
    fn data_object_counts_lose_to_explicit_pagination_block() {
        let body = json!({
            "data": {"total": 5, "page": 9},
            "pagination": {"total": 40}
        });

        let pagination = probe_pagination(&body);
        assert_eq!(pagination.total, 40);
        assert_eq!(pagination.page, 9);
    }

    #[test]
    fn pagination_accepts_float_counts() {
        let pagination = probe_pagination(&json!({"total": 12.0, "totalPages": 2.0}));
        assert_eq!(pagination.total, 12);
        assert_eq!(pagination.total_pages, 2);
    }

    #[test]
    fn unwrap_single_prefers_data_object() {
        let nested = json!({"success": true, "data": {"id": "1"}});
        assert_eq!(unwrap_single(&nested), Some(&json!({"id": "1"})));

        let flat = json!({"id": "2"});
        assert_eq!(unwrap_single(&flat), Some(&flat));

        assert_eq!(unwrap_single(&json!([{"id": "3"}])), None);
        assert_eq!(unwrap_single(&json!(null)), None);
    }
}
