use catalog_client::format::{
    category_label, condition_label, format_currency, format_date, format_date_time,
    format_number, format_relative_time, fuel_label, status_label, transmission_label,
};
use catalog_client::{
    AuthSession, DashboardMetrics, HealthCheck, Listing, ListingPage, SalesPage,
};
use chrono::{DateTime, Utc};

const MISSING: &str = "-";

fn label<T: AsRef<str>>(value: Option<T>, to_label: fn(&str) -> String) -> String {
    value
        .map(|v| to_label(v.as_ref()))
        .unwrap_or_else(|| MISSING.to_string())
}

fn timestamp(value: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match value {
        Some(ts) => {
            let raw = ts.to_rfc3339();
            format!(
                "{} ({})",
                format_date_time(&raw),
                format_relative_time(&raw, now)
            )
        }
        None => MISSING.to_string(),
    }
}

pub fn listing_line(listing: &Listing) -> String {
    format!(
        "- [{}] {} {} {} | {} | {} km | {}",
        listing.id,
        listing.brand,
        listing.model,
        listing.year,
        format_currency(listing.price),
        format_number(listing.mileage as f64),
        label(listing.status.as_ref().map(|s| s.as_str()), status_label),
    )
}

pub fn print_page(page: &ListingPage) {
    println!(
        "Объявлений: {} (страница {}/{}, по {} на странице, всего {})",
        page.listings.len(),
        page.page,
        page.total_pages.max(1),
        page.limit,
        page.total
    );
    for listing in &page.listings {
        println!("{}", listing_line(listing));
    }
}

pub fn print_listing(title: &str, listing: &Listing, now: DateTime<Utc>) {
    println!("{title}");
    println!("id: {}", listing.id);
    println!("марка: {}", listing.brand);
    println!("модель: {}", listing.model);
    println!("год: {}", listing.year);
    println!("цена: {}", format_currency(listing.price));
    println!("пробег: {} km", format_number(listing.mileage as f64));
    println!(
        "топливо: {}",
        label(listing.fuel_type.as_ref().map(|v| v.as_str()), fuel_label)
    );
    println!(
        "коробка: {}",
        label(
            listing.transmission.as_ref().map(|v| v.as_str()),
            transmission_label
        )
    );
    println!(
        "категория: {}",
        label(listing.category.as_ref().map(|v| v.as_str()), category_label)
    );
    println!(
        "состояние: {}",
        label(
            listing.condition.as_ref().map(|v| v.as_str()),
            condition_label
        )
    );
    println!(
        "статус: {}",
        label(listing.status.as_ref().map(|v| v.as_str()), status_label)
    );
    println!("цвет: {}", or_missing(&listing.color));
    println!("дверей: {}", listing.doors);
    if let Some(description) = &listing.description {
        println!("описание: {description}");
    }
    if let Some(location) = &listing.location {
        println!(
            "город: {} - {} ({})",
            location.city, location.state, location.zip_code
        );
    }
    if let Some(seller) = &listing.seller {
        println!("продавец: {} <{}>", seller.name, seller.email);
    }
    for image in &listing.images {
        println!("фото: {image}");
    }
    if listing.is_featured {
        println!("в подборке: да");
    }
    println!("создано: {}", timestamp(listing.created_at, now));
    println!("обновлено: {}", timestamp(listing.updated_at, now));
}

pub fn print_session(session: &AuthSession) {
    println!("Вход выполнен");
    match &session.user {
        Some(user) => {
            println!("user:");
            println!("  id: {}", user.id);
            println!("  name: {}", user.name);
            println!("  email: {}", user.email);
        }
        None => println!("user: {MISSING}"),
    }
}

pub fn print_health(health: &HealthCheck) {
    println!("status: {}", health.status);
    println!("version: {}", or_missing(&health.version));
    if !health.timestamp.is_empty() {
        println!("timestamp: {}", format_date_time(&health.timestamp));
    }
    if let Some(services) = &health.services {
        println!("database: {}", services.database);
        println!("bff: {}", services.bff);
    }
}

pub fn print_metrics(metrics: &DashboardMetrics) {
    println!("Всего объявлений: {}", format_number(metrics.total_vehicles as f64));
    println!("Активных: {}", format_number(metrics.active_vehicles as f64));
    println!("Продано: {}", format_number(metrics.sold_vehicles as f64));
    println!(
        "Продаж за месяц: {} ({})",
        metrics.monthly_sales,
        format_currency(metrics.monthly_revenue)
    );
    println!("Выручка всего: {}", format_currency(metrics.total_revenue));

    if !metrics.vehicles_by_category.is_empty() {
        println!("По категориям:");
        for entry in &metrics.vehicles_by_category {
            println!("  {}: {}", category_label(&entry.category), entry.quantity);
        }
    }
    if !metrics.sales_by_month.is_empty() {
        println!("По месяцам:");
        for entry in &metrics.sales_by_month {
            println!(
                "  {}: {} ({})",
                entry.month,
                entry.sales,
                format_currency(entry.revenue)
            );
        }
    }
    if !metrics.top_brands.is_empty() {
        println!("Популярные марки:");
        for entry in &metrics.top_brands {
            println!(
                "  {}: {} в каталоге, {} продано",
                entry.brand, entry.quantity, entry.sales
            );
        }
    }
}

pub fn print_sales(page: &SalesPage) {
    println!(
        "Продаж: {} (страница {}/{}, всего {})",
        page.sales.len(),
        page.page,
        page.total_pages.max(1),
        page.total
    );
    for sale in &page.sales {
        println!(
            "- [{}] {} {} {} | {} | {} | покупатель: {}",
            sale.id,
            sale.vehicle.brand,
            sale.vehicle.model,
            sale.vehicle.year,
            format_currency(sale.price),
            format_date(&sale.sale_date),
            or_missing(&sale.buyer.name)
        );
    }
}

fn or_missing(value: &str) -> &str {
    if value.trim().is_empty() {
        MISSING
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_client::ListingStatus;

    fn listing() -> Listing {
        serde_json::from_value(serde_json::json!({
            "id": "7",
            "brand": "Fiat",
            "model": "Argo",
            "year": 2021,
            "price": 68900.5,
            "mileage": 32000
        }))
        .expect("valid listing")
    }

    #[test]
    fn listing_line_uses_brazilian_formatting() {
        let line = listing_line(&listing());
        assert_eq!(
            line,
            "- [7] Fiat Argo 2021 | R$\u{a0}68.900,50 | 32.000 km | -"
        );
    }

    #[test]
    fn listing_line_shows_status_label() {
        let mut listing = listing();
        listing.status = Some(ListingStatus::Sold);
        assert!(listing_line(&listing).ends_with("| Vendido"));
    }

    #[test]
    fn unknown_status_is_echoed() {
        let mut listing = listing();
        listing.status = Some(ListingStatus::Other("arquivado".to_string()));
        assert!(listing_line(&listing).ends_with("| arquivado"));
    }
}
