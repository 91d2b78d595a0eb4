//! Public catalog handlers: product pages, categories, rates, cart totals.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderValue, header::CACHE_CONTROL},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use vitrina_api_types::{
    CartTotalsRequest, CartTotalsResponse, CategoriesResponse, CategoryPayload, ProductPayload,
    ProductsPageResponse, RatesResponse, RefreshResponse,
};

use crate::domain::{
    cart::{Cart, CartLine},
    currency::{CurrencyCode, PIVOT_CURRENCY, format_optional},
    entities::{CategoryRecord, ProductRecord},
};

use super::{ApiError, RouterState};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductsQuery {
    page: Option<String>,
    limit: Option<String>,
}

/// `GET /catalog/products?page=<int>&limit=<int>`
///
/// Absent parameters use configured defaults; present-but-invalid ones are a
/// 400, never silently coerced to a page the caller did not ask for.
pub async fn list_products(
    State(state): State<RouterState>,
    Query(query): Query<ProductsQuery>,
) -> Result<Response, ApiError> {
    let page = parse_positive("page", query.page.as_deref(), 1)?;
    let limit = parse_positive(
        "limit",
        query.limit.as_deref(),
        state.policy.default_page_size,
    )?;
    if limit > state.policy.max_page_size {
        return Err(ApiError::bad_request(
            "invalid pagination parameter",
            Some(format!(
                "limit must not exceed {}",
                state.policy.max_page_size
            )),
        ));
    }

    let page_data = state
        .products
        .list(page, limit)
        .await
        .map_err(|err| ApiError::source_unavailable("infra::http::list_products", &err))?;

    let body = ProductsPageResponse {
        products: page_data.items.into_iter().map(product_payload).collect(),
        page: page_data.page,
        limit: page_data.limit,
        total: page_data.total,
        total_pages: page_data.total_pages,
    };

    Ok(with_cache_control(
        Json(body).into_response(),
        &state.policy.products_cache_control,
    ))
}

/// `POST /catalog/products` — internal refresh trigger.
pub async fn refresh_products(
    State(state): State<RouterState>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let count = state
        .products
        .refresh()
        .await
        .map_err(|err| ApiError::source_unavailable("infra::http::refresh_products", &err))?;

    Ok(Json(RefreshResponse {
        revalidated: true,
        count: count as u64,
    }))
}

/// `GET /catalog/categories`
pub async fn list_categories(State(state): State<RouterState>) -> Result<Response, ApiError> {
    let categories = state
        .categories
        .list()
        .await
        .map_err(|err| ApiError::source_unavailable("infra::http::list_categories", &err))?;

    let body = CategoriesResponse {
        categories: categories.iter().map(category_payload).collect(),
    };

    Ok(with_cache_control(
        Json(body).into_response(),
        &state.policy.categories_cache_control,
    ))
}

/// `GET /catalog/rates` — the current snapshot; degraded marks the fallback.
pub async fn list_rates(State(state): State<RouterState>) -> Json<RatesResponse> {
    let snapshot = state.rates.snapshot().await;

    let rates: BTreeMap<String, f64> = snapshot
        .table
        .iter()
        .map(|(code, rate)| (code.as_str().to_string(), rate))
        .collect();

    Json(RatesResponse {
        pivot: PIVOT_CURRENCY.to_string(),
        rates,
        degraded: snapshot.degraded,
    })
}

/// `POST /cart/totals`
///
/// Resolves each requested line against the cached catalog snapshot (prices,
/// currencies, and stock clamps come from there), then aggregates against
/// one rate snapshot held for the whole computation.
pub async fn cart_totals(
    State(state): State<RouterState>,
    Json(request): Json<CartTotalsRequest>,
) -> Result<Json<CartTotalsResponse>, ApiError> {
    if request.currencies.is_empty() {
        return Err(ApiError::bad_request(
            "invalid cart request",
            Some("at least one target currency is required".to_string()),
        ));
    }

    let mut cart = Cart::new();
    for line in &request.lines {
        let product = state
            .products
            .get(line.product_id)
            .await
            .map_err(|err| ApiError::source_unavailable("infra::http::cart_totals", &err))?
            .ok_or_else(|| {
                ApiError::bad_request(
                    "unknown product",
                    Some(format!("product `{}` does not exist", line.product_id)),
                )
            })?;

        let stock = u32::try_from(product.stock).unwrap_or(0);
        cart.set_quantity(CartLine::new(
            product.id,
            product.price,
            product.currency,
            stock,
            line.quantity,
        ));
    }

    let targets: Vec<CurrencyCode> = request
        .currencies
        .iter()
        .map(|code| CurrencyCode::new(code))
        .collect();

    let snapshot = state.rates.snapshot().await;
    let totals = cart.totals(&snapshot.table, &targets);

    let mut total_amounts = BTreeMap::new();
    let mut formatted = BTreeMap::new();
    for (code, amount) in totals.iter() {
        total_amounts.insert(code.as_str().to_string(), amount);
        formatted.insert(code.as_str().to_string(), format_optional(amount, code));
    }

    Ok(Json(CartTotalsResponse {
        totals: total_amounts,
        formatted,
    }))
}

fn parse_positive(
    name: &'static str,
    raw: Option<&str>,
    default: u32,
) -> Result<u32, ApiError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.parse::<u32>() {
        Ok(value) if value >= 1 => Ok(value),
        _ => Err(ApiError::bad_request(
            "invalid pagination parameter",
            Some(format!("{name} must be a positive integer, got `{raw}`")),
        )),
    }
}

fn with_cache_control(mut response: Response, value: &str) -> Response {
    if let Ok(header_value) = HeaderValue::from_str(value) {
        response.headers_mut().insert(CACHE_CONTROL, header_value);
    }
    response
}

fn product_payload(product: ProductRecord) -> ProductPayload {
    ProductPayload {
        id: product.id,
        name: product.name,
        price: product.price,
        currency: product.currency.as_str().to_string(),
        stock: product.stock,
        category_id: product.category_id,
        on_sale: product.on_sale,
        featured: product.featured,
        is_new: product.is_new,
        image_urls: product.image_urls,
        created_at: product.created_at,
    }
}

fn category_payload(category: &CategoryRecord) -> CategoryPayload {
    CategoryPayload {
        id: category.id,
        name: category.name.clone(),
        icon: category.icon.clone(),
        position: category.position,
    }
}
