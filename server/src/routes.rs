use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bays::{
    CanonicalBay, Stats,
    query::{self, Filters, Radius},
};

use crate::{error::AppError, state::State as AppState};

const DEFAULT_LIMIT: usize = 100;
const DEFAULT_SEARCH_LIMIT: usize = 50;

#[derive(Deserialize)]
pub struct ListParams {
    limit: Option<usize>,
    offset: Option<usize>,
    bay_type: Option<String>,
    zone_number: Option<String>,
    restriction_type: Option<String>,
    accessible_only: Option<bool>,
    lat: Option<f64>,
    lng: Option<f64>,
    radius: Option<f64>,
}

#[derive(Serialize)]
pub struct Pagination {
    total: usize,
    limit: usize,
    offset: usize,
    #[serde(rename = "hasMore")]
    has_more: bool,
}

#[derive(Serialize)]
pub struct ListMeta {
    cached: bool,
    #[serde(rename = "lastUpdated")]
    last_updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<&'static str>,
}

#[derive(Serialize)]
pub struct ListResponse {
    success: bool,
    data: Vec<CanonicalBay>,
    pagination: Pagination,
    meta: ListMeta,
}

pub async fn bays_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let near = match (params.lat, params.lng, params.radius) {
        (Some(lat), Some(lng), Some(meters)) => Some(Radius { lat, lng, meters }),
        _ => None,
    };
    let filters = Filters {
        bay_type: params.bay_type,
        zone_number: params.zone_number,
        restriction_type: params.restriction_type,
        accessible_only: params.accessible_only.unwrap_or(false),
        near,
    };

    let (bays, provenance) = state.cache.get(&state.gateway).await?;
    let page = query::paginate(query::filter(&bays, &filters), limit, offset);

    Ok(Json(ListResponse {
        success: true,
        data: page.items,
        pagination: Pagination {
            total: page.total,
            limit,
            offset,
            has_more: page.has_more,
        },
        meta: ListMeta {
            cached: provenance.cached,
            last_updated: provenance.last_updated,
            warning: provenance.warning,
        },
    }))
}

#[derive(Serialize)]
pub struct StatsResponse {
    success: bool,
    data: Stats,
}

pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let snapshot = state.cache.snapshot();
    let (bays, captured_at) = match &snapshot {
        Some(entry) => (entry.bays.as_slice(), Some(entry.captured_at)),
        None => (&[][..], None),
    };

    Json(StatsResponse {
        success: true,
        data: query::stats(bays, captured_at),
    })
}

#[derive(Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    limit: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchMeta {
    query: String,
    count: usize,
    limit: usize,
}

#[derive(Serialize)]
pub struct SearchResponse {
    success: bool,
    data: Vec<CanonicalBay>,
    meta: SearchMeta,
}

pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let query_text = params
        .q
        .filter(|q| !q.is_empty())
        .ok_or(AppError::MissingQuery)?;
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);

    let bays = state.cache.snapshot().map(|entry| entry.bays).unwrap_or_default();
    let results = query::search(&bays, &query_text, limit);

    Ok(Json(SearchResponse {
        success: true,
        meta: SearchMeta {
            query: query_text,
            count: results.len(),
            limit,
        },
        data: results,
    }))
}

#[derive(Serialize)]
pub struct ZoneMeta {
    #[serde(rename = "zoneNumber")]
    zone_number: String,
    count: usize,
}

#[derive(Serialize)]
pub struct ZoneResponse {
    success: bool,
    data: Vec<CanonicalBay>,
    meta: ZoneMeta,
}

pub async fn zone_handler(
    State(state): State<Arc<AppState>>,
    Path(zone_number): Path<String>,
) -> Json<ZoneResponse> {
    let bays = state.cache.snapshot().map(|entry| entry.bays).unwrap_or_default();
    let data = query::by_zone(&bays, &zone_number);

    // An empty zone is a valid listing, not a 404.
    Json(ZoneResponse {
        success: true,
        meta: ZoneMeta {
            zone_number,
            count: data.len(),
        },
        data,
    })
}

#[derive(Serialize)]
pub struct BayResponse {
    success: bool,
    data: CanonicalBay,
}

pub async fn bay_by_id_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BayResponse>, AppError> {
    let bays = state.cache.snapshot().map(|entry| entry.bays).unwrap_or_default();
    let bay = query::by_id(&bays, &id)
        .cloned()
        .ok_or(AppError::NotFound("Parking bay"))?;

    Ok(Json(BayResponse {
        success: true,
        data: bay,
    }))
}

#[derive(Serialize)]
pub struct RefreshData {
    updated: usize,
    total: usize,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    success: bool,
    message: &'static str,
    data: RefreshData,
}

pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RefreshResponse>, AppError> {
    let updated = state.cache.force_refresh(&state.gateway).await?;

    Ok(Json(RefreshResponse {
        success: true,
        message: "Parking bays data refreshed successfully",
        data: RefreshData {
            updated,
            total: updated,
        },
    }))
}
