// HTTP API routes (PVP reference data, collection queries, metrics)

use axum::{
    extract::{Json, Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::collection::{self, SortDirection, SortKey};
use crate::error::IngestError;
use crate::gamedata::SpeciesCatalog;
use crate::ingest;
use crate::metrics;
use crate::pvp::teams::{TeamSummary, DEFAULT_MAX_TEAMS};
use crate::pvp::{
    Bracket, LevelMultiplierTable, MatchAnnotator, MatchOptions, RankingIndex, SpreadCache,
    TeamSynthesizer, DEFAULT_CATEGORY,
};
use crate::record::CreatureRecord;
use crate::search;

// ── Request types ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SpreadParams {
    pub form: Option<String>,
    pub league: Option<String>,
}

/// Body of `POST /api/collection/query`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CollectionQuery {
    /// Raw export in any accepted shape.
    pub records: Value,
    pub search: String,
    pub order_by: String,
    pub order_dir: String,
    pub unique: bool,
    pub dynamax: bool,
    pub gigantamax: bool,
    pub pvp: bool,
    pub best_teams: bool,
    pub league: Option<String>,
    pub category: Option<String>,
}

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub levels: Arc<LevelMultiplierTable>,
    pub rankings: Arc<RankingIndex>,
    pub catalog: Arc<SpeciesCatalog>,
    pub annotator: MatchAnnotator,
    pub teams: TeamSynthesizer,
}

impl AppState {
    pub fn new(
        levels: Arc<LevelMultiplierTable>,
        rankings: Arc<RankingIndex>,
        catalog: Arc<SpeciesCatalog>,
    ) -> Self {
        let annotator = MatchAnnotator::new(
            Arc::clone(&levels),
            Arc::clone(&rankings),
            SpreadCache::new(),
        );
        let teams = TeamSynthesizer::new(Arc::clone(&rankings));
        Self {
            levels,
            rankings,
            catalog,
            annotator,
            teams,
        }
    }
}

// ── Error helper ──────────────────────────────────────────────────────

fn json_error(status: StatusCode, msg: &str) -> impl IntoResponse {
    (status, Json(json!({ "error": msg })))
}

fn parse_league(raw: Option<&str>) -> Bracket {
    raw.and_then(|l| l.parse().ok()).unwrap_or(Bracket::Great)
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        // PVP reference data
        .route("/api/pvp/categories", get(list_categories))
        .route("/api/pvp/spreads/{number}", get(get_spreads))
        // Collection
        .route("/api/collection/query", post(query_collection))
        // Observability and docs
        .route("/metrics", get(get_metrics))
        .route("/llms.txt", get(get_llms_txt))
        .layer(middleware::from_fn(track_requests))
        .with_state(state)
}

async fn track_requests(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let endpoint = metrics::normalize_path(req.uri().path());
    let timer = metrics::API_REQUEST_DURATION_SECONDS
        .with_label_values(&[&endpoint])
        .start_timer();
    let response = next.run(req).await;
    timer.observe_duration();
    metrics::API_REQUESTS_TOTAL
        .with_label_values(&[&method, &endpoint, response.status().as_str()])
        .inc();
    response
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "pvpdex-backend",
        "pvp_available": !state.levels.is_empty(),
        "species": state.catalog.len(),
        "ranking_entries": state.rankings.entry_count(),
    }))
}

// ── PVP handlers ──────────────────────────────────────────────────────

async fn list_categories(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "categories": state.rankings.categories() }))
}

async fn get_spreads(
    State(state): State<AppState>,
    Path(number): Path<u32>,
    Query(params): Query<SpreadParams>,
) -> impl IntoResponse {
    let form = params.form.as_deref().filter(|f| !f.is_empty());
    let Some(species) = state.catalog.lookup(number, form) else {
        return json_error(StatusCode::NOT_FOUND, "Species not found").into_response();
    };
    let league = parse_league(params.league.as_deref());
    let spreads = state
        .annotator
        .spreads_for(number, form, species.base, league);

    (
        StatusCode::OK,
        Json(json!({
            "number": number,
            "species": species.species,
            "form": form,
            "league": league,
            "cp_cap": league.cp_cap(),
            "spreads": spreads.as_slice(),
        })),
    )
        .into_response()
}

// ── Collection handlers ───────────────────────────────────────────────

#[derive(Serialize)]
struct TeamView<'a> {
    score: i64,
    species_ids: &'a [String; 3],
    members: Vec<&'a CreatureRecord>,
    summary: &'a TeamSummary,
}

/// Runs the collection pipeline: normalize, search, collapse duplicates,
/// Max-form filter, then either PVP annotation (and optionally team
/// synthesis) or a plain sort.
pub fn run_collection_query(state: &AppState, req: CollectionQuery) -> Result<Value, IngestError> {
    let mut records = ingest::normalize_export(&req.records, &state.catalog)?;

    if !req.search.trim().is_empty() {
        records = search::filter(&records, &req.search)
            .into_iter()
            .cloned()
            .collect();
    }
    if req.unique {
        records = collection::unique_variants(records);
    }
    records = collection::filter_max_forms(records, req.dynamax, req.gigantamax);

    let league = parse_league(req.league.as_deref());
    let category = state
        .rankings
        .resolve_category(req.category.as_deref().unwrap_or(DEFAULT_CATEGORY));

    if req.pvp || req.best_teams {
        let options = MatchOptions::default();
        records.retain_mut(|r| {
            state
                .annotator
                .match_and_annotate(r, league, &category, options)
        });
        collection::sort_pvp(&mut records);
    } else {
        let key = req.order_by.parse().unwrap_or(SortKey::Number);
        collection::sort_records(&mut records, key, SortDirection::parse(&req.order_dir));
    }

    if req.best_teams {
        let teams = state
            .teams
            .synthesize(&records, league, &category, DEFAULT_MAX_TEAMS);
        let views: Vec<TeamView> = teams
            .iter()
            .map(|team| TeamView {
                score: team.score,
                species_ids: &team.species_ids,
                members: team
                    .member_ids
                    .iter()
                    .filter_map(|id| records.iter().find(|r| &r.id == id))
                    .collect(),
                summary: &team.summary,
            })
            .collect();
        return Ok(json!({
            "metadata": { "total": records.len() },
            "pokemon": [],
            "teams": views,
            "best_teams": {
                "league": league,
                "category": category,
                "pool_size": records.len(),
            },
        }));
    }

    Ok(json!({
        "metadata": { "total": records.len() },
        "pokemon": records,
    }))
}

async fn query_collection(
    State(state): State<AppState>,
    Json(req): Json<CollectionQuery>,
) -> impl IntoResponse {
    let result = tokio::task::spawn_blocking(move || run_collection_query(&state, req)).await;

    match result {
        Ok(Ok(body)) => (StatusCode::OK, Json(body)).into_response(),
        Ok(Err(e)) => json_error(StatusCode::BAD_REQUEST, &e.to_string()).into_response(),
        Err(e) => {
            tracing::error!("collection query task failed: {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

// ── Observability / docs ─────────────────────────────────────────────

async fn get_metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
        .into_response()
}

async fn get_llms_txt() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        crate::llms_txt::LLMS_TXT,
    )
        .into_response()
}
