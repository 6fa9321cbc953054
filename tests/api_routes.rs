// Router tests driven through tower's oneshot against the fixture data.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use pvpdex_backend::api::{router, AppState};
use pvpdex_backend::gamedata::GameMaster;
use pvpdex_backend::metrics;
use pvpdex_backend::pvp::spreads::top_spreads;
use pvpdex_backend::pvp::{Bracket, RankingIndex};

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn app() -> Router {
    let gm = GameMaster::load(&fixtures().join("master.json"));
    let rankings = RankingIndex::load(&fixtures());
    router(AppState::new(
        Arc::new(gm.levels),
        Arc::new(rankings),
        Arc::new(gm.catalog),
    ))
}

async fn send(request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn get_json(uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = send(request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(uri: &str, payload: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, body) = send(request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get_json("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["pvp_available"], true);
    assert_eq!(body["species"], 10);
}

#[tokio::test]
async fn test_categories() {
    let (status, body) = get_json("/api/pvp/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "categories": ["overall", "premier"] }));
}

#[tokio::test]
async fn test_spreads_for_species() {
    let (status, body) = get_json("/api/pvp/spreads/308?league=gl").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["league"], "GL");
    assert_eq!(body["cp_cap"], 1500);
    let spreads = body["spreads"].as_array().unwrap();
    assert_eq!(spreads.len(), 10);
    for spread in spreads {
        assert!(spread["cp"].as_u64().unwrap() <= 1500);
    }
    let products: Vec<f64> = spreads
        .iter()
        .map(|s| s["product"].as_f64().unwrap())
        .collect();
    assert!(products.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_spreads_unknown_league_and_species() {
    let (status, body) = get_json("/api/pvp/spreads/19?form=RATTATA_ALOLA&league=nope").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["league"], "GL");
    assert_eq!(body["species"], "RATTATA");

    let (status, body) = get_json("/api/pvp/spreads/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_collection_query_sorted() {
    let payload = json!({
        "records": { "fileData": {
            "a": { "mon_number": 379, "mon_name": "REGISTEEL", "mon_cp": 1490 },
            "b": { "mon_number": 1, "mon_name": "BULBASAUR", "mon_cp": 600 },
            "c": { "mon_number": 151, "mon_name": "MEW", "mon_cp": 2100 }
        }},
        "order_by": "cp",
        "order_dir": "desc"
    });
    let (status, body) = post_json("/api/collection/query", payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["total"], 3);
    let ids: Vec<&str> = body["pokemon"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
    assert_eq!(body["pokemon"][0]["mythical"], true);
}

#[tokio::test]
async fn test_collection_query_best_teams() {
    let gm = GameMaster::load(&fixtures().join("master.json"));
    let records: Vec<Value> = [308u32, 184, 379, 227]
        .iter()
        .map(|number| {
            let info = gm.catalog.lookup(*number, None).unwrap();
            let best = top_spreads(&gm.levels, info.base, Bracket::Great.cp_cap())[0].clone();
            json!({
                "id": format!("mon-{number}"),
                "number": number,
                "name": info.species,
                "cp": best.cp,
                "attack": best.atk_iv,
                "defence": best.def_iv,
                "stamina": best.stm_iv,
            })
        })
        .collect();

    let payload = json!({ "records": records, "best_teams": true, "category": "Unknown" });
    let (status, body) = post_json("/api/collection/query", payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["best_teams"]["league"], "GL");
    assert_eq!(body["best_teams"]["category"], "overall");
    assert_eq!(body["best_teams"]["pool_size"], 4);

    let teams = body["teams"].as_array().unwrap();
    assert!(!teams.is_empty() && teams.len() <= 3);
    let mut seen = HashSet::new();
    for team in teams {
        let members = team["members"].as_array().unwrap();
        assert_eq!(members.len(), 3);
        let mut ids: Vec<String> = members
            .iter()
            .map(|m| m["id"].as_str().unwrap().to_string())
            .collect();
        ids.sort();
        assert!(seen.insert(ids));
        assert!(members.iter().all(|m| m["pvp"]["enabled"] == true));
    }
}

#[tokio::test]
async fn test_collection_query_pvp_skips_out_of_range_ivs() {
    let payload = json!({
        "records": [{
            "id": "bogus",
            "number": 308,
            "name": "Medicham",
            "form": "MEDICHAM_NORMAL",
            "iv_tier": "4*",
            "cp": 1400,
            "attack": 128,
            "defence": 15,
            "stamina": 15,
            "base_attack": 121,
            "base_defence": 152,
            "base_stamina": 155
        }],
        "pvp": true
    });
    let (status, body) = post_json("/api/collection/query", payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["total"], 0);
    assert!(body["pokemon"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_collection_query_rejects_bad_shape() {
    let (status, body) = post_json("/api/collection/query", json!({ "records": "nope" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("unsupported"));
}

#[tokio::test]
async fn test_metrics_and_llms_txt() {
    metrics::register_metrics();
    let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
    let (status, _) = send(request).await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("pvpdex_api_requests_total"));

    let request = Request::builder().uri("/llms.txt").body(Body::empty()).unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("/api/collection/query"));
}
