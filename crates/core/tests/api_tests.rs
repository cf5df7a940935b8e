//! Library API integration tests
use std::sync::Arc;

use serde_json::{Value, json};
use vnshelf_core::*;

const USER_URL: &str = "https://api.vndb.org/kana/user?q=u2&fields=lengthvotes_sum";
const FINISHED_URL: &str = "https://vndb.org/u2/ulist?s=3q8w";
const PLAYING_URL: &str = "https://vndb.org/u2/ulist?l=1&s=3q7w";
const VN_URL: &str = "https://api.vndb.org/kana/vn";
const ULIST_URL: &str = "https://api.vndb.org/kana/ulist";

fn get_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("../../tests/fixtures/{}", name)).expect("fixture should exist")
}

fn catalog() -> Vec<Value> {
    vec![
        json!({
            "id": "v17", "title": "Ever17 -the out of infinity-", "alttitle": null,
            "image": { "url": "https://t.vndb.org/cv/17.jpg" },
            "tags": [{ "name": "Mystery", "rating": 2.8 }, { "name": "Sci-fi", "rating": 2.9 }, { "name": "Romance", "rating": 1.0 }, { "name": "Twist", "rating": 2.7 }]
        }),
        json!({
            "id": "v4", "title": "CLANNAD", "alttitle": "クラナド",
            "image": { "url": "https://t.vndb.org/cv/4.jpg" },
            "tags": [{ "name": "Drama", "rating": 3.0 }, { "name": "School", "rating": 2.0 }]
        }),
        json!({
            "id": "v2002", "title": "Yume Nikki", "alttitle": "夢日記",
            "image": { "url": "https://t.vndb.org/cv/2002.jpg" },
            "tags": []
        }),
        json!({
            "id": "v11", "title": "Fate/stay night", "alttitle": null,
            "image": null,
            "tags": [{ "name": "Action", "rating": 2.4 }]
        }),
    ]
}

/// Ids named by an `["or", ["id", "=", id], ...]` filter.
fn filter_ids(body: &Value) -> Vec<String> {
    body["filters"]
        .as_array()
        .map(|terms| terms.iter().skip(1).filter_map(|term| term[2].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

fn vn_results(body: &Value) -> Value {
    let ids = filter_ids(body);
    let results: Vec<Value> =
        catalog().into_iter().filter(|vn| ids.iter().any(|id| vn["id"] == id.as_str())).collect();
    json!({ "results": results, "more": false })
}

fn ulist_results(body: &Value) -> Value {
    let ids = filter_ids(body);
    let annotations = vec![
        json!({ "id": "v17", "vote": 95, "started": "2022-12-01", "finished": "2023-01-02", "notes": "Best twist" }),
        json!({ "id": "v4", "vote": 0, "started": null, "finished": "2021-01-01" }),
    ];
    let results: Vec<Value> =
        annotations.into_iter().filter(|vn| ids.iter().any(|id| vn["id"] == id.as_str())).collect();
    json!({ "results": results })
}

fn vndb() -> MemoryTransport {
    MemoryTransport::new()
        .with_json(USER_URL, json!({ "u2": { "id": "u2", "username": "Yorhel", "lengthvotes_sum": 125 } }))
        .with_page(FINISHED_URL, get_fixture("ulist_finished.html"))
        .with_page(PLAYING_URL, get_fixture("ulist_playing.html"))
        .with_post(VN_URL, vn_results)
        .with_post(ULIST_URL, ulist_results)
}

fn aggregator(transport: &Arc<MemoryTransport>) -> Aggregator {
    Aggregator::new(transport.clone(), Arc::new(LinkImages))
}

#[tokio::test]
async fn test_aggregate_end_to_end() {
    let transport = Arc::new(vndb());
    let config = AggregateConfig::builder()
        .user_id("u2")
        .finished_limit(1)
        .playing_limit(2)
        .favourites(["v4", "v17"])
        .tag_max(2)
        .sections(json!(["player", "favourites"]))
        .build();

    let outcome = aggregator(&transport).aggregate(&config).await;
    let result = outcome.into_result().expect("aggregation should succeed");

    assert_eq!(result.player.username, "Yorhel");
    assert_eq!(result.player.total_play_minutes, 125);
    assert_eq!(result.player.total_play_time, "2h 5m");
    assert_eq!(result.player.finished_count, 2);
    assert_eq!(result.player.playing_count, 3);

    assert_eq!(result.finished_vns.len(), 1);
    let ever17 = &result.finished_vns[0];
    assert_eq!(ever17.vn_id, "v17");
    assert_eq!(ever17.vote, "9");
    assert_eq!(ever17.image.as_deref(), Some("https://t.vndb.org/cv/17.jpg"));
    assert_eq!(ever17.tags, vec!["Sci-fi", "Mystery"]);

    let playing: Vec<&str> = result.playing_vns.iter().map(|e| e.vn_id.as_str()).collect();
    assert_eq!(playing, vec!["v2002", "v11"]);
    assert_eq!(result.playing_vns[0].title, "夢日記");
    assert!(result.playing_vns[1].image.is_none());
    assert_eq!(result.playing_vns[1].tags, vec!["Action"]);

    let favourites: Vec<&str> = result.favourite_vns.iter().map(|e| e.vn_id.as_str()).collect();
    assert_eq!(favourites, vec!["v4", "v17"]);
    assert_eq!(result.favourite_vns[0].alt_title, "クラナド");
    assert_eq!(result.favourite_vns[0].vote, "-");
    assert_eq!(result.favourite_vns[0].start_date, "");
    assert_eq!(result.favourite_vns[0].finish_date, "2021-01-01");
    assert_eq!(result.favourite_vns[1].vote, "9.5");
    assert_eq!(result.favourite_vns[1].notes, "Best twist");

    assert_eq!(result.sections, json!(["player", "favourites"]));
}

#[tokio::test]
async fn test_aggregate_request_sequence_is_batched() {
    let transport = Arc::new(vndb());
    let config = AggregateConfig::builder().user_id("u2").favourites(["v4"]).build();

    assert!(aggregator(&transport).aggregate(&config).await.is_ready());

    let calls: Vec<(&str, String)> = transport.calls().into_iter().map(|c| (c.method, c.url)).collect();
    assert_eq!(
        calls,
        vec![
            ("GET", USER_URL.to_string()),
            ("GET", FINISHED_URL.to_string()),
            ("POST", VN_URL.to_string()),
            ("GET", PLAYING_URL.to_string()),
            ("POST", VN_URL.to_string()),
            ("POST", VN_URL.to_string()),
            ("POST", ULIST_URL.to_string()),
        ]
    );
}

#[tokio::test]
async fn test_aggregate_without_favourites_skips_their_queries() {
    let transport = Arc::new(vndb());
    let config = AggregateConfig::builder().user_id("u2").build();

    let result = aggregator(&transport).aggregate(&config).await.into_result().unwrap();
    assert!(result.favourite_vns.is_empty());
    assert!(transport.calls().iter().all(|call| call.url != ULIST_URL));
}

#[tokio::test]
async fn test_aggregate_resolves_username() {
    let transport = Arc::new(
        vndb().with_json(
            "https://api.vndb.org/kana/user?q=Yorhel&fields=lengthvotes_sum",
            json!({ "Yorhel": { "id": "u2", "username": "Yorhel", "lengthvotes_sum": 60 } }),
        ),
    );
    let config = AggregateConfig::builder().user_id("Yorhel").build();

    let result = aggregator(&transport).aggregate(&config).await.into_result().unwrap();
    assert_eq!(result.player.id, "u2");
    assert_eq!(result.player.total_play_time, "1h");
    assert!(transport.calls().iter().any(|call| call.url == FINISHED_URL));
}

#[tokio::test]
async fn test_aggregate_empty_user_makes_no_calls() {
    let transport = Arc::new(vndb());
    let outcome = aggregator(&transport).aggregate(&AggregateConfig::default()).await;

    assert_eq!(outcome, Outcome::Empty(EmptyReason::NoUser));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_aggregate_unknown_user_is_empty() {
    let transport = Arc::new(MemoryTransport::new().with_json(USER_URL, json!({ "u2": null })));
    let config = AggregateConfig::builder().user_id("u2").build();

    let outcome = aggregator(&transport).aggregate(&config).await;
    assert!(matches!(outcome, Outcome::Empty(EmptyReason::Failed(ref message)) if message.contains("Unknown VNDB user")));
}

#[tokio::test]
async fn test_aggregate_broken_list_page_is_empty() {
    let transport = Arc::new(
        MemoryTransport::new()
            .with_json(USER_URL, json!({ "u2": { "id": "u2", "username": "Yorhel" } }))
            .with_page(FINISHED_URL, get_fixture("maintenance.html")),
    );
    let config = AggregateConfig::builder().user_id("u2").build();

    let outcome = aggregator(&transport).aggregate(&config).await;
    assert!(!outcome.is_ready());
    assert!(outcome.result().is_none());
}

#[test]
fn test_extract_finished_fixture() {
    let html = get_fixture("ulist_finished.html");
    let list = extract_list(&html, &RowPattern::vndb().unwrap(), 10).expect("should extract");

    assert_eq!(list.summary, ListSummary { playing: 3, finished: 2 });
    assert_eq!(list.entries.len(), 2);
    assert_eq!(list.entries[1].vn_id, "v4");
    assert_eq!(list.entries[1].alt_title, "Kuranado");
    assert_eq!(list.entries[1].title, "CLANNAD & After Story");
    assert_eq!(list.entries[1].vote, "-");
    assert_eq!(list.entries[1].finish_date, "2022-06-30");
}

#[test]
fn test_extract_maintenance_fixture_fails() {
    let html = get_fixture("maintenance.html");
    let result = extract_list(&html, &RowPattern::vndb().unwrap(), 10);
    assert!(matches!(result, Err(VnshelfError::Extraction(_))));
}

#[test]
fn test_settings_to_outcome_config() {
    let settings = Settings::from_json(r#"{ "enabled": true, "user": "u2", "favourite.games": "v4,v17" }"#).unwrap();
    let config = settings.activate().unwrap();
    assert_eq!(config.favourite_ids, vec!["v4", "v17"]);
    assert_eq!(config.finished_limit, AggregateConfig::default().finished_limit);
}

#[tokio::test]
async fn test_text_output_of_aggregate() {
    let transport = Arc::new(vndb());
    let config = AggregateConfig::builder().user_id("u2").finished_limit(2).playing_limit(0).build();

    let result = aggregator(&transport).aggregate(&config).await.into_result().unwrap();
    assert!(result.playing_vns.is_empty());

    let text = convert_to_text(&result, &TextConfig::default());
    assert!(text.contains("Yorhel (u2)"));
    assert!(text.contains("CLANNAD & After Story (Kuranado)"));
    assert!(text.contains("Currently playing\n-----------------\n(none)"));
}
