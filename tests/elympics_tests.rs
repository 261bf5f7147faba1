//! Integration tests for the Elympics facade.
//!
//! These tests verify the highscore calls end to end against a wiremock
//! server standing in for the Elympics API.

use std::sync::{Arc, Mutex};

use elympics_api::{ApiKey, BigInt, Elympics, Endpoint, Highscore, HttpError};
use serde_json::json;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn elympics_for(server: &MockServer, key: Option<&str>) -> Elympics {
    let mut builder = Elympics::builder().endpoint(Endpoint::new(server.uri()).unwrap());
    if let Some(key) = key {
        builder = builder.key(ApiKey::new(key).unwrap());
    }
    Elympics::new(builder.build().unwrap())
}

/// An in-memory leaderboard: `/submitHighscore` stores, `/getHighscores` lists.
#[derive(Clone, Default)]
struct Leaderboard {
    entries: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl Respond for Leaderboard {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut entries = self.entries.lock().unwrap();
        if request.url.path() == "/submitHighscore" {
            let body = String::from_utf8_lossy(&request.body).into_owned();
            let mut name = None;
            let mut score = None;
            for pair in body.split('&') {
                match pair.split_once('=') {
                    Some(("name", value)) => name = Some(value.to_string()),
                    Some(("score", value)) => score = Some(value.to_string()),
                    _ => {}
                }
            }
            entries.push(json!({ "name": name, "score": score }));
            ResponseTemplate::new(200)
        } else {
            ResponseTemplate::new(200).set_body_json(json!(*entries))
        }
    }
}

#[tokio::test]
async fn test_submit_then_get_round_trip() {
    let server = MockServer::start().await;
    let board = Leaderboard::default();
    Mock::given(method("POST"))
        .and(header("key", "game-key"))
        .respond_with(board.clone())
        .mount(&server)
        .await;

    let elympics = elympics_for(&server, Some("game-key"));
    let huge: BigInt = "18446744073709551616000".parse().unwrap();

    elympics.submit_highscore("ann", 120).await.unwrap();
    elympics.submit_highscore("bob", huge.clone()).await.unwrap();
    elympics
        .submit(&Highscore::new("cid", -3))
        .await
        .unwrap();

    let mut scores = elympics.get_highscores().await.unwrap();
    Highscore::sort_by_score(&mut scores);

    let names: Vec<_> = scores.iter().filter_map(Highscore::name).collect();
    assert_eq!(names, vec!["bob", "ann", "cid"]);
    assert_eq!(scores[0].score(), Some(&huge));
}

#[tokio::test]
async fn test_submit_sends_key_name_and_score() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submitHighscore"))
        .and(header("key", "game-key"))
        .and(body_string("key=game-key&name=ann&score=99"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let elympics = elympics_for(&server, Some("game-key"));
    elympics.submit_highscore("ann", 99).await.unwrap();
}

#[tokio::test]
async fn test_get_highscores_sends_key_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getHighscores"))
        .and(body_string("key=game-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "ann", "score": "10" },
            { "name": "bob", "score": 20 },
            { "name": "nobody" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let elympics = elympics_for(&server, Some("game-key"));
    let mut scores = elympics.get_highscores().await.unwrap();
    assert_eq!(scores.len(), 3);

    Highscore::sort_by_score(&mut scores);
    assert_eq!(scores[0].name(), Some("bob"));
    assert_eq!(scores[2].score(), None);
}

#[tokio::test]
async fn test_get_highscores_empty_and_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getHighscores"))
        .respond_with(ResponseTemplate::new(204))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/getHighscores"))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    let elympics = elympics_for(&server, Some("game-key"));
    assert!(elympics.get_highscores().await.unwrap().is_empty());
    assert!(elympics.get_highscores().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_anonymous_get_highscores_sends_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getHighscores"))
        .and(body_string(""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let elympics = elympics_for(&server, None);
    assert!(elympics.get_highscores().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_retrieve_uses_get() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/getHighscores"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "name": "ann", "score": 1 }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let elympics = elympics_for(&server, None);
    let scores = elympics
        .retrieve()
        .fetch_all::<Highscore>("/getHighscores")
        .await
        .unwrap()
        .into_option()
        .unwrap();
    assert_eq!(scores, vec![Highscore::new("ann", 1)]);
}

#[tokio::test]
async fn test_bad_key_surfaces_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submitHighscore"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let elympics = elympics_for(&server, Some("wrong"));
    let err = tokio_test::assert_err!(elympics.submit_highscore("ann", 1).await);

    assert_eq!(err.status(), Some(401));
    match err {
        HttpError::Api(e) => assert_eq!(e.code(), 401),
        other => panic!("expected api error, got {other:?}"),
    }
}
