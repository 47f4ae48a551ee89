//! End-to-end tests of the request pipeline, driven in-process.

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, HOST, LOCATION, STRICT_TRANSPORT_SECURITY};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::routing::get;
use http_body_util::BodyExt;
use tictactoe_web::{
    AppConfig, AppState, BOARD_KEY, CacheValue, Environment, FORWARDED_PROTO, GameStore,
    MemoryCache, PanicPage, TURN_KEY, build_router, init_cache,
};
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;

fn app_with(config: AppConfig) -> (Router, MemoryCache) {
    let cache = MemoryCache::new();
    init_cache(&cache);
    let state = AppState::new(config, cache.clone()).expect("Default routes parse");
    (build_router(state), cache)
}

fn app() -> (Router, MemoryCache) {
    app_with(AppConfig::default())
}

fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(HOST, "example.com:5000")
        .body(Body::empty())
        .expect("Valid request")
}

fn get_req(uri: &str) -> Request<Body> {
    request(Method::GET, uri)
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.expect("Infallible")
}

async fn body_text(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Body readable")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("UTF-8 body")
}

fn cached_turn(cache: &MemoryCache) -> Option<CacheValue> {
    cache.get(TURN_KEY)
}

fn cached_grid(cache: &MemoryCache) -> [[char; 3]; 3] {
    match cache.get(BOARD_KEY) {
        Some(CacheValue::Grid(grid)) => grid,
        other => panic!("Unexpected board entry: {:?}", other),
    }
}

#[tokio::test]
async fn test_startup_cache_entries() {
    let (_app, cache) = app();
    assert_eq!(
        cached_turn(&cache),
        Some(CacheValue::Text("player1".to_string()))
    );
    assert_eq!(cached_grid(&cache), [[' '; 3]; 3]);
}

#[tokio::test]
async fn test_default_route_renders_index() {
    let (app, _cache) = app();
    for uri in ["/", "/Game", "/Game/Index", "/game/index/"] {
        let response = send(&app, get_req(uri)).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {}", uri);
        let html = body_text(response).await;
        assert!(html.contains("player1&#39;s turn"), "GET {}", uri);
        assert!(html.contains("href=\"/Game/Move/0\""));
    }
}

#[tokio::test]
async fn test_head_index() {
    let (app, _cache) = app();
    let response = send(&app, request(Method::HEAD, "/")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_move_updates_cache_and_redirects() {
    let (app, cache) = app();
    let response = send(&app, get_req("/Game/Move/4")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/");

    assert_eq!(
        cached_turn(&cache),
        Some(CacheValue::Text("player2".to_string()))
    );
    assert_eq!(cached_grid(&cache)[1][1], 'X');

    let html = body_text(send(&app, get_req("/")).await).await;
    assert!(html.contains("player2&#39;s turn (O)"));
    assert!(html.contains("<td class=\"cell x\">X</td>"));
}

#[tokio::test]
async fn test_move_with_encoded_cell() {
    let (app, cache) = app();
    let response = send(&app, get_req("/Game/Move/%34")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(cached_grid(&cache)[1][1], 'X');
}

#[tokio::test]
async fn test_move_by_post() {
    let (app, cache) = app();
    let response = send(&app, request(Method::POST, "/Game/Move/0")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(cached_grid(&cache)[0][0], 'X');
}

#[tokio::test]
async fn test_occupied_cell_rejected() {
    let (app, cache) = app();
    send(&app, get_req("/Game/Move/4")).await;

    let response = send(&app, get_req("/Game/Move/4")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let html = body_text(response).await;
    assert!(html.contains("already occupied"));

    // Still player2's turn; the board kept its single mark.
    assert_eq!(
        cached_turn(&cache),
        Some(CacheValue::Text("player2".to_string()))
    );
    let marks: usize = cached_grid(&cache)
        .iter()
        .flatten()
        .filter(|c| **c != ' ')
        .count();
    assert_eq!(marks, 1);
}

#[tokio::test]
async fn test_bad_cell_numbers() {
    let (app, _cache) = app();
    for uri in ["/Game/Move", "/Game/Move/9", "/Game/Move/abc"] {
        let response = send(&app, get_req(uri)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "GET {}", uri);
    }
}

#[tokio::test]
async fn test_win_then_game_over() {
    let (app, _cache) = app();
    // player1: 0, 1, 2 (top row); player2: 3, 4
    for cell in [0, 3, 1, 4, 2] {
        let response = send(&app, get_req(&format!("/Game/Move/{}", cell))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    let html = body_text(send(&app, get_req("/")).await).await;
    assert!(html.contains("player1 wins!"));
    assert!(!html.contains("/Game/Move/"));

    let response = send(&app, get_req("/Game/Move/8")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(body_text(response).await.contains("Game is already over"));
}

#[tokio::test]
async fn test_reset_restores_initial_state() {
    let (app, cache) = app();
    send(&app, get_req("/Game/Move/0")).await;
    send(&app, get_req("/Game/Move/1")).await;

    let response = send(&app, get_req("/Game/Reset")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        cached_turn(&cache),
        Some(CacheValue::Text("player1".to_string()))
    );
    assert_eq!(cached_grid(&cache), [[' '; 3]; 3]);
}

#[tokio::test]
async fn test_unknown_paths_not_found() {
    let (app, _cache) = app();
    for uri in ["/Home/Index", "/Game/Privacy", "/Game/Move/1/extra"] {
        let response = send(&app, get_req(uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {}", uri);
    }
}

#[tokio::test]
async fn test_method_not_allowed() {
    let (app, _cache) = app();
    let response = send(&app, request(Method::POST, "/Game/Index")).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_error_action() {
    let (app, _cache) = app();
    let response = send(&app, get_req("/Game/Error")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("An error occurred while processing your request."));
}

#[tokio::test]
async fn test_bundled_stylesheet_served() {
    let (app, _cache) = app();
    let response = send(&app, get_req("/css/site.css")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/css")
    );
}

#[tokio::test]
async fn test_static_files_before_routing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("robots.txt"), "User-agent: *\n").unwrap();

    let (app, _cache) = app_with(AppConfig::default().with_web_root(dir.path()));
    let response = send(&app, get_req("/robots.txt")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "User-agent: *\n");

    let response = send(&app, get_req("/")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_https_redirection() {
    let (app, _cache) = app_with(AppConfig::default().with_https_port(Some(5001)));

    let response = send(&app, get_req("/Game/Move/4?from=test")).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[LOCATION],
        "https://example.com:5001/Game/Move/4?from=test"
    );

    let mut req = get_req("/");
    req.headers_mut()
        .insert(FORWARDED_PROTO, "https".parse().unwrap());
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_no_redirect_without_https_port() {
    let (app, _cache) = app();
    let response = send(&app, get_req("/")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

fn https_get(uri: &str, host: &'static str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(HOST, host)
        .header(FORWARDED_PROTO, "https")
        .body(Body::empty())
        .expect("Valid request")
}

#[tokio::test]
async fn test_hsts_outside_development() {
    let (app, _cache) = app();

    let response = send(&app, https_get("/", "example.com")).await;
    assert_eq!(response.headers()[STRICT_TRANSPORT_SECURITY], "max-age=2592000");

    let response = send(&app, https_get("/", "localhost:5000")).await;
    assert!(!response.headers().contains_key(STRICT_TRANSPORT_SECURITY));

    let response = send(&app, get_req("/")).await;
    assert!(!response.headers().contains_key(STRICT_TRANSPORT_SECURITY));
}

#[tokio::test]
async fn test_no_hsts_in_development() {
    let (app, _cache) =
        app_with(AppConfig::default().with_environment(Environment::Development));
    let response = send(&app, https_get("/", "example.com")).await;
    assert!(!response.headers().contains_key(STRICT_TRANSPORT_SECURITY));
}

#[tokio::test]
async fn test_reset_token_policy() {
    let (app, cache) =
        app_with(AppConfig::default().with_reset_token(Some("s3cret".to_string())));
    send(&app, get_req("/Game/Move/4")).await;

    let response = send(&app, get_req("/Game/Reset")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(cached_grid(&cache)[1][1], 'X');

    let mut req = get_req("/Game/Reset");
    req.headers_mut()
        .insert(AUTHORIZATION, "Bearer s3cret".parse().unwrap());
    let response = send(&app, req).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(cached_grid(&cache), [[' '; 3]; 3]);

    // Moves stay open to everyone.
    let response = send(&app, get_req("/Game/Move/0")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_corrupt_state_hidden_in_production() {
    let (app, cache) = app();
    cache.set(TURN_KEY, CacheValue::Text("player3".to_string()));

    let response = send(&app, get_req("/")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let html = body_text(response).await;
    assert!(html.contains("An error occurred while processing your request."));
    assert!(!html.contains("player3"));
}

#[tokio::test]
async fn test_corrupt_state_detailed_in_development() {
    let (app, cache) =
        app_with(AppConfig::default().with_environment(Environment::Development));
    cache.remove(BOARD_KEY);

    let response = send(&app, get_req("/")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("Game state is corrupt"));
}

fn panicking(environment: Environment) -> Router {
    Router::new()
        .route(
            "/boom",
            get(|| async {
                if true {
                    panic!("kaboom");
                }
                "unreachable"
            }),
        )
        .layer(CatchPanicLayer::custom(PanicPage::new(environment)))
}

#[tokio::test]
async fn test_panic_renders_error_view() {
    let app = panicking(Environment::Production);
    let response = send(&app, get_req("/boom")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let html = body_text(response).await;
    assert!(html.contains("An error occurred while processing your request."));
    assert!(!html.contains("kaboom"));

    let app = panicking(Environment::Development);
    let html = body_text(send(&app, get_req("/boom")).await).await;
    assert!(html.contains("kaboom"));
}

#[tokio::test]
async fn test_concurrent_moves_keep_state_consistent() {
    let (app, cache) = app();

    let handles: Vec<_> = (0..9)
        .map(|cell| {
            let app = app.clone();
            tokio::spawn(async move {
                send(&app, get_req(&format!("/Game/Move/{}", cell)))
                    .await
                    .status()
            })
        })
        .collect();

    for handle in handles {
        let status = handle.await.unwrap();
        assert!(status == StatusCode::SEE_OTHER || status == StatusCode::CONFLICT);
    }

    let game = GameStore::new(cache).load().expect("Consistent state");
    let ones = game.board().count(tictactoe_core::Player::Player1);
    let twos = game.board().count(tictactoe_core::Player::Player2);
    assert!(ones == twos || ones == twos + 1);
}
