use crate::{
    controller::{health_check_controller, message_controller},
    middleware::cors::cors,
    params, sse, AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware::from_fn,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeFile;

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "ChatApp Gateway API"
        ),
        paths(
            message_controller::send,
            sse::handler::receive,
            health_check_controller::health_check,
        ),
        components(
            schemas(
                params::message::PublishParams,
            )
        ),
        tags(
            (name = "chatapp_gateway", description = "Chat gateway in front of the pub/sub service")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(message_routes(app_state.clone()))
        .merge(subscription_routes(app_state.clone()))
        .merge(health_routes())
        .merge(index_routes(&app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
        .fallback(not_found)
        // Added last so it also wraps the fallback and 405 responses
        .layer(from_fn(cors))
}

fn message_routes(app_state: AppState) -> Router {
    Router::new()
        // Messages have no size cap
        .route(
            "/send",
            post(message_controller::send).layer(DefaultBodyLimit::disable()),
        )
        .with_state(app_state)
}

fn subscription_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/receive", get(sse::handler::receive))
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

// Serves the single-page chat UI
fn index_routes(app_state: &AppState) -> Router {
    Router::new().route_service("/index", ServeFile::new(&app_state.config.index_path))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "404 page not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, Bytes};
    use axum::http::{header, Method, Request};
    use axum::response::Response;
    use mockito::Matcher;
    use serde_json::json;
    use service::config::Config;
    use ::sse::Framing;
    use tower::ServiceExt;

    fn app_state(config: Config) -> AppState {
        AppState::new(config, reqwest::Client::new())
    }

    fn app(pubsub_url: &str) -> Router {
        define_routes(app_state(Config::default().set_pubsub_url(pubsub_url)))
    }

    async fn body_bytes(response: Response) -> Bytes {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        String::from_utf8(body_bytes(response).await.to_vec()).unwrap()
    }

    fn send_request(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/send")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    /// Splits an event-stream body into record payloads, checking the framing of each.
    fn record_payloads(body: &str) -> Vec<&str> {
        assert!(body.ends_with("\n\n"), "body {body:?} should end a record");
        body.split_terminator("\n\n")
            .map(|record| {
                record
                    .strip_prefix("data: ")
                    .unwrap_or_else(|| panic!("record {record:?} missing data prefix"))
            })
            .collect()
    }

    #[tokio::test]
    async fn test_options_on_any_path_returns_empty_ok_with_cors_headers() {
        for path in ["/send", "/receive", "/index", "/does-not-exist"] {
            let request = Request::builder()
                .method(Method::OPTIONS)
                .uri(path)
                .body(Body::empty())
                .unwrap();

            let response = app("http://127.0.0.1:1").oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::OK, "OPTIONS {path}");
            let headers = response.headers();
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            assert_eq!(
                headers[header::ACCESS_CONTROL_ALLOW_METHODS],
                "GET, POST, OPTIONS"
            );
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
            assert!(body_bytes(response).await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_send_publishes_to_upstream() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/publish")
            .match_body(Matcher::Json(json!({"topic": "general", "message": "hi"})))
            .with_status(200)
            .create_async()
            .await;

        let response = app(&server.url())
            .oneshot(send_request(r#"{"topic":"general","message":"hi"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(body_text(response).await, "Message sent successfully");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_invalid_json_never_contacts_upstream() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/publish")
            .expect(0)
            .create_async()
            .await;

        for body in ["not json", r#"{"topic":"general"}"#, ""] {
            let response = app(&server.url())
                .oneshot(send_request(body))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body:?}");
            assert_eq!(body_text(response).await, "Invalid JSON");
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_upstream_unreachable_is_server_error() {
        let response = app("http://127.0.0.1:1")
            .oneshot(send_request(r#"{"topic":"general","message":"hi"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("Failed"));
    }

    #[tokio::test]
    async fn test_send_forwards_upstream_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/publish")
            .with_status(503)
            .create_async()
            .await;

        let response = app(&server.url())
            .oneshot(send_request(r#"{"topic":"general","message":"hi"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_receive_without_topic_never_contacts_upstream() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        for uri in ["/receive", "/receive?topic=", "/receive?other=x"] {
            let response = app(&server.url()).oneshot(get_request(uri)).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "GET {uri}");
            assert_eq!(body_text(response).await, "Missing topic");
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_receive_streams_upstream_bytes_as_records() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/subscribe")
            .match_query(Matcher::UrlEncoded("topic".into(), "general".into()))
            .with_status(200)
            .with_body("hello world")
            .create_async()
            .await;

        let response = app(&server.url())
            .oneshot(get_request("/receive?topic=general"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers[header::CONNECTION], "keep-alive");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let body = body_text(response).await;
        assert_eq!(record_payloads(&body).concat(), "hello world");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_receive_line_framing_emits_one_record_per_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/subscribe")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("first message\nsecond message\n")
            .create_async()
            .await;

        let config = Config::default()
            .set_pubsub_url(server.url())
            .set_record_framing(Framing::Line);
        let response = define_routes(app_state(config))
            .oneshot(get_request("/receive?topic=general"))
            .await
            .unwrap();

        assert_eq!(
            body_text(response).await,
            "data: first message\n\ndata: second message\n\n"
        );
    }

    #[tokio::test]
    async fn test_receive_upstream_unreachable_is_server_error() {
        let response = app("http://127.0.0.1:1")
            .oneshot(get_request("/receive?topic=general"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_receive_forwards_upstream_rejection() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/subscribe")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let response = app(&server.url())
            .oneshot(get_request("/receive?topic=general"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_index_serves_configured_file() {
        let path = std::env::temp_dir().join(format!("chatapp-index-{}.html", std::process::id()));
        std::fs::write(&path, "<html>chat</html>").unwrap();

        let config = Config::default().set_index_path(path.to_string_lossy());
        let response = define_routes(app_state(config))
            .oneshot(get_request("/index"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "<html>chat</html>");
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_health_and_unknown_routes() {
        let response = app("http://127.0.0.1:1")
            .oneshot(get_request("/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "healthy");

        let response = app("http://127.0.0.1:1")
            .oneshot(get_request("/nowhere"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_send_accepts_messages_larger_than_default_body_limit() {
        let message = "x".repeat(3 * 1024 * 1024);
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/publish")
            .match_body(Matcher::Json(json!({"topic": "t", "message": message})))
            .with_status(200)
            .create_async()
            .await;

        let body = json!({"topic": "t", "message": message}).to_string();
        let response = app(&server.url())
            .oneshot(send_request(&body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Message sent successfully");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_receive_uses_first_of_repeated_topics() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/subscribe")
            .match_query(Matcher::UrlEncoded("topic".into(), "a".into()))
            .with_status(200)
            .with_body("hello")
            .create_async()
            .await;

        let response = app(&server.url())
            .oneshot(get_request("/receive?topic=a&topic=b"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "data: hello\n\n");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_index_missing_file_is_not_found() {
        let path = std::env::temp_dir().join(format!(
            "chatapp-missing-{}/index.html",
            std::process::id()
        ));

        let config = Config::default().set_index_path(path.to_string_lossy());
        let response = define_routes(app_state(config))
            .oneshot(get_request("/index"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    /// Reads from `stream` until `needle` has been seen or the stream ends.
    async fn read_until(stream: &mut tokio::net::TcpStream, needle: &[u8]) -> Vec<u8> {
        use tokio::io::AsyncReadExt;

        let mut received = Vec::new();
        let mut buf = [0u8; 1024];
        while !received.windows(needle.len()).any(|w| w == needle) {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
        }
        received
    }

    #[tokio::test]
    async fn test_client_disconnect_closes_upstream_connection() {
        use std::time::Duration;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};
        use tokio::sync::oneshot;

        // Upstream that answers with one chunk and then holds the response open
        let upstream = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let upstream_addr = upstream.local_addr().unwrap();
        let (closed_tx, closed_rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = upstream.accept().await.unwrap();
            read_until(&mut socket, b"\r\n\r\n").await;
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\
                      Transfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n",
                )
                .await
                .unwrap();

            let mut buf = [0u8; 64];
            loop {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => continue,
                }
            }
            let _ = closed_tx.send(());
        });

        let gateway = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let gateway_addr = gateway.local_addr().unwrap();
        let config = Config::default().set_pubsub_url(format!("http://{upstream_addr}"));
        tokio::spawn(async move {
            axum::serve(gateway, define_routes(app_state(config)))
                .await
                .unwrap();
        });

        let mut client = TcpStream::connect(gateway_addr).await.unwrap();
        client
            .write_all(b"GET /receive?topic=general HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let received = read_until(&mut client, b"data: hello\n\n").await;
        assert!(
            received.windows(13).any(|w| w == b"data: hello\n\n"),
            "client should receive the upstream record, got {:?}",
            String::from_utf8_lossy(&received)
        );

        drop(client);

        tokio::time::timeout(Duration::from_secs(5), closed_rx)
            .await
            .expect("upstream connection should close after the client disconnects")
            .unwrap();
    }
}
