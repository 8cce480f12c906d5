use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, catalog, reports, summary};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(reports::router())
                .merge(summary::router())
                .merge(catalog::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_responds_ok() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn meta_lists_regions_and_diseases() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(Request::get("/api/meta").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["regions"].as_array().unwrap().len(), 14);
        assert!(body["diseases"]
            .as_array()
            .unwrap()
            .iter()
            .any(|d| d == "Cholera"));
    }

    #[tokio::test]
    async fn me_without_token_is_unauthorized() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(Request::get("/api/auth/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(res: axum::response::Response) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn duplicate_username_is_conflict() {
        let app = build_app(AppState::fake());
        let payload = serde_json::json!({
            "username": "worker1", "password": "secret1", "role": "hew"
        });

        let res = app
            .clone()
            .oneshot(post_json("/api/admin/users", &payload))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = read_json(res).await;
        assert_eq!(body["message"], "User created successfully");
        assert_eq!(body["user"]["username"], "worker1");

        let res = app
            .oneshot(post_json("/api/admin/users", &payload))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let body = read_json(res).await;
        assert_eq!(body["message"], "Username already exists");
    }

    #[tokio::test]
    async fn login_checks_credentials_then_role() {
        let app = build_app(AppState::fake());
        let res = app
            .clone()
            .oneshot(post_json(
                "/api/admin/users",
                &serde_json::json!({
                    "username": "worker1", "password": "secret1", "role": "hew"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        // Unknown account and wrong password are indistinguishable.
        let res = app
            .clone()
            .oneshot(post_json(
                "/api/auth/login",
                &serde_json::json!({
                    "username": "nobody", "password": "secret1", "role": "hew"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            read_json(res).await["message"],
            "Invalid username or password"
        );

        let res = app
            .clone()
            .oneshot(post_json(
                "/api/auth/login",
                &serde_json::json!({
                    "username": "worker1", "password": "wrong", "role": "hew"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            read_json(res).await["message"],
            "Invalid username or password"
        );

        // Correct credentials but the other role.
        let res = app
            .clone()
            .oneshot(post_json(
                "/api/auth/login",
                &serde_json::json!({
                    "username": "worker1", "password": "secret1", "role": "officer"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            read_json(res).await["message"],
            "Login failed. User is registered as hew, not officer."
        );

        let res = app
            .clone()
            .oneshot(post_json(
                "/api/auth/login",
                &serde_json::json!({
                    "username": "worker1", "password": "secret1", "role": "hew"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = read_json(res).await;
        assert_eq!(body["user"]["username"], "worker1");
        assert_eq!(body["user"]["role"], "hew");
        let token = body["token"].as_str().unwrap().to_string();

        let res = app
            .oneshot(
                Request::get("/api/auth/me")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(read_json(res).await["user"]["username"], "worker1");
    }

    #[tokio::test]
    async fn report_filters_combine_and_delete_all_clears() {
        let app = build_app(AppState::fake());
        // Midday 2024-05-01 East Africa Time and a report two days later.
        for (region, disease, ts) in [
            ("Tigray", "Cholera", 1_714_554_000_000_i64),
            ("Tigray", "Measles", 1_714_554_000_000),
            ("Afar", "Cholera", 1_714_726_800_000),
        ] {
            let res = app
                .clone()
                .oneshot(post_json(
                    "/api/reports",
                    &serde_json::json!({
                        "symptoms": "fever, watery diarrhea",
                        "suspectedDisease": disease,
                        "timestamp": ts,
                        "region": region,
                        "isAnonymous": true
                    }),
                ))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::CREATED);
        }

        let res = app
            .clone()
            .oneshot(
                Request::get("/api/reports?region=Tigray&disease=Cholera")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = read_json(res).await;
        let reports = body["reports"].as_array().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0]["region"], "Tigray");
        assert_eq!(reports[0]["suspectedDisease"], "Cholera");

        let res = app
            .clone()
            .oneshot(
                Request::get("/api/reports?date=2024-05-01")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = read_json(res).await;
        assert_eq!(body["reports"].as_array().unwrap().len(), 2);

        let res = app
            .clone()
            .oneshot(
                Request::delete("/api/reports")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            read_json(res).await["message"],
            "All reports deleted successfully"
        );

        let res = app
            .oneshot(Request::get("/api/reports").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = read_json(res).await;
        assert!(body["reports"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_report_is_rejected_and_not_stored() {
        let app = build_app(AppState::fake());
        let res = app
            .clone()
            .oneshot(post_json(
                "/api/reports",
                &serde_json::json!({
                    "symptoms": "",
                    "suspectedDisease": "Cholera",
                    "timestamp": 1_714_554_000_000_i64,
                    "region": "Tigray",
                    "isAnonymous": true
                }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = read_json(res).await;
        assert_eq!(body["message"], "Invalid report data");
        assert_eq!(body["errors"]["symptoms"][0], "Symptoms are required");

        let res = app
            .oneshot(Request::get("/api/reports").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = read_json(res).await;
        assert!(body["reports"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn type_mismatched_body_is_bad_request() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(post_json(
                "/api/reports",
                &serde_json::json!({
                    "symptoms": "fever",
                    "suspectedDisease": "Cholera",
                    "timestamp": 1_714_554_000_000_i64,
                    "region": "Tigray",
                    "isAnonymous": true,
                    "location": { "latitude": "nine", "longitude": 38.7 }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = read_json(res).await;
        assert!(body["message"].as_str().unwrap().contains("latitude"));
    }

    #[tokio::test]
    async fn half_location_is_returned_as_null() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(post_json(
                "/api/reports",
                &serde_json::json!({
                    "symptoms": "fever",
                    "suspectedDisease": "Cholera",
                    "timestamp": 1_714_554_000_000_i64,
                    "region": "Tigray",
                    "isAnonymous": true,
                    "location": { "latitude": 9.0 }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = read_json(res).await;
        assert!(body["report"]["location"].is_null());
    }
}
