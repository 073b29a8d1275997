use std::net::SocketAddr;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{organizations, users};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .nest(
            "/api/v1",
            Router::new()
                .nest("/endpoints/users", users::router())
                .nest("/endpoints/organizations", organizations::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
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

async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "message": format!("{} API is running!", state.config.project_name) }))
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use tower::ServiceExt;

    const USERS: &str = "/api/v1/endpoints/users";
    const ORGS: &str = "/api/v1/endpoints/organizations";

    struct TestApp {
        app: Router,
    }

    impl TestApp {
        fn new() -> Self {
            Self {
                app: build_app(AppState::fake()),
            }
        }

        async fn call(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, axum::http::HeaderMap, Value) {
            let mut req = Request::builder().method(method).uri(uri);
            if let Some(t) = token {
                req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
            }
            let req = match body {
                Some(b) => req
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(b.to_string())),
                None => req.body(Body::empty()),
            }
            .unwrap();

            let res = self.app.clone().oneshot(req).await.unwrap();
            let status = res.status();
            let headers = res.headers().clone();
            let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(Value::Null)
            };
            (status, headers, json)
        }

        async fn register_user(&self, email: &str, password: &str) -> (StatusCode, Value) {
            let (status, _, body) = self
                .call(
                    Method::POST,
                    &format!("{USERS}/register"),
                    None,
                    Some(json!({
                        "email": email,
                        "password": password,
                        "first_name": "Alice",
                        "last_name": "Liddell",
                        "phone_number": "+1-555-0100"
                    })),
                )
                .await;
            (status, body)
        }

        async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
            let (status, _, body) = self
                .call(
                    Method::POST,
                    &format!("{USERS}/login"),
                    None,
                    Some(json!({ "email": email, "password": password })),
                )
                .await;
            (status, body)
        }

        async fn token_for(&self, email: &str) -> String {
            self.register_user(email, "password123").await;
            let (_, body) = self.login(email, "password123").await;
            body["access_token"].as_str().unwrap().to_string()
        }

        async fn create_org(&self, name: &str) -> String {
            let (status, _, body) = self
                .call(
                    Method::POST,
                    &format!("{ORGS}/register"),
                    None,
                    Some(json!({ "name": name, "industry": "Software" })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            body["id"].as_str().unwrap().to_string()
        }

        async fn join_org(&self, token: &str, org_id: &str) {
            let (status, _, _) = self
                .call(
                    Method::PATCH,
                    &format!("{USERS}/me"),
                    Some(token),
                    Some(json!({ "org_id": org_id })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn root_and_health_respond() {
        let app = TestApp::new();
        let (status, _, body) = app.call(Method::GET, "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "AI Proposal Agent API is running!");

        let (status, _, _) = app.call(Method::GET, "/api/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn register_login_me_and_patch_flow() {
        let app = TestApp::new();

        let (status, created) = app.register_user("alice@example.com", "password123").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["email"], "alice@example.com");
        assert!(created.get("password_hash").is_none());

        let (status, login) = app.login("alice@example.com", "password123").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(login["token_type"], "bearer");
        let token = login["access_token"].as_str().unwrap();

        let (status, _, me) = app
            .call(Method::GET, &format!("{USERS}/me"), Some(token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "alice@example.com");
        assert_eq!(me["role"], "freelancer");
        assert!(me["profile"].is_null());
        assert!(me.get("password_hash").is_none());

        let (status, _, patched) = app
            .call(
                Method::PATCH,
                &format!("{USERS}/me"),
                Some(token),
                Some(json!({ "profile": { "headline": "Engineer" } })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["profile"]["headline"], "Engineer");
        assert_eq!(patched["first_name"], "Alice");
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let app = TestApp::new();
        let (first, _) = app.register_user("alice@example.com", "password123").await;
        let (second, body) = app.register_user("alice@example.com", "password123").await;
        assert_eq!(first, StatusCode::CREATED);
        assert_eq!(second, StatusCode::CONFLICT);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let app = TestApp::new();
        let (status, _) = app.register_user("alice@example.com", "short").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_errors_have_identical_shape() {
        let app = TestApp::new();
        app.register_user("alice@example.com", "password123").await;

        let (wrong_status, wrong_body) = app.login("alice@example.com", "wrong-password").await;
        let (unknown_status, unknown_body) = app.login("nobody@example.com", "password123").await;
        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_status, unknown_status);
        assert_eq!(wrong_body, unknown_body);
    }

    #[tokio::test]
    async fn protected_routes_demand_a_bearer_token() {
        let app = TestApp::new();
        let (status, headers, body) = app
            .call(Method::GET, &format!("{USERS}/me"), None, None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(headers[header::WWW_AUTHENTICATE], "Bearer");

        let (bad_status, _, bad_body) = app
            .call(Method::GET, &format!("{USERS}/me"), Some("garbage"), None)
            .await;
        assert_eq!(bad_status, StatusCode::UNAUTHORIZED);
        assert_eq!(bad_body, body);
    }

    #[tokio::test]
    async fn empty_patch_is_bad_request() {
        let app = TestApp::new();
        let token = app.token_for("alice@example.com").await;
        let (status, _, _) = app
            .call(Method::PATCH, &format!("{USERS}/me"), Some(&token), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn skills_patch_replaces_collection() {
        let app = TestApp::new();
        let token = app.token_for("alice@example.com").await;
        let rounds = [
            json!([{"skill_name": "A"}, {"skill_name": "B"}]),
            json!([{"skill_name": "C"}]),
        ];
        for skills in rounds {
            app.call(
                Method::PATCH,
                &format!("{USERS}/me"),
                Some(&token),
                Some(json!({ "skills": skills })),
            )
            .await;
        }
        let (_, _, me) = app
            .call(Method::GET, &format!("{USERS}/me"), Some(&token), None)
            .await;
        let names: Vec<_> = me["skills"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["skill_name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["C"]);
    }

    #[tokio::test]
    async fn password_change_returns_no_content() {
        let app = TestApp::new();
        let token = app.token_for("alice@example.com").await;
        let (status, _, body) = app
            .call(
                Method::PATCH,
                &format!("{USERS}/me/password"),
                Some(&token),
                Some(json!({ "new_password": "brand-new-pass" })),
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_null());

        let (old, _) = app.login("alice@example.com", "password123").await;
        let (new, _) = app.login("alice@example.com", "brand-new-pass").await;
        assert_eq!(old, StatusCode::UNAUTHORIZED);
        assert_eq!(new, StatusCode::OK);

        // outstanding tokens stay valid until expiry
        let (status, _, _) = app
            .call(Method::GET, &format!("{USERS}/me"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn organization_lookup_statuses() {
        let app = TestApp::new();
        let id = app.create_org("Acme").await;

        let (status, _, body) = app.call(Method::GET, &format!("{ORGS}/{id}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Acme");

        let (status, _, _) = app.call(Method::GET, &format!("{ORGS}/not-an-id"), None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = app
            .call(Method::GET, &format!("{ORGS}/65a1b2c3d4e5f60718293a4b"), None, None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn organization_update_is_ownership_checked() {
        let app = TestApp::new();
        let acme = app.create_org("Acme").await;
        let globex = app.create_org("Globex").await;
        let owner = app.token_for("alice@example.com").await;
        let outsider = app.token_for("bob@example.com").await;
        app.join_org(&owner, &acme).await;
        app.join_org(&outsider, &globex).await;

        let (status, _, _) = app
            .call(
                Method::PATCH,
                &format!("{ORGS}/{acme}"),
                Some(&outsider),
                Some(json!({ "description": "hijacked" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (_, _, unchanged) = app.call(Method::GET, &format!("{ORGS}/{acme}"), None, None).await;
        assert!(unchanged["description"].is_null());

        let (status, _, updated) = app
            .call(
                Method::PATCH,
                &format!("{ORGS}/{acme}"),
                Some(&owner),
                Some(json!({ "description": "Widgets" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["description"], "Widgets");
        assert_eq!(updated["industry"], "Software");
    }

    #[tokio::test]
    async fn members_listing_is_ownership_checked() {
        let app = TestApp::new();
        let org1 = app.create_org("Org One").await;
        let org2 = app.create_org("Org Two").await;
        let alice = app.token_for("alice@example.com").await;
        let bob = app.token_for("bob@example.com").await;
        app.join_org(&alice, &org1).await;
        app.join_org(&bob, &org2).await;

        let (status, _, _) = app
            .call(Method::GET, &format!("{ORGS}/{org2}/members"), Some(&alice), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, members) = app
            .call(Method::GET, &format!("{ORGS}/{org1}/members"), Some(&alice), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let members = members.as_array().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0]["email"], "alice@example.com");
        assert!(members[0].get("password_hash").is_none());

        let (status, _, _) = app
            .call(Method::GET, &format!("{ORGS}/{org1}/members"), None, None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
