// ABOUTME: End-to-end smoke test for the full console lifecycle.
// ABOUTME: Login, guard evaluation, topic CRUD through the controller, 401 interception, resume.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use adminctl_client::{AuthApi, HttpClient, resources};
use adminctl_core::error::{AuthKind, ConsoleError};
use adminctl_core::events::{ConsoleEvent, EventBus};
use adminctl_core::guard::{GuardCtx, GuardFlags, GuardOutcome, evaluate};
use adminctl_core::interceptor::LoginInterceptor;
use adminctl_core::mode::ViewMode;
use adminctl_core::session::{SessionHandle, TokenPair};
use adminctl_core::{CrudController, FormData};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

struct ApiState {
    valid_token: Mutex<String>,
    topics: Mutex<Vec<Value>>,
    next_id: Mutex<u32>,
}

fn account_json() -> Value {
    json!({
        "userId": "admin",
        "tenantId": "t1",
        "roles": ["superadmin"],
        "permissions": ["topics.write"],
        "locked": false
    })
}

fn authorized(state: &ApiState, headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {}", state.valid_token.lock().unwrap());
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "token expired"})),
    )
        .into_response()
}

async fn login(State(state): State<Arc<ApiState>>, Json(_body): Json<Value>) -> Response {
    *state.valid_token.lock().unwrap() = "tok-1".to_string();
    Json(json!({
        "accessToken": "tok-1",
        "refreshToken": "ref-1",
        "expiresIn": 3600,
        "account": account_json()
    }))
    .into_response()
}

async fn get_account(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    Json(account_json()).into_response()
}

async fn list_topics(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    Json(Value::Array(state.topics.lock().unwrap().clone())).into_response()
}

async fn create_topic(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let mut next = state.next_id.lock().unwrap();
    *next += 1;
    body["id"] = json!(format!("t{}", next));
    state.topics.lock().unwrap().push(body.clone());
    Json(body).into_response()
}

async fn get_topic(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let topics = state.topics.lock().unwrap();
    match topics.iter().find(|t| t["id"] == json!(id)) {
        Some(topic) => Json(topic.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "no such topic"}))).into_response(),
    }
}

async fn update_topic(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(mut body): Json<Value>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    body["id"] = json!(id);
    let mut topics = state.topics.lock().unwrap();
    match topics.iter_mut().find(|t| t["id"] == json!(id)) {
        Some(slot) => {
            *slot = body.clone();
            Json(body).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "no such topic"}))).into_response(),
    }
}

async fn delete_topic(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    state
        .topics
        .lock()
        .unwrap()
        .retain(|t| t["id"] != json!(id));
    Json(json!({})).into_response()
}

async fn serve(state: Arc<ApiState>) -> String {
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/admin/account", get(get_account))
        .route("/cms/topics", get(list_topics).post(create_topic))
        .route(
            "/cms/topics/{id}",
            get(get_topic).put(update_topic).delete(delete_topic),
        )
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });
    format!("http://{addr}")
}

fn form(title: &str) -> FormData {
    let mut form = BTreeMap::new();
    form.insert("title".to_string(), json!(title));
    form.insert("published".to_string(), json!(false));
    form
}

#[tokio::test]
async fn smoke_full_console_lifecycle() {
    let state = Arc::new(ApiState {
        valid_token: Mutex::new("tok-0".to_string()),
        topics: Mutex::new(Vec::new()),
        next_id: Mutex::new(0),
    });
    let base = serve(Arc::clone(&state)).await;

    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let session = SessionHandle::new(bus.clone());
    let http = HttpClient::new(base, session.clone(), bus.clone());
    let auth = AuthApi::new(http.clone());

    // 1. Before login: account not loaded, so any guarded route waits.
    let account_state = session.account().await;
    let outcome = evaluate(
        GuardFlags::superuser(),
        &GuardCtx {
            authenticated: false,
            account: &account_state,
            path: "/admin/content/topics",
        },
    );
    assert_eq!(outcome, GuardOutcome::Loading);

    // 2. Login establishes tokens and the account in one step.
    let account = auth
        .login(&session, "admin", "hunter2", Some("t1"))
        .await
        .expect("login should succeed");
    assert_eq!(account.user_id, "admin");
    assert!(session.is_authenticated().await);
    assert_eq!(
        rx.recv().await.unwrap(),
        ConsoleEvent::Login {
            user_id: "admin".to_string()
        }
    );

    // 3. Guards now render: superadmin satisfies both admin and superuser routes.
    let account_state = session.account().await;
    for flags in [GuardFlags::admin(), GuardFlags::superuser()] {
        let outcome = evaluate(
            flags,
            &GuardCtx {
                authenticated: true,
                account: &account_state,
                path: "/admin/content/topics",
            },
        );
        assert_eq!(outcome, GuardOutcome::Render, "flags: {flags:?}");
    }
    // A public route bounces an authenticated user home.
    let outcome = evaluate(
        GuardFlags::public(),
        &GuardCtx {
            authenticated: true,
            account: &account_state,
            path: "/login",
        },
    );
    assert_eq!(outcome, GuardOutcome::RedirectHome);

    // 4. CRUD round trip through the controller.
    let mut controller =
        CrudController::new(resources::topics(http.clone()), "/admin/content/topics");

    controller
        .handle_route("/admin/content/topics/create")
        .await
        .expect("create route should open the dialog");
    assert_eq!(*controller.mode(), ViewMode::Creating);

    controller
        .handle_confirm(form("Launch notes"))
        .await
        .expect("confirm in create mode should create");
    assert_eq!(*controller.mode(), ViewMode::Closed);
    assert_eq!(controller.items().len(), 1);
    let id = controller.items()[0].id.clone().expect("server minted id");

    controller
        .handle_route(&format!("/admin/content/topics/edit/{id}"))
        .await
        .expect("edit route should load the record");
    assert_eq!(
        controller.form().get("title"),
        Some(&json!("Launch notes")),
        "form is seeded from the fetched record"
    );

    controller
        .handle_confirm(form("Launch notes v2"))
        .await
        .expect("confirm in edit mode should update");
    assert_eq!(controller.items()[0].title, "Launch notes v2");

    // 5. Server-side token invalidation: next request is intercepted.
    *state.valid_token.lock().unwrap() = "rotated-away".to_string();

    let err = controller.refetch().await.unwrap_err();
    assert!(matches!(err, ConsoleError::Auth(AuthKind::Unauthorized)));

    let event = rx.recv().await.unwrap();
    assert!(matches!(event, ConsoleEvent::Unauthorized { .. }));

    // The app clears the rejected session before the interceptor reacts.
    session.update_tokens(None).await;
    assert_eq!(rx.recv().await.unwrap(), ConsoleEvent::Logout);
    assert!(!session.is_authenticated().await);

    let mut interceptor = LoginInterceptor::new(session.clone(), bus.clone(), |path| {
        path.starts_with("/login")
    });
    let opened = interceptor
        .handle_event(&event, "/admin/content/topics")
        .await;
    assert!(opened, "unauthorized on a private route opens the prompt");

    // 6. Completing the login resumes where the user left off.
    *state.valid_token.lock().unwrap() = "tok-2".to_string();
    let resume = interceptor
        .complete_login(
            TokenPair {
                access_token: "tok-2".to_string(),
                refresh_token: "ref-2".to_string(),
                expires_at: None,
            },
            account,
        )
        .await;
    assert_eq!(resume.as_deref(), Some("/admin/content/topics"));
    assert!(!interceptor.is_open());

    controller
        .refetch()
        .await
        .expect("refetch should work with the new token");
    assert_eq!(controller.items().len(), 1);

    // 7. Delete closes the loop.
    controller
        .handle_delete(&id)
        .await
        .expect("delete should succeed");
    assert!(controller.items().is_empty());
}

#[tokio::test]
async fn logout_through_one_handle_redirects_the_next_guard_evaluation() {
    let state = Arc::new(ApiState {
        valid_token: Mutex::new("tok-0".to_string()),
        topics: Mutex::new(Vec::new()),
        next_id: Mutex::new(0),
    });
    let base = serve(Arc::clone(&state)).await;

    let bus = EventBus::new();
    let session = SessionHandle::new(bus.clone());
    let http = HttpClient::new(base, session.clone(), bus.clone());
    let auth = AuthApi::new(http);

    auth.login(&session, "admin", "hunter2", None)
        .await
        .expect("login should succeed");

    // Clones share the one session; a logout via either is visible everywhere.
    let other_handle = session.clone();
    other_handle.update_tokens(None).await;

    // The account has to reload after logout; the reload is rejected without
    // a token, and the failed load redirects.
    auth.load_account(&session)
        .await
        .expect_err("account reload without a token must fail");

    let account_state = session.account().await;
    let outcome = evaluate(
        GuardFlags::admin(),
        &GuardCtx {
            authenticated: session.is_authenticated().await,
            account: &account_state,
            path: "/admin/users",
        },
    );
    assert_eq!(
        outcome,
        GuardOutcome::RedirectToLogin {
            redirect: "/login?redirect=/admin/users".to_string()
        }
    );
}
