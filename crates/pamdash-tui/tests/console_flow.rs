//! Reducer, handlers and renderer driven together against a mock service.

use std::collections::VecDeque;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use pamdash_core::api::ApiClient;
use pamdash_core::config::Config;
use pamdash_core::dashboard::Summary;
use pamdash_tui::common::{TaskCompleted, TaskId, TaskKind, TaskMeta, TaskStarted};
use pamdash_tui::effects::UiEffect;
use pamdash_tui::events::UiEvent;
use pamdash_tui::runtime::handlers;
use pamdash_tui::settings_form::{Field, ROWS, Row};
use pamdash_tui::state::{AppState, Page, Route};
use pamdash_tui::{render, update, view};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

fn event(action: &str, score: u8) -> Value {
    json!({
        "id": 1_714_558_530.25,
        "time": "2024-05-01T10:15:30.123456",
        "riskScore": score,
        "action": action,
        "user": {"role": "Database Admin"},
        "details": {"source_ip": "10.0.0.7"}
    })
}

fn session(email: &str) -> Value {
    json!({
        "email": email,
        "role": "Database Admin",
        "login_time": "2024-05-01T09:00:00.000000",
        "strike_count": 1
    })
}

fn settings_doc(medium: u8, high: u8, critical: u8) -> Value {
    json!({
        "risk_thresholds": {"medium": medium, "high": high, "critical": critical},
        "session_management": {"max_strikes": 3, "session_timeout": 30},
        "alerts": {
            "email_enabled": true,
            "slack_enabled": false,
            "email_recipients": ["security@company.com"]
        },
        "dashboard": {"refresh_interval": 3, "max_events": 50},
        "logs": {"retention_days": 30, "log_level": "info"}
    })
}

async fn mount_get(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn task_events(kind: TaskKind, id: TaskId, inner: UiEvent) -> [UiEvent; 2] {
    [
        UiEvent::TaskStarted {
            kind,
            started: TaskStarted {
                id,
                meta: TaskMeta::None,
            },
        },
        UiEvent::TaskCompleted {
            kind,
            completed: TaskCompleted {
                id,
                result: Box::new(inner),
            },
        },
    ]
}

/// Runs effects to completion the way the runtime does, awaiting each
/// handler inline. Timer effects are ignored.
async fn drive(app: &mut AppState, client: &ApiClient, effects: Vec<UiEffect>) {
    let mut queue: VecDeque<UiEffect> = effects.into();
    while let Some(effect) = queue.pop_front() {
        let events: Vec<UiEvent> = match effect {
            UiEffect::FetchCycle { cycle } => {
                vec![handlers::fetch_cycle(client.clone(), cycle).await]
            }
            UiEffect::LoadSettings { task } => task_events(
                TaskKind::SettingsLoad,
                task,
                handlers::load_settings(client.clone()).await,
            )
            .into(),
            UiEffect::SaveSettings { task, settings } => task_events(
                TaskKind::SettingsSave,
                task,
                handlers::save_settings(client.clone(), *settings).await,
            )
            .into(),
            _ => Vec::new(),
        };
        for event in events {
            queue.extend(update::update(app, event));
        }
    }
}

/// Draws a frame, installs its bindings and returns the screen text.
fn redraw(app: &mut AppState) -> String {
    let view = view::build(app);
    let mut terminal = Terminal::new(TestBackend::new(120, 50)).unwrap();
    let mut bindings = None;
    terminal
        .draw(|frame| bindings = Some(render::draw(&view, frame)))
        .unwrap();
    app.tui.replace_bindings(bindings.unwrap());

    let buffer = terminal.backend().buffer();
    let width = usize::from(buffer.area.width);
    buffer
        .content()
        .chunks(width)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let effects = update::update(app, UiEvent::Terminal(Event::Key(key)));
    redraw(app);
    effects
}

fn set_field(app: &mut AppState, field: Field, value: &str) {
    let index = ROWS
        .iter()
        .position(|row| *row == Row::Field(field))
        .unwrap();
    assert!(app.tui.form.as_mut().unwrap().focus_row(index));
    redraw(app);
    key(app, KeyEvent::from(KeyCode::Enter));
    for _ in 0..8 {
        key(app, KeyEvent::from(KeyCode::Backspace));
    }
    for c in value.chars() {
        key(app, KeyEvent::from(KeyCode::Char(c)));
    }
    key(app, KeyEvent::from(KeyCode::Enter));
}

fn latest_toast(app: &AppState) -> Option<String> {
    app.tui.toasts.latest().map(|t| t.message.clone())
}

fn config_for(server: &MockServer) -> Config {
    Config {
        server_url: server.uri(),
        ..Config::default()
    }
}

#[tokio::test]
async fn test_dashboard_classifies_fetched_events() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    mount_get(&server, "/api/settings", settings_doc(60, 80, 95)).await;
    mount_get(&server, "/get_alerts", json!([event("DROP_DATABASE", 97)])).await;
    mount_get(&server, "/api/active_sessions", json!([])).await;
    mount_get(
        &server,
        "/api/all_events",
        json!([
            event("SELECT_ROWS", 50),
            event("DELETE_TABLE", 85),
            event("DROP_DATABASE", 97)
        ]),
    )
    .await;

    let config = config_for(&server);
    let client = ApiClient::from_config(&config).unwrap();
    let mut app = AppState::new(config, Route::Page(Page::Dashboard));
    let effects = update::init(&mut app);
    drive(&mut app, &client, effects).await;

    assert_eq!(app.tui.store.events().len(), 3);
    let screen = redraw(&mut app);
    assert!(screen.contains("Low (50)"), "{screen}");
    assert!(screen.contains("High (85)"), "{screen}");
    assert!(screen.contains("Critical (97)"), "{screen}");
}

#[tokio::test]
async fn test_failed_collection_keeps_previous_data() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    mount_get(&server, "/api/settings", settings_doc(60, 80, 95)).await;
    mount_get(&server, "/get_alerts", json!([event("DROP_DATABASE", 97)])).await;
    mount_get(&server, "/api/active_sessions", json!([session("dba@company.com")])).await;
    mount_get(
        &server,
        "/api/all_events",
        json!([event("SELECT_ROWS", 50), event("DROP_DATABASE", 97)]),
    )
    .await;

    let config = config_for(&server);
    let client = ApiClient::from_config(&config).unwrap();
    let mut app = AppState::new(config, Route::Page(Page::Dashboard));
    let effects = update::init(&mut app);
    drive(&mut app, &client, effects).await;
    redraw(&mut app);

    let store = &app.tui.store;
    let applied = store.last_applied_cycle();
    assert!(applied.is_some());
    let alerts = store.alerts().to_vec();
    let sessions = store.sessions().to_vec();
    let events = store.events().to_vec();
    assert_eq!(sessions.len(), 1);
    let summary = Summary::derive(&alerts, sessions.len(), store.thresholds());

    // Alerts and events change, but the sessions request fails.
    server.reset().await;
    mount_get(
        &server,
        "/get_alerts",
        json!([event("DROP_DATABASE", 97), event("DELETE_TABLE", 99)]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/active_sessions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "db down"})))
        .mount(&server)
        .await;
    mount_get(&server, "/api/all_events", json!([event("DELETE_TABLE", 99)])).await;

    let effects = key(&mut app, KeyEvent::from(KeyCode::Char('r')));
    assert!(
        effects
            .iter()
            .any(|effect| matches!(effect, UiEffect::FetchCycle { .. }))
    );
    drive(&mut app, &client, effects).await;

    let store = &app.tui.store;
    assert_eq!(store.last_applied_cycle(), applied);
    assert_eq!(store.alerts(), alerts.as_slice());
    assert_eq!(store.sessions(), sessions.as_slice());
    assert_eq!(store.events(), events.as_slice());
    assert_eq!(
        Summary::derive(store.alerts(), store.sessions().len(), store.thresholds()),
        summary
    );
}

#[tokio::test]
async fn test_unordered_thresholds_are_rejected_without_a_request() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    mount_get(&server, "/api/settings", settings_doc(60, 80, 95)).await;

    let config = config_for(&server);
    let client = ApiClient::from_config(&config).unwrap();
    let mut app = AppState::new(config, Route::Page(Page::Settings));
    let effects = update::init(&mut app);
    drive(&mut app, &client, effects).await;
    redraw(&mut app);

    set_field(&mut app, Field::Medium, "80");
    set_field(&mut app, Field::High, "60");
    let effects = key(
        &mut app,
        KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL),
    );
    assert!(effects.is_empty());
    assert_eq!(
        latest_toast(&app).as_deref(),
        Some("Thresholds must be in ascending order (Medium < High < Critical)")
    );

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.as_str() == "GET"));
}

#[tokio::test]
async fn test_saved_thresholds_are_adopted_after_reload() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(settings_doc(60, 80, 95)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_get(&server, "/api/settings", settings_doc(50, 80, 95)).await;
    Mock::given(method("POST"))
        .and(path("/api/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = ApiClient::from_config(&config).unwrap();
    let mut app = AppState::new(config, Route::Page(Page::Settings));
    let effects = update::init(&mut app);
    drive(&mut app, &client, effects).await;
    redraw(&mut app);
    assert_eq!(app.tui.store.thresholds().medium, 60);

    set_field(&mut app, Field::Medium, "50");
    let effects = key(
        &mut app,
        KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL),
    );
    drive(&mut app, &client, effects).await;

    assert_eq!(
        latest_toast(&app).as_deref(),
        Some("Settings saved successfully!")
    );
    assert_eq!(app.tui.store.thresholds().medium, 50);
}
