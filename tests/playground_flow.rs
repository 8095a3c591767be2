//! End-to-end session flow against a mocked session API, plus the full
//! relay path from a frame-side console call to the visible log.

use ject::constants::LIVE_RELOAD_NOTICE;
use ject::events::EventBus;
use ject::relay::protocol::MessageEvent;
use ject::relay::{ConsoleMessage, ConsoleReceiver};
use ject::session::{templates, FileKind};
use ject::tui::app::dispatch_frame_line;
use ject::tui::console_view::ConsoleView;
use ject::tui::PageController;
use ject::api::SessionApi;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MAIN_ORIGIN: &str = "http://ject.dev.local:1850";
const FRAME_ORIGIN: &str = "http://ject.page.local:1850";

#[tokio::test]
async fn test_edit_run_save_restore_cycle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/session/new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "session_id": "s1" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/save"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "save_id": "v1" })))
        .mount(&server)
        .await;

    let mut controller = PageController::new(SessionApi::new(server.uri()));
    controller.create().await.expect("create");
    assert_eq!(controller.session_id(), Some("s1"));

    // Fresh session matches the default template.
    let template = templates::create();
    assert_eq!(controller.session(), &template);

    // An edit flows into the session without touching versions.
    controller.on_editor_change(FileKind::JavaScript, "document.title = 'mine'");
    assert_eq!(controller.session().max_version(), 1);

    let save_id = controller.save().await.expect("save");
    assert_eq!(save_id, "v1");

    // The PUT that preceded the save carried the edit, not the template.
    let requests = server.received_requests().await.expect("requests");
    let put = requests
        .iter()
        .find(|req| req.method.as_str() == "PUT")
        .expect("PUT request");
    let body: serde_json::Value = serde_json::from_slice(&put.body).expect("body");
    let files = body["session"]["files"].as_array().expect("files");
    assert!(files
        .iter()
        .any(|file| file["contents"] == "document.title = 'mine'"));

    // Restoring that save over a newer draft bumps every version.
    let saved_session = controller.session().clone();
    Mock::given(method("GET"))
        .and(path("/api/saved/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&saved_session))
        .mount(&server)
        .await;

    controller.on_editor_change(FileKind::JavaScript, "document.title = 'overwritten'");
    controller.restore_saved("v1").await.expect("restore");
    let js = controller
        .session()
        .file(FileKind::JavaScript)
        .expect("js file");
    assert_eq!(js.contents, "document.title = 'mine'");
    assert_eq!(js.version, 2);
}

fn envelope(origin: &str, target: &str, data: serde_json::Value) -> String {
    serde_json::to_string(&MessageEvent {
        origin: origin.to_string(),
        target: target.to_string(),
        data,
    })
    .expect("encode envelope")
}

#[test]
fn test_frame_output_reaches_the_log_through_both_origin_checks() {
    let bus: EventBus<ConsoleMessage> = EventBus::new();
    let mut view = ConsoleView::new(&bus);
    let receiver = ConsoleReceiver::new(FRAME_ORIGIN, bus);

    // The liveness notice every frame emits on startup: relayed, filtered.
    dispatch_frame_line(
        &envelope(
            FRAME_ORIGIN,
            MAIN_ORIGIN,
            json!({"type": "console", "method": "info", "args": [LIVE_RELOAD_NOTICE]}),
        ),
        MAIN_ORIGIN,
        &receiver,
    );

    // A real console call from the page.
    dispatch_frame_line(
        &envelope(
            FRAME_ORIGIN,
            MAIN_ORIGIN,
            json!({"type": "console", "method": "warn", "args": ["careful"]}),
        ),
        MAIN_ORIGIN,
        &receiver,
    );

    // Wrong sender origin: dropped by the receiver.
    dispatch_frame_line(
        &envelope(
            "http://evil.example",
            MAIN_ORIGIN,
            json!({"type": "console", "method": "log", "args": ["spoofed"]}),
        ),
        MAIN_ORIGIN,
        &receiver,
    );

    // Wrong target origin: dropped by the transport before validation.
    dispatch_frame_line(
        &envelope(
            FRAME_ORIGIN,
            "http://other.host:1850",
            json!({"type": "console", "method": "log", "args": ["misaddressed"]}),
        ),
        MAIN_ORIGIN,
        &receiver,
    );

    view.on_frame();
    let visible: Vec<(String, String)> = view
        .messages()
        .map(|msg| (msg.method.clone(), msg.args.join(" ")))
        .collect();
    assert_eq!(visible, vec![("warn".to_string(), "careful".to_string())]);
}

#[test]
fn test_relay_burst_is_grouped_and_frame_gated() {
    let bus: EventBus<ConsoleMessage> = EventBus::new();
    let mut view = ConsoleView::new(&bus);
    let receiver = ConsoleReceiver::new(FRAME_ORIGIN, bus);

    for i in 0..12 {
        dispatch_frame_line(
            &envelope(
                FRAME_ORIGIN,
                MAIN_ORIGIN,
                json!({"type": "console", "method": "log", "args": [format!("line {i}")]}),
            ),
            MAIN_ORIGIN,
            &receiver,
        );
    }

    // Nothing is visible until the frame tick drains the queue.
    assert!(view.is_empty());
    view.on_frame();
    assert_eq!(view.len(), 12);
}
