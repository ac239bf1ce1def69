mod common;

use std::time::Duration;

use trailscope::control::{
    set_sensitivity, set_target, ChatLog, ControlAck, ControlClient, ControlRequest,
};
use trailscope::core::SensitivityConfig;
use trailscope::error::ControlError;
use trailscope::DashboardConfig;

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(500))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_set_target_success() {
    let server = common::serve(|_, _| {
        (
            200,
            r#"{"success":true,"current_target_color":"blue","label":"blue blob"}"#.to_string(),
        )
    });
    let url = format!("{}/config/target", server.base_url);

    let ack = set_target(&client(), &url, "blue blob").await.unwrap();
    assert_eq!(
        ack,
        ControlAck::TargetSwitched {
            color: "blue".into(),
            label: Some("blue blob".into())
        }
    );

    let requests = server.requests.lock().unwrap().clone();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/config/target");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["prompt"], "blue blob");
}

#[tokio::test]
async fn test_set_target_array_shaped_failure() {
    let server = common::serve(|_, _| {
        (
            200,
            r#"[{"success":false,"error":"Could not identify color. Supported colors: red, blue, green, yellow, orange"},400]"#
                .to_string(),
        )
    });
    let url = format!("{}/config/target", server.base_url);

    match set_target(&client(), &url, "purple thing").await {
        Err(ControlError::Rejected(msg)) => assert!(msg.starts_with("Could not identify color")),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_set_target_http_error() {
    let server = common::serve(|_, _| (404, "{}".to_string()));
    let url = format!("{}/config/target", server.base_url);

    match set_target(&client(), &url, "red").await {
        Err(ControlError::Status(code)) => assert_eq!(code.as_u16(), 404),
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_set_sensitivity() {
    let server = common::serve(|_, req| {
        let sent: serde_json::Value = serde_json::from_str(&req.body).unwrap_or_default();
        let body = serde_json::json!({
            "success": true,
            "min_area": sent["min_area"],
            "min_circularity": sent["min_circularity"],
            "min_solidity": sent["min_solidity"],
        });
        (200, body.to_string())
    });
    let url = format!("{}/config/sensitivity", server.base_url);
    let cfg = SensitivityConfig {
        min_area: 2500,
        min_circularity: 0.65,
        min_solidity: 0.8,
    };

    let ack = set_sensitivity(&client(), &url, &cfg).await.unwrap();
    assert_eq!(ack, ControlAck::SensitivityApplied(cfg));
}

#[test]
fn test_client_round_trip_into_chat() {
    let server = common::serve(|_, _| {
        (
            200,
            r#"{"success":true,"current_target_color":"yellow","label":"yellow blob"}"#.to_string(),
        )
    });
    let config = DashboardConfig::default().with_api_url(&server.base_url);
    let control = ControlClient::spawn(&config);
    let mut chat = ChatLog::new();

    let request = chat.submit("yellow blob please", true).expect("request");
    assert!(control.send(request));

    let reply = control.rx.recv_timeout(Duration::from_secs(3)).expect("reply");
    assert_eq!(
        reply.request,
        ControlRequest::SetTarget {
            prompt: "yellow blob please".into()
        }
    );
    chat.apply_reply(&reply);
    let last = chat.messages().last().map(|m| m.text.clone()).unwrap();
    assert!(last.contains("Switched to yellow blob"));
}

#[test]
fn test_client_unreachable_backend() {
    let config = DashboardConfig {
        request_timeout: Duration::from_millis(500),
        ..DashboardConfig::default()
    }
    .with_api_url(&common::refused_url());
    let control = ControlClient::spawn(&config);
    let mut chat = ChatLog::new();

    assert!(control.send(ControlRequest::SetTarget {
        prompt: "red blob".into()
    }));
    let reply = control.rx.recv_timeout(Duration::from_secs(3)).expect("reply");
    assert!(matches!(reply.result, Err(ControlError::Transport(_))));

    chat.apply_reply(&reply);
    let last = chat.messages().last().map(|m| m.text.clone()).unwrap();
    assert!(last.contains("Could not connect to server"));
}
