//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every client
//! operation over real HTTP through `UreqTransport`, including token
//! acquisition and the one-shot refresh after a 401.

use clarifai_core::{
    ApiError, ClarifaiClient, ClientConfig, FeedbackForm, TagRequest, Transport, TransportError,
    UreqTransport, ValidationError,
};

/// Start the mock server on a random port and return its versioned base URL.
fn spawn_mock_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn config(api_root: &str) -> ClientConfig {
    ClientConfig::new(mock_server::CLIENT_ID, mock_server::CLIENT_SECRET).api_root(api_root)
}

#[test]
fn tagging_lifecycle() {
    let root = spawn_mock_server();
    let config = config(&root);
    let client = ClarifaiClient::from_config(&config);
    let transport = UreqTransport::new(&config);

    // Step 1: info; the transport fetches a token first.
    let info = client.info(&transport).unwrap();
    assert_eq!(info.status_code, "OK");
    assert_eq!(info.results.max_batch_size, 128);
    assert_eq!(info.results.default_model, "general-v1.3");
    assert!(transport.access_token().is_some());

    // Step 2: image tags come back in request order with local ids echoed.
    let request = TagRequest::new(["http://x/a.jpg", "http://x/b.jpg"])
        .local_ids(["x", "y"])
        .model("general");
    let tags = client.tag(&transport, &request).unwrap();
    assert!(tags.is_ok());
    assert_eq!(tags.meta.tag.model, "general");
    assert_eq!(tags.results.len(), 2);
    assert_eq!(tags.results[0].url, "http://x/a.jpg");
    assert_eq!(tags.results[0].local_id, "x");
    assert_eq!(tags.results[1].local_id, "y");
    assert_eq!(
        tags.results[0].docid.as_ref().unwrap().to_string(),
        "123456789012345678901234567890"
    );
    assert_eq!(tags.results[0].result.tag.classes.len(), 3);
    assert_eq!(tags.results[0].result.tag.probs.len(), 3);

    // Step 3: video tags decode as one list per segment.
    let video = client
        .video_tag(&transport, &TagRequest::new(["http://x/clip.mp4"]))
        .unwrap();
    let segments = &video.results[0].result.tag;
    assert_eq!(segments.classes, vec![vec!["train", "railway"], vec!["train"]]);
    assert_eq!(segments.probs[1].len(), 1);

    // Step 4: feedback by docid.
    let docid = tags.results[0].docid.as_ref().unwrap().to_string();
    let form = FeedbackForm::for_doc_ids([docid]).add_tags(["locomotive"]);
    let feedback = client.feedback(&transport, &form).unwrap();
    assert_eq!(feedback.status_code, "OK");

    // Step 5: invalid input never leaves the process.
    let err = client.tag(&transport, &TagRequest::default()).unwrap_err();
    assert!(matches!(err, ApiError::Validation(ValidationError::MissingUrls)));
}

#[test]
fn stale_token_is_refreshed_once() {
    let root = spawn_mock_server();
    let config = config(&root).access_token("stale");
    let client = ClarifaiClient::from_config(&config);
    let transport = UreqTransport::new(&config);

    let info = client.info(&transport).unwrap();
    assert_eq!(info.status_code, "OK");
    assert_ne!(transport.access_token().as_deref(), Some("stale"));
}

#[test]
fn wrong_credentials_fail_at_token_request() {
    let root = spawn_mock_server();
    let config = ClientConfig::new(mock_server::CLIENT_ID, "wrong").api_root(&root);
    let client = ClarifaiClient::from_config(&config);
    let transport = UreqTransport::new(&config);

    let err = client.info(&transport).unwrap_err();
    assert!(matches!(err, ApiError::Transport(TransportError::Token(_))));
}

#[test]
fn throttling_sets_and_clears_flag() {
    let root = spawn_mock_server();
    let config = config(&root);
    let client = ClarifaiClient::from_config(&config);
    let transport = UreqTransport::new(&config);

    let err = client
        .tag(&transport, &TagRequest::new([mock_server::THROTTLE_URL]))
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(TransportError::Throttled)));
    assert!(transport.is_throttled());

    client.info(&transport).unwrap();
    assert!(!transport.is_throttled());
}

#[test]
fn host_executed_request_parses_the_same() {
    let root = spawn_mock_server();
    let config = config(&root);
    let client = ClarifaiClient::from_config(&config);
    let transport = UreqTransport::new(&config);

    let req = client.build_tag(&TagRequest::new(["http://x/a.jpg"])).unwrap();
    let body = transport.send(&req).unwrap();
    let tags = client.parse_image_tag(&body).unwrap();
    assert_eq!(tags.results.len(), 1);
}
