use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use serde_json::json;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};
use tokio_test::assert_ok;

use model_dashboard::{
    DashboardConfig, DashboardError, FetchOutcome, FormValue, ModelApi, Prediction,
    PredictionRequest, Session,
};

#[derive(Clone)]
struct Route {
    prefix: &'static str,
    status: u16,
    body: String,
    delay: Duration,
}

impl Route {
    fn ok(prefix: &'static str, body: serde_json::Value) -> Self {
        Self {
            prefix,
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    fn status(prefix: &'static str, status: u16) -> Self {
        Self {
            prefix,
            status,
            body: "{}".into(),
            delay: Duration::ZERO,
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Minimal HTTP/1.1 server answering canned JSON by request target prefix.
struct StubServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes = Arc::new(routes);
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = requests.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(respond(stream, routes.clone(), seen.clone()));
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    fn session(&self) -> Session {
        let config = DashboardConfig::new(&self.base_url).unwrap();
        Session::new(ModelApi::new(config))
    }

    /// Request heads received so far, lowercased.
    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn respond(mut stream: TcpStream, routes: Arc<Vec<Route>>, seen: Arc<Mutex<Vec<String>>>) {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];

    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&chunk[..n]),
        }
    }

    let head = String::from_utf8_lossy(&head).to_string();
    let target = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    seen.lock().unwrap().push(head.to_lowercase());

    let route = routes.iter().find(|r| target.starts_with(r.prefix)).cloned();
    let (status, body, delay) = match route {
        Some(r) => (r.status, r.body, r.delay),
        None => (404, "{}".to_string(), Duration::ZERO),
    };

    tokio::time::sleep(delay).await;

    let response = format!(
        "HTTP/1.1 {status} STUB\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

fn metadata_routes() -> Vec<Route> {
    vec![
        Route::ok(
            "/modelInfo",
            json!({
                "algorithm": ["gbm"],
                "nObs": [1200],
                "hyperParameters": [{ "n.trees": 500, "shrinkage": 0.01 }],
            }),
        ),
        Route::ok(
            "/inputFeatures",
            json!({
                "age": { "class": ["numeric"], "mean": [38.6] },
                "sex": { "class": ["factor"], "levels": ["male", "female"] },
                "note": { "class": ["character"] },
            }),
        ),
        Route::ok(
            "/trainResults",
            json!([
                { "Metric": "RMSE", "Value": 0.5 },
                { "Metric": "R2", "Value": 0.9 },
            ]),
        ),
    ]
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn submitted_prediction_is_displayed() {
    let server = StubServer::start(vec![Route::ok("/predict", json!([1]))]).await;
    let mut session = server.session();
    let scope = session.mount();

    let request: PredictionRequest = [
        ("age".to_string(), FormValue::Numeric(34.0)),
        ("sex".to_string(), FormValue::Categorical("male".into())),
    ]
    .into_iter()
    .collect();

    let outcome = assert_ok!(session.submit_request(request, &scope).await);
    assert!(outcome.is_delivered());

    assert_eq!(session.tick(), 1);
    assert_eq!(session.state().prediction, Some(Prediction(json!(1))));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("get /predict?age=34&sex=male "));
    assert!(requests[0].contains("accept: application/json"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn metadata_populates_every_slot() {
    let server = StubServer::start(metadata_routes()).await;
    let mut session = server.session();
    let scope = session.mount();

    let report = assert_ok!(session.load_metadata(&scope).await);
    assert!(report.model_info.is_delivered());
    assert!(report.input_features.is_delivered());
    assert!(report.train_results.is_delivered());
    assert_eq!(session.tick(), 3);

    let state = session.state();
    let info = state.model_info.as_ref().unwrap();
    assert_eq!(info.0.get("algorithm"), Some(&json!("gbm")));
    assert_eq!(info.0.get("nObs"), Some(&json!(1200)));
    assert!(info.0.get("hyperParameters").is_none());

    let params = state.hyper_parameters.as_ref().unwrap();
    assert_eq!(params.0.get("n.trees"), Some(&json!(500)));

    let results = state.train_results.as_ref().unwrap();
    assert_eq!(results.get("RMSE"), Some(0.5));
    assert_eq!(results.get("R2"), Some(0.9));

    let form = state.form.as_ref().unwrap();
    assert_eq!(form.get("age").unwrap().value, FormValue::Numeric(38.6));
    assert_eq!(
        form.get("sex").unwrap().value,
        FormValue::Categorical("male".into())
    );
    assert_eq!(form.get("note").unwrap().value, FormValue::Unset);
    assert_eq!(state.input_features.as_ref().unwrap().len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_endpoint_leaves_other_slots_intact() {
    let mut routes = metadata_routes();
    routes[0] = Route::status("/modelInfo", 500);
    let server = StubServer::start(routes).await;
    let mut session = server.session();
    let scope = session.mount();

    let report = assert_ok!(session.load_metadata(&scope).await);
    assert!(matches!(
        report.model_info,
        FetchOutcome::Failed(DashboardError::Http { status: 500, .. })
    ));
    assert_eq!(session.tick(), 2);

    let state = session.state();
    assert!(state.model_info.is_none());
    assert!(state.hyper_parameters.is_none());
    assert!(state.train_results.is_some());
    assert!(state.form.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_response_is_a_silent_no_op() {
    let mut routes = metadata_routes();
    routes[2] = Route::ok("/trainResults", json!({ "RMSE": 0.5 }));
    let server = StubServer::start(routes).await;
    let mut session = server.session();
    let scope = session.mount();

    let report = assert_ok!(session.load_metadata(&scope).await);
    assert!(matches!(
        report.train_results,
        FetchOutcome::Failed(DashboardError::Malformed { .. })
    ));
    session.tick();
    assert!(session.state().train_results.is_none());
    assert!(session.state().model_info.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_prediction_keeps_previous_one() {
    let server = StubServer::start(vec![
        Route::ok("/predict?ok=yes", json!([7])),
        Route::status("/predict", 503),
    ])
    .await;
    let mut session = server.session();
    let scope = session.mount();

    let good: PredictionRequest = [("ok".to_string(), FormValue::Categorical("yes".into()))]
        .into_iter()
        .collect();
    let outcome = assert_ok!(session.submit_request(good, &scope).await);
    assert!(outcome.is_delivered());
    session.tick();

    let bad: PredictionRequest = [("ok".to_string(), FormValue::Categorical("no".into()))]
        .into_iter()
        .collect();
    let outcome = assert_ok!(session.submit_request(bad, &scope).await);
    assert!(matches!(
        outcome,
        FetchOutcome::Failed(DashboardError::Http { status: 503, .. })
    ));
    assert_eq!(session.tick(), 0);
    assert_eq!(session.state().prediction, Some(Prediction(json!(7))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unmounted_view_discards_late_prediction() {
    let server = StubServer::start(vec![
        Route::ok("/predict", json!([5])).delayed(Duration::from_millis(300))
    ])
    .await;
    let mut session = server.session();
    let scope = session.mount();

    let handle = session.submit_request(PredictionRequest::default(), &scope);
    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(scope);

    let outcome = assert_ok!(handle.await);
    assert!(matches!(outcome, FetchOutcome::Cancelled));

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(session.tick(), 0);
    assert!(session.state().prediction.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn edited_form_is_what_gets_submitted() {
    let mut routes = metadata_routes();
    routes.push(Route::ok("/predict", json!(["yes"])));
    let server = StubServer::start(routes).await;
    let mut session = server.session();
    let scope = session.mount();

    assert_ok!(session.load_metadata(&scope).await);
    session.tick();

    let form = session.form_mut().unwrap();
    form.set_text("age", "40").unwrap();
    form.cycle_level("sex", 1).unwrap();

    let outcome = assert_ok!(session.submit(&scope).await);
    assert!(outcome.is_delivered());
    session.tick();
    assert_eq!(session.state().prediction, Some(Prediction(json!("yes"))));

    let predict = server
        .requests()
        .into_iter()
        .find(|r| r.starts_with("get /predict"))
        .unwrap();
    assert!(predict.starts_with("get /predict?age=40&sex=female "));
    assert!(!predict.contains("note="));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_server_is_a_transport_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = DashboardConfig::new(&format!("http://{addr}")).unwrap();
    let mut session = Session::new(ModelApi::new(config));
    let scope = session.mount();

    let report = assert_ok!(session.load_metadata(&scope).await);
    assert!(matches!(
        report.input_features,
        FetchOutcome::Failed(DashboardError::Transport { .. })
    ));
    assert_eq!(session.tick(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_endpoint_does_not_hold_back_the_others() {
    let mut routes = metadata_routes();
    routes[0] = routes[0].clone().delayed(Duration::from_millis(800));
    let server = StubServer::start(routes).await;
    let mut session = server.session();
    let scope = session.mount();

    let handle = session.load_metadata(&scope);
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(!handle.is_finished());
    assert_eq!(session.tick(), 2);
    assert!(session.state().form.is_some());
    assert!(session.state().train_results.is_some());
    assert!(session.state().model_info.is_none());

    let report = assert_ok!(handle.await);
    assert!(report.model_info.is_delivered());
    assert_eq!(session.tick(), 1);
    assert!(session.state().model_info.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn newer_submission_cancels_the_older_one() {
    let server = StubServer::start(vec![
        Route::ok("/predict?v=old", json!(["old"])).delayed(Duration::from_millis(400)),
        Route::ok("/predict?v=new", json!(["new"])),
    ])
    .await;
    let mut session = server.session();
    let scope = session.mount();

    let request = |v: &str| -> PredictionRequest {
        [("v".to_string(), FormValue::Categorical(v.into()))]
            .into_iter()
            .collect()
    };

    let old = scope.child();
    let old_handle = session.submit_request(request("old"), &old);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let new = scope.child();
    drop(old);
    let new_outcome = assert_ok!(session.submit_request(request("new"), &new).await);
    assert!(new_outcome.is_delivered());

    let old_outcome = assert_ok!(old_handle.await);
    assert!(matches!(old_outcome, FetchOutcome::Cancelled));

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(session.tick(), 1);
    assert_eq!(session.state().prediction, Some(Prediction(json!("new"))));
}
