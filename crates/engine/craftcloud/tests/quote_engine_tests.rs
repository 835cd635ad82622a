//! Integration tests for the quote engine against a scripted marketplace

use craftcloud::{Currency, LengthUnit, QuoteConfig, QuoteEngine, QuoteError, QuoteRequest};
use printprompt_transport::testing::{Reply, ScriptedTransport};
use printprompt_transport::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const BASE: &str = "https://craftcloud.test/v5";
const MODEL_URL: &str = "https://assets.test/queen.obj";
const UPLOAD_URL: &str = "https://craftcloud.test/v5/model";
const PRICE_URL: &str = "https://craftcloud.test/v5/price";
const P1_URL: &str = "https://craftcloud.test/v5/price/p1";
const P2_URL: &str = "https://craftcloud.test/v5/price/p2";
const RESIN: &str = "8c77dbf9-21a8-5342-87c1-fd685ec5fdd8";

fn engine(transport: &Arc<ScriptedTransport>) -> QuoteEngine {
    QuoteEngine::new(QuoteConfig::new().with_base_url(BASE), transport.clone()).unwrap()
}

fn mesh() -> Vec<Reply> {
    vec![Reply::Bytes(b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n".to_vec())]
}

fn uploaded(model_id: &str) -> Reply {
    Reply::Json(json!([{"modelId": model_id, "fileName": "model.obj", "fileUnit": "mm"}]))
}

fn price_created(price_id: &str) -> Reply {
    Reply::Json(json!({"priceId": price_id}))
}

fn incomplete() -> Reply {
    Reply::Json(json!({
        "allComplete": false,
        "printingServiceComplete": {"V1": true, "V2": false},
        "quotes": [],
        "shippings": []
    }))
}

/// Two vendors: V2 is cheaper, both take 12 days in total
fn two_vendor_computation() -> Value {
    json!({
        "expiresAt": 1760000000,
        "allComplete": true,
        "printingServiceComplete": {"V1": true, "V2": true},
        "quotes": [
            {
                "quoteId": "q1", "vendorId": "V1", "modelId": "m1",
                "materialConfigId": RESIN, "price": 100, "quantity": 1,
                "currency": "EUR", "isPrintable": true,
                "productionTimeFast": 3, "productionTimeSlow": 5, "scale": 1
            },
            {
                "quoteId": "q2", "vendorId": "V2", "modelId": "m1",
                "materialConfigId": RESIN, "price": 80, "quantity": 1,
                "currency": "EUR", "isPrintable": true,
                "productionTimeFast": 6, "productionTimeSlow": 8, "scale": 1
            }
        ],
        "shippings": [
            {
                "shippingId": "s1", "vendorId": "V1", "name": "Standard",
                "deliveryTime": "3-7", "price": 20, "currency": "EUR", "type": "standard"
            },
            {
                "shippingId": "s2", "vendorId": "V2", "name": "Standard",
                "deliveryTime": "1-4", "price": 10, "currency": "EUR", "type": "standard"
            }
        ],
        "minimumProductionPrice": {}
    })
}

fn complete() -> Reply {
    Reply::Json(two_vendor_computation())
}

/// A marketplace that answers every step successfully on the first try
fn happy_marketplace() -> ScriptedTransport {
    ScriptedTransport::new()
        .on(Method::Get, MODEL_URL, mesh())
        .on(Method::Post, UPLOAD_URL, vec![uploaded("m1")])
        .on(Method::Post, PRICE_URL, vec![price_created("p1")])
        .on(Method::Get, P1_URL, vec![complete()])
}

fn request() -> QuoteRequest {
    QuoteRequest::new(MODEL_URL, "DE")
}

// =============================================================================
// Happy path
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_quote_selects_cheapest_and_fastest() {
    let transport = Arc::new(happy_marketplace());
    let engine = engine(&transport);

    let selection = engine.get_quote(&request()).await.unwrap();

    let cheapest = selection.cheapest.unwrap();
    assert_eq!(cheapest.quote.vendor_id, "V2");
    assert_eq!(cheapest.shipping.shipping_id, "s2");
    assert_eq!(cheapest.total_cost, 90.0);

    // Both pairs take 12 days; the first one seen wins
    let fastest = selection.fastest.unwrap();
    assert_eq!(fastest.total_time, 12.0);
    assert_eq!(fastest.quote.vendor_id, "V1");

    assert_eq!(transport.total_calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_default_request_body_and_upload_form() {
    let transport = Arc::new(happy_marketplace());
    engine(&transport).get_quote(&request()).await.unwrap();

    let calls = transport.calls();
    let methods: Vec<(Method, &str)> = calls.iter().map(|c| (c.method, c.url.as_str())).collect();
    assert_eq!(
        methods,
        vec![
            (Method::Get, MODEL_URL),
            (Method::Post, UPLOAD_URL),
            (Method::Post, PRICE_URL),
            (Method::Get, P1_URL),
        ]
    );

    let form = calls[1].form.clone().unwrap();
    assert_eq!(form.file_info("file"), Some(("model.obj", 32)));
    assert_eq!(form.text_value("unit"), Some("mm"));
    assert_eq!(form.text_value("refresh"), Some("false"));

    assert_eq!(
        calls[2].body,
        Some(json!({
            "currency": "EUR",
            "countryCode": "DE",
            "models": [{"modelId": "m1", "quantity": 1, "scale": 1.0}],
            "materialConfigIds": [RESIN]
        }))
    );
}

#[tokio::test(start_paused = true)]
async fn test_configured_upload_unit_is_sent() {
    let transport = Arc::new(happy_marketplace());
    let config = QuoteConfig::new()
        .with_base_url(BASE)
        .with_upload_unit(LengthUnit::Cm);
    let engine = QuoteEngine::new(config, transport.clone()).unwrap();

    engine.get_quote(&request()).await.unwrap();

    let form = transport.calls()[1].form.clone().unwrap();
    assert_eq!(form.text_value("unit"), Some("cm"));
}

#[tokio::test(start_paused = true)]
async fn test_explicit_request_options_are_sent() {
    let transport = Arc::new(happy_marketplace());
    let request = request()
        .with_currency(Currency::Usd)
        .with_scale(2.5)
        .with_quantity(3)
        .with_materials(vec!["pla-white".into(), "pla-black".into()]);

    engine(&transport).get_quote(&request).await.unwrap();

    assert_eq!(
        transport.calls()[2].body,
        Some(json!({
            "currency": "USD",
            "countryCode": "DE",
            "models": [{"modelId": "m1", "quantity": 3, "scale": 2.5}],
            "materialConfigIds": ["pla-white", "pla-black"]
        }))
    );
}

#[tokio::test(start_paused = true)]
async fn test_no_matching_shipping_is_not_an_error() {
    let mut computation = two_vendor_computation();
    computation["shippings"] = json!([{
        "shippingId": "s9", "vendorId": "V9", "deliveryTime": "1-2", "price": 1
    }]);
    let transport = Arc::new(
        ScriptedTransport::new()
            .on(Method::Get, MODEL_URL, mesh())
            .on(Method::Post, UPLOAD_URL, vec![uploaded("m1")])
            .on(Method::Post, PRICE_URL, vec![price_created("p1")])
            .on(Method::Get, P1_URL, vec![Reply::Json(computation)]),
    );

    let selection = engine(&transport).get_quote(&request()).await.unwrap();
    assert!(selection.cheapest.is_none());
    assert!(selection.fastest.is_none());
}

// =============================================================================
// Polling
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_incomplete_computation_waits_between_polls() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .on(Method::Get, MODEL_URL, mesh())
            .on(Method::Post, UPLOAD_URL, vec![uploaded("m1")])
            .on(Method::Post, PRICE_URL, vec![price_created("p1")])
            .on(Method::Get, P1_URL, vec![incomplete(), incomplete(), complete()]),
    );
    let start = Instant::now();

    let selection = engine(&transport).get_quote(&request()).await.unwrap();

    assert!(selection.cheapest.is_some());
    assert_eq!(transport.count(Method::Get, P1_URL), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_slow_poll_is_cut_off_and_counted() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .on(Method::Get, MODEL_URL, mesh())
            .on(Method::Post, UPLOAD_URL, vec![uploaded("m1")])
            .on(Method::Post, PRICE_URL, vec![price_created("p1")])
            .on(
                Method::Get,
                P1_URL,
                vec![Reply::delayed(Duration::from_secs(10), complete()), complete()],
            ),
    );
    let start = Instant::now();

    let selection = engine(&transport).get_quote(&request()).await.unwrap();

    assert!(selection.cheapest.is_some());
    assert_eq!(transport.count(Method::Get, P1_URL), 2);
    // The second poll starts right after the 5 s cut-off
    assert_eq!(start.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_poll_budget_exhaustion_in_every_attempt() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .on(Method::Get, MODEL_URL, mesh())
            .on(Method::Post, UPLOAD_URL, vec![uploaded("m1")])
            .on(Method::Post, PRICE_URL, vec![price_created("p1")])
            .on(Method::Get, P1_URL, vec![incomplete()]),
    );
    let start = Instant::now();

    let err = engine(&transport).get_quote(&request()).await.unwrap_err();

    assert_eq!(
        err,
        QuoteError::RetriesExhausted {
            attempts: 3,
            last_error: Some("Price calculation timed out after 5 attempts".to_string()),
        }
    );
    assert_eq!(transport.count(Method::Post, UPLOAD_URL), 3);
    assert_eq!(transport.count(Method::Post, PRICE_URL), 3);
    assert_eq!(transport.count(Method::Get, P1_URL), 15);
    // 3 x (4 poll intervals) + 2 retry delays
    assert_eq!(start.elapsed(), Duration::from_secs(16));
}

#[tokio::test(start_paused = true)]
async fn test_every_poll_timing_out_exhausts_retries() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .on(Method::Get, MODEL_URL, mesh())
            .on(Method::Post, UPLOAD_URL, vec![uploaded("m1")])
            .on(Method::Post, PRICE_URL, vec![price_created("p1")])
            .on(
                Method::Get,
                P1_URL,
                vec![Reply::delayed(Duration::from_secs(60), complete())],
            ),
    );
    let start = Instant::now();

    let err = engine(&transport).get_quote(&request()).await.unwrap_err();

    assert!(matches!(err, QuoteError::RetriesExhausted { attempts: 3, .. }));
    assert!(err.to_string().contains("Price calculation timed out"));
    assert_eq!(transport.count(Method::Get, P1_URL), 15);
    // 15 cut-offs of 5 s + 2 retry delays
    assert_eq!(start.elapsed(), Duration::from_secs(79));
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_poll_exhaustion_starts_from_scratch() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .on(Method::Get, MODEL_URL, mesh())
            .on(Method::Post, UPLOAD_URL, vec![uploaded("m1"), uploaded("m2")])
            .on(
                Method::Post,
                PRICE_URL,
                vec![price_created("p1"), price_created("p2")],
            )
            .on(Method::Get, P1_URL, vec![incomplete()])
            .on(Method::Get, P2_URL, vec![complete()]),
    );

    let selection = engine(&transport).get_quote(&request()).await.unwrap();
    assert!(selection.cheapest.is_some());

    assert_eq!(transport.count(Method::Get, MODEL_URL), 2);
    assert_eq!(transport.count(Method::Get, P1_URL), 5);
    assert_eq!(transport.count(Method::Get, P2_URL), 1);

    let price_bodies: Vec<Value> = transport
        .calls()
        .into_iter()
        .filter(|c| c.method == Method::Post && c.url == PRICE_URL)
        .filter_map(|c| c.body)
        .collect();
    assert_eq!(price_bodies[0]["models"][0]["modelId"], "m1");
    assert_eq!(price_bodies[1]["models"][0]["modelId"], "m2");
}

#[tokio::test(start_paused = true)]
async fn test_poll_http_error_restarts_pipeline() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .on(Method::Get, MODEL_URL, mesh())
            .on(Method::Post, UPLOAD_URL, vec![uploaded("m1")])
            .on(Method::Post, PRICE_URL, vec![price_created("p1")])
            .on(Method::Get, P1_URL, vec![Reply::status(500), complete()]),
    );

    let selection = engine(&transport).get_quote(&request()).await.unwrap();
    assert!(selection.fastest.is_some());
    assert_eq!(transport.count(Method::Post, UPLOAD_URL), 2);
    assert_eq!(transport.count(Method::Get, P1_URL), 2);
}

// =============================================================================
// Retries
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_upload_failing_twice_then_succeeding() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .on(Method::Get, MODEL_URL, mesh())
            .on(
                Method::Post,
                UPLOAD_URL,
                vec![Reply::status(503), Reply::status(503), uploaded("m1")],
            )
            .on(Method::Post, PRICE_URL, vec![price_created("p1")])
            .on(Method::Get, P1_URL, vec![complete()]),
    );
    let start = Instant::now();

    let selection = engine(&transport).get_quote(&request()).await.unwrap();

    assert_eq!(selection.cheapest.unwrap().total_cost, 90.0);
    assert_eq!(transport.count(Method::Get, MODEL_URL), 3);
    assert_eq!(transport.count(Method::Post, UPLOAD_URL), 3);
    assert_eq!(transport.count(Method::Post, PRICE_URL), 1);
    assert_eq!(start.elapsed(), Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_upload_always_failing_reports_last_error() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .on(Method::Get, MODEL_URL, mesh())
            .on(Method::Post, UPLOAD_URL, vec![Reply::status(502)]),
    );

    let err = engine(&transport).get_quote(&request()).await.unwrap_err();

    match &err {
        QuoteError::RetriesExhausted {
            attempts,
            last_error: Some(last),
        } => {
            assert_eq!(*attempts, 3);
            assert!(last.contains("502"), "{last}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(transport.count(Method::Post, UPLOAD_URL), 3);
    assert_eq!(transport.count(Method::Post, PRICE_URL), 0);
}

#[tokio::test]
async fn test_upload_rejection_keeps_status_code() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .on(Method::Get, MODEL_URL, mesh())
            .on(Method::Post, UPLOAD_URL, vec![Reply::status(502)]),
    );

    let err = engine(&transport).upload(MODEL_URL).await.unwrap_err();

    assert!(matches!(err, QuoteError::Upload { .. }), "{err:?}");
    assert_eq!(err.status_code(), Some(502));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_empty_upload_response_is_its_own_error() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .on(Method::Get, MODEL_URL, mesh())
            .on(Method::Post, UPLOAD_URL, vec![Reply::Json(json!([]))]),
    );

    let err = engine(&transport).upload(MODEL_URL).await.unwrap_err();

    assert_eq!(err, QuoteError::NoModelReturned);
    assert_eq!(err.status_code(), None);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_mesh_never_uploads() {
    let transport = Arc::new(ScriptedTransport::new());

    let err = engine(&transport).get_quote(&request()).await.unwrap_err();

    assert!(err.to_string().contains("Model upload failed"));
    assert_eq!(transport.count(Method::Get, MODEL_URL), 3);
    assert_eq!(transport.count(Method::Post, UPLOAD_URL), 0);
}

#[tokio::test(start_paused = true)]
async fn test_empty_upload_response_is_retried() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .on(Method::Get, MODEL_URL, mesh())
            .on(Method::Post, UPLOAD_URL, vec![Reply::Json(json!([])), uploaded("m1")])
            .on(Method::Post, PRICE_URL, vec![price_created("p1")])
            .on(Method::Get, P1_URL, vec![complete()]),
    );

    let selection = engine(&transport).get_quote(&request()).await.unwrap();
    assert!(!selection.is_empty());
    assert_eq!(transport.count(Method::Post, UPLOAD_URL), 2);
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_invalid_requests_make_no_calls() {
    let transport = Arc::new(happy_marketplace());
    let engine = engine(&transport);

    let invalid = [
        QuoteRequest::new(MODEL_URL, ""),
        QuoteRequest::new("", "DE"),
        request().with_scale(0.0),
        request().with_quantity(0),
        request().with_materials(vec![]),
    ];
    for request in &invalid {
        let err = engine.get_quote(request).await.unwrap_err();
        assert!(matches!(err, QuoteError::InvalidRequest(_)), "{err:?}");
    }
    assert_eq!(transport.total_calls(), 0);
}

#[test]
fn test_invalid_config_fails_at_construction() {
    let transport = Arc::new(ScriptedTransport::new());
    let result = QuoteEngine::new(
        QuoteConfig::new().with_base_url(BASE).with_default_materials(vec![]),
        transport,
    );
    assert!(matches!(result, Err(QuoteError::Config(_))));
}
