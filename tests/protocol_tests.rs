mod common;

use common::counter;
use durastate::object::PERSISTED_SET_KEY;
use durastate::{Durable, Request, Storage, Verb, dispatch};
use serde_json::json;

#[tokio::test]
async fn get_returns_value_from_memory() {
    let (mut counter, _storage) = counter();
    let response = dispatch(&mut counter, &Request::get("/get/counter")).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({ "value": 1 }));
}

#[tokio::test]
async fn get_unknown_property_is_not_found() {
    let (mut counter, _storage) = counter();
    let response = dispatch(&mut counter, &Request::get("/get/xyz")).await;
    assert_eq!(response.status, 404);
    assert_eq!(
        response.body,
        json!({ "errors": [{ "message": "Property xyz does not exist", "details": "" }] })
    );
}

#[tokio::test]
async fn get_method_is_rejected_with_a_call_hint() {
    let (mut counter, _storage) = counter();
    let response = dispatch(&mut counter, &Request::get("/get/increment")).await;
    assert_eq!(response.status, 400);
    assert_eq!(
        response.body,
        json!({ "errors": [{
            "message": "Cannot get method increment",
            "details": "Try POST /call/increment",
        }] })
    );
}

#[tokio::test]
async fn set_changes_value_persists_and_returns_it() {
    let (mut counter, storage) = counter();
    let response = dispatch(
        &mut counter,
        &Request::post("/set/counter", json!({ "value": 5 })),
    )
    .await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({ "value": 5 }));

    // Success implies the store already holds the value.
    assert_eq!(storage.get("counter").await.unwrap(), Some(json!(5)));
    assert!(counter.state().dirty().is_empty());
    assert_eq!(
        storage.get(PERSISTED_SET_KEY).await.unwrap(),
        Some(json!(["counter", "objectLikeProp"]))
    );
}

#[tokio::test]
async fn set_creates_new_properties() {
    let (mut counter, storage) = counter();
    let response = dispatch(
        &mut counter,
        &Request::post("/set/abc", json!({ "value": 99 })),
    )
    .await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({ "value": 99 }));
    assert_eq!(storage.get("abc").await.unwrap(), Some(json!(99)));

    let response = dispatch(&mut counter, &Request::get("/get/abc")).await;
    assert_eq!(response.body, json!({ "value": 99 }));
}

#[tokio::test]
async fn set_without_a_value_is_a_bad_request() {
    let (mut counter, _storage) = counter();
    let response = dispatch(
        &mut counter,
        &Request::post("/set/counter", json!({ "data": 5 })),
    )
    .await;
    assert_eq!(response.status, 400);
    assert_eq!(
        response.body,
        json!({ "errors": [{
            "message": "Unknown value",
            "details": "Request body should be: { \"value\": <new value> }",
        }] })
    );
}

#[tokio::test]
async fn set_method_is_rejected() {
    let (mut counter, _storage) = counter();
    let response = dispatch(
        &mut counter,
        &Request::post("/set/increment", json!({ "value": 5 })),
    )
    .await;
    assert_eq!(response.status, 404);
    assert_eq!(
        response.body,
        json!({ "errors": [{
            "message": "Cannot set method increment",
            "details": "Try POST /call/increment",
        }] })
    );
}

#[tokio::test]
async fn call_runs_methods_with_positional_args() {
    let (mut counter, _storage) = counter();
    let response = dispatch(
        &mut counter,
        &Request::post("/call/sayHello", json!({ "args": ["X"] })),
    )
    .await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({ "value": "Hello X!" }));
}

#[tokio::test]
async fn call_with_no_result_returns_null_and_flushes() {
    let (mut counter, storage) = counter();
    let response = dispatch(
        &mut counter,
        &Request::post("/call/increment", json!({ "args": [] })),
    )
    .await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({ "value": null }));
    assert_eq!(counter.state().get("counter"), Some(&json!(2)));
    assert_eq!(storage.get("counter").await.unwrap(), Some(json!(2)));
}

#[tokio::test]
async fn call_without_args_is_a_bad_request() {
    let (mut counter, _storage) = counter();
    let response = dispatch(
        &mut counter,
        &Request::post("/call/increment", json!({ "args": 3 })),
    )
    .await;
    assert_eq!(response.status, 400);
    assert_eq!(
        response.body,
        json!({ "errors": [{
            "message": "Unknown arguments",
            "details": "Request body should be: { \"args\": [<arg1>, <arg2>, ...] }",
        }] })
    );
}

#[tokio::test]
async fn call_on_a_property_is_rejected_with_a_get_hint() {
    let (mut counter, _storage) = counter();
    let response = dispatch(
        &mut counter,
        &Request::post("/call/counter", json!({ "args": [] })),
    )
    .await;
    assert_eq!(response.status, 404);
    assert_eq!(
        response.body,
        json!({ "errors": [{
            "message": "Cannot call property counter",
            "details": "Try GET /get/counter",
        }] })
    );
}

#[tokio::test]
async fn method_exceptions_become_server_errors() {
    let (mut counter, _storage) = counter();
    let response = dispatch(
        &mut counter,
        &Request::post("/call/throws", json!({ "args": [] })),
    )
    .await;
    assert_eq!(response.status, 500);
    assert_eq!(
        response.body,
        json!({ "errors": [{
            "message": "Problem while calling method",
            "details": "Mistake",
        }] })
    );
}

#[tokio::test]
async fn wrong_verb_reports_the_allowed_one() {
    let (mut counter, _storage) = counter();

    let response = dispatch(&mut counter, &Request::get("/set/counter")).await;
    assert_eq!(response.status, 405);
    assert_eq!(response.allow, Some(Verb::Post));
    assert_eq!(
        response.body,
        json!({ "errors": [{ "message": "Cannot GET /set", "details": "" }] })
    );

    let response = dispatch(
        &mut counter,
        &Request::post("/get/counter", json!({})),
    )
    .await;
    assert_eq!(response.status, 405);
    assert_eq!(response.allow, Some(Verb::Get));
}

#[tokio::test]
async fn unknown_and_malformed_routes_are_not_found() {
    let (mut counter, _storage) = counter();

    let response = dispatch(&mut counter, &Request::get("/teapot/counter")).await;
    assert_eq!(response.status, 404);
    assert_eq!(
        response.body,
        json!({ "errors": [{ "message": "Not found", "details": "" }] })
    );

    let response = dispatch(&mut counter, &Request::get("/get/counter/extra")).await;
    assert_eq!(response.status, 404);

    let response = dispatch(&mut counter, &Request::get("/get")).await;
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn dispatch_loads_persisted_values_first() {
    let storage = std::sync::Arc::new(durastate::MemoryStorage::new());
    storage.put("counter", json!(7)).await.unwrap();
    storage
        .put(PERSISTED_SET_KEY, json!(["counter"]))
        .await
        .unwrap();

    let mut revived = common::Counter::new(durastate::ObjectId::new_unique(), storage);
    let response = dispatch(&mut revived, &Request::get("/get/counter")).await;
    assert_eq!(response.body, json!({ "value": 7 }));
}
