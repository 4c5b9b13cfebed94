mod common;
use common::start_server;

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn le_serveur_repond_sur_test() {
    let (base, handle) = start_server().await;

    let res = reqwest::get(format!("{base}/test")).await.unwrap();
    assert!(res.status().is_success());
    let body = res.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["message"], "Server is running");

    handle.abort();
}
