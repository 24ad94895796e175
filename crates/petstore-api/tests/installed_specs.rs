use petstore_api::{
    ContentType, StoreClient, SuiteError,
    specs::{install, installed, request_spec, response_spec, uninstall},
};

#[test]
fn client_follows_the_installed_specs() {
    let mut server = mockito::Server::new();
    let _ok = server
        .mock("GET", "/store/inventory")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"available": 1}"#)
        .create();

    uninstall();
    assert!(matches!(
        StoreClient::from_installed(),
        Err(SuiteError::SpecsNotInstalled)
    ));

    let request = request_spec(server.url(), ContentType::Json).expect("request spec");
    install(request.clone(), response_spec(200));
    let client = StoreClient::from_installed().expect("installed client");
    let response = client.get_inventory(None).expect("inventory");
    assert_eq!(response.body["available"], 1);

    // The next install replaces the expectation for clients built afterwards.
    install(request, response_spec(404));
    let err = StoreClient::from_installed()
        .expect("installed client")
        .get_inventory(None)
        .expect_err("404 expected, 200 returned");
    assert_eq!(err.category(), "status");
    assert_eq!(client.specs().response.expected_status(), 200);

    uninstall();
    assert!(installed().is_none());
}
