use petstore_api::{ShipDatePolicy, config::load_config};

#[test]
fn environment_overrides_the_config_file() {
    // Setting environment variables is unsafe in Rust 2024; this is the only test in the binary.
    unsafe {
        std::env::set_var("PETSTORE_BASE_URI", "http://127.0.0.1:4010/v2");
        std::env::set_var("PETSTORE_SHIP_DATE__POLICY", "suffix_trim");
    }

    let config = load_config(None).expect("load config");

    unsafe {
        std::env::remove_var("PETSTORE_BASE_URI");
        std::env::remove_var("PETSTORE_SHIP_DATE__POLICY");
    }

    assert_eq!(config.base_uri, "http://127.0.0.1:4010/v2");
    assert_eq!(config.ship_date.policy, ShipDatePolicy::SuffixTrim);
    assert_eq!(
        config.request_spec().expect("request spec").url("/store/inventory"),
        "http://127.0.0.1:4010/v2/store/inventory"
    );
}
