use petstore_api::{ScenarioRunner, config::load_config, scenario::catalog};

#[test]
fn live_store_catalog() -> anyhow::Result<()> {
    if std::env::var_os("PETSTORE_LIVE").is_none() {
        eprintln!("skipping live_store_catalog: set PETSTORE_LIVE=1 to run against the service");
        return Ok(());
    }

    let config = load_config(None)?;
    let report = ScenarioRunner::from_config(&config)?.run(&catalog());
    for outcome in &report.outcomes {
        eprintln!("{} -> {:?}", outcome.name, outcome.verdict);
    }

    assert!(
        report.is_success(),
        "{} of {} scenarios failed against {}",
        report.failed(),
        report.outcomes.len(),
        config.base_uri
    );
    Ok(())
}
