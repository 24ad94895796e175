use std::{fs::OpenOptions, io::Write, path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::client::{StoreClient, StoreResponse};
use crate::config::SuiteConfig;
use crate::error::{AssertionFailure, SuiteError};
use crate::expect::{expect_eq, expect_message, expect_no_mismatches, expect_non_empty_object};
use crate::fixtures::{
    FIXTURE_ORDER_ID, MISSING_ORDER_ID, NEGATIVE_ORDER_ID, order_for_pet, order_for_pet_fields,
};
use crate::order::{Order, OrderEquivalence};
use crate::schema::SchemaValidator;
use crate::specs::{RequestSpec, ScenarioSpecs, response_spec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Positive,
    Negative,
}

/// What a scenario body gets to work with.
pub struct ScenarioContext<'a> {
    pub client: StoreClient,
    pub equivalence: &'a OrderEquivalence,
    pub inventory_schema: &'a SchemaValidator,
}

pub type ScenarioFn = fn(&ScenarioContext<'_>) -> Result<(), SuiteError>;

#[derive(Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub display_name: &'static str,
    pub tag: Tag,
    pub expected_status: u16,
    pub run: ScenarioFn,
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("expected_status", &self.expected_status)
            .finish_non_exhaustive()
    }
}

/// Every scenario seeds whatever order it needs, so the catalog runs in any order.
pub fn catalog() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "get_inventories",
            display_name: "Positive: Get Pet Inventories by Status",
            tag: Tag::Positive,
            expected_status: 200,
            run: get_inventories,
        },
        Scenario {
            name: "place_order",
            display_name: "Positive: Place an order for a pet",
            tag: Tag::Positive,
            expected_status: 200,
            run: place_order,
        },
        Scenario {
            name: "place_order_from_field_map",
            display_name: "Positive: Place an order for a pet from a field map",
            tag: Tag::Positive,
            expected_status: 200,
            run: place_order_from_field_map,
        },
        Scenario {
            name: "place_invalid_order",
            display_name: "Negative: Place an invalid order for a pet",
            tag: Tag::Negative,
            expected_status: 400,
            run: place_invalid_order,
        },
        Scenario {
            name: "find_order_by_id",
            display_name: "Positive: Find Purchase Order by ID",
            tag: Tag::Positive,
            expected_status: 200,
            run: find_order_by_id,
        },
        Scenario {
            name: "find_order_by_invalid_id",
            display_name: "Negative: Find Non-existing Purchase Order by ID",
            tag: Tag::Negative,
            expected_status: 404,
            run: find_order_by_invalid_id,
        },
        Scenario {
            name: "find_order_by_empty_id",
            display_name: "Negative: Find Purchase Order by an empty ID",
            tag: Tag::Negative,
            expected_status: 400,
            run: find_order_by_empty_id,
        },
        Scenario {
            name: "delete_order_by_id",
            display_name: "Positive: Delete Purchase Order by ID",
            tag: Tag::Positive,
            expected_status: 200,
            run: delete_order_by_id,
        },
        Scenario {
            name: "delete_non_existing_order",
            display_name: "Negative: Delete Non-existing Purchase Order by ID",
            tag: Tag::Negative,
            expected_status: 404,
            run: delete_non_existing_order,
        },
    ]
}

fn get_inventories(ctx: &ScenarioContext<'_>) -> Result<(), SuiteError> {
    let response = ctx.client.get_inventory(Some(ctx.inventory_schema))?;
    expect_non_empty_object(&response.body, "Expected non-empty inventory")?;
    Ok(())
}

fn place_order(ctx: &ScenarioContext<'_>) -> Result<(), SuiteError> {
    let order = order_for_pet();
    let response = ctx.client.place_order(&order)?;
    expect_same_order(ctx, &order, &response)
}

fn place_order_from_field_map(ctx: &ScenarioContext<'_>) -> Result<(), SuiteError> {
    let fields = order_for_pet_fields()?;
    let response = ctx.client.place_order(fields.clone())?;
    let returned = response.body.as_object().ok_or_else(|| AssertionFailure {
        message: "Expected an order object".into(),
        expected: "JSON object".into(),
        actual: response.body.to_string(),
    })?;
    let mismatches = ctx.equivalence.response_subset_of_request(&fields, returned)?;
    expect_no_mismatches(&mismatches, "Expected the response fields to match the request")?;
    Ok(())
}

fn place_invalid_order(ctx: &ScenarioContext<'_>) -> Result<(), SuiteError> {
    let response = ctx.client.place_order("")?;
    expect_message(&response, "No data", "Expected an error message")?;
    Ok(())
}

fn find_order_by_id(ctx: &ScenarioContext<'_>) -> Result<(), SuiteError> {
    let order = order_for_pet();
    ctx.client.place_order(&order)?;
    let response = ctx.client.find_order_by_id(FIXTURE_ORDER_ID)?;
    expect_same_order(ctx, &order, &response)
}

fn find_order_by_invalid_id(ctx: &ScenarioContext<'_>) -> Result<(), SuiteError> {
    let response = ctx.client.find_order_by_id(NEGATIVE_ORDER_ID)?;
    expect_message(&response, "Order not found", "Expected an error message")?;
    Ok(())
}

fn find_order_by_empty_id(ctx: &ScenarioContext<'_>) -> Result<(), SuiteError> {
    let response = ctx.client.find_order_by_id("")?;
    expect_message(&response, "Invalid ID Supplied", "Expected an error message")?;
    Ok(())
}

fn delete_order_by_id(ctx: &ScenarioContext<'_>) -> Result<(), SuiteError> {
    ctx.client.place_order(order_for_pet())?;
    let response = ctx.client.delete_order_by_id(FIXTURE_ORDER_ID)?;
    expect_eq(
        Some(FIXTURE_ORDER_ID),
        response.message_as_i64(),
        "Expected the same order ID",
    )?;
    Ok(())
}

fn delete_non_existing_order(ctx: &ScenarioContext<'_>) -> Result<(), SuiteError> {
    let response = ctx.client.delete_order_by_id(MISSING_ORDER_ID)?;
    expect_message(&response, "Order Not Found", "Expected an error message")?;
    Ok(())
}

fn expect_same_order(
    ctx: &ScenarioContext<'_>,
    submitted: &Order,
    response: &StoreResponse,
) -> Result<(), SuiteError> {
    let returned: Order = response.decode("order response")?;
    let mismatches = ctx.equivalence.mismatches(submitted, &returned)?;
    expect_no_mismatches(&mismatches, "Expected the same order")?;
    Ok(())
}

/// Selects scenarios by tag and/or name; an empty filter selects everything.
#[derive(Debug, Clone, Default)]
pub struct ScenarioFilter {
    pub tag: Option<Tag>,
    pub names: Vec<String>,
}

impl ScenarioFilter {
    pub fn matches(&self, scenario: &Scenario) -> bool {
        self.tag.is_none_or(|tag| scenario.tag == tag)
            && (self.names.is_empty() || self.names.iter().any(|name| name == scenario.name))
    }

    /// Requested names that no scenario in `scenarios` carries.
    pub fn unknown_names(&self, scenarios: &[Scenario]) -> Vec<&str> {
        self.names
            .iter()
            .filter(|name| !scenarios.iter().any(|scenario| scenario.name == name.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn select(&self, scenarios: &[Scenario]) -> Vec<Scenario> {
        scenarios
            .iter()
            .filter(|scenario| self.matches(scenario))
            .copied()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    Failed { category: String, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub display_name: String,
    pub tag: Tag,
    pub expected_status: u16,
    #[serde(flatten)]
    pub verdict: Verdict,
    pub duration_ms: u64,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SuiteReport {
    pub outcomes: Vec<ScenarioOutcome>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn outcome(&self, name: &str) -> Option<&ScenarioOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}

/// Runs scenarios one after another, each with its own specs and client.
pub struct ScenarioRunner {
    base: StoreClient,
    equivalence: OrderEquivalence,
    inventory_schema: SchemaValidator,
    observations: Option<PathBuf>,
}

impl ScenarioRunner {
    pub fn new(request: RequestSpec, equivalence: OrderEquivalence) -> Result<Self, SuiteError> {
        Ok(Self {
            base: StoreClient::new(ScenarioSpecs::new(request, response_spec(200))),
            equivalence,
            inventory_schema: SchemaValidator::inventory()?,
            observations: None,
        })
    }

    pub fn from_config(config: &SuiteConfig) -> Result<Self, SuiteError> {
        let mut runner = Self::new(config.request_spec()?, config.equivalence())?;
        runner.observations = config.observations.clone().map(PathBuf::from);
        Ok(runner)
    }

    /// Append one JSON line per outcome to `path`.
    pub fn with_observations(mut self, path: impl Into<PathBuf>) -> Self {
        self.observations = Some(path.into());
        self
    }

    pub fn run(&self, scenarios: &[Scenario]) -> SuiteReport {
        let mut report = SuiteReport::default();
        for scenario in scenarios {
            let outcome = self.run_one(scenario);
            if let Err(err) = self.record(&outcome) {
                warn!(error = %err, "failed to record scenario outcome");
            }
            report.outcomes.push(outcome);
        }
        info!(
            passed = report.passed(),
            failed = report.failed(),
            "scenario run finished"
        );
        report
    }

    fn run_one(&self, scenario: &Scenario) -> ScenarioOutcome {
        let specs = ScenarioSpecs::new(
            self.base.specs().request.clone(),
            response_spec(scenario.expected_status),
        );
        let ctx = ScenarioContext {
            client: self.base.with_specs(specs),
            equivalence: &self.equivalence,
            inventory_schema: &self.inventory_schema,
        };

        let started = Instant::now();
        let result = (scenario.run)(&ctx);
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let verdict = match result {
            Ok(()) => {
                info!(scenario = scenario.name, duration_ms, "scenario passed");
                Verdict::Passed
            }
            Err(err) => {
                warn!(
                    scenario = scenario.name,
                    category = err.category(),
                    error = %err,
                    "scenario failed"
                );
                Verdict::Failed {
                    category: err.category().to_string(),
                    message: err.to_string(),
                }
            }
        };

        ScenarioOutcome {
            name: scenario.name.to_string(),
            display_name: scenario.display_name.to_string(),
            tag: scenario.tag,
            expected_status: scenario.expected_status,
            verdict,
            duration_ms,
        }
    }

    fn record(&self, outcome: &ScenarioOutcome) -> Result<()> {
        let Some(path) = &self.observations else {
            return Ok(());
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let line: Value = json!({
            "scenario": outcome.name,
            "outcome": outcome,
        });
        writeln!(file, "{}", serde_json::to_string(&line)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}
