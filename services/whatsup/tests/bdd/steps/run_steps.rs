//! BDD step definitions for endpoints, probes and runs

use cucumber::{given, then, when};

use whatsup::dispatcher::Dispatcher;
use whatsup::endpoint::EndpointSpec;
use whatsup::engine::{EndpointStatus, Engine};

use crate::world::{Scripted, WhatsupWorld};

#[given(expr = "an endpoint {string}")]
fn endpoint(world: &mut WhatsupWorld, url: String) {
    world.endpoints.push(EndpointSpec::new(url));
}

#[given(expr = "an endpoint {string} on port {string}")]
fn endpoint_with_port(world: &mut WhatsupWorld, url: String, port: String) {
    world.endpoints.push(EndpointSpec::new(url).with_port(port));
}

#[given(expr = "{string} responds with status {int}")]
fn responds_with(world: &mut WhatsupWorld, url: String, status: u16) {
    world
        .http
        .responses
        .lock()
        .unwrap()
        .insert(url, Scripted::Status(status));
}

#[given(expr = "{string} refuses connections")]
fn refuses_connections(world: &mut WhatsupWorld, url: String) {
    world
        .http
        .responses
        .lock()
        .unwrap()
        .insert(url, Scripted::Refused);
}

#[when("a run is executed")]
async fn run_executed(world: &mut WhatsupWorld) {
    let dispatcher = Dispatcher::new(&world.channels, world.http.clone());
    let engine = Engine::new(world.store.clone(), world.http.clone(), dispatcher);
    world.puts_before_run = world.store.put_count();
    world.summary = Some(engine.run_once(&world.endpoints).await);
}

#[then(expr = "the run reports {int} checked, {int} changed and {int} failed")]
fn run_reports(world: &mut WhatsupWorld, checked: usize, changed: usize, failed: usize) {
    let summary = world.summary.as_ref().expect("no run executed");
    assert_eq!(
        (summary.checked, summary.changed, summary.failed),
        (checked, changed, failed),
        "unexpected summary: {}",
        summary
    );
}

#[then(expr = "the endpoint {string} is marked as failed")]
fn endpoint_failed(world: &mut WhatsupWorld, url: String) {
    let summary = world.summary.as_ref().expect("no run executed");
    let outcome = summary
        .outcomes
        .iter()
        .find(|o| o.endpoint == url)
        .unwrap_or_else(|| panic!("no outcome for {}", url));
    assert!(
        matches!(outcome.status, EndpointStatus::Failed { .. }),
        "expected {} to fail, got {:?}",
        url,
        outcome.status
    );
}

#[then(expr = "the observation for {string} has no status and reason {string}")]
fn observation_without_status(world: &mut WhatsupWorld, url: String, reason: String) {
    let summary = world.summary.as_ref().expect("no run executed");
    let outcome = summary
        .outcomes
        .iter()
        .find(|o| o.endpoint == url)
        .unwrap_or_else(|| panic!("no outcome for {}", url));
    match &outcome.status {
        EndpointStatus::Changed { observation, .. }
        | EndpointStatus::Unchanged { observation } => {
            assert_eq!(observation.status_code, None);
            assert_eq!(observation.reason, reason);
        }
        other => panic!("expected an observation, got {:?}", other),
    }
}

#[then(expr = "{string} was probed")]
fn was_probed(world: &mut WhatsupWorld, url: String) {
    let summary = world.summary.as_ref().expect("no run executed");
    let probed = summary.outcomes.iter().any(|o| match &o.status {
        EndpointStatus::Changed { observation, .. }
        | EndpointStatus::Unchanged { observation } => observation.target == url,
        EndpointStatus::Failed { .. } => false,
    });
    assert!(probed, "{} was not probed", url);
}
