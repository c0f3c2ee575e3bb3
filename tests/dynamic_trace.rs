/// Dynamic tracing verification: event-log replay, trace step grouping,
/// and the reconstructed flow for the sample programs.

use serde_json::json;

use varflow::domain::flowgraph::{node_id, EdgeStyle, FlowGraph};
use varflow::domain::index::FunctionIndex;
use varflow::domain::locate;
use varflow::domain::trace::FlowTracer;
use varflow::infrastructure::TraceLogReplayer;

const PIPELINE_SOURCE: &str = r#"
fn initialize() -> i64 {
    let value = 10;
    value
}

fn increment(value: i64) -> i64 {
    value + 1
}

fn double(value: i64) -> i64 {
    value * 2
}

fn display(value: i64) {
    println!("The current value is {}", value);
}
"#;

/// Event log a host runtime would emit while stepping the pipeline
/// program: one call event per activation, then its line events.
const PIPELINE_LOG: &str = r#"
{"event":"call","function":"initialize","line":2,"locals":{}}
{"event":"line","function":"initialize","line":3,"locals":{}}
{"event":"line","function":"initialize","line":4,"locals":{"value":10}}
{"event":"call","function":"increment","line":7,"locals":{"value":10}}
{"event":"line","function":"increment","line":8,"locals":{"value":11}}
{"event":"call","function":"double","line":11,"locals":{"value":11}}
{"event":"line","function":"double","line":12,"locals":{"value":22}}
{"event":"call","function":"display","line":15,"locals":{"value":22}}
{"event":"line","function":"display","line":16,"locals":{"value":22}}
"#;

fn pipeline_tracer() -> FlowTracer {
    let sources = vec![("pipeline.rs".to_string(), PIPELINE_SOURCE.to_string())];
    let declared = FunctionIndex::build(&sources).declared_names();
    FlowTracer::new("value", declared)
}

#[test]
fn pipeline_produces_one_step_per_activation_in_call_order() {
    let outcome = TraceLogReplayer::replay_str(PIPELINE_LOG, pipeline_tracer()).unwrap();
    assert!(outcome.error.is_none());

    let functions: Vec<&str> = outcome
        .steps
        .iter()
        .map(|s| s.function.as_str())
        .collect();
    assert_eq!(
        functions,
        vec!["initialize", "increment", "double", "display"]
    );

    let values: Vec<_> = outcome.steps.iter().map(|s| s.value.clone()).collect();
    assert_eq!(
        values,
        vec![
            Some(json!(10)),
            Some(json!(11)),
            Some(json!(22)),
            Some(json!(22))
        ]
    );
}

#[test]
fn replaying_the_same_log_twice_is_deterministic() {
    let first = TraceLogReplayer::replay_str(PIPELINE_LOG, pipeline_tracer()).unwrap();
    let second = TraceLogReplayer::replay_str(PIPELINE_LOG, pipeline_tracer()).unwrap();
    assert_eq!(first.steps, second.steps);
}

#[test]
fn line_groups_capture_contiguous_visits() {
    let outcome = TraceLogReplayer::replay_str(PIPELINE_LOG, pipeline_tracer()).unwrap();
    assert_eq!(outcome.steps[0].lines, vec![2, 3, 4]);
    assert_eq!(outcome.steps[1].lines, vec![7, 8]);
}

const PAYMENT_SOURCE: &str = r#"
fn check_payment_processor(payment_credential: &str) -> String {
    if payment_credential.split_whitespace().next() == Some("AMEX") {
        process_amex(payment_credential)
    } else {
        process_visa(payment_credential)
    }
}

fn process_amex(payment_credential: &str) -> String {
    format!("{}0", payment_credential)
}

fn process_visa(payment_credential: &str) -> String {
    format!("{}0", payment_credential)
}

fn initialize() -> String {
    let payment_credential = String::from("AMEX 100");
    payment_credential
}
"#;

const AMEX_LOG: &str = r#"
{"event":"call","function":"initialize","line":18,"locals":{}}
{"event":"line","function":"initialize","line":19,"locals":{}}
{"event":"line","function":"initialize","line":20,"locals":{"payment_credential":"AMEX 100"}}
{"event":"call","function":"check_payment_processor","line":2,"locals":{"payment_credential":"AMEX 100"}}
{"event":"line","function":"check_payment_processor","line":3,"locals":{"payment_credential":"AMEX 100"}}
{"event":"line","function":"check_payment_processor","line":4,"locals":{"payment_credential":"AMEX 100"}}
{"event":"call","function":"process_amex","line":10,"locals":{"payment_credential":"AMEX 100"}}
{"event":"line","function":"process_amex","line":11,"locals":{"payment_credential":"AMEX 100"}}
"#;

#[test]
fn amex_input_never_reaches_the_visa_branch() {
    let sources = vec![("payment.rs".to_string(), PAYMENT_SOURCE.to_string())];
    let declared = FunctionIndex::build(&sources).declared_names();
    let tracer = FlowTracer::new("payment_credential", declared);

    let outcome = TraceLogReplayer::replay_str(AMEX_LOG, tracer).unwrap();
    let functions: Vec<&str> = outcome
        .steps
        .iter()
        .map(|s| s.function.as_str())
        .collect();
    assert_eq!(
        functions,
        vec!["initialize", "check_payment_processor", "process_amex"]
    );
    assert!(!functions.contains(&"process_visa"));
}

#[test]
fn untaken_branch_renders_as_a_potential_path() {
    let sources = vec![("payment.rs".to_string(), PAYMENT_SOURCE.to_string())];
    let declared = FunctionIndex::build(&sources).declared_names();
    let tracer = FlowTracer::new("payment_credential", declared);
    let outcome = TraceLogReplayer::replay_str(AMEX_LOG, tracer).unwrap();

    let graph = FlowGraph::from_trace(&outcome.steps, None)
        .with_potential_paths(&["process_visa".to_string()]);

    let potential = graph
        .nodes
        .iter()
        .find(|n| n.id == "process_visa@potential")
        .expect("untaken branch must appear as a node");
    assert_eq!(potential.label, "process_visa (potential)");

    let edge = graph
        .edges
        .iter()
        .find(|e| e.to == "process_visa@potential")
        .expect("potential node hangs off the last real node");
    assert_eq!(edge.style, EdgeStyle::Conditional);
    assert_eq!(edge.from, node_id("process_amex", &[10, 11]));
}

#[test]
fn gated_tracer_ignores_activations_before_first_binding() {
    let sources = vec![("payment.rs".to_string(), PAYMENT_SOURCE.to_string())];
    let declared = FunctionIndex::build(&sources).declared_names();
    let tracer = FlowTracer::gated("payment_credential", declared);

    let outcome = TraceLogReplayer::replay_str(AMEX_LOG, tracer).unwrap();
    // The first two initialize events carry no binding yet.
    assert_eq!(outcome.steps[0].function, "initialize");
    assert_eq!(outcome.steps[0].lines, vec![20]);
}

#[test]
fn traced_failure_surfaces_with_partial_flow() {
    let log = r#"
{"event":"call","function":"initialize","line":2,"locals":{}}
{"event":"line","function":"initialize","line":3,"locals":{"value":10}}
{"event":"error","message":"attempt to divide by zero"}
"#;
    let outcome = TraceLogReplayer::replay_str(log, pipeline_tracer()).unwrap();
    assert_eq!(outcome.steps.len(), 1, "flow up to the failure is preserved");
    let error = outcome.error.expect("the failure is reported, not swallowed");
    assert!(error.to_string().contains("divide by zero"));
}

#[test]
fn click_line_designates_the_current_node() {
    let outcome = TraceLogReplayer::replay_str(PIPELINE_LOG, pipeline_tracer()).unwrap();

    // Clicking line 8 lands inside increment's group, distance 0.
    let current = locate::closest_node_id(&outcome.steps, 8);
    assert_eq!(current.as_deref(), Some("increment@7.8"));

    let graph = FlowGraph::from_trace(&outcome.steps, current.as_deref());
    let labels: Vec<(&str, _)> = graph
        .nodes
        .iter()
        .map(|n| (n.function.as_str(), n.color))
        .collect();
    use varflow::domain::flowgraph::NodeColor;
    assert_eq!(
        labels,
        vec![
            ("initialize", NodeColor::Past),
            ("increment", NodeColor::Current),
            ("double", NodeColor::Future),
            ("display", NodeColor::Future),
        ]
    );
}
