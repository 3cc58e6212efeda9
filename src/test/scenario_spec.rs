use crate::demo::DemoWorld;
use crate::scenario::{ScenarioError, ScenarioSpec};
use crate::sim::{SimDuration, SimTime, Simulator};

#[test]
fn scenario_defaults_fill_missing_sender_fields() {
    let spec = ScenarioSpec::from_json_str(r#"{ "schema_version": 1, "senders": [ {} ] }"#)
        .expect("parse");
    assert_eq!(spec.stop_time(), None);

    let opts = spec.sender_opts();
    assert_eq!(opts.len(), 1);
    assert_eq!(opts[0].name, "sender0");
    assert_eq!(opts[0].start, SimTime::from_secs(1));
    assert_eq!(opts[0].stop, SimTime::from_secs(10));
    assert_eq!(opts[0].interval, SimDuration::from_secs(1));
    assert_eq!(opts[0].max_packets, 0);
    assert_eq!(opts[0].pkt_bytes, 1024);
    assert_eq!(opts[0].latency, SimDuration::from_millis(2));
}

#[test]
fn scenario_fields_are_converted_to_sim_units() {
    let spec = ScenarioSpec::from_json_str(
        r#"
{
    "schema_version": 1,
    "stop_s": 3.5,
    "senders": [
        { "name": "a", "start_s": 0.25, "stop_s": 2.0, "interval_ms": 12.5,
          "max_packets": 7, "pkt_bytes": 64, "latency_us": 150 }
    ]
}
        "#,
    )
    .expect("parse");
    assert_eq!(spec.stop_time(), Some(SimTime::from_millis(3_500)));

    let o = &spec.sender_opts()[0];
    assert_eq!(o.name, "a");
    assert_eq!(o.start, SimTime::from_millis(250));
    assert_eq!(o.stop, SimTime::from_secs(2));
    assert_eq!(o.interval, SimDuration::from_micros(12_500));
    assert_eq!(o.max_packets, 7);
    assert_eq!(o.pkt_bytes, 64);
    assert_eq!(o.latency, SimDuration::from_micros(150));
}

#[test]
fn scenario_rejects_bad_input() {
    let err = ScenarioSpec::from_json_str(r#"{ "schema_version": 2 }"#).unwrap_err();
    assert!(matches!(err, ScenarioError::Invalid(_)));

    let err = ScenarioSpec::from_json_str(
        r#"{ "schema_version": 1, "senders": [ { "start_s": -1.0 } ] }"#,
    )
    .unwrap_err();
    assert!(matches!(err, ScenarioError::Invalid(_)));

    let err = ScenarioSpec::from_json_str(
        r#"{ "schema_version": 1, "senders": [ { "interval_ms": 0 } ] }"#,
    )
    .unwrap_err();
    assert!(matches!(err, ScenarioError::Invalid(_)));

    let err = ScenarioSpec::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, ScenarioError::Json(_)));

    let err = ScenarioSpec::from_path(std::path::Path::new("/nonexistent/scenario.json"))
        .unwrap_err();
    assert!(matches!(err, ScenarioError::Io { .. }));
}

#[test]
fn scenario_installs_senders_and_global_stop() {
    let spec = ScenarioSpec::from_json_str(
        r#"
{
    "schema_version": 1,
    "stop_s": 3.0,
    "senders": [
        { "name": "a", "start_s": 0.0, "interval_ms": 500 },
        { "name": "b", "start_s": 1.0, "max_packets": 1 }
    ]
}
        "#,
    )
    .expect("parse");

    let mut sim = Simulator::new();
    let mut world = DemoWorld::default();
    let apps = spec.install(&mut sim, &mut world).expect("install");
    assert_eq!(apps.len(), 2);

    sim.run(&mut world).expect("run");
    assert_eq!(sim.now(), SimTime::from_secs(3));

    let sent: Vec<u64> = world.apps().iter().map(|a| a.stats.sent_pkts).collect();
    // a: 0, 0.5, ..., 2.5（3.0 不执行）
    assert_eq!(sent, vec![6, 1]);
    assert_eq!(world.stats.delivered_pkts, 7);
}

#[test]
fn scenario_install_surfaces_scheduler_errors() {
    let spec = ScenarioSpec::from_json_str(
        r#"{ "schema_version": 1, "senders": [ { "start_s": 2.0, "stop_s": 1.0 } ] }"#,
    )
    .expect("parse");
    let mut sim = Simulator::new();
    let mut world = DemoWorld::default();
    let err = spec.install(&mut sim, &mut world).unwrap_err();
    assert!(matches!(err, ScenarioError::Sim(_)));
}
