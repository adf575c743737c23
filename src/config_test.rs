use super::*;
use std::collections::HashMap;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn empty_environment_yields_defaults() {
    let cfg = Config::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg, Config::default());
    assert_eq!(cfg.port, 3001);
    assert_eq!(cfg.undo_sync, UndoSync::Incremental);
    assert_eq!(cfg.background, "#f9f9f9");
    assert_eq!(cfg.allow_origin, AllowOrigin::Any);
}

#[test]
fn overrides_are_parsed() {
    let cfg = Config::from_lookup(lookup(&[
        ("HOST", "127.0.0.1"),
        ("PORT", "8080"),
        ("UNDO_SYNC", "Resync"),
        ("CANVAS_BACKGROUND", "#ffffff"),
        ("HUB_QUEUE_CAPACITY", "64"),
        ("CLIENT_QUEUE_CAPACITY", "8"),
        ("CORS_ALLOW_ORIGIN", "https://draw.example"),
    ]))
    .unwrap();

    assert_eq!(cfg.host, IpAddr::from([127, 0, 0, 1]));
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.undo_sync, UndoSync::Resync);
    assert_eq!(cfg.background, "#ffffff");
    assert_eq!(cfg.hub_queue_capacity, 64);
    assert_eq!(cfg.client_queue_capacity, 8);
    assert_eq!(cfg.allow_origin, AllowOrigin::Exact("https://draw.example".into()));
}

#[test]
fn blank_values_fall_back_to_defaults() {
    let cfg = Config::from_lookup(lookup(&[("PORT", "  "), ("UNDO_SYNC", "")])).unwrap();
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.undo_sync, UndoSync::Incremental);
}

#[test]
fn invalid_port_names_the_variable() {
    let err = Config::from_lookup(lookup(&[("PORT", "not-a-port")])).unwrap_err();
    let ConfigError::Invalid { var, value, .. } = &err;
    assert_eq!(*var, "PORT");
    assert_eq!(value, "not-a-port");
    assert!(err.to_string().contains("PORT"));
}

#[test]
fn invalid_undo_sync_is_rejected() {
    let err = Config::from_lookup(lookup(&[("UNDO_SYNC", "sometimes")])).unwrap_err();
    assert!(err.to_string().contains("incremental or resync"));
}

#[test]
fn zero_capacity_is_rejected() {
    let err = Config::from_lookup(lookup(&[("CLIENT_QUEUE_CAPACITY", "0")])).unwrap_err();
    let ConfigError::Invalid { var, .. } = err;
    assert_eq!(var, "CLIENT_QUEUE_CAPACITY");
}

#[test]
fn wildcard_origin_means_any() {
    let cfg = Config::from_lookup(lookup(&[("CORS_ALLOW_ORIGIN", " * ")])).unwrap();
    assert_eq!(cfg.allow_origin, AllowOrigin::Any);
}
