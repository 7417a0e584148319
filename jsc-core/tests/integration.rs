//! Integration Tests for the Composition Engine
//!
//! These tests verify that rendering, registration, event wiring and the
//! dispatch protocol work together correctly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use jsc_core::{
    get_prop, ComponentKind, DuplicateNamePolicy, Engine, EngineConfig, EngineError,
    JaseciComponent, Patch, PatchRecorder,
};

fn tree(json: Value) -> JaseciComponent {
    serde_json::from_value(json).expect("valid component tree")
}

/// An app with two named components carrying listener tables.
fn app_with(a_listeners: Value, b_listeners: Value) -> JaseciComponent {
    tree(json!({
        "component": "App",
        "props": {"name": "app"},
        "slots": {"children": [
            {"component": "Text", "props": {
                "name": "A",
                "value": "initial",
                "listeners": a_listeners
            }},
            {"component": "Button", "props": {"name": "B", "label": "Go", "listeners": b_listeners}}
        ]}
    }))
}

/// Test the Row/NavLink scenario: one child with visible text "Home".
#[test]
fn row_with_navlink_renders_label() {
    let mut engine = Engine::default();
    let root = engine
        .render_json(
            r#"{
                "component": "Row",
                "props": {},
                "slots": {"children": [{"component": "NavLink", "props": {"label": "Home"}}]}
            }"#,
        )
        .unwrap();

    let row = engine.element(root).unwrap();
    assert_eq!(row.kind(), ComponentKind::Row);
    assert_eq!(row.slot("children").len(), 1);

    let link = engine.element(row.slot("children")[0]).unwrap();
    assert_eq!(link.kind(), ComponentKind::NavLink);
    assert_eq!(link.text(), Some("Home"));
    assert_eq!(link.parent(), Some(root));
}

/// Test that slot children keep their input order.
#[test]
fn slot_order_is_preserved() {
    let labels = ["first", "second", "third", "fourth", "fifth"];
    let mut node = JaseciComponent::new("Column");
    for label in labels {
        node = node.with_child(
            "children",
            JaseciComponent::new("Chip").with_prop("label", json!(label)),
        );
    }
    node = node.with_child("footer", JaseciComponent::new("Divider"));

    let mut engine = Engine::default();
    let root = engine.render_and_mount(&node).unwrap();
    let column = engine.element(root).unwrap();

    let rendered: Vec<_> = column
        .slot("children")
        .iter()
        .map(|id| engine.element(*id).unwrap().text().unwrap().to_owned())
        .collect();
    assert_eq!(rendered, labels);
    assert_eq!(column.slot("footer").len(), 1);
    assert_eq!(column.slots().keys().collect::<Vec<_>>(), vec!["children", "footer"]);
}

/// Test that rendering the same tree twice yields equivalent, distinct trees.
#[test]
fn render_is_structurally_idempotent() {
    let node = app_with(json!({"notify": {"value": "Hi"}}), json!({}));
    let mut engine = Engine::default();

    let first = engine.render(&node).unwrap();
    let second = engine.render(&node).unwrap();

    assert_ne!(first, second);
    assert_eq!(engine.document().snapshot(first), engine.document().snapshot(second));
}

/// Test the attribute-write scenario: `A.notify` sets A's label.
#[test]
fn emit_applies_attribute_writes() {
    let recorder = PatchRecorder::new();
    let mut engine = Engine::default().with_host(recorder.clone());
    engine
        .render_and_mount(&app_with(json!({"notify": {"label": "Hi"}}), json!({})))
        .unwrap();
    recorder.drain();

    engine.emit("A.notify").unwrap();

    let a = engine.element_by_name("A").unwrap();
    assert_eq!(a.attribute("label"), Some(&json!("Hi")));
    let patches = recorder.patches();
    assert_eq!(
        patches,
        vec![Patch::SetAttribute {
            id: a.id(),
            name: "label".into(),
            value: json!("Hi")
        }]
    );
    assert!(!patches.iter().any(|p| matches!(p, Patch::InvokeMethod { .. })));
}

/// Test that attribute writes are applied in mapping order.
#[test]
fn attribute_writes_follow_mapping_order() {
    let recorder = PatchRecorder::new();
    let mut engine = Engine::default().with_host(recorder.clone());
    engine
        .render_and_mount(&app_with(
            json!({"update": {"zeta": 1, "alpha": 2, "value": "done", "beta": 3}}),
            json!({}),
        ))
        .unwrap();
    recorder.drain();

    engine.emit("A.update").unwrap();

    let names: Vec<String> = recorder
        .patches()
        .into_iter()
        .filter_map(|patch| match patch {
            Patch::SetAttribute { name, .. } => Some(name),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["zeta", "alpha", "value", "beta"]);
    assert_eq!(engine.element_by_name("A").unwrap().text(), Some("done"));
}

/// Test the method-call scenario: `B.go` invokes `B.refresh()` exactly once.
#[test]
fn emit_invokes_call_list() {
    let mut engine = Engine::default();
    engine
        .render_and_mount(&app_with(json!({}), json!({"go": {"$call": [{"method": "refresh"}]}})))
        .unwrap();
    let before = engine.element_by_name("B").unwrap().render_count();

    engine.emit("B.go").unwrap();

    assert_eq!(engine.element_by_name("B").unwrap().render_count(), before + 1);
}

/// Test that N `$call` entries invoke exactly N methods, in list order.
#[test]
fn call_list_runs_in_order() {
    let mut engine = Engine::default();
    engine
        .render_and_mount(&app_with(
            json!({}),
            json!({"go": {"$call": [
                {"method": "second"}, {"method": "first"}, {"method": "second"}, {"method": "third"}
            ]}}),
        ))
        .unwrap();

    let log = Arc::new(Mutex::new(Vec::new()));
    for method in ["first", "second", "third"] {
        let log = Arc::clone(&log);
        engine.define_method(ComponentKind::Button, method, move |_, _| {
            log.lock().unwrap().push(method);
            Ok(())
        });
    }

    engine.emit("B.go").unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["second", "first", "second", "third"]);
}

/// Test that `$call` and attribute writes interleave in key order.
#[test]
fn mixed_descriptor_interleaves_effects() {
    let mut engine = Engine::default();
    engine
        .render_and_mount(&app_with(
            json!({}),
            json!({"go": {"label": "Working", "$call": [{"method": "check"}], "variant": "busy"}}),
        ))
        .unwrap();

    let seen = Arc::new(Mutex::new(None));
    let observed = Arc::clone(&seen);
    engine.define_method(ComponentKind::Button, "check", move |engine, id| {
        let element = engine.element(id).expect("target is live");
        *observed.lock().unwrap() = Some((
            element.attribute("label").cloned(),
            element.attribute("variant").cloned(),
        ));
        Ok(())
    });

    engine.emit("B.go").unwrap();
    assert_eq!(*seen.lock().unwrap(), Some((Some(json!("Working")), None)));
    assert_eq!(engine.element_by_name("B").unwrap().attribute("variant"), Some(&json!("busy")));
}

/// Test the missing-target scenario: emitting to "Ghost" does nothing.
#[test]
fn emit_to_unmounted_component_is_noop() {
    let recorder = PatchRecorder::new();
    let mut engine = Engine::default().with_host(recorder.clone());
    engine
        .render_and_mount(&app_with(json!({"notify": {"label": "Hi"}}), json!({})))
        .unwrap();
    recorder.drain();
    let before = engine.document().snapshot(engine.get_component_by_name("app").unwrap());

    engine.emit("Ghost.anything").unwrap();
    engine.emit("Ghost").unwrap();

    assert!(recorder.is_empty());
    let after = engine.document().snapshot(engine.get_component_by_name("app").unwrap());
    assert_eq!(before, after);
}

/// Test that undeclared listeners and malformed tables apply nothing.
#[test]
fn missing_listener_or_malformed_table_is_noop() {
    let recorder = PatchRecorder::new();
    let mut engine = Engine::default().with_host(recorder.clone());
    engine
        .render_and_mount(&app_with(json!("{not json"), json!({"go": {"label": "x"}})))
        .unwrap();
    recorder.drain();

    engine.emit("A.notify").unwrap();
    engine.emit("B.unknown").unwrap();
    engine.emit("B").unwrap();

    assert!(recorder.is_empty());
}

/// Test that a `$call` naming a missing method surfaces an error.
#[test]
fn missing_method_propagates() {
    let mut engine = Engine::default();
    engine
        .render_and_mount(&app_with(
            json!({}),
            json!({"go": {"label": "Before", "$call": [{"method": "launch"}], "variant": "after"}}),
        ))
        .unwrap();

    let err = engine.emit("B.go").unwrap_err();
    assert!(matches!(
        err,
        EngineError::MethodNotFound { ref component, ref method }
            if component == "B" && method == "launch"
    ));

    // Effects before the failing call stay applied; later ones never run.
    let b = engine.element_by_name("B").unwrap();
    assert_eq!(b.attribute("label"), Some(&json!("Before")));
    assert_eq!(b.attribute("variant"), None);
}

/// Test that an empty component segment is looked up like any other name.
#[test]
fn empty_component_segment_is_a_lookup() {
    let mut engine = Engine::default();

    // Nothing is registered under "" yet, so these are no-ops.
    engine.emit(".go").unwrap();
    engine.emit("").unwrap();
    engine.emit(".").unwrap();

    engine
        .render_json(
            r#"{"component": "Text", "props": {
                "name": "",
                "value": "before",
                "listeners": {"go": {"value": "after"}}
            }}"#,
        )
        .unwrap();
    engine.emit(".go").unwrap();
    assert_eq!(engine.element_by_name("").unwrap().text(), Some("after"));
}

/// Test that a malformed `$call` blocks every write of its listener.
#[test]
fn malformed_call_list_applies_nothing() {
    let recorder = PatchRecorder::new();
    let mut engine = Engine::default().with_host(recorder.clone());
    engine
        .render_and_mount(&app_with(
            json!({}),
            json!({"go": {"label": "Before", "$call": [{"name": "refresh"}], "variant": "after"}}),
        ))
        .unwrap();
    recorder.drain();

    let err = engine.emit("B.go").unwrap_err();
    assert!(matches!(err, EngineError::MalformedCallList { .. }));

    let b = engine.element_by_name("B").unwrap();
    assert_eq!(b.attribute("label"), Some(&json!("Go")));
    assert_eq!(b.attribute("variant"), None);
    assert!(recorder.is_empty());
}

/// Test that an unknown kind fails the render.
#[test]
fn unknown_kind_fails_render() {
    let mut engine = Engine::default();
    let err = engine
        .render_json(
            r#"{
                "component": "Row",
                "props": {},
                "slots": {"children": [{"component": "Hologram", "props": {}}]}
            }"#,
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownComponentKind(ref k) if k == "Hologram"));
    assert!(engine.document().is_empty());
}

/// Test the full chain: a click on one component updates another.
#[test]
fn native_event_drives_distant_component() {
    let mut engine = Engine::default();
    engine
        .render_json(
            r#"{
                "component": "App",
                "props": {"name": "app"},
                "slots": {
                    "header": [{"component": "Navbar", "props": {"name": "nav"}, "slots": {
                        "links": [{"component": "NavLink", "props": {
                            "name": "home",
                            "label": "Home",
                            "events": {"click": "title.home"}
                        }}]
                    }}],
                    "children": [{"component": "Container", "props": {}, "slots": {"children": [
                        {"component": "Text", "props": {"name": "title", "value": "Welcome",
                            "listeners": {"home": {"value": "Home page"}}}}
                    ]}}]
                }
            }"#,
        )
        .unwrap();

    engine.dispatch_event_by_name("home", "click").unwrap();
    assert_eq!(engine.element_by_name("title").unwrap().text(), Some("Home page"));

    // Events nobody bound are ignored.
    engine.dispatch_event_by_name("home", "dblclick").unwrap();
    engine.dispatch_event_by_name("nobody", "click").unwrap();
}

/// Test that the built-in `click` method fires the element's own bindings.
#[test]
fn programmatic_click_chains_dispatch() {
    let mut engine = Engine::default();
    engine
        .render_json(
            r#"{
                "component": "Column",
                "props": {"name": "col"},
                "slots": {"children": [
                    {"component": "Inputbox", "props": {"name": "query", "value": "rust",
                        "listeners": {"submit": {"$call": [{"method": "clear"}]}}}},
                    {"component": "Button", "props": {"name": "search", "label": "Search",
                        "events": {"click": "query.submit"},
                        "listeners": {"press": {"$call": [{"method": "click"}]}}}}
                ]}
            }"#,
        )
        .unwrap();

    engine.emit("search.press").unwrap();
    let query = engine.element_by_name("query").unwrap();
    assert_eq!(query.attribute("value"), Some(&json!("")));
}

/// Test that hidden state round-trips through the built-in methods.
#[test]
fn hide_and_show_methods() {
    let mut engine = Engine::default();
    engine
        .render_and_mount(&app_with(
            json!({"off": {"$call": [{"method": "hide"}]}, "on": {"$call": [{"method": "show"}]}}),
            json!({}),
        ))
        .unwrap();

    engine.emit("A.off").unwrap();
    assert_eq!(engine.element_by_name("A").unwrap().attribute("hidden"), Some(&json!(true)));
    engine.emit("A.on").unwrap();
    assert_eq!(engine.element_by_name("A").unwrap().attribute("hidden"), Some(&json!(false)));
}

/// Test that listeners written at runtime are picked up by later dispatches.
#[test]
fn listeners_can_be_rewritten_by_dispatch() {
    let mut engine = Engine::default();
    engine
        .render_and_mount(&app_with(
            json!({"arm": {"listeners": {"fire": {"value": "fired"}}}}),
            json!({}),
        ))
        .unwrap();

    engine.emit("A.fire").unwrap();
    assert_eq!(engine.element_by_name("A").unwrap().text(), Some("initial"));

    engine.emit("A.arm").unwrap();
    engine.emit("A.fire").unwrap();
    assert_eq!(engine.element_by_name("A").unwrap().text(), Some("fired"));
}

/// Test that re-render runs once per outermost dispatch.
#[test]
fn flush_runs_after_outermost_dispatch() {
    let mut engine = Engine::new(EngineConfig::default().with_auto_flush(false));
    engine
        .render_and_mount(&app_with(json!({"notify": {"value": "Hi"}}), json!({})))
        .unwrap();

    engine.emit("A.notify").unwrap();
    let a = engine.element_by_name("A").unwrap();
    assert!(a.is_dirty());
    assert_eq!(a.text(), Some("initial"));

    assert_eq!(engine.flush(), 1);
    assert_eq!(engine.element_by_name("A").unwrap().text(), Some("Hi"));
}

/// Test that a listener cycle is stopped by the depth limit.
#[test]
fn listener_cycle_hits_depth_limit() {
    let mut engine = Engine::new(EngineConfig::default().with_max_dispatch_depth(8));
    engine
        .render_and_mount(&app_with(
            json!({"ping": {"$call": [{"method": "echo"}]}}),
            json!({"ping": {"$call": [{"method": "echo"}]}}),
        ))
        .unwrap();

    let hops = Arc::new(AtomicUsize::new(0));
    let a_hops = Arc::clone(&hops);
    engine.define_method(ComponentKind::Text, "echo", move |engine, _| {
        a_hops.fetch_add(1, Ordering::SeqCst);
        engine.emit("B.ping")
    });
    let b_hops = Arc::clone(&hops);
    engine.define_method(ComponentKind::Button, "echo", move |engine, _| {
        b_hops.fetch_add(1, Ordering::SeqCst);
        engine.emit("A.ping")
    });

    let err = engine.emit("A.ping").unwrap_err();
    assert!(matches!(err, EngineError::DispatchDepthExceeded { limit: 8, .. }));
    assert_eq!(hops.load(Ordering::SeqCst), 8);

    // The engine is usable again afterwards.
    engine.define_method(ComponentKind::Text, "echo", |_, _| Ok(()));
    engine.emit("A.ping").unwrap();
}

/// Test that duplicate names resolve to the first in document order.
#[test]
fn duplicate_names_resolve_first_match() {
    let mut engine = Engine::default();
    engine
        .render_json(
            r#"{"component": "Row", "props": {}, "slots": {"children": [
                {"component": "Text", "props": {
                    "name": "dup", "value": "one", "listeners": {"set": {"value": "changed"}}
                }},
                {"component": "Text", "props": {
                    "name": "dup", "value": "two", "listeners": {"set": {"value": "changed"}}
                }}
            ]}}"#,
        )
        .unwrap();

    engine.emit("dup.set").unwrap();
    let all: Vec<_> = engine
        .registry()
        .resolve_all("dup")
        .iter()
        .map(|id| engine.element(*id).unwrap().text().unwrap().to_owned())
        .collect();
    assert_eq!(all, vec!["changed", "two"]);
}

/// Test that the operations table feeds mounted components.
#[test]
fn operations_are_attached_on_mount() {
    let table = Arc::new(jsc_core::OperationsTable::new());
    table.insert("B", json!({"walker": "save_profile", "snt": "urn:uuid:1"}));
    let mut engine = Engine::default().with_operations(table);
    engine.render_and_mount(&app_with(json!({}), json!({}))).unwrap();

    assert_eq!(
        engine.element_by_name("B").unwrap().operations(),
        Some(&json!({"walker": "save_profile", "snt": "urn:uuid:1"}))
    );
    assert_eq!(engine.element_by_name("A").unwrap().operations(), None);
}

/// Test that host patches follow render order: parent, props, then children.
#[test]
fn host_sees_bottom_up_construction() {
    let recorder = PatchRecorder::new();
    let mut engine = Engine::default().with_host(recorder.clone());
    let root = engine
        .render(&tree(json!({
            "component": "Row",
            "props": {"name": "r"},
            "slots": {"children": [{"component": "Chip", "props": {"label": "x"}}]}
        })))
        .unwrap();
    let chip = engine.element(root).unwrap().slot("children")[0];

    assert_eq!(
        recorder.patches(),
        vec![
            Patch::Create { id: root, kind: ComponentKind::Row, tag: "jsc-row".into() },
            Patch::SetAttribute { id: root, name: "name".into(), value: json!("r") },
            Patch::Create { id: chip, kind: ComponentKind::Chip, tag: "jsc-chip".into() },
            Patch::SetAttribute { id: chip, name: "label".into(), value: json!("x") },
            Patch::AppendToSlot { parent: root, slot: "children".into(), child: chip },
        ]
    );
}

/// Test that prop decoding never fails on arbitrary input.
#[test]
fn get_prop_is_total() {
    let inputs = [
        "",
        " ",
        "null",
        "nul",
        "{}",
        "[]",
        "\"s\"",
        "{\"a\":[1,2,{\"b\":null}]}",
        "\u{0}",
        "🦀",
    ];
    for raw in inputs {
        let value = get_prop(Some(raw), json!("fallback"));
        match serde_json::from_str::<Value>(raw) {
            Ok(parsed) => assert_eq!(value, parsed),
            Err(_) => assert_eq!(value, json!("fallback")),
        }
    }
    assert_eq!(get_prop(None, json!([])), json!([]));
}

/// Test that unnamed trees can be mounted repeatedly under the reject policy.
#[test]
fn reject_policy_only_covers_declared_names() {
    let config = EngineConfig::default().with_duplicate_names(DuplicateNamePolicy::Reject);
    let mut engine = Engine::new(config);
    let unnamed = tree(json!({
        "component": "Row",
        "props": {},
        "slots": {"children": [{"component": "Chip", "props": {"label": "x"}}]}
    }));

    engine.render_and_mount(&unnamed).unwrap();
    engine.render_and_mount(&unnamed).unwrap();
    assert_eq!(engine.document().len(), 4);
    assert!(engine.registry().is_empty());

    // Declared names are still checked.
    let named = JaseciComponent::new("Chip").with_prop("name", json!("tag"));
    engine.render_and_mount(&named).unwrap();
    let err = engine.render_and_mount(&named).unwrap_err();
    assert!(matches!(err, EngineError::DuplicateName(ref n) if n == "tag"));
}

/// Test that a zero depth limit refuses only nested dispatch.
#[test]
fn zero_depth_limit_keeps_top_level_dispatch() {
    let config = EngineConfig::from_json(r#"{"max_dispatch_depth": 0}"#).unwrap();
    let mut engine = Engine::new(config);
    engine
        .render_and_mount(&app_with(
            json!({"notify": {"label": "Hi"}}),
            json!({"go": {"$call": [{"method": "relay"}]}}),
        ))
        .unwrap();
    engine.define_method(ComponentKind::Button, "relay", |engine, _| engine.emit("A.notify"));

    engine.emit("Ghost.anything").unwrap();
    engine.emit("A.notify").unwrap();
    assert_eq!(engine.element_by_name("A").unwrap().attribute("label"), Some(&json!("Hi")));

    let err = engine.emit("B.go").unwrap_err();
    assert!(matches!(err, EngineError::DispatchDepthExceeded { limit: 0, .. }));
}
