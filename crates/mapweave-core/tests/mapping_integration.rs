//! End-to-end tests for compiled mappings
//!
//! These tests drive definitions through `MapTransform` in both directions,
//! covering the built-in transformers and the compile options.


use mapweave_core::{Error, MapTransform, Options, Props, RunOptions, ShorthandHook, Value};
use serde_json::json;
use std::sync::Arc;
use test_support::*;

#[test]
fn test_article_round_trip() {
    let mapping = mapping_with(article_definition(), article_options());

    let target = forward(&mapping, article_source());
    assert_eq!(
        target,
        json!([
            { "id": "a1", "title": "First", "author": "ann", "tags": ["news", "local"], "published": true },
            { "id": "a2", "title": "Second", "author": "bob", "tags": ["sport"], "published": false }
        ])
    );

    assert_eq!(reverse(&mapping, target), article_source());
}

#[test]
fn test_mapping_is_reusable() {
    let mapping = mapping(json!({ "name": "title" }));
    for title in ["a", "b", "c"] {
        assert_eq!(forward(&mapping, json!({ "title": title })), json!({ "name": title }));
    }
}

#[test]
fn test_reverse_into_existing_document() {
    let mapping = mapping(json!({ "title": "headline", "author": "meta.writer" }));
    let existing = json!({ "headline": "old", "meta": { "writer": "x", "edited": true }, "id": 7 });

    let options = RunOptions::reverse().with_target(Value::from(existing));
    let result = mapping
        .map_json(&json!({ "title": "new", "author": "ann" }), options)
        .unwrap();

    assert_eq!(
        result,
        json!({ "headline": "new", "meta": { "writer": "ann", "edited": true }, "id": 7 })
    );
}

#[test]
fn test_concat_gathers_and_splits() {
    let mapping = mapping(json!({ "all": { "$concat": ["a", "b"] } }));

    assert_eq!(
        forward(&mapping, json!({ "a": [1, 2], "b": 3 })),
        json!({ "all": [1, 2, 3] })
    );
    assert_eq!(
        reverse(&mapping, json!({ "all": [1, 2, 3] })),
        json!({ "a": [1, 2, 3], "b": [] })
    );
}

#[test]
fn test_concat_rev_swaps_directions() {
    let mapping = mapping(json!(["a", { "$concatRev": ["x", "y"] }]));

    assert_eq!(
        forward(&mapping, json!({ "a": [1, 2] })),
        json!({ "x": [1, 2], "y": [] })
    );
    assert_eq!(
        reverse(&mapping, json!({ "x": [1], "y": [2] })),
        json!({ "a": [1, 2] })
    );
}

#[test]
fn test_lookup_by_id() {
    let mapping = mapping(json!({
        "title": "headline",
        "author": ["authorId", { "$lookup": "^^.users[]", "path": "id" }]
    }));
    let source = json!({
        "headline": "H",
        "authorId": 2,
        "users": [{ "id": 1, "name": "ann" }, { "id": 2, "name": "bob" }]
    });

    assert_eq!(
        forward(&mapping, source),
        json!({ "title": "H", "author": { "id": 2, "name": "bob" } })
    );
    assert_eq!(
        reverse(&mapping, json!({ "title": "H", "author": { "id": 2, "name": "bob" } })),
        json!({ "headline": "H", "authorId": 2 })
    );
}

#[test]
fn test_lookup_several() {
    let mapping = mapping(json!(["ids", {
        "$transform": "lookup",
        "arrayPath": "^^.users[]",
        "propPath": "group",
        "matchSeveral": true
    }]));
    let source = json!({
        "ids": ["a"],
        "users": [{ "n": 1, "group": "a" }, { "n": 2, "group": "b" }, { "n": 3, "group": "a" }]
    });

    assert_eq!(
        forward(&mapping, source),
        json!([{ "n": 1, "group": "a" }, { "n": 3, "group": "a" }])
    );
}

#[test]
fn test_map_with_wildcard() {
    let mapping = mapping(json!({
        "status": ["state", {
            "$transform": "map",
            "dictionary": [["A", "active"], ["*", "unknown"]]
        }]
    }));

    assert_eq!(forward(&mapping, json!({ "state": "A" })), json!({ "status": "active" }));
    assert_eq!(forward(&mapping, json!({ "state": "Z" })), json!({ "status": "unknown" }));
    assert_eq!(reverse(&mapping, json!({ "status": "active" })), json!({ "state": "A" }));
}

#[test]
fn test_filter_keeps_matching_items() {
    let mapping = mapping(json!(["items[]", {
        "$filter": { "$transform": "compare", "path": "n", "operator": ">", "match": 1 }
    }]));

    assert_eq!(
        forward(&mapping, json!({ "items": [{ "n": 1 }, { "n": 2 }, { "n": 3 }] })),
        json!([{ "n": 2 }, { "n": 3 }])
    );
}

#[test]
fn test_merge_and_logic() {
    let mapping = mapping(json!({
        "combined": { "$merge": ["a", "b"] },
        "both": { "$and": ["x", "y"] },
        "either": { "$or": ["x", "y"] },
        "hidden": { "$not": "visible" }
    }));
    let source = json!({
        "a": { "p": 1 },
        "b": { "q": 2 },
        "x": true,
        "y": false,
        "visible": true
    });

    assert_eq!(
        forward(&mapping, source),
        json!({
            "combined": { "p": 1, "q": 2 },
            "both": false,
            "either": true,
            "hidden": false
        })
    );
}

#[test]
fn test_value_and_fixed() {
    let mapping = mapping(json!({
        "title": "headline",
        "kind": { "$value": "article" },
        "version": { "$fixed": 2 }
    }));

    assert_eq!(
        forward(&mapping, json!({ "headline": "H" })),
        json!({ "title": "H", "kind": "article", "version": 2 })
    );
    assert_eq!(
        reverse(&mapping, json!({ "title": "H", "kind": "article", "version": 2 })),
        json!({ "headline": "H" })
    );
}

#[test]
fn test_compare_matches_pattern() {
    let mapping = mapping(json!({
        "isMail": { "$transform": "compare", "path": "contact", "operator": "matches", "match": "^\\S+@\\S+$" }
    }));

    assert_eq!(forward(&mapping, json!({ "contact": "a@b.c" })), json!({ "isMail": true }));
    assert_eq!(forward(&mapping, json!({ "contact": "555 1234" })), json!({ "isMail": false }));
}

#[test]
fn test_direction_aliases() {
    let options = Options::default().with_direction_aliases(Some("to"), Some("from"));
    let mapping = mapping_with(
        json!({
            "title": "headline",
            "note": { "$value": "mapped", "$direction": "to" },
            "source": ["origin", { "$transform": "fixed", "value": "cms", "$direction": "from" }]
        }),
        options,
    );

    assert_eq!(
        forward(&mapping, json!({ "headline": "H" })),
        json!({ "title": "H", "note": "mapped" })
    );
    assert_eq!(
        reverse(&mapping, json!({ "title": "H" })),
        json!({ "headline": "H", "origin": "cms" })
    );
}

#[test]
fn test_custom_nonvalues_drive_alt() {
    let options = Options::default().with_nonvalues(vec![Value::Undefined, Value::Null, Value::from("")]);
    let mapping = mapping_with(json!({ "$alt": ["name", "title"] }), options);

    assert_eq!(forward(&mapping, json!({ "name": "", "title": "T" })), json!("T"));
    assert_eq!(forward(&mapping, json!({ "name": null, "title": "T" })), json!("T"));

    let strict = mapping_with(json!({ "$alt": ["name", "title"] }), Options::default());
    assert_eq!(forward(&strict, json!({ "name": "", "title": "T" })), json!(""));
}

#[test]
fn test_no_defaults_option() {
    let options = Options::default().with_no_defaults(true);
    let mapping = mapping_with(json!({ "a": "x", "list": "missing[]" }), options);
    let result = mapping.forward(Value::from(json!({}))).unwrap();
    assert_eq!(result.as_object().map(|members| members.len()), Some(0));
}

#[test]
fn test_shorthand_hook() {
    let hook: ShorthandHook = Arc::new(|props: &Props| {
        let path = props.get("$upper")?.clone();
        let mut expanded = serde_json::Map::new();
        expanded.insert("$transform".to_string(), json!("fixed"));
        expanded.insert("value".to_string(), json!(path.as_str()?.to_uppercase()));
        Some(expanded)
    });
    let mapping = mapping_with(json!({ "shout": { "$upper": "hey" } }), Options::default().with_shorthand(hook));

    assert_eq!(forward(&mapping, json!({})), json!({ "shout": "HEY" }));
}

#[test]
fn test_named_pipelines_are_compiled_on_demand() {
    let options = Options::default()
        .with_pipeline("user", json!({ "name": "fullName" }))
        .with_pipeline("unused", json!({ "$transform": "nowhere" }));
    let mapping = mapping_with(json!({ "owner": ["user", { "$apply": "user" }] }), options);

    assert_eq!(mapping.pipelines().len(), 1);
    assert_eq!(
        forward(&mapping, json!({ "user": { "fullName": "Ann" } })),
        json!({ "owner": { "name": "Ann" } })
    );
    assert_eq!(
        reverse(&mapping, json!({ "owner": { "name": "Ann" } })),
        json!({ "user": { "fullName": "Ann" } })
    );
}

#[test]
fn test_definition_errors() {
    let unknown = MapTransform::new(&json!({ "$transform": "nowhere" }), Options::default()).unwrap_err();
    assert!(matches!(unknown, Error::TransformerNotFound { ref name } if name == "nowhere"));

    let missing = MapTransform::new(&json!({ "$apply": "ghost" }), Options::default()).unwrap_err();
    assert!(matches!(missing, Error::PipelineNotFound { .. }));

    let filter = MapTransform::new(&json!({ "$filter": null }), Options::default()).unwrap_err();
    assert!(filter.is_definition_error());

    let lookup = MapTransform::new(&json!({ "$lookup": "users[]" }), Options::default()).unwrap_err();
    assert!(lookup.is_definition_error());

    let direction =
        MapTransform::new(&json!({ "$value": 1, "$direction": "sideways" }), Options::default()).unwrap_err();
    assert!(direction.to_string().contains("sideways"));
}
