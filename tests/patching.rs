use bdui_bindings as bb;
use bb::{Engine, PatchHook};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

#[test]
fn test_dotted_and_nested_patches_agree() {
    let ctx = json!({"a": {"x": 1}});
    let dotted = bb::apply_patch(&ctx, &json!({"a.b.c": 1}), None);
    let nested = bb::apply_patch(&ctx, &json!({"a": {"b": {"c": 1}}}), None);
    assert_eq!(dotted, nested);
    assert_eq!(dotted, json!({"a": {"x": 1, "b": {"c": 1}}}));
}

#[test]
fn test_nested_patch_merges_instead_of_replacing() {
    let ctx = json!({"user": {"name": "Ann", "age": 30}});
    let next = bb::apply_patch(&ctx, &json!({"user": {"age": 31}}), None);
    assert_eq!(next, json!({"user": {"name": "Ann", "age": 31}}));
}

#[test]
fn test_cart_totals_recomputed() {
    let ctx = json!({"data": {"cart": {"items": [{"price": 10}, {"price": 5}]}}});
    let next = bb::apply_patch(&ctx, &json!({"data.flag": true}), None);
    assert_eq!(next["data"]["order"], json!({"total": 15, "totalFormatted": "15 ₽"}));

    let ctx = json!({"data": {"cart": {"items": [{"price": 3000}, {"price": 1000}]}}});
    let next = bb::apply_patch(&ctx, &json!({}), None);
    assert_eq!(next["data"]["order"]["totalFormatted"], json!("4 000 ₽"));
}

#[test]
fn test_removing_cart_item_updates_total() {
    let ctx = json!({
        "data": {
            "cart": {"items": [{"price": 4990}, {"price": 15990}]},
            "order": {"total": 20980, "totalFormatted": "20 980 ₽"}
        }
    });
    let next = bb::apply_patch(&ctx, &json!({"data.cart.items": [{"price": 15990}]}), None);
    assert_eq!(next["data"]["order"], json!({"total": 15990, "totalFormatted": "15 990 ₽"}));
}

#[test]
fn test_input_is_not_mutated() {
    let ctx = json!({"a": {"b": 1}, "data": {"cart": {"items": [{"price": 2}]}}});
    let before = serde_json::to_string(&ctx).unwrap();
    let patch = json!({"a.b": 2, "a.c": {"reference": "${a.b}"}});
    let before_patch = patch.clone();
    let next = bb::apply_patch(&ctx, &patch, None);
    assert_eq!(serde_json::to_string(&ctx).unwrap(), before);
    assert_eq!(patch, before_patch);
    assert_eq!(next["a"], json!({"b": 2, "c": 1}));
}

#[test]
fn test_bindings_resolve_against_explicit_source() {
    let ctx = json!({"screen": "cart"});
    let source = json!({"event": {"target": "checkout"}});
    let patch = json!({"screen": {"reference": "${event.target}"}});
    let next = bb::apply_patch(&ctx, &patch, Some(&source));
    assert_eq!(next, json!({"screen": "checkout"}));
}

#[test]
fn test_unresolved_binding_deletes_field() {
    let ctx = json!({"keep": 1, "drop": 2});
    let next = bb::apply_patch(&ctx, &json!({"drop": {"reference": "${nothing.here}"}}), None);
    assert_eq!(next, json!({"keep": 1}));
}

#[test]
fn test_binding_fallback_used_in_patch() {
    let ctx = json!({});
    let next = bb::apply_patch(&ctx, &json!({"count": {"reference": "${missing}", "value": 0}}), None);
    assert_eq!(next, json!({"count": 0}));
}

#[test]
fn test_array_paths() {
    let ctx = json!({"list": [{"v": 1}, {"v": 2}]});
    let next = bb::apply_patch(&ctx, &json!({"list.1.v": 20, "list.3": "x"}), None);
    assert_eq!(next, json!({"list": [{"v": 1}, {"v": 20}, null, "x"]}));
}

#[test]
fn test_out_of_range_array_indices_are_skipped() {
    let ctx = json!({"items": [1, 2]});
    let patch = json!({
        "items.18446744073709551615": 7,
        "items.1000000000000": 1,
        "items.2": 3
    });
    assert_eq!(bb::apply_patch(&ctx, &patch, None), json!({"items": [1, 2, 3]}));
}

#[test]
fn test_deleting_a_key_keeps_sibling_order() {
    let ctx = json!({"a": 1, "b": 2, "c": 3});
    let next = bb::apply_patch(&ctx, &json!({"a": {"reference": "${gone}"}}), None);
    assert_eq!(serde_json::to_string(&next).unwrap(), r#"{"b":2,"c":3}"#);
}

#[test]
fn test_non_object_patch_is_ignored() {
    let ctx = json!({"a": 1});
    assert_eq!(bb::apply_patch(&ctx, &json!([1, 2]), None), ctx);
    assert_eq!(bb::apply_patch(&ctx, &Value::Null, None), ctx);
}

struct Stamp;

impl PatchHook for Stamp {
    fn name(&self) -> &'static str {
        "stamp"
    }

    fn apply(&self, context: &mut Value) -> bool {
        bb::path::set(context, "meta.patched", Some(json!(true)));
        true
    }
}

#[test]
fn test_custom_hooks() {
    let ctx = json!({"data": {"cart": {"items": [{"price": 1}]}}});
    let bare = Engine::default().without_hooks().with_hook(Stamp);
    let next = bare.apply_patch(&ctx, &json!({}), None);
    assert_eq!(next, json!({"data": {"cart": {"items": [{"price": 1}]}}, "meta": {"patched": true}}));

    let (_, trace) = Engine::default().with_hook(Stamp).apply_patch_traced(&ctx, &json!({}), None);
    let hooks: Vec<Value> = trace
        .iter()
        .map(|e| serde_json::to_value(e).unwrap()["hook"].clone())
        .collect();
    assert_eq!(hooks, vec![json!("cart_totals"), json!("stamp")]);
}
