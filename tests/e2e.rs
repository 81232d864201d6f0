use bdui_bindings as bb;
use bb::{Engine, IterationFrame};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn resolve_ref(reference: &str, ctx: &Value) -> Option<Value> {
    bb::resolve(&json!({ "reference": reference }), ctx, None, &[])
}

const PLURAL: &str = "${cart_response.total_items_count} ${cart_response.total_items_count === 1 ? 'товар' : (cart_response.total_items_count >= 2 && cart_response.total_items_count <= 4 ? 'товара' : 'товаров')}";

#[test]
fn test_plural_template() {
    for (count, expected) in [
        (0, "0 товаров"),
        (1, "1 товар"),
        (2, "2 товара"),
        (4, "4 товара"),
        (5, "5 товаров"),
        (11, "11 товаров"),
    ] {
        let ctx = json!({"cart_response": {"total_items_count": count}});
        let binding = json!({"reference": PLURAL, "value": ""});
        assert_eq!(bb::resolve(&binding, &ctx, None, &[]), Some(json!(expected)), "count = {count}");
    }
}

#[test]
fn test_zero_renders_in_template() {
    let out = resolve_ref("Удалить (${count})", &json!({"count": 0}));
    assert_eq!(out, Some(json!("Удалить (0)")));
}

#[test]
fn test_single_reference_keeps_native_type() {
    let ctx = json!({"count": 3, "flags": {"on": true}, "list": [1, 2]});
    assert_eq!(resolve_ref("${count}", &ctx), Some(json!(3)));
    assert_eq!(resolve_ref("${flags.on}", &ctx), Some(json!(true)));
    assert_eq!(resolve_ref("${list}", &ctx), Some(json!([1, 2])));
    assert_eq!(resolve_ref("Count: ${count}", &ctx), Some(json!("Count: 3")));
    assert_eq!(resolve_ref("${count}${count}", &ctx), Some(json!("33")));
}

#[test]
fn test_python_expressions_resolve() {
    let ctx = json!({
        "selected_items_count": 3,
        "store": {"name": "Pear Store", "rating": 4.8},
        "cartItem": {"advertisement_id": 5, "price": 4990, "title": "MagSafe Charger", "quantity": 2},
        "inactive_product_ids": [3, 5, 7],
        "cart_snapshot": {"summary": {"total_items": 3, "total": 120979}}
    });
    let cases = [
        ("${'Удалить (' + str(selected_items_count) + ')'}", "Удалить (3)"),
        ("${'⭐ ' + str(store.rating)}", "⭐ 4.8"),
        ("${cartItem.price + ' ₽'}", "4990 ₽"),
        ("${'0.5' if cartItem.advertisement_id in inactive_product_ids else '1.0'}", "0.5"),
        ("${'#8E8E93' if cartItem.advertisement_id in inactive_product_ids else '#000000'}", "#8E8E93"),
        ("${'Недоступен' if cartItem.advertisement_id in inactive_product_ids else ''}", "Недоступен"),
        ("${str(cart_snapshot.summary.total_items) + ' товара'}", "3 товара"),
        ("${str(cart_snapshot.summary.total) + ' ₽'}", "120979 ₽"),
        ("${'visible' if 999 in inactive_product_ids else 'hidden'}", "hidden"),
    ];
    for (reference, expected) in cases {
        assert_eq!(resolve_ref(reference, &ctx), Some(json!(expected)), "{reference}");
    }
}

#[test]
fn test_iteration_alias_shadows_context() {
    let ctx = json!({"title": "outside"});
    let stack = vec![IterationFrame::new("product", json!({"title": "X"})).at(0, 3)];
    let engine = Engine::default();

    let plain = engine.resolve(&json!({"reference": "${product.title}"}), &ctx, None, &stack);
    assert_eq!(plain, Some(json!("X")));

    let expr = engine.resolve(&json!({"reference": "${product.title + '!'}"}), &ctx, None, &stack);
    assert_eq!(expr, Some(json!("X!")));

    let index = engine.resolve(&json!({"reference": "${productIndex}"}), &ctx, None, &stack);
    assert_eq!(index, Some(json!(0)));

    let total = engine.resolve(&json!({"reference": "${productTotal}"}), &ctx, None, &stack);
    assert_eq!(total, Some(json!(3)));
}

#[test]
fn test_iteration_template_sees_frames() {
    let stack = vec![
        IterationFrame::new("category", json!({"name": "Phones"})).at(1, 2),
        IterationFrame::new("product", json!({"title": "iPhone"})).at(0, 5),
    ];
    let out = Engine::default().resolve(
        &json!({"reference": "${category.name}: ${product.title} (${productIndex + 1}/${productTotal})"}),
        &json!({}),
        None,
        &stack,
    );
    assert_eq!(out, Some(json!("Phones: iPhone (1/5)")));
}

#[test]
fn test_missing_alias_field_falls_back_without_context_lookup() {
    let ctx = json!({"product": {"price": 100}});
    let stack = vec![IterationFrame::new("product", json!({"title": "X"}))];
    let binding = json!({"reference": "${product.price}", "value": 0});
    assert_eq!(Engine::default().resolve(&binding, &ctx, None, &stack), Some(json!(0)));
}

#[test]
fn test_default_item_shorthand() {
    let stack = vec![IterationFrame::new("", json!("current"))];
    let out = Engine::default().resolve(&json!({"reference": "${}"}), &json!({}), None, &stack);
    assert_eq!(out, Some(json!("current")));
}

#[test]
fn test_fallback_chain() {
    let ctx = json!({"a": 1});
    let fb = json!("caller");
    assert_eq!(bb::resolve(&json!({"reference": "missing", "value": "own"}), &ctx, Some(&fb), &[]), Some(json!("own")));
    assert_eq!(bb::resolve(&json!({"reference": "missing", "value": null}), &ctx, Some(&fb), &[]), Some(Value::Null));
    assert_eq!(bb::resolve(&json!({"reference": "missing"}), &ctx, Some(&fb), &[]), Some(fb.clone()));
    assert_eq!(bb::resolve(&json!({"reference": "missing"}), &ctx, None, &[]), None);
}

#[test]
fn test_structural_fallback_beats_empty_string() {
    let ctx = json!({"cart": {"items": ""}});
    let binding = json!({"reference": "${cart.items}", "value": []});
    assert_eq!(bb::resolve(&binding, &ctx, None, &[]), Some(json!([])));

    let scalar = json!({"reference": "${cart.items}", "value": "x"});
    assert_eq!(bb::resolve(&scalar, &ctx, None, &[]), Some(json!("")));

    let engine = Engine::with_config(bb::EngineConfig {
        prefer_structural_fallback: false,
        ..Default::default()
    });
    assert_eq!(engine.resolve(&binding, &ctx, None, &[]), Some(json!("")));
}

#[test]
fn test_sentinel_strings_stop_paths() {
    let ctx = json!({"user": "None", "flag": "false"});
    assert_eq!(resolve_ref("${user.name}", &ctx), None);
    assert_eq!(resolve_ref("${flag}", &ctx), Some(json!("false")));
}

#[test]
fn test_resolve_prop_and_typed_bindable() {
    let engine = Engine::default();
    let ctx = json!({"user": {"name": "Ann"}});
    let props = json!({"title": {"reference": "${user.name}"}, "size": 12});
    assert_eq!(engine.resolve_prop(&props, "title", &ctx, None, &[]), Some(json!("Ann")));
    assert_eq!(engine.resolve_prop(&props, "size", &ctx, None, &[]), Some(json!(12)));
    assert_eq!(engine.resolve_prop(&props, "absent", &ctx, Some(&json!(0)), &[]), Some(json!(0)));

    let typed: bb::Bindable = serde_json::from_value(json!({"reference": "user.name"})).unwrap();
    assert!(matches!(typed, bb::Bindable::Binding(_)));
    assert_eq!(engine.resolve_bindable(&typed, &ctx, None, &[]), Some(json!("Ann")));
}

#[test]
fn test_patch_resolves_against_previous_state() {
    let ctx = json!({
        "data": {"cart": {"items": [{"price": 3000}, {"price": 1000}]}},
        "form": {"draft": "hello"}
    });
    let patch = json!({
        "form.saved": {"reference": "${form.draft}"},
        "form": {"draft": ""}
    });
    let next = bb::apply_patch(&ctx, &patch, None);
    assert_eq!(next["form"], json!({"draft": "", "saved": "hello"}));
    assert_eq!(next["data"]["order"]["total"], json!(4000));
    assert_eq!(next["data"]["order"]["totalFormatted"], json!("4 000 ₽"));
}

#[test]
fn test_transpile_examples() {
    assert_eq!(
        bb::transpile("'Удалить (' + str(selected_items_count) + ')'"),
        "'Удалить (' + String(selected_items_count) + ')'"
    );
    assert_eq!(bb::transpile("len(items) > 0"), "(items).length > 0");
}
