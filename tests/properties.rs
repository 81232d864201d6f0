use bdui_bindings as bb;
use proptest::prelude::*;
use serde_json::{Map, Value};

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(Value::from),
        "[a-z ]{0,6}".prop_map(Value::String),
    ]
}

fn object_of(inner: impl Strategy<Value = Value>) -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-c]{1,2}", inner, 0..4)
        .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>()))
}

/// Arbitrary JSON. Keys are too short to spell `reference`, so no value is
/// a binding descriptor.
fn tree() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            object_of(inner),
        ]
    })
}

/// Objects all the way down, so every path stays writable.
fn object_tree() -> impl Strategy<Value = Value> {
    object_of(leaf().prop_recursive(3, 24, 4, |inner| object_of(inner)))
}

fn dotted_path() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-c]{1,2}", 1..4)
}

proptest! {
    #[test]
    fn non_bindings_pass_through(value in tree(), ctx in tree(), fb in leaf()) {
        let out = bb::resolve(&value, &ctx, Some(&fb), &[]);
        let expected = if value.is_null() { fb.clone() } else { value.clone() };
        prop_assert_eq!(out, Some(expected));
    }

    #[test]
    fn set_then_get_round_trips(mut ctx in object_tree(), segments in dotted_path(), x in tree()) {
        let path = segments.join(".");
        bb::path::set(&mut ctx, &path, Some(x.clone()));
        prop_assert_eq!(bb::path::get(&ctx, &path).map(|v| v.into_owned()), Some(x));
    }

    #[test]
    fn dotted_and_nested_patches_match(ctx in object_tree(), segments in dotted_path(), x in leaf()) {
        let mut dotted = Map::new();
        dotted.insert(segments.join("."), x.clone());
        let nested = segments
            .iter()
            .rev()
            .fold(x, |acc, key| {
                let mut map = Map::new();
                map.insert(key.clone(), acc);
                Value::Object(map)
            });
        prop_assert_eq!(
            bb::apply_patch(&ctx, &Value::Object(dotted), None),
            bb::apply_patch(&ctx, &nested, None)
        );
    }

    #[test]
    fn patching_leaves_inputs_alone(ctx in tree(), patch in object_tree()) {
        let ctx_before = ctx.clone();
        let patch_before = patch.clone();
        let _ = bb::apply_patch(&ctx, &patch, None);
        prop_assert_eq!(ctx, ctx_before);
        prop_assert_eq!(patch, patch_before);
    }
}
