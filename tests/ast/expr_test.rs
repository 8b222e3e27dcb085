use rollup_rewrite::ast::{
    call, count, count_distinct, field, lit_int, lit_str, uniq, CompareOp, Expr, ExprExt, Select,
    TableSource, Value,
};

#[test]
fn test_field_constructor_splits_segments() {
    match field("events.properties.$browser") {
        Expr::Field(f) => assert_eq!(f.chain, vec!["events", "properties", "$browser"]),
        _ => panic!("Expected Field expression"),
    }
}

#[test]
fn test_fluent_comparison_builders() {
    let expr = field("event").eq(lit_str("$pageview"));
    match expr {
        Expr::Compare { op, left, right } => {
            assert_eq!(op, CompareOp::Eq);
            assert_eq!(*left, field("event"));
            assert_eq!(*right, lit_str("$pageview"));
        }
        _ => panic!("Expected Compare expression"),
    }
}

#[test]
fn test_aggregate_constructors() {
    match count() {
        Expr::Call(c) => {
            assert_eq!(c.name, "count");
            assert!(c.args.is_empty());
            assert!(!c.distinct);
        }
        _ => panic!("Expected Call expression"),
    }

    match count_distinct(field("person_id")) {
        Expr::Call(c) => {
            assert_eq!(c.name, "count");
            assert!(c.distinct);
        }
        _ => panic!("Expected Call expression"),
    }

    match uniq(field("session.id")) {
        Expr::Call(c) => assert_eq!(c.name, "uniq"),
        _ => panic!("Expected Call expression"),
    }
}

#[test]
fn test_select_builder() {
    let select = Select::from_table("events")
        .with_select(vec![count()])
        .with_where(field("event").eq(lit_str("$pageview")))
        .with_group_by(vec![field("properties.$browser")])
        .with_limit(10);

    assert_eq!(select.from, Some(TableSource::new("events")));
    assert_eq!(select.select.len(), 1);
    assert!(select.where_clause.is_some());
    assert_eq!(select.limit, Some(10));
    assert!(!select.distinct);
}

#[test]
fn test_alias_builder() {
    match field("properties.utm_source").alias("u") {
        Expr::Alias { name, expr } => {
            assert_eq!(name, "u");
            assert_eq!(*expr, field("properties.utm_source"));
        }
        _ => panic!("Expected Alias expression"),
    }
}

#[test]
fn test_tree_serde_roundtrip() {
    let tree = Select::from_table("events")
        .with_select(vec![count(), field("properties.$browser").alias("b")])
        .with_where(field("event").eq(lit_str("$pageview")))
        .with_group_by(vec![field("b")])
        .with_limit(100)
        .into_expr();

    let json = serde_json::to_string(&tree).unwrap();
    let back: Expr = serde_json::from_str(&json).unwrap();
    assert_eq!(back, tree);
}

#[test]
fn test_value_variants_roundtrip() {
    let values = call(
        "tuple",
        vec![
            lit_str("x"),
            lit_int(42),
            Expr::Constant(Value::Float(0.5)),
            Expr::Constant(Value::Bool(true)),
            Expr::Constant(Value::Null),
        ],
    );
    let json = serde_json::to_string(&values).unwrap();
    let back: Expr = serde_json::from_str(&json).unwrap();
    assert_eq!(back, values);
}
