use rollup_rewrite::ast::{
    count, field, lit_str, Cte, Expr, ExprExt, Select, SetOperation, TableSource,
};
use rollup_rewrite::mapping::{RAW_EVENTS_TABLE, ROLLUP_TABLE};
use rollup_rewrite::rewrite::{rewrite_query, RewriteSettings};

fn settings() -> RewriteSettings {
    RewriteSettings::new("UTC")
}

fn candidate() -> Select {
    Select::from_table("events")
        .with_select(vec![count()])
        .with_where(field("event").eq(lit_str("$pageview")))
}

fn non_candidate() -> Select {
    Select::from_table("events")
        .with_select(vec![count()])
        .with_where(field("event").eq(lit_str("$autocapture")))
}

fn source_table(expr: &Expr) -> &str {
    match expr {
        Expr::Select(s) => &s.from.as_ref().unwrap().table,
        _ => panic!("Expected Select expression"),
    }
}

#[test]
fn test_cte_independence() {
    let outer = Select::from_table("combined")
        .with_select(vec![field("good.pageviews")])
        .with_cte(Cte::new("good", candidate().into_expr()))
        .with_cte(Cte::new("bad", non_candidate().into_expr()))
        .into_expr();

    let out = rewrite_query(&outer, &settings());
    match &out {
        Expr::Select(select) => {
            assert_eq!(select.ctes[0].name, "good");
            assert_eq!(source_table(&select.ctes[0].body), ROLLUP_TABLE);
            assert_eq!(select.ctes[1].name, "bad");
            assert_eq!(source_table(&select.ctes[1].body), RAW_EVENTS_TABLE);
            // The outer select itself is untouched.
            assert_eq!(select.from, Some(TableSource::new("combined")));
            assert_eq!(select.select, vec![field("good.pageviews")]);
        }
        _ => panic!("Expected Select expression"),
    }
}

#[test]
fn test_union_branches_rewritten_independently() {
    let input = Expr::SetOperation(SetOperation::union_all(vec![
        candidate().into_expr(),
        non_candidate().into_expr(),
        candidate().into_expr(),
    ]));

    let out = rewrite_query(&input, &settings());
    match &out {
        Expr::SetOperation(set_op) => {
            assert_eq!(source_table(&set_op.branches[0]), ROLLUP_TABLE);
            assert_eq!(source_table(&set_op.branches[1]), RAW_EVENTS_TABLE);
            assert_eq!(source_table(&set_op.branches[2]), ROLLUP_TABLE);
        }
        _ => panic!("Expected SetOperation expression"),
    }
}

#[test]
fn test_nested_select_in_select_list() {
    // The outer select is ineligible (not the raw event table) but the
    // nested select in its SELECT list still gets rewritten.
    let outer = Select::from_table("other")
        .with_select(vec![candidate().into_expr().alias("pageviews")])
        .into_expr();

    let out = rewrite_query(&outer, &settings());
    match &out {
        Expr::Select(select) => {
            assert_eq!(select.from, Some(TableSource::new("other")));
            match &select.select[0] {
                Expr::Alias { expr, .. } => assert_eq!(source_table(expr), ROLLUP_TABLE),
                other => panic!("Expected Alias expression, got {other:?}"),
            }
        }
        _ => panic!("Expected Select expression"),
    }
}

#[test]
fn test_disabled_toggle_bypasses_engine() {
    let input = candidate().into_expr();
    let out = rewrite_query(&input, &settings().disabled());
    assert_eq!(out, input);
}

#[test]
fn test_missing_timezone_fails_gate() {
    let input = candidate().into_expr();
    assert_eq!(
        rewrite_query(&input, &RewriteSettings::without_timezone()),
        input
    );
}

#[test]
fn test_fractional_hour_timezone_fails_gate() {
    let input = candidate().into_expr();
    for tz in ["Asia/Kolkata", "Asia/Kathmandu"] {
        assert_eq!(
            rewrite_query(&input, &RewriteSettings::new(tz)),
            input,
            "{tz}"
        );
    }
}

#[test]
fn test_whole_hour_timezone_passes_gate() {
    let input = candidate().into_expr();
    for tz in ["UTC", "Europe/Berlin", "America/New_York"] {
        assert_eq!(
            source_table(&rewrite_query(&input, &RewriteSettings::new(tz))),
            ROLLUP_TABLE,
            "{tz}"
        );
    }
}

#[test]
fn test_unknown_timezone_fails_gate() {
    let input = candidate().into_expr();
    assert_eq!(
        rewrite_query(&input, &RewriteSettings::new("Mars/Olympus_Mons")),
        input
    );
}

#[test]
fn test_rewrite_is_deterministic() {
    let input = Expr::SetOperation(SetOperation::union_all(vec![
        candidate().into_expr(),
        non_candidate().into_expr(),
    ]));
    let first = rewrite_query(&input, &settings());
    let second = rewrite_query(&input, &settings());
    assert_eq!(first, second);
}

#[test]
fn test_non_select_nodes_pass_through() {
    let input = field("properties.$browser");
    assert_eq!(rewrite_query(&input, &settings()), input);
}
