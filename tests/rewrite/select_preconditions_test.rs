use rollup_rewrite::ast::{
    call, count, field, lit_bool, lit_int, lit_str, ArrayJoin, Expr, ExprExt, JoinKind, Select,
    TableSource,
};
use rollup_rewrite::mapping::ROLLUP_TABLE;
use rollup_rewrite::rewrite::{rewrite_query, RewriteSettings};

fn settings() -> RewriteSettings {
    RewriteSettings::new("UTC")
}

fn candidate() -> Select {
    Select::from_table("events")
        .with_select(vec![count()])
        .with_where(field("event").eq(lit_str("$pageview")))
}

fn assert_not_rewritten(select: Select) {
    let input = select.into_expr();
    assert_eq!(rewrite_query(&input, &settings()), input);
}

fn rewritten_select(expr: &Expr) -> &Select {
    match expr {
        Expr::Select(s) => s,
        _ => panic!("Expected Select expression"),
    }
}

#[test]
fn test_candidate_rewrites() {
    let out = rewrite_query(&candidate().into_expr(), &settings());
    assert_eq!(rewritten_select(&out).from.as_ref().unwrap().table, ROLLUP_TABLE);
}

#[test]
fn test_distinct_disqualifies() {
    assert_not_rewritten(candidate().with_distinct());
}

#[test]
fn test_prewhere_disqualifies() {
    assert_not_rewritten(candidate().with_prewhere(lit_bool(true)));
}

#[test]
fn test_limit_by_disqualifies() {
    let mut select = candidate();
    select.limit_by = vec![field("properties.$browser")];
    assert_not_rewritten(select);
}

#[test]
fn test_window_exprs_disqualify() {
    let mut select = candidate();
    select.window_exprs = vec![call("row_number", vec![])];
    assert_not_rewritten(select);
}

#[test]
fn test_array_join_disqualifies() {
    let mut select = candidate();
    select.array_join = Some(ArrayJoin {
        left: false,
        exprs: vec![field("properties.$active_feature_flags")],
    });
    assert_not_rewritten(select);
}

#[test]
fn test_view_reference_disqualifies() {
    let mut select = candidate();
    select.view_name = Some("web_overview".to_string());
    assert_not_rewritten(select);
}

#[test]
fn test_join_disqualifies() {
    assert_not_rewritten(candidate().join(
        JoinKind::Inner,
        TableSource::new("persons"),
        Some(field("person_id").eq(field("persons.id"))),
    ));
}

#[test]
fn test_other_source_table_disqualifies() {
    assert_not_rewritten(
        Select::from_table("sessions")
            .with_select(vec![count()])
            .with_where(field("event").eq(lit_str("$pageview"))),
    );
}

#[test]
fn test_missing_from_disqualifies() {
    let mut select = candidate();
    select.from = None;
    assert_not_rewritten(select);
}

#[test]
fn test_partial_sampling_disqualifies() {
    assert_not_rewritten(candidate().with_from(TableSource::new("events").with_sample(0.1)));
}

#[test]
fn test_full_sampling_is_allowed_and_dropped() {
    let query = candidate()
        .with_from(TableSource::new("events").with_sample(1.0))
        .into_expr();
    let out = rewrite_query(&query, &settings());
    let from = rewritten_select(&out).from.as_ref().unwrap();
    assert_eq!(from.table, ROLLUP_TABLE);
    assert_eq!(from.sample, None);
}

#[test]
fn test_disjunction_in_where_disqualifies() {
    assert_not_rewritten(candidate().with_where(Expr::Or(vec![
        field("event").eq(lit_str("$pageview")),
        field("event").eq(lit_str("$pageleave")),
    ])));

    // Call-form disjunction is the same thing.
    assert_not_rewritten(candidate().with_where(call(
        "or",
        vec![
            field("event").eq(lit_str("$pageview")),
            field("event").eq(lit_str("$pageleave")),
        ],
    )));
}

#[test]
fn test_zero_pageview_filters_disqualify() {
    assert_not_rewritten(
        Select::from_table("events")
            .with_select(vec![count()])
            .with_where(field("event").eq(lit_str("$autocapture"))),
    );

    let mut select = Select::from_table("events").with_select(vec![count()]);
    select.where_clause = None;
    assert_not_rewritten(select);
}

#[test]
fn test_two_pageview_filters_disqualify() {
    assert_not_rewritten(candidate().with_where(Expr::And(vec![
        field("event").eq(lit_str("$pageview")),
        lit_str("$pageview").eq(field("event")),
    ])));
}

#[test]
fn test_nested_conjunctions_are_flattened() {
    let where_clause = Expr::And(vec![
        call(
            "and",
            vec![
                field("event").eq(lit_str("$pageview")),
                field("properties.$browser").eq(lit_str("Chrome")),
            ],
        ),
        lit_bool(true),
        lit_int(1),
    ]);
    let query = candidate().with_where(where_clause).into_expr();
    let out = rewrite_query(&query, &settings());
    let select = rewritten_select(&out);
    assert_eq!(select.from.as_ref().unwrap().table, ROLLUP_TABLE);
    // Only the browser predicate remains; trivially-true constants and the
    // pageview filter are gone.
    assert_eq!(
        select.where_clause.as_ref().unwrap(),
        &call("equals", vec![field("browser"), lit_str("Chrome")])
    );
}

#[test]
fn test_untouched_clauses_are_preserved_verbatim() {
    let query = candidate()
        .with_group_by(vec![field("properties.$browser")])
        .with_having(call("greater", vec![field("pageviews"), lit_int(100)]))
        .order_by(field("pageviews"), true)
        .with_limit(50)
        .with_offset(10)
        .into_expr();

    let out = rewrite_query(&query, &settings());
    let select = rewritten_select(&out);
    assert_eq!(
        select.having.as_ref().unwrap(),
        &call("greater", vec![field("pageviews"), lit_int(100)])
    );
    assert_eq!(select.order_by.len(), 1);
    assert_eq!(select.order_by[0].expr, field("pageviews"));
    assert!(select.order_by[0].desc);
    assert_eq!(select.limit, Some(50));
    assert_eq!(select.offset, Some(10));
}

#[test]
fn test_alias_defined_in_select_list_is_valid_in_group_by() {
    let query = Select::from_table("events")
        .with_select(vec![count(), field("properties.utm_source").alias("u")])
        .with_where(field("event").eq(lit_str("$pageview")))
        .with_group_by(vec![field("u")])
        .into_expr();

    let out = rewrite_query(&query, &settings());
    let select = rewritten_select(&out);
    assert_eq!(select.from.as_ref().unwrap().table, ROLLUP_TABLE);
    assert_eq!(select.group_by[0], field("u"));
    match &select.select[1] {
        Expr::Alias { name, expr } => {
            assert_eq!(name, "u");
            assert_eq!(**expr, field("utm_source"));
        }
        other => panic!("Expected Alias expression, got {other:?}"),
    }
}

#[test]
fn test_unsupported_select_expression_disqualifies() {
    assert_not_rewritten(
        candidate().with_select(vec![count(), field("properties.$feature/test")]),
    );
}
