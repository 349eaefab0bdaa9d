mod common;

use common::{connect, order_partner_transport};
use rpcmodel::prelude::*;
use serde_json::json;

#[test]
fn end_to_end_nested_fetch() {
    let transport = order_partner_transport();
    transport.respond("order", "search", Value::from(vec![10_i64, 11]));
    transport.respond_json(
        "order",
        "read",
        json!([
            {"id": 10, "customer": [7, "Ada Inc"]},
            {"id": 11, "customer": 8},
        ]),
    );
    transport.respond_json(
        "partner",
        "read",
        json!([
            {"id": 7, "name": "Ada Inc"},
            {"id": 8, "name": "Turing Ltd"},
        ]),
    );

    let session = connect(transport);
    let orders = session
        .model("order")
        .expect("query")
        .filter(|o| {
            o.field("amount")?.gt(100);
            Ok(())
        })
        .expect("filter")
        .select(|o| Ok(vec![o.field("id")?, o.field("customer")?.field("name")?]))
        .expect("select")
        .take(10)
        .get()
        .expect("get");

    let transport = session.transport();
    let search = &transport.calls_for("order", "search")[0];
    assert_eq!(search.args[0], Value::from(json!([["amount", ">", 100]])));
    assert_eq!(search.kwargs.get("limit"), Some(&Value::Int(10)));

    let read = &transport.calls_for("order", "read")[0];
    assert_eq!(read.args[0], Value::from(vec![10_i64, 11]));
    assert_eq!(
        read.kwargs.get("fields"),
        Some(&Value::from(json!(["customer", "id"])))
    );

    let related = &transport.calls_for("partner", "read")[0];
    assert_eq!(related.args[0], Value::from(vec![7_i64, 8]));
    assert_eq!(
        related.kwargs.get("fields"),
        Some(&Value::from(json!(["name", "id"])))
    );

    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id(), Some(10));
    assert_eq!(
        orders[0]
            .record("customer")
            .and_then(|c| c.scalar("name"))
            .and_then(Value::as_str),
        Some("Ada Inc")
    );
    assert_eq!(orders[1].record("customer").and_then(Record::id), Some(8));
}

#[test]
fn records_follow_search_order_not_read_order() {
    let transport = order_partner_transport();
    transport.respond("order", "search", Value::from(vec![3_i64, 1, 2]));
    transport.respond_json(
        "order",
        "read",
        json!([
            {"id": 1, "amount": 1.0},
            {"id": 2, "amount": 2.0},
            {"id": 3, "amount": 3.0},
        ]),
    );

    let session = connect(transport);
    let orders = session
        .model("order")
        .expect("query")
        .select(|o| Ok(vec![o.field("amount")?]))
        .expect("select")
        .get()
        .expect("get");

    let ids: Vec<Option<i64>> = orders.iter().map(Record::id).collect();
    assert_eq!(ids, [Some(3), Some(1), Some(2)]);
}

#[test]
fn related_reads_are_batched_by_distinct_id() {
    let transport = order_partner_transport();
    transport.respond("order", "search", Value::from(vec![1_i64, 2, 3, 4]));
    transport.respond_json(
        "order",
        "read",
        json!([
            {"id": 1, "customer": 9},
            {"id": 2, "customer": 7},
            {"id": 3, "customer": 9},
            {"id": 4, "customer": 7},
        ]),
    );
    transport.respond_json(
        "partner",
        "read",
        json!([
            {"id": 7, "name": "Ada Inc"},
            {"id": 9, "name": "Turing Ltd"},
        ]),
    );

    let session = connect(transport);
    let orders = session
        .model("order")
        .expect("query")
        .select(|o| Ok(vec![o.field("customer")?.field("name")?]))
        .expect("select")
        .get()
        .expect("get");

    let transport = session.transport();
    assert_eq!(transport.call_count("partner", "read"), 1);
    let related = &transport.calls_for("partner", "read")[0];
    assert_eq!(related.args[0], Value::from(vec![7_i64, 9]));

    assert_eq!(orders.len(), 4);
    assert_eq!(
        orders[0]
            .record("customer")
            .and_then(|c| c.scalar("name"))
            .and_then(Value::as_str),
        Some("Turing Ltd")
    );
}

#[test]
fn hidden_related_id_degrades_to_an_empty_record() {
    let transport = order_partner_transport();
    transport.respond("order", "search", Value::from(vec![1_i64]));
    transport.respond_json("order", "read", json!([{"id": 1, "customer": 7}]));
    transport.respond_json("partner", "read", json!([]));

    let session = connect(transport);
    let orders = session
        .model("order")
        .expect("query")
        .select(|o| Ok(vec![o.field("customer")?.field("name")?]))
        .expect("select")
        .get()
        .expect("get");

    let customer = orders[0].record("customer").expect("customer record");
    assert!(customer.is_empty());
}

#[test]
fn absent_singular_relation_stays_a_raw_scalar() {
    let transport = order_partner_transport();
    transport.respond("order", "search", Value::from(vec![1_i64]));
    transport.respond_json("order", "read", json!([{"id": 1, "customer": false}]));

    let session = connect(transport);
    let orders = session
        .model("order")
        .expect("query")
        .select(|o| Ok(vec![o.field("customer")?.field("name")?]))
        .expect("select")
        .get()
        .expect("get");

    assert_eq!(orders[0].scalar("customer"), Some(&Value::Bool(false)));
    // No related ids were collected, so the related read never happens.
    assert_eq!(session.transport().call_count("partner", "read"), 0);
}

#[test]
fn plural_relations_splice_in_record_order() {
    let transport = order_partner_transport();
    transport.respond("order", "search", Value::from(vec![1_i64]));
    transport.respond_json("order", "read", json!([{"id": 1, "lines": [5, 4]}]));
    transport.respond_json(
        "order.line",
        "read",
        json!([
            {"id": 4, "qty": 2},
            {"id": 5, "qty": 9},
        ]),
    );

    let session = connect(transport);
    let orders = session
        .model("order")
        .expect("query")
        .select(|o| Ok(vec![o.field("lines")?.field("qty")?]))
        .expect("select")
        .get()
        .expect("get");

    // Distinct ids are read once, sorted; the splice keeps the order the
    // parent record listed them in.
    let related = &session.transport().calls_for("order.line", "read")[0];
    assert_eq!(related.args[0], Value::from(vec![4_i64, 5]));

    let lines = orders[0].records("lines").expect("lines");
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].scalar("qty"), Some(&Value::Int(9)));
    assert_eq!(lines[1].scalar("qty"), Some(&Value::Int(2)));
}

#[test]
fn empty_search_short_circuits() {
    let transport = order_partner_transport();
    transport.respond("order", "search", Value::List(vec![]));

    let session = connect(transport);
    let orders = session
        .model("order")
        .expect("query")
        .select(|o| Ok(vec![o.field("amount")?]))
        .expect("select")
        .get()
        .expect("get");

    assert!(orders.is_empty());
    assert_eq!(session.transport().call_count("order", "read"), 0);
}

#[test]
fn first_limits_to_one_row() {
    let transport = order_partner_transport();
    transport.respond("order", "search", Value::from(vec![5_i64]));
    transport.respond_json("order", "read", json!([{"id": 5, "state": "done"}]));

    let session = connect(transport);
    let first = session
        .model("order")
        .expect("query")
        .select(|o| Ok(vec![o.field("state")?]))
        .expect("select")
        .first()
        .expect("first")
        .expect("record");

    assert_eq!(first.id(), Some(5));
    let search = &session.transport().calls_for("order", "search")[0];
    assert_eq!(search.kwargs.get("limit"), Some(&Value::Int(1)));
}

#[test]
fn first_returns_none_on_no_match() {
    let transport = order_partner_transport();
    transport.respond("order", "search", Value::List(vec![]));

    let session = connect(transport);
    let first = session
        .model("order")
        .expect("query")
        .first()
        .expect("first");
    assert!(first.is_none());
}

#[test]
fn ordering_is_serialized_into_the_search_call() {
    let transport = order_partner_transport();
    transport.respond("order", "search", Value::List(vec![]));

    let session = connect(transport);
    session
        .model("order")
        .expect("query")
        .order_by(|o| Ok(vec![o.field("state")?]))
        .expect("order")
        .order_by_desc(|o| Ok(vec![o.field("amount")?]))
        .expect("order")
        .get()
        .expect("get");

    let search = &session.transport().calls_for("order", "search")[0];
    assert_eq!(
        search.kwargs.get("order"),
        Some(&Value::Text("state asc, amount desc".into()))
    );
}
