//! End-to-end scenarios: builder, compiler and renderer together.

mod common;

use chrono::NaiveDate;
use common::{Customer, Department, Employee, Order, Status};
use dialectic_core::builder::{col, SqlValue};
use dialectic_core::dialect::{DialectKind, DUCKDB, MYSQL, POSTGRES, SQLITE, SQLSERVER};
use dialectic_core::render::{render, Renderer};
use dialectic_core::sanitize::ValueMode;
use dialectic_core::schema::Entity;
use dialectic_core::spec::{AggregateFunction, WindowFrame, WindowFunction};
use dialectic_core::{Error, Phase};
use pretty_assertions::assert_eq;

fn hired() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_nano_opt(10, 30, 45, 123_456_700)
        .unwrap()
}

// =============================================================================
// Scenario A: one parenthesized group
// =============================================================================

#[test]
fn test_scenario_a_parentheses() {
    let spec = Employee::query()
        .filter(
            col("age")
                .gt_eq(25)
                .and(col("first_name").eq("John").or(col("first_name").eq("Jane"))),
        )
        .unwrap()
        .select(&["id"])
        .unwrap()
        .build();
    let query = render(&spec, &SQLITE).unwrap();
    assert_eq!(
        query.sql(),
        "SELECT id FROM employees WHERE age >= ? AND (first_name = ? OR first_name = ?)"
    );
    assert_eq!(query.sql().matches('(').count(), 1);
    assert_eq!(
        query.params(),
        &[
            SqlValue::Int(25),
            SqlValue::Text(String::from("John")),
            SqlValue::Text(String::from("Jane")),
        ]
    );
}

// =============================================================================
// Scenario B: skip without take
// =============================================================================

#[test]
fn test_scenario_b_skip_without_take() {
    let spec = Employee::query()
        .select(&["id"])
        .unwrap()
        .skip(10)
        .unwrap()
        .build();
    let sql = |profile| render(&spec, profile).unwrap().sql().to_string();
    assert_eq!(sql(&SQLITE), "SELECT id FROM employees LIMIT -1 OFFSET 10");
    assert_eq!(sql(&POSTGRES), "SELECT id FROM employees LIMIT ALL OFFSET 10");
    assert_eq!(sql(&DUCKDB), "SELECT id FROM employees OFFSET 10");
    assert_eq!(
        sql(&SQLSERVER),
        "SELECT id FROM employees ORDER BY (SELECT NULL) OFFSET 10 ROWS"
    );
    assert_eq!(
        sql(&MYSQL),
        "SELECT id FROM employees LIMIT 18446744073709551615 OFFSET 10"
    );
}

#[test]
fn test_negative_pagination_is_a_build_error() {
    let err = Employee::query().skip(-1).unwrap_err();
    assert_eq!(
        err,
        Error::InvalidPagination {
            clause: "skip",
            value: -1
        }
    );
    assert_eq!(err.phase(), Phase::Build);
}

// =============================================================================
// Scenario C: seven fractional digits
// =============================================================================

#[test]
fn test_scenario_c_datetime_precision() {
    let spec = Employee::query()
        .filter(col("hired_at").eq(hired()))
        .unwrap()
        .select(&["id"])
        .unwrap()
        .build();
    let inline = Renderer::new(&SQLITE)
        .with_mode(ValueMode::Inline)
        .render(&spec)
        .unwrap();
    assert_eq!(
        inline.sql(),
        "SELECT id FROM employees WHERE hired_at = '2024-01-15 10:30:45.1234567'"
    );

    // The bound parameter has the same text as the literal.
    let bound = render(&spec, &SQLITE).unwrap();
    assert_eq!(
        bound.params(),
        &[SqlValue::Text(String::from("2024-01-15 10:30:45.1234567"))]
    );
}

#[test]
fn test_datetime_storage_matches_comparison() {
    let insert = Employee::insert()
        .set("hired_at", hired())
        .unwrap()
        .build()
        .unwrap();
    let stored = Renderer::new(&SQLITE).render_insert(&insert).unwrap();
    let compared = render(
        &Employee::query()
            .filter(col("hired_at").eq(hired()))
            .unwrap()
            .build(),
        &SQLITE,
    )
    .unwrap();
    assert_eq!(stored.params(), compared.params());
}

// =============================================================================
// Scenario D: IN list
// =============================================================================

#[test]
fn test_scenario_d_in_list() {
    let spec = Employee::query()
        .filter(col("first_name").in_list(["Eng", "Sales", "O'Brien"]))
        .unwrap()
        .select(&["id"])
        .unwrap()
        .build();
    let query = render(&spec, &POSTGRES).unwrap();
    assert_eq!(
        query.sql(),
        "SELECT id FROM employees WHERE first_name IN ($1, $2, $3)"
    );
    assert_eq!(query.params().len(), 3);

    let inline = Renderer::new(&POSTGRES)
        .with_mode(ValueMode::Inline)
        .render(&spec)
        .unwrap();
    assert_eq!(
        inline.sql(),
        "SELECT id FROM employees WHERE first_name IN ('Eng', 'Sales', 'O''Brien')"
    );
}

#[test]
fn test_in_list_threshold_is_pinned_at_one_hundred() {
    let at = Employee::query().filter(col("id").in_list(0..100_i64)).unwrap().build();
    assert_eq!(render(&at, &SQLITE).unwrap().params().len(), 100);

    let above = Employee::query().filter(col("id").in_list(0..101_i64)).unwrap().build();
    let query = render(&above, &SQLITE).unwrap();
    assert!(query.params().is_empty());
    assert!(query.sql().contains("IN (0, 1, 2,"));
}

// =============================================================================
// Scenario E: CTE source
// =============================================================================

#[test]
fn test_scenario_e_cte_source() {
    let spec = Employee::query()
        .with_cte("recent", "SELECT * FROM employees WHERE age < 30")
        .unwrap()
        .from_cte("recent")
        .unwrap()
        .filter(col("salary").gt(1000.0))
        .unwrap()
        .build();
    let query = render(&spec, &POSTGRES).unwrap();
    assert_eq!(
        query.sql(),
        "WITH recent AS (SELECT * FROM employees WHERE age < 30) SELECT * FROM recent \
         WHERE salary > $1"
    );
}

#[test]
fn test_recursive_cte() {
    let spec = Employee::query()
        .with_recursive_cte(
            "chain",
            &["id", "manager_id"],
            "SELECT id, manager_id FROM employees WHERE id = 1",
            "SELECT e.id, e.manager_id FROM employees e JOIN chain c ON e.manager_id = c.id",
        )
        .unwrap()
        .from_cte("chain")
        .unwrap()
        .build();
    assert!(render(&spec, &SQLITE)
        .unwrap()
        .sql()
        .starts_with("WITH RECURSIVE chain (id, manager_id) AS (SELECT id, manager_id"));
    assert!(render(&spec, &SQLSERVER)
        .unwrap()
        .sql()
        .starts_with("WITH chain (id, manager_id) AS ("));
}

// =============================================================================
// Enum consistency
// =============================================================================

#[test]
fn test_enum_storage_follows_column_flag() {
    let spec = Employee::query()
        .filter(
            col("department")
                .eq(Department::HumanResources)
                .and(col("status").eq(Status::OnLeave)),
        )
        .unwrap()
        .build();
    let query = render(&spec, &SQLITE).unwrap();
    assert_eq!(
        query.params(),
        &[SqlValue::Text(String::from("HR")), SqlValue::Int(1)]
    );

    let insert = Employee::insert()
        .set("department", Department::HumanResources)
        .unwrap()
        .set("status", Status::OnLeave)
        .unwrap()
        .build()
        .unwrap();
    let stored = Renderer::new(&SQLITE).render_insert(&insert).unwrap();
    assert_eq!(stored.params(), query.params());
}

#[test]
fn test_enum_dialect_default_can_be_integer() {
    let profile = SQLITE.with_enum_defaults_to_string(false);
    let spec = Employee::query()
        .filter(col("department").eq(Department::Sales))
        .unwrap()
        .build();
    assert_eq!(render(&spec, &profile).unwrap().params(), &[SqlValue::Int(2)]);
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_rendering_is_deterministic() {
    let spec = Employee::query()
        .filter(col("age").between(20, 40).and(col("first_name").contains("an")))
        .unwrap()
        .order_by("age")
        .unwrap()
        .then_by_desc("id")
        .unwrap()
        .skip(5)
        .unwrap()
        .take(10)
        .unwrap()
        .build();
    for kind in DialectKind::ALL {
        let first = render(&spec, kind.profile()).unwrap();
        let second = render(&spec, kind.profile()).unwrap();
        assert_eq!(first, second);
    }
}

// =============================================================================
// Joins, aggregates, windows, set operations
// =============================================================================

#[test]
fn test_include_qualifies_every_column() {
    let spec = Employee::query()
        .include("orders")
        .unwrap()
        .then_include("customer")
        .unwrap()
        .select(&["id", "orders.total", "customer.name"])
        .unwrap()
        .filter(col("orders.total").gt(100.0))
        .unwrap()
        .build();
    assert_eq!(
        render(&spec, &SQLITE).unwrap().sql(),
        "SELECT employees.id, orders.total, customer.name, orders.id AS orders_id, \
         orders.employee_id AS orders_employee_id, orders.customer_id AS orders_customer_id, \
         orders.total AS orders_total, orders.\"order\" AS orders_order, \
         customer.id AS customer_id, customer.name AS customer_name \
         FROM employees LEFT JOIN orders ON employees.id = orders.employee_id \
         LEFT JOIN customers AS customer ON orders.customer_id = customer.id \
         WHERE orders.total > ?"
    );
}

#[test]
fn test_group_by_with_aggregates() {
    let spec = Employee::query()
        .group_by(&["department"])
        .unwrap()
        .count("n")
        .aggregate(AggregateFunction::Avg, Some("salary"), "avg_salary")
        .unwrap()
        .order_by_desc("n")
        .unwrap()
        .build();
    assert_eq!(
        render(&spec, &MYSQL).unwrap().sql(),
        "SELECT department, COUNT(*) AS n, AVG(salary) AS avg_salary FROM employees \
         GROUP BY department ORDER BY n DESC"
    );
}

#[test]
fn test_window_function() {
    let spec = Employee::query()
        .select(&["id", "salary"])
        .unwrap()
        .with_window_function(
            WindowFunction::aggregate(AggregateFunction::Sum, Some("salary")),
            "running",
        )
        .partition_by("department")
        .order_by("hired_at")
        .frame(WindowFrame::UnboundedPreceding)
        .end_window()
        .unwrap()
        .build();
    assert_eq!(
        render(&spec, &DUCKDB).unwrap().sql(),
        "SELECT id, salary, SUM(salary) OVER (PARTITION BY department ORDER BY hired_at \
         ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW) AS running FROM employees"
    );
    assert!(matches!(
        render(&spec, DialectKind::Mysql57.profile()),
        Err(Error::UnsupportedFeature {
            feature: "window functions",
            ..
        })
    ));
}

#[test]
fn test_union_of_entities() {
    let right = Order::query().select(&["id"]).unwrap().build();
    let spec = Employee::query()
        .select(&["id"])
        .unwrap()
        .union_all(right)
        .unwrap()
        .order_by("id")
        .unwrap()
        .take(3)
        .unwrap()
        .build();
    assert_eq!(
        render(&spec, &SQLSERVER).unwrap().sql(),
        "SELECT id FROM employees UNION ALL SELECT id FROM orders ORDER BY id \
         OFFSET 0 ROWS FETCH NEXT 3 ROWS ONLY"
    );

    let mismatched = Customer::query().select(&["name"]).unwrap().build();
    assert!(matches!(
        Employee::query().select(&["id"]).unwrap().union(mismatched),
        Err(Error::IncompatibleProjection { .. })
    ));
}

#[test]
fn test_where_in_subquery_shares_placeholders() {
    let orders = Order::query()
        .select(&["employee_id"])
        .unwrap()
        .filter(col("total").gt(50.0))
        .unwrap()
        .build();
    let spec = Employee::query()
        .select(&["id"])
        .unwrap()
        .filter(col("age").gt(30))
        .unwrap()
        .where_in("id", orders)
        .unwrap()
        .build();
    let query = render(&spec, &POSTGRES).unwrap();
    assert_eq!(
        query.sql(),
        "SELECT id FROM employees WHERE age > $1 AND id IN \
         (SELECT employee_id FROM orders WHERE total > $2)"
    );
    assert_eq!(query.params(), &[SqlValue::Int(30), SqlValue::Float(50.0)]);
}

// =============================================================================
// Mutations and errors
// =============================================================================

#[test]
fn test_update_and_delete_through_builders() {
    let update = Employee::update()
        .set("salary", 5000.0)
        .unwrap()
        .set("manager_id", None::<i64>)
        .unwrap()
        .filter(col("id").eq(7))
        .unwrap()
        .build()
        .unwrap();
    let query = Renderer::new(&POSTGRES).render_update(&update).unwrap();
    assert_eq!(
        query.sql(),
        "UPDATE employees SET salary = $1, manager_id = NULL WHERE id = $2"
    );

    let delete = Employee::delete().all_rows().build();
    assert_eq!(
        Renderer::new(&MYSQL).render_delete(&delete).unwrap().sql(),
        "DELETE FROM employees"
    );
}

#[test]
fn test_compile_errors() {
    let err = Employee::query().filter(col("nickname").eq("x")).unwrap_err();
    assert_eq!(
        err,
        Error::UnknownMember {
            entity: String::from("employees"),
            name: String::from("nickname"),
        }
    );
    assert_eq!(err.phase(), Phase::Compile);

    assert!(matches!(
        Employee::query().filter(col("age").eq("old")),
        Err(Error::TypeMismatch { .. })
    ));
}
