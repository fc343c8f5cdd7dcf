//! Rendered queries executed against an in-memory SQLite database.

use chrono::NaiveDate;
use dialectic_core::builder::col;
use dialectic_core::dialect::SQLITE;
use dialectic_core::execute::AsyncExecutor;
use dialectic_core::render::{render, Renderer};
use dialectic_core::sanitize::ValueMode;
use dialectic_core::schema::Entity;
use dialectic_core::SqlValue;
use dialectic_derive::{Entity, SqlEnum};
use dialectic_sqlx::{decode_column, SqliteExecutor};
use pretty_assertions::assert_eq;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::Row;

#[derive(Debug, Clone, Copy, SqlEnum)]
#[allow(dead_code)]
enum Role {
    Engineer,
    Manager,
}

#[derive(Entity)]
#[entity(table = "employees")]
#[allow(dead_code)]
struct Employee {
    #[column(primary_key)]
    id: i64,
    name: String,
    age: i64,
    role: Role,
    hired_at: chrono::NaiveDateTime,
}

async fn executor() -> SqliteExecutor {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");
    sqlx::query(
        "CREATE TABLE employees (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            age INTEGER NOT NULL,
            role TEXT NOT NULL,
            hired_at TEXT NOT NULL
        )",
    )
    .execute(&pool)
    .await
    .expect("Failed to create table");

    let executor = SqliteExecutor::new(pool);
    let hired = NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_nano_opt(10, 30, 45, 123_456_700)
        .unwrap();
    for (id, name, age, role) in [
        (1, "Ann", 31, Role::Manager),
        (2, "Bo", 24, Role::Engineer),
        (3, "Cy", 45, Role::Engineer),
        (4, "Di", 29, Role::Engineer),
    ] {
        let insert = Employee::insert()
            .set("id", id)
            .unwrap()
            .set("name", name)
            .unwrap()
            .set("age", age)
            .unwrap()
            .set("role", role)
            .unwrap()
            .set("hired_at", hired)
            .unwrap()
            .build()
            .unwrap();
        let query = Renderer::new(&SQLITE).render_insert(&insert).unwrap();
        assert_eq!(executor.execute(&query).await.unwrap(), 1);
    }
    executor
}

fn ids(rows: &[sqlx::sqlite::SqliteRow]) -> Vec<i64> {
    rows.iter().map(|r| r.get::<i64, _>("id")).collect()
}

#[tokio::test]
async fn test_skip_without_take_is_valid_sql() {
    let executor = executor().await;
    let spec = Employee::query().order_by("id").unwrap().skip(2).unwrap().build();
    let rows = executor.query(&render(&spec, &SQLITE).unwrap()).await.unwrap();
    assert_eq!(ids(&rows), vec![3, 4]);
}

#[tokio::test]
async fn test_filtered_page() {
    let executor = executor().await;
    let spec = Employee::query()
        .filter(col("age").gt_eq(25).and(col("name").not_eq("Cy")))
        .unwrap()
        .order_by_desc("age")
        .unwrap()
        .skip(1)
        .unwrap()
        .take(5)
        .unwrap()
        .build();
    let rows = executor.query(&render(&spec, &SQLITE).unwrap()).await.unwrap();
    assert_eq!(ids(&rows), vec![4]);
}

#[tokio::test]
async fn test_enum_and_datetime_storage_match_comparison() {
    let executor = executor().await;
    let hired = NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_nano_opt(10, 30, 45, 123_456_700)
        .unwrap();
    let spec = Employee::query()
        .filter(col("role").eq(Role::Engineer).and(col("hired_at").eq(hired)))
        .unwrap()
        .count("n")
        .build();
    let query = render(&spec, &SQLITE).unwrap();
    assert_eq!(
        executor.query_scalar(&query).await.unwrap(),
        Some(SqlValue::Int(3))
    );

    let inline = Renderer::new(&SQLITE).with_mode(ValueMode::Inline).render(&spec).unwrap();
    assert!(inline.sql().contains("'2024-01-15 10:30:45.1234567'"));
    assert_eq!(
        executor.query_scalar(&inline).await.unwrap(),
        Some(SqlValue::Int(3))
    );
}

#[tokio::test]
async fn test_update_and_delete() {
    let executor = executor().await;
    let update = Employee::update()
        .set("age", 50)
        .unwrap()
        .filter(col("name").eq("Bo"))
        .unwrap()
        .build()
        .unwrap();
    let query = Renderer::new(&SQLITE).render_update(&update).unwrap();
    assert_eq!(executor.execute(&query).await.unwrap(), 1);

    let delete = Employee::delete()
        .filter(col("age").gt(40))
        .unwrap()
        .build();
    let query = Renderer::new(&SQLITE).render_delete(&delete).unwrap();
    assert_eq!(executor.execute(&query).await.unwrap(), 2);

    let rows = executor
        .query(&render(&Employee::query().order_by("id").unwrap().build(), &SQLITE).unwrap())
        .await
        .unwrap();
    assert_eq!(ids(&rows), vec![1, 4]);
}

#[tokio::test]
async fn test_membership_above_threshold_runs() {
    let executor = executor().await;
    let spec = Employee::query()
        .filter(col("id").in_list(0..150_i64))
        .unwrap()
        .build();
    let query = render(&spec, &SQLITE).unwrap();
    assert!(query.params().is_empty());
    assert_eq!(executor.query(&query).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_decode_column_storage_classes() {
    let executor = executor().await;
    let row = sqlx::query("SELECT 1, 2.5, 'x', NULL, X'0102'")
        .fetch_one(executor.pool())
        .await
        .unwrap();
    assert_eq!(decode_column(&row, 0).unwrap(), SqlValue::Int(1));
    assert_eq!(decode_column(&row, 1).unwrap(), SqlValue::Float(2.5));
    assert_eq!(decode_column(&row, 2).unwrap(), SqlValue::Text(String::from("x")));
    assert_eq!(decode_column(&row, 3).unwrap(), SqlValue::Null);
    assert_eq!(decode_column(&row, 4).unwrap(), SqlValue::Blob(vec![1, 2]));
}

fn one(id: i64) -> dialectic_core::QueryBuilder<Employee> {
    Employee::query()
        .select(&["id"])
        .unwrap()
        .filter(col("id").eq(id))
        .unwrap()
}

#[tokio::test]
async fn test_chained_set_operations_group_to_the_right() {
    let executor = executor().await;
    let spec = one(1)
        .union(one(2).build())
        .unwrap()
        .intersect(one(2).build())
        .unwrap()
        .order_by("id")
        .unwrap()
        .build();
    let rows = executor.query(&render(&spec, &SQLITE).unwrap()).await.unwrap();
    assert_eq!(ids(&rows), vec![1, 2]);
}

#[tokio::test]
async fn test_inline_float_keeps_real_arithmetic() {
    let executor = executor().await;
    let spec = Employee::query()
        .filter(col("age").div(2.0).gt(14))
        .unwrap()
        .order_by("id")
        .unwrap()
        .build();
    let bound = executor.query(&render(&spec, &SQLITE).unwrap()).await.unwrap();
    let inline = Renderer::new(&SQLITE).with_mode(ValueMode::Inline).render(&spec).unwrap();
    assert!(inline.sql().contains("age / 2.0 > 14"), "{}", inline.sql());
    let inlined = executor.query(&inline).await.unwrap();
    assert_eq!(ids(&bound), vec![1, 3, 4]);
    assert_eq!(ids(&inlined), ids(&bound));
}
