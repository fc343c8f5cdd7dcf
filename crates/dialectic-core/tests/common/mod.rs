//! Entities shared by the integration tests.

#![allow(dead_code)]

use chrono::NaiveDateTime;
use dialectic_derive::{Entity, SqlEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, SqlEnum)]
pub enum Department {
    Engineering = 1,
    Sales,
    #[sql_enum(rename = "HR")]
    HumanResources = 10,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, SqlEnum)]
pub enum Status {
    Active,
    OnLeave,
}

#[derive(Debug, Clone, Entity)]
#[entity(table = "employees")]
#[relation(name = "orders", target = Order, local_key = "id", foreign_key = "employee_id")]
pub struct Employee {
    #[column(primary_key)]
    pub id: i64,
    pub first_name: String,
    pub age: i64,
    pub salary: f64,
    pub department: Department,
    #[column(enum_as_int)]
    pub status: Status,
    pub hired_at: NaiveDateTime,
    pub manager_id: Option<i64>,
    pub active: bool,
}

#[derive(Debug, Clone, Entity)]
#[entity(table = "orders")]
#[relation(name = "customer", target = Customer, local_key = "customer_id", foreign_key = "id")]
pub struct Order {
    #[column(primary_key)]
    pub id: i64,
    pub employee_id: i64,
    pub customer_id: i64,
    pub total: f64,
    #[column(name = "order")]
    pub position: i64,
}

#[derive(Debug, Clone, Entity)]
#[entity(table = "customers")]
pub struct Customer {
    #[column(primary_key)]
    pub id: i64,
    pub name: String,
    #[column(skip)]
    pub cached_rank: u32,
}
