use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use tracing_callwrap::encoder::{to_string, to_value};

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(into = "i32")]
enum Priority {
    Low = 1,
    High = 5,
}

impl From<Priority> for i32 {
    fn from(priority: Priority) -> i32 {
        priority as i32
    }
}

#[derive(Debug, Serialize)]
struct Ticket {
    id: Uuid,
    priority: Priority,
    price: Decimal,
}

#[test]
fn uuid_encodes_as_hyphenated_string() {
    let id = Uuid::new_v4();
    assert_eq!(to_value(&id), Value::String(id.hyphenated().to_string()));
}

#[test]
fn decimal_encodes_as_nearby_number() {
    let price = Decimal::from_str("19.99").unwrap();
    let encoded = to_value(&price);
    let number = encoded.as_f64().expect("decimal should encode as a number");
    assert!((number - 19.99).abs() < 1e-9);
}

#[test]
fn enum_encodes_as_its_value() {
    assert_eq!(to_value(&Priority::High), json!(5));
    assert_eq!(to_string(&Priority::Low), "1");
}

#[test]
fn struct_encodes_field_by_field() {
    let ticket = Ticket {
        id: Uuid::nil(),
        priority: Priority::Low,
        price: Decimal::new(250, 2),
    };
    let encoded = to_value(&ticket);
    assert_eq!(encoded["id"], json!("00000000-0000-0000-0000-000000000000"));
    assert_eq!(encoded["priority"], json!(1));
    assert!((encoded["price"].as_f64().unwrap() - 2.5).abs() < 1e-9);
}

#[test]
fn unencodable_values_fall_back_to_debug() {
    let mut by_pair = BTreeMap::new();
    by_pair.insert((1, 2), "a");
    let text = to_string(&by_pair);
    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, Value::String(format!("{:?}", by_pair)));
}
