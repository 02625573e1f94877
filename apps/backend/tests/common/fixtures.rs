//! Test fixtures and factory functions for creating test data.

use serde_json::json;
use uuid::Uuid;

/// Create a simple exercise request body with a full detail block.
pub fn simple_exercise_request(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "type": "simple",
        "description": "a test exercise",
        "detail": {
            "duration": 30,
            "repetitions": 12,
            "movement": "push",
            "notes": "keep elbows in"
        }
    })
}

/// Create a compound exercise request body.
pub fn compound_exercise_request(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "type": "compound",
        "description": "a test circuit"
    })
}

/// Create an add-component request body with an explicit order index.
pub fn add_component_request(child_id: Uuid, quantity: i32, order_index: i32) -> serde_json::Value {
    json!({
        "child_exercise_id": child_id,
        "quantity": quantity,
        "order_index": order_index
    })
}

/// Add-component request leaving the order index to be allocated.
pub fn add_component_request_auto(child_id: Uuid, quantity: i32) -> serde_json::Value {
    json!({
        "child_exercise_id": child_id,
        "quantity": quantity
    })
}

/// Create a swap request body.
pub fn swap_request(
    component_a: Uuid,
    new_order_a: i32,
    component_b: Uuid,
    new_order_b: i32,
) -> serde_json::Value {
    json!({
        "component_a": component_a,
        "new_order_a": new_order_a,
        "component_b": component_b,
        "new_order_b": new_order_b
    })
}

/// Create a routine request body.
pub fn routine_request(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "description": "a test routine"
    })
}

/// Create an add-routine-exercise request body.
pub fn routine_exercise_request(exercise_id: Uuid) -> serde_json::Value {
    json!({
        "exercise_id": exercise_id,
        "sets": 3,
        "reps": 10,
        "rest_time": 60
    })
}

/// Create a register/login request body.
pub fn credentials(email: &str, password: &str) -> serde_json::Value {
    json!({
        "email": email,
        "password": password
    })
}
