use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::database::models::ItemChanges;

pub const MAX_USERNAME_LEN: usize = 80;
pub const MAX_EMAIL_LEN: usize = 200;
pub const MAX_SKU_LEN: usize = 120;
pub const MAX_NAME_LEN: usize = 200;
pub const MAX_LOCATION_LEN: usize = 200;
pub const MAX_CATEGORY_LEN: usize = 200;
/// bcrypt ignores everything past this many bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Item fields as submitted. `qty` and `purchase_price` accept numbers or
/// strings and are coerced rather than rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ItemForm {
    pub sku: String,
    pub name: String,
    pub qty: Value,
    pub location: String,
    pub category: String,
    pub description: String,
    pub purchase_price: Value,
}

/// Non-negative integer, or a string made only of ASCII digits. Everything
/// else, including overflow, is 0.
pub fn coerce_qty(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().filter(|q| *q >= 0).unwrap_or(0),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

/// Finite number or numeric string; anything else is 0.0.
pub fn coerce_price(value: &Value) -> f64 {
    let price = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    price.filter(|p| p.is_finite()).unwrap_or(0.0)
}

/// Records an error for `field` when `value` has more than `max` characters.
pub fn check_len(errors: &mut HashMap<String, String>, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.insert(field.to_string(), format!("Must be at most {} characters", max));
    }
}

impl ItemForm {
    pub fn trimmed_sku(&self) -> &str {
        self.sku.trim()
    }

    pub fn trimmed_name(&self) -> &str {
        self.name.trim()
    }

    /// Trim and coerce the mutable fields, collecting per-field problems.
    pub fn changes(&self, errors: &mut HashMap<String, String>) -> ItemChanges {
        let changes = ItemChanges {
            name: self.trimmed_name().to_string(),
            qty: coerce_qty(&self.qty),
            location: self.location.trim().to_string(),
            category: self.category.trim().to_string(),
            description: self.description.trim().to_string(),
            purchase_price: coerce_price(&self.purchase_price),
        };

        check_len(errors, "name", &changes.name, MAX_NAME_LEN);
        check_len(errors, "location", &changes.location, MAX_LOCATION_LEN);
        check_len(errors, "category", &changes.category, MAX_CATEGORY_LEN);
        if changes.purchase_price < 0.0 {
            errors.insert("purchase_price".to_string(), "Must not be negative".to_string());
        }

        changes
    }
}
