//! Request validation from entity field rules. Runs before any store call.

use crate::error::AppError;
use crate::schema::{EntitySchema, FieldSpec};
use crate::sql::BindValue;
use serde_json::{Map, Value};

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a create body. All required fields must be present and non-blank.
    pub fn validate_create(entity: &EntitySchema, body: &Map<String, Value>) -> Result<(), AppError> {
        for field in entity.fields {
            let val = body.get(field.name);
            if field.required && val.map_or(true, is_blank) {
                return Err(AppError::Validation(format!("{} is required", field.name)));
            }
            if let Some(v) = val {
                validate_field(field, v)?;
            }
        }
        for (a, b) in entity.products {
            let product = number(body.get(*a)).zip(number(body.get(*b))).map(|(x, y)| x * y);
            if product.is_some_and(|p| !p.is_finite()) {
                return Err(AppError::Validation(format!("{} multiplied by {} is out of range", a, b)));
            }
        }
        for group in entity.exactly_one_of {
            let supplied = group
                .iter()
                .filter(|name| body.get(**name).is_some_and(|v| !is_blank(v)))
                .count();
            if supplied == 0 {
                return Err(AppError::Validation(format!("must specify either {}", group.join(" or "))));
            }
            if supplied > 1 {
                return Err(AppError::Validation(format!(
                    "cannot specify more than one of {}",
                    group.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Validate a partial update. Only supplied fields are checked; `null` counts as not supplied.
    pub fn validate_update(entity: &EntitySchema, body: &Map<String, Value>) -> Result<(), AppError> {
        for (name, v) in body {
            let Some(field) = entity.field(name) else {
                continue;
            };
            if v.is_null() {
                continue;
            }
            if !field.updatable {
                return Err(AppError::Validation(format!("{} cannot be updated", name)));
            }
            if field.required && is_blank(v) {
                return Err(AppError::Validation(format!("{} cannot be empty", name)));
            }
            validate_field(field, v)?;
        }
        Ok(())
    }
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn number(v: Option<&Value>) -> Option<f64> {
    v.and_then(Value::as_f64)
}

fn validate_field(field: &FieldSpec, v: &Value) -> Result<(), AppError> {
    if v.is_null() {
        return Ok(());
    }
    let bound = BindValue::coerce(field.kind, v)
        .ok_or_else(|| AppError::Validation(format!("{} must be {}", field.name, field.kind.describe())))?;
    // Integer fields are stored as 32-bit INTEGER columns.
    if let BindValue::Integer(n) = bound {
        if i32::try_from(n).is_err() {
            return Err(AppError::Validation(format!(
                "{} must be between {} and {}",
                field.name,
                i32::MIN,
                i32::MAX
            )));
        }
    }
    if !field.allowed.is_empty() {
        if let BindValue::Text(s) = &bound {
            if !field.allowed.contains(&s.as_str()) {
                return Err(AppError::Validation(format!(
                    "{} must be one of: {}",
                    field.name,
                    field.allowed.join(", ")
                )));
            }
        }
    }
    if let Some(min) = field.minimum {
        let n = match bound {
            BindValue::Integer(n) => Some(n as f64),
            BindValue::Number(n) => Some(n),
            _ => None,
        };
        if n.is_some_and(|n| n < min) {
            return Err(AppError::Validation(format!("{} must be at least {}", field.name, min)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EXISTENCES, MENU_INGREDIENTS, STOCK_CATEGORIES, STOCK_ITEMS, STOCK_SUB_CATEGORIES};
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::Validation(m) => m,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn create_requires_non_blank_fields() {
        let cat = "7f1c1d8e-4a7e-4f55-9d3e-0a6f0d1b2c3d";
        let err = RequestValidator::validate_create(&STOCK_SUB_CATEGORIES, &obj(json!({"name": "  ", "stock_category_id": cat})))
            .unwrap_err();
        assert_eq!(message(err), "name is required");

        let err = RequestValidator::validate_create(&STOCK_SUB_CATEGORIES, &obj(json!({"name": "Dairy"}))).unwrap_err();
        assert_eq!(message(err), "stock_category_id is required");

        RequestValidator::validate_create(&STOCK_SUB_CATEGORIES, &obj(json!({"name": "Dairy", "stock_category_id": cat})))
            .unwrap();
    }

    #[test]
    fn create_checks_kinds_and_rules() {
        let err = RequestValidator::validate_create(
            &STOCK_SUB_CATEGORIES,
            &obj(json!({"name": "Dairy", "stock_category_id": "cat-1"})),
        )
        .unwrap_err();
        assert_eq!(message(err), "stock_category_id must be a UUID");

        let err = RequestValidator::validate_create(&STOCK_ITEMS, &obj(json!({"name": "Milk", "unit": "bottle"}))).unwrap_err();
        assert!(message(err).starts_with("unit must be one of: kg, g"));

        let err = RequestValidator::validate_create(
            &STOCK_ITEMS,
            &obj(json!({"name": "Milk", "unit": "l", "unit_cost": -1})),
        )
        .unwrap_err();
        assert_eq!(message(err), "unit_cost must be at least 0");
    }

    #[test]
    fn integers_must_fit_the_column() {
        let err = RequestValidator::validate_update(&STOCK_CATEGORIES, &obj(json!({"display_order": 3_000_000_000i64})))
            .unwrap_err();
        assert_eq!(message(err), "display_order must be between -2147483648 and 2147483647");

        let err = RequestValidator::validate_create(
            &STOCK_CATEGORIES,
            &obj(json!({"name": "Dairy", "display_order": 3_000_000_000i64})),
        )
        .unwrap_err();
        assert!(message(err).starts_with("display_order must be between"));

        RequestValidator::validate_update(&STOCK_CATEGORIES, &obj(json!({"display_order": i32::MAX}))).unwrap();
    }

    #[test]
    fn existence_cost_must_stay_finite() {
        let item = "5e2d7d0c-93a1-4d0b-8f6e-2c0d9b1a7e44";
        let detail = "0b8f2f0e-8a51-4c39-a3a4-5b0fdc7e11aa";
        let huge = obj(json!({
            "stock_item_id": item,
            "invoice_detail_id": detail,
            "units_purchased": 1e200,
            "cost_per_unit": 1e200,
        }));
        assert_eq!(
            message(RequestValidator::validate_create(&EXISTENCES, &huge).unwrap_err()),
            "units_purchased multiplied by cost_per_unit is out of range"
        );

        let fine = obj(json!({
            "stock_item_id": item,
            "invoice_detail_id": detail,
            "units_purchased": 12,
            "cost_per_unit": 1.25,
        }));
        RequestValidator::validate_create(&EXISTENCES, &fine).unwrap();
    }

    #[test]
    fn exactly_one_ingredient_source() {
        let mv = "0b8f2f0e-8a51-4c39-a3a4-5b0fdc7e11aa";
        let sv = "5e2d7d0c-93a1-4d0b-8f6e-2c0d9b1a7e44";
        let none = obj(json!({"menu_variant_id": mv, "quantity": 1.5}));
        assert_eq!(
            message(RequestValidator::validate_create(&MENU_INGREDIENTS, &none).unwrap_err()),
            "must specify either stock_variant_id or menu_sub_category_id"
        );
        let both = obj(json!({"menu_variant_id": mv, "quantity": 1, "stock_variant_id": sv, "menu_sub_category_id": sv}));
        assert_eq!(
            message(RequestValidator::validate_create(&MENU_INGREDIENTS, &both).unwrap_err()),
            "cannot specify more than one of stock_variant_id, menu_sub_category_id"
        );
        let one = obj(json!({"menu_variant_id": mv, "quantity": 1, "stock_variant_id": sv}));
        RequestValidator::validate_create(&MENU_INGREDIENTS, &one).unwrap();
    }

    #[test]
    fn update_checks_only_supplied_fields() {
        RequestValidator::validate_update(&STOCK_SUB_CATEGORIES, &obj(json!({"display_order": 4}))).unwrap();
        RequestValidator::validate_update(&STOCK_SUB_CATEGORIES, &obj(json!({"name": null, "id": "x"}))).unwrap();

        let err = RequestValidator::validate_update(&STOCK_SUB_CATEGORIES, &obj(json!({"name": ""}))).unwrap_err();
        assert_eq!(message(err), "name cannot be empty");

        let err = RequestValidator::validate_update(&STOCK_SUB_CATEGORIES, &obj(json!({"is_active": "yes"}))).unwrap_err();
        assert_eq!(message(err), "is_active must be a boolean");
    }

    #[test]
    fn update_refuses_fixed_fields() {
        let err = RequestValidator::validate_update(
            &STOCK_SUB_CATEGORIES,
            &obj(json!({"stock_category_id": "7f1c1d8e-4a7e-4f55-9d3e-0a6f0d1b2c3d"})),
        )
        .unwrap_err();
        assert_eq!(message(err), "stock_category_id cannot be updated");
    }
}
