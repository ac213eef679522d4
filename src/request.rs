//! Decoding and validation of pin request bodies.
//!
//! The body is checked against [`PIN_REQUEST_SCHEMA`] before anything touches the store.  Numeric
//! fields accept numbers or numeric strings; "any" fields accept any non-null scalar.

use crate::error::AppError;
use crate::types::{ApplicantId, PinRequest};

use serde_json::{Map, Number, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    Any,
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

pub const ORGANIZATION_ID: &str = "organizationId";
pub const APPLICANT_ID: &str = "applicantId";

pub const PIN_REQUEST_SCHEMA: &[Field] = &[
    Field {
        name: ORGANIZATION_ID,
        kind: FieldKind::Number,
        required: true,
    },
    Field {
        name: APPLICANT_ID,
        kind: FieldKind::Any,
        required: true,
    },
];

/// Decode and validate a raw request body.
pub fn parse_request(body: &[u8]) -> Result<PinRequest, AppError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|_| AppError::Validation("body is not valid json"))?;
    let object = value
        .as_object()
        .ok_or(AppError::Validation("body is not a json object"))?;
    validate(object, PIN_REQUEST_SCHEMA)?;

    let organization_id = object
        .get(ORGANIZATION_ID)
        .and_then(cast_number)
        .ok_or(AppError::Validation("organizationId must be a number"))?;
    let organization_id = to_integer(organization_id)
        .ok_or(AppError::Validation("organizationId must be an integer"))?;
    let applicant_id = object
        .get(APPLICANT_ID)
        .and_then(cast_applicant_id)
        .ok_or(AppError::Validation("applicantId must be a scalar"))?;

    Ok(PinRequest {
        organization_id,
        applicant_id,
    })
}

/// Check presence and type of every field in `schema`.
pub fn validate(object: &Map<String, Value>, schema: &[Field]) -> Result<(), AppError> {
    for field in schema {
        match object.get(field.name) {
            None | Some(Value::Null) if field.required => {
                return Err(AppError::Validation("required field missing"))
            }
            None | Some(Value::Null) => {}
            Some(value) => {
                if field.kind == FieldKind::Number && cast_number(value).is_none() {
                    return Err(AppError::Validation("field is not a number"));
                }
            }
        }
    }
    Ok(())
}

fn cast_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn to_integer(number: f64) -> Option<i64> {
    let in_range = number >= i64::MIN as f64 && number < i64::MAX as f64;
    (number.fract() == 0.0 && in_range).then_some(number as i64)
}

/// Numerically equal values render identically: `100`, `1e2` and `100.0` all become `100`.
fn render_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) => to_integer(f).map_or_else(|| f.to_string(), |i| i.to_string()),
        None => n.to_string(),
    }
}

fn cast_applicant_id(value: &Value) -> Option<ApplicantId> {
    match value {
        Value::String(s) => Some(ApplicantId(s.clone())),
        Value::Number(n) => Some(ApplicantId(render_number(n))),
        Value::Bool(b) => Some(ApplicantId(b.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
