use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, de::Error};
use serde_json::Number;

/// A master class as submitted by a client, before validation.
///
/// Missing and `null` fields both decode to `None`. Unknown fields, including any
/// client-supplied `id` or `createdAt`, are ignored. `price` is read from the number's
/// text, so no digits are lost.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MasterClassRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructor: Option<String>,
    #[serde(deserialize_with = "integral_minutes")]
    pub duration_minutes: Option<i32>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision_option")]
    pub price: Option<Decimal>,
}

// Whole numbers written with a fraction (`120.0`) count as integers, `120.5` does not
fn integral_minutes<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let whole = match (number.as_i64(), number.as_f64()) {
        (Some(i), _) => Some(i),
        (None, Some(f)) if f.fract() == 0.0 => Some(f as i64),
        _ => None,
    };

    whole
        .and_then(|i| i32::try_from(i).ok())
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("durationMinutes {number} is not a whole number")))
}

/// A master class that passed validation and is ready to be stored.
///
/// Carries no identity or timestamp; those are stamped by the store on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMasterClass {
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub duration_minutes: i32,
    pub price: Decimal,
}

/// A stored master class, as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterClass {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub duration_minutes: i32,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl MasterClass {
    pub fn stamp(id: i64, created_at: DateTime<Utc>, new: NewMasterClass) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            instructor: new.instructor,
            duration_minutes: new.duration_minutes,
            price: new.price,
            created_at,
        }
    }
}
