//! Field-level validation of submitted master classes.
//!
//! Every rule is checked independently and all violations are reported together.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::model::{
    locale::{Locale, Message},
    master_class::{MasterClassRequest, NewMasterClass},
};

/// Maps a JSON field name to the message describing why it was rejected.
pub type FieldErrors = BTreeMap<&'static str, &'static str>;

#[derive(Debug, PartialEq, Eq)]
pub enum Validation {
    Accepted(NewMasterClass),
    Rejected(FieldErrors),
}

pub fn validate(request: MasterClassRequest, locale: Locale) -> Validation {
    let mut errors = FieldErrors::new();

    let title = required_text(request.title);
    if title.is_none() {
        errors.insert("title", locale.text(Message::TitleRequired));
    }

    let description = required_text(request.description);
    if description.is_none() {
        errors.insert("description", locale.text(Message::DescriptionRequired));
    }

    let instructor = required_text(request.instructor);
    if instructor.is_none() {
        errors.insert("instructor", locale.text(Message::InstructorRequired));
    }

    let duration_minutes = match request.duration_minutes {
        None => {
            errors.insert("durationMinutes", locale.text(Message::DurationRequired));
            None
        }
        Some(d) if d <= 0 => {
            errors.insert("durationMinutes", locale.text(Message::DurationPositive));
            None
        }
        Some(d) => Some(d),
    };

    let price = match request.price {
        None => {
            errors.insert("price", locale.text(Message::PriceRequired));
            None
        }
        Some(p) if p <= Decimal::ZERO => {
            errors.insert("price", locale.text(Message::PricePositive));
            None
        }
        Some(p) => Some(p),
    };

    match (title, description, instructor, duration_minutes, price) {
        (Some(title), Some(description), Some(instructor), Some(duration_minutes), Some(price))
            if errors.is_empty() =>
        {
            Validation::Accepted(NewMasterClass {
                title,
                description,
                instructor,
                duration_minutes,
                price,
            })
        }
        _ => Validation::Rejected(errors),
    }
}

/// Keeps the text as submitted; blank means empty after trimming.
fn required_text(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
