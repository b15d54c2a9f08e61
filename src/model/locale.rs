use std::str::FromStr;

use serde::Deserialize;

/// Language used for field-level validation messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ru,
    En,
}

/// Every message the validator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    TitleRequired,
    DescriptionRequired,
    InstructorRequired,
    DurationRequired,
    DurationPositive,
    PriceRequired,
    PricePositive,
}

impl Locale {
    pub fn text(self, message: Message) -> &'static str {
        match (self, message) {
            (Locale::Ru, Message::TitleRequired) => "Название мастер-класса обязательно",
            (Locale::Ru, Message::DescriptionRequired) => "Описание обязательно",
            (Locale::Ru, Message::InstructorRequired) => "Имя инструктора обязательно",
            (Locale::Ru, Message::DurationRequired) => "Длительность обязательна",
            (Locale::Ru, Message::DurationPositive) => {
                "Длительность должна быть положительным числом"
            }
            (Locale::Ru, Message::PriceRequired) => "Цена обязательна",
            (Locale::Ru, Message::PricePositive) => "Цена должна быть положительным числом",

            (Locale::En, Message::TitleRequired) => "Title is required",
            (Locale::En, Message::DescriptionRequired) => "Description is required",
            (Locale::En, Message::InstructorRequired) => "Instructor name is required",
            (Locale::En, Message::DurationRequired) => "Duration is required",
            (Locale::En, Message::DurationPositive) => "Duration must be a positive number",
            (Locale::En, Message::PriceRequired) => "Price is required",
            (Locale::En, Message::PricePositive) => "Price must be a positive number",
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ru" => Ok(Locale::Ru),
            "en" => Ok(Locale::En),
            other => Err(format!("unsupported locale '{other}'")),
        }
    }
}
