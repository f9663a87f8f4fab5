//! Persisted entities and their partial-update payloads.
//!
//! Each entity comes with a `*Patch` type: the explicit allow-list of fields a
//! caller may supply on create or update. Absent fields leave the stored value
//! alone; nullable fields use `Option<Option<T>>` so an explicit `null` clears.

/// Declares a string-backed enum that round-trips through JSON and a Postgres
/// `TEXT` column using the same SCREAMING_SNAKE_CASE spelling.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!("invalid {} '{}'", stringify!($name), other)),
                }
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let text = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok(text.parse::<$name>()?)
            }
        }

        impl From<$name> for crate::store::SqlValue {
            fn from(value: $name) -> Self {
                crate::store::SqlValue::Text(Some(value.as_str().to_string()))
            }
        }
    };
}

pub mod application;
pub mod company;
pub mod contact;
pub mod email_template;
pub mod event;
pub mod interview;
pub mod learning;
pub mod reminder;
pub mod resource;
pub mod resume;
pub mod resume_template;
pub mod task;

use crate::errors::AppError;

/// Returns a required value, or a validation error naming the JSON field.
pub fn required<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

/// Rejects empty or whitespace-only text for a required field.
pub fn non_blank(value: String, field: &str) -> Result<String, AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(value)
}

pub fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    non_blank(required(value, field)?, field)
}

/// Writes a supplied patch value over the current one.
pub fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    text_enum!(Colour {
        Red => "RED",
        DeepBlue => "DEEP_BLUE",
    });

    #[test]
    fn test_text_enum_round_trips() {
        assert_eq!("DEEP_BLUE".parse::<Colour>().unwrap(), Colour::DeepBlue);
        assert_eq!(Colour::Red.to_string(), "RED");
        assert_eq!(serde_json::to_string(&Colour::DeepBlue).unwrap(), "\"DEEP_BLUE\"");
        assert!("PURPLE".parse::<Colour>().is_err());
        assert!(serde_json::from_str::<Colour>("\"red\"").is_err());
    }

    #[test]
    fn test_required_text_rejects_blank() {
        assert!(required_text(None, "title").is_err());
        assert!(required_text(Some("   ".into()), "title").is_err());
        assert_eq!(required_text(Some("Ship it".into()), "title").unwrap(), "Ship it");
    }

    #[test]
    fn test_merge_only_overwrites_supplied() {
        let mut slot = Some("old".to_string());
        merge(&mut slot, None);
        assert_eq!(slot.as_deref(), Some("old"));
        merge(&mut slot, Some(None));
        assert_eq!(slot, None);
    }
}
