//! Settings error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Missing required settings: {}", .0.join(", "))]
    MissingRequiredFields(Vec<String>),

    #[error("Settings source '{source_name}' unavailable: {message}")]
    SourceUnavailable {
        source_name: String,
        message: String,
    },

    #[error("Secret '{secret}' has a malformed payload: {message}")]
    MalformedSecretPayload { secret: String, message: String },

    #[error("Invalid value {value} for {field}: expected {expected}")]
    TypeCoercion {
        field: String,
        value: String,
        expected: &'static str,
    },
}

impl SettingsError {
    pub fn source_unavailable(source_name: impl Into<String>, message: impl ToString) -> Self {
        SettingsError::SourceUnavailable {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    pub fn malformed_secret(secret: impl Into<String>, message: impl ToString) -> Self {
        SettingsError::MalformedSecretPayload {
            secret: secret.into(),
            message: message.to_string(),
        }
    }

    /// The field or source this error is about
    pub fn subject(&self) -> String {
        match self {
            SettingsError::MissingRequiredFields(fields) => fields.join(", "),
            SettingsError::SourceUnavailable { source_name, .. } => source_name.clone(),
            SettingsError::MalformedSecretPayload { secret, .. } => secret.clone(),
            SettingsError::TypeCoercion { field, .. } => field.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_message_names_every_field() {
        let err = SettingsError::MissingRequiredFields(vec![
            "JWT_SECRET_KEY".to_string(),
            "FRONTEND_URL".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Missing required settings: JWT_SECRET_KEY, FRONTEND_URL"
        );
    }

    #[test]
    fn test_type_coercion_message() {
        let err = SettingsError::TypeCoercion {
            field: "OTP_MAX_ATTEMPTS".to_string(),
            value: "'three'".to_string(),
            expected: "an unsigned integer",
        };
        assert_eq!(
            err.to_string(),
            "Invalid value 'three' for OTP_MAX_ATTEMPTS: expected an unsigned integer"
        );
        assert_eq!(err.subject(), "OTP_MAX_ATTEMPTS");
    }

    #[test]
    fn test_source_unavailable_subject() {
        let err = SettingsError::source_unavailable("secretsmanager:facepay", "timed out");
        assert_eq!(err.subject(), "secretsmanager:facepay");
        assert!(err.to_string().contains("timed out"));
    }
}
