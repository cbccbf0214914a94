use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("invalid action: {0}")]
    InvalidAction(String),
    #[error("invalid role: {0}")]
    InvalidRole(String),
    #[error("invalid classification: {0}")]
    InvalidClassification(String),
    #[error("invalid rule: {0}")]
    InvalidRule(String),
    #[error("duplicate rule id: {0}")]
    DuplicateRuleId(String),
    #[error("rule set version must not be empty")]
    EmptyRuleSetVersion,
}

pub type AuthzResult<T> = Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_variants() {
        let errors = vec![
            AuthzError::InvalidAction("bad".to_string()),
            AuthzError::InvalidRole("bad".to_string()),
            AuthzError::InvalidClassification("bad".to_string()),
            AuthzError::InvalidRule("bad".to_string()),
            AuthzError::DuplicateRuleId("r1".to_string()),
            AuthzError::EmptyRuleSetVersion,
        ];

        for error in errors {
            let rendered = error.to_string();
            assert!(!rendered.is_empty());
        }
    }
}
