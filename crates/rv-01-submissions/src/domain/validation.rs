//! # Input Validation
//!
//! Normalizes raw request values before anything touches the store.

use crate::domain::config::LifecycleConfig;
use crate::domain::entities::{Action, NewSubmission, TransitionInput};
use crate::domain::errors::LifecycleError;
use shared_types::SubmissionId;
use url::Url;

fn invalid(message: impl Into<String>) -> LifecycleError {
    LifecycleError::Validation(message.into())
}

fn bounded_text(field: &str, value: &str, max: usize) -> Result<String, LifecycleError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(format!("{} must not be empty", field)));
    }
    if trimmed.chars().count() > max {
        return Err(invalid(format!("{} exceeds {} characters", field, max)));
    }
    Ok(trimmed.to_string())
}

/// Trim and check a new submission. The url must be absolute http(s).
pub fn normalize_new_submission(
    input: NewSubmission,
    config: &LifecycleConfig,
) -> Result<NewSubmission, LifecycleError> {
    let raw_url = input.url.trim();
    if raw_url.len() > config.max_url_len {
        return Err(invalid(format!("url exceeds {} bytes", config.max_url_len)));
    }
    let url = Url::parse(raw_url).map_err(|e| invalid(format!("url is not valid: {}", e)))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid("url must be an absolute http or https address"));
    }

    Ok(NewSubmission {
        url: url.to_string(),
        title: bounded_text("title", &input.title, config.max_title_len)?,
        publisher: bounded_text("publisher", &input.publisher, config.max_publisher_len)?,
        ..input
    })
}

/// Check the optional payload against the action it accompanies.
pub fn normalize_transition_input(
    action: Action,
    input: TransitionInput,
    config: &LifecycleConfig,
) -> Result<TransitionInput, LifecycleError> {
    let notes = match input.notes {
        Some(notes) => {
            let trimmed = notes.trim();
            if trimmed.chars().count() > config.max_notes_len {
                return Err(invalid(format!(
                    "notes exceed {} characters",
                    config.max_notes_len
                )));
            }
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        None => None,
    };

    match action {
        Action::UpdateNotes if notes.is_none() => {
            return Err(invalid("notes are required"));
        }
        Action::UpdateNotes | Action::Delete if input.credibility.is_some() => {
            return Err(invalid(
                "credibility can only be set when approving or rejecting",
            ));
        }
        _ => {}
    }

    Ok(TransitionInput {
        notes,
        credibility: input.credibility,
    })
}

/// Validate a whole batch before any item runs.
pub fn validate_batch(
    ids: &[String],
    action: Action,
    config: &LifecycleConfig,
) -> Result<Vec<SubmissionId>, LifecycleError> {
    if !action.is_batchable() {
        return Err(invalid(format!(
            "batch action must be approve or reject, got {}",
            action
        )));
    }
    if ids.is_empty() {
        return Err(invalid("batch must contain at least one id"));
    }
    if ids.len() > config.max_batch_size {
        return Err(invalid(format!(
            "batch of {} ids exceeds the limit of {}",
            ids.len(),
            config.max_batch_size
        )));
    }

    ids.iter()
        .map(|raw| SubmissionId::parse(raw).map_err(|e| invalid(e.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Category, CountryCode, Credibility, MediaType};

    fn input(url: &str, title: &str) -> NewSubmission {
        NewSubmission {
            url: url.into(),
            title: title.into(),
            publisher: " Daily Graphic ".into(),
            country: CountryCode::parse("GH").unwrap(),
            category: Category::Primary,
            media_type: MediaType::Article,
        }
    }

    #[test]
    fn test_accepts_and_trims() {
        let out = normalize_new_submission(
            input(" https://graphic.com.gh/news ", "  Budget  "),
            &LifecycleConfig::default(),
        )
        .unwrap();
        assert_eq!(out.url, "https://graphic.com.gh/news");
        assert_eq!(out.title, "Budget");
        assert_eq!(out.publisher, "Daily Graphic");
    }

    #[test]
    fn test_rejects_bad_urls() {
        let config = LifecycleConfig::default();
        for url in ["not a url", "ftp://files.example/a", "mailto:a@b.c", "/relative"] {
            assert!(matches!(
                normalize_new_submission(input(url, "T"), &config),
                Err(LifecycleError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_rejects_blank_and_long_title() {
        let config = LifecycleConfig::default();
        assert!(normalize_new_submission(input("https://a.example", "   "), &config).is_err());
        let long = "x".repeat(config.max_title_len + 1);
        assert!(normalize_new_submission(input("https://a.example", &long), &config).is_err());
    }

    #[test]
    fn test_notes_rules() {
        let config = LifecycleConfig::default();
        assert!(normalize_transition_input(
            Action::UpdateNotes,
            TransitionInput::default(),
            &config
        )
        .is_err());
        assert!(normalize_transition_input(
            Action::UpdateNotes,
            TransitionInput {
                notes: Some("ok".into()),
                credibility: Some(Credibility::Low),
            },
            &config
        )
        .is_err());

        let out = normalize_transition_input(
            Action::Approve,
            TransitionInput::with_notes("   "),
            &config,
        )
        .unwrap();
        assert!(out.notes.is_none());
    }

    #[test]
    fn test_batch_rules() {
        let config = LifecycleConfig {
            max_batch_size: 2,
            ..LifecycleConfig::default()
        };
        let good = SubmissionId::new().to_string();

        assert!(validate_batch(&[], Action::Approve, &config).is_err());
        assert!(validate_batch(&[good.clone()], Action::UpdateNotes, &config).is_err());
        assert!(validate_batch(&vec![good.clone(); 3], Action::Approve, &config).is_err());
        assert!(
            validate_batch(&[good.clone(), "abc".into()], Action::Reject, &config).is_err()
        );
        assert_eq!(
            validate_batch(&[good.clone(), good], Action::Reject, &config)
                .unwrap()
                .len(),
            2
        );
    }
}
