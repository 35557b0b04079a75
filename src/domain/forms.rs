//! Explicit form validation.
//!
//! Each submitted form runs through a validation step that yields either a
//! constructed draft value or a structured set of per-field errors. Handlers
//! re-render the form with the errors; nothing is written on the error path.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn push(&mut self, field: &'static str, message: &'static str) {
        self.0.push(FieldError { field, message });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}

/// A validated post submission, ready to be written.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub text: String,
    pub group_id: Option<i64>,
    pub image_path: Option<String>,
}

impl PostDraft {
    pub fn validate(
        text: String,
        group_id: Option<i64>,
        image_path: Option<String>,
    ) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        if text.trim().is_empty() {
            errors.push("text", "Post text must not be empty.");
        }
        if errors.is_empty() {
            Ok(Self {
                text,
                group_id,
                image_path,
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub text: String,
}

impl CommentDraft {
    pub fn validate(text: String) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        if text.trim().is_empty() {
            errors.push("text", "Comment text must not be empty.");
        }
        if errors.is_empty() {
            Ok(Self { text })
        } else {
            Err(errors)
        }
    }
}

const MAX_USERNAME_LENGTH: usize = 150;
const MIN_PASSWORD_LENGTH: usize = 8;

/// A validated signup submission. The password is still plain text here;
/// hashing happens in the authentication service.
#[derive(Debug, Clone)]
pub struct SignupDraft {
    pub username: String,
    pub password: String,
}

impl SignupDraft {
    pub fn validate(username: String, password: String) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        let username = username.trim().to_owned();

        if username.is_empty() {
            errors.push("username", "Username must not be empty.");
        } else if username.len() > MAX_USERNAME_LENGTH {
            errors.push("username", "Username is too long.");
        } else if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            errors.push(
                "username",
                "Username may only contain letters, digits, and _ - . characters.",
            );
        }

        if password.len() < MIN_PASSWORD_LENGTH {
            errors.push("password", "Password must be at least 8 characters long.");
        }

        if errors.is_empty() {
            Ok(Self { username, password })
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_draft_rejects_blank_text() {
        let result = PostDraft::validate("   \n".to_string(), None, None);
        let errors = result.expect_err("blank text must fail");
        assert_eq!(errors.iter().count(), 1);
        assert_eq!(errors.iter().next().map(|e| e.field), Some("text"));
    }

    #[test]
    fn post_draft_keeps_submitted_text_as_is() {
        let draft = PostDraft::validate("  kept verbatim  ".to_string(), Some(3), None)
            .expect("valid draft");
        assert_eq!(draft.text, "  kept verbatim  ");
        assert_eq!(draft.group_id, Some(3));
    }

    #[test]
    fn comment_draft_rejects_blank_text() {
        assert!(CommentDraft::validate(String::new()).is_err());
        assert!(CommentDraft::validate("fair point".to_string()).is_ok());
    }

    #[test]
    fn signup_draft_checks_username_charset_and_password_length() {
        assert!(SignupDraft::validate("ok_user".into(), "longenough".into()).is_ok());
        assert!(SignupDraft::validate("bad user".into(), "longenough".into()).is_err());
        assert!(SignupDraft::validate("ok_user".into(), "short".into()).is_err());
    }

    #[test]
    fn signup_draft_trims_username() {
        let draft =
            SignupDraft::validate("  margot  ".into(), "longenough".into()).expect("valid");
        assert_eq!(draft.username, "margot");
    }
}
