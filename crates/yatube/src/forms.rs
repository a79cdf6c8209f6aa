//! Submitted forms and their validation.
use std::collections::BTreeMap;

use serde::Deserialize;
use yatube_core::{Group, GroupId, validate_username};

/// Shortest accepted password.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Paths whose first segment would shadow a profile url.
const RESERVED_USERNAMES: &[&str] = &["about", "auth", "follow", "group", "media", "new"];

/// Validation messages keyed by field name. `__all__` holds form-wide messages.
#[derive(Clone, Debug, Default)]
pub struct FieldErrors(BTreeMap<&'static str, String>);
impl FieldErrors {
    /// Key of messages that belong to no single field.
    pub const NON_FIELD: &'static str = "__all__";

    /// Records a message for `field`, keeping the first one.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// The message for `field`, empty when the field is valid.
    #[must_use]
    pub fn get(&self, field: &str) -> &str {
        self.0.get(field).map_or("", String::as_str)
    }

    /// Whether `field` has a message.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Whether no field has a message.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Text fields of the post form. The image arrives as a multipart file.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct PostForm {
    /// Body text.
    pub text: String,
    /// Group id, empty for none.
    pub group: String,
}

/// A post form that passed validation.
#[derive(Clone, Debug)]
pub struct ValidPost {
    /// Body text.
    pub text: String,
    /// Selected group.
    pub group: Option<GroupId>,
}

impl PostForm {
    /// Checks the text and resolves the group against the known groups.
    pub fn validate(&self, groups: &[Group]) -> Result<ValidPost, FieldErrors> {
        let mut errors = FieldErrors::default();
        if self.text.trim().is_empty() {
            errors.add("text", "This field is required.");
        }
        let group = match self.group.trim() {
            "" => None,
            raw => match raw
                .parse::<u64>()
                .ok()
                .and_then(|id| groups.iter().find(|g| g.id == GroupId(id)))
            {
                Some(group) => Some(group.id),
                None => {
                    errors.add(
                        "group",
                        "Select a valid choice. That choice is not one of the available choices.",
                    );
                    None
                }
            },
        };
        if errors.is_empty() {
            Ok(ValidPost {
                text: self.text.clone(),
                group,
            })
        } else {
            Err(errors)
        }
    }
}

/// Checks the content type of an uploaded image.
pub fn validate_image(content_type: Option<&str>) -> Result<(), FieldErrors> {
    match content_type {
        Some(ctype) if ctype.starts_with("image/") => Ok(()),
        _ => {
            let mut errors = FieldErrors::default();
            errors.add(
                "image",
                "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
            );
            Err(errors)
        }
    }
}

/// The comment form.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct CommentForm {
    /// Body text.
    pub text: String,
}
impl CommentForm {
    /// The comment text when it is not blank.
    #[must_use]
    pub fn valid_text(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }
}

/// The registration form.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct SignupForm {
    /// Optional first name.
    pub first_name: String,
    /// Optional last name.
    pub last_name: String,
    /// Login name.
    pub username: String,
    /// Password.
    pub password1: String,
    /// Password confirmation.
    pub password2: String,
}
impl SignupForm {
    /// Checks every field except username uniqueness, which only the store can decide.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if let Err(yatube_core::Error::Invalid { reason, .. }) = validate_username(&self.username)
        {
            errors.add("username", capitalize(&reason));
        } else if RESERVED_USERNAMES.contains(&self.username.to_ascii_lowercase().as_str()) {
            errors.add("username", "This username is reserved.");
        }
        if self.password1.is_empty() {
            errors.add("password1", "This field is required.");
        } else if self.password1.chars().count() < PASSWORD_MIN_LEN {
            errors.add(
                "password1",
                format!(
                    "This password is too short. It must contain at least {PASSWORD_MIN_LEN} characters."
                ),
            );
        }
        if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// The login form.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct LoginForm {
    /// Login name.
    pub username: String,
    /// Password.
    pub password: String,
    /// Where to go after logging in.
    pub next: String,
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>() + ".",
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<Group> {
        vec![Group {
            id: GroupId(7),
            title: "Tech".to_owned(),
            slug: "tech".to_owned(),
            description: String::new(),
        }]
    }

    #[test]
    fn test_post_form() {
        let form = PostForm {
            text: "hello".to_owned(),
            group: "7".to_owned(),
        };
        let valid = form.validate(&groups()).unwrap();
        assert_eq!(valid.group, Some(GroupId(7)));

        let form = PostForm {
            text: "hello".to_owned(),
            group: String::new(),
        };
        assert_eq!(form.validate(&groups()).unwrap().group, None);

        let form = PostForm {
            text: "   ".to_owned(),
            group: "99".to_owned(),
        };
        let errors = form.validate(&groups()).unwrap_err();
        assert!(errors.has("text"));
        assert!(errors.has("group"));
        assert_eq!(errors.get("image"), "");
    }

    #[test]
    fn test_validate_image() {
        assert!(validate_image(Some("image/gif")).is_ok());
        assert!(validate_image(Some("text/plain")).unwrap_err().has("image"));
        assert!(validate_image(None).is_err());
    }

    #[test]
    fn test_comment_form() {
        let form = CommentForm {
            text: "  nice  ".to_owned(),
        };
        assert_eq!(form.valid_text(), Some("nice"));
        assert_eq!(CommentForm::default().valid_text(), None);
    }

    #[test]
    fn test_signup_form() {
        let mut form = SignupForm {
            username: "alice".to_owned(),
            password1: "secret-pass".to_owned(),
            password2: "secret-pass".to_owned(),
            ..Default::default()
        };
        assert!(form.validate().is_ok());

        form.password2 = "other-pass".to_owned();
        assert!(form.validate().unwrap_err().has("password2"));

        form.password1 = "short".to_owned();
        form.password2 = "short".to_owned();
        assert!(form.validate().unwrap_err().has("password1"));

        form.password1 = "secret-pass".to_owned();
        form.password2 = "secret-pass".to_owned();
        form.username = "bad name".to_owned();
        assert!(form.validate().unwrap_err().has("username"));

        form.username = "follow".to_owned();
        assert_eq!(
            form.validate().unwrap_err().get("username"),
            "This username is reserved."
        );
    }
}
