use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::complaint::{ComplaintPriority, NewComplaint};
use crate::models::user::NewUser;

pub const REQUIRED: &str = "This field is required.";

/// Per-field validation messages, keyed the way browser-side form handling
/// expects them. BTreeMap keeps serialization order stable.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }
}

fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

fn check_max_length(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!("Ensure this value has at most {max} characters (it has {len})."),
        );
    }
}

/// Registration payload. Missing fields deserialize to empty strings so they
/// surface as validation messages rather than deserialization failures.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<NewUser, FieldErrors> {
        let mut errors = FieldErrors::default();

        let username = self.username.trim();
        if username.is_empty() {
            errors.add("username", REQUIRED);
        } else {
            check_max_length(&mut errors, "username", username, 150);
            let allowed = |c: char| c.is_alphanumeric() || "@.+-_".contains(c);
            if !username.chars().all(allowed) {
                errors.add(
                    "username",
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                );
            }
        }

        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            errors.add("first_name", REQUIRED);
        } else {
            check_max_length(&mut errors, "first_name", first_name, 150);
        }

        let last_name = self.last_name.trim();
        if last_name.is_empty() {
            errors.add("last_name", REQUIRED);
        } else {
            check_max_length(&mut errors, "last_name", last_name, 150);
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.add("email", REQUIRED);
        } else {
            check_max_length(&mut errors, "email", email, 254);
            if !is_valid_email(email) {
                errors.add("email", "Enter a valid email address.");
            }
        }

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        } else {
            if self.password1.chars().count() < 8 {
                errors.add(
                    "password1",
                    "This password is too short. It must contain at least 8 characters.",
                );
            }
            if self.password1.chars().all(|c| c.is_ascii_digit()) {
                errors.add("password1", "This password is entirely numeric.");
            }
        }

        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        } else if !self.password1.is_empty() && self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Raw complaint submission as it arrives from the multipart form. Everything
/// is text at this point; `validate` produces the typed insert payload.
#[derive(Debug, Default)]
pub struct ComplaintForm {
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: String,
    pub location: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub attachment: Option<UploadedFile>,
}

impl ComplaintForm {
    pub fn set_field(&mut self, name: &str, value: String) {
        match name {
            "title" => self.title = value,
            "description" => self.description = value,
            "category" => self.category = value,
            "priority" => self.priority = value,
            "location" => self.location = value,
            "contact_email" => self.contact_email = value,
            "contact_phone" => self.contact_phone = value,
            _ => {}
        }
    }

    pub fn validate(&self) -> Result<NewComplaint, FieldErrors> {
        let mut errors = FieldErrors::default();

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", REQUIRED);
        } else {
            check_max_length(&mut errors, "title", title, 200);
        }

        let description = self.description.trim();
        if description.is_empty() {
            errors.add("description", REQUIRED);
        }

        let category = self.category.trim();
        let category_id = if category.is_empty() {
            None
        } else {
            match uuid::Uuid::parse_str(category) {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add(
                        "category",
                        "Select a valid choice. That choice is not one of the available choices.",
                    );
                    None
                }
            }
        };

        let priority = self.priority.trim();
        let priority = if priority.is_empty() {
            ComplaintPriority::default()
        } else {
            match ComplaintPriority::from_str(priority) {
                Ok(p) => p,
                Err(_) => {
                    errors.add(
                        "priority",
                        format!(
                            "Select a valid choice. {priority} is not one of the available choices."
                        ),
                    );
                    ComplaintPriority::default()
                }
            }
        };

        let location = self.location.trim();
        check_max_length(&mut errors, "location", location, 200);

        let contact_email = self.contact_email.trim();
        if !contact_email.is_empty() {
            check_max_length(&mut errors, "contact_email", contact_email, 254);
            if !is_valid_email(contact_email) {
                errors.add("contact_email", "Enter a valid email address.");
            }
        }

        let contact_phone = self.contact_phone.trim();
        check_max_length(&mut errors, "contact_phone", contact_phone, 20);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewComplaint {
            title: title.to_string(),
            description: description.to_string(),
            category_id,
            priority,
            location: location.to_string(),
            contact_email: contact_email.to_string(),
            contact_phone: contact_phone.to_string(),
            attachment: None,
        })
    }
}
