/// Login and registration forms
///
/// Field validation runs before any provider call; provider rejections are
/// turned into the message shown above the form.
use crate::auth::error::{AuthError, ProviderErrorCode};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_NAME_LEN: usize = 2;

pub const LOGIN_FAILED: &str = "Login gagal. Coba lagi.";
pub const REGISTER_FAILED: &str = "Registrasi gagal. Coba lagi.";

static EMAIL_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(email))
}

/// A rejected field and its message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if !is_valid_email(self.email.trim()) {
            errors.push(FieldError::new("email", "Email tidak valid"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::new("password", "Password minimal 6 karakter"));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.name.trim().chars().count() < MIN_NAME_LEN {
            errors.push(FieldError::new("name", "Nama minimal 2 karakter"));
        }
        if !is_valid_email(self.email.trim()) {
            errors.push(FieldError::new("email", "Email tidak valid"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::new("password", "Password minimal 6 karakter"));
        }
        if self.confirm_password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::new(
                "confirmPassword",
                "Konfirmasi password minimal 6 karakter",
            ));
        } else if self.confirm_password != self.password {
            errors.push(FieldError::new(
                "confirmPassword",
                "Password dan konfirmasi tidak cocok",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Message shown on the login form for a failed sign-in
pub fn login_error_message(err: &AuthError) -> &'static str {
    match err.provider_code() {
        Some(ProviderErrorCode::UserNotFound) => "Email tidak ditemukan.",
        Some(ProviderErrorCode::WrongPassword) => "Password salah.",
        Some(ProviderErrorCode::InvalidEmail) => "Format email tidak valid.",
        Some(ProviderErrorCode::UserDisabled) => "Akun telah dinonaktifkan.",
        Some(ProviderErrorCode::TooManyRequests) => {
            "Terlalu banyak percobaan login. Coba lagi nanti."
        }
        Some(ProviderErrorCode::InvalidCredential) => "Email atau password salah.",
        _ => LOGIN_FAILED,
    }
}
