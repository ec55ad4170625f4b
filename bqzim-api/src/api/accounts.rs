//! Signup and login endpoints
//!
//! Login only verifies credentials; no session or token is issued here.

use crate::error::FieldErrors;
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use bqzim_common::users::{self, NewUser, User};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const USERNAME_TAKEN: &str = "Username already exists.";
const EMAIL_TAKEN: &str = "Email already exists.";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Longest accepted username
const USERNAME_MAX_LEN: usize = 150;

/// POST /api/signup/ body
///
/// Every field is optional at the type level so missing fields become
/// per-field validation messages instead of a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Public user fields; credentials never leave the store
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
}

/// POST /api/signup/
///
/// **Response:** 201 with the created user (no password)
///
/// **Errors:**
/// - 400 with `{"field": ["message"]}` for missing, malformed or duplicate fields
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let new_user = validate_signup(payload)?;

    // Uniqueness checks only run once the fields themselves are well-formed
    let mut errors = FieldErrors::new();
    if users::username_exists(&state.db, &new_user.username).await? {
        push(&mut errors, "username", USERNAME_TAKEN);
    }
    if !new_user.email.is_empty() && users::email_exists(&state.db, &new_user.email).await? {
        push(&mut errors, "email", EMAIL_TAKEN);
    }
    if !errors.is_empty() {
        debug!("Signup rejected: {:?}", errors);
        return Err(ApiError::Validation(errors));
    }

    let user = users::create_user(&state.db, new_user)
        .await
        .map_err(|e| match e {
            bqzim_common::Error::Duplicate { field } if field == "username" => {
                ApiError::field("username", USERNAME_TAKEN)
            }
            bqzim_common::Error::Duplicate { field } if field == "email" => {
                ApiError::field("email", EMAIL_TAKEN)
            }
            other => ApiError::Common(other),
        })?;

    info!("New user signed up: {} (id {})", user.username, user.id);

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /api/login/
///
/// Unknown user, inactive user and wrong password are indistinguishable:
/// all answer 400 `{"error": "Invalid credentials"}`.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let (Some(username), Some(password)) = (payload.username, payload.password) else {
        return Err(ApiError::BadRequest(INVALID_CREDENTIALS.to_string()));
    };

    match users::authenticate(&state.db, &username, &password).await? {
        Some(user) => {
            info!("User logged in: {}", user.username);
            Ok(Json(LoginResponse {
                message: "Login successful!".to_string(),
            }))
        }
        None => {
            debug!("Failed login attempt for {:?}", username);
            Err(ApiError::BadRequest(INVALID_CREDENTIALS.to_string()))
        }
    }
}

/// Field-level checks that need no database access
fn validate_signup(payload: SignupRequest) -> ApiResult<NewUser> {
    let mut errors = FieldErrors::new();

    let username = payload.username.unwrap_or_default();
    let username = username.trim().to_string();
    if username.is_empty() {
        push(&mut errors, "username", REQUIRED);
    } else {
        if username.chars().count() > USERNAME_MAX_LEN {
            push(
                &mut errors,
                "username",
                &format!("Ensure this field has no more than {} characters.", USERNAME_MAX_LEN),
            );
        }
        if !is_valid_username(&username) {
            push(
                &mut errors,
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
    }

    let password = match payload.password {
        None => {
            push(&mut errors, "password", REQUIRED);
            String::new()
        }
        Some(p) if p.trim().is_empty() => {
            push(&mut errors, "password", BLANK);
            String::new()
        }
        Some(p) => p,
    };

    let email = payload.email.unwrap_or_default().trim().to_string();
    if !email.is_empty() && !is_valid_email(&email) {
        push(&mut errors, "email", "Enter a valid email address.");
    }

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    Ok(NewUser {
        username,
        email,
        first_name: payload.first_name.unwrap_or_default(),
        last_name: payload.last_name.unwrap_or_default(),
        password,
    })
}

fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

/// Minimal shape check: one `@`, non-empty local part, dotted domain
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && domain
            .split('.')
            .all(|label| !label.is_empty() && !label.contains('@'))
}

fn push(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

/// Build account routes
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/api/signup/", post(signup))
        .route("/api/login/", post(login))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: Option<&str>, password: Option<&str>, email: Option<&str>) -> SignupRequest {
        SignupRequest {
            username: username.map(String::from),
            password: password.map(String::from),
            email: email.map(String::from),
            ..Default::default()
        }
    }

    fn field_errors(result: ApiResult<NewUser>) -> FieldErrors {
        match result {
            Err(ApiError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {:?}", other.map(|u| u.username)),
        }
    }

    #[test]
    fn test_valid_signup() {
        let user = validate_signup(request(Some("tendai"), Some("pw"), Some("t@example.com"))).unwrap();
        assert_eq!(user.username, "tendai");
        assert_eq!(user.email, "t@example.com");
        assert_eq!(user.first_name, "");
    }

    #[test]
    fn test_missing_required_fields() {
        let errors = field_errors(validate_signup(request(None, None, None)));
        assert_eq!(errors["username"], vec![REQUIRED]);
        assert_eq!(errors["password"], vec![REQUIRED]);
        assert!(!errors.contains_key("email"));
    }

    #[test]
    fn test_blank_password() {
        let errors = field_errors(validate_signup(request(Some("tendai"), Some("   "), None)));
        assert_eq!(errors["password"], vec![BLANK]);
    }

    #[test]
    fn test_username_charset_and_length() {
        let errors = field_errors(validate_signup(request(Some("bad name!"), Some("pw"), None)));
        assert!(errors.contains_key("username"));

        let long = "a".repeat(USERNAME_MAX_LEN + 1);
        let errors = field_errors(validate_signup(request(Some(&long), Some("pw"), None)));
        assert!(errors["username"][0].contains("150"));

        assert!(validate_signup(request(Some("a.b+c-d_e@f"), Some("pw"), None)).is_ok());
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("user@example.co.zw"));
        assert!(!is_valid_email("user@localhost"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user@example..com"));
        assert!(!is_valid_email("us er@example.com"));

        let errors = field_errors(validate_signup(request(Some("tendai"), Some("pw"), Some("nope"))));
        assert_eq!(errors["email"], vec!["Enter a valid email address."]);
    }
}
