use tracing::{info, warn};

use crate::data::AuthService;
use crate::dummyjson::ApiError;

pub const DEMO_USERNAME: &str = "emilys";
pub const DEMO_PASSWORD: &str = "emilyspass";

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Username and password are required.")]
    MissingFields,
    #[error("Login failed: {0}")]
    Rejected(String),
    #[error("Network error. Try again.")]
    Network,
}

impl From<ApiError> for LoginError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { message, .. } => LoginError::Rejected(message),
            // An unreadable body counts as a network failure too.
            ApiError::Transport(_) | ApiError::Decode(_) | ApiError::InvalidUrl(_) => {
                LoginError::Network
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub token: String,
    pub display_name: String,
}

/// Sends credentials and returns the issued token. Persisting it is left to
/// the caller.
pub fn submit_login(
    service: &dyn AuthService,
    username: &str,
    password: &str,
) -> Result<LoginSuccess, LoginError> {
    if username.is_empty() || password.is_empty() {
        return Err(LoginError::MissingFields);
    }
    let response = service.login(username, password).map_err(|err| {
        warn!(username, error = %err, "login failed");
        LoginError::from(err)
    })?;
    if response.token.is_empty() {
        warn!(username, "login response carried no token");
        return Err(LoginError::Network);
    }
    info!(username, "login accepted");
    let display_name = match (response.first_name.is_empty(), response.last_name.is_empty()) {
        (false, false) => format!("{} {}", response.first_name, response.last_name),
        (false, true) => response.first_name,
        _ if !response.username.is_empty() => response.username,
        _ => username.to_string(),
    };
    Ok(LoginSuccess {
        token: response.token,
        display_name,
    })
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum LoginField {
    #[default]
    Username,
    Password,
    Submit,
}

impl LoginField {
    fn next(self) -> Self {
        match self {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Submit,
            LoginField::Submit => LoginField::Username,
        }
    }

    fn previous(self) -> Self {
        match self {
            LoginField::Username => LoginField::Submit,
            LoginField::Password => LoginField::Username,
            LoginField::Submit => LoginField::Password,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            LoginField::Username => "Username",
            LoginField::Password => "Password",
            LoginField::Submit => "Login",
        }
    }
}

#[derive(Debug, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub active: LoginField,
    pub message: Option<String>,
    pub in_progress: bool,
}

impl LoginForm {
    pub fn next(&mut self) {
        self.active = self.active.next();
    }

    pub fn previous(&mut self) {
        self.active = self.active.previous();
    }

    pub fn set_message<S: Into<String>>(&mut self, message: S) {
        self.message = Some(message.into());
    }

    fn active_value_mut(&mut self) -> Option<&mut String> {
        match self.active {
            LoginField::Username => Some(&mut self.username),
            LoginField::Password => Some(&mut self.password),
            LoginField::Submit => None,
        }
    }

    pub fn insert_char(&mut self, ch: char) {
        if let Some(value) = self.active_value_mut() {
            value.push(ch);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(value) = self.active_value_mut() {
            value.pop();
        }
    }

    pub fn clear_active(&mut self) {
        if let Some(value) = self.active_value_mut() {
            value.clear();
        }
    }

    pub fn display_value(&self, field: LoginField) -> String {
        match field {
            LoginField::Username => self.username.clone(),
            LoginField::Password => "•".repeat(self.password.chars().count()),
            LoginField::Submit => String::new(),
        }
    }

    /// Marks the form busy and returns the credentials to send, or `None`
    /// when a request is already running.
    pub fn begin_submit(&mut self) -> Option<(String, String)> {
        if self.in_progress {
            return None;
        }
        self.in_progress = true;
        self.set_message("Logging in...");
        Some((self.username.clone(), self.password.clone()))
    }

    pub fn finish_submit(&mut self, result: &Result<LoginSuccess, LoginError>) {
        self.in_progress = false;
        match result {
            Ok(_) => {
                self.set_message("Login successful!");
                self.password.clear();
            }
            Err(err) => self.set_message(err.to_string()),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MockAuthService;

    #[test]
    fn accepts_demo_credentials() {
        let service = MockAuthService::default();
        let success = submit_login(&service, DEMO_USERNAME, DEMO_PASSWORD).unwrap();
        assert_eq!(success.token, "mock-token-emilys");
        assert_eq!(success.display_name, "Emily Johnson");
    }

    #[test]
    fn rejected_login_uses_server_message() {
        let service = MockAuthService::default();
        let err = submit_login(&service, DEMO_USERNAME, "wrong").unwrap_err();
        assert_eq!(err.to_string(), "Login failed: Invalid credentials");
    }

    #[test]
    fn empty_fields_are_refused_locally() {
        let service = MockAuthService::default();
        let err = submit_login(&service, "", DEMO_PASSWORD).unwrap_err();
        assert!(matches!(err, LoginError::MissingFields));
        let err = submit_login(&service, DEMO_USERNAME, "").unwrap_err();
        assert!(matches!(err, LoginError::MissingFields));
    }

    #[test]
    fn network_failure_message_is_generic() {
        assert_eq!(LoginError::Network.to_string(), "Network error. Try again.");
    }

    #[test]
    fn form_edits_only_text_fields() {
        let mut form = LoginForm::default();
        for ch in "emilys".chars() {
            form.insert_char(ch);
        }
        form.next();
        for ch in "pw".chars() {
            form.insert_char(ch);
        }
        form.backspace();
        form.next();
        form.insert_char('x');
        assert_eq!(form.username, "emilys");
        assert_eq!(form.password, "p");
        assert_eq!(form.display_value(LoginField::Password), "•");
        form.previous();
        form.clear_active();
        assert!(form.password.is_empty());
    }

    #[test]
    fn submit_tracks_progress_and_outcome() {
        let mut form = LoginForm::default();
        assert!(form.begin_submit().is_some());
        assert_eq!(form.message.as_deref(), Some("Logging in..."));
        assert!(form.begin_submit().is_none());

        form.finish_submit(&Err(LoginError::Rejected("Invalid credentials".into())));
        assert!(!form.in_progress);
        assert_eq!(
            form.message.as_deref(),
            Some("Login failed: Invalid credentials")
        );
    }
}
