//! Login, logout and registration.

use secrecy::SecretString;
use winkel_core::Email;
use winkel_storefront::api::Registration;
use winkel_storefront::error::Result;
use winkel_storefront::state::AppState;

use crate::render;

/// Log in and store the session.
pub async fn login(state: &mut AppState, email: &str, password: String) -> Result<()> {
    let password = SecretString::from(password);
    let user = state.sign_in(email, &password).await?;
    render::message(&format!("Logged in as {}.", user.display_name()));
    Ok(())
}

pub fn logout(state: &mut AppState) {
    state.sign_out();
    render::message("Logged out.");
}

pub fn whoami(state: &AppState) {
    match state.session().current_user() {
        Some(user) => render::user(user),
        None => render::message("Not logged in."),
    }
}

/// Create an account. Logging in is a separate step.
pub async fn register(
    state: &AppState,
    email: Email,
    password: String,
    first_name: Option<String>,
    last_name: Option<String>,
) -> Result<()> {
    let registration = Registration {
        email,
        password: SecretString::from(password),
        first_name,
        last_name,
    };
    let user = state.register(&registration).await?;
    render::message(&format!(
        "Account created for {}. You can now log in.",
        user.email
    ));
    Ok(())
}
