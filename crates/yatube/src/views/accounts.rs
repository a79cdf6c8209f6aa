//! Registration, login and logout.
use salvo::prelude::*;
use salvo::session::SessionDepotExt;
use yatube_core::NewUser;

use super::{found, render};
use crate::auth::{DepotViewerExt, SESSION_USER_KEY, is_local_path};
use crate::forms::{FieldErrors, LoginForm, SignupForm};
use crate::state::AppState;
use crate::templates::{Layout, LoginTemplate, SignupTemplate};
use crate::{AppError, AppResult};

fn signup_page(
    viewer: Option<&yatube_core::User>,
    form: &SignupForm,
    errors: FieldErrors,
) -> SignupTemplate {
    SignupTemplate {
        layout: Layout::new(viewer),
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        username: form.username.clone(),
        errors,
    }
}

/// `GET /auth/signup/`
#[handler]
pub async fn signup_form(depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    render(res, &signup_page(depot.viewer(), &SignupForm::default(), FieldErrors::default()))
}

/// `POST /auth/signup/`: creates the account and sends the new user to the index.
#[handler]
pub async fn signup(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let state = AppState::from_depot(depot)?;
    let form = req.parse_form::<SignupForm>().await.unwrap_or_default();
    if let Err(errors) = form.validate() {
        return render(res, &signup_page(depot.viewer(), &form, errors));
    }
    let created = state
        .store
        .create_user(NewUser {
            username: form.username.clone(),
            first_name: form.first_name.trim().to_owned(),
            last_name: form.last_name.trim().to_owned(),
            password_hash: state.passwords.hash(&form.password1)?,
        })
        .await;
    match created {
        Ok(user) => {
            tracing::info!(username = %user.username, "user signed up");
            res.render(found("/")?);
            Ok(())
        }
        Err(yatube_core::Error::Conflict(_)) => {
            let mut errors = FieldErrors::default();
            errors.add("username", "A user with that username already exists.");
            render(res, &signup_page(depot.viewer(), &form, errors))
        }
        Err(e) => Err(e.into()),
    }
}

/// `GET /auth/login/`
#[handler]
pub async fn login_form(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    render(
        res,
        &LoginTemplate {
            layout: Layout::new(depot.viewer()),
            username: String::new(),
            next: req.query::<String>("next").unwrap_or_default(),
            errors: FieldErrors::default(),
        },
    )
}

/// `POST /auth/login/`: starts a session and follows a local `next`.
#[handler]
pub async fn login(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    let state = AppState::from_depot(depot)?;
    let form = req.parse_form::<LoginForm>().await.unwrap_or_default();
    let user = match state.store.user_by_username(&form.username).await {
        Ok(user) if state.passwords.verify(&form.password, &user.password_hash) => Some(user),
        Ok(_) => None,
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(e.into()),
    };
    let Some(user) = user else {
        tracing::debug!(username = %form.username, "login failed");
        let mut errors = FieldErrors::default();
        errors.add(
            FieldErrors::NON_FIELD,
            "Please enter a correct username and password. Note that both fields may be case-sensitive.",
        );
        return render(
            res,
            &LoginTemplate {
                layout: Layout::new(depot.viewer()),
                username: form.username,
                next: form.next,
                errors,
            },
        );
    };
    depot
        .session_mut()
        .ok_or_else(|| AppError::Session("no session in the depot".to_owned()))?
        .insert(SESSION_USER_KEY, user.id.0)
        .map_err(|e| AppError::Session(e.to_string()))?;
    tracing::info!(username = %user.username, "user logged in");
    let next = if is_local_path(&form.next) { form.next.as_str() } else { "/" };
    res.render(found(next)?);
    Ok(())
}

/// `GET /auth/logout/`
#[handler]
pub async fn logout(depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    if let Some(user) = depot.viewer() {
        tracing::info!(username = %user.username, "user logged out");
    }
    if let Some(session) = depot.session_mut() {
        session.remove(SESSION_USER_KEY);
    }
    res.render(found("/")?);
    Ok(())
}
