//! User API handlers
//!
//! One handler per endpoint under `/api/user`. Each handler checks its
//! inputs, calls the service and answers with a [`JsonData`] envelope;
//! failures travel as [`UserError`] and are rendered as failure envelopes.

use actix_web::{web, Either, HttpResponse};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    auth::middleware::AuthenticatedUser,
    user::{
        dto::{non_empty, LoginForm, SendMailForm, TokenResponse, UserForm, UserIdForm},
        error::UserError,
        models::{UserChanges, STATE_DISABLED, STATE_ENABLED},
        AppState,
    },
    utils::response_handler::JsonData,
};

pub const EMPTY_USER_ID: &str = "用户id不能为空！";
pub const EMPTY_MAIL: &str = "邮箱不能为空！";
pub const INVALID_MAIL: &str = "邮箱格式不正确！";
pub const RESET_MAIL_SUBJECT: &str = "重置密码";

static MAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)+$").expect("mail regex is valid")
});

/// Body sent as JSON or as an urlencoded form
pub type Payload<T> = Either<web::Json<T>, web::Form<T>>;

fn into_form<T>(payload: Payload<T>) -> T {
    match payload {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    }
}

fn require_user_id(user_id: Option<i32>) -> Result<i32, UserError> {
    user_id.ok_or_else(|| UserError::Validation(EMPTY_USER_ID.to_string()))
}

/// Success with the row count when something was written, else a failure
/// envelope carrying `failed`
fn affected(count: u64, succeeded: &str, failed: &str) -> Result<HttpResponse, UserError> {
    if count > 0 {
        Ok(JsonData::success(count, succeeded).into_response())
    } else {
        Err(UserError::Persistence(failed.to_string()))
    }
}

/// POST /api/user/login
pub async fn login(
    state: web::Data<AppState>,
    payload: Payload<LoginForm>,
) -> Result<HttpResponse, UserError> {
    let form = into_form(payload);

    let user = state
        .users
        .authenticate(form.user_name.as_deref(), form.user_password.as_deref())
        .await?;
    let token = state
        .jwt
        .issue(user.user_id)
        .map_err(|e| UserError::Internal(e.to_string()))?;

    log::info!("User '{}' logged in", user.user_name);
    Ok(JsonData::success(TokenResponse { token }, "登录成功！").into_response())
}

/// GET /api/user/getCurrentUser
pub async fn get_current_user(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, UserError> {
    let user = state
        .users
        .find_user_by_user_id(caller.user_id)
        .await?
        .ok_or(UserError::UserNotFound)?;

    Ok(JsonData::success(user.without_password(), "查询成功").into_response())
}

/// POST /api/user/save
pub async fn save_user(
    state: web::Data<AppState>,
    payload: Payload<UserForm>,
) -> Result<HttpResponse, UserError> {
    let form = into_form(payload);

    let count = state
        .users
        .save_user(form.user_name.as_deref(), form.user_password.as_deref(), form.user_state)
        .await?;

    affected(count, "添加成功", "添加失败")
}

/// PUT /api/user/update
pub async fn update_user(
    state: web::Data<AppState>,
    payload: Payload<UserForm>,
) -> Result<HttpResponse, UserError> {
    let form = into_form(payload);
    let user_id = require_user_id(form.user_id)?;

    let changes = UserChanges {
        user_name: form.user_name,
        user_password: form.user_password,
        user_state: form.user_state,
    };
    let count = state.users.update_user(user_id, changes).await?;

    affected(count, "更新成功", "更新失败")
}

/// DELETE /api/user/delete?userId=
pub async fn delete_user(
    state: web::Data<AppState>,
    query: web::Query<UserIdForm>,
) -> Result<HttpResponse, UserError> {
    let user_id = require_user_id(query.user_id)?;
    let count = state.users.delete_user(user_id).await?;

    affected(count, "删除成功", "删除失败")
}

/// POST /api/user/sendMail
///
/// Resets the password to the configured default, then mails it. Delivery
/// is best effort: once the reset is stored the call succeeds even if the
/// mail can't be sent.
pub async fn send_mail(
    state: web::Data<AppState>,
    payload: Payload<SendMailForm>,
) -> Result<HttpResponse, UserError> {
    let form = into_form(payload);
    let user_id = require_user_id(form.user_id)?;
    let to_mail = non_empty(&form.to_mail)
        .map(str::trim)
        .ok_or_else(|| UserError::Validation(EMPTY_MAIL.to_string()))?;
    if !MAIL_REGEX.is_match(to_mail) {
        return Err(UserError::Validation(INVALID_MAIL.to_string()));
    }

    let count = state.users.reset_password(user_id, &state.reset_password).await?;
    if count > 0 {
        let content = format!("您的初始密码为：{}", state.reset_password);
        if let Err(err) = state.mailer.send_simple_mail(to_mail, RESET_MAIL_SUBJECT, &content).await {
            log::warn!("Password of user {} was reset but the mail to {} failed: {}", user_id, to_mail, err);
        }
    }

    affected(count, "重置密码成功", "重置密码失败")
}

/// POST /api/user/disable
pub async fn disable(
    state: web::Data<AppState>,
    payload: Payload<UserIdForm>,
) -> Result<HttpResponse, UserError> {
    let user_id = require_user_id(into_form(payload).user_id)?;
    let count = state.users.set_state(user_id, STATE_DISABLED).await?;

    affected(count, "禁用成功", "禁用失败")
}

/// POST /api/user/enable
pub async fn enable(
    state: web::Data<AppState>,
    payload: Payload<UserIdForm>,
) -> Result<HttpResponse, UserError> {
    let user_id = require_user_id(into_form(payload).user_id)?;
    let count = state.users.set_state(user_id, STATE_ENABLED).await?;

    affected(count, "启用成功", "启用失败")
}
