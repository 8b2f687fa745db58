//! User management routes
//!
//! Login is public; everything else sits behind [`RequireAuth`].

use crate::auth::middleware::RequireAuth;
use crate::user::error::UserError;
use crate::user::handlers;
use actix_web::web;

/// Configure user management routes
pub fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/user")
            .route("/login", web::post().to(handlers::login))
            .service(
                web::scope("")
                    .wrap(RequireAuth::default())
                    .route("/getCurrentUser", web::get().to(handlers::get_current_user))
                    .route("/save", web::post().to(handlers::save_user))
                    .route("/update", web::put().to(handlers::update_user))
                    .route("/delete", web::delete().to(handlers::delete_user))
                    .route("/sendMail", web::post().to(handlers::send_mail))
                    .route("/disable", web::post().to(handlers::disable))
                    .route("/enable", web::post().to(handlers::enable)),
            ),
    );
}

/// Render body and query parse failures as failure envelopes
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| UserError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::FormConfig::default()
            .error_handler(|err, _req| UserError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| UserError::BadRequest(err.to_string()).into()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_protected_routes_need_token() {
        let app = test::init_service(App::new().configure(configure_user_routes)).await;

        for (method, uri) in [
            ("GET", "/api/user/getCurrentUser"),
            ("POST", "/api/user/save"),
            ("PUT", "/api/user/update"),
            ("DELETE", "/api/user/delete?userId=1"),
            ("POST", "/api/user/sendMail"),
            ("POST", "/api/user/disable"),
            ("POST", "/api/user/enable"),
        ] {
            let req = test::TestRequest::default()
                .method(method.parse().unwrap())
                .uri(uri)
                .to_request();
            let resp = test::call_service(&app, req).await;

            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        }
    }
}
