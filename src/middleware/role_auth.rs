use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::error::AppError;
use crate::middleware::auth::{reject, Claims};
use crate::models::user::UserRole;

/// Gates a scope on the caller's role claim. Must run after
/// `AuthMiddleware`, i.e. be registered with `.wrap()` before it.
pub struct RequireRole {
    required_role: UserRole,
}

impl RequireRole {
    pub fn new(role: UserRole) -> Self {
        RequireRole {
            required_role: role,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireRoleService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleService {
            service,
            required_role: self.required_role,
        }))
    }
}

pub struct RequireRoleService<S> {
    service: S,
    required_role: UserRole,
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let role = req.extensions().get::<Claims>().map(|claims| claims.role);

        match role {
            Some(role) if role.satisfies(self.required_role) => {
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Some(role) => {
                log::warn!(
                    "Denied {} {}: role {} lacks {}",
                    req.method(),
                    req.path(),
                    role,
                    self.required_role
                );
                reject(req, AppError::Forbidden("Insufficient permissions".to_string()))
            }
            None => reject(req, AppError::Unauthorized("No authorization".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{test, web, App, HttpResponse};
    use chrono::Utc;
    use serde_json::Value;

    use super::*;
    use crate::config::Config;
    use crate::middleware::auth::AuthMiddleware;
    use crate::models::user::User;
    use crate::services::token_service::TokenService;

    fn token_for(tokens: &TokenService, role: UserRole) -> String {
        let mut user = User::new(
            "Ada".into(),
            "ada@example.com".into(),
            "hash".into(),
            Utc::now(),
        );
        user.id = Some(bson::oid::ObjectId::new());
        user.role = role;
        tokens.issue_access(&user, Utc::now()).unwrap()
    }

    #[actix_rt::test]
    async fn test_gate_answers_with_error_responses() {
        let tokens = TokenService::new(&Config::default());
        let app = test::init_service(
            App::new().app_data(web::Data::new(tokens.clone())).service(
                web::scope("/admin")
                    .wrap(RequireRole::new(UserRole::Admin))
                    .wrap(AuthMiddleware)
                    .route("", web::get().to(|| async { HttpResponse::Ok().finish() })),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/admin").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "unauthorized");

        let req = test::TestRequest::get()
            .uri("/admin")
            .insert_header((
                "Authorization",
                format!("Bearer {}", token_for(&tokens, UserRole::User)),
            ))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Insufficient permissions");

        let req = test::TestRequest::get()
            .uri("/admin")
            .insert_header((
                "Authorization",
                format!("Bearer {}", token_for(&tokens, UserRole::SuperAdmin)),
            ))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);
    }
}
