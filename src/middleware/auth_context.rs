use std::future::{ready, Ready};

use actix_web::{dev::Payload, Error, FromRequest, HttpMessage, HttpRequest};
use bson::oid::ObjectId;

use crate::error::AppError;
use crate::middleware::auth::Claims;
use crate::models::user::UserRole;

/// The caller behind a request that passed [`AuthMiddleware`].
///
/// [`AuthMiddleware`]: crate::middleware::auth::AuthMiddleware
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: ObjectId,
    pub email: String,
    pub role: UserRole,
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<Claims>().and_then(|claims| {
            ObjectId::parse_str(&claims.sub)
                .ok()
                .map(|user_id| AuthenticatedUser {
                    user_id,
                    email: claims.email.clone(),
                    role: claims.role,
                })
        });

        match user {
            Some(user) => ready(Ok(user)),
            None => ready(Err(AppError::Unauthorized(
                "User not authenticated".to_string(),
            )
            .into())),
        }
    }
}
