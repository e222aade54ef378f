#![allow(dead_code)]

use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{middleware::Logger, web, App};
use chrono::Utc;
use serde_json::{json, Value};

use globetrotter_api::commands::auth::{Login, Signup};
use globetrotter_api::config::Config;
use globetrotter_api::db::memory::MemoryStore;
use globetrotter_api::db::UserStore;
use globetrotter_api::models::user::UserRole;
use globetrotter_api::{configure_app, AppState};

pub const PASSWORD: &str = "correct-horse-battery";

/// A signed-in account created directly through the service layer.
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestUser {
    pub fn bearer(&self) -> (&'static str, String) {
        bearer(&self.access_token)
    }
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub struct TestApp {
    pub state: web::Data<AppState<MemoryStore>>,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            state: web::Data::new(AppState::new(MemoryStore::new(), Config::default())),
        }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(configure_app(self.state.clone()))
    }

    pub async fn register(&self, name: &str, email: &str) -> TestUser {
        let session = self
            .state
            .auth()
            .signup(Signup {
                name: name.to_string(),
                email: email.to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .expect("signup failed");
        TestUser {
            id: session.user.id,
            email: email.to_string(),
            access_token: session.tokens.access_token,
            refresh_token: session.tokens.refresh_token,
        }
    }

    /// Registers an account, promotes it, then logs in again so the access
    /// token carries the new role.
    pub async fn register_with_role(&self, name: &str, email: &str, role: UserRole) -> TestUser {
        self.register(name, email).await;
        let mut user = self
            .state
            .store
            .find_user_by_email(email)
            .await
            .unwrap()
            .expect("user missing");
        user.role = role;
        user.updated_at = Utc::now();
        self.state.store.save_user(&user).await.unwrap();

        let session = self
            .state
            .auth()
            .login(Login {
                email: email.to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .expect("login failed");
        TestUser {
            id: session.user.id,
            email: email.to_string(),
            access_token: session.tokens.access_token,
            refresh_token: session.tokens.refresh_token,
        }
    }
}

pub fn trip_body(name: &str) -> Value {
    json!({
        "name": name,
        "startDate": "2025-06-10",
        "endDate": "2025-06-16",
        "budget": { "amount": 2400, "currency": "USD" }
    })
}

pub fn paris() -> Value {
    json!({ "id": "paris-france", "name": "Paris", "country": "France" })
}

pub fn eiffel() -> Value {
    json!({
        "id": "eiffel",
        "name": "Eiffel Tower",
        "category": "Sightseeing",
        "cost": "High",
        "duration": "1–3 hrs"
    })
}
