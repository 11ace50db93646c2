pub mod backup;
pub mod export;
pub mod question;
pub mod questionnaire;
pub mod report;
pub mod user;

use chrono::{Duration, Utc};
use log::info;

use crate::actix_web::{
    cookie::Cookie,
    web::{delete, get, post, put, resource, scope, Data, Json, ServiceConfig},
    HttpResponse,
};
use crate::config::Config;
use crate::context::UserInfo;
use crate::core::models::user::{Login, Profile};
use crate::core::ports::repository::{Store, UserCommon};
use crate::core::services::user::authenticate;
use crate::core::tokener::Tokener;
use crate::error::Error;
use crate::impls::tokener::jwt::JWT;
use crate::middlewares::jwt::{Claim, JWTMiddleware, JWT_TOKEN};
use crate::response::Token;
use crate::session::Sessions;

pub async fn login<S>(Json(login): Json<Login>, store: Data<S>, sessions: Data<Sessions>, config: Data<Config>) -> Result<HttpResponse, Error>
where
    S: UserCommon + 'static,
{
    let profile = authenticate(store.get_ref(), &login).await?;
    let exp = (Utc::now() + Duration::hours(config.token_ttl_hours)).timestamp();
    let sid = sessions.open(&profile.username, profile.role, exp);
    let claim = Claim {
        user: profile.username.clone(),
        sid,
        role: profile.role,
        exp,
    };
    let token = JWT::new(config.jwt_secret.clone()).gen_token(&claim)?;
    info!("{} logged in", profile.username);
    let cookie = Cookie::build(JWT_TOKEN, token.clone()).path("/").http_only(true).finish();
    Ok(HttpResponse::Ok().cookie(cookie).json(Token {
        token,
        username: profile.username,
        role: profile.role,
    }))
}

/// Closes the session; its unfinished questionnaire is dropped with it.
pub async fn logout(me: UserInfo, sessions: Data<Sessions>) -> Result<HttpResponse, Error> {
    sessions.close(&me.sid);
    info!("{} logged out", me.username);
    let mut cookie = Cookie::build(JWT_TOKEN, "").path("/").finish();
    cookie.make_removal();
    Ok(HttpResponse::NoContent().cookie(cookie).finish())
}

pub async fn me<S>(me: UserInfo, store: Data<S>) -> Result<Json<Profile>, Error>
where
    S: UserCommon + 'static,
{
    let users = store.users().await?;
    let user = users.get(&me.username).ok_or(Error::Unauthorized)?;
    Ok(Json(Profile::new(&me.username, user)))
}

/// Route table. Everything but `/login` goes through the JWT middleware.
pub fn routes<S>(secret: Vec<u8>) -> impl FnOnce(&mut ServiceConfig)
where
    S: Store + 'static,
{
    move |cfg| {
        cfg.service(resource("login").route(post().to(login::<S>))).service(
            scope("")
                .wrap(JWTMiddleware::new(secret))
                .service(resource("logout").route(post().to(logout)))
                .service(resource("me").route(get().to(me::<S>)))
                .service(
                    scope("users")
                        .route("", get().to(user::list::<S>))
                        .route("", post().to(user::create::<S>))
                        .route("{username}", delete().to(user::delete::<S>))
                        .route("{username}/password", put().to(user::change_password::<S>)),
                )
                .service(
                    scope("questions").route("", get().to(question::catalog::<S>)).service(
                        scope("groups")
                            .route("", post().to(question::add_group::<S>))
                            .route("{key}", put().to(question::update_group::<S>))
                            .route("{key}", delete().to(question::delete_group::<S>))
                            .route("{key}/questions", post().to(question::add_question::<S>))
                            .route("{key}/questions/{index}", put().to(question::update_question::<S>))
                            .route("{key}/questions/{index}", delete().to(question::delete_question::<S>)),
                    ),
                )
                .service(
                    scope("questionnaire")
                        .route("", post().to(questionnaire::start::<S>))
                        .route("", get().to(questionnaire::view))
                        .route("", delete().to(questionnaire::reset))
                        .route("answers/{index}", put().to(questionnaire::answer))
                        .route("comments/{index}/toggle", post().to(questionnaire::toggle_comment))
                        .route("next", post().to(questionnaire::next_group))
                        .route("previous", post().to(questionnaire::previous_group))
                        .route("finish", post().to(questionnaire::finish::<S>)),
                )
                .service(
                    scope("reports")
                        .route("overview", get().to(report::overview::<S>))
                        .route("dashboard", get().to(report::dashboard::<S>))
                        .route("comments", get().to(report::comments::<S>))
                        .route("filters", get().to(report::filters::<S>))
                        .route("groups/{key}/questions", get().to(report::group_questions::<S>)),
                )
                .service(
                    scope("exports")
                        .route("xlsx", get().to(export::xlsx::<S>))
                        .route("pdf", get().to(export::pdf::<S>)),
                )
                .service(
                    scope("backups")
                        .route("", get().to(backup::list::<S>))
                        .route("", post().to(backup::create::<S>))
                        .route("history", get().to(backup::history::<S>))
                        .route("stats", get().to(backup::stats::<S>))
                        .route("upload", post().to(backup::upload::<S>))
                        .route("{filename}", get().to(backup::download::<S>))
                        .route("{filename}/entries", get().to(backup::entries::<S>))
                        .route("{filename}/compare", get().to(backup::compare::<S>))
                        .route("{filename}/restore", post().to(backup::restore::<S>)),
                ),
        );
    }
}
