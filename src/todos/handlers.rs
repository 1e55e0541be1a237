use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::{request::Parts, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument};

use crate::{
    auth::jwt::AuthUser,
    db::{Db, StoreError},
    state::AppState,
    todos::repo_types::{Todo, TodoFields},
};

pub fn todo_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_todos))
        .route("/todo", post(create_todo))
        .route(
            "/todo/:id",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
}

type ApiError = (StatusCode, String);

fn internal(e: StoreError) -> ApiError {
    error!(error = %e, "todo store failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".into())
}

fn not_found() -> ApiError {
    (StatusCode::NOT_FOUND, "Todo not found".into())
}

/// A positive todo id from the path. Extract it before `Db` so a bad id is
/// refused without waiting on the pool.
pub struct TodoId(pub i64);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for TodoId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|e| (e.status(), e.body_text()))?;
        if id > 0 {
            Ok(TodoId(id))
        } else {
            Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                "todo id must be a positive integer".into(),
            ))
        }
    }
}

#[instrument(skip(db, user), fields(user_id = user.id))]
pub async fn list_todos(
    AuthUser(user): AuthUser,
    Db(mut db): Db,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let todos = db.list_todos(user.id).await.map_err(internal)?;
    Ok(Json(todos))
}

#[instrument(skip(db, user), fields(user_id = user.id))]
pub async fn get_todo(
    AuthUser(user): AuthUser,
    TodoId(id): TodoId,
    Db(mut db): Db,
) -> Result<Json<Todo>, ApiError> {
    db.get_todo(user.id, id)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip(db, user, body), fields(user_id = user.id))]
pub async fn create_todo(
    AuthUser(user): AuthUser,
    Db(mut db): Db,
    Json(body): Json<TodoFields>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let todo = db.create_todo(user.id, body).await.map_err(internal)?;
    info!(todo_id = todo.id, "todo created");
    Ok((StatusCode::CREATED, Json(todo)))
}

#[instrument(skip(db, user, body), fields(user_id = user.id))]
pub async fn update_todo(
    AuthUser(user): AuthUser,
    TodoId(id): TodoId,
    Db(mut db): Db,
    Json(body): Json<TodoFields>,
) -> Result<Json<Todo>, ApiError> {
    db.update_todo(user.id, id, body)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(not_found)
}

#[instrument(skip(db, user), fields(user_id = user.id))]
pub async fn delete_todo(
    AuthUser(user): AuthUser,
    TodoId(id): TodoId,
    Db(mut db): Db,
) -> Result<StatusCode, ApiError> {
    if db.delete_todo(user.id, id).await.map_err(internal)? {
        info!(todo_id = id, "todo deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, header::COOKIE, Request},
        response::Response,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        app::build_app,
        auth::{jwt::JwtKeys, repo::UserRepo, repo_types::NewUser},
        db::memory::{MemoryDatabase, UnavailableDatabase},
    };

    async fn seed_user(db: &MemoryDatabase, username: &str) -> String {
        let mut store = db.clone();
        let user = store
            .create_user(NewUser {
                username: username.into(),
                email: format!("{username}@example.com"),
                first_name: "F".into(),
                last_name: "L".into(),
                hashed_password: "unused".into(),
                role: "user".into(),
                phone_number: None,
            })
            .await
            .unwrap();
        let token = JwtKeys::new("test-secret").issue(&user.username, user.id).unwrap();
        format!("access_token={token}")
    }

    fn request(method: &str, uri: &str, cookie: &str, body: Option<&str>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(COOKIE, cookie)
            .header(CONTENT_TYPE, "application/json");
        builder
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap()
    }

    async fn send(db: &MemoryDatabase, req: Request<Body>) -> Response {
        build_app(AppState::fake_with(db.clone()))
            .oneshot(req)
            .await
            .unwrap()
    }

    async fn json(res: Response) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn crud_roundtrip_for_owner() {
        let db = MemoryDatabase::default();
        let cookie = seed_user(&db, "ada").await;

        let res = send(
            &db,
            request(
                "POST",
                "/todo",
                &cookie,
                Some(r#"{"title":"milk","description":"2 litres","priority":3}"#),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let created = json(res).await;
        let id = created["id"].as_i64().unwrap();
        assert_eq!(created["complete"], false);

        let res = send(&db, request("GET", &format!("/todo/{id}"), &cookie, None)).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json(res).await["title"], "milk");

        let res = send(
            &db,
            request(
                "PUT",
                &format!("/todo/{id}"),
                &cookie,
                Some(r#"{"title":"milk","description":"2 litres","priority":1,"complete":true}"#),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json(res).await["complete"], true);

        let res = send(&db, request("GET", "/", &cookie, None)).await;
        assert_eq!(json(res).await.as_array().unwrap().len(), 1);

        let res = send(&db, request("DELETE", &format!("/todo/{id}"), &cookie, None)).await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let res = send(&db, request("GET", &format!("/todo/{id}"), &cookie, None)).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_todo_is_not_found() {
        let db = MemoryDatabase::default();
        let cookie = seed_user(&db, "ada").await;
        let res = send(&db, request("GET", "/todo/999", &cookie, None)).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_positive_id_is_rejected() {
        let db = MemoryDatabase::default();
        let cookie = seed_user(&db, "ada").await;
        for uri in ["/todo/0", "/todo/-3"] {
            let res = send(&db, request("GET", uri, &cookie, None)).await;
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[tokio::test]
    async fn todos_of_other_users_are_invisible() {
        let db = MemoryDatabase::default();
        let ada = seed_user(&db, "ada").await;
        let bob = seed_user(&db, "bob").await;

        let res = send(
            &db,
            request("POST", "/todo", &ada, Some(r#"{"title":"secret","priority":5}"#)),
        )
        .await;
        let id = json(res).await["id"].as_i64().unwrap();

        let res = send(&db, request("GET", &format!("/todo/{id}"), &bob, None)).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res = send(&db, request("DELETE", &format!("/todo/{id}"), &bob, None)).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res = send(&db, request("GET", "/", &bob, None)).await;
        assert!(json(res).await.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn tampered_cookie_is_unauthorized() {
        let db = MemoryDatabase::default();
        let res = send(&db, request("GET", "/", "access_token=garbage", None)).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"Could not validate user.");
    }

    #[tokio::test]
    async fn non_positive_id_is_refused_before_storage() {
        let cookie = seed_user(&MemoryDatabase::default(), "ada").await;
        let app = build_app(AppState::fake_with(UnavailableDatabase));
        for method in ["GET", "PUT", "DELETE"] {
            let body = Some(r#"{"title":"x","priority":1}"#);
            let res = app
                .clone()
                .oneshot(request(method, "/todo/0", &cookie, body))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }
}
