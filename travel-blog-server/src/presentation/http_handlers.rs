use crate::application::report::{self, REPORT_CONTENT_TYPE, REPORT_FILE_NAME};
use crate::application::{ImportService, PostQueryService, PostService, UserService};
use crate::domain::post::SavePostRequest;
use crate::domain::user::{OAuthUserRequest, SaveUserRequest};
use crate::domain::{DomainError, PostFilter, PostQuery};
use actix_multipart::Multipart;
use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpResponse, Responder};
use futures::StreamExt;
use std::sync::Arc;

/// Multipart field that carries the uploaded JSON document.
pub const UPLOAD_FIELD: &str = "file";

/// Upper bound for an uploaded document.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_bytes: usize,
}

// Тело ответа с ошибкой
#[derive(serde::Serialize)]
struct ErrorResponse {
    status: u16,
    error: &'static str,
    message: String,
}

// Преобразование DomainError в HttpResponse
pub fn error_to_response(err: DomainError) -> HttpResponse {
    let status = StatusCode::from_u16(err.to_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let message = match &err {
        DomainError::DatabaseError(_) | DomainError::InternalError(_) => {
            tracing::error!("Request failed: {}", err);
            "Internal server error".to_string()
        }
        DomainError::CreationFailed(_) | DomainError::MalformedInput(_) => {
            tracing::error!("Request failed: {}", err);
            err.to_string()
        }
        _ => {
            tracing::warn!("Request rejected: {}", err);
            err.to_string()
        }
    };

    HttpResponse::build(status).json(ErrorResponse {
        status: status.as_u16(),
        error: status.canonical_reason().unwrap_or("Error"),
        message,
    })
}

/// JSON extractor settings: unreadable bodies get the usual error envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = error_to_response(DomainError::invalid("body", &err.to_string()));
        actix_web::error::InternalError::from_response(err, response).into()
    })
}

// ============== User Handlers ==============

pub async fn list_users(user_service: web::Data<Arc<UserService>>) -> impl Responder {
    match user_service.get_all_users().await {
        Ok(users) => HttpResponse::Ok().json(users),
        Err(err) => error_to_response(err),
    }
}

pub async fn create_user(
    user_service: web::Data<Arc<UserService>>,
    req: web::Json<SaveUserRequest>,
) -> impl Responder {
    match user_service.create_user(req.into_inner()).await {
        Ok(user) => HttpResponse::Created().json(user),
        Err(err) => error_to_response(err),
    }
}

pub async fn update_user(
    user_service: web::Data<Arc<UserService>>,
    path: web::Path<i64>,
    req: web::Json<SaveUserRequest>,
) -> impl Responder {
    let user_id = path.into_inner();

    tracing::info!("Updating user id={}", user_id);

    match user_service.update_user(user_id, req.into_inner()).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(err) => error_to_response(err),
    }
}

pub async fn delete_user(
    user_service: web::Data<Arc<UserService>>,
    path: web::Path<i64>,
) -> impl Responder {
    let user_id = path.into_inner();

    tracing::info!("Deleting user id={}", user_id);

    match user_service.delete_user(user_id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_to_response(err),
    }
}

pub async fn oauth_user(
    user_service: web::Data<Arc<UserService>>,
    req: web::Json<OAuthUserRequest>,
) -> impl Responder {
    let req = req.into_inner();

    match user_service
        .get_or_create_oauth_user(&req.email, &req.name)
        .await
    {
        Ok(user) => HttpResponse::Ok().json(user.id),
        Err(err) => error_to_response(err),
    }
}

// ============== Post Handlers ==============

pub async fn create_post(
    post_service: web::Data<Arc<PostService>>,
    post_data: web::Json<SavePostRequest>,
) -> impl Responder {
    match post_service.create_post(post_data.into_inner()).await {
        Ok(post) => HttpResponse::Created().json(post),
        Err(err) => error_to_response(err),
    }
}

pub async fn get_post(
    post_service: web::Data<Arc<PostService>>,
    path: web::Path<i64>,
) -> impl Responder {
    let post_id = path.into_inner();

    tracing::info!("Getting post with id={}", post_id);

    match post_service.get_post(post_id).await {
        Ok(post) => HttpResponse::Ok().json(post),
        Err(err) => error_to_response(err),
    }
}

pub async fn update_post(
    post_service: web::Data<Arc<PostService>>,
    path: web::Path<i64>,
    post_data: web::Json<SavePostRequest>,
) -> impl Responder {
    let post_id = path.into_inner();

    tracing::info!("Updating post id={}", post_id);

    match post_service
        .update_post(post_id, post_data.into_inner())
        .await
    {
        Ok(post) => HttpResponse::Ok().json(post),
        Err(err) => error_to_response(err),
    }
}

pub async fn delete_post(
    post_service: web::Data<Arc<PostService>>,
    path: web::Path<i64>,
) -> impl Responder {
    let post_id = path.into_inner();

    tracing::info!("Deleting post id={}", post_id);

    match post_service.delete_post(post_id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_to_response(err),
    }
}

pub async fn search_posts(
    query_service: web::Data<Arc<PostQueryService>>,
    query: web::Json<PostQuery>,
) -> impl Responder {
    tracing::info!("Searching posts, page={} size={}", query.from, query.size);

    match query_service.search(&query).await {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(err) => error_to_response(err),
    }
}

pub async fn generate_report(
    query_service: web::Data<Arc<PostQueryService>>,
    filter: web::Json<PostFilter>,
) -> impl Responder {
    let posts = match query_service.export(&filter).await {
        Ok(posts) => posts,
        Err(err) => return error_to_response(err),
    };

    tracing::info!("Generating report for {} posts", posts.len());

    // workbook rendering is CPU-bound
    let rendered = web::block(move || report::generate_posts_report(&posts)).await;

    match rendered {
        Ok(Ok(bytes)) => HttpResponse::Ok()
            .content_type(REPORT_CONTENT_TYPE)
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", REPORT_FILE_NAME),
            ))
            .body(bytes),
        Ok(Err(err)) => error_to_response(err),
        Err(err) => error_to_response(DomainError::InternalError(err.to_string())),
    }
}

pub async fn upload_posts(
    import_service: web::Data<Arc<ImportService>>,
    limits: web::Data<UploadLimits>,
    payload: Multipart,
) -> impl Responder {
    let bytes = match read_upload(payload, limits.max_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => return error_to_response(err),
    };

    tracing::info!("Uploading posts from a {} byte document", bytes.len());

    match import_service.upload_from_json(&bytes).await {
        Ok(summary) => HttpResponse::Created().json(summary),
        Err(err) => error_to_response(err),
    }
}

/// Collects the bytes of the `file` field; other fields are drained and
/// ignored.
async fn read_upload(mut payload: Multipart, max_bytes: usize) -> Result<Vec<u8>, DomainError> {
    let mut document: Option<Vec<u8>> = None;

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(|e| {
            DomainError::MalformedInput(format!("Invalid multipart body: {}", e))
        })?;
        let is_file = field.name() == Some(UPLOAD_FIELD) && document.is_none();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| {
                DomainError::MalformedInput(format!("Invalid multipart body: {}", e))
            })?;
            if !is_file {
                continue;
            }
            if bytes.len() + chunk.len() > max_bytes {
                return Err(DomainError::invalid(
                    UPLOAD_FIELD,
                    &format!("file must not exceed {} bytes", max_bytes),
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        if is_file {
            document = Some(bytes);
        }
    }

    document.ok_or_else(|| DomainError::invalid(UPLOAD_FIELD, "file is required"))
}
