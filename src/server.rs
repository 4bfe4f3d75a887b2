// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! HTTP surface of the video manager.
//!
//! Thin JSON routes over [`CatalogService`]. Request bodies and responses use
//! camelCase keys. Failures always answer with the same shape:
//!
//! ```json
//! { "success": false, "error": "...", "fileUpdated": true, "git": { ... } }
//! ```
//!
//! where `fileUpdated` and `git` only show up when publishing failed after the
//! catalog file was already written.

use crate::{
    config::ManagerConfig,
    publish::{GitCli, PublishReport, VersionControl},
    service::{AddRequest, CatalogService, DeleteRequest, ReorderRequest, ServiceError},
};

use actix_web::{
    error::InternalError,
    http::StatusCode,
    middleware::Logger,
    web, App, HttpResponse, HttpServer, Responder, ResponseError,
};
use serde::Serialize;
use tracing::{info, instrument};

/// Register catalog routes.
pub fn configure<V>(cfg: &mut web::ServiceConfig)
where
    V: VersionControl,
{
    cfg.app_data(json_config())
        .service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/videos").route(web::get().to(list::<V>)))
        .service(web::resource("/add-video").route(web::post().to(add::<V>)))
        .service(web::resource("/delete-video").route(web::post().to(delete::<V>)))
        .service(web::resource("/reorder-videos").route(web::post().to(reorder::<V>)))
        .service(web::resource("/push").route(web::post().to(push::<V>)));
}

/// Serve catalog routes until shut down.
///
/// # Errors
///
/// - Return [`std::io::Error`] if listen address cannot be bound.
#[instrument(skip(config), level = "debug")]
pub async fn serve(config: ManagerConfig) -> std::io::Result<()> {
    let service = web::Data::new(CatalogService::from_config(&config));
    info!(
        "managing catalog {:?}, listening on http://{}",
        service.store().path().display(),
        config.server.listen_addr
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(service.clone())
            .configure(configure::<GitCli>)
    })
    .bind(config.server.listen_addr.as_str())?
    .run()
    .await
}

async fn index() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "Video Manager",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "GET /health": "Liveness probe",
            "GET /videos": "List projects and reels",
            "POST /add-video": "Add video (body: {category, title, videoUrl, embedId, thumbnail?, videoCategory?})",
            "POST /delete-video": "Remove video (body: {category, embedId})",
            "POST /reorder-videos": "Move videos to the front in order (body: {category, order})",
            "POST /push": "Retry pushing committed catalog changes"
        }
    }))
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "message": "Video Manager Server is running!"
    }))
}

async fn list<V: VersionControl>(
    service: web::Data<CatalogService<V>>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(service.list().await?))
}

async fn add<V: VersionControl>(
    service: web::Data<CatalogService<V>>,
    request: web::Json<AddRequest>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(service.add(request.into_inner()).await?))
}

async fn delete<V: VersionControl>(
    service: web::Data<CatalogService<V>>,
    request: web::Json<DeleteRequest>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(service.delete(request.into_inner()).await?))
}

async fn reorder<V: VersionControl>(
    service: web::Data<CatalogService<V>>,
    request: web::Json<ReorderRequest>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(service.reorder(request.into_inner()).await?))
}

async fn push<V: VersionControl>(
    service: web::Data<CatalogService<V>>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(service.push().await?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_updated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    git: Option<&'a PublishReport>,
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Duplicate { .. } | Self::PublishingDisabled => StatusCode::CONFLICT,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Publish { .. } | Self::Push { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            success: false,
            error: self.to_string(),
            file_updated: self.file_updated().then_some(true),
            git: self.report(),
        })
    }
}

// INVARIANT: Malformed bodies answer in the same shape as every other failure.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _| {
        let body = ErrorBody {
            success: false,
            error: err.to_string(),
            file_updated: None,
            git: None,
        };
        let response = HttpResponse::BadRequest().json(body);
        InternalError::from_response(err, response).into()
    })
}
