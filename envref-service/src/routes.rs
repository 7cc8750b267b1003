use crate::error::AppError;
use crate::state::{RebuildRecord, SharedState};
use axum::extract::{Path, State};
use axum::Json;
use envref_core::{Annotation, EnvVarDefinition, Hover, Location, Reference};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// GET /status
#[derive(Serialize)]
pub struct ServiceStatus {
    pub service: String,
    /// False until the first rebuild is installed
    pub ready: bool,
    pub generation: u64,
    pub names: usize,
    pub definitions: usize,
    pub roots: Vec<PathBuf>,
    pub last_rebuild: Option<RebuildRecord>,
}

pub async fn status(State(state): State<SharedState>) -> Json<ServiceStatus> {
    let index = state.resolver.status();
    Json(ServiceStatus {
        service: "envref-service".to_string(),
        ready: !index.generation.is_initial(),
        generation: index.generation.value(),
        names: index.names,
        definitions: index.definitions,
        roots: state.roots.iter().map(|r| r.path.clone()).collect(),
        last_rebuild: state.last_rebuild().await,
    })
}

// POST /reindex
pub async fn reindex(State(state): State<SharedState>) -> Result<Json<RebuildRecord>, AppError> {
    tracing::info!(roots = state.roots.len(), "POST /reindex started");
    let record = state.rebuild().await?;
    tracing::info!(
        generation = record.generation,
        installed = record.installed,
        definitions = record.stats.definitions,
        duration_ms = record.stats.duration_ms,
        "POST /reindex finished"
    );
    Ok(Json(record))
}

// GET /definitions/{name}
pub async fn definitions(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Json<Vec<EnvVarDefinition>> {
    Json(state.resolver.lookup_definitions(&name))
}

// POST /resolve
#[derive(Deserialize)]
pub struct ResolveRequest {
    pub name: String,
    pub origin: Option<PathBuf>,
}

pub async fn resolve(
    State(state): State<SharedState>,
    Json(req): Json<ResolveRequest>,
) -> Json<Vec<EnvVarDefinition>> {
    Json(state.resolver.resolve(&req.name, req.origin.as_deref()))
}

// POST /references/extract
#[derive(Deserialize)]
pub struct ExtractRequest {
    pub text: String,
}

pub async fn extract(
    State(state): State<SharedState>,
    Json(req): Json<ExtractRequest>,
) -> Json<Vec<Reference>> {
    Json(state.resolver.extract_references(&req.text))
}

// POST /reference_at
#[derive(Deserialize)]
pub struct ReferenceAtRequest {
    pub text: String,
    pub offset: usize,
}

pub async fn reference_at(
    State(state): State<SharedState>,
    Json(req): Json<ReferenceAtRequest>,
) -> Json<Option<Reference>> {
    Json(state.resolver.reference_at(&req.text, req.offset))
}

/// Cursor inside a document; `origin` is the document's path
#[derive(Deserialize)]
pub struct CursorRequest {
    pub text: String,
    pub offset: usize,
    pub origin: Option<PathBuf>,
}

impl CursorRequest {
    fn check(&self) -> Result<(), AppError> {
        if self.offset > self.text.len() {
            return Err(AppError::bad_request(
                "invalid_offset",
                format!(
                    "offset {} is past the end of the text ({} bytes)",
                    self.offset,
                    self.text.len()
                ),
                "Send a byte offset within the text",
            ));
        }
        Ok(())
    }
}

// POST /definition
pub async fn definition(
    State(state): State<SharedState>,
    Json(req): Json<CursorRequest>,
) -> Result<Json<Option<Location>>, AppError> {
    req.check()?;
    Ok(Json(state.resolver.definition_at(
        &req.text,
        req.offset,
        req.origin.as_deref(),
    )))
}

// POST /references
pub async fn references(
    State(state): State<SharedState>,
    Json(req): Json<CursorRequest>,
) -> Result<Json<Vec<Location>>, AppError> {
    req.check()?;
    Ok(Json(state.resolver.references_at(
        &req.text,
        req.offset,
        req.origin.as_deref(),
    )))
}

// POST /hover
pub async fn hover(
    State(state): State<SharedState>,
    Json(req): Json<CursorRequest>,
) -> Result<Json<Option<Hover>>, AppError> {
    req.check()?;
    Ok(Json(state.resolver.hover(
        &req.text,
        req.offset,
        req.origin.as_deref(),
    )))
}

// POST /annotate
#[derive(Deserialize)]
pub struct AnnotateRequest {
    pub text: String,
    pub origin: Option<PathBuf>,
}

pub async fn annotate(
    State(state): State<SharedState>,
    Json(req): Json<AnnotateRequest>,
) -> Json<Vec<Annotation>> {
    Json(state.resolver.annotate(&req.text, req.origin.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_past_end_is_rejected() {
        let req = CursorRequest {
            text: "$A".to_string(),
            offset: 3,
            origin: None,
        };
        let err = req.check().unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.body.code, "invalid_offset");

        let at_end = CursorRequest { offset: 2, ..req };
        assert!(at_end.check().is_ok());
    }
}
