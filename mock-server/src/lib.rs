use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

/// Canonical timestamp layout used for `createTime` and the search window.
/// Fixed width, so values compare correctly as plain strings.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

// DTOs are defined independently from the client crate on purpose;
// integration tests catch schema drift.

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Logbook {
    pub name: String,
    pub owner: Option<String>,
    pub state: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub state: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
    pub state: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub owner: Option<String>,
    pub state: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub owner: Option<String>,
    pub description: String,
    #[serde(rename = "createTime")]
    pub create_time: String,
    #[serde(default)]
    pub logbooks: Vec<Logbook>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub properties: Vec<Property>,
}

/// Payload for seeding a log entry; the server assigns `id` and, when
/// absent, `createTime`.
#[derive(Deserialize)]
pub struct NewLogEntry {
    pub owner: Option<String>,
    pub description: String,
    #[serde(rename = "createTime")]
    pub create_time: Option<String>,
    #[serde(default)]
    pub logbooks: Vec<Logbook>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub properties: Vec<Property>,
}

#[derive(Clone, Debug)]
pub struct StoredAttachment {
    pub data: Vec<u8>,
    pub description: Option<String>,
}

/// Accepted search parameters. `fuzzy` and `includeevents` are tolerated in
/// the query string but have no effect here.
#[derive(Debug, Deserialize)]
pub struct LogsParams {
    pub desc: Option<String>,
    pub phrase: Option<String>,
    pub owner: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub logbooks: Option<String>,
    pub tags: Option<String>,
    pub properties: Option<String>,
}

#[derive(Default)]
pub struct Store {
    logbooks: HashMap<String, Logbook>,
    tags: HashMap<String, Tag>,
    properties: HashMap<String, Property>,
    logs: HashMap<i64, LogEntry>,
    attachments: HashMap<(i64, String), StoredAttachment>,
    next_log_id: i64,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/logbooks", get(list_logbooks).put(put_logbooks))
        .route("/logbooks/{name}", get(get_logbook).put(put_logbook))
        .route("/tags", get(list_tags).put(put_tags))
        .route("/tags/{name}", get(get_tag).put(put_tag))
        .route("/properties", get(list_properties).put(put_properties))
        .route("/properties/{name}", get(get_property).put(put_property))
        .route("/logs", get(search_logs).put(create_log))
        .route("/logs/{id}", get(get_log))
        .route("/logs/attachments/{id}", post(post_attachment))
        .route("/logs/attachments/{id}/{filename}", get(get_attachment))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Writes need credentials; the mock only checks that basic auth is present.
fn require_auth(headers: &HeaderMap) -> Result<(), StatusCode> {
    match headers.get(header::AUTHORIZATION) {
        Some(value) if value.as_bytes().starts_with(b"Basic ") => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

// --- logbooks ---

async fn list_logbooks(State(db): State<Db>) -> Json<Vec<Logbook>> {
    let store = db.read().await;
    let mut logbooks: Vec<_> = store.logbooks.values().cloned().collect();
    logbooks.sort_by(|a, b| a.name.cmp(&b.name));
    Json(logbooks)
}

async fn get_logbook(
    State(db): State<Db>,
    Path(name): Path<String>,
) -> Result<Json<Logbook>, StatusCode> {
    let store = db.read().await;
    store.logbooks.get(&name).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn put_logbooks(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<Vec<Logbook>>,
) -> Result<Json<Vec<Logbook>>, StatusCode> {
    require_auth(&headers)?;
    let mut store = db.write().await;
    for logbook in &input {
        store.logbooks.insert(logbook.name.clone(), logbook.clone());
    }
    Ok(Json(input))
}

async fn put_logbook(
    State(db): State<Db>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Json(input): Json<Logbook>,
) -> Result<Json<Logbook>, StatusCode> {
    require_auth(&headers)?;
    if input.name != name {
        return Err(StatusCode::BAD_REQUEST);
    }
    db.write().await.logbooks.insert(name, input.clone());
    Ok(Json(input))
}

// --- tags ---

async fn list_tags(State(db): State<Db>) -> Json<Vec<Tag>> {
    let store = db.read().await;
    let mut tags: Vec<_> = store.tags.values().cloned().collect();
    tags.sort_by(|a, b| a.name.cmp(&b.name));
    Json(tags)
}

async fn get_tag(State(db): State<Db>, Path(name): Path<String>) -> Result<Json<Tag>, StatusCode> {
    let store = db.read().await;
    store.tags.get(&name).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn put_tags(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<Vec<Tag>>,
) -> Result<Json<Vec<Tag>>, StatusCode> {
    require_auth(&headers)?;
    let mut store = db.write().await;
    for tag in &input {
        store.tags.insert(tag.name.clone(), tag.clone());
    }
    Ok(Json(input))
}

async fn put_tag(
    State(db): State<Db>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Json(input): Json<Tag>,
) -> Result<Json<Tag>, StatusCode> {
    require_auth(&headers)?;
    if input.name != name {
        return Err(StatusCode::BAD_REQUEST);
    }
    db.write().await.tags.insert(name, input.clone());
    Ok(Json(input))
}

// --- properties ---

async fn list_properties(State(db): State<Db>) -> Json<Vec<Property>> {
    let store = db.read().await;
    let mut properties: Vec<_> = store.properties.values().cloned().collect();
    properties.sort_by(|a, b| a.name.cmp(&b.name));
    Json(properties)
}

async fn get_property(
    State(db): State<Db>,
    Path(name): Path<String>,
) -> Result<Json<Property>, StatusCode> {
    let store = db.read().await;
    store.properties.get(&name).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn put_properties(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<Vec<Property>>,
) -> Result<Json<Vec<Property>>, StatusCode> {
    require_auth(&headers)?;
    let mut store = db.write().await;
    let stored: Vec<Property> = input.into_iter().map(normalize_property).collect();
    for property in &stored {
        store.properties.insert(property.name.clone(), property.clone());
    }
    Ok(Json(stored))
}

async fn put_property(
    State(db): State<Db>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Json(input): Json<Property>,
) -> Result<Json<Property>, StatusCode> {
    require_auth(&headers)?;
    if input.name != name {
        return Err(StatusCode::BAD_REQUEST);
    }
    let property = normalize_property(input);
    db.write().await.properties.insert(name, property.clone());
    Ok(Json(property))
}

/// Attribute order is not significant; the service stores and returns
/// attributes sorted by name.
fn normalize_property(mut property: Property) -> Property {
    property.attributes.sort_by(|a, b| a.name.cmp(&b.name));
    property
}

// --- logs ---

async fn search_logs(
    State(db): State<Db>,
    Query(params): Query<LogsParams>,
) -> Json<Vec<LogEntry>> {
    let store = db.read().await;
    let mut logs: Vec<_> = store
        .logs
        .values()
        .filter(|entry| matches(entry, &params))
        .cloned()
        .collect();
    logs.sort_by_key(|entry| entry.id);
    Json(logs)
}

fn matches(entry: &LogEntry, params: &LogsParams) -> bool {
    if let Some(owner) = &params.owner {
        if entry.owner.as_deref() != Some(owner.as_str()) {
            return false;
        }
    }
    if let Some(desc) = &params.desc {
        if !entry.description.to_lowercase().contains(&desc.to_lowercase()) {
            return false;
        }
    }
    if let Some(phrase) = &params.phrase {
        if !entry.description.contains(phrase.as_str()) {
            return false;
        }
    }
    // Canonical timestamps are fixed width, so string comparison is
    // chronological.
    if let Some(start) = &params.start {
        if entry.create_time.as_str() < start.as_str() {
            return false;
        }
    }
    if let Some(end) = &params.end {
        if entry.create_time.as_str() > end.as_str() {
            return false;
        }
    }
    if let Some(logbooks) = &params.logbooks {
        if !any_name_matches(logbooks, entry.logbooks.iter().map(|l| l.name.as_str())) {
            return false;
        }
    }
    if let Some(tags) = &params.tags {
        if !any_name_matches(tags, entry.tags.iter().map(|t| t.name.as_str())) {
            return false;
        }
    }
    if let Some(properties) = &params.properties {
        if !any_name_matches(properties, entry.properties.iter().map(|p| p.name.as_str())) {
            return false;
        }
    }
    true
}

/// `wanted` is a comma-separated list of names; any overlap is a match.
fn any_name_matches<'a>(wanted: &str, mut names: impl Iterator<Item = &'a str>) -> bool {
    names.any(|name| wanted.split(',').any(|w| w.trim() == name))
}

async fn get_log(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<LogEntry>, StatusCode> {
    let store = db.read().await;
    store.logs.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn create_log(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<NewLogEntry>,
) -> Result<Json<LogEntry>, StatusCode> {
    require_auth(&headers)?;
    let mut store = db.write().await;
    store.next_log_id += 1;
    let entry = LogEntry {
        id: store.next_log_id,
        owner: input.owner,
        description: input.description,
        create_time: input.create_time.unwrap_or_else(|| {
            Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string()
        }),
        logbooks: input.logbooks,
        tags: input.tags,
        properties: input.properties,
    };
    store.logs.insert(entry.id, entry.clone());
    Ok(Json(entry))
}

// --- attachments ---

async fn post_attachment(
    State(db): State<Db>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<StatusCode, StatusCode> {
    require_auth(&headers)?;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut filename_field: Option<String> = None;
    let mut description: Option<String> = None;
    while let Some(field) = multipart.next_field().await.map_err(|_| StatusCode::BAD_REQUEST)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let original = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                file = Some((original, data.to_vec()));
            }
            "filename" => {
                filename_field =
                    Some(field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?);
            }
            "fileMetadataDescription" => {
                description = Some(field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?);
            }
            _ => {}
        }
    }
    let (original_name, data) = file.ok_or(StatusCode::BAD_REQUEST)?;
    let filename = filename_field.unwrap_or(original_name);

    let mut store = db.write().await;
    if !store.logs.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    store.attachments.insert((id, filename), StoredAttachment { data, description });
    Ok(StatusCode::OK)
}

async fn get_attachment(
    State(db): State<Db>,
    Path((id, filename)): Path<(i64, String)>,
) -> Result<impl IntoResponse, StatusCode> {
    let store = db.read().await;
    let stored = store
        .attachments
        .get(&(id, filename))
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        stored.data.clone(),
    ))
}
