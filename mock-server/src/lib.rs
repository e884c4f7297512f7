use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const ACCOUNTS_PATH: &str = "/v1/organisation/accounts";

/// A stored account. Only `id` and `version` are interpreted; every other key
/// is kept as sent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub version: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error_message: String,
}

#[derive(Deserialize)]
struct DeleteParams {
    version: i64,
}

struct Failure(StatusCode, String);

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error_message: self.1,
        };
        (self.0, Json(body)).into_response()
    }
}

pub type Db = Arc<RwLock<HashMap<String, Account>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route(ACCOUNTS_PATH, post(create_account))
        .route(
            "/v1/organisation/accounts/{id}",
            get(fetch_account).delete(delete_account),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn validate_id(id: &str) -> Result<(), Failure> {
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| Failure(StatusCode::BAD_REQUEST, format!("id {id:?} is not a valid uuid")))
}

// The body is parsed whatever the Content-Type, like the real service.
async fn create_account(
    State(db): State<Db>,
    body: Bytes,
) -> Result<(StatusCode, Json<Envelope<Account>>), Failure> {
    let Envelope { data: mut account } = serde_json::from_slice::<Envelope<Account>>(&body)
        .map_err(|e| Failure(StatusCode::BAD_REQUEST, format!("invalid account body: {e}")))?;
    validate_id(&account.id)?;

    let mut accounts = db.write().await;
    if accounts.contains_key(&account.id) {
        tracing::debug!(id = %account.id, "duplicate account rejected");
        return Err(Failure(
            StatusCode::CONFLICT,
            "Account cannot be created as it violates a duplicate constraint".to_string(),
        ));
    }
    account.version = 0;
    accounts.insert(account.id.clone(), account.clone());
    tracing::info!(id = %account.id, "account stored");
    Ok((StatusCode::CREATED, Json(Envelope { data: account })))
}

async fn fetch_account(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Account>>, Failure> {
    validate_id(&id)?;
    let accounts = db.read().await;
    accounts
        .get(&id)
        .cloned()
        .map(|data| Json(Envelope { data }))
        .ok_or_else(|| Failure(StatusCode::NOT_FOUND, format!("record {id} does not exist")))
}

async fn delete_account(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<StatusCode, Failure> {
    validate_id(&id)?;
    let mut accounts = db.write().await;
    let Some(account) = accounts.get(&id) else {
        return Err(Failure(StatusCode::NOT_FOUND, format!("record {id} does not exist")));
    };
    if account.version != params.version {
        return Err(Failure(StatusCode::CONFLICT, "invalid version".to_string()));
    }
    accounts.remove(&id);
    tracing::info!(%id, "account removed");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_keeps_unknown_fields() {
        let raw = r#"{"id":"ad27e265-9605-4b4b-a0e5-3003ea9cc4de","type":"accounts","attributes":{"country":"GB"}}"#;
        let account: Account = serde_json::from_str(raw).unwrap();
        assert_eq!(account.version, 0);
        assert_eq!(account.fields["type"], "accounts");

        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["attributes"]["country"], "GB");
        assert_eq!(json["version"], 0);
    }

    #[test]
    fn envelope_requires_data() {
        let result: Result<Envelope<Account>, _> = serde_json::from_str(r#"{"id":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn account_requires_id() {
        let result: Result<Account, _> = serde_json::from_str(r#"{"type":"accounts"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn validate_id_accepts_only_uuids() {
        assert!(validate_id("ad27e265-9605-4b4b-a0e5-3003ea9cc4de").is_ok());
        assert!(validate_id("not-a-uuid").is_err());
    }
}
