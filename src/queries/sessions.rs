use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    DbConn,
    error::{Error, Result},
    models::{CartLine, Session},
};

/// Raw `conversation_sessions` row.
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    identifier: String,
    display_name: Option<String>,
    is_first_contact: bool,
    step: String,
    search_query: Option<String>,
    selected_food_id: Option<Uuid>,
    search_result_ids: Vec<Uuid>,
    cart: Json<Vec<CartLine>>,
    pending_payment_reference: Option<String>,
    last_activity_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<SessionRow> for Session {
    type Error = Error;

    fn try_from(row: SessionRow) -> Result<Self> {
        let step = row
            .step
            .parse()
            .map_err(|_| Error::Internal(format!("Unknown conversation step '{}'", row.step)))?;
        Ok(Session {
            id: row.id,
            identifier: row.identifier,
            display_name: row.display_name,
            is_first_contact: row.is_first_contact,
            step,
            search_query: row.search_query,
            selected_food_id: row.selected_food_id,
            search_result_ids: row.search_result_ids,
            cart: row.cart.0.into(),
            pending_payment_reference: row.pending_payment_reference,
            last_activity_at: row.last_activity_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

const SESSION_COLUMNS: &str = "id, identifier, display_name, is_first_contact, step, search_query, \
     selected_food_id, search_result_ids, cart, pending_payment_reference, last_activity_at, \
     created_at, updated_at, version";

/// Gets the session for a customer identifier. The session may not exist.
pub async fn get_session_by_identifier(
    conn: &mut DbConn,
    identifier: &str,
) -> Result<Option<Session>> {
    let row = sqlx::query_as::<_, SessionRow>(&format!(
        "SELECT {SESSION_COLUMNS} FROM conversation_sessions WHERE identifier = $1"
    ))
    .bind(identifier)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    row.map(Session::try_from).transpose()
}

/// Inserts a session unless one already exists for the identifier.
///
/// Returns `None` when another writer created the session first.
pub async fn insert_session(conn: &mut DbConn, session: &Session) -> Result<Option<Session>> {
    let row = sqlx::query_as::<_, SessionRow>(&format!(
        r#"
        INSERT INTO conversation_sessions
            (id, identifier, display_name, is_first_contact, step, search_query, selected_food_id,
             search_result_ids, cart, pending_payment_reference, last_activity_at, version)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (identifier) DO NOTHING
        RETURNING {SESSION_COLUMNS}
        "#
    ))
    .bind(session.id)
    .bind(&session.identifier)
    .bind(&session.display_name)
    .bind(session.is_first_contact)
    .bind(session.step.to_string())
    .bind(&session.search_query)
    .bind(session.selected_food_id)
    .bind(&session.search_result_ids)
    .bind(Json(session.cart.lines()))
    .bind(&session.pending_payment_reference)
    .bind(session.last_activity_at)
    .bind(session.version)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    row.map(Session::try_from).transpose()
}

/// Writes a session if its stored version still matches, bumping the version.
///
/// Returns `None` when the version moved on (or the row is gone).
pub async fn update_session_if_version(
    conn: &mut DbConn,
    session: &Session,
) -> Result<Option<Session>> {
    let row = sqlx::query_as::<_, SessionRow>(&format!(
        r#"
        UPDATE conversation_sessions
        SET display_name = $3,
            is_first_contact = $4,
            step = $5,
            search_query = $6,
            selected_food_id = $7,
            search_result_ids = $8,
            cart = $9,
            pending_payment_reference = $10,
            last_activity_at = $11,
            version = version + 1,
            updated_at = now()
        WHERE identifier = $1 AND version = $2
        RETURNING {SESSION_COLUMNS}
        "#
    ))
    .bind(&session.identifier)
    .bind(session.version)
    .bind(&session.display_name)
    .bind(session.is_first_contact)
    .bind(session.step.to_string())
    .bind(&session.search_query)
    .bind(session.selected_food_id)
    .bind(&session.search_result_ids)
    .bind(Json(session.cart.lines()))
    .bind(&session.pending_payment_reference)
    .bind(session.last_activity_at)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    row.map(Session::try_from).transpose()
}

/// Deletes sessions with no activity since `idle_before`. Returns the count removed.
pub async fn delete_idle_sessions(conn: &mut DbConn, idle_before: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM conversation_sessions WHERE last_activity_at < $1")
        .bind(idle_before)
        .execute(conn)
        .await
        .map_err(Error::Sqlx)?;

    Ok(result.rows_affected())
}
