// SPDX-FileCopyrightText: 2026 Portpool Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service catalog. Templates are stored as a JSON array of strings.

use chrono::Utc;
use portpool_core::{PortpoolError, Service};
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, ts, Database};

fn row_to_service(row: &rusqlite::Row<'_>) -> rusqlite::Result<Service> {
    let raw: String = row.get(2)?;
    let templates: Vec<String> = serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        templates,
    })
}

/// Create a service with its templates.
pub async fn create_service(
    db: &Database,
    name: &str,
    templates: &[String],
) -> Result<Service, PortpoolError> {
    let name = name.to_string();
    let encoded = serde_json::to_string(templates).map_err(|e| PortpoolError::Storage {
        source: Box::new(e),
    })?;
    let templates = templates.to_vec();
    let now = ts(&Utc::now());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO services (name, templates, created_at) VALUES (?1, ?2, ?3)",
                params![name, encoded, now],
            )?;
            Ok(Service {
                id: conn.last_insert_rowid(),
                name,
                templates,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Look a service up by its unique name.
pub async fn get_service_by_name(
    db: &Database,
    name: &str,
) -> Result<Option<Service>, PortpoolError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, name, templates FROM services WHERE name = ?1",
                params![name],
                row_to_service,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn create_and_get_service_keeps_template_order() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db").to_str().unwrap())
            .await
            .unwrap();

        let templates = vec![
            "Your OTP is {otp}".to_string(),
            "{otp} is your verification code".to_string(),
        ];
        let created = create_service(&db, "acme", &templates).await.unwrap();
        let fetched = get_service_by_name(&db, "acme").await.unwrap().unwrap();
        assert_eq!(created, fetched);
        assert_eq!(fetched.templates, templates);

        assert!(get_service_by_name(&db, "missing").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_service_name_is_rejected() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db").to_str().unwrap())
            .await
            .unwrap();

        create_service(&db, "acme", &[]).await.unwrap();
        let err = create_service(&db, "acme", &[]).await.unwrap_err();
        assert!(matches!(err, PortpoolError::Storage { .. }));
        db.close().await.unwrap();
    }
}
