/// Local identities behind vendor UUIDs

use super::reconcile::RecognitionMode;
use crate::models::empleado::Empleado;
use crate::models::persona::Persona;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// A resolved persona or empleado
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    /// `persona`/`empleado` for global searches, the persona's role for
    /// resident searches
    pub tipo: String,
    pub id: Uuid,
    pub nombre: String,
}

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn resolve(&self, luxand_uuid: &str, mode: RecognitionMode) -> Result<Option<Identity>, sqlx::Error>;
}

/// Resolves against the `personas` and `empleados` tables
#[derive(Clone)]
pub struct PgIdentityDirectory {
    pool: PgPool,
}

impl PgIdentityDirectory {
    pub fn new(pool: PgPool) -> Self {
        PgIdentityDirectory { pool }
    }
}

#[async_trait]
impl IdentityDirectory for PgIdentityDirectory {
    async fn resolve(&self, luxand_uuid: &str, mode: RecognitionMode) -> Result<Option<Identity>, sqlx::Error> {
        if let Some(persona) = Persona::find_by_luxand_uuid(&self.pool, luxand_uuid).await? {
            let tipo = match mode {
                RecognitionMode::Residentes => persona.tipo.as_str().to_string(),
                RecognitionMode::Global => "persona".to_string(),
            };
            return Ok(Some(Identity {
                tipo,
                id: persona.id,
                nombre: persona.nombre_completo(),
            }));
        }

        if mode == RecognitionMode::Residentes {
            return Ok(None);
        }

        Ok(Empleado::find_by_luxand_uuid(&self.pool, luxand_uuid)
            .await?
            .map(|empleado| Identity {
                tipo: "empleado".to_string(),
                id: empleado.id,
                nombre: empleado.nombre_completo(),
            }))
    }
}

/// Fixed UUID to identity map, for tests and demos
#[derive(Debug, Default, Clone)]
pub struct InMemoryDirectory {
    entries: HashMap<String, Identity>,
}

impl InMemoryDirectory {
    pub fn with(mut self, luxand_uuid: &str, identity: Identity) -> Self {
        self.entries.insert(luxand_uuid.to_string(), identity);
        self
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryDirectory {
    async fn resolve(&self, luxand_uuid: &str, mode: RecognitionMode) -> Result<Option<Identity>, sqlx::Error> {
        Ok(self
            .entries
            .get(luxand_uuid)
            .filter(|identity| mode == RecognitionMode::Global || identity.tipo != "empleado")
            .cloned())
    }
}
