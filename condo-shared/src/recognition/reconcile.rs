/// Search-response reconciliation
///
/// The face vendor has answered searches with several shapes over time:
/// a bare list of candidates, or an object nesting them under
/// `candidates`, `matches` or `result` (itself a list, or an object with
/// `candidates`). Scores may come as 0..1 or 0..100.

use super::identity::{Identity, IdentityDirectory};
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Similarity at which the resident endpoint accepts without a local match
pub const PERMISSIVE_SIMILARITY: f64 = 0.9;

/// Keys that may carry the vendor identity, in preference order
const UUID_KEYS: [&str; 3] = ["uuid", "subject", "person_uuid"];

/// Score keys read by the resident endpoint, in preference order
const RESIDENT_SCORE_KEYS: &[&str] = &["similarity", "confidence", "probability"];

/// Score keys read by the global endpoint, in preference order
const GLOBAL_SCORE_KEYS: &[&str] = &["probability", "similarity", "confidence", "score"];

#[derive(Debug, Error)]
pub enum RecognitionError {
    /// Vendor answered with an `{"error": ...}` body
    #[error("{0}")]
    Vendor(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Acceptance rule applied to the best candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptRule {
    /// Local identity resolved and similarity at or above the threshold
    Strict,
    /// As `Strict`, but any similarity >= 0.9 is accepted even unresolved
    Permissive,
}

impl AcceptRule {
    pub fn accepts(&self, resolved: bool, similarity: f64, threshold: f64) -> bool {
        match self {
            AcceptRule::Permissive if similarity >= PERMISSIVE_SIMILARITY => true,
            _ => resolved && similarity >= threshold,
        }
    }
}

/// Which endpoint is reconciling, and therefore which identities and rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionMode {
    /// Residents only (personas), permissive rule
    Residentes,
    /// Personas then empleados, strict rule
    Global,
}

impl RecognitionMode {
    pub fn default_threshold(&self) -> f64 {
        match self {
            RecognitionMode::Residentes => 0.50,
            RecognitionMode::Global => 0.80,
        }
    }

    pub fn rule(&self) -> AcceptRule {
        match self {
            RecognitionMode::Residentes => AcceptRule::Permissive,
            RecognitionMode::Global => AcceptRule::Strict,
        }
    }

    /// Candidate fields holding the score, first match wins
    pub fn score_keys(&self) -> &'static [&'static str] {
        match self {
            RecognitionMode::Residentes => RESIDENT_SCORE_KEYS,
            RecognitionMode::Global => GLOBAL_SCORE_KEYS,
        }
    }
}

/// Response returned to the caller
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecognitionOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<&'static str>,
    pub tipo: Option<String>,
    pub id: Option<uuid::Uuid>,
    pub nombre: Option<String>,
    pub similaridad: Option<f64>,
    pub uuid: Option<String>,
    pub umbral: f64,
    pub raw: JsonValue,
}

impl RecognitionOutcome {
    fn rejected(reason: &'static str, detail: &'static str, umbral: f64, raw: JsonValue) -> Self {
        RecognitionOutcome {
            ok: false,
            reason: Some(reason),
            detail: Some(detail),
            tipo: None,
            id: None,
            nombre: None,
            similaridad: None,
            uuid: None,
            umbral,
            raw,
        }
    }
}

/// Scales a 0..100 score onto 0..1; anything unparseable is 0
pub fn normalize_similarity(value: Option<&JsonValue>) -> f64 {
    let sim = match value {
        Some(JsonValue::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(JsonValue::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    if sim > 1.0 {
        sim / 100.0
    } else {
        sim
    }
}

fn non_empty(value: Option<&JsonValue>) -> Option<&JsonValue> {
    value.filter(|v| match v {
        JsonValue::Null => false,
        JsonValue::Array(a) => !a.is_empty(),
        JsonValue::Object(o) => !o.is_empty(),
        _ => true,
    })
}

/// Candidate list of a search response, empty when none were found
pub fn extract_candidates(raw: &JsonValue) -> Vec<JsonValue> {
    let found = match raw {
        JsonValue::Array(_) => Some(raw),
        JsonValue::Object(map) => non_empty(map.get("candidates"))
            .or_else(|| non_empty(map.get("matches")))
            .or_else(|| non_empty(map.get("result"))),
        _ => None,
    };

    match found {
        Some(JsonValue::Array(items)) => items.clone(),
        Some(JsonValue::Object(nested)) => match nested.get("candidates") {
            Some(JsonValue::Array(items)) => items.clone(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Vendor identity and normalised similarity of a candidate
pub fn candidate_score(candidate: &JsonValue, mode: RecognitionMode) -> (Option<String>, f64) {
    let uuid = UUID_KEYS
        .iter()
        .filter_map(|key| candidate.get(*key).and_then(JsonValue::as_str))
        .find(|uuid| !uuid.is_empty())
        .map(str::to_string);

    let score = mode
        .score_keys()
        .iter()
        .filter_map(|key| candidate.get(*key))
        .find(|v| normalize_similarity(Some(v)) != 0.0);

    (uuid, normalize_similarity(score))
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Turns a raw search response into an accept/reject decision
pub async fn reconcile(
    directory: &dyn IdentityDirectory,
    mode: RecognitionMode,
    umbral: f64,
    raw: JsonValue,
) -> Result<RecognitionOutcome, RecognitionError> {
    if let Some(error) = raw.as_object().and_then(|map| map.get("error")) {
        let detail = match error {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(RecognitionError::Vendor(detail));
    }

    let candidates = extract_candidates(&raw);
    let Some(best) = candidates.first() else {
        return Ok(RecognitionOutcome::rejected(
            "sin_coincidencias",
            "No se encontraron coincidencias en la base de datos",
            umbral,
            raw,
        ));
    };

    if !best.is_object() {
        return Ok(RecognitionOutcome::rejected(
            "formato_invalido",
            "Formato de respuesta inválido del proveedor",
            umbral,
            raw,
        ));
    }

    let (uuid, similarity) = candidate_score(best, mode);

    let identity: Option<Identity> = match uuid.as_deref() {
        Some(uuid) => directory.resolve(uuid, mode).await?,
        None => None,
    };

    let ok = mode.rule().accepts(identity.is_some(), similarity, umbral);
    tracing::debug!(
        uuid = ?uuid,
        similarity,
        umbral,
        resolved = identity.is_some(),
        ok,
        "Recognition reconciled"
    );

    let (tipo, id, nombre) = match identity {
        Some(identity) => (Some(identity.tipo), Some(identity.id), Some(identity.nombre)),
        None => (None, None, None),
    };

    Ok(RecognitionOutcome {
        ok,
        reason: None,
        detail: None,
        tipo,
        id,
        nombre,
        similaridad: Some(round4(similarity)),
        uuid,
        umbral,
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::identity::InMemoryDirectory;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_normalize_similarity() {
        assert_eq!(normalize_similarity(Some(&json!(87))), 0.87);
        assert_eq!(normalize_similarity(Some(&json!(0.42))), 0.42);
        assert_eq!(normalize_similarity(Some(&json!("95"))), 0.95);
        assert_eq!(normalize_similarity(None), 0.0);
        assert_eq!(normalize_similarity(Some(&json!(null))), 0.0);
    }

    #[test]
    fn test_extract_candidates_shapes() {
        let item = json!({ "uuid": "a", "probability": 0.9 });

        assert_eq!(extract_candidates(&json!([item.clone()])).len(), 1);
        assert_eq!(extract_candidates(&json!({ "candidates": [item.clone()] })).len(), 1);
        assert_eq!(extract_candidates(&json!({ "matches": [item.clone()] })).len(), 1);
        assert_eq!(extract_candidates(&json!({ "result": [item.clone()] })).len(), 1);
        assert_eq!(
            extract_candidates(&json!({ "result": { "candidates": [item.clone()] } })).len(),
            1
        );
        assert!(extract_candidates(&json!({ "candidates": [], "status": "success" })).is_empty());
        assert!(extract_candidates(&json!("unexpected")).is_empty());
    }

    #[test]
    fn test_candidates_preferred_over_matches() {
        let raw = json!({
            "candidates": [{ "uuid": "first" }],
            "matches": [{ "uuid": "second" }]
        });
        assert_eq!(extract_candidates(&raw)[0]["uuid"], "first");

        let raw = json!({ "candidates": [], "matches": [{ "uuid": "second" }] });
        assert_eq!(extract_candidates(&raw)[0]["uuid"], "second");
    }

    #[test]
    fn test_candidate_score_keys() {
        let (uuid, sim) = candidate_score(
            &json!({ "subject": "s-1", "similarity": 91 }),
            RecognitionMode::Global,
        );
        assert_eq!(uuid.as_deref(), Some("s-1"));
        assert_eq!(sim, 0.91);

        let (uuid, sim) = candidate_score(&json!({ "name": "x" }), RecognitionMode::Residentes);
        assert!(uuid.is_none());
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn test_score_key_order_depends_on_mode() {
        let candidate = json!({ "uuid": "a", "probability": 0.62, "similarity": 0.93 });

        let (_, residentes) = candidate_score(&candidate, RecognitionMode::Residentes);
        let (_, global) = candidate_score(&candidate, RecognitionMode::Global);

        assert_eq!(residentes, 0.93);
        assert_eq!(global, 0.62);

        // only the global endpoint reads a bare `score`
        let bare = json!({ "uuid": "a", "score": 88 });
        assert_eq!(candidate_score(&bare, RecognitionMode::Residentes).1, 0.0);
        assert_eq!(candidate_score(&bare, RecognitionMode::Global).1, 0.88);
    }

    #[test]
    fn test_accept_rules() {
        assert!(AcceptRule::Strict.accepts(true, 0.8, 0.8));
        assert!(!AcceptRule::Strict.accepts(false, 0.99, 0.8));
        assert!(!AcceptRule::Strict.accepts(true, 0.79, 0.8));
        assert!(AcceptRule::Permissive.accepts(false, 0.9, 0.5));
        assert!(!AcceptRule::Permissive.accepts(false, 0.89, 0.5));
        assert!(AcceptRule::Permissive.accepts(true, 0.6, 0.5));
    }

    #[tokio::test]
    async fn test_empty_candidates_is_no_match() {
        let directory = InMemoryDirectory::default();
        let outcome = reconcile(&directory, RecognitionMode::Global, 0.8, json!([]))
            .await
            .unwrap();

        assert!(!outcome.ok);
        assert_eq!(outcome.reason, Some("sin_coincidencias"));
    }

    #[tokio::test]
    async fn test_non_object_candidate_is_invalid_format() {
        let directory = InMemoryDirectory::default();
        let outcome = reconcile(&directory, RecognitionMode::Global, 0.8, json!(["abc"]))
            .await
            .unwrap();

        assert!(!outcome.ok);
        assert_eq!(outcome.reason, Some("formato_invalido"));
    }

    #[tokio::test]
    async fn test_vendor_error_body() {
        let directory = InMemoryDirectory::default();
        let err = reconcile(
            &directory,
            RecognitionMode::Global,
            0.8,
            json!({ "error": "invalid token" }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RecognitionError::Vendor(ref m) if m == "invalid token"));
    }

    #[tokio::test]
    async fn test_high_similarity_without_local_match_accepted_for_residents() {
        let directory = InMemoryDirectory::default();
        let outcome = reconcile(
            &directory,
            RecognitionMode::Residentes,
            0.5,
            json!([{ "uuid": "unknown", "probability": 0.95 }]),
        )
        .await
        .unwrap();

        assert!(outcome.ok);
        assert!(outcome.id.is_none());
        assert_eq!(outcome.similaridad, Some(0.95));
    }

    #[tokio::test]
    async fn test_global_requires_local_match() {
        let directory = InMemoryDirectory::default();
        let outcome = reconcile(
            &directory,
            RecognitionMode::Global,
            0.8,
            json!([{ "uuid": "unknown", "probability": 0.95 }]),
        )
        .await
        .unwrap();

        assert!(!outcome.ok);
    }

    #[tokio::test]
    async fn test_global_resolves_empleado() {
        let id = Uuid::new_v4();
        let directory = InMemoryDirectory::default().with(
            "emp-1",
            Identity {
                tipo: "empleado".to_string(),
                id,
                nombre: "Luis Vaca".to_string(),
            },
        );

        let outcome = reconcile(
            &directory,
            RecognitionMode::Global,
            0.8,
            json!({ "candidates": [{ "uuid": "emp-1", "probability": 87.123456 }] }),
        )
        .await
        .unwrap();

        assert!(outcome.ok);
        assert_eq!(outcome.tipo.as_deref(), Some("empleado"));
        assert_eq!(outcome.id, Some(id));
        assert_eq!(outcome.similaridad, Some(0.8712));
    }
}
