/// Push notifications fired by domain events
///
/// | Event                  | Recipients                          | `data.tipo` |
/// |------------------------|-------------------------------------|-------------|
/// | expensa created        | devices of the unit's propietario   | `nueva_expensa` |
/// | objeto perdido created | every active device                 | `objeto_perdido` |
///
/// Delivery is best effort: lookup and vendor failures are logged and never
/// reach the caller.

use crate::models::contrato::propietario_actual;
use crate::models::dispositivo::Dispositivo;
use crate::models::expensa::Expensa;
use crate::models::objeto_perdido::ObjetoPerdido;
use crate::models::unidad::Unidad;
use crate::vendors::{PushMessage, PushNotifier, PushReport};
use chrono::Datelike;
use sqlx::PgPool;
use std::collections::HashMap;

const CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";

const MESES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Spanish month name for 1..=12
pub fn mes_nombre(month: u32) -> &'static str {
    MESES
        .get((month as usize).wrapping_sub(1))
        .copied()
        .unwrap_or("")
}

pub fn expensa_message(expensa: &Expensa, nombre: &str, unidad_codigo: &str) -> PushMessage {
    PushMessage {
        title: format!("Expensa de {} 📅", mes_nombre(expensa.fecha_emision.month())),
        body: format!(
            "Hola {}, se ha generado la cuota de tu unidad {} por {} {}.",
            nombre,
            unidad_codigo,
            expensa.monto,
            expensa.currency.to_uppercase()
        ),
        data: HashMap::from([
            ("tipo".to_string(), "nueva_expensa".to_string()),
            ("expensa_id".to_string(), expensa.id.to_string()),
            ("click_action".to_string(), CLICK_ACTION.to_string()),
        ]),
    }
}

pub fn objeto_perdido_message(objeto: &ObjetoPerdido) -> PushMessage {
    PushMessage {
        title: "🔍 Objeto Encontrado".to_string(),
        body: format!(
            "Se encontró '{}' en {}. ¿Es tuyo?",
            objeto.titulo, objeto.lugar_encontrado
        ),
        data: HashMap::from([
            ("tipo".to_string(), "objeto_perdido".to_string()),
            ("objeto_id".to_string(), objeto.id.to_string()),
            ("click_action".to_string(), CLICK_ACTION.to_string()),
        ]),
    }
}

async fn expensa_recipients(
    pool: &PgPool,
    expensa: &Expensa,
) -> Result<Option<(Vec<String>, PushMessage)>, sqlx::Error> {
    let Some(propietario) = propietario_actual(pool, expensa.unidad_id).await? else {
        return Ok(None);
    };

    let tokens = Dispositivo::tokens_for_persona(pool, propietario.id).await?;
    if tokens.is_empty() {
        return Ok(None);
    }

    let codigo = Unidad::find_by_id(pool, expensa.unidad_id)
        .await?
        .map(|unidad| unidad.codigo)
        .unwrap_or_default();

    Ok(Some((tokens, expensa_message(expensa, &propietario.nombre, &codigo))))
}

/// Tells the unit's propietario that a new expensa was issued
pub async fn notify_expensa(pool: &PgPool, push: &dyn PushNotifier, expensa: &Expensa) -> Option<PushReport> {
    let (tokens, message) = match expensa_recipients(pool, expensa).await {
        Ok(Some(found)) => found,
        Ok(None) => {
            tracing::debug!(expensa_id = %expensa.id, "No devices to notify for expensa");
            return None;
        }
        Err(e) => {
            tracing::warn!(expensa_id = %expensa.id, error = %e, "Failed to resolve expensa recipients");
            return None;
        }
    };

    deliver(push, &tokens, &message, "expensa").await
}

/// Broadcasts a newly found object to every device
pub async fn notify_objeto_perdido(
    pool: &PgPool,
    push: &dyn PushNotifier,
    objeto: &ObjetoPerdido,
) -> Option<PushReport> {
    let tokens = match Dispositivo::all_tokens(pool).await {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::warn!(objeto_id = %objeto.id, error = %e, "Failed to load device tokens");
            return None;
        }
    };

    deliver(push, &tokens, &objeto_perdido_message(objeto), "objeto_perdido").await
}

async fn deliver(
    push: &dyn PushNotifier,
    tokens: &[String],
    message: &PushMessage,
    event: &'static str,
) -> Option<PushReport> {
    match push.send(tokens, message).await {
        Ok(report) => {
            tracing::info!(
                event,
                success = report.success,
                failure = report.failure,
                "Push notification sent"
            );
            Some(report)
        }
        Err(e) => {
            tracing::warn!(event, error = %e, "Push notification failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::objeto_perdido::EstadoObjeto;
    use crate::vendors::mock::MockPushNotifier;
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn expensa() -> Expensa {
        Expensa {
            id: Uuid::new_v4(),
            unidad_id: Uuid::new_v4(),
            monto: Decimal::new(35050, 2),
            fecha_emision: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            fecha_vencimiento: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            pagada: false,
            stripe_session_id: None,
            stripe_payment_intent_id: None,
            currency: "usd".to_string(),
            descripcion: "Expensa de condominio".to_string(),
        }
    }

    #[test]
    fn test_mes_nombre() {
        assert_eq!(mes_nombre(1), "Enero");
        assert_eq!(mes_nombre(12), "Diciembre");
        assert_eq!(mes_nombre(0), "");
        assert_eq!(mes_nombre(13), "");
    }

    #[test]
    fn test_expensa_message() {
        let expensa = expensa();
        let message = expensa_message(&expensa, "Ana", "A-101");

        assert_eq!(message.title, "Expensa de Marzo 📅");
        assert_eq!(
            message.body,
            "Hola Ana, se ha generado la cuota de tu unidad A-101 por 350.50 USD."
        );
        assert_eq!(message.data["tipo"], "nueva_expensa");
        assert_eq!(message.data["expensa_id"], expensa.id.to_string());
    }

    #[tokio::test]
    async fn test_objeto_perdido_broadcast() {
        let objeto = ObjetoPerdido {
            id: Uuid::new_v4(),
            titulo: "Llaves".to_string(),
            descripcion: None,
            foto: "https://img.test/llaves.jpg".to_string(),
            lugar_encontrado: "Lobby".to_string(),
            fecha_encontrado: Utc::now(),
            estado: EstadoObjeto::Pendiente,
            entregado_a: None,
            fecha_entrega: None,
        };

        let push = MockPushNotifier::new();
        let tokens = vec!["t1".to_string(), "t2".to_string()];
        let report = deliver(&push, &tokens, &objeto_perdido_message(&objeto), "objeto_perdido")
            .await
            .unwrap();

        assert_eq!(report.success, 2);
        let sent = push.sent();
        assert_eq!(sent[0].1.body, "Se encontró 'Llaves' en Lobby. ¿Es tuyo?");
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let push = MockPushNotifier::failing();
        let report = deliver(&push, &["t".to_string()], &expensa_message(&expensa(), "Ana", "A-1"), "expensa").await;
        assert!(report.is_none());
    }
}
