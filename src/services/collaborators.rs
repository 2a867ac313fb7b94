// src/services/collaborators.rs
//
// Fronteras con subsistemas que no viven en este núcleo (impresión de
// documentos, correo, exportaciones en segundo plano). El núcleo solo
// conoce estos traits y sus tipos de carga; las implementaciones reales
// se conectan al construir el estado de la aplicación.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::{common::error::AppError, models::documents::DocumentLine};

/// Todo lo que necesita una plantilla para imprimir un documento comercial.
/// Es una copia plana: el renderizador no vuelve a consultar la base.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub title: String,
    pub company: String,
    pub client: String,
    pub document_number: Uuid,
    pub ncf: Option<String>,
    pub valid_until: Option<DateTime<Utc>>,
    pub lines: Vec<DocumentLine>,
    pub subtotal: Decimal,
    pub itbis: Decimal,
    pub total: Decimal,
}

pub trait DocumentRenderer: Send + Sync {
    fn render(&self, payload: &RenderPayload) -> Result<Vec<u8>, AppError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Aviso sin garantía de entrega. Nunca debe fallar la operación que lo
    /// origina; por eso no devuelve Result.
    async fn notify(&self, tenant_id: Uuid, message: &str);
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportJobRequest {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub format: String,
}

#[async_trait]
pub trait ExportWorker: Send + Sync {
    /// Encola la exportación y devuelve el id del trabajo. Corre fuera de
    /// cualquier transacción del pipeline.
    async fn submit(&self, tenant_id: Uuid, request: ExportJobRequest) -> Result<Uuid, AppError>;
}

/// Implementación por defecto: registra el evento y nada más. Mantiene los
/// puntos de notificación del pipeline conectados sin arrastrar correo ni
/// colas al núcleo.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, tenant_id: Uuid, message: &str) {
        tracing::info!(%tenant_id, message, "notificación emitida");
    }
}

/// Worker de exportación por defecto: acepta el trabajo, lo deja registrado
/// y devuelve su id. La cola real se conecta por fuera.
#[derive(Debug, Clone, Default)]
pub struct TracingExportWorker;

#[async_trait]
impl ExportWorker for TracingExportWorker {
    async fn submit(&self, tenant_id: Uuid, request: ExportJobRequest) -> Result<Uuid, AppError> {
        let job_id = Uuid::new_v4();
        tracing::info!(%tenant_id, %job_id, format = %request.format, "exportación encolada");
        Ok(job_id)
    }
}

/// Renderizador de texto plano. Sirve de implementación de referencia y
/// para los ambientes donde no hay motor de PDF configurado.
#[derive(Debug, Clone, Default)]
pub struct PlainTextRenderer;

impl DocumentRenderer for PlainTextRenderer {
    fn render(&self, payload: &RenderPayload) -> Result<Vec<u8>, AppError> {
        let mut out = String::new();
        out.push_str(&format!("{}\n{}\n", payload.title, payload.company));
        out.push_str(&format!("Cliente: {}\n", payload.client));
        out.push_str(&format!("Documento: {}\n", payload.document_number));
        if let Some(ncf) = &payload.ncf {
            out.push_str(&format!("NCF: {ncf}\n"));
        }
        if let Some(valid_until) = payload.valid_until {
            out.push_str(&format!("Válida hasta: {}\n", valid_until.format("%d/%m/%Y")));
        }
        out.push('\n');
        for line in &payload.lines {
            out.push_str(&format!(
                "{:<12} {:<30} {:>5} x {:>10} -{:>8}\n",
                line.code, line.product_name, line.quantity, line.unit_price, line.discount
            ));
        }
        out.push_str(&format!("\nSubtotal: {}\n", payload.subtotal));
        out.push_str(&format!("ITBIS:    {}\n", payload.itbis));
        out.push_str(&format!("Total:    {}\n", payload.total));
        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn plain_text_render_includes_ncf_and_totals() {
        let payload = RenderPayload {
            title: "Factura".to_string(),
            company: "Ferretería La Económica".to_string(),
            client: "Juan Pérez".to_string(),
            document_number: Uuid::new_v4(),
            ncf: Some("B0200000001".to_string()),
            valid_until: None,
            lines: vec![],
            subtotal: dec!(180.00),
            itbis: dec!(32.40),
            total: dec!(212.40),
        };

        let bytes = PlainTextRenderer.render(&payload).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("B0200000001"));
        assert!(text.contains("212.40"));
    }
}
