// libs/booking-cell/src/services/notify.rs
use anyhow::Result;
use tracing::info;

use shared_config::AppConfig;
use shared_messaging::MessagingClient;

pub struct ApprovalNotifier {
    messaging: MessagingClient,
    approver: String,
}

impl ApprovalNotifier {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            messaging: MessagingClient::new(config),
            approver: config.doctor_whatsapp_number.clone(),
        }
    }

    /// Ask the approver to confirm or reject a tentative appointment. The
    /// reply keywords here must stay in sync with what the reply interpreter
    /// understands.
    pub async fn send_booking_request(
        &self,
        patient_name: &str,
        date: &str,
        time: &str,
        reason: &str,
        code: &str,
    ) -> Result<()> {
        let body = format!(
            "NUEVA SOLICITUD DE TURNO 🔵\n\n\
             Paciente: {patient_name}\n\
             Fecha: {date}\n\
             Hora: {time}\n\
             Motivo: {reason}\n\n\
             Para confirmar, responde: CONFIRMAR {code}\n\
             Para rechazar, responde: RECHAZAR {code}"
        );

        self.messaging.send_message(&self.approver, &body).await?;
        info!("Approval request for {} sent to the doctor", code);
        Ok(())
    }
}
