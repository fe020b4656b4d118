//! Visa application entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{ApplicationStatus, VisaApplication};
use sqlx::FromRow;

/// Column list shared by every query returning a full row.
pub const VISA_APPLICATION_COLUMNS: &str = "id, owner_email, first_name, middle_name, last_name, \
     date_of_birth, gender, passport_no, whatsapp_number, email, destination, visa_type, \
     application_status, fees, costs, whatsapp_sent, agent_notes, document_urls, agent_id, \
     submitted_at, last_updated_at";

/// Database row mapping for the visa_applications table.
#[derive(Debug, Clone, FromRow)]
pub struct VisaApplicationEntity {
    pub id: i64,
    pub owner_email: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub date_of_birth: String,
    pub gender: Option<String>,
    pub passport_no: String,
    pub whatsapp_number: String,
    pub email: Option<String>,
    pub destination: String,
    pub visa_type: String,
    pub application_status: String,
    pub fees: f64,
    pub costs: f64,
    pub whatsapp_sent: bool,
    pub agent_notes: Option<String>,
    pub document_urls: Vec<String>,
    pub agent_id: String,
    pub submitted_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl TryFrom<VisaApplicationEntity> for VisaApplication {
    type Error = String;

    fn try_from(entity: VisaApplicationEntity) -> Result<Self, Self::Error> {
        let application_status: ApplicationStatus = entity.application_status.parse()?;
        Ok(Self {
            id: entity.id,
            owner_email: entity.owner_email,
            first_name: entity.first_name,
            middle_name: entity.middle_name,
            last_name: entity.last_name,
            date_of_birth: entity.date_of_birth,
            gender: entity.gender,
            passport_no: entity.passport_no,
            whatsapp_number: entity.whatsapp_number,
            email: entity.email,
            destination: entity.destination,
            visa_type: entity.visa_type,
            application_status,
            fees: entity.fees,
            costs: entity.costs,
            whatsapp_sent: entity.whatsapp_sent,
            agent_notes: entity.agent_notes,
            document_urls: entity.document_urls,
            agent_id: entity.agent_id,
            submitted_at: entity.submitted_at,
            last_updated_at: entity.last_updated_at,
        })
    }
}
