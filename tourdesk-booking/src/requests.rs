use chrono::NaiveDate;
use serde::Deserialize;
use tourdesk_core::repository::{NewClient, NewReservation};
use tourdesk_core::{CoreError, CoreResult};

/// Client identity captured on the booking form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetails {
    #[serde(alias = "fullName")]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: String,
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSeatRequest {
    pub seat_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(flatten)]
    pub client: ClientDetails,
}

fn required(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::ValidationError(format!("{} is required", field)));
    }
    Ok(())
}

/// Blank optional fields are treated as absent.
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl BookSeatRequest {
    pub fn validate(&self) -> CoreResult<()> {
        required("fullName", &self.client.name)?;
        required("nationality", &self.client.nationality)?;
        required("language", &self.client.language)?;

        if let Some(email) = self.client.email.as_deref().map(str::trim) {
            if !email.is_empty() && !email.contains('@') {
                return Err(CoreError::ValidationError(format!(
                    "email: {} is not a valid address",
                    email
                )));
            }
        }
        if self.start_date > self.end_date {
            return Err(CoreError::ValidationError(
                "endDate: the end date must not be before the start date".to_string(),
            ));
        }
        Ok(())
    }

    /// The reservation to write, with the client owned by `agent_id`.
    pub fn into_reservation(self, agent_id: i64) -> NewReservation {
        let client = self.client;
        NewReservation {
            seat_id: self.seat_id,
            start_date: self.start_date,
            end_date: self.end_date,
            client: NewClient {
                user_id: agent_id,
                name: client.name.trim().to_string(),
                email: optional(client.email),
                phone: optional(client.phone),
                gender: optional(client.gender),
                date_of_birth: client.date_of_birth,
                nationality: client.nationality,
                language: client.language,
            },
        }
    }
}
