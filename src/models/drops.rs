// src/models/drops.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::serde_utils::{optional_date, optional_text, patch_date, patch_field, patch_flag};

// --- Enums ---

// Mapeia o CREATE TYPE drop_status do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "drop_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DropStatus {
    #[default]
    Requested,
    KitPrepped,
    OutForDelivery,
    Delivered,
    FollowedUp,
    Converted,
    Cancelled,
}

impl DropStatus {
    /// Ordem "para frente" do ciclo de vida. `Cancelled` fica fora do fluxo.
    pub const FLOW: [DropStatus; 6] = [
        DropStatus::Requested,
        DropStatus::KitPrepped,
        DropStatus::OutForDelivery,
        DropStatus::Delivered,
        DropStatus::FollowedUp,
        DropStatus::Converted,
    ];

    /// Próximo passo do fluxo, usado pela ação "avançar".
    pub fn next(self) -> Option<DropStatus> {
        if self.is_terminal() {
            return None;
        }
        let position = Self::FLOW.iter().position(|s| *s == self)?;
        Self::FLOW.get(position + 1).copied()
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DropStatus::Converted | DropStatus::Cancelled)
    }

    #[cfg(test)]
    pub fn is_delivered_or_later(self) -> bool {
        matches!(
            self,
            DropStatus::Delivered | DropStatus::FollowedUp | DropStatus::Converted
        )
    }
}

// Mapeia o CREATE TYPE listing_status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "listing_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    #[default]
    NewListing,
    Pending,
    Other,
}

// --- Registro ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BoxDrop {
    pub id: Uuid,
    pub realtor_id: Option<Uuid>,

    #[schema(example = "1234 Pikes Peak Ave, Colorado Springs, CO")]
    pub homeowner_address: String,
    // Sequência interna do índice único (endereço, seq). Não sai na API.
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub address_seq: i32,

    pub homeowner_name: Option<String>,
    pub homeowner_email: Option<String>,
    pub homeowner_phone: Option<String>,
    pub listing_status: Option<ListingStatus>,
    #[schema(example = "instantly_webhook")]
    pub campaign_source: Option<String>,

    pub status: DropStatus,
    pub requested_date: NaiveDate,
    pub scheduled_date: Option<NaiveDate>,
    pub delivered_date: Option<NaiveDate>,
    pub delivery_notes: Option<String>,

    pub followup_email_homeowner: bool,
    pub followup_email_realtor: bool,
    pub followup_text_homeowner: bool,
    pub followup_call_homeowner: bool,

    pub quote_requested: bool,
    pub booked: bool,
    #[schema(example = "450.00")]
    pub revenue: Option<Decimal>,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Regras que o SQL aplica, em Rust para o store em memória
#[cfg(test)]
impl BoxDrop {
    /// Data usada para encaixar o drop em uma semana: agendada, ou a da solicitação.
    pub fn bucket_date(&self) -> NaiveDate {
        self.scheduled_date.unwrap_or(self.requested_date)
    }

    pub fn is_active(&self) -> bool {
        self.status != DropStatus::Cancelled
    }

    /// Regra do painel: entregue e falta algum dos dois e-mails.
    pub fn needs_email_followup(&self) -> bool {
        self.status == DropStatus::Delivered
            && (!self.followup_email_homeowner || !self.followup_email_realtor)
    }

    /// Regra da fila de follow-ups: entregue e falta qualquer um dos quatro contatos.
    pub fn needs_any_followup(&self) -> bool {
        self.status == DropStatus::Delivered
            && (!self.followup_email_homeowner
                || !self.followup_email_realtor
                || !self.followup_text_homeowner
                || !self.followup_call_homeowner)
    }
}

/// Drop com os dados do corretor (LEFT JOIN).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BoxDropDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub drop: BoxDrop,
    pub realtor_first_name: Option<String>,
    pub realtor_last_name: Option<String>,
    pub realtor_email: Option<String>,
    pub realtor_phone: Option<String>,
    pub realtor_company: Option<String>,
}

/// Resumo do registro que já ocupa o endereço (corpo do 409).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExistingDrop {
    pub id: Uuid,
    pub scheduled_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<&BoxDrop> for ExistingDrop {
    fn from(drop: &BoxDrop) -> Self {
        Self {
            id: drop.id,
            scheduled_date: drop.scheduled_date,
            created_at: drop.created_at,
        }
    }
}

// --- Entrada ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDropPayload {
    pub realtor_id: Option<Uuid>,

    #[serde(default, deserialize_with = "optional_text")]
    #[schema(example = "1234 Pikes Peak Ave, Colorado Springs, CO")]
    pub homeowner_address: Option<String>,

    #[serde(default, deserialize_with = "optional_text")]
    pub homeowner_name: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    #[validate(email(message = "invalid_email"))]
    pub homeowner_email: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub homeowner_phone: Option<String>,

    pub listing_status: Option<ListingStatus>,
    #[serde(default, deserialize_with = "optional_text")]
    pub campaign_source: Option<String>,
    pub status: Option<DropStatus>,

    #[serde(default, deserialize_with = "optional_date")]
    #[schema(value_type = Option<String>, format = Date, example = "2024-03-04")]
    pub scheduled_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "optional_text")]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateDropQuery {
    #[serde(default)]
    pub allow_duplicate: bool,
}

/// Dados normalizados para inserir um drop.
#[derive(Debug, Clone, Default)]
pub struct NewBoxDrop {
    pub realtor_id: Option<Uuid>,
    pub homeowner_address: String,
    pub homeowner_name: Option<String>,
    pub homeowner_email: Option<String>,
    pub homeowner_phone: Option<String>,
    pub listing_status: ListingStatus,
    pub campaign_source: Option<String>,
    pub status: DropStatus,
    pub scheduled_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Atualização parcial. Os campos desta struct SÃO a allow-list:
/// qualquer outra chave do JSON é ignorada pelo serde.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DropPatch {
    #[serde(default)]
    pub status: Option<DropStatus>,

    #[serde(default)]
    pub homeowner_address: Option<String>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub homeowner_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub homeowner_email: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub homeowner_phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<ListingStatus>)]
    pub listing_status: Option<Option<ListingStatus>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub campaign_source: Option<Option<String>>,

    #[serde(default, deserialize_with = "patch_date")]
    #[schema(value_type = Option<String>, format = Date)]
    pub scheduled_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "patch_date")]
    #[schema(value_type = Option<String>, format = Date)]
    pub delivered_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub delivery_notes: Option<Option<String>>,

    #[serde(default, deserialize_with = "patch_flag")]
    pub followup_email_homeowner: Option<bool>,
    #[serde(default, deserialize_with = "patch_flag")]
    pub followup_email_realtor: Option<bool>,
    #[serde(default, deserialize_with = "patch_flag")]
    pub followup_text_homeowner: Option<bool>,
    #[serde(default, deserialize_with = "patch_flag")]
    pub followup_call_homeowner: Option<bool>,
    #[serde(default, deserialize_with = "patch_flag")]
    pub quote_requested: Option<bool>,
    #[serde(default, deserialize_with = "patch_flag")]
    pub booked: Option<bool>,

    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<f64>)]
    pub revenue: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<Uuid>)]
    pub realtor_id: Option<Option<Uuid>>,
}

impl DropPatch {
    pub fn status(status: DropStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.homeowner_address.is_none()
            && self.homeowner_name.is_none()
            && self.homeowner_email.is_none()
            && self.homeowner_phone.is_none()
            && self.listing_status.is_none()
            && self.campaign_source.is_none()
            && self.scheduled_date.is_none()
            && self.delivered_date.is_none()
            && self.delivery_notes.is_none()
            && self.followup_email_homeowner.is_none()
            && self.followup_email_realtor.is_none()
            && self.followup_text_homeowner.is_none()
            && self.followup_call_homeowner.is_none()
            && self.quote_requested.is_none()
            && self.booked.is_none()
            && self.revenue.is_none()
            && self.notes.is_none()
            && self.realtor_id.is_none()
    }
}

/// O que o store deve aplicar atomicamente em um update.
#[derive(Debug, Clone)]
pub struct UpdatePlan {
    pub patch: DropPatch,
    /// Carimba `delivered_date` (só se ainda estiver vazio).
    pub stamp_delivered: Option<NaiveDate>,
    /// Soma 1 em `total_conversions` do corretor dono do drop.
    pub credit_conversion: bool,
}

impl UpdatePlan {
    pub fn from_patch(mut patch: DropPatch, today: NaiveDate) -> Self {
        let mut stamp_delivered = None;
        if patch.status == Some(DropStatus::Delivered) && !matches!(patch.delivered_date, Some(Some(_))) {
            patch.delivered_date = None;
            stamp_delivered = Some(today);
        }
        let credit_conversion = patch.status == Some(DropStatus::Converted);

        Self {
            patch,
            stamp_delivered,
            credit_conversion,
        }
    }
}

// --- Filtros ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DropFilter {
    pub status: Option<DropStatus>,
    pub realtor_id: Option<Uuid>,
    #[serde(default)]
    pub needs_followup: bool,
}

#[derive(Debug, Deserialize)]
pub struct WeeklyQuery {
    #[serde(default, deserialize_with = "optional_date")]
    pub start: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_date")]
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PendingFollowups {
    pub count: usize,
    pub drops: Vec<BoxDropDetail>,
}

// --- Entrada automática (webhook) ---

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutoDropPayload {
    #[schema(example = "Jane Realtor")]
    pub realtor_name: Option<String>,
    #[schema(example = "jane@realty.com")]
    pub realtor_email: Option<String>,
    pub realtor_company: Option<String>,
    pub address: Option<String>,
    pub listing_status: Option<ListingStatus>,
    pub campaign_source: Option<String>,
    pub homeowner_name: Option<String>,
    pub homeowner_email: Option<String>,
    pub phone: Option<String>,
    pub scheduling_note: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutoDropResult {
    pub success: bool,
    pub drop_id: Uuid,
    pub realtor_id: Uuid,
    pub message: String,
}
