// src/models/realtors.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::serde_utils::{optional_text, patch_field},
    models::drops::BoxDrop,
};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Realtor {
    pub id: Uuid,
    #[schema(example = "Jane")]
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,

    // Contadores só mudam como efeito colateral do ciclo de vida dos drops
    pub total_drops: i32,
    pub total_conversions: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RealtorWithDrops {
    #[serde(flatten)]
    pub realtor: Realtor,
    pub drops: Vec<BoxDrop>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRealtorPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Jane")]
    pub first_name: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    #[validate(email(message = "invalid_email"))]
    #[schema(example = "jane@realty.com")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub company: Option<String>,
}

/// Allow-list do PATCH de corretores.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct RealtorPatch {
    #[serde(default)]
    #[validate(length(min = 1, message = "required"))]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    #[schema(value_type = Option<String>)]
    pub company: Option<Option<String>>,
}

impl RealtorPatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.company.is_none()
    }
}

/// Dados de corretor recebidos pela entrada automática.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RealtorIntake {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

impl RealtorIntake {
    /// "Jane van Realtor" -> ("Jane", Some("van Realtor")).
    pub fn split_name(full_name: Option<&str>) -> (String, Option<String>) {
        let trimmed = full_name.map(str::trim).unwrap_or_default();
        let mut parts = trimmed.splitn(2, ' ');
        let first = parts.next().filter(|p| !p.is_empty()).unwrap_or("Unknown").to_string();
        let last = parts
            .next()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        (first, last)
    }
}
