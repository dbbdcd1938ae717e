//! Handler for `POST /identify`.
//!
//! Body: `{"phoneNumber": "..." | 123, "email": "..."}`; either field may be
//! absent or null, but not both. `phone_number` is accepted as an alias.
//! Returns 201 with `{"contact": {...}}`.

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use kin_core::{
  consolidated::IdentifyResponse,
  contact::Signal,
  store::IdentityStore,
};
use serde::Deserialize;

use crate::error::ApiError;

/// A phone number sent either as a string or as a bare JSON integer.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PhoneField {
  Text(String),
  Number(u64),
}

impl From<PhoneField> for String {
  fn from(p: PhoneField) -> Self {
    match p {
      PhoneField::Text(s) => s,
      PhoneField::Number(n) => n.to_string(),
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyBody {
  #[serde(default, alias = "phone_number")]
  pub phone_number: Option<PhoneField>,
  #[serde(default)]
  pub email:        Option<String>,
}

/// `POST /identify`
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<IdentifyBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IdentityStore,
{
  let signal = Signal::new(body.phone_number.map(String::from), body.email)?;

  let contact = store.reconcile(signal).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(IdentifyResponse::from(contact))))
}
