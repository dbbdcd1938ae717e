//! Handler for `GET /contacts/{id}`: the consolidated view of the cluster
//! containing a contact. 404 if the contact does not exist.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use kin_core::{
  consolidated::IdentifyResponse,
  contact::ContactId,
  store::IdentityStore,
};

use crate::error::ApiError;

/// `GET /contacts/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<ContactId>,
) -> Result<Json<IdentifyResponse>, ApiError>
where
  S: IdentityStore,
{
  let contact = store
    .cluster_of(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("contact {id} not found")))?;
  Ok(Json(IdentifyResponse::from(contact)))
}
