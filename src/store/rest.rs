//! REST implementation of the store boundary.
//!
//! Speaks to the marketplace API with an opaque bearer credential. The core
//! never inspects the token; session resolution happens server-side via
//! `current_user`. Transport and decode failures map to
//! [`ToalaError::Store`]; the API's compare-and-set refusal (HTTP 409) maps
//! to [`ToalaError::InvalidTransition`] so callers see the same error family
//! as with any other store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::domain::equipment::{Equipment, EquipmentFilter};
use crate::domain::id::{EquipmentId, RequestId, UserId};
use crate::domain::message::{Message, MessageDraft};
use crate::domain::request::{
    AnyRequest, Approved, Completed, Declined, Pending, RentalRequest, RequestData, RequestInput,
    RequestRole, RequestStatus,
};
use crate::domain::user::User;
use crate::error::{Result, ToalaError};
use crate::store::Store;

/// Production [`Store`] backed by the marketplace REST API.
#[derive(Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl RestStore {
    /// Create a store for the API at `base_url` (e.g. `https://toala.example`)
    /// authenticated with an opaque bearer `token`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: reqwest::Client::new(),
            base_url,
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Map responses every endpoint treats the same way; endpoint-specific
    /// statuses are handled before calling this.
    async fn check(&self, response: reqwest::Response, path: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ToalaError::Unauthenticated);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(path, status = status.as_u16(), "Store call failed");
            return Err(ToalaError::Store(anyhow::anyhow!(
                "{path} returned {status}: {body}"
            )));
        }
        Ok(response)
    }
}

/// Wire shape of a rental request, status as data.
#[derive(Debug, Deserialize)]
struct RequestDto {
    id: RequestId,
    equipment_id: EquipmentId,
    owner_id: UserId,
    requester_id: UserId,
    start_date: NaiveDate,
    end_date: NaiveDate,
    total_price: f64,
    message: String,
    status: RequestStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RequestDto {
    fn into_any(self) -> AnyRequest {
        let updated_at = self.updated_at;
        let data = RequestData {
            id: self.id,
            equipment_id: self.equipment_id,
            owner_id: self.owner_id,
            requester_id: self.requester_id,
            start_date: self.start_date,
            end_date: self.end_date,
            total_price: self.total_price,
            message: self.message,
            created_at: self.created_at,
        };
        match self.status {
            RequestStatus::Pending => AnyRequest::Pending(RentalRequest {
                data,
                state: Pending {},
            }),
            RequestStatus::Approved => AnyRequest::Approved(RentalRequest {
                data,
                state: Approved { updated_at },
            }),
            RequestStatus::Declined => AnyRequest::Declined(RentalRequest {
                data,
                state: Declined { updated_at },
            }),
            RequestStatus::Completed => AnyRequest::Completed(RentalRequest {
                data,
                state: Completed { updated_at },
            }),
        }
    }
}

/// Body of the status update call. `expected` makes the server-side
/// compare-and-set explicit.
#[derive(Debug, Serialize)]
struct StatusUpdateBody {
    expected: RequestStatus,
    status: RequestStatus,
}

/// Body of a 409 response to a status update: the status the request
/// actually had.
#[derive(Debug, Deserialize)]
struct StatusConflictBody {
    status: RequestStatus,
}

#[async_trait]
impl Store for RestStore {
    async fn get_equipment(&self, filter: EquipmentFilter) -> Result<Vec<Equipment>> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(category) = filter.category {
            // serde's snake_case name, without the quotes
            let name = serde_json::to_value(category)?;
            query.push(("category", name.as_str().unwrap_or_default().to_string()));
        }
        if let Some(location) = filter.location {
            query.push(("location", location));
        }
        if let Some(max_price) = filter.max_price {
            query.push(("max_price", max_price.to_string()));
        }
        if filter.skip > 0 {
            query.push(("skip", filter.skip.to_string()));
        }
        if let Some(limit) = filter.limit {
            query.push(("limit", limit.to_string()));
        }

        let response = self
            .client
            .get(self.url("/equipment"))
            .bearer_auth(&self.token)
            .query(&query)
            .send()
            .await?;
        Ok(self.check(response, "/equipment").await?.json().await?)
    }

    async fn get_equipment_by_id(&self, id: EquipmentId) -> Result<Equipment> {
        let path = format!("/equipment/{}", id.0);
        let response = self
            .client
            .get(self.url(&path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ToalaError::EquipmentNotFound(id));
        }
        Ok(self.check(response, &path).await?.json().await?)
    }

    #[tracing::instrument(skip(self, input), fields(equipment_id = %input.equipment_id))]
    async fn store_request(&self, input: RequestInput) -> Result<RentalRequest<Pending>> {
        let response = self
            .client
            .post(self.url("/requests"))
            .bearer_auth(&self.token)
            .json(&input)
            .send()
            .await?;
        let dto: RequestDto = self.check(response, "/requests").await?.json().await?;
        let id = dto.id;
        tracing::debug!(request_id = %id, "Rental request stored");
        dto.into_any().into_pending().ok_or_else(|| {
            ToalaError::Store(anyhow::anyhow!(
                "store returned request {id} in a non-pending state"
            ))
        })
    }

    #[tracing::instrument(skip(self), fields(request_id = %id, from = %from, to = %to))]
    async fn update_request_status(
        &self,
        id: RequestId,
        actor: UserId,
        from: RequestStatus,
        to: RequestStatus,
    ) -> Result<DateTime<Utc>> {
        let path = format!("/requests/{}/status", id.0);
        let response = self
            .client
            .put(self.url(&path))
            .bearer_auth(&self.token)
            .json(&StatusUpdateBody {
                expected: from,
                status: to,
            })
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(ToalaError::RequestNotFound(id)),
            StatusCode::FORBIDDEN => {
                return Err(ToalaError::Forbidden {
                    actor,
                    action: "transition this request",
                });
            }
            StatusCode::CONFLICT => {
                // The compare-and-set lost: the body carries the actual status.
                let current = response
                    .json::<StatusConflictBody>()
                    .await
                    .map(|b| b.status)
                    .unwrap_or(from);
                return Err(ToalaError::InvalidTransition(id, current, to));
            }
            _ => {}
        }

        let dto: RequestDto = self.check(response, &path).await?.json().await?;
        Ok(dto.updated_at)
    }

    async fn list_requests(&self, _user: UserId, role: RequestRole) -> Result<Vec<AnyRequest>> {
        // The API derives the user from the bearer credential; the role picks
        // the collection.
        let path = match role {
            RequestRole::Owner => "/requests/received",
            RequestRole::Requester => "/requests/sent",
        };
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let dtos: Vec<RequestDto> = self.check(response, path).await?.json().await?;
        Ok(dtos.into_iter().map(RequestDto::into_any).collect())
    }

    async fn store_message(&self, draft: MessageDraft) -> Result<Message> {
        let request_id = draft.request_id;
        let response = self
            .client
            .post(self.url("/messages"))
            .bearer_auth(&self.token)
            .json(&draft)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ToalaError::RequestNotFound(request_id));
        }
        Ok(self.check(response, "/messages").await?.json().await?)
    }

    async fn list_messages(&self, request_id: RequestId) -> Result<Vec<Message>> {
        let path = format!("/messages/{}", request_id.0);
        let response = self
            .client
            .get(self.url(&path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ToalaError::RequestNotFound(request_id));
        }
        Ok(self.check(response, &path).await?.json().await?)
    }

    async fn current_user(&self) -> Result<User> {
        let response = self
            .client
            .get(self.url("/auth/me"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(self.check(response, "/auth/me").await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_dto_maps_status_to_the_typed_state() {
        let json = r#"{
            "id": "4f9d4378-6b4e-4aa1-90a2-8f5f0a2f8d11",
            "equipment_id": "2d1e9c46-91ab-4f5e-b7f1-52f2b5d2e960",
            "owner_id": "b3c1e1a2-0c3d-4e5f-8a9b-0c1d2e3f4a5b",
            "requester_id": "c4d2f2b3-1d4e-5f60-9bac-1d2e3f4a5b6c",
            "start_date": "2024-06-01",
            "end_date": "2024-06-03",
            "total_price": 75.0,
            "message": "Need it for the weekend",
            "status": "approved",
            "created_at": "2024-05-20T10:00:00Z",
            "updated_at": "2024-05-21T09:30:00Z"
        }"#;
        let dto: RequestDto = serde_json::from_str(json).unwrap();
        let any = dto.into_any();
        assert_eq!(any.status(), RequestStatus::Approved);
        assert_eq!(any.data().total_price, 75.0);
        assert_eq!(
            any.data().start_date,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let store = RestStore::new("https://toala.example/", "token");
        assert_eq!(store.url("/equipment"), "https://toala.example/api/equipment");
    }
}
