use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::ticket::{SubmissionReceipt, TicketPayload};
use crate::error::{AppError, AppResult};
use crate::infra::audit::AuditLog;
use crate::services::TicketService;

const AUTH_HEADER: &str = "authtoken";
const INPUT_FIELD: &str = "input_data";
const VALIDATION_STATUS: u16 = 400;
const GROUP_TECHNICIAN_MISMATCH_PREFIX: &str = "Site-Group-Technician";
const GROUP_FIELD: &str = "group";

pub struct ServiceDeskClient {
    http: Client,
    base_url: String,
    technician_key: String,
    audit_log: AuditLog,
}

struct ApiResponse {
    status: u16,
    body: String,
}

impl ApiResponse {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn into_error(self) -> AppError {
        AppError::TicketRejected {
            status: self.status,
            body: self.body,
        }
    }
}

impl ServiceDeskClient {
    pub fn new(base_url: String, technician_key: String, audit_log: AuditLog) -> AppResult<Self> {
        let http = Client::builder()
            .danger_accept_invalid_certs(true)
            .no_proxy()
            .build()
            .map_err(|err| AppError::Configuration(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url,
            technician_key,
            audit_log,
        })
    }

    fn requests_endpoint(base_url: &str) -> String {
        format!("{}/api/v3/requests", base_url.trim_end_matches('/'))
    }

    async fn post(&self, payload: &TicketPayload) -> AppResult<ApiResponse> {
        let url = Self::requests_endpoint(&self.base_url);
        let input_data = payload.envelope().to_string();

        info!("Request URL: {url}");
        info!(
            "Request Headers: {{\"{AUTH_HEADER}\": \"{}\"}}",
            mask_secret(&self.technician_key)
        );
        info!("Request Payload: {input_data}");

        let response = self
            .http
            .post(&url)
            .header(AUTH_HEADER, &self.technician_key)
            .form(&[(INPUT_FIELD, input_data.as_str())])
            .send()
            .await
            .map_err(|err| AppError::Transport(format!("failed to call ServiceDesk: {err}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response>".to_string());

        info!("Response Status: {status}");
        info!("Response Body: {body}");

        Ok(ApiResponse { status, body })
    }

    fn record_failed_retry(&self, payload: &TicketPayload, response: &ApiResponse) {
        match self
            .audit_log
            .append(&payload.envelope(), response.status, &response.body)
        {
            Ok(()) => error!(
                "Logged retry error to {}",
                self.audit_log.path().display()
            ),
            Err(err) => error!("{err}"),
        }
    }
}

#[async_trait]
impl TicketService for ServiceDeskClient {
    async fn submit(&self, payload: &TicketPayload) -> AppResult<SubmissionReceipt> {
        let response = self.post(payload).await?;
        if response.is_success() {
            return Ok(SubmissionReceipt {
                status: response.status,
                retried_without_group: false,
            });
        }

        if response.status != VALIDATION_STATUS || !is_group_technician_mismatch(&response.body) {
            return Err(response.into_error());
        }

        warn!("Group validation failed, retrying without group field");
        let retry_payload = payload.without(GROUP_FIELD);
        let retry = self.post(&retry_payload).await?;
        if retry.is_success() {
            return Ok(SubmissionReceipt {
                status: retry.status,
                retried_without_group: true,
            });
        }

        if retry.status == VALIDATION_STATUS {
            self.record_failed_retry(&retry_payload, &retry);
        }
        Err(retry.into_error())
    }
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    response_status: ResponseStatus,
}

#[derive(Deserialize, Default)]
struct ResponseStatus {
    #[serde(default)]
    messages: Vec<StatusMessage>,
}

#[derive(Deserialize)]
struct StatusMessage {
    #[serde(default)]
    message: String,
}

/// True when a validation error body reports that the requested group does
/// not fit the site/technician combination.
pub fn is_group_technician_mismatch(body: &str) -> bool {
    serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| {
            parsed
                .response_status
                .messages
                .iter()
                .any(|entry| entry.message.starts_with(GROUP_TECHNICIAN_MISMATCH_PREFIX))
        })
        .unwrap_or(false)
}

pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    match chars.len() {
        0 => "<not set>".to_string(),
        len if len > 6 => {
            let prefix: String = chars[..3].iter().collect();
            let suffix: String = chars[len - 3..].iter().collect();
            format!("{prefix}***{suffix}")
        }
        _ => "***".to_string(),
    }
}
