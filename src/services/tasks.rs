// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cloud Tasks dispatch for work done outside the request path.
//!
//! Message sends are queued here and delivered by Cloud Tasks to the worker's
//! `/tasks/send-message` endpoint with a Google-signed OIDC token. Delivery is
//! at-least-once; the queue retries on any non-2xx answer.
//!
//! Uses the official google-cloud-tasks-v2 SDK. `TasksMode::Mock` swaps in an
//! in-memory recorder for tests and local development.

use crate::config::{Config, TasksMode, MESSAGING_QUEUE_NAME};
use crate::error::{AppError, Result};
use google_cloud_tasks_v2::client::CloudTasks;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::OnceCell;

pub const SEND_MESSAGE_ENDPOINT: &str = "/tasks/send-message";

/// Payload for an outbound message job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageJob {
    /// Provider name; the worker's default is used when absent.
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub to: String,
    pub text: String,
}

/// A job captured by the mock backend.
#[derive(Debug, Clone)]
pub struct QueuedTask {
    pub id: String,
    pub endpoint: String,
    pub payload: serde_json::Value,
}

enum Backend {
    Cloud {
        client: OnceCell<CloudTasks>,
        queue_path: String,
        service_account: String,
    },
    Mock {
        tasks: Mutex<Vec<QueuedTask>>,
    },
}

/// Cloud Tasks client wrapper.
pub struct TasksService {
    worker_url: String,
    backend: Backend,
}

impl TasksService {
    pub fn from_config(config: &Config) -> Self {
        match config.tasks_mode {
            TasksMode::Cloud => Self::new(
                &config.gcp_project_id,
                &config.gcp_region,
                &config.worker_url,
                &config.tasks_service_account,
            ),
            TasksMode::Mock => Self::new_mock(&config.worker_url),
        }
    }

    pub fn new(project_id: &str, region: &str, worker_url: &str, service_account: &str) -> Self {
        Self {
            worker_url: worker_url.trim_end_matches('/').to_string(),
            backend: Backend::Cloud {
                client: OnceCell::new(),
                queue_path: format!(
                    "projects/{}/locations/{}/queues/{}",
                    project_id, region, MESSAGING_QUEUE_NAME
                ),
                service_account: service_account.to_string(),
            },
        }
    }

    pub fn new_mock(worker_url: &str) -> Self {
        Self {
            worker_url: worker_url.trim_end_matches('/').to_string(),
            backend: Backend::Mock {
                tasks: Mutex::new(Vec::new()),
            },
        }
    }

    /// Queue a message send. Returns the broker's task name (or a mock id).
    pub async fn queue_send_message(&self, job: SendMessageJob) -> Result<String> {
        let task_id = self.queue_task(SEND_MESSAGE_ENDPOINT, &job).await?;
        tracing::info!(
            task_id = %task_id,
            user_id = ?job.user_id,
            provider = ?job.provider,
            "Queued message send"
        );
        Ok(task_id)
    }

    /// Jobs recorded by the mock backend, oldest first. Empty for Cloud Tasks.
    pub fn queued_tasks(&self) -> Vec<QueuedTask> {
        match &self.backend {
            Backend::Mock { tasks } => tasks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone(),
            Backend::Cloud { .. } => Vec::new(),
        }
    }

    /// Generic task queuing helper.
    async fn queue_task<T: Serialize>(&self, endpoint: &str, payload: &T) -> Result<String> {
        match &self.backend {
            Backend::Mock { tasks } => {
                let payload = serde_json::to_value(payload)
                    .map_err(|e| AppError::Internal(anyhow::anyhow!("JSON error: {}", e)))?;
                let mut tasks = tasks
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                let id = format!("mock-task-{}", tasks.len() + 1);
                tasks.push(QueuedTask {
                    id: id.clone(),
                    endpoint: endpoint.to_string(),
                    payload,
                });
                Ok(id)
            }
            Backend::Cloud {
                client,
                queue_path,
                service_account,
            } => {
                self.create_cloud_task(client, queue_path, service_account, endpoint, payload)
                    .await
            }
        }
    }

    async fn create_cloud_task<T: Serialize>(
        &self,
        client: &OnceCell<CloudTasks>,
        queue_path: &str,
        service_account: &str,
        endpoint: &str,
        payload: &T,
    ) -> Result<String> {
        use google_cloud_tasks_v2::model::{HttpRequest, OidcToken, Task};

        let client = client
            .get_or_try_init(|| async { CloudTasks::builder().build().await })
            .await
            .map_err(|e| AppError::TaskQueue(format!("Cloud Tasks client error: {}", e)))?;

        let body = serde_json::to_vec(payload)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JSON error: {}", e)))?;

        let http_request = HttpRequest::default()
            .set_url(format!("{}{}", self.worker_url, endpoint))
            .set_http_method("POST")
            .set_body(axum::body::Bytes::from(body))
            .set_headers(std::collections::HashMap::from([(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )]))
            .set_oidc_token(
                OidcToken::default()
                    .set_service_account_email(service_account.to_string())
                    .set_audience(self.worker_url.clone()),
            );

        let task = Task::default().set_http_request(http_request);

        let created = client
            .create_task()
            .set_parent(queue_path.to_string())
            .set_task(task)
            .send()
            .await
            .map_err(|e| AppError::TaskQueue(format!("Cloud Tasks create error: {}", e)))?;

        Ok(created.name)
    }
}
