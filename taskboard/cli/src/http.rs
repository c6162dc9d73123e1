//! JSON-over-HTTP implementation of [`TaskEndpoints`].

use crate::live::ChangeFeed;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use taskboard_core::client::{ClientError, TaskEndpoints};
use taskboard_core::{NewTask, Task, TaskError, TaskId, TaskPatch};

#[derive(Deserialize, Debug)]
struct ErrorBody {
    error: String,
    message: String,
}

#[derive(Deserialize, Debug)]
struct TasksBody {
    tasks: Vec<Task>,
}

#[derive(Deserialize, Debug)]
struct CreatedBody {
    id: TaskId,
}

#[derive(Serialize, Debug)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize, Debug)]
struct TokenBody {
    token: String,
}

/// Talks to a taskboard server's `/api/v1` routes, authenticating with a bearer token.
#[derive(Debug, Clone)]
pub struct HttpTaskEndpoints {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTaskEndpoints {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    fn task_url(&self, id: TaskId) -> String {
        self.url(&format!("/tasks/{}", id))
    }

    /// Sends `request` with the bearer token, turning non-2xx answers into errors.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await.map_err(transport_error)?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }

    /// Exchanges account credentials for a bearer token.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ClientError> {
        let request = self
            .client
            .post(self.url("/login"))
            .json(&LoginBody { username, password });
        let response = self.send(request).await?;
        let body: TokenBody = response.json().await.map_err(transport_error)?;
        Ok(body.token)
    }

    /// Opens the live change feed for the caller's tasks.
    #[tracing::instrument(skip(self))]
    pub async fn subscribe(&self) -> Result<ChangeFeed, ClientError> {
        let request = self
            .client
            .get(self.url("/tasks/events"))
            .header("accept", "text/event-stream");
        let response = self.send(request).await?;
        Ok(ChangeFeed::new(response))
    }
}

impl TaskEndpoints for HttpTaskEndpoints {
    async fn list(&self) -> Result<Vec<Task>, ClientError> {
        let response = self.send(self.client.get(self.url("/tasks"))).await?;
        let body: TasksBody = response.json().await.map_err(transport_error)?;
        Ok(body.tasks)
    }

    async fn get(&self, id: TaskId) -> Result<Task, ClientError> {
        let response = self.send(self.client.get(self.task_url(id))).await?;
        response.json().await.map_err(transport_error)
    }

    async fn create(&self, task: NewTask) -> Result<TaskId, ClientError> {
        let request = self.client.post(self.url("/tasks")).json(&task);
        let response = self.send(request).await?;
        let body: CreatedBody = response.json().await.map_err(transport_error)?;
        Ok(body.id)
    }

    async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<(), ClientError> {
        let request = self.client.patch(self.task_url(id)).json(&patch);
        self.send(request).await?;
        Ok(())
    }

    async fn remove(&self, id: TaskId) -> Result<(), ClientError> {
        self.send(self.client.delete(self.task_url(id))).await?;
        Ok(())
    }
}

pub(crate) fn transport_error(err: reqwest::Error) -> ClientError {
    ClientError::Transport(err.to_string())
}

/// Maps an error response back onto the task error codes where it carries one.
async fn error_from_response(response: Response) -> ClientError {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(body) => error_from_body(status.as_u16(), body),
        Err(_) => ClientError::Server {
            status: status.as_u16(),
            message: status
                .canonical_reason()
                .unwrap_or("Unexpected response")
                .to_string(),
        },
    }
}

fn error_from_body(status: u16, body: ErrorBody) -> ClientError {
    match TaskError::from_code(&body.error) {
        Some(err) => ClientError::Task(err),
        None => ClientError::Server {
            status,
            message: body.message,
        },
    }
}
