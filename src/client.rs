use std::future::Future;

use anyhow::Context;
use reqwest::{RequestBuilder, Url};
use tracing::{debug, instrument};

use crate::config::DashboardConfig;
use crate::error::RequestFailure;
use crate::models::{ListQuery, StudentRecord};

const STUDENTS_PATH: &str = "students";
const EVALUATE_PATH: &str = "evaluate";

/// The remote owner of student records and the evaluation job.
pub trait DirectoryService {
    fn list_students(
        &self,
        query: ListQuery,
    ) -> impl Future<Output = Result<Vec<StudentRecord>, RequestFailure>>;

    fn evaluate(&self) -> impl Future<Output = Result<Vec<StudentRecord>, RequestFailure>>;
}

#[derive(Debug, Clone)]
pub struct HttpDirectory {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpDirectory {
    pub fn new(config: &DashboardConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .context("failed to build directory service client")?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn students_url(&self, query: ListQuery) -> Result<Url, RequestFailure> {
        let mut url = self.endpoint(STUDENTS_PATH)?;
        let pairs = query.pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    pub fn evaluate_url(&self) -> Result<Url, RequestFailure> {
        self.endpoint(EVALUATE_PATH)
    }

    fn endpoint(&self, path: &str) -> Result<Url, RequestFailure> {
        self.base_url
            .join(path)
            .map_err(|e| RequestFailure::InvalidUrl {
                path: path.to_string(),
                message: e.to_string(),
            })
    }

    async fn fetch_records(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> Result<Vec<StudentRecord>, RequestFailure> {
        let response = request
            .send()
            .await
            .map_err(|source| RequestFailure::Transport {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestFailure::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| RequestFailure::Transport {
                path: path.to_string(),
                source,
            })?;
        serde_json::from_slice(&body).map_err(|source| RequestFailure::Malformed {
            path: path.to_string(),
            source,
        })
    }
}

impl DirectoryService for HttpDirectory {
    #[instrument(name = "directory_list_students", skip(self))]
    async fn list_students(&self, query: ListQuery) -> Result<Vec<StudentRecord>, RequestFailure> {
        let url = self.students_url(query)?;
        debug!(%url, "requesting students");
        let records = self
            .fetch_records(STUDENTS_PATH, self.client.get(url))
            .await?;
        debug!(count = records.len(), "students received");
        Ok(records)
    }

    #[instrument(name = "directory_evaluate", skip(self))]
    async fn evaluate(&self) -> Result<Vec<StudentRecord>, RequestFailure> {
        let url = self.evaluate_url()?;
        debug!(%url, "requesting evaluation");
        let records = self
            .fetch_records(EVALUATE_PATH, self.client.post(url))
            .await?;
        debug!(count = records.len(), "evaluation returned records");
        Ok(records)
    }
}
