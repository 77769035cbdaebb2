//! Jenkins-backed [`CiGateway`] over the JSON/HTTP remote API.
//!
//! | Operation        | Request                                              |
//! |------------------|------------------------------------------------------|
//! | list jobs        | `GET  /api/json?tree=jobs[name]`                     |
//! | list views       | `GET  /api/json?tree=views[name]`                    |
//! | create job       | `POST /createItem?name=<job>` (XML body)             |
//! | delete job       | `POST /job/<job>/doDelete`                           |
//! | create view      | `POST /createView` (form, `hudson.model.ListView`)   |
//! | add job to view  | `POST /view/<view>/addJobToView?name=<job>`          |
//! | delete view      | `POST /view/<view>/doDelete`                         |
//!
//! POSTs carry a CSRF crumb from `/crumbIssuer/api/json` when the server
//! issues one. The crumb is fetched on the first mutation and reused. Jenkins
//! only honours a crumb within the session that issued it, so the agent keeps
//! a cookie store and replays the session cookie on every POST.
//!
//! Redirects are never followed. A redirected GET (login page, http to https)
//! is reported as a status error instead of being decoded.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

use branchsync_core::{
    config::JenkinsSettings,
    error::GatewayError,
    gateway::CiGateway,
    types::{Descriptor, JobName, ViewHandle, ViewName},
};

const LIST_VIEW_MODE: &str = "hudson.model.ListView";

#[derive(Debug, Deserialize)]
struct NamedItem {
    name: String,
}

#[derive(Debug, Deserialize)]
struct JobsResponse {
    #[serde(default)]
    jobs: Vec<NamedItem>,
}

#[derive(Debug, Deserialize)]
struct ViewsResponse {
    #[serde(default)]
    views: Vec<NamedItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CrumbResponse {
    crumb: String,
    crumb_request_field: String,
}

/// `(header name, header value)`
type Crumb = (String, String);

/// Blocking Jenkins client.
pub struct JenkinsClient {
    agent: ureq::Agent,
    base_url: String,
    authorization: Option<String>,
    /// `None` until fetched; `Some(None)` when the server has no crumb issuer.
    crumb: Option<Option<Crumb>>,
}

impl JenkinsClient {
    pub fn new(settings: &JenkinsSettings) -> Self {
        let authorization = settings.username.as_ref().map(|user| {
            let password = settings.password.as_deref().unwrap_or_default();
            format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
        });
        Self::with_parts(&settings.url, authorization, settings.timeout)
    }

    fn with_parts(base_url: &str, authorization: Option<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).redirects(0).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            authorization,
            crumb: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        let request = self.agent.request(method, url);
        match &self.authorization {
            Some(auth) => request.set("Authorization", auth),
            None => request,
        }
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        let url = self.url(path);
        let mut request = self.request("GET", &url);
        for (key, value) in query {
            request = request.query(key, value);
        }
        let response = request.call().map_err(|e| map_ureq_err("GET", &url, e))?;
        let status = response.status();
        if (300..400).contains(&status) {
            let location = response.header("location").unwrap_or("<none>").to_string();
            return Err(GatewayError::Status {
                method: "GET",
                url,
                status,
                body: format!("redirected to {location}"),
            });
        }
        response
            .into_json::<T>()
            .map_err(|e| GatewayError::Decode { url, message: e.to_string() })
    }

    fn crumb(&mut self) -> Result<Option<Crumb>, GatewayError> {
        if let Some(cached) = &self.crumb {
            return Ok(cached.clone());
        }
        let fetched = match self.get_json::<CrumbResponse>("/crumbIssuer/api/json", &[]) {
            Ok(c) => Some((c.crumb_request_field, c.crumb)),
            Err(GatewayError::Status { status: 404, .. }) => None,
            Err(err) => return Err(err),
        };
        tracing::debug!(enabled = fetched.is_some(), "jenkins crumb issuer");
        self.crumb = Some(fetched.clone());
        Ok(fetched)
    }

    /// POST with crumb; `send` attaches the body (if any) and performs the call.
    fn post(
        &mut self,
        path: &str,
        query: &[(&str, &str)],
        send: impl FnOnce(ureq::Request) -> Result<ureq::Response, ureq::Error>,
    ) -> Result<(), GatewayError> {
        let crumb = self.crumb()?;
        let url = self.url(path);
        let mut request = self.request("POST", &url);
        if let Some((field, value)) = &crumb {
            request = request.set(field, value);
        }
        for (key, value) in query {
            request = request.query(key, value);
        }
        send(request).map_err(|e| map_ureq_err("POST", &url, e))?;
        Ok(())
    }
}

impl CiGateway for JenkinsClient {
    fn list_jobs(&self) -> Result<Vec<JobName>, GatewayError> {
        let body: JobsResponse = self.get_json("/api/json", &[("tree", "jobs[name]")])?;
        Ok(body.jobs.into_iter().map(|j| JobName(j.name)).collect())
    }

    fn list_views(&self) -> Result<Vec<ViewName>, GatewayError> {
        let body: ViewsResponse = self.get_json("/api/json", &[("tree", "views[name]")])?;
        Ok(body.views.into_iter().map(|v| ViewName(v.name)).collect())
    }

    fn create_job(&mut self, name: &JobName, descriptor: &Descriptor) -> Result<(), GatewayError> {
        self.post("/createItem", &[("name", name.as_str())], |req| {
            req.set("Content-Type", "application/xml")
                .send_string(descriptor.as_str())
        })?;
        tracing::info!(job = %name, "created job");
        Ok(())
    }

    fn delete_job(&mut self, name: &JobName) -> Result<(), GatewayError> {
        let path = format!("/job/{}/doDelete", urlencoding::encode(name.as_str()));
        self.post(&path, &[], |req| req.call())?;
        tracing::info!(job = %name, "deleted job");
        Ok(())
    }

    fn create_view(&mut self, name: &ViewName) -> Result<ViewHandle, GatewayError> {
        let json = serde_json::json!({ "name": name.as_str(), "mode": LIST_VIEW_MODE }).to_string();
        self.post("/createView", &[], |req| {
            req.send_form(&[("name", name.as_str()), ("mode", LIST_VIEW_MODE), ("json", json.as_str())])
        })?;
        tracing::info!(view = %name, "created view");
        Ok(ViewHandle::existing(name.clone()))
    }

    fn add_job_to_view(&mut self, view: &ViewHandle, job: &JobName) -> Result<(), GatewayError> {
        let path = format!("/view/{}/addJobToView", urlencoding::encode(view.name.as_str()));
        self.post(&path, &[("name", job.as_str())], |req| req.call())?;
        tracing::info!(view = %view, job = %job, "added job to view");
        Ok(())
    }

    fn delete_view(&mut self, name: &ViewName) -> Result<(), GatewayError> {
        let path = format!("/view/{}/doDelete", urlencoding::encode(name.as_str()));
        self.post(&path, &[], |req| req.call())?;
        tracing::info!(view = %name, "deleted view");
        Ok(())
    }
}

fn map_ureq_err(method: &'static str, url: &str, err: ureq::Error) -> GatewayError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            GatewayError::Status {
                method,
                url: url.to_string(),
                status,
                body: truncate(&body, 512),
            }
        }
        ureq::Error::Transport(transport) => GatewayError::Transport {
            method,
            url: url.to_string(),
            message: transport.to_string(),
        },
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}
