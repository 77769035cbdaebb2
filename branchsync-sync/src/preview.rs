//! Dry-run decorator for a [`CiGateway`].
//!
//! Reads are delegated unchanged. Every mutation is logged with a `[dry-run]`
//! prefix and skipped; `create_view` hands back a placeholder handle so the
//! follow-up `add_job_to_view` line can name the view.

use branchsync_core::{
    error::GatewayError,
    gateway::CiGateway,
    types::{Descriptor, JobName, ViewHandle, ViewName},
};

pub struct PreviewGateway<C> {
    inner: C,
    suppressed: Vec<String>,
}

impl<C: CiGateway> PreviewGateway<C> {
    pub fn new(inner: C) -> Self {
        Self { inner, suppressed: Vec::new() }
    }

    /// Log lines for the calls that were skipped, in call order.
    pub fn suppressed(&self) -> &[String] {
        &self.suppressed
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    fn skip(&mut self, line: String) {
        tracing::info!("[dry-run] {line}");
        self.suppressed.push(line);
    }
}

impl<C: CiGateway> CiGateway for PreviewGateway<C> {
    fn list_jobs(&self) -> Result<Vec<JobName>, GatewayError> {
        self.inner.list_jobs()
    }

    fn list_views(&self) -> Result<Vec<ViewName>, GatewayError> {
        self.inner.list_views()
    }

    fn create_job(&mut self, name: &JobName, descriptor: &Descriptor) -> Result<(), GatewayError> {
        self.skip(format!(
            "would create job {name} ({} byte descriptor)",
            descriptor.as_str().len()
        ));
        Ok(())
    }

    fn delete_job(&mut self, name: &JobName) -> Result<(), GatewayError> {
        self.skip(format!("would delete job {name}"));
        Ok(())
    }

    fn create_view(&mut self, name: &ViewName) -> Result<ViewHandle, GatewayError> {
        self.skip(format!("would create view {name}"));
        Ok(ViewHandle::placeholder(name.clone()))
    }

    fn add_job_to_view(&mut self, view: &ViewHandle, job: &JobName) -> Result<(), GatewayError> {
        self.skip(format!("would add job {job} to view {view}"));
        Ok(())
    }

    fn delete_view(&mut self, name: &ViewName) -> Result<(), GatewayError> {
        self.skip(format!("would delete view {name}"));
        Ok(())
    }
}
