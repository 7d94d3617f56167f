//! ExtenderService — forwards scheduler calls to extenders.
//!
//! Sits between the scheduler and its configured extenders. Each call is
//! passed to the extender addressed by index, and a successful answer is
//! recorded in the shared [`ResultStore`] under the extender's name before
//! it is handed back.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::annotation::ExtenderPhase;
use crate::error::{ExtenderError, ExtenderResult};
use crate::store::ResultStore;
use crate::types::{
    ExtenderArgs, ExtenderBindingArgs, ExtenderBindingResult, ExtenderFilterResult,
    ExtenderPreemptionArgs, ExtenderPreemptionResult, HostPriorityList,
};

/// A connection to one extender.
#[async_trait]
pub trait ExtenderClient: Send + Sync {
    /// Name the extender's answers are recorded under.
    fn name(&self) -> &str;

    async fn filter(&self, args: &ExtenderArgs) -> ExtenderResult<ExtenderFilterResult>;

    async fn prioritize(&self, args: &ExtenderArgs) -> ExtenderResult<HostPriorityList>;

    async fn preempt(
        &self,
        args: &ExtenderPreemptionArgs,
    ) -> ExtenderResult<ExtenderPreemptionResult>;

    async fn bind(&self, args: &ExtenderBindingArgs) -> ExtenderResult<ExtenderBindingResult>;
}

pub struct ExtenderService {
    extenders: Vec<Arc<dyn ExtenderClient>>,
    store: Arc<ResultStore>,
}

impl ExtenderService {
    pub fn new(store: Arc<ResultStore>) -> Self {
        Self {
            extenders: Vec::new(),
            store,
        }
    }

    /// Register an extender. Its index is the registration order and must
    /// match its position in the scheduler configuration's extender list,
    /// which `SchedulerConfig::route_extenders_through` turns into the
    /// `<verb>/<index>` paths the scheduler calls.
    pub fn with_extender(mut self, client: Arc<dyn ExtenderClient>) -> Self {
        self.extenders.push(client);
        self
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    pub fn extender_names(&self) -> Vec<&str> {
        self.extenders.iter().map(|e| e.name()).collect()
    }

    fn extender(&self, id: usize) -> ExtenderResult<&Arc<dyn ExtenderClient>> {
        self.extenders.get(id).ok_or(ExtenderError::Unknown(id))
    }

    pub async fn filter(
        &self,
        id: usize,
        args: &ExtenderArgs,
    ) -> ExtenderResult<ExtenderFilterResult> {
        let extender = self.extender(id)?;
        let result = extender
            .filter(args)
            .await
            .inspect_err(|e| log_failure(extender.name(), ExtenderPhase::Filter, e))?;
        self.store
            .add_filter_result(args, result.clone(), extender.name());
        Ok(result)
    }

    pub async fn prioritize(
        &self,
        id: usize,
        args: &ExtenderArgs,
    ) -> ExtenderResult<HostPriorityList> {
        let extender = self.extender(id)?;
        let result = extender
            .prioritize(args)
            .await
            .inspect_err(|e| log_failure(extender.name(), ExtenderPhase::Prioritize, e))?;
        self.store
            .add_prioritize_result(args, result.clone(), extender.name());
        Ok(result)
    }

    pub async fn preempt(
        &self,
        id: usize,
        args: &ExtenderPreemptionArgs,
    ) -> ExtenderResult<ExtenderPreemptionResult> {
        let extender = self.extender(id)?;
        let result = extender
            .preempt(args)
            .await
            .inspect_err(|e| log_failure(extender.name(), ExtenderPhase::Preempt, e))?;
        self.store
            .add_preempt_result(args, result.clone(), extender.name());
        Ok(result)
    }

    pub async fn bind(
        &self,
        id: usize,
        args: &ExtenderBindingArgs,
    ) -> ExtenderResult<ExtenderBindingResult> {
        let extender = self.extender(id)?;
        let result = extender
            .bind(args)
            .await
            .inspect_err(|e| log_failure(extender.name(), ExtenderPhase::Bind, e))?;
        self.store
            .add_bind_result(args, result.clone(), extender.name());
        Ok(result)
    }
}

fn log_failure(name: &str, phase: ExtenderPhase, error: &ExtenderError) {
    warn!(extender = name, %phase, %error, "extender call failed");
}
