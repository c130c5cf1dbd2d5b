//! In-process prompt store.
//!
//! Backs the test suite and the `static` demo mode. A single
//! `tokio::sync::Mutex` over the map makes every operation (including
//! the precondition check plus write in [`PromptStore::transition`])
//! atomic with respect to concurrent callers, which is exactly the
//! guarantee the port requires.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::prompt::{Prompt, PromptStatus};
use crate::store::{PromptStore, StatusWrite, StoreError, TransitionOutcome};
use crate::types::{PromptId, Timestamp};

/// HashMap-backed [`PromptStore`].
#[derive(Default)]
pub struct MemoryPromptStore {
    prompts: Mutex<HashMap<PromptId, Prompt>>,
}

impl MemoryPromptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PromptStore for MemoryPromptStore {
    async fn insert(&self, prompt: &Prompt) -> Result<(), StoreError> {
        let mut prompts = self.prompts.lock().await;
        if prompts.contains_key(&prompt.id) {
            return Err(StoreError::Backend(format!(
                "duplicate prompt id {}",
                prompt.id
            )));
        }
        prompts.insert(prompt.id, prompt.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: PromptId) -> Result<Option<Prompt>, StoreError> {
        Ok(self.prompts.lock().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Prompt>, StoreError> {
        let prompts = self.prompts.lock().await;
        let mut all: Vec<Prompt> = prompts.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn list_pending_older_than(
        &self,
        cutoff: Timestamp,
    ) -> Result<Vec<Prompt>, StoreError> {
        let prompts = self.prompts.lock().await;
        let mut stale: Vec<Prompt> = prompts
            .values()
            .filter(|p| p.status == PromptStatus::Pending && p.created_at < cutoff)
            .cloned()
            .collect();
        stale.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(stale)
    }

    async fn update_text(
        &self,
        id: PromptId,
        text: &str,
    ) -> Result<Option<Prompt>, StoreError> {
        let mut prompts = self.prompts.lock().await;
        Ok(prompts.get_mut(&id).map(|prompt| {
            prompt.text = text.to_string();
            prompt.updated_at = Some(chrono::Utc::now());
            prompt.clone()
        }))
    }

    async fn delete(&self, id: PromptId) -> Result<bool, StoreError> {
        Ok(self.prompts.lock().await.remove(&id).is_some())
    }

    async fn transition(
        &self,
        id: PromptId,
        expected: Option<PromptStatus>,
        write: StatusWrite,
    ) -> Result<TransitionOutcome, StoreError> {
        let mut prompts = self.prompts.lock().await;
        let Some(prompt) = prompts.get_mut(&id) else {
            return Ok(TransitionOutcome::NotFound);
        };

        if let Some(expected) = expected {
            if prompt.status != expected {
                return Ok(TransitionOutcome::Conflict {
                    current: prompt.status,
                });
            }
        }

        prompt.status = write.status();
        match write {
            StatusWrite::Processing => prompt.error_message = None,
            StatusWrite::Completed { output } => prompt.output_text = Some(output),
            StatusWrite::Failed { error } => prompt.error_message = Some(error),
        }
        prompt.updated_at = Some(chrono::Utc::now());

        Ok(TransitionOutcome::Applied(prompt.clone()))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
