//! `SideEffect` (spec.md §4.D), as its own module per SPEC_FULL.md: a
//! command whose harvesting behavior depends on `replaying`, grounded on
//! `original_source/workflow/sideeffect.go`'s `SideEffect[TResult]`.
//!
//! On first execution the user function runs immediately, in the same
//! turn, and the future resolves before this call returns. On replay the
//! function is never invoked; the `SideEffectResult` event already in
//! history resolves the future once the executor applies it.

use serde::de::DeserializeOwned;
use serde::Serialize;

use workflow_types::{CommandAttrs, Converter, ErrorKind, ExecutionError};

use crate::ctx::WorkflowCtx;

impl WorkflowCtx {
    pub async fn side_effect<T, F>(&self, f: F) -> Result<T, ExecutionError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        if self.coop.is_cancelled() {
            return Err(ExecutionError::new(ErrorKind::Cancelled, "workflow context cancelled"));
        }

        let (id, future) = {
            let mut state = self.state.borrow_mut();
            let id = state.next_schedule_event_id();
            state.add_command(id, CommandAttrs::SideEffect {
                result: workflow_types::Payload::new(Vec::new(), workflow_types::Codec::Json),
            });
            let future = std::rc::Rc::new(workflow_sync::SharedFuture::new());
            state.register_pending_future(id, future.clone());
            (id, future)
        };

        if !self.is_replaying() {
            let value = f();
            let payload = self
                .converter
                .to_payload(&value)
                .map_err(|e| ExecutionError::new(ErrorKind::ConversionError, e.to_string()))?;

            // The command's recorded result must match what we just
            // computed, since translate.rs harvests it verbatim into the
            // SideEffectResult event.
            {
                let mut state = self.state.borrow_mut();
                if let Some(cmd) = state.commands_mut().iter_mut().find(|c| c.id == id) {
                    if let CommandAttrs::SideEffect { result } = &mut cmd.attrs {
                        *result = payload.clone();
                    }
                }
            }
            future.set(Ok(payload));
        }

        let payload = (*future).clone().await?;
        self.converter
            .from_payload(&payload)
            .map_err(|e| ExecutionError::new(ErrorKind::ConversionError, e.to_string()))
    }
}
