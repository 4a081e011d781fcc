pub mod command;
pub mod error;
pub mod event;
pub mod execution_error;
pub mod instance;
pub mod journal;
pub mod payload;

pub use command::{Command, CommandAttrs};
pub use error::DomainError;
pub use event::{EventType, HistoryEvent, Metadata, RetryPolicy};
pub use execution_error::{ErrorKind, ExecutionError};
pub use instance::{derive_execution_id, ParentLink, WorkflowInstance};
pub use journal::{AwaitKind, ExecutionJournal, ExecutionStatus};
pub use payload::{Codec, Converter, JsonConverter, Payload};
