//! Timer-backed stand-ins for the assistant screens: chat replies, proposal
//! generation and listing refresh. No inference or crawling happens here.

mod chat;
mod proposal;
mod refresh;
mod task;

use thiserror::Error;
use uuid::Uuid;

pub use chat::{ChatAssistant, ChatMessage, Role, CANNED_REPLIES, GREETING, QUICK_PROMPTS};
pub use proposal::{
    to_word_document, GeneratedProposal, ProposalDesk, ProposalRequest, PROJECT_TYPES,
};
pub use refresh::CrawlRefresher;
pub use task::DeferredTask;

pub const CRATE_NAME: &str = "gongmo-assist";

#[derive(Debug, Error)]
pub enum AssistError {
    #[error("deferred task {0} was cancelled")]
    Cancelled(Uuid),
    #[error("deferred task {id} panicked: {message}")]
    Panicked { id: Uuid, message: String },
}
