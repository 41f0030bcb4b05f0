use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Local;
use serde::Serialize;
use tracing::info;

use crate::task::DeferredTask;

pub const GREETING: &str = "안녕하세요! 저는 Gemini AI 어시스턴트입니다. 무엇을 도와드릴까요?";

pub const CANNED_REPLIES: [&str; 5] = [
    "좋은 질문이네요! 제가 도와드리겠습니다. AI 기술을 활용하면 업무 효율을 크게 향상시킬 수 있습니다.",
    "네, 이해했습니다. 해당 내용에 대해 자세히 설명드리겠습니다.",
    "흥미로운 주제입니다. 더 자세한 정보가 필요하시다면 말씀해 주세요.",
    "제 분석 결과에 따르면, 이 방법이 가장 효과적일 것 같습니다.",
    "물론입니다! 단계별로 설명드리겠습니다.",
];

pub const QUICK_PROMPTS: [&str; 4] = [
    "공모사업 찾기",
    "제안서 작성 도움",
    "프로젝트 관리 팁",
    "AI 활용 방법",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub id: u32,
    pub role: Role,
    pub content: String,
    /// Local `HH:MM`.
    pub timestamp: String,
}

#[derive(Debug)]
struct Conversation {
    /// Bumped on reset so replies scheduled for an old conversation are dropped.
    epoch: u64,
    messages: Vec<ChatMessage>,
    next_id: u32,
    next_reply: usize,
    next_ticket: u64,
    pending: Vec<(u64, DeferredTask)>,
}

impl Conversation {
    fn fresh(epoch: u64) -> Self {
        let mut conversation = Self {
            epoch,
            messages: Vec::new(),
            next_id: 1,
            next_reply: 0,
            next_ticket: 0,
            pending: Vec::new(),
        };
        conversation.push(Role::Assistant, GREETING.to_string());
        conversation
    }

    fn push(&mut self, role: Role, content: String) {
        self.messages.push(ChatMessage {
            id: self.next_id,
            role,
            content,
            timestamp: Local::now().format("%H:%M").to_string(),
        });
        self.next_id += 1;
    }
}

/// Mock assistant: every user message gets one canned reply after a fixed delay.
#[derive(Debug, Clone)]
pub struct ChatAssistant {
    reply_delay: Duration,
    inner: Arc<Mutex<Conversation>>,
}

impl ChatAssistant {
    pub fn new(reply_delay: Duration) -> Self {
        Self {
            reply_delay,
            inner: Arc::new(Mutex::new(Conversation::fresh(0))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Conversation> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends the user's message and schedules a reply. Blank input is ignored
    /// and returns `false`.
    pub fn send(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let mut conversation = self.lock();
        conversation.push(Role::User, text.to_string());

        let reply = CANNED_REPLIES[conversation.next_reply % CANNED_REPLIES.len()];
        conversation.next_reply += 1;
        let ticket = conversation.next_ticket;
        conversation.next_ticket += 1;
        let epoch = conversation.epoch;

        let inner = self.inner.clone();
        let task = DeferredTask::start(
            "chat_reply",
            self.reply_delay,
            move || reply.to_string(),
            move |content| {
                let mut conversation = inner.lock().unwrap_or_else(PoisonError::into_inner);
                if conversation.epoch != epoch {
                    return;
                }
                conversation.pending.retain(|(t, _)| *t != ticket);
                conversation.push(Role::Assistant, content);
            },
        );
        conversation.pending.push((ticket, task));
        info!(ticket, "chat message queued for reply");
        true
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().messages.clone()
    }

    pub fn is_thinking(&self) -> bool {
        !self.lock().pending.is_empty()
    }

    /// Cancels outstanding replies and starts over from the greeting.
    pub fn reset(&self) {
        let mut conversation = self.lock();
        for (_, task) in &conversation.pending {
            task.cancel();
        }
        let epoch = conversation.epoch + 1;
        *conversation = Conversation::fresh(epoch);
        info!(epoch, "chat conversation reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn reply_arrives_after_delay() {
        let chat = ChatAssistant::new(Duration::from_millis(1500));
        assert_eq!(chat.messages().len(), 1);
        assert!(chat.send("공모사업 찾기"));
        assert!(chat.is_thinking());
        assert_eq!(chat.messages().len(), 2);

        tokio::time::sleep(Duration::from_millis(1600)).await;
        let messages = chat.messages();
        assert!(!chat.is_thinking());
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, CANNED_REPLIES[0]);
        assert_eq!(messages.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_messages_are_ignored() {
        let chat = ChatAssistant::new(Duration::from_millis(10));
        assert!(!chat.send("   "));
        assert!(!chat.is_thinking());
        assert_eq!(chat.messages().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn replies_rotate_through_canned_list() {
        let chat = ChatAssistant::new(Duration::from_millis(10));
        for text in ["a", "b"] {
            chat.send(text);
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let replies = chat
            .messages()
            .into_iter()
            .filter(|m| m.role == Role::Assistant)
            .map(|m| m.content)
            .collect::<Vec<_>>();
        assert_eq!(replies, vec![GREETING, CANNED_REPLIES[0], CANNED_REPLIES[1]]);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_drops_pending_reply() {
        let chat = ChatAssistant::new(Duration::from_millis(1500));
        chat.send("hello");
        chat.reset();
        assert!(!chat.is_thinking());
        tokio::time::sleep(Duration::from_secs(3)).await;
        let messages = chat.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, GREETING);
    }
}
