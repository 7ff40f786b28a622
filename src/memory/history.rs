use crate::types::Message;
use std::collections::VecDeque;

/// Chronological message log for one conversation, bounded by entry count.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    max_messages: usize,
    messages: VecDeque<Message>,
}

impl ConversationHistory {
    pub fn new(max_messages: usize) -> Self {
        Self {
            max_messages: max_messages.max(1),
            messages: VecDeque::new(),
        }
    }

    /// Append in order, then drop the oldest entries beyond the limit.
    pub fn extend<I>(&mut self, messages: I)
    where
        I: IntoIterator<Item = Message>,
    {
        self.messages.extend(messages);
        self.trim_if_needed();
    }

    pub fn get_messages(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn trim_if_needed(&mut self) {
        while self.messages.len() > self.max_messages {
            self.messages.pop_front();
        }
    }
}
