use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

pub const SORRY_REPLY: &str = "Sorry, I couldn't understand your request. Please try rephrasing.";
pub const OOPS_REPLY: &str = "Oops! Something went wrong. Please try again later.";

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are CloudShareBot, an assistant for a cloud sharing app. \
Reply in 1–2 lines. Help users upload files, send messages, and use the dashboard. \
Don't mention tech unless asked. The app works without login, like AirDrop. \
If asked about tech, say: We use Firebase, Cloudinary, Next.js (TypeScript), and Docker.";

/// A text-in, text-out model endpoint.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// `Ok(None)` when the endpoint answered without any reply text.
    async fn generate(&self, system_instruction: &str, text: &str) -> Result<Option<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Bot => "CloudShareBot",
        }
    }
}

impl Serialize for Sender {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
        }
    }
}

// `{"sender": "user", "label": "You", "text": ...}`
impl Serialize for ChatMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ChatMessage", 3)?;
        s.serialize_field("sender", &self.sender)?;
        s.serialize_field("label", self.sender.label())?;
        s.serialize_field("text", &self.text)?;
        s.end()
    }
}

/// One chat transcript and the model it talks to.
pub struct ChatRelay {
    model: Arc<dyn LanguageModel>,
    system_instruction: String,
    messages: Vec<ChatMessage>,
}

impl ChatRelay {
    pub fn new(model: Arc<dyn LanguageModel>, system_instruction: impl Into<String>) -> Self {
        Self {
            model,
            system_instruction: system_instruction.into(),
            messages: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Append the user's text and exactly one bot reply. Blank input is
    /// ignored. Model failures become a fixed apology; they never reach the
    /// caller.
    pub async fn submit(&mut self, input: &str) -> Option<&ChatMessage> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }

        self.messages.push(ChatMessage::user(text));

        let reply = match self.model.generate(&self.system_instruction, text).await {
            Ok(Some(reply)) if !reply.is_empty() => reply,
            Ok(_) => {
                tracing::warn!("model reply carried no text");
                SORRY_REPLY.to_string()
            }
            Err(e) => {
                tracing::error!(error = %e, "model call failed");
                OOPS_REPLY.to_string()
            }
        };

        self.messages.push(ChatMessage::bot(reply));
        self.messages.last()
    }
}
