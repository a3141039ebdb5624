//! OpenAI-compatible chat-completions client and the insight generator built on it.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::http::{build_client, send_json};
use crate::service::InsightService;
use crate::types::InsightRequest;

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Minimal client for `POST {base_url}/chat/completions`.
pub struct ChatCompletionsClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsClient {
    /// # Errors
    ///
    /// Returns [`ServiceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout_secs: Option<u64>,
        user_agent: &str,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            client: build_client(timeout_secs, user_agent)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends a system + user prompt and returns the first choice's text.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Upstream`] on a non-2xx response,
    /// [`ServiceError::EmptyCompletion`] when no choice carries text.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, ServiceError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user.to_string(),
                },
            ],
        };

        tracing::debug!(model = %self.model, "chat completion request");

        let response: ChatResponse = send_json(
            self.client
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&request),
            "llm",
            "chat completion response",
        )
        .await?;

        response
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(ServiceError::EmptyCompletion)
    }
}

/// Builds the system prompt restricting the summary to one language.
#[must_use]
pub fn insight_system_prompt(language: &str) -> String {
    format!(
        "You are an AI social media post analysis assistant.\n\
         You will be given post comments and the overall sentiment of the post comments.\n\
         Your job is to analyze the post comments and provide a summary of the post comments.\n\
         Be detailed and to the point.\n\
         Do not include any other text than the summary.\n\
         Only use {language}, no other language.\n\
         Do not add response headers like \"Here is the summary\".\n\
         Format your response in markdown in the following order:\n\
         General Summary -> What are most of the comments about? -> Conclusion.\n\
         Remember to respond in {language} only."
    )
}

/// Generates insight text directly from the LLM.
pub struct LlmInsightGenerator {
    chat: ChatCompletionsClient,
    language: String,
}

impl LlmInsightGenerator {
    #[must_use]
    pub fn new(chat: ChatCompletionsClient, language: &str) -> Self {
        Self {
            chat,
            language: language.to_string(),
        }
    }

    fn user_prompt(request: &InsightRequest) -> Result<String, ServiceError> {
        let encode = |context: &str, source: serde_json::Error| ServiceError::Encode {
            context: context.to_string(),
            source,
        };
        let distribution = serde_json::to_string(&request.distribution)
            .map_err(|e| encode("insight distribution", e))?;
        let comments = serde_json::to_string(&request.comments)
            .map_err(|e| encode("insight comments", e))?;

        let mut prompt = format!("Post Sentiments: {distribution}\nComments: {comments}");
        if let Some(post) = &request.post {
            let post = serde_json::to_string(post).map_err(|e| encode("insight post", e))?;
            prompt.push_str("\nPost: ");
            prompt.push_str(&post);
        }
        Ok(prompt)
    }
}

impl InsightService for LlmInsightGenerator {
    async fn generate(&self, request: &InsightRequest) -> Result<String, ServiceError> {
        let user = Self::user_prompt(request)?;
        tracing::info!(
            model = self.chat.model(),
            comments = request.comments.len(),
            "generating insight"
        );
        self.chat
            .complete(&insight_system_prompt(&self.language), &user)
            .await
    }
}
