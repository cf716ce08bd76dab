//! Adapter between mcproute types and genai types
//!
//! Conversion functions in both directions plus client construction. Auth
//! flows through our `SecretStore` chain rather than genai's own env lookup so
//! a key from the config file wins over the environment.

use std::sync::Arc;

use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions, ChatResponse, Tool as GenaiTool,
    ToolCall as GenaiToolCall, ToolResponse as GenaiToolResponse,
};
use genai::resolver::{AuthData, AuthResolver, Endpoint, ServiceTargetResolver};
use genai::{adapter::AdapterKind, Client, ModelIden, ServiceTarget};
use serde_json::json;

use crate::secrets::SecretStore;
use crate::types::{ChatMessage, Tool, ToolCall, ToolResult};

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatOptions, ModelTurn};

// ============================================================================
// Message Conversion: mcproute -> genai
// ============================================================================

/// Convert one of our tool calls into genai's representation
///
/// Built through serde so that optional provider-specific fields on genai's
/// struct take their defaults.
pub fn to_genai_tool_call(call: &ToolCall) -> ProviderResult<GenaiToolCall> {
    let value = json!({
        "call_id": call.id,
        "fn_name": call.name,
        "fn_arguments": call.input,
    });
    Ok(serde_json::from_value(value)?)
}

/// Convert a tool result into a genai tool response
pub fn to_genai_tool_response(result: ToolResult) -> GenaiToolResponse {
    GenaiToolResponse::new(result.call_id, result.content)
}

/// Convert one message
///
/// An assistant turn that requested tools is sent as genai's tool-call
/// message so the following tool responses can be matched by id.
pub fn to_genai_message(msg: ChatMessage) -> ProviderResult<GenaiMessage> {
    let converted = match msg {
        ChatMessage::System { content } => GenaiMessage::system(content),
        ChatMessage::User { content } => GenaiMessage::user(content),
        ChatMessage::Assistant {
            content,
            tool_calls,
        } => {
            if tool_calls.is_empty() {
                GenaiMessage::assistant(content)
            } else {
                let calls = tool_calls
                    .iter()
                    .map(to_genai_tool_call)
                    .collect::<ProviderResult<Vec<_>>>()?;
                GenaiMessage::from(calls)
            }
        }
        ChatMessage::Tool(result) => GenaiMessage::from(to_genai_tool_response(result)),
    };
    Ok(converted)
}

/// Convert a message history
pub fn to_genai_messages(messages: Vec<ChatMessage>) -> ProviderResult<Vec<GenaiMessage>> {
    messages.into_iter().map(to_genai_message).collect()
}

// ============================================================================
// Tool and Options Conversion: mcproute -> genai
// ============================================================================

/// Convert a tool declaration
pub fn to_genai_tool(tool: Tool) -> GenaiTool {
    let mut genai_tool = GenaiTool::new(&tool.name).with_description(&tool.description);

    if let Some(schema) = tool.input_schema {
        genai_tool = genai_tool.with_schema(schema);
    }

    genai_tool
}

pub fn to_genai_tools(tools: Vec<Tool>) -> Vec<GenaiTool> {
    tools.into_iter().map(to_genai_tool).collect()
}

/// Convert request options; `parallel_tool_calls` has no genai counterpart
pub fn to_genai_options(options: &ChatOptions) -> GenaiOptions {
    let mut genai_opts = GenaiOptions::default();

    if let Some(temp) = options.temperature {
        genai_opts = genai_opts.with_temperature(temp as f64);
    }

    if let Some(max_tokens) = options.max_tokens {
        genai_opts = genai_opts.with_max_tokens(max_tokens);
    }

    genai_opts
}

// ============================================================================
// Response Conversion: genai -> mcproute
// ============================================================================

/// Convert genai ToolCall to ours
pub fn from_genai_tool_call(tc: &GenaiToolCall) -> ToolCall {
    ToolCall {
        id: tc.call_id.clone(),
        name: tc.fn_name.clone(),
        input: tc.fn_arguments.clone(),
    }
}

/// Convert a complete chat response into a model turn
pub fn from_genai_response(response: ChatResponse) -> ModelTurn {
    let content = response.first_text().unwrap_or_default().to_string();
    let tool_calls = response
        .into_tool_calls()
        .iter()
        .map(from_genai_tool_call)
        .collect();

    ModelTurn {
        content,
        tool_calls,
    }
}

// ============================================================================
// Client Creation with Custom Auth
// ============================================================================

/// Map a genai AdapterKind to the provider id used for key lookup
pub fn adapter_kind_to_provider(adapter: AdapterKind) -> String {
    match adapter {
        AdapterKind::OpenAI => "openai".to_string(),
        AdapterKind::Anthropic => "anthropic".to_string(),
        AdapterKind::Gemini => "gemini".to_string(),
        AdapterKind::Ollama => "ollama".to_string(),
        AdapterKind::Groq => "groq".to_string(),
        AdapterKind::Xai => "xai".to_string(),
        AdapterKind::DeepSeek => "deepseek".to_string(),
        _ => format!("{:?}", adapter).to_lowercase(),
    }
}

/// Create a genai Client with our auth and endpoint resolution
///
/// `provider` is the configured provider id (the prefix of `openai/gpt-4o`).
/// When `api_base` is set the request is routed there with the
/// OpenAI-compatible adapter.
pub fn create_client(
    provider: &str,
    api_base: Option<String>,
    secrets: Arc<dyn SecretStore>,
) -> Client {
    let auth_provider = provider.to_string();
    let auth_resolver = AuthResolver::from_resolver_fn(
        move |model_iden: ModelIden| -> Result<Option<AuthData>, genai::resolver::Error> {
            let key = if auth_provider.is_empty() {
                adapter_kind_to_provider(model_iden.adapter_kind)
            } else {
                auth_provider.clone()
            };
            // None lets genai handle keyless providers such as Ollama
            Ok(secrets.get(&key).map(AuthData::from_single))
        },
    );

    let target_provider = provider.to_string();
    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let endpoint = match (&api_base, target_provider.as_str()) {
                (Some(base), _) => Endpoint::from_owned(base.clone()),
                (None, "openrouter") => Endpoint::from_static("https://openrouter.ai/api/v1/"),
                (None, "mistral") => Endpoint::from_static("https://api.mistral.ai/v1/"),
                // Native genai providers resolve normally
                _ => return Ok(target),
            };

            let model = ModelIden::new(AdapterKind::OpenAI, target.model.model_name.clone());
            Ok(ServiceTarget {
                endpoint,
                auth: target.auth,
                model,
            })
        },
    );

    Client::builder()
        .with_auth_resolver(auth_resolver)
        .with_service_target_resolver(target_resolver)
        .build()
}
