//! Message triage: classification prompt and the Gemini-backed classifier

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::providers::{Classifier, GeminiClient};
use crate::types::TriageVerdict;
use crate::{DeskError, Result};

/// Triage instruction: decision rules for the three action categories.
/// The model must answer with the JSON shape `TriageVerdict` parses.
pub const TRIAGE_PROMPT: &str = "\
Você é um triador de Service Desk para políticas internas da empresa. \
Dada a mensagem do usuário, retorne SOMENTE um JSON com:\n\
{\n\
  \"decisao\": \"AUTO_RESOLVER\" | \"PEDIR_INFO\" | \"ABRIR_CHAMADO\",\n\
  \"urgencia\": \"BAIXA\" | \"MEDIA\" | \"ALTA\",\n\
  \"campos_faltantes\": [\"...\"]\n\
}\n\
Regras:\n\
- AUTO_RESOLVER: Perguntas claras sobre regras ou procedimentos descritos nas políticas \
(Ex: \"Posso reembolsar a internet do meu home office?\", \"Como funciona a política de \
alimentação em viagens?\").\n\
- PEDIR_INFO: Mensagens vagas ou que faltam informações para identificar o tema ou contexto \
(Ex: \"Preciso de ajuda com uma política\", \"Tenho uma dúvida geral\").\n\
- ABRIR_CHAMADO: Pedidos de exceção, liberação, aprovação ou acesso especial, ou quando o \
usuário explicitamente pede para abrir um chamado (Ex: \"Quero exceção para trabalhar 5 dias \
remoto.\", \"Solicito liberação para anexos externos.\").\n\
Analise a mensagem e decida a ação mais apropriada.";

/// Classifier backed by the Gemini JSON-mode completion endpoint
pub struct GeminiClassifier {
    client: Arc<GeminiClient>,
}

impl GeminiClassifier {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Classifier for GeminiClassifier {
    async fn classify(&self, message: &str) -> Result<TriageVerdict> {
        let raw = self
            .client
            .generate_json(TRIAGE_PROMPT, message)
            .await
            .map_err(|e| DeskError::classification(message, e.to_string()))?;

        debug!(raw = %raw, "triage model output");
        parse_verdict(&raw).map_err(|reason| DeskError::classification(message, reason))
    }
}

/// Parse the model output into a verdict
///
/// JSON mode keeps the output clean most of the time, but some model
/// versions still wrap it in a markdown fence; strip that before parsing.
pub fn parse_verdict(raw: &str) -> std::result::Result<TriageVerdict, String> {
    let trimmed = strip_code_fence(raw.trim());
    serde_json::from_str(trimmed).map_err(|e| format!("malformed verdict JSON: {}", e))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip the optional language tag on the opening fence
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches(['\r', '\n'])
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}
