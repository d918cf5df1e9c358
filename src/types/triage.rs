//! Triage verdict types
//!
//! The classification model is instructed to answer with the Portuguese
//! wire labels the production prompt uses (`AUTO_RESOLVER`, `PEDIR_INFO`,
//! `ABRIR_CHAMADO` / `BAIXA`, `MEDIA`, `ALTA`); the enums here map those
//! onto a closed set so every branch is handled exhaustively.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Action category produced by triage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriageDecision {
    /// Clear policy question - answer automatically from the corpus
    #[serde(rename = "AUTO_RESOLVER")]
    AutoResolve,

    /// Vague message - ask the user for the missing details
    #[serde(rename = "PEDIR_INFO")]
    RequestInfo,

    /// Exception / approval / access request - route to a human ticket
    #[serde(rename = "ABRIR_CHAMADO")]
    OpenTicket,
}

impl fmt::Display for TriageDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TriageDecision::AutoResolve => "AUTO_RESOLVER",
            TriageDecision::RequestInfo => "PEDIR_INFO",
            TriageDecision::OpenTicket => "ABRIR_CHAMADO",
        };
        write!(f, "{}", label)
    }
}

/// Urgency assigned by triage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Urgency {
    #[serde(rename = "BAIXA")]
    Low,
    #[serde(rename = "MEDIA")]
    Medium,
    #[serde(rename = "ALTA")]
    High,
}

impl Urgency {
    /// Deterministic ticket-priority label for this urgency
    pub fn ticket_action(&self) -> &'static str {
        match self {
            Urgency::High => "Open urgent ticket",
            Urgency::Medium => "Open normal ticket",
            Urgency::Low => "Open low-priority ticket",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        };
        write!(f, "{}", label)
    }
}

/// Immutable result of classifying one message
///
/// Decision and urgency are plain fields, never options: a verdict is
/// either fully populated or it does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageVerdict {
    /// Triage decision
    #[serde(alias = "decisão")]
    pub decisao: TriageDecision,

    /// Urgency level
    pub urgencia: Urgency,

    /// Fields the user still has to supply (may be empty)
    #[serde(default)]
    pub campos_faltantes: Vec<String>,
}

impl TriageVerdict {
    pub fn decision(&self) -> TriageDecision {
        self.decisao
    }

    pub fn urgency(&self) -> Urgency {
        self.urgencia
    }

    pub fn missing_fields(&self) -> &[String] {
        &self.campos_faltantes
    }
}
