//! Diagnósticos de referências descartadas durante a normalização KB.

use std::fmt;

use serde::{Deserialize, Serialize};

/// O que foi descartado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropKind {
    /// Relação com cabeça ou cauda que não é entidade.
    Relation,
    /// Cluster de correferência com algum membro que não é entidade.
    Coreference,
    /// Argumento de evento que não aponta para entidade nem evento.
    EventArgument,
}

impl DropKind {
    pub fn name(&self) -> &'static str {
        match self {
            DropKind::Relation => "relation",
            DropKind::Coreference => "coreference",
            DropKind::EventArgument => "event_argument",
        }
    }
}

/// Uma referência pendente removida do registro KB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedReference {
    pub document_id: String,
    pub kind: DropKind,
    /// ID global da relação/correferência descartada, ou do evento cujo argumento caiu.
    pub annotation_id: String,
    /// IDs locais que não puderam ser resolvidos.
    pub missing_refs: Vec<String>,
}

impl fmt::Display for DroppedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {} descartado (referências sem entidade: {})",
            self.document_id,
            self.kind.name(),
            self.annotation_id,
            self.missing_refs.join(", ")
        )
    }
}

/// Conta descartes por espécie.
pub fn count_by_kind(dropped: &[DroppedReference], kind: DropKind) -> usize {
    dropped.iter().filter(|d| d.kind == kind).count()
}
