//! # Erros do Parser brat
//!
//! O formato brat é tratado como confiável: uma linha estruturalmente inválida
//! interrompe o processamento do documento inteiro (não há recuperação parcial).
//! Referências pendentes (relações/correferências que apontam para IDs
//! inexistentes) **não** são erros: viram [`crate::diagnostics::DroppedReference`].

use std::path::PathBuf;

use thiserror::Error;

/// Resultado padrão das operações do crate.
pub type Result<T> = std::result::Result<T, BratError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BratError {
    /// Linha de anotação que não segue a estrutura esperada para o seu prefixo.
    #[error("linha {line_no} malformada ({reason}): {line:?}")]
    MalformedLine {
        /// Número da linha (1-based) dentro das anotações concatenadas do documento.
        line_no: usize,
        line: String,
        reason: String,
    },

    /// Evento cujo gatilho não corresponde a nenhuma anotação `T`.
    #[error("documento {document_id}: evento {event_id} referencia gatilho inexistente {trigger}")]
    MissingTrigger {
        document_id: String,
        event_id: String,
        trigger: String,
    },

    /// Falha de leitura de arquivo (.txt, .ann, .a1, .a2).
    #[error("falha ao ler {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Opções inválidas (ex: lista de sufixos vazia).
    #[error("configuração inválida: {0}")]
    Config(String),

    /// Falha de validação do esquema KB.
    #[error("validação falhou: {0}")]
    Validation(String),
}

impl BratError {
    pub fn malformed(line_no: usize, line: &str, reason: impl Into<String>) -> Self {
        BratError::MalformedLine {
            line_no,
            line: line.to_string(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BratError::Io {
            path: path.into(),
            source,
        }
    }
}
