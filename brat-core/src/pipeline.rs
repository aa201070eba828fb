//! # Pipeline brat → KB — Orquestrador com Eventos Observáveis
//!
//! O pipeline coordena parser de documento, normalização KB e validação, e
//! emite eventos em cada passo via um canal Rust (`mpsc`). O canal é o coletor
//! de diagnósticos injetado: testes e o servidor WebSocket observam cada
//! anotação lida e cada referência descartada, sem depender de logs globais.

use std::path::Path;
use std::sync::mpsc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::annotation::{Annotation, AnnotationCounts, BratParse};
use crate::corpus::{convert_corpus, CorpusConversion};
use crate::diagnostics::DroppedReference;
use crate::document::{parse_brat_file, parse_brat_str, ParseOptions};
use crate::error::Result;
use crate::kb::{to_kb, KbConversion, KbOptions, KbRecord};
use crate::validate::validate_record;

/// Eventos emitidos pelo pipeline durante a conversão de um documento.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// **Passo 1**: Uma anotação foi lida e classificada.
    AnnotationParsed { annotation: Annotation },
    /// **Passo 1 concluído**: Documento inteiro lido.
    Parsed {
        document_id: String,
        counts: AnnotationCounts,
    },
    /// **Passo 2**: Uma referência pendente foi removida na normalização KB.
    ReferenceDropped { dropped: DroppedReference },
    /// **Passo 3**: Registro validado contra o esquema KB.
    Validated {
        errors: Vec<String>,
        warnings: Vec<String>,
    },
    /// **Conclusão**: Registro KB final.
    Done {
        record: KbRecord,
        dropped: Vec<DroppedReference>,
        processing_ms: u64,
    },
    /// **Falha**: Linha malformada ou gatilho inexistente; o documento foi abortado.
    Error { message: String },
}

/// O pipeline de conversão.
///
/// # Modos de Uso
/// - **Sync**: `convert_file` / `convert_str` para scripts e lotes.
/// - **Streaming**: `convert_streaming` para UIs reativas (via WebSocket).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BratPipeline {
    pub parse: ParseOptions,
    pub kb: KbOptions,
}

impl BratPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(parse: ParseOptions, kb: KbOptions) -> Self {
        Self { parse, kb }
    }

    /// Converte `<id>.txt` e suas anotações irmãs.
    pub fn convert_file(&self, txt_path: &Path) -> Result<KbConversion> {
        let parse = parse_brat_file(txt_path, &self.parse)?;
        to_kb(&parse, &self.kb)
    }

    /// Converte conteúdo em memória.
    pub fn convert_str(&self, document_id: &str, text: &str, annotations: &str) -> Result<KbConversion> {
        let parse = parse_brat_str(document_id, text, annotations, &self.parse)?;
        to_kb(&parse, &self.kb)
    }

    /// Converte todos os documentos de um diretório (em paralelo).
    pub fn convert_dir(&self, dir: &Path) -> Result<CorpusConversion> {
        convert_corpus(dir, &self.parse, &self.kb)
    }

    /// Executa o pipeline enviando eventos de progresso pelo canal `tx`.
    ///
    /// # Fluxo de Eventos
    /// 1. `AnnotationParsed` (loop) e `Parsed`.
    /// 2. `ReferenceDropped` (loop), se houver descartes.
    /// 3. `Validated`.
    /// 4. `Done`, ou `Error` se o documento for abortado.
    pub fn convert_streaming(
        &self,
        document_id: &str,
        text: &str,
        annotations: &str,
        tx: mpsc::Sender<PipelineEvent>,
    ) {
        let start = Instant::now();

        let parse = match parse_brat_str(document_id, text, annotations, &self.parse) {
            Ok(parse) => parse,
            Err(err) => {
                let _ = tx.send(PipelineEvent::Error {
                    message: err.to_string(),
                });
                return;
            }
        };

        // === Passo 1: Anotações lidas ===
        for annotation in annotations_of(&parse) {
            let _ = tx.send(PipelineEvent::AnnotationParsed { annotation });
        }
        let _ = tx.send(PipelineEvent::Parsed {
            document_id: parse.document_id.clone(),
            counts: parse.counts(),
        });

        // === Passo 2: Normalização KB ===
        let conversion = match to_kb(&parse, &self.kb) {
            Ok(conversion) => conversion,
            Err(err) => {
                let _ = tx.send(PipelineEvent::Error {
                    message: err.to_string(),
                });
                return;
            }
        };
        for dropped in &conversion.dropped {
            let _ = tx.send(PipelineEvent::ReferenceDropped {
                dropped: dropped.clone(),
            });
        }

        // === Passo 3: Validação ===
        let report = validate_record(&conversion.record);
        let _ = tx.send(PipelineEvent::Validated {
            errors: report.errors,
            warnings: report.warnings,
        });

        let _ = tx.send(PipelineEvent::Done {
            record: conversion.record,
            dropped: conversion.dropped,
            processing_ms: start.elapsed().as_millis() as u64,
        });
    }
}

/// Todas as anotações do documento, na ordem das coleções.
fn annotations_of(parse: &BratParse) -> Vec<Annotation> {
    let mut all = Vec::new();
    all.extend(parse.text_bound_annotations.iter().cloned().map(Annotation::TextBound));
    all.extend(parse.events.iter().cloned().map(Annotation::Event));
    all.extend(parse.relations.iter().cloned().map(Annotation::Relation));
    all.extend(parse.equivalences.iter().cloned().map(Annotation::Equivalence));
    all.extend(parse.attributes.iter().cloned().map(Annotation::Attribute));
    all.extend(parse.normalizations.iter().cloned().map(Annotation::Normalization));
    all.extend(parse.notes.iter().cloned().map(Annotation::Note));
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DropKind;

    const TEXT: &str = "BRCA1 is a gene.\n";
    const ANN: &str = "T1\tGene 0 5\tBRCA1\nT2\tType 11 15\tgene\nR1\tRelatesTo Arg1:T1 Arg2:T9\n";

    #[test]
    fn test_convert_str() {
        let pipeline = BratPipeline::new();
        let conversion = pipeline.convert_str("doc", TEXT, ANN).unwrap();
        assert_eq!(conversion.record.entities.len(), 2);
        assert!(conversion.record.relations.is_empty());
        assert_eq!(conversion.dropped.len(), 1);
    }

    #[test]
    fn test_convert_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.txt"), TEXT).unwrap();
        std::fs::write(dir.path().join("doc.ann"), ANN).unwrap();

        let conversion = BratPipeline::new()
            .convert_file(&dir.path().join("doc.txt"))
            .unwrap();
        assert_eq!(conversion.record.document_id, "doc");
    }

    #[test]
    fn test_pipeline_events_streaming() {
        let pipeline = BratPipeline::new();
        let (tx, rx) = mpsc::channel();
        pipeline.convert_streaming("doc", TEXT, ANN, tx);

        let events: Vec<PipelineEvent> = rx.try_iter().collect();
        let parsed = events
            .iter()
            .filter(|e| matches!(e, PipelineEvent::AnnotationParsed { .. }))
            .count();
        assert_eq!(parsed, 3);

        let drops: Vec<&DroppedReference> = events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::ReferenceDropped { dropped } => Some(dropped),
                _ => None,
            })
            .collect();
        assert_eq!(drops.len(), 1);
        assert_eq!(drops[0].kind, DropKind::Relation);

        assert!(events
            .iter()
            .any(|e| matches!(e, PipelineEvent::Validated { errors, .. } if errors.is_empty())));

        let last = events.last().unwrap();
        assert!(
            matches!(last, PipelineEvent::Done { record, .. } if record.entities.len() == 2),
            "Último evento deve ser Done"
        );
    }

    #[test]
    fn test_pipeline_malformed_emits_error() {
        let pipeline = BratPipeline::new();
        let (tx, rx) = mpsc::channel();
        pipeline.convert_streaming("doc", TEXT, "T1\tGene 0\tBRCA1\n", tx);

        let events: Vec<PipelineEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], PipelineEvent::Error { .. }));
    }

    #[test]
    fn test_pipeline_deserializes_from_partial_json() {
        let pipeline: BratPipeline =
            serde_json::from_str(r#"{"parse": {"parse_notes": true}}"#).unwrap();
        assert!(pipeline.parse.parse_notes);
        assert_eq!(pipeline.kb, KbOptions::default());
    }
}
