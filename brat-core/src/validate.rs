//! # Validação do Esquema KB
//!
//! Verifica as propriedades que todo registro KB produzido deve satisfazer:
//! - Cada anotação tem um fragmento de texto por intervalo.
//! - Offsets dentro dos limites de alguma passagem.
//! - **Round-trip de offsets**: fatiar a passagem em `[start, end)` reproduz o texto
//!   (obrigatório para intervalos únicos; para menções descontínuas só gera aviso,
//!   porque a reconstrução dos fragmentos é heurística).
//! - **Unicidade global** de IDs dentro de um split.
//! - **Fechamento referencial** de relações, argumentos de evento e correferências.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::annotation::Offset;
use crate::error::{BratError, Result};
use crate::kb::KbRecord;
use crate::span::CharIndex;

/// Erros invalidam o registro; avisos apenas informam.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn into_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(BratError::Validation(self.errors.join("; ")))
        }
    }
}

/// Valida um único registro.
pub fn validate_record(record: &KbRecord) -> ValidationReport {
    validate_records(std::slice::from_ref(record))
}

/// Valida todos os registros de um split, incluindo unicidade de IDs entre documentos.
pub fn validate_records(records: &[KbRecord]) -> ValidationReport {
    let mut report = ValidationReport::new();
    for record in records {
        check_spans(record, &mut report);
        check_references(record, &mut report);
    }
    check_unique_ids(records, &mut report);
    report
}

/// Fragmentos de passagem indexados por caractere.
struct PassageText<'a> {
    offset: Offset,
    index: CharIndex<'a>,
}

impl PassageText<'_> {
    fn slice(&self, offset: Offset) -> Option<&str> {
        if offset.start < self.offset.start || offset.end > self.offset.end {
            return None;
        }
        self.index.slice(Offset::new(
            offset.start - self.offset.start,
            offset.end - self.offset.start,
        ))
    }
}

fn check_spans(record: &KbRecord, report: &mut ValidationReport) {
    let doc = &record.document_id;
    let mut passage_texts = Vec::new();

    for passage in &record.passages {
        if passage.text.len() != passage.offsets.len() {
            report.add_error(format!(
                "{doc}: passagem {} tem {} textos para {} offsets",
                passage.id,
                passage.text.len(),
                passage.offsets.len()
            ));
            continue;
        }
        for (text, offset) in passage.text.iter().zip(&passage.offsets) {
            let index = CharIndex::new(text);
            if index.char_len() != offset.len() {
                report.add_error(format!(
                    "{doc}: passagem {} com offsets {:?} mas {} caracteres",
                    passage.id,
                    (offset.start, offset.end),
                    index.char_len()
                ));
                continue;
            }
            passage_texts.push(PassageText {
                offset: *offset,
                index,
            });
        }
    }

    let mentions = record
        .entities
        .iter()
        .map(|e| (e.id.as_str(), &e.text, &e.offsets))
        .chain(
            record
                .events
                .iter()
                .map(|e| (e.id.as_str(), &e.trigger.text, &e.trigger.offsets)),
        );

    for (id, texts, offsets) in mentions {
        if texts.len() != offsets.len() {
            report.add_error(format!(
                "{doc}: {id} tem {} fragmentos para {} offsets",
                texts.len(),
                offsets.len()
            ));
            continue;
        }

        let discontiguous = offsets.len() > 1;
        for (expected, offset) in texts.iter().zip(offsets) {
            if offset.start > offset.end {
                report.add_error(format!(
                    "{doc}: {id} tem intervalo invertido {:?}",
                    (offset.start, offset.end)
                ));
                continue;
            }

            let actual = passage_texts.iter().find_map(|p| p.slice(*offset));
            match actual {
                None => report.add_error(format!(
                    "{doc}: {id} com offsets {:?} fora de qualquer passagem",
                    (offset.start, offset.end)
                )),
                Some(actual) if actual != expected => {
                    let message = format!(
                        "{doc}: {id} em {:?} contém {actual:?}, esperado {expected:?}",
                        (offset.start, offset.end)
                    );
                    if discontiguous {
                        report.add_warning(message);
                    } else {
                        report.add_error(message);
                    }
                }
                Some(_) => {}
            }
        }
    }
}

fn check_references(record: &KbRecord, report: &mut ValidationReport) {
    let doc = &record.document_id;
    let entity_ids: HashSet<&str> = record.entities.iter().map(|e| e.id.as_str()).collect();
    let event_ids: HashSet<&str> = record.events.iter().map(|e| e.id.as_str()).collect();
    let resolves = |id: &str| entity_ids.contains(id) || event_ids.contains(id);

    for relation in &record.relations {
        for arg in [&relation.arg1_id, &relation.arg2_id] {
            if !resolves(arg) {
                report.add_error(format!(
                    "{doc}: relação {} aponta para {arg} inexistente",
                    relation.id
                ));
            }
        }
    }

    for event in &record.events {
        for arg in &event.arguments {
            if !resolves(&arg.ref_id) {
                report.add_error(format!(
                    "{doc}: evento {} tem argumento {} inexistente",
                    event.id, arg.ref_id
                ));
            }
        }
    }

    for coref in &record.coreferences {
        for member in &coref.entity_ids {
            if !entity_ids.contains(member.as_str()) {
                report.add_error(format!(
                    "{doc}: correferência {} contém {member}, que não é entidade",
                    coref.id
                ));
            }
        }
    }
}

fn check_unique_ids(records: &[KbRecord], report: &mut ValidationReport) {
    let mut seen: HashSet<&str> = HashSet::new();

    for record in records {
        let ids = record
            .passages
            .iter()
            .map(|p| p.id.as_str())
            .chain(record.entities.iter().map(|e| e.id.as_str()))
            .chain(record.events.iter().map(|e| e.id.as_str()))
            .chain(record.relations.iter().map(|r| r.id.as_str()))
            .chain(record.coreferences.iter().map(|c| c.id.as_str()));

        for id in ids {
            if !seen.insert(id) {
                report.add_error(format!("{}: ID duplicado {id}", record.document_id));
            }
        }
    }
}
