//! # Normalização para o Esquema KB (`bigbio_kb`)
//!
//! Converte um [`BratParse`] (IDs locais, seis coleções) no registro KB
//! compartilhado: passagens, entidades, eventos, relações e correferências,
//! todos com IDs **globais**.
//!
//! ## Regras
//! 1. **Prefixo de ID**: todo ID local vira `{document_id}_{id_local}`, garantindo
//!    unicidade quando registros de vários documentos são reunidos num dataset.
//! 2. **Passagem**: por padrão o texto inteiro vira uma passagem `"abstract"`.
//! 3. **Entidade vs. gatilho**: controlado por [`EntityClassification`].
//! 4. **Normalização**: registros `N` viram `normalized: [{db_name, db_id}]`.
//! 5. **Descartes**: relações, clusters de correferência e argumentos de evento que
//!    apontam para algo que não existe (ou que não é entidade) são removidos e
//!    reportados em [`KbConversion::dropped`]. Nunca é erro.
//!
//! A conversão é determinística, sem I/O e sem estado entre documentos.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::annotation::{BratParse, Offset, TextBoundAnnotation};
use crate::diagnostics::{count_by_kind, DropKind, DroppedReference};
use crate::error::{BratError, Result};

// ===== REGISTRO KB =====

/// Registro final de um documento no esquema KB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbRecord {
    pub id: String,
    pub document_id: String,
    pub passages: Vec<Passage>,
    pub entities: Vec<KbEntity>,
    pub events: Vec<KbEvent>,
    pub relations: Vec<KbRelation>,
    pub coreferences: Vec<KbCoreference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Vec<String>,
    pub offsets: Vec<Offset>,
}

/// Vínculo com uma base de conhecimento externa (ex: `UMLS` / `C0376571`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbNormalization {
    pub db_name: String,
    pub db_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbEntity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Vec<String>,
    pub offsets: Vec<Offset>,
    pub normalized: Vec<KbNormalization>,
}

/// Gatilho de evento resolvido em linha (texto + offsets).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbTrigger {
    pub text: Vec<String>,
    pub offsets: Vec<Offset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbArgument {
    pub role: String,
    pub ref_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub trigger: KbTrigger,
    pub arguments: Vec<KbArgument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbRelation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub arg1_id: String,
    pub arg2_id: String,
    pub normalized: Vec<KbNormalization>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbCoreference {
    pub id: String,
    pub entity_ids: Vec<String>,
}

// ===== CONFIGURAÇÃO =====

/// Estratégia para decidir quais anotações `T` viram entidades.
///
/// As duas estratégias podem discordar quando um tipo não aparece nem como
/// gatilho nem na lista explícita; a escolha é configuração do dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "types", rename_all = "snake_case")]
pub enum EntityClassification {
    /// **Heurística**: toda anotação `T` que não é gatilho de nenhum evento é entidade.
    #[default]
    TriggerReference,
    /// **Lista explícita** (`ENTITY_TYPES`): só tipos listados viram entidades.
    TypeAllowlist(BTreeSet<String>),
}

impl EntityClassification {
    pub fn allowlist<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EntityClassification::TypeAllowlist(types.into_iter().map(Into::into).collect())
    }

    fn is_entity(&self, annotation: &TextBoundAnnotation, trigger_ids: &HashSet<&str>) -> bool {
        match self {
            EntityClassification::TriggerReference => !trigger_ids.contains(annotation.id.as_str()),
            EntityClassification::TypeAllowlist(types) => types.contains(&annotation.kind),
        }
    }
}

/// Como o texto do documento é dividido em passagens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassageLayout {
    /// Uma única passagem `"abstract"` com o texto inteiro.
    #[default]
    Single,
    /// Primeira linha como `"title"`, o restante como `"abstract"` (layout PubMed).
    TitleAbstract,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KbOptions {
    pub classification: EntityClassification,
    pub passage_layout: PassageLayout,
}

/// Registro KB mais os diagnósticos de tudo que foi descartado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbConversion {
    pub record: KbRecord,
    pub dropped: Vec<DroppedReference>,
}

// ===== CONVERSÃO =====

/// Converte um documento brat no registro KB.
///
/// Falha apenas quando um evento aponta para um gatilho inexistente
/// (corrupção estrutural); referências pendentes viram diagnósticos.
pub fn to_kb(parse: &BratParse, options: &KbOptions) -> Result<KbConversion> {
    let doc = parse.document_id.as_str();
    let global = |local: &str| format!("{doc}_{local}");
    let mut dropped = Vec::new();

    let passages = build_passages(doc, &parse.text, options.passage_layout);

    let mut normalizations: HashMap<&str, Vec<KbNormalization>> = HashMap::new();
    for n in &parse.normalizations {
        normalizations
            .entry(n.ref_id.as_str())
            .or_default()
            .push(KbNormalization {
                db_name: n.resource_name.clone(),
                db_id: n.cuid.clone(),
            });
    }

    let trigger_ids: HashSet<&str> = parse.events.iter().map(|e| e.trigger.as_str()).collect();

    let entity_annotations: Vec<&TextBoundAnnotation> = parse
        .text_bound_annotations
        .iter()
        .filter(|t| options.classification.is_entity(t, &trigger_ids))
        .collect();
    let entity_ids: HashSet<&str> = entity_annotations.iter().map(|t| t.id.as_str()).collect();
    let event_ids: HashSet<&str> = parse.events.iter().map(|e| e.id.as_str()).collect();

    let entities = entity_annotations
        .iter()
        .map(|t| KbEntity {
            id: global(&t.id),
            kind: t.kind.clone(),
            text: t.text.clone(),
            offsets: t.offsets.clone(),
            normalized: normalizations.get(t.id.as_str()).cloned().unwrap_or_default(),
        })
        .collect();

    // Eventos: gatilho resolvido em linha, argumentos restritos a entidades/eventos.
    let mut events = Vec::with_capacity(parse.events.len());
    for event in &parse.events {
        let trigger = parse
            .text_bound(&event.trigger)
            .ok_or_else(|| BratError::MissingTrigger {
                document_id: doc.to_string(),
                event_id: event.id.clone(),
                trigger: event.trigger.clone(),
            })?;

        let (kept, missing): (Vec<_>, Vec<_>) = event.arguments.iter().partition(|arg| {
            entity_ids.contains(arg.ref_id.as_str()) || event_ids.contains(arg.ref_id.as_str())
        });

        let event_id = global(&event.id);
        if !missing.is_empty() {
            record_drop(
                &mut dropped,
                doc,
                DropKind::EventArgument,
                event_id.clone(),
                missing.iter().map(|a| a.ref_id.clone()).collect(),
            );
        }

        events.push(KbEvent {
            id: event_id,
            kind: event.kind.clone(),
            trigger: KbTrigger {
                text: trigger.text.clone(),
                offsets: trigger.offsets.clone(),
            },
            arguments: kept
                .into_iter()
                .map(|arg| KbArgument {
                    role: arg.role.clone(),
                    ref_id: global(&arg.ref_id),
                })
                .collect(),
        });
    }

    // Relações: só entre entidades.
    let mut relations = Vec::new();
    for relation in &parse.relations {
        let missing: Vec<String> = [&relation.head.ref_id, &relation.tail.ref_id]
            .into_iter()
            .filter(|r| !entity_ids.contains(r.as_str()))
            .cloned()
            .collect();

        if !missing.is_empty() {
            record_drop(&mut dropped, doc, DropKind::Relation, global(&relation.id), missing);
            continue;
        }

        relations.push(KbRelation {
            id: global(&relation.id),
            kind: relation.kind.clone(),
            arg1_id: global(&relation.head.ref_id),
            arg2_id: global(&relation.tail.ref_id),
            normalized: vec![],
        });
    }

    // Correferências: o cluster sobrevive só se todos os membros forem entidades.
    // O ID usa a posição (1-based) porque as linhas `*` não têm ID próprio.
    let mut coreferences = Vec::new();
    for (index, equivalence) in parse.equivalences.iter().enumerate() {
        let cluster_id = global(&(index + 1).to_string());
        let missing: Vec<String> = equivalence
            .ref_ids
            .iter()
            .filter(|r| !entity_ids.contains(r.as_str()))
            .cloned()
            .collect();

        if !missing.is_empty() {
            record_drop(&mut dropped, doc, DropKind::Coreference, cluster_id, missing);
            continue;
        }

        coreferences.push(KbCoreference {
            id: cluster_id,
            entity_ids: equivalence.ref_ids.iter().map(|r| global(r)).collect(),
        });
    }

    let skipped_relations = count_by_kind(&dropped, DropKind::Relation);
    if skipped_relations > 0 {
        info!(
            document_id = doc,
            "o esquema KB só permite relações entre entidades; descartadas {} de {}",
            skipped_relations,
            parse.relations.len()
        );
    }

    Ok(KbConversion {
        record: KbRecord {
            id: doc.to_string(),
            document_id: doc.to_string(),
            passages,
            entities,
            events,
            relations,
            coreferences,
        },
        dropped,
    })
}

fn record_drop(
    dropped: &mut Vec<DroppedReference>,
    document_id: &str,
    kind: DropKind,
    annotation_id: String,
    missing_refs: Vec<String>,
) {
    let drop = DroppedReference {
        document_id: document_id.to_string(),
        kind,
        annotation_id,
        missing_refs,
    };
    warn!(
        document_id,
        kind = drop.kind.name(),
        annotation_id = %drop.annotation_id,
        missing = ?drop.missing_refs,
        "referência descartada"
    );
    dropped.push(drop);
}

fn build_passages(document_id: &str, text: &str, layout: PassageLayout) -> Vec<Passage> {
    let single = || {
        vec![Passage {
            id: format!("{document_id}__text"),
            kind: "abstract".to_string(),
            text: vec![text.to_string()],
            offsets: vec![Offset::new(0, text.chars().count())],
        }]
    };

    match layout {
        PassageLayout::Single => single(),
        PassageLayout::TitleAbstract => {
            let Some((title, body)) = text.split_once('\n') else {
                return single();
            };
            let title_len = title.chars().count();
            let body_start = title_len + 1;

            let mut passages = vec![Passage {
                id: format!("{document_id}__title"),
                kind: "title".to_string(),
                text: vec![title.to_string()],
                offsets: vec![Offset::new(0, title_len)],
            }];
            if !body.is_empty() {
                passages.push(Passage {
                    id: format!("{document_id}__abstract"),
                    kind: "abstract".to_string(),
                    text: vec![body.to_string()],
                    offsets: vec![Offset::new(body_start, body_start + body.chars().count())],
                });
            }
            passages
        }
    }
}
