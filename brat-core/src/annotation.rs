//! # Modelo de Dados das Anotações brat
//!
//! Tipos fortemente tipados para as seis espécies de anotação standoff do brat,
//! mais as notas de anotador (`#`). Todos os IDs aqui são **locais** ao documento
//! (ex: `T3`, `E1`); a reescrita para IDs globais acontece em [`crate::kb`].
//!
//! ## Espécies de Anotação
//!
//! | Prefixo | Tipo                     | Exemplo                                   |
//! |---------|--------------------------|-------------------------------------------|
//! | T       | Texto delimitado (span)  | `T1	Gene 0 5	BRCA1`                      |
//! | E       | Evento                   | `E1	Phosphorylation:T2 Theme:T1`          |
//! | R       | Relação binária          | `R1	Binds Arg1:T1 Arg2:T3`                |
//! | *       | Equivalência (coref)     | `*	Equiv T1 T4`                            |
//! | A / M   | Atributo / modificador   | `A1	Negation E1`                          |
//! | N       | Normalização (KB)        | `N1	Reference T1 UMLS:C0376571	BRCA1`     |
//! | #       | Nota do anotador         | `#1	AnnotatorNotes T1	verificar`         |

use serde::{Deserialize, Serialize};

/// Intervalo `[start, end)` em **caracteres** (escalares Unicode) do texto do documento.
///
/// Serializado como um array de dois inteiros (`[0, 5]`), o formato do esquema KB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Offset {
    pub start: usize,
    pub end: usize,
}

impl Offset {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Número de caracteres cobertos (0 se o intervalo estiver invertido).
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<(usize, usize)> for Offset {
    fn from((start, end): (usize, usize)) -> Self {
        Self { start, end }
    }
}

impl From<Offset> for (usize, usize) {
    fn from(offset: Offset) -> Self {
        (offset.start, offset.end)
    }
}

/// Um trecho anotado do texto (linha `T`).
///
/// Mais de um intervalo em `offsets` indica uma menção **descontínua**.
/// Invariante: `text.len() == offsets.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBoundAnnotation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub offsets: Vec<Offset>,
    /// Um fragmento de texto por intervalo.
    pub text: Vec<String>,
}

/// Argumento de evento: papel + referência a qualquer anotação (inclusive outro evento).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventArgument {
    pub role: String,
    pub ref_id: String,
}

/// Evento tipado com um gatilho (`T`) e argumentos rotulados (linha `E`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// ID local da anotação `T` que serve de gatilho.
    pub trigger: String,
    pub arguments: Vec<EventArgument>,
}

/// Uma das pontas de uma relação.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationArgument {
    pub role: String,
    pub ref_id: String,
}

/// Relação binária dirigida (linha `R`).
///
/// `head` é sempre o primeiro par `papel:ref` da linha e `tail` o segundo:
/// convenção posicional, não semântica.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub head: RelationArgument,
    pub tail: RelationArgument,
}

/// Cluster de correferência não-ordenado (linha `*`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equivalence {
    pub id: String,
    pub ref_ids: Vec<String>,
}

/// Atributo ou modificador (linhas `A` / `M`). `value` é vazio para flags binárias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub ref_id: String,
    pub value: String,
}

/// Vínculo de uma anotação com uma base externa (linha `N`), ex: `UMLS:C0376571`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalization {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub ref_id: String,
    pub resource_name: String,
    pub cuid: String,
    /// Texto legível que acompanha a normalização.
    pub text: String,
}

/// Nota livre do anotador (linha `#`), só lida quando pedida explicitamente.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub ref_id: String,
    pub text: String,
}

/// Uma linha de anotação já classificada.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "annotation", content = "data", rename_all = "snake_case")]
pub enum Annotation {
    TextBound(TextBoundAnnotation),
    Event(Event),
    Relation(Relation),
    Equivalence(Equivalence),
    Attribute(Attribute),
    Normalization(Normalization),
    Note(Note),
}

/// Resultado intermediário do parsing de um documento (visão "source").
///
/// As coleções estão sempre presentes, mesmo vazias, para dar um formato
/// uniforme aos consumidores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BratParse {
    pub document_id: String,
    pub text: String,
    pub text_bound_annotations: Vec<TextBoundAnnotation>,
    pub events: Vec<Event>,
    pub relations: Vec<Relation>,
    pub equivalences: Vec<Equivalence>,
    pub attributes: Vec<Attribute>,
    pub normalizations: Vec<Normalization>,
    pub notes: Vec<Note>,
}

/// Contagem de anotações por espécie (para logs e eventos do pipeline).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationCounts {
    pub text_bound: usize,
    pub events: usize,
    pub relations: usize,
    pub equivalences: usize,
    pub attributes: usize,
    pub normalizations: usize,
    pub notes: usize,
}

impl BratParse {
    pub fn new(document_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    /// Adiciona uma anotação à coleção correspondente.
    pub fn push(&mut self, annotation: Annotation) {
        match annotation {
            Annotation::TextBound(a) => self.text_bound_annotations.push(a),
            Annotation::Event(a) => self.events.push(a),
            Annotation::Relation(a) => self.relations.push(a),
            Annotation::Equivalence(a) => self.equivalences.push(a),
            Annotation::Attribute(a) => self.attributes.push(a),
            Annotation::Normalization(a) => self.normalizations.push(a),
            Annotation::Note(a) => self.notes.push(a),
        }
    }

    pub fn text_bound(&self, id: &str) -> Option<&TextBoundAnnotation> {
        self.text_bound_annotations.iter().find(|t| t.id == id)
    }

    pub fn counts(&self) -> AnnotationCounts {
        AnnotationCounts {
            text_bound: self.text_bound_annotations.len(),
            events: self.events.len(),
            relations: self.relations.len(),
            equivalences: self.equivalences.len(),
            attributes: self.attributes.len(),
            normalizations: self.normalizations.len(),
            notes: self.notes.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_serializes_as_pair() {
        let json = serde_json::to_string(&Offset::new(9, 13)).unwrap();
        assert_eq!(json, "[9,13]");
        let back: Offset = serde_json::from_str("[0,5]").unwrap();
        assert_eq!(back, Offset::new(0, 5));
        assert_eq!(back.len(), 5);
    }

    #[test]
    fn test_push_routes_by_kind() {
        let mut parse = BratParse::new("doc", "BRCA1");
        parse.push(Annotation::TextBound(TextBoundAnnotation {
            id: "T1".into(),
            kind: "Gene".into(),
            offsets: vec![Offset::new(0, 5)],
            text: vec!["BRCA1".into()],
        }));
        parse.push(Annotation::Attribute(Attribute {
            id: "A1".into(),
            kind: "Negation".into(),
            ref_id: "T1".into(),
            value: String::new(),
        }));

        let counts = parse.counts();
        assert_eq!(counts.text_bound, 1);
        assert_eq!(counts.attributes, 1);
        assert_eq!(counts.events, 0);
        assert!(parse.text_bound("T1").is_some());
        assert!(parse.text_bound("T2").is_none());
    }

    #[test]
    fn test_source_view_field_names() {
        let parse = BratParse::new("doc", "");
        let value = serde_json::to_value(&parse).unwrap();
        for key in [
            "text_bound_annotations",
            "events",
            "relations",
            "equivalences",
            "attributes",
            "normalizations",
            "notes",
        ] {
            assert!(value[key].as_array().unwrap().is_empty(), "{key}");
        }
    }
}
