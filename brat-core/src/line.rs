//! # Classificador de Linhas brat
//!
//! Recebe **uma** linha (já sem espaços nas pontas) de um arquivo `.ann`/`.a1`/`.a2`
//! e devolve a anotação tipada correspondente. A espécie é decidida pelo
//! primeiro caractere:
//!
//! - `T` → [`TextBoundAnnotation`]: `id<TAB>tipo s1 e1;s2 e2<TAB>texto`
//! - `E` → [`Event`]: `id<TAB>tipo:gatilho papel1:ref1 papel2:ref2 ...`
//! - `R` → [`Relation`]: `id<TAB>tipo papel1:ref1 papel2:ref2`
//! - `*` → [`Equivalence`]: `*<TAB>tipo id1 id2 ...`
//! - `A`/`M` → [`Attribute`]: `id<TAB>tipo ref [valor]`
//! - `N` → [`Normalization`]: `id<TAB>tipo ref recurso:cuid<TAB>texto`
//! - `#` → [`Note`], apenas com `parse_notes = true`
//!
//! Prefixos desconhecidos são ignorados (`Ok(None)`). Linhas que não seguem a
//! estrutura do seu prefixo geram [`BratError::MalformedLine`].

use crate::annotation::{
    Annotation, Attribute, Equivalence, Event, EventArgument, Normalization, Note, Offset,
    Relation, RelationArgument, TextBoundAnnotation,
};
use crate::error::{BratError, Result};
use crate::span::split_fragments;

/// Valor usado quando uma nota de anotador não tem coluna de texto.
pub const NULL_NOTE_TEXT: &str = "<BB_NULL_STR>";

/// Classifica e decompõe uma linha de anotação.
///
/// `line_no` só é usado nas mensagens de erro.
pub fn parse_line(line: &str, line_no: usize, parse_notes: bool) -> Result<Option<Annotation>> {
    let parser = LineParser { line, line_no };

    let annotation = match line.chars().next() {
        Some('T') => Annotation::TextBound(parser.text_bound()?),
        Some('E') => Annotation::Event(parser.event()?),
        Some('R') => Annotation::Relation(parser.relation()?),
        Some('*') => Annotation::Equivalence(parser.equivalence()?),
        Some('A') | Some('M') => Annotation::Attribute(parser.attribute()?),
        Some('N') => Annotation::Normalization(parser.normalization()?),
        Some('#') if parse_notes => Annotation::Note(parser.note()?),
        _ => return Ok(None),
    };

    Ok(Some(annotation))
}

struct LineParser<'a> {
    line: &'a str,
    line_no: usize,
}

impl<'a> LineParser<'a> {
    fn error(&self, reason: impl Into<String>) -> BratError {
        BratError::malformed(self.line_no, self.line, reason)
    }

    /// Colunas separadas por TAB; a terceira coluna (texto) pode conter TABs.
    fn fields(&self) -> Vec<&'a str> {
        self.line.splitn(3, '\t').collect()
    }

    fn field(&self, fields: &[&'a str], index: usize) -> Result<&'a str> {
        fields
            .get(index)
            .copied()
            .ok_or_else(|| self.error(format!("coluna {} ausente", index + 1)))
    }

    fn token(&self, tokens: &[&'a str], index: usize, what: &str) -> Result<&'a str> {
        tokens
            .get(index)
            .copied()
            .ok_or_else(|| self.error(format!("{what} ausente")))
    }

    /// Divide `papel:ref` no primeiro `:`.
    fn pair(&self, token: &'a str) -> Result<(&'a str, &'a str)> {
        token
            .split_once(':')
            .ok_or_else(|| self.error(format!("esperado 'a:b', encontrado {token:?}")))
    }

    fn text_bound(&self) -> Result<TextBoundAnnotation> {
        let fields = self.fields();
        let id = self.field(&fields, 0)?;
        let middle = self.field(&fields, 1)?;
        let raw_text = self.field(&fields, 2)?;

        let kind = middle
            .split_whitespace()
            .next()
            .ok_or_else(|| self.error("tipo ausente"))?;
        let prefix = format!("{kind} ");
        let span_str = middle.strip_prefix(prefix.as_str()).unwrap_or(middle);

        let mut offsets = Vec::new();
        for span in span_str.split(';') {
            let bounds: Vec<&str> = span.split_whitespace().collect();
            let [start, end] = bounds.as_slice() else {
                return Err(self.error(format!("intervalo inválido {span:?}")));
            };
            let start = start
                .parse::<usize>()
                .map_err(|_| self.error(format!("offset inicial inválido {start:?}")))?;
            let end = end
                .parse::<usize>()
                .map_err(|_| self.error(format!("offset final inválido {end:?}")))?;
            offsets.push(Offset::new(start, end));
        }

        let text = split_fragments(raw_text, &offsets);

        Ok(TextBoundAnnotation {
            id: id.to_string(),
            kind: kind.to_string(),
            offsets,
            text,
        })
    }

    fn event(&self) -> Result<Event> {
        let fields = self.fields();
        let id = self.field(&fields, 0)?;
        let tokens: Vec<&str> = self.field(&fields, 1)?.split_whitespace().collect();

        let (kind, trigger) = self.pair(self.token(&tokens, 0, "tipo:gatilho")?)?;

        let arguments = tokens[1..]
            .iter()
            .map(|token| {
                self.pair(token).map(|(role, ref_id)| EventArgument {
                    role: role.to_string(),
                    ref_id: ref_id.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Event {
            id: id.to_string(),
            kind: kind.to_string(),
            trigger: trigger.to_string(),
            arguments,
        })
    }

    fn relation(&self) -> Result<Relation> {
        let fields = self.fields();
        let id = self.field(&fields, 0)?;
        let tokens: Vec<&str> = self.field(&fields, 1)?.split_whitespace().collect();

        let kind = self.token(&tokens, 0, "tipo")?;
        let (head_role, head_ref) = self.pair(self.token(&tokens, 1, "argumento 1")?)?;
        let (tail_role, tail_ref) = self.pair(self.token(&tokens, 2, "argumento 2")?)?;

        Ok(Relation {
            id: id.to_string(),
            kind: kind.to_string(),
            head: RelationArgument {
                role: head_role.to_string(),
                ref_id: head_ref.to_string(),
            },
            tail: RelationArgument {
                role: tail_role.to_string(),
                ref_id: tail_ref.to_string(),
            },
        })
    }

    fn equivalence(&self) -> Result<Equivalence> {
        let fields = self.fields();
        let id = self.field(&fields, 0)?;
        let ref_ids = self
            .field(&fields, 1)?
            .split_whitespace()
            .skip(1)
            .map(str::to_string)
            .collect();

        Ok(Equivalence {
            id: id.to_string(),
            ref_ids,
        })
    }

    fn attribute(&self) -> Result<Attribute> {
        let fields = self.fields();
        let id = self.field(&fields, 0)?;
        let info: Vec<&str> = self.field(&fields, 1)?.split_whitespace().collect();

        Ok(Attribute {
            id: id.to_string(),
            kind: self.token(&info, 0, "tipo")?.to_string(),
            ref_id: self.token(&info, 1, "referência")?.to_string(),
            value: info.get(2).copied().unwrap_or_default().to_string(),
        })
    }

    fn normalization(&self) -> Result<Normalization> {
        let fields = self.fields();
        let id = self.field(&fields, 0)?;
        let info: Vec<&str> = self.field(&fields, 1)?.split_whitespace().collect();
        let text = self.field(&fields, 2)?;

        let (resource_name, cuid) = self.pair(self.token(&info, 2, "recurso:cuid")?)?;

        Ok(Normalization {
            id: id.to_string(),
            kind: self.token(&info, 0, "tipo")?.to_string(),
            ref_id: self.token(&info, 1, "referência")?.to_string(),
            resource_name: resource_name.to_string(),
            cuid: cuid.to_string(),
            text: text.to_string(),
        })
    }

    fn note(&self) -> Result<Note> {
        let fields = self.fields();
        let id = self.field(&fields, 0)?;
        let info: Vec<&str> = self.field(&fields, 1)?.split_whitespace().collect();

        Ok(Note {
            id: id.to_string(),
            kind: self.token(&info, 0, "tipo")?.to_string(),
            ref_id: self.token(&info, 1, "referência")?.to_string(),
            text: fields.get(2).copied().unwrap_or(NULL_NOTE_TEXT).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Annotation {
        parse_line(line, 1, true).unwrap().unwrap()
    }

    #[test]
    fn test_text_bound_single_range() {
        let Annotation::TextBound(t) = parse("T1\tGene 0 5\tBRCA1") else {
            panic!("esperado T");
        };
        assert_eq!(t.id, "T1");
        assert_eq!(t.kind, "Gene");
        assert_eq!(t.offsets, vec![Offset::new(0, 5)]);
        assert_eq!(t.text, vec!["BRCA1"]);
    }

    #[test]
    fn test_text_bound_discontiguous() {
        let Annotation::TextBound(t) = parse("T4\tDisease 0 6;15 19\tsevere pain") else {
            panic!("esperado T");
        };
        assert_eq!(t.offsets, vec![Offset::new(0, 6), Offset::new(15, 19)]);
        assert_eq!(t.text, vec!["severe", "pain"]);
        assert_eq!(t.text.len(), t.offsets.len());
    }

    #[test]
    fn test_out_of_range_discontiguous_offsets_do_not_panic() {
        let Annotation::TextBound(t) = parse("T1\tX 0 18446744073709551615;0 1\tab") else {
            panic!("esperado T");
        };
        assert_eq!(t.offsets[0], Offset::new(0, usize::MAX));
        assert_eq!(t.text, vec!["ab", ""]);
    }

    #[test]
    fn test_event_with_arguments() {
        let Annotation::Event(e) = parse("E1\tPhosphorylation:T2 Theme:T1 Site:T3") else {
            panic!("esperado E");
        };
        assert_eq!(e.kind, "Phosphorylation");
        assert_eq!(e.trigger, "T2");
        assert_eq!(e.arguments.len(), 2);
        assert_eq!(e.arguments[1].role, "Site");
        assert_eq!(e.arguments[1].ref_id, "T3");
    }

    #[test]
    fn test_relation_head_is_first_argument() {
        let Annotation::Relation(r) = parse("R1\tBinds Arg2:T3 Arg1:T1") else {
            panic!("esperado R");
        };
        assert_eq!(r.kind, "Binds");
        assert_eq!(r.head.role, "Arg2");
        assert_eq!(r.head.ref_id, "T3");
        assert_eq!(r.tail.ref_id, "T1");
    }

    #[test]
    fn test_equivalence_members() {
        let Annotation::Equivalence(eq) = parse("*\tEquiv T1 T4 T7") else {
            panic!("esperado *");
        };
        assert_eq!(eq.id, "*");
        assert_eq!(eq.ref_ids, vec!["T1", "T4", "T7"]);
    }

    #[test]
    fn test_attribute_value_defaults_to_empty() {
        let Annotation::Attribute(a) = parse("A1\tNegation E1") else {
            panic!("esperado A");
        };
        assert_eq!(a.ref_id, "E1");
        assert_eq!(a.value, "");

        let Annotation::Attribute(m) = parse("M2\tConfidence T1 High") else {
            panic!("esperado M");
        };
        assert_eq!(m.value, "High");
    }

    #[test]
    fn test_normalization_splits_on_first_colon() {
        let Annotation::Normalization(n) = parse("N1\tReference T1 GO:GO:0005515\tprotein binding")
        else {
            panic!("esperado N");
        };
        assert_eq!(n.resource_name, "GO");
        assert_eq!(n.cuid, "GO:0005515");
        assert_eq!(n.text, "protein binding");
    }

    #[test]
    fn test_notes_only_when_requested() {
        assert!(parse_line("#1\tAnnotatorNotes T1\tconferir", 1, false)
            .unwrap()
            .is_none());

        let Annotation::Note(note) = parse("#1\tAnnotatorNotes T1") else {
            panic!("esperado #");
        };
        assert_eq!(note.ref_id, "T1");
        assert_eq!(note.text, NULL_NOTE_TEXT);
    }

    #[test]
    fn test_unknown_prefix_is_skipped() {
        assert!(parse_line("X1\tsomething", 1, false).unwrap().is_none());
    }

    #[test]
    fn test_malformed_lines_fail_hard() {
        for line in [
            "T1\tGene 0 5",
            "T1\tGene 0 x\tBRCA1",
            "T1\tGene 0;3 5\tBRCA1",
            "E1\tBinding",
            "E1\tBinding:T1 Theme",
            "R1\tBinds Arg1:T1",
            "A1\tNegation",
            "N1\tReference T1 C0376571\tBRCA1",
        ] {
            let err = parse_line(line, 7, false).unwrap_err();
            assert!(
                matches!(err, BratError::MalformedLine { line_no: 7, .. }),
                "{line:?} -> {err}"
            );
        }
    }
}
