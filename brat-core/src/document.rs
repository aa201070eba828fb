//! # Parser de Documentos brat
//!
//! Junta o `.txt` de um documento com todos os seus arquivos de anotação
//! (`.a1`, `.a2`, `.ann`, ...) e produz um [`BratParse`] com as seis coleções
//! tipadas. Sufixos ausentes no disco são ignorados em silêncio: alguns corpora
//! separam entidades (`.a1`) de eventos/relações (`.a2`), outros usam um único `.ann`.
//!
//! ## Regra de Continuação
//! Uma linha **sem TAB** logo depois de uma linha `T` é a continuação do texto
//! daquela entidade (menção que atravessa uma quebra de parágrafo). Ela é
//! anexada ao texto bruto da linha `T` com um `\n` literal, e só então os
//! fragmentos de menções descontínuas são reconstruídos.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::annotation::BratParse;
use crate::error::{BratError, Result};
use crate::line::parse_line;

/// Sufixos procurados por padrão, na ordem em que são concatenados.
pub const DEFAULT_ANNOTATION_SUFFIXES: [&str; 3] = [".a1", ".a2", ".ann"];

/// Opções de parsing de um documento.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Sufixos dos arquivos de anotação irmãos do `.txt`.
    pub annotation_suffixes: Vec<String>,
    /// Lê também as notas de anotador (`#`).
    pub parse_notes: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            annotation_suffixes: DEFAULT_ANNOTATION_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            parse_notes: false,
        }
    }
}

impl ParseOptions {
    pub fn validate(&self) -> Result<()> {
        if self.annotation_suffixes.is_empty() {
            return Err(BratError::Config(
                "annotation_suffixes precisa ter ao menos um sufixo".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lê `<id>.txt` e os arquivos de anotação irmãos.
///
/// O `document_id` é o nome do arquivo sem a extensão.
pub fn parse_brat_file(txt_path: &Path, options: &ParseOptions) -> Result<BratParse> {
    options.validate()?;

    let document_id = txt_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let text = fs::read_to_string(txt_path).map_err(|e| BratError::io(txt_path, e))?;

    let mut annotation_content = String::new();
    for suffix in &options.annotation_suffixes {
        let ann_path = txt_path.with_extension(suffix.trim_start_matches('.'));
        if !ann_path.is_file() {
            continue;
        }
        let content = fs::read_to_string(&ann_path).map_err(|e| BratError::io(&ann_path, e))?;
        annotation_content.push_str(&content);
        if !content.ends_with('\n') {
            annotation_content.push('\n');
        }
    }

    parse_lines(document_id, text, annotation_content.lines(), options)
}

/// Mesmo parser, sobre conteúdo já em memória (usado pela API web).
pub fn parse_brat_str(
    document_id: &str,
    text: &str,
    annotations: &str,
    options: &ParseOptions,
) -> Result<BratParse> {
    options.validate()?;
    parse_lines(document_id.to_string(), text.to_string(), annotations.lines(), options)
}

fn parse_lines<'l>(
    document_id: String,
    text: String,
    lines: impl IntoIterator<Item = &'l str>,
    options: &ParseOptions,
) -> Result<BratParse> {
    let mut parse = BratParse::new(document_id, text);
    // Linha `T` ainda aberta a continuações: (número da linha, conteúdo acumulado).
    let mut open_text_bound: Option<(usize, String)> = None;

    for (index, raw) in lines.into_iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if !line.contains('\t') {
            if let Some((_, pending)) = open_text_bound.as_mut() {
                pending.push('\n');
                pending.push_str(line);
                continue;
            }
        }

        if let Some((line_no, pending)) = open_text_bound.take() {
            push_line(&mut parse, &pending, line_no, options)?;
        }

        if line.starts_with('T') {
            open_text_bound = Some((index + 1, line.to_string()));
        } else {
            push_line(&mut parse, line, index + 1, options)?;
        }
    }

    if let Some((line_no, pending)) = open_text_bound {
        push_line(&mut parse, &pending, line_no, options)?;
    }

    debug!(
        document_id = %parse.document_id,
        counts = ?parse.counts(),
        "documento brat lido"
    );

    Ok(parse)
}

fn push_line(parse: &mut BratParse, line: &str, line_no: usize, options: &ParseOptions) -> Result<()> {
    if let Some(annotation) = parse_line(line, line_no, options.parse_notes)? {
        parse.push(annotation);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Offset;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_parse_file_with_ann() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "PMID1.txt", "BRCA1 is a gene.\n");
        write(dir.path(), "PMID1.ann", "T1\tGene 0 5\tBRCA1\nT2\tType 9 13\tgene\n");

        let parse = parse_brat_file(&dir.path().join("PMID1.txt"), &ParseOptions::default()).unwrap();
        assert_eq!(parse.document_id, "PMID1");
        assert_eq!(parse.text, "BRCA1 is a gene.\n");
        assert_eq!(parse.text_bound_annotations.len(), 2);
        assert_eq!(parse.text_bound_annotations[1].offsets, vec![Offset::new(9, 13)]);
        assert!(parse.events.is_empty());
        assert!(parse.notes.is_empty());
    }

    #[test]
    fn test_a1_a2_are_concatenated_and_missing_suffix_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "doc.txt", "IL-2 binds IL-2R.");
        write(dir.path(), "doc.a1", "T1\tProtein 0 4\tIL-2\nT2\tProtein 11 16\tIL-2R\n");
        write(dir.path(), "doc.a2", "T3\tBinding 5 10\tbinds\nE1\tBinding:T3 Theme:T1 Theme2:T2\n");

        let parse = parse_brat_file(&dir.path().join("doc.txt"), &ParseOptions::default()).unwrap();
        assert_eq!(parse.text_bound_annotations.len(), 3);
        assert_eq!(parse.events.len(), 1);
        assert_eq!(parse.events[0].trigger, "T3");
    }

    #[test]
    fn test_only_requested_suffixes_are_read() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "doc.txt", "IL-2");
        write(dir.path(), "doc.a1", "T1\tProtein 0 4\tIL-2\n");
        write(dir.path(), "doc.ann", "T9\tProtein 0 4\tIL-2\n");

        let options = ParseOptions {
            annotation_suffixes: vec![".ann".to_string()],
            parse_notes: false,
        };
        let parse = parse_brat_file(&dir.path().join("doc.txt"), &options).unwrap();
        assert_eq!(parse.text_bound_annotations.len(), 1);
        assert_eq!(parse.text_bound_annotations[0].id, "T9");
    }

    #[test]
    fn test_continuation_line_joins_with_newline() {
        let annotations = "T1\tTitle 0 12\tFirst part\nsecond\nT2\tGene 13 17\tTP53\n";
        let parse = parse_brat_str("doc", "", annotations, &ParseOptions::default()).unwrap();
        assert_eq!(parse.text_bound_annotations.len(), 2);
        assert_eq!(parse.text_bound_annotations[0].text, vec!["First part\nsecond"]);
    }

    #[test]
    fn test_continuation_is_split_with_discontiguous_fragments() {
        let annotations = "T1\tX 0 7;8 11\tabc\ndef xyz\nT2\tY 8 11\txyz\n";
        let parse = parse_brat_str("doc", "abc\ndef xyz", annotations, &ParseOptions::default()).unwrap();
        let t1 = &parse.text_bound_annotations[0];
        assert_eq!(t1.text, vec!["abc\ndef", "xyz"]);
        let total: usize = t1.offsets.iter().map(Offset::len).sum();
        assert_eq!(total, t1.text.iter().map(|f| f.chars().count()).sum::<usize>());
        assert_eq!(parse.text_bound_annotations[1].text, vec!["xyz"]);
    }

    #[test]
    fn test_continuation_at_end_of_input() {
        let annotations = "T1\tX 0 7;8 11\tabc\ndef xyz";
        let parse = parse_brat_str("doc", "abc\ndef xyz", annotations, &ParseOptions::default()).unwrap();
        assert_eq!(parse.text_bound_annotations[0].text, vec!["abc\ndef", "xyz"]);
    }

    #[test]
    fn test_tabless_line_after_non_text_bound_is_ignored() {
        let annotations = "T1\tGene 0 4\tTP53\nA1\tNegation T1\nstray\n";
        let parse = parse_brat_str("doc", "", annotations, &ParseOptions::default()).unwrap();
        assert_eq!(parse.text_bound_annotations[0].text, vec!["TP53"]);
        assert_eq!(parse.attributes.len(), 1);
    }

    #[test]
    fn test_notes_are_opt_in() {
        let annotations = "T1\tGene 0 4\tTP53\n#1\tAnnotatorNotes T1\tchecar\n";
        let without = parse_brat_str("doc", "", annotations, &ParseOptions::default()).unwrap();
        assert!(without.notes.is_empty());

        let options = ParseOptions {
            parse_notes: true,
            ..Default::default()
        };
        let with = parse_brat_str("doc", "", annotations, &options).unwrap();
        assert_eq!(with.notes.len(), 1);
        assert_eq!(with.notes[0].text, "checar");
    }

    #[test]
    fn test_malformed_line_aborts_document() {
        let annotations = "T1\tGene 0 4\tTP53\n\nR1\tBinds Arg1:T1\n";
        let err = parse_brat_str("doc", "", annotations, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, BratError::MalformedLine { line_no: 3, .. }));
    }

    #[test]
    fn test_empty_suffix_list_is_rejected() {
        let options = ParseOptions {
            annotation_suffixes: vec![],
            parse_notes: false,
        };
        let err = parse_brat_str("doc", "", "", &options).unwrap_err();
        assert!(matches!(err, BratError::Config(_)));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: ParseOptions = serde_json::from_str(r#"{"parse_notes": true}"#).unwrap();
        assert!(options.parse_notes);
        assert_eq!(options.annotation_suffixes, vec![".a1", ".a2", ".ann"]);
    }
}
