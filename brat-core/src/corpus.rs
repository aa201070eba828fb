//! # Corpus brat: Descoberta de Arquivos e Conversão em Lote
//!
//! Um corpus brat é um diretório com pares `<id>.txt` + `<id>.ann`
//! (ou `<id>.a1`/`<id>.a2`). Cada documento é independente dos demais, então a
//! conversão roda em paralelo com `rayon`, preservando a ordem dos arquivos.
//!
//! Também expõe documentos de demonstração para a interface web.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::diagnostics::DroppedReference;
use crate::document::{parse_brat_file, ParseOptions};
use crate::error::{BratError, Result};
use crate::kb::{to_kb, KbOptions, KbRecord};

/// Resultado da conversão de um diretório inteiro (um split do dataset).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConversion {
    pub records: Vec<KbRecord>,
    pub dropped: Vec<DroppedReference>,
}

/// Lista os `.txt` de um diretório (não recursivo), ordenados pelo nome.
pub fn discover_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| BratError::io(dir, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| BratError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Converte todos os documentos de um diretório em registros KB.
///
/// Para no primeiro documento estruturalmente inválido.
pub fn convert_corpus(
    dir: &Path,
    parse_options: &ParseOptions,
    kb_options: &KbOptions,
) -> Result<CorpusConversion> {
    parse_options.validate()?;
    let paths = discover_documents(dir)?;

    let conversions = paths
        .par_iter()
        .map(|path| {
            let parse = parse_brat_file(path, parse_options)?;
            to_kb(&parse, kb_options)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut records = Vec::with_capacity(conversions.len());
    let mut dropped = Vec::new();
    for conversion in conversions {
        records.push(conversion.record);
        dropped.extend(conversion.dropped);
    }

    info!(
        dir = %dir.display(),
        documents = records.len(),
        dropped = dropped.len(),
        "corpus convertido"
    );

    Ok(CorpusConversion { records, dropped })
}

/// Documento brat embutido, para demonstração.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DemoDocument {
    pub name: &'static str,
    pub document_id: &'static str,
    pub text: &'static str,
    pub annotations: &'static str,
}

/// Documentos de demonstração para a interface web
pub fn demo_documents() -> Vec<DemoDocument> {
    vec![
        DemoDocument {
            name: "Entidades simples",
            document_id: "demo_gene",
            text: "BRCA1 is a gene.\n",
            annotations: "T1\tGene 0 5\tBRCA1\nT2\tType 11 15\tgene\n",
        },
        DemoDocument {
            name: "Eventos aninhados",
            document_id: "demo_events",
            text: "IL-2 gene expression requires NF-kappa B activation in T cells.",
            annotations: "T1\tProtein 0 4\tIL-2\n\
                          T2\tGene_expression 10 20\texpression\n\
                          T3\tProtein 30 40\tNF-kappa B\n\
                          T4\tPositive_regulation 41 51\tactivation\n\
                          T5\tCell 55 62\tT cells\n\
                          E1\tGene_expression:T2 Theme:T1\n\
                          E2\tPositive_regulation:T4 Theme:E1 Cause:T3\n\
                          A1\tSpeculation E2\n",
        },
        DemoDocument {
            name: "Relações, correferência e normalização",
            document_id: "demo_chem",
            text: "Aspirin inhibits COX-1.\nAspirin reduces the risk of myocardial infarction.",
            annotations: "T1\tChemical 0 7\tAspirin\n\
                          T2\tGene 17 22\tCOX-1\n\
                          T3\tChemical 24 31\tAspirin\n\
                          T4\tDisease 52 73\tmyocardial infarction\n\
                          R1\tInhibits Arg1:T1 Arg2:T2\n\
                          R2\tTreats Arg1:T3 Arg2:T9\n\
                          *\tEquiv T1 T3\n\
                          N1\tReference T4 MESH:D009203\tMyocardial Infarction\n\
                          N2\tReference T1 MESH:D001241\tAspirin\n",
        },
        DemoDocument {
            name: "Menção descontínua",
            document_id: "demo_discontinuous",
            text: "breast and ovarian cancer",
            annotations: "T1\tDisease 0 6;19 25\tbreast cancer\n\
                          T2\tDisease 11 25\tovarian cancer\n",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DropKind;
    use crate::document::parse_brat_str;
    use crate::validate::validate_records;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_discover_documents_sorted_txt_only() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.txt", "");
        write(dir.path(), "a.txt", "");
        write(dir.path(), "a.ann", "");
        fs::create_dir(dir.path().join("sub.txt")).unwrap();

        let paths = discover_documents(dir.path()).unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_convert_corpus_pools_unique_ids() {
        let dir = tempfile::tempdir().unwrap();
        for id in ["PMID2", "PMID1", "PMID3"] {
            write(dir.path(), &format!("{id}.txt"), "BRCA1 is a gene.");
            write(
                dir.path(),
                &format!("{id}.ann"),
                "T1\tGene 0 5\tBRCA1\nT2\tType 11 15\tgene\nR1\tRel Arg1:T1 Arg2:T7\n",
            );
        }

        let conversion =
            convert_corpus(dir.path(), &ParseOptions::default(), &KbOptions::default()).unwrap();
        let ids: Vec<&str> = conversion.records.iter().map(|r| r.document_id.as_str()).collect();
        assert_eq!(ids, vec!["PMID1", "PMID2", "PMID3"]);
        assert_eq!(conversion.dropped.len(), 3);
        assert!(conversion.dropped.iter().all(|d| d.kind == DropKind::Relation));

        let report = validate_records(&conversion.records);
        assert!(report.is_valid(), "{:?}", report.errors);
    }

    #[test]
    fn test_convert_corpus_fails_on_malformed_document() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "ok.txt", "BRCA1");
        write(dir.path(), "ok.ann", "T1\tGene 0 5\tBRCA1\n");
        write(dir.path(), "bad.txt", "BRCA1");
        write(dir.path(), "bad.ann", "T1\tGene zero 5\tBRCA1\n");

        let err = convert_corpus(dir.path(), &ParseOptions::default(), &KbOptions::default())
            .unwrap_err();
        assert!(matches!(err, BratError::MalformedLine { .. }));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_documents(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, BratError::Io { .. }));
    }

    #[test]
    fn test_demo_documents_are_valid() {
        let mut records = Vec::new();
        for demo in demo_documents() {
            let parse = parse_brat_str(demo.document_id, demo.text, demo.annotations, &ParseOptions::default())
                .unwrap();
            records.push(to_kb(&parse, &KbOptions::default()).unwrap().record);
        }
        let report = validate_records(&records);
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }
}
