//! # brat-core — Parser brat standoff e Normalizador KB
//!
//! Este crate lê corpora anotados no formato standoff da ferramenta brat
//! (`<id>.txt` + `<id>.ann`/`.a1`/`.a2`) e os converte em registros no esquema
//! KB do bigbio: passagens, entidades, eventos, relações e correferências, todos
//! com IDs globalmente únicos.
//!
//! ## Arquitetura do Sistema
//!
//! O dado flui em estágios, cada um em seu módulo:
//!
//! 1.  **Entrada**: Texto do documento e arquivos de anotação.
//! 2.  **Linhas** ([`line`]): Cada linha vira uma [`Annotation`] tipada (`T`, `E`, `R`, `*`, `A`/`M`, `N`, `#`).
//! 3.  **Documento** ([`document`]): Agrupa as anotações em um [`BratParse`], aplicando a regra de continuação.
//! 4.  **Intervalos** ([`span`]): Reconstrói os fragmentos de menções descontínuas.
//! 5.  **Normalização KB** ([`kb`]): Prefixa IDs, classifica entidades e descarta referências pendentes.
//! 6.  **Validação** ([`validate`]): Round-trip de offsets, unicidade de IDs e fechamento referencial.
//! 7.  **Saída**: [`KbRecord`] + lista de [`DroppedReference`].
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use brat_core::{BratPipeline, validate_record};
//!
//! let pipeline = BratPipeline::new();
//!
//! let conversion = pipeline
//!     .convert_str(
//!         "PMID1",
//!         "BRCA1 is a gene.",
//!         "T1\tGene 0 5\tBRCA1\nR1\tRel Arg1:T1 Arg2:T9\n",
//!     )
//!     .unwrap();
//!
//! assert_eq!(conversion.record.entities[0].id, "PMID1_T1");
//! assert_eq!(conversion.dropped.len(), 1);
//! assert!(validate_record(&conversion.record).is_valid());
//! ```
//!
//! ## Módulos Principais
//!
//! - [`pipeline`]: Orquestrador com eventos observáveis.
//! - [`corpus`]: Descoberta de arquivos e conversão de diretórios em paralelo.
//! - [`diagnostics`]: Referências descartadas durante a normalização.

pub mod annotation;
pub mod corpus;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod kb;
pub mod line;
pub mod pipeline;
pub mod span;
pub mod validate;

pub use annotation::{
    Annotation, AnnotationCounts, Attribute, BratParse, Equivalence, Event, EventArgument,
    Normalization, Note, Offset, Relation, RelationArgument, TextBoundAnnotation,
};
pub use corpus::{convert_corpus, demo_documents, discover_documents, CorpusConversion, DemoDocument};
pub use diagnostics::{DropKind, DroppedReference};
pub use document::{parse_brat_file, parse_brat_str, ParseOptions};
pub use error::{BratError, Result};
pub use kb::{
    to_kb, EntityClassification, KbConversion, KbOptions, KbRecord, PassageLayout,
};
pub use pipeline::{BratPipeline, PipelineEvent};
pub use validate::{validate_record, validate_records, ValidationReport};
