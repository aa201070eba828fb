//! Converte um diretório brat em registros KB, um JSON por linha na saída padrão.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use brat_core::{
    validate_records, BratPipeline, EntityClassification, KbOptions, ParseOptions, PassageLayout,
};
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "brat-convert",
    version,
    about = "Converte um corpus brat standoff em registros KB (JSON Lines)"
)]
struct Cli {
    /// Diretório com pares `<id>.txt` + anotações
    dir: PathBuf,

    /// Sufixos dos arquivos de anotação (repetível)
    #[arg(long = "suffix", default_values_t = [".a1".to_string(), ".a2".to_string(), ".ann".to_string()])]
    suffixes: Vec<String>,

    /// Lê também notas de anotador (`#`)
    #[arg(long, default_value_t = false)]
    notes: bool,

    /// Tipos tratados como entidade; sem isso, usa a heurística de gatilhos
    #[arg(long = "entity-type")]
    entity_types: Vec<String>,

    #[arg(long, value_enum, default_value_t = Layout::Single)]
    layout: Layout,

    /// Valida o split e falha se houver erros
    #[arg(long, default_value_t = false)]
    validate: bool,

    /// Emite o relatório de referências descartadas como JSON no stderr
    #[arg(long, default_value_t = false)]
    report_drops: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Single,
    TitleAbstract,
}

impl From<Layout> for PassageLayout {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::Single => PassageLayout::Single,
            Layout::TitleAbstract => PassageLayout::TitleAbstract,
        }
    }
}

impl Cli {
    fn pipeline(&self) -> BratPipeline {
        let classification = if self.entity_types.is_empty() {
            EntityClassification::TriggerReference
        } else {
            EntityClassification::allowlist(self.entity_types.iter().cloned())
        };
        BratPipeline::with_options(
            ParseOptions {
                annotation_suffixes: self.suffixes.clone(),
                parse_notes: self.notes,
            },
            KbOptions {
                classification,
                passage_layout: self.layout.into(),
            },
        )
    }
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "conversão falhou");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "causa");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let pipeline = cli.pipeline();

    let conversion = pipeline
        .convert_dir(&cli.dir)
        .with_context(|| format!("falha ao converter {}", cli.dir.display()))?;

    if cli.validate {
        let report = validate_records(&conversion.records);
        for warning in &report.warnings {
            warn!("{warning}");
        }
        report.into_result().context("split inválido")?;
        info!(records = conversion.records.len(), "split válido");
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for record in &conversion.records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    if cli.report_drops {
        let json = serde_json::to_string_pretty(&conversion.dropped)?;
        eprintln!("{json}");
    }

    if conversion.records.is_empty() {
        bail!("nenhum documento .txt em {}", cli.dir.display());
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
