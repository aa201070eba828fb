//! Servidor web Axum com WebSocket para conversão brat → KB em tempo real

mod config;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use brat_core::{
    demo_documents, validate_record, validate_records, BratError, BratPipeline, DroppedReference,
    KbOptions, KbRecord, ParseOptions, PipelineEvent, ValidationReport,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

/// Estado compartilhado da aplicação
struct AppState {
    pipeline: BratPipeline,
}

impl AppState {
    /// Pipeline com as opções do pedido, ou as do servidor quando ausentes.
    fn pipeline_for(&self, parse: Option<ParseOptions>, kb: Option<KbOptions>) -> BratPipeline {
        BratPipeline::with_options(
            parse.unwrap_or_else(|| self.pipeline.parse.clone()),
            kb.unwrap_or_else(|| self.pipeline.kb.clone()),
        )
    }
}

/// Documento brat em memória, usado por `/convert` e pelo WebSocket.
#[derive(Deserialize)]
struct ConvertRequest {
    document_id: String,
    text: String,
    #[serde(default)]
    annotations: String,
    #[serde(default)]
    parse: Option<ParseOptions>,
    #[serde(default)]
    kb: Option<KbOptions>,
}

#[derive(Serialize)]
struct ConvertResponse {
    record: KbRecord,
    dropped: Vec<DroppedReference>,
    validation: ValidationReport,
    processing_ms: u64,
}

#[derive(Deserialize)]
struct ValidateRequest {
    records: Vec<KbRecord>,
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(err) = run().await {
        error!(error = %err, "servidor encerrado");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "causa");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = ServerConfig::from_env()?;
    let state = Arc::new(AppState {
        pipeline: BratPipeline::new(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/convert", post(convert_handler))
        .route("/validate", post(validate_handler))
        .route("/demo-documents", get(demo_documents_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("🚀 Servidor brat → KB iniciado em http://{}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// Linha malformada, gatilho ausente ou opções inválidas → 422; demais → 500.
fn brat_error_response(err: BratError) -> Response {
    let status = match err {
        BratError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    error_response(status, err.to_string())
}

/// Retorna a página principal HTML
async fn index_handler() -> impl IntoResponse {
    Html(include_str!("templates/index.html"))
}

/// Conversão via HTTP POST (sem streaming)
async fn convert_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConvertRequest>,
) -> Response {
    if req.document_id.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "document_id vazio");
    }

    let start = std::time::Instant::now();
    let pipeline = state.pipeline_for(req.parse, req.kb);
    if let Err(err) = pipeline.parse.validate() {
        return brat_error_response(err);
    }

    match pipeline.convert_str(req.document_id.trim(), &req.text, &req.annotations) {
        Ok(conversion) => {
            let validation = validate_record(&conversion.record);
            Json(ConvertResponse {
                record: conversion.record,
                dropped: conversion.dropped,
                validation,
                processing_ms: start.elapsed().as_millis() as u64,
            })
            .into_response()
        }
        Err(err) => {
            warn!(document_id = %req.document_id, error = %err, "conversão falhou");
            brat_error_response(err)
        }
    }
}

/// Valida um split inteiro de registros KB
async fn validate_handler(Json(req): Json<ValidateRequest>) -> impl IntoResponse {
    Json(validate_records(&req.records))
}

/// Retorna documentos de demonstração
async fn demo_documents_handler() -> impl IntoResponse {
    Json(demo_documents())
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Lógica do WebSocket: recebe um documento, executa o pipeline e envia os eventos
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                let req = match serde_json::from_str::<ConvertRequest>(&text) {
                    Ok(req) => req,
                    Err(err) => {
                        let event = PipelineEvent::Error {
                            message: format!("pedido inválido: {err}"),
                        };
                        if send_event(&mut socket, &event).await.is_err() {
                            return;
                        }
                        continue;
                    }
                };

                info!(
                    "Convertendo via WebSocket [{}]: {} chars, {} bytes de anotação",
                    req.document_id,
                    req.text.chars().count(),
                    req.annotations.len()
                );

                let pipeline = state.pipeline_for(req.parse, req.kb);
                let events = stream_events(move |tx| {
                    pipeline.convert_streaming(&req.document_id, &req.text, &req.annotations, tx);
                })
                .await;

                for event in &events {
                    if send_event(&mut socket, event).await.is_err() {
                        return; // cliente desconectou
                    }
                    // Pequena pausa para animação visual (passo a passo)
                    tokio::time::sleep(tokio::time::Duration::from_millis(35)).await;
                }
            }
            Message::Close(_) => {
                info!("WebSocket desconectado");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}

/// Executa um pipeline síncrono em thread separada e coleta seus eventos.
///
/// Se a thread entrar em pânico, os eventos já enviados são mantidos e um
/// `Error` final é acrescentado.
async fn stream_events<F>(job: F) -> Vec<PipelineEvent>
where
    F: FnOnce(std::sync::mpsc::Sender<PipelineEvent>) + Send + 'static,
{
    let (tx_std, rx_std) = std::sync::mpsc::channel::<PipelineEvent>();
    let joined = tokio::task::spawn_blocking(move || job(tx_std)).await;

    // Coleta todos os eventos numa Vec (rx_std não é Send)
    let mut events: Vec<PipelineEvent> = rx_std.try_iter().collect();
    if let Err(err) = joined {
        error!(error = %err, "pipeline interrompido");
        events.push(PipelineEvent::Error {
            message: format!("pipeline interrompido: {err}"),
        });
    }
    events
}

async fn send_event(socket: &mut WebSocket, event: &PipelineEvent) -> Result<()> {
    let json = serde_json::to_string(event)?;
    socket.send(Message::Text(json)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stream_events_collects_pipeline_events() {
        let pipeline = BratPipeline::new();
        let events = stream_events(move |tx| {
            pipeline.convert_streaming("doc", "BRCA1", "T1\tGene 0 5\tBRCA1\n", tx);
        })
        .await;
        assert!(matches!(events.last(), Some(PipelineEvent::Done { .. })));
    }

    #[tokio::test]
    async fn test_stream_events_reports_panic_as_error() {
        let events = stream_events(|tx| {
            let _ = tx.send(PipelineEvent::Error {
                message: "primeiro".to_string(),
            });
            panic!("falha no pipeline");
        })
        .await;
        assert_eq!(events.len(), 2);
        assert!(
            matches!(&events[1], PipelineEvent::Error { message } if message.contains("interrompido"))
        );
    }
}
