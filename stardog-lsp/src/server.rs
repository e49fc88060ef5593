//! Main language server implementation

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use stardog_analysis::completion::{completions, CompletionSuggestion};
use stardog_analysis::completion_data::{CompletionData, CompletionDataUpdate};
use stardog_analysis::diagnostics::collect_diagnostics;
use stardog_analysis::folding::{folding_regions, FoldKind};
use stardog_analysis::grammar::parse_document;
use stardog_analysis::hover::hover as compute_hover;
use stardog_analysis::parse_state::{ParseState, ParseStateCache, ParseStateUpdate};
use stardog_analysis::position::LineIndex;
use stardog_analysis::profile::LanguageProfile;
use tokio::sync::RwLock;
use tower_lsp::async_trait;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionOptions, CompletionParams, CompletionResponse, CompletionTextEdit,
    Diagnostic, DidChangeTextDocumentParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, FoldingRange, FoldingRangeKind, FoldingRangeParams,
    FoldingRangeProviderCapability, Hover, HoverContents, HoverParams, HoverProviderCapability,
    InitializeParams, InitializeResult, InitializedParams, MarkedString, ServerCapabilities,
    ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind, TextEdit, Url,
    WorkDoneProgressOptions,
};
use tower_lsp::{Client, ClientSocket, LspService};
use tracing::{debug, error, info};

use crate::languages::{InitializationOptions, LanguageDefinition};

/// Custom notification carrying namespaces and database bindings.
pub const DID_UPDATE_COMPLETION_DATA: &str = "$/didUpdateCompletionData";

#[async_trait]
pub trait LspClient: Send + Sync + Clone + 'static {
    async fn publish_diagnostics(&self, uri: Url, diags: Vec<Diagnostic>, version: Option<i32>);
}

#[async_trait]
impl LspClient for Client {
    async fn publish_diagnostics(&self, uri: Url, diags: Vec<Diagnostic>, version: Option<i32>) {
        self.publish_diagnostics(uri, diags, version).await;
    }
}

#[derive(Default)]
struct Documents {
    texts: HashMap<Url, Arc<String>>,
    parse_states: ParseStateCache,
}

/// Open documents and their parses under one lock, so a reader never pairs
/// new text with the parse of an older one.
#[derive(Default)]
struct DocumentStore {
    inner: RwLock<Documents>,
}

impl DocumentStore {
    /// Replace the text of `uri`; its parse is `parsed` or nothing.
    async fn update(&self, uri: Url, text: Arc<String>, parsed: Option<ParseStateUpdate>) {
        let mut documents = self.inner.write().await;
        documents.parse_states.clear(&uri);
        if let Some(update) = parsed {
            documents.parse_states.save(uri.clone(), update);
        }
        documents.texts.insert(uri, text);
    }

    async fn snapshot(&self, uri: &Url) -> Option<(Arc<String>, ParseState)> {
        let documents = self.inner.read().await;
        let text = documents.texts.get(uri)?.clone();
        Some((text, documents.parse_states.get(uri)))
    }

    /// Cache a parse of `text`. Ignored, returning false, when `uri` holds
    /// other text by now.
    async fn fill(&self, uri: &Url, text: &Arc<String>, update: ParseStateUpdate) -> bool {
        let mut documents = self.inner.write().await;
        let current = documents
            .texts
            .get(uri)
            .is_some_and(|stored| Arc::ptr_eq(stored, text));
        if current {
            documents.parse_states.save(uri.clone(), update);
        }
        current
    }

    async fn remove(&self, uri: &Url) {
        let mut documents = self.inner.write().await;
        documents.texts.remove(uri);
        documents.parse_states.clear(uri);
    }
}

/// Run `f`, turning a panic into `fallback` so one bad request cannot take
/// the connection down.
fn guarded<T>(feature: &str, fallback: T, f: impl FnOnce() -> T) -> T {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error!(feature, "handler panicked, answering with an empty result");
            fallback
        }
    }
}

pub struct StardogLanguageServer<C = Client> {
    client: C,
    definition: Arc<dyn LanguageDefinition>,
    profile: RwLock<Option<LanguageProfile>>,
    documents: DocumentStore,
    completion_data: RwLock<CompletionData>,
    shutdown_requested: Arc<AtomicBool>,
}

impl StardogLanguageServer<Client> {
    /// The tower-lsp service for `definition`, with the completion-data
    /// notification registered. `shutdown_requested` is raised when the
    /// client sends `shutdown`.
    pub fn service(
        definition: Arc<dyn LanguageDefinition>,
        shutdown_requested: Arc<AtomicBool>,
    ) -> (LspService<Self>, ClientSocket) {
        LspService::build(move |client| Self::new(client, definition, shutdown_requested))
            .custom_method(DID_UPDATE_COMPLETION_DATA, Self::did_update_completion_data)
            .finish()
    }
}

impl<C: LspClient> StardogLanguageServer<C> {
    pub fn new(
        client: C,
        definition: Arc<dyn LanguageDefinition>,
        shutdown_requested: Arc<AtomicBool>,
    ) -> Self {
        Self {
            client,
            definition,
            profile: RwLock::new(None),
            documents: DocumentStore::default(),
            completion_data: RwLock::new(CompletionData::new()),
            shutdown_requested,
        }
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    async fn profile(&self) -> LanguageProfile {
        if let Some(profile) = self.profile.read().await.as_ref() {
            return profile.clone();
        }
        self.definition.profile(&InitializationOptions::default())
    }

    async fn update_document(&self, uri: Url, text: String) {
        let text = Arc::new(text);
        let profile = self.profile().await;
        let (update, diagnostics) = parse(&profile, &text).unzip();
        self.documents.update(uri.clone(), text, update).await;
        self.client
            .publish_diagnostics(uri, diagnostics.unwrap_or_default(), None)
            .await;
    }

    /// Text of `uri` with its parse, parsing again when nothing is cached.
    /// The state stays empty when the grammar keeps failing.
    async fn parsed(&self, uri: &Url) -> Option<(Arc<String>, ParseState)> {
        let (text, state) = self.documents.snapshot(uri).await?;
        if !state.is_empty() {
            return Some((text, state));
        }
        let profile = self.profile().await;
        let Some((update, _)) = parse(&profile, &text) else {
            return Some((text, state));
        };
        let state = ParseState {
            cst: update.cst.clone(),
            tokens: update.tokens.clone(),
        };
        self.documents.fill(uri, &text, update).await;
        Some((text, state))
    }

    /// Handler for [`DID_UPDATE_COMPLETION_DATA`].
    pub async fn did_update_completion_data(&self, update: CompletionDataUpdate) {
        debug!(
            namespaces = update.namespaces.is_some() || update.namespace_map.is_some(),
            relationships = update.relationship_bindings.is_some(),
            types = update.type_bindings.is_some(),
            "completion data update"
        );
        self.completion_data.write().await.apply(update);
    }
}

/// Parse `text` and collect its diagnostics; `None` when the grammar panicked.
fn parse(profile: &LanguageProfile, text: &str) -> Option<(ParseStateUpdate, Vec<Diagnostic>)> {
    guarded("parse", None, || {
        let output = parse_document(profile.grammar.as_ref(), text);
        let diagnostics = collect_diagnostics(text, &output, &profile.diagnostics);
        debug!(
            tokens = output.tokens.len(),
            diagnostics = diagnostics.len(),
            "parsed document"
        );
        Some((ParseStateUpdate::full(output.cst, output.tokens), diagnostics))
    })
}

fn to_completion_item(index: &LineIndex<'_>, suggestion: CompletionSuggestion) -> CompletionItem {
    CompletionItem {
        label: suggestion.label,
        kind: Some(suggestion.kind),
        detail: suggestion.detail,
        sort_text: suggestion.sort_text,
        filter_text: suggestion.filter_text,
        text_edit: Some(CompletionTextEdit::Edit(TextEdit {
            range: index.range(suggestion.replace.start, suggestion.replace.end),
            new_text: suggestion.new_text,
        })),
        ..CompletionItem::default()
    }
}

fn to_folding_range(start_line: u32, end_line: u32, kind: FoldKind) -> FoldingRange {
    FoldingRange {
        start_line,
        start_character: None,
        end_line,
        end_character: None,
        kind: Some(match kind {
            FoldKind::Prefix => FoldingRangeKind::Imports,
            FoldKind::Indentation => FoldingRangeKind::Region,
        }),
        collapsed_text: None,
    }
}

fn empty_hover() -> Hover {
    Hover {
        contents: HoverContents::Array(Vec::new()),
        range: None,
    }
}

#[async_trait]
impl<C: LspClient> tower_lsp::LanguageServer for StardogLanguageServer<C> {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let options = InitializationOptions::from_value(params.initialization_options);
        let profile = self.definition.profile(&options);
        info!(
            language = %profile.language_id,
            grammar = options.grammar().unwrap_or("default"),
            "initializing"
        );

        let capabilities = ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
            completion_provider: Some(CompletionOptions {
                trigger_characters: Some(profile.completion.trigger_characters.clone()),
                work_done_progress_options: WorkDoneProgressOptions::default(),
                ..CompletionOptions::default()
            }),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
            ..ServerCapabilities::default()
        };

        *self.profile.write().await = Some(profile);

        Ok(InitializeResult {
            capabilities,
            server_info: Some(ServerInfo {
                name: self.definition.server_name().to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("client initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        info!("shutdown requested");
        self.shutdown_requested.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let item = params.text_document;
        self.update_document(item.uri, item.text).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // full sync: the last change holds the whole text
        if let Some(change) = params.content_changes.into_iter().last() {
            self.update_document(params.text_document.uri, change.text)
                .await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.remove(&params.text_document.uri).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let position = params.text_document_position;
        let uri = position.text_document.uri;
        let Some((text, state)) = self.parsed(&uri).await else {
            return Ok(None);
        };
        let Some(tokens) = state.tokens else {
            return Ok(None);
        };
        let profile = self.profile().await;
        let data = self.completion_data.read().await;

        let items = guarded("completion", Vec::new(), || {
            let index = LineIndex::new(&text);
            let offset = index.position_to_offset(position.position);
            completions(&profile, &text, &tokens, offset, &data)
                .into_iter()
                .map(|suggestion| to_completion_item(&index, suggestion))
                .collect()
        });
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position = params.text_document_position_params;
        let uri = position.text_document.uri;
        let Some((text, state)) = self.parsed(&uri).await else {
            return Ok(None);
        };
        let Some(cst) = state.cst else {
            return Ok(Some(empty_hover()));
        };

        let hover = guarded("hover", empty_hover(), || {
            let index = LineIndex::new(&text);
            let offset = index.position_to_offset(position.position);
            match compute_hover(&cst, offset) {
                Some(result) => Hover {
                    contents: HoverContents::Scalar(MarkedString::String(format!(
                        "```\n{}\n```",
                        result.rule
                    ))),
                    range: Some(index.range(result.start, result.end)),
                },
                None => empty_hover(),
            }
        });
        Ok(Some(hover))
    }

    async fn folding_range(&self, params: FoldingRangeParams) -> Result<Option<Vec<FoldingRange>>> {
        let Some((text, _)) = self.documents.snapshot(&params.text_document.uri).await else {
            return Ok(None);
        };
        let profile = self.profile().await;
        let ranges = guarded("folding", Vec::new(), || {
            folding_regions(&text, &profile.prefix_keywords)
                .into_iter()
                .map(|region| to_folding_range(region.start_line, region.end_line, region.kind))
                .collect()
        });
        Ok(Some(ranges))
    }
}
