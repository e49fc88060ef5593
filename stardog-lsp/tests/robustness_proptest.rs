use proptest::prelude::*;
use stardog_lsp::languages::{
    GraphQlLanguage, LanguageDefinition, ShaclLanguage, SparqlLanguage, TrigLanguage,
    TurtleLanguage,
};
use stardog_lsp::server::LspClient;
use stardog_lsp::StardogLanguageServer;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tower_lsp::async_trait;
use tower_lsp::lsp_types::{
    CompletionParams, Diagnostic, DidChangeTextDocumentParams, DidOpenTextDocumentParams,
    FoldingRangeParams, HoverParams, InitializeParams, Position, TextDocumentContentChangeEvent,
    TextDocumentIdentifier, TextDocumentItem, TextDocumentPositionParams, Url,
    VersionedTextDocumentIdentifier,
};
use tower_lsp::LanguageServer;

// Mock client for testing
#[derive(Clone)]
struct MockClient;

#[async_trait]
impl LspClient for MockClient {
    async fn publish_diagnostics(&self, _: Url, _: Vec<Diagnostic>, _: Option<i32>) {}
}

fn definitions() -> Vec<Arc<dyn LanguageDefinition>> {
    vec![
        Arc::new(SparqlLanguage),
        Arc::new(GraphQlLanguage),
        Arc::new(TurtleLanguage),
        Arc::new(TrigLanguage),
        Arc::new(ShaclLanguage),
    ]
}

/// Source-like noise: fragments of every language plus arbitrary text.
fn document() -> impl Strategy<Value = String> {
    let fragment = prop_oneof![
        Just("select".to_string()),
        Just("prefix ex: <http://example.com/>".to_string()),
        Just("@prefix".to_string()),
        Just("{".to_string()),
        Just("}".to_string()),
        Just("?x".to_string()),
        Just("ex:a".to_string()),
        Just("\"lit\\u00e9\"".to_string()),
        Just("@optional".to_string()),
        Just("paths shortest".to_string()),
        Just("sh:".to_string()),
        Just(" ".to_string()),
        Just("\n".to_string()),
        "\\PC{0,6}",
    ];
    prop::collection::vec(fragment, 0..24).prop_map(|parts| parts.concat())
}

async fn exercise(
    definition: Arc<dyn LanguageDefinition>,
    text: String,
    edit: String,
    line: u32,
    character: u32,
) {
    let server = StardogLanguageServer::new(MockClient, definition, Arc::new(AtomicBool::new(false)));
    server.initialize(InitializeParams::default()).await.unwrap();
    let uri = Url::parse("file:///fuzz").unwrap();

    server
        .did_open(DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri.clone(),
                language_id: "fuzz".to_string(),
                version: 1,
                text,
            },
        })
        .await;

    let position = TextDocumentPositionParams {
        text_document: TextDocumentIdentifier { uri: uri.clone() },
        position: Position::new(line, character),
    };
    let _ = server
        .completion(CompletionParams {
            text_document_position: position.clone(),
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
            context: None,
        })
        .await
        .unwrap();
    let _ = server
        .hover(HoverParams {
            text_document_position_params: position.clone(),
            work_done_progress_params: Default::default(),
        })
        .await
        .unwrap();

    server
        .did_change(DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier {
                uri: uri.clone(),
                version: 2,
            },
            content_changes: vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: edit,
            }],
        })
        .await;

    let _ = server
        .folding_range(FoldingRangeParams {
            text_document: TextDocumentIdentifier { uri },
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        })
        .await
        .unwrap();
    let _ = server
        .completion(CompletionParams {
            text_document_position: position,
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
            context: None,
        })
        .await
        .unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Every handler answers on arbitrary documents and cursor positions
    #[test]
    fn handlers_survive_arbitrary_documents(
        text in document(),
        edit in document(),
        line in 0u32..6,
        character in 0u32..48,
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            for definition in definitions() {
                exercise(definition, text.clone(), edit.clone(), line, character).await;
            }
        });
    }
}
