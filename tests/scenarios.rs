//! End-to-end resolution scenarios against the builtin intent table.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use intent_core::{
    AnalysisError, IntentCategory, IntentRegistry, LexiconAnalyzer, LinguisticAnalyzer,
    Outcome, PosTag, RegistryBuilder, RejectReason, ResolveError, Resolver, ResolverConfig,
    SlotValue, Token,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn resolver() -> Resolver<LexiconAnalyzer> {
    init_tracing();
    let registry = Arc::new(IntentRegistry::builtin().unwrap());
    Resolver::with_defaults(registry, LexiconAnalyzer::new())
}

fn rejection(result: Result<Outcome, ResolveError>) -> (Option<String>, RejectReason) {
    match result {
        Err(ResolveError::UnrecognizedCommand {
            near_miss, reason, ..
        }) => (near_miss, reason),
        other => panic!("Expected rejection, got {:?}", other),
    }
}

/// Tagger stand-in that counts calls and can be switched off
struct FlakyAnalyzer {
    calls: AtomicUsize,
    online: bool,
}

impl LinguisticAnalyzer for FlakyAnalyzer {
    fn analyze(&self, text: &str) -> Result<Vec<Token>, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.online {
            return Err(AnalysisError::Unavailable("tagger offline".to_string()));
        }
        LexiconAnalyzer::new().analyze(text)
    }
}

/// Tagger stand-in that labels numbers as named entities
struct QuantityTagger;

impl LinguisticAnalyzer for QuantityTagger {
    fn analyze(&self, text: &str) -> Result<Vec<Token>, AnalysisError> {
        let tokens = LexiconAnalyzer::new().analyze(text)?;
        Ok(tokens
            .into_iter()
            .map(|t| match t.pos {
                PosTag::Num => t.with_ner("QUANTITY"),
                _ => t,
            })
            .collect())
    }
}

/// Tagger stand-in that returns tokens in reverse order
struct ReversingTagger;

impl LinguisticAnalyzer for ReversingTagger {
    fn analyze(&self, text: &str) -> Result<Vec<Token>, AnalysisError> {
        let mut tokens = LexiconAnalyzer::new().analyze(text)?;
        tokens.reverse();
        Ok(tokens)
    }
}

#[test]
fn scenario_a_list_directory_defaults_path() {
    let r = resolver();
    let outcome = r.resolve("show me all files in this directory").unwrap();
    let command = outcome.resolved().expect("Expected a resolved command");
    assert_eq!(command.intent_id(), "list-directory");
    assert_eq!(command.category(), IntentCategory::FileOp);
    assert_eq!(command.slot("path"), Some(&SlotValue::path(".")));
}

#[test]
fn scenario_b_typos_still_resolve() {
    let r = resolver();
    let outcome = r.resolve("create a new directroy called projcets").unwrap();
    let command = outcome.resolved().expect("Expected a resolved command");
    assert_eq!(command.intent_id(), "make-directory");
    assert_eq!(command.slot("name"), Some(&SlotValue::path("projcets")));
    assert!(command.confidence() > r.config().score_floor);
}

#[test]
fn scenario_c_synonyms_need_clarification() {
    let r = resolver();
    let outcome = r.resolve("delete test.txt").unwrap();
    let request = outcome.clarification().expect("Expected a clarification");
    assert_eq!(request.intent_ids(), vec!["delete-file", "remove-file"]);
    assert_eq!(request.original_input, "delete test.txt");
    assert_eq!(
        request.options[1].label(),
        "remove-file: Permanently remove a file (path=test.txt)"
    );
}

#[test]
fn scenario_d_empty_input_before_analysis() {
    let analyzer = Arc::new(FlakyAnalyzer {
        calls: AtomicUsize::new(0),
        online: true,
    });
    let registry = Arc::new(IntentRegistry::builtin().unwrap());
    let r = Resolver::with_defaults(registry, Arc::clone(&analyzer));
    assert!(matches!(r.resolve(""), Err(ResolveError::EmptyInput)));
    assert!(matches!(r.resolve("  ?! "), Err(ResolveError::EmptyInput)));
    assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_clarification_by_index() {
    let r = resolver();
    let outcome = r.resolve("delete test.txt").unwrap();
    let request = outcome.clarification().unwrap();
    let outcome = r.resolve_clarification(request, "2").unwrap();
    let command = outcome.resolved().unwrap();
    assert_eq!(command.intent_id(), "remove-file");
    assert_eq!(command.slot("path"), Some(&SlotValue::path("test.txt")));
}

#[test]
fn test_clarification_by_phrase() {
    let r = resolver();
    let outcome = r.resolve("delete test.txt").unwrap();
    let request = outcome.clarification().unwrap();
    let outcome = r.resolve_clarification(request, "permanently").unwrap();
    assert_eq!(outcome.resolved().unwrap().intent_id(), "remove-file");
}

#[test]
fn test_clarification_round_survives_serde() {
    let r = resolver();
    let outcome = r.resolve("delete test.txt").unwrap();
    let json = serde_json::to_string(&outcome).unwrap();
    let restored: Outcome = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, outcome);

    let request = restored.clarification().unwrap();
    let outcome = r.resolve_clarification(request, "delete-file").unwrap();
    assert_eq!(outcome.resolved().unwrap().intent_id(), "delete-file");
}

#[test]
fn test_second_tie_is_rejected() {
    let r = resolver();
    let outcome = r.resolve("delete test.txt").unwrap();
    let request = outcome.clarification().unwrap();
    let (near_miss, reason) = rejection(r.resolve_clarification(request, "delete"));
    assert_eq!(reason, RejectReason::ClarificationUnresolved);
    assert_eq!(near_miss.as_deref(), Some("delete-file"));
}

#[test]
fn test_reply_selecting_nothing_is_rejected() {
    let r = resolver();
    let outcome = r.resolve("delete test.txt").unwrap();
    let request = outcome.clarification().unwrap();
    let (_, reason) = rejection(r.resolve_clarification(request, "banana"));
    assert_eq!(reason, RejectReason::ClarificationUnresolved);
}

#[test]
fn test_below_floor_offers_near_miss() {
    let r = resolver();
    let result = r.resolve("show weather forecast for tomorrow");
    let err = result.as_ref().unwrap_err().to_string();
    let (near_miss, reason) = rejection(result);
    assert_eq!(reason, RejectReason::BelowFloor);
    assert_eq!(near_miss.as_deref(), Some("list-directory"));
    assert!(err.contains("did you mean 'list-directory'"));
}

#[test]
fn test_unfilled_required_slot_is_rejected() {
    let r = resolver();
    let (near_miss, reason) = rejection(r.resolve("kill process"));
    assert_eq!(reason, RejectReason::SlotsUnfilled);
    assert_eq!(near_miss.as_deref(), Some("kill-process"));
}

#[test]
fn test_slots_bind_by_proximity() {
    let r = resolver();
    let outcome = r.resolve("copy Notes.txt to backup/notes.txt").unwrap();
    let command = outcome.resolved().unwrap();
    assert_eq!(command.intent_id(), "copy-file");
    assert_eq!(command.slot("source"), Some(&SlotValue::path("Notes.txt")));
    assert_eq!(command.slot("destination"), Some(&SlotValue::path("backup/notes.txt")));
}

#[test]
fn test_quantity_slot() {
    let r = resolver();
    let outcome = r.resolve("find files larger than 100mb").unwrap();
    let command = outcome.resolved().unwrap();
    assert_eq!(command.intent_id(), "find-large-files");
    assert_eq!(
        command.slot("size"),
        Some(&SlotValue::Quantity {
            amount: 100.0,
            unit: Some("mb".to_string())
        })
    );
    assert_eq!(command.slot("path"), Some(&SlotValue::path(".")));
}

#[test]
fn test_quantity_slot_with_labelled_numbers() {
    init_tracing();
    let registry = Arc::new(IntentRegistry::builtin().unwrap());
    let r = Resolver::with_defaults(registry, QuantityTagger);
    let outcome = r.resolve("find files larger than 100mb").unwrap();
    let command = outcome.resolved().unwrap();
    assert_eq!(command.intent_id(), "find-large-files");
    assert_eq!(
        command.slot("size"),
        Some(&SlotValue::Quantity {
            amount: 100.0,
            unit: Some("mb".to_string())
        })
    );
}

#[test]
fn test_identifier_slot() {
    let r = resolver();
    let outcome = r.resolve("kill firefox").unwrap();
    let command = outcome.resolved().unwrap();
    assert_eq!(command.intent_id(), "kill-process");
    assert_eq!(command.slot("process"), Some(&SlotValue::identifier("firefox")));
}

#[test]
fn test_flags_pass_through() {
    let r = resolver();
    let outcome = r.resolve("delete directory build -r --force").unwrap();
    let command = outcome.resolved().unwrap();
    assert_eq!(command.intent_id(), "delete-directory");
    assert_eq!(command.flags(), &["-r".to_string(), "--force".to_string()]);
}

#[test]
fn test_analyzer_failure_surfaces() {
    init_tracing();
    let registry = Arc::new(IntentRegistry::builtin().unwrap());
    let analyzer = FlakyAnalyzer {
        calls: AtomicUsize::new(0),
        online: false,
    };
    let r = Resolver::with_defaults(registry, analyzer);
    let err = r.resolve("list files").unwrap_err();
    assert!(matches!(err, ResolveError::AnalysisUnavailable(_)));
    assert!(err.is_recoverable());
}

#[test]
fn test_unordered_tokens_are_rejected() {
    init_tracing();
    let registry = Arc::new(IntentRegistry::builtin().unwrap());
    let r = Resolver::with_defaults(registry, ReversingTagger);
    let err = r.resolve("find files larger than 5 gb").unwrap_err();
    assert!(matches!(
        err,
        ResolveError::AnalysisUnavailable(AnalysisError::OutOfOrder { .. })
    ));
}

#[test]
fn test_user_defined_intents() {
    init_tracing();
    let source = r#"
        version = 1

        [[intents]]
        id = "open-editor"
        category = "system-op"
        description = "Open a file in the editor"
        triggers = ["edit {path}", "open editor on {path}"]
        required = [{ name = "path", type = "path" }]
    "#;
    let registry = RegistryBuilder::new()
        .with_builtins()
        .unwrap()
        .extend_from_toml(source)
        .unwrap()
        .build();
    let r = Resolver::with_defaults(Arc::new(registry), LexiconAnalyzer::new());
    let outcome = r.resolve("edit src/main.rs").unwrap();
    let command = outcome.resolved().unwrap();
    assert_eq!(command.intent_id(), "open-editor");
    assert_eq!(command.slot("path"), Some(&SlotValue::path("src/main.rs")));
}

#[test]
fn test_custom_thresholds() {
    init_tracing();
    let registry = Arc::new(IntentRegistry::builtin().unwrap());
    let config = ResolverConfig::from_toml_str("score_floor = 0.95").unwrap();
    let r = Resolver::new(registry, LexiconAnalyzer::new(), config).unwrap();
    // "lst files" scores 0.875 against "list files"
    let (near_miss, reason) = rejection(r.resolve("lst files"));
    assert_eq!(reason, RejectReason::BelowFloor);
    assert_eq!(near_miss.as_deref(), Some("list-directory"));
}

#[test]
fn test_compound_phrase() {
    let r = resolver();
    let stages = r
        .resolve_sequence("create folder logs and then go to logs, then fly to the moon")
        .unwrap();
    assert_eq!(stages.len(), 3);

    let first = stages[0].outcome.as_ref().unwrap().resolved().unwrap();
    assert_eq!(first.intent_id(), "make-directory");
    assert_eq!(first.slot("name"), Some(&SlotValue::path("logs")));

    let second = stages[1].outcome.as_ref().unwrap().resolved().unwrap();
    assert_eq!(second.intent_id(), "change-directory");
    assert_eq!(second.slot("path"), Some(&SlotValue::path("logs")));

    assert_eq!(stages[2].text, "fly to the moon");
    assert!(matches!(
        stages[2].outcome,
        Err(ResolveError::UnrecognizedCommand { .. })
    ));
}

#[test]
fn test_connector_words_inside_paths_do_not_split() {
    let r = resolver();
    let stages = r.resolve_sequence("display src/and/main.rs").unwrap();
    assert_eq!(stages.len(), 1);
    let command = stages[0].outcome.as_ref().unwrap().resolved().unwrap();
    assert_eq!(command.intent_id(), "display-file");
    assert_eq!(command.slot("path"), Some(&SlotValue::path("src/and/main.rs")));
}

#[test]
fn test_resolved_command_json() {
    let r = resolver();
    let outcome = r.resolve("git checkout feature-x").unwrap();
    let command = outcome.resolved().unwrap();
    let json: serde_json::Value = serde_json::from_str(&command.to_json().unwrap()).unwrap();
    assert_eq!(json["intent_id"], "git-switch-branch");
    assert_eq!(json["category"], "git-op");
    assert_eq!(json["slots"]["branch"]["type"], "identifier");
    assert_eq!(json["slots"]["branch"]["value"], "feature-x");
}
