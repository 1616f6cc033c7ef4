/*!
 * Integration tests for the application controller.
 *
 * Documents are processed end to end with scripted translators or a stub
 * Ollama server, and the files written to disk are checked.
 */

use std::fs;
use std::sync::Arc;

use paratrans::app_config::{Config, TranslationProvider};
use paratrans::app_controller::{Controller, FolderSummary, ISSUES_LOG_FILE};
use paratrans::document_sink::OutputFormat;
use paratrans::page_text::split_pages;
use paratrans::providers::mock::MockTranslator;

use crate::common::{
    create_temp_dir, create_test_dump, create_test_file, init_test_logging, ollama_response, StubServer, LONG_PARAGRAPH,
};

fn test_config(target_language: &str) -> Config {
    init_test_logging();
    let mut config = Config::default();
    config.target_language = target_language.to_string();
    config.reflow.inter_call_delay_ms = 0;
    config
}

#[tokio::test]
async fn test_run_withDryRun_shouldWritePagedTextNextToInput() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_dump(dir.path(), "report.txt").unwrap();
    let controller = Controller::dry_run(test_config("fr")).with_progress(false);

    let report = controller
        .run(input, dir.path().to_path_buf(), false)
        .await
        .unwrap()
        .expect("document should be processed");

    assert_eq!(report.output_path, dir.path().join("report.fr.txt"));
    let written = fs::read_to_string(&report.output_path).unwrap();
    let pages = split_pages(&written);
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0][0], "Application form | Name: | Jane Doe");
    assert_eq!(pages[1], vec!["Second page.".to_string(), String::new(), LONG_PARAGRAPH.to_string()]);
}

#[tokio::test]
async fn test_run_withExistingOutput_shouldSkipUnlessForced() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_dump(dir.path(), "report.txt").unwrap();
    create_test_file(dir.path(), "report.de.txt", "old translation").unwrap();
    let translator = MockTranslator::tagged();
    let controller = Controller::with_translator(test_config("de"), Arc::new(translator.clone())).with_progress(false);

    let skipped = controller.run(input.clone(), dir.path().to_path_buf(), false).await.unwrap();
    assert!(skipped.is_none());
    assert_eq!(translator.call_count(), 0);
    assert_eq!(fs::read_to_string(dir.path().join("report.de.txt")).unwrap(), "old translation");

    let forced = controller.run(input, dir.path().to_path_buf(), true).await.unwrap();
    assert!(forced.is_some());
    assert!(fs::read_to_string(dir.path().join("report.de.txt")).unwrap().contains("[de] Second page."));
}

#[tokio::test]
async fn test_run_withFailingTranslator_shouldWriteNoOutputAndLogIssue() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_dump(dir.path(), "report.txt").unwrap();
    let controller = Controller::with_translator(test_config("es"), Arc::new(MockTranslator::fail_on_call(2)))
        .with_progress(false);

    let result = controller.run(input, dir.path().to_path_buf(), false).await;

    let err = result.unwrap_err();
    assert!(format!("{:#}", err).contains("chunk 2 of 3"));
    assert!(!dir.path().join("report.es.txt").exists());
    let issues = fs::read_to_string(dir.path().join(ISSUES_LOG_FILE)).unwrap();
    assert!(issues.contains("report.txt"));
    assert!(issues.contains("chunk 2 of 3"));
}

#[tokio::test]
async fn test_run_withMarkdownFormat_shouldUseMarkdownExtension() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_dump(dir.path(), "notes.txt").unwrap();
    let out_dir = dir.path().join("out");
    let mut config = test_config("it");
    config.output_format = OutputFormat::Markdown;
    let controller = Controller::dry_run(config).with_progress(false);

    let report = controller.run(input, out_dir.clone(), false).await.unwrap().unwrap();

    assert_eq!(report.output_path, out_dir.join("notes.it.md"));
    let markdown = fs::read_to_string(&report.output_path).unwrap();
    assert_eq!(markdown.matches("\n---\n").count(), 2);
}

#[tokio::test]
async fn test_run_withEmptyDocument_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "blank.txt", "\n\n\x0c   \n\x0c").unwrap();
    let controller = Controller::dry_run(test_config("fr")).with_progress(false);

    let err = controller.run(input, dir.path().to_path_buf(), false).await.unwrap_err();

    assert!(format!("{:#}", err).contains("No translatable text"));
    assert!(!dir.path().join("blank.fr.txt").exists());
}

#[tokio::test]
async fn test_run_withMissingInput_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let controller = Controller::dry_run(test_config("fr")).with_progress(false);

    let result = controller.run(dir.path().join("nope.txt"), dir.path().to_path_buf(), false).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_run_withOverallTimeout_shouldAbortSlowRuns() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_dump(dir.path(), "slow.txt").unwrap();
    let mut config = test_config("fr");
    config.reflow.overall_timeout_secs = Some(1);
    let controller = Controller::with_translator(config, Arc::new(MockTranslator::slow(700))).with_progress(false);

    let err = controller.run(input, dir.path().to_path_buf(), false).await.unwrap_err();

    assert!(format!("{:#}", err).contains("did not finish within 1s"));
    assert!(!dir.path().join("slow.fr.txt").exists());
}

#[tokio::test]
async fn test_runFolder_shouldProcessSkipAndCountFailures() {
    let dir = create_temp_dir().unwrap();
    create_test_dump(dir.path(), "a.txt").unwrap();
    create_test_dump(dir.path(), "nested/b.txt").unwrap();
    create_test_file(dir.path(), "empty.txt", "\x0c").unwrap();
    create_test_dump(dir.path(), "done.txt").unwrap();
    create_test_file(dir.path(), "done.fr.txt", "already translated").unwrap();
    create_test_file(dir.path(), "ignored.pdf", "binary").unwrap();
    let controller = Controller::dry_run(test_config("fr")).with_progress(false);

    let summary = controller.run_folder(dir.path().to_path_buf(), false).await.unwrap();

    assert_eq!(summary, FolderSummary { processed: 2, skipped: 1, failed: 1 });
    assert!(dir.path().join("a.fr.txt").exists());
    assert!(dir.path().join("nested").join("b.fr.txt").exists());
    // Translations are not picked up again as sources
    assert!(!dir.path().join("done.fr.fr.txt").exists());
    let log = fs::read_to_string(dir.path().join(ISSUES_LOG_FILE)).unwrap();
    assert!(log.contains("2 processed, 1 skipped, 1 errors"));
}

#[tokio::test]
async fn test_runFolder_withNoDumps_shouldFail() {
    let dir = create_temp_dir().unwrap();
    create_test_file(dir.path(), "only.pdf", "binary").unwrap();
    let controller = Controller::dry_run(test_config("fr")).with_progress(false);

    assert!(controller.run_folder(dir.path().to_path_buf(), false).await.is_err());
}

#[tokio::test]
async fn test_withConfig_againstOllamaStub_shouldTranslateDocument() {
    let server = StubServer::start(vec![
        (200, ollama_response("Formulaire | Nom : | Jane Doe")),
        (200, ollama_response("Paragraphe long.")),
        (200, ollama_response("Deuxième page.\n\nParagraphe long.")),
    ]).await.unwrap();
    let dir = create_temp_dir().unwrap();
    let input = create_test_dump(dir.path(), "report.txt").unwrap();
    let mut config = test_config("fr");
    config.translation.provider = TranslationProvider::Ollama;
    config.translation.active_provider_config_mut().endpoint = server.base_url.clone();
    let controller = Controller::with_config(config).unwrap().with_progress(false);

    let report = controller.run(input, dir.path().to_path_buf(), false).await.unwrap().unwrap();

    assert_eq!(server.requests().len(), 3);
    let pages = split_pages(&fs::read_to_string(&report.output_path).unwrap());
    assert_eq!(pages[0], vec!["Formulaire | Nom : | Jane Doe".to_string(), String::new(), "Paragraphe long.".to_string()]);
    assert_eq!(pages[1], vec!["Deuxième page.".to_string(), String::new(), "Paragraphe long.".to_string()]);
}

#[tokio::test]
async fn test_runFolder_withUnreachableProvider_shouldFailBeforeAnyDocument() {
    let dir = create_temp_dir().unwrap();
    create_test_dump(dir.path(), "a.txt").unwrap();
    let translator = MockTranslator::failing();
    let controller = Controller::with_translator(test_config("fr"), Arc::new(translator.clone())).with_progress(false);

    let err = controller.run_folder(dir.path().to_path_buf(), false).await.unwrap_err();

    assert!(format!("{:#}", err).contains("Failed to connect to"));
    assert_eq!(translator.call_count(), 0);
    assert!(!dir.path().join("a.fr.txt").exists());
}

#[test]
fn test_testConnection_withDryRun_shouldPass() {
    let controller = Controller::dry_run(test_config("fr")).with_progress(false);

    let result = tokio_test::block_on(controller.test_connection());

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_testConnection_withOllamaStub_shouldReachServer() {
    let server = StubServer::start(vec![(200, r#"{"version":"0.5.7"}"#.to_string())]).await.unwrap();
    let mut config = test_config("fr");
    config.translation.provider = TranslationProvider::Ollama;
    config.translation.active_provider_config_mut().endpoint = server.base_url.clone();
    let controller = Controller::with_config(config).unwrap();

    controller.test_connection().await.unwrap();

    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_testConnection_withMissingApiKey_shouldFailWithoutRequest() {
    let server = StubServer::start(vec![(200, "{}".to_string())]).await.unwrap();
    let mut config = test_config("fr");
    config.translation.provider = TranslationProvider::OpenAI;
    config.translation.active_provider_config_mut().endpoint = server.base_url.clone();
    config.translation.active_provider_config_mut().api_key = String::new();
    let controller = Controller::with_config(config).unwrap();

    let err = controller.test_connection().await.unwrap_err();

    assert!(format!("{:#}", err).contains("requires an API key"));
    assert!(server.requests().is_empty());
}
