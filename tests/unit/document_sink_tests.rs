/*!
 * Tests for document sinks and output formats
 */

use std::str::FromStr;

use paratrans::document_sink::{DocumentSink, EventRecorder, OutputFormat, PlainTextDocument};
use paratrans::page_text::split_pages;
use paratrans::reflow::{render, ReconstructionEvent};

fn two_page_events() -> Vec<ReconstructionEvent> {
    vec![
        ReconstructionEvent::paragraph("Bonjour."),
        ReconstructionEvent::paragraph("Nom | Âge"),
        ReconstructionEvent::InsertPageBreak,
        ReconstructionEvent::paragraph("Deuxième page."),
        ReconstructionEvent::InsertPageBreak,
    ]
}

#[test]
fn test_renderEvents_asText_shouldSplitBackIntoSamePages() {
    let text = OutputFormat::Text.render_events(&two_page_events()).unwrap();

    let pages = split_pages(&text);

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0], vec!["Bonjour.", "", "Nom | Âge"]);
    assert_eq!(pages[1], vec!["Deuxième page."]);
}

#[test]
fn test_renderEvents_asMarkdown_shouldUseRulesForPageBreaks() {
    let markdown = OutputFormat::Markdown.render_events(&two_page_events()).unwrap();

    assert_eq!(markdown, "Bonjour.\n\nNom | Âge\n\n---\n\nDeuxième page.\n\n---\n");
}

#[test]
fn test_renderEvents_asJson_shouldSerializeTaggedEvents() {
    let json = OutputFormat::Json.render_events(&two_page_events()).unwrap();

    let parsed: Vec<ReconstructionEvent> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, two_page_events());
    assert!(json.contains("\"type\": \"insert_page_break\""));
}

#[test]
fn test_render_withCustomSink_shouldReplayEventsInOrder() {
    #[derive(Default)]
    struct Counter {
        log: Vec<String>,
    }

    impl DocumentSink for Counter {
        fn append_paragraph(&mut self, text: &str) {
            self.log.push(format!("p:{}", text));
        }

        fn insert_page_break(&mut self) {
            self.log.push("break".to_string());
        }
    }

    let mut sink = Counter::default();
    render(&two_page_events(), &mut sink);

    assert_eq!(sink.log, vec!["p:Bonjour.", "p:Nom | Âge", "break", "p:Deuxième page.", "break"]);
}

#[test]
fn test_eventRecorder_shouldCaptureEverything() {
    let mut recorder = EventRecorder::default();

    render(&two_page_events(), &mut recorder);

    assert_eq!(recorder.events, two_page_events());
}

#[test]
fn test_plainTextDocument_withNoEvents_shouldBeEmpty() {
    assert_eq!(PlainTextDocument::new().finish(), "");
}

#[test]
fn test_outputFormat_fromStr_shouldAcceptAliases() {
    assert_eq!(OutputFormat::from_str("md").unwrap(), OutputFormat::Markdown);
    assert_eq!(OutputFormat::from_str("TXT").unwrap(), OutputFormat::Text);
    assert_eq!(OutputFormat::Json.extension(), "json");
    assert!(OutputFormat::from_str("pdf").is_err());
}
