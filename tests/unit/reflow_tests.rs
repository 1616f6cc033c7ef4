/*!
 * Tests for the merge, pack and reconstruct stages
 */

use paratrans::errors::PipelineError;
use paratrans::page_text::{lines_from_dump, PAGE_SENTINEL};
use paratrans::reflow::{
    check_chunk_bounds, merge, pack, reconstruct, BlankRendering, Chunk, MarkerKind, MergeConfig,
    ReconstructionEvent, Unit, UnitKind,
};

use crate::common::{lines, paragraph_lines, sample_dump, LONG_PARAGRAPH};

#[test]
fn test_merge_withSampleDump_shouldKeepOnePageBreakPerPage() {
    let units = merge(&lines_from_dump(&sample_dump()), &MergeConfig::default());

    assert_eq!(units, vec![
        Unit::text("Application form | Name: | Jane Doe"),
        Unit::blank(),
        Unit::text(LONG_PARAGRAPH),
        Unit::page_break(),
        Unit::text("Second page."),
        Unit::text(LONG_PARAGRAPH),
        Unit::page_break(),
    ]);
}

#[test]
fn test_merge_withLineOfExactlyThreshold_shouldNotMerge() {
    let exact = "y".repeat(100);
    let input = lines(&["cell", &exact, "other"]);

    let units = merge(&input, &MergeConfig::default());

    assert_eq!(units, vec![Unit::text("cell"), Unit::text(exact.as_str()), Unit::text("other")]);
}

#[test]
fn test_merge_withTripleSpaces_shouldCollapseOnlyOnce() {
    let input = lines(&["a   b."]);

    let units = merge(&input, &MergeConfig::default());

    // "a   b." -> one pair replaced, one space left over from the triple
    assert_eq!(units[0].content, "a  b.");
}

#[test]
fn test_pack_withParagraphsFittingExactly_shouldShareOneChunk() {
    let units = vec![Unit::text("a".repeat(10)), Unit::text("b".repeat(8))];

    // 10 + 2 + 8 = 20
    let chunks = pack(&units, 20);

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].payload().chars().count(), 20);
}

#[test]
fn test_pack_withOneCharacterOver_shouldFlushBeforeNextParagraph() {
    let units = vec![Unit::text("a".repeat(10)), Unit::text("b".repeat(9))];

    let chunks = pack(&units, 20);

    assert_eq!(chunks, vec![Chunk::translatable("a".repeat(10)), Chunk::translatable("b".repeat(9))]);
}

#[test]
fn test_pack_withOversizedParagraph_shouldEmitItAlone() {
    let units = vec![
        Unit::text("short."),
        Unit::text("z".repeat(5000)),
        Unit::text("tail."),
    ];

    let chunks = pack(&units, 4500);

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[1].payload().chars().count(), 5000);
    assert!(check_chunk_bounds(&chunks, 4500).is_ok());
}

#[test]
fn test_pack_withMarkers_shouldFlushAndKeepOrder() {
    let units = vec![
        Unit::text("one"),
        Unit::blank(),
        Unit::text("two"),
        Unit::text("three"),
        Unit::page_break(),
    ];

    let chunks = pack(&units, 4500);

    assert_eq!(chunks, vec![
        Chunk::translatable("one"),
        Chunk::marker(MarkerKind::Blank),
        Chunk::Translatable { payload: "two\n\nthree".to_string(), paragraphs: 2 },
        Chunk::marker(MarkerKind::PageBreak),
    ]);
}

#[test]
fn test_pack_withManyParagraphs_shouldRespectBudgetAndPreserveText() {
    let input = paragraph_lines(40, 300);
    let units = merge(&input, &MergeConfig::default());

    let chunks = pack(&units, 1000);

    for chunk in chunks.iter().filter(|c| c.is_translatable()) {
        assert!(chunk.payload().chars().count() <= 1000);
    }
    let rejoined: Vec<&str> = chunks
        .iter()
        .filter(|c| c.is_translatable())
        .flat_map(|c| c.payload().split("\n\n"))
        .collect();
    let originals: Vec<&str> = units
        .iter()
        .filter(|u| u.kind == UnitKind::Text)
        .map(|u| u.content.as_str())
        .collect();
    assert_eq!(rejoined, originals);
}

#[test]
fn test_checkChunkBounds_withPackedMultiParagraphOverLimit_shouldFail() {
    let chunks = vec![Chunk::Translatable { payload: "a".repeat(30), paragraphs: 2 }];

    let result = check_chunk_bounds(&chunks, 20);

    assert!(matches!(
        result,
        Err(PipelineError::PackingInvariantViolation { chunk_index: 0, length: 30, paragraphs: 2, max_size: 20 })
    ));
}

#[test]
fn test_reconstruct_withTranslatedChunks_shouldSplitAndTrimParagraphs() {
    let chunks = vec![
        Chunk::Translatable { payload: "  un \n\n\n\ndeux  ".to_string(), paragraphs: 2 },
        Chunk::marker(MarkerKind::Blank),
        Chunk::marker(MarkerKind::PageBreak),
    ];

    let events = reconstruct(&chunks, BlankRendering::Skip);

    assert_eq!(events, vec![
        ReconstructionEvent::paragraph("un"),
        ReconstructionEvent::paragraph("deux"),
        ReconstructionEvent::InsertPageBreak,
    ]);
}

#[test]
fn test_reconstruct_withEmptyParagraphRendering_shouldEmitBlankParagraph() {
    let chunks = vec![Chunk::translatable("a"), Chunk::marker(MarkerKind::Blank), Chunk::translatable("b")];

    let events = reconstruct(&chunks, BlankRendering::EmptyParagraph);

    assert_eq!(events, vec![
        ReconstructionEvent::paragraph("a"),
        ReconstructionEvent::paragraph(""),
        ReconstructionEvent::paragraph("b"),
    ]);
}

#[test]
fn test_stages_withMultiplePages_shouldEmitOneBreakPerSentinel() {
    let input = lines(&["p1.", PAGE_SENTINEL, "", PAGE_SENTINEL, "p3.", PAGE_SENTINEL]);

    let units = merge(&input, &MergeConfig::default());
    let events = reconstruct(&pack(&units, 4500), BlankRendering::Skip);

    let breaks = events.iter().filter(|e| **e == ReconstructionEvent::InsertPageBreak).count();
    assert_eq!(breaks, 3);
}
