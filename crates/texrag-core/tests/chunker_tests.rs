use texrag_core::chunker::{chunk_text, ChunkingConfig, TextChunk};

fn spans(text: &str, size: usize, overlap: usize) -> Vec<(usize, usize, String)> {
    let config = ChunkingConfig::new(size, overlap).unwrap();
    chunk_text(text, &config).map(|c| (c.start, c.end, c.text.to_string())).collect()
}

#[test]
fn overlapping_windows_follow_the_stride() {
    let got = spans("ABCDEFGHIJ", 4, 2);
    let want = vec![
        (0, 4, "ABCD".to_string()),
        (2, 6, "CDEF".to_string()),
        (4, 8, "EFGH".to_string()),
        (6, 10, "GHIJ".to_string()),
        (8, 10, "IJ".to_string()),
    ];
    assert_eq!(got, want);
}

#[test]
fn empty_text_yields_nothing() {
    assert!(spans("", 4, 2).is_empty());
}

#[test]
fn same_inputs_give_the_same_sequence() {
    let text = "The quick brown fox jumps over the lazy dog. ".repeat(30);
    let config = ChunkingConfig::new(64, 16).unwrap();
    let first: Vec<TextChunk<'_>> = chunk_text(&text, &config).collect();
    let second: Vec<TextChunk<'_>> = chunk_text(&text, &config).collect();
    assert_eq!(first, second);

    let iter = chunk_text(&text, &config);
    let restarted: Vec<TextChunk<'_>> = iter.clone().collect();
    assert_eq!(restarted, iter.collect::<Vec<_>>());
}

#[test]
fn zero_overlap_windows_are_contiguous() {
    let text = "abcdefghijklmnopqrstuvw";
    let got = spans(text, 5, 0);
    let mut expected_start = 0;
    for (start, end, _) in &got {
        assert_eq!(*start, expected_start);
        expected_start = *end;
    }
    assert_eq!(expected_start, text.len());
}

#[test]
fn windows_cover_the_whole_text() {
    let text = "x".repeat(103);
    let config = ChunkingConfig::new(20, 7).unwrap();
    let chunks: Vec<_> = chunk_text(&text, &config).collect();
    assert_eq!(chunks.first().map(|c| c.start), Some(0));
    assert_eq!(chunks.last().map(|c| c.end), Some(103));
    for pair in chunks.windows(2) {
        assert_eq!(pair[1].start - pair[0].start, 13);
        assert!(pair[1].start <= pair[0].end, "no gaps between windows");
    }
}

#[test]
fn whitespace_windows_are_skipped_and_text_is_trimmed() {
    // second window is all spaces
    let text = "ab  ";
    let text = format!("{text}    cd");
    let got = spans(&text, 4, 0);
    assert_eq!(got, vec![(0, 4, "ab".to_string()), (8, 10, "cd".to_string())]);
}

#[test]
fn offsets_count_characters_not_bytes() {
    let got = spans("héllo wörld", 5, 0);
    assert_eq!(got[0], (0, 5, "héllo".to_string()));
    assert_eq!(got[1], (5, 10, "wörl".to_string()));
    assert_eq!(got[2], (10, 11, "d".to_string()));
}

#[test]
fn invalid_configs_are_rejected() {
    assert!(ChunkingConfig::new(0, 0).is_err());
    assert!(ChunkingConfig::new(4, 4).is_err());
    assert!(ChunkingConfig::new(4, 9).is_err());
    assert_eq!(ChunkingConfig::new(4, 3).unwrap().step(), 1);
}

#[test]
fn default_config_matches_corpus_defaults() {
    let config = ChunkingConfig::default();
    assert_eq!((config.size, config.overlap), (700, 150));
    assert!(config.validate().is_ok());
}
