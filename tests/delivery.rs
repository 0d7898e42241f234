use vaani::application::services::delivery::{
    split_for_transport, summary_messages, MAX_MESSAGE_CHARS,
};
use vaani::domain::Language;

const TIGHT_LIMIT: usize = 60;

#[test]
fn given_short_text_when_splitting_then_returns_single_chunk() {
    let text = "A short update.";
    let chunks = split_for_transport(text, MAX_MESSAGE_CHARS);
    assert_eq!(chunks, vec![text.to_string()]);
}

#[test]
fn given_bulleted_text_when_splitting_then_no_bullet_is_split_across_chunks() {
    let mut text = String::new();
    for i in 1..=20 {
        text.push_str(&format!("- Action item number {} with some detail\n", i));
    }

    let chunks = split_for_transport(text.trim_end(), TIGHT_LIMIT);
    assert!(chunks.len() > 1);

    for chunk in &chunks {
        assert!(chunk.chars().count() <= TIGHT_LIMIT, "chunk too long: {:?}", chunk);
        for line in chunk.lines() {
            // Every bullet line must survive intact.
            assert!(
                line.starts_with("- Action item number"),
                "bullet split mid-line: {:?}",
                line
            );
            assert!(line.ends_with("detail"), "bullet truncated: {:?}", line);
        }
    }

    // Nothing was dropped.
    let total_lines: usize = chunks.iter().map(|c| c.lines().count()).sum();
    assert_eq!(total_lines, 20);
}

#[test]
fn given_single_overlong_line_when_splitting_then_hard_splits_at_char_boundary() {
    let line = "x".repeat(150);
    let chunks = split_for_transport(&line, TIGHT_LIMIT);
    assert_eq!(chunks.len(), 3);
    for chunk in &chunks {
        assert!(chunk.chars().count() <= TIGHT_LIMIT);
    }
    assert_eq!(chunks.concat(), line);
}

#[test]
fn given_multibyte_text_when_splitting_then_counts_characters_not_bytes() {
    let line = "हिंदी ".repeat(40);
    let chunks = split_for_transport(line.trim_end(), 50);
    for chunk in &chunks {
        assert!(chunk.chars().count() <= 50);
    }
}

#[test]
fn given_fitting_summary_when_formatting_then_single_message_with_language_header() {
    let messages = summary_messages("Key points were discussed.", Language::English, MAX_MESSAGE_CHARS);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Meeting Summary (English)"));
    assert!(messages[0].contains("Key points were discussed."));
}

#[test]
fn given_long_summary_when_formatting_then_every_part_has_header_and_fits_limit() {
    let mut summary = String::new();
    for i in 1..=30 {
        summary.push_str(&format!("- Decision {} was recorded for follow up\n", i));
    }

    let limit = 120;
    let messages = summary_messages(summary.trim_end(), Language::Hindi, limit);
    assert!(messages.len() > 1);

    for (i, message) in messages.iter().enumerate() {
        assert!(message.chars().count() <= limit, "part over limit: {:?}", message);
        assert!(message.contains(&format!("Part {}", i + 1)));
    }
}
