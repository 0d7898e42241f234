use crate::domain::Language;

/// Hard per-message ceiling imposed by the chat transport.
pub const MAX_MESSAGE_CHARS: usize = 1400;

/// Split outbound text into transport-sized chunks without breaking a
/// bullet or numbered list item across messages where avoidable.
///
/// Lines are the unit of packing; a single line longer than the ceiling is
/// hard-split at a character boundary as a last resort.
pub fn split_for_transport(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.split('\n') {
        let line_len = line.chars().count();

        if line_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            for piece in hard_split(line, max_chars) {
                chunks.push(piece);
            }
            continue;
        }

        let extra = if current.is_empty() {
            line_len
        } else {
            line_len + 1
        };
        if current_len + extra > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn hard_split(line: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    chars
        .chunks(max_chars)
        .map(|piece| piece.iter().collect())
        .collect()
}

/// Format the summary for delivery, chunked to the transport ceiling. A
/// summary that fits in one message gets the language header; longer
/// summaries get per-part headers so out-of-order delivery stays readable.
pub fn summary_messages(summary: &str, language: Language, max_chars: usize) -> Vec<String> {
    let header = format!("📝 *Meeting Summary ({}):*\n\n", language.display_name());

    let single = format!("{}{}", header, summary);
    if single.chars().count() <= max_chars {
        return vec![single];
    }

    // Part headers are bounded; reserve room for the widest one.
    let reserve = "📝 *Meeting Summary - Part 99*\n\n".chars().count();
    let body_limit = max_chars.saturating_sub(reserve).max(1);

    split_for_transport(summary, body_limit)
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| format!("📝 *Meeting Summary - Part {}*\n\n{}", i + 1, chunk))
        .collect()
}

/// Menu message sent after transcription, naming the detected language.
pub fn language_menu_message(detected: Language) -> String {
    format!(
        "🎙️ *Audio transcribed!*\n🔍 Detected: *{}*\n\n📝 *Choose summary language:*\n\n{}",
        detected.display_name(),
        Language::menu()
    )
}

/// Re-prompt for an unparseable language reply. No state change accompanies
/// this message.
pub fn invalid_choice_message() -> String {
    format!(
        "⚠️ Please reply with a number between 1 and 9.\n\n{}",
        Language::menu()
    )
}

/// Notice sent when the selection window lapses and the configured default
/// is applied.
pub fn selection_timeout_message(default: Language) -> String {
    format!(
        "⏳ No language selected in time — using *{}* for your summary.",
        default.display_name()
    )
}

/// Confirmation listing extracted tasks, capped at five titles.
pub fn tasks_confirmation_message(titles: &[String]) -> String {
    let shown = titles.iter().take(5);
    let mut list = String::new();
    for (i, title) in shown.enumerate() {
        list.push_str(&format!("{}. {}\n", i + 1, title));
    }
    if titles.len() > 5 {
        list.push_str(&format!("...and {} more\n", titles.len() - 5));
    }
    format!("✅ Extracted {} task(s):\n\n{}", titles.len(), list.trim_end())
}
