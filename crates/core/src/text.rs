//! Text helpers shared by the tracker, classifier, catalog and validator.
//!
//! Matching in this crate never runs on raw user text. Everything goes
//! through [`normalize`] first so that Arabic spelling variants (hamza
//! forms, taa marbuta, alef maqsura, diacritics, tatweel) and Latin casing
//! collapse to one comparable form.

use crate::domain::language::Language;

const TATWEEL: char = '\u{0640}';

const LINK_TERMINATORS: &[char] =
    &[')', ']', '}', '>', '<', '"', '\'', ',', '،', '؛', '؟', '!', '|'];

const LINK_TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '،', '؛', '؟'];

fn is_arabic_diacritic(ch: char) -> bool {
    matches!(ch,
        '\u{064B}'..='\u{065F}'
        | '\u{0610}'..='\u{061A}'
        | '\u{06D6}'..='\u{06ED}'
        | '\u{0670}')
}

pub fn is_arabic_letter(ch: char) -> bool {
    matches!(ch, '\u{0600}'..='\u{06FF}' | '\u{0750}'..='\u{077F}' | '\u{08A0}'..='\u{08FF}')
        && ch.is_alphabetic()
}

fn fold_arabic(ch: char) -> char {
    match ch {
        'أ' | 'إ' | 'آ' | 'ٱ' => 'ا',
        'ى' => 'ي',
        'ة' => 'ه',
        other => other,
    }
}

/// Lowercases, folds Arabic letter variants, drops diacritics and replaces
/// every non-alphanumeric character with a single space.
pub fn normalize(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for ch in text.trim().chars() {
        if ch == TATWEEL || is_arabic_diacritic(ch) {
            continue;
        }
        let ch = fold_arabic(ch);
        if ch.is_alphanumeric() {
            folded.extend(ch.to_lowercase());
        } else {
            folded.push(' ');
        }
    }
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn contains_arabic(text: &str) -> bool {
    text.chars().any(is_arabic_letter)
}

/// Word-level script detection.
///
/// Words that read as names in the other script do not count: all-caps or
/// alphanumeric Latin tokens ("BOOX", "P27") and capitalized Latin words
/// after the first one ("Go Color"). What remains decides by majority, so
/// "ابي BOOX Go Color" stays Arabic and "Delivery to جدة?" stays English.
/// A tie goes to the script of the first word. Returns `None` when the
/// text carries no letters at all.
pub fn detect_language(text: &str) -> Option<Language> {
    let mut arabic_words = 0usize;
    let mut latin_words = 0usize;
    let mut latin_names = 0usize;
    let mut first = None;

    for word in text.split_whitespace() {
        let script = if word.chars().any(is_arabic_letter) {
            arabic_words += 1;
            Language::Arabic
        } else if word.chars().any(|ch| ch.is_ascii_alphabetic()) {
            if is_latin_name(word, first.is_none()) {
                latin_names += 1;
            } else {
                latin_words += 1;
            }
            Language::English
        } else {
            continue;
        };
        if first.is_none() {
            first = Some(script);
        }
    }

    if arabic_words == 0 {
        return (latin_words + latin_names > 0).then_some(Language::English);
    }
    match arabic_words.cmp(&latin_words) {
        std::cmp::Ordering::Greater => Some(Language::Arabic),
        std::cmp::Ordering::Less => Some(Language::English),
        std::cmp::Ordering::Equal => first,
    }
}

fn is_latin_name(word: &str, leading: bool) -> bool {
    let letters = word.chars().filter(char::is_ascii_alphabetic).collect::<Vec<_>>();
    if word.chars().any(|ch| ch.is_ascii_digit()) {
        return true;
    }
    if letters.len() >= 2 && letters.iter().all(char::is_ascii_uppercase) {
        return true;
    }
    !leading && letters.len() >= 2 && letters.first().is_some_and(char::is_ascii_uppercase)
}

/// Keyword match against already-normalized text.
///
/// Arabic keywords match as substrings since Arabic attaches prefixes
/// (بال, لل, و) directly to the word. Latin keywords match on word
/// boundaries so that "pay" never fires inside "display".
pub fn matches_keyword(normalized_text: &str, keyword: &str) -> bool {
    let keyword = normalize(keyword);
    if keyword.is_empty() {
        return false;
    }
    if contains_arabic(&keyword) {
        return normalized_text.contains(&keyword);
    }
    format!(" {normalized_text} ").contains(&format!(" {keyword} "))
}

pub fn matches_any(normalized_text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| matches_keyword(normalized_text, keyword))
}

/// Byte spans of every `http://` / `https://` link in `text`, with trailing
/// sentence punctuation excluded from the span.
pub fn find_links(text: &str) -> Vec<(usize, usize)> {
    let lowered = text.to_ascii_lowercase();
    let mut spans = Vec::new();
    let mut offset = 0;

    while offset < text.len() {
        let rest = &lowered[offset..];
        let next = ["https://", "http://"].iter().filter_map(|scheme| rest.find(scheme)).min();
        let Some(found) = next else {
            break;
        };

        let start = offset + found;
        let mut end = text[start..]
            .char_indices()
            .find(|(_, ch)| ch.is_whitespace() || LINK_TERMINATORS.contains(ch))
            .map(|(index, _)| start + index)
            .unwrap_or(text.len());
        let scan_end = end;

        while let Some(last) = text[start..end].chars().last() {
            if !LINK_TRAILING_PUNCTUATION.contains(&last) {
                break;
            }
            end -= last.len_utf8();
        }

        if end > start {
            spans.push((start, end));
        }
        offset = scan_end.max(start + 1);
    }

    spans
}

pub fn extract_links(text: &str) -> Vec<&str> {
    find_links(text).into_iter().map(|(start, end)| &text[start..end]).collect()
}

/// Removes every link `allowed` rejects. Returns the scrubbed text and the
/// number of links removed.
pub fn strip_links<F>(text: &str, allowed: F) -> (String, usize)
where
    F: Fn(&str) -> bool,
{
    let mut output = String::with_capacity(text.len());
    let mut removed = 0;
    let mut cursor = 0;

    for (start, end) in find_links(text) {
        output.push_str(&text[cursor..start]);
        let link = &text[start..end];
        if allowed(link) {
            output.push_str(link);
        } else {
            removed += 1;
        }
        cursor = end;
    }
    output.push_str(&text[cursor..]);

    if removed == 0 {
        return (output, 0);
    }
    (collapse_inline_spaces(&output), removed)
}

fn collapse_inline_spaces(text: &str) -> String {
    text.lines()
        .map(|line| line.split([' ', '\t']).filter(|part| !part.is_empty()).collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Cuts `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
