/// Returned when there is no title, or nothing is left of it.
pub const NO_TITLE: &str = "no-title-found";

/// Common English function words dropped from suggested names.
const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
    "with", "about", "against", "between", "into", "through", "during", "before", "after",
    "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
    "again", "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor", "not",
    "only", "own", "same", "so", "than", "too", "very", "can", "will", "just", "don", "should",
    "now",
];

/// Tails of contractions (`it's`, `can't`) dropped along with stop words.
const CONTRACTION_TAILS: &[&str] = &["s", "t"];

/// Characters git refuses in branch names.
const REF_FORBIDDEN: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

#[derive(Debug, PartialEq)]
enum Token {
    Word(String),
    Other(char),
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    for c in text.chars() {
        if is_word_char(c) {
            word.push(c);
            continue;
        }
        if !word.is_empty() {
            tokens.push(Token::Word(std::mem::take(&mut word)));
        }
        tokens.push(Token::Other(c));
    }
    if !word.is_empty() {
        tokens.push(Token::Word(word));
    }
    tokens
}

/// Turn a PR title into a hyphenated, lower-case branch name.
///
/// Stop words are removed as whole words, whitespace runs become single
/// hyphens and leading/trailing hyphens are trimmed.
pub fn suggest_branch_name(title: Option<&str>) -> String {
    let Some(title) = title else {
        return NO_TITLE.to_string();
    };

    let tokens = tokenize(&title.to_lowercase());
    let mut kept = String::new();
    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i] {
            Token::Word(word) if STOP_WORDS.contains(&word.as_str()) => {}
            Token::Word(word) => kept.push_str(word),
            Token::Other('\'') if is_contraction_tail(&tokens, i) => i += 1,
            Token::Other(c) if c.is_whitespace() || c.is_control() || REF_FORBIDDEN.contains(c) => {
                kept.push(' ')
            }
            Token::Other(c) => kept.push(*c),
        }
        i += 1;
    }

    let slug = kept.split_whitespace().collect::<Vec<_>>().join("-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        NO_TITLE.to_string()
    } else {
        slug.to_string()
    }
}

/// An apostrophe at `i` glued to a preceding word and followed by a lone
/// `s` or `t`.
fn is_contraction_tail(tokens: &[Token], i: usize) -> bool {
    let after_word = i > 0 && matches!(tokens[i - 1], Token::Word(_));
    let tail = matches!(
        tokens.get(i + 1),
        Some(Token::Word(w)) if CONTRACTION_TAILS.contains(&w.as_str())
    );
    after_word && tail
}
