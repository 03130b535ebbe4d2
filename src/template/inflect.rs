//! Word-level transforms applied to template variables.

/// The closed set of transforms a placeholder may name after `!`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Singularize,
    Pluralize,
    Uppercase,
    Lowercase,
    LowerCamelCase,
    UpperCamelCase,
    LowerUnderscoreCase,
    UpperUnderscoreCase,
    LowerHyphenCase,
    UpperHyphenCase,
}

impl Transform {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "singularize" => Self::Singularize,
            "pluralize" => Self::Pluralize,
            "uppercase" => Self::Uppercase,
            "lowercase" => Self::Lowercase,
            "lowerCamelCase" => Self::LowerCamelCase,
            "upperCamelCase" => Self::UpperCamelCase,
            "lower_underscore_case" => Self::LowerUnderscoreCase,
            "UPPER_UNDERSCORE_CASE" => Self::UpperUnderscoreCase,
            "lower-hyphen-case" => Self::LowerHyphenCase,
            "UPPER-HYPHEN-CASE" => Self::UpperHyphenCase,
            _ => return None,
        })
    }

    pub fn apply(self, input: &str) -> String {
        match self {
            Self::Singularize => singularize(input),
            Self::Pluralize => pluralize(input),
            Self::Uppercase => input.to_uppercase(),
            Self::Lowercase => input.to_lowercase(),
            Self::LowerCamelCase => camel(input, false),
            Self::UpperCamelCase => camel(input, true),
            Self::LowerUnderscoreCase => words(input).join("_"),
            Self::UpperUnderscoreCase => words(input).join("_").to_uppercase(),
            Self::LowerHyphenCase => words(input).join("-"),
            Self::UpperHyphenCase => words(input).join("-").to_uppercase(),
        }
    }
}

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("ox", "oxen"),
];

const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "news",
    "data",
    "metadata",
];

/// Singular nouns ending in `us` or `is`, which would otherwise read as plurals.
const SINGULAR_WITH_S: &[&str] = &[
    "status",
    "bus",
    "virus",
    "bonus",
    "campus",
    "census",
    "prospectus",
    "alias",
    "canvas",
    "gas",
    "analysis",
    "axis",
    "basis",
    "crisis",
    "diagnosis",
    "synopsis",
    "thesis",
];

/// Plural of an entry in [`SINGULAR_WITH_S`]: `-is` becomes `-es`, the rest take `es`.
fn plural_of_singular_with_s(word: &str) -> String {
    match word.strip_suffix("is") {
        Some(stem) => format!("{stem}es"),
        None => format!("{word}es"),
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Re-apply the capitalisation of `original` to a lowercase `word`.
fn match_case(original: &str, word: String) -> String {
    if original.len() > 1 && original.chars().all(|c| !c.is_lowercase()) {
        return word.to_uppercase();
    }
    let mut chars = word.chars();
    match (original.chars().next(), chars.next()) {
        (Some(first), Some(c)) if first.is_uppercase() => c.to_uppercase().chain(chars).collect(),
        _ => word,
    }
}

/// English plural of the last word in `input`.
pub fn pluralize(input: &str) -> String {
    inflect_last_word(input, |word| {
        if UNCOUNTABLE.contains(&word) {
            return word.to_string();
        }
        if let Some((_, plural)) = IRREGULAR.iter().find(|(s, p)| *s == word || *p == word) {
            return (*plural).to_string();
        }
        if SINGULAR_WITH_S.contains(&word) {
            return plural_of_singular_with_s(word);
        }
        let stem = |n: usize| word[..word.len() - n].to_string();
        if let Some(base) = word.strip_suffix('y') {
            if !base.ends_with(is_vowel) && !base.is_empty() {
                return format!("{base}ies");
            }
        }
        if word.ends_with("fe") {
            return format!("{}ves", stem(2));
        }
        if word.ends_with("lf") || word.ends_with("rf") || word.ends_with("af") {
            return format!("{}ves", stem(1));
        }
        if ["s", "x", "z", "ch", "sh"].iter().any(|s| word.ends_with(s)) {
            if word.ends_with("ss") || !word.ends_with('s') {
                return format!("{word}es");
            }
            // Already plural.
            return word.to_string();
        }
        format!("{word}s")
    })
}

/// English singular of the last word in `input`.
pub fn singularize(input: &str) -> String {
    inflect_last_word(input, |word| {
        if UNCOUNTABLE.contains(&word) {
            return word.to_string();
        }
        if let Some((singular, _)) = IRREGULAR.iter().find(|(s, p)| *p == word || *s == word) {
            return (*singular).to_string();
        }
        if SINGULAR_WITH_S.contains(&word) {
            return word.to_string();
        }
        if let Some(singular) = SINGULAR_WITH_S.iter().find(|s| plural_of_singular_with_s(s) == word) {
            return (*singular).to_string();
        }
        let stem = |n: usize| word[..word.len() - n].to_string();
        if word.ends_with("ies") && word.len() > 3 {
            return format!("{}y", stem(3));
        }
        if word.ends_with("ves") && word.len() > 3 {
            let base = stem(3);
            return if base.ends_with('l') || base.ends_with('r') || base.ends_with('a') {
                format!("{base}f")
            } else {
                format!("{base}fe")
            };
        }
        if ["sses", "xes", "zes", "ches", "shes"].iter().any(|s| word.ends_with(s)) {
            return stem(2);
        }
        if word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") && !word.ends_with("is") {
            return stem(1);
        }
        word.to_string()
    })
}

/// Inflect only the trailing alphabetic word, so `user_address` pluralizes
/// to `user_addresses`.
fn inflect_last_word(input: &str, rule: impl Fn(&str) -> String) -> String {
    let start = input
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphabetic())
        .last()
        .map_or(input.len(), |(i, _)| i);
    // A camel-case tail like `userAddress` inflects only `Address`.
    let mut boundary = start;
    let mut prev_lower = false;
    for (i, c) in input[start..].char_indices() {
        if c.is_uppercase() && prev_lower {
            boundary = start + i;
        }
        prev_lower = c.is_lowercase();
    }
    let start = boundary;
    let (head, last) = input.split_at(start);
    if last.is_empty() {
        return input.to_string();
    }
    let lower = last.to_lowercase();
    format!("{head}{}", match_case(last, rule(&lower)))
}

/// Split on separators and lower-to-upper case boundaries, lowercasing each word.
fn words(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in input.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn camel(input: &str, upper_first: bool) -> String {
    words(input)
        .into_iter()
        .enumerate()
        .map(|(i, word)| {
            if i == 0 && !upper_first {
                return word;
            }
            let mut chars = word.chars();
            chars
                .next()
                .map(|c| c.to_uppercase().chain(chars).collect())
                .unwrap_or_default()
        })
        .collect()
}
