//! Correction of the noisy legal-entity-type field (`DESC_NATUREZA_JURIDICA`).
//!
//! Source extracts spell the two dominant categories in many ad-hoc ways
//! (`HOSPITAL_P BLICO`, `hospital-filantr pico`, `HOSPITALPUBLICO`, ...).
//! The corrector cleans the text, applies a fixed list of substitutions and
//! then collapses anything that mentions a known category into its canonical
//! label.

use arrow::array::StringArray;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::process::text::fold_accents;

/// Returned for missing or blank values.
pub const NOT_INFORMED: &str = "NAO INFORMADO";
pub const PHILANTHROPIC_HOSPITAL: &str = "HOSPITAL FILANTROPICO";
pub const PUBLIC_HOSPITAL: &str = "HOSPITAL PUBLICO";

enum Substitution {
    Pattern(Regex, &'static str),
    Literal(&'static str, &'static str),
}

impl Substitution {
    fn apply(&self, text: String) -> String {
        match self {
            Substitution::Pattern(re, to) => re.replace_all(&text, *to).into_owned(),
            Substitution::Literal(from, to) => text.replace(from, to),
        }
    }
}

// Order and case matter: later rules see the output of earlier ones.
static SUBSTITUTIONS: Lazy<Vec<Substitution>> = Lazy::new(|| {
    vec![
        Substitution::Pattern(
            Regex::new(r"FILANTR[OÓ]?PICO").expect("valid regex"),
            "FILANTROPICO",
        ),
        Substitution::Literal("PBLICO", "PUBLICO"),
        Substitution::Literal("HOSPITAL P BLICO", "HOSPITAL PUBLICO"),
        Substitution::Literal("FILANTRPICO", "FILANTROPICO"),
        Substitution::Literal("HOSPITALPUBLICO", "HOSPITAL PUBLICO"),
        Substitution::Literal("HOSPITALFILANTROPICO", "HOSPITAL FILANTROPICO"),
    ]
});

/// Map a raw legal-entity-type value to its canonical form.
///
/// - `None`, empty or whitespace-only → [`NOT_INFORMED`]
/// - anything containing `HOSPITAL FILANTROPICO` / `HOSPITAL PUBLICO` after
///   cleanup → exactly that label
/// - otherwise the cleaned text
pub fn correct_entity_type(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(s) if !s.trim().is_empty() => s,
        _ => return NOT_INFORMED.to_string(),
    };

    let upper = raw.trim().to_uppercase().replace(['_', '-'], " ");
    let folded = fold_accents(&upper);

    let corrected = SUBSTITUTIONS
        .iter()
        .fold(folded, |text, rule| rule.apply(text));

    let collapsed = corrected.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.contains(PHILANTHROPIC_HOSPITAL) {
        PHILANTHROPIC_HOSPITAL.to_string()
    } else if collapsed.contains(PUBLIC_HOSPITAL) {
        PUBLIC_HOSPITAL.to_string()
    } else if collapsed.is_empty() {
        NOT_INFORMED.to_string()
    } else {
        collapsed
    }
}

/// Correct every value of the column; nulls become [`NOT_INFORMED`].
pub fn correct_entity_type_column(values: &StringArray) -> StringArray {
    values
        .iter()
        .map(|opt| Some(correct_entity_type(opt)))
        .collect()
}
