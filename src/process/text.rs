use arrow::array::StringArray;
use deunicode::deunicode;
use std::collections::BTreeMap;

/// Transliterate accented and special characters to plain ASCII,
/// e.g. `"SÃO PAULO"` → `"SAO PAULO"`.
pub fn fold_accents(text: &str) -> String {
    deunicode(text)
}

/// Trim, upper-case, then fold accents.
pub fn clean_text(raw: &str) -> String {
    fold_accents(&raw.trim().to_uppercase())
}

/// Apply [`clean_text`] to every value; nulls stay null.
pub fn clean_text_column(values: &StringArray) -> StringArray {
    values.iter().map(|opt| opt.map(clean_text)).collect()
}

/// Replace values that exactly match a key of `mapping`.
/// Unknown codes pass through untouched.
pub fn apply_categorical_map(
    values: &StringArray,
    mapping: &BTreeMap<String, String>,
) -> StringArray {
    values
        .iter()
        .map(|opt| opt.map(|v| mapping.get(v).map(String::as_str).unwrap_or(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;

    #[test]
    fn folds_portuguese_accents() {
        assert_eq!(fold_accents("São João"), "Sao Joao");
        assert_eq!(fold_accents("AÇÃO PÚBLICA"), "ACAO PUBLICA");
        assert_eq!(fold_accents("plain"), "plain");
    }

    #[test]
    fn clean_text_trims_uppercases_and_folds() {
        assert_eq!(clean_text("  belém "), "BELEM");
        assert_eq!(clean_text("Hospital Geral"), "HOSPITAL GERAL");
        // already clean input is left alone
        assert_eq!(clean_text("HOSPITAL GERAL"), "HOSPITAL GERAL");
    }

    #[test]
    fn clean_column_keeps_nulls() {
        let arr = StringArray::from(vec![Some(" goiânia"), None, Some("sp")]);
        let out = clean_text_column(&arr);
        assert_eq!(out.value(0), "GOIANIA");
        assert!(out.is_null(1));
        assert_eq!(out.value(2), "SP");
    }

    #[test]
    fn categorical_map_ignores_unknown_codes() {
        let mut mapping = BTreeMap::new();
        mapping.insert("M".to_string(), "Municipal".to_string());
        mapping.insert("E".to_string(), "Estadual".to_string());

        let arr = StringArray::from(vec![Some("M"), Some("X"), None, Some("E"), Some("m")]);
        let out = apply_categorical_map(&arr, &mapping);
        assert_eq!(out.value(0), "Municipal");
        assert_eq!(out.value(1), "X");
        assert!(out.is_null(2));
        assert_eq!(out.value(3), "Estadual");
        assert_eq!(out.value(4), "m");
    }
}
