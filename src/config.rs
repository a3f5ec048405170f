// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};
use tracing::info;

/// Header layout every yearly extract is expected to carry, in order.
const EXPECTED_COLUMNS: &[&str] = &[
    "COMP",
    "REGIAO",
    "UF",
    "MUNICIPIO",
    "MOTIVO DESABILITACAO",
    "CNES",
    "NOME ESTABELECIMENTO",
    "RAZAO SOCIAL",
    "TP_GESTAO",
    "CO_TIPO_UNIDADE",
    "DS_TIPO_UNIDADE",
    "NATUREZA_JURIDICA",
    "DESC_NATUREZA_JURIDICA",
    "NO_LOGRADOURO",
    "NU_ENDERECO",
    "NO_COMPLEMENTO",
    "NO_BAIRRO",
    "CO_CEP",
    "NU_TELEFONE",
    "NO_EMAIL",
    "LEITOS EXISTENTES",
    "LEITOS SUS",
    "UTI TOTAL - EXIST",
    "UTI TOTAL - SUS",
    "UTI ADULTO - EXIST",
    "UTI ADULTO - SUS",
    "UTI PEDIATRICO - EXIST",
    "UTI PEDIATRICO - SUS",
    "UTI NEONATAL - EXIST",
    "UTI NEONATAL - SUS",
    "UTI QUEIMADO - EXIST",
    "UTI QUEIMADO - SUS",
    "UTI CORONARIANA - EXIST",
    "UTI CORONARIANA - SUS",
];

/// Columns kept for processing; everything else is pruned.
const RELEVANT_COLUMNS: &[&str] = &[
    "COMP",
    "REGIAO",
    "UF",
    "MUNICIPIO",
    "CNES",
    "DS_TIPO_UNIDADE",
    "DESC_NATUREZA_JURIDICA",
    "TP_GESTAO",
    "LEITOS EXISTENTES",
    "LEITOS SUS",
    "UTI TOTAL - EXIST",
    "UTI TOTAL - SUS",
    "UTI ADULTO - EXIST",
    "UTI ADULTO - SUS",
    "UTI PEDIATRICO - EXIST",
    "UTI PEDIATRICO - SUS",
    "UTI NEONATAL - EXIST",
    "UTI NEONATAL - SUS",
    "UTI QUEIMADO - EXIST",
    "UTI QUEIMADO - SUS",
    "UTI CORONARIANA - EXIST",
    "UTI CORONARIANA - SUS",
];

const TEXT_COLUMNS: &[&str] = &["REGIAO", "UF", "MUNICIPIO", "DS_TIPO_UNIDADE"];

/// Name of the derived year column.
pub const YEAR_COLUMN: &str = "ANO";
/// Name of the derived month column.
pub const MONTH_COLUMN: &str = "MES";

/// Fixed tables and names driving the checker and the normalizer.
///
/// `Default` reproduces the production tables; tests build shrunk variants
/// directly and a YAML file can override any field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub expected_columns: Vec<String>,
    pub relevant_columns: Vec<String>,
    /// column → (raw code → display label)
    pub mappings: BTreeMap<String, BTreeMap<String, String>>,
    pub entity_type_column: String,
    pub period_column: String,
    pub text_columns: Vec<String>,
    /// A column is a bed count when its name contains any of these.
    pub numeric_keywords: Vec<String>,
    pub sort_columns: Vec<String>,
    pub source_prefix: String,
    pub source_extension: String,
    pub output_prefix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let mut mappings = BTreeMap::new();
        mappings.insert(
            "TP_GESTAO".to_string(),
            owned_map(&[
                ("M", "Municipal"),
                ("E", "Estadual"),
                ("D", "Dupla"),
                ("S", "Sem Gestão"),
            ]),
        );
        mappings.insert(
            "REGIAO".to_string(),
            owned_map(&[
                ("NORDESTE", "Nordeste"),
                ("NORTE", "Norte"),
                ("SUDESTE", "Sudeste"),
                ("CENTRO-OESTE", "Centro-Oeste"),
                ("SUL", "Sul"),
            ]),
        );

        Self {
            expected_columns: owned(EXPECTED_COLUMNS),
            relevant_columns: owned(RELEVANT_COLUMNS),
            mappings,
            entity_type_column: "DESC_NATUREZA_JURIDICA".to_string(),
            period_column: "COMP".to_string(),
            text_columns: owned(TEXT_COLUMNS),
            numeric_keywords: owned(&["LEITOS", "UTI"]),
            sort_columns: owned(&[YEAR_COLUMN, MONTH_COLUMN, "UF"]),
            source_prefix: "Leitos_".to_string(),
            source_extension: "csv".to_string(),
            output_prefix: "leitos_consolidados_".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Parse a YAML file; fields left out keep their defaults.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config {:?}", path))
    }

    /// Load from `path` when given, otherwise use the built-in tables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                info!(path = %p.display(), "loading pipeline config");
                Self::from_yaml_file(p)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn is_numeric_column(&self, name: &str) -> bool {
        self.numeric_keywords.iter().any(|k| name.contains(k.as_str()))
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn owned_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
