//! Applicant and feature record structures

use crate::preprocessing::cleaner::clean_value;
use serde::{Deserialize, Serialize};

/// Dataset column names
pub mod columns {
    pub const GRANT_YEAR: &str = "ANO_CONCESSAO_BOLSA";
    pub const SCHOLARSHIP_TYPE: &str = "TIPO_BOLSA";
    pub const SEX: &str = "SEXO_BENEFICIARIO";
    pub const RACE: &str = "RACA_BENEFICIARIO";
    pub const BIRTH_DATE: &str = "DATA_NASCIMENTO";
    pub const DISABILITY: &str = "BENEFICIARIO_DEFICIENTE_FISICO";
    pub const REGION: &str = "REGIAO_BENEFICIARIO";
    pub const STATE: &str = "UF_BENEFICIARIO";
    pub const MUNICIPALITY: &str = "MUNICIPIO_BENEFICIARIO";
    pub const MODALITY: &str = "MODALIDADE_ENSINO_BOLSA";
    pub const COURSE: &str = "NOME_CURSO_BOLSA";
    pub const SHIFT: &str = "NOME_TURNO_CURSO_BOLSA";
    /// Derived at feature time, not present in raw data
    pub const AGE: &str = "IDADE";
}

/// Raw applicant record, as read from the historical CSV or received at
/// serving time. Every field is optional; `None` is the only missing marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    /// Year the scholarship was granted
    #[serde(rename = "ANO_CONCESSAO_BOLSA", alias = "ano_concessao_bolsa", default)]
    pub grant_year: Option<i32>,

    #[serde(rename = "SEXO_BENEFICIARIO", alias = "sexo_beneficiario", alias = "sexo", default)]
    pub sex: Option<String>,

    /// Self-declared race/color
    #[serde(rename = "RACA_BENEFICIARIO", alias = "raca_beneficiario", alias = "raca", default)]
    pub race: Option<String>,

    /// Date-like string; parsed forgivingly when deriving age
    #[serde(rename = "DATA_NASCIMENTO", alias = "data_nascimento", default)]
    pub birth_date: Option<String>,

    /// Disability flag token as used by the dataset ("S"/"N")
    #[serde(
        rename = "BENEFICIARIO_DEFICIENTE_FISICO",
        alias = "beneficiario_deficiente_fisico",
        default
    )]
    pub disability: Option<String>,

    #[serde(rename = "REGIAO_BENEFICIARIO", alias = "regiao_beneficiario", alias = "regiao", default)]
    pub region: Option<String>,

    /// Two-letter state code
    #[serde(rename = "UF_BENEFICIARIO", alias = "uf_beneficiario", alias = "uf", default)]
    pub state: Option<String>,

    #[serde(
        rename = "MUNICIPIO_BENEFICIARIO",
        alias = "municipio_beneficiario",
        alias = "municipio",
        default
    )]
    pub municipality: Option<String>,

    /// Teaching modality (presential, distance)
    #[serde(
        rename = "MODALIDADE_ENSINO_BOLSA",
        alias = "modalidade_ensino_bolsa",
        alias = "modalidade",
        default
    )]
    pub modality: Option<String>,

    #[serde(rename = "NOME_CURSO_BOLSA", alias = "nome_curso_bolsa", alias = "curso", default)]
    pub course: Option<String>,

    #[serde(
        rename = "NOME_TURNO_CURSO_BOLSA",
        alias = "nome_turno_curso_bolsa",
        alias = "turno",
        default
    )]
    pub shift: Option<String>,

    /// Target text; only populated in training data
    #[serde(rename = "TIPO_BOLSA", alias = "tipo_bolsa", default, skip_serializing_if = "Option::is_none")]
    pub scholarship_type: Option<String>,
}

impl ApplicantRecord {
    /// Create a record with only the grant year set
    pub fn new(grant_year: i32) -> Self {
        Self {
            grant_year: Some(grant_year),
            ..Default::default()
        }
    }

    /// Collapse null-like tokens in every text field to `None`.
    pub fn canonicalized(&self) -> Self {
        let clean = |v: &Option<String>| v.as_deref().and_then(clean_value);
        Self {
            grant_year: self.grant_year,
            sex: clean(&self.sex),
            race: clean(&self.race),
            birth_date: clean(&self.birth_date),
            disability: clean(&self.disability),
            region: clean(&self.region),
            state: clean(&self.state),
            municipality: clean(&self.municipality),
            modality: clean(&self.modality),
            course: clean(&self.course),
            shift: clean(&self.shift),
            scholarship_type: clean(&self.scholarship_type),
        }
    }

    /// Categorical fields in feature-contract order
    pub fn categorical_values(&self) -> [Option<&str>; 9] {
        [
            self.sex.as_deref(),
            self.race.as_deref(),
            self.disability.as_deref(),
            self.region.as_deref(),
            self.state.as_deref(),
            self.municipality.as_deref(),
            self.modality.as_deref(),
            self.course.as_deref(),
            self.shift.as_deref(),
        ]
    }
}

/// Model-ready derivation of an applicant record: normalized categorical
/// values, grant year and derived age.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub grant_year: Option<i32>,
    /// `None` unless within the plausible age range
    pub age: Option<i32>,
    /// Normalized categorical values in feature-contract order
    pub categorical: [Option<String>; 9],
}
