//! Conversational adapter: sparse profile to applicant record

use crate::types::record::ApplicantRecord;
use serde::{Deserialize, Serialize};

/// Federative unit to macro-region
const REGIONS: [(&str, &str); 27] = [
    ("AC", "NORTE"),
    ("AP", "NORTE"),
    ("AM", "NORTE"),
    ("PA", "NORTE"),
    ("RO", "NORTE"),
    ("RR", "NORTE"),
    ("TO", "NORTE"),
    ("AL", "NORDESTE"),
    ("BA", "NORDESTE"),
    ("CE", "NORDESTE"),
    ("MA", "NORDESTE"),
    ("PB", "NORDESTE"),
    ("PE", "NORDESTE"),
    ("PI", "NORDESTE"),
    ("RN", "NORDESTE"),
    ("SE", "NORDESTE"),
    ("DF", "CENTRO-OESTE"),
    ("GO", "CENTRO-OESTE"),
    ("MT", "CENTRO-OESTE"),
    ("MS", "CENTRO-OESTE"),
    ("ES", "SUDESTE"),
    ("MG", "SUDESTE"),
    ("RJ", "SUDESTE"),
    ("SP", "SUDESTE"),
    ("PR", "SUL"),
    ("RS", "SUL"),
    ("SC", "SUL"),
];

/// Profile gathered by a conversational client. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationalProfile {
    #[serde(default, alias = "idade")]
    pub age: Option<i32>,
    #[serde(default, alias = "sexo")]
    pub sex: Option<String>,
    #[serde(default, alias = "raca")]
    pub race: Option<String>,
    /// Person with disability
    #[serde(default, alias = "pcd")]
    pub disability: Option<bool>,
    #[serde(default, alias = "uf")]
    pub state: Option<String>,
    #[serde(default, alias = "municipio")]
    pub municipality: Option<String>,
    #[serde(default, alias = "curso")]
    pub course: Option<String>,
    #[serde(default, alias = "turno")]
    pub shift: Option<String>,
    #[serde(default, alias = "modalidade")]
    pub modality: Option<String>,
}

impl ConversationalProfile {
    /// Expand into a full applicant record for `reference_year`.
    ///
    /// Birth date becomes January 1st of `reference_year - age`, so the
    /// derived age equals the stated one. An age that overflows the year
    /// arithmetic leaves the birth date missing.
    pub fn to_applicant_record(&self, reference_year: i32) -> ApplicantRecord {
        ApplicantRecord {
            grant_year: Some(reference_year),
            sex: self.sex.clone(),
            race: self.race.clone(),
            birth_date: self
                .age
                .and_then(|age| reference_year.checked_sub(age))
                .map(|year| format!("{:04}-01-01", year)),
            disability: self
                .disability
                .map(|flag| if flag { "S" } else { "N" }.to_string()),
            region: infer_region(self.state.as_deref()).map(str::to_string),
            state: self.state.clone(),
            municipality: self.municipality.clone(),
            modality: self.modality.clone(),
            course: self.course.clone(),
            shift: self.shift.clone(),
            scholarship_type: None,
        }
    }
}

/// Macro-region of a state code. Unknown or absent codes yield `None`.
pub fn infer_region(state: Option<&str>) -> Option<&'static str> {
    let code = state?.trim().to_uppercase();
    REGIONS
        .iter()
        .find(|(uf, _)| *uf == code)
        .map(|(_, region)| *region)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_region() {
        assert_eq!(infer_region(Some("SP")), Some("SUDESTE"));
        assert_eq!(infer_region(Some(" rs ")), Some("SUL"));
        assert_eq!(infer_region(Some("DF")), Some("CENTRO-OESTE"));
        assert_eq!(infer_region(Some("ZZ")), None);
        assert_eq!(infer_region(Some("")), None);
        assert_eq!(infer_region(None), None);
    }

    #[test]
    fn test_every_state_is_mapped_once() {
        let mut codes: Vec<&str> = REGIONS.iter().map(|(uf, _)| *uf).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 27);
    }

    #[test]
    fn test_disability_tokens() {
        let mut profile = ConversationalProfile {
            disability: Some(true),
            ..Default::default()
        };
        assert_eq!(profile.to_applicant_record(2020).disability.as_deref(), Some("S"));
        profile.disability = Some(false);
        assert_eq!(profile.to_applicant_record(2020).disability.as_deref(), Some("N"));
        profile.disability = None;
        assert_eq!(profile.to_applicant_record(2020).disability, None);
    }

    #[test]
    fn test_record_from_short_field_names() {
        let profile: ConversationalProfile = serde_json::from_str(
            r#"{"idade": 22, "sexo": "F", "raca": "Parda", "pcd": false, "uf": "SP",
                "curso": "Medicina", "turno": "Integral"}"#,
        )
        .unwrap();
        let record = profile.to_applicant_record(2020);

        assert_eq!(record.grant_year, Some(2020));
        assert_eq!(record.birth_date.as_deref(), Some("1998-01-01"));
        assert_eq!(record.region.as_deref(), Some("SUDESTE"));
        assert_eq!(record.state.as_deref(), Some("SP"));
        assert_eq!(record.course.as_deref(), Some("Medicina"));
        assert_eq!(record.municipality, None);
        assert_eq!(record.modality, None);
    }

    #[test]
    fn test_age_round_trips_through_birth_date() {
        let profile = ConversationalProfile {
            age: Some(35),
            ..Default::default()
        };
        let record = profile.to_applicant_record(2020);
        let age = crate::preprocessing::age::derive_age(record.grant_year, record.birth_date.as_deref());
        assert_eq!(age, Some(35));
    }

    #[test]
    fn test_extreme_ages_leave_birth_date_missing() {
        let mut profile = ConversationalProfile {
            age: Some(i32::MIN),
            state: Some("SP".to_string()),
            ..Default::default()
        };
        let record = profile.to_applicant_record(2020);
        assert_eq!(record.birth_date, None);
        assert_eq!(record.region.as_deref(), Some("SUDESTE"));

        // representable but implausible: dropped by the age deriver
        profile.age = Some(i32::MAX);
        let record = profile.to_applicant_record(2020);
        let age = crate::preprocessing::age::derive_age(record.grant_year, record.birth_date.as_deref());
        assert_eq!(age, None);
    }
}
