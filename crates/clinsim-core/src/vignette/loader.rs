//! Vignette loading and authoring-time validation.
//!
//! Vignettes are authored offline as TOML documents. Configuration problems
//! (unknown phase references, empty phase lists, malformed duration strings)
//! are fatal and must surface here, at authoring/load time, never during a
//! live session.

use super::model::Vignette;
use crate::error::{ClinsimError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static MINUTES_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\d+").ok());

/// Parses the minimum duration in minutes from a human-readable duration
/// string ("5 minutes", "about 10 min"). The first integer found wins.
pub fn parse_duration_minutes(duration: &str) -> Option<u64> {
    let re = MINUTES_RE.as_ref()?;
    re.find(duration).and_then(|m| m.as_str().parse().ok())
}

impl Vignette {
    /// Parses a vignette from a TOML document.
    ///
    /// The parsed vignette is validated; see [`Vignette::validate`].
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let vignette: Vignette = toml::from_str(input)?;
        vignette.validate()?;
        Ok(vignette)
    }

    /// Structural validation of an authored vignette.
    ///
    /// Checks that:
    /// - at least one phase is defined and phase ids are unique
    /// - every branch point targets a phase that exists and does not
    ///   precede its own phase (self-loops are allowed)
    /// - every phase duration contains a parsable minute count
    /// - emotional threshold cut-points are ascending and within scale bounds
    /// - dimension weights are non-negative
    pub fn validate(&self) -> Result<()> {
        if self.phases.is_empty() {
            return Err(ClinsimError::config(format!(
                "vignette '{}' defines no phases",
                self.id
            )));
        }

        for (i, phase) in self.phases.iter().enumerate() {
            if self.phases.iter().skip(i + 1).any(|p| p.id == phase.id) {
                return Err(ClinsimError::config(format!(
                    "duplicate phase id '{}'",
                    phase.id
                )));
            }
            if parse_duration_minutes(&phase.duration).is_none() {
                return Err(ClinsimError::config(format!(
                    "phase '{}' has malformed duration '{}'",
                    phase.id, phase.duration
                )));
            }
            for branch in &phase.branch_points {
                match self.phase_index(&branch.next_phase) {
                    None => {
                        return Err(ClinsimError::config(format!(
                            "phase '{}' branch '{}' targets unknown phase '{}'",
                            phase.id, branch.condition, branch.next_phase
                        )));
                    }
                    // Self-loops are legal; moving backward is not.
                    Some(target) if target < i => {
                        return Err(ClinsimError::config(format!(
                            "phase '{}' branch '{}' targets earlier phase '{}'; \
                             transitions only move forward",
                            phase.id, branch.condition, branch.next_phase
                        )));
                    }
                    Some(_) => {}
                }
            }
            if let Some(disposition) = phase.initial_disposition {
                if !(0.0..=1.0).contains(&disposition) {
                    return Err(ClinsimError::config(format!(
                        "phase '{}' initial disposition {} outside [0, 1]",
                        phase.id, disposition
                    )));
                }
            }
        }

        let tracking = &self.emotional_tracking;
        let mut previous_cut = tracking.scale_min;
        for threshold in &tracking.thresholds {
            if threshold.cut < previous_cut || threshold.cut > tracking.scale_max {
                return Err(ClinsimError::config(format!(
                    "emotional threshold '{}' cut {} is out of order or out of bounds",
                    threshold.label, threshold.cut
                )));
            }
            previous_cut = threshold.cut;
        }

        for (name, hooks) in [
            ("empathy", &self.assessment.empathy),
            ("clarity", &self.assessment.clarity),
            ("accountability", &self.assessment.accountability),
        ] {
            if hooks.weight < 0.0 {
                return Err(ClinsimError::config(format!(
                    "negative weight for assessment dimension '{}'",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// Loads and validates a vignette from a TOML file on disk.
pub fn load_vignette(path: impl AsRef<Path>) -> Result<Vignette> {
    let content = std::fs::read_to_string(path)?;
    Vignette::from_toml_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vignette::test_fixtures::sample_vignette_toml;
    use std::io::Write;

    #[test]
    fn parses_first_integer_as_minutes() {
        assert_eq!(parse_duration_minutes("5 minutes"), Some(5));
        assert_eq!(parse_duration_minutes("about 10 min"), Some(10));
        assert_eq!(parse_duration_minutes("2-3 minutes"), Some(2));
        assert_eq!(parse_duration_minutes("open ended"), None);
    }

    #[test]
    fn loads_sample_vignette_from_toml() {
        let vignette = Vignette::from_toml_str(&sample_vignette_toml()).unwrap();
        assert_eq!(vignette.phases.len(), 3);
        assert_eq!(vignette.phases[0].id, "opening");
        assert_eq!(vignette.character.name, "Margaret");
    }

    #[test]
    fn rejects_branch_to_unknown_phase() {
        let toml = sample_vignette_toml().replace(
            "next_phase = \"disclosure\"",
            "next_phase = \"no_such_phase\"",
        );
        let err = Vignette::from_toml_str(&toml).unwrap_err();
        assert!(err.is_config(), "expected config error, got {err:?}");
    }

    #[test]
    fn rejects_branch_to_earlier_phase() {
        // Redirect the disclosure phase's empathetic branch backward; the
        // medical_jargon self-loop in the same phase stays legal.
        let toml = sample_vignette_toml().replace(
            "next_phase = \"resolution\"",
            "next_phase = \"opening\"",
        );
        let err = Vignette::from_toml_str(&toml).unwrap_err();
        assert!(err.is_config(), "expected config error, got {err:?}");
        assert!(err.to_string().contains("earlier phase"));
    }

    #[test]
    fn rejects_malformed_duration() {
        let toml = sample_vignette_toml().replace("duration = \"3 minutes\"", "duration = \"short\"");
        let err = Vignette::from_toml_str(&toml).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_vignette_toml().as_bytes()).unwrap();
        let vignette = load_vignette(file.path()).unwrap();
        assert_eq!(vignette.id, "delayed-diagnosis");
    }
}
