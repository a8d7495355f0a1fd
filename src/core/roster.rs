//! Human-readable agent labels.
//!
//! The engine works on dense integer ids. Inputs written by hand usually
//! name agents instead (`"A"`, `"MIT"`), so this module maps labels onto
//! ids and back again.

use crate::core::agent::{InstitutionId, Side, StudentId};
use crate::core::preference::{InvalidPreferenceError, PreferenceModel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A label and its preference list, itself a list of labels.
pub type LabelledList = (String, Vec<String>);

/// Preference tables keyed by agent label.
///
/// In JSON each side is an object from label to list. Entries are kept as
/// read, repeated labels included, so that [`NamedPreferences::into_model`]
/// can reject them. Agents are assigned ids in ascending label order on
/// each side.
///
/// # Examples
///
/// ```
/// use stable_matching::core::agent::StudentId;
/// use stable_matching::core::roster::NamedPreferences;
///
/// let named = NamedPreferences::from_lists(
///     [("ann", vec!["east", "west"]), ("bo", vec!["west", "east"])],
///     [("east", vec!["bo", "ann"]), ("west", vec!["ann", "bo"])],
/// );
/// let (model, roster) = named.into_model().unwrap();
/// assert_eq!(model.student_count(), 2);
/// assert_eq!(roster.student_label(StudentId::new(0)), Some("ann"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedPreferences {
    #[serde(with = "entries_serde")]
    pub students: Vec<LabelledList>,
    #[serde(with = "entries_serde")]
    pub institutions: Vec<LabelledList>,
}

mod entries_serde {
    use super::LabelledList;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use std::fmt;

    pub fn serialize<S: serde::Serializer>(
        entries: &[LabelledList],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (label, list) in entries {
            map.serialize_entry(label, list)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<LabelledList>, D::Error> {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = Vec<LabelledList>;
            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map from agent label to a list of labels")
            }
            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, Vec<String>>()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }
        deserializer.deserialize_map(V)
    }
}

impl NamedPreferences {
    pub fn from_lists<S, I, L, N>(students: S, institutions: I) -> Self
    where
        S: IntoIterator<Item = (N, L)>,
        I: IntoIterator<Item = (N, L)>,
        L: IntoIterator<Item = N>,
        N: Into<String>,
    {
        fn collect<N: Into<String>, L: IntoIterator<Item = N>>(
            rows: impl IntoIterator<Item = (N, L)>,
        ) -> Vec<LabelledList> {
            rows.into_iter()
                .map(|(name, list)| (name.into(), list.into_iter().map(Into::into).collect()))
                .collect()
        }
        Self {
            students: collect(students),
            institutions: collect(institutions),
        }
    }

    /// Resolve labels to ids and validate the result.
    ///
    /// Fails with `DuplicateAgent` if a label appears twice on one side and
    /// with `UnknownAgent` if a list names someone absent from the other side.
    pub fn into_model(mut self) -> Result<(PreferenceModel, Roster), InvalidPreferenceError> {
        self.students.sort_by(|a, b| a.0.cmp(&b.0));
        self.institutions.sort_by(|a, b| a.0.cmp(&b.0));

        let roster = Roster::new(labels(&self.students), labels(&self.institutions))?;

        let students = resolve(Side::Students, &self.students, &roster.institution_index)?;
        let institutions = resolve(Side::Institutions, &self.institutions, &roster.student_index)?;
        let model = PreferenceModel::build(students, institutions)?;
        Ok((model, roster))
    }
}

fn labels(entries: &[LabelledList]) -> Vec<String> {
    entries.iter().map(|(label, _)| label.clone()).collect()
}

fn resolve(
    side: Side,
    entries: &[LabelledList],
    opposite: &HashMap<String, usize>,
) -> Result<Vec<Vec<usize>>, InvalidPreferenceError> {
    entries
        .iter()
        .map(|(agent, list)| {
            list.iter()
                .map(|name| {
                    opposite.get(name).copied().ok_or_else(|| InvalidPreferenceError::UnknownAgent {
                        side: side.opposite(),
                        name: name.clone(),
                        listed_by: agent.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}

/// Bidirectional mapping between agent ids and labels for both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    students: Vec<String>,
    institutions: Vec<String>,
    student_index: HashMap<String, usize>,
    institution_index: HashMap<String, usize>,
}

impl Roster {
    /// Build a roster from labels listed in id order.
    pub fn new(students: Vec<String>, institutions: Vec<String>) -> Result<Self, InvalidPreferenceError> {
        let student_index = index(Side::Students, &students)?;
        let institution_index = index(Side::Institutions, &institutions)?;
        Ok(Self {
            students,
            institutions,
            student_index,
            institution_index,
        })
    }

    /// Label every agent by its numeric id.
    pub fn indexed(student_count: usize, institution_count: usize) -> Self {
        let students: Vec<String> = (0..student_count).map(|i| i.to_string()).collect();
        let institutions: Vec<String> = (0..institution_count).map(|i| i.to_string()).collect();
        let student_index = students.iter().cloned().zip(0..).collect();
        let institution_index = institutions.iter().cloned().zip(0..).collect();
        Self {
            students,
            institutions,
            student_index,
            institution_index,
        }
    }

    pub fn student_label(&self, student: StudentId) -> Option<&str> {
        self.students.get(student.index()).map(String::as_str)
    }

    pub fn institution_label(&self, institution: InstitutionId) -> Option<&str> {
        self.institutions.get(institution.index()).map(String::as_str)
    }

    pub fn student_id(&self, label: &str) -> Option<StudentId> {
        self.student_index.get(label).copied().map(StudentId::new)
    }

    pub fn institution_id(&self, label: &str) -> Option<InstitutionId> {
        self.institution_index.get(label).copied().map(InstitutionId::new)
    }

    pub fn student_count(&self) -> usize {
        self.students.len()
    }

    pub fn institution_count(&self) -> usize {
        self.institutions.len()
    }
}

fn index(side: Side, labels: &[String]) -> Result<HashMap<String, usize>, InvalidPreferenceError> {
    let mut map = HashMap::with_capacity(labels.len());
    for (id, label) in labels.iter().enumerate() {
        if map.insert(label.clone(), id).is_some() {
            return Err(InvalidPreferenceError::DuplicateAgent {
                side,
                name: label.clone(),
            });
        }
    }
    Ok(map)
}
