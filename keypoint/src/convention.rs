//! Named joint orderings.

use crate::{common::*, error::ConventionError};

static BUILTIN_TABLE_TEXT: &str = include_str!("../conventions.json5");

static BUILTIN_TABLE: Lazy<ConventionTable> = Lazy::new(|| {
    ConventionTable::from_json5_str(BUILTIN_TABLE_TEXT).unwrap()
});

/// A named joint ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Convention {
    name: String,
    joints: IndexSet<String>,
}

impl Convention {
    pub fn new<I, S>(name: impl Into<String>, joints: I) -> Result<Self, ConventionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let mut set = IndexSet::new();

        for joint in joints {
            let joint = joint.into();
            if set.contains(&joint) {
                return Err(ConventionError::DuplicateJoint {
                    convention: name,
                    joint,
                });
            }
            set.insert(joint);
        }

        if set.is_empty() {
            return Err(ConventionError::EmptyConvention(name));
        }

        Ok(Self { name, joints: set })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_joints(&self) -> usize {
        self.joints.len()
    }

    pub fn joints(&self) -> impl Iterator<Item = &str> {
        self.joints.iter().map(|joint| joint.as_str())
    }

    pub fn index_of(&self, joint: &str) -> Option<usize> {
        self.joints.get_index_of(joint)
    }
}

/// The collection of known conventions, keyed by name.
///
/// The table is plain data. It is either the copy bundled with this crate or
/// a JSON5 file mapping each convention name to its ordered joint names.
#[derive(Debug, Clone)]
pub struct ConventionTable {
    conventions: IndexMap<String, Convention>,
}

impl ConventionTable {
    /// The table bundled with this crate.
    pub fn builtin() -> &'static Self {
        &BUILTIN_TABLE
    }

    pub fn open<P>(path: P) -> Result<Self, ConventionError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConventionError::Io {
            path: path.to_owned(),
            source,
        })?;
        let table = Self::from_json5_str(&text)?;
        debug!(
            "loaded {} keypoint conventions from '{}'",
            table.conventions.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_json5_str(text: &str) -> Result<Self, ConventionError> {
        let raw: IndexMap<String, Vec<String>> = json5::from_str(text)?;
        let conventions: IndexMap<_, _> = raw
            .into_iter()
            .map(|(name, joints)| {
                let convention = Convention::new(name.clone(), joints)?;
                Ok((name, convention))
            })
            .collect::<Result<_, ConventionError>>()?;
        Ok(Self { conventions })
    }

    pub fn get(&self, name: &str) -> Result<&Convention, ConventionError> {
        self.conventions
            .get(name)
            .ok_or_else(|| ConventionError::UnknownConvention(name.to_owned()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.conventions.keys().map(|name| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_joint_counts() {
        let table = ConventionTable::builtin();
        let counts: Vec<_> = ["mpi_inf_3dhp", "mpi_inf_3dhp_test", "smpl", "smplx"]
            .iter()
            .map(|name| table.get(name).unwrap().num_joints())
            .collect();
        assert_eq!(counts, [28, 17, 45, 144]);
    }

    #[test]
    fn builtin_root_joints() {
        let table = ConventionTable::builtin();
        let train = table.get("mpi_inf_3dhp").unwrap();
        let test = table.get("mpi_inf_3dhp_test").unwrap();
        assert_eq!(train.index_of("pelvis_extra"), Some(4));
        assert_eq!(test.index_of("pelvis_extra"), Some(14));
    }

    #[test]
    fn unknown_convention() {
        let err = ConventionTable::builtin().get("h36m").unwrap_err();
        assert!(matches!(err, ConventionError::UnknownConvention(name) if name == "h36m"));
    }

    #[test]
    fn duplicate_joint_is_rejected() {
        let text = r#"{ broken: ["head", "neck", "head"] }"#;
        let err = ConventionTable::from_json5_str(text).unwrap_err();
        assert!(matches!(err, ConventionError::DuplicateJoint { joint, .. } if joint == "head"));
    }

    #[test]
    fn empty_convention_is_rejected() {
        let err = ConventionTable::from_json5_str("{ nothing: [] }").unwrap_err();
        assert!(matches!(err, ConventionError::EmptyConvention(_)));
    }
}
