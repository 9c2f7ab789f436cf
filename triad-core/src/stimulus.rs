use std::collections::HashSet;
use std::ops::Index;
use std::path::{Path, PathBuf};

pub use string_cache::DefaultAtom as Atom;

use crate::ExperimentError;

/// An image shown to the participant. The core only ever looks at `id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stimulus {
    id: Atom,
    path: PathBuf,
}

impl Stimulus {
    /// Identifier is the file stem: `img/img3.png` becomes `img3`.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, ExperimentError> {
        let path = path.into();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ExperimentError::invalid(format!(
                    "stimulus path {} has no usable file name",
                    path.display()
                ))
            })?;

        Ok(Self {
            id: Atom::from(stem),
            path,
        })
    }

    pub fn id(&self) -> &Atom {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Ordered stimulus list with unique identifiers.
#[derive(Debug, Clone, Default)]
pub struct StimulusSet {
    items: Vec<Stimulus>,
}

impl StimulusSet {
    pub fn new(items: Vec<Stimulus>) -> Result<Self, ExperimentError> {
        let mut seen = HashSet::with_capacity(items.len());
        for stim in &items {
            if !seen.insert(stim.id.clone()) {
                return Err(ExperimentError::invalid(format!(
                    "duplicate stimulus identifier '{}'",
                    stim.id
                )));
            }
        }
        Ok(Self { items })
    }

    pub fn from_paths<I, P>(paths: I) -> Result<Self, ExperimentError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let items = paths
            .into_iter()
            .map(Stimulus::from_path)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(items)
    }

    /// Expands `{i}` in `template` for i = 1..=count.
    pub fn from_template(template: &str, count: usize) -> Result<Self, ExperimentError> {
        if !template.contains("{i}") {
            return Err(ExperimentError::invalid(format!(
                "stimulus template '{template}' has no {{i}} placeholder"
            )));
        }
        Self::from_paths((1..=count).map(|i| template.replace("{i}", &i.to_string())))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Stimulus> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stimulus> {
        self.items.iter()
    }
}

impl Index<usize> for StimulusSet {
    type Output = Stimulus;

    fn index(&self, index: usize) -> &Stimulus {
        &self.items[index]
    }
}

impl<'a> IntoIterator for &'a StimulusSet {
    type Item = &'a Stimulus;
    type IntoIter = std::slice::Iter<'a, Stimulus>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
