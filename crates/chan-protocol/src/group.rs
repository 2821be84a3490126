//! Channel groups merged by the combiner

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the two channel sets feeding the combiner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Group {
    /// Channels `0..lower_count` of the merged index space
    Lower,
    /// Channels `lower_count..lower_count + upper_count`
    Upper,
}

impl Group {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lower => "lower",
            Self::Upper => "upper",
        }
    }

    /// The group served after this one
    pub fn other(&self) -> Self {
        match self {
            Self::Lower => Self::Upper,
            Self::Upper => Self::Lower,
        }
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
