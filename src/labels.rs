//! Tag classes for MCQ sequence labeling.
//!
//! The schema is `O` followed by a `B-`/`I-` pair for the question and each
//! of the five option slots. Ids are positions in that list.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::sync::LazyLock;

/// Label id as consumed by the training loss (`i64` so the sentinel fits).
pub type LabelId = i64;

/// Tokens carrying this id do not contribute to the loss.
pub const IGNORE_INDEX: LabelId = -100;

pub const OUTSIDE: LabelId = 0;

pub const MAX_OPTIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionKey {
    A,
    B,
    C,
    D,
    E,
}

impl OptionKey {
    pub const ALL: [OptionKey; MAX_OPTIONS] = [
        OptionKey::A,
        OptionKey::B,
        OptionKey::C,
        OptionKey::D,
        OptionKey::E,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    pub fn letter(self) -> char {
        (b'A' + self as u8) as char
    }

    /// Exact single-letter match; anything else is not a recognized key.
    pub fn from_letter(s: &str) -> Option<Self> {
        match s {
            "A" => Some(OptionKey::A),
            "B" => Some(OptionKey::B),
            "C" => Some(OptionKey::C),
            "D" => Some(OptionKey::D),
            "E" => Some(OptionKey::E),
            _ => None,
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A labeled entity class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Question,
    Option(OptionKey),
}

impl Entity {
    pub fn class_name(self) -> String {
        match self {
            Entity::Question => "QUESTION".to_string(),
            Entity::Option(k) => format!("OPTION_{}", k.letter()),
        }
    }

    fn ordinal(self) -> usize {
        match self {
            Entity::Question => 0,
            Entity::Option(k) => 1 + k.index(),
        }
    }

    pub fn all() -> impl Iterator<Item = Entity> {
        std::iter::once(Entity::Question).chain(OptionKey::ALL.into_iter().map(Entity::Option))
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.class_name())
    }
}

/// Fixed five-slot table keyed by option letter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OptionTable<T>([T; MAX_OPTIONS]);

impl<T> OptionTable<T> {
    pub fn iter(&self) -> impl Iterator<Item = (OptionKey, &T)> {
        OptionKey::ALL.into_iter().zip(self.0.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (OptionKey, &mut T)> {
        OptionKey::ALL.into_iter().zip(self.0.iter_mut())
    }
}

impl<T> Index<OptionKey> for OptionTable<T> {
    type Output = T;

    fn index(&self, key: OptionKey) -> &T {
        &self.0[key.index()]
    }
}

impl<T> IndexMut<OptionKey> for OptionTable<T> {
    fn index_mut(&mut self, key: OptionKey) -> &mut T {
        &mut self.0[key.index()]
    }
}

impl<T: Serialize> Serialize for OptionTable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(MAX_OPTIONS))?;
        for (key, value) in self.iter() {
            map.serialize_entry(&key.letter().to_string(), value)?;
        }
        map.end()
    }
}

#[derive(Debug)]
pub struct LabelSchema {
    names: Vec<String>,
    ids: HashMap<String, LabelId>,
}

static SCHEMA: LazyLock<LabelSchema> = LazyLock::new(LabelSchema::build);

/// Process-wide label schema.
pub fn schema() -> &'static LabelSchema {
    &SCHEMA
}

impl LabelSchema {
    fn build() -> Self {
        let mut names = vec!["O".to_string()];
        for entity in Entity::all() {
            names.push(format!("B-{}", entity.class_name()));
            names.push(format!("I-{}", entity.class_name()));
        }
        let ids = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i as LabelId))
            .collect();
        Self { names, ids }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn id(&self, name: &str) -> Option<LabelId> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: LabelId) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
    }

    pub fn begin(&self, entity: Entity) -> LabelId {
        1 + 2 * entity.ordinal() as LabelId
    }

    pub fn inside(&self, entity: Entity) -> LabelId {
        2 + 2 * entity.ordinal() as LabelId
    }
}
