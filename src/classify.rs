//! Record classification into routing keys.

use std::fmt::{self, Debug, Display};
use std::hash::Hash;

use crate::record::Record;

/// Maps each record to the key of the destination it belongs to.
///
/// Implementations must be pure: the same record always yields the same
/// key, and every key `classify` can return is listed by `keys`.
pub trait Classifier: Send + Sync + Debug {
    type Key: Eq + Hash + Clone + Debug + Display + Send + Sync;

    /// Every key this classifier can produce.
    fn keys(&self) -> Vec<Self::Key>;

    fn classify(&self, record: &Record) -> Self::Key;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn of(id: i64) -> Self {
        if id % 2 == 0 { Parity::Even } else { Parity::Odd }
    }
}

impl Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parity::Even => write!(f, "EVEN"),
            Parity::Odd => write!(f, "ODD"),
        }
    }
}

/// Routes records by the parity of their id.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParityClassifier;

impl Classifier for ParityClassifier {
    type Key = Parity;

    fn keys(&self) -> Vec<Parity> {
        vec![Parity::Even, Parity::Odd]
    }

    fn classify(&self, record: &Record) -> Parity {
        Parity::of(record.id())
    }
}

/// A classifier backed by a closure over the record's fields.
///
/// The key set is declared up front so routing tables can be checked
/// before any record is read.
pub struct FnClassifier<K, F> {
    keys: Vec<K>,
    f: F,
}

impl<K, F> FnClassifier<K, F>
where
    F: Fn(&Record) -> K,
{
    pub fn new(keys: Vec<K>, f: F) -> Self {
        Self { keys, f }
    }
}

impl<K: Debug, F> Debug for FnClassifier<K, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnClassifier")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

impl<K, F> Classifier for FnClassifier<K, F>
where
    K: Eq + Hash + Clone + Debug + Display + Send + Sync,
    F: Fn(&Record) -> K + Send + Sync,
{
    type Key = K;

    fn keys(&self) -> Vec<K> {
        self.keys.clone()
    }

    fn classify(&self, record: &Record) -> K {
        (self.f)(record)
    }
}
