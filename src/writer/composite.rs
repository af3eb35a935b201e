//! Classifier-routed composite writer.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::classify::Classifier;
use crate::error::{AggregateError, BatchError, Result, Stage};
use crate::item::{ItemStream, ItemWriter, OutputSummary};
use crate::record::Record;

/// Calls one of a set of writers for each record, chosen by a classifier.
///
/// The routing table is checked against `Classifier::keys` at construction
/// and is read-only afterwards. All delegates share one lifecycle: they are
/// opened, flushed, committed, rolled back and closed together, in
/// registration order. A chunk commits on no delegate until every delegate
/// has flushed it; after a failed flush, `rollback` removes the chunk from
/// the delegates that already flushed.
#[derive(Debug)]
pub struct ClassifierCompositeWriter<C: Classifier> {
    name: String,
    classifier: C,
    writers: Vec<(C::Key, Box<dyn ItemWriter>)>,
    routes: HashMap<C::Key, usize>,
}

impl<C: Classifier> ClassifierCompositeWriter<C> {
    /// Build the composite from a routing table.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::UnroutableRecord`] if the classifier can produce
    /// a key with no writer, and [`BatchError::Config`] if a key is
    /// registered twice.
    pub fn new<I>(classifier: C, writers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (C::Key, Box<dyn ItemWriter>)>,
    {
        let writers: Vec<_> = writers.into_iter().collect();
        let mut routes = HashMap::with_capacity(writers.len());
        for (i, (key, _)) in writers.iter().enumerate() {
            if routes.insert(key.clone(), i).is_some() {
                return Err(BatchError::config(format!(
                    "classification key '{key}' has more than one writer"
                )));
            }
        }

        for key in classifier.keys() {
            if !routes.contains_key(&key) {
                return Err(BatchError::UnroutableRecord {
                    key: key.to_string(),
                });
            }
        }

        Ok(Self {
            name: "classifier-composite".into(),
            classifier,
            writers,
            routes,
        })
    }

    /// Set the name used in logs and error messages.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Registered keys, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &C::Key> {
        self.writers.iter().map(|(key, _)| key)
    }

    pub fn writer(&self, key: &C::Key) -> Option<&dyn ItemWriter> {
        self.routes.get(key).map(|&i| self.writers[i].1.as_ref())
    }

    fn close_all(&mut self) -> AggregateError {
        let mut errors = AggregateError::default();
        for (key, writer) in self.writers.iter_mut() {
            if let Err(e) = writer.close() {
                warn!(writer = writer.name(), %key, error = %e, "failed to close writer");
                errors.absorb(Stage::Close, writer.name(), e);
            }
        }
        errors
    }
}

impl<C: Classifier> ItemStream for ClassifierCompositeWriter<C> {
    fn open(&mut self) -> Result<()> {
        for i in 0..self.writers.len() {
            if let Err(e) = self.writers[i].1.open() {
                // release the ones already opened before reporting
                for (_, writer) in self.writers[..i].iter_mut() {
                    if let Err(close_err) = writer.close() {
                        warn!(
                            writer = writer.name(),
                            error = %close_err,
                            "failed to close writer after open failure"
                        );
                    }
                }
                return Err(e);
            }
        }
        debug!(writer = %self.name, destinations = self.writers.len(), "opened all destinations");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.close_all().into_result()
    }
}

impl<C: Classifier> ItemWriter for ClassifierCompositeWriter<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, record: &Record) -> Result<()> {
        let key = self.classifier.classify(record);
        match self.routes.get(&key) {
            Some(&i) => self.writers[i].1.write(record),
            None => Err(BatchError::UnroutableRecord {
                key: key.to_string(),
            }),
        }
    }

    fn flush(&mut self) -> Result<()> {
        for (_, writer) in self.writers.iter_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    fn commit(&mut self) {
        for (_, writer) in self.writers.iter_mut() {
            writer.commit();
        }
    }

    fn rollback(&mut self) {
        for (_, writer) in self.writers.iter_mut() {
            writer.rollback();
        }
    }

    fn outputs(&self) -> Vec<OutputSummary> {
        self.writers
            .iter()
            .flat_map(|(_, writer)| writer.outputs())
            .collect()
    }
}
