//! Builder wiring a data source, classifier and writers into a [`Job`].

use std::sync::Arc;

use crate::classify::{Classifier, ParityClassifier};
use crate::config::BatchConfig;
use crate::error::{BatchError, Result};
use crate::format::{LineFormat, line_format};
use crate::io::OutputResolver;
use crate::item::{ItemStream, ItemWriter};
use crate::job::Job;
use crate::reader::PagingReader;
use crate::record::RowMapper;
use crate::source::{DataSource, PageQuery};
use crate::step::ChunkStep;
use crate::writer::{ClassifierCompositeWriter, FlatFileWriter};

/// Explicit composition of one batch job.
///
/// Builds, in order: the paging reader over the data source, one flat file
/// writer per classification key, the composite writer routing between
/// them, the chunk step, and the job holding that step.
pub struct BatchBuilder {
    config: BatchConfig,
    source: Option<Arc<dyn DataSource>>,
    resolver: Option<Arc<dyn OutputResolver>>,
    format: Option<Arc<dyn LineFormat>>,
    mapper: Option<Box<dyn RowMapper>>,
    streams: Vec<Box<dyn ItemStream>>,
}

impl BatchBuilder {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            source: None,
            resolver: None,
            format: None,
            mapper: None,
            streams: Vec::new(),
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn with_source(mut self, source: Arc<dyn DataSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Override the resolver derived from `config.output`.
    pub fn with_resolver(mut self, resolver: Arc<dyn OutputResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Override the line format derived from `config.format`.
    pub fn with_format(mut self, format: Arc<dyn LineFormat>) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_mapper(mut self, mapper: Box<dyn RowMapper>) -> Self {
        self.mapper = Some(mapper);
        self
    }

    /// Register a standalone stream opened and closed with the step.
    pub fn add_stream(mut self, stream: Box<dyn ItemStream>) -> Self {
        self.streams.push(stream);
        self
    }

    /// Build the reference job, routing records by id parity.
    pub fn build(self) -> Result<Job> {
        self.build_with(ParityClassifier)
    }

    /// Build a job routing records with `classifier`, one destination per
    /// key it declares.
    pub fn build_with<C>(self, classifier: C) -> Result<Job>
    where
        C: Classifier + 'static,
    {
        self.config.validate()?;

        let source = self
            .source
            .ok_or_else(|| BatchError::config("no data source configured"))?;
        let resolver = self.resolver.unwrap_or_else(|| self.config.output.resolver());
        let format = match self.format {
            Some(format) => format,
            None => line_format(self.config.format, self.config.delimiter)?,
        };

        let query = PageQuery::customer(self.config.table.clone(), self.config.fetch_size);
        let mut reader = PagingReader::new(source, query)?;
        if let Some(mapper) = self.mapper {
            reader = reader.with_mapper(mapper);
        }

        let writers = classifier.keys().into_iter().map(|key| {
            let writer = FlatFileWriter::new(key.to_string(), resolver.clone(), format.clone())
                .with_file_exists_policy(self.config.file_exists_policy);
            (key, Box::new(writer) as Box<dyn ItemWriter>)
        });
        let composite = ClassifierCompositeWriter::new(classifier, writers)?;

        let mut step = ChunkStep::new(
            self.config.step_name.clone(),
            self.config.chunk_size,
            Box::new(reader),
            Box::new(composite),
        )?;
        for stream in self.streams {
            step = step.with_stream(stream);
        }

        Ok(Job::new(self.config.job_name.clone()).step(Box::new(step)))
    }
}

impl Default for BatchBuilder {
    fn default() -> Self {
        BatchBuilder::new(BatchConfig::default())
    }
}
