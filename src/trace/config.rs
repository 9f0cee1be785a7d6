//! Tracer configuration
//!
//! Holds the resolved values a [`TracerProvider`] consumes. How the values
//! are obtained (CLI, environment, config files) is the embedding
//! application's concern.
//!
//! [`TracerProvider`]: crate::trace::TracerProvider

use crate::trace::{IdGenerator, RandomIdGenerator, Sampler, ShouldSample};
use std::borrow::Cow;

/// Default service identity when the embedding application provides none.
const DEFAULT_SERVICE_NAME: &str = "unknown_service";

/// Tracer configuration.
#[derive(Debug)]
#[non_exhaustive]
pub struct Config {
    /// The sampler consulted for new root spans.
    pub sampler: Box<dyn ShouldSample>,

    /// The generator for trace and span ids.
    pub id_generator: Box<dyn IdGenerator>,

    /// Identity label of the service producing spans, attached to every
    /// exported record.
    pub service_name: Cow<'static, str>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sampler: Box::new(Sampler::AlwaysOn),
            id_generator: Box::<RandomIdGenerator>::default(),
            service_name: Cow::Borrowed(DEFAULT_SERVICE_NAME),
        }
    }
}
