//! External service adapters: content generation and storefront publication.
//!
//! Both adapters are trait objects so the pipeline can run against stubs in
//! tests. [`generator`] talks to the content generation service;
//! [`publisher`] talks to the storefront admin API.

pub mod generator;
pub mod publisher;

pub use generator::{
    GenerationError, GenerationOutput, GenerationRequest, Generator, HttpGenerator, Stage,
};
pub use publisher::{PublishOutcome, PublishRequest, Publisher, StorefrontClient};
