pub mod completion_provider;
pub mod embedding_provider;
pub mod event_sink;

pub use completion_provider::CompletionProvider;
pub use embedding_provider::EmbeddingProvider;
pub use event_sink::{RunEventSink, TracingEventSink};
