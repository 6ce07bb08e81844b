mod async_openai_provider;

pub use async_openai_provider::AsyncOpenAiProvider;
