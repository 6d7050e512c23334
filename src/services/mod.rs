pub mod assembly;
pub mod export;
pub mod generation;
pub mod llm;
pub mod prompts;
pub mod setup;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;
