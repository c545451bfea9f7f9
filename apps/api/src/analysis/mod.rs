// Resume analysis: prompt the model, extract the JSON reply, label the
// outcome, spend credits and persist on request.
// All model calls go through llm_client.

pub mod analyzer;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod reply;
