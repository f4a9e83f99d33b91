// Natural-language questions over `customer_data`, answered through the LLM client.

pub mod executor;
pub mod handlers;
pub mod prompts;
pub mod schema;
pub mod service;
pub mod sql_extract;
pub mod store;

#[cfg(test)]
pub mod testing;
