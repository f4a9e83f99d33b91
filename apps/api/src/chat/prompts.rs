// Chat prompt templates.
// Placeholders are `{name}` and are filled with `str::replace`.

/// Table the model is told to query.
pub const CUSTOMER_TABLE: &str = "customer_data";

pub const SQL_GENERATION_TEMPLATE: &str = r#"I have a customer database with the following schema:
{schema_json}

When generating SQL queries:
- Use the table name '{table}'
- Follow the exact column names from the schema
- For customer name searches, use case-insensitive pattern matching with: LOWER(customer_name) LIKE LOWER('%search_term%')
- Return only the SQL query without additional explanation unless specifically asked

For example, if searching for a customer named "westmount", the WHERE clause should be:
WHERE LOWER(customer_name) LIKE LOWER('%westmount%')

User question: {question}"#;

pub const SUMMARY_TEMPLATE: &str = r#"Based on the user's question: "{question}"

Here are the query results:
{results_json}

Please provide a natural language analysis of these results. {persona}"#;

pub const FOLLOW_UP_TEMPLATE: &str = r#"Previous interaction:
Previous question: {previous_question}
Previous response: {previous_response}
Previous query details: {previous_query_info}

User follow-up question: {question}

Answer the follow-up question based on the previous interaction. {persona}"#;

pub const FOLLOW_UP_WITHOUT_CONTEXT_TEMPLATE: &str =
    "User follow-up question (no previous context available): {question}";

pub const QUERY_INFO_TEMPLATE: &str = r#"Query Results:
{results_json}

SQL Query Used:
{sql}"#;

/// The earlier exchange a follow-up question is answered against.
#[derive(Debug, Clone, Copy)]
pub struct PriorExchange<'a> {
    pub question: &'a str,
    pub response: &'a str,
    pub query_info: &'a str,
}

/// First call: ask the model for a single SQL statement answering `question`.
pub fn render_sql_generation(schema_json: &str, question: &str) -> String {
    SQL_GENERATION_TEMPLATE
        .replace("{schema_json}", schema_json)
        .replace("{table}", CUSTOMER_TABLE)
        .replace("{question}", question)
}

/// Second call: ask the model to narrate the rows the query returned.
pub fn render_summary(question: &str, results_json: &str, persona: &str) -> String {
    SUMMARY_TEMPLATE
        .replace("{question}", question)
        .replace("{results_json}", results_json)
        .replace("{persona}", persona)
}

pub fn render_follow_up(prior: Option<PriorExchange<'_>>, question: &str, persona: &str) -> String {
    match prior {
        Some(prior) => FOLLOW_UP_TEMPLATE
            .replace("{previous_question}", prior.question)
            .replace("{previous_response}", prior.response)
            .replace("{previous_query_info}", prior.query_info)
            .replace("{question}", question)
            .replace("{persona}", persona),
        None => FOLLOW_UP_WITHOUT_CONTEXT_TEMPLATE.replace("{question}", question),
    }
}

/// The denormalized blob stored on an assistant turn alongside its answer.
pub fn render_query_info(results_json: &str, sql: &str) -> String {
    QUERY_INFO_TEMPLATE
        .replace("{results_json}", results_json)
        .replace("{sql}", sql)
}
