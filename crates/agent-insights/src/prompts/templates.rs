//! Prompt templates for the stock database and news pipelines

use agent_prompt::{JinjaTemplate, Result};

/// Template name for table selection
pub const SELECT_TABLES: &str = "insights.select_tables";
/// Template name for SQL synthesis
pub const TEXT_TO_SQL: &str = "insights.text_to_sql";
/// Template name for answering from a single table
pub const DATAFRAME_CHAT: &str = "insights.dataframe_chat";
/// Template name for ticker symbol extraction
pub const SYMBOL_LIST: &str = "insights.symbol_list";
/// Template name for answering from news headlines
pub const NEWS_ANSWER: &str = "insights.news_answer";

/// Pick the tables relevant to a request from their summaries
///
/// Variables: `summaries`, `user_request`, `format_instructions`.
pub fn select_tables() -> Result<JinjaTemplate> {
    JinjaTemplate::new(
        SELECT_TABLES,
        r#"Consider the following table summaries, mapping each table name to its columns:
{{ summaries }}

Which tables are the most relevant to answer the following query?
"{{ user_request }}"

Only choose table names that appear in the summaries.
{{ format_instructions }}"#,
    )
}

/// Write SQLite for a question over the summarized tables
///
/// Variables: `summaries`, `user_request`.
pub fn text_to_sql() -> Result<JinjaTemplate> {
    JinjaTemplate::new(
        TEXT_TO_SQL,
        r"Generate a query in valid SQLite that answers the question below, using only the tables whose schemas are summarized here:
{{ summaries }}

Do not assume the values stored in the tables. Always write SQL that queries what is asked instead of answering from memory.
Quote table and column names with double quotes.
The query must be returned in the format:
```sql
query
```

Question: {{ user_request }}",
    )
}

/// Answer a question from one table rendered as text
///
/// Variables: `table_name`, `table`, `user_request`.
pub fn dataframe_chat() -> Result<JinjaTemplate> {
    JinjaTemplate::new(
        DATAFRAME_CHAT,
        r"You are a financial data analyst. The table `{{ table_name }}` contains:

{{ table }}

Answer the following request using only the data in this table. If the table does not contain the information, say so.

Request: {{ user_request }}",
    )
}

/// Extract ticker symbols mentioned in a request
///
/// Variables: `user_request`, `format_instructions`.
pub fn symbol_list() -> Result<JinjaTemplate> {
    JinjaTemplate::new(
        SYMBOL_LIST,
        r#"Extract the stock ticker symbols of every company mentioned in the following request.
Convert company names to their ticker symbols (for example "Apple" becomes "AAPL").
If no company is mentioned, return an empty list.

Request: "{{ user_request }}"

{{ format_instructions }}"#,
    )
}

/// Answer a question from recent news headlines
///
/// Variables: `articles` (list of objects with `symbol`, `title`,
/// `publisher`, `published_at`, `link`), `user_request`.
pub fn news_answer() -> Result<JinjaTemplate> {
    JinjaTemplate::new(
        NEWS_ANSWER,
        r"You are a financial news assistant. Here are recent Yahoo Finance news articles:
{% for article in articles %}
- [{{ article.symbol }}] {{ article.title }} ({{ article.publisher }}{% if article.published_at %}, {{ article.published_at }}{% endif %}) {{ article.link }}
{%- endfor %}

Answer the following question using only these articles. If they do not contain the answer, say that you could not find it in the recent news.

Question: {{ user_request }}",
    )
}
