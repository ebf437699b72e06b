//! Ticker symbol extraction and news-grounded answers

use crate::context::InsightsContext;
use crate::error::{InsightsError, Result};
use crate::prompts::{NEWS_ANSWER, SYMBOL_LIST};
use agent_llm::{StructuredOutput, format_instructions};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

/// Structured reply of the symbol extraction prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolList {
    pub symbol_list: Vec<String>,
}

impl StructuredOutput for SymbolList {
    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol_list": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "List of stock ticker symbols mentioned in the request"
                }
            },
            "required": ["symbol_list"]
        })
    }
}

/// Answer grounded in news articles, with the links it was given
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsAnswer {
    pub answer: String,
    pub url_list: Vec<String>,
}

/// Extract the ticker symbols a request mentions, upper-cased and deduplicated
#[instrument(skip(ctx))]
pub async fn retrieve_symbol_list(ctx: &InsightsContext, user_request: &str) -> Result<Vec<String>> {
    let prompt = ctx.render(
        SYMBOL_LIST,
        &json!({
            "user_request": user_request,
            "format_instructions": format_instructions::<SymbolList>(),
        }),
    )?;
    let reply: SymbolList = ctx.complete_structured(prompt).await?;

    let mut symbols: Vec<String> = Vec::new();
    for symbol in reply.symbol_list {
        let symbol = symbol.trim().to_uppercase();
        if !symbol.is_empty() && !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    info!(symbols = ?symbols, "Retrieved symbols");
    Ok(symbols)
}

/// Answer `user_request` from recent Yahoo Finance news about `symbols`
///
/// A symbol whose news cannot be fetched is skipped with a warning.
#[instrument(skip(ctx))]
pub async fn scrape_yahoo_finance_news(
    ctx: &InsightsContext,
    user_request: &str,
    symbols: &[String],
) -> Result<NewsAnswer> {
    if symbols.is_empty() {
        return Err(InsightsError::ValueError(
            "symbol_list must contain at least one symbol".to_string(),
        ));
    }

    let mut articles = Vec::new();
    let mut url_list: Vec<String> = Vec::new();
    for symbol in symbols {
        match ctx.market_data().news(symbol, ctx.config().news_count).await {
            Ok(found) => {
                for article in found {
                    if !url_list.contains(&article.link) {
                        url_list.push(article.link.clone());
                    }
                    articles.push(json!({
                        "symbol": symbol,
                        "title": article.title,
                        "publisher": article.publisher.unwrap_or_default(),
                        "published_at": article.published_at,
                        "link": article.link,
                    }));
                }
            },
            Err(e) => warn!(symbol = %symbol, error = %e, "Failed to fetch news"),
        }
    }
    info!(articles = articles.len(), urls = url_list.len(), "Collected news");

    let prompt = ctx.render(
        NEWS_ANSWER,
        &json!({ "articles": articles, "user_request": user_request }),
    )?;
    let answer = ctx.complete(prompt).await?;

    Ok(NewsAnswer { answer, url_list })
}

/// Resolve symbols from the question, then answer it from their news
pub async fn handle_news_question(ctx: &InsightsContext, question: &str) -> Result<NewsAnswer> {
    let symbols = retrieve_symbol_list(ctx, question).await?;
    if symbols.is_empty() {
        return Err(InsightsError::ValueError(format!(
            "No ticker symbols found in question: {question}"
        )));
    }
    scrape_yahoo_finance_news(ctx, question, &symbols).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedProvider, context_with};

    #[tokio::test]
    async fn test_retrieve_symbol_list_normalizes() {
        let provider = ScriptedProvider::new(vec![r#"{"symbol_list": ["aapl", " MSFT", "AAPL", ""]}"#]);
        let (_dir, ctx) = context_with(provider.clone(), &[]);

        let symbols = retrieve_symbol_list(&ctx, "Compare Apple and Microsoft").await.unwrap();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);
        assert!(provider.prompts()[0].contains("symbol_list"));
    }

    #[tokio::test]
    async fn test_scrape_news_collects_unique_urls() {
        let provider = ScriptedProvider::new(vec!["Apple announced new products."]);
        let (_dir, ctx) = context_with(provider.clone(), &[]);

        let answer = scrape_yahoo_finance_news(
            &ctx,
            "What is new with Apple?",
            &["AAPL".to_string(), "FAIL".to_string(), "AAPL".to_string()],
        )
        .await
        .unwrap();

        assert_eq!(answer.answer, "Apple announced new products.");
        assert_eq!(
            answer.url_list,
            vec![
                "https://finance.yahoo.com/news/aapl-0.html",
                "https://finance.yahoo.com/news/aapl-1.html",
            ]
        );
        assert!(provider.prompts()[0].contains("[AAPL] AAPL headline 0 (Reuters)"));
    }

    #[tokio::test]
    async fn test_scrape_news_requires_symbols() {
        let provider = ScriptedProvider::new(vec![]);
        let (_dir, ctx) = context_with(provider.clone(), &[]);

        let result = scrape_yahoo_finance_news(&ctx, "anything", &[]).await;
        assert!(matches!(result, Err(InsightsError::ValueError(_))));
        assert!(provider.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_handle_news_question() {
        let provider = ScriptedProvider::new(vec![
            r#"{"symbol_list": ["MSFT"]}"#,
            "Microsoft news summary.",
        ]);
        let (_dir, ctx) = context_with(provider, &[]);

        let answer = handle_news_question(&ctx, "Any news on Microsoft?").await.unwrap();
        assert_eq!(answer.url_list.len(), 2);
        assert_eq!(answer.answer, "Microsoft news summary.");
    }

    #[tokio::test]
    async fn test_handle_news_question_without_symbols() {
        let provider = ScriptedProvider::new(vec![r#"{"symbol_list": []}"#]);
        let (_dir, ctx) = context_with(provider, &[]);

        let result = handle_news_question(&ctx, "How is the weather?").await;
        assert!(matches!(result, Err(InsightsError::ValueError(_))));
    }
}
