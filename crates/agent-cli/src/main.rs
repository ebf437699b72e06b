//! Financial insights CLI
//!
//! # Usage
//!
//! ```bash
//! export OPENAI_API_KEY="..."
//!
//! fin-insights create-db --symbols AAPL,MSFT --start 2024-01-01 --end 2024-06-30
//! fin-insights query "What was the highest close of AAPL?" --symbols AAPL
//! fin-insights news "What is going on with Nvidia?"
//! fin-insights qa "How did revenue change?" --documents filings.json
//! fin-insights invoke retrieve_symbol_list --args '{"user_request": "Apple vs Microsoft"}'
//! ```

mod cli;
mod output;

use agent_insights::tools::{CREATE_STOCK_DATABASE, parse_symbol_list, register_tools};
use agent_insights::{
    InsightsConfig, InsightsContext, QueryMethod, YahooMarketData, handle_news_question, query_dataframe_chat,
    query_text_to_sql,
};
use agent_llm::LLMProvider;
use agent_llm::providers::{OpenAIConfig, OpenAIProvider};
use agent_retrieval::{DocumentQaTool, RetrievalQa};
use agent_tools::ToolRegistry;
use agent_utils::{AppConfig, LogFormat};
use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, DEFAULT_CONFIG_PATH};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::from_file(path).with_context(|| format!("loading {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            AppConfig::from_file(DEFAULT_CONFIG_PATH).context("loading default config")
        },
        None => {
            debug!("No config file, using defaults");
            Ok(AppConfig::default())
        },
    }
}

fn build_provider(app: &AppConfig) -> anyhow::Result<Arc<dyn LLMProvider>> {
    let config = OpenAIConfig::new(app.llm.api_key.clone().unwrap_or_default())
        .with_api_base(app.llm.api_base.clone())
        .with_timeout(app.llm.timeout_secs);
    Ok(Arc::new(OpenAIProvider::with_config(config)?))
}

fn build_context(app: &AppConfig, provider: Arc<dyn LLMProvider>) -> anyhow::Result<InsightsContext> {
    let config = InsightsConfig::from_app_config(app)?;
    let market = Arc::new(YahooMarketData::new(&config)?);
    Ok(InsightsContext::new(provider, market, config)?)
}

fn build_registry(app: &AppConfig, provider: Arc<dyn LLMProvider>) -> anyhow::Result<ToolRegistry> {
    let ctx = Arc::new(build_context(app, provider.clone())?);
    let qa = Arc::new(RetrievalQa::from_app_config(provider, app)?);

    let registry = ToolRegistry::new();
    register_tools(&registry, ctx);
    registry.register(Arc::new(DocumentQaTool::new(qa)));
    Ok(registry)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    agent_utils::init_tracing_with(if cli.log_json { LogFormat::Json } else { LogFormat::Pretty });

    let app = load_config(cli.config.as_deref())?;
    let provider = build_provider(&app)?;
    info!(model = %app.llm.model, api_base = %app.llm.api_base, "Starting fin-insights");

    match cli.command {
        Commands::CreateDb { symbols, start, end } => {
            let registry = build_registry(&app, provider)?;
            let created = registry
                .invoke(
                    CREATE_STOCK_DATABASE,
                    json!({ "symbol_list": symbols, "start_date": start, "end_date": end }),
                )
                .await?;
            let tables: BTreeMap<String, Vec<String>> = serde_json::from_value(created)?;
            println!("{}", output::table_map_table(&tables));
        },
        Commands::Query { request, symbols, method } => {
            let symbols = parse_symbol_list(&json!(symbols))?;
            let method: QueryMethod = method.parse()?;
            let ctx = build_context(&app, provider)?;
            match method {
                QueryMethod::TextToSql => {
                    let response = query_text_to_sql(&ctx, &request, &symbols).await?;
                    output::print_sql_response(&response);
                },
                QueryMethod::DataframeChat => {
                    let answers = query_dataframe_chat(&ctx, &request, &symbols).await?;
                    output::print_table_answers(&answers);
                },
            }
        },
        Commands::News { question } => {
            let ctx = build_context(&app, provider)?;
            let answer = handle_news_question(&ctx, &question).await?;
            println!("{}", answer.answer);
            output::print_sources(&answer.url_list);
        },
        Commands::Qa { question, documents } => {
            let content = std::fs::read_to_string(&documents)
                .with_context(|| format!("reading {}", documents.display()))?;
            let documents: Value = serde_json::from_str(&content)?;

            let qa = RetrievalQa::from_app_config(provider, &app)?;
            let response = qa.answer_value(&json!(question), &documents).await?;
            println!("{}", response.answer);

            let sources: Vec<String> = response
                .context
                .iter()
                .filter_map(|doc| doc.metadata.get("source").map(output::cell_text))
                .collect();
            output::print_sources(&sources);
        },
        Commands::Tools => {
            let registry = build_registry(&app, provider)?;
            println!("{}", output::tools_table(&registry.descriptors()));
        },
        Commands::Invoke { name, args } => {
            let params: Value = serde_json::from_str(&args).context("--args must be a JSON object")?;
            let registry = build_registry(&app, provider)?;
            let result = registry.invoke(&name, params).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        },
    }

    Ok(())
}
