//! Text-generation backend commands

use adlens_core::ai::{parse_narrative, AIClient, TextGenerationPort};
use adlens_core::insights::Confidence;
use adlens_core::prompts::PromptLibrary;
use adlens_core::report::{build_prompt, ComposeSettings};
use adlens_core::{GroupKey, Insight, InsightKind, OverallKpis, PipelineConfig};
use anyhow::{Context, Result};

/// Pick the backend for a command
///
/// `--backend` wins over `ADLENS_BACKEND`, which wins over the config file.
pub fn select_backend(
    config: &PipelineConfig,
    backend: Option<&str>,
    model: Option<&str>,
) -> Option<AIClient> {
    let client = match backend {
        Some(name) => AIClient::from_name(name),
        None => AIClient::from_config(&config.narrative),
    }?;

    Some(match model {
        Some(m) => client.with_model(m),
        None => client,
    })
}

/// A single illustrative insight used to exercise the backend
fn sample_insight() -> Insight {
    Insight::new(
        InsightKind::TopPerformer,
        "Top Channel by ROAS",
        "Paid Search",
        GroupKey::Channel,
        Confidence {
            score: 0.5,
            justification: "Based on a total spend of $25,000.00 for this channel.".to_string(),
        },
    )
    .with_metric("roas", Some(4.2))
    .with_metric("total_spend", Some(25_000.0))
    .with_claim("Paid Search returns $4.20 for every dollar spent.")
    .with_recommendation("Shift budget toward Paid Search.")
}

/// Check the configured backend and request a sample narrative
pub async fn cmd_narrator_test(
    config: &PipelineConfig,
    backend: Option<&str>,
    model: Option<&str>,
) -> Result<()> {
    println!("🔍 Testing text-generation backend...\n");

    let Some(client) = select_backend(config, backend, model) else {
        println!("  ⚠️  No backend configured (reports will be degraded)");
        println!("\nTo configure one:");
        println!("  ollama:            export OLLAMA_HOST=http://localhost:11434");
        println!("  openai_compatible: export OPENAI_COMPATIBLE_HOST=http://localhost:8000");
        println!("  gemini:            export GEMINI_API_KEY=...");
        println!("  then:              export ADLENS_BACKEND=<name>");
        return Ok(());
    };

    let info = client.info();
    println!("  Backend: {}", info.name);
    println!("  Model:   {}", info.model);
    println!("  Host:    {}\n", info.host);

    print!("Checking availability... ");
    if client.health_check().await {
        println!("✅ Connected");
    } else {
        println!("❌ Failed");
        println!("\n⚠️  Could not reach {} at {}", info.name, info.host);
        return Ok(());
    }

    let settings = ComposeSettings::from_config(&config.narrative).with_source("sample");
    let kpis = OverallKpis {
        total_spend: 25_000.0,
        total_revenue: 105_000.0,
        overall_roas: Some(4.2),
        rows: 1,
    };
    let mut library = PromptLibrary::new();
    let prompt = build_prompt(&mut library, &[sample_insight()], &kpis, &settings)
        .context("Failed to build sample prompt")?;

    println!("\n📋 Requesting sample narrative...\n");
    let outcome = tokio::time::timeout(settings.timeout, client.generate(&prompt)).await;
    let text = match outcome {
        Err(_) => {
            println!("  ❌ Timed out after {}s", settings.timeout.as_secs());
            return Ok(());
        }
        Ok(Err(e)) => {
            println!("  ❌ Error: {}", e);
            return Ok(());
        }
        Ok(Ok(text)) => text,
    };

    match parse_narrative(&text) {
        Ok(narrative) => {
            println!("  Summary: {}", narrative.executive_summary);
            for rec in &narrative.recommendations {
                println!("  - {}", rec);
            }
            println!("\n✅ Backend produced a usable narrative");
        }
        Err(e) => println!("  ❌ Unusable response: {}", e),
    }
    Ok(())
}
