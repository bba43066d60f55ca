use std::sync::Arc;

use anyhow::{bail, Context, Result};
use backend_api::HttpPitchBackend;
use clap::Parser;
use client_core::{DownloadsDirSink, FieldId, PitchWorkflow};
use shared::{
    domain::ProductId,
    protocol::{RecommendationResponse, FINAL_DECK_FILE_NAME},
};
use url::Url;

mod config;

#[derive(Parser, Debug)]
#[command(
    name = "pitchpilot",
    about = "Requests a ranked product recommendation and downloads the generated pitch deck"
)]
struct Args {
    /// Backend root URL; overrides pitchpilot.toml and environment.
    #[arg(long)]
    backend_url: Option<String>,
    /// Directory decks are saved into.
    #[arg(long)]
    download_dir: Option<String>,
    /// Print the loaded catalog (industries and pickable products) and exit.
    #[arg(long)]
    list_catalog: bool,
    #[arg(long)]
    client_name: Option<String>,
    #[arg(long)]
    company_name: Option<String>,
    #[arg(long)]
    client_email: Option<String>,
    /// Account manager name.
    #[arg(long)]
    nam_name: Option<String>,
    /// Account manager territory circle.
    #[arg(long)]
    nam_circle: Option<String>,
    #[arg(long)]
    industry: Option<String>,
    /// One of Low, Medium, High.
    #[arg(long)]
    budget_band: Option<String>,
    /// Optional client size hint.
    #[arg(long)]
    size: Option<u64>,
    /// Product id already sold to this client; repeatable.
    #[arg(long = "sold")]
    sold: Vec<String>,
    /// Also download the standalone deck for this product id; repeatable.
    #[arg(long = "product-pitch")]
    product_pitch: Vec<String>,
}

impl Args {
    fn wants_submission(&self) -> bool {
        let any_field_given = self.client_name.is_some()
            || self.company_name.is_some()
            || self.nam_name.is_some()
            || self.nam_circle.is_some()
            || self.industry.is_some()
            || self.budget_band.is_some();
        any_field_given || self.product_pitch.is_empty()
    }
}

fn render_recommendation(recommendation: &RecommendationResponse) -> String {
    let mut out = String::new();
    for (rank, product) in recommendation.recommended.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", rank + 1, product.name));
        for point in &product.talking_points {
            out.push_str(&format!("   - {point}\n"));
        }
    }
    out
}

async fn print_catalog(workflow: &PitchWorkflow) {
    println!("Industries:");
    for option in workflow.industry_options().await {
        println!("  {option}");
    }
    println!("Products:");
    for (id, name) in workflow.sold_picker_options().await {
        println!("  {id}  ({name})");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    if let Some(backend_url) = &args.backend_url {
        settings.backend_url = backend_url.clone();
    }
    if let Some(download_dir) = &args.download_dir {
        settings.download_dir = download_dir.clone();
    }

    let backend_url = Url::parse(&settings.backend_url)
        .with_context(|| format!("invalid backend url: {}", settings.backend_url))?;
    let workflow = PitchWorkflow::new(
        Arc::new(HttpPitchBackend::new(backend_url)),
        Arc::new(DownloadsDirSink::new(&settings.download_dir)),
    );

    workflow.activate().await.context("catalog load failed")?;

    if args.list_catalog {
        print_catalog(&workflow).await;
        return Ok(());
    }

    let fields = [
        (FieldId::ClientName, &args.client_name),
        (FieldId::CompanyName, &args.company_name),
        (FieldId::ClientEmail, &args.client_email),
        (FieldId::NamName, &args.nam_name),
        (FieldId::NamCircle, &args.nam_circle),
        (FieldId::Industry, &args.industry),
        (FieldId::BudgetBand, &args.budget_band),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            workflow.set_field(field, value.clone()).await;
        }
    }
    if let Some(size) = args.size {
        workflow.set_field(FieldId::Size, size.to_string()).await;
    }
    for id in &args.sold {
        workflow.mark_product_sold(ProductId::from(id.as_str())).await;
    }

    if args.wants_submission() {
        let outcome = workflow.validation().await;
        if !outcome.valid {
            let missing = outcome
                .first_invalid
                .map(|field| field.to_string())
                .unwrap_or_default();
            bail!("all required fields must be filled (first missing: {missing})");
        }

        match workflow.submit().await {
            Ok(recommendation) => {
                print!("{}", render_recommendation(&recommendation));
                println!("{FINAL_DECK_FILE_NAME} downloaded");
            }
            Err(err) => {
                // A failed generation must not hide an already received
                // recommendation.
                if let Some(recommendation) = workflow.recommendation().await {
                    print!("{}", render_recommendation(&recommendation));
                }
                bail!("{err}");
            }
        }
    }

    for id in &args.product_pitch {
        let product_id = ProductId::from(id.as_str());
        match workflow.download_product_pitch(product_id).await {
            Ok(path) => println!("saved {}", path.display()),
            Err(err) => eprintln!("{err}"),
        }
    }

    Ok(())
}
