//! Printprompt CLI - text prompt to mesh to print quote
//!
//! Generates a preview mesh from a prompt, prices it on the print
//! marketplace and optionally opens a cart for the chosen offer.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use craftcloud::{
    Currency, LengthUnit, QuoteConfig, QuoteEngine, QuoteOption, QuoteRequest, QuoteSelection,
};
use indicatif::{ProgressBar, ProgressStyle};
use meshy::{GeneratedModel, GenerationConfig, GenerationPoller, MeshFormat};
use printprompt_transport::ReqwestTransport;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "printprompt")]
#[command(author, version, about = "Turn a text prompt into a 3D-print quote")]
struct Cli {
    /// HTTP request timeout in seconds
    #[arg(long, global = true, default_value = "60")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a preview mesh from a text prompt
    Generate {
        /// Text description of the object
        prompt: String,
    },

    /// Price an existing mesh
    Quote {
        /// URL of the mesh to price
        model_url: String,

        #[command(flatten)]
        options: QuoteArgs,
    },

    /// Generate, price and open a cart for the chosen offer
    Order {
        prompt: String,

        #[command(flatten)]
        options: QuoteArgs,

        /// Which offer to put in the cart
        #[arg(long, value_enum, default_value_t = Pick::Cheapest)]
        pick: Pick,
    },

    /// Check that the print marketplace is reachable
    Health,
}

#[derive(clap::Args)]
struct QuoteArgs {
    /// Destination country (ISO code)
    #[arg(short, long, default_value = "DE")]
    country: String,

    /// Material config id (repeatable; defaults to standard resin)
    #[arg(short, long = "material")]
    materials: Vec<String>,

    #[arg(short, long, default_value = "1.0")]
    scale: f64,

    #[arg(short, long, default_value = "1")]
    quantity: u32,

    /// EUR or USD
    #[arg(long, default_value = "EUR")]
    currency: Currency,

    /// Unit of the mesh coordinates: mm, cm or in (overrides CRAFTCLOUD_UPLOAD_UNIT)
    #[arg(long)]
    unit: Option<LengthUnit>,
}

impl QuoteArgs {
    fn to_request(&self, model_url: &str) -> QuoteRequest {
        let mut request = QuoteRequest::new(model_url, &self.country)
            .with_scale(self.scale)
            .with_quantity(self.quantity)
            .with_currency(self.currency);
        if !self.materials.is_empty() {
            request = request.with_materials(self.materials.clone());
        }
        request
    }

    fn apply_to(&self, config: QuoteConfig) -> QuoteConfig {
        match self.unit {
            Some(unit) => config.with_upload_unit(unit),
            None => config,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Pick {
    Cheapest,
    Fastest,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let transport = Arc::new(ReqwestTransport::new().with_timeout(Duration::from_secs(cli.timeout)));

    match cli.command {
        Commands::Generate { prompt } => {
            let poller = GenerationPoller::new(GenerationConfig::from_env()?, transport)?;
            let model = generate(&poller, &prompt).await?;
            print_model(&model);
        }
        Commands::Quote { model_url, options } => {
            let engine = QuoteEngine::new(options.apply_to(QuoteConfig::from_env()?), transport)?;
            let selection = quote(&engine, &options.to_request(&model_url)).await?;
            print_selection(&selection, options.currency);
        }
        Commands::Order {
            prompt,
            options,
            pick,
        } => {
            let poller = GenerationPoller::new(GenerationConfig::from_env()?, transport.clone())?;
            let engine = QuoteEngine::new(options.apply_to(QuoteConfig::from_env()?), transport)?;

            let model = generate(&poller, &prompt).await?;
            print_model(&model);

            let request = options.to_request(model.url(MeshFormat::Obj));
            let selection = quote(&engine, &request).await?;
            print_selection(&selection, options.currency);

            let chosen = match pick {
                Pick::Cheapest => selection.cheapest,
                Pick::Fastest => selection.fastest,
            }
            .context("no vendor offered both production and shipping for this model")?;

            let cart_url = engine
                .client()
                .create_cart_and_offer(&chosen, options.currency)
                .await
                .context("failed to create cart")?;
            println!("\nComplete your order at: {}", cart_url);
        }
        Commands::Health => {
            let engine = QuoteEngine::new(QuoteConfig::from_env()?, transport)?;
            let status = engine.client().health_check().await?;
            println!("{}: {}", engine.client().base_url(), status.status);
            if !status.is_ok() {
                anyhow::bail!("print marketplace reported status '{}'", status.status);
            }
        }
    }

    Ok(())
}

async fn generate(poller: &GenerationPoller, prompt: &str) -> Result<GeneratedModel> {
    let progress = ProgressBar::new(100);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Generating [{bar:40.cyan/blue}] {pos:>3}% {msg}")?
            .progress_chars("=> "),
    );
    progress.enable_steady_tick(Duration::from_millis(100));

    let bar = progress.clone();
    let result = poller
        .generate(prompt, move |value| bar.set_position(u64::from(value)))
        .await;

    match result {
        Ok(model) => {
            progress.finish_with_message("done");
            Ok(model)
        }
        Err(e) => {
            progress.abandon_with_message("failed");
            Err(e.into())
        }
    }
}

async fn quote(engine: &QuoteEngine, request: &QuoteRequest) -> Result<QuoteSelection> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")?
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    spinner.set_message("Requesting print quotes...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = engine.get_quote(request).await;
    spinner.finish_and_clear();
    Ok(result?)
}

fn print_model(model: &GeneratedModel) {
    for (format, url) in model.formats() {
        println!("{}: {}", format.extension().to_uppercase(), url);
    }
}

fn print_selection(selection: &QuoteSelection, currency: Currency) {
    if selection.is_empty() {
        println!("No vendor offered both production and shipping for this model.");
        return;
    }
    if let Some(option) = &selection.cheapest {
        println!("{}", describe_option("Cheapest", option, currency));
    }
    if let Some(option) = &selection.fastest {
        println!("{}", describe_option("Fastest", option, currency));
    }
}

fn describe_option(label: &str, option: &QuoteOption, currency: Currency) -> String {
    format!(
        "{:<9} {:>9.2} {}  {:>3} days  vendor {} / {}",
        format!("{}:", label),
        option.total_cost,
        currency,
        option.total_time,
        option.quote.vendor_id,
        option.shipping.name,
    )
}
