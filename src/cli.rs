use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use actix_web::{web, App, HttpServer};
use clap::{ArgAction, Parser, Subcommand};
use indexmap::IndexMap;
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use recipe_knn::query::neighbor_count;
use recipe_knn::{build, parse_feed, EncodedCorpus, IndexParams, RecipeId, RecommendError, Recommender, DEFAULT_K};

#[derive(Parser, Debug)]
#[command(name = "recipe_knn", version, about = "Recommend recipes that share ingredients")]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,
    /// Rows per KD-tree leaf
    #[arg(long, global = true, default_value_t = IndexParams::default().leaf_size)]
    pub leaf_size: usize,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a JSON recipe feed and save the corpus
    Build {
        /// Feed file; standard input when omitted
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, env = "RECIPE_KNN_DB", default_value = "recipes.db")]
        db: PathBuf,
    },
    /// Print the nearest recipes for each id as a JSON object
    Recommend {
        #[arg(long, env = "RECIPE_KNN_DB", default_value = "recipes.db")]
        db: PathBuf,
        #[arg(short, long, default_value_t = DEFAULT_K as i64, allow_negative_numbers = true)]
        k: i64,
        #[arg(required = true)]
        ids: Vec<RecipeId>,
    },
    /// Describe a saved corpus
    Inspect {
        #[arg(long, env = "RECIPE_KNN_DB", default_value = "recipes.db")]
        db: PathBuf,
        /// Also list the ingredients of this recipe
        #[arg(long)]
        id: Option<RecipeId>,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(long, env = "RECIPE_KNN_BIND", default_value = "0.0.0.0:7878")]
        bind: String,
    },
}

/// Installs the stderr log subscriber; RUST_LOG wins over `--verbose`.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Runs one command, printing its JSON result on stdout.
pub async fn run(cli: Cli) -> Result<(), RecommendError> {
    let params = IndexParams { leaf_size: cli.leaf_size };

    match cli.command {
        Command::Build { input, db } => {
            let feed = read_feed(input.as_deref())?;
            let recipes = parse_feed(&feed)?;
            let corpus = build(&recipes)?;
            corpus.save(&db)?;

            info!(db = %db.display(), recipes = corpus.count(), dimension = corpus.dimension(), "corpus built");
            println!("{}", json!({ "recipes": corpus.count(), "dimension": corpus.dimension() }));
        }

        Command::Recommend { db, k, ids } => {
            let k = neighbor_count(k)?;
            let corpus = EncodedCorpus::load(&db)?;
            debug!(db = %db.display(), recipes = corpus.count(), "corpus loaded");

            let session = Recommender::with_params(&corpus, &params)?;
            let results = session.recommend_batch(&ids, k)?;
            println!("{}", render_results(&results)?);
        }

        Command::Inspect { db, id } => {
            let corpus = EncodedCorpus::load(&db)?;
            let vocabulary: Vec<&str> = corpus.vocabulary().iter().collect();
            let mut summary = json!({
                "recipes": corpus.count(),
                "dimension": corpus.dimension(),
                "vocabulary": vocabulary,
            });
            if let Some(id) = id {
                let ingredients = corpus.ingredients_of(id).ok_or(RecommendError::UnknownRecipe(id))?;
                summary["ingredients"] = json!(ingredients);
            }
            println!("{}", summary);
        }

        Command::Serve { bind } => {
            info!(%bind, leaf_size = params.leaf_size, "serving");
            HttpServer::new(move || {
                App::new()
                    .app_data(web::Data::new(params.clone()))
                    .configure(recipe_knn::server::config)
            })
            .bind(&bind)?
            .run()
            .await?;
        }
    }

    Ok(())
}

fn read_feed(input: Option<&Path>) -> Result<String, RecommendError> {
    match input {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut feed = String::new();
            io::stdin().read_to_string(&mut feed)?;
            Ok(feed)
        }
    }
}

/// `{"<id>": [ids...]}` in query order
fn render_results(results: &IndexMap<RecipeId, Vec<RecipeId>>) -> Result<String, RecommendError> {
    serde_json::to_string(results)
        .map_err(|e| RecommendError::InvalidArgument(format!("cannot render results: {}", e)))
}
