//! REST API for recipe_knn.
//!
//! Provides a stateless HTTP server with JSON endpoints for building and
//! querying encoded corpora. Each request includes a `db` field naming the
//! corpus file. The server loads the corpus from disk per request and builds
//! a fresh index for every recommend call.
//!
//! ## Endpoints
//!
//! - `POST /build` - Encode a recipe feed and save it
//! - `POST /recommend` - Recommend recipes for a list of recipe ids
//! - `POST /inspect` - Describe a saved corpus, optionally one recipe's ingredients
//!
//! Index parameters can be supplied as `web::Data<IndexParams>` app data;
//! the defaults are used otherwise.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use actix_web::{App, HttpServer};
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     HttpServer::new(|| App::new().configure(recipe_knn::server::config))
//!         .bind("0.0.0.0:7878")?
//!         .run()
//!         .await
//! }
//! ```

use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use crate::query::{neighbor_count, Recommender, DEFAULT_K};
use crate::recipe::{Recipe, RecipeId};
use crate::{build, EncodedCorpus, IndexParams, RecommendError};


// --- Request structs ---

#[derive(Deserialize)]
struct BuildRequest {
    db: String,
    recipes: serde_json::Value,
}

#[derive(Deserialize)]
struct RecommendRequest {
    db: String,
    ids: Vec<RecipeId>,
    k: Option<i64>,
}

#[derive(Deserialize)]
struct InspectRequest {
    db: String,
    /// When set, also list this recipe's ingredients
    id: Option<RecipeId>,
}

// --- Response structs ---

#[derive(Serialize)]
struct BuildResponse {
    recipes: usize,
    dimension: usize,
}

#[derive(Serialize)]
struct RecommendResponse {
    results: Vec<RecommendResult>,
}

#[derive(Serialize)]
struct RecommendResult {
    id: RecipeId,
    status: String,
    recommendations: Vec<RecipeId>,
    distances: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    message: String,
}

#[derive(Serialize)]
struct InspectResponse {
    recipes: usize,
    dimension: usize,
    vocabulary: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ingredients: Option<Vec<String>>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: String,
}


/// Maps a core error to a status code and a JSON body naming its kind
fn error_response(error: &RecommendError) -> HttpResponse {
    let status = match error {
        RecommendError::InvalidArgument(_) | RecommendError::EmptyCorpus => StatusCode::BAD_REQUEST,
        RecommendError::UnknownRecipe(_) => StatusCode::NOT_FOUND,
        RecommendError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
        RecommendError::Io(_)
        | RecommendError::Deserialization(_)
        | RecommendError::DimensionMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        kind: error.kind().to_string(),
    })
}

fn index_params(data: Option<web::Data<IndexParams>>) -> IndexParams {
    data.map(|d| d.get_ref().clone()).unwrap_or_default()
}

// --- Handlers ---

async fn build_handler(body: web::Json<BuildRequest>) -> impl Responder {
    let body = body.into_inner();

    let recipes: Vec<Recipe> = match serde_json::from_value(body.recipes) {
        Ok(recipes) => recipes,
        Err(e) => {
            let error = RecommendError::InvalidArgument(format!("malformed recipe feed: {}", e));
            warn!(db = %body.db, %error, "rejected recipe feed");
            return error_response(&error);
        }
    };

    let corpus = match build(&recipes) {
        Ok(corpus) => corpus,
        Err(e) => {
            warn!(db = %body.db, error = %e, "build failed");
            return error_response(&e);
        }
    };

    if let Err(e) = corpus.save(&body.db) {
        warn!(db = %body.db, error = %e, "save failed");
        return error_response(&e);
    }

    info!(db = %body.db, recipes = corpus.count(), dimension = corpus.dimension(), "corpus built");
    HttpResponse::Ok().json(BuildResponse {
        recipes: corpus.count(),
        dimension: corpus.dimension(),
    })
}

async fn recommend_handler(
    body: web::Json<RecommendRequest>,
    params: Option<web::Data<IndexParams>>,
) -> impl Responder {
    let k = match neighbor_count(body.k.unwrap_or(DEFAULT_K as i64)) {
        Ok(k) => k,
        Err(e) => return error_response(&e),
    };

    // load the corpus
    let corpus = match EncodedCorpus::load(&body.db) {
        Ok(corpus) => corpus,
        Err(e) => {
            warn!(db = %body.db, error = %e, "load failed");
            return error_response(&e);
        }
    };

    let session = match Recommender::with_params(&corpus, &index_params(params)) {
        Ok(session) => session,
        Err(e) => return error_response(&e),
    };

    let outcomes = match session.recommend_each(&body.ids, k) {
        Ok(outcomes) => outcomes,
        Err(e) => return error_response(&e),
    };

    let results = outcomes
        .into_iter()
        .map(|(id, outcome)| match outcome {
            Ok(hits) => RecommendResult {
                id,
                status: "ok".to_string(),
                recommendations: hits.iter().map(|hit| hit.id).collect(),
                distances: hits.iter().map(|hit| hit.distance()).collect(),
                kind: None,
                message: "Recommend Success".to_string(),
            },
            Err(e) => RecommendResult {
                id,
                status: "error".to_string(),
                recommendations: Vec::new(),
                distances: Vec::new(),
                kind: Some(e.kind().to_string()),
                message: e.to_string(),
            },
        })
        .collect();

    debug!(db = %body.db, queries = body.ids.len(), k, "recommend served");
    HttpResponse::Ok().json(RecommendResponse { results })
}

async fn inspect_handler(body: web::Json<InspectRequest>) -> impl Responder {
    let corpus = match EncodedCorpus::load(&body.db) {
        Ok(corpus) => corpus,
        Err(e) => return error_response(&e),
    };

    let ingredients = match body.id {
        Some(id) => match corpus.ingredients_of(id) {
            Some(found) => Some(found.into_iter().map(str::to_string).collect()),
            None => return error_response(&RecommendError::UnknownRecipe(id)),
        },
        None => None,
    };

    HttpResponse::Ok().json(InspectResponse {
        recipes: corpus.count(),
        dimension: corpus.dimension(),
        vocabulary: corpus.vocabulary().iter().map(str::to_string).collect(),
        ingredients,
    })
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/build").route(web::post().to(build_handler)))
       .service(web::resource("/recommend").route(web::post().to(recommend_handler)))
       .service(web::resource("/inspect").route(web::post().to(inspect_handler)));
}
