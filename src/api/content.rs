//! Community content endpoints
//!
//! - GET / - home page data
//! - POST /stories/new, /recipes/new, /knowledge/new - submit for review
//! - POST /directory/suggest - suggest a business
//! - GET /library - approved recipes and popular knowledge
//! - GET /map - map embed URL

use axum::{
    extract::{Query, State},
    response::Response,
    Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{default_page, lenient_page, PageQuery};
use crate::api::flash;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, CurrentUser};
use crate::forms::{KnowledgeForm, RecipeForm, StoryForm, SuggestionForm};
use crate::models::{Business, PagedResult, Post, PostKind, ProfileView};
use crate::services::{map_url, Library};

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub stories: PagedResult<Post>,
    pub businesses: Vec<Business>,
    pub profile: Option<ProfileView>,
}

/// GET /
pub async fn home(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<HomeResponse>, ApiError> {
    let stories = state.content_service.approved_stories(query.page).await?;
    let businesses = state.business_service.directory(None).await?.businesses;
    let profile = match user {
        Some(user) => Some(state.profile_service.view(user.id).await?),
        None => None,
    };

    Ok(Json(HomeResponse {
        stories,
        businesses,
        profile,
    }))
}

/// POST /stories/new
pub async fn create_story(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Form(form): Form<StoryForm>,
) -> Result<Response, ApiError> {
    form.validate()?;
    let image = form.image();
    state
        .content_service
        .submit_post(&user, PostKind::Story, &form.title, &form.content, None, image)
        .await?;

    Ok(flash::success(
        "/",
        "Relato enviado para revisión. ¡Gracias por tu contribución!",
    ))
}

/// POST /recipes/new
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Form(form): Form<RecipeForm>,
) -> Result<Response, ApiError> {
    form.validate()?;
    let image = form.image();
    state
        .content_service
        .submit_post(
            &user,
            PostKind::Recipe,
            &form.title,
            &form.steps,
            Some(form.ingredients.clone()),
            image,
        )
        .await?;

    Ok(flash::success(
        "/library",
        "Receta enviada para revisión. ¡Gracias por compartir tu conocimiento!",
    ))
}

/// POST /knowledge/new
pub async fn create_knowledge(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Form(form): Form<KnowledgeForm>,
) -> Result<Response, ApiError> {
    form.validate()?;
    state
        .content_service
        .submit_post(&user, PostKind::Knowledge, &form.title, &form.content, None, None)
        .await?;

    Ok(flash::success(
        "/library",
        "Saber popular enviado para revisión. ¡Gracias por compartirlo!",
    ))
}

/// POST /directory/suggest
pub async fn suggest_business(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Form(form): Form<SuggestionForm>,
) -> Result<Response, ApiError> {
    form.validate()?;
    let input = form.into_input(user.id);
    state.content_service.suggest(&user, input).await?;

    Ok(flash::success(
        "/",
        "¡Sugerencia enviada! El equipo la revisará pronto.",
    ))
}

#[derive(Debug, Deserialize)]
pub struct LibraryQuery {
    pub q: Option<String>,
    #[serde(default = "default_page", deserialize_with = "lenient_page")]
    pub page_recipes: u32,
    #[serde(default = "default_page", deserialize_with = "lenient_page")]
    pub page_knowledge: u32,
}

/// GET /library
pub async fn library(
    State(state): State<AppState>,
    Query(query): Query<LibraryQuery>,
) -> Result<Json<Library>, ApiError> {
    let library = state
        .content_service
        .library(query.q.as_deref(), query.page_recipes, query.page_knowledge)
        .await?;
    Ok(Json(library))
}

#[derive(Debug, Deserialize)]
pub struct MapQuery {
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Serialize)]
pub struct MapResponse {
    pub location: String,
    pub map_url: String,
}

/// GET /map
pub async fn map(Query(query): Query<MapQuery>) -> Json<MapResponse> {
    Json(MapResponse {
        map_url: map_url(&query.location),
        location: query.location,
    })
}
