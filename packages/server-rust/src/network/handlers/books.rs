//! Catalog routes backed by [`CachedBookRepository`](crate::repository::CachedBookRepository).
//!
//! Predicate lookups that match nothing answer 404 here; the repository
//! itself returns an empty list.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use folio_core::{Book, NewBook};
use serde::Serialize;

use super::AppState;
use crate::context::RequestContext;
use crate::network::error::ApiError;

#[derive(Debug, Serialize)]
pub struct IdResponse {
    pub id: String,
}

fn non_empty(books: Vec<Book>, what: &str, value: &str) -> Result<Json<Vec<Book>>, ApiError> {
    if books.is_empty() {
        return Err(ApiError::NotFound(format!("no books with {what} {value}")));
    }
    Ok(Json(books))
}

pub async fn list_books(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Vec<Book>>, ApiError> {
    Ok(Json(state.books.get_all(&ctx).await?))
}

pub async fn get_book(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<Book>, ApiError> {
    state
        .books
        .get_by_id(&ctx, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("book {id} not found")))
}

pub async fn books_by_author(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(author): Path<String>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let books = state.books.get_by_author(&ctx, &author).await?;
    non_empty(books, "author", &author)
}

pub async fn books_by_publisher(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(publisher): Path<String>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let books = state.books.get_by_publisher(&ctx, &publisher).await?;
    non_empty(books, "publisher", &publisher)
}

pub async fn books_by_language(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(language): Path<String>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let books = state.books.get_by_language(&ctx, &language).await?;
    non_empty(books, "language", &language)
}

pub async fn books_by_genre(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(genre): Path<String>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let books = state.books.get_by_genre(&ctx, &genre).await?;
    non_empty(books, "genre", &genre)
}

/// Title and author are required; everything else may be left empty.
pub async fn create_book(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(book): Json<NewBook>,
) -> Result<(StatusCode, Json<IdResponse>), ApiError> {
    if book.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }
    if book.author.trim().is_empty() {
        return Err(ApiError::BadRequest("author is required".to_string()));
    }
    let id = state.books.create(&ctx, book).await?;
    Ok((StatusCode::CREATED, Json(IdResponse { id })))
}

pub async fn delete_book(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<IdResponse>, ApiError> {
    let id = state.books.delete(&ctx, &id).await?;
    Ok(Json(IdResponse { id }))
}
