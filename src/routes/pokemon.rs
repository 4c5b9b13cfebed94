use axum::Router;
use axum::routing::{get, post};
use sqlx::PgPool;

use crate::handlers::pokemon::{
    create_pokemon, delete_pokemon, fetch_and_store, get_pokemon_by_id, list_pokemon,
    patch_pokemon, update_pokemon,
};

pub fn pokemon_routes() -> Router<PgPool> {
    Router::new()
        .route("/pokemon", get(list_pokemon).post(create_pokemon))
        .route("/pokemon/", get(list_pokemon))
        .route("/pokemon/fetch_and_store/", post(fetch_and_store))
        // DELETE lit l'id brut (Path<String>) pour pouvoir répondre 400.
        .route(
            "/pokemon/{pokemon_id}",
            get(get_pokemon_by_id)
                .put(update_pokemon)
                .patch(patch_pokemon)
                .delete(delete_pokemon),
        )
}
