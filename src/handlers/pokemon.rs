use axum::{
    Json,
    extract::Query,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::PgPool;
use std::collections::HashSet;

use crate::auth::{AdminOnly, Authorized};
use crate::helpers::{
    ApiResult, bad_request, conflict, id_conflict_or_500, not_found, to_500, unprocessable,
    upstream,
};
use crate::models::pokemon::{
    ListParams, Pokemon, PokemonColumn, PokemonPatch, PokemonPayload, SortOrder, TypedKeyword,
    type_keyword,
};

const POKEMON_COLUMNS: &str =
    "id, name, type_1, type_2, total, hp, attack, defense, sp_atk, sp_def, speed, generation, legendary";

const DEFAULT_FEED_URL: &str = "https://coralvanda.github.io/pokemon_data.json";

pub async fn health() -> Json<Value> {
    Json(json!({ "message": "Server is running" }))
}

pub async fn create_pokemon(
    State(pool): State<PgPool>,
    Json(payload): Json<PokemonPayload>,
) -> ApiResult<(StatusCode, Json<Pokemon>)> {
    payload.validate().map_err(unprocessable)?;

    let existing = sqlx::query_scalar::<_, i32>(r#"SELECT id FROM pokemon WHERE id = $1"#)
        .bind(payload.id)
        .fetch_optional(&pool)
        .await
        .map_err(to_500)?;
    if existing.is_some() {
        return Err(conflict("Pokemon with this id already exists."));
    }

    let row = sqlx::query_as::<_, Pokemon>(&format!(
        r#"
        INSERT INTO pokemon ({POKEMON_COLUMNS})
        VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)
        RETURNING {POKEMON_COLUMNS}
        "#
    ))
    .bind(payload.id)
    .bind(&payload.name)
    .bind(&payload.type_1)
    .bind(payload.type_2.as_deref())
    .bind(payload.total)
    .bind(payload.hp)
    .bind(payload.attack)
    .bind(payload.defense)
    .bind(payload.sp_atk)
    .bind(payload.sp_def)
    .bind(payload.speed)
    .bind(payload.generation)
    .bind(payload.legendary)
    .fetch_one(&pool)
    .await
    .map_err(id_conflict_or_500)?;

    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn get_pokemon_by_id(
    State(pool): State<PgPool>,
    Path(pokemon_id): Path<i32>,
) -> ApiResult<Json<Pokemon>> {
    let row = sqlx::query_as::<_, Pokemon>(&format!(
        r#"SELECT {POKEMON_COLUMNS} FROM pokemon WHERE id = $1"#
    ))
    .bind(pokemon_id)
    .fetch_optional(&pool)
    .await
    .map_err(to_500)?;

    let Some(row) = row else {
        return Err(not_found("Pokemon not found."));
    };

    Ok(Json(row))
}

/// PUT: remplacement complet, id compris.
pub async fn update_pokemon(
    State(pool): State<PgPool>,
    Path(pokemon_id): Path<i32>,
    Json(payload): Json<PokemonPayload>,
) -> ApiResult<(StatusCode, Json<Pokemon>)> {
    payload.validate().map_err(unprocessable)?;

    let row = sqlx::query_as::<_, Pokemon>(&format!(
        r#"
        UPDATE pokemon SET
            id = $1, name = $2, type_1 = $3, type_2 = $4, total = $5,
            hp = $6, attack = $7, defense = $8, sp_atk = $9, sp_def = $10,
            speed = $11, generation = $12, legendary = $13
        WHERE id = $14
        RETURNING {POKEMON_COLUMNS}
        "#
    ))
    .bind(payload.id)
    .bind(&payload.name)
    .bind(&payload.type_1)
    .bind(payload.type_2.as_deref())
    .bind(payload.total)
    .bind(payload.hp)
    .bind(payload.attack)
    .bind(payload.defense)
    .bind(payload.sp_atk)
    .bind(payload.sp_def)
    .bind(payload.speed)
    .bind(payload.generation)
    .bind(payload.legendary)
    .bind(pokemon_id)
    .fetch_optional(&pool)
    .await
    .map_err(id_conflict_or_500)?;

    let Some(row) = row else {
        return Err(not_found("Pokemon not found."));
    };

    Ok((StatusCode::ACCEPTED, Json(row)))
}

/// PATCH: seuls les champs fournis écrasent la ligne (COALESCE).
pub async fn patch_pokemon(
    State(pool): State<PgPool>,
    Path(pokemon_id): Path<i32>,
    Json(patch): Json<PokemonPatch>,
) -> ApiResult<Json<Pokemon>> {
    let row = sqlx::query_as::<_, Pokemon>(&format!(
        r#"
        UPDATE pokemon SET
            name = COALESCE($1, name),
            type_1 = COALESCE($2, type_1),
            type_2 = COALESCE($3, type_2),
            total = COALESCE($4, total),
            hp = COALESCE($5, hp),
            attack = COALESCE($6, attack),
            defense = COALESCE($7, defense),
            sp_atk = COALESCE($8, sp_atk),
            sp_def = COALESCE($9, sp_def),
            speed = COALESCE($10, speed),
            generation = COALESCE($11, generation),
            legendary = COALESCE($12, legendary)
        WHERE id = $13
        RETURNING {POKEMON_COLUMNS}
        "#
    ))
    .bind(patch.name.as_deref())
    .bind(patch.type_1.as_deref())
    .bind(patch.type_2.as_deref())
    .bind(patch.total)
    .bind(patch.hp)
    .bind(patch.attack)
    .bind(patch.defense)
    .bind(patch.sp_atk)
    .bind(patch.sp_def)
    .bind(patch.speed)
    .bind(patch.generation)
    .bind(patch.legendary)
    .bind(pokemon_id)
    .fetch_optional(&pool)
    .await
    .map_err(to_500)?;

    let Some(row) = row else {
        return Err(not_found("Pokemon not found."));
    };

    Ok(Json(row))
}

/// L'id arrive brut pour distinguer le 400 (pas un entier) du 404.
pub async fn delete_pokemon(
    State(pool): State<PgPool>,
    Path(pokemon_id): Path<String>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let pokemon_id: i32 = pokemon_id
        .parse()
        .map_err(|_| bad_request("Pokemon ID must be a valid integer."))?;

    let res = sqlx::query(r#"DELETE FROM pokemon WHERE id = $1"#)
        .bind(pokemon_id)
        .execute(&pool)
        .await
        .map_err(to_500)?;
    if res.rows_affected() == 0 {
        return Err(not_found("Pokemon not found."));
    }

    crate::helpers::ok("Pokemon with this id is deleted successfully.")
}

pub async fn list_pokemon(
    State(pool): State<PgPool>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Pokemon>>> {
    let col = match params.col.as_deref() {
        Some(name) => PokemonColumn::parse(name)
            .ok_or_else(|| bad_request(format!("Unknown column '{name}'.")))?,
        None => PokemonColumn::Name,
    };
    let sort = match params.sort.as_deref() {
        Some(s) => {
            SortOrder::parse(s).ok_or_else(|| bad_request("Sort must be 'asc' or 'desc'."))?
        }
        None => SortOrder::Asc,
    };
    let limit = params.limit.unwrap_or(10);
    if !(1..=100).contains(&limit) {
        return Err(bad_request("Limit must be between 1 and 100."));
    }
    let page = params.page.unwrap_or(1);
    if page < 1 {
        return Err(bad_request("Page must be 1 or greater."));
    }
    // Un numéro de page démesuré ferait déborder l'offset.
    let Some(offset) = page.checked_sub(1).and_then(|p| p.checked_mul(limit)) else {
        return Err(bad_request("Page is out of range."));
    };
    let keyword = match params.keyword.as_deref() {
        Some(kw) => Some(type_keyword(col, kw).map_err(bad_request)?),
        None => None,
    };

    // Noms de colonnes issus de la liste blanche, valeurs toujours liées.
    let mut sql = format!("SELECT {POKEMON_COLUMNS} FROM pokemon");
    match keyword {
        Some(TypedKeyword::Text(_)) => sql.push_str(&format!(" WHERE {} ILIKE $1", col.sql())),
        Some(_) => sql.push_str(&format!(" WHERE {} = $1", col.sql())),
        None => {}
    }
    sql.push_str(&format!(
        " ORDER BY {} {} LIMIT {} OFFSET {}",
        col.sql(),
        sort.sql(),
        limit,
        offset
    ));

    let query = sqlx::query_as::<_, Pokemon>(&sql);
    let query = match keyword {
        Some(TypedKeyword::Text(s)) => query.bind(format!("%{s}%")),
        Some(TypedKeyword::Integer(n)) => query.bind(n),
        Some(TypedKeyword::Boolean(b)) => query.bind(b),
        None => query,
    };

    let rows = query.fetch_all(&pool).await.map_err(to_500)?;
    Ok(Json(rows))
}

/// Forme externe du flux, hors de notre contrôle.
#[derive(Debug, Deserialize)]
pub struct FeedPokemon {
    #[serde(rename = "#")]
    pub id: i32,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type 1")]
    pub type_1: String,
    #[serde(rename = "Type 2")]
    pub type_2: Option<String>,
    #[serde(rename = "Total")]
    pub total: i32,
    #[serde(rename = "HP")]
    pub hp: i32,
    #[serde(rename = "Attack")]
    pub attack: i32,
    #[serde(rename = "Defense")]
    pub defense: i32,
    #[serde(rename = "Sp. Atk")]
    pub sp_atk: i32,
    #[serde(rename = "Sp. Def")]
    pub sp_def: i32,
    #[serde(rename = "Speed")]
    pub speed: i32,
    #[serde(rename = "Generation")]
    pub generation: i32,
    #[serde(rename = "Legendary")]
    pub legendary: bool,
}

fn feed_url() -> String {
    std::env::var("POKEMON_FEED_URL").unwrap_or_else(|_| DEFAULT_FEED_URL.into())
}

fn fix_duplicate_ids_enabled() -> bool {
    std::env::var("FEED_FIX_DUPLICATE_IDS")
        .ok()
        .is_some_and(|v| v == "true")
}

/// Politique optionnelle: un id déjà vu est incrémenté jusqu'au premier
/// entier libre, dans l'ordre du flux.
pub fn bump_duplicate_ids(records: &mut [FeedPokemon]) {
    let mut taken: HashSet<i32> = HashSet::new();
    for record in records.iter_mut() {
        while taken.contains(&record.id) {
            record.id += 1;
        }
        taken.insert(record.id);
    }
}

pub async fn fetch_and_store(
    _admin: Authorized<AdminOnly>,
    State(pool): State<PgPool>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let url = feed_url();
    let response = reqwest::get(&url)
        .await
        .map_err(|e| upstream(StatusCode::BAD_GATEWAY, format!("Feed unreachable: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let status =
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        return Err(upstream(status, format!("Feed returned {status}.")));
    }

    let mut records: Vec<FeedPokemon> = response
        .json()
        .await
        .map_err(|e| upstream(StatusCode::BAD_GATEWAY, format!("Malformed feed: {e}")))?;

    if fix_duplicate_ids_enabled() {
        bump_duplicate_ids(&mut records);
    }

    // Un seul lot: la moindre erreur annule tout.
    let mut tx = pool.begin().await.map_err(to_500)?;
    for record in &records {
        let inserted = sqlx::query(&format!(
            r#"
            INSERT INTO pokemon ({POKEMON_COLUMNS})
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)
            "#
        ))
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.type_1)
        .bind(record.type_2.as_deref())
        .bind(record.total)
        .bind(record.hp)
        .bind(record.attack)
        .bind(record.defense)
        .bind(record.sp_atk)
        .bind(record.sp_def)
        .bind(record.speed)
        .bind(record.generation)
        .bind(record.legendary)
        .execute(&mut *tx)
        .await;
        if let Err(e) = inserted {
            tx.rollback().await.map_err(to_500)?;
            return Err(to_500(e));
        }
    }
    tx.commit().await.map_err(to_500)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Data successfully stored in the database",
            "inserted": records.len(),
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(id: i32, name: &str) -> FeedPokemon {
        FeedPokemon {
            id,
            name: name.into(),
            type_1: "Normal".into(),
            type_2: None,
            total: 100,
            hp: 10,
            attack: 20,
            defense: 30,
            sp_atk: 10,
            sp_def: 10,
            speed: 20,
            generation: 1,
            legendary: false,
        }
    }

    #[test]
    fn ids_dupliques_incrementes_vers_le_premier_libre() {
        let mut records = vec![feed(1, "a"), feed(1, "b"), feed(2, "c"), feed(1, "d")];
        bump_duplicate_ids(&mut records);
        let ids: Vec<i32> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn ids_uniques_inchanges() {
        let mut records = vec![feed(10, "a"), feed(20, "b")];
        bump_duplicate_ids(&mut records);
        let ids: Vec<i32> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![10, 20]);
    }

    #[test]
    fn flux_externe_se_deserialise() {
        let json = serde_json::json!([{
            "#": 1, "Name": "Bulbasaur", "Type 1": "Grass", "Type 2": "Poison",
            "Total": 318, "HP": 45, "Attack": 49, "Defense": 49,
            "Sp. Atk": 65, "Sp. Def": 65, "Speed": 45,
            "Generation": 1, "Legendary": false
        }]);
        let records: Vec<FeedPokemon> = serde_json::from_value(json).unwrap();
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].sp_atk, 65);
        assert_eq!(records[0].type_2.as_deref(), Some("Poison"));
    }
}
