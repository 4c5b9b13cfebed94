use argon2::{
    Argon2,
    password_hash::{
        Error as PHCError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};

use crate::helpers::{ApiError, forbidden, unauthorized};
use crate::models::user::{Role, User};

pub fn hash_password(password: &str) -> Result<String, PHCError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(hash)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub id: i32,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

fn access_secret() -> String {
    std::env::var("JWT_SECRET").expect("JWT_SECRET must be set")
}

fn access_ttl_secs() -> i64 {
    std::env::var("JWT_EXP_SECONDS")
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(1200)
}

fn generate_with_ttl(
    username: &str,
    user_id: i32,
    role: Role,
    ttl_secs: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    let claims = Claims {
        sub: username.to_string(),
        id: user_id,
        role,
        iat: now,
        exp: now + ttl_secs,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(access_secret().as_bytes()),
    )
}

pub fn generate_access_token(
    username: &str,
    user_id: i32,
    role: Role,
) -> Result<String, jsonwebtoken::errors::Error> {
    generate_with_ttl(username, user_id, role, access_ttl_secs())
}

/// Échoue si la signature est invalide, le token expiré ou un claim
/// obligatoire absent (le décodage strict couvre les trois cas).
pub fn verify_access(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let validation = Validation::default();
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(access_secret().as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

/// Recherche par username puis vérification du hash. Les deux échecs se
/// confondent volontairement en un seul `None`.
pub async fn authenticate_user(
    pool: &PgPool,
    username: &str,
    password: &str,
) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"SELECT id, username, hashed_password, role FROM users WHERE username = $1"#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    let Some(user) = user else {
        return Ok(None);
    };
    if !verify_password(&user.hashed_password, password) {
        return Ok(None);
    }
    Ok(Some(user))
}

fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let p = part.trim();
        if let Some(v) = p.strip_prefix(&format!("{name}=")) {
            return Some(v.to_string());
        }
    }
    None
}

fn get_bearer(headers: &HeaderMap) -> Option<String> {
    let v = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    v.strip_prefix("Bearer ").map(|s| s.to_string())
}

fn claims_from_parts(parts: &Parts) -> Result<Claims, ApiError> {
    let headers = &parts.headers;
    let token = get_bearer(headers)
        .or_else(|| get_cookie(headers, "auth"))
        .ok_or_else(|| unauthorized("Missing token."))?;

    verify_access(&token).map_err(|_| unauthorized("Could not validate user"))
}

/// Ensemble de rôles admis pour un handler donné.
pub trait RolePolicy {
    const ALLOWED: &'static [Role];
}

pub struct AdminOnly;

impl RolePolicy for AdminOnly {
    const ALLOWED: &'static [Role] = &[Role::Admin];
}

/// Garde déclarative: le contrôle de rôle s'évalue avant le corps du
/// handler, via l'extracteur.
pub struct Authorized<P: RolePolicy>(pub Claims, std::marker::PhantomData<P>);

impl<S, P> FromRequestParts<S> for Authorized<P>
where
    S: Send + Sync,
    P: RolePolicy,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = claims_from_parts(parts)?;
        if !P::ALLOWED.contains(&claims.role) {
            return Err(forbidden(format!(
                "Access forbidden for role '{}'.",
                claims.role
            )));
        }
        Ok(Authorized(claims, std::marker::PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_secret() {
        // SAFETY: tous les tests posent la même valeur.
        unsafe { std::env::set_var("JWT_SECRET", "test-secret") };
    }

    #[test]
    fn hash_puis_verification() {
        let hash = hash_password("pikachu123").unwrap();
        assert_ne!(hash, "pikachu123");
        assert!(verify_password(&hash, "pikachu123"));
        assert!(!verify_password(&hash, "raichu123"));
    }

    #[test]
    fn verification_sur_hash_corrompu_echoue() {
        assert!(!verify_password("pas-un-hash", "pikachu123"));
    }

    #[test]
    fn token_aller_retour_conserve_les_claims() {
        setup_secret();
        let token = generate_access_token("ash", 7, Role::Moderator).unwrap();
        let claims = verify_access(&token).unwrap();
        assert_eq!(claims.sub, "ash");
        assert_eq!(claims.id, 7);
        assert_eq!(claims.role, Role::Moderator);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_altere_rejete() {
        setup_secret();
        let token = generate_access_token("ash", 7, Role::User).unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('a') { 'b' } else { 'a' });
        assert!(verify_access(&tampered).is_err());
    }

    #[test]
    fn token_expire_rejete() {
        setup_secret();
        let token = generate_with_ttl("ash", 7, Role::User, -120).unwrap();
        assert!(verify_access(&token).is_err());
    }

    #[test]
    fn token_sans_claims_requis_rejete() {
        setup_secret();
        // Token signé avec la bonne clé mais sans `id` ni `role`.
        #[derive(Serialize)]
        struct Partial {
            sub: String,
            iat: i64,
            exp: i64,
        }
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let partial = Partial {
            sub: "ash".into(),
            iat: now,
            exp: now + 600,
        };
        let token = encode(
            &Header::default(),
            &partial,
            &EncodingKey::from_secret("test-secret".as_bytes()),
        )
        .unwrap();
        assert!(verify_access(&token).is_err());
    }
}
