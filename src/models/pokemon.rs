use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Pokemon {
    pub id: i32,
    pub name: String,
    pub type_1: String,
    pub type_2: Option<String>,
    pub total: i32,
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub sp_atk: i32,
    pub sp_def: i32,
    pub speed: i32,
    pub generation: i32,
    pub legendary: bool,
}

fn default_generation() -> i32 {
    2
}

/// Payload commun au POST et au PUT (remplacement complet).
#[derive(Debug, Serialize, Deserialize)]
pub struct PokemonPayload {
    pub id: i32,
    pub name: String,
    pub type_1: String,
    pub type_2: Option<String>,
    pub total: i32,
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub sp_atk: i32,
    pub sp_def: i32,
    pub speed: i32,
    #[serde(default = "default_generation")]
    pub generation: i32,
    pub legendary: bool,
}

impl PokemonPayload {
    pub fn validate(&self) -> Result<(), String> {
        let name_len = self.name.chars().count();
        if !(2..=30).contains(&name_len) {
            return Err("Name must be between 2 and 30 characters.".into());
        }
        if self.type_1.trim().is_empty() {
            return Err("Type 1 must not be empty.".into());
        }
        if !(5..=199).contains(&self.speed) {
            return Err("Speed must be between 5 and 199.".into());
        }
        if !(1..=6).contains(&self.generation) {
            return Err("Generation must be between 1 and 6.".into());
        }
        Ok(())
    }
}

/// PATCH: seuls les champs présents écrasent la ligne.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PokemonPatch {
    pub name: Option<String>,
    pub type_1: Option<String>,
    pub type_2: Option<String>,
    pub total: Option<i32>,
    pub hp: Option<i32>,
    pub attack: Option<i32>,
    pub defense: Option<i32>,
    pub sp_atk: Option<i32>,
    pub sp_def: Option<i32>,
    pub speed: Option<i32>,
    pub generation: Option<i32>,
    pub legendary: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub sort: Option<String>,
    pub keyword: Option<String>,
    pub col: Option<String>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Boolean,
    Text,
}

/// Liste blanche des colonnes interrogeables. Toute colonne inconnue est
/// un échec de lookup, jamais un accès réfléchi au schéma.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PokemonColumn {
    Id,
    Name,
    Type1,
    Type2,
    Total,
    Hp,
    Attack,
    Defense,
    SpAtk,
    SpDef,
    Speed,
    Generation,
    Legendary,
}

impl PokemonColumn {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "id" => Self::Id,
            "name" => Self::Name,
            "type_1" => Self::Type1,
            "type_2" => Self::Type2,
            "total" => Self::Total,
            "hp" => Self::Hp,
            "attack" => Self::Attack,
            "defense" => Self::Defense,
            "sp_atk" => Self::SpAtk,
            "sp_def" => Self::SpDef,
            "speed" => Self::Speed,
            "generation" => Self::Generation,
            "legendary" => Self::Legendary,
            _ => return None,
        })
    }

    pub fn sql(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Type1 => "type_1",
            Self::Type2 => "type_2",
            Self::Total => "total",
            Self::Hp => "hp",
            Self::Attack => "attack",
            Self::Defense => "defense",
            Self::SpAtk => "sp_atk",
            Self::SpDef => "sp_def",
            Self::Speed => "speed",
            Self::Generation => "generation",
            Self::Legendary => "legendary",
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Name | Self::Type1 | Self::Type2 => ColumnKind::Text,
            Self::Legendary => ColumnKind::Boolean,
            _ => ColumnKind::Integer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Mot-clé déjà typé selon la colonne visée.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedKeyword {
    Integer(i64),
    Boolean(bool),
    Text(String),
}

fn looks_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn looks_boolean(s: &str) -> bool {
    s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false")
}

/// Vérifie qu'un mot-clé est compatible avec le type déclaré de la
/// colonne. Le message d'erreur nomme toujours le type attendu.
pub fn type_keyword(col: PokemonColumn, keyword: &str) -> Result<TypedKeyword, String> {
    match col.kind() {
        ColumnKind::Integer => {
            if looks_numeric(keyword) {
                keyword
                    .parse::<i64>()
                    .map(TypedKeyword::Integer)
                    .map_err(|_| format!("Column '{}' expects a numeric keyword.", col.sql()))
            } else {
                Err(format!("Column '{}' expects a numeric keyword.", col.sql()))
            }
        }
        ColumnKind::Boolean => {
            if looks_boolean(keyword) {
                Ok(TypedKeyword::Boolean(keyword.eq_ignore_ascii_case("true")))
            } else {
                Err(format!(
                    "Column '{}' expects a boolean keyword (true or false).",
                    col.sql()
                ))
            }
        }
        ColumnKind::Text => {
            if looks_numeric(keyword) || looks_boolean(keyword) {
                Err(format!("Column '{}' expects a text keyword.", col.sql()))
            } else {
                Ok(TypedKeyword::Text(keyword.to_string()))
            }
        }
    }
}
