use crate::errors::{AppError, AppResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String, // "#RRGGBB"
    pub icon: String,  // emoji or icon name
    pub is_default: bool,
    pub order: i32,
}

fn hex_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid hex colour pattern"))
}

impl Category {
    pub fn new(name: &str, color: &str, icon: &str, order: i32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            color: color.trim().to_uppercase(),
            icon: icon.trim().to_string(),
            is_default: false,
            order,
        }
    }

    /// The colour as an `(r, g, b)` triple.
    pub fn rgb(&self) -> AppResult<(u8, u8, u8)> {
        parse_hex_color(&self.color)
    }
}

/// Validate and split a `#RRGGBB` colour.
pub fn parse_hex_color(s: &str) -> AppResult<(u8, u8, u8)> {
    if !hex_re().is_match(s) {
        return Err(AppError::InvalidColor(s.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .ok_or_else(|| AppError::InvalidColor(s.to_string()))
    };
    Ok((channel(1..3)?, channel(3..5)?, channel(5..7)?))
}

/// The categories seeded at first run.
pub fn default_categories() -> Vec<Category> {
    [
        ("cat_work", "Work", "#FF5722", "💼"),
        ("cat_learning", "Learning", "#2196F3", "📚"),
        ("cat_sport", "Sport", "#4CAF50", "💪"),
        ("cat_rest", "Rest", "#9C27B0", "🎮"),
        ("cat_family", "Family", "#FF9800", "👨‍👩‍👧‍👦"),
        ("cat_hobby", "Hobby", "#00BCD4", "🎨"),
    ]
    .into_iter()
    .zip(0..)
    .map(|((id, name, color, icon), order)| Category {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
        icon: icon.to_string(),
        is_default: true,
        order,
    })
    .collect()
}
