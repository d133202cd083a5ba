use crate::db::categories as repo;
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::db::time_blocks::count_for_category;
use crate::errors::{AppError, AppResult};
use crate::models::Category;
use crate::models::category::parse_hex_color;

/// Fields that `update` may change; `None` keeps the stored value.
#[derive(Debug, Default, Clone)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub order: Option<i32>,
}

pub struct CategoryLogic;

impl CategoryLogic {
    /// Every stored category counts against `limit`, the seeded defaults too.
    pub fn can_create(pool: &DbPool, limit: i32) -> AppResult<bool> {
        Ok(repo::count_categories(&pool.conn)? < i64::from(limit))
    }

    pub fn create(
        pool: &mut DbPool,
        name: &str,
        color: &str,
        icon: &str,
        limit: i32,
    ) -> AppResult<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("category name cannot be blank".into()));
        }
        parse_hex_color(color.trim())?;

        if !Self::can_create(pool, limit)? {
            return Err(AppError::CategoryLimit { limit });
        }
        if repo::find_by_name(&pool.conn, name)?.is_some() {
            return Err(AppError::Validation(format!("category '{name}' already exists")));
        }

        let order = repo::next_order(&pool.conn)?;
        let cat = Category::new(name, color, icon, order);
        repo::insert_category(pool, &cat)?;

        ttlog_quiet(&pool.conn, "category_add", &cat.id, &format!("Created category '{name}'"));
        tracing::debug!(id = %cat.id, name, "category created");
        Ok(cat)
    }

    pub fn update(pool: &mut DbPool, id: &str, changes: CategoryChanges) -> AppResult<Category> {
        let mut cat = Self::get(pool, id)?;

        if let Some(name) = changes.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::Validation("category name cannot be blank".into()));
            }
            if let Some(other) = repo::find_by_name(&pool.conn, &name)?
                && other.id != cat.id
            {
                return Err(AppError::Validation(format!("category '{name}' already exists")));
            }
            cat.name = name;
        }
        if let Some(color) = changes.color {
            parse_hex_color(color.trim())?;
            cat.color = color.trim().to_uppercase();
        }
        if let Some(icon) = changes.icon {
            cat.icon = icon.trim().to_string();
        }
        if let Some(order) = changes.order {
            cat.order = order;
        }

        repo::update_category(pool, &cat)?;
        ttlog_quiet(&pool.conn, "category_edit", &cat.id, "Updated category");
        Ok(cat)
    }

    /// Refused while any time block still points at the category.
    pub fn delete(pool: &mut DbPool, id: &str) -> AppResult<()> {
        let cat = Self::get(pool, id)?;
        if count_for_category(&pool.conn, id)? > 0 {
            return Err(AppError::CategoryInUse(cat.name));
        }
        repo::delete_category(pool, id)?;
        ttlog_quiet(&pool.conn, "category_del", id, &format!("Deleted category '{}'", cat.name));
        Ok(())
    }

    pub fn list(pool: &DbPool) -> AppResult<Vec<Category>> {
        repo::list_categories(&pool.conn)
    }

    pub fn get(pool: &DbPool, id: &str) -> AppResult<Category> {
        repo::get_category(&pool.conn, id)?.ok_or_else(|| AppError::not_found("Category", id))
    }

    /// Look up by id first, then by name.
    pub fn resolve(pool: &DbPool, key: &str) -> AppResult<Category> {
        if let Some(c) = repo::get_category(&pool.conn, key)? {
            return Ok(c);
        }
        repo::find_by_name(&pool.conn, key)?.ok_or_else(|| AppError::not_found("Category", key))
    }

    pub fn seed_defaults(pool: &mut DbPool) -> AppResult<usize> {
        repo::seed_defaults(pool)
    }
}
