use crate::cli::parser::{CategoryAction, Commands};
use crate::config::Config;
use crate::core::categories::{CategoryChanges, CategoryLogic};
use crate::core::user::UserLogic;
use crate::db::categories::count_categories;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::models::Category;
use crate::ui::messages::{info, success};
use crate::utils::formatting::category_label;
use crate::utils::table::{Column, Table};

use super::{open_pool, signed_in_user, sync_after_write};

fn current_limit(pool: &DbPool, cfg: &Config) -> AppResult<i32> {
    let user = signed_in_user(cfg)?;
    UserLogic::category_limit(pool, user.as_deref(), cfg.free_category_limit)
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Category { action } = cmd else {
        return Ok(());
    };
    let mut pool = open_pool(cfg)?;

    match action {
        CategoryAction::Add { name, color, icon } => {
            let limit = current_limit(&pool, cfg)?;
            let cat = CategoryLogic::create(&mut pool, name, color, icon, limit)?;
            success(format!("Category '{}' created ({}).", cat.name, cat.id));
        }

        CategoryAction::Edit {
            key,
            name,
            color,
            icon,
            order,
        } => {
            let cat = CategoryLogic::resolve(&pool, key)?;
            let changes = CategoryChanges {
                name: name.clone(),
                color: color.clone(),
                icon: icon.clone(),
                order: *order,
            };
            let cat = CategoryLogic::update(&mut pool, &cat.id, changes)?;
            success(format!("Category '{}' updated.", cat.name));
        }

        CategoryAction::Del { key } => {
            let cat = CategoryLogic::resolve(&pool, key)?;
            CategoryLogic::delete(&mut pool, &cat.id)?;
            success(format!("Category '{}' deleted.", cat.name));
        }

        CategoryAction::Seed => {
            let n = CategoryLogic::seed_defaults(&mut pool)?;
            if n == 0 {
                info("Default categories already present.");
                return Ok(());
            }
            success(format!("{n} default categories created."));
        }

        CategoryAction::Show { key } => {
            let cat = CategoryLogic::resolve(&pool, key)?;
            print_categories(&[cat]);
            return Ok(());
        }

        CategoryAction::List => {
            let cats = CategoryLogic::list(&pool)?;
            print_categories(&cats);

            let limit = current_limit(&pool, cfg)?;
            let used = count_categories(&pool.conn)?;
            println!("\nCategories: {used}/{limit}");
            return Ok(());
        }
    }

    sync_after_write(&mut pool, cfg);
    Ok(())
}

fn print_categories(cats: &[Category]) {
    if cats.is_empty() {
        info("No categories found. Run `timeblocks category seed`.");
        return;
    }

    let mut table = Table::new(vec![
        Column::new("ORDER", 5),
        Column::new("CATEGORY", 24),
        Column::new("COLOR", 8),
        Column::new("KIND", 8),
        Column::new("ID", 36),
    ]);
    for c in cats {
        table.add_row(vec![
            c.order.to_string(),
            category_label(&c.icon, &c.name, &c.color),
            c.color.clone(),
            if c.is_default { "built-in" } else { "custom" }.to_string(),
            c.id.clone(),
        ]);
    }
    print!("{}", table.render());
}
