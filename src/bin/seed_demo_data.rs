use chrono::Local;
use std::error::Error;
use std::fs;
use std::path::Path;

use board_ledger::app::{get_default_db_path, AppState};
use board_ledger::domain::{NewIngredient, NewRecipe, ProductionGoal, RecipeIngredient};
use board_ledger::{IngredientCategory, IngredientUnit, RecipeCategory};

// (名称, 分类, 数量, 单位, 低库存阈值)
const DEMO_INGREDIENTS: &[(&str, IngredientCategory, f64, IngredientUnit, f64)] = &[
    ("Brie", IngredientCategory::Cheese, 32.0, IngredientUnit::Oz, 8.0),
    ("Aged Cheddar", IngredientCategory::Cheese, 24.0, IngredientUnit::Oz, 8.0),
    ("Genoa Salami", IngredientCategory::Meat, 40.0, IngredientUnit::Slices, 12.0),
    ("Prosciutto", IngredientCategory::Meat, 6.0, IngredientUnit::Oz, 6.0),
    ("Red Grapes", IngredientCategory::Fruit, 3.0, IngredientUnit::Cups, 2.0),
    ("Water Crackers", IngredientCategory::Crackers, 60.0, IngredientUnit::Each, 20.0),
    ("Marcona Almonds", IngredientCategory::Nuts, 2.0, IngredientUnit::Cups, 1.0),
    ("Fig Jam", IngredientCategory::Spreads, 1.0, IngredientUnit::Container, 1.0),
    ("Dark Chocolate", IngredientCategory::Sweets, 10.0, IngredientUnit::Oz, 4.0),
    ("Rosemary", IngredientCategory::Garnish, 4.0, IngredientUnit::Stalks, 2.0),
];

fn main() -> Result<(), Box<dyn Error>> {
    board_ledger::logging::init();

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(get_default_db_path);

    backup_and_reset_db(&db_path)?;

    let state = AppState::new(db_path.clone())?;
    seed_demo(&state)?;
    print_quick_counts(&state)?;

    eprintln!("Seeded demo data into {}", db_path);
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_demo(state: &AppState) -> Result<(), Box<dyn Error>> {
    let mut ids = std::collections::HashMap::new();
    for (name, category, qty, unit, threshold) in DEMO_INGREDIENTS {
        let ingredient = state.ingredient_api.create_ingredient(NewIngredient {
            name: name.to_string(),
            category: *category,
            is_custom: false,
            current_quantity: *qty,
            unit: *unit,
            low_stock_threshold: Some(*threshold),
            aliases: Vec::new(),
        })?;
        ids.insert(*name, (ingredient.ingredient_id, *unit));
    }

    let line = |name: &str, quantity: f64| -> Result<RecipeIngredient, Box<dyn Error>> {
        let (id, unit) = ids
            .get(name)
            .ok_or_else(|| format!("unknown demo ingredient: {}", name))?;
        Ok(RecipeIngredient {
            ingredient_id: id.clone(),
            ingredient_name: name.to_string(),
            quantity,
            unit: *unit,
            notes: None,
        })
    };

    let classic = state.recipe_api.create_recipe(NewRecipe {
        name: "Classic Board".to_string(),
        category: RecipeCategory::Classic,
        display_order: 1,
        ingredients: vec![
            line("Brie", 4.0)?,
            line("Genoa Salami", 6.0)?,
            line("Water Crackers", 10.0)?,
            line("Red Grapes", 0.5)?,
        ],
        is_active: true,
    })?;

    state.recipe_api.create_recipe(NewRecipe {
        name: "Italian Board".to_string(),
        category: RecipeCategory::Specialty,
        display_order: 1,
        ingredients: vec![
            line("Prosciutto", 3.0)?,
            line("Aged Cheddar", 4.0)?,
            line("Fig Jam", 0.25)?,
            line("Rosemary", 1.0)?,
        ],
        is_active: true,
    })?;

    let sweet = state.recipe_api.create_recipe(NewRecipe {
        name: "Sweet Tooth Board".to_string(),
        category: RecipeCategory::Sweet,
        display_order: 1,
        ingredients: vec![
            line("Dark Chocolate", 3.0)?,
            line("Marcona Almonds", 0.5)?,
            line("Red Grapes", 0.5)?,
        ],
        is_active: true,
    })?;

    state
        .order_api
        .create_order(&classic.recipe_id, 2, Some("Saturday market".to_string()))?;
    let done = state.order_api.create_order(&sweet.recipe_id, 1, None)?;
    state.order_api.complete_order(&done.order_id)?;

    Ok(())
}

fn print_quick_counts(state: &AppState) -> Result<(), Box<dyn Error>> {
    let summary = state.dashboard_api.get_summary()?;
    println!("ingredients:      {}", summary.total_ingredients);
    println!("low stock:        {}", summary.low_stock_count);
    println!("active orders:    {}", summary.active_orders);
    println!("makeable recipes: {}", summary.can_make_count);

    let list = state
        .planning_api
        .generate_shopping_list(true, &[ProductionGoal::new("missing-recipe", 1)])?;
    println!(
        "shopping items:   {} (skipped goals: {})",
        list.summary.total_items,
        list.skipped_goals.len()
    );
    Ok(())
}
