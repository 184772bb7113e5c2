//! Resolution pipeline: reads data files, resolves names, builds the catalog.
//!
//! Provides format detection (RON/JSON/TOML), file discovery and
//! deserialization helpers, plus [`load_kitchen_data`] which turns a data
//! directory into a validated [`Catalog`] and [`KitchenConfig`].
//!
//! # Directory layout
//!
//! | Base name | Required | Contents                     |
//! |-----------|----------|------------------------------|
//! | `items`   | yes      | list of [`ItemData`]         |
//! | `recipes` | yes      | list of [`RecipeData`]       |
//! | `meals`   | yes      | list of [`MealData`]         |
//! | `ranks`   | no       | list of [`RankData`]         |
//! | `kitchen` | no       | a [`KitchenConfig`] table    |
//!
//! Each base name may use any one of the supported extensions.

use std::path::{Path, PathBuf};

use gather_core::catalog::{
    Catalog, CatalogBuilder, CatalogError, ItemDef, MealDef, RankDef, RecipeDef,
};
use gather_core::config::{ConfigError, KitchenConfig};
use gather_core::fixed::{Seconds, try_secs};
use gather_core::id::{ItemId, MealId};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::schema::{ItemAmountData, ItemData, MealData, RankData, RecipeData};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A number in a definition is out of range for the simulation.
    #[error("'{name}' in {file}: {field} = {value} is out of range")]
    InvalidValue {
        file: PathBuf,
        name: String,
        field: &'static str,
        value: f64,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The resolved definitions failed catalog validation.
    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),

    /// The kitchen settings were parsed but cannot be run.
    #[error("invalid kitchen config: {0}")]
    Config(#[from] ConfigError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

const EXTENSIONS: [(&str, Format); 3] = [
    ("ron", Format::Ron),
    ("toml", Format::Toml),
    ("json", Format::Json),
];

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    let ext = path.extension().and_then(|e| e.to_str());
    EXTENSIONS
        .iter()
        .find(|(name, _)| Some(*name) == ext)
        .map(|(_, format)| *format)
        .ok_or_else(|| DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for (ext, _) in &EXTENSIONS {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Deserialize `content` in the given format. `file` is only used in errors.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    file: &Path,
) -> Result<T, DataLoadError> {
    let parse_err = |detail: String| DataLoadError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string())),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

/// Deserialize a list from a file. For TOML files, extracts the array at the
/// given `toml_key` from a top-level table. For RON and JSON, deserializes
/// directly as `Vec<T>`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    if format != Format::Toml {
        return deserialize_str(&content, format, path);
    }
    let table: toml::Value = deserialize_str(&content, format, path)?;
    let array = table
        .get(toml_key)
        .ok_or_else(|| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: format!("missing key '{toml_key}' in TOML file"),
        })?
        .clone();
    array
        .try_into()
        .map_err(|e: toml::de::Error| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        })
}

// ===========================================================================
// Catalog resolution
// ===========================================================================

/// Definitions read from one data directory, before name resolution.
#[derive(Debug, Clone, Default)]
pub struct KitchenDataFiles {
    pub items: Vec<ItemData>,
    pub recipes: Vec<RecipeData>,
    pub meals: Vec<MealData>,
    pub ranks: Vec<RankData>,
}

/// Paths the definitions came from, for error messages.
#[derive(Debug, Clone, Default)]
pub struct SourcePaths {
    pub items: PathBuf,
    pub recipes: PathBuf,
    pub meals: PathBuf,
    pub ranks: PathBuf,
}

fn resolve_item(
    builder: &CatalogBuilder,
    name: &str,
    file: &Path,
) -> Result<ItemId, DataLoadError> {
    builder.item_id(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind: "item",
    })
}

fn resolve_meal(
    builder: &CatalogBuilder,
    name: &str,
    file: &Path,
) -> Result<MealId, DataLoadError> {
    builder.meal_id(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind: "meal",
    })
}

fn duplicate(name: &str, file: &Path) -> DataLoadError {
    DataLoadError::DuplicateName {
        file: file.to_path_buf(),
        name: name.to_string(),
    }
}

fn resolve_lines(
    builder: &CatalogBuilder,
    lines: &[ItemAmountData],
    file: &Path,
) -> Result<Vec<(ItemId, u32)>, DataLoadError> {
    lines
        .iter()
        .map(|line| Ok((resolve_item(builder, line.item(), file)?, line.amount())))
        .collect()
}

fn item_def(data: &ItemData) -> ItemDef {
    let mut def = ItemDef::new(&data.name)
        .category(data.category)
        .plate_role(data.plate_role);
    if let Some(max_stack) = data.max_stack {
        def = def.max_stack(max_stack);
    }
    if !data.can_get_dirty {
        def = def.always_clean();
    }
    if !data.ingredient {
        def = def.not_ingredient();
    }
    def
}

fn recipe_def(
    builder: &CatalogBuilder,
    data: &RecipeData,
    file: &Path,
) -> Result<RecipeDef, DataLoadError> {
    let cook_time = try_secs(data.cook_time).ok_or_else(|| DataLoadError::InvalidValue {
        file: file.to_path_buf(),
        name: data.name.clone(),
        field: "cook_time",
        value: data.cook_time,
    })?;
    let mut def = RecipeDef::new(&data.name)
        .cook_time(cook_time.max(Seconds::ZERO))
        .progress_steps(data.progress_steps);
    if data.cook_time < 0.0 {
        warn!(recipe = %data.name, cook_time = data.cook_time, "negative cook time clamped to zero");
    }
    if data.stations.is_empty() {
        warn!(recipe = %data.name, "recipe lists no stations and will never run");
    }
    for &kind in &data.stations {
        def = def.station(kind);
    }
    for (item, amount) in resolve_lines(builder, &data.inputs, file)? {
        def = def.input(item, amount);
    }
    for (item, amount) in resolve_lines(builder, &data.outputs, file)? {
        def = def.output(item, amount);
    }
    if let Some(alternate) = &data.alternate {
        def = def.alternate(resolve_item(builder, alternate, file)?);
    }
    if !data.visible {
        def = def.hidden();
    }
    if let Some(colors) = data.vfx_colors {
        def = def.vfx_colors(colors);
    }
    Ok(def)
}

/// Resolve names and build a validated catalog.
///
/// Items register first, then recipes and meals (which reference items),
/// then ranks (which reference meals). A name used twice within one kind
/// is an error.
pub fn build_catalog(files: &KitchenDataFiles, paths: &SourcePaths) -> Result<Catalog, DataLoadError> {
    let mut builder = CatalogBuilder::new();

    // Phase 1: Items
    for item in &files.items {
        if builder.item_id(&item.name).is_some() {
            return Err(duplicate(&item.name, &paths.items));
        }
        builder.register_item(item_def(item));
    }

    // Phase 2: Recipes (resolve item refs by name)
    for recipe in &files.recipes {
        if builder.recipe_id(&recipe.name).is_some() {
            return Err(duplicate(&recipe.name, &paths.recipes));
        }
        let def = recipe_def(&builder, recipe, &paths.recipes)?;
        builder.register_recipe(def);
    }

    // Phase 3: Meals (resolve item refs by name)
    for meal in &files.meals {
        if builder.meal_id(&meal.name).is_some() {
            return Err(duplicate(&meal.name, &paths.meals));
        }
        let mut def = MealDef::new(&meal.name).complexity(meal.complexity);
        for name in &meal.items {
            def = def.item(resolve_item(&builder, name, &paths.meals)?);
        }
        for &category in &meal.categories {
            def = def.category(category);
        }
        builder.register_meal(def);
    }

    // Phase 4: Ranks (resolve meal refs by name)
    for rank in &files.ranks {
        let mut def =
            RankDef::new(&rank.name, rank.min_meals_delivered).max_orders_active(rank.max_orders_active);
        for name in &rank.meals {
            def = def.meal(resolve_meal(&builder, name, &paths.ranks)?);
        }
        builder.register_rank(def);
    }

    Ok(builder.build()?)
}

// ===========================================================================
// Directory loading
// ===========================================================================

/// Everything a kitchen needs from a data directory.
#[derive(Debug)]
pub struct KitchenData {
    pub catalog: Catalog,
    pub config: KitchenConfig,
}

/// Read kitchen settings. A missing file yields the defaults.
pub fn load_config(dir: &Path) -> Result<KitchenConfig, DataLoadError> {
    let config = match find_data_file(dir, "kitchen")? {
        Some(path) => deserialize_file::<KitchenConfig>(&path)?,
        None => {
            debug!(dir = %dir.display(), "no kitchen config, using defaults");
            KitchenConfig::default()
        }
    };
    config.validate()?;
    Ok(config)
}

/// Load the catalog and config from `dir`.
pub fn load_kitchen_data(dir: &Path) -> Result<KitchenData, DataLoadError> {
    let items_path = require_data_file(dir, "items")?;
    let recipes_path = require_data_file(dir, "recipes")?;
    let meals_path = require_data_file(dir, "meals")?;
    let ranks_path = find_data_file(dir, "ranks")?;

    let files = KitchenDataFiles {
        items: deserialize_list(&items_path, "items")?,
        recipes: deserialize_list(&recipes_path, "recipes")?,
        meals: deserialize_list(&meals_path, "meals")?,
        ranks: match &ranks_path {
            Some(path) => deserialize_list(path, "ranks")?,
            None => Vec::new(),
        },
    };
    let paths = SourcePaths {
        items: items_path,
        recipes: recipes_path,
        meals: meals_path,
        ranks: ranks_path.unwrap_or_default(),
    };

    let catalog = build_catalog(&files, &paths)?;
    debug!(
        items = files.items.len(),
        recipes = files.recipes.len(),
        meals = files.meals.len(),
        ranks = files.ranks.len(),
        "catalog loaded"
    );
    let config = load_config(dir)?;
    Ok(KitchenData { catalog, config })
}

// ===========================================================================
// Tests
// ===========================================================================
