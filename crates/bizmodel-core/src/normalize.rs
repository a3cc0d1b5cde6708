//! Configuration normalizer
//!
//! Turns the raw JSON payload posted by the client into a
//! [`BusinessConfiguration`]. Sales items arrive with model-specific keys
//! (`startingSubscribers`, `hourlyRate`, `startingGMV`, ...); every semantic
//! field is resolved through one fixed alias chain regardless of the sales
//! model, so rows of mixed origin lay out identically.
//!
//! A value is *blank* when it is missing, `null` or a whitespace-only string.
//! Alias chains also skip a numeric `0`, so the first non-empty alias wins
//! and a field with no non-empty alias resolves to 0.
//!
//! Counts are clamped at zero. A configuration whose staff or non-staff rows
//! would not fit on one sheet is rejected before any layout is planned.

use serde_json::{Map, Value};

use crate::{
    BusinessConfiguration, ConfigurationError, ExtraCategory, NonStaffSelection, SalesItem,
    SalesModel, DEFAULT_ITEM_NAME, MAX_LINE_ITEMS,
};

type Result<T> = std::result::Result<T, ConfigurationError>;

const NAME_KEYS: &[&str] = &[
    "productName",
    "serviceName",
    "planName",
    "transactionType",
    "productLine",
    "usageMetric",
    "streamName",
    "name",
];
const PRICE_KEYS: &[&str] = &["unitPrice", "pricePerUnit", "hourlyRate", "monthlyPrice"];
const VOLUME_KEYS: &[&str] = &[
    "startingUnits",
    "startingHours",
    "startingSubscribers",
    "startingGMV",
    "startingVolume",
];
const GROWTH_KEYS: &[&str] = &["monthlyGrowth", "growthRate"];
const COST_KEYS: &[&str] = &["costPerUnit", "deliveryCost", "costPerSubscriber"];
const MANUFACTURING_COST_KEYS: &[&str] = &["materialCost", "laborCost", "overheadCost"];
const FALLBACK_COST_KEYS: &[&str] = &["cost"];
const CHURN_KEYS: &[&str] = &["churnRate"];
const COMMISSION_KEYS: &[&str] = &["commissionRate"];
const PROCESSING_FEE_KEYS: &[&str] = &["processingFee", "processingFeePercent"];
const GMV_KEYS: &[&str] = &["startingGMV"];

/// Parse and normalize a JSON document
pub fn parse_configuration(json: &str) -> Result<BusinessConfiguration> {
    let raw: Value =
        serde_json::from_str(json).map_err(|e| ConfigurationError::MalformedJson(e.to_string()))?;
    normalize(&raw)
}

/// Normalize an already-parsed JSON value
pub fn normalize(raw: &Value) -> Result<BusinessConfiguration> {
    let root = raw.as_object().ok_or(ConfigurationError::NotAnObject)?;

    let selected_teams = string_list(root.get("selectedTeams"), "selectedTeams")?;

    let mut employee_counts = std::collections::HashMap::new();
    if let Some(counts) = object_field(root, "employeeCounts")? {
        for (team, value) in counts {
            let count = count_value(value, &format!("employeeCounts.{team}"))?;
            employee_counts.insert(team.clone(), count);
        }
    }

    let extra_category = extra_category(root.get("extraCategory"))?;
    let sales_items = sales_items(root.get("salesItems"))?;

    let sales_model = match root.get("salesModel") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(
            s.parse::<SalesModel>()
                .map_err(|reason| ConfigurationError::invalid("salesModel", reason))?,
        ),
        Some(_) => return Err(ConfigurationError::invalid("salesModel", "expected a string")),
    };
    if sales_model.is_none() && !sales_items.is_empty() {
        return Err(ConfigurationError::MissingField("salesModel".into()));
    }

    let mut non_staff_items = Vec::new();
    if let Some(items) = object_field(root, "nonStaffItems")? {
        for (key, value) in items {
            let field = format!("nonStaffItems.{key}");
            let selected = match value {
                Value::Bool(b) => *b,
                Value::Null => false,
                _ => return Err(ConfigurationError::invalid(field, "expected true or false")),
            };
            let (category, item) = key.split_once('|').ok_or_else(|| {
                ConfigurationError::invalid(&field, "key must be \"category|item\"")
            })?;
            non_staff_items.push(NonStaffSelection {
                key: key.clone(),
                category: category.to_string(),
                item: item.to_string(),
                selected,
            });
        }
    }

    let mut non_staff_quantities = std::collections::HashMap::new();
    if let Some(quantities) = object_field(root, "nonStaffQuantities")? {
        for (key, value) in quantities {
            if is_blank(Some(value)) {
                continue;
            }
            let quantity = count_value(value, &format!("nonStaffQuantities.{key}"))?;
            non_staff_quantities.insert(key.clone(), quantity);
        }
    }

    let config = BusinessConfiguration {
        selected_teams,
        employee_counts,
        extra_category,
        sales_model,
        sales_items,
        non_staff_items,
        non_staff_quantities,
    };
    check_row_limit("employeeCounts", config.total_employees())?;
    check_row_limit("nonStaffQuantities", config.total_non_staff_lines())?;

    tracing::debug!(
        teams = config.selected_teams.len(),
        employees = config.total_employees(),
        sales_model = ?config.sales_model,
        sales_items = config.sales_items.len(),
        non_staff_items = config.non_staff_items.len(),
        "normalized configuration"
    );

    Ok(config)
}

fn check_row_limit(field: &str, rows: u64) -> Result<()> {
    if rows > MAX_LINE_ITEMS {
        return Err(ConfigurationError::invalid(
            field,
            format!("{rows} rows exceed the sheet limit of {MAX_LINE_ITEMS}"),
        ));
    }
    Ok(())
}

fn extra_category(value: Option<&Value>) -> Result<Option<ExtraCategory>> {
    let obj = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(obj)) => obj,
        Some(_) => return Err(ConfigurationError::invalid("extraCategory", "expected an object")),
    };

    let name = match obj.get("name") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => {
            return Err(ConfigurationError::invalid(
                "extraCategory.name",
                "expected a string",
            ))
        }
    };

    let options = string_list(obj.get("options"), "extraCategory.options")?
        .into_iter()
        .map(|opt| opt.trim().to_string())
        .filter(|opt| !opt.is_empty())
        .collect();

    Ok(Some(ExtraCategory { name, options }))
}

fn sales_items(value: Option<&Value>) -> Result<Vec<SalesItem>> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ConfigurationError::invalid("salesItems", "expected an array")),
    };

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let path = format!("salesItems[{idx}]");
            let obj = item
                .as_object()
                .ok_or_else(|| ConfigurationError::invalid(&path, "expected an object"))?;
            sales_item(obj, &path)
        })
        .collect()
}

fn sales_item(obj: &Map<String, Value>, path: &str) -> Result<SalesItem> {
    let name = first_text(obj, NAME_KEYS, path)?.unwrap_or_else(|| DEFAULT_ITEM_NAME.to_string());

    let cost_per_unit = match first_number(obj, COST_KEYS, path)? {
        Some(cost) => cost,
        None => match manufacturing_cost(obj, path)? {
            Some(cost) => cost,
            None => first_number(obj, FALLBACK_COST_KEYS, path)?.unwrap_or(0.0),
        },
    };

    Ok(SalesItem {
        name,
        unit_price: first_number(obj, PRICE_KEYS, path)?.unwrap_or(0.0),
        starting_volume: first_number(obj, VOLUME_KEYS, path)?.unwrap_or(0.0),
        growth_rate_percent: first_number(obj, GROWTH_KEYS, path)?.unwrap_or(0.0),
        cost_per_unit,
        churn_rate_percent: first_number(obj, CHURN_KEYS, path)?.unwrap_or(0.0),
        commission_rate_percent: first_number(obj, COMMISSION_KEYS, path)?.unwrap_or(0.0),
        processing_fee_percent: first_number(obj, PROCESSING_FEE_KEYS, path)?.unwrap_or(0.0),
        starting_gmv: first_number(obj, GMV_KEYS, path)?.unwrap_or(0.0),
    })
}

/// Manufacturing items split unit cost into components; sum whichever are present
fn manufacturing_cost(obj: &Map<String, Value>, path: &str) -> Result<Option<f64>> {
    let mut total = None;
    for key in MANUFACTURING_COST_KEYS {
        if let Some(value) = number_value(obj.get(*key), &format!("{path}.{key}"))? {
            *total.get_or_insert(0.0) += value;
        }
    }
    Ok(total.filter(|cost| *cost != 0.0))
}

fn first_number(obj: &Map<String, Value>, keys: &[&str], path: &str) -> Result<Option<f64>> {
    for key in keys {
        if let Some(value) = number_value(obj.get(*key), &format!("{path}.{key}"))? {
            return Ok(Some(value));
        }
    }
    Ok(None)
}

fn first_text(obj: &Map<String, Value>, keys: &[&str], path: &str) -> Result<Option<String>> {
    for key in keys {
        let value = obj.get(*key);
        if is_empty(value) {
            continue;
        }
        match value {
            None => continue,
            Some(Value::String(s)) => return Ok(Some(s.trim().to_string())),
            Some(Value::Number(n)) => return Ok(Some(n.to_string())),
            Some(_) => {
                return Err(ConfigurationError::invalid(
                    format!("{path}.{key}"),
                    "expected a string",
                ))
            }
        }
    }
    Ok(None)
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Blank, or a numeric zero; alias chains move on to the next key
fn is_empty(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        other => is_blank(other),
    }
}

/// Coerce a number or numeric string; empty values yield `None`
fn number_value(value: Option<&Value>, field: &str) -> Result<Option<f64>> {
    if is_empty(value) {
        return Ok(None);
    }
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(ConfigurationError::invalid(field, "expected a number")),
    }
}

/// Coerce a count; negatives clamp to 0 and fractions are truncated
fn count_value(value: &Value, field: &str) -> Result<u32> {
    let Some(n) = number_value(Some(value), field)? else {
        return Ok(0);
    };
    if n <= 0.0 {
        return Ok(0);
    }
    if n > f64::from(u32::MAX) {
        return Err(ConfigurationError::invalid(field, "is too large"));
    }
    Ok(n.trunc() as u32)
}

fn string_list(value: Option<&Value>, field: &str) -> Result<Vec<String>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(ConfigurationError::invalid(
                    format!("{field}[{idx}]"),
                    "expected a string",
                )),
            })
            .collect(),
        Some(_) => Err(ConfigurationError::invalid(field, "expected an array of strings")),
    }
}

fn object_field<'a>(
    root: &'a Map<String, Value>,
    field: &str,
) -> Result<Option<&'a Map<String, Value>>> {
    match root.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(obj)) => Ok(Some(obj)),
        Some(_) => Err(ConfigurationError::invalid(field, "expected an object")),
    }
}
