//! Integration tests for workbook planning and formula correctness
//!
//! Formulas are checked numerically by evaluating the planned cells with the
//! small evaluator in `common`, so a broken cross-reference shows up as a
//! wrong number rather than only as a different string.

mod common;

use bizmodel_core::{
    BusinessConfiguration, Generator, MonthAxis, SalesItem, SalesModel, PROJECTION_MONTHS,
};
use bizmodel_render::{
    column_letter, column_number, BlockKind, SectionLayout, SheetPlan, StaffLayout,
    WorkbookGenerator,
};
use common::{clock, evaluate, formula_at, text_at};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

fn axis() -> MonthAxis {
    MonthAxis::from_clock(&clock())
}

fn sales_sheet(config: &BusinessConfiguration) -> SheetPlan {
    let plan = WorkbookGenerator::new().plan(config, &axis()).unwrap();
    plan.sheet("Sales").cloned().unwrap()
}

fn approx(actual: f64, expected: f64) {
    let tolerance = 1e-9 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual}"
    );
}

// ============================================================================
// Staff
// ============================================================================

proptest! {
    #[test]
    fn staff_total_covers_exactly_the_data_rows(counts in prop::collection::vec(0u32..6, 0..5)) {
        let config = counts
            .iter()
            .enumerate()
            .fold(BusinessConfiguration::new(), |config, (i, &count)| {
                config.team(format!("Team {i}"), count)
            });
        let plan = WorkbookGenerator::new().plan(&config, &axis()).unwrap();
        let staff = plan.sheet("Staff").unwrap();
        let employees: u32 = counts.iter().sum();

        prop_assert_eq!(staff.data_row_count() as u32, employees);
        let totals: Vec<_> = staff.blocks_of(BlockKind::Total).collect();
        if employees == 0 {
            prop_assert!(totals.is_empty());
        } else {
            prop_assert_eq!(totals.len(), 1);
            let total_row = totals[0].row;
            prop_assert_eq!(total_row, employees + 2);
            let layout = StaffLayout::plan(&config);
            for month in [0, 23, PROJECTION_MONTHS - 1] {
                let letter = column_letter(layout.month_col(month));
                let address = format!("{letter}{total_row}");
                prop_assert_eq!(
                    formula_at(staff, &address),
                    format!("=SUM({letter}2:{letter}{})", total_row - 1)
                );
            }
        }
    }

    #[test]
    fn column_letters_round_trip(col in 1u16..=16_384) {
        prop_assert_eq!(column_number(&column_letter(col)), Some(col));
    }
}

#[test]
fn staff_monthly_cost_is_a_twelfth_of_salary() {
    let config = BusinessConfiguration::new().team("Engineering", 2);
    let mut plan = WorkbookGenerator::new().plan(&config, &axis()).unwrap();
    let staff = plan.sheets.iter_mut().find(|s| s.name == "Staff").unwrap();
    for block in staff.blocks.iter_mut().filter(|b| b.kind == BlockKind::Data) {
        for cell in block.cells.iter_mut().filter(|c| c.cell.col == 5) {
            cell.value = bizmodel_render::CellValue::Number(60_000.0);
        }
    }

    approx(evaluate(staff, "F2"), 5_000.0);
    approx(evaluate(staff, "BA3"), 5_000.0);
    approx(evaluate(staff, "F4"), 10_000.0);
}

#[test]
fn column_letters_for_month_columns() {
    for col in 1..=26u16 {
        assert_eq!(column_letter(col).len(), 1);
    }
    for col in 27..=74u16 {
        assert_eq!(column_letter(col).len(), 2);
        assert_eq!(column_number(&column_letter(col)), Some(col));
    }
    assert_eq!(column_letter(27), "AA");
    assert_eq!(column_letter(31), "AE");
}

// ============================================================================
// Sales
// ============================================================================

#[test]
fn saas_volume_follows_churn_adjusted_recurrence() {
    let (v0, churn, growth): (f64, f64, f64) = (250.0, 0.04, 0.07);
    let config = BusinessConfiguration::new()
        .sales_model(SalesModel::Saas)
        .sales_item(SalesItem::new("Pro").starting_volume(v0).churn(4.0).growth(7.0));
    let sheet = sales_sheet(&config);
    let layout = SectionLayout::new(1);
    let row = layout.volume_row(0).unwrap();

    for n in 0..=5usize {
        let address = format!("{}{row}", column_letter(SectionLayout::month_col(n)));
        let expected = v0 * ((1.0 - churn) * (1.0 + growth)).powi(n as i32);
        approx(evaluate(&sheet, &address), expected);
    }
}

#[test]
fn other_models_compound_in_closed_form() {
    for model in [
        SalesModel::Product,
        SalesModel::Service,
        SalesModel::Subscription,
        SalesModel::Usage,
        SalesModel::Manufacturing,
        SalesModel::Marketplace,
    ] {
        let config = BusinessConfiguration::new()
            .sales_model(model)
            .sales_item(SalesItem::new("Line").starting_volume(120.0).growth(3.0).churn(50.0));
        let sheet = sales_sheet(&config);
        let row = SectionLayout::new(1).volume_row(0).unwrap();

        for n in [0usize, 1, 2, 12, 47] {
            let letter = column_letter(SectionLayout::month_col(n));
            let address = format!("{letter}{row}");
            if n > 0 {
                assert_eq!(
                    formula_at(&sheet, &address),
                    format!("=B{row}*POWER(1+C{row},{n})"),
                    "{model}"
                );
            }
            approx(evaluate(&sheet, &address), 120.0 * 1.03f64.powi(n as i32));
        }
    }
}

#[test]
fn revenue_and_cogs_rows_resolve_to_their_volume_row() {
    for n in [1usize, 2, 10, 50] {
        let config = (0..n).fold(
            BusinessConfiguration::new().sales_model(SalesModel::Product),
            |config, i| config.sales_item(SalesItem::new(format!("Item {i}"))),
        );
        let sheet = sales_sheet(&config);
        let layout = SectionLayout::new(n as u32);
        assert_eq!(layout.volume_start_row, layout.revenue_start_row + n as u32 + 4);

        for k in 0..n {
            let volume_row = layout.volume_start_row + k as u32;
            let revenue_row = layout.revenue_row(k).unwrap();
            let cogs_row = layout.cogs_row(k).unwrap();

            let name = format!("Item {k}");
            assert_eq!(text_at(&sheet, &format!("A{volume_row}")), Some(name.as_str()));
            assert_eq!(
                formula_at(&sheet, &format!("E{revenue_row}")),
                format!("=B{volume_row}*C{revenue_row}")
            );
            assert_eq!(
                formula_at(&sheet, &format!("AY{revenue_row}")),
                format!("=AY{volume_row}*C{revenue_row}")
            );
            assert_eq!(
                formula_at(&sheet, &format!("M{cogs_row}")),
                format!("=M{volume_row}*C{cogs_row}")
            );
        }
        assert_eq!(
            text_at(&sheet, &format!("A{}", layout.gross_profit_row)),
            Some("GROSS PROFIT")
        );
    }
}

#[test]
fn gross_profit_is_revenue_minus_cogs() {
    let config = BusinessConfiguration::new()
        .sales_model(SalesModel::Product)
        .sales_item(
            SalesItem::new("Widget")
                .unit_price(25.0)
                .starting_volume(40.0)
                .growth(5.0)
                .cost_per_unit(10.0),
        )
        .sales_item(
            SalesItem::new("Gadget")
                .unit_price(100.0)
                .starting_volume(3.0)
                .cost_per_unit(60.0),
        );
    let sheet = sales_sheet(&config);
    let layout = SectionLayout::new(2);

    let gp = layout.gross_profit_row;
    approx(evaluate(&sheet, &format!("E{gp}")), 40.0 * 15.0 + 3.0 * 40.0);
    let month_3 = 40.0 * 1.05f64.powi(3) * 15.0 + 3.0 * 40.0;
    approx(evaluate(&sheet, &format!("H{gp}")), month_3);
}

#[test]
fn marketplace_revenue_and_cogs_are_shares_of_gmv() {
    let config = BusinessConfiguration::new()
        .sales_model(SalesModel::Marketplace)
        .sales_item(
            SalesItem::new("Orders")
                .starting_gmv(10_000.0)
                .growth(5.0)
                .commission(12.0)
                .processing_fee(3.0),
        );
    let sheet = sales_sheet(&config);
    let layout = SectionLayout::new(1);
    let revenue = layout.revenue_row(0).unwrap();
    let cogs = layout.cogs_row(0).unwrap();
    let gp = layout.gross_profit_row;

    for n in [0usize, 3] {
        let letter = column_letter(SectionLayout::month_col(n));
        let gmv = 10_000.0 * 1.05f64.powi(n as i32);
        approx(evaluate(&sheet, &format!("{letter}{revenue}")), gmv * 0.12);
        approx(evaluate(&sheet, &format!("{letter}{cogs}")), gmv * 0.03);
        approx(evaluate(&sheet, &format!("{letter}{gp}")), gmv * 0.12 - gmv * 0.03);
    }
}

#[test]
fn saas_scenario_from_json() {
    let raw = json!({
        "salesModel": "saas",
        "salesItems": [{
            "planName": "Pro",
            "startingSubscribers": 100,
            "churnRate": 5,
            "growthRate": 10,
            "monthlyPrice": 20
        }]
    });
    let plan = WorkbookGenerator::new().plan_json(&raw, &clock()).unwrap();
    let sheet = plan.sheet("Sales").unwrap();
    let layout = SectionLayout::new(1);
    let volume = layout.volume_start_row;
    let revenue = layout.revenue_start_row;

    assert_eq!(
        sheet.cell(&format!("E{volume}")).and_then(|c| c.value.as_number()),
        Some(100.0)
    );
    approx(evaluate(sheet, &format!("F{volume}")), 104.5);
    approx(evaluate(sheet, &format!("E{revenue}")), 2000.0);
    approx(evaluate(sheet, &format!("F{revenue}")), 2090.0);
}

// ============================================================================
// Whole workbook
// ============================================================================

#[test]
fn all_empty_configuration_gets_placeholders() {
    let raw = json!({
        "selectedTeams": [],
        "salesItems": [],
        "nonStaffItems": {}
    });
    let generator = WorkbookGenerator::new();
    let plan = generator.plan_json(&raw, &clock()).unwrap();

    for sheet in &plan.sheets {
        assert_eq!(sheet.blocks_of(BlockKind::Total).count(), 0, "{}", sheet.name);
        assert_eq!(sheet.blocks_of(BlockKind::Data).count(), 0, "{}", sheet.name);
        assert_eq!(sheet.blocks_of(BlockKind::Header).count(), 1, "{}", sheet.name);
        let placeholder = text_at(sheet, "A2").unwrap_or_default();
        assert!(placeholder.starts_with("[Add your"), "{}", sheet.name);
    }

    let bytes = generator.generate_from_json(&raw, &clock()).unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[test]
fn extra_category_adds_column_and_dropdown() {
    let raw = json!({
        "selectedTeams": ["Engineering", "Sales"],
        "employeeCounts": {"Engineering": 2, "Sales": 1},
        "extraCategory": {"name": "Cost Center", "options": ["A", "B"]}
    });
    let plan = WorkbookGenerator::new().plan_json(&raw, &clock()).unwrap();
    let staff = plan.sheet("Staff").unwrap();

    assert_eq!(text_at(staff, "D1"), Some("Direct/Overhead"));
    assert_eq!(text_at(staff, "E1"), Some("Cost Center"));
    assert_eq!(text_at(staff, "F1"), Some("Annual Salary"));
    assert_eq!(formula_at(staff, "G2"), "=F2/12");

    let dropdown = staff
        .validations
        .iter()
        .find(|v| v.range.start.col == 5)
        .unwrap();
    assert_eq!(dropdown.range.to_string(), "E2:E4");
    assert_eq!(dropdown.options, vec!["A", "B"]);
    assert!(dropdown.allow_blank);
}

#[test]
fn same_input_and_clock_give_same_workbook() {
    let raw = json!({
        "selectedTeams": ["Ops"],
        "employeeCounts": {"Ops": 3},
        "salesModel": "marketplace",
        "salesItems": [{"transactionType": "Orders", "startingGMV": 10000, "commissionRate": 12}],
        "nonStaffItems": {"Office|Rent": true, "Software|CRM": true},
        "nonStaffQuantities": {"Software|CRM": 2}
    });
    let generator = WorkbookGenerator::new().currency("$");

    let first = generator.plan_json(&raw, &clock()).unwrap();
    let second = generator.plan_json(&raw, &clock()).unwrap();
    assert_eq!(first, second);

    // workbook bytes embed a creation timestamp, so compare the archives' shape only
    let config = bizmodel_core::normalize(&raw).unwrap();
    let a = generator.generate(&config, &axis()).unwrap();
    let b = generator.generate(&config, &axis()).unwrap();
    assert!(a.starts_with(b"PK") && b.starts_with(b"PK"));
    assert!(a.len().abs_diff(b.len()) < 16);
}

#[test]
fn month_headers_follow_the_clock() {
    let plan = WorkbookGenerator::new()
        .plan_json(&json!({"selectedTeams": ["Ops"], "employeeCounts": {"Ops": 1}}), &clock())
        .unwrap();
    let staff = plan.sheet("Staff").unwrap();
    assert_eq!(text_at(staff, "F1"), Some("Jan 2025"));
    assert_eq!(text_at(staff, "H1"), Some("Mar 2025"));
    assert!(text_at(staff, "BA1").is_some());
    assert!(staff.cell("BB1").is_none());
}
