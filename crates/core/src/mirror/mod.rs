//! Spreadsheet Mirror
//!
//! A workbook-shaped formula graph built from the same resolved inputs as the
//! engine. Lookup and input cells hold literals; every other cell holds an
//! [`Expr`] over other cells. Evaluating the graph reproduces the engine's
//! numbers, editing an input with [`Workbook::set_number`] and evaluating
//! again recomputes everything downstream, and rendering it yields the
//! formulas a spreadsheet would carry. Nothing here writes a file.

mod build;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::formula::{refer, Expr, FormulaError};

pub use build::build_workbook;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Tab {
    Lookups,
    Inputs,
    CalcEngine,
    FiveYearDcf,
    Scenarios,
    OpportunityCost,
    RevenueAndScale,
    Dashboard,
    Sources,
}

impl Tab {
    pub const ALL: [Tab; 9] = [
        Self::Lookups,
        Self::Inputs,
        Self::CalcEngine,
        Self::FiveYearDcf,
        Self::Scenarios,
        Self::OpportunityCost,
        Self::RevenueAndScale,
        Self::Dashboard,
        Self::Sources,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Lookups => "Lookups",
            Self::Inputs => "Inputs",
            Self::CalcEngine => "Calc Engine",
            Self::FiveYearDcf => "5-Year DCF",
            Self::Scenarios => "Scenarios",
            Self::OpportunityCost => "Opportunity Cost",
            Self::RevenueAndScale => "Revenue & Scale",
            Self::Dashboard => "Dashboard",
            Self::Sources => "Sources",
        }
    }

    /// Prefix of every cell id on this tab.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Lookups => "lookups",
            Self::Inputs => "inputs",
            Self::CalcEngine => "calc",
            Self::FiveYearDcf => "dcf",
            Self::Scenarios => "scenarios",
            Self::OpportunityCost => "inaction",
            Self::RevenueAndScale => "revenue",
            Self::Dashboard => "dashboard",
            Self::Sources => "sources",
        }
    }

    fn sheet_reference(&self) -> String {
        let title = self.title();
        if title.chars().all(|character| character.is_ascii_alphanumeric()) {
            format!("{title}!")
        } else {
            format!("'{title}'!")
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CellContent {
    Number(f64),
    Text(String),
    Formula(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub id: String,
    pub tab: Tab,
    pub row: u32,
    pub label: String,
    pub content: CellContent,
}

impl Cell {
    /// Address of the value column: labels sit in column A, values in B.
    pub fn address(&self) -> String {
        format!("{}B{}", self.tab.sheet_reference(), self.row)
    }
}

/// Row 1 of every tab is the header.
const HEADER_ROWS: u32 = 1;

#[derive(Clone, Debug, Default)]
pub struct Workbook {
    cells: Vec<Cell>,
    index: BTreeMap<String, usize>,
    last_row: BTreeMap<Tab, u32>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a cell to the next free row of `tab` and returns a reference
    /// expression to it.
    pub fn insert(
        &mut self,
        tab: Tab,
        id: impl Into<String>,
        label: impl Into<String>,
        content: CellContent,
    ) -> Result<Expr, FormulaError> {
        let id = id.into();
        if self.index.contains_key(&id) {
            return Err(FormulaError::DuplicateName(id));
        }

        let row = self.last_row.entry(tab).or_insert(HEADER_ROWS);
        *row += 1;
        let row = *row;

        self.index.insert(id.clone(), self.cells.len());
        self.cells.push(Cell { id: id.clone(), tab, row, label: label.into(), content });
        Ok(refer(id))
    }

    /// Overwrites a literal number cell, as typing into it would. Formula and
    /// text cells are refused.
    pub fn set_number(&mut self, id: &str, value: f64) -> Result<(), FormulaError> {
        let cell = self
            .index
            .get(id)
            .and_then(|position| self.cells.get_mut(*position))
            .ok_or_else(|| FormulaError::UnknownName(id.to_owned()))?;
        match &mut cell.content {
            CellContent::Number(current) => {
                *current = value;
                Ok(())
            }
            CellContent::Text(_) | CellContent::Formula(_) => Err(FormulaError::NotEditable(id.to_owned())),
        }
    }

    pub fn cell(&self, id: &str) -> Option<&Cell> {
        self.index.get(id).and_then(|position| self.cells.get(*position))
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn tab(&self, tab: Tab) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter().filter(move |cell| cell.tab == tab)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn address(&self, id: &str) -> Option<String> {
        self.cell(id).map(Cell::address)
    }

    /// Cell content as a spreadsheet stores it; formulas carry a leading `=`.
    pub fn formula(&self, id: &str) -> Option<String> {
        let cell = self.cell(id)?;
        Some(match &cell.content {
            CellContent::Number(value) => Expr::Num(*value).to_string(),
            CellContent::Text(text) => text.clone(),
            CellContent::Formula(expr) => {
                let address = |name: &str| self.address(name).unwrap_or_else(|| "#REF!".to_owned());
                format!("={}", expr.render(&address))
            }
        })
    }

    /// Evaluates every numeric cell in dependency order.
    pub fn evaluate(&self) -> Result<WorkbookValues, FormulaError> {
        let mut values = BTreeMap::new();
        let mut visiting = BTreeSet::new();
        for cell in &self.cells {
            self.resolve(&cell.id, &mut values, &mut visiting)?;
        }

        debug!(
            event_name = "mirror.workbook.evaluated",
            cells = self.cells.len(),
            numeric_cells = values.len(),
            "workbook evaluated"
        );
        Ok(WorkbookValues(values))
    }

    fn resolve(
        &self,
        id: &str,
        values: &mut BTreeMap<String, f64>,
        visiting: &mut BTreeSet<String>,
    ) -> Result<Option<f64>, FormulaError> {
        if let Some(value) = values.get(id) {
            return Ok(Some(*value));
        }
        let cell = self.cell(id).ok_or_else(|| FormulaError::UnknownName(id.to_owned()))?;

        let value = match &cell.content {
            CellContent::Text(_) => return Ok(None),
            CellContent::Number(value) => *value,
            CellContent::Formula(expr) => {
                if !visiting.insert(id.to_owned()) {
                    return Err(FormulaError::CircularReference(id.to_owned()));
                }
                for reference in expr.references() {
                    if self.resolve(&reference, values, visiting)?.is_none() {
                        return Err(FormulaError::NotNumeric(reference));
                    }
                }
                visiting.remove(id);
                expr.eval(&|name| values.get(name).copied())?
            }
        };

        values.insert(id.to_owned(), value);
        Ok(Some(value))
    }
}

/// Numeric results of [`Workbook::evaluate`], keyed by cell id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkbookValues(BTreeMap<String, f64>);

impl WorkbookValues {
    pub fn get(&self, id: &str) -> Option<f64> {
        self.0.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(id, value)| (id.as_str(), *value))
    }
}

#[cfg(test)]
mod tests {
    use super::{CellContent, Tab, Workbook};
    use crate::formula::{max_of, num, refer, FormulaError};

    fn small() -> Result<Workbook, FormulaError> {
        let mut workbook = Workbook::new();
        let team = workbook.insert(Tab::Inputs, "inputs.team_size", "Team size", CellContent::Number(10.0))?;
        let salary =
            workbook.insert(Tab::Inputs, "inputs.avg_salary", "Average salary", CellContent::Number(80_000.0))?;
        let labor = workbook.insert(
            Tab::CalcEngine,
            "calc.annual_labor_cost",
            "Annual labor cost",
            CellContent::Formula(team * salary),
        )?;
        workbook.insert(
            Tab::CalcEngine,
            "calc.floor",
            "Floored",
            CellContent::Formula(max_of([labor, num(0.0)])),
        )?;
        Ok(workbook)
    }

    #[test]
    fn rows_are_assigned_per_tab_below_the_header() {
        let workbook = small().expect("builds");
        assert_eq!(workbook.address("inputs.team_size").as_deref(), Some("Inputs!B2"));
        assert_eq!(workbook.address("inputs.avg_salary").as_deref(), Some("Inputs!B3"));
        assert_eq!(workbook.address("calc.annual_labor_cost").as_deref(), Some("'Calc Engine'!B2"));
        assert_eq!(workbook.tab(Tab::Inputs).count(), 2);
    }

    #[test]
    fn formulas_render_with_cell_addresses() {
        let workbook = small().expect("builds");
        assert_eq!(workbook.formula("calc.annual_labor_cost").as_deref(), Some("=Inputs!B2*Inputs!B3"));
        assert_eq!(workbook.formula("calc.floor").as_deref(), Some("=MAX('Calc Engine'!B2, 0)"));
        assert_eq!(workbook.formula("inputs.team_size").as_deref(), Some("10"));
    }

    #[test]
    fn evaluation_follows_dependencies_regardless_of_insertion_order() {
        let mut workbook = Workbook::new();
        workbook
            .insert(Tab::CalcEngine, "calc.double", "Double", CellContent::Formula(refer("inputs.x") * 2.0))
            .expect("inserts");
        workbook.insert(Tab::Inputs, "inputs.x", "X", CellContent::Number(21.0)).expect("inserts");

        let values = workbook.evaluate().expect("evaluates");
        assert_eq!(values.get("calc.double"), Some(42.0));
    }

    #[test]
    fn cycles_are_reported() {
        let mut workbook = Workbook::new();
        workbook.insert(Tab::CalcEngine, "calc.a", "A", CellContent::Formula(refer("calc.b") + 1.0)).expect("a");
        workbook.insert(Tab::CalcEngine, "calc.b", "B", CellContent::Formula(refer("calc.a") + 1.0)).expect("b");

        let error = workbook.evaluate().expect_err("cycle");
        assert!(matches!(error, FormulaError::CircularReference(_)));
    }

    #[test]
    fn dangling_and_text_references_are_errors() {
        let mut workbook = Workbook::new();
        workbook.insert(Tab::CalcEngine, "calc.a", "A", CellContent::Formula(refer("calc.missing"))).expect("a");
        assert_eq!(workbook.evaluate(), Err(FormulaError::UnknownName("calc.missing".to_owned())));
        assert_eq!(workbook.formula("calc.a").as_deref(), Some("=#REF!"));

        let mut workbook = Workbook::new();
        workbook.insert(Tab::Inputs, "inputs.name", "Industry", CellContent::Text("Retail".to_owned())).expect("t");
        workbook.insert(Tab::CalcEngine, "calc.b", "B", CellContent::Formula(refer("inputs.name") * 2.0)).expect("b");
        assert_eq!(workbook.evaluate(), Err(FormulaError::NotNumeric("inputs.name".to_owned())));
    }

    #[test]
    fn edited_inputs_flow_through_on_the_next_evaluation() {
        let mut workbook = small().expect("builds");
        assert_eq!(workbook.evaluate().expect("evaluates").get("calc.annual_labor_cost"), Some(800_000.0));

        workbook.set_number("inputs.team_size", 12.0).expect("edits");
        assert_eq!(workbook.evaluate().expect("evaluates").get("calc.annual_labor_cost"), Some(960_000.0));

        assert_eq!(
            workbook.set_number("calc.annual_labor_cost", 1.0),
            Err(FormulaError::NotEditable("calc.annual_labor_cost".to_owned()))
        );
        assert_eq!(
            workbook.set_number("inputs.nope", 1.0),
            Err(FormulaError::UnknownName("inputs.nope".to_owned()))
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut workbook = Workbook::new();
        workbook.insert(Tab::Inputs, "inputs.x", "X", CellContent::Number(1.0)).expect("first");
        let error = workbook.insert(Tab::Inputs, "inputs.x", "X", CellContent::Number(2.0)).expect_err("dup");
        assert_eq!(error, FormulaError::DuplicateName("inputs.x".to_owned()));
    }

    #[test]
    fn titles_with_spaces_or_symbols_are_quoted() {
        for tab in Tab::ALL {
            let mut workbook = Workbook::new();
            workbook.insert(tab, "marker", "Marker", CellContent::Number(0.0)).expect("inserts");
            let address = workbook.address("marker").unwrap_or_default();
            let quoted = tab.title().contains(' ') || tab.title().contains('-') || tab.title().contains('&');
            assert_eq!(address.starts_with('\''), quoted, "{address}");
        }
    }
}
