//! Closed-form expressions
//!
//! A small expression tree that is both evaluated (procedural value) and
//! rendered as spreadsheet formula text (symbolic value). Archetype mappings and
//! the workbook mirror are built from these nodes, so the number a caller sees
//! and the formula an auditor reads come from the same definition.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FormulaError {
    #[error("formula references unknown name `{0}`")]
    UnknownName(String),
    #[error("circular reference through `{0}`")]
    CircularReference(String),
    #[error("`{0}` is defined more than once")]
    DuplicateName(String),
    #[error("`{0}` does not hold a number")]
    NotNumeric(String),
    #[error("`{0}` is a calculated cell and cannot be edited")]
    NotEditable(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl Comparison {
    fn holds(self, left: f64, right: f64) -> bool {
        match self {
            Self::Lt => left < right,
            Self::Le => left <= right,
            Self::Gt => left > right,
            Self::Ge => left >= right,
            Self::Eq => left == right,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "=",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Num(f64),
    Ref(String),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Min(Vec<Expr>),
    Max(Vec<Expr>),
    Ceil(Box<Expr>),
    Floor(Box<Expr>),
    Round(Box<Expr>, u32),
    Exp(Box<Expr>),
    If { left: Box<Expr>, comparison: Comparison, right: Box<Expr>, then: Box<Expr>, otherwise: Box<Expr> },
}

pub fn num(value: f64) -> Expr {
    Expr::Num(value)
}

pub fn refer(name: impl Into<String>) -> Expr {
    Expr::Ref(name.into())
}

pub fn min_of(items: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::Min(items.into_iter().collect())
}

pub fn max_of(items: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::Max(items.into_iter().collect())
}

/// `MIN(high, MAX(low, value))`
pub fn clamp(value: Expr, low: f64, high: f64) -> Expr {
    min_of([num(high), max_of([num(low), value])])
}

pub fn ceil(value: Expr) -> Expr {
    Expr::Ceil(Box::new(value))
}

pub fn floor(value: Expr) -> Expr {
    Expr::Floor(Box::new(value))
}

pub fn round(value: Expr, digits: u32) -> Expr {
    Expr::Round(Box::new(value), digits)
}

pub fn exp(value: Expr) -> Expr {
    Expr::Exp(Box::new(value))
}

pub fn pow(base: Expr, exponent: Expr) -> Expr {
    Expr::Pow(Box::new(base), Box::new(exponent))
}

pub fn if_then(
    left: Expr,
    comparison: Comparison,
    right: Expr,
    then: Expr,
    otherwise: Expr,
) -> Expr {
    Expr::If {
        left: Box::new(left),
        comparison,
        right: Box::new(right),
        then: Box::new(then),
        otherwise: Box::new(otherwise),
    }
}

pub fn sum_of(items: impl IntoIterator<Item = Expr>) -> Expr {
    let mut items = items.into_iter();
    match items.next() {
        Some(first) => items.fold(first, |acc, item| acc + item),
        None => num(0.0),
    }
}

/// Half-away-from-zero rounding on the decimal value, matching spreadsheet
/// `ROUND`. Non-finite input is returned unchanged.
pub fn spreadsheet_round(value: f64, digits: u32) -> f64 {
    Decimal::from_f64(value)
        .map(|decimal| decimal.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|rounded| rounded.to_f64())
        .unwrap_or(value)
}

impl Expr {
    /// Evaluates the expression; `resolve` supplies referenced names.
    ///
    /// Division by zero is not an error here: it yields a non-finite value and
    /// callers decide whether that is acceptable.
    pub fn eval(&self, resolve: &dyn Fn(&str) -> Option<f64>) -> Result<f64, FormulaError> {
        Ok(match self {
            Self::Num(value) => *value,
            Self::Ref(name) => resolve(name).ok_or_else(|| FormulaError::UnknownName(name.clone()))?,
            Self::Add(left, right) => left.eval(resolve)? + right.eval(resolve)?,
            Self::Sub(left, right) => left.eval(resolve)? - right.eval(resolve)?,
            Self::Mul(left, right) => left.eval(resolve)? * right.eval(resolve)?,
            Self::Div(left, right) => left.eval(resolve)? / right.eval(resolve)?,
            Self::Pow(base, exponent) => base.eval(resolve)?.powf(exponent.eval(resolve)?),
            Self::Neg(inner) => -inner.eval(resolve)?,
            Self::Min(items) => fold_extreme(items, resolve, f64::INFINITY, f64::min)?,
            Self::Max(items) => fold_extreme(items, resolve, f64::NEG_INFINITY, f64::max)?,
            Self::Ceil(inner) => inner.eval(resolve)?.ceil(),
            Self::Floor(inner) => inner.eval(resolve)?.floor(),
            Self::Round(inner, digits) => spreadsheet_round(inner.eval(resolve)?, *digits),
            Self::Exp(inner) => inner.eval(resolve)?.exp(),
            Self::If { left, comparison, right, then, otherwise } => {
                if comparison.holds(left.eval(resolve)?, right.eval(resolve)?) {
                    then.eval(resolve)?
                } else {
                    otherwise.eval(resolve)?
                }
            }
        })
    }

    /// Renders spreadsheet formula text. `name` maps a reference to its cell
    /// address or label.
    pub fn render(&self, name: &dyn Fn(&str) -> String) -> String {
        match self {
            Self::Num(value) => format_number(*value),
            Self::Ref(reference) => name(reference),
            Self::Add(left, right) => self.render_binary(left, "+", right, name),
            Self::Sub(left, right) => self.render_binary(left, "-", right, name),
            Self::Mul(left, right) => self.render_binary(left, "*", right, name),
            Self::Div(left, right) => self.render_binary(left, "/", right, name),
            Self::Pow(left, right) => self.render_binary(left, "^", right, name),
            Self::Neg(inner) => format!("-{}", wrap(inner, self.precedence(), name)),
            Self::Min(items) => render_call("MIN", items, name),
            Self::Max(items) => render_call("MAX", items, name),
            Self::Ceil(inner) => format!("CEILING.MATH({})", inner.render(name)),
            Self::Floor(inner) => format!("FLOOR.MATH({})", inner.render(name)),
            Self::Round(inner, digits) => format!("ROUND({}, {digits})", inner.render(name)),
            Self::Exp(inner) => format!("EXP({})", inner.render(name)),
            Self::If { left, comparison, right, then, otherwise } => format!(
                "IF({}{}{}, {}, {})",
                left.render(name),
                comparison.symbol(),
                right.render(name),
                then.render(name),
                otherwise.render(name)
            ),
        }
    }

    /// Copy of the expression with every reference passed through `rename`.
    pub fn rename_references(&self, rename: &dyn Fn(&str) -> String) -> Expr {
        let boxed = |inner: &Expr| Box::new(inner.rename_references(rename));
        match self {
            Self::Num(value) => Self::Num(*value),
            Self::Ref(name) => Self::Ref(rename(name)),
            Self::Add(left, right) => Self::Add(boxed(left), boxed(right)),
            Self::Sub(left, right) => Self::Sub(boxed(left), boxed(right)),
            Self::Mul(left, right) => Self::Mul(boxed(left), boxed(right)),
            Self::Div(left, right) => Self::Div(boxed(left), boxed(right)),
            Self::Pow(left, right) => Self::Pow(boxed(left), boxed(right)),
            Self::Neg(inner) => Self::Neg(boxed(inner)),
            Self::Min(items) => Self::Min(items.iter().map(|item| item.rename_references(rename)).collect()),
            Self::Max(items) => Self::Max(items.iter().map(|item| item.rename_references(rename)).collect()),
            Self::Ceil(inner) => Self::Ceil(boxed(inner)),
            Self::Floor(inner) => Self::Floor(boxed(inner)),
            Self::Round(inner, digits) => Self::Round(boxed(inner), *digits),
            Self::Exp(inner) => Self::Exp(boxed(inner)),
            Self::If { left, comparison, right, then, otherwise } => Self::If {
                left: boxed(left),
                comparison: *comparison,
                right: boxed(right),
                then: boxed(then),
                otherwise: boxed(otherwise),
            },
        }
    }

    /// Every name the expression references.
    pub fn references(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_references(&mut names);
        names
    }

    fn collect_references(&self, names: &mut BTreeSet<String>) {
        match self {
            Self::Num(_) => {}
            Self::Ref(name) => {
                names.insert(name.clone());
            }
            Self::Add(left, right)
            | Self::Sub(left, right)
            | Self::Mul(left, right)
            | Self::Div(left, right)
            | Self::Pow(left, right) => {
                left.collect_references(names);
                right.collect_references(names);
            }
            Self::Neg(inner)
            | Self::Ceil(inner)
            | Self::Floor(inner)
            | Self::Round(inner, _)
            | Self::Exp(inner) => {
                inner.collect_references(names)
            }
            Self::Min(items) | Self::Max(items) => {
                items.iter().for_each(|item| item.collect_references(names))
            }
            Self::If { left, right, then, otherwise, .. } => {
                for part in [left, right, then, otherwise] {
                    part.collect_references(names);
                }
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Self::Add(..) | Self::Sub(..) => 1,
            Self::Mul(..) | Self::Div(..) => 2,
            Self::Neg(_) => 3,
            Self::Num(value) if *value < 0.0 => 3,
            Self::Pow(..) => 4,
            _ => 5,
        }
    }

    fn render_binary(
        &self,
        left: &Expr,
        operator: &str,
        right: &Expr,
        name: &dyn Fn(&str) -> String,
    ) -> String {
        let precedence = self.precedence();
        // Right operands of non-associative operators need parentheses at equal precedence.
        let right_needs_strict = matches!(self, Self::Sub(..) | Self::Div(..) | Self::Pow(..));
        let right_text = if right_needs_strict && right.precedence() <= precedence {
            format!("({})", right.render(name))
        } else {
            wrap(right, precedence, name)
        };
        format!("{}{operator}{}", wrap(left, precedence, name), right_text)
    }
}

fn fold_extreme(
    items: &[Expr],
    resolve: &dyn Fn(&str) -> Option<f64>,
    initial: f64,
    pick: fn(f64, f64) -> f64,
) -> Result<f64, FormulaError> {
    let mut acc = initial;
    for item in items {
        let value = item.eval(resolve)?;
        // NaN must poison the result instead of being skipped by f64::min/max.
        if value.is_nan() {
            return Ok(f64::NAN);
        }
        acc = pick(acc, value);
    }
    Ok(acc)
}

fn wrap(expr: &Expr, parent_precedence: u8, name: &dyn Fn(&str) -> String) -> String {
    if expr.precedence() < parent_precedence {
        format!("({})", expr.render(name))
    } else {
        expr.render(name)
    }
}

fn render_call(function: &str, items: &[Expr], name: &dyn Fn(&str) -> String) -> String {
    let args: Vec<String> = items.iter().map(|item| item.render(name)).collect();
    format!("{function}({})", args.join(", "))
}

fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NA()".to_owned()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&|reference| reference.to_owned()))
    }
}

macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident, $variant:ident) => {
        impl $trait for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                Expr::$variant(Box::new(self), Box::new(rhs))
            }
        }

        impl $trait<f64> for Expr {
            type Output = Expr;

            fn $method(self, rhs: f64) -> Expr {
                Expr::$variant(Box::new(self), Box::new(Expr::Num(rhs)))
            }
        }

        impl $trait<Expr> for f64 {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                Expr::$variant(Box::new(Expr::Num(self)), Box::new(rhs))
            }
        }
    };
}

impl_binary_operator!(Add, add, Add);
impl_binary_operator!(Sub, sub, Sub);
impl_binary_operator!(Mul, mul, Mul);
impl_binary_operator!(Div, div, Div);

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{
        ceil, clamp, exp, floor, if_then, num, pow, refer, round, spreadsheet_round, sum_of, Comparison,
        FormulaError,
    };

    fn env(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(key, value)| ((*key).to_owned(), *value)).collect()
    }

    #[test]
    fn evaluates_and_renders_the_same_tree() {
        let values = env(&[("docs", 1200.0), ("minutes", 6.0)]);
        let expr = clamp(refer("docs") * refer("minutes") / 60.0 / 40.0, 1.0, 168.0);

        let value = expr.eval(&|name| values.get(name).copied()).expect("evaluates");
        assert!((value - 3.0).abs() < 1e-12);
        assert_eq!(expr.to_string(), "MIN(168, MAX(1, docs*minutes/60/40))");
    }

    #[test]
    fn parenthesises_lower_precedence_children() {
        let expr = (refer("a") + refer("b")) * refer("c") - (refer("d") - refer("e"));
        assert_eq!(expr.to_string(), "(a+b)*c-(d-e)");

        let growth = pow(num(1.0) + refer("rate"), refer("year") - 1.0);
        assert_eq!(growth.to_string(), "(1+rate)^(year-1)");
    }

    #[test]
    fn unknown_reference_is_reported() {
        let error = refer("missing").eval(&|_| None).expect_err("unknown name");
        assert_eq!(error, FormulaError::UnknownName("missing".to_owned()));
    }

    #[test]
    fn division_by_zero_surfaces_as_non_finite_value() {
        let value = (num(1.0) / refer("zero")).eval(&|_| Some(0.0)).expect("evaluates");
        assert!(!value.is_finite());
    }

    #[test]
    fn nan_poisons_min_and_max() {
        let value = clamp(num(0.0) / num(0.0), 0.0, 1.0).eval(&|_| None).expect("evaluates");
        assert!(value.is_nan());
    }

    #[test]
    fn spreadsheet_round_goes_half_away_from_zero_on_decimal_value() {
        assert_eq!(spreadsheet_round(2.675, 2), 2.68);
        assert_eq!(spreadsheet_round(-2.5, 0), -3.0);
        assert_eq!(spreadsheet_round(14.25, 1), 14.3);
        assert!(spreadsheet_round(f64::NAN, 1).is_nan());
    }

    #[test]
    fn conditional_and_rounding_render_as_spreadsheet_functions() {
        let expr = if_then(
            refer("months"),
            Comparison::Le,
            num(3.0),
            num(1.5),
            round(ceil(refer("x")), 1),
        );
        assert_eq!(expr.to_string(), "IF(months<=3, 1.5, ROUND(CEILING.MATH(x), 1))");
        assert_eq!(expr.eval(&|_| Some(2.0)).ok(), Some(1.5));
    }

    #[test]
    fn ceiling_and_floor_round_toward_infinity_for_negatives() {
        let up = ceil(refer("x"));
        let down = floor(refer("x"));
        assert_eq!(up.to_string(), "CEILING.MATH(x)");
        assert_eq!(down.to_string(), "FLOOR.MATH(x)");
        assert_eq!(up.eval(&|_| Some(-2.5)).ok(), Some(-2.0));
        assert_eq!(down.eval(&|_| Some(-2.5)).ok(), Some(-3.0));
    }

    #[test]
    fn renamed_references_keep_structure_and_value() {
        let expr = clamp(refer("volume") / refer("people"), 0.0, 1.0);
        let renamed = expr.rename_references(&|name| format!("inputs.answer.{name}"));
        assert_eq!(renamed.to_string(), "MIN(1, MAX(0, inputs.answer.volume/inputs.answer.people))");

        let values = env(&[("inputs.answer.volume", 3.0), ("inputs.answer.people", 4.0)]);
        assert_eq!(renamed.eval(&|name| values.get(name).copied()).ok(), Some(0.75));
    }

    #[test]
    fn sum_of_folds_left_and_tracks_references() {
        let expr = sum_of([refer("a"), refer("b"), num(2.0)]);
        assert_eq!(expr.to_string(), "a+b+2");
        assert_eq!(expr.references().into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn exponential_renders_as_exp_call() {
        let expr = num(25.0) * exp(-(refer("p25") - refer("roic")) / refer("spread"));
        assert_eq!(expr.to_string(), "25*EXP(-(p25-roic)/spread)");
        let value = expr.eval(&|name| if name == "spread" { Some(1.0) } else { Some(0.5) }).expect("evaluates");
        assert!((value - 25.0).abs() < 1e-12);
    }
}
