use super::ModelError;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const INTERCEPT: &str = "(intercept)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TermKind {
    Categorical,
    Numeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Term {
    pub name: &'static str,
    pub kind: TermKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CovariateValue {
    Level(String),
    Value(f64),
}

/// Ordered list of model terms. Observations supply one value per term, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CovariateList {
    terms: Vec<Term>,
}

impl CovariateList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn categorical(mut self, name: &'static str) -> Self {
        self.terms.push(Term {
            name,
            kind: TermKind::Categorical,
        });
        self
    }

    pub fn numeric(mut self, name: &'static str) -> Self {
        self.terms.push(Term {
            name,
            kind: TermKind::Numeric,
        });
        self
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Learns categorical levels from the training rows and fixes the column layout.
    pub fn layout(&self, rows: &[Vec<CovariateValue>]) -> Result<DesignLayout, ModelError> {
        let mut levels: Vec<BTreeSet<&str>> = vec![BTreeSet::new(); self.terms.len()];
        for row in rows {
            check_row(&self.terms, row)?;
            for (index, value) in row.iter().enumerate() {
                if let CovariateValue::Level(level) = value {
                    levels[index].insert(level.as_str());
                }
            }
        }

        let mut columns = vec![INTERCEPT.to_string()];
        let mut encoders = Vec::with_capacity(self.terms.len());
        for (term, seen) in self.terms.iter().zip(levels) {
            match term.kind {
                TermKind::Numeric => {
                    encoders.push(TermEncoder::Numeric {
                        column: columns.len(),
                    });
                    columns.push(term.name.to_string());
                }
                TermKind::Categorical => {
                    let mut seen = seen.into_iter();
                    let baseline = seen.next().unwrap_or_default().to_string();
                    let mut mapping = BTreeMap::new();
                    for level in seen {
                        mapping.insert(level.to_string(), columns.len());
                        columns.push(format!("{}[{}]", term.name, level));
                    }
                    encoders.push(TermEncoder::Categorical {
                        baseline,
                        levels: mapping,
                    });
                }
            }
        }

        Ok(DesignLayout {
            terms: self.terms.clone(),
            encoders,
            columns,
        })
    }
}

fn check_row(terms: &[Term], row: &[CovariateValue]) -> Result<(), ModelError> {
    if row.len() != terms.len() {
        return Err(ModelError::RowWidth {
            expected: terms.len(),
            actual: row.len(),
        });
    }
    for (term, value) in terms.iter().zip(row) {
        match (term.kind, value) {
            (TermKind::Categorical, CovariateValue::Level(_)) => {}
            (TermKind::Numeric, CovariateValue::Value(value)) if value.is_finite() => {}
            (TermKind::Numeric, CovariateValue::Value(_)) => return Err(ModelError::NonFinite),
            (TermKind::Categorical, _) => {
                return Err(ModelError::CovariateMismatch {
                    term: term.name,
                    expected: "categorical",
                })
            }
            (TermKind::Numeric, _) => {
                return Err(ModelError::CovariateMismatch {
                    term: term.name,
                    expected: "numeric",
                })
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
enum TermEncoder {
    Categorical {
        baseline: String,
        levels: BTreeMap<String, usize>,
    },
    Numeric {
        column: usize,
    },
}

/// Column layout learned from training rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignLayout {
    terms: Vec<Term>,
    encoders: Vec<TermEncoder>,
    columns: Vec<String>,
}

impl DesignLayout {
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn baseline(&self, term: &str) -> Option<&str> {
        self.terms
            .iter()
            .zip(&self.encoders)
            .find(|(candidate, _)| candidate.name == term)
            .and_then(|(_, encoder)| match encoder {
                TermEncoder::Categorical { baseline, .. } => Some(baseline.as_str()),
                TermEncoder::Numeric { .. } => None,
            })
    }

    /// Encodes one observation. A level not seen during training is an error.
    pub fn encode(&self, row: &[CovariateValue]) -> Result<Vec<f64>, ModelError> {
        check_row(&self.terms, row)?;

        let mut encoded = vec![0.0; self.columns.len()];
        encoded[0] = 1.0;
        for ((term, encoder), value) in self.terms.iter().zip(&self.encoders).zip(row) {
            match (encoder, value) {
                (TermEncoder::Numeric { column }, CovariateValue::Value(value)) => {
                    encoded[*column] = *value;
                }
                (TermEncoder::Categorical { baseline, levels }, CovariateValue::Level(level)) => {
                    match levels.get(level) {
                        Some(column) => encoded[*column] = 1.0,
                        None if level == baseline => {}
                        None => {
                            return Err(ModelError::UnseenLevel {
                                term: term.name,
                                level: level.clone(),
                            })
                        }
                    }
                }
                _ => unreachable!("row kinds checked against terms"),
            }
        }
        Ok(encoded)
    }

    pub fn matrix(&self, rows: &[Vec<CovariateValue>]) -> Result<DesignMatrix, ModelError> {
        let encoded = rows
            .iter()
            .map(|row| self.encode(row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DesignMatrix {
            columns: self.columns.clone(),
            rows: encoded,
        })
    }
}

/// Dense row-major design matrix with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl DesignMatrix {
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
