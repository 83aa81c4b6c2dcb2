//! # Agregaciones
//! src/analysis/stats.rs
//!
//! Funciones puras sobre filas del dataset: agrupar, promediar, ordenar.

use crate::analysis::ingestor::Row;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Promedio de los valores válidos, NaN si no hay ninguno
pub fn mean<'a, I>(rows: I) -> f64
where
    I: IntoIterator<Item = &'a Row>,
{
    let (sum, count) = rows
        .into_iter()
        .filter_map(Row::value)
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Agrupa filas por una clave (estado, estratificación...)
pub fn group_by<'a, F>(rows: &[&'a Row], key: F) -> BTreeMap<String, Vec<&'a Row>>
where
    F: Fn(&Row) -> &str,
{
    let mut groups: BTreeMap<String, Vec<&'a Row>> = BTreeMap::new();
    for &row in rows {
        groups.entry(key(row).to_string()).or_default().push(row);
    }
    groups
}

pub fn group_by_state<'a>(rows: &[&'a Row]) -> BTreeMap<String, Vec<&'a Row>> {
    group_by(rows, |row| &row.state)
}

/// Promedio por estado
pub fn state_means(rows: &[&Row]) -> BTreeMap<String, f64> {
    group_by_state(rows)
        .into_iter()
        .map(|(state, rows)| (state, mean(rows)))
        .collect()
}

/// Pares (estado, promedio) ordenados por promedio
///
/// `descending = false` pone primero el menor. Empates por nombre.
pub fn sorted_by_mean(means: &BTreeMap<String, f64>, descending: bool) -> Vec<(String, f64)> {
    let mut pairs: Vec<(String, f64)> = means
        .iter()
        .map(|(state, mean)| (state.clone(), *mean))
        .collect();

    pairs.sort_by(|a, b| {
        let by_value = if descending {
            b.1.total_cmp(&a.1)
        } else {
            a.1.total_cmp(&b.1)
        };
        match by_value {
            Ordering::Equal => a.0.cmp(&b.0),
            ordering => ordering,
        }
    });

    pairs
}

/// Promedio por (categoría, estratificación) dentro de un grupo de filas
///
/// La clave es `('Categoria', 'Estratificacion')`; se ignoran las
/// estratificaciones vacías.
pub fn category_means(rows: &[&Row]) -> BTreeMap<String, f64> {
    group_by(rows, |row| &row.stratification)
        .into_iter()
        .filter(|(stratification, _)| !stratification.is_empty())
        .map(|(stratification, rows)| {
            let category = rows.first().map(|r| r.category.as_str()).unwrap_or_default();
            (
                format!("('{}', '{}')", category, stratification),
                mean(rows),
            )
        })
        .collect()
}

/// Igual que `category_means` pero con el estado en la clave
pub fn state_category_means(rows: &[&Row]) -> BTreeMap<String, f64> {
    let mut result = BTreeMap::new();

    for (state, state_rows) in group_by_state(rows) {
        for (stratification, strat_rows) in group_by(&state_rows, |row| &row.stratification) {
            if stratification.is_empty() {
                continue;
            }
            let category = strat_rows
                .first()
                .map(|r| r.category.as_str())
                .unwrap_or_default();
            result.insert(
                format!("('{}', '{}', '{}')", state, category, stratification),
                mean(strat_rows),
            );
        }
    }

    result
}
