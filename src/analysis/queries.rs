//! # Consultas
//! src/analysis/queries.rs
//!
//! Las nueve consultas que puede ejecutar un job. Cada una recibe el body
//! JSON de la petición y produce el JSON que se guarda como resultado.

use crate::analysis::ingestor::{is_best_max, is_best_min, DataIngestor};
use crate::analysis::stats;
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Cantidad de estados en best5/worst5
pub const TOP_STATES: usize = 5;

/// Body de las peticiones de consulta
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub question: Option<String>,

    #[serde(default)]
    pub state: Option<String>,
}

/// Tipo de consulta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    StatesMean,
    StateMean,
    Best5,
    Worst5,
    GlobalMean,
    DiffFromMean,
    StateDiffFromMean,
    MeanByCategory,
    StateMeanByCategory,
}

impl Query {
    pub const ALL: [Query; 9] = [
        Query::StatesMean,
        Query::StateMean,
        Query::Best5,
        Query::Worst5,
        Query::GlobalMean,
        Query::DiffFromMean,
        Query::StateDiffFromMean,
        Query::MeanByCategory,
        Query::StateMeanByCategory,
    ];

    /// Nombre de la consulta, coincide con su ruta bajo `/api/`
    pub fn name(&self) -> &'static str {
        match self {
            Query::StatesMean => "states_mean",
            Query::StateMean => "state_mean",
            Query::Best5 => "best5",
            Query::Worst5 => "worst5",
            Query::GlobalMean => "global_mean",
            Query::DiffFromMean => "diff_from_mean",
            Query::StateDiffFromMean => "state_diff_from_mean",
            Query::MeanByCategory => "mean_by_category",
            Query::StateMeanByCategory => "state_mean_by_category",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.name() == name)
    }

    /// Verifica si la consulta necesita el campo `state`
    pub fn needs_state(&self) -> bool {
        matches!(
            self,
            Query::StateMean | Query::StateDiffFromMean | Query::StateMeanByCategory
        )
    }

    /// Evalúa la consulta sobre el dataset
    pub fn evaluate(&self, data: &DataIngestor, request: &QueryRequest) -> Value {
        let question = match request.question.as_deref() {
            Some(q) if data.is_valid_question(q) => q,
            _ => return invalid_question(),
        };

        let state = match (self.needs_state(), request.state.as_deref()) {
            (true, None) => return invalid_question(),
            (_, state) => state,
        };

        let rows = data.rows_for_question(question);

        match (self, state) {
            (Query::StatesMean, _) => {
                let means = stats::state_means(&rows);
                ordered(stats::sorted_by_mean(&means, false))
            }
            (Query::StateMean, Some(state)) => {
                let means = stats::state_means(&rows);
                match means.get(state) {
                    Some(mean) => single(state, *mean),
                    None => invalid_state(),
                }
            }
            (Query::Best5, _) | (Query::Worst5, _) => {
                let best = matches!(self, Query::Best5);
                // best5: mayor primero si lo mejor es el máximo;
                // worst5: mayor primero si lo mejor es el mínimo
                let descending = if best {
                    is_best_max(question)
                } else {
                    is_best_min(question)
                };
                let means = stats::state_means(&rows);
                let mut sorted = stats::sorted_by_mean(&means, descending);
                sorted.truncate(TOP_STATES);
                ordered(sorted)
            }
            (Query::GlobalMean, _) => {
                json!({ "global_mean": number(stats::mean(rows.iter().copied())) })
            }
            (Query::DiffFromMean, _) => {
                // Claves por nombre de estado, no por orden de aparición
                let global = stats::mean(rows.iter().copied());
                let diffs = stats::state_means(&rows)
                    .into_iter()
                    .map(|(state, mean)| (state, global - mean));
                ordered(diffs)
            }
            (Query::StateDiffFromMean, Some(state)) => {
                let global = stats::mean(rows.iter().copied());
                let means = stats::state_means(&rows);
                match means.get(state) {
                    Some(mean) => single(state, global - mean),
                    None => invalid_state(),
                }
            }
            (Query::MeanByCategory, _) => ordered(stats::state_category_means(&rows)),
            (Query::StateMeanByCategory, Some(state)) => {
                let by_state = stats::group_by_state(&rows);
                match by_state.get(state) {
                    Some(state_rows) => {
                        let mut result = Map::new();
                        result.insert(
                            state.to_string(),
                            ordered(stats::category_means(state_rows)),
                        );
                        Value::Object(result)
                    }
                    None => invalid_state(),
                }
            }
            // needs_state() ya descartó estos casos
            (_, None) => invalid_question(),
        }
    }
}

fn invalid_question() -> Value {
    json!({ "error": "Invalid question" })
}

fn invalid_state() -> Value {
    json!({ "error": "Invalid state" })
}

/// NaN e infinitos se serializan como `null`
fn number(value: f64) -> Value {
    Value::from(value)
}

fn single(key: &str, value: f64) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), number(value));
    Value::Object(map)
}

/// Objeto JSON que conserva el orden de los pares
fn ordered<I>(pairs: I) -> Value
where
    I: IntoIterator<Item = (String, f64)>,
{
    Value::Object(
        pairs
            .into_iter()
            .map(|(key, value)| (key, number(value)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ingestor::{Row, QUESTIONS_BEST_IS_MAX, QUESTIONS_BEST_IS_MIN};

    fn row(state: &str, question: &str, value: &str, strat: &str) -> Row {
        Row {
            state: state.to_string(),
            question: question.to_string(),
            data_value: value.to_string(),
            category: "Gender".to_string(),
            stratification: strat.to_string(),
        }
    }

    fn dataset() -> DataIngestor {
        let min_q = QUESTIONS_BEST_IS_MIN[1];
        let max_q = QUESTIONS_BEST_IS_MAX[0];
        let mut rows = Vec::new();
        for (i, state) in ["A", "B", "C", "D", "E", "F"].iter().enumerate() {
            let value = format!("{}", (i + 1) * 10);
            rows.push(row(state, min_q, &value, "Male"));
            rows.push(row(state, max_q, &value, "Female"));
        }
        rows.push(row("A", min_q, "30", "Female"));
        DataIngestor::from_rows(rows)
    }

    fn request(question: &str, state: Option<&str>) -> QueryRequest {
        QueryRequest {
            question: Some(question.to_string()),
            state: state.map(str::to_string),
        }
    }

    fn keys(value: &Value) -> Vec<String> {
        value.as_object().unwrap().keys().cloned().collect()
    }

    #[test]
    fn test_names_round_trip() {
        for query in Query::ALL {
            assert_eq!(Query::from_name(query.name()), Some(query));
        }
        assert_eq!(Query::from_name("nope"), None);
    }

    #[test]
    fn test_invalid_question() {
        let data = dataset();
        let result = Query::GlobalMean.evaluate(&data, &request("unknown", None));
        assert_eq!(result, json!({"error": "Invalid question"}));

        let result = Query::GlobalMean.evaluate(&data, &QueryRequest::default());
        assert_eq!(result, json!({"error": "Invalid question"}));
    }

    #[test]
    fn test_state_query_without_state() {
        let data = dataset();
        let result = Query::StateMean.evaluate(&data, &request(QUESTIONS_BEST_IS_MIN[1], None));
        assert_eq!(result, json!({"error": "Invalid question"}));
    }

    #[test]
    fn test_unknown_state() {
        let data = dataset();
        let req = request(QUESTIONS_BEST_IS_MIN[1], Some("Atlantis"));
        assert_eq!(Query::StateMean.evaluate(&data, &req), json!({"error": "Invalid state"}));
        assert_eq!(
            Query::StateDiffFromMean.evaluate(&data, &req),
            json!({"error": "Invalid state"})
        );
        assert_eq!(
            Query::StateMeanByCategory.evaluate(&data, &req),
            json!({"error": "Invalid state"})
        );
    }

    #[test]
    fn test_states_mean_ordered_ascending() {
        let data = dataset();
        let result = Query::StatesMean.evaluate(&data, &request(QUESTIONS_BEST_IS_MIN[1], None));

        // A = (10 + 30) / 2 = 20, igual que B; empate por nombre
        assert_eq!(keys(&result), vec!["A", "B", "C", "D", "E", "F"]);
        assert_eq!(result["A"], json!(20.0));
    }

    #[test]
    fn test_state_mean() {
        let data = dataset();
        let result = Query::StateMean.evaluate(&data, &request(QUESTIONS_BEST_IS_MIN[1], Some("C")));
        assert_eq!(result, json!({"C": 30.0}));
    }

    #[test]
    fn test_best5_and_worst5_min_question() {
        let data = dataset();
        let req = request(QUESTIONS_BEST_IS_MIN[1], None);

        let best = Query::Best5.evaluate(&data, &req);
        assert_eq!(keys(&best), vec!["A", "B", "C", "D", "E"]);

        let worst = Query::Worst5.evaluate(&data, &req);
        assert_eq!(keys(&worst), vec!["F", "E", "D", "C", "A"]);
    }

    #[test]
    fn test_best5_max_question() {
        let data = dataset();
        let req = request(QUESTIONS_BEST_IS_MAX[0], None);

        let best = Query::Best5.evaluate(&data, &req);
        assert_eq!(keys(&best), vec!["F", "E", "D", "C", "B"]);

        let worst = Query::Worst5.evaluate(&data, &req);
        assert_eq!(keys(&worst), vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn test_global_mean_and_diffs() {
        let data = dataset();
        let req = request(QUESTIONS_BEST_IS_MAX[0], None);

        // 10..60 => promedio 35
        assert_eq!(Query::GlobalMean.evaluate(&data, &req), json!({"global_mean": 35.0}));

        let diffs = Query::DiffFromMean.evaluate(&data, &req);
        assert_eq!(diffs["A"], json!(25.0));
        assert_eq!(diffs["F"], json!(-25.0));

        let req = request(QUESTIONS_BEST_IS_MAX[0], Some("B"));
        assert_eq!(Query::StateDiffFromMean.evaluate(&data, &req), json!({"B": 15.0}));
    }

    #[test]
    fn test_diff_from_mean_keyed_by_state_name() {
        let min_q = QUESTIONS_BEST_IS_MIN[1];
        let data = DataIngestor::from_rows(vec![
            row("Utah", min_q, "10", "Male"),
            row("Alabama", min_q, "30", "Male"),
            row("Ohio", min_q, "20", "Male"),
        ]);

        let diffs = Query::DiffFromMean.evaluate(&data, &request(min_q, None));
        assert_eq!(keys(&diffs), vec!["Alabama", "Ohio", "Utah"]);
        assert_eq!(diffs["Utah"], json!(10.0));
    }

    #[test]
    fn test_mean_by_category() {
        let data = dataset();
        let result = Query::MeanByCategory.evaluate(&data, &request(QUESTIONS_BEST_IS_MIN[1], None));

        assert_eq!(result["('A', 'Gender', 'Female')"], json!(30.0));
        assert_eq!(result["('A', 'Gender', 'Male')"], json!(10.0));
        assert_eq!(result.as_object().unwrap().len(), 7);
    }

    #[test]
    fn test_state_mean_by_category() {
        let data = dataset();
        let result = Query::StateMeanByCategory
            .evaluate(&data, &request(QUESTIONS_BEST_IS_MIN[1], Some("A")));

        assert_eq!(
            result,
            json!({"A": {"('Gender', 'Female')": 30.0, "('Gender', 'Male')": 10.0}})
        );
    }

    #[test]
    fn test_nan_serialises_as_null() {
        let q = QUESTIONS_BEST_IS_MIN[0];
        let data = DataIngestor::from_rows(vec![row("A", q, "", "Male")]);
        let result = Query::GlobalMean.evaluate(&data, &request(q, None));
        assert_eq!(result, json!({"global_mean": null}));
    }
}
