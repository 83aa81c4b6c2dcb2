//! # Ingesta del Dataset
//! src/analysis/ingestor.rs
//!
//! Carga el CSV de nutrición/actividad/obesidad una sola vez al arrancar.
//! Los jobs lo comparten de solo lectura (`Arc<DataIngestor>`).

use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Preguntas donde el mejor valor es el mínimo
pub const QUESTIONS_BEST_IS_MIN: [&str; 5] = [
    "Percent of adults aged 18 years and older who have an overweight classification",
    "Percent of adults aged 18 years and older who have obesity",
    "Percent of adults who engage in no leisure-time physical activity",
    "Percent of adults who report consuming fruit less than one time daily",
    "Percent of adults who report consuming vegetables less than one time daily",
];

/// Preguntas donde el mejor valor es el máximo
pub const QUESTIONS_BEST_IS_MAX: [&str; 4] = [
    "Percent of adults who achieve at least 150 minutes a week of moderate-intensity aerobic physical activity or 75 minutes a week of vigorous-intensity aerobic activity (or an equivalent combination)",
    "Percent of adults who achieve at least 150 minutes a week of moderate-intensity aerobic physical activity or 75 minutes a week of vigorous-intensity aerobic physical activity and engage in muscle-strengthening activities on 2 or more days a week",
    "Percent of adults who achieve at least 300 minutes a week of moderate-intensity aerobic physical activity or 150 minutes a week of vigorous-intensity aerobic activity (or an equivalent combination)",
    "Percent of adults who engage in muscle-strengthening activities on 2 or more days a week",
];

/// Fila del dataset (solo las columnas que usamos)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Row {
    #[serde(rename = "LocationDesc")]
    pub state: String,

    #[serde(rename = "Question")]
    pub question: String,

    /// Valor crudo; puede venir vacío
    #[serde(rename = "Data_Value", default)]
    pub data_value: String,

    #[serde(rename = "StratificationCategory1", default)]
    pub category: String,

    #[serde(rename = "Stratification1", default)]
    pub stratification: String,
}

impl Row {
    /// Valor numérico, `None` si está vacío o no es un número
    pub fn value(&self) -> Option<f64> {
        let raw = self.data_value.trim();
        if raw.is_empty() {
            return None;
        }
        raw.parse().ok()
    }
}

/// Errores al cargar el dataset
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to open dataset {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Dataset cargado en memoria
#[derive(Debug, Default)]
pub struct DataIngestor {
    rows: Vec<Row>,
}

impl DataIngestor {
    /// Lee el CSV desde un archivo
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| IngestError::Open {
            path: path.display().to_string(),
            source,
        })?;

        let ingestor = Self::from_reader(file)?;
        info!(rows = ingestor.len(), path = %path.display(), "dataset loaded");
        Ok(ingestor)
    }

    /// Lee el CSV desde cualquier `Read` (con encabezados)
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let rows = reader
            .deserialize::<Row>()
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rows })
    }

    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Filas que responden a una pregunta
    pub fn rows_for_question(&self, question: &str) -> Vec<&Row> {
        self.rows
            .iter()
            .filter(|row| row.question == question)
            .collect()
    }

    /// Verifica si la pregunta está en alguna de las dos listas
    pub fn is_valid_question(&self, question: &str) -> bool {
        is_best_min(question) || is_best_max(question)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn is_best_min(question: &str) -> bool {
    QUESTIONS_BEST_IS_MIN.contains(&question)
}

pub fn is_best_max(question: &str) -> bool {
    QUESTIONS_BEST_IS_MAX.contains(&question)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
YearStart,LocationDesc,Question,Data_Value,StratificationCategory1,Stratification1
2011,Ohio,Percent of adults aged 18 years and older who have obesity,30.5,Age (years),18 - 24
2011,Ohio,Percent of adults aged 18 years and older who have obesity,,Age (years),25 - 34
2011,Texas,\"Percent of adults aged 18 years and older who have obesity\",28.0,Gender,Male
2011,Texas,Some other question,10,Gender,Female
";

    #[test]
    fn test_from_reader() {
        let ingestor = DataIngestor::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(ingestor.len(), 4);
        assert!(!ingestor.is_empty());
    }

    #[test]
    fn test_rows_for_question() {
        let ingestor = DataIngestor::from_reader(CSV.as_bytes()).unwrap();
        let rows = ingestor
            .rows_for_question("Percent of adults aged 18 years and older who have obesity");

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].state, "Texas");
        assert_eq!(rows[2].category, "Gender");
    }

    #[test]
    fn test_row_value() {
        let ingestor = DataIngestor::from_reader(CSV.as_bytes()).unwrap();
        let rows = ingestor
            .rows_for_question("Percent of adults aged 18 years and older who have obesity");

        assert_eq!(rows[0].value(), Some(30.5));
        assert_eq!(rows[1].value(), None);
    }

    #[test]
    fn test_question_lists() {
        let ingestor = DataIngestor::default();
        assert!(ingestor.is_valid_question(QUESTIONS_BEST_IS_MIN[0]));
        assert!(ingestor.is_valid_question(QUESTIONS_BEST_IS_MAX[3]));
        assert!(!ingestor.is_valid_question("Some other question"));

        assert!(is_best_min(QUESTIONS_BEST_IS_MIN[1]));
        assert!(!is_best_max(QUESTIONS_BEST_IS_MIN[1]));
    }

    #[test]
    fn test_missing_file() {
        let result = DataIngestor::from_path("/definitely/not/here.csv");
        assert!(matches!(result, Err(IngestError::Open { .. })));
    }
}
