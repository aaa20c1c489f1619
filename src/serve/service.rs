//! Prediction service: request/response contract over the model cache.
//!
//! The HTTP layer hands `dispatch` a method, a path and (for POST) the parsed
//! JSON body, and writes back whatever status and JSON value it returns. Keeping
//! the contract here lets it be tested without a socket.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::domain::{BuildingFilter, ServiceConfig, TrainConfig};
use crate::error::AppError;
use crate::io::table::Table;
use crate::models::{train_and_evaluate, RegressionModel};
use crate::resolve::{looks_like_code, normalize_building_code, BuildingDirectory};
use crate::serve::cache::ModelCache;

pub const SERVICE_NAME: &str = "energy-predict-api";

/// Request keys accepted for the building, in lookup order.
const BUILDING_KEYS: [&str; 4] = ["building", "building_name", "building_code", "building_number"];

/// Request key → model feature column.
const FEATURE_KEYS: [(&str, &str); 3] = [
    ("precipitation", "precipitation"),
    ("temperature", "temperature_2m"),
    ("wind_speed", "wind_speed_10m"),
];

/// Trains the model for one building code.
pub type TrainFn = dyn Fn(&str) -> Result<RegressionModel, AppError> + Send + Sync;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetBuilding {
    pub name: String,
    pub building_code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub building_name: String,
    pub building_code: String,
    pub predicted_value: f64,
    pub target_field_name: String,
}

pub struct PredictionService {
    targets: Vec<TargetBuilding>,
    cache: ModelCache<RegressionModel>,
    trainer: Box<TrainFn>,
}

impl PredictionService {
    pub fn new(targets: Vec<TargetBuilding>, trainer: Box<TrainFn>) -> Self {
        Self {
            targets,
            cache: ModelCache::new(),
            trainer,
        }
    }

    /// Resolve the configured target names against the merged artifact and
    /// train per building on demand.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, AppError> {
        let path = &config.train.dataset.merged_path;
        if !path.is_file() {
            return Err(AppError::missing_file(format!(
                "Missing {}. Build it with: be clean",
                path.display()
            )));
        }
        let directory = BuildingDirectory::from_merged(&Table::read_csv(path)?)?;
        let targets = resolve_targets(&directory, &config.targets);
        if targets.is_empty() {
            return Err(AppError::configuration(
                "None of the configured target buildings could be resolved",
            ));
        }

        let template = config.train.clone();
        let trainer = move |code: &str| train_for_building(&template, code);
        let service = Self::new(targets, Box::new(trainer));
        log::info!(
            "Serving {} buildings: {}",
            service.targets().len(),
            service
                .targets()
                .iter()
                .map(|t| format!("{} ({})", t.name, t.building_code))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(service)
    }

    pub fn targets(&self) -> &[TargetBuilding] {
        &self.targets
    }

    pub fn health(&self) -> Value {
        json!({ "ok": true, "service": SERVICE_NAME })
    }

    pub fn buildings(&self) -> Value {
        json!({ "buildings": self.targets })
    }

    pub fn predict(&self, body: &Value) -> Result<Prediction, AppError> {
        let payload = body
            .as_object()
            .ok_or_else(|| AppError::validation("Request body must be a JSON object"))?;

        let target = self.find_target(payload)?;

        let mut features = Vec::with_capacity(FEATURE_KEYS.len());
        for (key, column) in FEATURE_KEYS {
            let value = payload.get(key).or_else(|| payload.get(column));
            features.push(to_finite(value, key)?);
        }

        let model = self.cache.get_or_train(&target.building_code, || {
            (self.trainer)(&target.building_code)
        })?;
        let ordered = order_features(&model, &features)?;
        let predicted_value = model.predict_one(&ordered, None)?;
        if !predicted_value.is_finite() {
            return Err(AppError::internal("Model produced a non-finite prediction"));
        }

        Ok(Prediction {
            building_name: target.name.clone(),
            building_code: target.building_code.clone(),
            predicted_value,
            target_field_name: model.target_name.clone(),
        })
    }

    /// Route a request. Errors become `{"error": message}` with their status.
    pub fn dispatch(&self, method: &str, path: &str, body: Option<&Value>) -> (u16, Value) {
        let path = path.trim_end_matches('/');
        match (method, path) {
            ("GET", "/health") => (200, self.health()),
            ("GET", "/buildings") => (200, self.buildings()),
            ("POST", "/predict") => {
                let result = body
                    .ok_or_else(|| AppError::validation("Request body must be a JSON object"))
                    .and_then(|b| self.predict(b));
                match result {
                    Ok(p) => (200, json!(p)),
                    Err(err) => error_response(&err),
                }
            }
            _ => (404, json!({ "error": "Not found" })),
        }
    }

    fn find_target(&self, payload: &serde_json::Map<String, Value>) -> Result<&TargetBuilding, AppError> {
        let raw = BUILDING_KEYS
            .iter()
            .find_map(|k| payload.get(*k).filter(|v| !v.is_null()))
            .ok_or_else(|| AppError::validation("building is required"))?;
        let text = match raw {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return Err(AppError::validation("building must be a string or number")),
        };
        if text.is_empty() {
            return Err(AppError::validation("building is required"));
        }

        let code = looks_like_code(&text).then(|| normalize_building_code(&text));
        self.targets
            .iter()
            .find(|t| t.building_code == text || code.as_deref() == Some(t.building_code.as_str()))
            .or_else(|| self.targets.iter().find(|t| t.name == text))
            .ok_or_else(|| {
                let known: Vec<String> = self
                    .targets
                    .iter()
                    .map(|t| format!("{} ({})", t.name, t.building_code))
                    .collect();
                AppError::validation(format!("building must be one of: {}", known.join(", ")))
            })
    }
}

pub fn error_response(err: &AppError) -> (u16, Value) {
    if !err.kind().is_client_error() {
        log::error!("Request failed: {err}");
    }
    (err.kind().http_status(), json!({ "error": err.message() }))
}

/// Targets that resolve to exactly one building code, in configured order.
pub fn resolve_targets(directory: &BuildingDirectory, names: &[String]) -> Vec<TargetBuilding> {
    let mut targets: Vec<TargetBuilding> = Vec::new();
    for name in names {
        match directory.resolve(name, false) {
            Ok(codes) => {
                for code in codes {
                    if targets.iter().any(|t| t.building_code == code) {
                        log::warn!("Target '{name}' duplicates building {code}; skipping");
                        continue;
                    }
                    targets.push(TargetBuilding {
                        name: name.clone(),
                        building_code: code,
                    });
                }
            }
            Err(err) => log::warn!("Skipping target building '{name}': {err}"),
        }
    }
    targets
}

/// Per-building training: the service template restricted to one code.
///
/// The request already named a valid target, so a dataset that cannot support
/// a fit is a server-side fault and is reported as `Internal`.
pub fn train_for_building(template: &TrainConfig, code: &str) -> Result<RegressionModel, AppError> {
    let mut config = template.clone();
    config.dataset.filter = BuildingFilter::Include(vec![code.to_string()]);
    config.dataset.group_by_building = false;
    let trained = train_and_evaluate(&config).map_err(|err| {
        if err.kind().is_client_error() {
            AppError::internal(format!("Training for building {code} failed: {}", err.message()))
        } else {
            err
        }
    })?;
    Ok(trained.model)
}

/// Request features come in `FEATURE_KEYS` order; the model may list its
/// columns differently.
fn order_features(model: &Arc<RegressionModel>, features: &[f64]) -> Result<Vec<f64>, AppError> {
    model
        .feature_names
        .iter()
        .map(|name| {
            FEATURE_KEYS
                .iter()
                .position(|(_, column)| column == name)
                .map(|i| features[i])
                .ok_or_else(|| {
                    AppError::internal(format!("Model feature `{name}` is not accepted by the service"))
                })
        })
        .collect()
}

fn to_finite(value: Option<&Value>, field: &str) -> Result<f64, AppError> {
    let number = match value {
        None | Some(Value::Null) => {
            return Err(AppError::validation(format!("{field} is required")));
        }
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    }
    .ok_or_else(|| AppError::validation(format!("{field} must be a number")))?;

    if number.is_finite() {
        Ok(number)
    } else {
        Err(AppError::validation(format!("{field} must be a finite number")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DatasetConfig, ModelConfig, SplitConfig, SERVICE_FEATURE_COLS};
    use crate::math::StandardScaler;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// y = 10 + 1·precipitation + 2·temperature + 3·wind
    fn linear_model() -> RegressionModel {
        RegressionModel {
            feature_names: SERVICE_FEATURE_COLS.iter().map(|c| c.to_string()).collect(),
            target_name: "readingwindowsum".to_string(),
            building_codes: Vec::new(),
            scaler: StandardScaler {
                mean: vec![0.0; 3],
                scale: vec![1.0; 3],
            },
            coefficients: vec![1.0, 2.0, 3.0],
            intercept: 10.0,
        }
    }

    fn targets() -> Vec<TargetBuilding> {
        vec![
            TargetBuilding {
                name: "RPAC".to_string(),
                building_code: "79".to_string(),
            },
            TargetBuilding {
                name: "Thompson Library".to_string(),
                building_code: "15".to_string(),
            },
        ]
    }

    fn service(calls: Arc<AtomicUsize>) -> PredictionService {
        PredictionService::new(
            targets(),
            Box::new(move |code: &str| {
                calls.fetch_add(1, Ordering::SeqCst);
                if code == "15" {
                    Err(AppError::internal("training exploded"))
                } else {
                    Ok(linear_model())
                }
            }),
        )
    }

    #[test]
    fn health_and_buildings() {
        let svc = service(Arc::default());
        let (status, body) = svc.dispatch("GET", "/health", None);
        assert_eq!(status, 200);
        assert_eq!(body, json!({ "ok": true, "service": "energy-predict-api" }));

        let (status, body) = svc.dispatch("GET", "/buildings", None);
        assert_eq!(status, 200);
        assert_eq!(body["buildings"][0], json!({ "name": "RPAC", "building_code": "79" }));
        assert_eq!(body["buildings"][1]["building_code"], "15");
    }

    #[test]
    fn predicts_and_caches() {
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = service(Arc::clone(&calls));
        let body = json!({
            "building": "RPAC",
            "temperature": 2.0,
            "precipitation": "1.5",
            "wind_speed": 1
        });

        let (status, out) = svc.dispatch("POST", "/predict", Some(&body));
        assert_eq!(status, 200, "{out}");
        assert_eq!(out["building_name"], "RPAC");
        assert_eq!(out["building_code"], "79");
        assert_eq!(out["predicted_value"], json!(10.0 + 1.5 + 4.0 + 3.0));
        assert_eq!(out["target_field_name"], "readingwindowsum");

        let by_code = json!({
            "building_number": "079",
            "temperature": 0,
            "precipitation": 0,
            "wind_speed": 0
        });
        let (status, out) = svc.dispatch("POST", "/predict", Some(&by_code));
        assert_eq!(status, 200);
        assert_eq!(out["predicted_value"], json!(10.0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalid_input_is_400() {
        let svc = service(Arc::default());
        let cases = [
            json!({ "building": "rpac", "temperature": 1, "precipitation": 1, "wind_speed": 1 }),
            json!({ "building": "RPAC", "temperature": "warm", "precipitation": 1, "wind_speed": 1 }),
            json!({ "building": "RPAC", "temperature": "NaN", "precipitation": 1, "wind_speed": 1 }),
            json!({ "building": "RPAC", "precipitation": 1, "wind_speed": 1 }),
            json!({ "temperature": 1, "precipitation": 1, "wind_speed": 1 }),
            json!([1, 2, 3]),
        ];
        for body in cases {
            let (status, out) = svc.dispatch("POST", "/predict", Some(&body));
            assert_eq!(status, 400, "{body} -> {out}");
            assert!(out["error"].is_string());
        }
    }

    #[test]
    fn training_failure_is_500_and_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = service(Arc::clone(&calls));
        let body = json!({
            "building_name": "Thompson Library",
            "temperature": 1,
            "precipitation": 1,
            "wind_speed": 1
        });
        for _ in 0..2 {
            let (status, out) = svc.dispatch("POST", "/predict", Some(&body));
            assert_eq!(status, 500);
            assert_eq!(out["error"], "training exploded");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unknown_route_is_404() {
        let svc = service(Arc::default());
        assert_eq!(svc.dispatch("GET", "/nope", None).0, 404);
        assert_eq!(svc.dispatch("DELETE", "/predict", None).0, 404);
    }

    #[test]
    fn targets_resolve_in_configured_order() {
        let dir = BuildingDirectory::new([
            ("Recreation and Physical Activity Center", "79"),
            ("Thompson Library", "15"),
            ("Research Tower A", "300"),
            ("Research Tower B", "301"),
        ]);
        let names: Vec<String> = ["Thompson Library", "RPAC", "Nowhere", "Research Tower"]
            .map(String::from)
            .to_vec();
        let resolved = resolve_targets(&dir, &names);
        assert_eq!(
            resolved,
            vec![
                TargetBuilding {
                    name: "Thompson Library".to_string(),
                    building_code: "15".to_string(),
                },
                TargetBuilding {
                    name: "RPAC".to_string(),
                    building_code: "79".to_string(),
                },
            ]
        );
    }

    /// A merged artifact with a single date for Dreese Laboratories (44).
    fn single_day_config(dir: &std::path::Path) -> ServiceConfig {
        let path = dir.join("merged.csv");
        let mut t = Table::new(
            [
                "simscode",
                "utility",
                "readingtime",
                "readingwindowsum",
                "buildingnumber",
                "buildingname",
                "date",
                "precipitation",
                "temperature_2m",
                "wind_speed_10m",
            ]
            .map(String::from)
            .to_vec(),
        );
        for (time, value) in [("2025-02-03 01:00:00", "100"), ("2025-02-03 13:00:00", "120")] {
            t.rows.push(
                [
                    "44",
                    "ELECTRICITY",
                    time,
                    value,
                    "44",
                    "Dreese Laboratories",
                    "2025-02-03",
                    "0.1",
                    "2.0",
                    "3.0",
                ]
                .map(String::from)
                .to_vec(),
            );
        }
        t.write_csv(&path).unwrap();

        let mut dataset = DatasetConfig::new(path);
        dataset.features = SERVICE_FEATURE_COLS.iter().map(|c| c.to_string()).collect();
        ServiceConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            targets: vec!["Dreese Labs".to_string()],
            train: TrainConfig {
                dataset,
                split: SplitConfig::default(),
                model: ModelConfig::default(),
            },
        }
    }

    #[test]
    fn too_little_training_data_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let svc = PredictionService::from_config(&single_day_config(dir.path())).unwrap();
        assert_eq!(svc.targets()[0].building_code, "44");

        let body = json!({
            "building": "Dreese Labs",
            "temperature": 1,
            "precipitation": 0,
            "wind_speed": 2
        });
        let (status, out) = svc.dispatch("POST", "/predict", Some(&body));
        assert_eq!(status, 500, "{out}");
        assert!(out["error"].as_str().unwrap().contains("building 44"));
    }
}
