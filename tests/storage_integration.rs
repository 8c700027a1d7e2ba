//! SQLite-backed recommendation flow

use std::sync::Arc;
use tempfile::TempDir;

use coleta::classifier::{LogisticRelevanceClassifier, ModelStore};
use coleta::config::Config;
use coleta::storage::{CandidateRepository, Database};
use coleta::vocabulary::SynonymMap;
use coleta::{Candidate, NeedQuery, RecommendationService};

fn import_json() -> &'static str {
    r#"[
        {"id": 1, "type": "Alimentos", "city": "Porto Alegre", "stock": "arroz, feijão",
         "description": "Ginásio municipal", "district": "Centro", "street": "Av. Borges, 100",
         "image_refs": ["ginasio.jpg"]},
        {"id": 2, "type": "Roupas", "city": "Porto Alegre", "stock": "agasalho, cobertor"},
        {"id": 3, "type": "Água Potável", "city": "Canoas", "stock": "galão de água"},
        {"id": 4, "type": "Medicamentos", "city": "Porto Alegre", "stock": "gaze", "active": false}
    ]"#
}

#[test]
fn test_import_and_recommend_from_database() {
    let temp = TempDir::new().unwrap();
    let mut config = Config::default();
    config.storage.data_dir = temp.path().to_path_buf();

    let database = Arc::new(Database::new(&config.storage.database_path()).unwrap());
    let candidates: Vec<Candidate> = serde_json::from_str(import_json()).unwrap();
    assert_eq!(database.import_candidates(&candidates).unwrap(), 4);

    let active = database.active_candidates().unwrap();
    assert_eq!(active.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(active[0].image_refs, vec!["ginasio.jpg".to_string()]);

    let service = RecommendationService::new(
        Arc::new(SynonymMap::builtin().unwrap()),
        config.scoring.clone(),
        database.clone(),
        LogisticRelevanceClassifier::new(&config.classifier).unwrap(),
        Some(ModelStore::new(config.storage.model_path())),
    );

    let status = service.initialize().unwrap();
    assert!(status.ready);
    assert!(config.storage.model_path().exists());

    let query = NeedQuery::new("arroz", Some("porto alegre")).unwrap();
    let points = service.recommend(&query).unwrap().points();
    assert_eq!(points[0].id, 1);
    assert_eq!(points[0].street, "Av. Borges, 100");
    assert!(points.iter().all(|p| p.id != 4));
    assert!(points.iter().all(|p| p.city == "Porto Alegre"));
}

#[test]
fn test_empty_database_degrades() {
    let temp = TempDir::new().unwrap();
    let database = Arc::new(Database::new(&temp.path().join("coleta.sqlite")).unwrap());

    let service = RecommendationService::new(
        Arc::new(SynonymMap::builtin().unwrap()),
        Default::default(),
        database,
        LogisticRelevanceClassifier::new(&Default::default()).unwrap(),
        Some(ModelStore::new(temp.path().join("model.json"))),
    );

    assert!(!service.initialize().unwrap().ready);
    let result = service
        .recommend(&NeedQuery::new("água", None).unwrap())
        .unwrap();
    assert!(result.degraded);
    assert!(!temp.path().join("model.json").exists());
}
